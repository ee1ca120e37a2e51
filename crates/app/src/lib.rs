#![deny(unsafe_code)]

/// Window shell, provider resolution and product loading.
pub mod app;
/// The AI assistant panel and its conversation model.
pub mod assistant;
pub mod components;
/// Product health metrics and the health data view.
pub mod health;
/// Settings persistence and UI.
pub mod settings;
