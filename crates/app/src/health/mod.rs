/// Nutrient metrics, additive data and product loading.
pub mod metrics;
pub mod view;

pub use metrics::{Additive, AdditiveRisk, MetricLevel, MetricPolarity, NutritionalInfo, Product, metric_level};
pub use view::HealthDataView;
