pub mod state;
pub mod view;

pub use state::{AppSettings, ModelSettings, SettingsChanged, SettingsError, SettingsState, SettingsStore};
pub use view::{SettingsClose, SettingsView};
