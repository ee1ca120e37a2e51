use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::Figment;
use figment::providers::{Format, Json, Serialized};
use gpui::*;
use gpui_component::{Theme, ThemeMode, ThemeRegistry};
use nutrilens_llm::{DEFAULT_OPENAI_MODEL, Model, ProviderConfig, default_openai_models};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::assistant::AssistantMode;

pub const DEFAULT_PROVIDER_ID: &str = "openai";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const SETTINGS_DIRECTORY_NAME: &str = "nutrilens";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// A model the assistant may use, and how long its replies may get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model_name: String,
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: None,
        }
    }
}

impl ModelSettings {
    /// `None` for an entry without a name.
    fn normalized(self) -> Option<Self> {
        let model_name = self.model_name.trim();
        (!model_name.is_empty()).then(|| Self {
            model_name: model_name.to_string(),
            max_tokens: self.max_tokens.filter(|limit| *limit > 0),
        })
    }
}

/// Stored as `"light"` or `"dark"`; anything else reads as light.
mod theme_mode_name {
    use gpui_component::ThemeMode;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mode: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(mode.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ThemeMode, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(match name.trim().to_ascii_lowercase().as_str() {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        })
    }
}

fn trimmed_or(value: &str, fallback: &str) -> String {
    match value.trim() {
        "" => fallback.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Everything the settings page edits. Persisted as JSON; missing keys take
/// their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub provider_id: String,
    pub api_key: String,
    pub endpoint: String,
    pub models: Vec<ModelSettings>,
    #[serde(with = "theme_mode_name")]
    pub theme_mode: ThemeMode,
    pub theme_name: String,
    pub assistant_mode: AssistantMode,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            provider_id: DEFAULT_PROVIDER_ID.to_string(),
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            models: vec![ModelSettings::default()],
            theme_mode: ThemeMode::Light,
            theme_name: String::new(),
            assistant_mode: AssistantMode::default(),
        }
    }
}

impl AppSettings {
    /// `None` until an API key is set.
    pub fn to_provider_config(&self) -> Option<ProviderConfig> {
        self.is_valid().then(|| {
            ProviderConfig::new(
                self.provider_id.as_str(),
                self.api_key.as_str(),
                self.endpoint.as_str(),
            )
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// First configured model, with its reply cap.
    pub fn default_model(&self) -> ModelSettings {
        self.models
            .iter()
            .cloned()
            .find_map(ModelSettings::normalized)
            .unwrap_or_default()
    }

    pub fn default_model_name(&self) -> String {
        self.default_model().model_name
    }

    /// Configured models first, then the built-in suggestions not already listed.
    pub fn model_suggestions(&self) -> Vec<Model> {
        let configured = self
            .models
            .iter()
            .cloned()
            .filter_map(ModelSettings::normalized)
            .map(|model| Model::from_id(model.model_name));
        let mut models = Vec::new();
        for model in configured.chain(default_openai_models()) {
            if models.iter().all(|known: &Model| known.id != model.id) {
                models.push(model);
            }
        }
        models
    }

    pub fn normalized(self) -> Self {
        let mut models = self
            .models
            .into_iter()
            .filter_map(ModelSettings::normalized)
            .collect::<Vec<_>>();
        if models.is_empty() {
            models.push(ModelSettings::default());
        }

        Self {
            provider_id: trimmed_or(&self.provider_id, DEFAULT_PROVIDER_ID),
            api_key: self.api_key.trim().to_string(),
            endpoint: trimmed_or(&self.endpoint, DEFAULT_ENDPOINT),
            models,
            theme_name: self.theme_name.trim().to_string(),
            ..self
        }
    }

    /// Applies the named theme preset if it is registered, else the plain mode.
    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        let preset = ThemeRegistry::global(cx)
            .themes()
            .get(&SharedString::from(self.theme_name.clone()))
            .cloned();
        let Some(preset) = preset else {
            Theme::change(self.theme_mode, window, cx);
            return;
        };

        let mode = preset.mode;
        let theme = Theme::global_mut(cx);
        if mode.is_dark() {
            theme.dark_theme = preset;
        } else {
            theme.light_theme = preset;
        }
        Theme::change(mode, window, cx);
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("cannot create {path:?} (on `{stage}`): {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode settings (on `{stage}`): {source}"))]
    Encode {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot write {path:?} (on `{stage}`): {source}"))]
    Write {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot move the new settings into {path:?} (on `{stage}`): {source}"))]
    Replace {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

/// JSON-backed settings with a lock-free snapshot for readers.
pub struct SettingsStore {
    path: PathBuf,
    current: ArcSwap<AppSettings>,
}

impl SettingsStore {
    /// `<config dir>/nutrilens/settings.json`, or `.nutrilens/settings.json`
    /// when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        let dir = match dirs::config_dir() {
            Some(dir) => dir.join(SETTINGS_DIRECTORY_NAME),
            None => PathBuf::from(".nutrilens"),
        };
        dir.join(SETTINGS_FILE_NAME)
    }

    pub fn new(path: PathBuf) -> Self {
        let current = ArcSwap::from_pointee(read_settings(&path));
        Self { path, current }
    }

    pub fn load() -> Self {
        Self::new(Self::default_path())
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.current.load_full()
    }

    /// Normalizes, writes, then publishes `settings`. Nothing changes on error.
    pub fn update(&self, settings: AppSettings) -> Result<(), SettingsError> {
        let settings = settings.normalized();
        write_settings(&self.path, &settings)?;
        self.current.store(Arc::new(settings));
        Ok(())
    }
}

fn read_settings(path: &Path) -> AppSettings {
    if !path.is_file() {
        tracing::info!(path = ?path, "no settings file, using defaults");
        return AppSettings::default();
    }

    let layered =
        Figment::from(Serialized::defaults(AppSettings::default())).merge(Json::file(path));
    match layered.extract::<AppSettings>() {
        Ok(settings) => settings.normalized(),
        Err(error) => {
            tracing::warn!(path = ?path, error = %error, "unreadable settings file, using defaults");
            AppSettings::default()
        }
    }
}

/// Writes next to `path` and renames over it, so a crash never leaves half a file.
fn write_settings(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).context(CreateDirSnafu {
            stage: "settings-dir",
            path: dir.to_path_buf(),
        })?;
    }

    let json = serde_json::to_vec_pretty(settings).context(EncodeSnafu {
        stage: "settings-json",
    })?;
    let staging = path.with_extension("json.tmp");
    std::fs::write(&staging, json).context(WriteSnafu {
        stage: "settings-staging",
        path: staging.clone(),
    })?;
    std::fs::rename(&staging, path).context(ReplaceSnafu {
        stage: "settings-replace",
        path: path.to_path_buf(),
    })?;

    tracing::info!(path = ?path, "settings saved");
    Ok(())
}

/// GPUI entity around the settings store; emits [`SettingsChanged`] after every save.
pub struct SettingsState {
    store: SettingsStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    pub settings: AppSettings,
}

impl EventEmitter<SettingsChanged> for SettingsState {}

impl SettingsState {
    pub fn new(store: SettingsStore) -> Self {
        Self { store }
    }

    pub fn settings(&self) -> Arc<AppSettings> {
        self.store.settings()
    }

    pub fn update_settings(
        &mut self,
        settings: AppSettings,
        cx: &mut Context<Self>,
    ) -> Result<(), SettingsError> {
        self.store.update(settings)?;
        cx.emit(SettingsChanged {
            settings: self.store.settings().as_ref().clone(),
        });
        cx.notify();
        Ok(())
    }
}
