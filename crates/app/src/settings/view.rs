use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::{
    ActiveTheme, IndexPath, Sizable, ThemeMode, ThemeRegistry,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputState},
    label::Label,
    select::{Select, SelectState},
    v_flex,
};

use crate::assistant::AssistantMode;
use crate::settings::state::{AppSettings, ModelSettings, SettingsState};

pub const SETTINGS_TITLE: &str = "Settings";
pub const SETTINGS_SUBTITLE: &str = "Configure your preferences and account settings.";

/// Settings page. Edits are local until Save.
pub struct SettingsView {
    state: Entity<SettingsState>,
    provider_input: Entity<InputState>,
    api_key_input: Entity<InputState>,
    endpoint_input: Entity<InputState>,
    model_input: Entity<InputState>,
    theme_preset_select: Entity<SelectState<Vec<SharedString>>>,
    model_suggestions: Vec<SharedString>,
    theme_mode: ThemeMode,
    assistant_mode: AssistantMode,
    error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsClose;

impl EventEmitter<SettingsClose> for SettingsView {}

/// Row of `wanted` among the registered presets. A blank name follows the mode.
pub fn preset_row(presets: &[SharedString], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        return None;
    }
    presets.iter().position(|preset| preset.as_ref() == wanted)
}

/// Puts `chosen` first and keeps the reply cap it already had.
pub fn promote_model(models: &[ModelSettings], chosen: &str) -> Vec<ModelSettings> {
    let chosen = chosen.trim();
    let (picked, rest): (Vec<_>, Vec<_>) = models
        .iter()
        .cloned()
        .partition(|model| model.model_name == chosen);
    let head = picked.into_iter().next().unwrap_or_else(|| ModelSettings {
        model_name: chosen.to_string(),
        max_tokens: None,
    });

    std::iter::once(head).chain(rest).collect()
}

fn registered_presets(cx: &App) -> Vec<SharedString> {
    ThemeRegistry::global(cx)
        .sorted_themes()
        .iter()
        .map(|preset| preset.name.clone())
        .collect()
}

fn preset_selection(presets: &[SharedString], wanted: &str) -> Option<IndexPath> {
    preset_row(presets, wanted).map(|row| IndexPath::default().row(row))
}

impl SettingsView {
    fn suggestion_ids(settings: &AppSettings) -> Vec<SharedString> {
        settings
            .model_suggestions()
            .into_iter()
            .map(|model| SharedString::from(model.id))
            .collect()
    }

    pub fn new(state: &Entity<SettingsState>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let settings = state.read(cx).settings();

        let provider_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("Provider ID (e.g., openai)"));
        let api_key_input = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("API Key")
                .masked(true)
        });
        let endpoint_input = cx.new(|cx| {
            InputState::new(window, cx).placeholder("Endpoint (e.g., https://api.openai.com/v1)")
        });
        let model_input = cx
            .new(|cx| InputState::new(window, cx).placeholder("Default Model (e.g., gpt-4o-mini)"));

        let presets = registered_presets(cx);
        let selected = preset_selection(&presets, &settings.theme_name);
        let theme_preset_select =
            cx.new(|cx| SelectState::new(presets, selected, window, cx).searchable(true));

        let mut this = Self {
            state: state.clone(),
            provider_input,
            api_key_input,
            endpoint_input,
            model_input,
            theme_preset_select,
            model_suggestions: Self::suggestion_ids(&settings),
            theme_mode: settings.theme_mode,
            assistant_mode: settings.assistant_mode,
            error_message: None,
        };
        this.fill_inputs(&settings, window, cx);
        this
    }

    /// Discards unsaved edits and shows the stored settings again.
    pub fn reload_from_settings(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let settings = self.state.read(cx).settings();

        self.fill_inputs(&settings, window, cx);
        let presets = registered_presets(cx);
        let selected = preset_selection(&presets, &settings.theme_name);
        self.theme_preset_select.update(cx, |select, cx| {
            select.set_items(presets, window, cx);
            select.set_selected_index(selected, window, cx);
        });
        self.model_suggestions = Self::suggestion_ids(&settings);
        self.theme_mode = settings.theme_mode;
        self.assistant_mode = settings.assistant_mode;
        self.error_message = None;
        cx.notify();
    }

    fn fill_inputs(&self, settings: &AppSettings, window: &mut Window, cx: &mut Context<Self>) {
        let fields = [
            (&self.provider_input, settings.provider_id.clone()),
            (&self.api_key_input, settings.api_key.clone()),
            (&self.endpoint_input, settings.endpoint.clone()),
            (&self.model_input, settings.default_model_name()),
        ];

        for (input, value) in fields {
            input.update(cx, |input_state, cx| {
                input_state.set_value(value, window, cx);
            });
        }
    }

    fn use_model(&mut self, model_id: SharedString, window: &mut Window, cx: &mut Context<Self>) {
        self.model_input.update(cx, |input_state, cx| {
            input_state.set_value(model_id, window, cx);
        });
        cx.notify();
    }

    fn set_theme_mode(&mut self, theme_mode: ThemeMode, cx: &mut Context<Self>) {
        self.theme_mode = theme_mode;
        cx.notify();
    }

    fn set_assistant_mode(&mut self, assistant_mode: AssistantMode, cx: &mut Context<Self>) {
        self.assistant_mode = assistant_mode;
        cx.notify();
    }

    fn collect_settings(&self, cx: &App) -> AppSettings {
        let current = self.state.read(cx).settings();
        let models = promote_model(&current.models, &self.model_input.read(cx).value());

        AppSettings {
            provider_id: self.provider_input.read(cx).value().to_string(),
            api_key: self.api_key_input.read(cx).value().to_string(),
            endpoint: self.endpoint_input.read(cx).value().to_string(),
            models,
            theme_mode: self.theme_mode,
            theme_name: self
                .theme_preset_select
                .read(cx)
                .selected_value()
                .map(|preset| preset.to_string())
                .unwrap_or_default(),
            assistant_mode: self.assistant_mode,
        }
    }

    fn save_settings(&mut self, _: &ClickEvent, window: &mut Window, cx: &mut Context<Self>) {
        let new_settings = self.collect_settings(cx);

        match self
            .state
            .update(cx, |state, cx| state.update_settings(new_settings, cx))
        {
            Ok(()) => {
                let saved = self.state.read(cx).settings();
                saved.apply_theme(Some(window), cx);
                self.error_message = None;
                cx.emit(SettingsClose);
                cx.notify();
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to save settings");
                self.error_message = Some(format!("Failed to save settings: {error}"));
                cx.notify();
            }
        }
    }

    fn cancel(&mut self, _: &ClickEvent, window: &mut Window, cx: &mut Context<Self>) {
        self.reload_from_settings(window, cx);
        cx.emit(SettingsClose);
    }

    fn field(label: &'static str, input: impl IntoElement, cx: &App) -> impl IntoElement {
        v_flex()
            .gap_1()
            .child(
                div()
                    .text_sm()
                    .text_color(cx.theme().foreground)
                    .child(label),
            )
            .child(input)
    }

    fn render_model_suggestions(&self, cx: &Context<Self>) -> impl IntoElement {
        h_flex()
            .flex_wrap()
            .gap_1()
            .children(self.model_suggestions.iter().enumerate().map(|(index, model_id)| {
                let model_id = model_id.clone();
                Button::new(("settings-model-suggestion", index))
                    .ghost()
                    .xsmall()
                    .label(model_id.clone())
                    .on_click(cx.listener(move |this, _, window, cx| {
                        this.use_model(model_id.clone(), window, cx);
                    }))
            }))
    }

    fn render_theme_modes(&self, cx: &Context<Self>) -> impl IntoElement {
        h_flex().gap_2().children(
            [(ThemeMode::Light, "Light"), (ThemeMode::Dark, "Dark")]
                .into_iter()
                .map(|(theme_mode, label)| {
                    let active = self.theme_mode == theme_mode;
                    Button::new(SharedString::from(format!("settings-theme-{}", theme_mode.name())))
                        .small()
                        .when(active, |button| button.primary())
                        .when(!active, |button| button.ghost())
                        .child(label)
                        .on_click(cx.listener(move |this, _, _, cx| {
                            this.set_theme_mode(theme_mode, cx);
                        }))
                }),
        )
    }

    fn render_assistant_modes(&self, cx: &Context<Self>) -> impl IntoElement {
        h_flex()
            .gap_2()
            .children(AssistantMode::ALL.into_iter().enumerate().map(|(index, mode)| {
                let active = self.assistant_mode == mode;
                Button::new(("settings-assistant-mode", index))
                    .small()
                    .when(active, |button| button.primary())
                    .when(!active, |button| button.ghost())
                    .child(mode.label())
                    .on_click(cx.listener(move |this, _, _, cx| {
                        this.set_assistant_mode(mode, cx);
                    }))
            }))
    }
}

impl Render for SettingsView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("settings-view")
            .w(px(480.))
            .max_h_full()
            .overflow_y_scroll()
            .gap_4()
            .p_6()
            .bg(theme.popover)
            .border_1()
            .border_color(theme.border)
            .rounded_lg()
            .shadow_lg()
            .child(
                v_flex()
                    .gap_1()
                    .child(
                        div()
                            .text_xl()
                            .font_weight(FontWeight::SEMIBOLD)
                            .text_color(theme.foreground)
                            .child(SETTINGS_TITLE),
                    )
                    .child(
                        Label::new(SETTINGS_SUBTITLE)
                            .text_sm()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(
                v_flex()
                    .gap_3()
                    .child(Self::field(
                        "Provider",
                        Input::new(&self.provider_input).w_full(),
                        cx,
                    ))
                    .child(Self::field(
                        "API Key",
                        Input::new(&self.api_key_input).w_full(),
                        cx,
                    ))
                    .child(Self::field(
                        "Endpoint",
                        Input::new(&self.endpoint_input).w_full(),
                        cx,
                    ))
                    .child(Self::field(
                        "Default Model",
                        v_flex()
                            .gap_1()
                            .child(Input::new(&self.model_input).w_full())
                            .child(self.render_model_suggestions(cx)),
                        cx,
                    ))
                    .child(Self::field(
                        "Default Assistant Mode",
                        self.render_assistant_modes(cx),
                        cx,
                    ))
                    .child(Self::field("Theme Mode", self.render_theme_modes(cx), cx))
                    .child(Self::field(
                        "Theme Preset",
                        Select::new(&self.theme_preset_select)
                            .w_full()
                            .placeholder("Follow mode")
                            .search_placeholder("Search theme preset")
                            .cleanable(true),
                        cx,
                    )),
            )
            .when_some(self.error_message.clone(), |el, error| {
                el.child(div().text_sm().text_color(cx.theme().danger).child(error))
            })
            .child(
                h_flex()
                    .gap_2()
                    .justify_end()
                    .child(
                        Button::new("settings-cancel")
                            .ghost()
                            .small()
                            .child("Cancel")
                            .on_click(cx.listener(Self::cancel)),
                    )
                    .child(
                        Button::new("settings-save")
                            .primary()
                            .small()
                            .child("Save")
                            .on_click(cx.listener(Self::save_settings)),
                    ),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, max_tokens: Option<u64>) -> ModelSettings {
        ModelSettings {
            model_name: name.to_string(),
            max_tokens,
        }
    }

    #[::core::prelude::v1::test]
    fn promoted_model_keeps_its_reply_cap() {
        let models = [model("gpt-4o-mini", Some(256)), model("gpt-4o", Some(1024))];

        assert_eq!(
            promote_model(&models, " gpt-4o "),
            vec![model("gpt-4o", Some(1024)), model("gpt-4o-mini", Some(256))]
        );
    }

    #[::core::prelude::v1::test]
    fn new_model_goes_first_without_a_cap() {
        let models = [model("gpt-4o-mini", Some(256))];

        assert_eq!(
            promote_model(&models, "o3-mini"),
            vec![model("o3-mini", None), model("gpt-4o-mini", Some(256))]
        );
    }

    #[::core::prelude::v1::test]
    fn blank_preset_follows_the_theme_mode() {
        let presets = [SharedString::from("Ayu Dark"), SharedString::from("Catppuccin")];

        assert_eq!(preset_row(&presets, " Catppuccin "), Some(1));
        assert_eq!(preset_row(&presets, "  "), None);
        assert_eq!(preset_row(&presets, "Nord"), None);
    }
}
