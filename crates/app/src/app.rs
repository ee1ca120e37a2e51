use std::path::PathBuf;
use std::rc::Rc;

use gpui::prelude::FluentBuilder;
use gpui::*;
use gpui_component::notification::NotificationList;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex, v_flex,
};
use nutrilens_llm::{DEFAULT_OPENAI_MODEL, ProviderConfig, create_provider};

use crate::assistant::{
    AssistantMode, AssistantPanel, ConversationStore, Notice, NoticeSeverity,
    NotificationListNotifier, Notifier, ProviderSelection,
};
use crate::health::{HealthDataView, Product};
use crate::settings::state::{AppSettings, DEFAULT_ENDPOINT, SettingsChanged, SettingsState};
use crate::settings::view::{SettingsClose, SettingsView};

/// Environment variable naming a product JSON file to analyse.
pub const PRODUCT_PATH_ENV: &str = "NUTRILENS_PRODUCT";

const TOOLBAR_HEIGHT: Pixels = px(40.);

pub fn default_themes_path() -> PathBuf {
    PathBuf::from("./themes")
}

gpui::actions!(shell, [ToggleSettings, Quit]);

/// Builds the provider from saved settings, then from `OPENAI_*` variables.
pub fn resolve_provider(settings: &AppSettings) -> ProviderSelection {
    let model = settings.default_model();

    if let Some(config) = settings.to_provider_config() {
        match create_provider(config) {
            Ok(provider) => {
                tracing::info!(
                    provider = provider.id(),
                    model = %model.model_name,
                    max_tokens = ?model.max_tokens,
                    "initialized provider from settings"
                );
                return ProviderSelection {
                    provider: Some(provider),
                    model_id: model.model_name,
                    max_tokens: model.max_tokens,
                    error: None,
                };
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to create provider from settings, falling back to environment");
            }
        }
    }

    let environment = provider_from_environment();
    if environment.provider.is_some() {
        environment
    } else {
        ProviderSelection {
            model_id: model.model_name,
            ..environment
        }
    }
}

fn provider_from_environment() -> ProviderSelection {
    let non_blank = |name: &str| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let Some(api_key) = non_blank("OPENAI_API_KEY") else {
        return ProviderSelection::unavailable(DEFAULT_OPENAI_MODEL, None);
    };
    let model_id = non_blank("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
    let endpoint = non_blank("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    match create_provider(ProviderConfig::new("openai", api_key, endpoint)) {
        Ok(provider) => {
            tracing::info!(model = %model_id, "initialized provider from environment");
            ProviderSelection {
                provider: Some(provider),
                model_id,
                max_tokens: None,
                error: None,
            }
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to initialize provider");
            ProviderSelection::unavailable(model_id, Some(format!("Provider error: {error}")))
        }
    }
}

/// Reads the product named by [`PRODUCT_PATH_ENV`], or the bundled sample.
pub fn load_product() -> Product {
    let Some(path) = std::env::var_os(PRODUCT_PATH_ENV) else {
        return Product::sample();
    };

    match Product::load(&PathBuf::from(&path)) {
        Ok(product) => product,
        Err(error) => {
            tracing::warn!(path = ?path, error = %error, "failed to load product, using sample");
            Product::sample()
        }
    }
}

/// Window shell: title bar with mode switch and settings, the assistant panel,
/// the settings page overlay and the notification layer.
pub struct NutriLensShell {
    notification_list: Entity<NotificationList>,
    notifier: Rc<dyn Notifier>,
    settings_view: Entity<SettingsView>,
    store: Entity<ConversationStore>,
    panel: Entity<AssistantPanel>,
    settings_open: bool,
    _subscriptions: Vec<Subscription>,
}

impl NutriLensShell {
    pub fn new(
        notification_list: Entity<NotificationList>,
        settings_state: Entity<SettingsState>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let settings = settings_state.read(cx).settings();
        let selection = resolve_provider(&settings);
        let mode = settings.assistant_mode;

        let notifier: Rc<dyn Notifier> =
            Rc::new(NotificationListNotifier::new(notification_list.clone()));
        let store = cx.new(|_| ConversationStore::new(selection, mode));
        let health_view = cx.new(|_| HealthDataView::new(load_product()));
        let panel = cx.new(|cx| {
            AssistantPanel::new(
                store.clone(),
                mode,
                notifier.clone(),
                health_view,
                window,
                cx,
            )
        });
        let settings_view = cx.new(|cx| SettingsView::new(&settings_state, window, cx));

        let subscriptions = vec![
            cx.subscribe_in(
                &settings_state,
                window,
                |this, _, event: &SettingsChanged, window, cx| {
                    this.apply_settings(&event.settings, window, cx);
                },
            ),
            cx.subscribe_in(&settings_view, window, |this, _, _: &SettingsClose, window, cx| {
                this.close_settings(window, cx);
            }),
        ];

        Self {
            notification_list,
            notifier,
            settings_view,
            store,
            panel,
            settings_open: false,
            _subscriptions: subscriptions,
        }
    }

    fn apply_settings(&mut self, settings: &AppSettings, window: &mut Window, cx: &mut Context<Self>) {
        let selection = resolve_provider(settings);
        let ready = selection.provider.is_some();
        self.store.update(cx, |store, cx| {
            store.set_provider(selection, cx);
        });

        let notice = if ready {
            Notice::new("Settings saved", "The assistant will use the new provider settings.", NoticeSeverity::Success)
        } else {
            Notice::new(
                "Settings saved",
                "No API key is configured, so the assistant cannot answer yet.",
                NoticeSeverity::Warning,
            )
        };
        self.notifier.notify(notice, window, cx);
    }

    fn toggle_settings(&mut self, _: &ToggleSettings, window: &mut Window, cx: &mut Context<Self>) {
        if self.settings_open {
            self.settings_view
                .update(cx, |view, cx| view.reload_from_settings(window, cx));
            self.close_settings(window, cx);
        } else {
            self.settings_open = true;
            cx.notify();
        }
    }

    fn close_settings(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.settings_open = false;
        let panel_focus = self.panel.read(cx).focus_handle(cx);
        panel_focus.focus(window);
        cx.notify();
    }

    fn switch_mode(&mut self, mode: AssistantMode, cx: &mut Context<Self>) {
        self.panel.update(cx, |panel, cx| panel.set_mode(mode, cx));
        cx.notify();
    }

    fn render_mode_switch(&self, cx: &Context<Self>) -> impl IntoElement {
        let current = self.store.read(cx).mode();

        h_flex()
            .gap_1()
            .children(AssistantMode::ALL.into_iter().enumerate().map(|(index, mode)| {
                let active = current == mode;
                Button::new(("assistant-mode", index))
                    .small()
                    .when(active, |button| button.primary())
                    .when(!active, |button| button.ghost())
                    .child(mode.label())
                    .on_click(cx.listener(move |this, _, _window, cx| {
                        this.switch_mode(mode, cx);
                    }))
            }))
    }

    fn render_toolbar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("shell-toolbar")
            .w_full()
            .h(TOOLBAR_HEIGHT)
            .flex_shrink_0()
            .px_4()
            .justify_between()
            .border_b_1()
            .border_color(theme.border)
            .child(
                div()
                    .text_sm()
                    .font_weight(FontWeight::SEMIBOLD)
                    .child("NutriLens"),
            )
            .child(
                h_flex()
                    .gap_2()
                    .child(self.render_mode_switch(cx))
                    .child(
                        Button::new("open-settings")
                            .ghost()
                            .small()
                            .icon(IconName::Settings)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.toggle_settings(&ToggleSettings, window, cx);
                            })),
                    ),
            )
    }
}

impl Render for NutriLensShell {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("nutrilens-shell")
            .key_context("NutriLensShell")
            .on_action(cx.listener(Self::toggle_settings))
            .size_full()
            .bg(theme.background)
            .text_color(theme.foreground)
            .child(self.render_toolbar(cx))
            .child(
                div()
                    .relative()
                    .flex_1()
                    .min_h_0()
                    .p_4()
                    .child(self.panel.clone())
                    .when(self.settings_open, |body| {
                        body.child(
                            div()
                                .id("settings-overlay")
                                .absolute()
                                .inset_0()
                                .occlude()
                                .flex()
                                .justify_center()
                                .items_center()
                                .bg(theme.background.opacity(0.6))
                                .child(self.settings_view.clone()),
                        )
                    }),
            )
            .child(self.notification_list.clone())
    }
}
