use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex};

use crate::assistant::mode::AssistantMode;

#[derive(IntoElement)]
pub struct AssistantHeader {
    mode: AssistantMode,
    model_id: SharedString,
}

impl AssistantHeader {
    pub fn new(mode: AssistantMode, model_id: impl Into<SharedString>) -> Self {
        Self {
            mode,
            model_id: model_id.into(),
        }
    }
}

impl RenderOnce for AssistantHeader {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let subtitle = match self.mode {
            AssistantMode::Conversational => "Ask anything about food products and ingredients.",
            AssistantMode::HealthAnalysis => "Nutrient and additive breakdown for the current product.",
        };

        h_flex()
            .w_full()
            .justify_between()
            .items_center()
            .child(
                v_flex()
                    .gap_1()
                    .child(Label::new(self.mode.title()).text_lg().font_semibold())
                    .child(
                        Label::new(subtitle)
                            .text_sm()
                            .text_color(theme.muted_foreground),
                    ),
            )
            .child(
                div()
                    .px_2()
                    .py_1()
                    .rounded_full()
                    .bg(theme.muted)
                    .border_1()
                    .border_color(theme.border)
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(self.model_id),
            )
    }
}
