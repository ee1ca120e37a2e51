use std::time::Duration;

use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, label::Label, v_flex};

const ROTATION_PERIOD: Duration = Duration::from_millis(1000);

/// Spinner icon size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinnerSize {
    Sm,
    #[default]
    Md,
    Lg,
}

impl SpinnerSize {
    pub fn icon_size(self) -> Pixels {
        match self {
            Self::Sm => px(16.),
            Self::Md => px(24.),
            Self::Lg => px(32.),
        }
    }
}

/// Rotating loader with an optional caption underneath.
#[derive(IntoElement)]
pub struct LoadingSpinner {
    id: ElementId,
    size: SpinnerSize,
    message: Option<SharedString>,
}

impl LoadingSpinner {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            size: SpinnerSize::default(),
            message: None,
        }
    }

    pub fn size(mut self, size: SpinnerSize) -> Self {
        self.size = size;
        self
    }

    pub fn message(mut self, message: impl Into<SharedString>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl RenderOnce for LoadingSpinner {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let icon = Icon::new(IconName::Loader)
            .size(self.size.icon_size())
            .text_color(theme.primary)
            .with_animation(
                self.id,
                Animation::new(ROTATION_PERIOD).repeat(),
                |icon, delta| icon.transform(Transformation::rotate(percentage(delta))),
            );

        let mut column = v_flex()
            .items_center()
            .justify_center()
            .p_4()
            .gap_2()
            .child(icon);

        if let Some(message) = self.message {
            column = column.child(
                Label::new(message)
                    .text_sm()
                    .text_color(theme.muted_foreground),
            );
        }

        column
    }
}
