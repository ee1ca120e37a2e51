use std::f32::consts::TAU;
use std::time::Duration;

use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, h_flex, v_flex};

pub const WAVEFORM_BAR_COUNT: usize = 12;
const WAVEFORM_PERIOD: Duration = Duration::from_millis(1200);
/// Phase shift between neighbouring bars, as a fraction of the period.
const WAVEFORM_BAR_DELAY: f32 = 0.1 / 1.2;
const BAR_IDLE_HEIGHT: f32 = 4.0;
const BAR_PEAK_HEIGHT: f32 = 16.0;

/// Height in pixels of waveform bar `index` at animation progress `progress` (0..1).
pub fn bar_height(index: usize, progress: f32) -> f32 {
    let phase = (progress + index as f32 * WAVEFORM_BAR_DELAY).fract();
    let wave = 0.5 - 0.5 * (phase * TAU).cos();
    BAR_IDLE_HEIGHT + (BAR_PEAK_HEIGHT - BAR_IDLE_HEIGHT) * wave
}

/// Banner with the assistant icon and a waveform that moves while a request runs.
#[derive(IntoElement)]
pub struct AssistantVisualization {
    loading: bool,
}

impl AssistantVisualization {
    pub fn new(loading: bool) -> Self {
        Self { loading }
    }
}

impl RenderOnce for AssistantVisualization {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let bar_color = theme.primary;
        let loading = self.loading;

        let bars = (0..WAVEFORM_BAR_COUNT).map(move |index| {
            let bar = div().w(px(2.)).rounded_sm().bg(bar_color);
            if loading {
                bar.with_animation(
                    ("waveform-bar", index),
                    Animation::new(WAVEFORM_PERIOD).repeat(),
                    move |bar, delta| bar.h(px(bar_height(index, delta))),
                )
                .into_any_element()
            } else {
                bar.h(px(BAR_IDLE_HEIGHT)).opacity(0.5).into_any_element()
            }
        });

        v_flex()
            .w_full()
            .h(px(128.))
            .items_center()
            .justify_center()
            .gap_3()
            .rounded_lg()
            .bg(theme.secondary)
            .child(
                div()
                    .size(px(48.))
                    .rounded_full()
                    .bg(theme.primary)
                    .flex()
                    .items_center()
                    .justify_center()
                    .child(
                        Icon::new(IconName::Bot)
                            .size(px(24.))
                            .text_color(theme.primary_foreground),
                    ),
            )
            .child(
                h_flex()
                    .h(px(BAR_PEAK_HEIGHT))
                    .items_end()
                    .gap(px(2.))
                    .children(bars),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn bars_stay_within_idle_and_peak_height() {
        for index in 0..WAVEFORM_BAR_COUNT {
            for step in 0..=20 {
                let height = bar_height(index, step as f32 / 20.0);
                assert!((BAR_IDLE_HEIGHT..=BAR_PEAK_HEIGHT + 1e-3).contains(&height));
            }
        }
    }

    #[::core::prelude::v1::test]
    fn neighbouring_bars_are_out_of_phase() {
        assert!((bar_height(0, 0.0) - BAR_IDLE_HEIGHT).abs() < 1e-3);
        assert!(bar_height(1, 0.0) > bar_height(0, 0.0));
        assert!((bar_height(0, 0.5) - BAR_PEAK_HEIGHT).abs() < 1e-3);
    }
}
