use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};

use crate::health::metrics::{
    Additive, MetricKind, MetricLevel, MetricRow, Product, negative_rows, positive_rows,
};

/// Product analysis shown by the assistant panel in health-analysis mode.
pub struct HealthDataView {
    product: Product,
    selected_additive: Option<usize>,
}

impl HealthDataView {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            selected_additive: None,
        }
    }

    /// Opens the first additive, if the product lists any.
    fn open_additives(&mut self, cx: &mut Context<Self>) {
        if self.product.additives.is_empty() {
            return;
        }

        self.selected_additive = Some(0);
        cx.notify();
    }

    fn close_additive(&mut self, cx: &mut Context<Self>) {
        self.selected_additive = None;
        cx.notify();
    }

    fn render_section(
        &self,
        title: &'static str,
        rows: Vec<MetricRow>,
        cx: &Context<Self>,
    ) -> impl IntoElement {
        let rows = rows
            .into_iter()
            .map(|row| self.render_row(row, cx))
            .collect::<Vec<_>>();
        let theme = cx.theme();
        let heading = Label::new(title).text_sm().font_semibold();

        v_flex()
            .gap_2()
            .child(heading)
            .child(
                v_flex()
                    .gap_1()
                    .p_3()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .children(rows),
            )
    }

    fn render_row(&self, row: MetricRow, cx: &Context<Self>) -> AnyElement {
        let color = level_color(row.level, cx);

        let value = if row.kind == MetricKind::Additives && !self.product.additives.is_empty() {
            Button::new("open-additives")
                .link()
                .small()
                .label(row.value)
                .text_color(color)
                .on_click(cx.listener(|this, _, _, cx| this.open_additives(cx)))
                .into_any_element()
        } else {
            Label::new(row.value)
                .text_sm()
                .text_color(color)
                .into_any_element()
        };

        h_flex()
            .w_full()
            .justify_between()
            .items_center()
            .py_1()
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(div().size(px(8.)).rounded_full().bg(color))
                    .child(Label::new(row.kind.label()).text_sm()),
            )
            .child(value)
            .into_any_element()
    }

    fn render_additive_card(&self, additive: &Additive, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let description = if additive.description.trim().is_empty() {
            "No description available.".to_string()
        } else {
            additive.description.clone()
        };

        v_flex()
            .gap_2()
            .p_3()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.secondary)
            .child(
                h_flex()
                    .justify_between()
                    .items_center()
                    .child(
                        Label::new(format!("{} ({})", additive.name, additive.code))
                            .text_sm()
                            .font_semibold(),
                    )
                    .child(
                        Button::new("close-additive")
                            .ghost()
                            .small()
                            .icon(IconName::Close)
                            .on_click(cx.listener(|this, _, _, cx| this.close_additive(cx))),
                    ),
            )
            .child(
                Label::new(additive.risk.label())
                    .text_xs()
                    .text_color(theme.muted_foreground),
            )
            .child(Label::new(description).text_sm())
    }
}

impl Render for HealthDataView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let negatives = negative_rows(&self.product);
        let positives = positive_rows(&self.product);
        let selected = self
            .selected_additive
            .and_then(|index| self.product.additives.get(index))
            .cloned();
        let product_name = if self.product.name.trim().is_empty() {
            "Unnamed product".to_string()
        } else {
            self.product.name.clone()
        };

        v_flex()
            .id("health-data-view")
            .size_full()
            .min_h_0()
            .overflow_y_scroll()
            .gap_4()
            .child(
                v_flex()
                    .gap_1()
                    .child(Label::new("Product Analysis").text_lg().font_semibold())
                    .child(
                        Label::new(product_name)
                            .text_sm()
                            .text_color(cx.theme().muted_foreground),
                    ),
            )
            .child(self.render_section("Negatives", negatives, cx))
            .child(self.render_section("Positives", positives, cx))
            .when_some(selected, |column, additive| {
                column.child(self.render_additive_card(&additive, cx))
            })
    }
}

fn level_color(level: MetricLevel, cx: &App) -> Hsla {
    let theme = cx.theme();
    match level {
        MetricLevel::Good => theme.success,
        MetricLevel::Moderate => theme.warning,
        MetricLevel::Poor => theme.danger,
    }
}
