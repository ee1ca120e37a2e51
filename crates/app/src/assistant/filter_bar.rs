use gpui::*;
use gpui_component::{
    ActiveTheme, Icon, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
};

use crate::assistant::events::{FilterBarClosed, FilterChanged};
use crate::assistant::filter::RoleFilter;

/// Search field, role buttons and close button shown above the message list.
pub struct FilterBar {
    search: Entity<InputState>,
    role_filter: RoleFilter,
}

impl EventEmitter<FilterChanged> for FilterBar {}
impl EventEmitter<FilterBarClosed> for FilterBar {}

impl FilterBar {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let search = cx.new(|cx| InputState::new(window, cx).placeholder("Search messages..."));

        cx.subscribe(&search, |_, state, event: &InputEvent, cx| {
            if matches!(event, InputEvent::Change) {
                let term = state.read(cx).value().to_string();
                cx.emit(FilterChanged::SearchTerm(term));
            }
        })
        .detach();

        Self {
            search,
            role_filter: RoleFilter::default(),
        }
    }

    pub fn focus_search(&self, window: &mut Window, cx: &mut Context<Self>) {
        self.search.update(cx, |state, cx| state.focus(window, cx));
    }

    fn select_role(&mut self, role_filter: RoleFilter, cx: &mut Context<Self>) {
        if self.role_filter == role_filter {
            return;
        }

        self.role_filter = role_filter;
        cx.emit(FilterChanged::Role(role_filter));
        cx.notify();
    }
}

impl Render for FilterBar {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let active = self.role_filter;

        let role_buttons = RoleFilter::ALL.into_iter().map(|role_filter| {
            let button = Button::new(SharedString::from(format!("role-filter-{}", role_filter.label())))
                .small()
                .label(role_filter.label())
                .on_click(cx.listener(move |this, _, _, cx| this.select_role(role_filter, cx)));

            if role_filter == active {
                button.primary()
            } else {
                button.ghost()
            }
        });

        h_flex()
            .w_full()
            .gap_2()
            .p_2()
            .rounded_lg()
            .bg(theme.secondary)
            .child(
                Icon::new(IconName::Search)
                    .small()
                    .text_color(theme.muted_foreground),
            )
            .child(div().flex_1().child(Input::new(&self.search).small()))
            .children(role_buttons)
            .child(
                Button::new("close-filters")
                    .ghost()
                    .small()
                    .icon(IconName::Close)
                    .tooltip("Close search")
                    .on_click(cx.listener(|_, _, _, cx| cx.emit(FilterBarClosed))),
            )
    }
}
