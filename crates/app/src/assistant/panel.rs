use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, v_flex};

use crate::assistant::events::{FilterBarClosed, FilterChanged, SendFailed};
use crate::assistant::filter::{FilterState, FilteredView};
use crate::assistant::filter_bar::FilterBar;
use crate::assistant::header::AssistantHeader;
use crate::assistant::message_input::MessageInput;
use crate::assistant::message_list::MessageList;
use crate::assistant::mode::AssistantMode;
use crate::assistant::navigation::{KeyboardNavigator, NavEffect, NavKey};
use crate::assistant::notifier::{Notice, NoticeSeverity, Notifier};
use crate::assistant::retry::FailureReporter;
use crate::assistant::store::ConversationStore;
use crate::assistant::visualization::AssistantVisualization;
use crate::components::{LoadingSpinner, SpinnerSize};
use crate::health::HealthDataView;

pub const PANEL_KEY_CONTEXT: &str = "AssistantPanel";
pub const LOADING_OVERLAY_LABEL: &str = "Processing your request...";

actions!(
    assistant_panel,
    [OpenFilters, CloseFilters, FocusPreviousMessage, FocusNextMessage]
);

/// Key bindings scoped to the panel's key context.
pub fn bind_keys(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("ctrl-f", OpenFilters, Some(PANEL_KEY_CONTEXT)),
        KeyBinding::new("escape", CloseFilters, Some(PANEL_KEY_CONTEXT)),
        KeyBinding::new("up", FocusPreviousMessage, Some(PANEL_KEY_CONTEXT)),
        KeyBinding::new("down", FocusNextMessage, Some(PANEL_KEY_CONTEXT)),
    ]);
}

/// The AI assistant panel: chat with filtering in conversational mode, product
/// metrics in health-analysis mode.
pub struct AssistantPanel {
    store: Entity<ConversationStore>,
    notifier: Rc<dyn Notifier>,
    failures: FailureReporter,
    navigator: KeyboardNavigator,
    filter: FilterState,
    filtered: FilteredView,
    filter_bar: Entity<FilterBar>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    health_view: Entity<HealthDataView>,
    focus_handle: FocusHandle,
    _subscriptions: Vec<Subscription>,
}

impl AssistantPanel {
    pub fn new(
        store: Entity<ConversationStore>,
        mode: AssistantMode,
        notifier: Rc<dyn Notifier>,
        health_view: Entity<HealthDataView>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        store.update(cx, |store, cx| store.set_mode(mode, cx));

        let filter_bar = cx.new(|cx| FilterBar::new(window, cx));
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(store.clone(), window, cx));

        let subscriptions = vec![
            cx.observe(&store, |this, _, cx| {
                this.refresh_rows(cx);
                cx.notify();
            }),
            cx.subscribe_in(&store, window, |this, _, event: &SendFailed, window, cx| {
                this.notify_send_failed(event, window, cx);
            }),
            cx.subscribe(&filter_bar, |this, _, event: &FilterChanged, cx| {
                match event {
                    FilterChanged::SearchTerm(term) => this.filter.search_term = term.clone(),
                    FilterChanged::Role(role_filter) => this.filter.role_filter = *role_filter,
                }
                this.refresh_rows(cx);
            }),
            cx.subscribe_in(&filter_bar, window, |this, _, _: &FilterBarClosed, window, cx| {
                this.navigator.close_filters();
                this.focus_handle.focus(window);
                cx.notify();
            }),
            cx.on_release(|this, cx| {
                this.store.update(cx, |store, cx| store.cancel(cx));
            }),
        ];

        let mut this = Self {
            store,
            notifier,
            failures: FailureReporter::new(),
            navigator: KeyboardNavigator::new(),
            filter: FilterState::default(),
            filtered: FilteredView::new(),
            filter_bar,
            message_list,
            message_input,
            health_view,
            focus_handle: cx.focus_handle(),
            _subscriptions: subscriptions,
        };
        this.refresh_rows(cx);
        this
    }

    pub fn mode(&self, cx: &App) -> AssistantMode {
        self.store.read(cx).mode()
    }

    pub fn set_mode(&mut self, mode: AssistantMode, cx: &mut Context<Self>) {
        self.store.update(cx, |store, cx| store.set_mode(mode, cx));
        cx.notify();
    }

    pub fn filters_visible(&self) -> bool {
        self.navigator.filters_visible()
    }

    fn refresh_rows(&mut self, cx: &mut Context<Self>) {
        let rows = {
            let store = self.store.read(cx);
            if !self
                .filtered
                .refresh(store.revision(), store.messages(), &self.filter)
            {
                return;
            }

            self.filtered
                .indices()
                .iter()
                .filter_map(|index| store.messages().get(*index).cloned())
                .collect::<Vec<_>>()
        };

        let filtered = !self.filter.is_identity();
        self.message_list
            .update(cx, |list, cx| list.set_messages(rows, filtered, cx));
    }

    fn notify_send_failed(&mut self, event: &SendFailed, window: &mut Window, cx: &mut Context<Self>) {
        let Some(claim) = self.failures.report(&event.notice) else {
            return;
        };
        let store = self.store.downgrade();
        let notice = Notice::new(
            event.notice.title,
            event.notice.description,
            NoticeSeverity::Error,
        )
        .with_action("Retry", move |_, cx| {
            let Some(ticket) = claim.take() else {
                return;
            };
            let result = store.update(cx, |store, cx| store.retry(ticket, cx));
            if let Ok(Err(rejected)) = result {
                tracing::debug!(ticket = ?ticket, reason = %rejected, "retry rejected");
            }
        });

        self.notifier.notify(notice, window, cx);
    }

    fn open_filters(&mut self, _: &OpenFilters, window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(NavKey::Find, window, cx);
    }

    fn close_filters(&mut self, _: &CloseFilters, window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(NavKey::Escape, window, cx);
    }

    fn focus_previous(
        &mut self,
        _: &FocusPreviousMessage,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.navigate(NavKey::ArrowUp, window, cx);
    }

    fn focus_next(&mut self, _: &FocusNextMessage, window: &mut Window, cx: &mut Context<Self>) {
        self.navigate(NavKey::ArrowDown, window, cx);
    }

    fn navigate(&mut self, key: NavKey, window: &mut Window, cx: &mut Context<Self>) {
        if self.mode(cx) != AssistantMode::Conversational {
            cx.propagate();
            return;
        }

        let (focused_row, row_count) = {
            let list = self.message_list.read(cx);
            (list.focused_row(window), list.row_count())
        };

        match self.navigator.handle(key, focused_row, row_count) {
            NavEffect::OpenFilters => {
                self.filter_bar
                    .update(cx, |bar, cx| bar.focus_search(window, cx));
                cx.notify();
            }
            NavEffect::CloseFilters => {
                self.focus_handle.focus(window);
                cx.notify();
            }
            NavEffect::FocusRow(row) => {
                self.message_list
                    .update(cx, |list, cx| list.focus_row(row, window, cx));
            }
            NavEffect::Ignored => cx.propagate(),
        }
    }

    /// The overlay covers only the history, so the input's Stop button stays usable.
    fn render_chat(&self, loading: bool, cx: &Context<Self>) -> impl IntoElement {
        v_flex()
            .flex_1()
            .min_h_0()
            .gap_3()
            .when(self.navigator.filters_visible(), |column| {
                column.child(self.filter_bar.clone())
            })
            .child(
                div()
                    .id("message-history")
                    .relative()
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone())
                    .when(loading, |history| {
                        history.child(self.render_loading_overlay(cx))
                    }),
            )
            .child(self.message_input.clone())
    }

    fn render_loading_overlay(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("assistant-loading-overlay")
            .absolute()
            .inset_0()
            .occlude()
            .flex()
            .items_center()
            .justify_center()
            .bg(theme.background.opacity(0.4))
            .child(
                div()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .shadow_lg()
                    .child(
                        LoadingSpinner::new("assistant-loading-spinner")
                            .size(SpinnerSize::Sm)
                            .message(LOADING_OVERLAY_LABEL),
                    ),
            )
    }
}

impl Focusable for AssistantPanel {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for AssistantPanel {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let (mode, model_id, loading) = {
            let store = self.store.read(cx);
            (
                store.mode(),
                SharedString::from(store.model_id().to_string()),
                store.is_loading(),
            )
        };
        let theme = cx.theme();

        let panel = v_flex()
            .id("assistant-panel")
            .key_context(PANEL_KEY_CONTEXT)
            .track_focus(&self.focus_handle)
            .on_action(cx.listener(Self::open_filters))
            .on_action(cx.listener(Self::close_filters))
            .on_action(cx.listener(Self::focus_previous))
            .on_action(cx.listener(Self::focus_next))
            .size_full()
            .min_h_0()
            .p_4()
            .gap_4()
            .rounded_lg()
            .border_1()
            .border_color(theme.border)
            .bg(theme.background)
            .child(AssistantHeader::new(mode, model_id))
            .child(AssistantVisualization::new(loading));

        match mode {
            AssistantMode::Conversational => panel.child(self.render_chat(loading, cx)),
            AssistantMode::HealthAnalysis => panel.child(self.health_view.clone()),
        }
    }
}
