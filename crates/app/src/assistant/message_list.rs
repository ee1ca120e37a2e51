use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, text::TextView, v_flex, v_virtual_list};

use crate::assistant::list_scroll::ListScroll;
use crate::assistant::message::{Message, MessageId, Role};
use crate::assistant::navigation::FocusRing;

pub const EMPTY_CONVERSATION_LABEL: &str = "No messages yet";
pub const EMPTY_FILTER_LABEL: &str = "No messages match the current filter";

const FALLBACK_WIDTH: Pixels = px(640.);
const LIST_PADDING_X: Pixels = px(16.);
const ROW_INSET: Pixels = px(8.);
const HEADER_HEIGHT: Pixels = px(16.);
const HEADER_GAP: Pixels = px(6.);
const BUBBLE_MAX_WIDTH: Pixels = px(520.);
const BUBBLE_INSET_X: Pixels = px(12.);
const BUBBLE_INSET_Y: Pixels = px(8.);
const LINE_HEIGHT: Pixels = px(20.);
/// Average glyph advance of the small UI font.
const GLYPH_WIDTH: f32 = 7.5;

/// Row heights keyed by message id.
///
/// Messages never change after they are posted, so a measured height stays
/// valid until the list width changes.
#[derive(Debug, Default)]
pub struct RowHeights {
    width: Option<Pixels>,
    measured: HashMap<MessageId, Pixels>,
}

impl RowHeights {
    pub fn width(&self) -> Pixels {
        self.width.unwrap_or(FALLBACK_WIDTH)
    }

    /// Returns true when `width` differs from the one measurements were taken at.
    pub fn set_width(&mut self, width: Pixels) -> bool {
        if self
            .width
            .is_some_and(|current| (f32::from(current) - f32::from(width)).abs() < 1.0)
        {
            return false;
        }

        self.width = Some(width);
        self.measured.clear();
        true
    }

    pub fn height(&self, message: &Message) -> Pixels {
        self.measured
            .get(&message.id)
            .copied()
            .unwrap_or_else(|| estimate_row_height(message, self.width()))
    }

    /// Returns true when the stored height changed.
    pub fn record(&mut self, id: MessageId, height: Pixels) -> bool {
        let previous = self.measured.insert(id, height);
        previous.is_none_or(|previous| (f32::from(previous) - f32::from(height)).abs() > 0.5)
    }

    pub fn retain(&mut self, ids: &HashSet<MessageId>) {
        self.measured.retain(|id, _| ids.contains(id));
    }

    fn sizes(&self, messages: &[Message]) -> Rc<Vec<Size<Pixels>>> {
        Rc::new(
            messages
                .iter()
                .map(|message| size(px(0.), self.height(message)))
                .collect(),
        )
    }
}

fn wrapped_lines(text: &str, width: Pixels) -> usize {
    let per_line = ((f32::from(width) / GLYPH_WIDTH) as usize).max(1);
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(per_line).max(1))
        .sum()
}

/// Height guess used until a row has been laid out once.
pub fn estimate_row_height(message: &Message, width: Pixels) -> Pixels {
    let body = match message.role {
        Role::User => {
            let bubble = if width < BUBBLE_MAX_WIDTH { width } else { BUBBLE_MAX_WIDTH };
            let text_width = bubble - BUBBLE_INSET_X * 2;
            LINE_HEIGHT * wrapped_lines(&message.content, text_width) + BUBBLE_INSET_Y * 2
        }
        Role::Assistant => LINE_HEIGHT * wrapped_lines(&message.content, width),
    };

    ROW_INSET * 2 + HEADER_HEIGHT + HEADER_GAP + body
}

/// Virtualized rows for the filtered conversation.
///
/// Every row is focusable; the focus handles live in a [`FocusRing`] indexed by row.
pub struct MessageList {
    rows: Vec<Message>,
    empty_label: &'static str,
    heights: RowHeights,
    sizes: Rc<Vec<Size<Pixels>>>,
    focus_ring: FocusRing<FocusHandle>,
    scroll: ListScroll,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            rows: Vec::new(),
            empty_label: EMPTY_CONVERSATION_LABEL,
            heights: RowHeights::default(),
            sizes: Rc::new(Vec::new()),
            focus_ring: FocusRing::new(),
            scroll: ListScroll::new(),
        }
    }

    /// Replaces the rows. `filtered` selects which empty-state label applies.
    pub fn set_messages(&mut self, rows: Vec<Message>, filtered: bool, cx: &mut Context<Self>) {
        let extends = rows.len() >= self.rows.len()
            && self
                .rows
                .iter()
                .zip(&rows)
                .all(|(before, after)| before.id == after.id);
        if !extends {
            self.scroll.rows_replaced();
        }

        self.heights
            .retain(&rows.iter().map(|message| message.id).collect());
        self.rows = rows;
        self.empty_label = if filtered {
            EMPTY_FILTER_LABEL
        } else {
            EMPTY_CONVERSATION_LABEL
        };
        self.focus_ring
            .resize_with(self.rows.len(), || cx.focus_handle());
        self.sizes = self.heights.sizes(&self.rows);
        cx.notify();
    }

    /// Row position holding focus, or `None` when focus is outside the list.
    pub fn focused_row(&self, window: &Window) -> Option<usize> {
        self.focus_ring.position(|handle| handle.is_focused(window))
    }

    pub fn row_count(&self) -> usize {
        self.focus_ring.len()
    }

    /// Moves focus to `row` and scrolls it into view.
    pub fn focus_row(&mut self, row: usize, window: &mut Window, cx: &mut Context<Self>) {
        let Some(handle) = self.focus_ring.get(row) else {
            return;
        };

        handle.focus(window);
        self.scroll.reveal_row(row);
        cx.notify();
    }

    fn sync_width(&mut self) {
        let width = self.scroll.bounds().size.width - LIST_PADDING_X * 2;
        if width > Pixels::ZERO && self.heights.set_width(width) {
            self.sizes = self.heights.sizes(&self.rows);
        }
    }

    fn measure(&mut self, range: Range<usize>, window: &mut Window, cx: &mut Context<Self>) {
        let space = size(
            AvailableSpace::Definite(self.heights.width()),
            AvailableSpace::MinContent,
        );
        let mut changed = false;

        for index in range {
            let Some(message) = self.rows.get(index).cloned() else {
                continue;
            };
            let height = self
                .render_row(&message, index, cx)
                .layout_as_root(space, window, cx)
                .height;
            changed |= self.heights.record(message.id, height);
        }

        if changed {
            self.sizes = self.heights.sizes(&self.rows);
            cx.notify();
        }
    }

    fn render_row(&self, message: &Message, index: usize, cx: &Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let from_user = message.role == Role::User;

        let body = if from_user {
            div()
                .max_w(BUBBLE_MAX_WIDTH)
                .px(BUBBLE_INSET_X)
                .py(BUBBLE_INSET_Y)
                .rounded_lg()
                .bg(theme.accent)
                .text_color(theme.accent_foreground)
                .child(Label::new(message.content.clone()).text_sm())
                .into_any_element()
        } else if message.content.trim().is_empty() {
            Label::new("(empty response)")
                .text_sm()
                .text_color(theme.muted_foreground)
                .into_any_element()
        } else {
            TextView::markdown(
                ElementId::Name(format!("assistant-reply-{}", message.id.0).into()),
                message.content.clone(),
            )
            .selectable(true)
            .into_any_element()
        };

        let mut row = v_flex()
            .id(("message-row", index))
            .w_full()
            .p(ROW_INSET)
            .gap(HEADER_GAP)
            .rounded_md()
            .border_1()
            .border_color(transparent_black())
            .child(
                h_flex()
                    .gap_2()
                    .when(from_user, |header| header.justify_end())
                    .text_xs()
                    .child(Label::new(message.role.label()).text_color(theme.foreground.opacity(0.6)))
                    .child(Label::new(message.time_label()).text_color(theme.muted_foreground)),
            )
            .child(
                h_flex()
                    .w_full()
                    .when(from_user, |line| line.justify_end())
                    .child(body),
            );

        if let Some(handle) = self.focus_ring.get(index) {
            let ring = theme.ring;
            let click_handle = handle.clone();
            row = row
                .track_focus(handle)
                .focus(move |style| style.border_color(ring))
                .on_click(move |_, window, _| click_handle.focus(window));
        }

        row.into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.rows.is_empty() {
            return v_flex()
                .size_full()
                .items_center()
                .justify_center()
                .child(
                    Label::new(self.empty_label)
                        .text_sm()
                        .text_color(cx.theme().muted_foreground),
                )
                .into_any_element();
        }

        self.sync_width();
        self.scroll.apply();

        v_virtual_list(
            cx.entity().clone(),
            "message-list",
            self.sizes.clone(),
            |this, range, window, cx| {
                this.measure(range.clone(), window, cx);
                range
                    .filter_map(|index| {
                        let message = this.rows.get(index)?.clone();
                        Some(this.render_row(&message, index, cx))
                    })
                    .collect::<Vec<_>>()
            },
        )
        .size_full()
        .px(LIST_PADDING_X)
        .py_3()
        .track_scroll(self.scroll.handle())
        .into_any_element()
    }
}
