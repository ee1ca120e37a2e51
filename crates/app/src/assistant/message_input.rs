use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
};

use crate::assistant::events::DraftRestored;
use crate::assistant::send::SendRejected;
use crate::assistant::store::ConversationStore;

/// What a plain or secondary enter press should do to the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    Submit,
    Keep,
}

/// Tells the enter that follows a shift+enter apart from a real submit.
///
/// The editor reports shift+enter as a normal enter right after the key-down
/// handler has inserted the line break, so the key-down arms the guard and the
/// enter event disarms it.
#[derive(Debug, Default)]
pub struct LineBreakGuard {
    armed: bool,
}

impl LineBreakGuard {
    pub fn line_break_inserted(&mut self) {
        self.armed = true;
    }

    pub fn enter_pressed(&mut self, secondary: bool) -> EnterAction {
        let armed = std::mem::take(&mut self.armed);
        if secondary || armed {
            EnterAction::Keep
        } else {
            EnterAction::Submit
        }
    }

    pub fn reset(&mut self) {
        self.armed = false;
    }
}

/// The editor has already inserted the enter's line break when the event fires.
pub fn submitted_text(value: &str) -> &str {
    value.strip_suffix('\n').unwrap_or(value)
}

/// Draft editor bound to a conversation store. Disabled while a send is in flight.
pub struct MessageInput {
    store: Entity<ConversationStore>,
    editor: Entity<InputState>,
    line_break: LineBreakGuard,
}

impl MessageInput {
    pub fn new(
        store: Entity<ConversationStore>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let draft = store.read(cx).draft().to_string();
        let editor = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder("Ask about a product or ingredient...")
                .auto_grow(1, 6)
                .default_value(draft)
        });

        cx.subscribe_in(&editor, window, Self::on_editor_event).detach();
        cx.subscribe_in(&store, window, |this, _, restored: &DraftRestored, window, cx| {
            this.replace_text(restored.draft.clone(), window, cx);
        })
        .detach();
        cx.observe(&store, |_, _, cx| cx.notify()).detach();

        Self {
            store,
            editor,
            line_break: LineBreakGuard::default(),
        }
    }

    fn on_editor_event(
        &mut self,
        editor: &Entity<InputState>,
        event: &InputEvent,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        match event {
            InputEvent::Change => {
                let draft = editor.read(cx).value().to_string();
                self.store.update(cx, |store, _| store.set_draft(draft));
            }
            InputEvent::PressEnter { secondary } => {
                if self.line_break.enter_pressed(*secondary) == EnterAction::Submit {
                    let text = submitted_text(&editor.read(cx).value()).to_string();
                    self.submit(text, window, cx);
                }
            }
            _ => {}
        }
    }

    fn is_loading(&self, cx: &App) -> bool {
        self.store.read(cx).is_loading()
    }

    fn replace_text(&mut self, text: String, window: &mut Window, cx: &mut Context<Self>) {
        self.editor
            .update(cx, |editor, cx| editor.set_value(text, window, cx));
    }

    fn on_key_down(&mut self, event: &KeyDownEvent, window: &mut Window, cx: &mut Context<Self>) {
        let keystroke = &event.keystroke;
        if keystroke.key != "enter" || !keystroke.modifiers.shift || self.is_loading(cx) {
            return;
        }

        self.line_break.line_break_inserted();
        self.editor
            .update(cx, |editor, cx| editor.insert("\n", window, cx));
    }

    fn submit(&mut self, text: String, window: &mut Window, cx: &mut Context<Self>) {
        let sent = self.store.update(cx, |store, cx| {
            store.set_draft(text);
            store.send(cx)
        });

        match sent {
            Ok(ticket) => {
                tracing::debug!(ticket = ?ticket, "draft submitted");
                self.line_break.reset();
                self.replace_text(String::new(), window, cx);
            }
            Err(SendRejected::EmptyDraft) => {}
            Err(rejected) => tracing::debug!(reason = %rejected, "send rejected"),
        }
    }

    fn submit_current(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let text = self.editor.read(cx).value().to_string();
        self.submit(text, window, cx);
    }

    fn stop(&mut self, cx: &mut Context<Self>) {
        self.line_break.reset();
        self.store.update(cx, |store, cx| store.cancel(cx));
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let busy = self.is_loading(cx);

        let action = if busy {
            Button::new("stop-reply")
                .small()
                .danger()
                .icon(IconName::CircleX)
                .child("Stop")
                .on_click(cx.listener(|this, _, _, cx| this.stop(cx)))
        } else {
            Button::new("send-draft")
                .small()
                .primary()
                .icon(IconName::ArrowUp)
                .child("Send")
                .on_click(cx.listener(|this, _, window, cx| this.submit_current(window, cx)))
        };

        h_flex()
            .id("message-input")
            .w_full()
            .items_end()
            .gap_2()
            .pt_3()
            .border_t_1()
            .border_color(theme.border)
            .child(
                div()
                    .flex_1()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .on_key_down(cx.listener(Self::on_key_down))
                    .child(Input::new(&self.editor).w_full().disabled(busy)),
            )
            .child(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[::core::prelude::v1::test]
    fn plain_enter_submits() {
        let mut guard = LineBreakGuard::default();

        assert_eq!(guard.enter_pressed(false), EnterAction::Submit);
    }

    #[::core::prelude::v1::test]
    fn shift_enter_keeps_the_draft_once() {
        let mut guard = LineBreakGuard::default();
        guard.line_break_inserted();

        assert_eq!(guard.enter_pressed(false), EnterAction::Keep);
        assert_eq!(guard.enter_pressed(false), EnterAction::Submit);
    }

    #[::core::prelude::v1::test]
    fn secondary_enter_never_submits() {
        let mut guard = LineBreakGuard::default();

        assert_eq!(guard.enter_pressed(true), EnterAction::Keep);
    }

    #[::core::prelude::v1::test]
    fn reset_disarms_a_pending_line_break() {
        let mut guard = LineBreakGuard::default();
        guard.line_break_inserted();
        guard.reset();

        assert_eq!(guard.enter_pressed(false), EnterAction::Submit);
    }

    #[::core::prelude::v1::test]
    fn only_the_enter_line_break_is_dropped() {
        assert_eq!(submitted_text("low sodium?\n"), "low sodium?");
        assert_eq!(submitted_text("two\nlines"), "two\nlines");
        assert_eq!(submitted_text("kept\n\n"), "kept\n");
    }
}
