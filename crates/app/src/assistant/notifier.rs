use std::rc::Rc;

use gpui::*;
use gpui_component::button::{Button, ButtonVariants};
use gpui_component::notification::{Notification, NotificationList, NotificationType};
use gpui_component::Sizable;

/// How loudly a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeSeverity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl From<NoticeSeverity> for NotificationType {
    fn from(severity: NoticeSeverity) -> Self {
        match severity {
            NoticeSeverity::Info => NotificationType::Info,
            NoticeSeverity::Success => NotificationType::Success,
            NoticeSeverity::Warning => NotificationType::Warning,
            NoticeSeverity::Error => NotificationType::Error,
        }
    }
}

/// Button attached to a notice. Clicking it runs the handler and dismisses the notice.
#[derive(Clone)]
pub struct NoticeAction {
    pub label: SharedString,
    pub handler: Rc<dyn Fn(&mut Window, &mut App)>,
}

#[derive(Clone)]
pub struct Notice {
    pub title: SharedString,
    pub description: SharedString,
    pub severity: NoticeSeverity,
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn new(
        title: impl Into<SharedString>,
        description: impl Into<SharedString>,
        severity: NoticeSeverity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            action: None,
        }
    }

    pub fn with_action(
        mut self,
        label: impl Into<SharedString>,
        handler: impl Fn(&mut Window, &mut App) + 'static,
    ) -> Self {
        self.action = Some(NoticeAction {
            label: label.into(),
            handler: Rc::new(handler),
        });
        self
    }
}

/// Surfaces notices to the user.
pub trait Notifier {
    fn notify(&self, notice: Notice, window: &mut Window, cx: &mut App);
}

/// Pushes notices onto the window's notification list.
#[derive(Clone)]
pub struct NotificationListNotifier {
    list: Entity<NotificationList>,
}

impl NotificationListNotifier {
    pub fn new(list: Entity<NotificationList>) -> Self {
        Self { list }
    }

    fn build(notice: Notice) -> Notification {
        let has_action = notice.action.is_some();
        let mut notification = Notification::new()
            .title(notice.title)
            .message(notice.description)
            .with_type(notice.severity.into())
            .autohide(!has_action);

        if let Some(action) = notice.action {
            notification = notification.action(move |_, cx| {
                let action = action.clone();
                Button::new("notice-action")
                    .outline()
                    .small()
                    .label(action.label.clone())
                    .on_click(cx.listener(move |this, _, window, cx| {
                        (action.handler)(window, cx);
                        this.dismiss(window, cx);
                    }))
            });
        }

        notification
    }
}

impl Notifier for NotificationListNotifier {
    fn notify(&self, notice: Notice, window: &mut Window, cx: &mut App) {
        tracing::debug!(title = %notice.title, severity = ?notice.severity, "pushing notice");
        let notification = Self::build(notice);
        self.list.update(cx, |list, cx| list.push(notification, window, cx));
    }
}
