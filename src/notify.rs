//! User notifications raised by store actions.

use crate::console::Console;

/// Kind of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Displays messages to the user on behalf of the store.
pub trait Notifier: Send + Sync {
    /// Shows a transient notification.
    fn notify(&self, message: &str, kind: NotificationKind);

    /// Shows a message the user must acknowledge.
    fn alert(&self, message: &str);
}

/// Notifier writing to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    console: Console,
}

impl ConsoleNotifier {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => self.console.success(message),
            NotificationKind::Info => self.console.info(message),
            NotificationKind::Warning => self.console.warning(message),
            NotificationKind::Error => self.console.error(message),
        }
    }

    fn alert(&self, message: &str) {
        self.console.error(message);
    }
}
