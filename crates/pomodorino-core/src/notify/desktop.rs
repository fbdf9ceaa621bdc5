//! Desktop notification channel.

use notify_rust::Notification;

use crate::error::NotifyError;
use crate::timer::Mode;

/// Fixed notification title.
pub const PRODUCT_NAME: &str = "Pomodoro Timer";

/// Show the completion notification for a mode.
pub fn show_completion(mode: Mode) -> Result<(), NotifyError> {
    show(&format!("\"{}\" session complete!", mode.label()))
}

/// Show the fixed test notification.
pub fn show_test() -> Result<(), NotifyError> {
    show("Test notification from Pomodoro Timer.")
}

fn show(body: &str) -> Result<(), NotifyError> {
    Notification::new()
        .summary(PRODUCT_NAME)
        .body(body)
        .show()
        .map(|_| ())
        .map_err(|e| NotifyError::Desktop(e.to_string()))
}
