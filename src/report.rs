//! Failure presentation.
//!
//! All failures of a run end up here exactly once, converted into one message
//! with a fixed prefix so users can tell bootstrap failures apart from errors the
//! updater reports later.

use std::path::Path;

use crate::error::SetupError;

const ERROR_PREFIX: &str = "An error occurred while running setup. ";
const UNKNOWN_MESSAGE: &str =
    "An unknown error occurred while running setup. Please contact the application author.";
const DEFAULT_NAME: &str = "Setup";

/// Receives the final user-facing failure message.
pub trait Reporter {
    fn show_error(&self, title: &str, message: &str);
}

/// Shows a modal error dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogReporter;

impl Reporter for DialogReporter {
    fn show_error(&self, title: &str, message: &str) {
        let _ = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// The complete message for `err`.
pub fn message_for(err: &SetupError) -> String {
    if err.is_unknown() {
        return UNKNOWN_MESSAGE.to_string();
    }
    format!("{ERROR_PREFIX}{}", err.user_message())
}

/// Dialog title for an executable at `exe`: `"<file name> Error"`.
///
/// Falls back to `Setup` when the path has no directory part or no usable file
/// name.
pub fn title_for(exe: &Path) -> String {
    let has_separator = exe.parent().is_some_and(|dir| !dir.as_os_str().is_empty());
    let name = has_separator
        .then(|| exe.file_name())
        .flatten()
        .map(|name| name.to_string_lossy())
        .filter(|name| name.chars().count() >= 2)
        .map_or_else(|| DEFAULT_NAME.to_string(), |name| name.into_owned());
    format!("{name} Error")
}

/// Logs `err` and hands the message to `reporter`.
pub fn present(reporter: &dyn Reporter, exe: &Path, err: &SetupError) {
    tracing::error!("setup failed: {err}");
    reporter.show_error(&title_for(exe), &message_for(err));
}
