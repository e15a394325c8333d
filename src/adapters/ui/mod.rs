pub mod banner;
pub mod progress;
pub mod theme;
pub mod tui;

use crate::domain::Theme;

/// Prints the welcome banner and applies the default theme for all subsequent inquire prompts.
/// Call once at startup (e.g. in main after tracing init).
pub fn init_ui() {
    banner::print_welcome(Theme::default());
    theme::apply(Theme::default());
}
