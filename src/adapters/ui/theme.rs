//! Prompt styling for the light and dark themes.

use crate::domain::Theme;
use inquire::ui::{Attributes, Color, RenderConfig, StyleSheet, Styled};

pub fn render_config(theme: Theme) -> RenderConfig<'static> {
    let (accent, muted) = match theme {
        Theme::Light => (Color::DarkCyan, Color::DarkGrey),
        Theme::Dark => (Color::LightCyan, Color::Grey),
    };
    RenderConfig::default()
        .with_prompt_prefix(Styled::new("?").with_fg(accent))
        .with_answered_prompt_prefix(Styled::new("✔").with_fg(accent))
        .with_highlighted_option_prefix(Styled::new("›").with_fg(accent))
        .with_answer(StyleSheet::new().with_fg(accent).with_attr(Attributes::BOLD))
        .with_help_message(StyleSheet::new().with_fg(muted))
}

/// Apply `theme` to every subsequent inquire prompt.
pub fn apply(theme: Theme) {
    inquire::set_global_render_config(render_config(theme));
}
