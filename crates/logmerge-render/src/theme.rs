use ratatui::style::{Modifier, Style};

/// Color theme for rendered output
pub struct Theme;

impl Theme {
    /// `timestamp store/controller component: ` prefix
    pub fn header() -> Style {
        Style::default().add_modifier(Modifier::BOLD)
    }

    /// Message text no rule has touched
    pub fn text() -> Style {
        Style::default()
    }
}
