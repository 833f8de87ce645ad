use ratatui::{
    style::Style,
    widgets::{Block, Borders},
};

use mailnav::config::ThemeConfig;

/// Bordered block shared by every view.
pub fn block<'a>(title: String, theme: &ThemeConfig) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_active()))
        .title_style(Style::default().fg(theme.primary()))
        .title(title)
}

/// Cut to `max` characters, marking the cut with "...".
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max < 4 {
        return s.chars().take(max).collect();
    }
    let kept: String = s.chars().take(max - 3).collect();
    format!("{}...", kept)
}
