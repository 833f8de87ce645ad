use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, ListState},
    Frame,
};

use mailnav::app::MessageRecord;
use mailnav::config::ThemeConfig;

use super::pane::{block, truncate};

pub fn render_index(
    f: &mut Frame,
    area: Rect,
    messages: &[MessageRecord],
    selected: usize,
    limit: &str,
    theme: &ThemeConfig,
) {
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = messages
        .iter()
        .map(|m| {
            let style = if m.flags.contains('N') {
                Style::default().fg(theme.unread()).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.fg())
            };
            ListItem::new(Line::styled(truncate(&m.line, width), style))
        })
        .collect();

    let title = format!(" Index ({}) limit: {} ", messages.len(), limit);
    let list = List::new(items)
        .block(block(title, theme))
        .highlight_style(Style::default().bg(theme.selected_bg()))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !messages.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}
