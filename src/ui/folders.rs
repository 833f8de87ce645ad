use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{List, ListItem, ListState},
    Frame,
};

use mailnav::app::FolderRecord;
use mailnav::config::ThemeConfig;

use super::pane::{block, truncate};

pub fn render_folders(
    f: &mut Frame,
    area: Rect,
    folders: &[FolderRecord],
    selected: usize,
    limit: &str,
    theme: &ThemeConfig,
) {
    let name_width = area.width.saturating_sub(20) as usize;

    let items: Vec<ListItem> = folders
        .iter()
        .map(|folder| {
            let mark = if folder.selected { "[x]" } else { "[ ]" };
            let text = format!(
                "{} {:w$} {:>5}/{:<5}",
                mark,
                truncate(&folder.name, name_width),
                folder.unread,
                folder.total,
                w = name_width,
            );
            let style = if folder.unread > 0 {
                Style::default().fg(theme.unread())
            } else {
                Style::default().fg(theme.fg())
            };
            ListItem::new(Line::styled(text, style))
        })
        .collect();

    let title = format!(" Maildirs ({}) limit: {} ", folders.len(), limit);
    let list = List::new(items)
        .block(block(title, theme))
        .highlight_style(
            Style::default()
                .bg(theme.selected_bg())
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !folders.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}
