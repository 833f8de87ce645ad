use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use mailnav::config::ThemeConfig;

use super::pane::block;

/// Headers shown above the body, in order.
pub const SHOWN_HEADERS: [&str; 4] = ["From", "To", "Subject", "Date"];

pub fn render_message(
    f: &mut Frame,
    area: Rect,
    headers: &[(&str, String)],
    body: &[String],
    offset: usize,
    theme: &ThemeConfig,
) {
    let key_style = Style::default()
        .fg(theme.primary())
        .add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(theme.fg());

    let mut lines: Vec<Line> = headers
        .iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{}: ", name), key_style),
                Span::styled(value.clone(), text_style),
            ])
        })
        .collect();
    lines.push(Line::raw(""));
    lines.extend(
        body.iter()
            .skip(offset)
            .map(|l| Line::styled(l.clone(), text_style)),
    );

    let paragraph = Paragraph::new(lines)
        .block(block(" Message ".to_string(), theme))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}
