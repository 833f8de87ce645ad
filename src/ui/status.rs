use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use mailnav::config::ThemeConfig;
use mailnav::Mode;

/// Bottom line: the open prompt if any, otherwise key hints, then status.
pub fn render_status(
    f: &mut Frame,
    area: Rect,
    mode: Mode,
    prompt: Option<&str>,
    status: Option<&str>,
    theme: &ThemeConfig,
) {
    let key_style = Style::default().fg(theme.primary());
    let text_style = Style::default().fg(theme.fg_muted());

    let hints: &[(&str, &str)] = match mode {
        Mode::Maildir => &[
            ("j/k", "nav"),
            ("space", "toggle"),
            ("Enter", "open"),
            ("a/n", "all/new"),
            ("/", "search"),
            ("q", "quit"),
        ],
        Mode::Index => &[
            ("j/k", "nav"),
            ("Enter", "read"),
            ("N", "unread"),
            ("d", "delete"),
            ("/", "search"),
            ("q", "back"),
        ],
        Mode::Message => &[("j/k", "scroll"), ("q", "back")],
    };

    let mut line = match prompt {
        Some(input) => Line::from(vec![
            Span::styled("/", key_style),
            Span::styled(input.to_string(), Style::default().fg(theme.fg())),
            Span::styled("_", key_style),
        ]),
        None => Line::from(
            hints
                .iter()
                .flat_map(|(key, what)| {
                    [
                        Span::styled(*key, key_style),
                        Span::styled(format!(" {}  ", what), text_style),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    if let Some(msg) = status {
        line.spans.push(Span::styled("  | ", Style::default().fg(theme.border())));
        line.spans.push(Span::styled(msg.to_string(), Style::default().fg(theme.error())));
    }

    f.render_widget(Paragraph::new(line).style(Style::default().bg(theme.bg())), area);
}
