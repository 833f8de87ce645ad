mod ui;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs;
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use mailnav::history::{History, Recall};
use mailnav::{Config, Mode, Navigator};
use ui::{render_folders, render_index, render_message, render_status, SHOWN_HEADERS};

/// Front-end state around the navigator: prompt, history and status line.
struct Tui {
    nav: Navigator,
    history: History,
    recall: Recall,
    prompt: Option<String>,
    status: Option<String>,
    // Headers and body of the open message.
    reading: Option<(Vec<(&'static str, String)>, Vec<String>)>,
    should_quit: bool,
}

fn main() -> Result<()> {
    init_logging()?;

    let config = Config::load();
    tracing::info!(prefix = %config.prefix_path().display(), "starting mailnav");
    let mut tui = Tui {
        nav: Navigator::new(config),
        history: History::new(),
        recall: Recall::default(),
        prompt: None,
        status: None,
        reading: None,
        should_quit: false,
    };
    if tui.nav.mode() == Mode::Message {
        tui.nav.set_mode(Mode::Maildir);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut tui);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Log to `~/.cache/mailnav/mailnav.log`; the screen belongs to the UI.
fn init_logging() -> Result<()> {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("mailnav")) else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("mailnav.log"))?;

    let filter = EnvFilter::try_from_env("MAILNAV_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, tui: &mut Tui) -> Result<()> {
    while !tui.should_quit {
        terminal.draw(|f| render(tui, f))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if tui.prompt.is_some() {
                handle_prompt_key(tui, key);
                continue;
            }
            tui.status = None;
            match tui.nav.mode() {
                Mode::Maildir => handle_maildir_key(tui, key),
                Mode::Index => handle_index_key(tui, key),
                Mode::Message => handle_message_key(tui, key),
            }
        }
    }
    Ok(())
}

fn render(tui: &mut Tui, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    let theme = tui.nav.config().theme.clone();
    match tui.nav.mode() {
        Mode::Maildir => {
            let folders = tui.nav.folder_records();
            let selected = tui.nav.selected_folder_index();
            render_folders(f, chunks[0], &folders, selected, tui.nav.folder_filter(), &theme);
        }
        Mode::Index => {
            let messages = tui.nav.message_records();
            let selected = tui.nav.selected_message_index();
            render_index(f, chunks[0], &messages, selected, tui.nav.index_limit(), &theme);
        }
        Mode::Message => {
            let offset = tui.nav.message_offset();
            if let Some((headers, body)) = &tui.reading {
                let headers: Vec<(&str, String)> =
                    headers.iter().map(|(k, v)| (*k, v.clone())).collect();
                render_message(f, chunks[0], &headers, body, offset, &theme);
            }
        }
    }

    render_status(
        f,
        chunks[1],
        tui.nav.mode(),
        tui.prompt.as_deref(),
        tui.status.as_deref(),
        &theme,
    );
}

fn report(tui: &mut Tui, result: mailnav::Result<impl Sized>) {
    if let Err(e) = result {
        tracing::warn!("{}", e);
        tui.status = Some(e.to_string());
    }
}

fn handle_maildir_key(tui: &mut Tui, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => tui.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => tui.nav.scroll_maildir_down(1),
        KeyCode::Char('k') | KeyCode::Up => tui.nav.scroll_maildir_up(1),
        KeyCode::Char(' ') => {
            let result = tui.nav.toggle_folder(None);
            report(tui, result);
        }
        KeyCode::Enter => match tui.nav.set_selected_folder(None) {
            Ok(()) => tui.nav.set_mode(Mode::Index),
            Err(e) => report(tui, Err::<(), _>(e)),
        },
        KeyCode::Char('a') => tui.nav.set_folder_filter("all"),
        KeyCode::Char('n') => tui.nav.set_folder_filter("new"),
        KeyCode::Char('/') => open_prompt(tui),
        _ => {}
    }
}

fn handle_index_key(tui: &mut Tui, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            tui.nav.refresh_counts();
            tui.nav.set_mode(Mode::Maildir);
        }
        KeyCode::Char('j') | KeyCode::Down => tui.nav.scroll_index_down(1),
        KeyCode::Char('k') | KeyCode::Up => tui.nav.scroll_index_up(1),
        KeyCode::Enter => open_message(tui),
        KeyCode::Char('N') => {
            let result = tui.nav.mark_new(None);
            report(tui, result);
        }
        KeyCode::Char('d') => {
            let result = tui.nav.delete_message(None);
            report(tui, result);
        }
        KeyCode::Char('/') => open_prompt(tui),
        _ => {}
    }
}

fn handle_message_key(tui: &mut Tui, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            tui.reading = None;
            tui.nav.set_mode(Mode::Index);
        }
        KeyCode::Char('j') | KeyCode::Down => tui.nav.scroll_message_down(1),
        KeyCode::Char('k') | KeyCode::Up => tui.nav.scroll_message_up(1),
        _ => {}
    }
}

/// Load the selected message for reading and mark it read.
fn open_message(tui: &mut Tui) {
    let body = match tui.nav.body(None) {
        Ok(body) => body,
        Err(e) => return report(tui, Err::<(), _>(e)),
    };
    let headers = SHOWN_HEADERS
        .iter()
        .map(|&name| {
            let value = tui.nav.header(name, None).ok().flatten().unwrap_or_default();
            (name, value)
        })
        .collect();

    let marked = tui.nav.mark_read(None);
    report(tui, marked);
    tui.reading = Some((headers, body));
    tui.nav.jump_message_to(0);
    tui.nav.set_mode(Mode::Message);
}

fn open_prompt(tui: &mut Tui) {
    tui.prompt = Some(String::new());
    tui.recall = Recall::default();
}

fn handle_prompt_key(tui: &mut Tui, key: KeyEvent) {
    let Some(input) = tui.prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => tui.prompt = None,
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) => input.push(c),
        KeyCode::Up => {
            if let Some(entry) = tui.recall.older(&tui.history) {
                *input = entry.to_string();
            }
        }
        KeyCode::Down => {
            *input = tui.recall.newer(&tui.history).unwrap_or_default().to_string();
        }
        KeyCode::Enter => {
            let pattern = std::mem::take(input);
            tui.prompt = None;
            tui.history.add(&pattern);
            let found = match tui.nav.mode() {
                Mode::Maildir => tui.nav.scroll_maildir_to(&pattern),
                _ => tui.nav.scroll_index_to(&pattern),
            };
            if found.is_none() {
                tui.status = Some(format!("no match for {}", pattern));
            }
        }
        _ => {}
    }
}
