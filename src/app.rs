use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mail::{self, Filter, Folder, Message};

/// Which list or view is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Maildir,
    Index,
    Message,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Maildir => "maildir",
            Mode::Index => "index",
            Mode::Message => "message",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "maildir" => Ok(Mode::Maildir),
            "index" => Ok(Mode::Index),
            "message" => Ok(Mode::Message),
            other => Err(Error::InvalidInput(format!("unknown mode: {}", other))),
        }
    }
}

/// One visible folder, as handed to a front-end or dumped as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRecord {
    pub path: PathBuf,
    pub name: String,
    pub total: usize,
    pub unread: usize,
    pub selected: bool,
}

/// One aggregated message with its rendered index line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRecord {
    pub path: PathBuf,
    pub flags: String,
    pub line: String,
}

/// Navigation and selection state for one running instance.
///
/// Folder cursor indexes the visible (filtered) folder list; the multi-select
/// set decides which folders feed the aggregated message list. Every cursor
/// is kept inside its list, or at 0 when the list is empty.
pub struct Navigator {
    config: Config,
    folders: Vec<Folder>,
    // Indices into `folders` passing `maildir_limit`.
    visible: Vec<usize>,
    selected_folder: usize,
    // Insertion ordered; aggregation follows this order.
    selected_folders: Vec<PathBuf>,
    messages: Vec<Message>,
    selected_message: usize,
    message_offset: usize,
    mode: Mode,
}

impl Navigator {
    /// Scan the folder universe under the configured prefix.
    pub fn new(config: Config) -> Self {
        let mode = config.global_mode;
        let mut nav = Self {
            config,
            folders: Vec::new(),
            visible: Vec::new(),
            selected_folder: 0,
            selected_folders: Vec::new(),
            messages: Vec::new(),
            selected_message: 0,
            message_offset: 0,
            mode,
        };
        nav.rescan();
        nav
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    // ---- string variables ----

    /// Every string variable with its current value.
    pub fn variables(&self) -> BTreeMap<String, String> {
        let mut vars = self.config.variables();
        vars.insert("global_mode".to_string(), self.mode.to_string());
        vars
    }

    /// Set a variable by name, applying its side effects.
    pub fn set_variable(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "maildir_prefix" => self.set_maildir_prefix(value),
            "maildir_limit" => {
                self.set_folder_filter(value);
                Ok(())
            }
            "index_limit" => {
                self.set_index_limit(value);
                Ok(())
            }
            "index_format" => {
                self.set_index_format(value);
                Ok(())
            }
            "global_mode" => {
                self.mode = value.parse()?;
                Ok(())
            }
            "date_formats" => {
                self.config.date_formats = value
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(())
            }
            other => Err(Error::InvalidInput(format!("unknown variable: {}", other))),
        }
    }

    /// Point at a new prefix directory, rescan the folder universe and
    /// rebuild the aggregated list.
    pub fn set_maildir_prefix(&mut self, prefix: &str) -> Result<()> {
        let previous = std::mem::replace(&mut self.config.maildir_prefix, prefix.to_string());
        if !self.config.prefix_path().is_dir() {
            let bad = std::mem::replace(&mut self.config.maildir_prefix, previous);
            return Err(Error::InvalidInput(format!("maildir_prefix is not a directory: {}", bad)));
        }
        self.rescan();
        self.rebuild_messages();
        Ok(())
    }

    // ---- folders ----

    /// Rediscover the folder universe, refilter and clamp the folder cursor.
    pub fn rescan(&mut self) {
        let prefix = self.config.prefix_path();
        self.folders = mail::discover(&prefix);
        self.apply_folder_filter();
    }

    /// Recount every folder in the universe without rediscovering it.
    pub fn refresh_counts(&mut self) {
        for folder in &mut self.folders {
            folder.scan();
        }
        self.apply_folder_filter();
    }

    pub fn folder_filter(&self) -> &str {
        &self.config.maildir_limit
    }

    /// Recount every folder and filter with `limit`, since mail may have
    /// arrived since the last scan.
    pub fn set_folder_filter(&mut self, limit: &str) {
        self.config.maildir_limit = limit.to_string();
        self.refresh_counts();
    }

    fn apply_folder_filter(&mut self) {
        let filter = Filter::parse(&self.config.maildir_limit);
        self.visible = self
            .folders
            .iter()
            .enumerate()
            .filter(|(_, f)| f.matches_filter(&filter))
            .map(|(i, _)| i)
            .collect();
        self.selected_folder = clamp(self.selected_folder, self.visible.len());
        tracing::debug!(
            universe = self.folders.len(),
            visible = self.visible.len(),
            limit = %filter,
            "filtered folders"
        );
    }

    pub fn universe_len(&self) -> usize {
        self.folders.len()
    }

    pub fn count_maildirs(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_folders(&self) -> impl Iterator<Item = &Folder> + '_ {
        self.visible.iter().map(|&i| &self.folders[i])
    }

    pub fn folder_records(&self) -> Vec<FolderRecord> {
        self.visible_folders()
            .map(|f| FolderRecord {
                path: f.path().to_path_buf(),
                name: f.name(),
                total: f.total(),
                unread: f.unread(),
                selected: self.is_folder_selected(f.path()),
            })
            .collect()
    }

    /// Universe paths passing the `all` / `new` / substring predicate.
    pub fn maildirs_matching(&self, pattern: &str) -> Vec<PathBuf> {
        let filter = Filter::parse(pattern);
        self.folders
            .iter()
            .filter(|f| f.matches_filter(&filter))
            .map(|f| f.path().to_path_buf())
            .collect()
    }

    pub fn selected_folder_index(&self) -> usize {
        self.selected_folder
    }

    /// Folder under the cursor.
    pub fn current_maildir(&self) -> Option<&Folder> {
        self.visible
            .get(self.selected_folder)
            .map(|&i| &self.folders[i])
    }

    /// The multi-selected folder paths, in selection order.
    pub fn current_maildirs(&self) -> &[PathBuf] {
        &self.selected_folders
    }

    pub fn is_folder_selected(&self, path: &Path) -> bool {
        self.selected_folders.iter().any(|p| p == path)
    }

    pub fn scroll_maildir_down(&mut self, step: usize) {
        self.jump_maildir_to(self.selected_folder.saturating_add(step));
    }

    pub fn scroll_maildir_up(&mut self, step: usize) {
        self.jump_maildir_to(self.selected_folder.saturating_sub(step));
    }

    pub fn jump_maildir_to(&mut self, index: usize) {
        self.selected_folder = clamp(index, self.visible.len());
    }

    /// Move the folder cursor to the visible folder with exactly this path.
    pub fn select_maildir(&mut self, path: &Path) -> bool {
        let pos = self.visible_folders().position(|f| f.path() == path);
        match pos {
            Some(i) => {
                self.selected_folder = i;
                true
            }
            None => false,
        }
    }

    /// Next visible folder after the cursor whose path contains `pattern`,
    /// wrapping once. The cursor is left alone on a miss; an empty pattern
    /// matches every folder.
    pub fn scroll_maildir_to(&mut self, pattern: &str) -> Option<usize> {
        let hit = wrap_search(self.selected_folder, self.visible.len(), |i| {
            self.folders[self.visible[i]]
                .path()
                .to_string_lossy()
                .contains(pattern)
        });
        if let Some(i) = hit {
            self.selected_folder = i;
        }
        hit
    }

    fn folder_target(&self, path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) if Folder::is_maildir(path) => Ok(path.to_path_buf()),
            Some(path) => Err(Error::NotMaildir(path.to_path_buf())),
            None => self
                .current_maildir()
                .map(|f| f.path().to_path_buf())
                .ok_or(Error::NoFolder),
        }
    }

    /// Flip membership of a folder (default: the one under the cursor) in
    /// the multi-select set. Returns whether it is now selected.
    pub fn toggle_folder(&mut self, path: Option<&Path>) -> Result<bool> {
        let target = self.folder_target(path)?;
        let now_selected = match self.selected_folders.iter().position(|p| *p == target) {
            Some(i) => {
                self.selected_folders.remove(i);
                false
            }
            None => {
                self.selected_folders.push(target);
                true
            }
        };
        self.reset_messages();
        Ok(now_selected)
    }

    pub fn add_selected_folder(&mut self, path: Option<&Path>) -> Result<()> {
        let target = self.folder_target(path)?;
        if !self.is_folder_selected(&target) {
            self.selected_folders.push(target);
        }
        self.reset_messages();
        Ok(())
    }

    /// Replace the multi-select set with a single folder.
    pub fn set_selected_folder(&mut self, path: Option<&Path>) -> Result<()> {
        let target = self.folder_target(path)?;
        self.selected_folders = vec![target];
        self.reset_messages();
        Ok(())
    }

    pub fn clear_selected_folders(&mut self) {
        self.selected_folders.clear();
        self.reset_messages();
    }

    // ---- aggregated messages ----

    fn reset_messages(&mut self) {
        self.rebuild_messages();
        self.set_selected_message(0);
    }

    /// Rebuild the aggregated list from the selected folders: each folder's
    /// `new/` then `cur/`, folders in selection order, limited by
    /// `index_limit`. The message cursor is clamped.
    pub fn rebuild_messages(&mut self) {
        let filter = Filter::parse(&self.config.index_limit);
        let template = &self.config.index_format;
        let date_formats = &self.config.date_formats;

        let mut messages = Vec::new();
        for path in &self.selected_folders {
            let paths = match self.folders.iter().find(|f| f.path() == path) {
                Some(folder) => folder.message_paths(),
                None => match Folder::open(path) {
                    Ok(folder) => folder.message_paths(),
                    Err(err) => {
                        tracing::warn!(%err, "selected folder is no longer readable");
                        continue;
                    }
                },
            };
            messages.extend(
                paths
                    .into_iter()
                    .map(Message::new)
                    .filter_map(|mut m| m.matches_filter(&filter, template, date_formats).then_some(m)),
            );
        }

        tracing::debug!(
            folders = self.selected_folders.len(),
            messages = messages.len(),
            limit = %filter,
            "rebuilt message list"
        );
        self.messages = messages;
        let clamped = clamp(self.selected_message, self.messages.len());
        if clamped != self.selected_message {
            self.set_selected_message(clamped);
        }
    }

    pub fn index_limit(&self) -> &str {
        &self.config.index_limit
    }

    pub fn set_index_limit(&mut self, limit: &str) {
        self.config.index_limit = limit.to_string();
        self.rebuild_messages();
    }

    pub fn index_format(&self) -> &str {
        &self.config.index_format
    }

    /// A substring `index_limit` matches the rendered line, so membership
    /// can change with the template.
    pub fn set_index_format(&mut self, template: &str) {
        self.config.index_format = template.to_string();
        self.rebuild_messages();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn count_messages(&self) -> usize {
        self.messages.len()
    }

    pub fn selected_message_index(&self) -> usize {
        self.selected_message
    }

    pub fn current_message(&self) -> Option<&Message> {
        self.messages.get(self.selected_message)
    }

    pub fn current_message_path(&self) -> Option<&Path> {
        self.current_message().map(Message::path)
    }

    /// Display line for every aggregated message.
    pub fn index_lines(&mut self) -> Vec<String> {
        let template = &self.config.index_format;
        let date_formats = &self.config.date_formats;
        self.messages
            .iter_mut()
            .map(|m| m.format(template, date_formats))
            .collect()
    }

    pub fn message_records(&mut self) -> Vec<MessageRecord> {
        let template = &self.config.index_format;
        let date_formats = &self.config.date_formats;
        self.messages
            .iter_mut()
            .map(|m| MessageRecord {
                path: m.path().to_path_buf(),
                flags: m.flags().padded(),
                line: m.format(template, date_formats),
            })
            .collect()
    }

    fn set_selected_message(&mut self, index: usize) {
        self.selected_message = clamp(index, self.messages.len());
        self.message_offset = 0;
    }

    pub fn scroll_index_down(&mut self, step: usize) {
        self.set_selected_message(self.selected_message.saturating_add(step));
    }

    pub fn scroll_index_up(&mut self, step: usize) {
        self.set_selected_message(self.selected_message.saturating_sub(step));
    }

    pub fn jump_index_to(&mut self, index: usize) {
        self.set_selected_message(index);
    }

    /// Next message after the cursor whose display line contains `pattern`,
    /// wrapping once. The cursor is left alone on a miss.
    pub fn scroll_index_to(&mut self, pattern: &str) -> Option<usize> {
        let template = &self.config.index_format;
        let date_formats = &self.config.date_formats;
        let messages = &mut self.messages;
        let hit = wrap_search(self.selected_message, messages.len(), |i| {
            messages[i].format(template, date_formats).contains(pattern)
        });
        if let Some(i) = hit {
            self.set_selected_message(i);
        }
        hit
    }

    // ---- message body scrolling ----

    pub fn message_offset(&self) -> usize {
        self.message_offset
    }

    pub fn scroll_message_down(&mut self, step: usize) {
        self.message_offset = self.message_offset.saturating_add(step);
    }

    pub fn scroll_message_up(&mut self, step: usize) {
        self.message_offset = self.message_offset.saturating_sub(step);
    }

    pub fn jump_message_to(&mut self, offset: usize) {
        self.message_offset = offset;
    }

    // ---- per-message queries and mutations ----

    /// Run `f` on the message named by `path`, or the selected one.
    ///
    /// An explicit path that is in the aggregated list uses that entry, so a
    /// rename is reflected in the list; any other path gets a throwaway
    /// `Message`.
    fn with_message<T>(
        &mut self,
        path: Option<&Path>,
        f: impl FnOnce(&mut Message, &Config) -> Result<T>,
    ) -> Result<T> {
        let config = &self.config;
        match path {
            None => {
                let msg = self
                    .messages
                    .get_mut(self.selected_message)
                    .ok_or(Error::NoMessage)?;
                f(msg, config)
            }
            Some(path) => match self.messages.iter_mut().find(|m| m.path() == path) {
                Some(msg) => f(msg, config),
                None => f(&mut Message::new(path), config),
            },
        }
    }

    pub fn header(&mut self, name: &str, path: Option<&Path>) -> Result<Option<String>> {
        self.with_message(path, |m, _| m.header(name))
    }

    pub fn body(&mut self, path: Option<&Path>) -> Result<Vec<String>> {
        self.with_message(path, |m, _| m.body())
    }

    /// Padded display form of the effective flags.
    pub fn flags(&mut self, path: Option<&Path>) -> Result<String> {
        self.with_message(path, |m, _| Ok(m.flags().padded()))
    }

    pub fn is_new(&mut self, path: Option<&Path>) -> Result<bool> {
        self.with_message(path, |m, _| Ok(m.is_new()))
    }

    pub fn format_message(&mut self, template: Option<&str>, path: Option<&Path>) -> Result<String> {
        self.with_message(path, |m, config| {
            let template = template.unwrap_or(&config.index_format);
            Ok(m.format(template, &config.date_formats))
        })
    }

    pub fn mark_read(&mut self, path: Option<&Path>) -> Result<bool> {
        self.retag(path, Message::mark_read)
    }

    pub fn mark_new(&mut self, path: Option<&Path>) -> Result<bool> {
        self.retag(path, Message::mark_new)
    }

    pub fn add_flag(&mut self, flag: char, path: Option<&Path>) -> Result<bool> {
        self.retag(path, |m| m.add_flag(flag))
    }

    pub fn remove_flag(&mut self, flag: char, path: Option<&Path>) -> Result<bool> {
        self.retag(path, |m| m.remove_flag(flag))
    }

    /// Apply a flag mutation, rebuilding the aggregated list when the
    /// message passes `index_limit` before and not after, or the reverse.
    fn retag(
        &mut self,
        path: Option<&Path>,
        mutate: impl FnOnce(&mut Message) -> Result<bool>,
    ) -> Result<bool> {
        let filter = Filter::parse(&self.config.index_limit);
        let (changed, before, after) = self.with_message(path, |m, config| {
            let template = &config.index_format;
            let formats = &config.date_formats;
            let before = m.matches_filter(&filter, template, formats);
            let changed = mutate(m)?;
            let after = if changed {
                m.matches_filter(&filter, template, formats)
            } else {
                before
            };
            Ok((changed, before, after))
        })?;
        if before != after {
            tracing::debug!(limit = %filter, listed = after, "flag change crossed index limit");
            self.rebuild_messages();
        }
        Ok(changed)
    }

    /// Unlink a message and rebuild the aggregated list.
    pub fn delete_message(&mut self, path: Option<&Path>) -> Result<()> {
        self.with_message(path, |m, _| m.delete())?;
        self.rebuild_messages();
        self.refresh_counts();
        Ok(())
    }

    /// Move a message into another Maildir and rebuild the aggregated list.
    pub fn save_message(&mut self, dest: &Path, path: Option<&Path>) -> Result<PathBuf> {
        let dest = Folder::open(dest)?;
        let moved = self.with_message(path, |m, _| m.move_to(&dest))?;
        self.rebuild_messages();
        self.refresh_counts();
        Ok(moved)
    }
}

/// `index` kept inside `[0, len)`, or 0 for an empty list.
fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

/// Circular scan from `start + 1` to the end, then from 0 up to (not
/// including) `start`. Visits at most `len - 1` positions.
fn wrap_search(start: usize, len: usize, mut hit: impl FnMut(usize) -> bool) -> Option<usize> {
    (1..len).map(|step| (start + step) % len).find(|&i| hit(i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testutil::{mail, maildir, put};
    use std::fs;

    fn config_for(root: &Path) -> Config {
        Config {
            maildir_prefix: root.to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    /// `a` (2 total, 1 unread) and `b` (empty).
    fn two_folders() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let a = maildir(root.path(), "a");
        let b = maildir(root.path(), "b");
        put(&a, "new", "1.host", &mail("alice@x", "Welcome"));
        put(&a, "cur", "2.host:2,S", &mail("bob@x", "Minutes"));
        (root, a, b)
    }

    #[test]
    fn new_filter_then_toggle_aggregates() {
        let (root, a, _) = two_folders();
        let mut config = config_for(root.path());
        config.maildir_limit = "new".to_string();
        let mut nav = Navigator::new(config);

        assert_eq!(nav.universe_len(), 2);
        assert_eq!(nav.count_maildirs(), 1);
        assert_eq!(nav.current_maildir().map(|f| f.path()), Some(a.as_path()));

        assert!(nav.toggle_folder(None).unwrap());
        assert_eq!(nav.count_messages(), 2);
        assert_eq!(nav.messages().iter().filter(|m| m.is_new()).count(), 1);

        assert!(!nav.toggle_folder(None).unwrap());
        assert_eq!(nav.count_messages(), 0);
        assert!(nav.current_maildirs().is_empty());
    }

    #[test]
    fn folder_cursor_clamps_after_filter() {
        let (root, _, _) = two_folders();
        maildir(root.path(), "c");
        let mut nav = Navigator::new(config_for(root.path()));

        nav.jump_maildir_to(99);
        assert_eq!(nav.selected_folder_index(), 2);
        nav.set_folder_filter("new");
        assert_eq!(nav.selected_folder_index(), 0);
        nav.set_folder_filter("nothing-matches");
        assert_eq!(nav.count_maildirs(), 0);
        assert_eq!(nav.selected_folder_index(), 0);
        assert!(nav.current_maildir().is_none());
        nav.scroll_maildir_down(3);
        assert_eq!(nav.selected_folder_index(), 0);
    }

    #[test]
    fn new_filter_sees_mail_delivered_after_startup() {
        let (root, a, b) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        put(&b, "new", "9.host", &mail("carol@x", "Late"));

        nav.set_folder_filter("new");
        assert_eq!(nav.count_maildirs(), 2);
        let visible: Vec<&Path> = nav.visible_folders().map(Folder::path).collect();
        assert_eq!(visible, vec![a.as_path(), b.as_path()]);
        assert_eq!(nav.folder_records()[1].unread, 1);
    }

    #[test]
    fn toggle_without_folder_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let mut nav = Navigator::new(config_for(root.path()));
        assert!(matches!(nav.toggle_folder(None), Err(Error::NoFolder)));
        assert!(matches!(
            nav.toggle_folder(Some(root.path())),
            Err(Error::NotMaildir(_))
        ));
    }

    #[test]
    fn changing_message_resets_offset() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();

        nav.scroll_message_down(5);
        assert_eq!(nav.message_offset(), 5);
        nav.scroll_index_down(1);
        assert_eq!(nav.selected_message_index(), 1);
        assert_eq!(nav.message_offset(), 0);

        nav.scroll_message_down(2);
        nav.scroll_message_up(7);
        assert_eq!(nav.message_offset(), 0);
        nav.jump_message_to(4);
        nav.jump_index_to(40);
        assert_eq!(nav.selected_message_index(), 1);
        assert_eq!(nav.message_offset(), 0);
        nav.scroll_index_up(9);
        assert_eq!(nav.selected_message_index(), 0);
    }

    #[test]
    fn wrap_search_visits_all_but_start() {
        let mut visited = Vec::new();
        let hit = wrap_search(2, 5, |i| {
            visited.push(i);
            false
        });
        assert_eq!(hit, None);
        assert_eq!(visited, vec![3, 4, 0, 1]);

        let mut count = 0;
        assert_eq!(wrap_search(4, 5, |_| {
            count += 1;
            false
        }), None);
        assert_eq!(count, 4);
        assert_eq!(wrap_search(0, 0, |_| true), None);
        assert_eq!(wrap_search(0, 1, |_| true), None);
    }

    #[test]
    fn wrap_search_single_match() {
        for start in [0, 1, 3, 4] {
            assert_eq!(wrap_search(start, 5, |i| i == 2), Some(2));
        }
        assert_eq!(wrap_search(2, 5, |i| i == 2), None);
    }

    #[test]
    fn folder_search_wraps_and_keeps_cursor_on_miss() {
        let root = tempfile::tempdir().unwrap();
        for name in ["archive", "lists", "sent", "work"] {
            maildir(root.path(), name);
        }
        let mut nav = Navigator::new(config_for(root.path()));
        nav.jump_maildir_to(2);

        assert_eq!(nav.scroll_maildir_to("/lists"), Some(1));
        assert_eq!(nav.selected_folder_index(), 1);
        assert_eq!(nav.scroll_maildir_to("/nowhere"), None);
        assert_eq!(nav.selected_folder_index(), 1);
        assert_eq!(nav.scroll_maildir_to(""), Some(2));
        assert_eq!(nav.scroll_maildir_to(""), Some(3));
        assert_eq!(nav.scroll_maildir_to(""), Some(0));
    }

    #[test]
    fn message_search_matches_display_line() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.scroll_message_down(3);

        assert_eq!(nav.scroll_index_to("Minutes"), Some(1));
        assert_eq!(nav.message_offset(), 0);
        // The only match is under the cursor.
        assert_eq!(nav.scroll_index_to("Minutes"), None);
        assert_eq!(nav.selected_message_index(), 1);
        assert_eq!(nav.scroll_index_to(""), Some(0));
    }

    #[test]
    fn aggregation_follows_selection_order() {
        let root = tempfile::tempdir().unwrap();
        let a = maildir(root.path(), "a");
        let b = maildir(root.path(), "b");
        put(&a, "cur", "1.host:2,S", &mail("a@x", "from a"));
        put(&b, "cur", "2.host:2,S", &mail("b@x", "from b"));
        put(&b, "new", "3.host", &mail("b@x", "new in b"));

        let mut nav = Navigator::new(config_for(root.path()));
        nav.add_selected_folder(Some(b.as_path())).unwrap();
        nav.add_selected_folder(Some(a.as_path())).unwrap();
        nav.add_selected_folder(Some(a.as_path())).unwrap();
        assert_eq!(nav.current_maildirs(), &[b.clone(), a.clone()]);

        let order: Vec<PathBuf> = nav.messages().iter().map(|m| m.path().to_path_buf()).collect();
        assert_eq!(
            order,
            vec![
                b.join("new/3.host"),
                b.join("cur/2.host:2,S"),
                a.join("cur/1.host:2,S"),
            ]
        );

        nav.clear_selected_folders();
        assert_eq!(nav.count_messages(), 0);
    }

    #[test]
    fn index_limit_filters_on_formatted_line() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.jump_index_to(1);

        nav.set_index_limit("Welcome");
        assert_eq!(nav.count_messages(), 1);
        assert_eq!(nav.selected_message_index(), 0);
        nav.set_index_limit("new");
        assert_eq!(nav.count_messages(), 1);
        assert!(nav.is_new(None).unwrap());
        nav.set_index_limit("all");
        assert_eq!(nav.count_messages(), 2);
    }

    #[test]
    fn mark_read_updates_list_entry() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();

        assert!(nav.is_new(None).unwrap());
        assert!(nav.mark_read(None).unwrap());
        assert_eq!(nav.current_message_path(), Some(a.join("cur/1.host:2,").as_path()));
        assert_eq!(nav.flags(None).unwrap(), "    ");

        let explicit = a.join("cur/1.host:2,");
        assert!(nav.add_flag('S', Some(explicit.as_path())).unwrap());
        assert_eq!(nav.current_message_path(), Some(a.join("cur/1.host:2,S").as_path()));
        assert!(nav.mark_new(None).unwrap());
        assert_eq!(nav.flags(None).unwrap(), "NS  ");
    }

    #[test]
    fn flag_change_out_of_index_limit_rebuilds() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.set_index_limit("new");
        assert_eq!(nav.count_messages(), 1);

        assert!(nav.mark_read(None).unwrap());
        assert_eq!(nav.count_messages(), 0);
        assert_eq!(nav.selected_message_index(), 0);
        assert!(a.join("cur/1.host:2,").exists());

        let read = a.join("cur/2.host:2,S");
        assert!(nav.add_flag('N', Some(read.as_path())).unwrap());
        assert_eq!(nav.count_messages(), 1);
        assert_eq!(nav.current_message_path(), Some(a.join("cur/2.host:2,NS").as_path()));
    }

    #[test]
    fn flag_change_within_index_limit_keeps_list() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.jump_index_to(1);
        nav.scroll_message_down(3);

        assert!(nav.add_flag('F', None).unwrap());
        assert_eq!(nav.count_messages(), 2);
        assert_eq!(nav.selected_message_index(), 1);
        assert_eq!(nav.message_offset(), 3);
    }

    #[test]
    fn explicit_path_outside_list_is_transient() {
        let (root, _, b) = two_folders();
        let loose = put(&b, "cur", "9.host:2,", &mail("carol@x", "Loose"));
        let mut nav = Navigator::new(config_for(root.path()));

        assert_eq!(nav.header("Subject", Some(loose.as_path())).unwrap().as_deref(), Some("Loose"));
        assert!(nav.body(Some(loose.as_path())).unwrap().iter().any(|l| l.contains("carol@x")));
        assert_eq!(
            nav.format_message(Some("FROM: SUBJECT"), Some(loose.as_path())).unwrap(),
            "carol@x: Loose"
        );
        assert!(matches!(nav.header("Subject", None), Err(Error::NoMessage)));
    }

    #[test]
    fn delete_rebuilds_and_is_idempotent() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.jump_index_to(1);

        let doomed = nav.current_message_path().unwrap().to_path_buf();
        nav.delete_message(None).unwrap();
        assert!(!doomed.exists());
        assert_eq!(nav.count_messages(), 1);
        assert_eq!(nav.selected_message_index(), 0);
        assert_eq!(nav.current_maildir().map(Folder::total), Some(1));

        nav.delete_message(Some(doomed.as_path())).unwrap();
        assert_eq!(nav.count_messages(), 1);
    }

    #[test]
    fn save_moves_between_folders() {
        let (root, a, b) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();

        let source = nav.current_message_path().unwrap().to_path_buf();
        let moved = nav.save_message(&b, None).unwrap();
        assert!(!source.exists());
        assert!(moved.starts_with(b.join("new")));
        assert_eq!(nav.count_messages(), 1);

        let kept = nav.current_message_path().unwrap().to_path_buf();
        assert!(matches!(
            nav.save_message(&root.path().join("missing"), None),
            Err(Error::NotMaildir(_))
        ));
        assert!(kept.exists());
    }

    #[test]
    fn variables_and_mode() {
        let (root, _, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));

        nav.set_variable("global_mode", "index").unwrap();
        assert_eq!(nav.mode(), Mode::Index);
        assert_eq!(nav.variables()["global_mode"], "index");
        assert!(nav.set_variable("global_mode", "compose").unwrap_err().is_invalid_input());
        assert!(nav.set_variable("no_such", "x").unwrap_err().is_invalid_input());

        nav.set_variable("maildir_limit", "new").unwrap();
        assert_eq!(nav.count_maildirs(), 1);
        nav.set_variable("date_formats", "%Y-%m-%d\n\n%d/%m/%Y").unwrap();
        assert_eq!(nav.config().date_formats, vec!["%Y-%m-%d", "%d/%m/%Y"]);
    }

    #[test]
    fn prefix_change_rescans() {
        let (root, _, _) = two_folders();
        let other = tempfile::tempdir().unwrap();
        maildir(other.path(), "only");
        let mut nav = Navigator::new(config_for(root.path()));
        nav.jump_maildir_to(1);

        nav.set_maildir_prefix(&other.path().to_string_lossy()).unwrap();
        assert_eq!(nav.universe_len(), 1);
        assert_eq!(nav.selected_folder_index(), 0);

        let missing = other.path().join("absent");
        assert!(nav.set_maildir_prefix(&missing.to_string_lossy()).unwrap_err().is_invalid_input());
        assert_eq!(nav.variables()["maildir_prefix"], other.path().to_string_lossy());
    }

    #[test]
    fn prefix_change_rebuilds_messages() {
        let (root, a, _) = two_folders();
        let other = tempfile::tempdir().unwrap();
        maildir(other.path(), "only");
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();
        nav.jump_index_to(1);
        assert_eq!(nav.count_messages(), 2);

        fs::remove_dir_all(&a).unwrap();
        nav.set_maildir_prefix(&other.path().to_string_lossy()).unwrap();
        assert_eq!(nav.count_messages(), 0);
        assert_eq!(nav.selected_message_index(), 0);
        assert_eq!(nav.current_maildirs(), &[a.clone()]);
    }

    #[test]
    fn prefix_change_keeps_selection_outside_new_prefix() {
        let (root, a, _) = two_folders();
        let other = tempfile::tempdir().unwrap();
        maildir(other.path(), "only");
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();

        nav.set_maildir_prefix(&other.path().to_string_lossy()).unwrap();
        assert_eq!(nav.universe_len(), 1);
        assert_eq!(nav.count_messages(), 2);
    }

    #[test]
    fn select_maildir_and_matching() {
        let (root, a, b) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));

        assert!(nav.select_maildir(&b));
        assert_eq!(nav.selected_folder_index(), 1);
        assert!(!nav.select_maildir(&root.path().join("zzz")));
        assert_eq!(nav.maildirs_matching("new"), vec![a.clone()]);
        assert_eq!(nav.maildirs_matching("all").len(), 2);

        nav.toggle_folder(Some(a.as_path())).unwrap();
        let records = nav.folder_records();
        assert_eq!(records.len(), 2);
        assert!(records[0].selected);
        assert_eq!((records[0].total, records[0].unread), (2, 1));
        assert!(!records[1].selected);
    }

    #[test]
    fn records_render_index_lines() {
        let (root, a, _) = two_folders();
        let mut nav = Navigator::new(config_for(root.path()));
        nav.set_selected_folder(Some(a.as_path())).unwrap();

        let lines = nav.index_lines();
        assert_eq!(lines[0], "[N   ] 15/01/2024 alice@x - Welcome");
        let records = nav.message_records();
        assert_eq!(records[1].flags, "S   ");
        assert_eq!(records[1].line, lines[1]);
        fs::remove_dir_all(&a).unwrap();
        nav.rebuild_messages();
        assert_eq!(nav.count_messages(), 0);
    }

    #[test]
    fn mode_parses_and_displays() {
        assert_eq!("message".parse::<Mode>().unwrap(), Mode::Message);
        assert_eq!(Mode::Index.to_string(), "index");
        assert!("Index".parse::<Mode>().is_err());
    }
}
