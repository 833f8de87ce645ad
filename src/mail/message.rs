use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::filter::Filter;
use super::flags::{self, FlagSet, NEW};
use super::folder::Folder;
use super::format::{self, MessageDate, Token};
use super::mime::MimeDocument;
use crate::error::{Error, Result};

/// One mail file.
///
/// The path is the only record of the message's flags: every flag change is
/// a rename, and the in-memory path is updated only once the rename has
/// succeeded. The MIME parse happens on first header/body access and is
/// kept for the life of this value.
#[derive(Debug)]
pub struct Message {
    path: PathBuf,
    parsed: Option<MimeDocument>,
}

impl Message {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parsed: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flags(&self) -> FlagSet {
        flags::flags(&self.path)
    }

    pub fn is_new(&self) -> bool {
        self.flags().contains(NEW)
    }

    /// Add a flag by renaming. Returns false when it was already set.
    pub fn add_flag(&mut self, flag: char) -> Result<bool> {
        self.retag(flag, true)
    }

    /// Remove a flag by renaming. Returns false when there was nothing to do.
    pub fn remove_flag(&mut self, flag: char) -> Result<bool> {
        self.retag(flag, false)
    }

    fn retag(&mut self, flag: char, add: bool) -> Result<bool> {
        match flags::retag(&self.path, flag, add)? {
            Some(target) => self.rename_to(target).map(|_| true),
            None => Ok(false),
        }
    }

    /// `new/` -> `cur/`, or strip a literal `N` when already in `cur/`.
    pub fn mark_read(&mut self) -> Result<bool> {
        match flags::read_path(&self.path) {
            Some(target) => self.rename_to(target).map(|_| true),
            None => self.remove_flag(NEW),
        }
    }

    /// `cur/` -> `new/`, or add a literal `N` elsewhere.
    pub fn mark_new(&mut self) -> Result<bool> {
        match flags::unread_path(&self.path) {
            Some(target) => self.rename_to(target).map(|_| true),
            None => self.add_flag(NEW),
        }
    }

    fn rename_to(&mut self, target: PathBuf) -> Result<()> {
        if target.symlink_metadata().is_ok() {
            return Err(Error::TargetExists {
                from: self.path.clone(),
                to: target,
            });
        }
        fs::rename(&self.path, &target).map_err(|e| Error::io("rename", &self.path, e))?;
        tracing::info!(
            from = %self.path.display(),
            to = %target.display(),
            "renamed message"
        );
        self.path = target;
        Ok(())
    }

    /// Unlink the file. A file that is already gone is not an error.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "deleted message");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io("delete", &self.path, e)),
        }
    }

    /// Copy into `dest` (keeping new/read state and flags), then remove the
    /// original. The original is untouched unless the copy landed.
    pub fn move_to(&mut self, dest: &Folder) -> Result<PathBuf> {
        let bytes = fs::read(&self.path).map_err(|e| Error::io("read", &self.path, e))?;
        let copied = dest.deliver(&bytes, self.is_new(), &self.flags())?;
        self.delete()?;
        tracing::info!(
            from = %self.path.display(),
            to = %copied.display(),
            "moved message"
        );
        self.path = copied.clone();
        Ok(copied)
    }

    fn document(&mut self) -> Result<&MimeDocument> {
        let doc = match self.parsed.take() {
            Some(doc) => doc,
            None => {
                let raw = fs::read(&self.path).map_err(|e| Error::io("read", &self.path, e))?;
                MimeDocument::parse(&raw)
            }
        };
        Ok(&*self.parsed.insert(doc))
    }

    pub fn header(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.document()?.header(name).map(str::to_string))
    }

    /// Header text for display; unreadable files and missing headers give "".
    fn header_text(&mut self, name: &str) -> String {
        self.header(name).ok().flatten().unwrap_or_default()
    }

    pub fn from(&mut self) -> String {
        self.header_text("From")
    }

    pub fn to(&mut self) -> String {
        self.header_text("To")
    }

    pub fn subject(&mut self) -> String {
        self.header_text("Subject")
    }

    pub fn body(&mut self) -> Result<Vec<String>> {
        Ok(self.document()?.body_lines())
    }

    pub fn date(&mut self, date_formats: &[String]) -> MessageDate {
        let header = self.header("Date").ok().flatten();
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok();
        MessageDate::resolve(header.as_deref(), modified, date_formats)
    }

    /// Render `template` for this message.
    pub fn format(&mut self, template: &str, date_formats: &[String]) -> String {
        let mut date: Option<MessageDate> = None;
        format::expand(template, |token| match token {
            Token::Flags => self.flags().padded(),
            Token::From => self.from(),
            Token::To => self.to(),
            Token::Subject => self.subject(),
            Token::Date | Token::Year | Token::Month | Token::Day => {
                let date = date.get_or_insert_with(|| self.date(date_formats));
                match token {
                    Token::Year => date.year(),
                    Token::Month => date.month(),
                    Token::Day => date.day(),
                    _ => date.text.clone(),
                }
            }
        })
    }

    /// `new` tests unread state; substrings are matched against the
    /// formatted line, not the path.
    pub fn matches_filter(&mut self, filter: &Filter, template: &str, date_formats: &[String]) -> bool {
        let is_new = self.is_new();
        filter.matches(is_new, || self.format(template, date_formats))
    }
}
