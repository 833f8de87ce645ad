use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use walkdir::WalkDir;

use super::filter::Filter;
use super::flags::{self, FlagSet, INFO_MARKER, NEW};
use crate::error::{Error, Result};

const SUBDIR_NEW: &str = "new";
const SUBDIR_CUR: &str = "cur";
const SUBDIR_TMP: &str = "tmp";

static DELIVERIES: AtomicUsize = AtomicUsize::new(0);

/// One Maildir leaf directory and its message counts.
///
/// Counts are a snapshot taken by [`Folder::scan`]; other programs may
/// deliver or move mail at any time, so rescan before acting on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    path: PathBuf,
    total: usize,
    unread: usize,
}

impl Folder {
    /// Does `path` look like a Maildir (has `new/` and `cur/`)?
    pub fn is_maildir(path: &Path) -> bool {
        path.join(SUBDIR_NEW).is_dir() && path.join(SUBDIR_CUR).is_dir()
    }

    /// Open and scan a Maildir.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !Self::is_maildir(&path) {
            return Err(Error::NotMaildir(path));
        }
        let mut folder = Folder {
            path,
            total: 0,
            unread: 0,
        };
        folder.scan();
        Ok(folder)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path component, for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Recount messages in `new/` and `cur/`.
    pub fn scan(&mut self) {
        let paths = self.message_paths();
        self.total = paths.len();
        self.unread = paths
            .iter()
            .filter(|p| flags::flags(p).contains(NEW))
            .count();
    }

    /// Message files, `new/` first then `cur/`, each in filename order.
    pub fn message_paths(&self) -> Vec<PathBuf> {
        let mut paths = list_messages(&self.path.join(SUBDIR_NEW));
        paths.extend(list_messages(&self.path.join(SUBDIR_CUR)));
        paths
    }

    pub fn matches_filter(&self, filter: &Filter) -> bool {
        filter.matches(self.unread > 0, || self.path.to_string_lossy().into_owned())
    }

    /// Copy a message into this folder under a fresh unique name.
    ///
    /// The bytes are written to `tmp/` first and then linked into `new/` when
    /// `unread`, otherwise `cur/`. `flags` minus `N` become the `:2,` suffix;
    /// a `new/` file with nothing left to keep gets no suffix. An existing
    /// file is never overwritten.
    pub fn deliver(&self, bytes: &[u8], unread: bool, flags: &FlagSet) -> Result<PathBuf> {
        let tmp_dir = self.path.join(SUBDIR_TMP);
        fs::create_dir_all(&tmp_dir).map_err(|e| Error::io("create", &tmp_dir, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&tmp_dir)
            .map_err(|e| Error::io("create temp file in", &tmp_dir, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::io("write", tmp.path(), e))?;

        let unique = unique_name();
        let mut kept = flags.clone();
        kept.remove(NEW);
        let dest = if unread && kept.is_empty() {
            self.path.join(SUBDIR_NEW).join(&unique)
        } else {
            let sub = if unread { SUBDIR_NEW } else { SUBDIR_CUR };
            self.path
                .join(sub)
                .join(format!("{}{}{}", unique, INFO_MARKER, kept))
        };

        tmp.persist_noclobber(&dest)
            .map_err(|e| Error::io("deliver", &dest, e.error))?;
        tracing::info!(dest = %dest.display(), bytes = bytes.len(), "delivered message");
        Ok(dest)
    }
}

/// Every immediate subdirectory of `prefix` that is a Maildir, sorted by
/// path. Anything else is skipped.
pub fn discover(prefix: &Path) -> Vec<Folder> {
    let folders: Vec<Folder> = WalkDir::new(prefix)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(%err, "skipping unreadable entry under maildir prefix");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| Folder::open(entry.into_path()).ok())
        .collect();

    tracing::debug!(
        prefix = %prefix.display(),
        folders = folders.len(),
        "scanned maildir prefix"
    );
    folders
}

fn list_messages(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), %err, "cannot list maildir subdirectory");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();
    paths
}

/// `{secs}.M{micros}P{pid}Q{seq}.{host}`
fn unique_name() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = DELIVERIES.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}.M{}P{}Q{}.{}",
        now.as_secs(),
        now.subsec_micros(),
        std::process::id(),
        seq,
        hostname()
    )
}

fn hostname() -> String {
    let host = std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    // Maildir reserves these in the host part.
    host.replace('/', "\\057").replace(':', "\\072")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testutil::{mail, maildir, put};

    #[test]
    fn discover_skips_non_maildirs() {
        let root = tempfile::tempdir().unwrap();
        maildir(root.path(), "work");
        maildir(root.path(), "archive");
        fs::create_dir_all(root.path().join("junk/cur")).unwrap();
        fs::write(root.path().join("notes.txt"), "x").unwrap();

        let names: Vec<String> = discover(root.path()).iter().map(Folder::name).collect();
        assert_eq!(names, vec!["archive", "work"]);
    }

    #[test]
    fn discover_missing_prefix_is_empty() {
        let root = tempfile::tempdir().unwrap();
        assert!(discover(&root.path().join("absent")).is_empty());
    }

    #[test]
    fn scan_counts_total_and_unread() {
        let root = tempfile::tempdir().unwrap();
        let inbox = maildir(root.path(), "inbox");
        put(&inbox, "new", "1.host", &mail("a@x", "one"));
        put(&inbox, "cur", "2.host:2,S", &mail("b@x", "two"));
        put(&inbox, "cur", "3.host:2,N", &mail("c@x", "three"));
        put(&inbox, "cur", ".hidden", "x");

        let folder = Folder::open(&inbox).unwrap();
        assert_eq!(folder.total(), 3);
        assert_eq!(folder.unread(), 2);
    }

    #[test]
    fn open_rejects_plain_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            Folder::open(root.path()),
            Err(Error::NotMaildir(_))
        ));
    }

    #[test]
    fn message_paths_new_before_cur() {
        let root = tempfile::tempdir().unwrap();
        let inbox = maildir(root.path(), "inbox");
        put(&inbox, "cur", "1.host:2,S", "a");
        put(&inbox, "new", "3.host", "b");
        put(&inbox, "new", "2.host", "c");

        let folder = Folder::open(&inbox).unwrap();
        let names: Vec<String> = folder
            .message_paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["2.host", "3.host", "1.host:2,S"]);
    }

    #[test]
    fn filter_on_unread_and_path() {
        let root = tempfile::tempdir().unwrap();
        let a = maildir(root.path(), "lists");
        let b = maildir(root.path(), "sent");
        put(&a, "new", "1.host", "x");

        let a = Folder::open(a).unwrap();
        let b = Folder::open(b).unwrap();
        assert!(a.matches_filter(&Filter::New));
        assert!(!b.matches_filter(&Filter::New));
        assert!(b.matches_filter(&Filter::All));
        assert!(b.matches_filter(&Filter::parse("/sent")));
        assert!(!a.matches_filter(&Filter::parse("/sent")));
    }

    #[test]
    fn deliver_unread_goes_to_new() {
        let root = tempfile::tempdir().unwrap();
        let folder = Folder::open(maildir(root.path(), "inbox")).unwrap();

        let dest = folder.deliver(b"Subject: hi\r\n\r\nbody", true, &FlagSet::new()).unwrap();
        assert!(flags::in_new_dir(&dest));
        assert!(!dest.to_string_lossy().contains(INFO_MARKER));
        assert_eq!(fs::read(&dest).unwrap(), b"Subject: hi\r\n\r\nbody");
        assert_eq!(fs::read_dir(folder.path().join("tmp")).unwrap().count(), 0);
    }

    #[test]
    fn deliver_unread_keeps_other_flags() {
        let root = tempfile::tempdir().unwrap();
        let folder = Folder::open(maildir(root.path(), "inbox")).unwrap();

        let dest = folder.deliver(b"x", true, &FlagSet::parse("NSF")).unwrap();
        assert!(flags::in_new_dir(&dest));
        assert_eq!(flags::split_info(&dest.to_string_lossy()).1, "FS");
        assert_eq!(flags::flags(&dest).to_string(), "FNS");
    }

    #[test]
    fn deliver_read_keeps_flags_without_new() {
        let root = tempfile::tempdir().unwrap();
        let folder = Folder::open(maildir(root.path(), "archive")).unwrap();

        let dest = folder
            .deliver(b"x", false, &FlagSet::parse("NRS"))
            .unwrap();
        assert!(flags::in_cur_dir(&dest));
        assert_eq!(flags::flags(&dest).to_string(), "RS");
    }

    #[test]
    fn deliveries_never_collide() {
        let root = tempfile::tempdir().unwrap();
        let mut folder = Folder::open(maildir(root.path(), "inbox")).unwrap();
        let first = folder.deliver(b"1", true, &FlagSet::new()).unwrap();
        let second = folder.deliver(b"2", true, &FlagSet::new()).unwrap();
        assert_ne!(first, second);
        folder.scan();
        assert_eq!(folder.total(), 2);
        assert_eq!(folder.unread(), 2);
    }
}
