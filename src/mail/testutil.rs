//! Maildir fixtures for unit tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Create `root/name/{new,cur,tmp}` and return the folder path.
pub fn maildir(root: &Path, name: &str) -> PathBuf {
    let folder = root.join(name);
    for sub in ["new", "cur", "tmp"] {
        fs::create_dir_all(folder.join(sub)).unwrap();
    }
    folder
}

/// Write a message file into `folder/sub/name`.
pub fn put(folder: &Path, sub: &str, name: &str, contents: &str) -> PathBuf {
    let path = folder.join(sub).join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// A minimal RFC 5322 message.
pub fn mail(from: &str, subject: &str) -> String {
    format!(
        "From: {}\r\nTo: me@example.com\r\nSubject: {}\r\nDate: Mon, 15 Jan 2024 10:30:45 -0800\r\n\r\nHello from {}.\r\n",
        from, subject, from
    )
}
