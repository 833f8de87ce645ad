//! Maildir flag codec.
//!
//! Filenames look like `{unique}:2,{flags}`. Flags are single uppercase
//! letters kept sorted and unique. A message sitting in `new/` carries an
//! implied `N` whatever its suffix says.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Separator between the unique part of a filename and its flags.
pub const INFO_MARKER: &str = ":2,";

/// Suffixes longer than this are treated as garbage and ignored.
pub const MAX_RAW_FLAGS: usize = 3;

/// Width of the padded flag column handed to the formatter.
pub const DISPLAY_WIDTH: usize = 4;

/// Flag implied by living in `new/`.
pub const NEW: char = 'N';

/// Normalized flag set: uppercase, deduplicated, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(BTreeSet<char>);

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw suffix such as `"rS"`. Whitespace is dropped.
    pub fn parse(raw: &str) -> Self {
        raw.chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(&flag.to_ascii_uppercase())
    }

    /// Returns true if the flag was not already present.
    pub fn insert(&mut self, flag: char) -> bool {
        self.0.insert(flag.to_ascii_uppercase())
    }

    /// Returns true if the flag was present.
    pub fn remove(&mut self, flag: char) -> bool {
        self.0.remove(&flag.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.0.iter().copied()
    }

    /// Display form, right-padded to [`DISPLAY_WIDTH`].
    pub fn padded(&self) -> String {
        format!("{:<width$}", self.to_string(), width = DISPLAY_WIDTH)
    }
}

impl FromIterator<char> for FlagSet {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        FlagSet(iter.into_iter().map(|c| c.to_ascii_uppercase()).collect())
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.0 {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Split a path into `(base, raw_flags)` at the info marker of its filename.
/// Without a marker the whole path is the base and the suffix is empty.
pub fn split_info(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].find(INFO_MARKER) {
        Some(pos) => {
            let marker = name_start + pos;
            (&path[..marker], &path[marker + INFO_MARKER.len()..])
        }
        None => (path, ""),
    }
}

/// Flags literally written in the filename suffix.
fn raw_flags(path: &str) -> FlagSet {
    let (_, raw) = split_info(path);
    if raw.chars().count() > MAX_RAW_FLAGS {
        tracing::warn!(path, raw, "ignoring oversized maildir flag suffix");
        return FlagSet::new();
    }
    FlagSet::parse(raw)
}

/// Is the file directly inside a `new/` directory?
pub fn in_new_dir(path: &Path) -> bool {
    parent_dir_is(path, "new")
}

/// Is the file directly inside a `cur/` directory?
pub fn in_cur_dir(path: &Path) -> bool {
    parent_dir_is(path, "cur")
}

fn parent_dir_is(path: &Path, name: &str) -> bool {
    path.parent()
        .and_then(|p| p.file_name())
        .is_some_and(|n| n == name)
}

/// Decode a message path into its base and effective flag set.
pub fn decode(path: &Path) -> (String, FlagSet) {
    let text = path.to_string_lossy();
    let (base, _) = split_info(&text);
    let mut flags = raw_flags(&text);
    if in_new_dir(path) {
        flags.insert(NEW);
    }
    (base.to_string(), flags)
}

/// Effective flags of a path (raw suffix plus location-implied `N`).
pub fn flags(path: &Path) -> FlagSet {
    decode(path).1
}

/// Build the path carrying `flags` on top of `base`.
pub fn encode(base: &str, flags: &FlagSet) -> PathBuf {
    PathBuf::from(format!("{}{}{}", base, INFO_MARKER, flags))
}

/// Compute the path a flag change renames to.
///
/// `Ok(None)` means nothing to do: the effective set already agrees, or the
/// flag is only implied by location and cannot be stripped by renaming.
pub fn retag(path: &Path, flag: char, add: bool) -> Result<Option<PathBuf>> {
    if !flag.is_ascii_alphabetic() {
        return Err(Error::InvalidInput(format!("not a maildir flag: {:?}", flag)));
    }
    let flag = flag.to_ascii_uppercase();
    if flags(path).contains(flag) == add {
        return Ok(None);
    }

    let text = path.to_string_lossy();
    let (base, _) = split_info(&text);
    let mut raw = raw_flags(&text);
    let changed = if add { raw.insert(flag) } else { raw.remove(flag) };
    if !changed {
        return Ok(None);
    }
    if raw.len() > MAX_RAW_FLAGS {
        return Err(Error::InvalidInput(format!(
            "adding {} would exceed {} flags on {}",
            flag,
            MAX_RAW_FLAGS,
            path.display()
        )));
    }

    let target = encode(base, &raw);
    Ok((target != path).then_some(target))
}

/// `new/{name}` -> `cur/{name}:2,` (marker appended when missing).
pub fn read_path(path: &Path) -> Option<PathBuf> {
    if !in_new_dir(path) {
        return None;
    }
    let maildir = path.parent()?.parent()?;
    let mut name = path.file_name()?.to_string_lossy().into_owned();
    if !name.contains(INFO_MARKER) {
        name.push_str(INFO_MARKER);
    }
    Some(maildir.join("cur").join(name))
}

/// `cur/{name}` -> `new/{name}`, filename tail preserved.
pub fn unread_path(path: &Path) -> Option<PathBuf> {
    if !in_cur_dir(path) {
        return None;
    }
    let maildir = path.parent()?.parent()?;
    Some(maildir.join("new").join(path.file_name()?))
}
