use std::fmt;

/// Display limit applied to folders (`maildir_limit`) and messages
/// (`index_limit`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    New,
    Substring(String),
}

impl Filter {
    pub fn parse(s: &str) -> Self {
        match s {
            "all" => Filter::All,
            "new" => Filter::New,
            other => Filter::Substring(other.to_string()),
        }
    }

    /// Evaluate against an unread flag and the text substrings are matched
    /// in. The text is produced lazily since formatting a message reads it.
    pub fn matches(&self, is_new: bool, text: impl FnOnce() -> String) -> bool {
        match self {
            Filter::All => true,
            Filter::New => is_new,
            Filter::Substring(needle) => text().contains(needle.as_str()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::New => write!(f, "new"),
            Filter::Substring(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keywords() {
        assert_eq!(Filter::parse("all"), Filter::All);
        assert_eq!(Filter::parse("new"), Filter::New);
        assert_eq!(Filter::parse("lists"), Filter::Substring("lists".into()));
        assert_eq!(Filter::parse("lists").to_string(), "lists");
    }

    #[test]
    fn substring_is_case_sensitive() {
        let f = Filter::parse("Inbox");
        assert!(f.matches(false, || "/m/Inbox".into()));
        assert!(!f.matches(true, || "/m/inbox".into()));
    }

    #[test]
    fn keywords_never_format() {
        assert!(Filter::All.matches(false, || unreachable!()));
        assert!(!Filter::New.matches(false, || unreachable!()));
    }
}
