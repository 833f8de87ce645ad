//! Template expansion for one-line message summaries.
//!
//! A template such as `"[FLAGS] FROM - SUBJECT"` has bare tokens replaced by
//! values taken from a message. Unknown words are left alone.

use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Patterns tried, in order, against a `Date:` header.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%Y-%m-%d %H:%M:%S",
];

/// How a modification time is shown when there is no `Date:` header.
const MTIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Flags,
    From,
    To,
    Subject,
    Date,
    Year,
    Month,
    Day,
}

impl Token {
    /// Expansion priority.
    pub const ALL: [Token; 8] = [
        Token::Flags,
        Token::From,
        Token::To,
        Token::Subject,
        Token::Date,
        Token::Year,
        Token::Month,
        Token::Day,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Token::Flags => "FLAGS",
            Token::From => "FROM",
            Token::To => "TO",
            Token::Subject => "SUBJECT",
            Token::Date => "DATE",
            Token::Year => "YEAR",
            Token::Month => "MONTH",
            Token::Day => "DAY",
        }
    }
}

/// Expand the first occurrence of each token in `template`.
///
/// Tokens are located in the template itself, so a substituted value that
/// happens to contain a token name is never expanded again. A token whose
/// first occurrence overlaps one claimed by a higher-priority token is
/// skipped.
pub fn expand(template: &str, mut value: impl FnMut(Token) -> String) -> String {
    let mut spans: Vec<(usize, usize, Token)> = Vec::new();
    for token in Token::ALL {
        let Some(start) = template.find(token.as_str()) else {
            continue;
        };
        let end = start + token.as_str().len();
        if spans.iter().any(|&(s, e, _)| start < e && s < end) {
            continue;
        }
        spans.push((start, end, token));
    }
    spans.sort_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(template.len() + 32);
    let mut cursor = 0;
    for (start, end, token) in spans {
        out.push_str(&template[cursor..start]);
        out.push_str(&value(token));
        cursor = end;
    }
    out.push_str(&template[cursor..]);
    out
}

/// The date a message is shown with, and the timestamp its parts come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDate {
    pub text: String,
    pub stamp: Option<NaiveDateTime>,
}

impl MessageDate {
    /// Header date when one exists, parsed with the first pattern that
    /// accepts it; otherwise (or when nothing parses) the file mtime.
    pub fn resolve(header: Option<&str>, modified: Option<SystemTime>, formats: &[String]) -> Self {
        let mtime = modified.map(|t| DateTime::<Local>::from(t).naive_local());
        match header.map(str::trim).filter(|h| !h.is_empty()) {
            Some(header) => MessageDate {
                text: header.to_string(),
                stamp: parse_header_date(header, formats).or(mtime),
            },
            None => MessageDate {
                text: mtime
                    .map(|t| t.format(MTIME_FORMAT).to_string())
                    .unwrap_or_default(),
                stamp: mtime,
            },
        }
    }

    pub fn year(&self) -> String {
        self.part("%Y")
    }

    pub fn month(&self) -> String {
        self.part("%m")
    }

    pub fn day(&self) -> String {
        self.part("%d")
    }

    fn part(&self, fmt: &str) -> String {
        self.stamp
            .map(|t| t.format(fmt).to_string())
            .unwrap_or_default()
    }
}

/// Try each pattern in turn; the first that yields a calendar day wins.
pub fn parse_header_date(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let value = strip_comment(value);
    formats.iter().find_map(|fmt| parse_with(value, fmt))
}

fn parse_with(value: &str, fmt: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, fmt)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// `"Mon, 1 Jan 2024 10:00:00 +0000 (UTC)"` -> without the trailing comment.
fn strip_comment(value: &str) -> &str {
    let value = value.trim();
    if value.ends_with(')') {
        if let Some(open) = value.rfind('(') {
            return value[..open].trim_end();
        }
    }
    value
}
