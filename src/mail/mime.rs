use mail_parser::{HeaderValue, MessageParser, MimeHeaders, PartType};

/// Parsed view of one message file: header lookup and a plain-text body.
///
/// Built once from the raw bytes and owned by the `Message` that asked for
/// it. Values are copied out of the parser so nothing borrows the file
/// contents afterwards.
#[derive(Debug, Clone, Default)]
pub struct MimeDocument {
    headers: Vec<(String, String)>,
    body: String,
}

impl MimeDocument {
    /// Parse raw message bytes. Never fails: unparseable input yields no
    /// headers and the raw text as body.
    pub fn parse(raw: &[u8]) -> Self {
        let Some(message) = MessageParser::default().parse(raw) else {
            return Self {
                headers: Vec::new(),
                body: String::from_utf8_lossy(raw).into_owned(),
            };
        };

        let headers = message
            .headers()
            .iter()
            .map(|header| {
                let value = match header.value() {
                    HeaderValue::Text(text) => text.to_string(),
                    _ => raw_value(raw, header.offset_start as usize, header.offset_end as usize),
                };
                (header.name().to_string(), value)
            })
            .collect();

        Self {
            headers,
            body: plain_body(&message, raw),
        }
    }

    /// First header with this name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn body_lines(&self) -> Vec<String> {
        self.body.lines().map(str::to_string).collect()
    }
}

/// Unfolded, trimmed header text as it appears in the file.
fn raw_value(raw: &[u8], start: usize, end: usize) -> String {
    let Some(bytes) = raw.get(start..end) else {
        return String::new();
    };
    String::from_utf8_lossy(bytes)
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `text/plain` part, falling back to everything after the header
/// block.
fn plain_body(message: &mail_parser::Message<'_>, raw: &[u8]) -> String {
    for part in message.parts.iter() {
        let is_plain = part
            .content_type()
            .map(|ct| {
                ct.ctype().eq_ignore_ascii_case("text")
                    && ct.subtype().is_none_or(|s| s.eq_ignore_ascii_case("plain"))
            })
            .unwrap_or(true);
        if let PartType::Text(text) = &part.body {
            if is_plain && !text.is_empty() {
                return text.to_string();
            }
        }
    }

    let text = String::from_utf8_lossy(raw);
    match text.find("\r\n\r\n").map(|i| i + 4).or_else(|| text.find("\n\n").map(|i| i + 2)) {
        Some(start) => text[start..].to_string(),
        None => String::new(),
    }
}
