/// Strings entered at the prompt, oldest first.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Blank input and an immediate repeat are not stored.
    pub fn add(&mut self, entry: &str) {
        let entry = entry.trim();
        if entry.is_empty() || self.entries.last().is_some_and(|last| last == entry) {
            return;
        }
        self.entries.push(entry.to_string());
    }

    pub fn at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Up/Down recall position over a [`History`] while a prompt is open.
///
/// `None` means the prompt shows what the user typed, not a recalled entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recall {
    pos: Option<usize>,
}

impl Recall {
    /// Step to an older entry, stopping at the oldest.
    pub fn older<'a>(&mut self, history: &'a History) -> Option<&'a str> {
        if history.is_empty() {
            return None;
        }
        let pos = match self.pos {
            Some(p) => p.saturating_sub(1),
            None => history.len() - 1,
        };
        self.pos = Some(pos);
        history.at(pos)
    }

    /// Step to a newer entry; past the newest returns to the typed text.
    pub fn newer<'a>(&mut self, history: &'a History) -> Option<&'a str> {
        match self.pos {
            Some(p) if p + 1 < history.len() => {
                self.pos = Some(p + 1);
                history.at(p + 1)
            }
            _ => {
                self.pos = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_skips_blank_and_repeats() {
        let mut h = History::new();
        h.add("lists");
        h.add("  ");
        h.add("lists");
        h.add("work");
        assert_eq!(h.len(), 2);
        assert_eq!(h.at(0), Some("lists"));
        assert_eq!(h.at(1), Some("work"));
        assert_eq!(h.at(2), None);
        h.clear();
        assert!(h.is_empty());
    }

    #[test]
    fn recall_walks_back_and_forward() {
        let mut h = History::new();
        h.add("a");
        h.add("b");
        h.add("c");

        let mut r = Recall::default();
        assert_eq!(r.older(&h), Some("c"));
        assert_eq!(r.older(&h), Some("b"));
        assert_eq!(r.older(&h), Some("a"));
        assert_eq!(r.older(&h), Some("a"));
        assert_eq!(r.newer(&h), Some("b"));
        assert_eq!(r.newer(&h), Some("c"));
        assert_eq!(r.newer(&h), None);
        assert_eq!(r.older(&h), Some("c"));
    }

    #[test]
    fn recall_on_empty_history() {
        let h = History::new();
        let mut r = Recall::default();
        assert_eq!(r.older(&h), None);
        assert_eq!(r.newer(&h), None);
    }
}
