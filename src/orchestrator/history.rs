//! In-memory history of commands typed at the command prompt.

/// Entered commands, oldest first.
#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: Vec<String>,
}

impl CommandHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry unless it repeats the newest one.
    pub fn insert(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        if self.last() != Some(entry.as_str()) {
            self.entries.push(entry);
        }
    }

    /// The newest entry.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> CommandHistory {
        let mut history = CommandHistory::new();
        for entry in entries {
            history.insert(*entry);
        }
        history
    }

    #[test]
    fn consecutive_duplicates_are_dropped() {
        let history = history(&["ls", "ls", "pwd", "ls"]);
        assert_eq!(history.entries, ["ls", "pwd", "ls"]);
        assert_eq!(history.last(), Some("ls"));
    }

    #[test]
    fn empty_history_has_no_last_entry() {
        assert_eq!(CommandHistory::new().last(), None);
    }
}
