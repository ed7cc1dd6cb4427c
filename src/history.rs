/// Commands entered during this session, for replaying the last one on an
/// empty line. Nothing is persisted.
#[derive(Debug, Default)]
pub struct CommandHistory {
    history: Vec<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `cmd`, skipping consecutive duplicates.
    pub fn add(&mut self, cmd: &str) {
        let should_append = match self.history.last() {
            Some(last) => last != cmd,
            None => true,
        };

        if should_append {
            self.history.push(cmd.to_string());
        }
    }

    pub fn last_command(&self) -> Option<String> {
        self.history.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_consecutive_duplicates() {
        let mut history = CommandHistory::new();
        history.add("continue");
        history.add("continue");
        history.add("register dump");
        history.add("continue");

        assert_eq!(history.len(), 3);
        assert_eq!(history.last_command().as_deref(), Some("continue"));
    }

    #[test]
    fn empty_history_has_no_last_command() {
        assert!(CommandHistory::new().last_command().is_none());
    }
}
