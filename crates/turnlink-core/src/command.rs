//! Operator command classification.
//!
//! Keywords match case-insensitively. `exit` must be the whole line; `save`
//! and `load` only need to prefix it, so `save 2` and `SAVE` both count.

/// Kind of an operator input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// End the session. Never transmitted.
    Exit,
    /// Persist a configuration record, then transmit the line.
    Save,
    /// Load and transmit a configuration record, then transmit the line.
    Load,
    /// Plain text, transmitted verbatim.
    Text,
}

impl Command {
    /// Classify one operator input line.
    pub fn classify(line: &str) -> Self {
        if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if has_keyword_prefix(line, "save") {
            Self::Save
        } else if has_keyword_prefix(line, "load") {
            Self::Load
        } else {
            Self::Text
        }
    }

    /// Returns true if the line should reach the transport.
    pub fn is_transmitted(self) -> bool {
        !matches!(self, Self::Exit)
    }
}

fn has_keyword_prefix(line: &str, keyword: &str) -> bool {
    line.get(..keyword.len()).is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
}
