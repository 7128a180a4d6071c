//! Scripted dialogue and the per-session cursor into it.
//!
//! The dialogue is built once at process start and shared read-only by every
//! session. Each session owns a [`ScriptCursor`] that walks the dialogue one
//! line per recognized utterance and never moves past the end.

use std::sync::Arc;

/// Lines played back in order, one per user utterance.
pub const DEFAULT_SCRIPT: [&str; 5] = [
    "Hello! I'm your AI sales assistant. What business do you run?",
    "Interesting. How many calls do you handle each week?",
    "Our system can automate all those calls for you. Want to see how?",
    "Great! I'll send you a trial link. Sound good?",
    "Perfect! Thanks for testing the AI demo.",
];

/// Notice sent for every qualifying utterance once the script is exhausted.
pub const DEFAULT_COMPLETION_NOTICE: &str = "Conversation complete! Thanks for testing.";

/// Immutable, cheaply cloneable ordered list of prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedDialogue {
    lines: Arc<[String]>,
}

impl ScriptedDialogue {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line at `index`, or `None` past the end.
    #[inline]
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Fresh cursor positioned at the first line.
    pub fn cursor(&self) -> ScriptCursor {
        ScriptCursor::new(self.len())
    }
}

impl Default for ScriptedDialogue {
    fn default() -> Self {
        Self::new(DEFAULT_SCRIPT)
    }
}

/// Position into a [`ScriptedDialogue`].
///
/// The position starts at 0, only ever increases, and is clamped at the
/// dialogue length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptCursor {
    position: usize,
    len: usize,
}

impl ScriptCursor {
    pub fn new(len: usize) -> Self {
        Self { position: 0, len }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.len
    }

    /// Returns the index to play next and moves past it, or `None` once every
    /// line has been played.
    pub fn advance(&mut self) -> Option<usize> {
        if self.is_exhausted() {
            return None;
        }
        let index = self.position;
        self.position += 1;
        Some(index)
    }
}
