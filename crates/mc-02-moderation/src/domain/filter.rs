//! # Word Filter
//!
//! Counts the distinct filtered words that occur in a message as whole words.
//!
//! ## Matching Rules
//!
//! - ASCII case-insensitive.
//! - An occurrence counts only when the byte before it and the byte after it
//!   are not ASCII alphanumeric (or are the text boundary).
//! - Every start position is examined, so a rejected occurrence does not hide
//!   a later one (`"reassign assign"` matches `assign`).
//! - Each filtered word contributes at most 1 per message.

use crate::domain::errors::FilterError;
use tracing::warn;

/// Maximum number of filtered words kept.
pub const MAX_FILTERED_WORDS: usize = 50;

/// Maximum length of one filtered word in bytes.
pub const MAX_WORD_BYTES: usize = 19;

#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    /// Lowercased, deduplicated words.
    words: Vec<String>,
}

impl WordFilter {
    /// Build a filter from individual words.
    ///
    /// Blank entries are skipped and duplicates (ignoring case) collapse.
    /// Words beyond [`MAX_FILTERED_WORDS`] are dropped with a warning.
    pub fn new<I, S>(words: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept: Vec<String> = Vec::new();
        let mut ignored = 0usize;
        for raw in words {
            let word = raw.as_ref().trim();
            if word.is_empty() {
                continue;
            }
            if word.len() > MAX_WORD_BYTES {
                return Err(FilterError::WordTooLong {
                    word: word.to_string(),
                    len: word.len(),
                    max: MAX_WORD_BYTES,
                });
            }
            let lowered = word.to_ascii_lowercase();
            if kept.contains(&lowered) {
                continue;
            }
            if kept.len() == MAX_FILTERED_WORDS {
                ignored += 1;
                continue;
            }
            kept.push(lowered);
        }
        if ignored > 0 {
            warn!(
                ignored,
                limit = MAX_FILTERED_WORDS,
                "[mc-02] Filtered-word list truncated"
            );
        }
        Ok(Self { words: kept })
    }

    /// Parse the contents of a filtered-words file (one word per line).
    pub fn from_list(contents: &str) -> Result<Self, FilterError> {
        Self::new(contents.lines())
    }

    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of distinct filtered words present in `text` as whole words.
    #[must_use]
    pub fn count_violations(&self, text: &str) -> u32 {
        let haystack = text.to_ascii_lowercase();
        let mut count = 0;
        for word in &self.words {
            if contains_whole_word(haystack.as_bytes(), word.as_bytes()) {
                count += 1;
            }
        }
        count
    }
}

fn contains_whole_word(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    (0..=haystack.len() - needle.len()).any(|start| {
        let end = start + needle.len();
        &haystack[start..end] == needle
            && (start == 0 || !haystack[start - 1].is_ascii_alphanumeric())
            && (end == haystack.len() || !haystack[end].is_ascii_alphanumeric())
    })
}
