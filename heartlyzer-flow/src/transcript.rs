use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    System,
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Unique for the lifetime of the transcript, including across resets.
    /// A replaced entry gets a fresh id.
    pub id: u64,
    pub speaker: Speaker,
    pub content: String,
    /// Placeholder or progress text that the in-flight analysis will replace.
    #[serde(default)]
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn is_pending_system(&self) -> bool {
        self.speaker == Speaker::System && self.pending
    }
}

/// Append-only conversation log. The only in-place mutation is
/// [`Transcript::replace_last`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.last()
    }

    fn make_entry(&mut self, speaker: Speaker, content: String, pending: bool) -> TranscriptEntry {
        let id = self.next_id;
        self.next_id += 1;
        TranscriptEntry {
            id,
            speaker,
            content,
            pending,
            created_at: Utc::now(),
        }
    }

    fn push(&mut self, speaker: Speaker, content: String, pending: bool) -> u64 {
        let entry = self.make_entry(speaker, content, pending);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn user(&mut self, content: impl Into<String>) -> u64 {
        self.push(Speaker::User, content.into(), false)
    }

    pub fn system(&mut self, content: impl Into<String>) -> u64 {
        self.push(Speaker::System, content.into(), false)
    }

    /// Appends a system entry that a later [`Transcript::replace_last`] may overwrite.
    pub fn pending(&mut self, content: impl Into<String>) -> u64 {
        self.push(Speaker::System, content.into(), true)
    }

    /// Replaces the most recent entry matching `predicate` with a settled
    /// system entry. Returns `false` when nothing matched.
    pub fn replace_last<P>(&mut self, predicate: P, content: impl Into<String>) -> bool
    where
        P: Fn(&TranscriptEntry) -> bool,
    {
        let Some(index) = self.entries.iter().rposition(|e| predicate(e)) else {
            return false;
        };
        let entry = self.make_entry(Speaker::System, content.into(), false);
        self.entries[index] = entry;
        true
    }

    /// Clears the log and seeds it with the given system messages.
    pub fn reset<I, S>(&mut self, initial: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.clear();
        for content in initial {
            self.system(content);
        }
    }
}
