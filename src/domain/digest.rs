//! Digest results and the bounded local history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of digests kept in local history.
pub const HISTORY_CAP: usize = 20;

/// A paper picked and summarized by the agent.
///
/// `arxiv_id` is unique within one digest, not across digests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub arxiv_id: String,
    pub title: String,
    pub authors: String,
    pub summary: String,
    pub significance: String,
    pub category: String,
}

impl Paper {
    /// Link to the abstract page.
    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.arxiv_id)
    }
}

/// One completed digest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestResult {
    pub papers_analyzed: u32,
    pub papers_included: u32,
    pub top_papers: Vec<Paper>,
    pub digest_sent: bool,
    pub recipient_email: String,
    pub execution_time: DateTime<Utc>,
}

impl DigestResult {
    /// Case-insensitive match against recipient, paper titles and authors.
    ///
    /// An empty needle matches everything.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        self.recipient_email.to_lowercase().contains(&needle)
            || self.top_papers.iter().any(|paper| {
                paper.title.to_lowercase().contains(&needle) || paper.authors.to_lowercase().contains(&needle)
            })
    }
}

/// Completed digests, newest first, never longer than [`HISTORY_CAP`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<DigestResult>", into = "Vec<DigestResult>")]
pub struct DigestHistory {
    entries: Vec<DigestResult>,
}

impl From<Vec<DigestResult>> for DigestHistory {
    fn from(entries: Vec<DigestResult>) -> Self {
        Self::from_newest_first(entries)
    }
}

impl From<DigestHistory> for Vec<DigestResult> {
    fn from(history: DigestHistory) -> Self {
        history.entries
    }
}

impl DigestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an already newest-first sequence, dropping anything past the cap.
    pub fn from_newest_first(mut entries: Vec<DigestResult>) -> Self {
        entries.truncate(HISTORY_CAP);
        Self { entries }
    }

    /// Put a new result at the front, discarding the oldest beyond the cap.
    pub fn prepend(&mut self, result: DigestResult) {
        self.entries.insert(0, result);
        self.entries.truncate(HISTORY_CAP);
    }

    /// The most recently completed digest.
    pub fn latest(&self) -> Option<&DigestResult> {
        self.entries.first()
    }

    pub fn get(&self, index: usize) -> Option<&DigestResult> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DigestResult> {
        self.entries.iter()
    }

    /// Indices of entries matching a search term, preserving order.
    pub fn search(&self, needle: &str) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, digest)| digest.matches_search(needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}
