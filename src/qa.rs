use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One curated question/answer pair from the template file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaEntry {
    pub question: String,
    pub answer: String,
}

/// Ordered, read-only collection of predefined Q&A pairs, loaded once at
/// startup. Order matters: the first matching entry wins.
#[derive(Debug, Default)]
pub struct QaStore {
    entries: Vec<QaEntry>,
}

impl QaStore {
    pub fn new(entries: Vec<QaEntry>) -> Self {
        Self { entries }
    }

    /// Loads the template file. A missing or malformed file degrades to an
    /// empty store (every lookup misses) rather than failing startup.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read_entries(path) {
            Ok(entries) => {
                tracing::info!(count = entries.len(), path = %path.display(), "loaded QA templates");
                Self { entries }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "QA templates unavailable, matcher will always miss");
                Self::default()
            }
        }
    }

    fn read_entries(path: &Path) -> Result<Vec<QaEntry>> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let entries: Vec<QaEntry> = serde_json::from_reader(reader)?;
        Ok(entries)
    }

    /// Returns the answer of the first stored question that contains the
    /// case-folded query as a substring. Containment of the query within the
    /// question is intentional (short queries may match broadly); equality or
    /// fuzzy matching would change documented behavior.
    pub fn lookup(&self, query: &str) -> Option<&str> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .find(|qa| qa.question.to_lowercase().contains(&query))
            .map(|qa| qa.answer.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
