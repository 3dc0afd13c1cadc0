use chrono::{DateTime, Local};

/// Summary of one completed quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningRecord {
    pub topic: String,
    /// Percentage of questions judged correct, 0-100.
    pub score: u8,
    pub timestamp: DateTime<Local>,
}

impl LearningRecord {
    pub fn new(topic: impl Into<String>, score: u8) -> Self {
        Self {
            topic: topic.into(),
            score: score.min(100),
            timestamp: Local::now(),
        }
    }
}

/// Append-only, in-memory list of finished quizzes. Nothing here is ever
/// written to disk.
#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    records: Vec<LearningRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: LearningRecord) {
        self.records.push(record);
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[LearningRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
