use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::PredictionResult;

/// A past analysis with client-side display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub label: String,
    /// When this client learned about the entry, not when it was computed.
    pub timestamp: DateTime<Utc>,
}

fn label_for(position: usize) -> String {
    format!("Analisis Jantung #{}", position + 1)
}

/// Local mirror of the caller's remote prediction history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPanel {
    entries: Vec<HistoryEntry>,
}

impl HistoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replaces the local list with a freshly fetched remote one.
    pub fn load(&mut self, results: Vec<PredictionResult>) {
        let now = Utc::now();
        self.entries = results
            .into_iter()
            .enumerate()
            .map(|(i, result)| HistoryEntry {
                result,
                label: label_for(i),
                timestamp: now,
            })
            .collect();
    }

    /// Records a prediction completed in this session.
    pub fn push(&mut self, result: PredictionResult) {
        let label = label_for(self.entries.len());
        self.entries.push(HistoryEntry {
            result,
            label,
            timestamp: Utc::now(),
        });
    }

    pub fn remove(&mut self, index: usize) -> Option<HistoryEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_labels_in_fetch_order() {
        let mut panel = HistoryPanel::new();
        panel.load(vec![
            PredictionResult::new("Low risk"),
            PredictionResult::new("High risk"),
        ]);
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.entries()[0].label, "Analisis Jantung #1");
        assert_eq!(panel.entries()[1].result.risk_level, "High risk");
    }

    #[test]
    fn test_push_continues_sequence() {
        let mut panel = HistoryPanel::new();
        panel.load(vec![PredictionResult::new("Low risk")]);
        panel.push(PredictionResult::new("High risk"));
        assert_eq!(panel.entries()[1].label, "Analisis Jantung #2");
    }

    #[test]
    fn test_remove_out_of_range_keeps_list() {
        let mut panel = HistoryPanel::new();
        panel.push(PredictionResult::new("Low risk"));
        assert!(panel.remove(5).is_none());
        assert_eq!(panel.len(), 1);
        assert!(panel.remove(0).is_some());
        assert!(panel.is_empty());
    }

    #[test]
    fn test_entry_serializes_flat() {
        let mut panel = HistoryPanel::new();
        panel.push(PredictionResult::new("Low risk"));
        let json = serde_json::to_value(&panel.entries()[0]).unwrap();
        assert_eq!(json["risk_level"], "Low risk");
        assert_eq!(json["label"], "Analisis Jantung #1");
    }
}
