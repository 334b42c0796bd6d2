use heartlyzer_flow::{HistoryEntry, MarkupStyle, SessionView, render_entry};
use std::collections::HashSet;

/// Turns successive session views into output blocks, each transcript
/// entry exactly once.
pub struct TranscriptPrinter {
    style: MarkupStyle,
    printed: HashSet<u64>,
    last_progress: Option<String>,
}

impl TranscriptPrinter {
    pub fn new(style: MarkupStyle) -> Self {
        Self {
            style,
            printed: HashSet::new(),
            last_progress: None,
        }
    }

    pub fn render_updates(&mut self, view: &SessionView) -> Vec<String> {
        let mut blocks = Vec::new();

        for entry in &view.transcript {
            if self.printed.insert(entry.id) {
                blocks.push(render_entry(entry, self.style));
            }
        }

        if view.progress != self.last_progress {
            if let Some(progress) = &view.progress {
                blocks.push(format!("[{progress}]"));
            }
            self.last_progress = view.progress.clone();
        }

        blocks
    }
}

pub fn render_history(history: &[HistoryEntry]) -> String {
    if history.is_empty() {
        return "Belum ada riwayat analisis.".to_string();
    }
    history
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} · {} · {}",
                i + 1,
                entry.label,
                entry.result.risk_level,
                entry.timestamp.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
