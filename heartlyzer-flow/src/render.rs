//! Text rendering of transcript entries for line-oriented front-ends.

use chrono::Local;
use regex::Regex;
use std::sync::LazyLock;

use crate::transcript::{Speaker, TranscriptEntry};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#+\s*([^\n]+)$").expect("header pattern is valid")
});

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").expect("strong pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupStyle {
    /// Markers removed, text kept.
    Plain,
    /// Headers and strong text in ANSI bold.
    Ansi,
}

pub fn speaker_label(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::User => "Anda",
        Speaker::System => "heartlyzer",
    }
}

/// Applies lightweight markup: `#` headers and `**strong**` spans.
pub fn render_markup(content: &str, style: MarkupStyle) -> String {
    let replacement = match style {
        MarkupStyle::Plain => "$1",
        MarkupStyle::Ansi => "\x1b[1m$1\x1b[0m",
    };
    let headers = HEADER.replace_all(content, replacement);
    STRONG.replace_all(&headers, replacement).into_owned()
}

/// `label · HH:MM` followed by the rendered body.
pub fn render_entry(entry: &TranscriptEntry, style: MarkupStyle) -> String {
    let time = entry.created_at.with_timezone(&Local).format("%H:%M");
    format!(
        "{} · {}\n{}",
        speaker_label(entry.speaker),
        time,
        render_markup(&entry.content, style)
    )
}
