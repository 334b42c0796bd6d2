//! Position tracking and answer accumulation for one questionnaire run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::schema::{self, AnswerValue, FieldSpec};

pub const START_COMMAND: &str = "mulai";
pub const RESTART_COMMAND: &str = "mulai lagi";

/// Where the interview currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "index", rename_all = "snake_case")]
pub enum Stage {
    /// Waiting for the start command.
    Intro,
    /// Asking the field at this index.
    Asking(usize),
    /// Every field answered.
    Complete,
    /// Showing a past analysis. Field answers are not accepted.
    Reviewing,
}

impl Stage {
    /// Numeric position: `-2` reviewing, `-1` intro, `0..N` asking, `N` complete.
    pub fn position(&self) -> i64 {
        match self {
            Stage::Reviewing => -2,
            Stage::Intro => -1,
            Stage::Asking(i) => *i as i64,
            Stage::Complete => schema::field_count() as i64,
        }
    }
}

/// A free-text submission classified against the command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Restart,
    Text(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(input: &'a str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case(RESTART_COMMAND) {
            Command::Restart
        } else if trimmed.eq_ignore_ascii_case(START_COMMAND) {
            Command::Start
        } else {
            Command::Text(trimmed)
        }
    }
}

/// Outcome of offering one answer to the current field.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// Stored; the next field is now being asked.
    Advanced { next: &'static FieldSpec },
    /// Stored; that was the last field.
    Completed,
    /// Rejected; nothing changed.
    Rejected { field: &'static FieldSpec },
    /// Not in a stage that takes answers.
    NotAsking,
}

/// Interview position plus the answers gathered so far.
///
/// `answers` holds exactly the ids of the fields before the current
/// position and is empty outside of `Asking`/`Complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterviewState {
    stage: Stage,
    answers: BTreeMap<String, AnswerValue>,
}

impl InterviewState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Intro,
            answers: BTreeMap::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn position(&self) -> i64 {
        self.stage.position()
    }

    pub fn answers(&self) -> &BTreeMap<String, AnswerValue> {
        &self.answers
    }

    /// Field currently being asked, if any.
    pub fn current_field(&self) -> Option<&'static FieldSpec> {
        match self.stage {
            Stage::Asking(i) => schema::field(i),
            _ => None,
        }
    }

    /// "Pertanyaan 3 dari 28" while asking.
    pub fn progress_label(&self) -> Option<String> {
        match self.stage {
            Stage::Asking(i) => Some(format!(
                "Pertanyaan {} dari {}",
                i + 1,
                schema::field_count()
            )),
            _ => None,
        }
    }

    /// Intro -> Asking(0). Returns the first field, or `None` if not in Intro.
    pub fn start(&mut self) -> Option<&'static FieldSpec> {
        if self.stage != Stage::Intro {
            return None;
        }
        self.stage = Stage::Asking(0);
        schema::field(0)
    }

    pub fn answer(&mut self, raw: &str) -> AnswerOutcome {
        let Stage::Asking(index) = self.stage else {
            return AnswerOutcome::NotAsking;
        };
        let Some(field) = schema::field(index) else {
            return AnswerOutcome::NotAsking;
        };

        let value = match field.accept(raw) {
            Ok(value) => value,
            Err(_) => {
                debug!(field = field.id, "answer rejected");
                return AnswerOutcome::Rejected { field };
            }
        };

        debug!(field = field.id, ?value, "answer accepted");
        self.answers.insert(field.id.to_string(), value);

        match schema::field(index + 1) {
            Some(next) => {
                self.stage = Stage::Asking(index + 1);
                AnswerOutcome::Advanced { next }
            }
            None => {
                self.stage = Stage::Complete;
                AnswerOutcome::Completed
            }
        }
    }

    /// Switches to review mode. Answers stay as they were until a reset.
    pub fn review(&mut self) {
        self.stage = Stage::Reviewing;
    }

    pub fn reset(&mut self) {
        self.stage = Stage::Intro;
        self.answers.clear();
    }
}

impl Default for InterviewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing_is_case_insensitive() {
        assert_eq!(Command::parse("Mulai"), Command::Start);
        assert_eq!(Command::parse("  MULAI LAGI "), Command::Restart);
        assert_eq!(Command::parse("mulai sekarang"), Command::Text("mulai sekarang"));
    }

    #[test]
    fn test_start_only_from_intro() {
        let mut state = InterviewState::new();
        assert_eq!(state.position(), -1);
        assert_eq!(state.start().map(|f| f.id), Some("age"));
        assert_eq!(state.position(), 0);
        assert!(state.start().is_none());
        assert_eq!(state.position(), 0);
    }

    #[test]
    fn test_rejected_answer_changes_nothing() {
        let mut state = InterviewState::new();
        state.start();
        let before = state.clone();
        let outcome = state.answer("15");
        assert!(matches!(outcome, AnswerOutcome::Rejected { field } if field.id == "age"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_accepted_answer_advances_by_one() {
        let mut state = InterviewState::new();
        state.start();
        let outcome = state.answer("45");
        assert!(matches!(outcome, AnswerOutcome::Advanced { next } if next.id == "gender"));
        assert_eq!(state.position(), 1);
        assert_eq!(state.answers().get("age"), Some(&AnswerValue::Number(45)));
        assert_eq!(state.answers().len(), 1);
        assert_eq!(state.progress_label().as_deref(), Some("Pertanyaan 2 dari 28"));
    }

    #[test]
    fn test_answers_outside_asking_are_refused() {
        let mut state = InterviewState::new();
        assert_eq!(state.answer("45"), AnswerOutcome::NotAsking);
        state.review();
        assert_eq!(state.position(), -2);
        assert_eq!(state.answer("45"), AnswerOutcome::NotAsking);
        state.reset();
        assert_eq!(state, InterviewState::new());
    }
}
