//! crates/study_helper_core/src/answers.rs
//!
//! Tracks the answers selected during one quiz attempt.

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSet, QuestionId, QuizId};

/// What `AnswerTracker::record_answer` did with an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The question had no answer yet; the answered count went up by one.
    First,
    /// An earlier answer for the same question was overwritten.
    Replaced,
    /// The attempt has been graded; nothing was stored.
    Frozen,
    /// The question is not part of the attempt; nothing was stored.
    UnknownQuestion,
}

/// The answers of one attempt, keyed by question id rather than display position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTracker {
    quiz_id: Option<QuizId>,
    answers: AnswerSet,
    answered: usize,
    total: usize,
    frozen: bool,
}

impl AnswerTracker {
    pub fn new(quiz_id: QuizId, total: usize) -> Self {
        Self {
            quiz_id: Some(quiz_id),
            total,
            ..Self::default()
        }
    }

    /// Starts a new attempt when `quiz_id` differs from the one being tracked.
    /// Returns `true` if the tracker was reset.
    pub fn observe_quiz(&mut self, quiz_id: QuizId, total: usize) -> bool {
        if self.quiz_id == Some(quiz_id) {
            return false;
        }
        self.reset();
        self.quiz_id = Some(quiz_id);
        self.total = total;
        true
    }

    pub fn record_answer(&mut self, question_id: QuestionId, value: impl Into<String>) -> RecordOutcome {
        if self.frozen {
            return RecordOutcome::Frozen;
        }
        // The previous value is read from the same mutation, so two answers for
        // different questions can never both be counted against a stale snapshot.
        match self.answers.insert(question_id, value.into()) {
            None => {
                self.answered += 1;
                RecordOutcome::First
            }
            Some(_) => RecordOutcome::Replaced,
        }
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answered
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn quiz_id(&self) -> Option<QuizId> {
        self.quiz_id
    }

    /// True once every question has an answer. A quiz without questions is never complete.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.answered == self.total
    }

    /// Makes the answer set read-only for the rest of the attempt.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Clears every answer and the answered count. The question total is kept.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.answered = 0;
        self.frozen = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_answering_counts_once_and_keeps_last_value() {
        let mut tracker = AnswerTracker::new(1, 3);
        assert_eq!(tracker.record_answer(10, "a"), RecordOutcome::First);
        assert_eq!(tracker.record_answer(10, "b"), RecordOutcome::Replaced);
        assert_eq!(tracker.record_answer(10, "d"), RecordOutcome::Replaced);

        assert_eq!(tracker.answered_count(), 1);
        assert_eq!(tracker.answer(10), Some("d"));
    }

    #[test]
    fn answers_are_independent_per_question() {
        let mut tracker = AnswerTracker::new(1, 2);
        tracker.record_answer(10, "a");
        tracker.record_answer(11, "true");
        tracker.record_answer(10, "c");

        assert_eq!(tracker.answer(11), Some("true"));
        assert_eq!(tracker.answer(10), Some("c"));
        assert!(tracker.is_complete());
    }

    #[test]
    fn freeze_rejects_further_answers() {
        let mut tracker = AnswerTracker::new(1, 2);
        tracker.record_answer(10, "a");
        tracker.freeze();
        let before = tracker.answers().clone();

        assert_eq!(tracker.record_answer(10, "b"), RecordOutcome::Frozen);
        assert_eq!(tracker.record_answer(11, "a"), RecordOutcome::Frozen);
        assert_eq!(tracker.answers(), &before);
        assert_eq!(tracker.answered_count(), 1);
    }

    #[test]
    fn empty_quiz_is_never_complete() {
        let tracker = AnswerTracker::new(1, 0);
        assert!(!tracker.is_complete());
    }

    #[test]
    fn new_quiz_resets_the_attempt() {
        let mut tracker = AnswerTracker::new(1, 2);
        tracker.record_answer(10, "a");
        tracker.freeze();

        assert!(!tracker.observe_quiz(1, 2));
        assert!(tracker.observe_quiz(2, 5));
        assert_eq!(tracker.answered_count(), 0);
        assert_eq!(tracker.total(), 5);
        assert!(!tracker.is_frozen());
        assert!(tracker.answers().is_empty());
    }
}
