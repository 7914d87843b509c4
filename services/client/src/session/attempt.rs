//! services/client/src/session/attempt.rs
//!
//! One run through a quiz's questions, from the first answer to grading.

use study_helper_core::answers::{AnswerTracker, RecordOutcome};
use study_helper_core::domain::{Question, QuestionId, QuestionResult, Quiz, QuizResult};
use study_helper_core::generation::GeneratedQuiz;
use tracing::{debug, info};

use crate::session::quizzes::QuizService;

pub struct QuizAttempt {
    quiz: Quiz,
    questions: Vec<Question>,
    tracker: AnswerTracker,
    current: usize,
    result: Option<QuizResult>,
}

impl QuizAttempt {
    pub fn new(quiz: Quiz, questions: Vec<Question>) -> Self {
        let tracker = AnswerTracker::new(quiz.id, questions.len());
        Self {
            quiz,
            questions,
            tracker,
            current: 0,
            result: None,
        }
    }

    /// Switches to another quiz. Answers are kept when it is the same quiz.
    pub fn load(&mut self, quiz: Quiz, questions: Vec<Question>) {
        if self.tracker.observe_quiz(quiz.id, questions.len()) {
            debug!("New attempt started for quiz {}.", quiz.id);
            self.current = 0;
            self.result = None;
        }
        self.quiz = quiz;
        self.questions = questions;
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    // --- Navigation (display position only; answers are keyed by question id) ---

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.questions.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    // --- Answers ---

    /// Records an answer for one of this attempt's questions. Ids from
    /// elsewhere are refused so they cannot count towards completion.
    pub fn record_answer(&mut self, question_id: QuestionId, value: impl Into<String>) -> RecordOutcome {
        if !self.questions.iter().any(|q| q.id == question_id) {
            debug!(
                "Ignoring answer for question {}: not part of quiz {}.",
                question_id, self.quiz.id
            );
            return RecordOutcome::UnknownQuestion;
        }
        let outcome = self.tracker.record_answer(question_id, value);
        if outcome == RecordOutcome::Frozen {
            debug!("Ignoring answer for question {}: attempt already graded.", question_id);
        }
        outcome
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&str> {
        self.tracker.answer(question_id)
    }

    pub fn tracker(&self) -> &AnswerTracker {
        &self.tracker
    }

    pub fn answered_count(&self) -> usize {
        self.tracker.answered_count()
    }

    pub fn is_complete(&self) -> bool {
        self.tracker.is_complete()
    }

    // --- Grading ---

    /// Validates and submits the answers. On success the result is stored and
    /// the answers freeze. A second submission returns the stored result.
    pub async fn submit(&mut self, quizzes: &QuizService) -> Option<&QuizResult> {
        if self.result.is_none() {
            let result = quizzes
                .submit_quiz(self.quiz.id, &self.questions, self.tracker.answers())
                .await?;
            info!(
                "Quiz {} graded: {}/{} correct.",
                self.quiz.id,
                result.score(),
                result.len()
            );
            self.tracker.freeze();
            self.result = Some(result);
        }
        self.result.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&QuizResult> {
        self.result.as_ref()
    }

    pub fn result_for(&self, question_id: QuestionId) -> Option<&QuestionResult> {
        self.result.as_ref()?.for_question(question_id)
    }
}

impl From<GeneratedQuiz> for QuizAttempt {
    fn from(generated: GeneratedQuiz) -> Self {
        Self::new(generated.quiz, generated.questions)
    }
}
