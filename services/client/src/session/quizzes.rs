//! services/client/src/session/quizzes.rs
//!
//! The quiz API facade used by presentation code. One method per backend
//! endpoint, each mediated by the call wrapper and sharing one `CallStatus`.

use std::sync::Arc;
use study_helper_core::domain::{
    AnswerSet, CourseId, NewQuiz, Question, QuickCreateRequest, QuickCreateResponse,
    QuickCreateStatus, Quiz, QuizId, QuizResult,
};
use study_helper_core::ports::{PortError, PortResult, QuizGateway};

use crate::session::call::CallStatus;

#[derive(Clone)]
pub struct QuizService {
    gateway: Arc<dyn QuizGateway>,
    calls: CallStatus,
}

impl QuizService {
    pub fn new(gateway: Arc<dyn QuizGateway>, calls: CallStatus) -> Self {
        Self { gateway, calls }
    }

    pub fn calls(&self) -> &CallStatus {
        &self.calls
    }

    pub async fn list_quizzes(&self, course_id: CourseId) -> Option<Vec<Quiz>> {
        self.calls.run(|| self.gateway.list_quizzes(course_id)).await
    }

    pub async fn create_quiz(&self, course_id: CourseId, quiz: &NewQuiz) -> Option<Quiz> {
        self.calls.run(|| self.gateway.create_quiz(course_id, quiz)).await
    }

    pub async fn delete_quiz(&self, quiz_id: QuizId) -> Option<Quiz> {
        self.calls.run(|| self.gateway.delete_quiz(quiz_id)).await
    }

    pub async fn generate_questions(&self, quiz_id: QuizId) -> Option<Quiz> {
        self.calls.run(|| self.gateway.generate_questions(quiz_id)).await
    }

    pub async fn list_questions(&self, quiz_id: QuizId) -> Option<Vec<Question>> {
        self.calls.run(|| self.gateway.list_questions(quiz_id)).await
    }

    pub async fn get_quiz(&self, quiz_id: QuizId) -> Option<Quiz> {
        self.calls.run(|| self.gateway.get_quiz(quiz_id)).await
    }

    /// Validates `answers` against `questions` and submits them for grading.
    pub async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        questions: &[Question],
        answers: &AnswerSet,
    ) -> Option<QuizResult> {
        self.calls
            .run(|| async move {
                validate_answers(questions, answers)?;
                self.gateway.check_answers(quiz_id, answers).await
            })
            .await
    }

    pub async fn quick_create(&self, request: &QuickCreateRequest) -> Option<QuickCreateResponse> {
        self.calls.run(|| self.gateway.quick_create(request)).await
    }

    pub async fn quick_create_status(&self, quiz_id: QuizId) -> Option<QuickCreateStatus> {
        self.calls.run(|| self.gateway.quick_create_status(quiz_id)).await
    }

    /// Same call as `quick_create_status`, keeping the error for the poller's
    /// state machine. Polls never clear an error another call recorded.
    pub(crate) async fn poll_status(&self, quiz_id: QuizId) -> PortResult<QuickCreateStatus> {
        self.calls
            .track_background(|| self.gateway.quick_create_status(quiz_id))
            .await
    }
}

/// Checks that every answer targets a question of the quiz with a legal value.
pub fn validate_answers(questions: &[Question], answers: &AnswerSet) -> PortResult<()> {
    if answers.is_empty() {
        return Err(PortError::Validation("no answers to submit".to_string()));
    }
    for (question_id, value) in answers {
        let question = questions
            .iter()
            .find(|q| q.id == *question_id)
            .ok_or_else(|| {
                PortError::Validation(format!("question {} is not part of this quiz", question_id))
            })?;
        if !question.accepts(value) {
            return Err(PortError::Validation(format!(
                "'{}' is not a valid answer for question {}",
                value, question_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_helper_core::domain::QuestionType;

    fn true_false(id: u64) -> Question {
        Question {
            id,
            quiz_id: 1,
            question: format!("statement {id}"),
            question_type: QuestionType::TrueFalse,
            options: Vec::new(),
        }
    }

    #[test]
    fn rejects_unknown_questions_and_illegal_values() {
        let questions = vec![true_false(1), true_false(2)];

        let mut answers = AnswerSet::new();
        answers.insert(1, "true".to_string());
        assert!(validate_answers(&questions, &answers).is_ok());

        answers.insert(2, "b".to_string());
        assert!(matches!(validate_answers(&questions, &answers), Err(PortError::Validation(_))));

        answers.insert(2, "false".to_string());
        answers.insert(99, "true".to_string());
        assert!(matches!(validate_answers(&questions, &answers), Err(PortError::Validation(_))));
    }

    #[test]
    fn empty_answer_set_is_malformed() {
        assert!(validate_answers(&[true_false(1)], &AnswerSet::new()).is_err());
    }
}
