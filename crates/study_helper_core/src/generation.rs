//! crates/study_helper_core/src/generation.rs
//!
//! The quiz-generation state machine as plain data plus a pure transition
//! function. The async poll loop in the client drives it; everything here can
//! be exercised without a runtime.

use serde::{Deserialize, Serialize};

use crate::domain::{Question, QuickCreateStatus, Quiz, QuizId, QuizStatus};
use crate::ports::PortError;

/// The observable state of one generation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    Generating {
        quiz_id: QuizId,
        polls: u32,
    },
    Completed {
        quiz_id: QuizId,
        quiz: Quiz,
        questions: Vec<Question>,
    },
    Failed {
        quiz_id: QuizId,
        error: PortError,
    },
}

impl GenerationState {
    pub fn quiz_id(&self) -> Option<QuizId> {
        match self {
            Self::Idle => None,
            Self::Generating { quiz_id, .. }
            | Self::Completed { quiz_id, .. }
            | Self::Failed { quiz_id, .. } => Some(*quiz_id),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    /// A create/quick-create call succeeded and returned the job's quiz id.
    Started { quiz_id: QuizId },
    /// A status check returned.
    Polled(QuickCreateStatus),
    /// A status check failed.
    PollFailed(PortError),
    /// The elapsed-time budget ran out.
    DeadlineExceeded,
    Cancelled,
}

/// The quiz and questions handed to the presentation layer when generation finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuiz {
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: GenerationState,
    /// Set only on the step that moves `Generating` to `Completed`.
    pub completed: Option<GeneratedQuiz>,
}

impl Transition {
    fn to(state: GenerationState) -> Self {
        Self { state, completed: None }
    }
}

/// Applies `event` to `state`. `max_polls` is the status-check budget of one attempt.
///
/// Poll results are only accepted while generating, and only for the quiz id
/// being generated, so late or repeated responses can neither re-fire
/// completion nor roll a finished attempt back.
pub fn transition(state: &GenerationState, event: GenerationEvent, max_polls: u32) -> Transition {
    let unchanged = || Transition::to(state.clone());
    match event {
        GenerationEvent::Cancelled => Transition::to(GenerationState::Idle),
        GenerationEvent::Started { quiz_id } => {
            Transition::to(GenerationState::Generating { quiz_id, polls: 0 })
        }
        GenerationEvent::Polled(status) => match state {
            GenerationState::Generating { quiz_id, polls } if status.quiz_id == *quiz_id => {
                on_status(*quiz_id, polls + 1, status, max_polls)
            }
            _ => unchanged(),
        },
        GenerationEvent::PollFailed(error) => match state {
            GenerationState::Generating { quiz_id, .. } => {
                Transition::to(GenerationState::Failed { quiz_id: *quiz_id, error })
            }
            _ => unchanged(),
        },
        GenerationEvent::DeadlineExceeded => match state {
            GenerationState::Generating { quiz_id, polls } => Transition::to(GenerationState::Failed {
                quiz_id: *quiz_id,
                error: PortError::GenerationTimeout { attempts: *polls },
            }),
            _ => unchanged(),
        },
    }
}

fn on_status(quiz_id: QuizId, polls: u32, status: QuickCreateStatus, max_polls: u32) -> Transition {
    match status.status {
        QuizStatus::Completed => match (status.quiz, status.questions) {
            (Some(quiz), Some(questions)) => Transition {
                state: GenerationState::Completed {
                    quiz_id,
                    quiz: quiz.clone(),
                    questions: questions.clone(),
                },
                completed: Some(GeneratedQuiz { quiz, questions }),
            },
            _ => Transition::to(GenerationState::Failed {
                quiz_id,
                error: PortError::Unexpected(format!(
                    "quiz {} reported completed without its questions",
                    quiz_id
                )),
            }),
        },
        QuizStatus::Generating if polls >= max_polls => Transition::to(GenerationState::Failed {
            quiz_id,
            error: PortError::GenerationTimeout { attempts: polls },
        }),
        QuizStatus::Generating => Transition::to(GenerationState::Generating { quiz_id, polls }),
    }
}
