pub mod answers;
pub mod domain;
pub mod generation;
pub mod ports;

pub use answers::{AnswerTracker, RecordOutcome};
pub use domain::{
    AnswerSet, Blob, Material, NewQuiz, Question, QuestionResult, QuestionType, QuickCreateRequest,
    QuickCreateResponse, QuickCreateStatus, Quiz, QuizResult, QuizStatus,
};
pub use generation::{transition, GeneratedQuiz, GenerationEvent, GenerationState, Transition};
pub use ports::{
    MaterialGateway, ObjectUrlService, PortError, PortResult, QuizGateway, StorageService,
};
