pub mod attempt;
pub mod blob_cache;
pub mod call;
pub mod materials;
pub mod notify;
pub mod poller;
pub mod quizzes;
pub mod state;

pub use attempt::QuizAttempt;
pub use blob_cache::{CachedBlob, MaterialBlobCache};
pub use call::{call_api, CallObserver, CallStatus};
pub use materials::MaterialLibrary;
pub use notify::{Notification, Notifier, ToastKind};
pub use poller::{GenerationPoller, PollHandle, PollPolicy};
pub use quizzes::QuizService;
pub use state::ClientState;
