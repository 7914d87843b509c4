//! services/client/src/session/poller.rs
//!
//! Drives the quiz-generation state machine: starts a generation job, polls its
//! status on an interval and publishes every transition until the attempt
//! completes, fails, or is cancelled through its `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;
use study_helper_core::domain::{CourseId, NewQuiz, QuickCreateRequest, QuizId};
use study_helper_core::generation::{transition, GeneratedQuiz, GenerationEvent, GenerationState};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::session::quizzes::QuizService;

//=========================================================================================
// Poll Policy
//=========================================================================================

/// Interval and budget of one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Multiplier applied to the interval after each poll; `1.0` polls at a fixed rate.
    pub backoff: f64,
    pub max_interval: Duration,
    pub max_polls: u32,
    pub max_elapsed: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff: 1.0,
            max_interval: Duration::from_secs(10),
            max_polls: 60,
            max_elapsed: Duration::from_secs(300),
        }
    }
}

impl PollPolicy {
    /// Delay before status check number `poll` (zero-based).
    pub fn delay_for(&self, poll: u32) -> Duration {
        let cap = self.max_interval.max(self.interval);
        let secs = self.interval.as_secs_f64() * self.backoff.max(1.0).powi(poll.min(64) as i32);
        if secs.is_finite() && secs < cap.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            cap
        }
    }
}

//=========================================================================================
// The Poller
//=========================================================================================

pub struct GenerationPoller {
    quizzes: QuizService,
    policy: PollPolicy,
}

impl GenerationPoller {
    pub fn new(quizzes: QuizService, policy: PollPolicy) -> Self {
        Self { quizzes, policy }
    }

    /// Starts a quick-create job and follows it. `None` if the job could not be started.
    pub async fn quick_create(&self, request: &QuickCreateRequest) -> Option<PollHandle> {
        let response = self.quizzes.quick_create(request).await?;
        info!(
            "Quick-create accepted quiz {} ({:?}).",
            response.quiz_id, response.status
        );
        Some(self.follow(response.quiz_id))
    }

    /// Creates a quiz, asks the server to generate its questions and follows the job.
    pub async fn create_and_generate(&self, course_id: CourseId, quiz: &NewQuiz) -> Option<PollHandle> {
        let created = self.quizzes.create_quiz(course_id, quiz).await?;
        self.quizzes.generate_questions(created.id).await?;
        Some(self.follow(created.id))
    }

    /// Follows a generation job that is already running on the server.
    pub fn follow(&self, quiz_id: QuizId) -> PollHandle {
        let started = transition(
            &GenerationState::Idle,
            GenerationEvent::Started { quiz_id },
            self.policy.max_polls,
        );
        let (state_tx, state_rx) = watch::channel(started.state);
        let state_tx = Arc::new(state_tx);
        let (completed_tx, completed_rx) = oneshot::channel();
        let token = CancellationToken::new();

        let task = tokio::spawn(poll_loop(
            self.quizzes.clone(),
            self.policy.clone(),
            quiz_id,
            state_tx.clone(),
            completed_tx,
            token.clone(),
        ));

        PollHandle {
            quiz_id,
            state_tx,
            state_rx,
            completed: Some(completed_rx),
            token,
            task,
        }
    }
}

async fn poll_loop(
    quizzes: QuizService,
    policy: PollPolicy,
    quiz_id: QuizId,
    state: Arc<watch::Sender<GenerationState>>,
    completed: oneshot::Sender<GeneratedQuiz>,
    token: CancellationToken,
) {
    let started_at = Instant::now();
    let mut completed = Some(completed);
    let mut poll = 0u32;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Generation polling for quiz {} cancelled.", quiz_id);
                return;
            }
            _ = tokio::time::sleep(policy.delay_for(poll)) => {}
        }

        let event = if started_at.elapsed() >= policy.max_elapsed {
            GenerationEvent::DeadlineExceeded
        } else {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Generation polling for quiz {} cancelled mid-request.", quiz_id);
                    return;
                }
                status = quizzes.poll_status(quiz_id) => match status {
                    Ok(status) => GenerationEvent::Polled(status),
                    Err(e) => GenerationEvent::PollFailed(e),
                },
            }
        };

        // The cancellation check and the update share the watch lock with
        // `PollHandle::cancel`, so nothing is applied once it has run.
        let mut outcome = None;
        let mut finished = false;
        state.send_if_modified(|current| {
            if token.is_cancelled() {
                return false;
            }
            let step = transition(current, event, policy.max_polls);
            outcome = step.completed;
            finished = step.state.is_terminal();
            let changed = *current != step.state;
            *current = step.state;
            changed
        });
        if token.is_cancelled() {
            return;
        }

        if let Some(generated) = outcome {
            info!(
                "Quiz {} generated with {} questions.",
                quiz_id,
                generated.questions.len()
            );
            if let Some(tx) = completed.take() {
                if tx.send(generated).is_err() {
                    warn!("Quiz {} completed but nobody is waiting for it.", quiz_id);
                }
            }
        }
        if finished {
            if let GenerationState::Failed { error, .. } = &*state.borrow() {
                warn!("Generation of quiz {} failed: {}", quiz_id, error);
            }
            return;
        }
        poll += 1;
    }
}

//=========================================================================================
// PollHandle
//=========================================================================================

/// Owned by the view that started the attempt. Dropping it cancels the attempt.
pub struct PollHandle {
    quiz_id: QuizId,
    state_tx: Arc<watch::Sender<GenerationState>>,
    state_rx: watch::Receiver<GenerationState>,
    completed: Option<oneshot::Receiver<GeneratedQuiz>>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    pub fn state(&self) -> GenerationState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state_rx.clone()
    }

    /// Waits for the generated quiz. Yields it at most once; `None` after a
    /// failure, a cancellation, or a previous call.
    pub async fn completed(&mut self) -> Option<GeneratedQuiz> {
        match self.completed.take() {
            Some(rx) => rx.await.ok(),
            None => None,
        }
    }

    /// Waits until the attempt leaves `Generating` and returns the state it settled in.
    pub async fn settled(&self) -> GenerationState {
        let mut rx = self.state_rx.clone();
        let settled = rx
            .wait_for(|state| !matches!(state, GenerationState::Generating { .. }))
            .await
            .map(|state| (*state).clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Stops polling and returns the observed state to `Idle`. A response that
    /// lands afterwards is discarded.
    pub fn cancel(&self) {
        if self.token.is_cancelled() {
            return;
        }
        self.state_tx.send_modify(|state| {
            self.token.cancel();
            *state = GenerationState::Idle;
        });
        info!("Generation attempt for quiz {} cancelled by caller.", self.quiz_id);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the poll task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if !self.task.is_finished() {
            self.cancel();
        }
    }
}
