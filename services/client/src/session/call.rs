//! services/client/src/session/call.rs
//!
//! The async call wrapper every network-touching operation goes through. It
//! owns the loading flag and the last error so callers never manage them by
//! hand, and it turns every failure into a recorded message instead of an
//! error returned into presentation code.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use study_helper_core::ports::{PortError, PortResult};
use tokio::sync::watch;
use tracing::warn;

use crate::session::notify::{Notification, Notifier};

/// Receives the loading and error updates of wrapped calls.
pub trait CallObserver: Send + Sync {
    fn set_loading(&self, loading: bool);

    fn set_error(&self, error: Option<&PortError>);
}

/// Runs `op` under `observer` and keeps the error value.
///
/// Loading is switched off even if the returned future is dropped before it
/// finishes.
pub async fn track<T, F, Fut>(op: F, observer: &dyn CallObserver) -> PortResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    observer.set_error(None);
    track_background(op, observer).await
}

/// Like [`track`], but leaves an error recorded by another call in place
/// until this call fails itself. For periodic work the user did not start.
pub async fn track_background<T, F, Fut>(op: F, observer: &dyn CallObserver) -> PortResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    observer.set_loading(true);
    let _loading = LoadingGuard(observer);

    let result = op().await;
    if let Err(e) = &result {
        warn!("Call failed: {}", e);
        observer.set_error(Some(e));
    }
    result
}

/// Runs `op` under `observer`. Returns `None` on failure; the error is recorded.
pub async fn call_api<T, F, Fut>(op: F, observer: &dyn CallObserver) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    track(op, observer).await.ok()
}

struct LoadingGuard<'a>(&'a dyn CallObserver);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_loading(false);
    }
}

//=========================================================================================
// CallStatus (observable loading/error state)
//=========================================================================================

/// Loading and error state shared by every call of one view.
///
/// Loading stays on while any wrapped call is still running.
#[derive(Clone)]
pub struct CallStatus {
    inner: Arc<CallStatusInner>,
}

struct CallStatusInner {
    in_flight: AtomicUsize,
    loading: watch::Sender<bool>,
    error: watch::Sender<Option<PortError>>,
    notifier: Option<Notifier>,
}

impl CallStatus {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Also pushes every recorded failure as an error notification.
    pub fn with_notifier(notifier: Notifier) -> Self {
        Self::build(Some(notifier))
    }

    fn build(notifier: Option<Notifier>) -> Self {
        let (loading, _) = watch::channel(false);
        let (error, _) = watch::channel(None);
        Self {
            inner: Arc::new(CallStatusInner {
                in_flight: AtomicUsize::new(0),
                loading,
                error,
                notifier,
            }),
        }
    }

    pub async fn run<T, F, Fut>(&self, op: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        call_api(op, self).await
    }

    pub async fn track<T, F, Fut>(&self, op: F) -> PortResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        track(op, self).await
    }

    pub async fn track_background<T, F, Fut>(&self, op: F) -> PortResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        track_background(op, self).await
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    /// The human-readable message of the last failure, if any.
    pub fn error(&self) -> Option<String> {
        self.inner.error.borrow().as_ref().map(ToString::to_string)
    }

    pub fn last_failure(&self) -> Option<PortError> {
        self.inner.error.borrow().clone()
    }

    /// Dismisses the current error.
    pub fn clear_error(&self) {
        self.inner.error.send_replace(None);
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    pub fn subscribe_error(&self) -> watch::Receiver<Option<PortError>> {
        self.inner.error.subscribe()
    }
}

impl Default for CallStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl CallObserver for CallStatus {
    fn set_loading(&self, loading: bool) {
        let running = if loading {
            self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.inner.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1)
        };
        self.inner.loading.send_replace(running > 0);
    }

    fn set_error(&self, error: Option<&PortError>) {
        if let (Some(e), Some(notifier)) = (error, &self.inner.notifier) {
            notifier.notify(Notification::error(e.to_string()));
        }
        self.inner.error.send_replace(error.cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::notify::ToastKind;

    #[tokio::test]
    async fn success_returns_value_and_clears_loading() {
        let status = CallStatus::new();
        let value = status.run(|| async { Ok::<_, PortError>(7) }).await;
        assert_eq!(value, Some(7));
        assert!(!status.is_loading());
        assert_eq!(status.error(), None);
    }

    #[tokio::test]
    async fn failure_is_recorded_not_returned() {
        let (notifier, mut rx) = Notifier::channel();
        let status = CallStatus::with_notifier(notifier);
        let value: Option<u32> = status
            .run(|| async { Err(PortError::NotFound("/api/materials/3/".into())) })
            .await;

        assert_eq!(value, None);
        assert!(!status.is_loading());
        assert_eq!(status.error().as_deref(), Some("Item not found: /api/materials/3/"));
        assert_eq!(rx.recv().await.unwrap().kind, ToastKind::Error);
    }

    #[tokio::test]
    async fn next_call_clears_previous_error() {
        let status = CallStatus::new();
        let _: Option<()> = status.run(|| async { Err(PortError::Unauthorized) }).await;
        assert!(status.error().is_some());

        status.run(|| async { Ok::<_, PortError>(()) }).await;
        assert_eq!(status.last_failure(), None);
    }

    #[tokio::test]
    async fn background_calls_keep_an_unseen_error() {
        let status = CallStatus::new();
        let _: Option<()> = status.run(|| async { Err(PortError::Unauthorized) }).await;

        let polled = status.track_background(|| async { Ok::<_, PortError>(3) }).await;
        assert_eq!(polled, Ok(3));
        assert_eq!(status.last_failure(), Some(PortError::Unauthorized));

        let failed: PortResult<()> = status
            .track_background(|| async { Err(PortError::Transport("reset".into())) })
            .await;
        assert!(failed.is_err());
        assert_eq!(status.last_failure(), Some(PortError::Transport("reset".into())));
        assert!(!status.is_loading());
    }

    #[tokio::test]
    async fn loading_is_visible_while_the_call_runs() {
        let status = CallStatus::new();
        let observed = status
            .run(|| {
                let status = status.clone();
                async move { Ok::<_, PortError>(status.is_loading()) }
            })
            .await;
        assert_eq!(observed, Some(true));
        assert!(!status.is_loading());
    }
}
