//! Runtime for chat sessions
//!
//! Sessions live in memory only. Each one owns its conversation and is
//! dropped after sitting idle for the configured TTL.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::{DispatchError, DispatchOutcome, SessionRuntime};

use crate::generator::ResponseGenerator;
use crate::render::{render, TranscriptView};
use crate::speech::{AudioClip, SpeechRecognizer, UploadedClip};
use crate::state_machine::{Event, SessionContext, SessionState, TransitionError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

/// External services shared by every session
pub struct Services {
    pub responder: ResponseGenerator,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub record_window: Duration,
    pub speech_timeout: Duration,
}

/// Handle to interact with one session
///
/// One interaction runs at a time; a second one is turned away as busy.
/// Views read the latest published state and never wait on an in-flight
/// action.
pub struct SessionHandle {
    context: SessionContext,
    runtime: Mutex<SessionRuntime>,
    state_rx: watch::Receiver<SessionState>,
    speech_cancel: Mutex<Option<CancellationToken>>,
    last_active: Mutex<Instant>,
}

impl SessionHandle {
    fn new(context: SessionContext, services: Arc<Services>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        Self {
            runtime: Mutex::new(SessionRuntime::new(context.clone(), services, state_tx)),
            context,
            state_rx,
            speech_cancel: Mutex::new(None),
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.context.session_id
    }

    pub fn view(&self) -> TranscriptView {
        render(&self.context, &self.state_rx.borrow())
    }

    /// Run events in order under one lock. Fails with `Busy` when another
    /// interaction is still running.
    pub async fn dispatch_all(
        &self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut runtime = self.acquire().await?;

        let mut outcome = DispatchOutcome::default();
        for event in events {
            let next = runtime.dispatch(event).await;
            self.touch().await;
            outcome.reload |= next?.reload;
        }

        Ok(outcome)
    }

    pub async fn dispatch(&self, event: Event) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch_all([event]).await
    }

    /// Run one recording with an uploaded clip
    pub async fn record_speech(&self, clip: AudioClip) -> Result<DispatchOutcome, DispatchError> {
        let mut runtime = self.acquire().await?;
        let source = UploadedClip::new(clip);
        let cancel = CancellationToken::new();

        *self.speech_cancel.lock().await = Some(cancel.clone());
        let result = runtime.record_speech(&source, cancel).await;
        self.speech_cancel.lock().await.take();
        self.touch().await;

        result
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, SessionRuntime>, DispatchError> {
        self.touch().await;
        self.runtime
            .try_lock()
            .map_err(|_| DispatchError::Transition(TransitionError::Busy))
    }

    /// An interaction is running
    fn is_busy(&self) -> bool {
        self.runtime.try_lock().is_err()
    }

    /// Abort the recording in flight. Returns false when nothing was recording.
    pub async fn cancel_speech(&self) -> bool {
        match self.speech_cancel.lock().await.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    async fn touch(&self) {
        *self.last_active.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_active.lock().await.elapsed()
    }
}

/// Manager for all live sessions
pub struct SessionManager {
    services: Arc<Services>,
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionManager {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn record_window(&self) -> Duration {
        self.services.record_window
    }

    pub fn speech_timeout(&self) -> Duration {
        self.services.speech_timeout
    }

    pub async fn create_session(&self) -> Arc<SessionHandle> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(session_id.clone(), self.services.record_window);
        let handle = Arc::new(SessionHandle::new(context, self.services.clone()));

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle.clone());
        tracing::info!(session_id = %session_id, "Session started");

        handle
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.read().await.get(session_id).cloned()?;
        // Reading the transcript counts as activity
        handle.touch().await;
        Some(handle)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle for at least `ttl`. Sessions with an interaction
    /// in flight are kept. Returns how many were removed.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, handle) in sessions.iter() {
            if !handle.is_busy() && handle.idle_for().await >= ttl {
                expired.push(id.clone());
            }
        }

        for id in &expired {
            sessions.remove(id);
            tracing::info!(session_id = %id, "Session expired");
        }

        expired.len()
    }

    /// Start the background task that expires idle sessions.
    /// Must be called once after creating the `SessionManager`.
    pub fn start_idle_sweeper(self: &Arc<Self>, ttl: Duration) {
        let manager = Arc::clone(self);
        let period = (ttl / 4).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let removed = manager.prune_idle(ttl).await;
                if removed > 0 {
                    let remaining = manager.session_count().await;
                    tracing::debug!(removed, remaining, "Idle sessions pruned");
                }
            }
        });
    }
}
