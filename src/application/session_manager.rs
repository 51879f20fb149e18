// Streaming session manager - One process-scoped subscription to the telemetry feed
use crate::application::intent_store::IntentStore;
use crate::application::telemetry_feed::TelemetryFeed;
use crate::domain::errors::FeedError;
use crate::domain::ring_buffer::RingBuffer;
use crate::domain::session::{SessionCommand, SessionState};
use crate::domain::telemetry::{parse_frame, Sample};
use chrono::Utc;
use futures::StreamExt;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Everything a consumer may read about the live session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Last accepted sample; survives `stop()` and buffer clears
    pub current: Option<Sample>,
    /// Recent samples, oldest first
    pub samples: Vec<Sample>,
}

struct SessionInner {
    state: SessionState,
    buffer: RingBuffer<Sample>,
    current: Option<Sample>,
    // Bumped whenever a subscription is opened or closed. Callbacks carrying
    // an older generation belong to a superseded subscription.
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            current: self.current.clone(),
            samples: self.buffer.to_vec(),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    feed: Arc<dyn TelemetryFeed>,
    intent: Arc<dyn IntentStore>,
    // Intent values in command order; written to the store off the session lock
    intent_writes: mpsc::UnboundedSender<bool>,
    inner: Arc<Mutex<SessionInner>>,
    updates: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionManager {
    /// Must be called inside a tokio runtime; it spawns the intent writer.
    pub fn new(feed: Arc<dyn TelemetryFeed>, intent: Arc<dyn IntentStore>, capacity: usize) -> Self {
        let inner = SessionInner {
            state: SessionState::Idle,
            buffer: RingBuffer::new(capacity),
            current: None,
            generation: 0,
            task: None,
        };
        let (updates, _) = watch::channel(inner.snapshot());
        tracing::debug!(capacity = inner.buffer.capacity(), "Session manager created");

        let (intent_writes, pending) = mpsc::unbounded_channel();
        tokio::spawn(write_intents(intent.clone(), pending));

        Self {
            feed,
            intent,
            intent_writes,
            inner: Arc::new(Mutex::new(inner)),
            updates: Arc::new(updates),
        }
    }

    /// Consult the persisted intent once at startup and resume streaming if it was on.
    pub fn resume_from_intent(&self) {
        if self.intent.read_intent() {
            tracing::info!("Streaming intent was on; resuming telemetry session");
            self.start();
        } else {
            tracing::debug!("Streaming intent was off; staying idle");
        }
    }

    /// Open a subscription. No-op while one is already connecting or active.
    pub fn start(&self) {
        self.command(SessionCommand::Start);
    }

    /// Close the subscription, keeping buffered samples and the current reading.
    pub fn pause(&self) {
        self.command(SessionCommand::Pause);
    }

    /// Close the subscription and clear the buffer. The current reading is kept.
    pub fn stop(&self) {
        self.command(SessionCommand::Stop);
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn current_reading(&self) -> Option<Sample> {
        self.lock().current.clone()
    }

    pub fn recent_samples(&self) -> Vec<Sample> {
        self.lock().buffer.to_vec()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Change notifications; the receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    fn command(&self, command: SessionCommand) {
        let mut inner = self.lock();
        self.apply(&mut inner, command);
        self.publish(&inner);
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &SessionInner) {
        self.updates.send_replace(inner.snapshot());
    }

    /// Run one state-machine step and carry out its effects.
    fn apply(&self, inner: &mut SessionInner, command: SessionCommand) {
        let previous = inner.state;
        let transition = previous.apply(command);

        if transition.close_subscription {
            inner.generation += 1;
            if let Some(task) = inner.task.take() {
                task.abort();
            }
        }
        if transition.clear_buffer && !inner.buffer.is_empty() {
            inner.buffer = inner.buffer.clear();
        }
        if let Some(streaming) = transition.write_intent {
            if self.intent_writes.send(streaming).is_err() {
                tracing::error!(streaming, "Intent writer stopped; streaming intent not saved");
            }
        }

        inner.state = transition.next;

        if transition.open_subscription {
            inner.generation += 1;
            let generation = inner.generation;
            let manager = self.clone();
            inner.task = Some(tokio::spawn(async move {
                manager.run_subscription(generation).await;
            }));
        }

        if previous != inner.state {
            tracing::info!(from = ?previous, to = ?inner.state, ?command, "Session state changed");
        }
    }

    async fn run_subscription(&self, generation: u64) {
        tracing::debug!(generation, "Opening telemetry subscription");

        let mut frames = match self.feed.subscribe().await {
            Ok(frames) => frames,
            Err(e) => {
                self.on_transport_error(generation, e);
                return;
            }
        };

        while let Some(frame) = frames.next().await {
            match frame {
                Ok(payload) => {
                    if !self.on_frame(generation, &payload) {
                        return;
                    }
                }
                Err(e) => {
                    self.on_transport_error(generation, e);
                    return;
                }
            }
        }

        self.on_transport_error(generation, FeedError::Closed);
    }

    /// Returns false once the subscription has been superseded.
    fn on_frame(&self, generation: u64, payload: &str) -> bool {
        let parsed = parse_frame(payload, Utc::now());

        let mut inner = self.lock();
        if inner.generation != generation || !inner.state.has_subscription() {
            tracing::debug!(generation, "Ignoring frame from superseded subscription");
            return false;
        }

        match parsed {
            Ok(Some(sample)) => {
                inner.current = Some(sample.clone());
                inner.buffer = inner.buffer.push(sample.clone());
                tracing::debug!(
                    voltage = sample.voltage,
                    power = sample.power,
                    buffered = inner.buffer.len(),
                    "Telemetry sample received"
                );
                self.apply(&mut inner, SessionCommand::FrameAccepted);
                self.publish(&inner);
            }
            Ok(None) => {
                tracing::debug!("Telemetry frame carried no samples");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed telemetry frame");
            }
        }
        true
    }

    fn on_transport_error(&self, generation: u64, error: FeedError) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(generation, error = %error, "Ignoring error from superseded subscription");
            return;
        }

        tracing::error!(error = %error, "Telemetry feed failed; streaming disabled until restarted");
        self.apply(&mut inner, SessionCommand::TransportFailed);
        self.apply(&mut inner, SessionCommand::SubscriptionClosed);
        self.publish(&inner);
    }
}

/// Persist intent values one at a time on the blocking pool.
async fn write_intents(intent: Arc<dyn IntentStore>, mut pending: mpsc::UnboundedReceiver<bool>) {
    while let Some(streaming) = pending.recv().await {
        let store = intent.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || store.write_intent(streaming)).await {
            tracing::error!(error = %e, "Streaming intent write panicked");
        }
    }
}
