//! Event Bus
//!
//! Cross-component notifications go through an `EventBus` created by the
//! composition root and handed out explicitly. A `Subscription` stops
//! receiving as soon as it is dropped, so a view unsubscribes simply by
//! letting go of it when it unmounts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::Clock;

pub const DEFAULT_BUS_CAPACITY: usize = 64;
pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

/// Everything the core tells its views about
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    TasksChanged { count: usize },
    JobsChanged { count: usize },
    Saved { key: String },
    SaveFailed { key: String, message: String },
    ToastsChanged(Vec<Toast>),
}

#[derive(Debug)]
pub struct EventBus<E> {
    tx: broadcast::Sender<E>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<E: Clone + Send + 'static> EventBus<E> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver to current subscribers; returns how many there were
    pub fn publish(&self, event: E) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> Subscription<E> {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E: Clone + Send + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

pub struct Subscription<E> {
    rx: broadcast::Receiver<E>,
}

impl<E: Clone> Subscription<E> {
    /// Next event, or `None` once the bus is gone. Events missed because
    /// the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<E> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "Subscriber lagged behind the event bus");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-queued event, without waiting
    pub fn try_recv(&mut self) -> Option<E> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Everything queued right now
    pub fn drain(&mut self) -> Vec<E> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    #[default]
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toast {
    pub id: String,
    pub message: String,
    pub kind: ToastKind,
    /// Zero keeps the toast until dismissed
    pub duration_ms: u64,
    pub shown_at: DateTime<Utc>,
}

impl Toast {
    fn expired(&self, now: DateTime<Utc>) -> bool {
        self.duration_ms > 0
            && now - self.shown_at >= Duration::milliseconds(self.duration_ms as i64)
    }
}

/// Visible toasts, shared by every component holding a clone
#[derive(Clone)]
pub struct ToastCenter {
    toasts: Arc<Mutex<Vec<Toast>>>,
    bus: EventBus<AppEvent>,
    clock: Arc<dyn Clock>,
}

impl ToastCenter {
    pub fn new(bus: EventBus<AppEvent>, clock: Arc<dyn Clock>) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            bus,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, toasts: &[Toast]) {
        self.bus.publish(AppEvent::ToastsChanged(toasts.to_vec()));
    }

    pub fn show(&self, message: impl Into<String>, kind: ToastKind) -> String {
        self.show_for(message, kind, DEFAULT_TOAST_DURATION_MS)
    }

    pub fn show_for(&self, message: impl Into<String>, kind: ToastKind, duration_ms: u64) -> String {
        let toast = Toast {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            kind,
            duration_ms,
            shown_at: self.clock.now(),
        };
        let id = toast.id.clone();

        let mut toasts = self.lock();
        toasts.push(toast);
        self.notify(&toasts);
        id
    }

    pub fn dismiss(&self, id: &str) {
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        if toasts.len() != before {
            self.notify(&toasts);
        }
    }

    /// Drop toasts whose duration has run out
    pub fn expire(&self) {
        let now = self.clock.now();
        let mut toasts = self.lock();
        let before = toasts.len();
        toasts.retain(|t| !t.expired(now));
        if toasts.len() != before {
            self.notify(&toasts);
        }
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.lock().clone()
    }
}
