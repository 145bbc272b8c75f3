use crate::models::FederatedProvider;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// User-triggered actions that report progress.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "provider", rename_all = "snake_case")]
pub enum Action {
    Generate,
    Login,
    Register,
    FederatedLogin(FederatedProvider),
    Logout,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Started { message: String },
    Succeeded { message: String },
    Failed { reason: String },
    /// Refused before dispatch; never preceded by `Started`.
    Rejected { reason: String },
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started { .. })
    }
}

/// One phase transition. Events of a single invocation share `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionEvent {
    pub id: Uuid,
    pub action: Action,
    pub phase: Phase,
}

/// Publishing side of the event stream. Cheap to clone; sends to a dropped
/// receiver are ignored.
#[derive(Clone)]
pub struct Notifier {
    tx: Option<UnboundedSender<ActionEvent>>,
}

impl Notifier {
    pub fn channel() -> (Self, UnboundedReceiver<ActionEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    /// Start tracking a new invocation of `action`.
    pub fn begin(&self, action: Action) -> ActionHandle {
        ActionHandle {
            id: Uuid::new_v4(),
            action,
            notifier: self.clone(),
        }
    }

    fn publish(&self, event: ActionEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::trace!("event receiver dropped");
            }
        }
    }
}

/// Emits the phases of one invocation under a shared id.
pub struct ActionHandle {
    id: Uuid,
    action: Action,
    notifier: Notifier,
}

impl ActionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started(&self, message: impl Into<String>) {
        self.emit(Phase::Started {
            message: message.into(),
        });
    }

    /// Terminal: consumes the handle so at most one terminal phase is sent.
    pub fn succeeded(self, message: impl Into<String>) {
        self.emit(Phase::Succeeded {
            message: message.into(),
        });
    }

    pub fn failed(self, reason: impl Into<String>) {
        self.emit(Phase::Failed {
            reason: reason.into(),
        });
    }

    pub fn rejected(self, reason: impl Into<String>) {
        self.emit(Phase::Rejected {
            reason: reason.into(),
        });
    }

    fn emit(&self, phase: Phase) {
        self.notifier.publish(ActionEvent {
            id: self.id,
            action: self.action,
            phase,
        });
    }
}

/// Drain whatever is queued without waiting.
pub fn drain(rx: &mut UnboundedReceiver<ActionEvent>) -> Vec<ActionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
