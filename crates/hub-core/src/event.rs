//! Audit events for security-relevant pipeline outcomes.
//!
//! Every accepted or rejected message produces one event carrying the
//! timestamp, the peer entity, the message ID and the outcome. Events are
//! emitted through `tracing`; how they are shipped off-host is a deployment
//! concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event type categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// An inbound Response passed the full validation pipeline.
    ResponseAccepted,
    /// An inbound AuthnRequest passed parsing, signature and replay checks.
    AuthnRequestAccepted,
    /// A message or assertion signature was missing, unsigned or invalid.
    SignatureRejected,
    /// No configured key could decrypt a response, or a disallowed
    /// encryption algorithm was declared.
    DecryptionRejected,
    /// A message or assertion ID was presented twice within its window.
    ReplayRejected,
    /// A status/sub-status pair fell outside the profile's grammar.
    StatusRejected,
    /// Any other validation failure (malformed input, business rules).
    ValidationRejected,
    /// An outbound message was built and signed.
    MessageIssued,
}

/// Outcome of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Failure,
}

/// A security event for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Type of event.
    pub event_type: EventType,

    /// Outcome of the event.
    pub outcome: EventOutcome,

    /// Entity ID of the peer the message came from or went to.
    pub entity_id: Option<String>,

    /// ID of the SAML message involved.
    pub message_id: Option<String>,

    /// Error message (for failure events).
    pub error: Option<String>,

    /// Additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl Event {
    /// Creates a new event builder.
    #[must_use]
    pub const fn builder(event_type: EventType) -> EventBuilder {
        EventBuilder::new(event_type)
    }

    /// Emits this event through `tracing`.
    ///
    /// Failures log at WARN, successes at INFO.
    pub fn emit(&self) {
        match self.outcome {
            EventOutcome::Success => tracing::info!(
                event = ?self.event_type,
                entity = self.entity_id.as_deref().unwrap_or("-"),
                message = self.message_id.as_deref().unwrap_or("-"),
                "audit"
            ),
            EventOutcome::Failure => tracing::warn!(
                event = ?self.event_type,
                entity = self.entity_id.as_deref().unwrap_or("-"),
                message = self.message_id.as_deref().unwrap_or("-"),
                error = self.error.as_deref().unwrap_or("-"),
                "audit"
            ),
        }
    }
}

/// Builder for creating events.
pub struct EventBuilder {
    event_type: EventType,
    outcome: EventOutcome,
    entity_id: Option<String>,
    message_id: Option<String>,
    error: Option<String>,
    details: Vec<(String, String)>,
}

impl EventBuilder {
    /// Creates a new event builder.
    #[must_use]
    pub const fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            outcome: EventOutcome::Success,
            entity_id: None,
            message_id: None,
            error: None,
            details: Vec::new(),
        }
    }

    /// Sets the outcome to success.
    #[must_use]
    pub const fn success(mut self) -> Self {
        self.outcome = EventOutcome::Success;
        self
    }

    /// Sets the outcome to failure with an error message.
    #[must_use]
    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.outcome = EventOutcome::Failure;
        self.error = Some(error.into());
        self
    }

    /// Sets the peer entity ID.
    #[must_use]
    pub fn entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Sets the SAML message ID.
    #[must_use]
    pub fn message(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Adds a detail key-value pair.
    #[must_use]
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type: self.event_type,
            outcome: self.outcome,
            entity_id: self.entity_id,
            message_id: self.message_id,
            error: self.error,
            details: self.details,
        }
    }
}
