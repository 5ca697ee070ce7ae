use crate::model::{FieldId, PropertyKey};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

const SESSION_SUFFIX_LEN: usize = 9;

/// Ephemeral per-client identifier carried on every broadcast event so a
/// client can recognise and discard the echo of its own updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SESSION_SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("session_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One field mutation on the wire. Property and value travel as plain
/// key/value strings so the shape works over any transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(rename = "fieldId")]
    pub field_id: FieldId,
    pub property: PropertyKey,
    pub value: String,
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    Focus,
    Blur,
}

/// A peer started or stopped editing a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceEvent {
    #[serde(rename = "fieldId")]
    pub field_id: FieldId,
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    pub action: PresenceAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Disconnected,
    Failed(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("transport disconnected"),
            Self::Failed(message) => write!(f, "transport failure: {message}"),
        }
    }
}

impl std::error::Error for TransportError {}
