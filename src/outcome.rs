// Copyright (c) 2025 - Cowboy AI, Inc.
//! Operation Results and the Confirm-then-Mutate Protocol
//!
//! Every operation returns an [`Outcome`]: the typed value, a human-readable
//! summary for the presentation layer, and the events it committed.
//!
//! Destructive operations are two-phase:
//!
//! ```text
//! call(.., Confirmation::Unconfirmed)      → Confirm::Required(descriptor)
//! call(.., Confirmation::Confirmed(token)) → Confirm::Applied(outcome)
//! ```
//!
//! The descriptor is recomputed on the second call and its token compared; no
//! state is held between the calls. If the target changed in between, the
//! tokens differ and the call fails with `StaleConfirmation`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{DcimError, DcimResult};
use crate::events::TopologyEvent;

/// Typed result plus display summary and committed events
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub message: String,
    pub events: Vec<TopologyEvent>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: Vec<TopologyEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            message: self.message,
            events: self.events,
        }
    }
}

/// Deterministic fingerprint of a confirmation descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(Uuid);

impl ConfirmationToken {
    const NAMESPACE: Uuid = Uuid::from_u128(0x5d1c_7c0e_8a4b_4f1e_9d6a_2b7e_0c3f_d1c1);

    fn digest(action: DestructiveAction, summary: &str, affected: &[String]) -> Self {
        let mut material = format!("{action}\n{summary}");
        for item in affected {
            material.push('\n');
            material.push_str(item);
        }
        Self(Uuid::new_v5(&Self::NAMESPACE, material.as_bytes()))
    }
}

impl fmt::Display for ConfirmationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller's confirmation state for a destructive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    Unconfirmed,
    Confirmed(ConfirmationToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructiveAction {
    Disconnect,
    DeletePort,
    DeleteConnection,
    DeleteDevice,
}

impl fmt::Display for DestructiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestructiveAction::Disconnect => f.write_str("disconnect"),
            DestructiveAction::DeletePort => f.write_str("delete port"),
            DestructiveAction::DeleteConnection => f.write_str("delete connection"),
            DestructiveAction::DeleteDevice => f.write_str("delete device"),
        }
    }
}

/// What a destructive operation will do, for the caller to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationDescriptor {
    pub action: DestructiveAction,
    pub summary: String,
    pub affected: Vec<String>,
    pub token: ConfirmationToken,
}

impl ConfirmationDescriptor {
    pub fn new(action: DestructiveAction, summary: impl Into<String>, affected: Vec<String>) -> Self {
        let summary = summary.into();
        let token = ConfirmationToken::digest(action, &summary, &affected);
        Self {
            action,
            summary,
            affected,
            token,
        }
    }

    /// Whether the mutation may proceed
    ///
    /// `Ok(false)` means render this descriptor and ask again.
    pub fn accepts(&self, confirmation: Confirmation) -> DcimResult<bool> {
        match confirmation {
            Confirmation::Unconfirmed => Ok(false),
            Confirmation::Confirmed(token) if token == self.token => Ok(true),
            Confirmation::Confirmed(_) => Err(DcimError::StaleConfirmation),
        }
    }

    pub fn confirm(&self) -> Confirmation {
        Confirmation::Confirmed(self.token)
    }
}

/// Result of a two-phase operation
#[derive(Debug, Clone, PartialEq)]
pub enum Confirm<T> {
    Required(ConfirmationDescriptor),
    Applied(Outcome<T>),
}

impl<T> Confirm<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Confirm::Applied(_))
    }

    pub fn descriptor(&self) -> Option<&ConfirmationDescriptor> {
        match self {
            Confirm::Required(descriptor) => Some(descriptor),
            Confirm::Applied(_) => None,
        }
    }

    pub fn applied(self) -> Option<Outcome<T>> {
        match self {
            Confirm::Applied(outcome) => Some(outcome),
            Confirm::Required(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(partner: &str) -> ConfirmationDescriptor {
        ConfirmationDescriptor::new(
            DestructiveAction::Disconnect,
            "Disconnect console port con0",
            vec![format!("console server port {partner}")],
        )
    }

    #[test]
    fn test_token_is_deterministic() {
        assert_eq!(descriptor("cs1 port1").token, descriptor("cs1 port1").token);
        assert_ne!(descriptor("cs1 port1").token, descriptor("cs1 port2").token);
    }

    #[test]
    fn test_accepts() {
        let current = descriptor("cs1 port1");
        assert!(!current.accepts(Confirmation::Unconfirmed).unwrap());
        assert!(current.accepts(current.confirm()).unwrap());

        let stale = descriptor("cs1 port2").confirm();
        assert!(matches!(
            current.accepts(stale),
            Err(DcimError::StaleConfirmation)
        ));
    }
}
