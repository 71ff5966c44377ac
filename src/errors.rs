// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology operations
//!
//! Every variant is recoverable at the caller's discretion; none leaves
//! partially-applied state behind.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Operation;
use crate::domain::{ConnectionField, DeviceId, EntityKind, PatternError, PortKind};

/// Why a proposed port name was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    /// A port with this name already exists on the device
    Existing,
    /// The same name appears earlier in the same batch
    Batch,
}

/// A single (device, kind, name) uniqueness violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameConflict {
    pub device_id: DeviceId,
    pub device_name: String,
    pub kind: PortKind,
    pub name: String,
    pub source: ConflictSource,
}

impl fmt::Display for NameConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate {} {} found for device {}",
            self.kind, self.name, self.device_name
        )
    }
}

/// A rejected row of a bulk import, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.reason)
    }
}

/// Errors that can occur in topology operations
#[derive(Debug, Error)]
pub enum DcimError {
    /// Malformed name pattern, rejected before any store access
    #[error("Invalid name pattern: {0}")]
    Format(#[from] PatternError),

    /// One or more proposed port names collide; nothing was persisted
    #[error("{}", render_lines(.conflicts))]
    DuplicateName { conflicts: Vec<NameConflict> },

    /// One or more import rows failed validation; nothing was committed
    #[error("{}", render_lines(.errors))]
    ImportRejected { errors: Vec<RowError> },

    /// Disconnect attempted on a port with no active connection
    #[error("Cannot disconnect {port}: it is not connected to anything")]
    NotConnected { port: String },

    /// An endpoint already participates in a connection
    #[error("{field}: {port} is already connected")]
    DuplicateConnection { field: ConnectionField, port: String },

    /// Delete blocked because dependents exist
    #[error("Cannot delete {entity}: protected by {}", .dependents.join(", "))]
    ProtectedDeletion { entity: String, dependents: Vec<String> },

    /// Operation denied by the authorization gate
    #[error("{actor} is not permitted to {operation} {entity}")]
    Authorization {
        actor: String,
        operation: Operation,
        entity: EntityKind,
    },

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    /// Point-to-point connect between kinds that do not pair
    #[error("Cannot connect a {port} to a {partner}")]
    IncompatiblePorts { port: PortKind, partner: PortKind },

    /// Connection request the store refused as structurally invalid
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// Attributes do not match the port kind
    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),

    /// A bulk request named nothing to act on
    #[error("No {0} selected")]
    EmptySelection(&'static str),

    /// The confirmed descriptor no longer matches current state
    #[error("Confirmation is stale; review the change and confirm again")]
    StaleConfirmation,

    /// Opaque infrastructure failure from the object store
    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),
}

/// Result type for topology operations
pub type DcimResult<T> = Result<T, DcimError>;

fn render_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DcimError {
    /// Per-item error lines suitable for a form's error list
    pub fn messages(&self) -> Vec<String> {
        match self {
            DcimError::DuplicateName { conflicts } => {
                conflicts.iter().map(ToString::to_string).collect()
            }
            DcimError::ImportRejected { errors } => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_lists_every_conflict() {
        let device_id = DeviceId::new();
        let conflict = |name: &str| NameConflict {
            device_id,
            device_name: "switch-12".to_string(),
            kind: PortKind::Interface,
            name: name.to_string(),
            source: ConflictSource::Existing,
        };
        let err = DcimError::DuplicateName {
            conflicts: vec![conflict("eth0"), conflict("eth1")],
        };

        assert_eq!(
            err.to_string(),
            "Duplicate interface eth0 found for device switch-12; \
             Duplicate interface eth1 found for device switch-12"
        );
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_import_rejection_lists_every_row() {
        let err = DcimError::ImportRejected {
            errors: vec![
                RowError {
                    row: 2,
                    reason: "Device sw9 not found".to_string(),
                },
                RowError {
                    row: 4,
                    reason: "cs1 port1 is already connected".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "Row 2: Device sw9 not found; Row 4: cs1 port1 is already connected"
        );
        assert_eq!(err.messages()[1], "Row 4: cs1 port1 is already connected");
    }

    #[test]
    fn test_error_display() {
        let err = DcimError::NotConnected {
            port: "sw1 con0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot disconnect sw1 con0: it is not connected to anything"
        );

        let err = DcimError::Authorization {
            actor: "alice".to_string(),
            operation: Operation::Delete,
            entity: EntityKind::InterfaceConnection,
        };
        assert_eq!(
            err.to_string(),
            "alice is not permitted to delete interface connection"
        );
    }
}
