// Copyright (c) 2025 - Cowboy AI, Inc.
//! Interface Connection Entity

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::port::{ConnectionStatus, PortId};

/// Unique identifier for an interface connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which endpoint slot of an interface connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionField {
    InterfaceA,
    InterfaceB,
    /// The target of a console or power link
    Partner,
}

impl fmt::Display for ConnectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionField::InterfaceA => f.write_str("interface_a"),
            ConnectionField::InterfaceB => f.write_str("interface_b"),
            ConnectionField::Partner => f.write_str("partner"),
        }
    }
}

/// Symmetric link between two interfaces
///
/// Stored as an ordered pair; the a/b slots carry no meaning beyond storage
/// order. Use [`InterfaceConnection::partner_of`] to walk from either end.
///
/// Invariants (enforced by the object store):
/// - `interface_a != interface_b`
/// - An interface appears in at most one connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConnection {
    pub id: ConnectionId,
    pub interface_a: PortId,
    pub interface_b: PortId,
    #[serde(default)]
    pub status: ConnectionStatus,
}

impl InterfaceConnection {
    pub fn new(interface_a: PortId, interface_b: PortId, status: ConnectionStatus) -> Self {
        Self {
            id: ConnectionId::new(),
            interface_a,
            interface_b,
            status,
        }
    }

    pub fn involves(&self, interface: PortId) -> bool {
        self.interface_a == interface || self.interface_b == interface
    }

    /// The opposite endpoint, or `None` if `interface` is not an endpoint
    pub fn partner_of(&self, interface: PortId) -> Option<PortId> {
        if self.interface_a == interface {
            Some(self.interface_b)
        } else if self.interface_b == interface {
            Some(self.interface_a)
        } else {
            None
        }
    }

    /// Which slot `interface` occupies
    pub fn field_of(&self, interface: PortId) -> Option<ConnectionField> {
        if self.interface_a == interface {
            Some(ConnectionField::InterfaceA)
        } else if self.interface_b == interface {
            Some(ConnectionField::InterfaceB)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_from_either_end() {
        let a = PortId::new();
        let b = PortId::new();
        let conn = InterfaceConnection::new(a, b, ConnectionStatus::Connected);

        assert_eq!(conn.partner_of(a), Some(b));
        assert_eq!(conn.partner_of(b), Some(a));
        assert_eq!(conn.partner_of(PortId::new()), None);
        assert_eq!(conn.field_of(b), Some(ConnectionField::InterfaceB));
        assert!(conn.involves(a));
    }
}
