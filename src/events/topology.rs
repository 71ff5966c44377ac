// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Change Events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ConnectionId, ConnectionStatus, DeviceId, PortId, PortKind};

/// Current schema version of [`TopologyEvent`]
pub const EVENT_VERSION: u32 = 1;

/// What changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologyChange {
    /// A batch of ports was created on one device
    PortsCreated {
        device_id: DeviceId,
        kind: PortKind,
        port_ids: Vec<PortId>,
        names: Vec<String>,
    },

    /// A port was renamed or its attributes changed
    PortUpdated {
        port_id: PortId,
        device_id: DeviceId,
        kind: PortKind,
        name: String,
    },

    /// A port was removed
    PortDeleted {
        port_id: PortId,
        device_id: DeviceId,
        kind: PortKind,
        name: String,
    },

    /// A console or power link was written onto its holder
    PortLinked {
        holder: PortId,
        partner: PortId,
        kind: PortKind,
        status: ConnectionStatus,
        /// Partner the holder pointed at before this write, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superseded: Option<PortId>,
    },

    /// A console or power link was cleared
    PortUnlinked {
        holder: PortId,
        partner: PortId,
        kind: PortKind,
    },

    InterfacesConnected {
        connection_id: ConnectionId,
        interface_a: PortId,
        interface_b: PortId,
        status: ConnectionStatus,
    },

    InterfacesDisconnected {
        connection_id: ConnectionId,
        interface_a: PortId,
        interface_b: PortId,
    },

    DeviceAdded {
        device_id: DeviceId,
        name: String,
    },

    DeviceDeleted {
        device_id: DeviceId,
        name: String,
    },
}

/// Immutable record of a committed topology mutation
///
/// All events produced by one operation share a `correlation_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEvent {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for request tracing
    pub correlation_id: Uuid,

    pub change: TopologyChange,
}

impl TopologyEvent {
    pub fn new(correlation_id: Uuid, change: TopologyChange) -> Self {
        Self {
            event_version: EVENT_VERSION,
            event_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            correlation_id,
            change,
        }
    }

    /// Get human-readable event type name
    pub fn event_type_name(&self) -> &'static str {
        match &self.change {
            TopologyChange::PortsCreated { .. } => "PortsCreated",
            TopologyChange::PortUpdated { .. } => "PortUpdated",
            TopologyChange::PortDeleted { .. } => "PortDeleted",
            TopologyChange::PortLinked { .. } => "PortLinked",
            TopologyChange::PortUnlinked { .. } => "PortUnlinked",
            TopologyChange::InterfacesConnected { .. } => "InterfacesConnected",
            TopologyChange::InterfacesDisconnected { .. } => "InterfacesDisconnected",
            TopologyChange::DeviceAdded { .. } => "DeviceAdded",
            TopologyChange::DeviceDeleted { .. } => "DeviceDeleted",
        }
    }
}
