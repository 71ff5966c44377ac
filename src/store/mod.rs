// Copyright (c) 2025 - Cowboy AI, Inc.
//! Object Store Abstraction
//!
//! The topology core never embeds a storage technology. It talks to an
//! [`ObjectStore`] that persists devices, ports and interface connections and
//! enforces the constraints the core relies on:
//!
//! 1. **Name uniqueness**: (device, kind, name) is unique
//! 2. **Interface exclusivity**: an interface is in at most one connection
//! 3. **Target exclusivity**: a console server port or power outlet is
//!    referenced by at most one link
//! 4. **Protected deletion**: connected ports block device deletion, and a
//!    connected interface blocks its own deletion
//! 5. **Dangling links**: deleting a link target clears the link
//!
//! Every method is atomic: multi-entity writes either apply completely or not
//! at all.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    ConnectionField, ConnectionId, ConnectionStatus, Device, DeviceId, EntityKind,
    InterfaceConnection, Port, PortId, PortKind, PortLink, PortRole,
};
use crate::errors::{DcimError, NameConflict};

pub mod memory;

pub use memory::InMemoryObjectStore;

/// Errors raised by an object store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("Uniqueness violation on {} port name(s)", .0.len())]
    UniqueViolation(Vec<NameConflict>),

    #[error("{field}: {label} is already connected")]
    ConnectionConflict {
        field: ConnectionField,
        port: PortId,
        label: String,
    },

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Cannot delete {entity}: protected by {}", .dependents.join(", "))]
    Protected {
        entity: String,
        dependents: Vec<String>,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for DcimError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DcimError::NotFound { entity, id },
            StoreError::UniqueViolation(conflicts) => DcimError::DuplicateName { conflicts },
            StoreError::ConnectionConflict { field, label, .. } => {
                DcimError::DuplicateConnection { field, port: label }
            }
            StoreError::InvalidReference(reason) => DcimError::InvalidConnection(reason),
            StoreError::Protected { entity, dependents } => {
                DcimError::ProtectedDeletion { entity, dependents }
            }
            StoreError::Backend(source) => DcimError::Store(source),
        }
    }
}

/// Consistent point-in-time copy of the whole topology
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub devices: HashMap<DeviceId, Device>,
    pub ports: HashMap<PortId, Port>,
    pub interface_connections: Vec<InterfaceConnection>,
}

impl TopologySnapshot {
    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(&id)
    }

    /// The port together with its owning device
    pub fn endpoint(&self, id: PortId) -> Option<(&Device, &Port)> {
        let port = self.ports.get(&id)?;
        let device = self.devices.get(&port.device_id)?;
        Some((device, port))
    }

    /// Holders of `kind` that currently carry a link
    pub fn linked_holders(&self, kind: PortKind) -> impl Iterator<Item = &Port> {
        self.ports
            .values()
            .filter(move |port| port.kind == kind && port.link.is_some())
    }

    pub fn connection_of(&self, interface: PortId) -> Option<&InterfaceConnection> {
        self.interface_connections
            .iter()
            .find(|conn| conn.involves(interface))
    }

    /// The port on the far end of whatever connection `port` is in
    pub fn peer_of(&self, port: &Port) -> Option<(&Port, ConnectionStatus)> {
        match port.kind.role() {
            PortRole::Holder => {
                let link = port.link?;
                Some((self.ports.get(&link.partner)?, link.status))
            }
            PortRole::Target => self.ports.values().find_map(|holder| {
                holder
                    .link
                    .filter(|link| link.partner == port.id)
                    .map(|link| (holder, link.status))
            }),
            PortRole::Symmetric => {
                let conn = self.connection_of(port.id)?;
                let other = conn.partner_of(port.id)?;
                Some((self.ports.get(&other)?, conn.status))
            }
        }
    }
}

/// Links and interface connections committed together by
/// [`ObjectStore::bulk_connect`]
#[derive(Debug, Clone, Default)]
pub struct ConnectionBatch {
    /// (holder, link) pairs, each holder at most once
    pub links: Vec<(PortId, PortLink)>,
    pub interface_connections: Vec<InterfaceConnection>,
}

impl ConnectionBatch {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.interface_connections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.links.len() + self.interface_connections.len()
    }
}

/// Persistence interface for topology entities
///
/// Implementations must apply each call atomically and enforce the
/// constraints listed in the module documentation.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist a new device
    async fn insert_device(&self, device: Device) -> StoreResult<Device>;

    async fn get_device(&self, id: DeviceId) -> StoreResult<Option<Device>>;

    /// All devices ordered by name
    async fn list_devices(&self) -> StoreResult<Vec<Device>>;

    /// Delete a device and its ports
    ///
    /// # Errors
    ///
    /// - `Protected` if any of its ports participates in a connection
    async fn delete_device(&self, id: DeviceId) -> StoreResult<Device>;

    async fn get_port(&self, id: PortId) -> StoreResult<Option<Port>>;

    /// Ports of a device, optionally of one kind, ordered by name
    async fn list_ports(&self, device_id: DeviceId, kind: Option<PortKind>)
        -> StoreResult<Vec<Port>>;

    /// Insert a batch of ports in one atomic write
    ///
    /// # Errors
    ///
    /// - `UniqueViolation` listing every colliding name; nothing is written
    async fn bulk_insert_ports(&self, ports: Vec<Port>) -> StoreResult<Vec<Port>>;

    /// Update name and attributes of an existing port
    ///
    /// The stored link is kept; links change only through [`ObjectStore::set_link`].
    async fn update_port(&self, port: Port) -> StoreResult<Port>;

    /// Replace (or clear) the link held by a console port or power port
    ///
    /// # Errors
    ///
    /// - `ConnectionConflict` if another holder already links to the partner
    /// - `InvalidReference` if the holder cannot hold links or the partner kind
    ///   does not pair with it
    async fn set_link(&self, holder: PortId, link: Option<PortLink>) -> StoreResult<Port>;

    /// The holder whose link points at `target`, if any
    async fn find_link_holder(&self, target: PortId) -> StoreResult<Option<Port>>;

    /// Delete a port, clearing any link that referenced it
    ///
    /// # Errors
    ///
    /// - `Protected` if the port is an interface in a connection
    async fn delete_port(&self, id: PortId) -> StoreResult<Port>;

    /// # Errors
    ///
    /// - `ConnectionConflict` naming the endpoint already in a connection
    /// - `InvalidReference` for self-loops or non-interface endpoints
    async fn insert_interface_connection(
        &self,
        connection: InterfaceConnection,
    ) -> StoreResult<InterfaceConnection>;

    /// Write every link and interface connection of `batch` in one atomic call
    ///
    /// Each entry is checked as [`ObjectStore::set_link`] and
    /// [`ObjectStore::insert_interface_connection`] would check it, and also
    /// against the rest of the batch. A port may appear in one entry only.
    ///
    /// # Errors
    ///
    /// - `ConnectionConflict` for an endpoint that is already connected or
    ///   claimed twice by the batch; nothing is written
    /// - `InvalidReference` for structurally invalid entries
    async fn bulk_connect(&self, batch: ConnectionBatch) -> StoreResult<()>;

    async fn get_interface_connection(
        &self,
        id: ConnectionId,
    ) -> StoreResult<Option<InterfaceConnection>>;

    /// The connection `interface` participates in, if any
    async fn find_interface_connection(
        &self,
        interface: PortId,
    ) -> StoreResult<Option<InterfaceConnection>>;

    async fn delete_interface_connection(
        &self,
        id: ConnectionId,
    ) -> StoreResult<InterfaceConnection>;

    /// Consistent copy of every entity
    async fn snapshot(&self) -> StoreResult<TopologySnapshot>;
}
