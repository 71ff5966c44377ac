// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-memory object store
//!
//! All tables sit behind one `RwLock`, so every method observes and mutates a
//! consistent state and multi-entity writes are atomic.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ConnectionBatch, ObjectStore, StoreError, StoreResult, TopologySnapshot};
use crate::domain::{
    ConnectionField, ConnectionId, Device, DeviceId, EntityKind, InterfaceConnection, Port, PortId,
    PortKind, PortLink, PortRole,
};
use crate::errors::{ConflictSource, NameConflict};

type NameKey = (DeviceId, PortKind, String);

#[derive(Debug, Default)]
struct Tables {
    devices: HashMap<DeviceId, Device>,
    ports: HashMap<PortId, Port>,
    names: HashMap<NameKey, PortId>,
    connections: HashMap<ConnectionId, InterfaceConnection>,
}

impl Tables {
    fn device(&self, id: DeviceId) -> StoreResult<&Device> {
        self.devices.get(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Device,
            id: id.as_uuid(),
        })
    }

    fn port(&self, id: PortId) -> StoreResult<&Port> {
        self.ports.get(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::Port,
            id: id.as_uuid(),
        })
    }

    fn device_name(&self, id: DeviceId) -> String {
        self.devices
            .get(&id)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn label(&self, port: &Port) -> String {
        format!("{} {}", self.device_name(port.device_id), port.name)
    }

    fn holder_of(&self, target: PortId) -> Option<&Port> {
        self.ports
            .values()
            .find(|p| p.link.is_some_and(|link| link.partner == target))
    }

    fn connection_of(&self, interface: PortId) -> Option<&InterfaceConnection> {
        self.connections.values().find(|c| c.involves(interface))
    }

    /// Human-readable descriptions of every connection `port` participates in
    fn dependents_of(&self, port: &Port) -> Vec<String> {
        let mut dependents = Vec::new();
        if let Some(link) = port.link {
            if let Some(partner) = self.ports.get(&link.partner) {
                dependents.push(format!("{} → {}", self.label(port), self.label(partner)));
            }
        }
        if let Some(holder) = self.holder_of(port.id) {
            dependents.push(format!("{} → {}", self.label(holder), self.label(port)));
        }
        if let Some(conn) = self.connection_of(port.id) {
            let a = self.ports.get(&conn.interface_a);
            let b = self.ports.get(&conn.interface_b);
            if let (Some(a), Some(b)) = (a, b) {
                dependents.push(format!("{} ↔ {}", self.label(a), self.label(b)));
            }
        }
        dependents
    }

    fn check_holder(&self, holder: &Port) -> StoreResult<()> {
        if holder.kind.role() != PortRole::Holder {
            return Err(StoreError::InvalidReference(format!(
                "a {} cannot hold a link",
                holder.kind
            )));
        }
        Ok(())
    }

    fn check_link(&self, holder: &Port, link: &PortLink) -> StoreResult<()> {
        self.check_holder(holder)?;
        let partner = self.port(link.partner)?;
        if Some(partner.kind) != holder.kind.complement() {
            return Err(StoreError::InvalidReference(format!(
                "a {} cannot link to a {}",
                holder.kind, partner.kind
            )));
        }
        if let Some(other) = self.holder_of(link.partner) {
            if other.id != holder.id {
                return Err(StoreError::ConnectionConflict {
                    field: ConnectionField::Partner,
                    port: link.partner,
                    label: self.label(partner),
                });
            }
        }
        Ok(())
    }

    fn check_interface_connection(&self, connection: &InterfaceConnection) -> StoreResult<()> {
        if connection.interface_a == connection.interface_b {
            return Err(StoreError::InvalidReference(
                "an interface cannot be connected to itself".to_string(),
            ));
        }

        for (field, id) in [
            (ConnectionField::InterfaceA, connection.interface_a),
            (ConnectionField::InterfaceB, connection.interface_b),
        ] {
            let port = self.port(id)?;
            if port.kind != PortKind::Interface {
                return Err(StoreError::InvalidReference(format!(
                    "{field} must be an interface, not a {}",
                    port.kind
                )));
            }
            if self.connection_of(id).is_some() {
                return Err(StoreError::ConnectionConflict {
                    field,
                    port: id,
                    label: self.label(port),
                });
            }
        }
        Ok(())
    }

    fn conflict(&self, port: &Port, source: ConflictSource) -> NameConflict {
        NameConflict {
            device_id: port.device_id,
            device_name: self.device_name(port.device_id),
            kind: port.kind,
            name: port.name.clone(),
            source,
        }
    }
}

/// Reference [`ObjectStore`] backed by hash maps
#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn insert_device(&self, device: Device) -> StoreResult<Device> {
        let mut tables = self.tables.write().await;
        if tables.devices.contains_key(&device.id) {
            return Err(StoreError::InvalidReference(format!(
                "device {} already exists",
                device.id
            )));
        }
        tables.devices.insert(device.id, device.clone());
        Ok(device)
    }

    async fn get_device(&self, id: DeviceId) -> StoreResult<Option<Device>> {
        Ok(self.tables.read().await.devices.get(&id).cloned())
    }

    async fn list_devices(&self) -> StoreResult<Vec<Device>> {
        let tables = self.tables.read().await;
        let mut devices: Vec<Device> = tables.devices.values().cloned().collect();
        devices.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(devices)
    }

    async fn delete_device(&self, id: DeviceId) -> StoreResult<Device> {
        let mut tables = self.tables.write().await;
        let device = tables.device(id)?.clone();

        let mut owned: Vec<&Port> = tables.ports.values().filter(|p| p.device_id == id).collect();
        owned.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.name.cmp(&b.name)));
        let dependents: Vec<String> = owned.iter().flat_map(|p| tables.dependents_of(p)).collect();
        if !dependents.is_empty() {
            return Err(StoreError::Protected {
                entity: format!("device {}", device.name),
                dependents,
            });
        }

        let owned_ids: Vec<PortId> = owned.iter().map(|p| p.id).collect();
        for port_id in owned_ids {
            if let Some(port) = tables.ports.remove(&port_id) {
                tables.names.remove(&(port.device_id, port.kind, port.name));
            }
        }
        tables.devices.remove(&id);
        debug!(device = %device.name, "Device removed from store");
        Ok(device)
    }

    async fn get_port(&self, id: PortId) -> StoreResult<Option<Port>> {
        Ok(self.tables.read().await.ports.get(&id).cloned())
    }

    async fn list_ports(
        &self,
        device_id: DeviceId,
        kind: Option<PortKind>,
    ) -> StoreResult<Vec<Port>> {
        let tables = self.tables.read().await;
        tables.device(device_id)?;
        let mut ports: Vec<Port> = tables
            .ports
            .values()
            .filter(|p| p.device_id == device_id && kind.map_or(true, |k| p.kind == k))
            .cloned()
            .collect();
        ports.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.name.cmp(&b.name)));
        Ok(ports)
    }

    async fn bulk_insert_ports(&self, ports: Vec<Port>) -> StoreResult<Vec<Port>> {
        let mut tables = self.tables.write().await;

        let mut conflicts = Vec::new();
        let mut batch: HashSet<NameKey> = HashSet::new();
        for port in &ports {
            tables.device(port.device_id)?;
            if port.link.is_some() {
                return Err(StoreError::InvalidReference(format!(
                    "new port {} cannot carry a link",
                    port.name
                )));
            }
            if tables.ports.contains_key(&port.id) {
                return Err(StoreError::InvalidReference(format!(
                    "port {} already exists",
                    port.id
                )));
            }

            let key = (port.device_id, port.kind, port.name.clone());
            if tables.names.contains_key(&key) {
                conflicts.push(tables.conflict(port, ConflictSource::Existing));
            } else if !batch.insert(key) {
                conflicts.push(tables.conflict(port, ConflictSource::Batch));
            }
        }

        if !conflicts.is_empty() {
            return Err(StoreError::UniqueViolation(conflicts));
        }

        for port in &ports {
            tables
                .names
                .insert((port.device_id, port.kind, port.name.clone()), port.id);
            tables.ports.insert(port.id, port.clone());
        }
        debug!(count = ports.len(), "Ports inserted");
        Ok(ports)
    }

    async fn update_port(&self, port: Port) -> StoreResult<Port> {
        let mut tables = self.tables.write().await;
        let existing = tables.port(port.id)?.clone();

        if existing.device_id != port.device_id || existing.kind != port.kind {
            return Err(StoreError::InvalidReference(format!(
                "port {} cannot change device or kind",
                existing.name
            )));
        }

        if existing.name != port.name {
            let key = (port.device_id, port.kind, port.name.clone());
            if tables.names.contains_key(&key) {
                return Err(StoreError::UniqueViolation(vec![
                    tables.conflict(&port, ConflictSource::Existing)
                ]));
            }
            tables
                .names
                .remove(&(existing.device_id, existing.kind, existing.name.clone()));
            tables.names.insert(key, port.id);
        }

        let updated = Port {
            link: existing.link,
            ..port
        };
        tables.ports.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn set_link(&self, holder: PortId, link: Option<PortLink>) -> StoreResult<Port> {
        let mut tables = self.tables.write().await;
        let holder_port = tables.port(holder)?;
        match &link {
            Some(link) => tables.check_link(holder_port, link)?,
            None => tables.check_holder(holder_port)?,
        }

        let port = tables
            .ports
            .get_mut(&holder)
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Port,
                id: holder.as_uuid(),
            })?;
        port.link = link;
        Ok(port.clone())
    }

    async fn find_link_holder(&self, target: PortId) -> StoreResult<Option<Port>> {
        Ok(self.tables.read().await.holder_of(target).cloned())
    }

    async fn delete_port(&self, id: PortId) -> StoreResult<Port> {
        let mut tables = self.tables.write().await;
        let port = tables.port(id)?.clone();

        if let Some(conn) = tables.connection_of(id) {
            let dependents = vec![format!(
                "interface connection {}",
                tables.dependents_of(&port).join(", ")
            )];
            debug!(connection = %conn.id, "Interface deletion blocked");
            return Err(StoreError::Protected {
                entity: format!("{} {}", port.kind, tables.label(&port)),
                dependents,
            });
        }

        // Clear any link that pointed at this port.
        for other in tables.ports.values_mut() {
            if other.link.is_some_and(|link| link.partner == id) {
                other.link = None;
            }
        }

        tables.ports.remove(&id);
        tables
            .names
            .remove(&(port.device_id, port.kind, port.name.clone()));
        Ok(port)
    }

    async fn insert_interface_connection(
        &self,
        connection: InterfaceConnection,
    ) -> StoreResult<InterfaceConnection> {
        let mut tables = self.tables.write().await;
        tables.check_interface_connection(&connection)?;
        tables.connections.insert(connection.id, connection.clone());
        Ok(connection)
    }

    async fn bulk_connect(&self, batch: ConnectionBatch) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        let mut claimed: HashSet<PortId> = HashSet::new();
        for (holder, link) in &batch.links {
            let holder_port = tables.port(*holder)?;
            tables.check_link(holder_port, link)?;
            if !claimed.insert(*holder) {
                return Err(StoreError::InvalidReference(format!(
                    "{} appears more than once in the batch",
                    tables.label(holder_port)
                )));
            }
            if !claimed.insert(link.partner) {
                return Err(StoreError::ConnectionConflict {
                    field: ConnectionField::Partner,
                    port: link.partner,
                    label: tables.label(tables.port(link.partner)?),
                });
            }
        }
        for connection in &batch.interface_connections {
            tables.check_interface_connection(connection)?;
            for (field, id) in [
                (ConnectionField::InterfaceA, connection.interface_a),
                (ConnectionField::InterfaceB, connection.interface_b),
            ] {
                if !claimed.insert(id) {
                    return Err(StoreError::ConnectionConflict {
                        field,
                        port: id,
                        label: tables.label(tables.port(id)?),
                    });
                }
            }
        }

        let count = batch.len();
        for (holder, link) in batch.links {
            if let Some(port) = tables.ports.get_mut(&holder) {
                port.link = Some(link);
            }
        }
        for connection in batch.interface_connections {
            tables.connections.insert(connection.id, connection);
        }
        debug!(count, "Connections written");
        Ok(())
    }

    async fn get_interface_connection(
        &self,
        id: ConnectionId,
    ) -> StoreResult<Option<InterfaceConnection>> {
        Ok(self.tables.read().await.connections.get(&id).cloned())
    }

    async fn find_interface_connection(
        &self,
        interface: PortId,
    ) -> StoreResult<Option<InterfaceConnection>> {
        Ok(self.tables.read().await.connection_of(interface).cloned())
    }

    async fn delete_interface_connection(
        &self,
        id: ConnectionId,
    ) -> StoreResult<InterfaceConnection> {
        let mut tables = self.tables.write().await;
        tables.connections.remove(&id).ok_or(StoreError::NotFound {
            entity: EntityKind::InterfaceConnection,
            id: id.as_uuid(),
        })
    }

    async fn snapshot(&self) -> StoreResult<TopologySnapshot> {
        let tables = self.tables.read().await;
        let mut interface_connections: Vec<InterfaceConnection> =
            tables.connections.values().cloned().collect();
        interface_connections.sort_by_key(|c| c.id);

        Ok(TopologySnapshot {
            devices: tables.devices.clone(),
            ports: tables.ports.clone(),
            interface_connections,
        })
    }
}
