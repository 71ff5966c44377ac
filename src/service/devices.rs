// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device Service
//!
//! Device registration and deletion, the per-device detail view, and the
//! related-device lookup.
//!
//! Related devices share a name base: `core-switch1` and `core-switch2` are
//! both in the `core-switch` family (see [`base_name`]).

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::topology::Endpoint;
use super::ServiceContext;
use crate::auth::{Actor, Operation};
use crate::domain::{
    base_name, is_family_member, ConnectionStatus, Device, DeviceId, EntityKind, Port, PortKind,
};
use crate::errors::{DcimError, DcimResult};
use crate::events::{TopologyChange, TopologyEvent};
use crate::outcome::{Confirm, Confirmation, ConfirmationDescriptor, DestructiveAction, Outcome};
use crate::store::TopologySnapshot;

/// A port with its connected peer, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortView {
    pub port: Port,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
}

/// Everything shown on a device's detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceView {
    pub device: Device,
    pub console_ports: Vec<PortView>,
    pub console_server_ports: Vec<PortView>,
    pub power_ports: Vec<PortView>,
    pub power_outlets: Vec<PortView>,
    /// Data interfaces
    pub interfaces: Vec<PortView>,
    /// Management-only interfaces
    pub mgmt_interfaces: Vec<PortView>,
    pub related_devices: Vec<Device>,
}

#[derive(Clone)]
pub struct DeviceService {
    ctx: ServiceContext,
}

impl DeviceService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn add_device(&self, actor: &Actor, device: Device) -> DcimResult<Outcome<Device>> {
        self.ctx.authorize(actor, Operation::Add, EntityKind::Device)?;
        let device = self.ctx.store.insert_device(device).await?;

        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::DeviceAdded {
                device_id: device.id,
                name: device.name.clone(),
            },
        );
        let message = format!("Added device {}", device.name);
        info!("{}", message);
        Ok(Outcome::new(device, message).with_events(vec![event]))
    }

    pub async fn get_device(&self, id: DeviceId) -> DcimResult<Device> {
        self.ctx.require_device(id).await
    }

    /// Up to `related_device_limit` devices in the same name family, by name
    pub async fn related_devices(&self, id: DeviceId) -> DcimResult<Vec<Device>> {
        let device = self.ctx.require_device(id).await?;
        let Some(base) = base_name(&device.name) else {
            debug!(device = %device.name, "No name base; no related devices");
            return Ok(Vec::new());
        };

        let related: Vec<Device> = self
            .ctx
            .store
            .list_devices()
            .await?
            .into_iter()
            .filter(|candidate| candidate.id != device.id)
            .filter(|candidate| is_family_member(base, &candidate.name))
            .take(self.ctx.config.related_device_limit)
            .collect();

        debug!(
            device = %device.name,
            base = base,
            related = related.len(),
            "Resolved related devices"
        );
        Ok(related)
    }

    /// The device, its ports grouped by kind with their peers, and related devices
    pub async fn device_view(&self, id: DeviceId) -> DcimResult<DeviceView> {
        let device = self.ctx.require_device(id).await?;
        let related_devices = self.related_devices(id).await?;
        let snapshot = self.ctx.store.snapshot().await?;

        let mut ports: Vec<&Port> = snapshot
            .ports
            .values()
            .filter(|port| port.device_id == id)
            .collect();
        ports.sort_by(|a, b| a.name.cmp(&b.name));

        let mut view = DeviceView {
            device,
            console_ports: Vec::new(),
            console_server_ports: Vec::new(),
            power_ports: Vec::new(),
            power_outlets: Vec::new(),
            interfaces: Vec::new(),
            mgmt_interfaces: Vec::new(),
            related_devices,
        };

        for port in ports {
            let entry = port_view(&snapshot, port);
            match port.kind {
                PortKind::ConsolePort => view.console_ports.push(entry),
                PortKind::ConsoleServerPort => view.console_server_ports.push(entry),
                PortKind::PowerPort => view.power_ports.push(entry),
                PortKind::PowerOutlet => view.power_outlets.push(entry),
                PortKind::Interface if port.is_mgmt_only() => view.mgmt_interfaces.push(entry),
                PortKind::Interface => view.interfaces.push(entry),
            }
        }
        Ok(view)
    }

    /// Delete a device together with its ports (two-phase)
    ///
    /// # Errors
    ///
    /// - `ProtectedDeletion` while any of its ports is connected
    pub async fn delete_device(
        &self,
        actor: &Actor,
        id: DeviceId,
        confirm: Confirmation,
    ) -> DcimResult<Confirm<Device>> {
        self.ctx.authorize(actor, Operation::Delete, EntityKind::Device)?;
        let device = self.ctx.require_device(id).await?;
        let snapshot = self.ctx.store.snapshot().await?;

        let mut ports: Vec<&Port> = snapshot
            .ports
            .values()
            .filter(|port| port.device_id == id)
            .collect();
        ports.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.name.cmp(&b.name)));

        let dependents: Vec<String> = ports
            .iter()
            .filter_map(|port| {
                let (peer, _) = snapshot.peer_of(port)?;
                let far = Endpoint::resolve(&snapshot, peer.id)?;
                Some(format!(
                    "{} {} connected to {} {}",
                    port.kind, port.name, far.device, far.port
                ))
            })
            .collect();
        if !dependents.is_empty() {
            return Err(DcimError::ProtectedDeletion {
                entity: format!("device {}", device.name),
                dependents,
            });
        }

        let descriptor = ConfirmationDescriptor::new(
            DestructiveAction::DeleteDevice,
            format!("Delete device {}", device.name),
            ports
                .iter()
                .map(|port| format!("{} {} will be deleted", port.kind, port.name))
                .collect(),
        );
        if !descriptor.accepts(confirm)? {
            return Ok(Confirm::Required(descriptor));
        }

        let deleted = self.ctx.store.delete_device(id).await?;
        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::DeviceDeleted {
                device_id: deleted.id,
                name: deleted.name.clone(),
            },
        );
        let message = format!("Deleted device {}", deleted.name);
        info!("{}", message);
        Ok(Confirm::Applied(
            Outcome::new(deleted, message).with_events(vec![event]),
        ))
    }
}

fn port_view(snapshot: &TopologySnapshot, port: &Port) -> PortView {
    let peer = snapshot.peer_of(port);
    PortView {
        port: port.clone(),
        peer: peer.and_then(|(p, _)| Endpoint::resolve(snapshot, p.id)),
        status: peer.map(|(_, status)| status),
    }
}
