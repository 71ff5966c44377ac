// Copyright (c) 2025 - Cowboy AI, Inc.
//! Port Registry
//!
//! Creates, edits and deletes ports on a single device. Batch creation is
//! all-or-nothing: every proposed name is checked against the device's
//! existing ports of the same kind and against earlier names in the batch,
//! and any collision rejects the whole batch with every offending name listed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{sentence_case, ServiceContext};
use crate::auth::{Actor, Operation};
use crate::domain::{DeviceId, Port, PortAttributes, PortId, PortKind, PortRole};
use crate::errors::{DcimError, DcimResult};
use crate::events::{TopologyChange, TopologyEvent};
use crate::outcome::{Confirm, Confirmation, ConfirmationDescriptor, DestructiveAction, Outcome};

/// Fields of a port that may be edited after creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PortAttributes>,
}

impl PortUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            attributes: None,
        }
    }

    pub fn with_attributes(mut self, attributes: PortAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

#[derive(Clone)]
pub struct PortRegistry {
    ctx: ServiceContext,
}

impl PortRegistry {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create one port per proposed name on `device`
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor may not add ports of `kind`
    /// - `InvalidAttributes` if `attributes` do not belong to `kind`
    /// - `NotFound` if the device does not exist
    /// - `DuplicateName` listing every colliding name; nothing is created
    pub async fn create_ports(
        &self,
        actor: &Actor,
        device: DeviceId,
        kind: PortKind,
        proposed_names: Vec<String>,
        attributes: PortAttributes,
    ) -> DcimResult<Outcome<Vec<Port>>> {
        self.ctx.authorize(actor, Operation::Add, kind.into())?;
        let attributes = checked_attributes(kind, attributes)?;
        let device = self.ctx.require_device(device).await?;

        debug!(
            device = %device.name,
            kind = %kind,
            count = proposed_names.len(),
            "Validating port batch"
        );

        let ports: Vec<Port> = proposed_names
            .into_iter()
            .map(|name| Port::new(device.id, kind, name, attributes.clone()))
            .collect();

        let created = match self.ctx.store.bulk_insert_ports(ports).await {
            Ok(created) => created,
            Err(err) => {
                let err = DcimError::from(err);
                if let DcimError::DuplicateName { conflicts } = &err {
                    warn!(
                        device = %device.name,
                        conflicts = conflicts.len(),
                        "Port batch rejected"
                    );
                }
                return Err(err);
            }
        };

        let message = format!("Added {} {}(s) to {}", created.len(), kind, device.name);
        info!("{}", message);

        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::PortsCreated {
                device_id: device.id,
                kind,
                port_ids: created.iter().map(|p| p.id).collect(),
                names: created.iter().map(|p| p.name.clone()).collect(),
            },
        );

        Ok(Outcome::new(created, message).with_events(vec![event]))
    }

    /// Create a single port
    pub async fn create_port(
        &self,
        actor: &Actor,
        device: DeviceId,
        kind: PortKind,
        name: impl Into<String>,
        attributes: PortAttributes,
    ) -> DcimResult<Outcome<Port>> {
        let outcome = self
            .create_ports(actor, device, kind, vec![name.into()], attributes)
            .await?;
        let Outcome {
            value,
            message,
            events,
        } = outcome;
        let port = value.into_iter().next().ok_or_else(|| {
            DcimError::Store(anyhow::anyhow!("store returned no port for a one-name batch"))
        })?;
        Ok(Outcome::new(port, message).with_events(events))
    }

    /// Rename a port and/or replace its attributes
    ///
    /// The port's connection state is untouched.
    pub async fn update_port(
        &self,
        actor: &Actor,
        port: PortId,
        update: PortUpdate,
    ) -> DcimResult<Outcome<Port>> {
        self.ctx.authorize_any(actor, Operation::Change, &PortKind::ALL)?;
        let current = self.ctx.require_port(port).await?;
        self.ctx.authorize(actor, Operation::Change, current.kind.into())?;

        let mut edited = current.clone();
        if let Some(name) = update.name {
            edited.name = name;
        }
        if let Some(attributes) = update.attributes {
            edited.attributes = checked_attributes(current.kind, attributes)?;
        }

        let device = self.ctx.require_device(current.device_id).await?;
        let updated = self.ctx.store.update_port(edited).await?;

        let message = format!("Modified {} {} {}", device.name, updated.kind, updated.name);
        info!("{}", message);

        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::PortUpdated {
                port_id: updated.id,
                device_id: updated.device_id,
                kind: updated.kind,
                name: updated.name.clone(),
            },
        );
        Ok(Outcome::new(updated, message).with_events(vec![event]))
    }

    /// Delete a port (two-phase)
    ///
    /// A console or power link that pointed at the port is cleared with it.
    ///
    /// # Errors
    ///
    /// - `ProtectedDeletion` if the port is an interface in a connection
    pub async fn delete_port(
        &self,
        actor: &Actor,
        port: PortId,
        confirm: Confirmation,
    ) -> DcimResult<Confirm<Port>> {
        self.ctx.authorize_any(actor, Operation::Delete, &PortKind::ALL)?;
        let target = self.ctx.require_port(port).await?;
        self.ctx.authorize(actor, Operation::Delete, target.kind.into())?;

        let device = self.ctx.require_device(target.device_id).await?;
        let label = format!("{} {}", device.name, target.name);

        if let Some(conn) = self.ctx.store.find_interface_connection(target.id).await? {
            let peer = match conn.partner_of(target.id) {
                Some(id) => match self.ctx.store.get_port(id).await? {
                    Some(peer) => self.ctx.port_label(&peer).await?,
                    None => id.to_string(),
                },
                None => conn.id.to_string(),
            };
            return Err(DcimError::ProtectedDeletion {
                entity: format!("{} {}", target.kind, label),
                dependents: vec![format!("interface connection to {peer}")],
            });
        }

        // Whoever holds a link to this port loses it on delete.
        let holder = match target.kind.role() {
            PortRole::Target => self.ctx.store.find_link_holder(target.id).await?,
            _ => None,
        };

        let mut affected = Vec::new();
        if let Some(holder) = &holder {
            affected.push(format!(
                "{} {} will be disconnected",
                holder.kind,
                self.ctx.port_label(holder).await?
            ));
        }
        if let Some(link) = target.link {
            if let Some(partner) = self.ctx.store.get_port(link.partner).await? {
                affected.push(format!(
                    "{} {} will be disconnected",
                    partner.kind,
                    self.ctx.port_label(&partner).await?
                ));
            }
        }

        let descriptor = ConfirmationDescriptor::new(
            DestructiveAction::DeletePort,
            format!("Delete {} {}", target.kind, label),
            affected,
        );
        if !descriptor.accepts(confirm)? {
            return Ok(Confirm::Required(descriptor));
        }

        let deleted = self.ctx.store.delete_port(target.id).await?;
        let correlation_id = Uuid::now_v7();
        let mut events = Vec::new();
        if let Some(holder) = holder {
            events.push(TopologyEvent::new(
                correlation_id,
                TopologyChange::PortUnlinked {
                    holder: holder.id,
                    partner: deleted.id,
                    kind: holder.kind,
                },
            ));
        }
        events.push(TopologyEvent::new(
            correlation_id,
            TopologyChange::PortDeleted {
                port_id: deleted.id,
                device_id: deleted.device_id,
                kind: deleted.kind,
                name: deleted.name.clone(),
            },
        ));

        let message = format!(
            "{} {} has been deleted from {}",
            sentence_case(deleted.kind.label()),
            deleted.name,
            device.name
        );
        info!("{}", message);
        Ok(Confirm::Applied(
            Outcome::new(deleted, message).with_events(events),
        ))
    }
}

/// Normalize `attributes` for `kind`, rejecting ones that belong to another kind
pub(crate) fn checked_attributes(
    kind: PortKind,
    attributes: PortAttributes,
) -> DcimResult<PortAttributes> {
    let attributes = attributes.normalized_for(kind);
    if attributes.fits(kind) {
        Ok(attributes)
    } else {
        Err(DcimError::InvalidAttributes(format!(
            "interface attributes cannot be set on a {kind}"
        )))
    }
}
