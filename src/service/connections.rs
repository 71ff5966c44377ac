// Copyright (c) 2025 - Cowboy AI, Inc.
//! Connection Manager
//!
//! Two connection shapes coexist:
//!
//! ```text
//! point-to-point   ConsolePort ─link─▶ ConsoleServerPort
//!                  PowerPort   ─link─▶ PowerOutlet
//!
//! symmetric        Interface ◀── InterfaceConnection ──▶ Interface
//! ```
//!
//! Point-to-point links may be requested from either side; the link is always
//! written onto the holder. Writing a link onto a holder that already has one
//! replaces it (last write wins). The store refuses to link a target another
//! holder already references.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{sentence_case, ServiceContext};
use crate::auth::{Actor, Operation};
use crate::domain::{
    ConnectionId, ConnectionStatus, EntityKind, InterfaceConnection, Port, PortId, PortKind,
    PortLink, PortRole,
};
use crate::errors::{DcimError, DcimResult, RowError};
use crate::events::{TopologyChange, TopologyEvent};
use crate::outcome::{Confirm, Confirmation, ConfirmationDescriptor, DestructiveAction, Outcome};
use crate::store::{ConnectionBatch, TopologySnapshot};

/// Which listing an imported connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// `a` is the console port, `b` the console server port
    Console,
    /// `a` is the power port, `b` the power outlet
    Power,
    Interface,
}

impl ConnectionKind {
    /// Port kinds of the `a` and `b` endpoints
    pub fn port_kinds(self) -> (PortKind, PortKind) {
        match self {
            ConnectionKind::Console => (PortKind::ConsolePort, PortKind::ConsoleServerPort),
            ConnectionKind::Power => (PortKind::PowerPort, PortKind::PowerOutlet),
            ConnectionKind::Interface => (PortKind::Interface, PortKind::Interface),
        }
    }

    fn permission(self) -> (Operation, EntityKind) {
        match self {
            ConnectionKind::Console => (Operation::Change, EntityKind::ConsolePort),
            ConnectionKind::Power => (Operation::Change, EntityKind::PowerPort),
            ConnectionKind::Interface => (Operation::Add, EntityKind::InterfaceConnection),
        }
    }
}

/// A port named by its device and its own name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRef {
    pub device: String,
    pub port: String,
}

impl PortRef {
    pub fn new(device: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.device, self.port)
    }
}

/// One row of a connection import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionImport {
    pub kind: ConnectionKind,
    pub a: PortRef,
    pub b: PortRef,
    #[serde(default)]
    pub status: Option<ConnectionStatus>,
}

impl ConnectionImport {
    pub fn new(kind: ConnectionKind, a: PortRef, b: PortRef) -> Self {
        Self {
            kind,
            a,
            b,
            status: None,
        }
    }

    pub fn with_status(mut self, status: ConnectionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Connections committed by one import, per listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub console: usize,
    pub power: usize,
    pub interface: usize,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.console + self.power + self.interface
    }
}

#[derive(Clone)]
pub struct ConnectionManager {
    ctx: ServiceContext,
}

impl ConnectionManager {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Connect a console or power port to its complement
    ///
    /// `port` may be either side of the pair. Returns the holder with its new
    /// link. `status` defaults to the configured connection status.
    ///
    /// # Errors
    ///
    /// - `IncompatiblePorts` unless the kinds pair up
    /// - `DuplicateConnection` if another holder already links to the target
    pub async fn connect(
        &self,
        actor: &Actor,
        port: PortId,
        partner: PortId,
        status: Option<ConnectionStatus>,
    ) -> DcimResult<Outcome<Port>> {
        self.ctx
            .authorize_any(actor, Operation::Change, &PortKind::LINKED)?;
        let origin = self.ctx.require_port(port).await?;
        self.ctx.authorize(actor, Operation::Change, origin.kind.into())?;

        let other = self.ctx.require_port(partner).await?;
        if origin.kind.complement() != Some(other.kind) {
            return Err(DcimError::IncompatiblePorts {
                port: origin.kind,
                partner: other.kind,
            });
        }

        let (holder, target) = match origin.kind.role() {
            PortRole::Holder => (origin, other),
            _ => (other, origin),
        };
        let status = status.unwrap_or(self.ctx.config.default_connection_status);

        let correlation_id = Uuid::now_v7();
        let (linked, event) = self.assign_link(&holder, &target, status, correlation_id).await?;

        let message = format!(
            "Connected {} to {}",
            self.ctx.port_label(&linked).await?,
            self.ctx.port_label(&target).await?
        );
        info!("{}", message);
        Ok(Outcome::new(linked, message).with_events(vec![event]))
    }

    /// Write `target` onto `holder`'s link
    ///
    /// The holder's previous link, if any, is overwritten without a check.
    /// Every point-to-point connect goes through here.
    async fn assign_link(
        &self,
        holder: &Port,
        target: &Port,
        status: ConnectionStatus,
        correlation_id: Uuid,
    ) -> DcimResult<(Port, TopologyEvent)> {
        let superseded = holder
            .link
            .map(|link| link.partner)
            .filter(|previous| *previous != target.id);
        if let Some(previous) = superseded {
            debug!(
                holder = %holder.id,
                previous = %previous,
                "Replacing existing link"
            );
        }

        let linked = self
            .ctx
            .store
            .set_link(
                holder.id,
                Some(PortLink {
                    partner: target.id,
                    status,
                }),
            )
            .await?;

        let event = TopologyEvent::new(
            correlation_id,
            TopologyChange::PortLinked {
                holder: holder.id,
                partner: target.id,
                kind: holder.kind,
                status,
                superseded,
            },
        );
        Ok((linked, event))
    }

    /// Clear the point-to-point link `port` participates in (two-phase)
    ///
    /// From the holder side the holder's own link is cleared; from the target
    /// side the link of whichever holder references it is cleared. Returns
    /// the holder without its link.
    ///
    /// # Errors
    ///
    /// - `NotConnected` if there is no link to clear
    pub async fn disconnect(
        &self,
        actor: &Actor,
        port: PortId,
        confirm: Confirmation,
    ) -> DcimResult<Confirm<Port>> {
        self.ctx
            .authorize_any(actor, Operation::Change, &PortKind::LINKED)?;
        let origin = self.ctx.require_port(port).await?;
        self.ctx.authorize(actor, Operation::Change, origin.kind.into())?;
        let origin_label = self.ctx.port_label(&origin).await?;

        let (holder, link) = match origin.kind.role() {
            PortRole::Holder => match origin.link {
                Some(link) => (origin.clone(), link),
                None => return Err(DcimError::NotConnected { port: origin_label }),
            },
            PortRole::Target => {
                let holder = self.ctx.store.find_link_holder(origin.id).await?;
                match holder.and_then(|h| h.link.map(|link| (h, link))) {
                    Some(found) => found,
                    None => return Err(DcimError::NotConnected { port: origin_label }),
                }
            }
            PortRole::Symmetric => {
                return Err(DcimError::InvalidConnection(format!(
                    "{origin_label} is an interface; delete its interface connection instead"
                )))
            }
        };

        let partner = self.ctx.require_port(link.partner).await?;
        let holder_label = self.ctx.port_label(&holder).await?;
        let partner_label = self.ctx.port_label(&partner).await?;

        let descriptor = ConfirmationDescriptor::new(
            DestructiveAction::Disconnect,
            format!("Disconnect {} {}", origin.kind, origin_label),
            vec![format!(
                "{} {} ({}) → {} {}",
                holder.kind, holder_label, link.status, partner.kind, partner_label
            )],
        );
        if !descriptor.accepts(confirm)? {
            return Ok(Confirm::Required(descriptor));
        }

        let cleared = self.ctx.store.set_link(holder.id, None).await?;
        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::PortUnlinked {
                holder: holder.id,
                partner: partner.id,
                kind: holder.kind,
            },
        );

        let message = format!(
            "{} {} has been disconnected",
            sentence_case(origin.kind.label()),
            origin.name
        );
        info!("{}", message);
        Ok(Confirm::Applied(
            Outcome::new(cleared, message).with_events(vec![event]),
        ))
    }

    /// Connect two interfaces
    ///
    /// # Errors
    ///
    /// - `InvalidConnection` if `a` and `b` are the same interface
    /// - `IncompatiblePorts` if either endpoint is not an interface
    /// - `DuplicateConnection` naming the endpoint already connected; the
    ///   existing connection is left intact
    pub async fn connect_interfaces(
        &self,
        actor: &Actor,
        a: PortId,
        b: PortId,
        status: Option<ConnectionStatus>,
    ) -> DcimResult<Outcome<InterfaceConnection>> {
        self.ctx
            .authorize(actor, Operation::Add, EntityKind::InterfaceConnection)?;

        if a == b {
            return Err(DcimError::InvalidConnection(
                "an interface cannot be connected to itself".to_string(),
            ));
        }

        let interface_a = self.ctx.require_port(a).await?;
        let interface_b = self.ctx.require_port(b).await?;
        for (port, other) in [(&interface_a, &interface_b), (&interface_b, &interface_a)] {
            if port.kind != PortKind::Interface {
                return Err(DcimError::IncompatiblePorts {
                    port: other.kind,
                    partner: port.kind,
                });
            }
        }

        let status = status.unwrap_or(self.ctx.config.default_connection_status);
        let connection = self
            .ctx
            .store
            .insert_interface_connection(InterfaceConnection::new(a, b, status))
            .await?;

        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::InterfacesConnected {
                connection_id: connection.id,
                interface_a: a,
                interface_b: b,
                status,
            },
        );

        let message = format!(
            "Connected {} to {}",
            self.ctx.port_label(&interface_a).await?,
            self.ctx.port_label(&interface_b).await?
        );
        info!("{}", message);
        Ok(Outcome::new(connection, message).with_events(vec![event]))
    }

    /// Delete an interface connection (two-phase)
    pub async fn disconnect_interfaces(
        &self,
        actor: &Actor,
        connection: ConnectionId,
        confirm: Confirmation,
    ) -> DcimResult<Confirm<InterfaceConnection>> {
        self.ctx
            .authorize(actor, Operation::Delete, EntityKind::InterfaceConnection)?;

        let existing = self
            .ctx
            .store
            .get_interface_connection(connection)
            .await?
            .ok_or(DcimError::NotFound {
                entity: EntityKind::InterfaceConnection,
                id: connection.as_uuid(),
            })?;

        let a = self.ctx.require_port(existing.interface_a).await?;
        let b = self.ctx.require_port(existing.interface_b).await?;
        let a_label = self.ctx.port_label(&a).await?;
        let b_label = self.ctx.port_label(&b).await?;

        let descriptor = ConfirmationDescriptor::new(
            DestructiveAction::DeleteConnection,
            format!("Delete the connection between {a_label} and {b_label}"),
            vec![
                format!("interface {a_label}"),
                format!("interface {b_label}"),
                format!("status {}", existing.status),
            ],
        );
        if !descriptor.accepts(confirm)? {
            return Ok(Confirm::Required(descriptor));
        }

        let deleted = self
            .ctx
            .store
            .delete_interface_connection(existing.id)
            .await?;
        let event = TopologyEvent::new(
            Uuid::now_v7(),
            TopologyChange::InterfacesDisconnected {
                connection_id: deleted.id,
                interface_a: deleted.interface_a,
                interface_b: deleted.interface_b,
            },
        );

        let message = format!("Deleted the connection between {a_label} and {b_label}");
        info!("{}", message);
        Ok(Confirm::Applied(
            Outcome::new(deleted, message).with_events(vec![event]),
        ))
    }

    /// Import many connections as one all-or-nothing batch
    ///
    /// Endpoints are resolved by device and port name. Every row is checked
    /// against the current topology and against earlier rows before anything
    /// is written. Unlike [`ConnectionManager::connect`], an import never
    /// replaces an existing link.
    ///
    /// # Errors
    ///
    /// - `Authorization` unless the actor may create every kind present
    /// - `EmptySelection` if `rows` is empty
    /// - `ImportRejected` with one entry per failing row; nothing is written
    pub async fn import_connections(
        &self,
        actor: &Actor,
        rows: Vec<ConnectionImport>,
    ) -> DcimResult<Outcome<ImportReport>> {
        let kinds: BTreeSet<ConnectionKind> = rows.iter().map(|row| row.kind).collect();
        for kind in kinds {
            let (operation, entity) = kind.permission();
            self.ctx.authorize(actor, operation, entity)?;
        }
        if rows.is_empty() {
            return Err(DcimError::EmptySelection("connections"));
        }

        let snapshot = self.ctx.store.snapshot().await?;
        let default_status = self.ctx.config.default_connection_status;
        let correlation_id = Uuid::now_v7();

        let mut claimed: HashMap<PortId, usize> = HashMap::new();
        let mut errors = Vec::new();
        let mut batch = ConnectionBatch::default();
        let mut events = Vec::with_capacity(rows.len());
        let mut report = ImportReport::default();

        for (index, row) in rows.iter().enumerate() {
            let number = index + 1;
            let (a, b) = match resolve_row(&snapshot, row, &claimed) {
                Ok(endpoints) => endpoints,
                Err(reason) => {
                    errors.push(RowError {
                        row: number,
                        reason,
                    });
                    continue;
                }
            };
            claimed.insert(a.id, number);
            claimed.insert(b.id, number);

            let status = row.status.unwrap_or(default_status);
            let change = match row.kind {
                ConnectionKind::Interface => {
                    let connection = InterfaceConnection::new(a.id, b.id, status);
                    report.interface += 1;
                    let change = TopologyChange::InterfacesConnected {
                        connection_id: connection.id,
                        interface_a: a.id,
                        interface_b: b.id,
                        status,
                    };
                    batch.interface_connections.push(connection);
                    change
                }
                ConnectionKind::Console | ConnectionKind::Power => {
                    if row.kind == ConnectionKind::Console {
                        report.console += 1;
                    } else {
                        report.power += 1;
                    }
                    batch.links.push((
                        a.id,
                        PortLink {
                            partner: b.id,
                            status,
                        },
                    ));
                    TopologyChange::PortLinked {
                        holder: a.id,
                        partner: b.id,
                        kind: a.kind,
                        status,
                        superseded: None,
                    }
                }
            };
            events.push(TopologyEvent::new(correlation_id, change));
        }

        if !errors.is_empty() {
            warn!(
                rows = rows.len(),
                rejected = errors.len(),
                "Connection import rejected"
            );
            return Err(DcimError::ImportRejected { errors });
        }

        self.ctx.store.bulk_connect(batch).await?;

        let message = format!("Imported {} connection(s)", report.total());
        info!(
            console = report.console,
            power = report.power,
            interface = report.interface,
            "{}",
            message
        );
        Ok(Outcome::new(report, message).with_events(events))
    }

    /// The interface on the other end of `interface`'s connection, if any
    pub async fn resolve_partner(&self, interface: PortId) -> DcimResult<Option<Port>> {
        let Some(connection) = self.ctx.store.find_interface_connection(interface).await? else {
            return Ok(None);
        };
        match connection.partner_of(interface) {
            Some(partner) => Ok(self.ctx.store.get_port(partner).await?),
            None => Ok(None),
        }
    }
}

/// Resolve both endpoints of an import row, or say why the row is refused
fn resolve_row<'a>(
    snapshot: &'a TopologySnapshot,
    row: &ConnectionImport,
    claimed: &HashMap<PortId, usize>,
) -> Result<(&'a Port, &'a Port), String> {
    let (a_kind, b_kind) = row.kind.port_kinds();
    let a = find_port(snapshot, &row.a, a_kind)?;
    let b = find_port(snapshot, &row.b, b_kind)?;
    if a.id == b.id {
        return Err("an interface cannot be connected to itself".to_string());
    }

    for (port, reference) in [(a, &row.a), (b, &row.b)] {
        if let Some(earlier) = claimed.get(&port.id) {
            return Err(format!("{reference} is already used by row {earlier}"));
        }
        if snapshot.peer_of(port).is_some() {
            return Err(format!("{reference} is already connected"));
        }
    }
    Ok((a, b))
}

fn find_port<'a>(
    snapshot: &'a TopologySnapshot,
    reference: &PortRef,
    kind: PortKind,
) -> Result<&'a Port, String> {
    let mut devices = snapshot
        .devices
        .values()
        .filter(|device| device.name == reference.device);
    let device = match (devices.next(), devices.next()) {
        (Some(device), None) => device,
        (None, _) => return Err(format!("Device {} not found", reference.device)),
        (Some(_), Some(_)) => {
            return Err(format!("Device name {} is ambiguous", reference.device))
        }
    };

    snapshot
        .ports
        .values()
        .find(|port| {
            port.device_id == device.id && port.kind == kind && port.name == reference.port
        })
        .ok_or_else(|| format!("No {kind} named {} on {}", reference.port, reference.device))
}
