// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Query
//!
//! Read-only connection listings. Each listing is built from a single store
//! snapshot, so rows are consistent with each other.
//!
//! | Listing | Ordered by |
//! |---|---|
//! | console | console server device, console server port |
//! | power | outlet device, outlet |
//! | interface | `interface_a` device, `interface_a` |

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::ServiceContext;
use crate::domain::{ConnectionId, ConnectionStatus, DeviceId, Port, PortId, PortKind};
use crate::errors::DcimResult;
use crate::store::TopologySnapshot;

/// One end of a connection, resolved to names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub device_id: DeviceId,
    pub device: String,
    pub port_id: PortId,
    pub port: String,
}

impl Endpoint {
    pub(crate) fn resolve(snapshot: &TopologySnapshot, port: PortId) -> Option<Self> {
        let (device, port) = snapshot.endpoint(port)?;
        Some(Self {
            device_id: device.id,
            device: device.name.clone(),
            port_id: port.id,
            port: port.name.clone(),
        })
    }

    fn sort_key(&self) -> (&str, &str) {
        (&self.device, &self.port)
    }
}

/// A row in a connection listing
///
/// For console and power rows `a` is the holder (console port, power port)
/// and `b` the target. For interface rows they are `interface_a` and
/// `interface_b`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRow {
    pub a: Endpoint,
    pub b: Endpoint,
    pub status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
}

/// An interface and whatever it is connected to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceNeighbor {
    pub interface: Port,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
}

#[derive(Clone)]
pub struct TopologyQuery {
    ctx: ServiceContext,
}

impl TopologyQuery {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Every linked console port, ordered by console server device then port
    pub async fn console_connections(&self) -> DcimResult<Vec<ConnectionRow>> {
        let snapshot = self.ctx.store.snapshot().await?;
        Ok(point_to_point_rows(&snapshot, PortKind::ConsolePort))
    }

    /// Every linked power port, ordered by outlet device then outlet
    pub async fn power_connections(&self) -> DcimResult<Vec<ConnectionRow>> {
        let snapshot = self.ctx.store.snapshot().await?;
        Ok(point_to_point_rows(&snapshot, PortKind::PowerPort))
    }

    /// Every interface connection, ordered by `interface_a` device then name
    pub async fn interface_connections(&self) -> DcimResult<Vec<ConnectionRow>> {
        let snapshot = self.ctx.store.snapshot().await?;
        let mut rows: Vec<ConnectionRow> = snapshot
            .interface_connections
            .iter()
            .filter_map(|conn| {
                Some(ConnectionRow {
                    a: Endpoint::resolve(&snapshot, conn.interface_a)?,
                    b: Endpoint::resolve(&snapshot, conn.interface_b)?,
                    status: conn.status,
                    connection_id: Some(conn.id),
                })
            })
            .collect();
        rows.sort_by(|x, y| by_endpoints(&x.a, &x.b, &y.a, &y.b));
        debug!(rows = rows.len(), "Listed interface connections");
        Ok(rows)
    }

    /// Interfaces of `device` with their connected peers, ordered by name
    pub async fn interface_neighbors(&self, device: DeviceId) -> DcimResult<Vec<InterfaceNeighbor>> {
        self.ctx.require_device(device).await?;
        let snapshot = self.ctx.store.snapshot().await?;

        let mut neighbors: Vec<InterfaceNeighbor> = snapshot
            .ports
            .values()
            .filter(|port| port.device_id == device && port.kind == PortKind::Interface)
            .map(|port| {
                let peer = snapshot.peer_of(port);
                InterfaceNeighbor {
                    interface: port.clone(),
                    peer: peer.and_then(|(p, _)| Endpoint::resolve(&snapshot, p.id)),
                    status: peer.map(|(_, status)| status),
                }
            })
            .collect();
        neighbors.sort_by(|x, y| x.interface.name.cmp(&y.interface.name));
        Ok(neighbors)
    }
}

fn point_to_point_rows(snapshot: &TopologySnapshot, holder_kind: PortKind) -> Vec<ConnectionRow> {
    let mut rows: Vec<ConnectionRow> = snapshot
        .linked_holders(holder_kind)
        .filter_map(|holder| {
            let link = holder.link?;
            Some(ConnectionRow {
                a: Endpoint::resolve(snapshot, holder.id)?,
                b: Endpoint::resolve(snapshot, link.partner)?,
                status: link.status,
                connection_id: None,
            })
        })
        .collect();
    // Far side first, holder breaks ties.
    rows.sort_by(|x, y| by_endpoints(&x.b, &x.a, &y.b, &y.a));
    debug!(kind = %holder_kind, rows = rows.len(), "Listed point-to-point connections");
    rows
}

fn by_endpoints(x: &Endpoint, x_tie: &Endpoint, y: &Endpoint, y_tie: &Endpoint) -> Ordering {
    x.sort_key()
        .cmp(&y.sort_key())
        .then_with(|| x_tie.sort_key().cmp(&y_tie.sort_key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAll;
    use crate::config::TopologyConfig;
    use crate::domain::{Device, InterfaceConnection, PortAttributes, PortLink};
    use crate::store::{InMemoryObjectStore, ObjectStore};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_console_rows_sorted_by_server_side() {
        let store = Arc::new(InMemoryObjectStore::new());
        let cs_b = store.insert_device(Device::new("cs-b")).await.unwrap();
        let cs_a = store.insert_device(Device::new("cs-a")).await.unwrap();
        let router = store.insert_device(Device::new("router")).await.unwrap();

        let b1 = Port::new(cs_b.id, PortKind::ConsoleServerPort, "1", PortAttributes::Plain);
        let a2 = Port::new(cs_a.id, PortKind::ConsoleServerPort, "2", PortAttributes::Plain);
        let a10 = Port::new(cs_a.id, PortKind::ConsoleServerPort, "10", PortAttributes::Plain);
        let con = |name: &str| Port::new(router.id, PortKind::ConsolePort, name, PortAttributes::Plain);
        let (c0, c1, c2) = (con("con0"), con("con1"), con("con2"));
        store
            .bulk_insert_ports(vec![
                b1.clone(),
                a2.clone(),
                a10.clone(),
                c0.clone(),
                c1.clone(),
                c2.clone(),
            ])
            .await
            .unwrap();
        for (holder, target) in [(&c0, &b1), (&c1, &a2), (&c2, &a10)] {
            store
                .set_link(
                    holder.id,
                    Some(PortLink {
                        partner: target.id,
                        status: ConnectionStatus::Connected,
                    }),
                )
                .await
                .unwrap();
        }

        let ctx = ServiceContext::new(store, Arc::new(AllowAll), TopologyConfig::default());
        let rows = TopologyQuery::new(ctx).console_connections().await.unwrap();
        let order: Vec<(String, String, String)> = rows
            .into_iter()
            .map(|r| (r.b.device, r.b.port, r.a.port))
            .collect();

        // Port names compare as text.
        assert_eq!(
            order,
            vec![
                ("cs-a".to_string(), "10".to_string(), "con2".to_string()),
                ("cs-a".to_string(), "2".to_string(), "con1".to_string()),
                ("cs-b".to_string(), "1".to_string(), "con0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_interface_neighbors() {
        let store = Arc::new(InMemoryObjectStore::new());
        let sw1 = store.insert_device(Device::new("sw1")).await.unwrap();
        let sw2 = store.insert_device(Device::new("sw2")).await.unwrap();
        let e1 = Port::new(sw1.id, PortKind::Interface, "eth1", PortAttributes::Plain);
        let e0 = Port::new(sw1.id, PortKind::Interface, "eth0", PortAttributes::Plain);
        let peer = Port::new(sw2.id, PortKind::Interface, "xe-0/0/1", PortAttributes::Plain);
        store
            .bulk_insert_ports(vec![e1.clone(), e0.clone(), peer.clone()])
            .await
            .unwrap();
        store
            .insert_interface_connection(InterfaceConnection::new(
                peer.id,
                e1.id,
                ConnectionStatus::Planned,
            ))
            .await
            .unwrap();

        let ctx = ServiceContext::new(store, Arc::new(AllowAll), TopologyConfig::default());
        let neighbors = TopologyQuery::new(ctx).interface_neighbors(sw1.id).await.unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].interface.name, "eth0");
        assert_eq!(neighbors[0].peer, None);
        assert_eq!(neighbors[1].interface.name, "eth1");
        assert_eq!(
            neighbors[1].peer.as_ref().map(|p| (p.device.as_str(), p.port.as_str())),
            Some(("sw2", "xe-0/0/1"))
        );
        assert_eq!(neighbors[1].status, Some(ConnectionStatus::Planned));
    }
}
