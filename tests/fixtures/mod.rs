// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-dcim
//!
//! Builds a small datacenter on an in-memory store: two access switches, a
//! console server and a PDU. Device and port names are fixed so listings can
//! be compared literally.

#![allow(dead_code)]

use std::sync::Arc;

use cim_dcim::auth::{Operation, PermissionSet};
use cim_dcim::domain::EntityKind;
use cim_dcim::{
    Actor, AllowAll, AuthorizationGate, Device, DeviceId, InMemoryObjectStore, ObjectStore, Port,
    PortAttributes, PortKind, TopologyConfig, TopologyServices,
};

pub const OPERATOR: &str = "operator";
pub const VIEWER: &str = "viewer";

pub struct Lab {
    pub services: TopologyServices,
    pub store: Arc<InMemoryObjectStore>,
    pub actor: Actor,
}

impl Lab {
    /// Empty topology where every operation is allowed
    pub fn new() -> Self {
        Self::with_gate(Arc::new(AllowAll), TopologyConfig::default())
    }

    pub fn with_gate(gate: Arc<dyn AuthorizationGate>, config: TopologyConfig) -> Self {
        let store = Arc::new(InMemoryObjectStore::new());
        Self {
            services: TopologyServices::new(store.clone(), gate, config),
            store,
            actor: Actor::new(OPERATOR),
        }
    }

    pub async fn device(&self, name: &str) -> Device {
        self.services
            .devices
            .add_device(&self.actor, Device::new(name))
            .await
            .expect("fixture device")
            .value
    }

    /// Create ports named by `pattern` on one device
    pub async fn ports(&self, device: DeviceId, kind: PortKind, pattern: &str) -> Vec<Port> {
        self.services
            .provisioner
            .provision(&self.actor, &[device], pattern, kind, PortAttributes::Plain)
            .await
            .expect("fixture ports")
            .value
            .ports
    }

    pub async fn port_named(&self, device: DeviceId, kind: PortKind, name: &str) -> Port {
        self.store
            .list_ports(device, Some(kind))
            .await
            .expect("list ports")
            .into_iter()
            .find(|port| port.name == name)
            .expect("fixture port exists")
    }
}

/// The standard lab: sw1 and sw2 with eth[0-3] and con0 each, a console
/// server cs1 with port[1-4], and a PDU pdu1 with outlet[1-4]
pub struct StandardLab {
    pub lab: Lab,
    pub sw1: Device,
    pub sw2: Device,
    pub cs1: Device,
    pub pdu1: Device,
}

pub async fn standard_lab() -> StandardLab {
    let lab = Lab::new();
    let sw1 = lab.device("sw1").await;
    let sw2 = lab.device("sw2").await;
    let cs1 = lab.device("cs1").await;
    let pdu1 = lab.device("pdu1").await;

    for sw in [&sw1, &sw2] {
        lab.ports(sw.id, PortKind::Interface, "eth[0-3]").await;
        lab.ports(sw.id, PortKind::ConsolePort, "con0").await;
        lab.ports(sw.id, PortKind::PowerPort, "psu[0-1]").await;
    }
    lab.ports(cs1.id, PortKind::ConsoleServerPort, "port[1-4]").await;
    lab.ports(pdu1.id, PortKind::PowerOutlet, "outlet[1-4]").await;

    StandardLab {
        lab,
        sw1,
        sw2,
        cs1,
        pdu1,
    }
}

/// Gate granting the operator everything and the viewer nothing
pub fn operator_only_gate() -> Arc<PermissionSet> {
    let operator = Actor::new(OPERATOR);
    let mut gate = PermissionSet::new();
    for entity in [
        EntityKind::Device,
        EntityKind::ConsolePort,
        EntityKind::ConsoleServerPort,
        EntityKind::PowerPort,
        EntityKind::PowerOutlet,
        EntityKind::Interface,
        EntityKind::InterfaceConnection,
    ] {
        gate = gate.grant_all(&operator, entity);
    }
    Arc::new(gate.grant(&Actor::new(VIEWER), Operation::Change, EntityKind::Device))
}
