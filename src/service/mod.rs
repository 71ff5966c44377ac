// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer for Topology Management
//!
//! Application services that validate requests, consult the authorization
//! gate, and apply changes through the injected [`ObjectStore`].
//!
//! # Architecture
//!
//! ```text
//! Client Request
//!     ↓
//! AuthorizationGate (mutations only, always first)
//!     ↓
//! Service (this module)
//!     ├─ PortRegistry        create / update / delete ports
//!     ├─ BulkProvisioner     pattern → ports on many devices
//!     ├─ ConnectionManager   console, power and interface links, bulk import
//!     ├─ TopologyQuery       sorted read-only listings
//!     └─ DeviceService       detail view, related devices, delete
//!     ↓
//! ObjectStore (atomic calls, constraint enforcement)
//! ```
//!
//! Every mutation returns an [`Outcome`](crate::Outcome) carrying the events
//! it committed. Events from one call share a correlation id.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_dcim::{TopologyServices, InMemoryObjectStore, AllowAll, TopologyConfig};
//!
//! let services = TopologyServices::new(
//!     Arc::new(InMemoryObjectStore::new()),
//!     Arc::new(AllowAll),
//!     TopologyConfig::default(),
//! );
//! let report = services
//!     .provisioner
//!     .provision(&actor, &[sw1, sw2], "ge-0/0/[0-47]", PortKind::Interface, attrs)
//!     .await?;
//! println!("{}", report.message);
//! ```

pub mod connections;
pub mod devices;
pub mod port_registry;
pub mod provisioner;
pub mod topology;

use std::sync::Arc;

use crate::auth::{authorize, Actor, AuthorizationGate, Operation};
use crate::config::TopologyConfig;
use crate::domain::{Device, DeviceId, EntityKind, Port, PortId, PortKind};
use crate::errors::{DcimError, DcimResult};
use crate::store::ObjectStore;

pub use connections::{ConnectionImport, ConnectionKind, ConnectionManager, ImportReport, PortRef};
pub use devices::{DeviceService, DeviceView, PortView};
pub use port_registry::{PortRegistry, PortUpdate};
pub use provisioner::{BulkProvisioner, ProvisionReport};
pub use topology::{ConnectionRow, Endpoint, InterfaceNeighbor, TopologyQuery};

/// Collaborators shared by every service
#[derive(Clone)]
pub struct ServiceContext {
    pub store: Arc<dyn ObjectStore>,
    pub gate: Arc<dyn AuthorizationGate>,
    pub config: TopologyConfig,
}

impl ServiceContext {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        gate: Arc<dyn AuthorizationGate>,
        config: TopologyConfig,
    ) -> Self {
        Self {
            store,
            gate,
            config,
        }
    }

    pub(crate) fn authorize(
        &self,
        actor: &Actor,
        operation: Operation,
        entity: EntityKind,
    ) -> DcimResult<()> {
        authorize(self.gate.as_ref(), actor, operation, entity)
    }

    /// Refuse unless `operation` is allowed on at least one of `kinds`
    ///
    /// Runs before a port is loaded by id alone, so a denied actor never
    /// learns whether the id exists. The loaded port's own kind is checked
    /// with [`ServiceContext::authorize`] afterwards.
    pub(crate) fn authorize_any(
        &self,
        actor: &Actor,
        operation: Operation,
        kinds: &[PortKind],
    ) -> DcimResult<()> {
        let allowed = kinds
            .iter()
            .any(|kind| self.gate.is_allowed(actor, operation, (*kind).into()));
        if allowed {
            return Ok(());
        }
        authorize(self.gate.as_ref(), actor, operation, EntityKind::Port)
    }

    pub(crate) async fn require_device(&self, id: DeviceId) -> DcimResult<Device> {
        self.store
            .get_device(id)
            .await?
            .ok_or(DcimError::NotFound {
                entity: EntityKind::Device,
                id: id.as_uuid(),
            })
    }

    pub(crate) async fn require_port(&self, id: PortId) -> DcimResult<Port> {
        self.store.get_port(id).await?.ok_or(DcimError::NotFound {
            entity: EntityKind::Port,
            id: id.as_uuid(),
        })
    }

    /// "{device} {port}" for messages and confirmation descriptors
    pub(crate) async fn port_label(&self, port: &Port) -> DcimResult<String> {
        let device = self.require_device(port.device_id).await?;
        Ok(format!("{} {}", device.name, port.name))
    }
}

/// All topology services wired to one store, gate and configuration
#[derive(Clone)]
pub struct TopologyServices {
    pub ports: PortRegistry,
    pub provisioner: BulkProvisioner,
    pub connections: ConnectionManager,
    pub topology: TopologyQuery,
    pub devices: DeviceService,
}

impl TopologyServices {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        gate: Arc<dyn AuthorizationGate>,
        config: TopologyConfig,
    ) -> Self {
        Self::from_context(ServiceContext::new(store, gate, config))
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        let ports = PortRegistry::new(ctx.clone());
        Self {
            provisioner: BulkProvisioner::new(ctx.clone(), ports.clone()),
            connections: ConnectionManager::new(ctx.clone()),
            topology: TopologyQuery::new(ctx.clone()),
            devices: DeviceService::new(ctx),
            ports,
        }
    }
}

/// Capitalize the first letter of a kind label ("console port" → "Console port")
pub(crate) fn sentence_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
