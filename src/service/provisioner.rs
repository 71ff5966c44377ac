// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bulk Provisioner
//!
//! Expands a name pattern once and creates the resulting ports on one or
//! many devices. Across devices the batch is all-or-nothing: every
//! (device, name) pair is validated before anything is written, and the
//! ports for every device go to the store in a single call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{PortRegistry, ServiceContext};
use crate::auth::{Actor, Operation};
use crate::domain::{DeviceId, NamePattern, Port, PortAttributes, PortKind};
use crate::errors::{DcimError, DcimResult};
use crate::events::{TopologyChange, TopologyEvent};
use crate::outcome::Outcome;

use super::port_registry::checked_attributes;

/// Summary of a successful provisioning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub created_count: usize,
    pub device_count: usize,
    pub ports: Vec<Port>,
}

#[derive(Clone)]
pub struct BulkProvisioner {
    ctx: ServiceContext,
    registry: PortRegistry,
}

impl BulkProvisioner {
    pub fn new(ctx: ServiceContext, registry: PortRegistry) -> Self {
        Self { ctx, registry }
    }

    /// Create the ports named by `name_pattern` on every device in `devices`
    ///
    /// Duplicate device ids are provisioned once.
    ///
    /// # Errors
    ///
    /// - `Authorization` if the actor may not add ports of `kind`
    /// - `EmptySelection` if `devices` is empty
    /// - `Format` if the pattern is malformed or expands past the configured limit
    /// - `DuplicateName` with one entry per colliding (device, name) pair
    pub async fn provision(
        &self,
        actor: &Actor,
        devices: &[DeviceId],
        name_pattern: &str,
        kind: PortKind,
        attributes: PortAttributes,
    ) -> DcimResult<Outcome<ProvisionReport>> {
        self.ctx.authorize(actor, Operation::Add, kind.into())?;
        if devices.is_empty() {
            return Err(DcimError::EmptySelection("devices"));
        }

        let pattern = NamePattern::with_limit(name_pattern, self.ctx.config.max_pattern_expansion)?;
        let names = pattern.expand();
        debug!(
            pattern = %pattern,
            names = names.len(),
            devices = devices.len(),
            "Expanded provisioning pattern"
        );

        let mut targets: Vec<DeviceId> = Vec::with_capacity(devices.len());
        for id in devices {
            if !targets.contains(id) {
                targets.push(*id);
            }
        }

        if let [device] = targets.as_slice() {
            let outcome = self
                .registry
                .create_ports(actor, *device, kind, names, attributes)
                .await?;
            return Ok(outcome.map(|ports| ProvisionReport {
                created_count: ports.len(),
                device_count: 1,
                ports,
            }));
        }

        let attributes = checked_attributes(kind, attributes)?;
        let mut ports = Vec::with_capacity(targets.len() * names.len());
        for id in &targets {
            let device = self.ctx.require_device(*id).await?;
            ports.extend(
                names
                    .iter()
                    .map(|name| Port::new(device.id, kind, name.clone(), attributes.clone())),
            );
        }

        let created = match self.ctx.store.bulk_insert_ports(ports).await {
            Ok(created) => created,
            Err(err) => {
                let err = DcimError::from(err);
                if let DcimError::DuplicateName { conflicts } = &err {
                    warn!(
                        devices = targets.len(),
                        conflicts = conflicts.len(),
                        "Bulk provisioning rejected"
                    );
                }
                return Err(err);
            }
        };

        let correlation_id = Uuid::now_v7();
        let mut by_device: HashMap<DeviceId, Vec<&Port>> = HashMap::new();
        for port in &created {
            by_device.entry(port.device_id).or_default().push(port);
        }
        let events = targets
            .iter()
            .filter_map(|id| by_device.get(id).map(|ports| (id, ports)))
            .map(|(id, ports)| {
                TopologyEvent::new(
                    correlation_id,
                    TopologyChange::PortsCreated {
                        device_id: *id,
                        kind,
                        port_ids: ports.iter().map(|p| p.id).collect(),
                        names: ports.iter().map(|p| p.name.clone()).collect(),
                    },
                )
            })
            .collect();

        let message = format!(
            "Added {} {}s to {} devices",
            created.len(),
            kind,
            targets.len()
        );
        info!("{}", message);

        let report = ProvisionReport {
            created_count: created.len(),
            device_count: targets.len(),
            ports: created,
        };
        Ok(Outcome::new(report, message).with_events(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAll;
    use crate::config::TopologyConfig;
    use crate::domain::{Device, PatternError};
    use crate::store::{InMemoryObjectStore, ObjectStore};
    use std::sync::Arc;

    async fn setup(config: TopologyConfig) -> (BulkProvisioner, Arc<InMemoryObjectStore>) {
        let store = Arc::new(InMemoryObjectStore::new());
        let ctx = ServiceContext::new(store.clone(), Arc::new(AllowAll), config);
        let registry = PortRegistry::new(ctx.clone());
        (BulkProvisioner::new(ctx, registry), store)
    }

    #[tokio::test]
    async fn test_provision_many_devices() {
        let (provisioner, store) = setup(TopologyConfig::default()).await;
        let sw1 = store.insert_device(Device::new("sw1")).await.unwrap();
        let sw2 = store.insert_device(Device::new("sw2")).await.unwrap();

        let outcome = provisioner
            .provision(
                &Actor::new("alice"),
                &[sw1.id, sw2.id, sw1.id],
                "eth[0-3]",
                PortKind::Interface,
                PortAttributes::Plain,
            )
            .await
            .unwrap();

        assert_eq!(outcome.value.created_count, 8);
        assert_eq!(outcome.value.device_count, 2);
        assert_eq!(outcome.message, "Added 8 interfaces to 2 devices");
        assert_eq!(outcome.events.len(), 2);
        let correlation = outcome.events[0].correlation_id;
        assert!(outcome.events.iter().all(|e| e.correlation_id == correlation));
    }

    #[tokio::test]
    async fn test_single_device_uses_registry_message() {
        let (provisioner, store) = setup(TopologyConfig::default()).await;
        let sw1 = store.insert_device(Device::new("sw1")).await.unwrap();

        let outcome = provisioner
            .provision(
                &Actor::new("alice"),
                &[sw1.id],
                "con[1-2]",
                PortKind::ConsolePort,
                PortAttributes::Plain,
            )
            .await
            .unwrap();
        assert_eq!(outcome.message, "Added 2 console port(s) to sw1");
        assert_eq!(outcome.value.device_count, 1);
    }

    #[tokio::test]
    async fn test_empty_device_selection_is_rejected() {
        let (provisioner, _) = setup(TopologyConfig::default()).await;

        let err = provisioner
            .provision(
                &Actor::new("alice"),
                &[],
                "eth[0-3]",
                PortKind::Interface,
                PortAttributes::Plain,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DcimError::EmptySelection("devices")));
        assert_eq!(err.to_string(), "No devices selected");
    }

    #[tokio::test]
    async fn test_expansion_limit_is_a_format_error() {
        let config = TopologyConfig {
            max_pattern_expansion: 8,
            ..TopologyConfig::default()
        };
        let (provisioner, store) = setup(config).await;
        let sw1 = store.insert_device(Device::new("sw1")).await.unwrap();

        let err = provisioner
            .provision(
                &Actor::new("alice"),
                &[sw1.id],
                "eth[0-9]",
                PortKind::Interface,
                PortAttributes::Plain,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DcimError::Format(PatternError::TooManyNames { .. })
        ));
        assert!(store.list_ports(sw1.id, None).await.unwrap().is_empty());
    }
}
