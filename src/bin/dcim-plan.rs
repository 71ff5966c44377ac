// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Plan Replay
//!
//! Reads a JSON cabling plan, applies it to an in-memory topology and prints
//! the console, power and interface connection listings. The plan's
//! connections are imported as one batch: if any row is refused, every
//! refusal is logged and none of them is applied.
//!
//! Run with: cargo run --bin dcim-plan -- plan.json
//!
//! ```json
//! {
//!   "devices": [{ "name": "sw1" }, { "name": "cs1" }],
//!   "provision": [
//!     { "devices": ["sw1"], "pattern": "eth[0-3]", "kind": "interface" },
//!     { "devices": ["sw1"], "pattern": "con0", "kind": "console_port" },
//!     { "devices": ["cs1"], "pattern": "port[1-8]", "kind": "console_server_port" }
//!   ],
//!   "connections": [
//!     { "kind": "console", "a": { "device": "sw1", "port": "con0" },
//!       "b": { "device": "cs1", "port": "port1" } }
//!   ]
//! }
//! ```
//!
//! Configuration comes from `DCIM_*` environment variables (see `TopologyConfig`).

use anyhow::{anyhow, Context, Result};
use cim_dcim::service::{ConnectionImport, ConnectionRow};
use cim_dcim::{
    Actor, AllowAll, DcimError, Device, DeviceId, InMemoryObjectStore, PortAttributes, PortKind,
    TopologyConfig, TopologyServices,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Deserialize)]
struct Plan {
    #[serde(default)]
    devices: Vec<PlannedDevice>,
    #[serde(default)]
    provision: Vec<ProvisionStep>,
    #[serde(default)]
    connections: Vec<ConnectionImport>,
}

#[derive(Debug, Deserialize)]
struct PlannedDevice {
    name: String,
    #[serde(default)]
    site: Option<String>,
    #[serde(default)]
    rack: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProvisionStep {
    devices: Vec<String>,
    pattern: String,
    kind: PortKind,
    #[serde(default)]
    attributes: PortAttributes,
}

struct Replay {
    services: TopologyServices,
    actor: Actor,
    devices: HashMap<String, DeviceId>,
}

impl Replay {
    fn device(&self, name: &str) -> Result<DeviceId> {
        self.devices
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("plan references unknown device {name}"))
    }

    async fn apply(&mut self, plan: Plan) -> Result<()> {
        for planned in plan.devices {
            let mut device = Device::new(planned.name);
            device.site = planned.site;
            device.rack = planned.rack;
            let outcome = self.services.devices.add_device(&self.actor, device).await?;
            self.devices
                .insert(outcome.value.name.clone(), outcome.value.id);
        }

        for step in plan.provision {
            let targets = step
                .devices
                .iter()
                .map(|name| self.device(name))
                .collect::<Result<Vec<_>>>()?;
            let outcome = self
                .services
                .provisioner
                .provision(&self.actor, &targets, &step.pattern, step.kind, step.attributes)
                .await
                .with_context(|| format!("provisioning {}", step.pattern))?;
            info!("{}", outcome.message);
        }

        if !plan.connections.is_empty() {
            match self
                .services
                .connections
                .import_connections(&self.actor, plan.connections)
                .await
            {
                Ok(outcome) => info!("{}", outcome.message),
                Err(DcimError::ImportRejected { errors }) => {
                    for rejected in &errors {
                        error!("{}", rejected);
                    }
                    return Err(anyhow!("{} connection(s) rejected", errors.len()));
                }
                Err(err) => return Err(err).context("importing connections"),
            }
        }
        Ok(())
    }
}

fn print_listing(title: &str, rows: &[ConnectionRow]) {
    println!("{title} ({})", rows.len());
    for row in rows {
        println!(
            "  {} {} -> {} {} [{}]",
            row.a.device, row.a.port, row.b.device, row.b.port, row.status
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: dcim-plan <plan.json>")?;
    let config = TopologyConfig::from_env().context("Invalid DCIM configuration")?;
    debug!(?config, "Configuration loaded");

    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let plan: Plan = serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    info!(
        devices = plan.devices.len(),
        steps = plan.provision.len(),
        connections = plan.connections.len(),
        "Applying plan {}",
        path
    );

    let mut replay = Replay {
        services: TopologyServices::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(AllowAll),
            config,
        ),
        actor: Actor::new("dcim-plan"),
        devices: HashMap::new(),
    };
    replay.apply(plan).await?;

    let topology = &replay.services.topology;
    print_listing("Console connections", &topology.console_connections().await?);
    print_listing("Power connections", &topology.power_connections().await?);
    print_listing("Interface connections", &topology.interface_connections().await?);
    Ok(())
}
