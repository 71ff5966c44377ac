// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Events
//!
//! Every committed mutation is reported as one or more immutable
//! [`TopologyEvent`]s carried in the operation's [`Outcome`](crate::Outcome).
//! Projections (audit trails, NetBox sync) consume them; the core itself never
//! replays them.
//!
//! # Correlation
//!
//! ```text
//! provision(sw1, sw2, "eth[0-3]")
//!   correlation_id: req-1
//!   ├─ PortsCreated { device: sw1, names: eth0..eth3 }
//!   └─ PortsCreated { device: sw2, names: eth0..eth3 }
//! ```

pub mod topology;

pub use topology::{TopologyChange, TopologyEvent, EVENT_VERSION};
