// Copyright (c) 2025 - Cowboy AI, Inc.
//! Datacenter topology core for the Composable Information Machine
//!
//! Tracks which console, power and data ports on which devices are wired to
//! which other ports, and provisions batches of ports from compact range
//! patterns (`ge-0/0/[0-47]`).
//!
//! Storage, authorization and presentation are injected:
//!
//! - [`store::ObjectStore`] persists entities and enforces constraints
//! - [`auth::AuthorizationGate`] decides whether a mutation may proceed
//! - callers render the [`Outcome`] message and consume its events

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod outcome;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use auth::{Actor, AllowAll, AuthorizationGate, Operation, PermissionSet};
pub use config::{ConfigError, TopologyConfig};
pub use domain::{
    expand_pattern, ConnectionStatus, Device, DeviceId, InterfaceConnection, NamePattern, Port,
    PortAttributes, PortId, PortKind,
};
pub use errors::{DcimError, DcimResult};
pub use events::{TopologyChange, TopologyEvent};
pub use outcome::{Confirm, Confirmation, ConfirmationDescriptor, Outcome};
pub use service::TopologyServices;
pub use store::{InMemoryObjectStore, ObjectStore};
