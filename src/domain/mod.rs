// Copyright (c) 2025 - Cowboy AI, Inc.
//! DCIM Topology Domain Models
//!
//! Devices, their typed ports, and the connections between ports, plus the two
//! pure helpers the services build on:
//!
//! - [`NamePattern`] - bracketed numeric-range templates (`ge-0/0/[0-47]`)
//! - [`base_name`] - device family grouping by name suffix
//!
//! # Entity Relationships
//!
//! ```text
//! Device 1──* Port
//! ConsolePort ─link─▶ ConsoleServerPort
//! PowerPort   ─link─▶ PowerOutlet
//! Interface *──1 InterfaceConnection 1──* Interface   (exactly two endpoints)
//! ```

pub mod connection;
pub mod device;
pub mod pattern;
pub mod port;
pub mod related;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use connection::{ConnectionField, ConnectionId, InterfaceConnection};
pub use device::{Device, DeviceId};
pub use pattern::{expand_pattern, NamePattern, PatternError, DEFAULT_EXPANSION_LIMIT};
pub use port::{
    ConnectionStatus, FormFactor, InterfaceAttributes, Port, PortAttributes, PortId, PortKind,
    PortLink, PortRole,
};
pub use related::{base_name, is_family_member};

/// Every kind of entity the object store persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Device,
    ConsolePort,
    ConsoleServerPort,
    PowerPort,
    PowerOutlet,
    Interface,
    InterfaceConnection,
    /// A port looked up by id alone, kind unknown
    Port,
}

impl EntityKind {
    /// Permission-style codename (`consoleport`, `interfaceconnection`)
    pub fn codename(&self) -> &'static str {
        match self {
            EntityKind::Device => "device",
            EntityKind::ConsolePort => "consoleport",
            EntityKind::ConsoleServerPort => "consoleserverport",
            EntityKind::PowerPort => "powerport",
            EntityKind::PowerOutlet => "poweroutlet",
            EntityKind::Interface => "interface",
            EntityKind::InterfaceConnection => "interfaceconnection",
            EntityKind::Port => "port",
        }
    }
}

impl From<PortKind> for EntityKind {
    fn from(kind: PortKind) -> Self {
        match kind {
            PortKind::ConsolePort => EntityKind::ConsolePort,
            PortKind::ConsoleServerPort => EntityKind::ConsoleServerPort,
            PortKind::PowerPort => EntityKind::PowerPort,
            PortKind::PowerOutlet => EntityKind::PowerOutlet,
            PortKind::Interface => EntityKind::Interface,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Device => f.write_str("device"),
            EntityKind::InterfaceConnection => f.write_str("interface connection"),
            EntityKind::Port => f.write_str("port"),
            EntityKind::ConsolePort => f.write_str(PortKind::ConsolePort.label()),
            EntityKind::ConsoleServerPort => f.write_str(PortKind::ConsoleServerPort.label()),
            EntityKind::PowerPort => f.write_str(PortKind::PowerPort.label()),
            EntityKind::PowerOutlet => f.write_str(PortKind::PowerOutlet.label()),
            EntityKind::Interface => f.write_str(PortKind::Interface.label()),
        }
    }
}
