// Copyright (c) 2025 - Cowboy AI, Inc.
//! Port Entities
//!
//! Five port kinds exist. Console and power ports form asymmetric pairs where
//! one side (the *holder*) stores a link to the other (the *target*):
//!
//! ```text
//! ConsolePort ──link──▶ ConsoleServerPort
//! PowerPort   ──link──▶ PowerOutlet
//! Interface   ◀──InterfaceConnection──▶ Interface
//! ```
//!
//! The target never stores a back-reference; its "connected to" view is
//! computed by finding the holder whose link points at it.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::device::DeviceId;

/// Unique identifier for a port of any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(Uuid);

impl PortId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Port taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    ConsolePort,
    ConsoleServerPort,
    PowerPort,
    PowerOutlet,
    Interface,
}

/// Which side of a connection a port kind plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    /// Stores the point-to-point link
    Holder,
    /// Referenced by a holder's link
    Target,
    /// Joined through a standalone connection entity
    Symmetric,
}

impl PortKind {
    pub const ALL: [PortKind; 5] = [
        PortKind::ConsolePort,
        PortKind::ConsoleServerPort,
        PortKind::PowerPort,
        PortKind::PowerOutlet,
        PortKind::Interface,
    ];

    /// Kinds joined by a point-to-point link
    pub const LINKED: [PortKind; 4] = [
        PortKind::ConsolePort,
        PortKind::ConsoleServerPort,
        PortKind::PowerPort,
        PortKind::PowerOutlet,
    ];

    pub fn role(&self) -> PortRole {
        match self {
            PortKind::ConsolePort | PortKind::PowerPort => PortRole::Holder,
            PortKind::ConsoleServerPort | PortKind::PowerOutlet => PortRole::Target,
            PortKind::Interface => PortRole::Symmetric,
        }
    }

    /// The kind this port pairs with in a point-to-point connection
    pub fn complement(&self) -> Option<PortKind> {
        match self {
            PortKind::ConsolePort => Some(PortKind::ConsoleServerPort),
            PortKind::ConsoleServerPort => Some(PortKind::ConsolePort),
            PortKind::PowerPort => Some(PortKind::PowerOutlet),
            PortKind::PowerOutlet => Some(PortKind::PowerPort),
            PortKind::Interface => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PortKind::ConsolePort => "console port",
            PortKind::ConsoleServerPort => "console server port",
            PortKind::PowerPort => "power port",
            PortKind::PowerOutlet => "power outlet",
            PortKind::Interface => "interface",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Connection status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Planned,
    #[default]
    Connected,
}

impl ConnectionStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "planned" => Some(ConnectionStatus::Planned),
            "connected" => Some(ConnectionStatus::Connected),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Planned => f.write_str("planned"),
            ConnectionStatus::Connected => f.write_str("connected"),
        }
    }
}

/// Physical interface form factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    Virtual,
    Lag,
    #[serde(rename = "100base_tx")]
    Base100Tx,
    #[default]
    #[serde(rename = "1000base_t")]
    Base1000T,
    Sfp,
    #[serde(rename = "10gbase_t")]
    Base10GT,
    SfpPlus,
    Sfp28,
    QsfpPlus,
    Qsfp28,
    Other,
}

/// Interface-only attributes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterfaceAttributes {
    #[serde(default)]
    pub form_factor: FormFactor,
    #[serde(default)]
    pub mgmt_only: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Kind-specific attributes shared by every port in a batch
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PortAttributes {
    #[default]
    Plain,
    Interface(InterfaceAttributes),
}

impl PortAttributes {
    pub fn interface(form_factor: FormFactor, mgmt_only: bool) -> Self {
        PortAttributes::Interface(InterfaceAttributes {
            form_factor,
            mgmt_only,
            description: String::new(),
        })
    }

    /// Whether these attributes may be carried by a port of `kind`
    pub fn fits(&self, kind: PortKind) -> bool {
        matches!(
            (self, kind),
            (PortAttributes::Interface(_), PortKind::Interface)
                | (PortAttributes::Plain, PortKind::ConsolePort)
                | (PortAttributes::Plain, PortKind::ConsoleServerPort)
                | (PortAttributes::Plain, PortKind::PowerPort)
                | (PortAttributes::Plain, PortKind::PowerOutlet)
        )
    }

    /// Fill in defaults for `kind` (plain interfaces get default interface attributes)
    pub fn normalized_for(self, kind: PortKind) -> Self {
        match (self, kind) {
            (PortAttributes::Plain, PortKind::Interface) => {
                PortAttributes::Interface(InterfaceAttributes::default())
            }
            (attributes, _) => attributes,
        }
    }
}

/// A point-to-point link held by a console port or power port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortLink {
    pub partner: PortId,
    pub status: ConnectionStatus,
}

/// A named attachment point on a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: PortId,
    pub device_id: DeviceId,
    pub kind: PortKind,
    pub name: String,
    #[serde(default)]
    pub attributes: PortAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<PortLink>,
}

impl Port {
    pub fn new(
        device_id: DeviceId,
        kind: PortKind,
        name: impl Into<String>,
        attributes: PortAttributes,
    ) -> Self {
        Self {
            id: PortId::new(),
            device_id,
            kind,
            name: name.into(),
            attributes: attributes.normalized_for(kind),
            link: None,
        }
    }

    pub fn is_mgmt_only(&self) -> bool {
        matches!(
            &self.attributes,
            PortAttributes::Interface(InterfaceAttributes { mgmt_only: true, .. })
        )
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
