// Copyright (c) 2025 - Cowboy AI, Inc.
//! Authorization Gate
//!
//! The core never manages users or permissions; it only asks a gate whether an
//! actor may perform an operation on an entity kind, before any other
//! validation runs.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::warn;

use crate::domain::EntityKind;
use crate::errors::{DcimError, DcimResult};

/// The identity on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutation class being authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Change,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("add"),
            Operation::Change => f.write_str("change"),
            Operation::Delete => f.write_str("delete"),
        }
    }
}

/// Boolean allow/deny per (actor, operation, entity kind)
pub trait AuthorizationGate: Send + Sync {
    fn is_allowed(&self, actor: &Actor, operation: Operation, entity: EntityKind) -> bool;
}

/// Refuse with [`DcimError::Authorization`] unless the gate allows the operation
pub fn authorize(
    gate: &dyn AuthorizationGate,
    actor: &Actor,
    operation: Operation,
    entity: EntityKind,
) -> DcimResult<()> {
    if gate.is_allowed(actor, operation, entity) {
        return Ok(());
    }

    warn!(
        actor = %actor,
        permission = %permission_codename(operation, entity),
        "Operation denied"
    );
    Err(DcimError::Authorization {
        actor: actor.to_string(),
        operation,
        entity,
    })
}

/// `dcim.<operation>_<entity>` codename, e.g. `dcim.change_consoleport`
pub fn permission_codename(operation: Operation, entity: EntityKind) -> String {
    format!("dcim.{}_{}", operation, entity.codename())
}

/// Gate that allows everything (trusted callers, tooling)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationGate for AllowAll {
    fn is_allowed(&self, _actor: &Actor, _operation: Operation, _entity: EntityKind) -> bool {
        true
    }
}

/// Explicit grants per actor
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    grants: HashMap<Actor, HashSet<(Operation, EntityKind)>>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, actor: &Actor, operation: Operation, entity: EntityKind) -> Self {
        self.grants
            .entry(actor.clone())
            .or_default()
            .insert((operation, entity));
        self
    }

    pub fn grant_all(mut self, actor: &Actor, entity: EntityKind) -> Self {
        for operation in [Operation::Add, Operation::Change, Operation::Delete] {
            self = self.grant(actor, operation, entity);
        }
        self
    }
}

impl AuthorizationGate for PermissionSet {
    fn is_allowed(&self, actor: &Actor, operation: Operation, entity: EntityKind) -> bool {
        self.grants
            .get(actor)
            .is_some_and(|granted| granted.contains(&(operation, entity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set() {
        let alice = Actor::new("alice");
        let bob = Actor::new("bob");
        let gate = PermissionSet::new().grant(&alice, Operation::Change, EntityKind::ConsolePort);

        assert!(gate.is_allowed(&alice, Operation::Change, EntityKind::ConsolePort));
        assert!(!gate.is_allowed(&alice, Operation::Delete, EntityKind::ConsolePort));
        assert!(!gate.is_allowed(&bob, Operation::Change, EntityKind::ConsolePort));
    }

    #[test]
    fn test_authorize_maps_denial() {
        let gate = PermissionSet::new();
        let result = authorize(&gate, &Actor::new("bob"), Operation::Add, EntityKind::Interface);
        assert!(matches!(result, Err(DcimError::Authorization { .. })));
        assert!(authorize(&AllowAll, &Actor::new("bob"), Operation::Add, EntityKind::Interface).is_ok());
    }

    #[test]
    fn test_codename() {
        assert_eq!(
            permission_codename(Operation::Change, EntityKind::ConsolePort),
            "dcim.change_consoleport"
        );
    }
}
