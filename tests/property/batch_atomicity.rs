// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for All-or-Nothing Port Batches
//!
//! The store is async; each case drives it with `tokio_test::block_on`.

use std::collections::HashSet;
use std::sync::Arc;

use cim_dcim::{
    Actor, AllowAll, DcimError, Device, InMemoryObjectStore, ObjectStore, PortAttributes,
    PortKind, TopologyConfig, TopologyServices,
};
use proptest::prelude::*;

/// Existing names and a proposed batch drawn from a small shared pool, so
/// collisions are common
fn names() -> impl Strategy<Value = (Vec<String>, Vec<String>)> {
    let pool = prop::sample::select(vec!["eth0", "eth1", "eth2", "eth3", "eth4", "eth5"]);
    (
        prop::collection::hash_set(pool.clone(), 0..4),
        prop::collection::vec(pool, 1..6),
    )
        .prop_map(|(existing, proposed)| {
            (
                existing.into_iter().map(String::from).collect(),
                proposed.into_iter().map(String::from).collect(),
            )
        })
}

proptest! {
    /// Property: a batch either creates every name or none of them, and a
    /// rejection lists exactly the colliding entries
    #[test]
    fn prop_batch_is_all_or_nothing((existing, proposed) in names()) {
        tokio_test::block_on(async {
            let store = Arc::new(InMemoryObjectStore::new());
            let services = TopologyServices::new(store.clone(), Arc::new(AllowAll), TopologyConfig::default());
            let actor = Actor::new("operator");
            let device = store.insert_device(Device::new("sw1")).await.unwrap();

            if !existing.is_empty() {
                services
                    .ports
                    .create_ports(&actor, device.id, PortKind::Interface, existing.clone(), PortAttributes::Plain)
                    .await
                    .unwrap();
            }

            let result = services
                .ports
                .create_ports(&actor, device.id, PortKind::Interface, proposed.clone(), PortAttributes::Plain)
                .await;

            let mut seen: HashSet<&String> = existing.iter().collect();
            let expected_conflicts = proposed.iter().filter(|name| !seen.insert(*name)).count();
            let stored = store.list_ports(device.id, None).await.unwrap().len();

            match result {
                Ok(outcome) => {
                    prop_assert_eq!(expected_conflicts, 0);
                    prop_assert_eq!(outcome.value.len(), proposed.len());
                    prop_assert_eq!(stored, existing.len() + proposed.len());
                }
                Err(DcimError::DuplicateName { conflicts }) => {
                    prop_assert_eq!(conflicts.len(), expected_conflicts);
                    prop_assert_eq!(stored, existing.len());
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
