// Copyright (c) 2025 - Cowboy AI, Inc.
//! Integration tests for port provisioning
//!
//! Covers single- and multi-device batches, the all-or-nothing rule, and
//! authorization ordering.

mod fixtures;

use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_case::test_case;

use cim_dcim::domain::{FormFactor, PatternError};
use cim_dcim::errors::ConflictSource;
use cim_dcim::{
    Actor, DcimError, ObjectStore, PortAttributes, PortKind, TopologyChange, TopologyConfig,
};
use fixtures::{operator_only_gate, Lab, VIEWER};

#[tokio::test]
async fn test_provision_expands_pattern_in_order() {
    let lab = Lab::new();
    let sw = lab.device("switch-12").await;

    let outcome = lab
        .services
        .provisioner
        .provision(
            &lab.actor,
            &[sw.id],
            "ge-0/0/[0-3]",
            PortKind::Interface,
            PortAttributes::interface(FormFactor::SfpPlus, false),
        )
        .await
        .unwrap();

    let names: Vec<&str> = outcome.value.ports.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ge-0/0/0", "ge-0/0/1", "ge-0/0/2", "ge-0/0/3"]);
    assert_eq!(outcome.message, "Added 4 interface(s) to switch-12");
    assert_eq!(outcome.value.created_count, 4);
}

#[tokio::test]
async fn test_existing_name_rejects_whole_batch() {
    let lab = Lab::new();
    let sw = lab.device("sw1").await;
    lab.ports(sw.id, PortKind::Interface, "eth0").await;

    let err = lab
        .services
        .ports
        .create_ports(
            &lab.actor,
            sw.id,
            PortKind::Interface,
            vec!["eth0".to_string(), "eth1".to_string()],
            PortAttributes::Plain,
        )
        .await
        .unwrap_err();

    assert_eq!(err.messages(), vec!["Duplicate interface eth0 found for device sw1"]);
    let remaining = lab.store.list_ports(sw.id, Some(PortKind::Interface)).await.unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn test_multi_device_collision_rejects_every_device() {
    let lab = Lab::new();
    let sw1 = lab.device("sw1").await;
    let sw2 = lab.device("sw2").await;
    let sw3 = lab.device("sw3").await;
    lab.ports(sw2.id, PortKind::Interface, "eth[2-3]").await;

    let err = lab
        .services
        .provisioner
        .provision(
            &lab.actor,
            &[sw1.id, sw2.id, sw3.id],
            "eth[0-3]",
            PortKind::Interface,
            PortAttributes::Plain,
        )
        .await
        .unwrap_err();

    match &err {
        DcimError::DuplicateName { conflicts } => {
            let pairs: Vec<(&str, &str)> = conflicts
                .iter()
                .map(|c| (c.device_name.as_str(), c.name.as_str()))
                .collect();
            assert_eq!(pairs, vec![("sw2", "eth2"), ("sw2", "eth3")]);
            assert!(conflicts.iter().all(|c| c.source == ConflictSource::Existing));
        }
        other => panic!("expected duplicate names, got {other:?}"),
    }

    for device in [sw1.id, sw3.id] {
        assert!(lab.store.list_ports(device, None).await.unwrap().is_empty());
    }
    assert_eq!(lab.store.list_ports(sw2.id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_multi_device_success_reports_counts_and_events() {
    let lab = Lab::new();
    let a = lab.device("leaf1").await;
    let b = lab.device("leaf2").await;

    let outcome = lab
        .services
        .provisioner
        .provision(
            &lab.actor,
            &[a.id, b.id],
            "xe-0/[0-1]/[0-2]",
            PortKind::Interface,
            PortAttributes::Plain,
        )
        .await
        .unwrap();

    assert_eq!(outcome.message, "Added 12 interfaces to 2 devices");
    assert_eq!(outcome.value.device_count, 2);
    let per_device: Vec<usize> = outcome
        .events
        .iter()
        .map(|event| match &event.change {
            TopologyChange::PortsCreated { names, .. } => names.len(),
            other => panic!("unexpected change {other:?}"),
        })
        .collect();
    assert_eq!(per_device, vec![6, 6]);
}

#[test_case("eth[3-1]" ; "descending range")]
#[test_case("eth[a-b]" ; "non numeric bounds")]
#[test_case("eth[0-3"  ; "unclosed bracket")]
#[test_case("eth]0["   ; "stray brackets")]
#[test_case(""         ; "empty template")]
#[tokio::test]
async fn test_malformed_pattern_is_rejected_before_store(pattern: &str) {
    let lab = Lab::new();
    let sw = lab.device("sw1").await;

    let err = lab
        .services
        .provisioner
        .provision(&lab.actor, &[sw.id], pattern, PortKind::Interface, PortAttributes::Plain)
        .await
        .unwrap_err();

    assert!(matches!(err, DcimError::Format(_)), "got {err:?}");
    assert!(lab.store.list_ports(sw.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expansion_limit_from_config() {
    let config = TopologyConfig {
        max_pattern_expansion: 100,
        ..TopologyConfig::default()
    };
    let lab = Lab::with_gate(Arc::new(cim_dcim::AllowAll), config);
    let sw = lab.device("sw1").await;

    let err = lab
        .services
        .provisioner
        .provision(
            &lab.actor,
            &[sw.id],
            "eth[0-9]/[0-10]",
            PortKind::Interface,
            PortAttributes::Plain,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DcimError::Format(PatternError::TooManyNames { count: 110, limit: 100 })
    ));
}

#[tokio::test]
async fn test_unauthorized_provisioning_is_refused_first() {
    let lab = Lab::with_gate(operator_only_gate(), TopologyConfig::default());
    let sw = lab.device("sw1").await;

    // Even a malformed pattern reports the authorization failure.
    let err = lab
        .services
        .provisioner
        .provision(
            &Actor::new(VIEWER),
            &[sw.id],
            "eth[9-0]",
            PortKind::Interface,
            PortAttributes::Plain,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "viewer is not permitted to add interface");
}
