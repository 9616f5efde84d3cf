//! Integration tests for the one-shot startup sequence.
//!
//! # Purpose
//!
//! `bring_up` runs AT init → provisioning → LTE attach → resolve against the
//! simulated modem.  These tests verify:
//!
//! - The order of modem calls and that PSM and eDRX are requested off.
//! - Provisioning always leaves exactly one CA chain under the tag, deleting
//!   any earlier one first.
//! - Each failing step stops the sequence and surfaces as the matching
//!   `StartupError` variant.
//! - DNS with no IPv4 result is `NotFound`; the first of several results is
//!   used.

use std::io;
use std::net::Ipv4Addr;

use cellfetch_client::application::attach::AttachError;
use cellfetch_client::application::provision::ProvisionError;
use cellfetch_client::application::resolve::ResolveError;
use cellfetch_client::application::startup::{bring_up, StartupError, StartupPlan};
use cellfetch_client::infrastructure::modem::mock::{
    LinkStep, ModemScript, SimulatedModem, StoreOp,
};
use cellfetch_core::{CredentialType, Errno, SecurityTag, ServerAddress};

const TAG: SecurityTag = SecurityTag(42);
const ROOT_CA: &[u8] = b"-----BEGIN CERTIFICATE-----\nroot\n-----END CERTIFICATE-----\n";

fn plan() -> StartupPlan {
    StartupPlan {
        server_host: "device-api.example".to_string(),
        server_port: 42512,
        security_tag: TAG,
        root_certificate: ROOT_CA.to_vec(),
    }
}

fn resolving_script() -> ModemScript {
    ModemScript {
        addresses: vec![Ipv4Addr::new(139, 162, 251, 115)],
        ..ModemScript::default()
    }
}

async fn run(modem: &SimulatedModem) -> Result<ServerAddress, StartupError> {
    bring_up(modem, modem, modem, &plan()).await
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bring_up_runs_steps_in_order_and_returns_first_address() {
    // Arrange
    let modem = SimulatedModem::new(ModemScript {
        addresses: vec![Ipv4Addr::new(139, 162, 251, 115), Ipv4Addr::new(10, 0, 0, 9)],
        ..ModemScript::default()
    });

    // Act
    let server = run(&modem).await.unwrap();

    // Assert – resolved address
    assert_eq!(server, ServerAddress::new(Ipv4Addr::new(139, 162, 251, 115), 42512));

    // Assert – link calls in order, power saving requested off
    let log = modem.log();
    assert_eq!(
        log.link_calls,
        vec![
            LinkStep::AtCommands,
            LinkStep::AtNotifications,
            LinkStep::Connect,
            LinkStep::Psm,
            LinkStep::Edrx,
        ]
    );
    assert_eq!(log.psm_requests, vec![false]);
    assert_eq!(log.edrx_requests, vec![false]);
    assert_eq!(log.lookups, vec!["device-api.example".to_string()]);
}

#[tokio::test]
async fn test_certificate_is_provisioned_before_lte_attach() {
    let modem = SimulatedModem::new(ModemScript {
        link_failure: Some((LinkStep::Connect, Errno::EIO)),
        ..resolving_script()
    });

    let result = run(&modem).await;

    assert!(matches!(result, Err(StartupError::Attach(AttachError::Connect(_)))));
    assert_eq!(
        modem.credentials().get(&(TAG, CredentialType::CaChain)),
        Some(&ROOT_CA.to_vec()),
        "credential must already be written when the radio comes up"
    );
}

// ── Provisioning ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fresh_store_gets_single_ca_chain() {
    // Arrange
    let modem = SimulatedModem::new(resolving_script());

    // Act
    run(&modem).await.unwrap();

    // Assert
    let ops: Vec<StoreOp> = modem.log().store_calls.iter().map(|(op, _, _)| *op).collect();
    assert_eq!(ops, vec![StoreOp::Exists, StoreOp::Write]);
    assert_eq!(modem.credentials().len(), 1);
}

#[tokio::test]
async fn test_existing_credential_is_deleted_before_write() {
    // Arrange – a CA chain left over from an earlier boot
    let modem = SimulatedModem::new(resolving_script()).with_credential(
        TAG,
        CredentialType::CaChain,
        b"stale root",
    );

    // Act
    run(&modem).await.unwrap();

    // Assert
    let ops: Vec<StoreOp> = modem.log().store_calls.iter().map(|(op, _, _)| *op).collect();
    assert_eq!(ops, vec![StoreOp::Exists, StoreOp::Delete, StoreOp::Write]);
    let credentials = modem.credentials();
    assert_eq!(credentials.len(), 1);
    assert_eq!(
        credentials.get(&(TAG, CredentialType::CaChain)),
        Some(&ROOT_CA.to_vec())
    );
}

#[tokio::test]
async fn test_repeated_boots_never_accumulate_credentials() {
    let modem = SimulatedModem::new(resolving_script());

    for _ in 0..3 {
        run(&modem).await.unwrap();
        let ca_chains = modem
            .credentials()
            .keys()
            .filter(|(tag, kind)| *tag == TAG && *kind == CredentialType::CaChain)
            .count();
        assert_eq!(ca_chains, 1);
    }
}

#[tokio::test]
async fn test_failed_delete_is_fatal_and_skips_attach() {
    // Arrange
    let modem = SimulatedModem::new(ModemScript {
        store_failure: Some((StoreOp::Delete, Errno::EIO)),
        ..resolving_script()
    })
    .with_credential(TAG, CredentialType::CaChain, b"stale root");

    // Act
    let result = run(&modem).await;

    // Assert
    assert!(matches!(
        result,
        Err(StartupError::Provision(ProvisionError::Delete { .. }))
    ));
    let log = modem.log();
    assert!(!log.link_calls.contains(&LinkStep::Connect));
    assert!(!log.store_calls.iter().any(|(op, _, _)| *op == StoreOp::Write));
    assert!(log.lookups.is_empty());
}

// ── Attach ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_at_init_failure_stops_before_provisioning() {
    let modem = SimulatedModem::new(ModemScript {
        link_failure: Some((LinkStep::AtNotifications, Errno::EIO)),
        ..resolving_script()
    });

    let result = run(&modem).await;

    assert!(matches!(
        result,
        Err(StartupError::Attach(AttachError::AtNotifications(_)))
    ));
    assert!(modem.log().store_calls.is_empty());
}

#[tokio::test]
async fn test_psm_failure_is_fatal() {
    let modem = SimulatedModem::new(ModemScript {
        link_failure: Some((LinkStep::Psm, Errno::EINVAL)),
        ..resolving_script()
    });

    let result = run(&modem).await;

    assert!(matches!(
        result,
        Err(StartupError::Attach(AttachError::Psm(Errno::EINVAL)))
    ));
    assert!(modem.log().lookups.is_empty());
}

// ── Resolution ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_zero_addresses_is_not_found() {
    let modem = SimulatedModem::new(ModemScript::default());

    let result = run(&modem).await;

    match result {
        Err(StartupError::Resolve(e @ ResolveError::NotFound { .. })) => {
            assert_eq!(e.errno(), Errno::ENOENT);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resolver_failure_is_io_error() {
    let modem = SimulatedModem::new(ModemScript {
        resolve_error: Some(io::ErrorKind::TimedOut),
        ..ModemScript::default()
    });

    let result = run(&modem).await;

    assert!(matches!(
        result,
        Err(StartupError::Resolve(ResolveError::Io { .. }))
    ));
}
