//! Contract Test: Record Set Identity Lifecycle
//!
//! Constraints verified:
//! - create assigns the identity and stores the server's view
//! - A rejected update forgets the identity
//! - A transport failure keeps the identity (the outcome is unknown)
//! - A read that finds nothing forgets the identity
//! - delete removes every observed value, then forgets the identity
//! - A TTL change rewrites every value in one transaction
//! - A name change deletes the old record set before creating the new one
//! - A name differing only in case is the same record set
//! - After an unknown outcome, update and delete read the server before
//!   computing their transaction
//!
//! If this test fails, the caller's stored state can diverge from the
//! server: orphaned records, or record sets that are never recreated.

mod common;

use common::*;
use hickory_proto::op::{OpCode, ResponseCode};
use rrsync_core::{ApplyOutcome, Error, RecordKind, RecordSetEngine, RecordSetState};

fn engine(client: &ScriptedClient) -> RecordSetEngine {
    RecordSetEngine::new(Box::new(ScriptedClient::sharing_counters_with(client)))
}

/// Engine plus a state that was created with `values` at `ttl`
async fn created(client: &ScriptedClient, ttl: u32, values: &[&str]) -> (RecordSetEngine, RecordSetState) {
    let engine = engine(client);
    let answers = values
        .iter()
        .map(|ip| a_record("www.example.com.", ttl, ip))
        .collect();
    client.push([Reply::Code(ResponseCode::NoError), Reply::Answers(answers)]);

    let mut state = RecordSetState::new();
    engine
        .create(&mut state, &declared("www", RecordKind::A, ttl, values))
        .await
        .unwrap();
    (engine, state)
}

#[tokio::test]
async fn create_assigns_identity_and_reads_back() {
    let client = ScriptedClient::empty();
    let engine = engine(&client);
    client.push([
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![
            a_record("www.example.com.", 300, "192.0.2.2"),
            a_record("www.example.com.", 300, "192.0.2.1"),
        ]),
    ]);

    let desired = declared("www", RecordKind::A, 300, &["192.0.2.1", "192.0.2.2"]);
    let mut state = RecordSetState::new();
    let outcome = engine.create(&mut state, &desired).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Created { added: 2 });
    assert_eq!(state.id.as_deref(), Some("www.example.com."));
    assert_eq!(state.observed.as_ref(), Some(&desired));

    let update = &client.requests()[0];
    assert_eq!(update.op_code(), OpCode::Update);
    assert_eq!(update_section(update), vec!["IN 300 192.0.2.1", "IN 300 192.0.2.2"]);
}

#[tokio::test]
async fn rejected_create_clears_identity() {
    let client = ScriptedClient::new([Reply::Code(ResponseCode::Refused)]);
    let engine = engine(&client);

    let mut state = RecordSetState::new();
    let err = engine
        .create(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.1"]))
        .await
        .unwrap_err();

    match &err {
        Error::UpdateRejected { rcode, transaction } => {
            assert_eq!(*rcode, ResponseCode::Refused);
            assert!(transaction.contains("update add www.example.com. 300 A 192.0.2.1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.clears_identity());
    assert_eq!(state, RecordSetState::new());
    // No read-back after a rejection
    assert_eq!(client.send_count(), 1);
}

#[tokio::test]
async fn rejected_update_clears_identity() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;

    client.push([Reply::Code(ResponseCode::NotAuth)]);
    let err = engine
        .update(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.9"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpdateRejected { .. }));
    assert!(state.id.is_none());
    assert!(state.observed.is_none());
}

#[tokio::test]
async fn transport_failure_keeps_identity() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;
    let before = state.clone();

    client.push([Reply::Fail("timed out")]);
    let err = engine
        .update(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.9"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }));
    assert_eq!(state, before);
}

#[tokio::test]
async fn vanished_record_set_clears_identity() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;
    let desired = declared("www", RecordKind::A, 300, &["192.0.2.1"]);

    // Script is exhausted: the read gets an empty answer section
    let observed = engine
        .refresh(&mut state, &desired.key, desired.kind)
        .await
        .unwrap();

    assert!(observed.is_none());
    assert!(state.id.is_none());
}

#[tokio::test]
async fn delete_removes_observed_values_and_clears_identity() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1", "192.0.2.2"]).await;

    client.push([Reply::Code(ResponseCode::NoError)]);
    let outcome = engine.delete(&mut state).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Deleted { removed: 2 });
    assert!(state.id.is_none());

    let requests = client.requests();
    let delete = requests.last().unwrap();
    assert_eq!(update_section(delete), vec!["NONE 0 192.0.2.1", "NONE 0 192.0.2.2"]);
}

#[tokio::test]
async fn ttl_change_rewrites_all_values() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;

    client.push([
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![a_record("www.example.com.", 600, "192.0.2.1")]),
    ]);
    let outcome = engine
        .update(&mut state, &declared("www", RecordKind::A, 600, &["192.0.2.1"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated { removed: 1, added: 1 });
    assert_eq!(state.observed.as_ref().map(|o| o.ttl), Some(600));

    let requests = client.requests();
    let update = &requests[requests.len() - 2];
    assert_eq!(update_section(update), vec!["NONE 0 192.0.2.1", "IN 600 192.0.2.1"]);
}

#[tokio::test]
async fn drift_is_corrected_by_minimal_diff() {
    let client = ScriptedClient::empty();
    // The server holds an extra value someone added by hand
    let (engine, mut state) = created(&client, 300, &["192.0.2.1", "192.0.2.7"]).await;

    client.push([
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![
            a_record("www.example.com.", 300, "192.0.2.1"),
            a_record("www.example.com.", 300, "192.0.2.2"),
        ]),
    ]);
    let outcome = engine
        .update(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.1", "192.0.2.2"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated { removed: 1, added: 1 });
    let requests = client.requests();
    let update = &requests[requests.len() - 2];
    assert_eq!(update_section(update), vec!["NONE 0 192.0.2.7", "IN 300 192.0.2.2"]);
}

#[tokio::test]
async fn name_change_replaces_record_set() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;

    client.push([
        Reply::Code(ResponseCode::NoError),
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![a_record("api.example.com.", 300, "192.0.2.1")]),
    ]);
    let outcome = engine
        .update(&mut state, &declared("api", RecordKind::A, 300, &["192.0.2.1"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Replaced);
    assert_eq!(state.id.as_deref(), Some("api.example.com."));

    let requests = client.requests();
    let delete = &requests[requests.len() - 3];
    let create = &requests[requests.len() - 2];
    assert_eq!(delete.name_servers()[0].name(), &name("www.example.com."));
    assert_eq!(update_section(delete), vec!["NONE 0 192.0.2.1"]);
    assert_eq!(create.name_servers()[0].name(), &name("api.example.com."));
    assert_eq!(client.remaining(), 0);
}

/// Engine plus a state whose create ended with a transport failure
async fn unconfirmed(client: &ScriptedClient) -> (RecordSetEngine, RecordSetState) {
    let engine = engine(client);
    client.push([Reply::Fail("timed out")]);

    let mut state = RecordSetState::new();
    let err = engine
        .create(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
    assert!(state.id.is_some());
    assert!(state.observed.is_none());
    (engine, state)
}

#[tokio::test]
async fn delete_after_unknown_outcome_removes_applied_values() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = unconfirmed(&client).await;

    // The failed create did reach the server
    client.push([
        Reply::Answers(vec![a_record("www.example.com.", 300, "192.0.2.1")]),
        Reply::Code(ResponseCode::NoError),
    ]);
    let outcome = engine.delete(&mut state).await.unwrap();

    assert_eq!(outcome, ApplyOutcome::Deleted { removed: 1 });
    assert!(state.id.is_none());
    assert_eq!(client.send_count(), 3);

    let requests = client.requests();
    assert_eq!(update_section(requests.last().unwrap()), vec!["NONE 0 192.0.2.1"]);
}

#[tokio::test]
async fn update_after_unknown_outcome_reads_server_first() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = unconfirmed(&client).await;

    client.push([
        Reply::Answers(vec![a_record("www.example.com.", 300, "192.0.2.1")]),
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![a_record("www.example.com.", 300, "192.0.2.9")]),
    ]);
    let outcome = engine
        .update(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.9"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated { removed: 1, added: 1 });
    let requests = client.requests();
    let update = &requests[requests.len() - 2];
    assert_eq!(update_section(update), vec!["NONE 0 192.0.2.1", "IN 300 192.0.2.9"]);
    assert_eq!(client.remaining(), 0);
}

#[tokio::test]
async fn update_after_unknown_outcome_recreates_missing_record_set() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = unconfirmed(&client).await;

    // The failed create never reached the server
    client.push([
        Reply::Answers(Vec::new()),
        Reply::Code(ResponseCode::NoError),
        Reply::Answers(vec![a_record("www.example.com.", 300, "192.0.2.9")]),
    ]);
    let outcome = engine
        .update(&mut state, &declared("www", RecordKind::A, 300, &["192.0.2.9"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Created { added: 1 });
    assert_eq!(state.id.as_deref(), Some("www.example.com."));
    let requests = client.requests();
    let create = &requests[requests.len() - 2];
    assert_eq!(update_section(create), vec!["IN 300 192.0.2.9"]);
}

#[tokio::test]
async fn name_case_change_keeps_record_set() {
    let client = ScriptedClient::empty();
    let (engine, mut state) = created(&client, 300, &["192.0.2.1"]).await;
    let sends = client.send_count();

    let outcome = engine
        .update(&mut state, &declared("WWW", RecordKind::A, 300, &["192.0.2.1"]))
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Unchanged);
    assert_eq!(client.send_count(), sends);
    assert!(state.id.is_some());
}
