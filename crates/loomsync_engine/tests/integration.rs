//! End-to-end scenarios for the sync engine against the in-memory remote.

use chrono::NaiveDate;
use loomsync_core::{Record, RecordDraft, RecordId, RunSpan, Settings, SettingsPatch, Shift};
use loomsync_engine::{
    ConnectionState, EngineConfig, EngineError, InMemoryRemote, PendingOp, RemoteStore, SyncEngine,
};
use loomsync_store::{keys, FileBackend, InMemoryBackend, LocalCache};
use std::sync::Arc;

fn draft(machine_no: &str, stops: u32) -> RecordDraft {
    RecordDraft {
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        shift: Shift::Day,
        machine_no: machine_no.into(),
        stops,
        weft_meter: 120.5,
        total: RunSpan::parse("08:00:00").unwrap(),
        run: RunSpan::parse("07:30:00").unwrap(),
    }
}

fn remote_settings() -> SettingsPatch {
    SettingsPatch {
        remote_endpoint: Some("https://factory.example".into()),
        remote_credential: Some("key".into()),
        ..SettingsPatch::default()
    }
}

fn open_engine(
    remote: InMemoryRemote,
    backend: Arc<InMemoryBackend>,
) -> Arc<SyncEngine<InMemoryRemote, Arc<InMemoryBackend>>> {
    SyncEngine::open(EngineConfig::default(), remote, LocalCache::new(backend))
}

#[test]
fn offline_mutations_accumulate_in_cache_and_queue() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), Arc::clone(&backend));
    let inspector = LocalCache::new(Arc::clone(&backend));

    let a = engine.add_record(draft("1", 0));
    let cached: Vec<Record> = inspector.load(keys::RECORDS, Vec::new());
    assert_eq!(cached, vec![a.clone()]);

    let mut a2 = a.clone();
    a2.stops = 4;
    engine.update_record(a2.clone());
    let cached: Vec<Record> = inspector.load(keys::RECORDS, Vec::new());
    assert_eq!(cached, vec![a2.clone()]);

    // One queued op per id: the update collapsed into the add.
    let pending: Vec<PendingOp> = inspector.load(keys::PENDING, Vec::new());
    assert_eq!(pending.len(), 1);
    match &pending[0] {
        PendingOp::Add(record) => assert_eq!(record.stops, 4),
        other => panic!("expected collapsed add, got {other:?}"),
    }

    let b = engine.add_record(draft("2", 1));
    engine.delete_record(b.id);
    let cached: Vec<Record> = inspector.load(keys::RECORDS, Vec::new());
    assert_eq!(cached, vec![a2]);
    assert_eq!(engine.pending_count(), 2);
}

#[test]
fn offline_add_then_connect_round_trips() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    // Offline: one queued Add, one local record with a fresh id.
    let record = engine.add_record(draft("3", 2));
    assert_eq!(engine.connection_state(), ConnectionState::Disconnected);
    assert_eq!(engine.pending_count(), 1);
    assert!(matches!(engine.pending_ops()[0], PendingOp::Add(_)));

    // Configuring the remote triggers connect, merge, and drain.
    engine.update_settings(remote_settings());

    assert_eq!(engine.connection_state(), ConnectionState::Connected);
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.remote().record(record.id), Some(record.clone()));

    // A fresh fetch sees the record unchanged.
    let rows = engine.remote().fetch_all_records().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        loomsync_core::boundary::record_from_row(&rows[0]).unwrap(),
        record
    );
}

#[test]
fn connect_without_config_is_refused() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    assert!(matches!(
        engine.connect(),
        Err(EngineError::RemoteNotConfigured)
    ));
    assert_eq!(engine.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn failed_connect_attempt_lands_in_disconnected() {
    let backend = Arc::new(InMemoryBackend::new());
    let remote = InMemoryRemote::new();
    remote.set_online(false);
    let engine = open_engine(remote, backend);

    engine.update_settings(remote_settings());

    // The attempt failed; the engine must not wedge in Reconnecting.
    assert_eq!(engine.connection_state(), ConnectionState::Disconnected);
    assert!(engine.stats().last_error.is_some());

    // Going back online plus an explicit retry succeeds.
    engine.remote().set_online(true);
    engine.connect().unwrap();
    assert_eq!(engine.connection_state(), ConnectionState::Connected);
}

#[test]
fn initial_merge_remote_wins_and_retains_local_only() {
    let backend = Arc::new(InMemoryBackend::new());
    let seeder = LocalCache::new(Arc::clone(&backend));

    // Local working set: record X' (stale contents) and local-only Y.
    let shared_id = RecordId::new();
    let local_x = Record::from_draft(shared_id, draft("5", 1));
    let local_y = Record::from_draft(RecordId::new(), draft("6", 3));
    seeder.save(keys::RECORDS, &vec![local_x.clone(), local_y.clone()]);

    // Remote holds X with different contents.
    let remote = InMemoryRemote::new();
    let mut remote_x = local_x.clone();
    remote_x.stops = 9;
    remote.seed_record(&remote_x);

    let engine = open_engine(remote, backend);
    assert_eq!(engine.records().len(), 2);

    engine.update_settings(remote_settings());

    // Remote wins for the overlapping id, local-only record retained.
    assert_eq!(engine.record(shared_id).unwrap().stops, 9);
    assert!(engine.record(local_y.id).is_some());
    assert_eq!(engine.records().len(), 2);
}

#[test]
fn two_devices_last_writer_wins_after_drain() {
    // Device A already uploaded its version of R1.
    let r1 = RecordId::new();
    let device_a_value = Record::from_draft(r1, draft("7", 5));
    let remote = InMemoryRemote::new();
    remote.seed_record(&device_a_value);

    // Device B edited R1 offline: cache holds B's value and a queued update.
    let backend = Arc::new(InMemoryBackend::new());
    let seeder = LocalCache::new(Arc::clone(&backend));
    let device_b_value = Record::from_draft(r1, draft("7", 11));
    seeder.save(keys::RECORDS, &vec![device_b_value.clone()]);
    seeder.save(
        keys::PENDING,
        &vec![PendingOp::Update(device_b_value.clone())],
    );
    seeder.save(keys::SETTINGS, &Settings {
        remote_endpoint: "https://factory.example".into(),
        remote_credential: "key".into(),
        ..Settings::default()
    });

    let engine = open_engine(remote, backend);
    assert_eq!(engine.pending_count(), 1);

    engine.connect().unwrap();

    // B's queued update re-applied on top of the merge: B wins remotely,
    // and the echoed event brings B's working set back in line.
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.remote().record(r1).unwrap().stops, 11);
    assert_eq!(engine.record(r1).unwrap().stops, 11);
}

#[test]
fn realtime_events_apply_after_merge() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);
    engine.update_settings(remote_settings());

    // Another device inserts and later deletes a record.
    let foreign = Record::from_draft(RecordId::new(), draft("9", 1));
    engine
        .remote()
        .push_event(loomsync_engine::RemoteEvent::Insert(
            loomsync_core::boundary::record_to_row(&foreign),
        ));
    engine.tick();
    assert_eq!(engine.record(foreign.id), Some(foreign.clone()));

    engine
        .remote()
        .push_event(loomsync_engine::RemoteEvent::Delete(foreign.id));
    engine.tick();
    assert!(engine.record(foreign.id).is_none());
    assert_eq!(engine.stats().events_applied, 2);
}

#[test]
fn rejected_operation_is_dropped_and_reported() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    let bad = engine.add_record(draft("1", 1));
    let good = engine.add_record(draft("2", 2));

    engine.remote().reject_next("constraint violation");
    engine.update_settings(remote_settings());

    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.stats().operations_dropped, 1);
    assert!(engine.remote().record(bad.id).is_none());
    assert!(engine.remote().record(good.id).is_some());
    assert!(engine
        .stats()
        .last_error
        .is_some_and(|e| e.contains("constraint violation")));
}

#[test]
fn transport_failure_keeps_ops_queued_for_next_connect() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    engine.add_record(draft("1", 1));
    engine.remote().fail_transport(1);
    engine.update_settings(remote_settings());

    // The drain hit a transport error after connecting: the op is still
    // queued and the connection is down - no data loss.
    assert_eq!(engine.pending_count(), 1);
    assert_eq!(engine.connection_state(), ConnectionState::Disconnected);

    // The next explicit connect delivers it.
    engine.connect().unwrap();
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.remote().record_count(), 1);
}

#[test]
fn settings_remote_wins_on_connect() {
    let remote = InMemoryRemote::new();
    remote.seed_settings(&Settings {
        machine_count: 48,
        alert_threshold: 55,
        remote_endpoint: "https://factory.example".into(),
        remote_credential: "key".into(),
        ..Settings::default()
    });

    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(remote, backend);

    engine.update_settings(SettingsPatch {
        machine_count: Some(12),
        ..remote_settings()
    });

    // The remote copy replaced the local one wholesale.
    assert_eq!(engine.settings().machine_count, 48);
    assert_eq!(engine.settings().alert_threshold, 55);
}

#[test]
fn local_settings_seed_an_empty_remote() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    engine.update_settings(SettingsPatch {
        machine_count: Some(16),
        ..remote_settings()
    });

    let seeded = engine.remote().settings().unwrap();
    assert_eq!(seeded.machine_count, 16);
}

#[test]
fn settings_changes_are_not_queued_offline() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    engine.update_settings(SettingsPatch {
        machine_count: Some(20),
        ..SettingsPatch::default()
    });

    assert_eq!(engine.settings().machine_count, 20);
    assert_eq!(engine.pending_count(), 0);
    assert!(engine.remote().settings().is_none());
}

#[test]
fn connected_settings_update_upserts_directly() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);
    engine.update_settings(remote_settings());
    assert!(engine.connection_state().is_connected());

    engine.update_settings(SettingsPatch {
        alert_threshold: Some(42),
        ..SettingsPatch::default()
    });

    assert_eq!(engine.remote().settings().unwrap().alert_threshold, 42);
    assert_eq!(engine.pending_count(), 0);
}

#[test]
fn credential_change_never_double_delivers_events() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);
    engine.update_settings(remote_settings());

    // Changing the credential tears down and re-subscribes.
    engine.update_settings(SettingsPatch {
        remote_credential: Some("rotated-key".into()),
        ..SettingsPatch::default()
    });
    assert!(engine.connection_state().is_connected());

    let foreign = Record::from_draft(RecordId::new(), draft("4", 1));
    engine
        .remote()
        .push_event(loomsync_engine::RemoteEvent::Insert(
            loomsync_core::boundary::record_to_row(&foreign),
        ));
    engine.tick();

    // Exactly one live subscription, exactly one application.
    assert_eq!(engine.remote().subscriber_count(), 1);
    assert_eq!(engine.stats().events_applied, 1);
}

#[test]
fn delete_all_data_wipes_local_and_remote() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), Arc::clone(&backend));

    engine.add_record(draft("1", 1));
    engine.add_record(draft("2", 2));
    engine.update_settings(remote_settings());
    assert_eq!(engine.remote().record_count(), 2);

    engine.delete_all_data();

    assert!(engine.records().is_empty());
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(engine.settings(), Settings::default());
    assert_eq!(engine.remote().record_count(), 0);
    assert_eq!(engine.connection_state(), ConnectionState::Disconnected);

    let inspector = LocalCache::new(backend);
    let cached: Vec<Record> = inspector.load(keys::RECORDS, Vec::new());
    assert!(cached.is_empty());
}

#[test]
fn state_survives_restart_via_file_backend() {
    let dir = tempfile::tempdir().unwrap();

    let first = SyncEngine::open(
        EngineConfig::default(),
        InMemoryRemote::new(),
        LocalCache::new(FileBackend::open(dir.path()).unwrap()),
    );
    let a = first.add_record(draft("1", 1));
    let b = first.add_record(draft("2", 2));
    drop(first);

    // A fresh process reloads records and the queue from disk.
    let second = SyncEngine::open(
        EngineConfig::default(),
        InMemoryRemote::new(),
        LocalCache::new(FileBackend::open(dir.path()).unwrap()),
    );
    assert_eq!(second.records().len(), 2);
    assert_eq!(second.pending_count(), 2);
    assert!(second.record(a.id).is_some());

    // The queued work drains on the first connection.
    second.update_settings(remote_settings());
    assert_eq!(second.pending_count(), 0);
    assert_eq!(second.remote().record(b.id).unwrap().stops, 2);
}

#[test]
fn idempotent_reapply_leaves_remote_unchanged() {
    let backend = Arc::new(InMemoryBackend::new());
    let engine = open_engine(InMemoryRemote::new(), backend);

    let record = engine.add_record(draft("3", 2));
    engine.update_settings(remote_settings());
    assert_eq!(engine.remote().record_count(), 1);

    // Re-applying the same upsert and delete-of-absent changes nothing.
    engine.remote().upsert_record(&record).unwrap();
    assert_eq!(engine.remote().record_count(), 1);
    assert_eq!(engine.remote().record(record.id), Some(record.clone()));

    engine.remote().delete_record(RecordId::new()).unwrap();
    assert_eq!(engine.remote().record_count(), 1);
}
