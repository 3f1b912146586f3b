//! End-to-end flow emission across threads and simulated processes.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc
)]

use std::collections::BTreeSet;

use flowtag_core::context::{TraceRecorder, read_json_lines};
use flowtag_core::flow::{Flow, TerminatingFlow};
use flowtag_core::identity::{FlowAnchor, LocalFlowCounter, ProcessIdentity};
use flowtag_types::{FlowId, ProcessSalt, TrackId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// An object that opens a flow on creation and closes it when dropped.
struct Connection<'a> {
    anchor: FlowAnchor,
    salt: ProcessSalt,
    recorder: &'a mut TraceRecorder,
}

impl<'a> Connection<'a> {
    fn open(recorder: &'a mut TraceRecorder, salt: ProcessSalt) -> Self {
        let anchor = FlowAnchor::new();
        recorder.emit("connection_open", [Flow::from_anchor(&anchor, salt)]);
        Self {
            anchor,
            salt,
            recorder,
        }
    }

    fn send(&mut self) {
        self.recorder
            .emit("connection_send", [Flow::from_anchor(&self.anchor, self.salt)]);
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        self.recorder.emit(
            "connection_close",
            [TerminatingFlow::from_anchor(&self.anchor, self.salt)],
        );
    }
}

#[test]
fn anchored_object_opens_and_closes_its_flow() {
    let salt = ProcessSalt::new(0x77);
    let mut recorder = TraceRecorder::new(TrackId::new(1, 1));
    {
        let mut connection = Connection::open(&mut recorder, salt);
        connection.send();
    }

    let events = recorder.events();
    assert_eq!(events.len(), 3);
    let id = events[0].flow_ids[0];
    assert_eq!(events[1].flow_ids, vec![id]);
    assert_eq!(events[2].terminating_flow_ids, vec![id]);
    assert!(events[2].flow_ids.is_empty());
}

#[test]
fn threads_only_touch_their_own_events() {
    let salt = ProcessSalt::new(0xFEED);
    let counter = LocalFlowCounter::new();

    let recorders: Vec<TraceRecorder> = std::thread::scope(|scope| {
        let handles: Vec<_> = (1..=4_u32)
            .map(|tid| {
                let counter = &counter;
                scope.spawn(move || {
                    let mut recorder = TraceRecorder::new(TrackId::new(1, tid));
                    for _ in 0..100 {
                        let local = counter.next_id();
                        recorder.emit("work", [Flow::process_scoped(local, salt)]);
                    }
                    recorder
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut all_ids = BTreeSet::new();
    for recorder in &recorders {
        assert_eq!(recorder.events().len(), 100);
        for event in recorder.events() {
            assert_eq!(event.track, recorder.track());
            assert_eq!(event.flow_ids.len(), 1);
            assert!(event.terminating_flow_ids.is_empty());
            all_ids.insert(event.flow_ids[0]);
        }
    }
    // Distinct local ids under one salt never collide.
    assert_eq!(all_ids.len(), 400);
}

#[test]
fn identical_local_ids_in_two_processes_do_not_collide() {
    let mut rng = StdRng::seed_from_u64(2026);
    let collisions = (0..1_000)
        .filter(|_| {
            let a = ProcessIdentity::generate_with(&mut rng);
            let b = ProcessIdentity::generate_with(&mut rng);
            let local: u64 = rng.random_range(0..16);
            Flow::process_scoped(local, a.salt()).id() == Flow::process_scoped(local, b.salt()).id()
        })
        .count();
    assert_eq!(collisions, 0);
}

#[test]
fn cross_process_explicit_id_survives_persistence() {
    let request_id = 0x1234_5678_9abc_def0;
    let mut client = TraceRecorder::new(TrackId::new(10, 1));
    let mut server = TraceRecorder::new(TrackId::new(20, 1));
    client.emit("ipc_send", [Flow::explicit(request_id)]);
    server.emit("ipc_receive", [TerminatingFlow::explicit(request_id)]);

    let mut buffer = Vec::new();
    flowtag_core::context::write_json_lines(&mut buffer, &TraceRecorder::merge([client, server]))
        .unwrap();
    let events = read_json_lines(buffer.as_slice()).unwrap();

    assert_eq!(events[0].flow_ids, vec![FlowId::new(request_id)]);
    assert_eq!(events[1].terminating_flow_ids, vec![FlowId::new(request_id)]);
    assert_ne!(events[0].track.pid, events[1].track.pid);
}
