//! Pending operation queue.

use loomsync_core::{Record, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A record mutation not yet confirmed durable on the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PendingOp {
    /// The record was created on this device and the remote has never
    /// seen its id.
    Add(Record),
    /// The record existed before this device edited it.
    Update(Record),
    /// The record was deleted.
    Delete(RecordId),
}

impl PendingOp {
    /// Returns the id of the record this operation affects.
    #[must_use]
    pub fn record_id(&self) -> RecordId {
        match self {
            PendingOp::Add(record) | PendingOp::Update(record) => record.id,
            PendingOp::Delete(id) => *id,
        }
    }

    /// Returns the operation kind as a short label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PendingOp::Add(_) => "add",
            PendingOp::Update(_) => "update",
            PendingOp::Delete(_) => "delete",
        }
    }
}

/// An ordered log of unconfirmed mutations, at most one per record id.
///
/// The queue is drained front-to-back; a confirmed operation is removed,
/// a retryable failure keeps it in place for the next pass.
///
/// # Invariants
///
/// - At most one operation per record id: a newer operation supersedes
///   the older one still queued, taking over its queue slot.
/// - Add-ness is sticky: an `Update` landing on an unconfirmed `Add`
///   collapses into a single `Add` carrying the latest field values,
///   because the remote store has never seen that id.
/// - FIFO order is preserved across distinct record ids.
pub struct PendingQueue {
    ops: VecDeque<PendingOp>,
}

impl PendingQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: VecDeque::new(),
        }
    }

    /// Restores a queue from persisted operations.
    #[must_use]
    pub fn from_ops(ops: Vec<PendingOp>) -> Self {
        Self { ops: ops.into() }
    }

    /// Returns a snapshot of all queued operations, front first.
    #[must_use]
    pub fn ops(&self) -> Vec<PendingOp> {
        self.ops.iter().cloned().collect()
    }

    /// Appends an operation, superseding any queued one for the same id.
    pub fn enqueue(&mut self, op: PendingOp) {
        let id = op.record_id();

        if let Some(slot) = self.ops.iter_mut().find(|o| o.record_id() == id) {
            *slot = match (&*slot, op) {
                // The remote has never seen this id; keep sending an Add.
                (PendingOp::Add(_), PendingOp::Update(record)) => PendingOp::Add(record),
                (_, op) => op,
            };
        } else {
            self.ops.push_back(op);
        }
    }

    /// Returns the front operation without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<PendingOp> {
        self.ops.front().cloned()
    }

    /// Removes the front operation if it still equals `op`.
    ///
    /// Returns false when the front was superseded while `op` was in
    /// flight - the newer operation stays queued and must be sent too.
    pub fn remove_front(&mut self, op: &PendingOp) -> bool {
        if self.ops.front() == Some(op) {
            self.ops.pop_front();
            true
        } else {
            false
        }
    }

    /// Returns true if an operation for `id` is queued.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.ops.iter().any(|op| op.record_id() == id)
    }

    /// Returns the number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Removes all queued operations.
    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use loomsync_core::{RecordDraft, RunSpan, Shift};

    fn record_with(id: RecordId, stops: u32) -> Record {
        Record::from_draft(
            id,
            RecordDraft {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                shift: Shift::Day,
                machine_no: "3".into(),
                stops,
                weft_meter: 120.5,
                total: RunSpan::parse("08:00:00").unwrap(),
                run: RunSpan::parse("07:30:00").unwrap(),
            },
        )
    }

    #[test]
    fn enqueue_distinct_ids_keeps_order() {
        let mut queue = PendingQueue::new();
        let a = RecordId::new();
        let b = RecordId::new();

        queue.enqueue(PendingOp::Add(record_with(a, 1)));
        queue.enqueue(PendingOp::Add(record_with(b, 2)));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek().unwrap().record_id(), a);
    }

    #[test]
    fn update_after_add_collapses_to_add() {
        let mut queue = PendingQueue::new();
        let id = RecordId::new();

        queue.enqueue(PendingOp::Add(record_with(id, 1)));
        queue.enqueue(PendingOp::Update(record_with(id, 5)));

        assert_eq!(queue.len(), 1);
        match queue.peek().unwrap() {
            PendingOp::Add(record) => assert_eq!(record.stops, 5),
            other => panic!("expected collapsed add, got {other:?}"),
        }
    }

    #[test]
    fn update_after_update_replaces() {
        let mut queue = PendingQueue::new();
        let id = RecordId::new();

        queue.enqueue(PendingOp::Update(record_with(id, 1)));
        queue.enqueue(PendingOp::Update(record_with(id, 9)));

        assert_eq!(queue.len(), 1);
        match queue.peek().unwrap() {
            PendingOp::Update(record) => assert_eq!(record.stops, 9),
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn delete_after_add_replaces_with_delete() {
        let mut queue = PendingQueue::new();
        let id = RecordId::new();

        queue.enqueue(PendingOp::Add(record_with(id, 1)));
        queue.enqueue(PendingOp::Delete(id));

        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.peek().unwrap(), PendingOp::Delete(_)));
    }

    #[test]
    fn superseding_keeps_queue_slot() {
        let mut queue = PendingQueue::new();
        let a = RecordId::new();
        let b = RecordId::new();

        queue.enqueue(PendingOp::Add(record_with(a, 1)));
        queue.enqueue(PendingOp::Add(record_with(b, 1)));
        queue.enqueue(PendingOp::Update(record_with(a, 7)));

        // a still drains before b
        assert_eq!(queue.peek().unwrap().record_id(), a);
    }

    #[test]
    fn remove_front_confirms_exact_op() {
        let mut queue = PendingQueue::new();
        let id = RecordId::new();

        queue.enqueue(PendingOp::Add(record_with(id, 1)));
        let in_flight = queue.peek().unwrap();

        // Superseded while in flight: the newer value must survive.
        queue.enqueue(PendingOp::Update(record_with(id, 3)));
        assert!(!queue.remove_front(&in_flight));
        assert_eq!(queue.len(), 1);

        let newer = queue.peek().unwrap();
        assert!(queue.remove_front(&newer));
        assert!(queue.is_empty());
    }

    #[test]
    fn contains_tracks_queued_ids() {
        let mut queue = PendingQueue::new();
        let id = RecordId::new();
        assert!(!queue.contains(id));

        queue.enqueue(PendingOp::Delete(id));
        assert!(queue.contains(id));

        let op = queue.peek().unwrap();
        queue.remove_front(&op);
        assert!(!queue.contains(id));
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut queue = PendingQueue::new();
        queue.enqueue(PendingOp::Add(record_with(RecordId::new(), 1)));
        queue.enqueue(PendingOp::Delete(RecordId::new()));

        let restored = PendingQueue::from_ops(queue.ops());
        assert_eq!(restored.ops(), queue.ops());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum OpKind {
            Add(u32),
            Update(u32),
            Delete,
        }

        fn op_for(id: RecordId, kind: &OpKind) -> PendingOp {
            match kind {
                OpKind::Add(stops) => PendingOp::Add(record_with(id, *stops)),
                OpKind::Update(stops) => PendingOp::Update(record_with(id, *stops)),
                OpKind::Delete => PendingOp::Delete(id),
            }
        }

        proptest! {
            #[test]
            fn at_most_one_op_per_id(
                script in prop::collection::vec(
                    (0usize..4, prop_oneof![
                        (0u32..100).prop_map(OpKind::Add),
                        (0u32..100).prop_map(OpKind::Update),
                        Just(OpKind::Delete),
                    ]),
                    0..64,
                )
            ) {
                let ids: Vec<RecordId> = (0..4).map(|_| RecordId::new()).collect();
                let mut queue = PendingQueue::new();

                for (slot, kind) in &script {
                    queue.enqueue(op_for(ids[*slot], kind));
                }

                let ops = queue.ops();
                let mut seen = std::collections::HashSet::new();
                for op in &ops {
                    prop_assert!(seen.insert(op.record_id()), "duplicate id in queue");
                }
                prop_assert!(ops.len() <= 4);
            }
        }
    }
}
