use std::cmp::Ordering;

/// Orders queued tasks by `(-priority, submitted_at)`: higher priority
/// first, ties broken FIFO by submission time. `seq` breaks ties between
/// tasks submitted in the same millisecond.
#[derive(Debug, Eq, PartialEq)]
pub struct QueueEntry {
    pub task_id: String,
    pub priority: i64,
    pub submitted_at_unix_ms: u64,
    pub seq: u64,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.submitted_at_unix_ms.cmp(&self.submitted_at_unix_ms))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn higher_priority_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry { task_id: "low".into(), priority: 0, submitted_at_unix_ms: 1, seq: 0 });
        heap.push(QueueEntry { task_id: "high".into(), priority: 10, submitted_at_unix_ms: 2, seq: 1 });
        assert_eq!(heap.pop().unwrap().task_id, "high");
    }

    #[test]
    fn same_priority_is_fifo_by_submission_time() {
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry { task_id: "first".into(), priority: 0, submitted_at_unix_ms: 1, seq: 0 });
        heap.push(QueueEntry { task_id: "second".into(), priority: 0, submitted_at_unix_ms: 2, seq: 1 });
        assert_eq!(heap.pop().unwrap().task_id, "first");
        assert_eq!(heap.pop().unwrap().task_id, "second");
    }
}
