//! Owned set of spawned one-shot tasks.
//!
//! Key properties:
//! - Every task gets a monotonically increasing [`TaskId`].
//! - Finished tasks are reaped lazily on the next spawn or query.
//! - Cancellation aborts the task; results are reported by the task itself
//!   (usually over a channel), so an aborted task reports nothing.
//! - Dropping the set aborts everything still running.

use std::future::Future;

use tokio::task::JoinHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

#[derive(Debug, Default)]
pub struct TaskSet {
    next_id: u64,
    tasks: Vec<(TaskId, JoinHandle<()>)>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(&mut self, future: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        let id = TaskId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.tasks.push((id, tokio::spawn(future)));
        id
    }

    /// Number of tasks that have not finished yet.
    pub fn len(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let Some(pos) = self.tasks.iter().position(|(tid, _)| *tid == id) else {
            return false;
        };
        let (_, handle) = self.tasks.swap_remove(pos);
        handle.abort();
        true
    }

    /// Aborts every running task. Returns how many were still running.
    pub fn abort_all(&mut self) -> usize {
        self.reap();
        let n = self.tasks.len();
        for (_, handle) in self.tasks.drain(..) {
            handle.abort();
        }
        if n > 0 {
            tracing::debug!("aborted {n} in-flight task(s)");
        }
        n
    }

    fn reap(&mut self) {
        self.tasks.retain(|(_, h)| !h.is_finished());
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        for (_, handle) in &self.tasks {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskSet;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn finished_tasks_are_reaped() {
        let mut set = TaskSet::new();
        set.spawn(async {});
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(set.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_task_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = TaskSet::new();

        let slow_tx = tx.clone();
        let slow = set.spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = slow_tx.send("slow");
        });
        set.spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let _ = tx.send("kept");
        });

        assert!(set.cancel(slow));
        assert!(!set.cancel(slow));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(rx.try_recv().ok(), Some("kept"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn abort_all_stops_everything() {
        let (tx, mut rx) = mpsc::unbounded_channel::<u8>();
        let mut set = TaskSet::new();
        for n in 0..3 {
            let tx = tx.clone();
            set.spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let _ = tx.send(n);
            });
        }
        assert_eq!(set.abort_all(), 3);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }
}
