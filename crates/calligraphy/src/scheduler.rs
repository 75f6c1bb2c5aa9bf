//! Cooperative per-frame task scheduler.
//!
//! Long-running work is split into batches: each frame tick runs one batch of
//! every live task against a shared target, and tasks report whether they are
//! finished. Cancelling a handle drops its task before its next batch.

use tracing::debug;

/// Result of running one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// More batches remain; run again next tick
    Pending,
    /// The task is finished and will be dropped
    Complete,
}

/// A unit of incremental work driven by frame ticks
pub trait FrameTask<T> {
    fn run_batch(&mut self, target: &mut T) -> TaskStatus;
}

impl<T, F> FrameTask<T> for F
where
    F: FnMut(&mut T) -> TaskStatus,
{
    fn run_batch(&mut self, target: &mut T) -> TaskStatus {
        self(target)
    }
}

/// Identifies a scheduled task for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks that ran a batch
    pub ran: usize,
    /// Tasks that finished during this tick
    pub completed: usize,
}

/// Runs scheduled tasks one batch per tick
pub struct FrameScheduler<T> {
    tasks: Vec<(TaskHandle, Box<dyn FrameTask<T>>)>,
    next_id: u64,
}

impl<T> std::fmt::Debug for FrameScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("live_tasks", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task; its first batch runs on the next tick
    pub fn schedule(&mut self, task: impl FrameTask<T> + 'static) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.tasks.push((handle, Box::new(task)));
        debug!("FrameScheduler: scheduled task {}", handle.0);
        handle
    }

    /// Cancel a task. Returns false if it already finished or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(h, _)| *h != handle);
        let removed = self.tasks.len() != before;
        if removed {
            debug!("FrameScheduler: cancelled task {}", handle.0);
        }
        removed
    }

    pub fn is_live(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|(h, _)| *h == handle)
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run one batch of every live task
    pub fn tick(&mut self, target: &mut T) -> TickReport {
        let mut report = TickReport::default();
        self.tasks.retain_mut(|(handle, task)| {
            report.ran += 1;
            match task.run_batch(target) {
                TaskStatus::Pending => true,
                TaskStatus::Complete => {
                    debug!("FrameScheduler: task {} complete", handle.0);
                    report.completed += 1;
                    false
                }
            }
        });
        report
    }
}
