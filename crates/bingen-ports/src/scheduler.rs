pub type ScheduledJob = Box<dyn FnOnce() + Send + 'static>;

/// Disposable handle for one scheduled job. Cancelling after the job ran is a no-op.
pub trait CancelHandle: Send + Sync {
    fn cancel(&self);
    fn is_cancelled(&self) -> bool;
}

/// Job scheduling against an audio clock.
pub trait SchedulerPort: Send + Sync {
    /// Current clock position in seconds.
    fn now(&self) -> f64;

    /// Registers `job` to run at clock time `at_seconds` and returns immediately.
    /// A time already in the past runs as soon as possible.
    fn schedule_at(&self, at_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle>;

    /// Registers `job` to run `delay_seconds` from now. Negative delays are treated as zero.
    fn schedule(&self, delay_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle> {
        self.schedule_at(self.now() + delay_seconds.max(0.0), job)
    }

    /// Drops cancelled jobs still waiting in the queue.
    fn purge_cancelled(&self) {}
}
