use bingen_ports::scheduler::{CancelHandle, ScheduledJob, SchedulerPort};
use bingen_ports::types::SampleTime;
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

/// Sample-accurate position of the output stream.
pub struct AudioClock {
    sample_rate_hz: u32,
    sample_time: AtomicU64,
}

impl AudioClock {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz: sample_rate_hz.max(1),
            sample_time: AtomicU64::new(0),
        }
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn set(&self, sample_time: SampleTime) {
        self.sample_time.store(sample_time, Ordering::Relaxed);
    }

    pub fn get(&self) -> SampleTime {
        self.sample_time.load(Ordering::Relaxed)
    }

    pub fn seconds(&self) -> f64 {
        self.get() as f64 / self.sample_rate_hz as f64
    }

    pub fn seconds_to_samples(&self, seconds: f64) -> SampleTime {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.sample_rate_hz as f64).round() as SampleTime
    }
}

struct PendingJob {
    due: SampleTime,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    job: ScheduledJob,
}

// BinaryHeap is a max-heap; order so the earliest (due, seq) pops first.
impl Ord for PendingJob {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingJob {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingJob {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for PendingJob {}

#[derive(Default)]
struct JobQueue {
    heap: BinaryHeap<PendingJob>,
    next_seq: u64,
}

/// Cancellation flag for one job queued on a [`ClockScheduler`].
pub struct ClockCancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle for ClockCancelHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Due job popped off the queue, run by the caller outside the queue lock.
pub struct DueJob {
    pub due: SampleTime,
    cancelled: Arc<AtomicBool>,
    job: ScheduledJob,
}

impl DueJob {
    /// Runs the job unless it was cancelled. Returns whether it ran.
    pub fn run(self) -> bool {
        if self.cancelled.load(Ordering::SeqCst) {
            return false;
        }
        (self.job)();
        true
    }
}

/// Job queue keyed on the audio clock. Jobs fire in (due sample, insertion) order,
/// either from the audio callback or from [`ClockScheduler::advance_to`].
pub struct ClockScheduler {
    clock: Arc<AudioClock>,
    queue: Mutex<JobQueue>,
}

impl ClockScheduler {
    pub fn new(clock: Arc<AudioClock>) -> Self {
        Self {
            clock,
            queue: Mutex::new(JobQueue::default()),
        }
    }

    pub fn clock(&self) -> &Arc<AudioClock> {
        &self.clock
    }

    /// Queued jobs, cancelled ones included until they are popped or purged.
    pub fn pending(&self) -> usize {
        self.queue.lock().heap.len()
    }

    pub fn next_due(&self) -> Option<SampleTime> {
        self.queue.lock().heap.peek().map(|job| job.due)
    }

    /// Pops the earliest job due strictly before `end`.
    pub fn pop_due_before(&self, end: SampleTime) -> Option<DueJob> {
        let mut queue = self.queue.lock();
        if queue.heap.peek().map_or(true, |job| job.due >= end) {
            return None;
        }
        queue.heap.pop().map(|job| DueJob {
            due: job.due,
            cancelled: job.cancelled,
            job: job.job,
        })
    }

    /// Moves the clock to `sample_time` and runs every job due at or before it.
    /// Returns the number of jobs that ran.
    pub fn advance_to(&self, sample_time: SampleTime) -> usize {
        let mut ran = 0;
        while let Some(due) = self.pop_due_before(sample_time.saturating_add(1)) {
            self.clock.set(due.due.max(self.clock.get()));
            if due.run() {
                ran += 1;
            }
        }
        self.clock.set(sample_time.max(self.clock.get()));
        ran
    }

    fn push(&self, due: SampleTime, job: ScheduledJob) -> Box<dyn CancelHandle> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let mut queue = self.queue.lock();
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.heap.push(PendingJob {
            due,
            seq,
            cancelled: cancelled.clone(),
            job,
        });
        Box::new(ClockCancelHandle { cancelled })
    }

    pub fn advance_seconds(&self, seconds: f64) -> usize {
        let target = self
            .clock
            .get()
            .saturating_add(self.clock.seconds_to_samples(seconds));
        self.advance_to(target)
    }
}

impl SchedulerPort for ClockScheduler {
    fn now(&self) -> f64 {
        self.clock.seconds()
    }

    fn schedule_at(&self, at_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle> {
        self.push(self.clock.seconds_to_samples(at_seconds), job)
    }

    fn schedule(&self, delay_seconds: f64, job: ScheduledJob) -> Box<dyn CancelHandle> {
        let due = self
            .clock
            .get()
            .saturating_add(self.clock.seconds_to_samples(delay_seconds));
        self.push(due, job)
    }

    fn purge_cancelled(&self) {
        self.queue
            .lock()
            .heap
            .retain(|job| !job.cancelled.load(Ordering::SeqCst));
    }
}
