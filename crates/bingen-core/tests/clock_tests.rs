use bingen_core::{AudioClock, ClockScheduler, VoiceRegistry};
use bingen_ports::scheduler::{CancelHandle, SchedulerPort};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn scheduler() -> ClockScheduler {
    ClockScheduler::new(Arc::new(AudioClock::new(1_000)))
}

fn push(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Box<dyn FnOnce() + Send> {
    let log = log.clone();
    Box::new(move || log.lock().push(label))
}

#[test]
fn jobs_fire_in_due_then_insertion_order() {
    let scheduler = scheduler();
    let log = Arc::new(Mutex::new(Vec::new()));

    scheduler.schedule(0.2, push(&log, "late"));
    scheduler.schedule(0.1, push(&log, "first"));
    scheduler.schedule(0.1, push(&log, "second"));
    scheduler.schedule(-1.0, push(&log, "now"));

    assert_eq!(scheduler.next_due(), Some(0));
    assert_eq!(scheduler.advance_to(150), 3);
    assert_eq!(*log.lock(), vec!["now", "first", "second"]);
    assert_eq!(scheduler.now(), 0.15);

    assert_eq!(scheduler.advance_seconds(0.05), 1);
    assert_eq!(*log.lock(), vec!["now", "first", "second", "late"]);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn delays_are_relative_to_the_current_clock() {
    let scheduler = scheduler();
    scheduler.advance_to(500);
    let log = Arc::new(Mutex::new(Vec::new()));

    scheduler.schedule(0.25, push(&log, "job"));
    assert_eq!(scheduler.next_due(), Some(750));
    assert_eq!(scheduler.advance_to(749), 0);
    assert_eq!(scheduler.advance_to(750), 1);
}

#[test]
fn absolute_times_do_not_follow_the_clock() {
    let scheduler = scheduler();
    scheduler.advance_to(400);
    let log = Arc::new(Mutex::new(Vec::new()));

    scheduler.schedule_at(0.5, push(&log, "ahead"));
    scheduler.schedule_at(0.1, push(&log, "overdue"));
    assert_eq!(scheduler.next_due(), Some(100));

    assert_eq!(scheduler.advance_to(400), 1);
    assert_eq!(*log.lock(), vec!["overdue"]);
    assert_eq!(scheduler.advance_to(500), 1);
    assert_eq!(*log.lock(), vec!["overdue", "ahead"]);
}

#[test]
fn cancelled_jobs_never_run() {
    let scheduler = scheduler();
    let log = Arc::new(Mutex::new(Vec::new()));

    let keep = scheduler.schedule(0.1, push(&log, "keep"));
    let dropped = scheduler.schedule(0.1, push(&log, "drop"));
    dropped.cancel();
    assert!(dropped.is_cancelled());
    assert!(!keep.is_cancelled());

    assert_eq!(scheduler.advance_to(1_000), 1);
    assert_eq!(*log.lock(), vec!["keep"]);
}

#[test]
fn purge_drops_cancelled_jobs() {
    let scheduler = scheduler();
    let log = Arc::new(Mutex::new(Vec::new()));
    let handle = scheduler.schedule(1.0, push(&log, "gone"));
    scheduler.schedule(1.0, push(&log, "stays"));

    handle.cancel();
    scheduler.purge_cancelled();
    assert_eq!(scheduler.pending(), 1);
}

#[test]
fn jobs_may_schedule_follow_up_jobs() {
    let scheduler = Arc::new(scheduler());
    let log = Arc::new(Mutex::new(Vec::new()));

    let inner_scheduler = scheduler.clone();
    let inner_log = log.clone();
    scheduler.schedule(
        0.1,
        Box::new(move || {
            inner_log.lock().push("outer");
            let follow_up = inner_log.clone();
            inner_scheduler.schedule(0.0, Box::new(move || follow_up.lock().push("inner")));
        }),
    );

    assert_eq!(scheduler.advance_to(100), 2);
    assert_eq!(*log.lock(), vec!["outer", "inner"]);
}

#[test]
fn registry_cancels_everything_once() {
    let scheduler = scheduler();
    let registry = VoiceRegistry::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    registry.register(scheduler.schedule(0.1, push(&log, "a")));
    registry.register_all([
        scheduler.schedule(0.2, push(&log, "b")),
        scheduler.schedule(0.3, push(&log, "c")),
    ]);
    assert_eq!(registry.len(), 3);

    assert_eq!(registry.cancel_all(), 3);
    assert!(registry.is_empty());
    assert_eq!(registry.cancel_all(), 0);

    scheduler.advance_to(1_000);
    assert!(log.lock().is_empty());
}
