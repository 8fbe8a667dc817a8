use dedup_trace_tools::job::{ConversionJob, Scheduler};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn jobs(count: usize) -> Vec<ConversionJob> {
    (0..count)
        .map(|i| ConversionJob::new(vec![], format!("/out/gen_{}_stream0", i)))
        .collect()
}

#[test]
fn test_never_exceeds_max_parallel() {
    let in_flight = AtomicUsize::new(0);
    let peak = AtomicUsize::new(0);
    let finished = AtomicUsize::new(0);

    let summary = Scheduler::new(2).run(&jobs(5), |_| {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        in_flight.fetch_sub(1, Ordering::SeqCst);
        finished.fetch_add(1, Ordering::SeqCst);
        true
    });

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 5);
    assert_eq!(finished.load(Ordering::SeqCst), 5);
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(in_flight.load(Ordering::SeqCst), 0);
}

#[test]
fn test_jobs_start_in_order_with_single_slot() {
    let order = std::sync::Mutex::new(Vec::new());
    Scheduler::new(1).run(&jobs(4), |job| {
        order.lock().unwrap().push(job.target_file.clone());
        true
    });

    let expected: Vec<PathBuf> = jobs(4).into_iter().map(|j| j.target_file).collect();
    assert_eq!(order.into_inner().unwrap(), expected);
}

#[test]
fn test_failures_do_not_stop_other_jobs() {
    let ran = AtomicUsize::new(0);
    let summary = Scheduler::new(3).run(&jobs(6), |job| {
        ran.fetch_add(1, Ordering::SeqCst);
        !job.target_file.to_string_lossy().contains("_2_")
    });

    assert_eq!(ran.load(Ordering::SeqCst), 6);
    assert_eq!(summary.succeeded, 5);
    assert_eq!(summary.failed, vec![PathBuf::from("/out/gen_2_stream0")]);
}
