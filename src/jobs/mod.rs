pub mod manager;
pub mod model;

pub use manager::{JobManager, SubscriptionId};
pub use model::{Batch, BatchSnapshot, Job, JobSnapshot, JobStatus, ProgressEvent};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get_roundtrips() {
        let mgr = JobManager::new();
        let job = mgr.create("image-convert", "photo.png");
        let snap = mgr.get(&job.id).unwrap();
        assert_eq!(snap.processor_id, "image-convert");
        assert_eq!(snap.status, JobStatus::Pending);
        assert_eq!(snap.progress, 0.0);
    }

    #[test]
    fn unknown_job_is_none() {
        let mgr = JobManager::new();
        assert!(mgr.get("nope").is_none());
    }

    #[test]
    fn created_ids_are_unique() {
        let mgr = JobManager::new();
        let a = mgr.create("p", "a.png");
        let b = mgr.create("p", "b.png");
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 12);
    }

    #[test]
    fn first_progress_update_transitions_to_processing() {
        let mgr = JobManager::new();
        let job = mgr.create("p", "a.png");
        mgr.update_progress(&job.id, 10.0, "starting").unwrap();
        let snap = mgr.get(&job.id).unwrap();
        assert_eq!(snap.status, JobStatus::Processing);
        assert_eq!(snap.progress, 10.0);
    }

    #[test]
    fn mark_completed_sets_invariants() {
        let mgr = JobManager::new();
        let job = mgr.create("p", "a.png");
        mgr.mark_completed(&job.id, std::path::PathBuf::from("/tmp/a/out.jpg")).unwrap();
        let snap = mgr.get(&job.id).unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.progress, 100.0);
        assert!(snap.error.is_none());
        assert_eq!(snap.result_extension, ".jpg");
    }

    #[test]
    fn mark_failed_sets_error_and_leaves_progress() {
        let mgr = JobManager::new();
        let job = mgr.create("p", "a.png");
        mgr.update_progress(&job.id, 42.0, "working").unwrap();
        mgr.mark_failed(&job.id, "boom").unwrap();
        let snap = mgr.get(&job.id).unwrap();
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.progress, 42.0);
        assert_eq!(snap.error.as_deref(), Some("boom"));
        assert_eq!(snap.message, "Error: boom");
    }

    #[tokio::test]
    async fn subscribers_see_progress_in_order_then_one_terminal_event() {
        let mgr = JobManager::new();
        let job = mgr.create("p", "a.png");
        let (_sub_id, mut rx) = mgr.subscribe(&job.id).unwrap();

        mgr.update_progress(&job.id, 10.0, "a").unwrap();
        mgr.update_progress(&job.id, 50.0, "b").unwrap();
        mgr.mark_completed(&job.id, std::path::PathBuf::from("/tmp/a/out.jpg")).unwrap();
        mgr.publish_terminal(&job.id).unwrap();

        let mut seen = vec![];
        while let Ok(event) = rx.try_recv() {
            seen.push(event.progress);
        }
        assert_eq!(seen, vec![10.0, 50.0, 100.0]);
    }

    #[test]
    fn unsubscribe_tolerates_unknown_id() {
        let mgr = JobManager::new();
        let job = mgr.create("p", "a.png");
        mgr.unsubscribe(&job.id, 999);
        mgr.unsubscribe("never-existed", 1);
    }

    #[test]
    fn remove_job_prunes_batches() {
        let mgr = JobManager::new();
        let a = mgr.create("p", "a.png");
        let b = mgr.create("p", "b.png");
        let batch = mgr.create_batch("p", vec![a.id.clone(), b.id.clone()]);

        mgr.remove_job(&a.id);
        let snap = mgr.get_batch(&batch.id).unwrap();
        assert_eq!(snap.job_ids, vec![b.id.clone()]);

        mgr.remove_job(&b.id);
        assert!(mgr.get_batch(&batch.id).is_none());
    }

    #[test]
    fn collect_expired_only_returns_terminal_and_old() {
        let mgr = JobManager::new();
        let pending = mgr.create("p", "a.png");
        let done = mgr.create("p", "b.png");
        mgr.mark_completed(&done.id, std::path::PathBuf::from("/tmp/a/out.jpg")).unwrap();

        // Fresh jobs are never expired regardless of status.
        let expired = mgr.collect_expired(0);
        assert!(!expired.contains(&pending.id));
        assert!(expired.contains(&done.id));
    }

    // Random sequences of operations must never observe a status-lattice violation:
    // drive a generated action sequence against a job and re-check invariants after
    // every step.
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Progress(u8),
        Complete,
        Fail,
    }

    fn job_script() -> impl Strategy<Value = Vec<Step>> {
        proptest::collection::vec(
            prop_oneof![
                (0u8..=100).prop_map(Step::Progress),
                Just(Step::Complete),
                Just(Step::Fail),
            ],
            0..12,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// A job driven through any sequence of progress/terminal steps never observes a
        /// back-transition, and once terminal its invariants hold for every subsequent
        /// read — the execution-task contract is "progress calls, then exactly one
        /// terminal call", so only the first terminal step in the script is honored.
        #[test]
        fn prop_status_lattice_never_regresses(steps in job_script()) {
            let mgr = JobManager::new();
            let job = mgr.create("p", "a.png");

            let mut last_status = JobStatus::Pending;
            let mut terminal_seen = false;

            for step in steps {
                if terminal_seen {
                    break;
                }
                match step {
                    Step::Progress(p) => {
                        mgr.update_progress(&job.id, p as f64, "working").unwrap();
                    }
                    Step::Complete => {
                        mgr.mark_completed(&job.id, std::path::PathBuf::from("/tmp/out.png")).unwrap();
                        terminal_seen = true;
                    }
                    Step::Fail => {
                        mgr.mark_failed(&job.id, "boom").unwrap();
                        terminal_seen = true;
                    }
                }

                let snap = mgr.get(&job.id).unwrap();
                let rank = |s: JobStatus| match s {
                    JobStatus::Pending => 0,
                    JobStatus::Processing => 1,
                    JobStatus::Completed | JobStatus::Failed => 2,
                };
                prop_assert!(rank(snap.status) >= rank(last_status), "status went backwards: {:?} -> {:?}", last_status, snap.status);
                last_status = snap.status;

                if snap.status == JobStatus::Completed {
                    prop_assert!(snap.error.is_none());
                    prop_assert_eq!(snap.progress, 100.0);
                    prop_assert_ne!(&snap.result_extension, "");
                }
                if snap.status == JobStatus::Failed {
                    prop_assert!(snap.error.is_some());
                }
            }
        }

        /// Removing jobs from a batch in any order always leaves the batch's `job_ids`
        /// equal to exactly the not-yet-removed members, and the batch disappears
        /// exactly once every member has been removed.
        #[test]
        fn prop_batch_removal_keeps_job_ids_consistent(removal_order in proptest::sample::subsequence(vec![0usize, 1, 2, 3], 0..=4)) {
            let mgr = JobManager::new();
            let jobs: Vec<_> = (0..4).map(|i| mgr.create("p", &format!("f{i}.png"))).collect();
            let job_ids: Vec<String> = jobs.iter().map(|j| j.id.clone()).collect();
            let batch = mgr.create_batch("p", job_ids.clone());

            let mut removed: std::collections::HashSet<&str> = std::collections::HashSet::new();
            for idx in &removal_order {
                mgr.remove_job(&job_ids[*idx]);
                removed.insert(job_ids[*idx].as_str());

                let expected: Vec<&String> = job_ids.iter().filter(|id| !removed.contains(id.as_str())).collect();
                match mgr.get_batch(&batch.id) {
                    Some(snap) => {
                        let actual: Vec<&String> = snap.job_ids.iter().collect();
                        prop_assert_eq!(actual, expected);
                    }
                    None => prop_assert!(expected.is_empty()),
                }
            }
        }
    }
}
