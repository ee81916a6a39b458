//! Fire-and-forget queue of mirror writes.
//!
//! Enqueueing never waits on the network. A background task drains the queue,
//! collapses bursts of room upserts into the last snapshot, and logs failures.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{CompletionRecord, RemoteMirror};
use crate::room::RoomSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum MirrorJob {
    UpsertRoom { user_id: String, room: RoomSnapshot },
    RecordCompletion { user_id: String, record: CompletionRecord },
}

/// Sending half of the queue. A disabled outbox drops every job.
#[derive(Debug, Clone, Default)]
pub struct MirrorOutbox {
    tx: Option<mpsc::UnboundedSender<MirrorJob>>,
}

impl MirrorOutbox {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the worker on the current tokio runtime.
    ///
    /// The worker exits once every outbox clone is dropped, flushing a pending
    /// room snapshot first.
    pub fn spawn(mirror: Arc<dyn RemoteMirror>, debounce: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(mirror, rx, debounce));
        (Self { tx: Some(tx) }, handle)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a job. Returns `false` if it was dropped.
    pub fn enqueue(&self, job: MirrorJob) -> bool {
        match &self.tx {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }
}

async fn run_worker(
    mirror: Arc<dyn RemoteMirror>,
    mut rx: mpsc::UnboundedReceiver<MirrorJob>,
    debounce: Duration,
) {
    let mut pending_room: Option<(String, RoomSnapshot)> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let next = match deadline {
            Some(at) => tokio::select! {
                job = rx.recv() => job,
                _ = tokio::time::sleep_until(at) => {
                    deadline = None;
                    flush_room(mirror.as_ref(), pending_room.take()).await;
                    continue;
                }
            },
            None => rx.recv().await,
        };

        match next {
            Some(MirrorJob::UpsertRoom { user_id, room }) => {
                pending_room = Some((user_id, room));
                deadline = Some(Instant::now() + debounce);
            }
            Some(MirrorJob::RecordCompletion { user_id, record }) => {
                match mirror.record_completed_task(&user_id, &record).await {
                    Ok(()) => debug!(title = %record.title, "completion mirrored"),
                    Err(e) => warn!(error = %e, "failed to mirror completion"),
                }
            }
            None => {
                flush_room(mirror.as_ref(), pending_room.take()).await;
                break;
            }
        }
    }
    debug!("mirror outbox closed");
}

async fn flush_room(mirror: &dyn RemoteMirror, pending: Option<(String, RoomSnapshot)>) {
    let Some((user_id, room)) = pending else {
        return;
    };
    match mirror.upsert_room(&user_id, &room).await {
        Ok(()) => debug!(level = room.room_level, "room mirrored"),
        Err(e) => warn!(error = %e, "failed to mirror room"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use crate::mirror::{ReactionCount, RemoteCompletion, RemoteProfile};
    use async_trait::async_trait;
    use chrono::{DateTime, FixedOffset};
    use std::sync::Mutex;

    /// Records calls; optionally fails the first N of them.
    #[derive(Default)]
    struct Recorder {
        rooms: Mutex<Vec<(String, u8)>>,
        completions: Mutex<Vec<String>>,
        failures_left: Mutex<u32>,
    }

    impl Recorder {
        fn failing(n: u32) -> Self {
            Self {
                failures_left: Mutex::new(n),
                ..Default::default()
            }
        }

        fn maybe_fail(&self) -> Result<(), MirrorError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(MirrorError::Status {
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteMirror for Recorder {
        async fn upsert_room(&self, user_id: &str, room: &RoomSnapshot) -> Result<(), MirrorError> {
            self.maybe_fail()?;
            self.rooms
                .lock()
                .unwrap()
                .push((user_id.to_string(), room.room_level));
            Ok(())
        }

        async fn register_profile(&self, _: &str, _: &str) -> Result<RemoteProfile, MirrorError> {
            Err(MirrorError::NotConfigured)
        }

        async fn find_profile_by_code(&self, _: &str) -> Result<Option<RemoteProfile>, MirrorError> {
            Ok(None)
        }

        async fn create_friendship(&self, _: &str, _: &str) -> Result<(), MirrorError> {
            Ok(())
        }

        async fn list_friends(&self, _: &str) -> Result<Vec<RemoteProfile>, MirrorError> {
            Ok(Vec::new())
        }

        async fn record_completed_task(
            &self,
            _: &str,
            record: &CompletionRecord,
        ) -> Result<(), MirrorError> {
            self.maybe_fail()?;
            self.completions.lock().unwrap().push(record.title.clone());
            Ok(())
        }

        async fn completed_tasks_since(
            &self,
            _: &[String],
            _: DateTime<FixedOffset>,
        ) -> Result<Vec<RemoteCompletion>, MirrorError> {
            Ok(Vec::new())
        }

        async fn reaction_counts(&self, _: &str) -> Result<Vec<ReactionCount>, MirrorError> {
            Ok(Vec::new())
        }

        async fn add_reaction(&self, _: &str, _: &str, _: &str) -> Result<(), MirrorError> {
            Ok(())
        }
    }

    fn room(level: u8) -> MirrorJob {
        MirrorJob::UpsertRoom {
            user_id: "u-1".into(),
            room: RoomSnapshot {
                placed_items: Vec::new(),
                wall_color: "#FFF8F0".into(),
                floor_color: "#F5F0E8".into(),
                room_level: level,
                updated_at: DateTime::parse_from_rfc3339("2026-03-02T09:00:00+09:00").unwrap(),
            },
        }
    }

    fn completion(title: &str) -> MirrorJob {
        MirrorJob::RecordCompletion {
            user_id: "u-1".into(),
            record: CompletionRecord {
                title: title.into(),
                emoji: "✅".into(),
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn room_bursts_collapse_to_last_snapshot() {
        let recorder = Arc::new(Recorder::default());
        let (outbox, _worker) = MirrorOutbox::spawn(recorder.clone(), Duration::from_millis(2000));

        assert!(outbox.enqueue(room(1)));
        assert!(outbox.enqueue(room(2)));
        assert!(outbox.enqueue(room(3)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(recorder.rooms.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(*recorder.rooms.lock().unwrap(), vec![("u-1".to_string(), 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn completions_are_not_debounced() {
        let recorder = Arc::new(Recorder::default());
        let (outbox, worker) = MirrorOutbox::spawn(recorder.clone(), Duration::from_millis(2000));

        outbox.enqueue(completion("Stretch"));
        outbox.enqueue(completion("Water plants"));
        drop(outbox);
        worker.await.unwrap();

        assert_eq!(
            *recorder.completions.lock().unwrap(),
            vec!["Stretch".to_string(), "Water plants".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closing_flushes_pending_room() {
        let recorder = Arc::new(Recorder::default());
        let (outbox, worker) = MirrorOutbox::spawn(recorder.clone(), Duration::from_millis(2000));

        outbox.enqueue(room(4));
        drop(outbox);
        worker.await.unwrap();

        assert_eq!(recorder.rooms.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_swallowed() {
        let recorder = Arc::new(Recorder::failing(1));
        let (outbox, worker) = MirrorOutbox::spawn(recorder.clone(), Duration::from_millis(2000));

        outbox.enqueue(completion("lost"));
        outbox.enqueue(completion("kept"));
        drop(outbox);
        worker.await.unwrap();

        assert_eq!(*recorder.completions.lock().unwrap(), vec!["kept".to_string()]);
    }

    #[test]
    fn disabled_outbox_drops_jobs() {
        let outbox = MirrorOutbox::disabled();
        assert!(!outbox.is_enabled());
        assert!(!outbox.enqueue(completion("x")));
    }
}
