//! Deadline reminders.
//!
//! [`due_today`] finds open tasks and subtasks whose deadline is the current
//! local day. A [`Notifier`] sends each [`DeadlineEvent`] to its
//! [`NotifyChannel`]s, and a [`DeadlineWatcher`] repeats the check on an
//! interval without reminding twice about the same item on the same day.

mod channels;
mod events;

pub use channels::{ConsoleChannel, LogChannel, NotifyChannel};
pub use events::{due_today, DeadlineEvent};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::TasksResult;
use crate::storage::Storage;
use crate::time;

/// Central reminder dispatcher.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (notifications turned off in config).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send a reminder and wait for every channel, returning per-channel results.
    pub async fn notify_and_wait(&self, event: &DeadlineEvent) -> Vec<(String, TasksResult<()>)> {
        if !self.has_channels() {
            return vec![];
        }

        let mut results = vec![];
        for channel in &self.channels {
            if !channel.enabled() {
                continue;
            }
            results.push((channel.name().to_string(), channel.send(event).await));
        }
        results
    }
}

/// Keys already sent on `day`
#[derive(Debug)]
struct SentLog {
    day: Option<NaiveDate>,
    keys: HashSet<String>,
}

/// Periodically checks one user's tasks for deadlines falling today.
pub struct DeadlineWatcher {
    storage: Arc<dyn Storage>,
    user_id: String,
    notifier: Notifier,
    interval: Duration,
    sent: Mutex<SentLog>,
}

impl DeadlineWatcher {
    pub fn new(
        storage: Arc<dyn Storage>,
        user_id: impl Into<String>,
        notifier: Notifier,
        interval: Duration,
    ) -> Self {
        Self {
            storage,
            user_id: user_id.into(),
            notifier,
            interval,
            sent: Mutex::new(SentLog {
                day: None,
                keys: HashSet::new(),
            }),
        }
    }

    /// Run one check for `today` and deliver reminders not yet sent that day.
    /// Returns the reminders delivered by this call.
    ///
    /// A reminder counts as sent once any channel accepts it. When every
    /// channel fails, the next check retries it.
    pub async fn check_once(&self, today: NaiveDate) -> TasksResult<Vec<DeadlineEvent>> {
        let tasks = self.storage.load_tasks(&self.user_id).await?;
        let due = due_today(&tasks, today);

        // Held across delivery so overlapping checks cannot send the same key
        let mut sent = self.sent.lock().await;
        if sent.day != Some(today) {
            sent.day = Some(today);
            sent.keys.clear();
        }

        let mut delivered = vec![];
        for event in due {
            let key = event.key();
            if sent.keys.contains(&key) {
                continue;
            }

            let results = self.notifier.notify_and_wait(&event).await;
            let mut accepted = results.is_empty();
            for (channel, result) in results {
                match result {
                    Ok(()) => accepted = true,
                    Err(e) => {
                        warn!(channel = %channel, key = %key, error = %e, "Reminder not delivered");
                    }
                }
            }

            if accepted {
                sent.keys.insert(key);
                delivered.push(event);
            }
        }

        debug!(
            user_id = %self.user_id,
            %today,
            sent = delivered.len(),
            "Deadline check finished"
        );
        Ok(delivered)
    }

    /// Check on every interval tick until `cancel` fires. A failed check is
    /// logged and retried on the next tick.
    pub async fn run(&self, cancel: CancellationToken) -> TasksResult<()> {
        info!(
            user_id = %self.user_id,
            interval_secs = self.interval.as_secs(),
            "Deadline watcher started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    info!("Deadline watcher stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.check_once(time::today()).await {
                        warn!(error = %e, "Deadline check failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Subtask, Task};
    use crate::errors::TasksError;
    use crate::storage::FileStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingChannel {
        events: Mutex<Vec<DeadlineEvent>>,
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, event: &DeadlineEvent) -> TasksResult<()> {
            self.events.lock().await.push(event.clone());
            Ok(())
        }
    }

    struct FailingChannel;

    #[async_trait]
    impl NotifyChannel for FailingChannel {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn send(&self, _event: &DeadlineEvent) -> TasksResult<()> {
            Err(TasksError::ChannelError {
                channel: "failing".to_string(),
                reason: "unreachable".to_string(),
            })
        }
    }

    /// Fails the first `failures` sends, then accepts
    struct FlakyChannel {
        failures: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl NotifyChannel for FlakyChannel {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn send(&self, _event: &DeadlineEvent) -> TasksResult<()> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(TasksError::ChannelError {
                    channel: "flaky".to_string(),
                    reason: "offline".to_string(),
                });
            }
            Ok(())
        }
    }

    fn sample_event() -> DeadlineEvent {
        DeadlineEvent::TaskDueToday {
            task_id: "1".to_string(),
            title: "Report".to_string(),
        }
    }

    #[test]
    fn test_disabled_notifier() {
        let notifier = Notifier::disabled();
        assert!(!notifier.has_channels());
        assert_eq!(notifier.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_and_wait_collects_results() {
        let recording = Arc::new(RecordingChannel::default());
        let notifier = Notifier::with_channels(vec![
            recording.clone(),
            Arc::new(FailingChannel),
            Arc::new(LogChannel),
        ]);
        assert_eq!(notifier.channel_count(), 3);

        let results = notifier.notify_and_wait(&sample_event()).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert_eq!(recording.events.lock().await.len(), 1);
    }

    async fn seeded_storage(today: NaiveDate) -> (TempDir, Arc<FileStorage>) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Arc::new(FileStorage::new(temp_dir.path()));
        storage.initialize().await.unwrap();

        let mut task = Task::new("1", "Report");
        task.manual_deadline = time::start_of_local_day(today) + chrono::Duration::hours(9);
        let mut sub = Subtask::new(1, "1", "Charts");
        sub.deadline = time::start_of_local_day(today);
        task.add_subtask(sub);
        storage.add_task("u1", task).await.unwrap();
        (temp_dir, storage)
    }

    async fn watcher_fixture(today: NaiveDate) -> (TempDir, Arc<RecordingChannel>, DeadlineWatcher) {
        let (temp_dir, storage) = seeded_storage(today).await;
        let recording = Arc::new(RecordingChannel::default());
        let notifier = Notifier::with_channels(vec![recording.clone()]);
        let watcher = DeadlineWatcher::new(storage, "u1", notifier, Duration::from_secs(60));
        (temp_dir, recording, watcher)
    }

    #[tokio::test]
    async fn test_watcher_sends_each_reminder_once_per_day() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let (_temp, recording, watcher) = watcher_fixture(today).await;

        let first = watcher.check_once(today).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = watcher.check_once(today).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(recording.events.lock().await.len(), 2);

        // Nothing is due the next day
        let tomorrow = today.succ_opt().unwrap();
        assert!(watcher.check_once(tomorrow).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watcher_forgets_keys_on_new_day() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let (_temp, _recording, watcher) = watcher_fixture(today).await;

        assert_eq!(watcher.check_once(today).await.unwrap().len(), 2);
        let tomorrow = today.succ_opt().unwrap();
        watcher.check_once(tomorrow).await.unwrap();
        assert_eq!(watcher.check_once(today).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_watcher_retries_undelivered_reminders() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let (_temp, storage) = seeded_storage(today).await;
        let flaky = Arc::new(FlakyChannel {
            failures: 2,
            attempts: AtomicUsize::new(0),
        });
        let notifier = Notifier::with_channels(vec![flaky.clone(), Arc::new(FailingChannel)]);
        let watcher = DeadlineWatcher::new(storage, "u1", notifier, Duration::from_secs(60));

        // Both reminders fail on every channel
        assert!(watcher.check_once(today).await.unwrap().is_empty());

        let second = watcher.check_once(today).await.unwrap();
        assert_eq!(second.len(), 2);
        assert!(watcher.check_once(today).await.unwrap().is_empty());
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_disabled_notifier_marks_reminders_handled() {
        let today = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let (_temp, storage) = seeded_storage(today).await;
        let watcher =
            DeadlineWatcher::new(storage, "u1", Notifier::disabled(), Duration::from_secs(60));

        assert_eq!(watcher.check_once(today).await.unwrap().len(), 2);
        assert!(watcher.check_once(today).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_watcher_stops_on_cancel() {
        let today = time::today();
        let (_temp, _recording, watcher) = watcher_fixture(today).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        watcher.run(cancel).await.unwrap();
    }
}
