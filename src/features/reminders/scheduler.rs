//! Reminder delivery loop
//!
//! Every `interval` the scheduler asks the store for due reminders, delivers
//! each one to the owner and marks it sent straight after. A failed delivery
//! leaves the reminder unsent for the next cycle; a store failure ends the
//! cycle early. Neither stops the loop.
//!
//! A crash between delivery and `mark_sent` re-delivers that reminder on the
//! next start.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Delivery through DeliverySink, per-reminder failure isolation, shutdown signal
//! - 1.0.0: Initial polling loop

use chrono::DateTime;
use chrono_tz::Tz;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::store::ReminderStore;
use crate::core::delivery::DeliverySink;
use crate::core::error::AssistantResult;
use crate::features::time::now_in;

/// Outcome of one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct ReminderScheduler {
    reminders: ReminderStore,
    sink: Arc<dyn DeliverySink>,
    recipient: u64,
    timezone: Tz,
    interval: Duration,
}

impl ReminderScheduler {
    pub fn new(
        reminders: ReminderStore,
        sink: Arc<dyn DeliverySink>,
        recipient: u64,
        timezone: Tz,
        interval: Duration,
    ) -> Self {
        Self {
            reminders,
            sink,
            recipient,
            timezone,
            interval,
        }
    }

    /// Poll until `shutdown` turns true (or its sender is dropped)
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "⏰ Reminder scheduler started (every {:?}, zone {})",
            self.interval,
            self.timezone.name()
        );

        loop {
            match self.run_cycle().await {
                Ok(report) if report != CycleReport::default() => {
                    info!(
                        "⏰ Reminder cycle: {} delivered, {} failed",
                        report.delivered, report.failed
                    );
                }
                Ok(_) => {}
                Err(e) => error!("Reminder cycle aborted: {e}"),
            }

            if *shutdown.borrow() {
                break;
            }

            let sender_gone = tokio::select! {
                _ = tokio::time::sleep(self.interval) => false,
                changed = shutdown.changed() => changed.is_err(),
            };

            if sender_gone || *shutdown.borrow() {
                break;
            }
        }

        info!("⏰ Reminder scheduler stopped");
    }

    pub async fn run_cycle(&self) -> AssistantResult<CycleReport> {
        self.run_cycle_at(&now_in(self.timezone)).await
    }

    /// One cycle against an explicit `now`
    pub async fn run_cycle_at(&self, now: &DateTime<Tz>) -> AssistantResult<CycleReport> {
        let due = self.reminders.due(now).await?;
        let mut report = CycleReport::default();

        for reminder in due {
            if let Err(e) = self.sink.deliver(self.recipient, &reminder.message).await {
                warn!("Reminder #{} not delivered, will retry: {e}", reminder.id);
                report.failed += 1;
                continue;
            }

            self.reminders.mark_sent(reminder.id).await?;
            report.delivered += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AssistantError;
    use crate::database::Database;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    /// Records deliveries; fails for any message in `reject`
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(u64, String)>>,
        reject: Mutex<HashSet<String>>,
    }

    impl RecordingSink {
        async fn sent(&self) -> Vec<(u64, String)> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        async fn deliver(&self, recipient: u64, text: &str) -> AssistantResult<()> {
            if self.reject.lock().await.contains(text) {
                return Err(AssistantError::delivery_failed("rejected"));
            }
            self.sent.lock().await.push((recipient, text.to_string()));
            Ok(())
        }
    }

    const OWNER: u64 = 7;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(2026, 10, 18, h, m, 0).unwrap()
    }

    async fn setup() -> (Database, ReminderStore, Arc<RecordingSink>, ReminderScheduler) {
        let db = Database::in_memory().await.unwrap();
        let store = ReminderStore::new(db.clone(), Tokyo);
        let sink = Arc::new(RecordingSink::default());
        let scheduler = ReminderScheduler::new(
            store.clone(),
            sink.clone(),
            OWNER,
            Tokyo,
            Duration::from_millis(10),
        );
        (db, store, sink, scheduler)
    }

    #[tokio::test]
    async fn test_due_reminder_delivered_once() {
        let (_db, store, sink, scheduler) = setup().await;
        store.add("call mom", &at(9, 0)).await.unwrap();

        let report = scheduler.run_cycle_at(&at(9, 1)).await.unwrap();
        assert_eq!(report, CycleReport { delivered: 1, failed: 0 });
        assert_eq!(sink.sent().await, vec![(OWNER, "call mom".to_string())]);

        assert!(store.due(&at(9, 2)).await.unwrap().is_empty());
        let again = scheduler.run_cycle_at(&at(9, 2)).await.unwrap();
        assert_eq!(again, CycleReport::default());
        assert_eq!(sink.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_future_reminder_waits() {
        let (_db, store, sink, scheduler) = setup().await;
        store.add("later", &at(12, 0)).await.unwrap();

        scheduler.run_cycle_at(&at(11, 59)).await.unwrap();
        assert!(sink.sent().await.is_empty());

        scheduler.run_cycle_at(&at(12, 0)).await.unwrap();
        assert_eq!(sink.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_delivers_in_remind_at_order() {
        let (_db, store, sink, scheduler) = setup().await;
        store.add("second", &at(8, 30)).await.unwrap();
        store.add("first", &at(8, 0)).await.unwrap();

        scheduler.run_cycle_at(&at(9, 0)).await.unwrap();
        let messages: Vec<String> = sink.sent().await.into_iter().map(|(_, m)| m).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_retried_and_does_not_block_others() {
        let (_db, store, sink, scheduler) = setup().await;
        store.add("flaky", &at(8, 0)).await.unwrap();
        store.add("fine", &at(8, 30)).await.unwrap();
        sink.reject.lock().await.insert("flaky".to_string());

        let report = scheduler.run_cycle_at(&at(9, 0)).await.unwrap();
        assert_eq!(report, CycleReport { delivered: 1, failed: 1 });
        assert_eq!(sink.sent().await, vec![(OWNER, "fine".to_string())]);

        let pending = store.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message, "flaky");

        sink.reject.lock().await.clear();
        let report = scheduler.run_cycle_at(&at(9, 1)).await.unwrap();
        assert_eq!(report, CycleReport { delivered: 1, failed: 0 });
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_aborts_cycle() {
        let (db, _store, sink, scheduler) = setup().await;
        db.execute_batch("DROP TABLE reminders").await.unwrap();

        assert!(matches!(
            scheduler.run_cycle_at(&at(9, 0)).await,
            Err(AssistantError::StoreUnavailable(_))
        ));
        assert!(sink.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_loop_survives_failed_cycles_and_stops_on_shutdown() {
        let (db, _store, _sink, scheduler) = setup().await;
        db.execute_batch("DROP TABLE reminders").await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_loop_delivers_in_background() {
        let (_db, store, sink, scheduler) = setup().await;
        let past = now_in(Tokyo) - chrono::Duration::minutes(1);
        store.add("overdue", &past).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sink.sent().await, vec![(OWNER, "overdue".to_string())]);
    }
}
