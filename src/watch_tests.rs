//! Tests for the watch module.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::heartbeat::HeartbeatRecord;
use crate::notify::{DeliveryReport, Notifier};
use crate::resolver::{AddressResolver, ResolveError, SourceError};
use crate::state::{FileStateStore, StateStore};
use crate::time::Clock;
use crate::transport::HttpError;

use super::*;

const DAY: u64 = 86_400;
const NOW: u64 = 1_750_000_000;

/// Resolver answering from a script and recording when it was asked.
#[derive(Debug, Default)]
struct ScriptedResolver {
    answers: Mutex<VecDeque<Option<String>>>,
    calls: Mutex<Vec<tokio::time::Instant>>,
}

impl ScriptedResolver {
    fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn returning(address: &str) -> Self {
        Self::new(&[Some(address)])
    }

    fn unavailable() -> Self {
        Self::new(&[None])
    }

    fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().clone()
    }
}

fn unavailable_error() -> ResolveError {
    ResolveError::Unavailable {
        primary: SourceError::Http(HttpError::Timeout),
        secondary: SourceError::Http(HttpError::Timeout),
    }
}

impl AddressResolver for ScriptedResolver {
    async fn resolve(&self) -> Result<String, ResolveError> {
        self.calls.lock().unwrap().push(tokio::time::Instant::now());
        let answer = self.answers.lock().unwrap().pop_front().flatten();
        answer.ok_or_else(unavailable_error)
    }
}

/// Notifier that records every message.
#[derive(Debug, Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, title: &str, body: &str) -> DeliveryReport {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        DeliveryReport {
            delivered: 1,
            failed: 0,
        }
    }
}

struct FixedClock(SystemTime);

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

struct Fixture {
    dir: TempDir,
    store: FileStateStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::in_dir(dir.path());
        Self { dir, store }
    }

    fn with_address(self, address: &str) -> Self {
        self.store.save_address(address).unwrap();
        self
    }

    fn with_heartbeat(self, record: HeartbeatRecord) -> Self {
        self.store.save_heartbeat(&record).unwrap();
        self
    }

    fn watcher(
        &self,
        resolver: ScriptedResolver,
    ) -> Watcher<ScriptedResolver, RecordingNotifier, FileStateStore, FixedClock> {
        Watcher::new(
            resolver,
            RecordingNotifier::default(),
            FileStateStore::in_dir(self.dir.path()),
            "PubIP Watch",
        )
        .with_clock(FixedClock(at(NOW)))
    }

    fn stored_address(&self) -> Option<String> {
        std::fs::read_to_string(self.store.address_path()).ok()
    }

    fn stored_heartbeat(&self) -> Option<HeartbeatRecord> {
        self.store
            .heartbeat_path()
            .exists()
            .then(|| self.store.load_heartbeat(at(0)).unwrap())
    }
}

#[allow(clippy::cast_precision_loss)]
fn record(start: u64, last_change: u64, count: u64) -> HeartbeatRecord {
    HeartbeatRecord {
        start_time: start as f64,
        last_change_time: last_change as f64,
        change_count: count,
    }
}

mod normal_mode {
    use super::*;

    #[tokio::test]
    async fn first_run_counts_as_change() {
        let fixture = Fixture::new();
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Changed {
                previous: String::new(),
                current: "203.0.113.5".to_string()
            }
        );
        let sent = watcher.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "PubIP Watch");
        assert!(sent[0].1.starts_with("Public IP Check-In - "));
        assert!(sent[0].1.ends_with("\n\n203.0.113.5"));
        assert_eq!(fixture.stored_address().as_deref(), Some("203.0.113.5"));

        let heartbeat = fixture.stored_heartbeat().unwrap();
        assert_eq!(heartbeat.change_count, 1);
        assert_eq!(heartbeat, record(NOW, NOW, 1));
    }

    #[tokio::test]
    async fn changed_address_updates_state() {
        let fixture = Fixture::new()
            .with_address("198.51.100.1")
            .with_heartbeat(record(NOW - 3 * DAY, NOW - 10 * DAY, 4));
        let watcher = fixture.watcher(ScriptedResolver::returning("198.51.100.2"));

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert!(matches!(outcome, Outcome::Changed { ref previous, .. } if previous == "198.51.100.1"));
        assert_eq!(watcher.notifier().sent().len(), 1);
        assert!(watcher.notifier().sent()[0].1.contains("198.51.100.2"));
        assert_eq!(fixture.stored_address().as_deref(), Some("198.51.100.2"));
        assert_eq!(
            fixture.stored_heartbeat().unwrap(),
            record(NOW - 3 * DAY, NOW, 5)
        );
    }

    #[tokio::test]
    async fn unchanged_address_sends_and_writes_nothing() {
        let fixture = Fixture::new().with_address("203.0.113.5");
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Unchanged {
                address: "203.0.113.5".to_string()
            }
        );
        assert!(watcher.notifier().sent().is_empty());
        assert_eq!(fixture.stored_address().as_deref(), Some("203.0.113.5"));
        assert!(fixture.stored_heartbeat().is_none());
    }

    #[tokio::test]
    async fn unchanged_address_leaves_heartbeat_file_untouched() {
        let original = record(NOW - DAY, NOW - DAY, 2);
        let fixture = Fixture::new()
            .with_address("203.0.113.5")
            .with_heartbeat(original);
        let before = std::fs::read(fixture.store.heartbeat_path()).unwrap();
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        watcher.run(Mode::Normal).await.unwrap();

        let after = std::fs::read(fixture.store.heartbeat_path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn stored_address_with_newline_still_matches() {
        let fixture = Fixture::new();
        std::fs::write(fixture.store.address_path(), "203.0.113.5\n").unwrap();
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert!(matches!(outcome, Outcome::Unchanged { .. }));
    }

    #[tokio::test]
    async fn unavailable_address_touches_nothing() {
        let fixture = Fixture::new().with_address("203.0.113.5");
        let watcher = fixture.watcher(ScriptedResolver::unavailable());

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert_eq!(outcome, Outcome::Unavailable);
        assert!(watcher.notifier().sent().is_empty());
        assert_eq!(fixture.stored_address().as_deref(), Some("203.0.113.5"));
        assert!(fixture.stored_heartbeat().is_none());
    }

    #[tokio::test]
    async fn empty_answer_on_first_run_is_unchanged() {
        let fixture = Fixture::new();
        let watcher = fixture.watcher(ScriptedResolver::returning(""));

        let outcome = watcher.run(Mode::Normal).await.unwrap();

        assert!(matches!(outcome, Outcome::Unchanged { .. }));
        assert!(fixture.stored_address().is_none());
    }

    #[tokio::test]
    async fn custom_title_is_used() {
        let fixture = Fixture::new();
        let watcher = Watcher::new(
            ScriptedResolver::returning("203.0.113.5"),
            RecordingNotifier::default(),
            FileStateStore::in_dir(fixture.dir.path()),
            "Cabin",
        );

        watcher.run(Mode::Normal).await.unwrap();

        assert_eq!(watcher.notifier().sent()[0].0, "Cabin");
    }
}

mod heartbeat {
    use super::*;

    #[tokio::test]
    async fn fires_after_thirty_days_and_resets_window() {
        let fixture = Fixture::new()
            .with_address("203.0.113.5")
            .with_heartbeat(record(NOW - 30 * DAY, NOW - 40 * DAY, 6));
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        watcher.run(Mode::Normal).await.unwrap();

        let sent = watcher.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "PubIP Watch Heartbeat");
        assert!(sent[0].1.contains("30 days"));
        assert!(sent[0].1.contains("40 days"));
        assert!(sent[0].1.contains("Total address changes: 6"));
        assert_eq!(
            fixture.stored_heartbeat().unwrap(),
            record(NOW, NOW - 40 * DAY, 6)
        );
    }

    #[tokio::test]
    async fn silent_before_thirty_days() {
        let original = record(NOW - 30 * DAY + 1, NOW - 40 * DAY, 6);
        let fixture = Fixture::new()
            .with_address("203.0.113.5")
            .with_heartbeat(original);
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        watcher.run(Mode::Normal).await.unwrap();

        assert!(watcher.notifier().sent().is_empty());
        assert_eq!(fixture.stored_heartbeat().unwrap(), original);
    }

    #[tokio::test]
    async fn fires_even_when_address_is_unavailable() {
        let fixture = Fixture::new().with_heartbeat(record(NOW - 31 * DAY, NOW - 31 * DAY, 0));
        let watcher = fixture.watcher(ScriptedResolver::unavailable());

        watcher.run(Mode::Normal).await.unwrap();

        assert_eq!(watcher.notifier().sent().len(), 1);
        assert_eq!(fixture.stored_heartbeat().unwrap().start_time, record(NOW, 0, 0).start_time);
    }

    #[tokio::test]
    async fn heartbeat_then_change_sends_both_in_order() {
        let fixture = Fixture::new()
            .with_address("198.51.100.1")
            .with_heartbeat(record(NOW - 45 * DAY, NOW - 45 * DAY, 1));
        let watcher = fixture.watcher(ScriptedResolver::returning("198.51.100.2"));

        watcher.run(Mode::Normal).await.unwrap();

        let titles: Vec<_> = watcher.notifier().sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(titles, ["PubIP Watch Heartbeat", "PubIP Watch"]);
        assert_eq!(fixture.stored_heartbeat().unwrap(), record(NOW, NOW, 2));
    }

    #[tokio::test]
    async fn malformed_record_is_fatal() {
        let fixture = Fixture::new();
        std::fs::write(fixture.store.heartbeat_path(), "{oops").unwrap();
        let watcher = fixture.watcher(ScriptedResolver::returning("203.0.113.5"));

        let result = watcher.run(Mode::Normal).await;

        assert!(matches!(
            result,
            Err(RunError::State(StateError::Malformed { .. }))
        ));
        assert!(watcher.notifier().sent().is_empty());
        assert!(watcher.resolver().call_times().is_empty());
    }
}

mod diagnostic_mode {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn polls_every_ninety_seconds_for_five_minutes() {
        let fixture = Fixture::new();
        let watcher = fixture.watcher(ScriptedResolver::new(&[
            Some("203.0.113.5"),
            None,
            Some("203.0.113.5"),
            Some("203.0.113.6"),
        ]));
        let start = tokio::time::Instant::now();

        let outcome = watcher.run(Mode::Diagnostic).await.unwrap();

        assert_eq!(outcome, Outcome::DiagnosticComplete { polls: 4 });
        let offsets: Vec<_> = watcher
            .resolver()
            .call_times()
            .iter()
            .map(|t| t.duration_since(start).as_secs())
            .collect();
        assert_eq!(offsets, [0, 90, 180, 270]);
        assert!(start.elapsed() >= Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn sends_exactly_one_test_notification() {
        let fixture = Fixture::new();
        let watcher = fixture.watcher(ScriptedResolver::new(&[None, None, None, None]));

        watcher.run(Mode::Diagnostic).await.unwrap();

        let sent = watcher.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "PubIP Watch Test");
        assert_eq!(sent[0].1, TEST_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_touch_address_state() {
        let fixture = Fixture::new().with_address("198.51.100.1");
        let watcher = fixture.watcher(ScriptedResolver::new(&[Some("203.0.113.5"); 4]));

        watcher.run(Mode::Diagnostic).await.unwrap();

        assert_eq!(fixture.stored_address().as_deref(), Some("198.51.100.1"));
        assert!(fixture.stored_heartbeat().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_still_runs_first() {
        let fixture = Fixture::new().with_heartbeat(record(NOW - 60 * DAY, NOW - 60 * DAY, 0));
        let watcher = fixture.watcher(ScriptedResolver::new(&[None; 4]));

        watcher.run(Mode::Diagnostic).await.unwrap();

        let titles: Vec<_> = watcher.notifier().sent().into_iter().map(|(t, _)| t).collect();
        assert_eq!(titles, ["PubIP Watch Heartbeat", "PubIP Watch Test"]);
        assert_eq!(fixture.stored_heartbeat().unwrap().start_time, record(NOW, 0, 0).start_time);
    }
}

#[test]
fn mode_from_verbose_flag() {
    assert_eq!(Mode::from_verbose(false), Mode::Normal);
    assert_eq!(Mode::from_verbose(true), Mode::Diagnostic);
}

#[test]
fn check_in_message_layout() {
    let message = check_in_message("203.0.113.5", at(NOW));
    let (header, address) = message.split_once("\n\n").unwrap();

    assert!(header.starts_with("Public IP Check-In - "));
    let date = header.trim_start_matches("Public IP Check-In - ");
    assert_eq!(date.len(), 10);
    assert_eq!(date.matches('/').count(), 2);
    assert_eq!(address, "203.0.113.5");
}
