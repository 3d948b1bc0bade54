//! Debounced background writes against the mock backend with real threads

#![cfg(feature = "std")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

use nvs_settings::platform::StdTime;
use nvs_settings::{MockNvs, NvsBackend, NvsPartition, NvsSettings, NvsStream, Result, Settings};

/// Shortened quiet period so the suite stays fast
const DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default)]
struct Counter {
    value: u32,
}

impl Settings for Counter {
    fn namespace(&self) -> &'static str {
        "counter"
    }

    fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()> {
        self.value = stream.read_u32("value", 0)?;
        Ok(())
    }

    fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()> {
        stream.write_u32("value", self.value)
    }
}

type CounterSettings = NvsSettings<Counter, MockNvs, StdTime>;

fn leak<V>(value: V) -> &'static V {
    Box::leak(Box::new(value))
}

fn counter_settings() -> &'static CounterSettings {
    let nvs = leak(NvsPartition::new(MockNvs::new()));
    leak(NvsSettings::with_delay(
        nvs,
        Counter::default(),
        StdTime::new(),
        DELAY.as_micros() as u64,
    ))
}

fn commits(settings: &CounterSettings) -> u32 {
    settings.nvs().backend().commit_count()
}

/// Poll until `commits` reaches `expected`, returning when it happened
fn wait_for_commits(settings: &CounterSettings, expected: u32) -> Instant {
    let give_up = Instant::now() + Duration::from_secs(5);

    while commits(settings) < expected {
        assert!(Instant::now() < give_up, "flush did not happen in time");
        thread::sleep(Duration::from_millis(2));
    }

    Instant::now()
}

fn stored_value(settings: &CounterSettings) -> u32 {
    let stream = NvsStream::open_for_reading(settings.nvs(), "counter").unwrap();
    let value = stream.read_u32("value", 0).unwrap();
    stream.close();
    value
}

#[test]
fn burst_of_changes_is_written_once_after_last_change() {
    let settings = counter_settings();

    let mut last_call = Instant::now();
    for value in 1..=5 {
        last_call = Instant::now();
        settings.update(|c| c.value = value);
        thread::sleep(Duration::from_millis(20));
    }
    assert!(settings.flush_pending());

    // Half a window after the last change nothing has been written
    thread::sleep(DELAY / 2);
    assert_eq!(commits(settings), 0);

    let flushed_at = wait_for_commits(settings, 1);
    assert!(flushed_at.duration_since(last_call) >= DELAY);
    assert!(!settings.flush_pending());
    assert_eq!(stored_value(settings), 5);

    // No trailing flush
    thread::sleep(DELAY * 2);
    assert_eq!(commits(settings), 1);
}

#[test]
fn schedule_write_does_not_block() {
    let settings = counter_settings();

    let started = Instant::now();
    settings.update(|c| c.value = 1);
    settings.schedule_write();
    assert!(started.elapsed() < DELAY / 2);

    wait_for_commits(settings, 1);
}

#[test]
fn separate_bursts_are_written_separately() {
    let settings = counter_settings();

    settings.update(|c| c.value = 10);
    wait_for_commits(settings, 1);
    assert_eq!(stored_value(settings), 10);

    settings.update(|c| c.value = 20);
    settings.update(|c| c.value = 30);
    wait_for_commits(settings, 2);
    assert_eq!(stored_value(settings), 30);

    thread::sleep(DELAY * 2);
    assert_eq!(commits(settings), 2);
}

#[test]
fn failed_flush_is_retried_by_next_schedule() {
    let settings = counter_settings();
    settings.nvs().ensure_initialized().unwrap();
    settings
        .nvs()
        .backend()
        .inject_commit_failure(nvs_settings::BackendError::Io);

    settings.update(|c| c.value = 7);
    thread::sleep(DELAY * 2);
    assert_eq!(commits(settings), 0);
    assert!(!settings.flush_pending());

    settings.schedule_write();
    wait_for_commits(settings, 1);
    assert_eq!(stored_value(settings), 7);
}

// ----------------------------------------------------------------------------
// Re-arming from inside the flush
// ----------------------------------------------------------------------------

static REARMING: OnceLock<&'static NvsSettings<Rearming, MockNvs, StdTime>> = OnceLock::new();
static REARM_ONCE: AtomicBool = AtomicBool::new(true);

#[derive(Debug, Clone, Default)]
struct Rearming {
    value: u8,
}

impl Settings for Rearming {
    fn namespace(&self) -> &'static str {
        "rearming"
    }

    fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()> {
        self.value = stream.read_u8("value", 0)?;
        Ok(())
    }

    fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()> {
        if REARM_ONCE.swap(false, Ordering::SeqCst) {
            if let Some(&settings) = REARMING.get() {
                settings.schedule_write();
            }
        }

        stream.write_u8("value", self.value)
    }
}

#[test]
fn schedule_during_flush_arms_exactly_one_more_flush() {
    let nvs = leak(NvsPartition::new(MockNvs::new()));
    let settings = leak(NvsSettings::with_delay(
        nvs,
        Rearming::default(),
        StdTime::new(),
        DELAY.as_micros() as u64,
    ));
    assert!(REARMING.set(settings).is_ok());

    settings.update(|r| r.value = 1);

    let give_up = Instant::now() + Duration::from_secs(5);
    while nvs.backend().commit_count() < 2 {
        assert!(Instant::now() < give_up, "second flush did not happen");
        thread::sleep(Duration::from_millis(2));
    }

    thread::sleep(DELAY * 2);
    assert_eq!(nvs.backend().commit_count(), 2);
    assert!(!settings.flush_pending());
}
