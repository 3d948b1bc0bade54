//! Background flush workers
//!
//! A worker waits on the debounced deadline, re-checking it on every wake in
//! case it moved, then runs the entity's write exactly once. Both workers run
//! the same loop, [`NvsSettings::flush_when_due`]; they differ only in how
//! they sleep.

use core::future::Future;

use nvs_settings_core::debounce::FlushPoll;
use nvs_settings_core::traits::TimeSource;
use nvs_settings_core::{NvsBackend, Settings};

use super::entity::NvsSettings;

impl<S, B, T> NvsSettings<S, B, T>
where
    S: Settings + Clone,
    B: NvsBackend + 'static,
    T: TimeSource,
{
    /// Sleep until the deadline passes, then write once
    ///
    /// `sleep_us` is awaited with the remaining time whenever the deadline has
    /// not been reached yet.
    pub(crate) async fn flush_when_due<F, Fut>(&self, mut sleep_us: F)
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = ()>,
    {
        loop {
            match self.debouncer.poll(self.time.now_us()) {
                FlushPoll::Wait(us) => sleep_us(us).await,
                FlushPoll::Flush => break,
            }
        }

        self.flush();
    }
}

#[cfg(feature = "std")]
impl<S, B, T> NvsSettings<S, B, T>
where
    S: Settings + Clone + Send + 'static,
    B: NvsBackend + 'static,
    T: TimeSource + 'static,
{
    /// Spawn a detached thread that flushes once the deadline passes
    pub(crate) fn start_flush_worker(&'static self) {
        let spawned = std::thread::Builder::new()
            .name(std::format!("nvs-write-{}", self.namespace()))
            .spawn(move || {
                embassy_futures::block_on(self.flush_when_due(|us| async move {
                    std::thread::sleep(std::time::Duration::from_micros(us))
                }))
            });

        if spawned.is_err() {
            crate::log_error!(
                "Cannot start flush worker for {}, writing now",
                self.namespace()
            );
            self.debouncer.poll(u64::MAX);
            self.flush();
        }
    }
}

#[cfg(all(feature = "embassy", not(feature = "std")))]
impl<S, B, T> NvsSettings<S, B, T>
where
    S: Settings + Clone + Send + 'static,
    B: NvsBackend + 'static,
    T: TimeSource + 'static,
{
    /// Wake the flush task
    pub(crate) fn start_flush_worker(&'static self) {
        self.wakeup.signal(());
    }

    /// Flush task body for Embassy targets
    ///
    /// Generic functions cannot be `#[embassy_executor::task]`s, so the
    /// application wraps this in a task of its own:
    ///
    /// ```ignore
    /// #[embassy_executor::task]
    /// async fn wifi_settings_task(settings: &'static WifiSettings) {
    ///     settings.run_flush_task().await
    /// }
    /// ```
    pub async fn run_flush_task(&self) -> ! {
        loop {
            self.wakeup.wait().await;
            self.flush_when_due(embassy_time::Timer::after_micros).await;
        }
    }
}
