//! Settings entity with debounced persistence

#[cfg(all(feature = "embassy", not(feature = "std")))]
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use nvs_settings_core::debounce::{WriteDebouncer, DEFAULT_WRITE_DELAY_US};
use nvs_settings_core::partition::{InitOutcome, NvsPartition};
use nvs_settings_core::traits::TimeSource;
use nvs_settings_core::{NvsBackend, Result, Settings};

use crate::traits::sync::{CriticalSectionState, SharedState};

/// One settings group bound to the process-wide NVS partition
///
/// Application code changes the in-memory values and calls
/// [`schedule_write`](Self::schedule_write) (or does both with
/// [`update`](Self::update)). The write happens once, 2.5 s after the last
/// request, on a background worker:
/// - `std`: a short-lived thread per armed deadline
/// - `embassy`: a long-lived task running [`run_flush_task`](Self::run_flush_task)
///
/// Entities are shared as `&'static` references, like the partition itself.
///
/// # Example
///
/// ```
/// use nvs_settings::platform::StdTime;
/// use nvs_settings::settings::NvsSettings;
/// use nvs_settings_core::backend::NvsBackend;
/// use nvs_settings_core::mock::MockNvs;
/// use nvs_settings_core::partition::NvsPartition;
/// use nvs_settings_core::{NvsStream, Result, Settings};
///
/// #[derive(Clone, Default)]
/// struct Wifi {
///     channel: u8,
/// }
///
/// impl Settings for Wifi {
///     fn namespace(&self) -> &'static str {
///         "wifi"
///     }
///
///     fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()> {
///         self.channel = stream.read_u8("channel", 6)?;
///         Ok(())
///     }
///
///     fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()> {
///         stream.write_u8("channel", self.channel)
///     }
/// }
///
/// static NVS: NvsPartition<MockNvs> = NvsPartition::new(MockNvs::new());
///
/// let wifi = NvsSettings::new(&NVS, Wifi::default(), StdTime::new());
/// wifi.read().unwrap();
/// assert_eq!(wifi.with(|w| w.channel), 6);
///
/// wifi.with_mut(|w| w.channel = 11);
/// wifi.write().unwrap();
/// assert_eq!(NVS.backend().stored_len("wifi", "channel"), Some(1));
/// ```
pub struct NvsSettings<S, B, T>
where
    B: NvsBackend + 'static,
{
    pub(crate) nvs: &'static NvsPartition<B>,
    pub(crate) values: CriticalSectionState<S>,
    pub(crate) debouncer: WriteDebouncer,
    pub(crate) time: T,
    #[cfg(all(feature = "embassy", not(feature = "std")))]
    pub(crate) wakeup: Signal<CriticalSectionRawMutex, ()>,
}

impl<S, B, T> NvsSettings<S, B, T>
where
    S: Settings + Clone,
    B: NvsBackend + 'static,
    T: TimeSource,
{
    /// Entity with the default 2.5 s quiet period
    pub fn new(nvs: &'static NvsPartition<B>, values: S, time: T) -> Self {
        Self::with_delay(nvs, values, time, DEFAULT_WRITE_DELAY_US)
    }

    /// Entity with a custom quiet period in microseconds
    pub fn with_delay(nvs: &'static NvsPartition<B>, values: S, time: T, delay_us: u64) -> Self {
        Self {
            nvs,
            values: CriticalSectionState::new(values),
            debouncer: WriteDebouncer::with_delay(delay_us),
            time,
            #[cfg(all(feature = "embassy", not(feature = "std")))]
            wakeup: Signal::new(),
        }
    }

    /// Partition the values are persisted to
    pub fn nvs(&self) -> &'static NvsPartition<B> {
        self.nvs
    }

    /// Namespace of the settings group
    pub fn namespace(&self) -> &'static str {
        self.values.with(|values| values.namespace())
    }

    /// Copy of the current in-memory values
    pub fn values(&self) -> S {
        self.values.snapshot()
    }

    /// Inspect the in-memory values
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.values.with(f)
    }

    /// Change the in-memory values without scheduling a write
    ///
    /// The values stay locked while `f` runs; `f` must not call back into
    /// this entity (including [`schedule_write`](Self::schedule_write)).
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.values.with_mut(f)
    }

    /// True while a debounced write is armed and has not started
    pub fn flush_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Load the values from storage, keeping defaults for absent keys
    pub fn read(&self) -> Result<()> {
        self.prepare_partition()?;

        let mut loaded = self.values.snapshot();
        loaded.read_from(self.nvs)?;
        self.values.replace(loaded);

        crate::log_debug!("Read {}", self.namespace());
        Ok(())
    }

    /// Persist the current values immediately and commit
    pub fn write(&self) -> Result<()> {
        let snapshot = self.values.snapshot();
        crate::log_info!("Writing {}", snapshot.namespace());

        self.prepare_partition()?;
        snapshot.write_to(self.nvs)
    }

    fn prepare_partition(&self) -> Result<()> {
        if let InitOutcome::Recovered(status) = self.nvs.ensure_initialized()? {
            crate::log_warn!(
                "NVS partition erased and reinitialized ({})",
                status.as_str()
            );
        }

        Ok(())
    }

    /// Flush action run by the background worker
    pub(crate) fn flush(&self) {
        if let Err(e) = self.write() {
            crate::log_error!("Writing {} failed: {}", self.namespace(), e.as_str());
        }
    }
}

impl<S, B, T> NvsSettings<S, B, T>
where
    S: Settings + Clone + Send + 'static,
    B: NvsBackend + 'static,
    T: TimeSource + 'static,
{
    /// Request a write 2.5 s (the quiet period) after this call
    ///
    /// Returns immediately. Calls made while a write is pending only move its
    /// deadline, so a burst of changes results in one write.
    pub fn schedule_write(&'static self) {
        if self.debouncer.schedule(self.time.now_us()) {
            crate::log_debug!("Write of {} scheduled", self.namespace());
            self.start_flush_worker();
        }
    }

    /// Change the in-memory values and schedule a write
    ///
    /// The write is scheduled after `f` returns; `f` must not call back into
    /// this entity.
    pub fn update<R>(&'static self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = self.values.with_mut(f);
        self.schedule_write();
        result
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use nvs_settings_core::error::{BackendError, NvsError};
    use nvs_settings_core::mock::MockNvs;
    use nvs_settings_core::traits::MockTime;
    use nvs_settings_core::NvsStream;

    #[derive(Debug, Clone, PartialEq)]
    struct MotorSettings {
        max_rpm: u16,
        trim: i16,
        ramp: f32,
        label: String,
        calibration: Vec<u32>,
    }

    impl Default for MotorSettings {
        fn default() -> Self {
            Self {
                max_rpm: 3_000,
                trim: 0,
                ramp: 0.5,
                label: String::from("left"),
                calibration: Vec::new(),
            }
        }
    }

    impl Settings for MotorSettings {
        fn namespace(&self) -> &'static str {
            "motor"
        }

        fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()> {
            let defaults = Self::default();
            self.max_rpm = stream.read_u16("max_rpm", defaults.max_rpm)?;
            self.trim = stream.read_i16("trim", defaults.trim)?;
            self.ramp = stream.read_f32("ramp", defaults.ramp)?;
            self.label = stream.read_string("label", &defaults.label)?;

            let count = stream.read_object_count::<u32>("calibration")?;
            let mut calibration = vec![0u32; count];
            stream.read_objects("calibration", &mut calibration)?;
            self.calibration = calibration;
            Ok(())
        }

        fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()> {
            stream.write_u16("max_rpm", self.max_rpm)?;
            stream.write_i16("trim", self.trim)?;
            stream.write_f32("ramp", self.ramp)?;
            stream.write_string("label", &self.label)?;
            stream.write_objects("calibration", &self.calibration)?;
            Ok(())
        }
    }

    fn leak<V>(value: V) -> &'static V {
        Box::leak(Box::new(value))
    }

    fn entity() -> NvsSettings<MotorSettings, MockNvs, MockTime> {
        let nvs = leak(NvsPartition::new(MockNvs::new()));
        NvsSettings::new(nvs, MotorSettings::default(), MockTime::new())
    }

    #[test]
    fn test_read_without_stored_values_keeps_defaults() {
        let settings = entity();
        settings.with_mut(|s| s.max_rpm = 1);

        settings.read().unwrap();
        assert_eq!(settings.values(), MotorSettings::default());
        assert_eq!(settings.nvs.backend().commit_count(), 0);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let settings = entity();
        settings.with_mut(|s| {
            s.max_rpm = 4_500;
            s.trim = -12;
            s.ramp = 0.125;
            s.label = String::from("right");
            s.calibration = vec![10, 20, 30];
        });
        settings.write().unwrap();

        let reloaded = NvsSettings::new(settings.nvs, MotorSettings::default(), MockTime::new());
        reloaded.read().unwrap();
        assert_eq!(reloaded.values(), settings.values());
        assert_eq!(settings.nvs.backend().commit_count(), 1);
        assert_eq!(settings.nvs.backend().stored_len("motor", "calibration"), Some(12));
    }

    #[test]
    fn test_write_failure_is_returned() {
        let settings = entity();
        settings.nvs.backend().inject_commit_failure(BackendError::Io);

        assert_eq!(settings.write(), Err(NvsError::Backend(BackendError::Io)));
        assert_eq!(settings.nvs.backend().key_count("motor"), 0);

        // Next write goes through
        settings.write().unwrap();
        assert_eq!(settings.nvs.backend().key_count("motor"), 5);
    }

    #[test]
    fn test_first_access_recovers_partition() {
        let settings = entity();
        settings
            .nvs
            .backend()
            .inject_init_failure(BackendError::NewVersionFound);

        settings.read().unwrap();
        assert_eq!(settings.nvs.backend().partition_erase_count(), 1);
        assert!(settings.nvs.is_initialized());
    }

    #[test]
    fn test_schedule_arms_single_deadline() {
        let settings = leak(NvsSettings::with_delay(
            leak(NvsPartition::new(MockNvs::new())),
            MotorSettings::default(),
            MockTime::new(),
            60_000_000,
        ));

        assert!(!settings.flush_pending());
        settings.update(|s| s.trim = 3);
        settings.schedule_write();
        assert!(settings.flush_pending());
        assert_eq!(settings.debouncer.deadline(), Some(60_000_000));

        // Values change immediately, storage only after the quiet period
        assert_eq!(settings.with(|s| s.trim), 3);
        assert_eq!(settings.nvs.backend().commit_count(), 0);
    }
}
