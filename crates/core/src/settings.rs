//! Settings group extension point
//!
//! A settings group is a plain struct holding in-memory values. Implementing
//! [`Settings`] maps its fields onto keys of one namespace; the provided
//! methods run a complete read or write session around that mapping.

use crate::backend::NvsBackend;
use crate::error::Result;
use crate::partition::NvsPartition;
use crate::stream::NvsStream;

/// Named group of typed values persisted in one namespace
///
/// # Example
///
/// ```
/// use nvs_settings_core::backend::NvsBackend;
/// use nvs_settings_core::error::Result;
/// use nvs_settings_core::mock::MockNvs;
/// use nvs_settings_core::partition::NvsPartition;
/// use nvs_settings_core::settings::Settings;
/// use nvs_settings_core::stream::NvsStream;
///
/// #[derive(Default)]
/// struct AudioSettings {
///     volume: u8,
/// }
///
/// impl Settings for AudioSettings {
///     fn namespace(&self) -> &'static str {
///         "audio"
///     }
///
///     fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()> {
///         self.volume = stream.read_u8("volume", 50)?;
///         Ok(())
///     }
///
///     fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()> {
///         stream.write_u8("volume", self.volume)
///     }
/// }
///
/// let nvs = NvsPartition::new(MockNvs::new());
/// let mut audio = AudioSettings::default();
/// audio.read_from(&nvs).unwrap();
/// assert_eq!(audio.volume, 50);
/// ```
pub trait Settings {
    /// Namespace owning every key of this group
    fn namespace(&self) -> &'static str;

    /// Load each field from the stream, falling back to its default
    fn on_read<B: NvsBackend>(&mut self, stream: &NvsStream<'_, B>) -> Result<()>;

    /// Store each field into the stream
    fn on_write<B: NvsBackend>(&self, stream: &NvsStream<'_, B>) -> Result<()>;

    /// Open a read session, run [`Settings::on_read`], close
    fn read_from<B: NvsBackend>(&mut self, nvs: &NvsPartition<B>) -> Result<()> {
        let stream = NvsStream::open_for_reading(nvs, self.namespace())?;
        self.on_read(&stream)?;
        stream.close();
        Ok(())
    }

    /// Open a write session, run [`Settings::on_write`], commit, close
    ///
    /// Nothing is persisted if the mapping or the commit fails.
    fn write_to<B: NvsBackend>(&self, nvs: &NvsPartition<B>) -> Result<()> {
        let stream = NvsStream::open_for_writing(nvs, self.namespace())?;
        self.on_write(&stream)?;
        stream.commit()?;
        stream.close();
        Ok(())
    }
}
