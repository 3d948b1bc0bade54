//! Fixed-layout records stored as raw blobs
//!
//! Arrays of records are persisted as `SIZE * count` bytes with no header; the
//! element count is derived from the backend's stored length.

/// Fixed-size value that can be stored in a record array
///
/// # Example
///
/// ```
/// use nvs_settings_core::record::NvsRecord;
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq)]
/// struct Point {
///     x: i16,
///     y: i16,
/// }
///
/// impl NvsRecord for Point {
///     const SIZE: usize = 4;
///
///     fn encode(&self, out: &mut [u8]) {
///         out[0..2].copy_from_slice(&self.x.to_le_bytes());
///         out[2..4].copy_from_slice(&self.y.to_le_bytes());
///     }
///
///     fn decode(bytes: &[u8]) -> Self {
///         Self {
///             x: i16::from_le_bytes([bytes[0], bytes[1]]),
///             y: i16::from_le_bytes([bytes[2], bytes[3]]),
///         }
///     }
/// }
///
/// let mut buf = [0u8; Point::SIZE];
/// Point { x: -3, y: 7 }.encode(&mut buf);
/// assert_eq!(Point::decode(&buf), Point { x: -3, y: 7 });
/// ```
pub trait NvsRecord: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Serialize into `out`, which is exactly `SIZE` bytes long
    fn encode(&self, out: &mut [u8]);

    /// Deserialize from `bytes`, which is exactly `SIZE` bytes long
    fn decode(bytes: &[u8]) -> Self;
}

impl NvsRecord for u8 {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        out[0] = *self;
    }

    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl NvsRecord for u16 {
    const SIZE: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }
}

impl NvsRecord for u32 {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl NvsRecord for f32 {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bits().to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        f32::from_bits(u32::decode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_records_little_endian() {
        let mut buf = [0u8; 4];
        0x1234_5678u32.encode(&mut buf);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12]);

        let mut buf = [0u8; 2];
        0xBEEFu16.encode(&mut buf);
        assert_eq!(buf, [0xEF, 0xBE]);
    }

    #[test]
    fn test_f32_record_keeps_bits() {
        let value = f32::from_bits(0x7FC0_0001);
        let mut buf = [0u8; 4];
        value.encode(&mut buf);
        assert_eq!(f32::decode(&buf).to_bits(), 0x7FC0_0001);
    }
}
