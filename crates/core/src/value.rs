//! Dynamically typed setting values

use alloc::string::String;
use alloc::vec::Vec;

/// Value of one setting key
///
/// Used where the type of a key is only known at runtime. Typed code paths
/// call the codec accessors on [`NvsStream`](crate::stream::NvsStream) directly.
#[derive(Debug, Clone, PartialEq)]
pub enum NvsValue {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    /// Stored as the IEEE-754 bit pattern in a u32 slot
    F32(f32),
    /// Stored in a u8 slot
    Bool(bool),
    /// Stored as a blob with a trailing terminator byte
    Str(String),
    /// Raw bytes, also used for encoded record arrays
    Blob(Vec<u8>),
}

impl From<u8> for NvsValue {
    fn from(value: u8) -> Self {
        NvsValue::U8(value)
    }
}

impl From<u16> for NvsValue {
    fn from(value: u16) -> Self {
        NvsValue::U16(value)
    }
}

impl From<i16> for NvsValue {
    fn from(value: i16) -> Self {
        NvsValue::I16(value)
    }
}

impl From<u32> for NvsValue {
    fn from(value: u32) -> Self {
        NvsValue::U32(value)
    }
}

impl From<u64> for NvsValue {
    fn from(value: u64) -> Self {
        NvsValue::U64(value)
    }
}

impl From<f32> for NvsValue {
    fn from(value: f32) -> Self {
        NvsValue::F32(value)
    }
}

impl From<bool> for NvsValue {
    fn from(value: bool) -> Self {
        NvsValue::Bool(value)
    }
}

impl From<&str> for NvsValue {
    fn from(value: &str) -> Self {
        NvsValue::Str(String::from(value))
    }
}

impl From<Vec<u8>> for NvsValue {
    fn from(value: Vec<u8>) -> Self {
        NvsValue::Blob(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_conversions_pick_storage_type() {
        assert_eq!(NvsValue::from(7u8), NvsValue::U8(7));
        assert_eq!(NvsValue::from(-3i16), NvsValue::I16(-3));
        assert_eq!(NvsValue::from(1.5f32), NvsValue::F32(1.5));
        assert_eq!(NvsValue::from(true), NvsValue::Bool(true));
        assert_eq!(NvsValue::from("dark"), NvsValue::Str(String::from("dark")));
        assert_eq!(NvsValue::from(vec![1u8, 2]), NvsValue::Blob(vec![1, 2]));
    }
}
