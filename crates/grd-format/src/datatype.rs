//! Sample type and byte order declared in the `[Data]` header section.

use serde::{Deserialize, Serialize};

/// Canonical sample encodings of the `.gri` payload.
///
/// Header files in the wild spell these in many ways; see
/// [`DataType::from_header`] for the accepted aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Signed 8-bit integer.
    Byte,
    /// Unsigned 8-bit integer.
    UByte,
    /// Signed 16-bit integer.
    Short,
    /// Signed 32-bit integer.
    Int,
    /// Signed 64-bit integer.
    Long,
    /// IEEE 754 single precision.
    Float,
    /// IEEE 754 double precision, narrowed to `f32` on decode.
    Double,
    /// Anything else; the header spelling is kept for diagnostics.
    Unknown(String),
}

impl DataType {
    /// Parse the `DataType` header value (case-insensitive).
    ///
    /// | Canonical | Aliases |
    /// |-----------|---------|
    /// | `Byte`    | INT1BYTE, INT1B, BYTE |
    /// | `UByte`   | INT1U, UBYTE |
    /// | `Short`   | INT2BYTES, INT2B, INT16, INT2S, SHORT |
    /// | `Int`     | INT4BYTES, INT4B, INT, INTEGER, SMALLINT |
    /// | `Long`    | INT8BYTES, INT8B, INT32, LONG |
    /// | `Float`   | FLT4BYTES, FLT4B, FLOAT32, FLT4S, FLOAT, SINGLE, REAL |
    /// | `Double`  | FLT8BYTES, FLT8B, DOUBLE |
    ///
    /// `INT32` meaning a 64-bit integer and `SMALLINT` meaning a 32-bit one are
    /// long-standing spellings that existing files rely on.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "INT1BYTE" | "INT1B" | "BYTE" => Self::Byte,
            "INT1U" | "UBYTE" => Self::UByte,
            "INT2BYTES" | "INT2B" | "INT16" | "INT2S" | "SHORT" => Self::Short,
            "INT4BYTES" | "INT4B" | "INT" | "INTEGER" | "SMALLINT" => Self::Int,
            "INT8BYTES" | "INT8B" | "INT32" | "LONG" => Self::Long,
            "FLT4BYTES" | "FLT4B" | "FLOAT32" | "FLT4S" | "FLOAT" | "SINGLE" | "REAL" => {
                Self::Float
            }
            "FLT8BYTES" | "FLT8B" | "DOUBLE" => Self::Double,
            _ => Self::Unknown(value.trim().to_string()),
        }
    }

    /// Width of one sample in bytes; 0 for unknown types.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Byte | Self::UByte => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double => 8,
            Self::Unknown(_) => 0,
        }
    }

    /// Spelling used when writing a header.
    pub fn header_name(&self) -> &str {
        match self {
            Self::Byte => "INT1BYTE",
            Self::UByte => "INT1U",
            Self::Short => "INT2BYTES",
            Self::Int => "INT4BYTES",
            Self::Long => "INT8BYTES",
            Self::Float => "FLT4BYTES",
            Self::Double => "FLT8BYTES",
            Self::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Least significant byte first (Intel). The default when unspecified.
    #[default]
    Lsb,
    /// Most significant byte first.
    Msb,
}

impl ByteOrder {
    /// Parse the `ByteOrder` header value. Only `MSB` selects big-endian.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("MSB") => Self::Msb,
            _ => Self::Lsb,
        }
    }

    pub fn header_name(&self) -> &'static str {
        match self {
            Self::Lsb => "LSB",
            Self::Msb => "MSB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_map_to_canonical_types() {
        assert_eq!(DataType::from_header("INT2BYTES"), DataType::Short);
        assert_eq!(DataType::from_header("int16"), DataType::Short);
        assert_eq!(DataType::from_header("INT32"), DataType::Long);
        assert_eq!(DataType::from_header("SMALLINT"), DataType::Int);
        assert_eq!(DataType::from_header("real"), DataType::Float);
        assert_eq!(DataType::from_header("FLT8B"), DataType::Double);
        assert_eq!(DataType::from_header(" INT1U "), DataType::UByte);
    }

    #[test]
    fn test_unknown_type_has_no_width() {
        let dt = DataType::from_header("COMPLEX64");
        assert_eq!(dt, DataType::Unknown("COMPLEX64".to_string()));
        assert_eq!(dt.bytes_per_sample(), 0);
        assert!(!dt.is_known());
    }

    #[test]
    fn test_sample_widths() {
        assert_eq!(DataType::Byte.bytes_per_sample(), 1);
        assert_eq!(DataType::Short.bytes_per_sample(), 2);
        assert_eq!(DataType::Float.bytes_per_sample(), 4);
        assert_eq!(DataType::Double.bytes_per_sample(), 8);
    }

    #[test]
    fn test_byte_order_defaults_to_lsb() {
        assert_eq!(ByteOrder::from_header(None), ByteOrder::Lsb);
        assert_eq!(ByteOrder::from_header(Some("")), ByteOrder::Lsb);
        assert_eq!(ByteOrder::from_header(Some("LSB")), ByteOrder::Lsb);
        assert_eq!(ByteOrder::from_header(Some("MSB")), ByteOrder::Msb);
    }
}
