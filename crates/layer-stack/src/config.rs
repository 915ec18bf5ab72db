//! Configuration for building a layer stack.

use grd_format::{ByteOrder, DEFAULT_READ_BLOCK_BYTES};
use serde::{Deserialize, Serialize};

/// Configuration for dataset assembly and output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    /// Worker threads available to the classifier.
    pub threads: usize,

    /// Chunks per worker thread.
    pub pieces_per_thread: usize,

    /// Size of individual payload reads in bytes.
    pub read_block_bytes: usize,

    /// Write output rasters big-endian.
    pub write_big_endian: bool,

    /// Write the `extents.txt` side file next to the outputs.
    pub write_extents_file: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            pieces_per_thread: 4,
            read_block_bytes: DEFAULT_READ_BLOCK_BYTES,
            write_big_endian: false,
            write_extents_file: true,
        }
    }
}

impl StackConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("ALOC_THREADS") {
            if let Ok(threads) = val.parse() {
                config.threads = threads;
            }
        }

        if let Ok(val) = std::env::var("ALOC_PIECES_PER_THREAD") {
            if let Ok(pieces) = val.parse() {
                config.pieces_per_thread = pieces;
            }
        }

        if let Ok(val) = std::env::var("ALOC_READ_BLOCK_BYTES") {
            if let Ok(bytes) = val.parse() {
                config.read_block_bytes = bytes;
            }
        }

        if let Ok(val) = std::env::var("ALOC_WRITE_BIG_ENDIAN") {
            config.write_big_endian = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("ALOC_WRITE_EXTENTS") {
            config.write_extents_file = parse_flag(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("threads must be > 0".to_string());
        }

        if self.pieces_per_thread == 0 {
            return Err("pieces_per_thread must be > 0".to_string());
        }

        if self.read_block_bytes < 8 {
            return Err("read_block_bytes must hold at least one 8-byte sample".to_string());
        }

        Ok(())
    }

    /// Number of chunks the dataset is split into.
    pub fn pieces(&self) -> usize {
        (self.threads * self.pieces_per_thread).max(1)
    }

    /// Byte order for written rasters.
    pub fn byte_order(&self) -> ByteOrder {
        if self.write_big_endian {
            ByteOrder::Msb
        } else {
            ByteOrder::Lsb
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StackConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.threads >= 1);
        assert_eq!(config.pieces(), config.threads * 4);
        assert_eq!(config.byte_order(), ByteOrder::Lsb);
    }

    #[test]
    fn test_validate_rejects_zero_threads() {
        let config = StackConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.pieces(), 1);
    }

    #[test]
    fn test_validate_rejects_tiny_blocks() {
        let config = StackConfig {
            read_block_bytes: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("yes"));
    }
}
