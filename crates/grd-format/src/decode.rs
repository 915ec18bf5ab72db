//! `.gri` payload decoding.
//!
//! The payload is read in bounded blocks so that very large rasters never
//! need a second full-size byte buffer next to the decoded `f32` array.

use std::io::{ErrorKind, Read};

use bytes::Buf;

use crate::datatype::{ByteOrder, DataType};
use crate::header::RasterHeader;

/// Default size of a single read from the payload file.
pub const DEFAULT_READ_BLOCK_BYTES: usize = 16 * 1024 * 1024;

/// Decode a payload into `header.geometry.len()` samples.
///
/// Samples equal to the header's no-data value (compared as `f32`) become
/// NaN, every other sample is multiplied by the rescale factor. A payload
/// shorter than declared leaves the trailing samples at 0 before that
/// substitution; extra trailing bytes are ignored. Unknown sample types decode
/// to all-NaN.
pub fn decode_samples<R: Read>(
    mut reader: R,
    header: &RasterHeader,
    block_bytes: usize,
) -> std::io::Result<Vec<f32>> {
    let len = header.geometry.len();
    let width = header.data_type.bytes_per_sample();

    if width == 0 {
        tracing::warn!(
            data_type = header.data_type.header_name(),
            "Cannot decode unknown data type, all cells are missing"
        );
        return Ok(vec![f32::NAN; len]);
    }

    let mut out = vec![0.0f32; len];

    // Whole samples per block; a partial sample at the end of a read is
    // carried over to the front of the next one.
    let block = (block_bytes / width).max(1) * width;
    let mut buf = vec![0u8; block];
    let mut filled = 0usize;
    let mut next = 0usize;

    while next < len {
        let n = match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        filled += n;

        let whole = filled / width;
        let take = whole.min(len - next);
        decode_block(
            &buf[..take * width],
            &header.data_type,
            header.byte_order,
            &mut out[next..next + take],
        );
        next += take;

        let consumed = whole * width;
        buf.copy_within(consumed..filled, 0);
        filled -= consumed;
    }

    if next < len {
        tracing::debug!(expected = len, decoded = next, "Payload shorter than declared");
    }

    let no_data = header.no_data.map(|v| v as f32);
    let rescale = header.rescale;
    for v in &mut out {
        if Some(*v) == no_data {
            *v = f32::NAN;
        } else {
            *v *= rescale;
        }
    }

    Ok(out)
}

/// Decode whole samples from `bytes` into `out` (same sample count).
fn decode_block(mut bytes: &[u8], data_type: &DataType, order: ByteOrder, out: &mut [f32]) {
    let lsb = order == ByteOrder::Lsb;

    match data_type {
        DataType::Byte => fill(out, || bytes.get_i8() as f32),
        DataType::UByte => fill(out, || bytes.get_u8() as f32),
        DataType::Short if lsb => fill(out, || bytes.get_i16_le() as f32),
        DataType::Short => fill(out, || bytes.get_i16() as f32),
        DataType::Int if lsb => fill(out, || bytes.get_i32_le() as f32),
        DataType::Int => fill(out, || bytes.get_i32() as f32),
        DataType::Long if lsb => fill(out, || bytes.get_i64_le() as f32),
        DataType::Long => fill(out, || bytes.get_i64() as f32),
        DataType::Float if lsb => fill(out, || bytes.get_f32_le()),
        DataType::Float => fill(out, || bytes.get_f32()),
        DataType::Double if lsb => fill(out, || bytes.get_f64_le() as f32),
        DataType::Double => fill(out, || bytes.get_f64() as f32),
        DataType::Unknown(_) => out.fill(f32::NAN),
    }
}

#[inline]
fn fill(out: &mut [f32], mut next: impl FnMut() -> f32) {
    for v in out {
        *v = next();
    }
}
