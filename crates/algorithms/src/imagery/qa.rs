//! QA bitmask decoding and cloud masks
//!
//! Landsat Collection 2 `QA_PIXEL` packs per-pixel quality flags into a
//! 16-bit integer. A flag occupies an inclusive bit range `[start, end]`
//! and is read by masking the range and shifting it down to bit 0.
//!
//! Two flags build the combined cloud mask:
//! - bits 10–11, cloud shadow confidence: keep where the value is 1 (low)
//! - bits 3–4, cloud and dilated cloud: keep where the value is 0

use crate::maybe_rayon::*;
use lstgis_core::raster::Raster;
use lstgis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Bit mask with every bit in `[start, end]` set.
///
/// Equivalent to `Σ 2^i` for `i` in the range.
pub fn qa_bit_pattern(start: u8, end: u8) -> Result<u16> {
    if start > end || end > 15 {
        return Err(Error::InvalidParameter {
            name: "qa_bits",
            value: format!("{}..={}", start, end),
            reason: "bit range must satisfy start <= end <= 15".into(),
        });
    }
    Ok((start..=end).fold(0u16, |acc, i| acc | (1 << i)))
}

/// Extract bits `[start, end]` of `value` as an unsigned integer.
///
/// The range is assumed valid; see [`qa_bit_pattern`].
#[inline]
pub fn decode_qa_bits(value: u16, start: u8, end: u8) -> u16 {
    let width = u32::from(end - start) + 1;
    let pattern = (((1u32 << width) - 1) << start) as u16;
    (value & pattern) >> start
}

/// Decode a bit range over a whole QA raster.
///
/// Pixels equal to the raster's nodata value stay nodata in the output.
pub fn extract_qa_bits(qa: &Raster<u16>, start: u8, end: u8) -> Result<Raster<u16>> {
    qa_bit_pattern(start, end)?;

    let (rows, cols) = qa.shape();
    let nodata = qa.nodata();

    let data: Vec<u16> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u16; cols];
            for col in 0..cols {
                let v = unsafe { qa.get_unchecked(row, col) };
                row_data[col] = if qa.is_nodata(v) {
                    v
                } else {
                    decode_qa_bits(v, start, end)
                };
            }
            row_data
        })
        .collect();

    qa.derive(data, nodata)
}

/// A QA flag and the decoded value that marks a pixel as usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaBitRange {
    pub start: u8,
    pub end: u8,
    pub keep: u16,
}

impl QaBitRange {
    pub const fn new(start: u8, end: u8, keep: u16) -> Self {
        Self { start, end, keep }
    }

    /// Whether a raw QA value passes this flag.
    #[inline]
    pub fn passes(&self, value: u16) -> bool {
        decode_qa_bits(value, self.start, self.end) == self.keep
    }
}

/// Cloud shadow confidence, low
pub const CLOUD_SHADOW: QaBitRange = QaBitRange::new(10, 11, 1);

/// Cloud and dilated cloud flags both clear
pub const CLOUD: QaBitRange = QaBitRange::new(3, 4, 0);

/// Binary mask (1 = keep, 0 = masked) from any number of QA flags.
///
/// A pixel is kept only if every flag passes. QA nodata is always masked.
pub fn qa_mask_all(qa: &Raster<u16>, ranges: &[QaBitRange]) -> Result<Raster<u8>> {
    for r in ranges {
        qa_bit_pattern(r.start, r.end)?;
    }

    let (rows, cols) = qa.shape();

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            for col in 0..cols {
                let v = unsafe { qa.get_unchecked(row, col) };
                if qa.is_nodata(v) {
                    continue;
                }
                if ranges.iter().all(|r| r.passes(v)) {
                    row_data[col] = 1;
                }
            }
            row_data
        })
        .collect();

    qa.derive(data, None)
}

/// Binary mask for a single QA flag.
pub fn qa_mask(qa: &Raster<u16>, range: QaBitRange) -> Result<Raster<u8>> {
    qa_mask_all(qa, &[range])
}

/// Combined cloud mask: low cloud-shadow confidence AND no cloud.
pub fn cloud_mask(qa: &Raster<u16>) -> Result<Raster<u8>> {
    qa_mask_all(qa, &[CLOUD_SHADOW, CLOUD])
}
