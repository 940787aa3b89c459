//! Luminance frames.
//!
//! `LumaFrame` is an owned copy of a single luminance (Y) plane together with
//! its capture timestamp. Frames are transient: the detector reads one mean
//! sample out of a frame and the frame is dropped.
//!
//! Rows may carry padding (`row_stride > width`), as camera planes usually
//! do. Sampling honors the stride and skips any index past the end of the
//! buffer, so a truncated or empty plane degrades to a mean of 0.0 instead
//! of an error.

use std::time::Duration;

/// One luminance plane.
pub struct LumaFrame {
    /// Private plane data; read through `mean_luma`.
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Bytes per row in `data`. At least `width` for a well-formed plane.
    pub row_stride: u32,
    /// Capture time relative to stream start.
    pub timestamp: Duration,
}

impl LumaFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        row_stride: u32,
        timestamp: Duration,
    ) -> Self {
        Self {
            data,
            width,
            height,
            row_stride,
            timestamp,
        }
    }

    /// A plane with no row padding.
    pub fn tightly_packed(data: Vec<u8>, width: u32, height: u32, timestamp: Duration) -> Self {
        Self::new(data, width, height, width, timestamp)
    }

    /// Mean luminance of a sparse sample grid: every `stride`-th pixel of
    /// every `stride`-th row. Indexes past the end of the buffer contribute
    /// nothing. An empty sample set yields 0.0.
    pub fn mean_luma(&self, stride: usize) -> f64 {
        let stride = stride.max(1);
        let limit = self.data.len();
        let mut sum: u64 = 0;
        let mut count: u64 = 0;
        for y in (0..self.height as usize).step_by(stride) {
            let row_start = y * self.row_stride as usize;
            for x in (0..self.width as usize).step_by(stride) {
                let index = row_start + x;
                if index < limit {
                    sum += u64::from(self.data[index]);
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }

    /// Plane size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_zero() -> Duration {
        Duration::ZERO
    }

    #[test]
    fn uniform_plane_means_its_value() {
        let frame = LumaFrame::tightly_packed(vec![77u8; 64 * 48], 64, 48, at_zero());
        assert_eq!(frame.mean_luma(4), 77.0);
        assert_eq!(frame.mean_luma(1), 77.0);
    }

    #[test]
    fn row_padding_is_not_sampled() {
        // 4x2 plane with 2 bytes of padding per row, padding set to 255.
        let data = vec![
            10, 10, 10, 10, 255, 255, //
            10, 10, 10, 10, 255, 255,
        ];
        let frame = LumaFrame::new(data, 4, 2, 6, at_zero());
        assert_eq!(frame.mean_luma(1), 10.0);
    }

    #[test]
    fn empty_plane_degrades_to_zero() {
        let frame = LumaFrame::tightly_packed(Vec::new(), 640, 480, at_zero());
        assert_eq!(frame.mean_luma(4), 0.0);
    }

    #[test]
    fn truncated_plane_skips_out_of_bounds_rows() {
        // Claims 4x4 but only one row of data is present.
        let frame = LumaFrame::new(vec![40, 40, 40, 40], 4, 4, 4, at_zero());
        assert_eq!(frame.mean_luma(1), 40.0);
    }

    #[test]
    fn zero_stride_is_treated_as_one() {
        let frame = LumaFrame::tightly_packed(vec![9u8; 16], 4, 4, at_zero());
        assert_eq!(frame.mean_luma(0), 9.0);
    }
}
