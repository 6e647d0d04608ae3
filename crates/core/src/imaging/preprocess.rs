//! Frame normalization ahead of the multi-scale search.
//!
//! Three stages, in a fixed order: luma conversion, area-averaging downscale,
//! histogram equalization. Each stage consumes the previous one's output and
//! the source frame is never touched.

use crate::shared::frame::Frame;
use crate::shared::gray_buffer::GrayBuffer;

/// BT.601 luma weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Full preprocessing pass: grayscale, downscale by `scale`, equalize.
///
/// `scale == 1.0` keeps the resolution but still converts and equalizes.
pub fn preprocess(frame: &Frame, scale: f64) -> GrayBuffer {
    equalize(&downscale(&grayscale(frame), scale))
}

/// Interleaved RGB to single-channel luma, rounded to nearest.
pub fn grayscale(frame: &Frame) -> GrayBuffer {
    let w = frame.width() as usize;
    let h = frame.height() as usize;
    let channels = frame.channels() as usize;
    let src = frame.data();

    let mut data = Vec::with_capacity(w * h);
    for px in 0..w * h {
        let base = px * channels;
        let luma = LUMA_R * src[base] as f64
            + LUMA_G * src[base + 1] as f64
            + LUMA_B * src[base + 2] as f64;
        data.push(luma.round().clamp(0.0, 255.0) as u8);
    }
    GrayBuffer::new(data, frame.width(), frame.height())
}

/// Area-averaging resample onto `floor(w / factor) x floor(h / factor)`.
///
/// Each destination pixel averages the exact (fractional) source footprint it
/// covers, so total image mass is preserved and box contents keep their mean
/// brightness across scales.
pub fn downscale(gray: &GrayBuffer, factor: f64) -> GrayBuffer {
    debug_assert!(factor >= 1.0, "downscale factor must be >= 1.0");
    if factor == 1.0 {
        return gray.clone();
    }

    let src_w = gray.width() as usize;
    let src_h = gray.height() as usize;
    let dst_w = (gray.width() as f64 / factor).floor() as usize;
    let dst_h = (gray.height() as f64 / factor).floor() as usize;
    let rx = src_w as f64 / dst_w as f64;
    let ry = src_h as f64 / dst_h as f64;
    let src = gray.data();

    let mut data = Vec::with_capacity(dst_w * dst_h);
    for gy in 0..dst_h {
        let y0 = gy as f64 * ry;
        let y1 = y0 + ry;
        for gx in 0..dst_w {
            let x0 = gx as f64 * rx;
            let x1 = x0 + rx;

            let mut acc = 0.0;
            let row_end = (y1.ceil() as usize).min(src_h);
            let col_end = (x1.ceil() as usize).min(src_w);
            for row in y0.floor() as usize..row_end {
                let wy = (y1.min(row as f64 + 1.0) - y0.max(row as f64)).max(0.0);
                for col in x0.floor() as usize..col_end {
                    let wx = (x1.min(col as f64 + 1.0) - x0.max(col as f64)).max(0.0);
                    acc += src[row * src_w + col] as f64 * wx * wy;
                }
            }
            data.push((acc / (rx * ry)).round().clamp(0.0, 255.0) as u8);
        }
    }
    GrayBuffer::new(data, dst_w as u32, dst_h as u32)
}

/// Histogram equalization over the full value range.
///
/// Uses the standard `(cdf(v) - cdf_min) / (n - cdf_min)` remap; a constant
/// image comes back unchanged.
pub fn equalize(gray: &GrayBuffer) -> GrayBuffer {
    let mut hist = [0u64; 256];
    for &v in gray.data() {
        hist[v as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (v, &count) in hist.iter().enumerate() {
        running += count;
        cdf[v] = running;
    }

    let total = gray.data().len() as u64;
    let cdf_min = hist
        .iter()
        .find(|&&count| count > 0)
        .copied()
        .unwrap_or(0);
    if total == cdf_min {
        return gray.clone();
    }

    let denom = (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for v in 0..256 {
        lut[v] = ((cdf[v].saturating_sub(cdf_min)) as f64 * 255.0 / denom).round() as u8;
    }

    let data = gray.data().iter().map(|&v| lut[v as usize]).collect();
    GrayBuffer::new(data, gray.width(), gray.height())
}
