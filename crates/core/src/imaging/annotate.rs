//! Detection overlay: unfilled rectangle outlines in the cyclic palette.

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::palette::{color_for, Rgb};

/// Draws a one-pixel outline for each box, in detection order, colored by the
/// box's position in the sequence. The frame is mutated in place; later
/// outlines may overwrite earlier ones where boxes overlap.
pub fn annotate(frame: &mut Frame, boxes: &[BoundingBox]) {
    for (index, bbox) in boxes.iter().enumerate() {
        draw_outline(frame, bbox, color_for(index));
    }
}

/// Rectangle outline clipped to the frame; degenerate or fully out-of-bounds
/// boxes draw nothing.
pub fn draw_outline(frame: &mut Frame, bbox: &BoundingBox, color: Rgb) {
    if bbox.width == 0 || bbox.height == 0 {
        return;
    }
    let fw = frame.width();
    let fh = frame.height();
    if bbox.x >= fw || bbox.y >= fh {
        return;
    }

    let x0 = bbox.x;
    let y0 = bbox.y;
    let x1 = (bbox.x + bbox.width - 1).min(fw - 1);
    let y1 = (bbox.y + bbox.height - 1).min(fh - 1);

    for x in x0..=x1 {
        put_pixel(frame, x, y0, color);
        if bbox.y + bbox.height - 1 <= fh - 1 {
            put_pixel(frame, x, y1, color);
        }
    }
    for y in y0..=y1 {
        put_pixel(frame, x0, y, color);
        if bbox.x + bbox.width - 1 <= fw - 1 {
            put_pixel(frame, x1, y, color);
        }
    }
}

fn put_pixel(frame: &mut Frame, x: u32, y: u32, color: Rgb) {
    let stride = frame.stride();
    let channels = frame.channels() as usize;
    let base = y as usize * stride + x as usize * channels;
    let data = frame.data_mut();
    data[base] = color.0;
    data[base + 1] = color.1;
    data[base + 2] = color.2;
}
