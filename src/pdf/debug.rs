//! Coordinate debugging overlay
//!
//! Draws a crosshair and label through every registered field coordinate,
//! plus ruler ticks along the bottom and left edges, so coordinates can be
//! checked against the template by eye. Only runs when enabled in the
//! configuration.

use crate::config::DebugOverlayOptions;
use crate::error::Result;
use crate::layout::CoordinateTable;
use super::canvas::PageCanvas;

/// Distance between ruler ticks, in points
const RULER_STEP: u32 = 50;
/// Ticks on multiples of this get a numeric label
const RULER_LABEL_EVERY: u32 = 100;
const RULER_TICK_LENGTH: f32 = 10.0;
const RULER_LABEL_SIZE: f32 = 6.0;

pub fn draw_debug_overlay(
    page: &mut PageCanvas<'_>,
    coordinates: &CoordinateTable,
    options: &DebugOverlayOptions,
) -> Result<()> {
    let [left, bottom, right, top] = page.media_box();

    for (field, coord) in coordinates.iter() {
        page.draw_line(
            (coord.x, bottom),
            (coord.x, top),
            options.crosshair_thickness,
            options.crosshair_color,
            options.crosshair_opacity,
        )?;
        page.draw_line(
            (left, coord.y),
            (right, coord.y),
            options.crosshair_thickness,
            options.crosshair_color,
            options.crosshair_opacity,
        )?;
        page.draw_text(
            &format!("{} ({}, {})", field, coord.x, coord.y),
            coord.x + 5.0,
            coord.y + 5.0,
            options.label_font_size,
            options.crosshair_color,
        )?;
    }

    draw_ruler_marks(page, [left, bottom, right, top], options)
}

/// Multiples of `RULER_STEP` between `from` and `to`, inclusive
fn ruler_positions(from: f32, to: f32) -> impl Iterator<Item = i64> {
    let step = RULER_STEP as i64;
    let first = (from / RULER_STEP as f32).ceil() as i64 * step;
    let last = to.floor() as i64;
    (first..=last).step_by(RULER_STEP as usize)
}

/// Ticks along the bottom and left edges of the MediaBox, labelled with
/// their user-space coordinate
fn draw_ruler_marks(page: &mut PageCanvas<'_>, media_box: [f32; 4], options: &DebugOverlayOptions) -> Result<()> {
    let [left, bottom, right, top] = media_box;

    for x in ruler_positions(left, right) {
        let xf = x as f32;
        page.draw_line(
            (xf, bottom),
            (xf, bottom + RULER_TICK_LENGTH),
            options.ruler_thickness,
            options.ruler_color,
            options.ruler_opacity,
        )?;
        if x % RULER_LABEL_EVERY as i64 == 0 {
            page.draw_text(&x.to_string(), xf + 2.0, bottom + 2.0, RULER_LABEL_SIZE, options.ruler_color)?;
        }
    }

    for y in ruler_positions(bottom, top) {
        let yf = y as f32;
        page.draw_line(
            (left, yf),
            (left + RULER_TICK_LENGTH, yf),
            options.ruler_thickness,
            options.ruler_color,
            options.ruler_opacity,
        )?;
        if y % RULER_LABEL_EVERY as i64 == 0 {
            page.draw_text(&y.to_string(), left + 2.0, yf + 2.0, RULER_LABEL_SIZE, options.ruler_color)?;
        }
    }

    Ok(())
}
