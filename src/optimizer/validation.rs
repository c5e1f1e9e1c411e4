//! Strict validation pass (§4.3.3): when `batch.strict_validation` is set,
//! walks every store and the tile stream (if any) checking the invariants
//! spec §3 otherwise only enforces informally. Any emitted issue fails the
//! optimized build for that frame.

use crate::batch::RenderBatch;
use crate::error::{RenderValidationReport, ValidationIssueCode};
use crate::store::CommandType;

/// Runs every check from §4.3.3 (a)-(e), pushing one `RenderValidationIssue`
/// per violation into `report`. Returns `true` when no issue was found.
pub fn validate(batch: &RenderBatch, report: &mut RenderValidationReport) -> bool {
    let before = report.issues.len();

    check_store_lengths(batch, report);
    check_command_indices(batch, report);
    check_palette_indices(batch, report);
    check_text_references(batch, report);
    if let Some(stream) = &batch.tile_stream {
        check_tile_stream(batch, stream, report);
    }

    report.issues.len() == before
}

fn check_store_lengths(batch: &RenderBatch, report: &mut RenderValidationReport) {
    macro_rules! check {
        ($name:literal, $($col:expr),+ $(,)?) => {{
            let lens = [$($col.len()),+];
            if lens.iter().any(|&l| l != lens[0]) {
                report.push(
                    ValidationIssueCode::StoreLengthMismatch,
                    format!("{} columns disagree in length: {:?}", $name, lens),
                );
            }
        }};
    }

    check!(
        "rects",
        batch.rects.x0,
        batch.rects.y0,
        batch.rects.x1,
        batch.rects.y1,
        batch.rects.color_index,
        batch.rects.flags,
    );
    check!(
        "circles",
        batch.circles.center_x,
        batch.circles.center_y,
        batch.circles.radius,
        batch.circles.color_index,
    );
    check!("pixels", batch.pixels.x, batch.pixels.y, batch.pixels.color_index);
    check!(
        "pixels_a",
        batch.pixels_a.x,
        batch.pixels_a.y,
        batch.pixels_a.color_index,
        batch.pixels_a.alpha,
    );
    check!(
        "lines",
        batch.lines.x0,
        batch.lines.y0,
        batch.lines.x1,
        batch.lines.y1,
        batch.lines.width_q8_8,
        batch.lines.color_index,
    );
    check!(
        "image_draws",
        batch.image_draws.x0,
        batch.image_draws.y0,
        batch.image_draws.x1,
        batch.image_draws.y1,
        batch.image_draws.image_index,
    );
    check!(
        "texts",
        batch.texts.x,
        batch.texts.y,
        batch.texts.width,
        batch.texts.height,
        batch.texts.color_index,
        batch.texts.run_index,
    );
}

fn check_command_indices(batch: &RenderBatch, report: &mut RenderValidationReport) {
    for (pos, cmd) in batch.commands.iter().enumerate() {
        let len = match cmd.kind {
            CommandType::Rect => batch.rects.len(),
            CommandType::Circle => batch.circles.len(),
            CommandType::Pixel => batch.pixels.len(),
            CommandType::PixelA => batch.pixels_a.len(),
            CommandType::Line => batch.lines.len(),
            CommandType::Image => batch.image_draws.len(),
            CommandType::Text => batch.texts.len(),
            CommandType::Clear => batch.clears.len(),
            CommandType::ClearPattern => batch.clear_patterns.len(),
            CommandType::DebugTiles => batch.debug_tiles.len(),
        };
        if cmd.index as usize >= len {
            report.push(
                ValidationIssueCode::IndexOutOfRange,
                format!(
                    "commands[{pos}] ({:?}) index {} >= store length {len}",
                    cmd.kind, cmd.index
                ),
            );
        }
    }
}

fn check_palette_indices(batch: &RenderBatch, report: &mut RenderValidationReport) {
    if !batch.palette.enabled() {
        return;
    }
    for i in 0..batch.rects.len() {
        if !batch.palette.is_index_valid(batch.rects.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("rects[{i}].color_index out of range"),
            );
        }
        if batch.rects.has_gradient(i) && !batch.palette.is_index_valid(batch.rects.gradient_color1_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("rects[{i}].gradient_color1_index out of range"),
            );
        }
    }
    for i in 0..batch.circles.len() {
        if !batch.palette.is_index_valid(batch.circles.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("circles[{i}].color_index out of range"),
            );
        }
    }
    for i in 0..batch.pixels.len() {
        if !batch.palette.is_index_valid(batch.pixels.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("pixels[{i}].color_index out of range"),
            );
        }
    }
    for i in 0..batch.pixels_a.len() {
        if !batch.palette.is_index_valid(batch.pixels_a.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("pixels_a[{i}].color_index out of range"),
            );
        }
    }
    for i in 0..batch.lines.len() {
        if !batch.palette.is_index_valid(batch.lines.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("lines[{i}].color_index out of range"),
            );
        }
    }
    for i in 0..batch.image_draws.len() {
        if !batch.palette.is_index_valid(batch.image_draws.tint_color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("image_draws[{i}].tint_color_index out of range"),
            );
        }
    }
    for i in 0..batch.texts.len() {
        if !batch.palette.is_index_valid(batch.texts.color_index[i]) {
            report.push(
                ValidationIssueCode::PaletteIndexOutOfRange,
                format!("texts[{i}].color_index out of range"),
            );
        }
    }
}

fn check_text_references(batch: &RenderBatch, report: &mut RenderValidationReport) {
    for i in 0..batch.texts.len() {
        let run_index = batch.texts.run_index[i] as usize;
        if run_index >= batch.text_runs.len() {
            report.push(
                ValidationIssueCode::IndexOutOfRange,
                format!("texts[{i}].run_index {run_index} >= text_runs length {}", batch.text_runs.len()),
            );
            continue;
        }
        let start = batch.text_runs.glyph_start[run_index] as usize;
        let count = batch.text_runs.glyph_count[run_index] as usize;
        if start + count > batch.glyphs.len() {
            report.push(
                ValidationIssueCode::IndexOutOfRange,
                format!(
                    "text_runs[{run_index}] glyph_start+glyph_count {} > glyphs length {}",
                    start + count,
                    batch.glyphs.len()
                ),
            );
        }
    }
    for i in 0..batch.glyphs.len() {
        let bitmap_index = batch.glyphs.bitmap_index[i] as usize;
        if bitmap_index >= batch.glyphs.bitmaps.len() {
            report.push(
                ValidationIssueCode::IndexOutOfRange,
                format!("glyphs[{i}].bitmap_index {bitmap_index} >= bitmaps length {}", batch.glyphs.bitmaps.len()),
            );
        }
    }
}

fn check_tile_stream(
    batch: &RenderBatch,
    stream: &crate::tile_stream::TileStream,
    report: &mut RenderValidationReport,
) {
    if stream.tile_size == 0 || stream.tile_size > 256 {
        report.push(
            ValidationIssueCode::TileSizeTooLarge,
            format!("tile stream tile_size {} exceeds 256", stream.tile_size),
        );
        return;
    }
    if !stream.offsets_consistent() {
        report.push(
            ValidationIssueCode::TileStreamOffsetMismatch,
            "tile stream offsets do not terminate at the command count".to_string(),
        );
    }
    for (i, tc) in stream.commands.iter().enumerate() {
        let len = match tc.kind {
            CommandType::Rect => batch.rects.len(),
            CommandType::Circle => batch.circles.len(),
            CommandType::Pixel => batch.pixels.len(),
            CommandType::PixelA => batch.pixels_a.len(),
            CommandType::Line => batch.lines.len(),
            CommandType::Image => batch.image_draws.len(),
            CommandType::Text => batch.texts.len(),
            CommandType::Clear | CommandType::ClearPattern | CommandType::DebugTiles => continue,
        };
        if tc.store_index as usize >= len {
            report.push(
                ValidationIssueCode::TileCommandIndexOutOfRange,
                format!("tile stream commands[{i}] store_index {} >= store length {len}", tc.store_index),
            );
        }
    }
}
