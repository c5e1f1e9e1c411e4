//! Per-tile replay (§4.4.2): resolves the pixel rect a command may touch for
//! a single tile, then hands it to [`crate::rasterizer::primitives::draw`].

use crate::analysis::{self, AnalysisConfig};
use crate::batch::RenderBatch;
use crate::geometry::IntRect;
use crate::optimizer::OptimizedBatch;
use crate::rasterizer::blend::TargetSlice;
use crate::rasterizer::primitives;
use crate::store::CommandType;

fn tile_rect(optimized: &OptimizedBatch, tile_index: usize) -> IntRect {
    let tiles_x = optimized.tiles_x;
    let tx = tile_index as u32 % tiles_x;
    let ty = tile_index as u32 / tiles_x;
    let size = optimized.tile_size as i32;
    let target = IntRect::new(0, 0, optimized.target_width as i32, optimized.target_height as i32);
    let abs = IntRect::new(tx as i32 * size, ty as i32 * size, (tx as i32 + 1) * size, (ty as i32 + 1) * size);
    abs.intersect(&target).unwrap_or(IntRect::new(0, 0, 0, 0))
}

/// For the non-stream binned path: recomputes a command's clipped natural
/// bounds on the fly (the same computation the optimize pass already ran)
/// and intersects it with the tile's rect.
fn allowed_for_bin(batch: &RenderBatch, optimized: &OptimizedBatch, kind: CommandType, index: u32, tile: IntRect) -> Option<IntRect> {
    let config = AnalysisConfig {
        target_width: optimized.target_width,
        target_height: optimized.target_height,
        tile_size: optimized.tile_size,
        tile_pow2: optimized.tile_pow2,
        tile_shift: optimized.tile_shift,
        palette_opaque: false,
        circle_bounds_pad: batch.config.circle_bounds_pad,
    };
    let bounds = analysis::compute_primitive_bounds(batch, kind, index, &config);
    if !bounds.valid {
        return None;
    }
    let mut rect = IntRect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y1);
    if let Some(clip) = bounds.clip {
        rect = rect.intersect(&clip)?;
    }
    rect.intersect(&tile)
}

/// Renders every command assigned to `tile_index` into `target`.
pub fn render_tile(target: &TargetSlice, batch: &RenderBatch, optimized: &OptimizedBatch, tile_index: usize) {
    let tile = tile_rect(optimized, tile_index);
    if tile.is_empty() {
        return;
    }

    if let Some(stream) = &optimized.tile_stream {
        for tc in stream.commands_for_tile(tile_index) {
            let allowed = IntRect::new(
                tile.x0 + tc.x as i32,
                tile.y0 + tc.y as i32,
                tile.x0 + tc.x as i32 + tc.w_minus1 as i32 + 1,
                tile.y0 + tc.y as i32 + tc.h_minus1 as i32 + 1,
            );
            primitives::draw(target, batch, &optimized.rects, &optimized.texts, tc.kind, tc.store_index, allowed);
        }
        return;
    }

    let start = optimized.tile_offsets[tile_index] as usize;
    let end = optimized.tile_offsets[tile_index + 1] as usize;
    for &r in &optimized.tile_refs[start..end] {
        if optimized.tile_refs_are_circle_indices {
            let allowed = match allowed_for_bin(batch, optimized, CommandType::Circle, r, tile) {
                Some(a) => a,
                None => continue,
            };
            primitives::draw(target, batch, &optimized.rects, &optimized.texts, CommandType::Circle, r, allowed);
        } else {
            let cmd = match batch.commands.get(r as usize) {
                Some(c) => *c,
                None => continue,
            };
            let allowed = match allowed_for_bin(batch, optimized, cmd.kind, cmd.index, tile) {
                Some(a) => a,
                None => continue,
            };
            primitives::draw(target, batch, &optimized.rects, &optimized.texts, cmd.kind, cmd.index, allowed);
        }
    }
}
