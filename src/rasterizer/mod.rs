//! Top-level rasterizer dispatch (§4.4.1): fills the target if the batch
//! resolved a clear, rasterizes every render tile (in parallel across the
//! process-wide tile pool), then draws the debug-tile overlay in a single
//! sequential pass once every tile has finished.

pub mod blend;
pub mod primitives;
pub mod sdf;
pub mod tile;

use crate::batch::RenderBatch;
use crate::color::Color;
use crate::geometry::IntRect;
use crate::optimizer::OptimizedBatch;
use crate::pool::tile_pool;
use crate::target::RenderTarget;
use blend::{premultiply, TargetSlice};

/// Rasterizes `optimized` into `target`. Returns `false` without touching
/// the buffer if `optimized` isn't valid for this target (caller should have
/// checked [`crate::optimizer::optimize_batch`]'s return value already).
pub fn render_optimized(target: &mut RenderTarget, batch: &RenderBatch, optimized: &OptimizedBatch) -> bool {
    if !optimized.valid
        || !target.is_valid()
        || target.width() != optimized.target_width
        || target.height() != optimized.target_height
    {
        return false;
    }

    if optimized.has_clear {
        fill_clear(target, batch, optimized);
    }

    let tiles = &optimized.render_tiles;
    if !tiles.is_empty() {
        let slice = TargetSlice::new(target);
        tile_pool::get().run(tiles.len(), |i| {
            tile::render_tile(&slice, batch, optimized, tiles[i] as usize);
        });
    }

    if optimized.has_debug_tiles {
        draw_debug_tiles(target, optimized);
    }

    true
}

fn fill_clear(target: &mut RenderTarget, batch: &RenderBatch, optimized: &OptimizedBatch) {
    let width = target.width();
    let height = target.height();

    match optimized.clear_pattern_index {
        Some(pattern_index) => {
            let i = pattern_index as usize;
            let w = batch.clear_patterns.width[i] as u32;
            let h = batch.clear_patterns.height[i] as u32;
            if w == 0 || h == 0 {
                return;
            }
            let cells = batch.clear_patterns.cells(i);
            for y in 0..height {
                let row = (y % h) as usize;
                for x in 0..width {
                    let col = (x % w) as usize;
                    let color = Color::unpack(cells[row * w as usize + col]);
                    target.put_pixel(x, y, [color.r(), color.g(), color.b(), color.a()]);
                }
            }
        }
        None => {
            let color = optimized.clear_color;
            let rgba = [color.r(), color.g(), color.b(), color.a()];
            for y in 0..height {
                for x in 0..width {
                    target.put_pixel(x, y, rgba);
                }
            }
        }
    }
}

fn draw_debug_tiles(target: &mut RenderTarget, optimized: &OptimizedBatch) {
    let slice = TargetSlice::new(target);
    let color = optimized.debug_color;
    let pm = premultiply(color, color.a());
    if pm[3] == 0 {
        return;
    }
    let line_width = optimized.debug_line_width.max(1) as i32;
    let bounds = IntRect::new(0, 0, optimized.target_width as i32, optimized.target_height as i32);

    let tile_count = optimized.tile_count();
    let indices: Vec<u32> = if optimized.debug_dirty_only {
        optimized.render_tiles.clone()
    } else {
        (0..tile_count as u32).collect()
    };

    for t in indices {
        let tx = t % optimized.tiles_x;
        let ty = t / optimized.tiles_x;
        let size = optimized.tile_size as i32;
        let rect = IntRect::new(tx as i32 * size, ty as i32 * size, (tx as i32 + 1) * size, (ty as i32 + 1) * size);
        let Some(rect) = rect.intersect(&bounds) else { continue };
        outline_rect(&slice, rect, line_width, pm);
    }
}

fn outline_rect(target: &TargetSlice, rect: IntRect, width: i32, pm: [u8; 4]) {
    let band = |x0: i32, y0: i32, x1: i32, y1: i32| {
        for y in y0.max(0)..y1.min(target.height() as i32) {
            for x in x0.max(0)..x1.min(target.width() as i32) {
                unsafe { target.blend(x as u32, y as u32, pm) };
            }
        }
    };
    band(rect.x0, rect.y0, rect.x1, rect.y0 + width);
    band(rect.x0, rect.y1 - width, rect.x1, rect.y1);
    band(rect.x0, rect.y0, rect.x0 + width, rect.y1);
    band(rect.x1 - width, rect.y0, rect.x1, rect.y1);
}
