//! `raster2d`: a CPU, tile-parallel 2D rasterizer for batches of declarative
//! draw commands.
//!
//! A [`batch::RenderBatch`] accumulates commands (rects, circles, lines,
//! images, text, clears) through [`builder::BatchBuilder`]. Calling
//! [`optimizer::optimize_batch`] derives an [`optimizer::OptimizedBatch`] —
//! tile binning, premultiplied caches, the resolved clear/debug state — which
//! [`rasterizer::render_optimized`] then rasterizes into a caller-owned
//! [`target::RenderTarget`]. [`render`] does both in one call for callers
//! that don't need to reuse the optimized form across frames.

pub mod analysis;
pub mod batch;
pub mod builder;
pub mod color;
pub mod error;
pub mod geometry;
pub mod optimizer;
pub mod palette;
pub mod pool;
pub mod profile;
pub mod rasterizer;
pub mod store;
pub mod target;
pub mod tile_stream;

pub use batch::{RenderBatch, RenderBatchConfig};
pub use builder::BatchBuilder;
pub use color::Color;
pub use error::{BuildError, RenderValidationIssue, RenderValidationReport, ValidationIssueCode};
pub use optimizer::{optimize_batch, OptimizedBatch};
pub use palette::Palette;
pub use rasterizer::render_optimized;
pub use target::RenderTarget;

/// Optimizes `batch` against `target` and, if the result is usable,
/// rasterizes it immediately. Equivalent to calling [`optimize_batch`]
/// followed by [`render_optimized`] with a batch-owned [`OptimizedBatch`]
/// that callers who want cross-frame reuse should keep themselves instead.
pub fn render(target: &mut RenderTarget, batch: &RenderBatch) -> bool {
    let mut optimized = OptimizedBatch::new();
    if !optimize_batch(target, batch, &mut optimized) {
        return false;
    }
    render_optimized(target, batch, &optimized)
}
