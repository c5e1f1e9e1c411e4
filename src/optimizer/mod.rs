//! Builds and caches the derived, renderer-ready representation of a
//! `RenderBatch` (§4.3): tile binning or a (pre)merged tile stream, the
//! render-tile list, and per-rect/text premultiplied caches.

pub mod binning;
pub mod caches;
pub mod validation;

use std::time::Instant;

use crate::analysis::{self, AnalysisConfig, AnalyzedCommand};
use crate::batch::{CommandTypeCounts, RenderBatch};
use crate::color::Color;
use crate::error::RenderValidationReport;
use crate::geometry::IntRect;
use crate::profile::RendererProfile;
use crate::target::RenderTarget;
use crate::tile_stream::{self, TileCommand, TileStream};

pub use caches::{RectCache, TextCache};

/// Default tile edge in pixels, used when `batch.config.tile_size == 0`.
pub const DEFAULT_TILE_SIZE: u16 = 32;
/// Tile edge auto-selected when the batch is circle-majority (§4.3.2).
pub const CIRCLE_MAJORITY_TILE_SIZE: u16 = 64;
/// Render tiles beyond this count skip the descending-load sort on the
/// circle-only fast path (§4.3.9) since the sort cost would dominate.
pub const MAX_SORTED_RENDER_TILES: usize = 256;

/// The derived cache produced by [`optimize_batch`]. Owned by the caller and
/// reused across frames whenever `batch.config.reuse_optimized` and
/// `source_revision` agree with `batch.config.revision` (§3 Lifecycles).
#[derive(Debug, Clone, Default)]
pub struct OptimizedBatch {
    pub valid: bool,
    pub source_revision: u64,

    pub target_width: u32,
    pub target_height: u32,

    pub tile_size: u16,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub tile_pow2: bool,
    pub tile_shift: u8,

    /// Populated when no tile stream is in play: `tile_offsets[t]..
    /// tile_offsets[t+1]` indexes into `tile_refs` for tile `t`.
    pub tile_offsets: Vec<u32>,
    /// Either positions into the per-frame analyzed-command vector, or (when
    /// `tile_refs_are_circle_indices`) circle store indices directly.
    pub tile_refs: Vec<u32>,
    pub tile_refs_are_circle_indices: bool,

    /// Populated instead of `tile_offsets`/`tile_refs` when a tile stream
    /// (caller-supplied or synthesized) drives rendering.
    pub tile_stream: Option<TileStream>,

    /// Tile indices (`ty * tiles_x + tx`) that need any rasterization work.
    pub render_tiles: Vec<u32>,

    pub has_clear: bool,
    pub clear_color: Color,
    /// Index into `batch.clear_patterns`, set instead of `clear_color` when
    /// the resolved clear command was a `ClearPattern`.
    pub clear_pattern_index: Option<u32>,

    pub has_debug_tiles: bool,
    pub debug_color: Color,
    pub debug_line_width: u8,
    pub debug_dirty_only: bool,

    pub rects: RectCache,
    pub texts: TextCache,

    command_counts: CommandTypeCounts,
    command_counts_valid: bool,

    pub profile: RendererProfile,
    pub validation_report: RenderValidationReport,
}

impl OptimizedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tile_count(&self) -> usize {
        (self.tiles_x as usize) * (self.tiles_y as usize)
    }
}

/// Resolves the tile edge for this frame (§4.3.2): a caller-supplied
/// pre-merged tile stream wins outright; otherwise the configured size
/// (defaulting to 32) is bumped to 64 when the batch is circle-majority and
/// auto tile streaming is on.
fn resolve_tile_size(batch: &RenderBatch, counts: &CommandTypeCounts) -> u16 {
    if let Some(stream) = &batch.tile_stream {
        if stream.enabled && stream.pre_merged && stream.tile_size > 0 && stream.tile_size <= 256 {
            return stream.tile_size;
        }
    }
    let mut size = batch.config.tile_size;
    if size == 0 {
        size = DEFAULT_TILE_SIZE;
    }
    if batch.config.auto_tile_stream && size == DEFAULT_TILE_SIZE && counts.is_circle_majority() {
        size = CIRCLE_MAJORITY_TILE_SIZE;
    }
    size
}

enum TileResolution {
    Stream(TileStream),
    Bins { offsets: Vec<u32>, refs: Vec<u32>, circle_indices: bool },
}

#[allow(clippy::too_many_arguments)]
fn resolve_tiles(
    batch: &RenderBatch,
    analyzed: &[AnalyzedCommand],
    tiles_x: u32,
    tiles_y: u32,
    tile_size: u16,
) -> TileResolution {
    if let Some(stream) = &batch.tile_stream {
        if stream.enabled && stream.pre_merged && stream.offsets_consistent() {
            tracing::debug!("using caller-supplied pre-merged tile stream");
            return TileResolution::Stream(stream.clone());
        }
        if stream.enabled {
            tracing::debug!("premerging caller-supplied multi-level tile stream");
            let merged = tile_stream::premerge(stream, tiles_x, tiles_y, tile_size);
            return TileResolution::Stream(merged);
        }
    }

    let binning = binning::bin_tiles(batch, analyzed, tiles_x, tiles_y);
    if batch.config.auto_tile_stream && !binning.tile_refs_are_circle_indices {
        let synthesized = synthesize_tile_stream(
            analyzed,
            &binning.tile_offsets,
            &binning.tile_refs,
            tiles_x,
            tiles_y,
            tile_size,
        );
        return TileResolution::Stream(synthesized);
    }

    TileResolution::Bins {
        offsets: binning.tile_offsets,
        refs: binning.tile_refs,
        circle_indices: binning.tile_refs_are_circle_indices,
    }
}

/// Builds a premerged tile stream directly from a non-stream binning pass'
/// offsets/refs (§4.3.6's third outcome), localizing each referenced
/// command's clipped bounds to the tile it was binned into.
fn synthesize_tile_stream(
    analyzed: &[AnalyzedCommand],
    tile_offsets: &[u32],
    tile_refs: &[u32],
    tiles_x: u32,
    tiles_y: u32,
    tile_size: u16,
) -> TileStream {
    let tile_count = (tiles_x as usize) * (tiles_y as usize);
    let mut offsets = Vec::with_capacity(tile_count + 1);
    let mut commands = Vec::with_capacity(tile_refs.len());
    offsets.push(0u32);

    for t in 0..tile_count {
        let tx = (t as u32) % tiles_x;
        let ty = (t as u32) / tiles_x;
        let tile_abs = IntRect::new(
            tx as i32 * tile_size as i32,
            ty as i32 * tile_size as i32,
            (tx as i32 + 1) * tile_size as i32,
            (ty as i32 + 1) * tile_size as i32,
        );
        let start = tile_offsets[t] as usize;
        let end = tile_offsets[t + 1] as usize;
        for &pos in &tile_refs[start..end] {
            let a = &analyzed[pos as usize];
            if let Some(tc) = localize(a, &tile_abs) {
                commands.push(tc);
            }
        }
        offsets.push(commands.len() as u32);
    }

    TileStream {
        tile_size,
        enabled: true,
        pre_merged: true,
        offsets,
        commands,
        macro_offsets: Vec::new(),
        macro_commands: Vec::new(),
        global_commands: Vec::new(),
    }
}

fn localize(a: &AnalyzedCommand, tile_abs: &IntRect) -> Option<TileCommand> {
    let local = a.bounds().intersect(tile_abs)?;
    let w = local.width();
    let h = local.height();
    let x = local.x0 - tile_abs.x0;
    let y = local.y0 - tile_abs.y0;
    if x < 0 || y < 0 || x > 255 || y > 255 || w <= 0 || h <= 0 || w > 256 || h > 256 {
        return None;
    }
    Some(TileCommand {
        kind: a.kind,
        store_index: a.index,
        order: a.order,
        x: x as u8,
        y: y as u8,
        w_minus1: (w - 1) as u8,
        h_minus1: (h - 1) as u8,
    })
}

fn tile_offsets_of(resolution: &TileResolution) -> &[u32] {
    match resolution {
        TileResolution::Stream(s) => &s.offsets,
        TileResolution::Bins { offsets, .. } => offsets,
    }
}

fn render_tiles_for(offsets: &[u32], tile_count: usize, has_clear: bool, circle_indices: bool) -> Vec<u32> {
    if has_clear {
        return (0..tile_count as u32).collect();
    }
    let mut tiles: Vec<u32> = (0..tile_count as u32)
        .filter(|&t| offsets[t as usize + 1] > offsets[t as usize])
        .collect();
    if circle_indices && tiles.len() <= MAX_SORTED_RENDER_TILES {
        tiles.sort_by_key(|&t| std::cmp::Reverse(offsets[t as usize + 1] - offsets[t as usize]));
    }
    tiles
}

/// Walks `commands` resolving the final clear state (§4.3.4): the last
/// `Clear` or `ClearPattern` wins, and a `ClearPattern` is only accepted
/// when it fits inside one tile.
fn resolve_clear(batch: &RenderBatch, tile_size: u16) -> (bool, Color, Option<u32>) {
    let mut has_clear = false;
    let mut color = Color::TRANSPARENT;
    let mut pattern_index = None;
    for cmd in &batch.commands {
        match cmd.kind {
            crate::store::CommandType::Clear => {
                has_clear = true;
                color = Color::unpack(batch.clears.color_rgba8[cmd.index as usize]);
                pattern_index = None;
            }
            crate::store::CommandType::ClearPattern => {
                let i = cmd.index as usize;
                let w = batch.clear_patterns.width[i];
                let h = batch.clear_patterns.height[i];
                if w > 0 && h > 0 && (w as u16) <= tile_size && (h as u16) <= tile_size {
                    has_clear = true;
                    pattern_index = Some(cmd.index);
                } else {
                    tracing::warn!("clear_patterns[{i}] {w}x{h} does not fit tile size {tile_size}, ignored");
                }
            }
            _ => {}
        }
    }
    (has_clear, color, pattern_index)
}

/// Walks `commands` resolving the final debug-tiles overlay state (§4.3.5):
/// the last `DebugTiles` command wins.
fn resolve_debug_tiles(batch: &RenderBatch) -> (bool, Color, u8, bool) {
    let mut found = None;
    for cmd in &batch.commands {
        if cmd.kind == crate::store::CommandType::DebugTiles {
            found = Some(cmd.index as usize);
        }
    }
    match found {
        Some(i) => (
            true,
            Color::unpack(batch.debug_tiles.color_rgba8[i]),
            batch.debug_tiles.line_width[i].max(1),
            batch.debug_tiles.dirty_only(i),
        ),
        None => (false, Color::TRANSPARENT, 1, false),
    }
}

/// Prepares (or refreshes) `optimized` from `target` and `batch`. Returns
/// `optimized.valid` for convenience. Never allocates when the reuse gate
/// (§4.3.1) applies.
pub fn optimize_batch(target: &RenderTarget, batch: &RenderBatch, optimized: &mut OptimizedBatch) -> bool {
    let span = tracing::debug_span!("optimize_batch");
    let _enter = span.enter();

    if batch.config.use_command_revision
        && optimized.command_counts_valid
        && optimized.command_counts.revision == batch.config.command_revision
    {
        tracing::debug!("reusing cached command type counts");
    } else {
        optimized.command_counts = batch.command_type_counts();
        optimized.command_counts_valid = true;
    }

    let resolved_tile_size = resolve_tile_size(batch, &optimized.command_counts);

    if batch.config.reuse_optimized
        && !batch.config.strict_validation
        && optimized.valid
        && optimized.source_revision == batch.config.revision
        && optimized.target_width == target.width()
        && optimized.target_height == target.height()
        && optimized.tile_size == resolved_tile_size
    {
        tracing::debug!(revision = batch.config.revision, "reusing cached optimized batch");
        return true;
    }

    optimized.valid = false;
    optimized.validation_report.clear();
    optimized.profile.reset();

    if !target.is_valid() {
        tracing::warn!(
            width = target.width(),
            height = target.height(),
            stride = target.stride(),
            "render target failed validation"
        );
        return false;
    }
    if !batch.palette.enabled() || batch.palette.size() == 0 {
        tracing::warn!("palette disabled or empty");
        return false;
    }

    if batch.config.strict_validation {
        let mut report = RenderValidationReport::default();
        let ok = validation::validate(batch, &mut report);
        optimized.validation_report = report;
        if !ok {
            tracing::warn!(
                issues = optimized.validation_report.issues.len(),
                "strict validation failed"
            );
            return false;
        }
    }

    let tile_size = resolved_tile_size;
    let tiles_x = (target.width()).div_ceil(tile_size as u32).max(1);
    let tiles_y = (target.height()).div_ceil(tile_size as u32).max(1);
    let tile_pow2 = tile_size.is_power_of_two();
    let tile_shift = if tile_pow2 { tile_size.trailing_zeros() as u8 } else { 0 };

    let (has_clear, clear_color, clear_pattern_index) = resolve_clear(batch, tile_size);
    let (has_debug_tiles, debug_color, debug_line_width, debug_dirty_only) = resolve_debug_tiles(batch);

    let t_analyze = Instant::now();
    let analysis_config = AnalysisConfig {
        target_width: target.width(),
        target_height: target.height(),
        tile_size,
        tile_pow2,
        tile_shift,
        palette_opaque: batch.palette.is_opaque(),
        circle_bounds_pad: batch.config.circle_bounds_pad,
    };
    let analyzed = analysis::analyze_commands(batch, &analysis_config);
    optimized.profile.analyze_ns = t_analyze.elapsed().as_nanos() as u64;
    optimized.profile.commands_analyzed = analyzed.len() as u32;
    optimized.profile.commands_culled = analyzed.iter().filter(|a| !a.valid).count() as u32;

    let t_bin = Instant::now();
    let resolution = resolve_tiles(batch, &analyzed, tiles_x, tiles_y, tile_size);
    optimized.profile.bin_ns = t_bin.elapsed().as_nanos() as u64;

    let tile_count = (tiles_x as usize) * (tiles_y as usize);
    let circle_indices = matches!(
        &resolution,
        TileResolution::Bins { circle_indices: true, .. }
    );
    let render_tiles = render_tiles_for(tile_offsets_of(&resolution), tile_count, has_clear, circle_indices);

    if !has_clear && !has_debug_tiles && render_tiles.is_empty() {
        tracing::debug!("batch is trivially empty (no clear, no debug tiles, no draws)");
        return false;
    }

    let (rects, texts) = caches::build_caches(batch, &analyzed, batch.config.disable_opaque_rect_fast_path);

    match resolution {
        TileResolution::Stream(stream) => {
            optimized.tile_stream = Some(stream);
            optimized.tile_offsets = Vec::new();
            optimized.tile_refs = Vec::new();
            optimized.tile_refs_are_circle_indices = false;
        }
        TileResolution::Bins { offsets, refs, circle_indices } => {
            optimized.tile_stream = None;
            optimized.tile_offsets = offsets;
            optimized.tile_refs = refs;
            optimized.tile_refs_are_circle_indices = circle_indices;
        }
    }

    optimized.target_width = target.width();
    optimized.target_height = target.height();
    optimized.tile_size = tile_size;
    optimized.tiles_x = tiles_x;
    optimized.tiles_y = tiles_y;
    optimized.tile_pow2 = tile_pow2;
    optimized.tile_shift = tile_shift;
    optimized.render_tiles = render_tiles;
    optimized.has_clear = has_clear;
    optimized.clear_color = clear_color;
    optimized.clear_pattern_index = clear_pattern_index;
    optimized.has_debug_tiles = has_debug_tiles;
    optimized.debug_color = debug_color;
    optimized.debug_line_width = debug_line_width;
    optimized.debug_dirty_only = debug_dirty_only;
    optimized.rects = rects;
    optimized.texts = texts;
    optimized.profile.tiles_rendered = optimized.render_tiles.len() as u32;
    optimized.valid = true;
    optimized.source_revision = batch.config.revision;

    tracing::debug!(
        tiles_x,
        tiles_y,
        tile_size,
        render_tiles = optimized.render_tiles.len(),
        "optimized batch ready"
    );

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AppendRect, BatchBuilder};
    use crate::color::Color;

    fn make_target(buf: &mut [u8], w: u32, h: u32) -> RenderTarget<'_> {
        RenderTarget::new(buf, w, h, w * 4)
    }

    #[test]
    fn empty_batch_is_invalid() {
        let mut buf = vec![0u8; 16 * 4 * 4];
        let target = make_target(&mut buf, 4, 4);
        let mut batch = RenderBatch::default();
        batch.palette.set_colors(&[Color::BLACK]);
        let mut optimized = OptimizedBatch::new();
        assert!(!optimize_batch(&target, &batch, &mut optimized));
    }

    #[test]
    fn disabled_palette_is_invalid() {
        let mut buf = vec![0u8; 16 * 4 * 4];
        let target = make_target(&mut buf, 4, 4);
        let batch = RenderBatch::default();
        let mut optimized = OptimizedBatch::new();
        assert!(!optimize_batch(&target, &batch, &mut optimized));
    }

    #[test]
    fn single_rect_produces_render_tiles() {
        let mut buf = vec![0u8; 16 * 16 * 4];
        let target = make_target(&mut buf, 16, 16);
        let mut batch = RenderBatch::default();
        batch.palette.set_colors(&[Color::rgba(255, 0, 0, 255)]);
        BatchBuilder::new(&mut batch)
            .append_rect(AppendRect {
                x0: 0,
                y0: 0,
                x1: 4,
                y1: 4,
                color_index: 0,
                radius_q8_8: 0,
                rotation_q8_8: 0,
                z_q8_8: 0,
                opacity: 255,
                smooth_blend: false,
                clip: None,
                gradient: None,
            })
            .unwrap();
        let mut optimized = OptimizedBatch::new();
        assert!(optimize_batch(&target, &batch, &mut optimized));
        assert!(!optimized.render_tiles.is_empty());
    }

    #[test]
    fn reuse_gate_skips_recompute_on_matching_revision() {
        let mut buf = vec![0u8; 16 * 16 * 4];
        let target = make_target(&mut buf, 16, 16);
        let mut batch = RenderBatch::default();
        batch.palette.set_colors(&[Color::rgba(255, 0, 0, 255)]);
        batch.config.reuse_optimized = true;
        BatchBuilder::new(&mut batch)
            .append_rect(AppendRect {
                x0: 0,
                y0: 0,
                x1: 4,
                y1: 4,
                color_index: 0,
                radius_q8_8: 0,
                rotation_q8_8: 0,
                z_q8_8: 0,
                opacity: 255,
                smooth_blend: false,
                clip: None,
                gradient: None,
            })
            .unwrap();
        let mut optimized = OptimizedBatch::new();
        assert!(optimize_batch(&target, &batch, &mut optimized));
        let tiles_first = optimized.render_tiles.clone();
        assert!(optimize_batch(&target, &batch, &mut optimized));
        assert_eq!(optimized.render_tiles, tiles_first);
    }

    #[test]
    fn clear_alone_is_valid_and_renders_every_tile() {
        let mut buf = vec![0u8; 16 * 16 * 4];
        let target = make_target(&mut buf, 16, 16);
        let mut batch = RenderBatch::default();
        batch.palette.set_colors(&[Color::BLACK]);
        BatchBuilder::new(&mut batch).append_clear(Color::rgba(1, 2, 3, 255));
        let mut optimized = OptimizedBatch::new();
        assert!(optimize_batch(&target, &batch, &mut optimized));
        assert!(optimized.has_clear);
        assert_eq!(optimized.render_tiles.len(), optimized.tile_count());
    }
}
