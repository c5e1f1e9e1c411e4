//! `RenderBatch`: the columnar stores, command list, palette, optional tile
//! stream, and configuration knobs that together describe one frame.

use crate::palette::Palette;
use crate::store::{
    CircleStore, ClearPatternStore, ClearStore, DebugTilesStore, GlyphStore, ImageAssetStore,
    ImageDrawStore, LineStore, PixelAStore, PixelStore, RectStore, RenderCommand, TextRunStore,
    TextStore,
};
use crate::tile_stream::TileStream;

/// Producer-set knobs recognized by the optimizer and rasterizer (§6).
#[derive(Debug, Clone)]
pub struct RenderBatchConfig {
    /// Tile edge in pixels. `0` means "let the optimizer pick" (defaults to
    /// 32, see §4.3.2).
    pub tile_size: u16,
    /// Let the optimizer synthesize or merge tile streams.
    pub auto_tile_stream: bool,
    /// Producer promises commands are already front-to-back, permitting an
    /// opaque short-circuit optimization during rasterization.
    pub assume_front_to_back: bool,
    /// Skip re-optimization when the cached `OptimizedBatch` still matches.
    pub reuse_optimized: bool,
    /// Bumped by the producer on any mutation that should invalidate a
    /// cached `OptimizedBatch`.
    pub revision: u64,
    /// Bumped by the producer on any mutation to the command list
    /// specifically; used to gate `CommandTypeCounts` reuse.
    pub command_revision: u64,
    /// Reuse cached per-type command counts when `command_revision` matches.
    pub use_command_revision: bool,
    /// Run the full store/index/tile-stream validation pass; fail the
    /// optimized build on any violation instead of recovering locally.
    pub strict_validation: bool,
    /// Extra tile-bounds padding applied to circle commands.
    pub circle_bounds_pad: u8,
    /// Force the general SDF rect path even for simple axis-aligned,
    /// zero-radius, zero-rotation, fully-opaque rects.
    pub disable_opaque_rect_fast_path: bool,
}

impl Default for RenderBatchConfig {
    fn default() -> Self {
        Self {
            tile_size: 0,
            auto_tile_stream: true,
            assume_front_to_back: true,
            reuse_optimized: false,
            revision: 0,
            command_revision: 0,
            use_command_revision: false,
            strict_validation: false,
            circle_bounds_pad: 0,
            disable_opaque_rect_fast_path: false,
        }
    }
}

/// The full set of columnar stores, the ordered command list, the palette,
/// an optional caller-supplied tile stream, and the configuration knobs
/// that together make up a renderable frame.
#[derive(Debug, Clone, Default)]
pub struct RenderBatch {
    pub commands: Vec<RenderCommand>,
    pub palette: Palette,

    pub rects: RectStore,
    pub circles: CircleStore,
    pub pixels: PixelStore,
    pub pixels_a: PixelAStore,
    pub lines: LineStore,
    pub image_assets: ImageAssetStore,
    pub image_draws: ImageDrawStore,
    pub clears: ClearStore,
    pub clear_patterns: ClearPatternStore,
    pub texts: TextStore,
    pub text_runs: TextRunStore,
    pub glyphs: GlyphStore,
    pub debug_tiles: DebugTilesStore,

    pub tile_stream: Option<TileStream>,

    pub config: RenderBatchConfig,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every column, the command list, the tile stream, the palette,
    /// and the config knobs to their defaults (§3 Lifecycles).
    pub fn clear_all(&mut self) {
        self.commands.clear();
        self.palette.clear();
        self.rects.clear();
        self.circles.clear();
        self.pixels.clear();
        self.pixels_a.clear();
        self.lines.clear();
        self.image_assets.clear();
        self.image_draws.clear();
        self.clears.clear();
        self.clear_patterns.clear();
        self.texts.clear();
        self.text_runs.clear();
        self.glyphs.clear();
        self.debug_tiles.clear();
        self.tile_stream = None;
        self.config = RenderBatchConfig::default();
    }

    /// Bumps both `revision` and `command_revision`. Call after any mutation
    /// that changes the command list (most batch-builder appends do this
    /// implicitly via `BatchBuilder`).
    pub fn bump_revision(&mut self) {
        self.config.revision = self.config.revision.wrapping_add(1);
        self.config.command_revision = self.config.command_revision.wrapping_add(1);
    }

    /// Counts of each `CommandType` across `commands`, used by the optimizer
    /// to decide circle-majority tile size selection (§4.3.2) and the
    /// circle-only fast path (§4.3.8).
    pub fn command_type_counts(&self) -> CommandTypeCounts {
        let mut counts = [0u32; crate::store::CommandType::COUNT];
        for cmd in &self.commands {
            counts[cmd.kind.as_usize()] += 1;
        }
        CommandTypeCounts {
            counts,
            revision: self.config.command_revision,
        }
    }
}

/// Cached per-type command counts, tagged with the `command_revision` they
/// were computed from so the optimizer can skip recomputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandTypeCounts {
    counts: [u32; crate::store::CommandType::COUNT],
    pub revision: u64,
}

impl CommandTypeCounts {
    pub fn get(&self, kind: crate::store::CommandType) -> u32 {
        self.counts[kind.as_usize()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_circle_majority(&self) -> bool {
        let total = self.total();
        total > 0 && self.get(crate::store::CommandType::Circle) * 2 > total
    }

    pub fn is_circle_only(&self) -> bool {
        let total = self.total();
        total > 0 && self.get(crate::store::CommandType::Circle) == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CommandType;

    #[test]
    fn clear_all_resets_config_and_stores() {
        let mut batch = RenderBatch::new();
        batch.config.tile_size = 64;
        batch.commands.push(RenderCommand::new(CommandType::Rect, 0));
        batch.rects.push(
            0, 0, 1, 1, 0, 0, 0, 0, 255, 0, 0, 0, 0, (0, 0, 0, 0),
        );
        batch.clear_all();
        assert_eq!(batch.config.tile_size, 0);
        assert!(batch.commands.is_empty());
        assert!(batch.rects.is_empty());
    }

    #[test]
    fn command_type_counts_tallies_by_kind() {
        let mut batch = RenderBatch::new();
        batch.commands.push(RenderCommand::new(CommandType::Circle, 0));
        batch.commands.push(RenderCommand::new(CommandType::Circle, 1));
        batch.commands.push(RenderCommand::new(CommandType::Rect, 0));
        let counts = batch.command_type_counts();
        assert_eq!(counts.get(CommandType::Circle), 2);
        assert_eq!(counts.get(CommandType::Rect), 1);
        assert!(counts.is_circle_majority());
        assert!(!counts.is_circle_only());
    }
}
