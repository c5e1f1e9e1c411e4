//! Per-tile command lists: either supplied by the caller, or synthesized /
//! merged by the optimizer from three levels (per-tile, per-macro-tile,
//! global) down to one (§4.3.6, §4.3.7).

use crate::geometry::IntRect;
use crate::store::CommandType;

/// Macro tiles are `MACRO_FACTOR` x `MACRO_FACTOR` tiles wide.
pub const MACRO_FACTOR: u32 = 2;

/// A command already localized to a single tile: `x,y` is the top-left
/// corner of the rectangle this command may touch, `w_minus1+1,h_minus1+1`
/// its size, both tile-local (fits `u8` since tile size is capped at 256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCommand {
    pub kind: CommandType,
    pub store_index: u32,
    pub order: u32,
    pub x: u8,
    pub y: u8,
    pub w_minus1: u8,
    pub h_minus1: u8,
}

/// A command localized to a macro tile (`MACRO_FACTOR x MACRO_FACTOR`
/// tiles). Coordinates are local to the macro tile's origin and therefore
/// may exceed `u8` range before the premerge intersects them down to a
/// single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroCommand {
    pub kind: CommandType,
    pub store_index: u32,
    pub order: u32,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// A command applied to every tile; its bounds are global and must be
/// intersected per-tile at premerge time. Bounds travel inline with the
/// command record rather than through a separately-indexed cursor, avoiding
/// the bounds/command pairing bug noted in the design notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalCommand {
    pub kind: CommandType,
    pub store_index: u32,
    pub order: u32,
    pub bounds: IntRect,
    pub clip: Option<IntRect>,
}

/// Three-level (or, after premerge, single-level) per-tile command stream.
#[derive(Debug, Clone, Default)]
pub struct TileStream {
    pub tile_size: u16,
    pub enabled: bool,
    pub pre_merged: bool,

    pub offsets: Vec<u32>,
    pub commands: Vec<TileCommand>,

    pub macro_offsets: Vec<u32>,
    pub macro_commands: Vec<MacroCommand>,

    pub global_commands: Vec<GlobalCommand>,
}

impl TileStream {
    pub fn tile_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn macro_tile_count(&self) -> usize {
        self.macro_offsets.len().saturating_sub(1)
    }

    pub fn commands_for_tile(&self, tile_index: usize) -> &[TileCommand] {
        let start = self.offsets[tile_index] as usize;
        let end = self.offsets[tile_index + 1] as usize;
        &self.commands[start..end]
    }

    /// (c) invariants from §4.3.3: offsets arrays have the right length and
    /// terminate at the command count.
    pub fn offsets_consistent(&self) -> bool {
        if self.tile_size == 0 || self.tile_size > 256 {
            return false;
        }
        if !self.offsets.is_empty() {
            if *self.offsets.last().unwrap() as usize != self.commands.len() {
                return false;
            }
        } else if !self.commands.is_empty() {
            return false;
        }
        if !self.macro_offsets.is_empty()
            && *self.macro_offsets.last().unwrap() as usize != self.macro_commands.len()
        {
            return false;
        }
        true
    }
}

/// Runs the three-way merge described in §4.3.7: for every tile, merges its
/// per-tile stream with the macro-tile stream (intersected down to the
/// tile) and the global stream (intersected down to the tile), preserving
/// `order`. Two-phase: count entries per tile, then fill into a pre-sized
/// array.
pub fn premerge(
    source: &TileStream,
    tiles_x: u32,
    tiles_y: u32,
    tile_size: u16,
) -> TileStream {
    let tile_count = (tiles_x as usize) * (tiles_y as usize);
    let macro_tiles_x = tiles_x.div_ceil(MACRO_FACTOR);

    let local_for_tile = |tx: u32, ty: u32| -> (Vec<TileCommand>, usize) {
        let mut out: Vec<(u32, TileCommand)> = Vec::new();

        // Level 1: already tile-local.
        if !source.offsets.is_empty() {
            let tile_index = (ty * tiles_x + tx) as usize;
            for tc in source.commands_for_tile(tile_index) {
                out.push((tc.order, *tc));
            }
        }

        // Level 2: macro-local, intersect against this tile's slot inside
        // its macro tile.
        if !source.macro_offsets.is_empty() {
            let macro_tx = tx / MACRO_FACTOR;
            let macro_ty = ty / MACRO_FACTOR;
            let macro_index = (macro_ty * macro_tiles_x + macro_tx) as usize;
            if macro_index + 1 < source.macro_offsets.len() {
                let start = source.macro_offsets[macro_index] as usize;
                let end = source.macro_offsets[macro_index + 1] as usize;
                let offset_x = (tx % MACRO_FACTOR) as i32 * tile_size as i32;
                let offset_y = (ty % MACRO_FACTOR) as i32 * tile_size as i32;
                for mc in &source.macro_commands[start..end] {
                    let lx0 = mc.x - offset_x;
                    let ly0 = mc.y - offset_y;
                    let local = IntRect::new(lx0, ly0, lx0 + mc.w, ly0 + mc.h);
                    let tile_rect = IntRect::new(0, 0, tile_size as i32, tile_size as i32);
                    if let Some(r) = local.intersect(&tile_rect) {
                        if let Some(tc) = to_tile_command(mc.kind, mc.store_index, mc.order, r) {
                            out.push((mc.order, tc));
                        }
                    }
                }
            }
        }

        // Level 3: global, intersect against the tile's absolute rect.
        if !source.global_commands.is_empty() {
            let tile_abs = IntRect::new(
                tx as i32 * tile_size as i32,
                ty as i32 * tile_size as i32,
                (tx as i32 + 1) * tile_size as i32,
                (ty as i32 + 1) * tile_size as i32,
            );
            for gc in &source.global_commands {
                let mut rect = gc.bounds;
                if let Some(clip) = gc.clip {
                    rect = match rect.intersect(&clip) {
                        Some(r) => r,
                        None => continue,
                    };
                }
                let local = match rect.intersect(&tile_abs) {
                    Some(r) => IntRect::new(
                        r.x0 - tile_abs.x0,
                        r.y0 - tile_abs.y0,
                        r.x1 - tile_abs.x0,
                        r.y1 - tile_abs.y0,
                    ),
                    None => continue,
                };
                if let Some(tc) = to_tile_command(gc.kind, gc.store_index, gc.order, local) {
                    out.push((gc.order, tc));
                }
            }
        }

        out.sort_by_key(|(order, _)| *order);
        let len = out.len();
        (out.into_iter().map(|(_, tc)| tc).collect(), len)
    };

    // Phase 1: count.
    let mut counts = vec![0usize; tile_count];
    let mut per_tile: Vec<Vec<TileCommand>> = Vec::with_capacity(tile_count);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (merged, len) = local_for_tile(tx, ty);
            counts[(ty * tiles_x + tx) as usize] = len;
            per_tile.push(merged);
        }
    }

    // Phase 2: emit into a pre-sized array.
    let mut offsets = Vec::with_capacity(tile_count + 1);
    let mut commands = Vec::with_capacity(counts.iter().sum());
    offsets.push(0u32);
    for merged in per_tile {
        commands.extend(merged);
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

fn to_tile_command(
    kind: CommandType,
    store_index: u32,
    order: u32,
    local: IntRect,
) -> Option<TileCommand> {
    if local.is_empty() {
        return None;
    }
    let w = local.width();
    let h = local.height();
    if local.x0 < 0 || local.y0 < 0 || local.x0 > 255 || local.y0 > 255 || w > 256 || h > 256 {
        return None;
    }
    Some(TileCommand {
        kind,
        store_index,
        order,
        x: local.x0 as u8,
        y: local.y0 as u8,
        w_minus1: (w - 1) as u8,
        h_minus1: (h - 1) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premerge_preserves_order_within_a_tile() {
        let mut source = TileStream {
            tile_size: 8,
            enabled: false,
            pre_merged: false,
            ..Default::default()
        };
        source.global_commands.push(GlobalCommand {
            kind: CommandType::Rect,
            store_index: 0,
            order: 2,
            bounds: IntRect::new(0, 0, 8, 8),
            clip: None,
        });
        source.global_commands.push(GlobalCommand {
            kind: CommandType::Rect,
            store_index: 1,
            order: 1,
            bounds: IntRect::new(0, 0, 8, 8),
            clip: None,
        });
        let merged = premerge(&source, 1, 1, 8);
        let tile0 = merged.commands_for_tile(0);
        assert_eq!(tile0.len(), 2);
        assert!(tile0[0].order < tile0[1].order);
    }

    #[test]
    fn premerge_drops_commands_outside_the_tile() {
        let mut source = TileStream {
            tile_size: 8,
            ..Default::default()
        };
        source.global_commands.push(GlobalCommand {
            kind: CommandType::Rect,
            store_index: 0,
            order: 0,
            bounds: IntRect::new(100, 100, 104, 104),
            clip: None,
        });
        let merged = premerge(&source, 2, 2, 8);
        assert!(merged.commands_for_tile(0).is_empty());
    }
}
