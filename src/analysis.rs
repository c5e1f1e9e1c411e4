//! Command analysis: turns each bindable command into a clipped bounding
//! box, a tile span, and a base alpha (§4.2).

use crate::batch::RenderBatch;
use crate::color::round_mul_div_255;
use crate::geometry::{div_by_tile, uq8_8_to_f32, IntRect};
use crate::store::CommandType;

#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    pub target_width: u32,
    pub target_height: u32,
    pub tile_size: u16,
    pub tile_pow2: bool,
    pub tile_shift: u8,
    pub palette_opaque: bool,
    pub circle_bounds_pad: u8,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveBounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub clip: Option<IntRect>,
    pub valid: bool,
}

impl PrimitiveBounds {
    fn invalid() -> Self {
        Self {
            valid: false,
            ..Default::default()
        }
    }

    fn rect(&self) -> IntRect {
        IntRect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalyzedCommand {
    pub kind: CommandType,
    pub index: u32,
    pub order: u32,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub clip: Option<IntRect>,
    pub base_alpha: u8,
    pub tx0: u32,
    pub ty0: u32,
    pub tx1: u32,
    pub ty1: u32,
    pub valid: bool,
}

impl AnalyzedCommand {
    pub fn bounds(&self) -> IntRect {
        IntRect::new(self.x0, self.y0, self.x1, self.y1)
    }
}

/// Computes the primitive's natural axis-aligned bounds (§4.2), before
/// clipping to the clip rect or the target.
pub fn compute_primitive_bounds(
    batch: &RenderBatch,
    kind: CommandType,
    index: u32,
    config: &AnalysisConfig,
) -> PrimitiveBounds {
    let i = index as usize;
    match kind {
        CommandType::Rect => {
            if i >= batch.rects.len() {
                return PrimitiveBounds::invalid();
            }
            let clip = if batch.rects.has_clip(i) {
                Some(IntRect::new(
                    batch.rects.clip_x0[i] as i32,
                    batch.rects.clip_y0[i] as i32,
                    batch.rects.clip_x1[i] as i32,
                    batch.rects.clip_y1[i] as i32,
                ))
            } else {
                None
            };
            PrimitiveBounds {
                x0: batch.rects.x0[i] as i32,
                y0: batch.rects.y0[i] as i32,
                x1: batch.rects.x1[i] as i32,
                y1: batch.rects.y1[i] as i32,
                clip,
                valid: true,
            }
        }
        CommandType::Circle => {
            if i >= batch.circles.len() {
                return PrimitiveBounds::invalid();
            }
            let cx = batch.circles.center_x[i] as i32;
            let cy = batch.circles.center_y[i] as i32;
            let r = batch.circles.radius[i] as i32;
            let pad = config.circle_bounds_pad as i32;
            PrimitiveBounds {
                x0: cx - r - pad,
                y0: cy - r - pad,
                x1: cx + r + pad + 1,
                y1: cy + r + pad + 1,
                clip: None,
                valid: true,
            }
        }
        CommandType::Pixel => {
            if i >= batch.pixels.len() {
                return PrimitiveBounds::invalid();
            }
            let x = batch.pixels.x[i] as i32;
            let y = batch.pixels.y[i] as i32;
            PrimitiveBounds {
                x0: x,
                y0: y,
                x1: x + 1,
                y1: y + 1,
                clip: None,
                valid: true,
            }
        }
        CommandType::PixelA => {
            if i >= batch.pixels_a.len() {
                return PrimitiveBounds::invalid();
            }
            let x = batch.pixels_a.x[i] as i32;
            let y = batch.pixels_a.y[i] as i32;
            PrimitiveBounds {
                x0: x,
                y0: y,
                x1: x + 1,
                y1: y + 1,
                clip: None,
                valid: true,
            }
        }
        CommandType::Line => {
            if i >= batch.lines.len() {
                return PrimitiveBounds::invalid();
            }
            let x0 = batch.lines.x0[i] as i32;
            let y0 = batch.lines.y0[i] as i32;
            let x1 = batch.lines.x1[i] as i32;
            let y1 = batch.lines.y1[i] as i32;
            let half_width = uq8_8_to_f32(batch.lines.width_q8_8[i]) / 2.0;
            let pad = (half_width + 1.0).ceil() as i32;
            PrimitiveBounds {
                x0: x0.min(x1) - pad,
                y0: y0.min(y1) - pad,
                x1: x0.max(x1) + pad,
                y1: y0.max(y1) + pad,
                clip: None,
                valid: true,
            }
        }
        CommandType::Image => {
            if i >= batch.image_draws.len() {
                return PrimitiveBounds::invalid();
            }
            let clip = if batch.image_draws.has_clip(i) {
                Some(IntRect::new(
                    batch.image_draws.clip_x0[i] as i32,
                    batch.image_draws.clip_y0[i] as i32,
                    batch.image_draws.clip_x1[i] as i32,
                    batch.image_draws.clip_y1[i] as i32,
                ))
            } else {
                None
            };
            PrimitiveBounds {
                x0: batch.image_draws.x0[i] as i32,
                y0: batch.image_draws.y0[i] as i32,
                x1: batch.image_draws.x1[i] as i32,
                y1: batch.image_draws.y1[i] as i32,
                clip,
                valid: true,
            }
        }
        CommandType::Text => {
            if i >= batch.texts.len() {
                return PrimitiveBounds::invalid();
            }
            let clip = if batch.texts.has_clip(i) {
                Some(IntRect::new(
                    batch.texts.clip_x0[i],
                    batch.texts.clip_y0[i],
                    batch.texts.clip_x1[i],
                    batch.texts.clip_y1[i],
                ))
            } else {
                None
            };
            let x = batch.texts.x[i];
            let y = batch.texts.y[i];
            PrimitiveBounds {
                x0: x,
                y0: y,
                x1: x + batch.texts.width[i],
                y1: y + batch.texts.height[i],
                clip,
                valid: true,
            }
        }
        CommandType::Clear | CommandType::ClearPattern | CommandType::DebugTiles => {
            PrimitiveBounds::invalid()
        }
    }
}

/// `(base_alpha, opacity)` for a bindable command: `base_alpha` is the
/// palette color's alpha folded with whatever per-command opacity/alpha
/// scalar applies, `opacity` the raw scalar alone (needed by callers that
/// must re-derive a per-pixel alpha, e.g. gradient rects). `None` when the
/// command's palette index is out of range.
pub(crate) fn command_base_alpha(batch: &RenderBatch, kind: CommandType, i: usize) -> Option<(u8, u8)> {
    match kind {
        CommandType::Rect => {
            let color = batch.palette.get(batch.rects.color_index[i])?;
            Some((round_mul_div_255(color.a(), batch.rects.opacity[i]), batch.rects.opacity[i]))
        }
        CommandType::Circle => {
            let color = batch.palette.get(batch.circles.color_index[i])?;
            Some((color.a(), 255))
        }
        CommandType::PixelA => {
            let color = batch.palette.get(batch.pixels_a.color_index[i])?;
            Some((
                round_mul_div_255(color.a(), batch.pixels_a.alpha[i]),
                batch.pixels_a.alpha[i],
            ))
        }
        CommandType::Line => {
            let color = batch.palette.get(batch.lines.color_index[i])?;
            Some((round_mul_div_255(color.a(), batch.lines.opacity[i]), batch.lines.opacity[i]))
        }
        CommandType::Image => {
            let color = batch.palette.get(batch.image_draws.tint_color_index[i])?;
            Some((
                round_mul_div_255(color.a(), batch.image_draws.opacity[i]),
                batch.image_draws.opacity[i],
            ))
        }
        CommandType::Text => {
            let color = batch.palette.get(batch.texts.color_index[i])?;
            Some((round_mul_div_255(color.a(), batch.texts.opacity[i]), batch.texts.opacity[i]))
        }
        CommandType::Pixel => Some((255, 255)),
        CommandType::Clear | CommandType::ClearPattern | CommandType::DebugTiles => None,
    }
}

fn cull_due_to_alpha(kind: CommandType, base_alpha: u8, opacity: u8, palette_opaque: bool) -> bool {
    match kind {
        CommandType::Pixel => false,
        CommandType::Text | CommandType::Line | CommandType::PixelA => {
            opacity == 0 || (base_alpha == 0 && !palette_opaque)
        }
        _ => base_alpha == 0 && !palette_opaque,
    }
}

/// Analyzes every bindable command in `batch`, producing one `AnalyzedCommand`
/// per entry of `batch.commands` (including culled ones, marked `valid =
/// false`, so callers can index by position).
pub fn analyze_commands(batch: &RenderBatch, config: &AnalysisConfig) -> Vec<AnalyzedCommand> {
    let target = IntRect::new(0, 0, config.target_width as i32, config.target_height as i32);
    let mut out = Vec::with_capacity(batch.commands.len());

    for (order, cmd) in batch.commands.iter().enumerate() {
        let order = order as u32;
        if !cmd.kind.is_bindable() {
            out.push(invalid_analyzed(cmd.kind, cmd.index, order));
            continue;
        }

        let bounds = compute_primitive_bounds(batch, cmd.kind, cmd.index, config);
        if !bounds.valid {
            out.push(invalid_analyzed(cmd.kind, cmd.index, order));
            continue;
        }

        let mut rect = bounds.rect();
        if let Some(clip) = bounds.clip {
            rect = match rect.intersect(&clip) {
                Some(r) => r,
                None => {
                    out.push(invalid_analyzed(cmd.kind, cmd.index, order));
                    continue;
                }
            };
        }
        let rect = match rect.intersect(&target) {
            Some(r) => r,
            None => {
                out.push(invalid_analyzed(cmd.kind, cmd.index, order));
                continue;
            }
        };

        let (base_alpha, opacity) = match command_base_alpha(batch, cmd.kind, cmd.index as usize) {
            Some(v) => v,
            None => {
                out.push(invalid_analyzed(cmd.kind, cmd.index, order));
                continue;
            }
        };
        if cull_due_to_alpha(cmd.kind, base_alpha, opacity, config.palette_opaque) {
            out.push(invalid_analyzed(cmd.kind, cmd.index, order));
            continue;
        }

        let tx0 = div_by_tile(rect.x0, config.tile_size, config.tile_pow2, config.tile_shift).max(0) as u32;
        let ty0 = div_by_tile(rect.y0, config.tile_size, config.tile_pow2, config.tile_shift).max(0) as u32;
        let tx1 = div_by_tile(rect.x1 - 1, config.tile_size, config.tile_pow2, config.tile_shift).max(0) as u32;
        let ty1 = div_by_tile(rect.y1 - 1, config.tile_size, config.tile_pow2, config.tile_shift).max(0) as u32;

        out.push(AnalyzedCommand {
            kind: cmd.kind,
            index: cmd.index,
            order,
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
            clip: bounds.clip,
            base_alpha,
            tx0,
            ty0,
            tx1,
            ty1,
            valid: true,
        });
    }

    out
}

fn invalid_analyzed(kind: CommandType, index: u32, order: u32) -> AnalyzedCommand {
    AnalyzedCommand {
        kind,
        index,
        order,
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
        clip: None,
        base_alpha: 0,
        tx0: 0,
        ty0: 0,
        tx1: 0,
        ty1: 0,
        valid: false,
    }
}
