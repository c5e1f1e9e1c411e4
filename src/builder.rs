//! Validated append API onto a `RenderBatch`. Every append validates fully
//! before pushing anything, so a rejected append never leaves a column
//! partially populated — there is nothing to roll back.

use crate::batch::RenderBatch;
use crate::color::Color;
use crate::error::BuildError;
use crate::store::rect::{RECT_FLAG_CLIP, RECT_FLAG_GRADIENT, RECT_FLAG_SMOOTH_BLEND};
use crate::store::{image::IMAGE_FLAG_CLIP, image::IMAGE_FLAG_WRAP_U, image::IMAGE_FLAG_WRAP_V};
use crate::store::{CommandType, RenderCommand};

const COORD_MIN: i32 = i16::MIN as i32;
const COORD_MAX: i32 = i16::MAX as i32;

#[inline]
fn to_i16(v: i32) -> Result<i16, BuildError> {
    if v < COORD_MIN || v > COORD_MAX {
        Err(BuildError::CoordinateOverflow)
    } else {
        Ok(v as i16)
    }
}

/// Optional gradient applied to a rect (`Gradient` flag).
#[derive(Debug, Clone, Copy)]
pub struct GradientSpec {
    pub color1_index: u8,
    pub dir_x_q8_8: i16,
    pub dir_y_q8_8: i16,
}

/// Optional clip rectangle shared by every primitive kind that supports one.
pub type ClipRect = (i32, i32, i32, i32);

#[derive(Debug, Clone, Copy)]
pub struct AppendRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub color_index: u8,
    pub radius_q8_8: u16,
    pub rotation_q8_8: i16,
    pub z_q8_8: i16,
    pub opacity: u8,
    pub smooth_blend: bool,
    pub clip: Option<ClipRect>,
    pub gradient: Option<GradientSpec>,
}

#[derive(Debug, Clone, Copy)]
pub struct AppendCircle {
    pub center_x: i32,
    pub center_y: i32,
    pub radius: u16,
    pub color_index: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct AppendLine {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub width_q8_8: u16,
    pub color_index: u8,
    pub opacity: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct AppendImage {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub src_x0: u16,
    pub src_y0: u16,
    pub src_x1: u16,
    pub src_y1: u16,
    pub image_index: u32,
    pub tint_color_index: u8,
    pub opacity: u8,
    pub wrap_u: bool,
    pub wrap_v: bool,
    pub clip: Option<ClipRect>,
}

/// Wraps a `&mut RenderBatch` with the validated append operations from
/// §4.1. Every method either appends a `RenderCommand` (bumping
/// `command_revision`) and returns the new store index, or returns a
/// `BuildError` and leaves the batch untouched.
pub struct BatchBuilder<'a> {
    batch: &'a mut RenderBatch,
}

impl<'a> BatchBuilder<'a> {
    pub fn new(batch: &'a mut RenderBatch) -> Self {
        Self { batch }
    }

    fn push_command(&mut self, kind: CommandType, index: u32) {
        self.batch.commands.push(RenderCommand::new(kind, index));
        self.batch.config.command_revision = self.batch.config.command_revision.wrapping_add(1);
    }

    fn clip_fields(clip: Option<ClipRect>) -> Result<(u8, (i16, i16, i16, i16)), BuildError> {
        match clip {
            None => Ok((0, (0, 0, 0, 0))),
            Some((x0, y0, x1, y1)) => Ok((
                RECT_FLAG_CLIP,
                (to_i16(x0)?, to_i16(y0)?, to_i16(x1)?, to_i16(y1)?),
            )),
        }
    }

    pub fn append_rect(&mut self, rect: AppendRect) -> Result<u32, BuildError> {
        if rect.x1 <= rect.x0 || rect.y1 <= rect.y0 {
            return Err(BuildError::DegeneratePrimitive);
        }
        let x0 = to_i16(rect.x0)?;
        let y0 = to_i16(rect.y0)?;
        let x1 = to_i16(rect.x1)?;
        let y1 = to_i16(rect.y1)?;
        let (clip_flag, clip) = Self::clip_fields(rect.clip)?;

        let mut flags = clip_flag;
        if rect.smooth_blend {
            flags |= RECT_FLAG_SMOOTH_BLEND;
        }
        let (grad_flag, grad_color1, grad_dir_x, grad_dir_y) = match rect.gradient {
            Some(g) => (RECT_FLAG_GRADIENT, g.color1_index, g.dir_x_q8_8, g.dir_y_q8_8),
            None => (0, 0, 0, 0),
        };
        flags |= grad_flag;

        let index = self.batch.rects.push(
            x0,
            y0,
            x1,
            y1,
            rect.color_index,
            rect.radius_q8_8,
            rect.rotation_q8_8,
            rect.z_q8_8,
            rect.opacity,
            flags,
            grad_color1,
            grad_dir_x,
            grad_dir_y,
            clip,
        );
        self.push_command(CommandType::Rect, index);
        Ok(index)
    }

    pub fn append_circle(&mut self, circle: AppendCircle) -> Result<u32, BuildError> {
        let cx = to_i16(circle.center_x)?;
        let cy = to_i16(circle.center_y)?;
        let index = self
            .batch
            .circles
            .push(cx, cy, circle.radius, circle.color_index);
        self.push_command(CommandType::Circle, index);
        Ok(index)
    }

    pub fn append_pixel(&mut self, x: i32, y: i32, color_index: u8) -> Result<u32, BuildError> {
        let x = to_i16(x)?;
        let y = to_i16(y)?;
        let index = self.batch.pixels.push(x, y, color_index);
        self.push_command(CommandType::Pixel, index);
        Ok(index)
    }

    pub fn append_pixel_a(
        &mut self,
        x: i32,
        y: i32,
        color_index: u8,
        alpha: u8,
    ) -> Result<u32, BuildError> {
        let x = to_i16(x)?;
        let y = to_i16(y)?;
        let index = self.batch.pixels_a.push(x, y, color_index, alpha);
        self.push_command(CommandType::PixelA, index);
        Ok(index)
    }

    pub fn append_line(&mut self, line: AppendLine) -> Result<u32, BuildError> {
        if line.width_q8_8 == 0 {
            return Err(BuildError::DegeneratePrimitive);
        }
        let x0 = to_i16(line.x0)?;
        let y0 = to_i16(line.y0)?;
        let x1 = to_i16(line.x1)?;
        let y1 = to_i16(line.y1)?;
        let index = self.batch.lines.push(
            x0,
            y0,
            x1,
            y1,
            line.width_q8_8,
            line.color_index,
            line.opacity,
        );
        self.push_command(CommandType::Line, index);
        Ok(index)
    }

    /// Registers raw RGBA8 pixel data as an image asset and returns its
    /// index, for later use as `AppendImage::image_index`. Does not itself
    /// append a draw command.
    pub fn build_image_asset(
        &mut self,
        width: u32,
        height: u32,
        stride_bytes: u32,
        pixels: &[u8],
    ) -> Result<u32, BuildError> {
        if width == 0 || height == 0 || stride_bytes < width * 4 {
            return Err(BuildError::InvalidImageDimensions);
        }
        if pixels.len() != stride_bytes as usize * height as usize {
            return Err(BuildError::PixelCountMismatch);
        }
        Ok(self.batch.image_assets.push(width, height, stride_bytes, pixels))
    }

    pub fn append_image(&mut self, image: AppendImage) -> Result<u32, BuildError> {
        if image.x1 <= image.x0 || image.y1 <= image.y0 {
            return Err(BuildError::DegeneratePrimitive);
        }
        if image.image_index as usize >= self.batch.image_assets.len() {
            return Err(BuildError::MissingImageAsset);
        }
        let x0 = to_i16(image.x0)?;
        let y0 = to_i16(image.y0)?;
        let x1 = to_i16(image.x1)?;
        let y1 = to_i16(image.y1)?;
        let (clip_flag, clip) = Self::clip_fields(image.clip)?;

        let mut flags = clip_flag;
        if image.wrap_u {
            flags |= IMAGE_FLAG_WRAP_U;
        }
        if image.wrap_v {
            flags |= IMAGE_FLAG_WRAP_V;
        }

        let index = self.batch.image_draws.push(
            (x0, y0, x1, y1),
            (image.src_x0, image.src_y0, image.src_x1, image.src_y1),
            image.image_index,
            image.tint_color_index,
            image.opacity,
            flags,
            clip,
        );
        self.push_command(CommandType::Image, index);
        Ok(index)
    }

    pub fn append_clear(&mut self, color: Color) -> u32 {
        let index = self.batch.clears.push(color.pack());
        self.push_command(CommandType::Clear, index);
        index
    }

    pub fn append_clear_pattern(
        &mut self,
        width: u8,
        height: u8,
        cells: &[Color],
    ) -> Result<u32, BuildError> {
        if width == 0 || height == 0 {
            return Err(BuildError::DegeneratePrimitive);
        }
        if cells.len() != width as usize * height as usize {
            return Err(BuildError::PixelCountMismatch);
        }
        let packed: Vec<u32> = cells.iter().map(|c| c.pack()).collect();
        let index = self.batch.clear_patterns.push(width, height, &packed);
        self.push_command(CommandType::ClearPattern, index);
        Ok(index)
    }

    pub fn append_debug_tiles(&mut self, color: Color, line_width: u8, dirty_only: bool) -> u32 {
        let flags = if dirty_only {
            crate::store::debug_tiles::DEBUG_TILES_FLAG_DIRTY_ONLY
        } else {
            0
        };
        let index = self
            .batch
            .debug_tiles
            .push(color.pack(), line_width, flags);
        self.push_command(CommandType::DebugTiles, index);
        index
    }
}
