//! Premultiplied OVER compositing and the raw, tile-partitioned view of the
//! target buffer each rasterization worker writes through.

use crate::color::{clamp01_u8, round_mul_div_255, Color};

/// A raw pointer into the caller's framebuffer, shared read-write across
/// tile workers. Safe to use concurrently only because every caller writes
/// exclusively within the pixel rect of the tile it was handed — tiles
/// partition the target without overlap (§5).
pub struct TargetSlice {
    ptr: *mut u8,
    width: u32,
    height: u32,
    stride: u32,
}

// SAFETY: concurrent writers only ever touch disjoint byte ranges, one per
// tile; see the per-tile dispatch in `rasterizer::tile`.
unsafe impl Send for TargetSlice {}
unsafe impl Sync for TargetSlice {}

impl TargetSlice {
    pub fn new(target: &mut crate::target::RenderTarget) -> Self {
        Self {
            ptr: target.buffer_mut().as_mut_ptr(),
            width: target.width(),
            height: target.height(),
            stride: target.stride(),
        }
    }

    #[inline(always)]
    fn offset(&self, x: u32, y: u32) -> isize {
        (y as isize) * (self.stride as isize) + (x as isize) * 4
    }

    /// Reads the pixel at `(x, y)`. Caller must ensure `x < width`, `y <
    /// height`, and that no other thread concurrently writes this pixel.
    #[inline(always)]
    pub unsafe fn get(&self, x: u32, y: u32) -> [u8; 4] {
        let p = self.ptr.offset(self.offset(x, y));
        [*p, *p.add(1), *p.add(2), *p.add(3)]
    }

    /// Overwrites the pixel at `(x, y)` with `rgba` directly, no blending.
    #[inline(always)]
    pub unsafe fn put(&self, x: u32, y: u32, rgba: [u8; 4]) {
        let p = self.ptr.offset(self.offset(x, y));
        *p = rgba[0];
        *p.add(1) = rgba[1];
        *p.add(2) = rgba[2];
        *p.add(3) = rgba[3];
    }

    /// Composites `src_premul` (already premultiplied) over the existing
    /// pixel at `(x, y)`.
    #[inline(always)]
    pub unsafe fn blend(&self, x: u32, y: u32, src_premul: [u8; 4]) {
        let dst = self.get(x, y);
        self.put(x, y, blend_over(dst, src_premul));
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Premultiplied OVER: `out = src + dst * (1 - src.a)`, each channel rounded
/// with the same add-127-then-divide rule used everywhere else (§4.3.10,
/// glossary "Premultiplied alpha").
#[inline(always)]
pub fn blend_over(dst: [u8; 4], src_premul: [u8; 4]) -> [u8; 4] {
    let inv_a = 255 - src_premul[3];
    [
        clamp01_u8(src_premul[0] as i32 + round_mul_div_255(dst[0], inv_a) as i32),
        clamp01_u8(src_premul[1] as i32 + round_mul_div_255(dst[1], inv_a) as i32),
        clamp01_u8(src_premul[2] as i32 + round_mul_div_255(dst[2], inv_a) as i32),
        clamp01_u8(src_premul[3] as i32 + round_mul_div_255(dst[3], inv_a) as i32),
    ]
}

/// Premultiplies `color` by `factor` (itself already the product of
/// coverage, opacity, and the color's own alpha — a combined 0..255
/// scalar), returning the `(r,g,b,a)` word ready for `blend_over`.
#[inline(always)]
pub fn premultiply(color: Color, factor: u8) -> [u8; 4] {
    [
        round_mul_div_255(color.r(), factor),
        round_mul_div_255(color.g(), factor),
        round_mul_div_255(color.b(), factor),
        factor,
    ]
}
