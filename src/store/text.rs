//! Columnar stores for text draws, runs, and glyphs. Shaping and rasterizing
//! glyph bitmaps happens outside this crate; what arrives here is already
//! placed, measured geometry and pixel data.

pub const TEXT_FLAG_CLIP: u8 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphFormat {
    /// Single 8-bit coverage channel, read through the text's premultiplied
    /// coverage LUT.
    Mask8,
    /// Four-channel BGRA color glyph (e.g. emoji), premultiplied on the fly
    /// by opacity at draw time.
    ColorBgra,
}

#[derive(Debug, Clone, Default)]
pub struct TextStore {
    pub x: Vec<i32>,
    pub y: Vec<i32>,
    pub width: Vec<i32>,
    pub height: Vec<i32>,
    pub z_q8_8: Vec<i16>,
    pub opacity: Vec<u8>,
    pub color_index: Vec<u8>,
    pub flags: Vec<u8>,
    pub run_index: Vec<u32>,
    pub clip_x0: Vec<i32>,
    pub clip_y0: Vec<i32>,
    pub clip_x1: Vec<i32>,
    pub clip_y1: Vec<i32>,
}

#[allow(clippy::too_many_arguments)]
impl TextStore {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_clip(&self, i: usize) -> bool {
        self.flags[i] & TEXT_FLAG_CLIP != 0
    }

    pub fn push(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        z_q8_8: i16,
        opacity: u8,
        color_index: u8,
        flags: u8,
        run_index: u32,
        clip: (i32, i32, i32, i32),
    ) -> u32 {
        let idx = self.len() as u32;
        self.x.push(x);
        self.y.push(y);
        self.width.push(width);
        self.height.push(height);
        self.z_q8_8.push(z_q8_8);
        self.opacity.push(opacity);
        self.color_index.push(color_index);
        self.flags.push(flags);
        self.run_index.push(run_index);
        self.clip_x0.push(clip.0);
        self.clip_y0.push(clip.1);
        self.clip_x1.push(clip.2);
        self.clip_y1.push(clip.3);
        idx
    }

    pub fn truncate(&mut self, len: usize) {
        self.x.truncate(len);
        self.y.truncate(len);
        self.width.truncate(len);
        self.height.truncate(len);
        self.z_q8_8.truncate(len);
        self.opacity.truncate(len);
        self.color_index.truncate(len);
        self.flags.truncate(len);
        self.run_index.truncate(len);
        self.clip_x0.truncate(len);
        self.clip_y0.truncate(len);
        self.clip_x1.truncate(len);
        self.clip_y1.truncate(len);
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextRunStore {
    pub glyph_start: Vec<u32>,
    pub glyph_count: Vec<u32>,
    pub baseline_q8_8: Vec<i16>,
    pub scale_q8_8: Vec<u16>,
}

impl TextRunStore {
    pub fn len(&self) -> usize {
        self.glyph_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_start.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push(
        &mut self,
        glyph_start: u32,
        glyph_count: u32,
        baseline_q8_8: i16,
        scale_q8_8: u16,
    ) -> u32 {
        let idx = self.len() as u32;
        self.glyph_start.push(glyph_start);
        self.glyph_count.push(glyph_count);
        self.baseline_q8_8.push(baseline_q8_8);
        self.scale_q8_8.push(scale_q8_8);
        idx
    }
}

/// A glyph's own pixel slab, owned when `atlas_index < 0`.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: i32,
    pub height: i32,
    pub bearing_x: i32,
    pub bearing_y: i32,
    pub advance: i32,
    pub stride: i32,
    pub format: GlyphFormat,
    /// `-1` means this bitmap owns `pixels` directly; otherwise an index
    /// into `GlyphStore::atlases`.
    pub atlas_index: i32,
    pub atlas_x: i32,
    pub atlas_y: i32,
    pub pixels: Vec<u8>,
}

/// A shared rectangular plane that multiple glyph bitmaps may sample from.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub pixels: Vec<u8>,
}

/// Per-glyph placement plus the pools of bitmaps and atlases glyphs may
/// reference. Bitmaps referencing an atlas avoid a cyclic owner graph by
/// storing a plain index rather than a shared pointer.
#[derive(Debug, Clone, Default)]
pub struct GlyphStore {
    pub glyph_x_q8_8: Vec<i16>,
    pub glyph_y_q8_8: Vec<i16>,
    pub bitmap_index: Vec<u32>,
    pub bitmaps: Vec<GlyphBitmap>,
    pub atlases: Vec<GlyphAtlas>,
}

impl GlyphStore {
    pub fn len(&self) -> usize {
        self.glyph_x_q8_8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyph_x_q8_8.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push_glyph(&mut self, x_q8_8: i16, y_q8_8: i16, bitmap_index: u32) -> u32 {
        let idx = self.len() as u32;
        self.glyph_x_q8_8.push(x_q8_8);
        self.glyph_y_q8_8.push(y_q8_8);
        self.bitmap_index.push(bitmap_index);
        idx
    }

    pub fn push_bitmap(&mut self, bitmap: GlyphBitmap) -> u32 {
        let idx = self.bitmaps.len() as u32;
        self.bitmaps.push(bitmap);
        idx
    }

    pub fn push_atlas(&mut self, atlas: GlyphAtlas) -> u32 {
        let idx = self.atlases.len() as u32;
        self.atlases.push(atlas);
        idx
    }

    /// Returns the `(pixels, stride)` a glyph should sample from: either its
    /// own slab, or the atlas it points into.
    pub fn source_for_bitmap(&self, bitmap_index: usize) -> (&[u8], i32) {
        let bmp = &self.bitmaps[bitmap_index];
        if bmp.atlas_index < 0 {
            (&bmp.pixels, bmp.stride)
        } else {
            let atlas = &self.atlases[bmp.atlas_index as usize];
            (&atlas.pixels, atlas.stride)
        }
    }
}
