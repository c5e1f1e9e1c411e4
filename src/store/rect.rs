//! Columnar store for (possibly rounded, rotated, gradient-filled) rects.

pub const RECT_FLAG_GRADIENT: u8 = 1 << 0;
pub const RECT_FLAG_CLIP: u8 = 1 << 1;
pub const RECT_FLAG_SMOOTH_BLEND: u8 = 1 << 2;

#[derive(Debug, Clone, Default)]
pub struct RectStore {
    pub x0: Vec<i16>,
    pub y0: Vec<i16>,
    pub x1: Vec<i16>,
    pub y1: Vec<i16>,
    pub color_index: Vec<u8>,
    pub radius_q8_8: Vec<u16>,
    pub rotation_q8_8: Vec<i16>,
    pub z_q8_8: Vec<i16>,
    pub opacity: Vec<u8>,
    pub flags: Vec<u8>,
    pub gradient_color1_index: Vec<u8>,
    pub gradient_dir_x: Vec<i16>,
    pub gradient_dir_y: Vec<i16>,
    pub clip_x0: Vec<i16>,
    pub clip_y0: Vec<i16>,
    pub clip_x1: Vec<i16>,
    pub clip_y1: Vec<i16>,
}

#[allow(clippy::too_many_arguments)]
impl RectStore {
    pub fn len(&self) -> usize {
        self.x0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x0.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn has_gradient(&self, i: usize) -> bool {
        self.flags[i] & RECT_FLAG_GRADIENT != 0
    }

    pub fn has_clip(&self, i: usize) -> bool {
        self.flags[i] & RECT_FLAG_CLIP != 0
    }

    pub fn smooth_blend(&self, i: usize) -> bool {
        self.flags[i] & RECT_FLAG_SMOOTH_BLEND != 0
    }

    /// Pushes a new row onto every column and returns its index.
    pub fn push(
        &mut self,
        x0: i16,
        y0: i16,
        x1: i16,
        y1: i16,
        color_index: u8,
        radius_q8_8: u16,
        rotation_q8_8: i16,
        z_q8_8: i16,
        opacity: u8,
        flags: u8,
        gradient_color1_index: u8,
        gradient_dir_x: i16,
        gradient_dir_y: i16,
        clip: (i16, i16, i16, i16),
    ) -> u32 {
        let idx = self.len() as u32;
        self.x0.push(x0);
        self.y0.push(y0);
        self.x1.push(x1);
        self.y1.push(y1);
        self.color_index.push(color_index);
        self.radius_q8_8.push(radius_q8_8);
        self.rotation_q8_8.push(rotation_q8_8);
        self.z_q8_8.push(z_q8_8);
        self.opacity.push(opacity);
        self.flags.push(flags);
        self.gradient_color1_index.push(gradient_color1_index);
        self.gradient_dir_x.push(gradient_dir_x);
        self.gradient_dir_y.push(gradient_dir_y);
        self.clip_x0.push(clip.0);
        self.clip_y0.push(clip.1);
        self.clip_x1.push(clip.2);
        self.clip_y1.push(clip.3);
        idx
    }

    /// Truncates every column back to `len`, used by the batch builder to
    /// roll back a rejected append.
    pub fn truncate(&mut self, len: usize) {
        self.x0.truncate(len);
        self.y0.truncate(len);
        self.x1.truncate(len);
        self.y1.truncate(len);
        self.color_index.truncate(len);
        self.radius_q8_8.truncate(len);
        self.rotation_q8_8.truncate(len);
        self.z_q8_8.truncate(len);
        self.opacity.truncate(len);
        self.flags.truncate(len);
        self.gradient_color1_index.truncate(len);
        self.gradient_dir_x.truncate(len);
        self.gradient_dir_y.truncate(len);
        self.clip_x0.truncate(len);
        self.clip_y0.truncate(len);
        self.clip_x1.truncate(len);
        self.clip_y1.truncate(len);
    }
}
