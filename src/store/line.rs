//! Columnar store for anti-aliased straight lines.

#[derive(Debug, Clone, Default)]
pub struct LineStore {
    pub x0: Vec<i16>,
    pub y0: Vec<i16>,
    pub x1: Vec<i16>,
    pub y1: Vec<i16>,
    pub width_q8_8: Vec<u16>,
    pub color_index: Vec<u8>,
    pub opacity: Vec<u8>,
}

impl LineStore {
    pub fn len(&self) -> usize {
        self.x0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x0.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        x0: i16,
        y0: i16,
        x1: i16,
        y1: i16,
        width_q8_8: u16,
        color_index: u8,
        opacity: u8,
    ) -> u32 {
        let idx = self.len() as u32;
        self.x0.push(x0);
        self.y0.push(y0);
        self.x1.push(x1);
        self.y1.push(y1);
        self.width_q8_8.push(width_q8_8);
        self.color_index.push(color_index);
        self.opacity.push(opacity);
        idx
    }

    pub fn truncate(&mut self, len: usize) {
        self.x0.truncate(len);
        self.y0.truncate(len);
        self.x1.truncate(len);
        self.y1.truncate(len);
        self.width_q8_8.truncate(len);
        self.color_index.truncate(len);
        self.opacity.truncate(len);
    }
}
