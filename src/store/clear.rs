//! Columnar stores for whole-target clears and small tiled clear patterns.

#[derive(Debug, Clone, Default)]
pub struct ClearStore {
    pub color_rgba8: Vec<u32>,
}

impl ClearStore {
    pub fn len(&self) -> usize {
        self.color_rgba8.len()
    }

    pub fn is_empty(&self) -> bool {
        self.color_rgba8.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push(&mut self, color_rgba8: u32) -> u32 {
        let idx = self.len() as u32;
        self.color_rgba8.push(color_rgba8);
        idx
    }

    pub fn truncate(&mut self, len: usize) {
        self.color_rgba8.truncate(len);
    }
}

/// A small `w x h` tile of packed RGBA8 colors, tiled across the target (or
/// a tile, when `useTileBuffer`). Accepted only when it fits the chosen tile
/// size (checked by the optimizer, §4.3.4).
#[derive(Debug, Clone, Default)]
pub struct ClearPatternStore {
    pub width: Vec<u8>,
    pub height: Vec<u8>,
    pub data_offset: Vec<usize>,
    pattern_pool: Vec<u32>,
}

impl ClearPatternStore {
    pub fn len(&self) -> usize {
        self.width.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn push(&mut self, width: u8, height: u8, cells: &[u32]) -> u32 {
        let idx = self.len() as u32;
        let offset = self.pattern_pool.len();
        self.pattern_pool.extend_from_slice(cells);
        self.width.push(width);
        self.height.push(height);
        self.data_offset.push(offset);
        idx
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let pool_cut = self.data_offset[len];
        self.width.truncate(len);
        self.height.truncate(len);
        self.data_offset.truncate(len);
        self.pattern_pool.truncate(pool_cut);
    }

    pub fn cells(&self, pattern_index: usize) -> &[u32] {
        let offset = self.data_offset[pattern_index];
        let len = self.width[pattern_index] as usize * self.height[pattern_index] as usize;
        &self.pattern_pool[offset..offset + len]
    }
}
