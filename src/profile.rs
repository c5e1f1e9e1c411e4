//! Optional counters populated by the optimizer and rasterizer. Callers who
//! pass `None` pay nothing beyond a branch at each write site.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererProfile {
    pub analyze_ns: u64,
    pub bin_ns: u64,
    pub premerge_ns: u64,
    pub rasterize_ns: u64,
    pub tiles_rendered: u32,
    pub commands_analyzed: u32,
    pub commands_culled: u32,
    pub pixels_touched: u64,
}

impl RendererProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
