//! Per-rect / per-text premultiplied coverage tables and gradient setup
//! (§4.3.10). Built once per optimize pass for every active (non-culled)
//! rect and text index.

use crate::analysis::AnalyzedCommand;
use crate::batch::RenderBatch;
use crate::color::{build_premultiplied_lut, round_mul_div_255, Color};
use crate::store::CommandType;

/// Dense, per-store-index caches for rects. Sized to `batch.rects.len()`;
/// `active[i]` is false for rects that were culled or never seen this pass.
#[derive(Debug, Clone, Default)]
pub struct RectCache {
    pub active: Vec<bool>,
    pub base_alpha: Vec<u8>,
    pub color0: Vec<Color>,
    pub color1: Vec<Color>,
    pub has_gradient: Vec<bool>,
    pub grad_dir_x: Vec<f32>,
    pub grad_dir_y: Vec<f32>,
    pub grad_min: Vec<f32>,
    pub grad_inv_range: Vec<f32>,
    /// Index into `edge_pool_r/g/b`, or `-1` when this rect has no edge LUT
    /// (it has a gradient, isn't fully opaque, or the fast path is
    /// disabled).
    pub edge_offset: Vec<i32>,
    pub edge_pool_r: Vec<u8>,
    pub edge_pool_g: Vec<u8>,
    pub edge_pool_b: Vec<u8>,
}

impl RectCache {
    fn resize(&mut self, len: usize) {
        self.active = vec![false; len];
        self.base_alpha = vec![0; len];
        self.color0 = vec![Color::TRANSPARENT; len];
        self.color1 = vec![Color::TRANSPARENT; len];
        self.has_gradient = vec![false; len];
        self.grad_dir_x = vec![0.0; len];
        self.grad_dir_y = vec![0.0; len];
        self.grad_min = vec![0.0; len];
        self.grad_inv_range = vec![0.0; len];
        self.edge_offset = vec![-1; len];
        self.edge_pool_r.clear();
        self.edge_pool_g.clear();
        self.edge_pool_b.clear();
    }
}

/// Same shape as `RectCache`, but for text draws: one 256-entry coverage
/// LUT per active index since text coverage always spans 0..255.
#[derive(Debug, Clone, Default)]
pub struct TextCache {
    pub active: Vec<bool>,
    pub base_alpha: Vec<u8>,
    pub color: Vec<Color>,
    pub pm_offset: Vec<i32>,
    pub pm_pool_r: Vec<u8>,
    pub pm_pool_g: Vec<u8>,
    pub pm_pool_b: Vec<u8>,
}

impl TextCache {
    fn resize(&mut self, len: usize) {
        self.active = vec![false; len];
        self.base_alpha = vec![0; len];
        self.color = vec![Color::TRANSPARENT; len];
        self.pm_offset = vec![-1; len];
        self.pm_pool_r.clear();
        self.pm_pool_g.clear();
        self.pm_pool_b.clear();
    }
}

/// Builds `RectCache` and `TextCache` for every `AnalyzedCommand` that
/// survived culling, using `disable_opaque_rect_fast_path` to decide whether
/// to populate the edge LUT.
pub fn build_caches(
    batch: &RenderBatch,
    analyzed: &[AnalyzedCommand],
    disable_opaque_rect_fast_path: bool,
) -> (RectCache, TextCache) {
    let mut rects = RectCache::default();
    rects.resize(batch.rects.len());
    let mut texts = TextCache::default();
    texts.resize(batch.texts.len());

    for a in analyzed {
        if !a.valid {
            continue;
        }
        match a.kind {
            CommandType::Rect => build_rect_cache_entry(batch, a.index as usize, disable_opaque_rect_fast_path, &mut rects),
            CommandType::Text => build_text_cache_entry(batch, a.index as usize, &mut texts),
            _ => {}
        }
    }

    (rects, texts)
}

fn build_rect_cache_entry(
    batch: &RenderBatch,
    i: usize,
    disable_opaque_rect_fast_path: bool,
    cache: &mut RectCache,
) {
    let color0 = match batch.palette.get(batch.rects.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let base_alpha = round_mul_div_255(color0.a(), batch.rects.opacity[i]);

    cache.active[i] = true;
    cache.base_alpha[i] = base_alpha;
    cache.color0[i] = color0;

    if batch.rects.has_gradient(i) {
        let color1 = batch
            .palette
            .get(batch.rects.gradient_color1_index[i])
            .unwrap_or(color0);
        cache.color1[i] = color1;
        cache.has_gradient[i] = true;

        let (dx, dy, gmin, inv_range) = gradient_setup(batch, i);
        cache.grad_dir_x[i] = dx;
        cache.grad_dir_y[i] = dy;
        cache.grad_min[i] = gmin;
        cache.grad_inv_range[i] = inv_range;
        return;
    }

    if !disable_opaque_rect_fast_path
        && base_alpha == 255
        && batch.rects.radius_q8_8[i] == 0
        && batch.rects.rotation_q8_8[i] == 0
    {
        let offset = cache.edge_pool_r.len();
        let mut lut_r = [0u8; 256];
        let mut lut_g = [0u8; 256];
        let mut lut_b = [0u8; 256];
        build_premultiplied_lut(color0.r(), &mut lut_r);
        build_premultiplied_lut(color0.g(), &mut lut_g);
        build_premultiplied_lut(color0.b(), &mut lut_b);
        cache.edge_pool_r.extend_from_slice(&lut_r);
        cache.edge_pool_g.extend_from_slice(&lut_g);
        cache.edge_pool_b.extend_from_slice(&lut_b);
        cache.edge_offset[i] = offset as i32;
    }
}

/// Normalized gradient direction and `(min, 1/range)` projected from the
/// rect's four corners onto that direction (§4.3.10). Falls back to `(0,1)`
/// when the projected range collapses (`< 1e-5`), matching the spec's
/// division-by-near-zero guard.
fn gradient_setup(batch: &RenderBatch, i: usize) -> (f32, f32, f32, f32) {
    use crate::geometry::q8_8_to_f32;

    let dx_raw = q8_8_to_f32(batch.rects.gradient_dir_x[i]);
    let dy_raw = q8_8_to_f32(batch.rects.gradient_dir_y[i]);
    let len = (dx_raw * dx_raw + dy_raw * dy_raw).sqrt();
    let (dx, dy) = if len > 1e-6 {
        (dx_raw / len, dy_raw / len)
    } else {
        (0.0, 1.0)
    };

    let x0 = batch.rects.x0[i] as f32;
    let y0 = batch.rects.y0[i] as f32;
    let x1 = batch.rects.x1[i] as f32;
    let y1 = batch.rects.y1[i] as f32;
    let corners = [(x0, y0), (x1, y0), (x0, y1), (x1, y1)];
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for (cx, cy) in corners {
        let proj = cx * dx + cy * dy;
        min = min.min(proj);
        max = max.max(proj);
    }

    let range = max - min;
    if range < 1e-5 {
        (dx, dy, min, 1.0)
    } else {
        (dx, dy, min, 1.0 / range)
    }
}

fn build_text_cache_entry(batch: &RenderBatch, i: usize, cache: &mut TextCache) {
    let color = match batch.palette.get(batch.texts.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let base_alpha = round_mul_div_255(color.a(), batch.texts.opacity[i]);

    cache.active[i] = true;
    cache.base_alpha[i] = base_alpha;
    cache.color[i] = color;

    let offset = cache.pm_pool_r.len();
    let mut lut_r = [0u8; 256];
    let mut lut_g = [0u8; 256];
    let mut lut_b = [0u8; 256];
    build_premultiplied_lut(color.r(), &mut lut_r);
    build_premultiplied_lut(color.g(), &mut lut_g);
    build_premultiplied_lut(color.b(), &mut lut_b);
    cache.pm_pool_r.extend_from_slice(&lut_r);
    cache.pm_pool_g.extend_from_slice(&lut_g);
    cache.pm_pool_b.extend_from_slice(&lut_b);
    cache.pm_offset[i] = offset as i32;
}
