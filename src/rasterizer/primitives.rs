//! Per-primitive pixel loops (§4.4.3). Every `draw_*` function walks exactly
//! the pixels inside `allowed` — the command's natural bounds already
//! intersected with its clip rect, the target, and the tile being rendered —
//! and writes through a `TargetSlice` shared read-write across tile workers.

use crate::batch::RenderBatch;
use crate::color::{round_mul_div_255, Color};
use crate::geometry::{q8_8_to_f32, uq8_8_to_f32, IntRect};
use crate::optimizer::{RectCache, TextCache};
use crate::rasterizer::blend::{premultiply, TargetSlice};
use crate::rasterizer::sdf::{circle_coverage, coverage_from_sdf, quantize_coverage, sdf_round_rect};
use crate::store::{CommandType, GlyphFormat};

/// Dispatches a single command to its primitive drawer. `allowed` must
/// already be intersected with the tile's rect, the command's clip (if any),
/// and the target.
#[allow(clippy::too_many_arguments)]
pub fn draw(
    target: &TargetSlice,
    batch: &RenderBatch,
    rects: &RectCache,
    texts: &TextCache,
    kind: CommandType,
    index: u32,
    allowed: IntRect,
) {
    if allowed.is_empty() {
        return;
    }
    match kind {
        CommandType::Rect => draw_rect(target, batch, rects, index as usize, allowed),
        CommandType::Circle => draw_circle(target, batch, index as usize, allowed),
        CommandType::Pixel => draw_pixel(target, batch, index as usize),
        CommandType::PixelA => draw_pixel_a(target, batch, index as usize),
        CommandType::Line => draw_line(target, batch, index as usize, allowed),
        CommandType::Image => draw_image(target, batch, index as usize, allowed),
        CommandType::Text => draw_text(target, batch, texts, index as usize, allowed),
        CommandType::Clear | CommandType::ClearPattern | CommandType::DebugTiles => {}
    }
}

fn draw_rect(target: &TargetSlice, batch: &RenderBatch, cache: &RectCache, i: usize, allowed: IntRect) {
    if !cache.active[i] {
        return;
    }
    let x0 = batch.rects.x0[i] as f32;
    let y0 = batch.rects.y0[i] as f32;
    let x1 = batch.rects.x1[i] as f32;
    let y1 = batch.rects.y1[i] as f32;
    let cx = (x0 + x1) * 0.5;
    let cy = (y0 + y1) * 0.5;
    let hx = (x1 - x0) * 0.5;
    let hy = (y1 - y0) * 0.5;
    let radius = uq8_8_to_f32(batch.rects.radius_q8_8[i]).min(hx).min(hy).max(0.0);
    let rotation = q8_8_to_f32(batch.rects.rotation_q8_8[i]);
    let (sin_r, cos_r) = (-rotation).sin_cos();

    let has_gradient = cache.has_gradient[i];
    let edge_offset = cache.edge_offset[i];

    for py in allowed.y0..allowed.y1 {
        for px in allowed.x0..allowed.x1 {
            let wx = px as f32 + 0.5 - cx;
            let wy = py as f32 + 0.5 - cy;
            let lx = wx * cos_r - wy * sin_r;
            let ly = wx * sin_r + wy * cos_r;
            let sdf = sdf_round_rect(lx, ly, hx, hy, radius);
            let coverage = quantize_coverage(coverage_from_sdf(sdf));
            if coverage == 0 {
                continue;
            }

            let pm = if has_gradient {
                let proj = (px as f32 + 0.5) * cache.grad_dir_x[i] + (py as f32 + 0.5) * cache.grad_dir_y[i];
                let t = ((proj - cache.grad_min[i]) * cache.grad_inv_range[i]).clamp(0.0, 1.0);
                let c0 = cache.color0[i];
                let c1 = cache.color1[i];
                let lerp = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
                let r = lerp(c0.r(), c1.r());
                let g = lerp(c0.g(), c1.g());
                let b = lerp(c0.b(), c1.b());
                let a = lerp(c0.a(), c1.a());
                let opacity = batch.rects.opacity[i];
                let combined = round_mul_div_255(coverage, round_mul_div_255(a, opacity));
                if combined == 0 {
                    continue;
                }
                [
                    round_mul_div_255(r, combined),
                    round_mul_div_255(g, combined),
                    round_mul_div_255(b, combined),
                    combined,
                ]
            } else if edge_offset >= 0 {
                let off = edge_offset as usize + coverage as usize;
                [
                    cache.edge_pool_r[off],
                    cache.edge_pool_g[off],
                    cache.edge_pool_b[off],
                    coverage,
                ]
            } else {
                let combined = round_mul_div_255(coverage, cache.base_alpha[i]);
                if combined == 0 {
                    continue;
                }
                premultiply(cache.color0[i], combined)
            };

            unsafe { target.blend(px as u32, py as u32, pm) };
        }
    }
}

fn draw_circle(target: &TargetSlice, batch: &RenderBatch, i: usize, allowed: IntRect) {
    let color = match batch.palette.get(batch.circles.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let cx = batch.circles.center_x[i] as f32;
    let cy = batch.circles.center_y[i] as f32;
    let radius = batch.circles.radius[i] as f32;

    for py in allowed.y0..allowed.y1 {
        for px in allowed.x0..allowed.x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            let coverage = circle_coverage(dx, dy, radius);
            if coverage == 0 {
                continue;
            }
            let combined = round_mul_div_255(coverage, color.a());
            if combined == 0 {
                continue;
            }
            unsafe { target.blend(px as u32, py as u32, premultiply(color, combined)) };
        }
    }
}

/// Pixel bypasses blending entirely: a raw overwrite of the destination.
fn draw_pixel(target: &TargetSlice, batch: &RenderBatch, i: usize) {
    let color = match batch.palette.get(batch.pixels.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let x = batch.pixels.x[i] as u32;
    let y = batch.pixels.y[i] as u32;
    if x >= target.width() || y >= target.height() {
        return;
    }
    unsafe { target.put(x, y, [color.r(), color.g(), color.b(), color.a()]) };
}

fn draw_pixel_a(target: &TargetSlice, batch: &RenderBatch, i: usize) {
    let color = match batch.palette.get(batch.pixels_a.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let x = batch.pixels_a.x[i] as u32;
    let y = batch.pixels_a.y[i] as u32;
    if x >= target.width() || y >= target.height() {
        return;
    }
    let combined = round_mul_div_255(color.a(), batch.pixels_a.alpha[i]);
    if combined == 0 {
        return;
    }
    unsafe { target.blend(x, y, premultiply(color, combined)) };
}

/// Perpendicular distance from `(px, py)` to the segment `(x0,y0)-(x1,y1)`,
/// clamping the projection to the segment so the line gets flat (not
/// rounded) caps.
fn distance_to_segment(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 1e-9 {
        (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = x0 + dx * t;
    let cy = y0 + dy * t;
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn draw_line(target: &TargetSlice, batch: &RenderBatch, i: usize, allowed: IntRect) {
    let color = match batch.palette.get(batch.lines.color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let base_alpha = round_mul_div_255(color.a(), batch.lines.opacity[i]);
    if base_alpha == 0 {
        return;
    }
    let x0 = batch.lines.x0[i] as f32;
    let y0 = batch.lines.y0[i] as f32;
    let x1 = batch.lines.x1[i] as f32;
    let y1 = batch.lines.y1[i] as f32;
    let half_width = uq8_8_to_f32(batch.lines.width_q8_8[i]) / 2.0;

    for py in allowed.y0..allowed.y1 {
        for px in allowed.x0..allowed.x1 {
            let dist = distance_to_segment(px as f32 + 0.5, py as f32 + 0.5, x0, y0, x1, y1);
            let coverage = quantize_coverage(coverage_from_sdf(dist - half_width));
            if coverage == 0 {
                continue;
            }
            let combined = round_mul_div_255(coverage, base_alpha);
            if combined == 0 {
                continue;
            }
            unsafe { target.blend(px as u32, py as u32, premultiply(color, combined)) };
        }
    }
}

fn wrap_or_clamp(coord: i32, size: i32, wrap: bool) -> i32 {
    if wrap {
        coord.rem_euclid(size)
    } else {
        coord.clamp(0, size - 1)
    }
}

fn sample_bilinear(pixels: &[u8], width: i32, height: i32, stride: i32, sx: f32, sy: f32, wrap_u: bool, wrap_v: bool) -> [u8; 4] {
    let texel = |x: i32, y: i32| -> [u8; 4] {
        let x = wrap_or_clamp(x, width, wrap_u);
        let y = wrap_or_clamp(y, height, wrap_v);
        let off = (y * stride + x * 4) as usize;
        [pixels[off], pixels[off + 1], pixels[off + 2], pixels[off + 3]]
    };

    let fx = sx.floor();
    let fy = sy.floor();
    let tx = sx - fx;
    let ty = sy - fy;
    let x0 = fx as i32;
    let y0 = fy as i32;

    let p00 = texel(x0, y0);
    let p10 = texel(x0 + 1, y0);
    let p01 = texel(x0, y0 + 1);
    let p11 = texel(x0 + 1, y0 + 1);

    let lerp = |a: u8, b: u8, t: f32| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = lerp(p00[c], p10[c], tx);
        let bot = lerp(p01[c], p11[c], tx);
        out[c] = lerp(top, bot, ty);
    }
    out
}

fn draw_image(target: &TargetSlice, batch: &RenderBatch, i: usize, allowed: IntRect) {
    let tint = match batch.palette.get(batch.image_draws.tint_color_index[i]) {
        Some(c) => c,
        None => return,
    };
    let asset = batch.image_draws.image_index[i] as usize;
    if asset >= batch.image_assets.len() {
        return;
    }
    let asset_w = batch.image_assets.width[asset] as i32;
    let asset_h = batch.image_assets.height[asset] as i32;
    let asset_stride = batch.image_assets.stride_bytes[asset] as i32;
    let pixels = batch.image_assets.pixels(asset);

    let dx0 = batch.image_draws.x0[i] as f32;
    let dy0 = batch.image_draws.y0[i] as f32;
    let dx1 = batch.image_draws.x1[i] as f32;
    let dy1 = batch.image_draws.y1[i] as f32;
    let dw = (dx1 - dx0).max(1e-6);
    let dh = (dy1 - dy0).max(1e-6);

    let sx0 = batch.image_draws.src_x0[i] as f32;
    let sy0 = batch.image_draws.src_y0[i] as f32;
    let sx1 = batch.image_draws.src_x1[i] as f32;
    let sy1 = batch.image_draws.src_y1[i] as f32;

    let wrap_u = batch.image_draws.wrap_u(i);
    let wrap_v = batch.image_draws.wrap_v(i);
    let opacity = batch.image_draws.opacity[i];

    for py in allowed.y0..allowed.y1 {
        for px in allowed.x0..allowed.x1 {
            let tu = (px as f32 + 0.5 - dx0) / dw;
            let tv = (py as f32 + 0.5 - dy0) / dh;
            let sx = sx0 + tu * (sx1 - sx0);
            let sy = sy0 + tv * (sy1 - sy0);
            let sample = sample_bilinear(pixels, asset_w, asset_h, asset_stride, sx, sy, wrap_u, wrap_v);

            let tinted_r = round_mul_div_255(sample[0], tint.r());
            let tinted_g = round_mul_div_255(sample[1], tint.g());
            let tinted_b = round_mul_div_255(sample[2], tint.b());
            let tinted_a = round_mul_div_255(sample[3], tint.a());
            let combined = round_mul_div_255(tinted_a, opacity);
            if combined == 0 {
                continue;
            }
            let pm = [
                round_mul_div_255(tinted_r, combined),
                round_mul_div_255(tinted_g, combined),
                round_mul_div_255(tinted_b, combined),
                combined,
            ];
            unsafe { target.blend(px as u32, py as u32, pm) };
        }
    }
}

fn draw_text(target: &TargetSlice, batch: &RenderBatch, cache: &TextCache, i: usize, allowed: IntRect) {
    if !cache.active[i] {
        return;
    }
    let run_index = batch.texts.run_index[i] as usize;
    if run_index >= batch.text_runs.len() {
        return;
    }
    let glyph_start = batch.text_runs.glyph_start[run_index] as usize;
    let glyph_count = batch.text_runs.glyph_count[run_index] as usize;
    let baseline = q8_8_to_f32(batch.text_runs.baseline_q8_8[run_index]);
    let scale = uq8_8_to_f32(batch.text_runs.scale_q8_8[run_index]);

    let base_x = batch.texts.x[i] as f32;
    let base_y = batch.texts.y[i] as f32;
    let base_alpha = cache.base_alpha[i];
    let opacity = batch.texts.opacity[i];

    for g in glyph_start..glyph_start + glyph_count {
        if g >= batch.glyphs.len() {
            continue;
        }
        let bitmap_index = batch.glyphs.bitmap_index[g] as usize;
        if bitmap_index >= batch.glyphs.bitmaps.len() {
            continue;
        }
        let bitmap = &batch.glyphs.bitmaps[bitmap_index];
        let glyph_x = q8_8_to_f32(batch.glyphs.glyph_x_q8_8[g]) * scale;
        let glyph_y = q8_8_to_f32(batch.glyphs.glyph_y_q8_8[g]) * scale;

        let gx0 = (base_x + glyph_x + bitmap.bearing_x as f32).round() as i32;
        let gy0 = (base_y + baseline * scale + glyph_y - bitmap.bearing_y as f32).round() as i32;
        let glyph_rect = IntRect::new(gx0, gy0, gx0 + bitmap.width, gy0 + bitmap.height);
        let clipped = match glyph_rect.intersect(&allowed) {
            Some(r) => r,
            None => continue,
        };

        let (source, stride) = batch.glyphs.source_for_bitmap(bitmap_index);
        let (atlas_x, atlas_y) = if bitmap.atlas_index >= 0 {
            (bitmap.atlas_x, bitmap.atlas_y)
        } else {
            (0, 0)
        };
        match bitmap.format {
            GlyphFormat::Mask8 => {
                for py in clipped.y0..clipped.y1 {
                    let row = py - gy0 + atlas_y;
                    for px in clipped.x0..clipped.x1 {
                        let col = px - gx0 + atlas_x;
                        let off = (row * stride + col) as usize;
                        let coverage = source[off];
                        if coverage == 0 {
                            continue;
                        }
                        let combined = round_mul_div_255(coverage, base_alpha);
                        if combined == 0 {
                            continue;
                        }
                        let idx = cache.pm_offset[i] as usize + combined as usize;
                        let pm = [
                            cache.pm_pool_r[idx],
                            cache.pm_pool_g[idx],
                            cache.pm_pool_b[idx],
                            combined,
                        ];
                        unsafe { target.blend(px as u32, py as u32, pm) };
                    }
                }
            }
            GlyphFormat::ColorBgra => {
                for py in clipped.y0..clipped.y1 {
                    let row = py - gy0 + atlas_y;
                    for px in clipped.x0..clipped.x1 {
                        let col = px - gx0 + atlas_x;
                        let off = (row * stride + col * 4) as usize;
                        let b = source[off];
                        let gch = source[off + 1];
                        let r = source[off + 2];
                        let a = source[off + 3];
                        if a == 0 {
                            continue;
                        }
                        let combined = round_mul_div_255(a, opacity);
                        if combined == 0 {
                            continue;
                        }
                        let pm = [
                            round_mul_div_255(r, combined),
                            round_mul_div_255(gch, combined),
                            round_mul_div_255(b, combined),
                            combined,
                        ];
                        unsafe { target.blend(px as u32, py as u32, pm) };
                    }
                }
            }
        }
    }
}
