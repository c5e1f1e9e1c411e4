//! End-to-end coverage of text draws. Shaping happens outside this crate,
//! so a glyph run is assembled directly against the columnar stores rather
//! than through `BatchBuilder` (which has no text-specific append method).

use raster2d::color::Color;
use raster2d::store::command::{CommandType, RenderCommand};
use raster2d::store::text::{GlyphBitmap, GlyphFormat};
use raster2d::target::RenderTarget;
use raster2d::{render, RenderBatch};

fn solid_mask_bitmap(w: i32, h: i32, coverage: u8) -> GlyphBitmap {
    GlyphBitmap {
        width: w,
        height: h,
        bearing_x: 0,
        bearing_y: 0,
        advance: w,
        stride: w,
        format: GlyphFormat::Mask8,
        atlas_index: -1,
        atlas_x: 0,
        atlas_y: 0,
        pixels: vec![coverage; (w * h) as usize],
    }
}

#[test]
fn mask8_glyph_draws_with_the_text_color_at_full_coverage() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(200, 50, 25, 255)]);

    let bitmap_index = batch.glyphs.push_bitmap(solid_mask_bitmap(4, 4, 255));
    let glyph_index = batch.glyphs.push_glyph(0, 0, bitmap_index);
    let run_index = batch
        .text_runs
        .push(glyph_index, 1, 0, raster2d::geometry::f32_to_uq8_8(1.0));
    let text_index = batch.texts.push(0, 0, 4, 4, 0, 255, 0, 0, run_index, (0, 0, 0, 0));
    batch.commands.push(RenderCommand::new(CommandType::Text, text_index));

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(2, 2), [200, 50, 25, 255]);
    assert_eq!(target.pixel(7, 7), [0, 0, 0, 0]);
}

#[test]
fn zero_coverage_mask_glyph_leaves_the_target_untouched() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(255, 255, 255, 255)]);

    let bitmap_index = batch.glyphs.push_bitmap(solid_mask_bitmap(2, 2, 0));
    let glyph_index = batch.glyphs.push_glyph(0, 0, bitmap_index);
    let run_index = batch
        .text_runs
        .push(glyph_index, 1, 0, raster2d::geometry::f32_to_uq8_8(1.0));
    let text_index = batch.texts.push(0, 0, 2, 2, 0, 255, 0, 0, run_index, (0, 0, 0, 0));
    batch.commands.push(RenderCommand::new(CommandType::Text, text_index));

    let mut buf = vec![0u8; 4 * 4 * 4];
    let mut target = RenderTarget::new(&mut buf, 4, 4, 4 * 4);
    assert!(render(&mut target, &batch));
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(target.pixel(x, y), [0, 0, 0, 0]);
        }
    }
}

#[test]
fn color_bgra_glyph_is_premultiplied_by_opacity_at_draw_time() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(255, 255, 255, 255)]);

    let bitmap = GlyphBitmap {
        width: 1,
        height: 1,
        bearing_x: 0,
        bearing_y: 0,
        advance: 1,
        stride: 1,
        format: GlyphFormat::ColorBgra,
        atlas_index: -1,
        atlas_x: 0,
        atlas_y: 0,
        // BGRA: opaque blue
        pixels: vec![255, 0, 0, 255],
    };
    let bitmap_index = batch.glyphs.push_bitmap(bitmap);
    let glyph_index = batch.glyphs.push_glyph(0, 0, bitmap_index);
    let run_index = batch
        .text_runs
        .push(glyph_index, 1, 0, raster2d::geometry::f32_to_uq8_8(1.0));
    // half opacity on the text command itself
    let text_index = batch.texts.push(0, 0, 1, 1, 0, 128, 0, 0, run_index, (0, 0, 0, 0));
    batch.commands.push(RenderCommand::new(CommandType::Text, text_index));

    let mut buf = vec![0u8; 4 * 4 * 4];
    let mut target = RenderTarget::new(&mut buf, 4, 4, 4 * 4);
    assert!(render(&mut target, &batch));
    let px = target.pixel(0, 0);
    assert!(px[2] > 100 && px[2] < 140, "unexpected blue channel {px:?}");
    assert_eq!(px[3], 128);
}

#[test]
fn glyph_sharing_an_atlas_samples_from_the_atlas_slab() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(10, 20, 30, 255)]);

    let atlas_index = batch.glyphs.push_atlas(raster2d::store::text::GlyphAtlas {
        width: 8,
        height: 8,
        stride: 8,
        pixels: vec![255; 8 * 8],
    });
    let bitmap = GlyphBitmap {
        width: 2,
        height: 2,
        bearing_x: 0,
        bearing_y: 0,
        advance: 2,
        stride: 8,
        format: GlyphFormat::Mask8,
        atlas_index: atlas_index as i32,
        atlas_x: 0,
        atlas_y: 0,
        pixels: Vec::new(),
    };
    let bitmap_index = batch.glyphs.push_bitmap(bitmap);
    let glyph_index = batch.glyphs.push_glyph(0, 0, bitmap_index);
    let run_index = batch
        .text_runs
        .push(glyph_index, 1, 0, raster2d::geometry::f32_to_uq8_8(1.0));
    let text_index = batch.texts.push(0, 0, 2, 2, 0, 255, 0, 0, run_index, (0, 0, 0, 0));
    batch.commands.push(RenderCommand::new(CommandType::Text, text_index));

    let mut buf = vec![0u8; 4 * 4 * 4];
    let mut target = RenderTarget::new(&mut buf, 4, 4, 4 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(0, 0), [10, 20, 30, 255]);
}

#[test]
fn glyph_samples_its_own_slot_not_the_atlas_origin() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(10, 20, 30, 255)]);

    // 8x8 atlas, all zero coverage except a 2x2 slot at (4, 4). A glyph
    // pointing at that slot must sample it, not the zeroed-out origin.
    let mut pixels = vec![0u8; 8 * 8];
    for row in 4..6 {
        for col in 4..6 {
            pixels[row * 8 + col] = 255;
        }
    }
    let atlas_index = batch.glyphs.push_atlas(raster2d::store::text::GlyphAtlas {
        width: 8,
        height: 8,
        stride: 8,
        pixels,
    });
    let bitmap = GlyphBitmap {
        width: 2,
        height: 2,
        bearing_x: 0,
        bearing_y: 0,
        advance: 2,
        stride: 8,
        format: GlyphFormat::Mask8,
        atlas_index: atlas_index as i32,
        atlas_x: 4,
        atlas_y: 4,
        pixels: Vec::new(),
    };
    let bitmap_index = batch.glyphs.push_bitmap(bitmap);
    let glyph_index = batch.glyphs.push_glyph(0, 0, bitmap_index);
    let run_index = batch
        .text_runs
        .push(glyph_index, 1, 0, raster2d::geometry::f32_to_uq8_8(1.0));
    let text_index = batch.texts.push(0, 0, 2, 2, 0, 255, 0, 0, run_index, (0, 0, 0, 0));
    batch.commands.push(RenderCommand::new(CommandType::Text, text_index));

    let mut buf = vec![0u8; 4 * 4 * 4];
    let mut target = RenderTarget::new(&mut buf, 4, 4, 4 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(0, 0), [10, 20, 30, 255]);
    assert_eq!(target.pixel(1, 1), [10, 20, 30, 255]);
}
