//! End-to-end coverage of how the palette gates and resolves rendering: a
//! disabled or empty palette rejects the whole batch, and an out-of-range
//! color index culls just the command that references it.

use raster2d::builder::{AppendRect, BatchBuilder};
use raster2d::color::Color;
use raster2d::target::RenderTarget;
use raster2d::{render, RenderBatch};

fn plain_rect(x0: i32, y0: i32, x1: i32, y1: i32, color_index: u8) -> AppendRect {
    AppendRect {
        x0,
        y0,
        x1,
        y1,
        color_index,
        radius_q8_8: 0,
        rotation_q8_8: 0,
        z_q8_8: 0,
        opacity: 255,
        smooth_blend: false,
        clip: None,
        gradient: None,
    }
}

#[test]
fn disabled_palette_rejects_the_whole_batch() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::WHITE]);
    batch.palette.set_enabled(false);
    BatchBuilder::new(&mut batch)
        .append_rect(plain_rect(0, 0, 4, 4, 0))
        .unwrap();

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    assert!(!render(&mut target, &batch));
}

#[test]
fn empty_palette_rejects_the_whole_batch() {
    let mut batch = RenderBatch::new();
    BatchBuilder::new(&mut batch)
        .append_rect(plain_rect(0, 0, 4, 4, 0))
        .unwrap();

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    assert!(!render(&mut target, &batch));
}

#[test]
fn an_out_of_range_color_index_culls_only_that_command() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(9, 9, 9, 255)]);
    let mut builder = BatchBuilder::new(&mut batch);
    builder.append_rect(plain_rect(0, 0, 4, 4, 0)).unwrap();
    // index 5 is out of range for a 1-color palette; the command should
    // just be culled rather than panicking or poisoning the whole render
    builder.append_rect(plain_rect(4, 4, 8, 8, 5)).unwrap();

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(1, 1), [9, 9, 9, 255]);
    assert_eq!(target.pixel(5, 5), [0, 0, 0, 0]);
}

#[test]
fn growing_the_palette_with_set_raises_its_size() {
    let mut batch = RenderBatch::new();
    batch.palette.set(3, Color::rgba(1, 2, 3, 255));
    batch.palette.set_enabled(true);
    assert_eq!(batch.palette.size(), 4);
    BatchBuilder::new(&mut batch)
        .append_rect(plain_rect(0, 0, 4, 4, 3))
        .unwrap();

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(1, 1), [1, 2, 3, 255]);
}
