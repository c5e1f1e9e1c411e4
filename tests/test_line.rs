//! End-to-end coverage of anti-aliased line rendering.

use raster2d::builder::{AppendLine, BatchBuilder};
use raster2d::color::Color;
use raster2d::geometry::f32_to_uq8_8;
use raster2d::target::RenderTarget;
use raster2d::{render, RenderBatch};

#[test]
fn horizontal_line_covers_its_own_width_band() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(0, 0, 255, 255)]);
    BatchBuilder::new(&mut batch)
        .append_line(AppendLine {
            x0: 2,
            y0: 8,
            x1: 14,
            y1: 8,
            width_q8_8: f32_to_uq8_8(4.0),
            color_index: 0,
            opacity: 255,
        })
        .unwrap();

    let mut buf = vec![0u8; 16 * 16 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 16, 16 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(8, 8), [0, 0, 255, 255]);
    assert_eq!(target.pixel(8, 0), [0, 0, 0, 0]);
    assert_eq!(target.pixel(8, 15), [0, 0, 0, 0]);
}

#[test]
fn zero_opacity_line_touches_nothing() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(255, 255, 255, 255)]);
    BatchBuilder::new(&mut batch)
        .append_line(AppendLine {
            x0: 0,
            y0: 0,
            x1: 15,
            y1: 15,
            width_q8_8: f32_to_uq8_8(2.0),
            color_index: 0,
            opacity: 0,
        })
        .unwrap();

    let mut buf = vec![0u8; 16 * 16 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 16, 16 * 4);
    assert!(render(&mut target, &batch));
    for y in 0..16 {
        for x in 0..16 {
            assert_eq!(target.pixel(x, y), [0, 0, 0, 0]);
        }
    }
}

#[test]
fn zero_width_line_is_rejected_at_build_time() {
    let mut batch = RenderBatch::new();
    let err = BatchBuilder::new(&mut batch)
        .append_line(AppendLine {
            x0: 0,
            y0: 0,
            x1: 10,
            y1: 10,
            width_q8_8: 0,
            color_index: 0,
            opacity: 255,
        })
        .unwrap_err();
    assert_eq!(err, raster2d::BuildError::DegeneratePrimitive);
}
