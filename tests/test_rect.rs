//! End-to-end coverage of rect rendering: solid fill, rounded corners,
//! rotation, gradients, and clipping.

use raster2d::builder::{AppendRect, BatchBuilder, GradientSpec};
use raster2d::color::Color;
use raster2d::geometry::f32_to_q8_8;
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
fn opaque_rect_covers_its_interior_and_leaves_outside_untouched() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(10, 20, 30, 255)]);
    BatchBuilder::new(&mut batch)
        .append_rect(plain_rect(2, 2, 10, 10, 0))
        .unwrap();

    let mut buf = vec![0u8; 16 * 16 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 16, 16 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(5, 5), [10, 20, 30, 255]);
    assert_eq!(target.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(target.pixel(12, 12), [0, 0, 0, 0]);
}

#[test]
fn rounded_rect_corner_is_not_fully_covered() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(255, 255, 255, 255)]);
    let mut rect = plain_rect(0, 0, 20, 20, 0);
    rect.radius_q8_8 = f32_to_q8_8(8.0) as u16;
    BatchBuilder::new(&mut batch).append_rect(rect).unwrap();

    let mut buf = vec![0u8; 20 * 20 * 4];
    let mut target = RenderTarget::new(&mut buf, 20, 20, 20 * 4);
    assert!(render(&mut target, &batch));
    // dead center stays fully covered
    assert_eq!(target.pixel(10, 10), [255, 255, 255, 255]);
    // the extreme corner, outside the rounded radius, is untouched
    assert_eq!(target.pixel(0, 0), [0, 0, 0, 0]);
}

#[test]
fn clip_rect_confines_the_fill() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(200, 0, 0, 255)]);
    let mut rect = plain_rect(0, 0, 16, 16, 0);
    rect.clip = Some((0, 0, 8, 16));
    BatchBuilder::new(&mut batch).append_rect(rect).unwrap();

    let mut buf = vec![0u8; 16 * 16 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 16, 16 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(2, 2), [200, 0, 0, 255]);
    assert_eq!(target.pixel(12, 2), [0, 0, 0, 0]);
}

#[test]
fn gradient_rect_interpolates_between_its_two_colors() {
    let mut batch = RenderBatch::new();
    batch
        .palette
        .set_colors(&[Color::rgba(0, 0, 0, 255), Color::rgba(255, 255, 255, 255)]);
    let mut rect = plain_rect(0, 0, 16, 1, 0);
    rect.gradient = Some(GradientSpec {
        color1_index: 1,
        dir_x_q8_8: f32_to_q8_8(1.0),
        dir_y_q8_8: 0,
    });
    BatchBuilder::new(&mut batch).append_rect(rect).unwrap();

    let mut buf = vec![0u8; 16 * 1 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 1, 16 * 4);
    assert!(render(&mut target, &batch));
    let left = target.pixel(0, 0);
    let right = target.pixel(15, 0);
    assert!(left[0] < right[0], "left {left:?} should be darker than right {right:?}");
}

#[test]
fn rotated_rect_touches_pixels_outside_its_unrotated_bbox_corner() {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(1, 2, 3, 255)]);
    let mut rect = plain_rect(8, 8, 16, 16, 0);
    rect.rotation_q8_8 = f32_to_q8_8(std::f32::consts::FRAC_PI_4) as i16;
    BatchBuilder::new(&mut batch).append_rect(rect).unwrap();

    let mut buf = vec![0u8; 24 * 24 * 4];
    let mut target = RenderTarget::new(&mut buf, 24, 24, 24 * 4);
    assert!(render(&mut target, &batch));
    // the rect's own center is always covered, rotation or not
    assert_eq!(target.pixel(12, 12), [1, 2, 3, 255]);
}

#[test]
fn degenerate_rect_is_rejected_at_build_time() {
    let mut batch = RenderBatch::new();
    let err = BatchBuilder::new(&mut batch)
        .append_rect(plain_rect(5, 5, 5, 10, 0))
        .unwrap_err();
    assert_eq!(err, raster2d::BuildError::DegeneratePrimitive);
}
