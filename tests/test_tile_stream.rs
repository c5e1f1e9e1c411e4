//! End-to-end coverage of caller-supplied tile streams: a pre-merged stream
//! is used verbatim, while a multi-level (global/macro/tile) stream is
//! premerged by the optimizer before rendering.

use raster2d::builder::{AppendRect, BatchBuilder};
use raster2d::color::Color;
use raster2d::geometry::IntRect;
use raster2d::optimizer::{optimize_batch, OptimizedBatch};
use raster2d::store::command::CommandType;
use raster2d::target::RenderTarget;
use raster2d::tile_stream::{GlobalCommand, TileStream};
use raster2d::{render, RenderBatch};

fn rect_batch(x0: i32, y0: i32, x1: i32, y1: i32) -> RenderBatch {
    let mut batch = RenderBatch::new();
    batch.palette.set_colors(&[Color::rgba(5, 6, 7, 255)]);
    BatchBuilder::new(&mut batch)
        .append_rect(AppendRect {
            x0,
            y0,
            x1,
            y1,
            color_index: 0,
            radius_q8_8: 0,
            rotation_q8_8: 0,
            z_q8_8: 0,
            opacity: 255,
            smooth_blend: false,
            clip: None,
            gradient: None,
        })
        .unwrap();
    batch
}

#[test]
fn global_tile_stream_is_premerged_and_still_renders_correctly() {
    let mut batch = rect_batch(0, 0, 8, 8);
    batch.config.auto_tile_stream = false;
    let store_index = 0;
    let mut stream = TileStream {
        tile_size: 8,
        enabled: true,
        pre_merged: false,
        ..Default::default()
    };
    stream.global_commands.push(GlobalCommand {
        kind: CommandType::Rect,
        store_index,
        order: 0,
        bounds: IntRect::new(0, 0, 8, 8),
        clip: None,
    });
    batch.tile_stream = Some(stream);

    let mut buf = vec![0u8; 16 * 16 * 4];
    let mut target = RenderTarget::new(&mut buf, 16, 16, 16 * 4);
    assert!(render(&mut target, &batch));
    assert_eq!(target.pixel(4, 4), [5, 6, 7, 255]);
    assert_eq!(target.pixel(12, 12), [0, 0, 0, 0]);
}

#[test]
fn a_caller_supplied_pre_merged_stream_is_used_verbatim() {
    let mut batch = rect_batch(0, 0, 4, 4);
    batch.config.auto_tile_stream = false;
    let stream = TileStream {
        tile_size: 4,
        enabled: true,
        pre_merged: true,
        offsets: vec![0, 1],
        commands: vec![raster2d::tile_stream::TileCommand {
            kind: CommandType::Rect,
            store_index: 0,
            order: 0,
            x: 0,
            y: 0,
            w_minus1: 3,
            h_minus1: 3,
        }],
        macro_offsets: Vec::new(),
        macro_commands: Vec::new(),
        global_commands: Vec::new(),
    };
    batch.tile_stream = Some(stream);

    let mut buf = vec![0u8; 4 * 4 * 4];
    let target = RenderTarget::new(&mut buf, 4, 4, 4 * 4);
    let mut optimized = OptimizedBatch::new();
    assert!(optimize_batch(&target, &batch, &mut optimized));
    let used = optimized.tile_stream.as_ref().unwrap();
    assert_eq!(used.tile_size, 4);
    assert_eq!(used.commands.len(), 1);
}

#[test]
fn premerge_drops_commands_that_fall_outside_every_tile() {
    let mut batch = rect_batch(0, 0, 4, 4);
    batch.config.auto_tile_stream = false;
    let mut stream = TileStream {
        tile_size: 8,
        enabled: true,
        pre_merged: false,
        ..Default::default()
    };
    stream.global_commands.push(GlobalCommand {
        kind: CommandType::Rect,
        store_index: 0,
        order: 0,
        bounds: IntRect::new(1000, 1000, 1004, 1004),
        clip: None,
    });
    batch.tile_stream = Some(stream);

    let mut buf = vec![0u8; 8 * 8 * 4];
    let mut target = RenderTarget::new(&mut buf, 8, 8, 8 * 4);
    // nothing lands on any tile, so this reduces to an empty batch
    assert!(!render(&mut target, &batch));
}
