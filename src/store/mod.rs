//! Parallel columnar ("struct of arrays") stores, one per primitive kind.
//! Each store is a plain collection of `Vec<T>` columns exposing only
//! `len()`/`is_empty()`/`clear()` as cross-column invariants; the
//! strict-validation pass (see `optimizer::validation`) is what enforces
//! that every column of a store stays the same length.

pub mod circle;
pub mod clear;
pub mod command;
pub mod debug_tiles;
pub mod image;
pub mod line;
pub mod pixel;
pub mod rect;
pub mod text;

pub use circle::CircleStore;
pub use clear::{ClearPatternStore, ClearStore};
pub use command::{CommandType, RenderCommand};
pub use debug_tiles::DebugTilesStore;
pub use image::{ImageAssetStore, ImageDrawStore};
pub use line::LineStore;
pub use pixel::{PixelAStore, PixelStore};
pub use rect::RectStore;
pub use text::{GlyphAtlas, GlyphBitmap, GlyphFormat, GlyphStore, TextRunStore, TextStore};
