//! The top-level command list: a tag plus a dense index into the store of
//! that kind.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Clear = 0,
    ClearPattern = 1,
    Rect = 2,
    Circle = 3,
    Pixel = 4,
    PixelA = 5,
    Line = 6,
    Image = 7,
    Text = 8,
    DebugTiles = 9,
}

impl CommandType {
    pub const COUNT: usize = 10;

    pub const fn as_usize(self) -> usize {
        self as u8 as usize
    }

    /// Whether this kind participates in command analysis / tile binning.
    /// Clear, ClearPattern, and DebugTiles are resolved globally instead.
    pub const fn is_bindable(self) -> bool {
        !matches!(
            self,
            CommandType::Clear | CommandType::ClearPattern | CommandType::DebugTiles
        )
    }
}

/// `(type, index)`: `index` is a dense index into the column store for
/// `type`. Position within `RenderBatch::commands` is the sole source of
/// depth order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderCommand {
    pub kind: CommandType,
    pub index: u32,
}

impl RenderCommand {
    pub const fn new(kind: CommandType, index: u32) -> Self {
        Self { kind, index }
    }
}
