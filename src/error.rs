//! Error taxonomy: build-time rejection from the batch builder, and the
//! structured issue codes emitted by strict validation.

use thiserror::Error;

/// Build-time rejection returned by [`crate::builder::BatchBuilder`] append
/// calls. No column is left partially populated when this is returned — the
/// builder validates before it pushes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("coordinate outside the representable i16 range")]
    CoordinateOverflow,
    #[error("primitive has zero or negative area")]
    DegeneratePrimitive,
    #[error("image has a zero width, zero height, or pixel buffer too small for its stride")]
    InvalidImageDimensions,
    #[error("image index does not refer to a previously built image asset")]
    MissingImageAsset,
    #[error("pixel buffer length does not match width * height * bytes-per-pixel")]
    PixelCountMismatch,
}

/// One check performed by [`crate::optimizer::validation`]'s strict
/// validation pass. Replaces the single catch-all code the design notes
/// call out as worth splitting up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssueCode {
    /// Two parallel columns of the same store disagree in length.
    StoreLengthMismatch,
    /// A command's `index` does not fit inside its store.
    IndexOutOfRange,
    /// A tile stream's `offsets` array has the wrong length or its last
    /// entry does not equal the command count.
    TileStreamOffsetMismatch,
    /// A tile-local command's store index does not fit inside its store.
    TileCommandIndexOutOfRange,
    /// A tile stream was supplied with `tileSize > 256`.
    TileSizeTooLarge,
    /// `colorIndex` (or another palette index) is `>= palette.size`.
    PaletteIndexOutOfRange,
}

/// One validation finding, with enough detail to locate the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderValidationIssue {
    pub code: ValidationIssueCode,
    pub detail: String,
}

impl RenderValidationIssue {
    pub fn new(code: ValidationIssueCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

/// Accumulates the issues found by a strict-validation pass. Callers supply
/// `Some(&mut RenderValidationReport)` when they want diagnostics; passing
/// `None` costs nothing beyond the branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderValidationReport {
    pub issues: Vec<RenderValidationIssue>,
}

impl RenderValidationReport {
    pub fn push(&mut self, code: ValidationIssueCode, detail: impl Into<String>) {
        self.issues.push(RenderValidationIssue::new(code, detail));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }
}
