//! Error types for parsing, glyph resolution and composition.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::GlyphKey;

/// Errors raised while loading a font store.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font store at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open glyph archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to read archive entry '{name}': {source}")]
    Entry {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid SVG in '{name}': {source}")]
    Xml {
        name: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("invalid JSON glyph store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid glyph '{name}': {reason}")]
    InvalidGlyph { name: String, reason: String },

    #[error("unsupported font store format: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors raised while loading render options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read options at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the render pipeline.
///
/// Every stage fails fast and forwards the first error unchanged.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("malformed notation at offset {offset}: {reason} (near '{fragment}')")]
    MalformedNotation {
        offset: usize,
        fragment: String,
        reason: &'static str,
    },

    #[error("invalid glyph key '{key}' at offset {offset}")]
    InvalidGlyphKey { offset: usize, key: String },

    #[error("invalid coordinate '{field}' at offset {offset}")]
    InvalidCoordinate { offset: usize, field: String },

    #[error("unknown variant '{code}' in symbol '{key}' at offset {offset}")]
    UnknownVariant {
        offset: usize,
        key: String,
        code: char,
    },

    #[error("glyph {key} not found in font store")]
    GlyphNotFound { key: GlyphKey },

    #[error("symbol '{symbol}' at offset {offset} exceeds the {width}x{height} canvas")]
    OutOfBounds {
        offset: usize,
        symbol: String,
        width: f64,
        height: f64,
    },

    #[error(transparent)]
    Font(#[from] FontError),
}

/// Coarse failure classes, as reported on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedNotation,
    InvalidGlyphKey,
    InvalidCoordinate,
    UnknownVariant,
    GlyphNotFound,
    OutOfBounds,
    FontStore,
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RenderError::MalformedNotation { .. } => ErrorKind::MalformedNotation,
            RenderError::InvalidGlyphKey { .. } => ErrorKind::InvalidGlyphKey,
            RenderError::InvalidCoordinate { .. } => ErrorKind::InvalidCoordinate,
            RenderError::UnknownVariant { .. } => ErrorKind::UnknownVariant,
            RenderError::GlyphNotFound { .. } => ErrorKind::GlyphNotFound,
            RenderError::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            RenderError::Font(_) => ErrorKind::FontStore,
        }
    }

    /// Byte offset in the notation string the error points at, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            RenderError::MalformedNotation { offset, .. }
            | RenderError::InvalidGlyphKey { offset, .. }
            | RenderError::InvalidCoordinate { offset, .. }
            | RenderError::UnknownVariant { offset, .. }
            | RenderError::OutOfBounds { offset, .. } => Some(*offset),
            RenderError::GlyphNotFound { .. } | RenderError::Font(_) => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedNotation => "MalformedNotation",
            ErrorKind::InvalidGlyphKey => "InvalidGlyphKey",
            ErrorKind::InvalidCoordinate => "InvalidCoordinate",
            ErrorKind::UnknownVariant => "UnknownVariant",
            ErrorKind::GlyphNotFound => "GlyphNotFound",
            ErrorKind::OutOfBounds => "OutOfBounds",
            ErrorKind::FontStore => "FontStore",
        };
        f.write_str(name)
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
