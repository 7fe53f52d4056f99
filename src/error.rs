use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for the TMX decoder.
#[derive(Debug, Error)]
pub enum MapError {
    /// The map file itself could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path of the map file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The map document is not a well-formed TMX document.
    #[error("malformed map document: {0}")]
    Document(#[from] DocumentError),

    /// A layer declares an `encoding` we do not understand.
    #[error("layer '{layer}': unsupported encoding '{encoding}'")]
    UnsupportedEncoding {
        /// Layer name.
        layer: String,
        /// Offending `encoding` attribute.
        encoding: String,
    },

    /// A base64 layer declares a `compression` we do not understand.
    #[error("layer '{layer}': unsupported compression '{compression}'")]
    UnsupportedCompression {
        /// Layer name.
        layer: String,
        /// Offending `compression` attribute.
        compression: String,
    },

    /// The payload of a recognised encoding could not be decoded.
    #[error("layer '{layer}': {source}")]
    Payload {
        /// Layer name.
        layer: String,
        /// What went wrong.
        #[source]
        source: PayloadError,
    },

    /// A clear tile id is not owned by any tileset.
    #[error("invalid tile GID: {gid}")]
    InvalidGid {
        /// Raw value as found in the layer data, flip flags included.
        gid: u32,
    },

    /// An external tileset or image could not be loaded.
    #[error("failed to resolve {path}: {source}")]
    Reference {
        /// Path that was being resolved.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: ReferenceError,
    },
}

/// Structural problems in a TMX or TSX document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// XML syntax error.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document has the wrong root element.
    #[error("expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        /// Tag the parser wanted.
        expected: &'static str,
        /// Tag it got.
        found: String,
    },

    /// A required attribute is absent.
    #[error("<{tag}> is missing required attribute '{attr}'")]
    MissingAttribute {
        /// Element name.
        tag: String,
        /// Attribute name.
        attr: &'static str,
    },

    /// An attribute value could not be parsed.
    #[error("<{tag}> attribute '{attr}' has invalid value '{value}'")]
    InvalidAttribute {
        /// Element name.
        tag: String,
        /// Attribute name.
        attr: String,
        /// Raw value.
        value: String,
    },
}

/// Decoding failures for an otherwise recognised layer encoding.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Base64 text is invalid.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The gzip/zlib stream is corrupt.
    #[error("decompression error: {0}")]
    Decompress(#[source] io::Error),

    /// A CSV token does not fit a 32-bit integer once sanitized.
    #[error("invalid CSV token '{token}': {source}")]
    InvalidCsvToken {
        /// The token after sanitizing.
        token: String,
        /// Integer parse error.
        #[source]
        source: ParseIntError,
    },

    /// The payload holds a different number of tiles than the layer grid.
    #[error("expected {expected} tiles, found {found}")]
    TileCount {
        /// `width * height`.
        expected: usize,
        /// Tiles present in the payload.
        found: usize,
    },

    /// The declared grid is too large to hold in memory.
    #[error("layer grid {width}x{height} is too large")]
    GridTooLarge {
        /// Declared layer width.
        width: u32,
        /// Declared layer height.
        height: u32,
    },
}

/// Why an external reference failed to load.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// File could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// External tileset document is malformed.
    #[error("malformed tileset document: {0}")]
    Document(#[from] DocumentError),

    /// Image bytes could not be decoded.
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
}
