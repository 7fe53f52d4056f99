#![warn(missing_docs)]

//! Tiled TMX map decoder for Macroquad.
//!
//! Decodes layer data (plain, CSV, base64 with optional gzip/zlib), resolves
//! global tile IDs into tileset-local tiles with flip flags, and follows
//! external tileset and image references.

mod error;
#[allow(missing_docs)]
mod gid;
#[allow(missing_docs)]
mod layer;
mod loader {
    pub mod layer_data;
    pub mod resolve;
    pub mod tmx_loader;
}
#[allow(missing_docs)]
mod map;
#[allow(missing_docs)]
mod object;
mod options;
#[allow(missing_docs)]
mod properties;
#[allow(missing_docs)]
mod tileset;

pub use error::{DocumentError, MapError, PayloadError, ReferenceError};
pub use gid::{resolve_gid, Gid, TileInfo, FLIP_D, FLIP_H, FLIP_V, GID_MASK, NIL_TILE};
pub use layer::{Layer, LayerData};
pub use loader::layer_data::decode_layer_data;
pub use loader::resolve::{load_image, resolve_external_tileset, resolve_tilesets};
pub use loader::tmx_loader::{parse_map_document, parse_tileset_document};
pub use map::Map;
pub use object::{Object, ObjectGroup, ObjectShape};
pub use options::LoadOptions;
pub use properties::{Properties, PropertyValue};
pub use tileset::{Image, Tile, TileSet, TileSetRef, TilesetBody};
