use macroquad::prelude::*;

use crate::gid::{Gid, TileInfo};
use crate::properties::Properties;

/// Raw `<data>` payload of a tile layer, as found in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerData {
    /// `encoding` attribute; empty means explicit `<tile>` records.
    pub encoding: String,
    /// `compression` attribute; empty means none.
    pub compression: String,
    /// Concatenated text content of `<data>`.
    pub raw: String,
    /// `gid` of each `<tile>` child, in document order.
    pub tiles: Vec<Gid>,
}

/// A `<layer>` (tile layer).
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub opacity: f32,
    pub visible: bool,
    pub offset: Vec2,
    pub properties: Properties,
    pub data: LayerData,
    /// Row-major, `width * height` long once the map is decoded.
    pub tiles: Vec<TileInfo>,
}

impl Default for Layer {
    fn default() -> Self {
        Layer {
            id: 0,
            name: String::new(),
            width: 0,
            height: 0,
            opacity: 1.0,
            visible: true,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            data: LayerData::default(),
            tiles: Vec::new(),
        }
    }
}

impl Layer {
    /// Number of cells in the layer grid.
    pub fn cell_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&TileInfo> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get(y as usize * self.width as usize + x as usize)
    }

    /// Non-empty cells as `(x, y, tile)`.
    pub fn occupied(&self) -> impl Iterator<Item = (u32, u32, &TileInfo)> + '_ {
        let width = self.width.max(1);
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_nil())
            .map(move |(idx, t)| (idx as u32 % width, idx as u32 / width, t))
    }
}
