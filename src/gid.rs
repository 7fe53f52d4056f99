use crate::error::MapError;
use crate::tileset::TileSet;

pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits

/// Raw global tile ID as stored in layer data, flip flags included.
///
/// Kept packed until resolution so every decoder hands the same type to
/// [`resolve_gid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Gid(pub u32);

impl Gid {
    /// The empty cell.
    pub const EMPTY: Gid = Gid(0);

    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    #[inline] pub fn is_empty(self) -> bool { self.0 == 0 }
}

impl From<u32> for Gid {
    fn from(raw: u32) -> Self {
        Gid(raw)
    }
}

/// A resolved [`Gid`]: owning tileset, local tile id and flip flags.
///
/// The tileset is referenced by its index in [`crate::Map::tilesets`]; use
/// [`crate::Map::tileset_of`] to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileInfo {
    tileset: usize,
    id: u32,
    flip_h: bool,
    flip_v: bool,
    flip_d: bool,
    nil: bool,
}

/// The one "no tile" value. Every empty cell of every layer is a copy of it.
pub static NIL_TILE: TileInfo = TileInfo {
    tileset: 0,
    id: 0,
    flip_h: false,
    flip_v: false,
    flip_d: false,
    nil: true,
};

impl TileInfo {
    /// Shared sentinel for empty cells.
    #[inline]
    pub fn nil() -> &'static TileInfo {
        &NIL_TILE
    }

    /// Index of the owning tileset, `None` for the nil tile.
    pub fn tileset_index(&self) -> Option<usize> {
        (!self.nil).then_some(self.tileset)
    }

    /// Zero-based tile id inside the owning tileset.
    pub fn id(&self) -> u32 { self.id }
    pub fn horizontal_flip(&self) -> bool { self.flip_h }
    pub fn vertical_flip(&self) -> bool { self.flip_v }
    pub fn diagonal_flip(&self) -> bool { self.flip_d }
    pub fn is_nil(&self) -> bool { self.nil }
}

/// Resolve one raw GID against the map's tilesets.
///
/// `tilesets` must be sorted by ascending `first_gid`; the scan walks
/// backwards and returns the tightest tileset whose `first_gid` does not
/// exceed the clear id. Flip bits are masked off before the comparison and
/// copied into the result untouched.
pub fn resolve_gid(tilesets: &[TileSet], gid: Gid) -> Result<TileInfo, MapError> {
    if gid.is_empty() {
        return Ok(NIL_TILE);
    }

    let clean = gid.clean();
    // n is tiny in practice; a binary search would hide an unsorted input
    let (index, ts) = tilesets
        .iter()
        .enumerate()
        .rev()
        .find(|(_, ts)| ts.first_gid <= clean)
        .ok_or(MapError::InvalidGid { gid: gid.raw() })?;

    Ok(TileInfo {
        tileset: index,
        id: clean - ts.first_gid,
        flip_h: gid.flip_h(),
        flip_v: gid.flip_v(),
        flip_d: gid.flip_d(),
        nil: false,
    })
}
