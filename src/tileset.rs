use image::DynamicImage;

use crate::properties::Properties;

/// The `<tileset>` fields that live in the map document only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSetRef {
    pub first_gid: u32,
    /// Path of the external `.tsx`, relative to the map. Empty when embedded.
    pub source: String,
}

/// The `<tileset>` fields an external `.tsx` document provides.
#[derive(Debug, Clone, Default)]
pub struct TilesetBody {
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub properties: Properties,
    /// Absent for image-collection tilesets.
    pub image: Option<Image>,
    /// Per-tile overrides.
    pub tiles: Vec<Tile>,
}

/// A tileset as held by [`crate::Map`].
#[derive(Debug, Clone, Default)]
pub struct TileSet {
    pub first_gid: u32,
    pub source: String,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub spacing: u32,
    pub margin: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub properties: Properties,
    pub image: Option<Image>,
    pub tiles: Vec<Tile>,
}

impl TileSet {
    /// Combine map-local reference fields with a tileset body.
    ///
    /// `first_gid` and `source` always come from `reference`; everything else
    /// comes from `body`, replacing whatever the tileset held before.
    pub fn merge(reference: TileSetRef, body: TilesetBody) -> Self {
        TileSet {
            first_gid: reference.first_gid,
            source: reference.source,
            name: body.name,
            tile_width: body.tile_width,
            tile_height: body.tile_height,
            spacing: body.spacing,
            margin: body.margin,
            tile_count: body.tile_count,
            columns: body.columns,
            properties: body.properties,
            image: body.image,
            tiles: body.tiles,
        }
    }

    /// Split back into the two records [`TileSet::merge`] takes.
    pub fn into_parts(self) -> (TileSetRef, TilesetBody) {
        (
            TileSetRef {
                first_gid: self.first_gid,
                source: self.source,
            },
            TilesetBody {
                name: self.name,
                tile_width: self.tile_width,
                tile_height: self.tile_height,
                spacing: self.spacing,
                margin: self.margin,
                tile_count: self.tile_count,
                columns: self.columns,
                properties: self.properties,
                image: self.image,
                tiles: self.tiles,
            },
        )
    }

    pub fn is_external(&self) -> bool {
        !self.source.is_empty()
    }

    /// Per-tile override for a local tile id.
    pub fn tile(&self, id: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    /// Pixel rectangle `(x, y, w, h)` of a local tile id in the atlas image.
    pub fn tile_rect(&self, id: u32) -> Option<(u32, u32, u32, u32)> {
        if self.columns == 0 {
            return None;
        }
        let col = id % self.columns;
        let row = id / self.columns;
        let sx = self.margin + col * (self.tile_width + self.spacing);
        let sy = self.margin + row * (self.tile_height + self.spacing);
        Some((sx, sy, self.tile_width, self.tile_height))
    }
}

/// `<tile>` override inside a tileset.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub id: u32,
    pub image: Option<Image>,
    pub properties: Properties,
}

/// `<image>` reference. Pixels stay `None` until the image is resolved.
#[derive(Debug, Clone, Default)]
pub struct Image {
    pub source: String,
    pub trans: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pixels: Option<DynamicImage>,
}

impl Image {
    pub fn is_loaded(&self) -> bool {
        self.pixels.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_reference_fields_and_replaces_body() {
        let reference = TileSetRef {
            first_gid: 42,
            source: "terrain.tsx".into(),
        };
        let body = TilesetBody {
            name: "terrain".into(),
            tile_width: 16,
            tile_height: 8,
            tile_count: 48,
            columns: 8,
            ..Default::default()
        };

        let ts = TileSet::merge(reference, body);
        assert_eq!(ts.first_gid, 42);
        assert_eq!(ts.source, "terrain.tsx");
        assert_eq!(ts.name, "terrain");
        assert_eq!(ts.tile_count, 48);
        assert!(ts.is_external());

        // merging again over a populated tileset drops the old body entirely
        let (reference, _) = ts.into_parts();
        let ts = TileSet::merge(reference, TilesetBody::default());
        assert_eq!(ts.first_gid, 42);
        assert!(ts.name.is_empty());
        assert_eq!(ts.tile_count, 0);
    }

    #[test]
    fn tile_rect_accounts_for_margin_and_spacing() {
        let ts = TileSet {
            tile_width: 16,
            tile_height: 16,
            spacing: 2,
            margin: 1,
            columns: 4,
            ..Default::default()
        };
        assert_eq!(ts.tile_rect(0), Some((1, 1, 16, 16)));
        assert_eq!(ts.tile_rect(5), Some((19, 19, 16, 16)));
        assert_eq!(TileSet::default().tile_rect(0), None);
    }
}
