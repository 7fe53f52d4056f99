use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{MapError, ReferenceError};
use crate::loader::tmx_loader::parse_tileset_document;
use crate::options::LoadOptions;
use crate::tileset::{Image, TileSet};

/// Resolve external references of every tileset, in order.
///
/// For each tileset the external document is merged first, so the image
/// paths it brings are the ones that get decoded. The first failure aborts.
pub fn resolve_tilesets(
    tilesets: &mut [TileSet],
    base_dir: &Path,
    options: &LoadOptions,
) -> Result<(), MapError> {
    for ts in tilesets.iter_mut() {
        if options.resolve_tilesets && ts.is_external() {
            resolve_external_tileset(ts, base_dir)?;
        }
        if options.resolve_images {
            resolve_tileset_images(ts, base_dir)?;
        }
    }
    Ok(())
}

/// Replace the tileset body with the content of `base_dir/source`.
pub fn resolve_external_tileset(ts: &mut TileSet, base_dir: &Path) -> Result<(), MapError> {
    let path = base_dir.join(&ts.source);
    debug!("loading external tileset {}", path.display());

    let body = fs::read_to_string(&path)
        .map_err(ReferenceError::from)
        .and_then(|xml| parse_tileset_document(&xml).map_err(ReferenceError::from))
        .map_err(|source| MapError::Reference { path, source })?;

    let (reference, _) = std::mem::take(ts).into_parts();
    *ts = TileSet::merge(reference, body);
    Ok(())
}

/// Decode the tileset image and every per-tile image that has a source.
pub fn resolve_tileset_images(ts: &mut TileSet, base_dir: &Path) -> Result<(), MapError> {
    if let Some(image) = ts.image.as_mut() {
        load_image(image, base_dir)?;
    }
    for image in ts.tiles.iter_mut().filter_map(|t| t.image.as_mut()) {
        load_image(image, base_dir)?;
    }
    Ok(())
}

/// Decode `base_dir/source` into the image's pixel payload.
///
/// The format is sniffed from the file content, not the extension. An image
/// without a source is left untouched.
pub fn load_image(image: &mut Image, base_dir: &Path) -> Result<(), MapError> {
    if image.source.is_empty() {
        return Ok(());
    }
    let path = base_dir.join(&image.source);
    debug!("decoding image {}", path.display());

    let pixels = fs::read(&path)
        .map_err(ReferenceError::from)
        .and_then(|bytes| image::load_from_memory(&bytes).map_err(ReferenceError::from))
        .map_err(|source| MapError::Reference { path, source })?;

    image.pixels = Some(pixels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tileset::{TileSetRef, TilesetBody};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tmx_resolve_{tag}_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn write_png(path: &Path) {
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(path)
            .expect("failed to write png");
    }

    fn external(first_gid: u32, source: &str) -> TileSet {
        TileSet::merge(
            TileSetRef {
                first_gid,
                source: source.into(),
            },
            TilesetBody::default(),
        )
    }

    const COLLECTION_TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="props" tilewidth="4" tileheight="4" tilecount="48" columns="0">
  <tile id="0"><image source="a.png" width="4" height="4"/></tile>
  <tile id="1"><image source="b.png" width="4" height="4"/></tile>
  <tile id="2"><image source="c.png" width="4" height="4"/></tile>
</tileset>"#;

    #[test]
    fn image_collection_tileset_decodes_per_tile_images() {
        let dir = temp_dir("collection");
        fs::write(dir.join("props.tsx"), COLLECTION_TSX).expect("write tsx");
        for name in ["a.png", "b.png", "c.png"] {
            write_png(&dir.join(name));
        }

        let mut tilesets = vec![external(7, "props.tsx")];
        resolve_tilesets(&mut tilesets, &dir, &LoadOptions::default()).expect("resolve");

        let ts = &tilesets[0];
        assert_eq!(ts.first_gid, 7);
        assert_eq!(ts.source, "props.tsx");
        assert_eq!(ts.name, "props");
        assert_eq!(ts.tile_count, 48);
        assert!(ts.image.as_ref().map_or(true, |i| !i.is_loaded()));
        assert_eq!(ts.tiles.len(), 3);
        for tile in &ts.tiles {
            let image = tile.image.as_ref().expect("tile image");
            let pixels = image.pixels.as_ref().expect("decoded pixels");
            assert_eq!((pixels.width(), pixels.height()), (4, 4));
        }
    }

    #[test]
    fn image_format_is_sniffed_from_content() {
        let dir = temp_dir("sniff");
        write_png(&dir.join("real.png"));
        fs::copy(dir.join("real.png"), dir.join("misnamed.jpg")).expect("copy");

        let mut image = Image {
            source: "misnamed.jpg".into(),
            ..Default::default()
        };
        load_image(&mut image, &dir).expect("decode");
        assert!(image.is_loaded());
    }

    #[test]
    fn structural_options_leave_references_alone() {
        let dir = temp_dir("structural");
        fs::write(dir.join("props.tsx"), COLLECTION_TSX).expect("write tsx");

        let mut tilesets = vec![external(1, "props.tsx")];
        resolve_tilesets(&mut tilesets, &dir, &LoadOptions::structural()).expect("resolve");
        assert!(tilesets[0].name.is_empty());
        assert!(tilesets[0].tiles.is_empty());

        // merged but no pixels: the png files do not even exist
        let options = LoadOptions {
            resolve_tilesets: true,
            resolve_images: false,
        };
        resolve_tilesets(&mut tilesets, &dir, &options).expect("resolve");
        assert_eq!(tilesets[0].tiles.len(), 3);
        assert!(tilesets[0]
            .tiles
            .iter()
            .all(|t| !t.image.as_ref().expect("tile image").is_loaded()));
    }

    #[test]
    fn missing_tileset_file_is_a_reference_error() {
        let dir = temp_dir("missing");
        let mut tilesets = vec![external(1, "nope.tsx")];
        let err = resolve_tilesets(&mut tilesets, &dir, &LoadOptions::default()).unwrap_err();
        match err {
            MapError::Reference { path, source: ReferenceError::Io(_) } => {
                assert_eq!(path, dir.join("nope.tsx"));
            }
            other => panic!("expected Reference/Io, got {other:?}"),
        }
    }

    #[test]
    fn malformed_tileset_file_is_a_reference_error() {
        let dir = temp_dir("malformed");
        fs::write(dir.join("bad.tsx"), "<tileset><oops></tileset>").expect("write tsx");
        let mut tilesets = vec![external(1, "bad.tsx")];
        let err = resolve_tilesets(&mut tilesets, &dir, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            MapError::Reference { source: ReferenceError::Document(_), .. }
        ));
    }

    #[test]
    fn undecodable_image_is_a_reference_error() {
        let dir = temp_dir("badimage");
        fs::write(dir.join("tiles.png"), b"definitely not an image").expect("write");
        let mut image = Image {
            source: "tiles.png".into(),
            ..Default::default()
        };
        let err = load_image(&mut image, &dir).unwrap_err();
        assert!(matches!(
            err,
            MapError::Reference { source: ReferenceError::Image(_), .. }
        ));
        assert!(!image.is_loaded());
    }
}
