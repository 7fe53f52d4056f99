use std::io::Read;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, ZlibDecoder};
use log::warn;

use crate::error::{MapError, PayloadError};
use crate::gid::Gid;
use crate::layer::LayerData;

/// Decode a layer's `<data>` into `width * height` raw GIDs, row-major.
pub fn decode_layer_data(
    layer: &str,
    width: u32,
    height: u32,
    data: &LayerData,
) -> Result<Vec<Gid>, MapError> {
    let payload_err = |source: PayloadError| MapError::Payload {
        layer: layer.to_owned(),
        source,
    };
    let cells = (width as usize)
        .checked_mul(height as usize)
        .ok_or(PayloadError::GridTooLarge { width, height })
        .map_err(payload_err)?;

    let gids = match data.encoding.as_str() {
        "" => return decode_tile_records(layer, cells, &data.tiles).map_err(payload_err),
        "csv" => decode_csv(layer, cells, &data.raw).map_err(payload_err)?,
        "base64" => {
            let bytes = match data.compression.as_str() {
                "" | "gzip" | "zlib" => {
                    decode_base64(&data.raw, &data.compression).map_err(payload_err)?
                }
                other => {
                    return Err(MapError::UnsupportedCompression {
                        layer: layer.to_owned(),
                        compression: other.to_owned(),
                    })
                }
            };
            gids_from_le_bytes(layer, cells, &bytes).map_err(payload_err)?
        }
        other => {
            return Err(MapError::UnsupportedEncoding {
                layer: layer.to_owned(),
                encoding: other.to_owned(),
            })
        }
    };

    fill_grid(gids, cells)
        .ok_or(PayloadError::GridTooLarge { width, height })
        .map_err(payload_err)
}

/// Pad a short payload with empty tiles up to `cells`.
///
/// The grid size comes straight from the document, so the allocation is
/// fallible instead of aborting.
fn fill_grid(mut gids: Vec<Gid>, cells: usize) -> Option<Vec<Gid>> {
    let missing = cells.saturating_sub(gids.len());
    gids.try_reserve_exact(missing).ok()?;
    gids.resize(cells, Gid::EMPTY);
    Some(gids)
}

fn decode_tile_records(layer: &str, cells: usize, tiles: &[Gid]) -> Result<Vec<Gid>, PayloadError> {
    if tiles.len() < cells {
        return Err(PayloadError::TileCount {
            expected: cells,
            found: tiles.len(),
        });
    }
    if tiles.len() > cells {
        warn!(
            "layer '{layer}': {} <tile> records for {cells} cells, ignoring the rest",
            tiles.len()
        );
    }
    Ok(tiles[..cells].to_vec())
}

fn decode_csv(layer: &str, cells: usize, raw: &str) -> Result<Vec<Gid>, PayloadError> {
    let mut gids = Vec::new();

    // Newlines and padding separate tokens just like commas do; anything
    // else that is not a digit is dropped from the token.
    let tokens = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|t| !t.is_empty());

    for token in tokens {
        let value: u32 = token
            .parse()
            .map_err(|source| PayloadError::InvalidCsvToken { token, source })?;
        gids.push(Gid(value));
    }

    if gids.len() > cells {
        return Err(PayloadError::TileCount {
            expected: cells,
            found: gids.len(),
        });
    }
    if gids.len() < cells {
        warn!(
            "layer '{layer}': CSV has {} of {cells} tiles, padding with empty tiles",
            gids.len()
        );
    }
    Ok(gids)
}

fn decode_base64(raw: &str, compression: &str) -> Result<Vec<u8>, PayloadError> {
    let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64_STANDARD.decode(text)?;

    let mut out = Vec::new();
    match compression {
        "gzip" => {
            GzDecoder::new(bytes.as_slice())
                .read_to_end(&mut out)
                .map_err(PayloadError::Decompress)?;
        }
        "zlib" => {
            ZlibDecoder::new(bytes.as_slice())
                .read_to_end(&mut out)
                .map_err(PayloadError::Decompress)?;
        }
        _ => out = bytes,
    }
    Ok(out)
}

/// Little-endian `u32` per cell.
///
/// A short buffer only yields the complete groups it has; the caller pads the
/// remaining cells with empty tiles. This lenient behaviour can mask corrupted
/// data and is a candidate for stricter validation.
fn gids_from_le_bytes(layer: &str, cells: usize, bytes: &[u8]) -> Result<Vec<Gid>, PayloadError> {
    let found = bytes.len() / 4;
    if found > cells {
        return Err(PayloadError::TileCount {
            expected: cells,
            found,
        });
    }
    if found < cells {
        warn!(
            "layer '{layer}': payload has {} bytes, expected {}; trailing tiles left empty",
            bytes.len(),
            cells.saturating_mul(4)
        );
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| Gid(u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gid::{FLIP_D, FLIP_H};
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn le_bytes(gids: &[u32]) -> Vec<u8> {
        gids.iter().flat_map(|g| g.to_le_bytes()).collect()
    }

    fn base64_data(bytes: &[u8], compression: &str) -> LayerData {
        let packed = match compression {
            "zlib" => {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(bytes).unwrap();
                enc.finish().unwrap()
            }
            "gzip" => {
                let mut enc = GzEncoder::new(Vec::new(), Compression::default());
                enc.write_all(bytes).unwrap();
                enc.finish().unwrap()
            }
            _ => bytes.to_vec(),
        };
        LayerData {
            encoding: "base64".into(),
            compression: compression.into(),
            raw: format!("\n   {}\n  ", BASE64_STANDARD.encode(packed)),
            tiles: Vec::new(),
        }
    }

    fn raw(gids: &[Gid]) -> Vec<u32> {
        gids.iter().map(|g| g.raw()).collect()
    }

    #[test]
    fn csv_sanitizes_newlines_and_empty_tokens() {
        let data = LayerData {
            encoding: "csv".into(),
            raw: "1,2,,3\n4".into(),
            ..Default::default()
        };
        let gids = decode_layer_data("ground", 2, 2, &data).expect("decode");
        assert_eq!(raw(&gids), vec![1, 2, 3, 4]);
    }

    #[test]
    fn csv_strips_stray_characters_from_tokens() {
        for text in ["1,2,3,4;", "1,2,3,\"4\"", "1,-2,3,4", " 1 ,2\r\n,3,x4"] {
            let data = LayerData {
                encoding: "csv".into(),
                raw: text.into(),
                ..Default::default()
            };
            let gids = decode_layer_data("ground", 2, 2, &data).expect(text);
            assert_eq!(raw(&gids), vec![1, 2, 3, 4], "{text:?}");
        }
    }

    #[test]
    fn csv_tokens_of_only_stray_characters_are_dropped() {
        let data = LayerData {
            encoding: "csv".into(),
            raw: "1,x,2,;,3,4".into(),
            ..Default::default()
        };
        let gids = decode_layer_data("ground", 2, 2, &data).expect("decode");
        assert_eq!(raw(&gids), vec![1, 2, 3, 4]);
    }

    #[test]
    fn csv_rejects_tokens_that_overflow_u32() {
        let data = LayerData {
            encoding: "csv".into(),
            raw: "1,99999999999,3,4".into(),
            ..Default::default()
        };
        let err = decode_layer_data("ground", 2, 2, &data).unwrap_err();
        assert!(matches!(
            err,
            MapError::Payload { source: PayloadError::InvalidCsvToken { ref token, .. }, .. } if token == "99999999999"
        ));
    }

    #[test]
    fn oversized_grid_is_an_error_not_an_abort() {
        let data = LayerData {
            encoding: "csv".into(),
            raw: "1".into(),
            ..Default::default()
        };
        let err = decode_layer_data("huge", u32::MAX, u32::MAX, &data).unwrap_err();
        assert!(matches!(
            err,
            MapError::Payload { ref layer, source: PayloadError::GridTooLarge { .. } } if layer == "huge"
        ));

        let data = base64_data(&le_bytes(&[1]), "zlib");
        let err = decode_layer_data("huge", u32::MAX, u32::MAX, &data).unwrap_err();
        assert!(matches!(err, MapError::Payload { source: PayloadError::GridTooLarge { .. }, .. }));
    }

    #[test]
    fn csv_with_too_many_tokens_is_an_error() {
        let data = LayerData {
            encoding: "csv".into(),
            raw: "1,2,3,4,5".into(),
            ..Default::default()
        };
        let err = decode_layer_data("ground", 2, 2, &data).unwrap_err();
        assert!(matches!(
            err,
            MapError::Payload { source: PayloadError::TileCount { expected: 4, found: 5 }, .. }
        ));
    }

    #[test]
    fn zlib_round_trip_keeps_flip_bits() {
        let expected = vec![1, 0, 7 | FLIP_H, 3 | FLIP_D, 65_000, 2];
        let data = base64_data(&le_bytes(&expected), "zlib");
        let gids = decode_layer_data("ground", 3, 2, &data).expect("decode");
        assert_eq!(raw(&gids), expected);
    }

    #[test]
    fn every_encoding_yields_the_same_sequence() {
        let expected = vec![1u32, 2, 0, 4, 0x8000_0005, 6];

        let plain = LayerData {
            tiles: expected.iter().copied().map(Gid).collect(),
            ..Default::default()
        };
        let csv = LayerData {
            encoding: "csv".into(),
            raw: "\n1,2,0,\n4,2147483653,6\n".into(),
            ..Default::default()
        };
        let bytes = le_bytes(&expected);

        let decoded = [
            decode_layer_data("l", 3, 2, &plain).unwrap(),
            decode_layer_data("l", 3, 2, &csv).unwrap(),
            decode_layer_data("l", 3, 2, &base64_data(&bytes, "")).unwrap(),
            decode_layer_data("l", 3, 2, &base64_data(&bytes, "gzip")).unwrap(),
            decode_layer_data("l", 3, 2, &base64_data(&bytes, "zlib")).unwrap(),
        ];
        for gids in &decoded {
            assert_eq!(raw(gids), expected);
        }
    }

    #[test]
    fn short_base64_payload_leaves_trailing_tiles_empty() {
        let data = base64_data(&le_bytes(&[1, 2, 3]), "");
        let gids = decode_layer_data("ground", 2, 2, &data).expect("decode");
        assert_eq!(raw(&gids), vec![1, 2, 3, 0]);
    }

    #[test]
    fn oversized_base64_payload_is_an_error() {
        let data = base64_data(&le_bytes(&[1, 2, 3, 4, 5]), "zlib");
        let err = decode_layer_data("ground", 2, 2, &data).unwrap_err();
        assert!(matches!(err, MapError::Payload { source: PayloadError::TileCount { .. }, .. }));
    }

    #[test]
    fn unknown_compression_and_encoding_are_rejected() {
        let mut data = base64_data(&le_bytes(&[1]), "");
        data.compression = "zstd".into();
        let err = decode_layer_data("ground", 1, 1, &data).unwrap_err();
        assert!(matches!(
            err,
            MapError::UnsupportedCompression { ref layer, ref compression } if layer == "ground" && compression == "zstd"
        ));

        let data = LayerData {
            encoding: "xml".into(),
            ..Default::default()
        };
        let err = decode_layer_data("ground", 1, 1, &data).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedEncoding { ref encoding, .. } if encoding == "xml"));
    }

    #[test]
    fn corrupt_payloads_are_payload_errors() {
        let data = LayerData {
            encoding: "base64".into(),
            raw: "!!not base64!!".into(),
            ..Default::default()
        };
        let err = decode_layer_data("ground", 1, 1, &data).unwrap_err();
        assert!(matches!(err, MapError::Payload { source: PayloadError::Base64(_), .. }));

        let mut data = base64_data(&le_bytes(&[1]), "");
        data.compression = "gzip".into();
        let err = decode_layer_data("ground", 1, 1, &data).unwrap_err();
        assert!(matches!(err, MapError::Payload { source: PayloadError::Decompress(_), .. }));
    }

    #[test]
    fn tile_records_must_cover_the_grid() {
        let data = LayerData {
            tiles: vec![Gid(1), Gid(2), Gid(3)],
            ..Default::default()
        };
        let err = decode_layer_data("oops", 2, 2, &data).unwrap_err();
        assert!(matches!(
            err,
            MapError::Payload { ref layer, source: PayloadError::TileCount { expected: 4, found: 3 } } if layer == "oops"
        ));

        let gids = decode_layer_data("ok", 1, 2, &data).expect("extra records are ignored");
        assert_eq!(raw(&gids), vec![1, 2]);
    }
}
