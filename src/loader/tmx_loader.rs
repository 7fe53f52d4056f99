use std::str::FromStr;

use log::{debug, warn};
use macroquad::prelude::*;
use roxmltree::{Document, Node};

use crate::error::DocumentError;
use crate::gid::Gid;
use crate::layer::{Layer, LayerData};
use crate::map::Map;
use crate::object::{Object, ObjectGroup, ObjectShape};
use crate::properties::{Properties, PropertyValue};
use crate::tileset::{Image, Tile, TileSet, TileSetRef, TilesetBody};

/// Parse a `<map>` document into typed records.
///
/// Layer data is left undecoded and external tilesets keep an empty body.
pub fn parse_map_document(xml: &str) -> Result<Map, DocumentError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    expect_root(root, "map")?;

    let mut map = Map::default();
    for attribute in root.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "version" => map.version = String::from(value),
            "tiledversion" => map.tiled_version = String::from(value),
            "orientation" => map.orientation = String::from(value),
            "renderorder" => map.render_order = String::from(value),
            "width" => map.width = parse_attr(root, name, value)?,
            "height" => map.height = parse_attr(root, name, value)?,
            "tilewidth" => map.tile_width = parse_attr(root, name, value)?,
            "tileheight" => map.tile_height = parse_attr(root, name, value)?,
            "infinite" => map.infinite = parse_bool(root, name, value)?,
            "backgroundcolor" => map.background_color = Some(parse_color(root, name, value)?),
            "nextlayerid" => map.next_layer_id = parse_attr(root, name, value)?,
            "nextobjectid" => map.next_object_id = parse_attr(root, name, value)?,
            _ => {}
        }
    }

    for node in root.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "properties" => map.properties = parse_properties(node)?,
            "tileset" => map.tilesets.push(parse_map_tileset(node)?),
            "layer" => map.layers.push(parse_layer(node)?),
            "objectgroup" => map.object_groups.push(parse_object_group(node)?),
            other => debug!("skipping <{other}> in <map>"),
        }
    }

    if !map.tilesets.windows(2).all(|w| w[0].first_gid <= w[1].first_gid) {
        warn!("tilesets are not in ascending firstgid order, sorting them");
        map.tilesets.sort_by_key(|t| t.first_gid);
    }

    Ok(map)
}

/// Parse a standalone `<tileset>` (`.tsx`) document.
pub fn parse_tileset_document(xml: &str) -> Result<TilesetBody, DocumentError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    expect_root(root, "tileset")?;
    parse_tileset_body(root)
}

fn expect_root(root: Node, expected: &'static str) -> Result<(), DocumentError> {
    let found = root.tag_name().name();
    if found != expected {
        return Err(DocumentError::UnexpectedRoot {
            expected,
            found: found.to_owned(),
        });
    }
    Ok(())
}

fn invalid(node: Node, attr: &str, value: &str) -> DocumentError {
    DocumentError::InvalidAttribute {
        tag: node.tag_name().name().to_owned(),
        attr: attr.to_owned(),
        value: value.to_owned(),
    }
}

fn parse_attr<T: FromStr>(node: Node, attr: &str, value: &str) -> Result<T, DocumentError> {
    value.parse().map_err(|_| invalid(node, attr, value))
}

fn parse_bool(node: Node, attr: &str, value: &str) -> Result<bool, DocumentError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(invalid(node, attr, value)),
    }
}

/// `#RRGGBB` or `#AARRGGBB`, leading `#` optional.
fn parse_color(node: Node, attr: &str, value: &str) -> Result<Color, DocumentError> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    let packed = u32::from_str_radix(hex, 16).map_err(|_| invalid(node, attr, value))?;
    let [b0, b1, b2, b3] = packed.to_be_bytes();
    match hex.len() {
        6 => Ok(Color::from_rgba(b1, b2, b3, 255)),
        8 => Ok(Color::from_rgba(b1, b2, b3, b0)),
        _ => Err(invalid(node, attr, value)),
    }
}

fn parse_map_tileset(node: Node) -> Result<TileSet, DocumentError> {
    let first_gid = node
        .attribute("firstgid")
        .ok_or(DocumentError::MissingAttribute {
            tag: String::from("tileset"),
            attr: "firstgid",
        })?;
    let reference = TileSetRef {
        first_gid: parse_attr(node, "firstgid", first_gid)?,
        source: node.attribute("source").map(String::from).unwrap_or_default(),
    };

    // External tilesets only carry firstgid/source here; the body arrives on resolve
    let body = if reference.source.is_empty() {
        parse_tileset_body(node)?
    } else {
        TilesetBody::default()
    };
    Ok(TileSet::merge(reference, body))
}

fn parse_tileset_body(node: Node) -> Result<TilesetBody, DocumentError> {
    let mut body = TilesetBody::default();
    for attribute in node.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "name" => body.name = String::from(value),
            "tilewidth" => body.tile_width = parse_attr(node, name, value)?,
            "tileheight" => body.tile_height = parse_attr(node, name, value)?,
            "spacing" => body.spacing = parse_attr(node, name, value)?,
            "margin" => body.margin = parse_attr(node, name, value)?,
            "tilecount" => body.tile_count = parse_attr(node, name, value)?,
            "columns" => body.columns = parse_attr(node, name, value)?,
            _ => {}
        }
    }

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "image" => body.image = Some(parse_image(child)?),
            "tile" => body.tiles.push(parse_tile(child)?),
            "properties" => body.properties = parse_properties(child)?,
            _ => {}
        }
    }
    Ok(body)
}

fn parse_tile(node: Node) -> Result<Tile, DocumentError> {
    let mut tile = Tile::default();
    if let Some(id) = node.attribute("id") {
        tile.id = parse_attr(node, "id", id)?;
    }
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "image" => tile.image = Some(parse_image(child)?),
            "properties" => tile.properties = parse_properties(child)?,
            _ => {}
        }
    }
    Ok(tile)
}

fn parse_image(node: Node) -> Result<Image, DocumentError> {
    let mut image = Image::default();
    for attribute in node.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "source" => image.source = String::from(value),
            "trans" => image.trans = Some(String::from(value)),
            "width" => image.width = Some(parse_attr(node, name, value)?),
            "height" => image.height = Some(parse_attr(node, name, value)?),
            _ => {}
        }
    }
    Ok(image)
}

fn parse_properties(node: Node) -> Result<Properties, DocumentError> {
    let mut out = Properties::new();
    for prop in node.children().filter(|n| n.has_tag_name("property")) {
        let name = prop.attribute("name").ok_or(DocumentError::MissingAttribute {
            tag: String::from("property"),
            attr: "name",
        })?;
        // Multi-line strings live in the element text instead of `value`
        let value = prop
            .attribute("value")
            .or_else(|| prop.text())
            .unwrap_or_default();

        let parsed = match prop.attribute("type") {
            Some("bool") => PropertyValue::Bool(parse_bool(prop, "value", value)?),
            Some("int") | Some("object") => PropertyValue::I64(parse_attr(prop, "value", value)?),
            Some("float") => PropertyValue::F32(parse_attr(prop, "value", value)?),
            None | Some("string") | Some("file") | Some("color") | Some("class") => {
                PropertyValue::String(String::from(value))
            }
            Some(other) => return Err(invalid(prop, "type", other)),
        };
        out.insert(String::from(name), parsed);
    }
    Ok(out)
}

fn parse_layer(node: Node) -> Result<Layer, DocumentError> {
    let mut layer = Layer::default();
    for attribute in node.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "id" => layer.id = parse_attr(node, name, value)?,
            "name" => layer.name = String::from(value),
            "width" => layer.width = parse_attr(node, name, value)?,
            "height" => layer.height = parse_attr(node, name, value)?,
            "opacity" => layer.opacity = parse_attr(node, name, value)?,
            "visible" => layer.visible = parse_bool(node, name, value)?,
            "offsetx" => layer.offset.x = parse_attr(node, name, value)?,
            "offsety" => layer.offset.y = parse_attr(node, name, value)?,
            _ => {}
        }
    }

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "data" => layer.data = parse_layer_data(child, &layer.name)?,
            "properties" => layer.properties = parse_properties(child)?,
            _ => {}
        }
    }
    Ok(layer)
}

fn parse_layer_data(node: Node, layer: &str) -> Result<LayerData, DocumentError> {
    let mut data = LayerData {
        encoding: node.attribute("encoding").map(String::from).unwrap_or_default(),
        compression: node.attribute("compression").map(String::from).unwrap_or_default(),
        ..Default::default()
    };

    for child in node.children() {
        if child.is_text() {
            data.raw.push_str(child.text().unwrap_or_default());
            continue;
        }
        match child.tag_name().name() {
            "tile" => {
                let gid = match child.attribute("gid") {
                    Some(gid) => Gid(parse_attr(child, "gid", gid)?),
                    None => Gid::EMPTY,
                };
                data.tiles.push(gid);
            }
            "chunk" => warn!("layer '{layer}': infinite map chunks are not decoded"),
            _ => {}
        }
    }
    Ok(data)
}

fn parse_object_group(node: Node) -> Result<ObjectGroup, DocumentError> {
    let mut group = ObjectGroup::default();
    for attribute in node.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "id" => group.id = parse_attr(node, name, value)?,
            "name" => group.name = String::from(value),
            "color" => group.color = Some(parse_color(node, name, value)?),
            "opacity" => group.opacity = parse_attr(node, name, value)?,
            "visible" => group.visible = parse_bool(node, name, value)?,
            "offsetx" => group.offset.x = parse_attr(node, name, value)?,
            "offsety" => group.offset.y = parse_attr(node, name, value)?,
            _ => {}
        }
    }

    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "object" => group.objects.push(parse_object(child)?),
            "properties" => group.properties = parse_properties(child)?,
            _ => {}
        }
    }
    Ok(group)
}

fn parse_object(node: Node) -> Result<Object, DocumentError> {
    let mut obj = Object::default();
    let mut kind = String::new();
    for attribute in node.attributes() {
        let name = attribute.name();
        let value = attribute.value();
        match name {
            "id" => obj.id = parse_attr(node, name, value)?,
            "name" => obj.name = String::from(value),
            "class" => obj.class_name = String::from(value),
            "type" => kind = String::from(value),
            "x" => obj.x = parse_attr(node, name, value)?,
            "y" => obj.y = parse_attr(node, name, value)?,
            "width" => obj.width = parse_attr(node, name, value)?,
            "height" => obj.height = parse_attr(node, name, value)?,
            "rotation" => obj.rotation = parse_attr(node, name, value)?,
            "visible" => obj.visible = parse_bool(node, name, value)?,
            "gid" => obj.gid = Some(Gid(parse_attr(node, name, value)?)),
            _ => {}
        }
    }
    if obj.class_name.is_empty() {
        obj.class_name = kind;
    }

    for child in node.children().filter(|n| n.is_element()) {
        let points = || child.attribute("points").map(String::from).unwrap_or_default();
        match child.tag_name().name() {
            "properties" => obj.properties = parse_properties(child)?,
            "ellipse" => obj.shape = ObjectShape::Ellipse,
            "point" => obj.shape = ObjectShape::Point,
            "polygon" => obj.shape = ObjectShape::Polygon(points()),
            "polyline" => obj.shape = ObjectShape::Polyline(points()),
            _ => {}
        }
    }
    Ok(obj)
}
