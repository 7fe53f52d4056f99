use macroquad::prelude::*;

use crate::gid::Gid;
use crate::properties::Properties;

/// An `<objectgroup>`.
#[derive(Debug, Clone)]
pub struct ObjectGroup {
    pub id: u32,
    pub name: String,
    pub color: Option<Color>,
    pub opacity: f32,
    pub visible: bool,
    pub offset: Vec2,
    pub properties: Properties,
    pub objects: Vec<Object>,
}

impl Default for ObjectGroup {
    fn default() -> Self {
        ObjectGroup {
            id: 0,
            name: String::new(),
            color: None,
            opacity: 1.0,
            visible: true,
            offset: Vec2::ZERO,
            properties: Properties::new(),
            objects: Vec::new(),
        }
    }
}

/// An `<object>` inside an object group.
#[derive(Debug, Clone)]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// `class` if present, otherwise the legacy `type` attribute.
    pub class_name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation: f32,
    pub visible: bool,
    /// Tile objects carry a raw GID; resolve it with [`crate::Map::tile_info`].
    pub gid: Option<Gid>,
    pub properties: Properties,
    pub shape: ObjectShape,
}

impl Default for Object {
    fn default() -> Self {
        Object {
            id: 0,
            name: String::new(),
            class_name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            visible: true,
            gid: None,
            properties: Properties::new(),
            shape: ObjectShape::Rectangle,
        }
    }
}

/// Geometry kind. Point lists are kept verbatim (`"x1,y1 x2,y2 ..."`).
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Rectangle,
    Ellipse,
    Point,
    Polygon(String),
    Polyline(String),
}
