use serde::Deserialize;

/// How far [`crate::Map::load_with_options`] follows external references.
///
/// Deserializable so tools can keep it next to their other settings:
///
/// ```json
/// { "resolve_tilesets": true, "resolve_images": false }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoadOptions {
    /// Merge external `.tsx` documents into their tilesets.
    #[serde(default = "default_true")]
    pub resolve_tilesets: bool,
    /// Decode tileset and per-tile images.
    #[serde(default = "default_true")]
    pub resolve_images: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            resolve_tilesets: true,
            resolve_images: true,
        }
    }
}

impl LoadOptions {
    /// Structure only: no external documents, no pixels.
    pub fn structural() -> Self {
        LoadOptions {
            resolve_tilesets: false,
            resolve_images: false,
        }
    }

    /// Parse options from JSON; missing fields default to `true`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
