//! Static town layout, read from a Tiled-style JSON object list

use crate::error::LayoutError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const LISTENING_AREA_CLASS: &str = "ListeningArea";
pub const VIEWING_AREA_CLASS: &str = "ViewingArea";

/// One rectangle object from the map editor
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    #[serde(default, alias = "type")]
    pub class: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct MapLayout {
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

impl MapLayout {
    pub fn from_json(path: &Path, json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json).map_err(|source| LayoutError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let json = fs::read_to_string(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(path, &json)
    }
}
