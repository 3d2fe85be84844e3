// Map documents on disk: the exported format the server loads at startup and
// the authoring tool writes.

use crate::domain::{MapDocument, PrimitiveDocument, TerrainError, TerrainMap};
use serde::Deserialize;
use std::{fmt, fs, io, path::Path};

#[derive(Debug)]
pub enum MapFileError {
    Io(io::Error),
    Json(serde_json::Error),
    Invalid(TerrainError),
}

impl fmt::Display for MapFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapFileError::Io(e) => write!(f, "map file unreadable: {e}"),
            MapFileError::Json(e) => write!(f, "map file is not valid json: {e}"),
            MapFileError::Invalid(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MapFileError {}

impl From<io::Error> for MapFileError {
    fn from(e: io::Error) -> Self {
        MapFileError::Io(e)
    }
}

impl From<serde_json::Error> for MapFileError {
    fn from(e: serde_json::Error) -> Self {
        MapFileError::Json(e)
    }
}

impl From<TerrainError> for MapFileError {
    fn from(e: TerrainError) -> Self {
        MapFileError::Invalid(e)
    }
}

// The editor saves either a full export or a bare primitive bitmap. Every
// export field is optional, so the bitmap shape has to be tried first.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredMap {
    Primitive(PrimitiveDocument),
    Export(MapDocument),
}

/// Parses either file shape into an export document.
pub fn parse_map_document(json: &str) -> Result<MapDocument, MapFileError> {
    let stored: StoredMap = serde_json::from_str(json)?;
    Ok(match stored {
        StoredMap::Export(doc) if doc.quad_tree.is_some() || doc.primitive.is_some() => doc,
        StoredMap::Export(_) => {
            return Err(TerrainError::InvalidMap("document has neither quadTree nor primitive").into());
        }
        StoredMap::Primitive(primitive) => MapDocument {
            player_positions: primitive.player_positions.clone(),
            quad_tree: None,
            primitive: Some(primitive),
        },
    })
}

pub fn load_map_document(path: &Path) -> Result<MapDocument, MapFileError> {
    let json = fs::read_to_string(path)?;
    parse_map_document(&json)
}

pub fn load_terrain_map(path: &Path, default_min_block_size: f32) -> Result<TerrainMap, MapFileError> {
    let doc = load_map_document(path)?;
    Ok(TerrainMap::from_document(doc, default_min_block_size)?)
}

pub fn write_map_document(path: &Path, doc: &MapDocument) -> Result<(), MapFileError> {
    let json = serde_json::to_string_pretty(doc)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PrimitiveMap;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("terrain-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn bare_primitive_files_are_accepted() {
        let doc = parse_map_document(
            r#"{ "rowSize": 2, "columnSize": 1, "minTileSize": 8, "grid": [1, 1] }"#,
        )
        .expect("parse");
        assert!(doc.quad_tree.is_none());
        assert_eq!(doc.primitive.expect("primitive").row_size, 2);
    }

    #[test]
    fn documents_without_terrain_are_invalid() {
        assert!(matches!(
            parse_map_document(r#"{ "playerPositions": [] }"#),
            Err(MapFileError::Invalid(TerrainError::InvalidMap(_)))
        ));
        assert!(matches!(
            parse_map_document("not json"),
            Err(MapFileError::Json(_))
        ));
    }

    #[test]
    fn written_export_loads_back_as_terrain() {
        let map = PrimitiveMap::with_ground(64.0, 32.0, 8.0, 2).expect("map");
        let path = temp_path("export");
        write_map_document(&path, &map.to_document()).expect("write");

        let terrain = load_terrain_map(&path, 4.0).expect("load");
        let _ = fs::remove_file(&path);

        assert_eq!(terrain.min_block_size, 8.0);
        assert_eq!(terrain.root.filled_area(), 64.0 * 16.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            load_map_document(&temp_path("missing")),
            Err(MapFileError::Io(_))
        ));
    }
}
