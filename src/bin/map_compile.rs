// Authoring tool: reads an editor bitmap (or an export) and writes the export
// document with the quadtree the server loads.
//
// usage: map_compile <input.json> <output.json>

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use terrain_server::domain::{MapDocument, PrimitiveMap, QuadBlock, TerrainError, WireNode};
use terrain_server::interface_adapters::map_file::{
    MapFileError, load_map_document, write_map_document,
};

fn compile(input: &Path, output: &Path) -> Result<MapDocument, MapFileError> {
    let doc = load_map_document(input)?;

    let compiled = match doc.primitive {
        Some(primitive) => {
            let mut map = PrimitiveMap::from_document(primitive)?;
            // Spawn points may sit on the export or inside the bitmap.
            if map.player_positions().is_empty() {
                for position in &doc.player_positions {
                    map.add_player_position(position.x, position.y);
                }
            }
            map.to_document()
        }
        // Export without a bitmap: validate the tree and write it back as is.
        None => {
            let tree = doc
                .quad_tree
                .ok_or(TerrainError::InvalidMap("nothing to compile"))?;
            let root = QuadBlock::try_from(&tree)?;
            MapDocument {
                player_positions: doc.player_positions,
                quad_tree: Some(WireNode::from(&root)),
                primitive: None,
            }
        }
    };

    write_map_document(output, &compiled)?;
    Ok(compiled)
}

fn main() -> ExitCode {
    terrain_server::frameworks::server::init_runtime();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        tracing::error!("usage: map_compile <input.json> <output.json>");
        return ExitCode::from(2);
    };

    match compile(&input, &output) {
        Ok(doc) => {
            let leaves = doc
                .quad_tree
                .as_ref()
                .map(|tree| QuadBlock::from_wire(tree).leaf_count())
                .unwrap_or(0);
            tracing::info!(
                input = %input.display(),
                output = %output.display(),
                leaves,
                spawn_points = doc.player_positions.len(),
                "map compiled"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(input = %input.display(), error = %e, "map compile failed");
            ExitCode::FAILURE
        }
    }
}
