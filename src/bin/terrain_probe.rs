// Headless client: mirrors a lobby's terrain and fires a few explosions.

use terrain_server::domain::tuning::TerrainTuning;
use terrain_server::frameworks::{config, probe, server};
use terrain_server::interface_adapters::map_file::load_terrain_map;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    server::init_runtime();

    let url = config::probe_server_url();
    let tuning = TerrainTuning {
        min_block_size: config::min_block_size(),
        ..TerrainTuning::default()
    };

    // Same map file the server loads, so predictions carve at its tile size.
    let map_block_size = config::map_path().and_then(|path| {
        match load_terrain_map(&path, tuning.min_block_size) {
            Ok(map) => Some(map.min_block_size),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read map tile size");
                None
            }
        }
    });

    match probe::run_probe(&url, config::probe_explosions(), tuning, map_block_size).await {
        Ok(report) => {
            tracing::info!(
                player_id = %report.player_id,
                snapshots = report.snapshots,
                explosions = report.explosions,
                filled_area_before = report.filled_area_before,
                filled_area_after = report.filled_area_after,
                colliders = report.colliders,
                tiles = report.tiles,
                tiles_allocated = report.tiles_allocated,
                min_block_size = report.min_block_size,
                "probe finished"
            );
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(%url, error = %e, "probe failed");
            std::process::ExitCode::FAILURE
        }
    }
}
