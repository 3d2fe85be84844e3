/// Gameplay tuning for destructible terrain.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct TerrainTuning {
    /// Playable area width in pixels; the terrain root always spans it.
    pub map_width: f32,

    /// Playable area height in pixels.
    pub map_height: f32,

    /// Smallest edge length the terrain tree subdivides down to.
    pub min_block_size: f32,

    /// Radius used when an explosion request does not carry one.
    pub explosion_radius: f32,

    /// Upper bound applied to client-requested explosion radii.
    pub max_explosion_radius: f32,

    /// Ground texture edge length, used to keep tiles seamless across blocks.
    pub texture_size: f32,

    /// Share of the map height covered by ground on the placeholder map.
    pub default_ground_fraction: f32,
}

impl Default for TerrainTuning {
    fn default() -> Self {
        Self {
            map_width: 1600.0,
            map_height: 800.0,
            min_block_size: 8.0,
            explosion_radius: 50.0,
            max_explosion_radius: 200.0,
            texture_size: 32.0,
            default_ground_fraction: 0.2,
        }
    }
}
