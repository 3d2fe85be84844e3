// Domain layer: the destructible-terrain engine and the ports it drives.

pub mod errors;
pub mod map;
pub mod merge;
pub mod ports;
pub mod primitive_map;
pub mod quad_block;
pub mod region;
pub mod split;
pub mod tuning;
pub mod wire;

pub use errors::TerrainError;
pub use map::TerrainMap;
pub use merge::merge_adjacent_blocks;
pub use primitive_map::PrimitiveMap;
pub use quad_block::QuadBlock;
pub use region::Region;
pub use wire::{MapDocument, Position, PrimitiveDocument, TerrainSnapshot, WireNode};
