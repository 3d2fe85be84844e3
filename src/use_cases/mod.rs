// Use cases layer: terrain workflows for the server and its clients.

pub mod colliders;
pub mod game;
pub mod lobby;
pub mod replica;
pub mod terrain;
pub mod types;
pub mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use lobby::{LobbyChannel, LobbyError, LobbyHandle, LobbyRegistry, LobbySettings};
pub use replica::TerrainReplica;
pub use terrain::{ExplosionReport, TerrainAuthority};
pub use types::{GameEvent, TerrainFrame, TerrainUpdate};
pub use world::TerrainWorld;
