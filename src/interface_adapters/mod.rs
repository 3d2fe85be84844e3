// Interface adapters: wire protocol, network handling and in-process stand-ins
// for the terrain ports.

pub mod http;
pub mod map_file;
pub mod net;
pub mod physics;
pub mod protocol;
pub mod render;
pub mod state;
pub mod utils;
