// Frameworks layer: runtime bootstrap, configuration and the probe client.

pub mod config;
pub mod probe;
pub mod server;
