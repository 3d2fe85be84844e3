use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

fn seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    // Keep ids well inside JavaScript's safe integer range.
    (nanos >> 16).max(1)
}

/// Process-unique id for players and connections.
///
/// Seeded from the clock so ids differ across restarts, then incremented.
pub fn next_id() -> u64 {
    static NEXT_ID: OnceLock<AtomicU64> = OnceLock::new();
    NEXT_ID
        .get_or_init(|| AtomicU64::new(seed()))
        .fetch_add(1, Ordering::Relaxed)
}

/// Lobby id for create requests that do not name one.
pub fn next_lobby_id() -> String {
    format!("lobby-{:x}", next_id())
}
