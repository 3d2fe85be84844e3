// Boots one real server per test binary and hands out its base URL.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

static SERVER_URL: OnceLock<String> = OnceLock::new();

/// Starts the server on an ephemeral port the first time it is called.
pub fn ensure_server() -> &'static str {
    SERVER_URL.get_or_init(|| {
        let published = Arc::new(OnceLock::<String>::new());
        let published_thread = Arc::clone(&published);

        // A dedicated thread and runtime outlive the per-test tokio runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_thread.set(format!("http://{addr}"));
                terrain_server::run(listener).await.expect("server failed");
            });
        });

        let base_url = loop {
            if let Some(url) = published.get() {
                break url.clone();
            }
            std::thread::sleep(Duration::from_millis(10));
        };
        wait_until_accepting(&base_url);
        base_url
    })
}

/// WebSocket URL for a lobby on the shared server.
pub fn ws_url(lobby_id: &str) -> String {
    let base = ensure_server();
    format!(
        "ws://{}/ws?lobby_id={lobby_id}",
        base.strip_prefix("http://").expect("http base url")
    )
}

fn wait_until_accepting(base_url: &str) {
    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not become ready in time");
}
