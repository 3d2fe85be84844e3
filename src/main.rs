#[tokio::main]
async fn main() -> std::io::Result<()> {
    terrain_server::frameworks::server::run_with_config().await
}
