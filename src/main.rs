#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let default_filter = if docverify::cli::is_verbose() || docverify::cli::is_serve() {
        "docverify=info,tower_http=info"
    } else {
        "docverify=warn"
    };
    let _log_guard = docverify::logging::init(default_filter);

    docverify::cli::run().await
}
