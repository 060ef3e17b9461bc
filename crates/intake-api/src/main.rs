mod landlock;

use intake_api::setup;
use intake_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, pipeline, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Best-effort Landlock sandboxing on Linux, once the working directories exist.
    landlock::linux::init(&config);

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
