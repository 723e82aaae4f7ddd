use tracing_subscriber::EnvFilter;

mod catalog;
mod config;
mod engine;
mod runtime;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    runtime::run()
}
