use anyhow::Result;
use meal_cart::cli::parse_args;
use meal_cart::commands;
use meal_cart::settings::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();

    let default_level = if cli.verbose { "meal_cart=debug" } else { "meal_cart=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    commands::run(cli, &settings).await
}
