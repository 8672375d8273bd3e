use marketmirror::cli;

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("marketmirror=info")),
        )
        .with_target(false)
        .init();

    cli::run();
}
