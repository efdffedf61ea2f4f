use clap::Parser;

/// HTTP service wrapping the incident report generator.
#[derive(Parser)]
#[command(name = "incident-pdf", version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("incident-pdf listening on {addr}");
    log::info!("  POST /api/report");
    log::info!("  GET  /health");

    axum::serve(listener, incident_pdf::server::router()).await
}
