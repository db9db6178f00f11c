use std::net::SocketAddr;

use backend::{catalog::LayerCatalogConfig, create_router, models::DomainBounds, AppState};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Development stub of the Parasol routing service (synthetic routes)"
)]
struct Args {
    #[arg(long, env = "PARASOL_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PARASOL_PORT", default_value_t = 5000)]
    port: u16,

    /// WMS endpoint advertised for shade layers
    #[arg(long, env = "PARASOL_TILE_URL", default_value = "http://localhost:8080/geoserver/ows")]
    tile_url: String,

    /// Tile server workspace prefixed to layer names
    #[arg(long, env = "PARASOL_WORKSPACE", default_value = "parasol")]
    workspace: String,

    /// First shade layer hour (inclusive)
    #[arg(long, default_value_t = 6)]
    start_hour: u8,

    /// Last shade layer hour (exclusive)
    #[arg(long, default_value_t = 21)]
    stop_hour: u8,

    /// Minutes between shade layers
    #[arg(long, default_value_t = 30)]
    step_minutes: u16,

    #[arg(long, allow_hyphen_values = true, default_value_t = DomainBounds::default().min_lon)]
    min_lon: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = DomainBounds::default().max_lon)]
    max_lon: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = DomainBounds::default().min_lat)]
    min_lat: f64,
    #[arg(long, allow_hyphen_values = true, default_value_t = DomainBounds::default().max_lat)]
    max_lat: f64,
}

impl Args {
    fn domain(&self) -> DomainBounds {
        DomainBounds {
            min_lon: self.min_lon,
            max_lon: self.max_lon,
            min_lat: self.min_lat,
            max_lat: self.max_lat,
        }
    }

    fn layers(&self) -> LayerCatalogConfig {
        LayerCatalogConfig {
            tile_url: self.tile_url.clone(),
            workspace: self.workspace.clone(),
            start_hour: self.start_hour,
            stop_hour: self.stop_hour,
            step_minutes: self.step_minutes,
            ..LayerCatalogConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let state = AppState::new(args.domain(), &args.layers());
    tracing::info!(
        "serving {} shade layers, domain {:?}",
        state.catalog.len(),
        state.domain
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    tracing::info!("starting stub backend on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
