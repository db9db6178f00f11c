use std::error::Error;

use clap::Parser;
use client::{
    config::ClientConfig, driver::Driver, http::HttpRouteService, local_time_of_day, ClientError,
    InMemorySurface, ResponseOutcome, Role, Session,
};
use shared::{Coordinate, TimeOfDay};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Compute a sun/shade weighted route against a Parasol routing service"
)]
struct Args {
    /// Root URL of the routing service (defaults to PARASOL_API_ROOT or http://localhost:5000)
    #[arg(long)]
    api_root: Option<String>,

    /// Origin as LAT,LON
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    from: Coordinate,

    /// Destination as LAT,LON
    #[arg(long, value_parser = parse_coordinate, allow_hyphen_values = true)]
    to: Coordinate,

    /// Sun/shade trade-off weight, clamped to [0, 1]
    #[arg(long, default_value_t = 0.5)]
    beta: f64,

    /// Time of day as HH:MM; the nearest shade layer is used (defaults to now)
    #[arg(long, value_parser = parse_time)]
    time: Option<TimeOfDay>,

    /// Report the shade overlay as visible
    #[arg(long)]
    show_shade: bool,
}

fn parse_coordinate(text: &str) -> Result<Coordinate, String> {
    let (lat, lon) = text
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got {text:?}"))?;
    let parse = |value: &str, label: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid {label} {value:?}"))
    };
    Ok(Coordinate::new(parse(lat, "latitude")?, parse(lon, "longitude")?))
}

fn parse_time(text: &str) -> Result<TimeOfDay, String> {
    TimeOfDay::parse(text).ok_or_else(|| format!("expected HH:MM, got {text:?}"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "client=info,shade_route=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = ClientConfig::from_env();
    if let Some(root) = &args.api_root {
        config.api_root = client::config::normalize_root(root);
    }
    if args.show_shade {
        config.shade_visible = true;
    }

    let service = HttpRouteService::new(&config)?;
    tracing::info!("using routing service at {}", service.api_root());
    let started_at = args.time.unwrap_or_else(local_time_of_day);
    let session = Session::new(InMemorySurface::new(), started_at, config.shade_visible);

    let local = tokio::task::LocalSet::new();
    let session = local
        .run_until(async move { run(Driver::new(session, service), &args).await })
        .await?;

    print_summary(&session);
    Ok(())
}

async fn run(
    mut driver: Driver<InMemorySurface, HttpRouteService>,
    args: &Args,
) -> Result<Session<InMemorySurface>, ClientError> {
    driver.apply(|session| session.load_catalog());
    for handled in driver.settle().await {
        if let ResponseOutcome::Failed(err) = handled.outcome {
            tracing::warn!("continuing without shade layers: {err}");
        }
    }

    driver.apply(|session| session.set_beta(args.beta))?;
    driver.apply(|session| session.set_endpoint(Role::Origin, args.from))?;
    driver.apply(|session| session.set_endpoint(Role::Destination, args.to))?;

    let outcomes = driver.settle().await.into_iter().map(|handled| handled.outcome);
    match route_failure(outcomes) {
        Some(err) => Err(err),
        None => Ok(driver.into_session()),
    }
}

/// The failure to report for one refresh. An out-of-domain pair fails both
/// requests; the optimal request's `EndpointOutOfBounds` is the one that
/// explains it, whichever response arrived first.
fn route_failure(outcomes: impl IntoIterator<Item = ResponseOutcome>) -> Option<ClientError> {
    let mut first = None;
    for outcome in outcomes {
        match outcome {
            ResponseOutcome::Failed(ClientError::EndpointOutOfBounds) => {
                return Some(ClientError::EndpointOutOfBounds)
            }
            ResponseOutcome::Failed(err) => {
                first.get_or_insert(err);
            }
            ResponseOutcome::Applied | ResponseOutcome::StaleDiscarded => {}
        }
    }
    first
}

fn print_summary(session: &Session<InMemorySurface>) {
    println!("time        {}", session.effective_time());
    println!("beta        {:.2}", session.beta().value());
    if let Some(layer) = session.shade().selected() {
        let visibility = if session.shade().is_visible() {
            "visible"
        } else {
            "hidden"
        };
        println!("shade layer {} ({visibility}) {}", layer.time(), layer.url);
    }
    match session.routes().route() {
        Some(route) => {
            println!("length      {:.0} m", route.length);
            println!("sun         {:.3}", route.sun_exposure);
        }
        None => println!("no route"),
    }
    if let Some(metrics) = session.routes().comparison() {
        let fmt = |ratio: Option<f64>| {
            ratio
                .map(|r| format!("{r:.2}x"))
                .unwrap_or_else(|| "n/a".to_string())
        };
        println!("vs shortest {} length, {} sun", fmt(metrics.length_ratio), fmt(metrics.sun_ratio));
    }
}
