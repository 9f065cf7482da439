mod commands;
mod google;
mod terminal;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;
use platepick_core::config::SearchConfig;
use platepick_core::controller::SearchController;
use platepick_core::models::{
    CoreError, CoreErrorKind, CoreResult, GeocodedLocation, GeolocationFailure, Location,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP, parse_command};
use crate::google::{DEFAULT_BASE_URL, GoogleMapsClient};
use crate::terminal::{NoticeBoard, SharedNoticeBoard, TerminalObserver};

#[derive(Debug, Parser)]
#[command(name = "platepick", version, about = "Pick somewhere nearby to eat")]
struct Args {
    /// Maps web service key.
    #[arg(long, env = "PLATEPICK_API_KEY", hide_env_values = true)]
    api_key: String,

    /// JSON file overriding search settings.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Price range selection; repeat or comma-separate.
    #[arg(long = "tier", default_values = ["0,1", "2"])]
    tiers: Vec<String>,

    #[arg(long, env = "PLATEPICK_MAPS_URL", default_value = DEFAULT_BASE_URL)]
    maps_url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("platepick: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> CoreResult<SearchConfig> {
    let Some(path) = path else {
        return Ok(SearchConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|error| {
        CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("failed to read config '{}': {error}", path.display()),
        )
    })?;
    SearchConfig::from_json(&raw)
}

async fn run(args: Args) -> CoreResult<()> {
    let config = load_config(args.config.as_deref())?;
    let maps = Arc::new(GoogleMapsClient::new(args.api_key, args.maps_url)?);
    tracing::info!(
        radius_meters = config.radius_meters,
        category = %config.category,
        "starting platepick"
    );

    let notices: SharedNoticeBoard = Arc::new(Mutex::new(NoticeBoard::default()));
    let observer = TerminalObserver::new(notices.clone());
    let mut controller =
        SearchController::new(config, Box::new(observer)).with_geocoder(maps.clone());

    match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => controller.locate(Ok(Location::new(lat, lng))),
        _ => controller.locate(Err(GeolocationFailure::Unavailable)),
    }
    controller.attach_provider(maps);

    let mut selections = args.tiers;
    controller.preload(&selections);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|error| {
                    CoreError::new(CoreErrorKind::Internal, format!("failed to read stdin: {error}"))
                })?;
                let Some(line) = line else {
                    break;
                };

                let command = match parse_command(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(error) => {
                        println!("{}", error.message);
                        continue;
                    }
                };

                match command {
                    Command::Here(location) => {
                        controller.apply_location_change(GeocodedLocation {
                            location,
                            formatted_address: format!("{:.4}, {:.4}", location.lat, location.lng),
                        });
                        controller.preload(&selections);
                    }
                    Command::Where(address) => {
                        if controller.relocate(&address).await.is_ok() {
                            controller.preload(&selections);
                        }
                    }
                    Command::Tiers(values) => {
                        if let Ok(tiers) = controller.select_tiers(&values) {
                            selections = values;
                            println!("price ranges: {tiers}");
                            controller.preload(&selections);
                        }
                    }
                    Command::Go => {
                        let _ = controller.toggle(&selections);
                    }
                    Command::Reroll => {
                        let _ = controller.reroll();
                    }
                    Command::Status => print_status(&controller, &selections, &notices),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                }
            }
            Some(signal) = controller.next_signal() => {
                controller.handle_signal(signal);
            }
        }
    }

    Ok(())
}

fn print_status(
    controller: &SearchController,
    selections: &[String],
    notices: &SharedNoticeBoard,
) {
    match controller.location() {
        Some(location) => println!("location: {:.4}, {:.4}", location.lat, location.lng),
        None => println!("location: unknown"),
    }
    let config = controller.config();
    println!(
        "searching {} within {} m, {} picks",
        config.category, config.radius_meters, config.pick_count
    );
    println!("price ranges: {}", selections.join(" "));
    println!(
        "provider: {}",
        if controller.provider_ready() { "ready" } else { "not ready" }
    );
    println!("search: {:?}", controller.state());
    println!(
        "cached: {}",
        if controller.cached_for(selections) { "yes" } else { "no" }
    );
    if let Ok(board) = notices.lock() {
        if let Some(message) = board.visible(Instant::now()) {
            println!("notice: {message}");
        }
    }
}
