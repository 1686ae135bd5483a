// metar_exporter - Prometheus metrics exporter for airport METAR observations
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use clap::Parser;
use metar_exporter::client::MetarClient;
use metar_exporter::collect::{self, StationCollector};
use metar_exporter::http::RequestContext;
use metar_exporter::metrics::MetarMetrics;
use prometheus_client::registry::Registry;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
const DEFAULT_INTERVAL: &str = "5m";
const DEFAULT_TIMEOUT_MILLIS: u64 = 5000;
const DEFAULT_API_URL: &str = "https://aviationweather.gov/";

#[derive(Debug, Parser)]
#[clap(name = "metar_exporter", version = clap::crate_version!())]
struct MetarExporterApplication {
    /// ICAO code of a station to fetch observations for. Repeat the flag to
    /// fetch observations for multiple stations.
    #[clap(long, short = 's')]
    station: Vec<String>,

    /// Base URL for the aviationweather.gov API
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Fetch observations at this interval, a duration like "30s", "5m", or "1h".
    #[clap(long, default_value_t = DEFAULT_INTERVAL.into())]
    interval: String,

    /// Timeout for fetching observations, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Address to bind to. By default, metar_exporter will bind to a public
    /// address since the purpose is to expose metrics to an external system
    /// (Prometheus or another agent for ingestion)
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = MetarExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let interval = humantime::parse_duration(&opts.interval).unwrap_or_else(|e| {
        tracing::error!(message = "unable to parse interval", interval = %opts.interval, error = %e);
        process::exit(1)
    });

    if opts.station.is_empty() || (opts.station.len() == 1 && opts.station[0].is_empty()) {
        tracing::error!("at least one station to fetch observations for is required");
        process::exit(1)
    }

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let mut registry = Registry::default();
    let metrics = MetarMetrics::new(&mut registry);
    let client = MetarClient::new(http_client, &opts.api_url);
    let collector = Arc::new(StationCollector::new(client, metrics));

    tracing::info!(
        message = "observation polling started",
        api_url = %opts.api_url,
        stations = opts.station.len(),
        interval = %opts.interval,
    );
    tokio::spawn(collect::run(collector, opts.station.clone(), interval));

    let context = Arc::new(RequestContext::new(registry));
    let app = metar_exporter::http::app(context);
    let server = axum::Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
        process::exit(1)
    });

    tracing::info!(message = "server started", address = %opts.bind);
    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
