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

//! Prometheus metrics exporter for airport METAR observations
//!
//! ## Features
//!
//! `metar_exporter` periodically fetches the current METAR weather observation for one
//! or more airport stations and emits the decoded values as Prometheus metrics. Values
//! are converted to metric units where the raw observation uses aviation units (knots,
//! statute miles, inches of mercury). The following metrics are emitted, each labeled
//! with the station it was fetched for.
//!
//! * `metar_temperature{station=$STATION}` - Air temperature, in degrees celsius.
//! * `metar_query_success{station=$STATION}` - Whether the last fetch for the station succeeded (0/1).
//! * `metar_observation_time{station=$STATION}` - Observation time reported by the station, as a UTC timestamp.
//! * `metar_dewpoint{station=$STATION}` - Dewpoint temperature, in degrees celsius.
//! * `metar_wind_direction{station=$STATION}` - Direction the wind is blowing from, in degrees. 0 means variable.
//! * `metar_wind_speed{station=$STATION}` - Wind speed, in km/h.
//! * `metar_visibility{station=$STATION}` - Horizontal visibility, in km.
//! * `metar_altimeter{station=$STATION}` - Altimeter setting, in hPa.
//! * `metar_skycover{station=$STATION}` - Sky cover as a fraction (0 = clear, 1 = full cover).
//! * `metar_fetch_time{station=$STATION}` - UTC timestamp of the last successful fetch.
//! * `metar_wind_force{station=$STATION}` - Wind force on the Beaufort scale (0-12).
//!
//! A failed fetch only sets `metar_query_success` to 0 for that station: values from
//! the last successful fetch stay visible until they are overwritten.
//!
//! ## Build
//!
//! `metar_exporter` is a Rust program and must be built from source using a
//! [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! git clone git@github.com:56quarters/metar_exporter.git && cd metar_exporter
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ### Picking stations
//!
//! Stations are identified by their ICAO airport code, e.g. `KBOS` for Logan Airport
//! in Boston or `EDDF` for Frankfurt. Pass one `--station` flag per station to export
//! observations for.
//!
//! ```text
//! ./metar_exporter --station KBOS --station EDDF --interval 5m
//! ```
//!
//! Observations are fetched for every station once at startup and then again each
//! interval. The interval is a human-readable duration like `30s`, `5m`, or `1h`.
//!
//! ### Prometheus
//!
//! Prometheus metrics are exposed on port `3000` at `/metrics`. Once `metar_exporter`
//! is running, configure scrapes of it by your Prometheus server. Add the host running
//! `metar_exporter` as a target under the Prometheus `scrape_configs` section as
//! described by the example below.
//!
//! ```yaml
//! # Sample config for Prometheus.
//!
//! global:
//!   scrape_interval:     15s
//!   evaluation_interval: 15s
//!   external_labels:
//!     monitor: 'my_prom'
//!
//! scrape_configs:
//! - job_name: metar_exporter
//!   static_configs:
//!   - targets: ['example:3000']
//! ```
//!

pub mod client;
pub mod collect;
pub mod http;
pub mod metrics;
pub mod units;
