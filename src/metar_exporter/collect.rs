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

use crate::client::ObservationSource;
use crate::metrics::MetarMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// Performs a single fetch-convert-publish cycle for one station.
///
/// A failed fetch sets the success flag gauge to 0 for the station and
/// leaves every other gauge untouched, meaning values from an earlier
/// successful fetch remain visible until the next success overwrites them.
pub struct StationCollector<S> {
    source: S,
    metrics: MetarMetrics,
}

impl<S> StationCollector<S>
where
    S: ObservationSource,
{
    pub fn new(source: S, metrics: MetarMetrics) -> Self {
        StationCollector { source, metrics }
    }

    /// Fetch the current observation for a station and publish it. Errors
    /// are recorded and logged here, never returned: a failure is terminal
    /// for this station for this round and must not affect other stations.
    pub async fn collect(&self, station: &str) {
        match self.source.observation(station).await {
            Ok(obs) => {
                self.metrics.observation(station, &obs);
                tracing::info!(
                    message = "fetched new observation",
                    station = %station,
                    observation_time = obs.observation_time,
                );
            }
            Err(e) => {
                self.metrics.fetch_failed(station);
                tracing::error!(
                    message = "unable to fetch observation",
                    station = %station,
                    error = %e,
                );
            }
        }
    }
}

/// Run collection rounds forever: one round immediately, then one round
/// every `period`.
///
/// Each round spawns an independent task per station. Rounds are never
/// joined: a slow station from one round may still be in flight when the
/// next round fires, in which case whichever write happens last wins.
pub async fn run<S>(collector: Arc<StationCollector<S>>, stations: Vec<String>, period: Duration)
where
    S: ObservationSource + 'static,
{
    let mut interval = time::interval(period);

    loop {
        let _ = interval.tick().await;
        tracing::debug!(message = "starting collection round", stations = stations.len());

        for station in stations.iter() {
            let collector = Arc::clone(&collector);
            let station = station.clone();

            tokio::spawn(async move {
                collector.collect(&station).await;
            });
        }
    }
}
