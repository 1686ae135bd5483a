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

use crate::client::Observation;
use crate::units::{self, SkyCover};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StationLabels {
    pub station: String,
}

type StationGauge = Family<StationLabels, Gauge<f64, AtomicU64>>;

/// Holder for gauges that can be set from a METAR `Observation`.
///
/// All gauges are created and registered upon call to `MetarMetrics::new()`.
/// Gauges all share the prefix "metar_" and have a "station" label set to
/// the station the observation was fetched for (e.g. `{station="KBOS"}`).
/// A (gauge, station) pair only shows up in the registry output once it has
/// been set by a fetch for that station.
#[derive(Clone)]
pub struct MetarMetrics {
    temperature: StationGauge,
    query_success: StationGauge,
    observation_time: StationGauge,
    dewpoint: StationGauge,
    wind_direction: StationGauge,
    wind_speed: StationGauge,
    visibility: StationGauge,
    altimeter: StationGauge,
    skycover: StationGauge,
    fetch_time: StationGauge,
    wind_force: StationGauge,
}

impl MetarMetrics {
    /// Create a new `MetarMetrics` and register each gauge with the
    /// provided `Registry`.
    pub fn new(registry: &mut Registry) -> Self {
        let temperature = StationGauge::default();
        registry.register(
            "metar_temperature",
            "Air temperature (celsius)",
            temperature.clone(),
        );

        let query_success = StationGauge::default();
        registry.register(
            "metar_query_success",
            "Indicates whether the last fetch was a success (0/1)",
            query_success.clone(),
        );

        let observation_time = StationGauge::default();
        registry.register(
            "metar_observation_time",
            "Observation time of the current data reported by the station (UTC)",
            observation_time.clone(),
        );

        let dewpoint = StationGauge::default();
        registry.register(
            "metar_dewpoint",
            "Dewpoint temperature (celsius)",
            dewpoint.clone(),
        );

        let wind_direction = StationGauge::default();
        registry.register(
            "metar_wind_direction",
            "Direction from which the wind is blowing. 0 degrees=variable wind direction",
            wind_direction.clone(),
        );

        let wind_speed = StationGauge::default();
        registry.register(
            "metar_wind_speed",
            "Wind speed; 0 degree wdir and 0 wspd = calm winds (km/h)",
            wind_speed.clone(),
        );

        let visibility = StationGauge::default();
        registry.register(
            "metar_visibility",
            "Horizontal visibility (km)",
            visibility.clone(),
        );

        let altimeter = StationGauge::default();
        registry.register("metar_altimeter", "Altimeter (hPa)", altimeter.clone());

        let skycover = StationGauge::default();
        registry.register(
            "metar_skycover",
            "Sky cover (0 = clear, 1 = full cover)",
            skycover.clone(),
        );

        let fetch_time = StationGauge::default();
        registry.register(
            "metar_fetch_time",
            "Timestamp of the last successful fetch",
            fetch_time.clone(),
        );

        let wind_force = StationGauge::default();
        registry.register(
            "metar_wind_force",
            "Wind force in Beaufort wind force scale",
            wind_force.clone(),
        );

        Self {
            temperature,
            query_success,
            observation_time,
            dewpoint,
            wind_direction,
            wind_speed,
            visibility,
            altimeter,
            skycover,
            fetch_time,
            wind_force,
        }
    }

    /// Record a failed fetch for a station. Gauges set by a previous
    /// successful fetch are left untouched.
    pub fn fetch_failed(&self, station: &str) {
        self.query_success.get_or_create(&Self::labels(station)).set(0.0);
    }

    /// Set all gauges for a station from an observation, converting values
    /// to the exported units. Sky cover is only written when the reported
    /// category maps to a cover fraction; otherwise any previous value for
    /// the station persists.
    pub fn observation(&self, station: &str, obs: &Observation) {
        let labels = Self::labels(station);

        self.temperature.get_or_create(&labels).set(obs.temperature);
        self.query_success.get_or_create(&labels).set(1.0);
        self.observation_time
            .get_or_create(&labels)
            .set(obs.observation_time as f64);
        self.dewpoint.get_or_create(&labels).set(obs.dewpoint);
        self.wind_direction.get_or_create(&labels).set(obs.wind_direction);
        self.wind_speed
            .get_or_create(&labels)
            .set(units::kts_to_kmh(obs.wind_speed));
        self.visibility
            .get_or_create(&labels)
            .set(units::statute_miles_to_km(obs.visibility));
        self.altimeter
            .get_or_create(&labels)
            .set(units::inhg_to_hpa(obs.altimeter));

        if let Some(cover) = obs.sky_cover().and_then(SkyCover::parse) {
            self.skycover.get_or_create(&labels).set(cover.fraction());
        }

        self.fetch_time.get_or_create(&labels).set(unix_now_secs());
        self.wind_force
            .get_or_create(&labels)
            .set(f64::from(units::kts_to_beaufort(obs.wind_speed)));
    }

    fn labels(station: &str) -> StationLabels {
        StationLabels {
            station: station.to_owned(),
        }
    }
}

fn unix_now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod test {
    use super::{MetarMetrics, StationLabels};
    use crate::client::{CloudLayer, Observation};
    use prometheus_client::encoding::text::encode;
    use prometheus_client::registry::Registry;

    fn observation(station: &str, cover: &str) -> Observation {
        Observation {
            station_id: station.to_owned(),
            observation_time: 1693231200,
            temperature: 21.1,
            dewpoint: 15.6,
            wind_direction: 230.0,
            wind_speed: 10.0,
            visibility: 1.0,
            altimeter: 29.92,
            clouds: vec![CloudLayer {
                cover: cover.to_owned(),
                base: Some(5500.0),
            }],
        }
    }

    fn labels(station: &str) -> StationLabels {
        StationLabels {
            station: station.to_owned(),
        }
    }

    #[test]
    fn test_observation_sets_converted_values() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.observation("EDDF", &observation("EDDF", "BKN"));

        let labels = labels("EDDF");
        assert_eq!(1.0, metrics.query_success.get_or_create(&labels).get());
        assert_eq!(21.1, metrics.temperature.get_or_create(&labels).get());
        assert_eq!(15.6, metrics.dewpoint.get_or_create(&labels).get());
        assert_eq!(230.0, metrics.wind_direction.get_or_create(&labels).get());
        assert_eq!(1693231200.0, metrics.observation_time.get_or_create(&labels).get());

        let wind_speed = metrics.wind_speed.get_or_create(&labels).get();
        assert!((wind_speed - 18.52).abs() < 1e-9, "wind speed {}", wind_speed);

        let visibility = metrics.visibility.get_or_create(&labels).get();
        assert!((visibility - 1.609344).abs() < 1e-9, "visibility {}", visibility);

        let altimeter = metrics.altimeter.get_or_create(&labels).get();
        assert!((altimeter - 1013.21).abs() < 0.01, "altimeter {}", altimeter);

        assert_eq!(0.875, metrics.skycover.get_or_create(&labels).get());
        assert_eq!(3.0, metrics.wind_force.get_or_create(&labels).get());
        assert!(metrics.fetch_time.get_or_create(&labels).get() > 0.0);
    }

    #[test]
    fn test_fetch_failed_only_touches_success_flag() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.fetch_failed("KJFK");

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();
        assert!(buf.contains("metar_query_success{station=\"KJFK\"} 0"), "{}", buf);
        assert!(!buf.contains("metar_temperature{station=\"KJFK\"}"), "{}", buf);
        assert!(!buf.contains("metar_skycover{station=\"KJFK\"}"), "{}", buf);
    }

    #[test]
    fn test_fetch_failed_preserves_previous_values() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.observation("KJFK", &observation("KJFK", "OVC"));
        metrics.fetch_failed("KJFK");

        let labels = labels("KJFK");
        assert_eq!(0.0, metrics.query_success.get_or_create(&labels).get());
        assert_eq!(21.1, metrics.temperature.get_or_create(&labels).get());
        assert_eq!(1.0, metrics.skycover.get_or_create(&labels).get());
    }

    #[test]
    fn test_unmatched_sky_cover_preserves_previous_value() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.observation("KBOS", &observation("KBOS", "BKN"));
        // OVX (sky obscured) has no cover fraction and must not clobber
        // the value from the previous round.
        metrics.observation("KBOS", &observation("KBOS", "OVX"));

        let labels = labels("KBOS");
        assert_eq!(0.875, metrics.skycover.get_or_create(&labels).get());
        assert_eq!(1.0, metrics.query_success.get_or_create(&labels).get());
    }

    #[test]
    fn test_unmatched_sky_cover_never_set() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.observation("KBOS", &observation("KBOS", "OVX"));

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();
        assert!(!buf.contains("metar_skycover{station=\"KBOS\"}"), "{}", buf);
        assert!(buf.contains("metar_temperature{station=\"KBOS\"}"), "{}", buf);
    }

    #[test]
    fn test_stations_never_fetched_are_absent() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        metrics.observation("EDDF", &observation("EDDF", "FEW"));

        let mut buf = String::new();
        encode(&mut buf, &registry).unwrap();
        assert!(buf.contains("station=\"EDDF\""), "{}", buf);
        assert!(!buf.contains("station=\"KLGA\""), "{}", buf);
    }

    #[test]
    fn test_observation_overwrites_previous_round() {
        let mut registry = Registry::default();
        let metrics = MetarMetrics::new(&mut registry);

        let mut obs = observation("EDDF", "SCT");
        metrics.observation("EDDF", &obs);
        obs.temperature = 23.4;
        obs.wind_speed = 22.0;
        metrics.observation("EDDF", &obs);

        let labels = labels("EDDF");
        assert_eq!(23.4, metrics.temperature.get_or_create(&labels).get());
        assert_eq!(6.0, metrics.wind_force.get_or_create(&labels).get());
    }
}
