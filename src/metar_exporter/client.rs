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

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    Internal(reqwest::Error),
    InvalidStation(String),
    NoObservation(String),
    Unexpected(StatusCode, Url),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(f, "{}", e),
            Self::InvalidStation(s) => write!(f, "invalid station {}", s),
            Self::NoObservation(s) => write!(f, "no current observation for station {}", s),
            Self::Unexpected(status, url) => write!(f, "unexpected status {} for {}", status, url),
        }
    }
}

impl error::Error for ClientError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            _ => None,
        }
    }
}

/// Something that can fetch the current METAR observation for a station,
/// usually the aviationweather.gov API. Calls are expected to be slow and
/// to fail sometimes; failures must be non-fatal to callers.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch the most recent observation for a single station.
    async fn observation(&self, station: &str) -> Result<Observation, ClientError>;
}

#[derive(Debug)]
pub struct MetarClient {
    client: Client,
    base_url: Url,
}

impl MetarClient {
    const USER_AGENT: &'static str = "metar_exporter Prometheus exporter (https://github.com/56quarters/metar_exporter)";
    const JSON_RESPONSE: &'static str = "application/json";

    pub fn new(client: Client, base_url: &str) -> Self {
        MetarClient {
            client,
            // TODO(56quarters): Handle this better
            base_url: Url::parse(base_url).unwrap(),
        }
    }

    async fn make_request<S: Into<String>>(&self, station: S, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::JSON_RESPONSE)
            .send()
            .await
            .map_err(ClientError::Internal)?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else if status == StatusCode::NOT_FOUND {
            Err(ClientError::InvalidStation(station.into()))
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }

    fn observation_url(&self, station: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            url.path_segments_mut()
                .map(|mut p| {
                    p.clear().push("api").push("data").push("metar");
                })
                .expect("unable to modify observation URL path segments");
        }

        url.query_pairs_mut()
            .append_pair("ids", station)
            .append_pair("format", "json");

        url
    }
}

#[async_trait]
impl ObservationSource for MetarClient {
    async fn observation(&self, station: &str) -> Result<Observation, ClientError> {
        let request_url = self.observation_url(station);
        tracing::debug!(message = "making latest observation request", url = %request_url);

        let res = self.make_request(station, request_url).await?;
        let mut observations = res.json::<Vec<Observation>>().await.map_err(ClientError::Internal)?;

        // The API emits an empty array for stations it doesn't know about
        // or that haven't reported recently, not a 404.
        if observations.is_empty() {
            return Err(ClientError::NoObservation(station.to_owned()));
        }

        Ok(observations.swap_remove(0))
    }
}

/// A single decoded METAR observation, in the units stations report:
/// temperatures in celsius, wind speed in knots, visibility in statute
/// miles, altimeter setting in inches of mercury.
#[derive(Serialize, Deserialize, Debug)]
pub struct Observation {
    #[serde(alias = "icaoId")]
    pub station_id: String,
    #[serde(alias = "obsTime")]
    pub observation_time: i64,
    #[serde(alias = "temp")]
    pub temperature: f64,
    #[serde(alias = "dewp")]
    pub dewpoint: f64,
    #[serde(alias = "wdir", deserialize_with = "wind_direction_degrees")]
    pub wind_direction: f64,
    #[serde(alias = "wspd")]
    pub wind_speed: f64,
    #[serde(alias = "visib", deserialize_with = "visibility_miles")]
    pub visibility: f64,
    #[serde(alias = "altim")]
    pub altimeter: f64,
    #[serde(alias = "clouds", default)]
    pub clouds: Vec<CloudLayer>,
}

impl Observation {
    /// Sky cover code of the lowest reported cloud layer, if any.
    pub fn sky_cover(&self) -> Option<&str> {
        self.clouds.first().map(|c| c.cover.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CloudLayer {
    #[serde(alias = "cover")]
    pub cover: String,
    #[serde(alias = "base")]
    pub base: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Stations report `VRB` instead of a number of degrees when the wind
/// direction is variable. Variable wind is exported as 0 degrees.
fn wind_direction_degrees<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) if s == "VRB" => Ok(0.0),
        NumberOrText::Text(s) => Err(de::Error::custom(format!("unexpected wind direction {:?}", s))),
    }
}

/// Visibility above 10 statute miles is reported as the string `10+`.
fn visibility_miles<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s.trim_end_matches('+').trim().parse().map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod test {
    use super::{MetarClient, Observation};
    use reqwest::Client;

    #[test]
    fn test_observation_url() {
        let client = MetarClient::new(Client::new(), "https://aviationweather.gov/");
        let url = client.observation_url("KBOS");
        assert_eq!(
            "https://aviationweather.gov/api/data/metar?ids=KBOS&format=json",
            url.as_str()
        );
    }

    #[test]
    fn test_observation_deserialize() {
        let json = r#"{
            "icaoId": "KBOS",
            "obsTime": 1693231200,
            "temp": 21.1,
            "dewp": 15.6,
            "wdir": 230,
            "wspd": 10,
            "visib": 9.0,
            "altim": 29.92,
            "clouds": [{"cover": "BKN", "base": 5500}, {"cover": "OVC", "base": 9000}]
        }"#;

        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!("KBOS", obs.station_id);
        assert_eq!(1693231200, obs.observation_time);
        assert_eq!(230.0, obs.wind_direction);
        assert_eq!(10.0, obs.wind_speed);
        assert_eq!(9.0, obs.visibility);
        assert_eq!(29.92, obs.altimeter);
        assert_eq!(Some("BKN"), obs.sky_cover());
    }

    #[test]
    fn test_observation_deserialize_variable_wind() {
        let json = r#"{
            "icaoId": "EDDF",
            "obsTime": 1693231200,
            "temp": 18.0,
            "dewp": 12.0,
            "wdir": "VRB",
            "wspd": 2,
            "visib": "10+",
            "altim": 30.05,
            "clouds": []
        }"#;

        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(0.0, obs.wind_direction);
        assert_eq!(10.0, obs.visibility);
        assert_eq!(None, obs.sky_cover());
    }

    #[test]
    fn test_observation_deserialize_missing_clouds() {
        let json = r#"{
            "icaoId": "KJFK",
            "obsTime": 1693231200,
            "temp": 23.3,
            "dewp": 17.2,
            "wdir": 180,
            "wspd": 8,
            "visib": 10.0,
            "altim": 29.98
        }"#;

        let obs: Observation = serde_json::from_str(json).unwrap();
        assert!(obs.clouds.is_empty());
        assert_eq!(None, obs.sky_cover());
    }

    #[test]
    fn test_observation_deserialize_bad_wind_direction() {
        let json = r#"{
            "icaoId": "KJFK",
            "obsTime": 1693231200,
            "temp": 23.3,
            "dewp": 17.2,
            "wdir": "NNE",
            "wspd": 8,
            "visib": 10.0,
            "altim": 29.98
        }"#;

        let res = serde_json::from_str::<Observation>(json);
        assert!(res.is_err());
    }
}
