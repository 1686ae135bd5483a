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

//! Conversions from the units used in raw METAR observations to the units
//! emitted as metrics.

/// Upper bounds, in knots, for Beaufort forces 0 through 11. Anything at or
/// above the last entry is force 12.
const BEAUFORT_KTS: [f64; 12] = [1.0, 4.0, 7.0, 11.0, 17.0, 22.0, 28.0, 34.0, 41.0, 48.0, 56.0, 64.0];

/// Convert a speed in knots to kilometers per hour.
pub fn kts_to_kmh(kts: f64) -> f64 {
    kts * 1.852
}

/// Convert a distance in statute miles to kilometers.
pub fn statute_miles_to_km(miles: f64) -> f64 {
    miles * 1.609344
}

/// Convert a pressure in inches of mercury to hectopascals.
pub fn inhg_to_hpa(inhg: f64) -> f64 {
    inhg * 33.8639
}

/// Convert a wind speed in knots to a force on the Beaufort scale (0-12).
pub fn kts_to_beaufort(kts: f64) -> u8 {
    BEAUFORT_KTS.iter().position(|b| kts < *b).unwrap_or(12) as u8
}

/// Sky cover reported by a station for a single cloud layer.
///
/// METAR reports use a handful of codes for how much of the sky a cloud
/// layer obscures, in eighths (oktas). Codes that mean "no significant
/// cloud" all collapse to `Clear`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkyCover {
    Clear,
    Few,
    Scattered,
    Broken,
    Overcast,
}

impl SkyCover {
    /// Parse a METAR sky cover code, `None` if the code isn't one we emit
    /// a value for (vertical visibility, missing data markers, and so on).
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "SKC" | "CLR" | "NSC" | "CAVOK" => Some(SkyCover::Clear),
            "FEW" => Some(SkyCover::Few),
            "SCT" => Some(SkyCover::Scattered),
            "BKN" => Some(SkyCover::Broken),
            "OVC" => Some(SkyCover::Overcast),
            _ => None,
        }
    }

    /// Fraction of the sky covered, 0 (clear) to 1 (full cover).
    pub fn fraction(&self) -> f64 {
        match self {
            SkyCover::Clear => 0.0,
            SkyCover::Few => 2.0 / 8.0,
            SkyCover::Scattered => 4.0 / 8.0,
            SkyCover::Broken => 7.0 / 8.0,
            SkyCover::Overcast => 1.0,
        }
    }
}
