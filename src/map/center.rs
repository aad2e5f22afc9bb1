//! Map center computation.
//!
//! The center is the first answer from an ordered chain of strategies:
//! flight endpoints, then weather sample positions, then a fixed point.

use crate::records::{Flight, GeoPoint, WeatherSample};

/// São Paulo city center.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: -23.5500,
    lon: -46.6330,
};

/// One tier of the center fallback chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CenterStrategy {
    /// Mean of every valid flight origin and destination.
    FlightEndpoints,
    /// Mean of every valid weather sample position.
    WeatherSamples,
    /// A fixed point.
    Fixed(GeoPoint),
}

impl CenterStrategy {
    /// The center this strategy proposes, if it has data to propose one.
    pub fn try_center(&self, flights: &[Flight], weather: &[WeatherSample]) -> Option<GeoPoint> {
        match self {
            CenterStrategy::FlightEndpoints => mean_point(
                flights
                    .iter()
                    .flat_map(|f| [f.origin().ok(), f.destination().ok()])
                    .flatten(),
            ),
            CenterStrategy::WeatherSamples => {
                mean_point(weather.iter().filter_map(|w| w.position().ok()))
            }
            CenterStrategy::Fixed(point) => Some(*point),
        }
    }
}

/// The default chain ending at `fallback`.
pub fn default_chain(fallback: GeoPoint) -> [CenterStrategy; 3] {
    [
        CenterStrategy::FlightEndpoints,
        CenterStrategy::WeatherSamples,
        CenterStrategy::Fixed(fallback),
    ]
}

/// Center of the map for these flights and weather samples, falling back to
/// [`DEFAULT_CENTER`].
pub fn compute_center(flights: &[Flight], weather: &[WeatherSample]) -> GeoPoint {
    compute_center_with(flights, weather, &default_chain(DEFAULT_CENTER))
}

/// Center from an explicit strategy chain. An exhausted chain yields
/// [`DEFAULT_CENTER`].
pub fn compute_center_with(
    flights: &[Flight],
    weather: &[WeatherSample],
    chain: &[CenterStrategy],
) -> GeoPoint {
    chain
        .iter()
        .find_map(|strategy| strategy.try_center(flights, weather))
        .unwrap_or(DEFAULT_CENTER)
}

fn mean_point(points: impl Iterator<Item = GeoPoint>) -> Option<GeoPoint> {
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat;
        lon += p.lon;
        n += 1;
    }

    (n > 0).then(|| GeoPoint::new(lat / n as f64, lon / n as f64))
}
