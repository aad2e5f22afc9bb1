//! Map primitives and the per-table overlay builders.
//!
//! Each builder turns every row into `Result<Primitive, SkipReason>` and
//! keeps the `Ok`s; the reasons are kept alongside for diagnostics.

use super::style::{
    color_for_status, Color, Icon, PathStyle, FLIGHT_MARKER_FILL_OPACITY, FLIGHT_MARKER_RADIUS,
    WEATHER_ICON, ZONE_STYLE,
};
use crate::records::{
    display_time, Cell, Flight, ForbiddenZone, GeoPoint, SkipReason, WeatherSample, UNKNOWN,
};
use crate::types::zone_columns;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Label/value lines shown when a primitive is clicked.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Popup {
    pub rows: Vec<PopupRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

impl Popup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push(PopupRow {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Value of the first row with this label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Something drawn on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Marker {
        position: GeoPoint,
        icon: Icon,
        tooltip: String,
        popup: Popup,
    },
    CircleMarker {
        position: GeoPoint,
        radius: u8,
        color: Color,
        fill_opacity: f64,
        tooltip: String,
        popup: Popup,
    },
    Area {
        geometry: ZoneGeometry,
        style: PathStyle,
        tooltip: String,
        popup: Popup,
    },
    Line {
        path: Vec<GeoPoint>,
        color: Color,
        weight: u8,
        tooltip: String,
        popup: Popup,
    },
}

impl Primitive {
    pub fn popup(&self) -> &Popup {
        match self {
            Primitive::Marker { popup, .. }
            | Primitive::CircleMarker { popup, .. }
            | Primitive::Area { popup, .. }
            | Primitive::Line { popup, .. } => popup,
        }
    }

    pub fn tooltip(&self) -> &str {
        match self {
            Primitive::Marker { tooltip, .. }
            | Primitive::CircleMarker { tooltip, .. }
            | Primitive::Area { tooltip, .. }
            | Primitive::Line { tooltip, .. } => tooltip,
        }
    }
}

/// A GeoJSON ring: `[lon, lat]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Polygon geometry of a forbidden zone. Serializes as GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum ZoneGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

impl ZoneGeometry {
    /// Parse GeoJSON text: a Polygon, a MultiPolygon, or a Feature holding one.
    pub fn parse(text: &str) -> Result<Self, SkipReason> {
        let invalid = |e: serde_json::Error| SkipReason::InvalidGeometry(e.to_string());

        let mut value: Value = serde_json::from_str(text).map_err(invalid)?;
        if value.get("type").and_then(Value::as_str) == Some("Feature") {
            value = value.get_mut("geometry").map(Value::take).unwrap_or(Value::Null);
        }

        let raw: RawGeometry = serde_json::from_value(value).map_err(invalid)?;
        match raw {
            RawGeometry::Polygon { coordinates } => Ok(ZoneGeometry::Polygon(polygon(coordinates)?)),
            RawGeometry::MultiPolygon { coordinates } => {
                if coordinates.is_empty() {
                    return Err(SkipReason::InvalidGeometry("empty multipolygon".into()));
                }
                let polygons = coordinates
                    .into_iter()
                    .map(polygon)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ZoneGeometry::MultiPolygon(polygons))
            }
        }
    }

    /// Number of polygons.
    pub fn polygon_count(&self) -> usize {
        match self {
            ZoneGeometry::Polygon(_) => 1,
            ZoneGeometry::MultiPolygon(polygons) => polygons.len(),
        }
    }
}

fn polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Vec<Ring>, SkipReason> {
    if rings.is_empty() {
        return Err(SkipReason::InvalidGeometry("polygon has no rings".into()));
    }
    rings.into_iter().map(ring).collect()
}

fn ring(positions: Vec<Vec<f64>>) -> Result<Ring, SkipReason> {
    if positions.len() < 4 {
        return Err(SkipReason::InvalidGeometry(format!(
            "ring needs at least 4 positions, got {}",
            positions.len()
        )));
    }

    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok([*lon, *lat]),
            _ => Err(SkipReason::InvalidGeometry(format!("bad position {:?}", p))),
        })
        .collect()
}

/// Primitives built from one table, and the rows left out.
#[derive(Debug, Clone, Default)]
pub struct OverlayBuild {
    pub primitives: Vec<Primitive>,
    pub skipped: Vec<(usize, SkipReason)>,
}

impl OverlayBuild {
    fn collect(results: impl Iterator<Item = (usize, Result<Primitive, SkipReason>)>) -> Self {
        let mut build = Self::default();
        for (row, result) in results {
            match result {
                Ok(primitive) => build.primitives.push(primitive),
                Err(reason) => build.skipped.push((row, reason)),
            }
        }
        build
    }
}

fn with_unit(cell: &Cell<f64>, unit: &str) -> String {
    match cell.value() {
        Some(v) => format!("{} {}", v, unit),
        None => UNKNOWN.to_string(),
    }
}

/// Filled polygon for one zone.
pub fn zone_primitive(zone: &ForbiddenZone) -> Result<Primitive, SkipReason> {
    let geometry = ZoneGeometry::parse(zone.area.require(zone_columns::AREA)?)?;
    let name = zone.name.display_or("Zone");
    let zone_type = zone.zone_type.display_or("Zone");

    let popup = Popup::new()
        .row("Zone", name.clone())
        .row("Type", zone_type.clone())
        .row("Max. allowed altitude", with_unit(&zone.max_altitude, "m"));

    Ok(Primitive::Area {
        geometry,
        style: ZONE_STYLE,
        tooltip: format!("{} ({})", name, zone_type),
        popup,
    })
}

/// Point marker for one weather sample.
pub fn weather_primitive(sample: &WeatherSample) -> Result<Primitive, SkipReason> {
    let position = sample.position()?;
    let condition = sample.condition.display_or(UNKNOWN);
    let risk = sample.risk_level.display_or(UNKNOWN);

    let popup = Popup::new()
        .row("Condition", condition.clone())
        .row("Risk level", risk.clone())
        .row("Temperature", with_unit(&sample.temperature_c, "°C"))
        .row("Humidity", with_unit(&sample.humidity_pct, "%"))
        .row("Wind", with_unit(&sample.wind_speed, "km/h"))
        .row("Date/time", display_time(&sample.timestamp));

    Ok(Primitive::Marker {
        position,
        icon: WEATHER_ICON,
        tooltip: format!("Weather: {} (Risk: {})", condition, risk),
        popup,
    })
}

/// Popup shared by the regular flight marker and the highlight primitives.
/// `point` names which end of the flight the primitive marks, if any.
pub fn flight_popup(flight: &Flight, point: Option<&str>) -> Popup {
    let mut popup = Popup::new().row("Flight ID", flight.id.display_or(UNKNOWN));
    if let Some(point) = point {
        popup = popup.row("Point", point);
    }

    popup
        .row("Status", flight.status.display_or(UNKNOWN))
        .row("Current altitude", with_unit(&flight.current_altitude, "m"))
        .row("Current speed", with_unit(&flight.current_speed, "km/h"))
        .row("Start", display_time(&flight.start_time))
        .row("Expected arrival", display_time(&flight.expected_arrival_time))
}

/// Circle marker at a flight's origin, colored by status.
pub fn flight_primitive(flight: &Flight) -> Result<Primitive, SkipReason> {
    let position = flight.origin()?;

    Ok(Primitive::CircleMarker {
        position,
        radius: FLIGHT_MARKER_RADIUS,
        color: color_for_status(flight.status.value().map(String::as_str)),
        fill_opacity: FLIGHT_MARKER_FILL_OPACITY,
        tooltip: format!(
            "Flight {} - {}",
            flight.id.display_or(UNKNOWN),
            flight.status.display_or(UNKNOWN)
        ),
        popup: flight_popup(flight, None),
    })
}

pub fn zones_overlay(zones: &[ForbiddenZone]) -> OverlayBuild {
    OverlayBuild::collect(zones.iter().map(|z| (z.row, zone_primitive(z))))
}

pub fn weather_overlay(samples: &[WeatherSample]) -> OverlayBuild {
    OverlayBuild::collect(samples.iter().map(|s| (s.row, weather_primitive(s))))
}

/// Flight markers, leaving out the selected flight (it is highlighted instead).
pub fn flights_overlay(flights: &[Flight], selected_flight_id: Option<i64>) -> OverlayBuild {
    OverlayBuild::collect(
        flights
            .iter()
            .filter(|f| !selected_flight_id.is_some_and(|id| f.has_id(id)))
            .map(|f| (f.row, flight_primitive(f))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Records;
    use crate::types::Table;
    use polars::prelude::*;

    const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[-46.7,-23.6],[-46.6,-23.6],[-46.6,-23.5],[-46.7,-23.5],[-46.7,-23.6]]]}"#;

    fn records<T: crate::records::FromRow>(df: DataFrame) -> Records<T> {
        Records::from_table(&Table::new(df))
    }

    #[test]
    fn test_parse_polygon() {
        let geometry = ZoneGeometry::parse(SQUARE).unwrap();
        match &geometry {
            ZoneGeometry::Polygon(rings) => assert_eq!(rings[0].len(), 5),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert_eq!(
            serde_json::to_value(&geometry).unwrap()["type"],
            serde_json::json!("Polygon")
        );
    }

    #[test]
    fn test_parse_feature_and_multipolygon() {
        let feature = format!(r#"{{"type":"Feature","properties":{{}},"geometry":{}}}"#, SQUARE);
        assert_eq!(ZoneGeometry::parse(&feature).unwrap().polygon_count(), 1);

        let multi = r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[1,0],[1,1],[0,0]]],[[[2,2],[3,2],[3,3,100],[2,2]]]]}"#;
        assert_eq!(ZoneGeometry::parse(multi).unwrap().polygon_count(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_geometry() {
        assert!(ZoneGeometry::parse("not json").is_err());
        assert!(ZoneGeometry::parse(r#"{"type":"Point","coordinates":[1,2]}"#).is_err());
        assert!(ZoneGeometry::parse(r#"{"type":"Polygon","coordinates":[[[0,0],[1,1]]]}"#).is_err());
        assert!(ZoneGeometry::parse(r#"{"type":"Polygon","coordinates":[]}"#).is_err());
        assert!(ZoneGeometry::parse("42").is_err());
    }

    #[test]
    fn test_zones_overlay_skips_malformed() {
        let zones = records::<ForbiddenZone>(
            df!(
                "nome_zona" => ["Congonhas", "Broken"],
                "tipo_zona" => ["Aeroporto", "Militar"],
                "altitude_maxima_permitida" => [Some(120.0), None],
                "poligono_area_geojson" => [SQUARE, "{not geojson"],
            )
            .unwrap(),
        );

        let build = zones_overlay(zones.as_slice());

        assert_eq!(build.primitives.len(), 1);
        assert_eq!(build.skipped.len(), 1);
        assert_eq!(build.skipped[0].0, 1);

        let zone = &build.primitives[0];
        assert_eq!(zone.tooltip(), "Congonhas (Aeroporto)");
        assert_eq!(zone.popup().get("Max. allowed altitude"), Some("120 m"));
        match zone {
            Primitive::Area { style, .. } => {
                assert_eq!(style.weight, 2);
                assert_eq!(style.fill_opacity, 0.3);
                assert_eq!(style.fill_color, Color::Red);
            }
            other => panic!("expected area, got {:?}", other),
        }
    }

    #[test]
    fn test_zone_without_geometry_column() {
        let zones = records::<ForbiddenZone>(df!("nome_zona" => ["Sem area"]).unwrap());
        let build = zones_overlay(zones.as_slice());
        assert!(build.primitives.is_empty());
        assert_eq!(build.skipped[0].1, SkipReason::Missing("poligono_area_geojson"));
    }

    #[test]
    fn test_weather_overlay_defaults() {
        let weather = records::<WeatherSample>(
            df!(
                "latitude" => [Some(-23.5), Some(-23.6)],
                "longitude" => [Some(-46.6), None],
                "condicao_climatica" => [Some("Chuva"), Some("Sol")],
            )
            .unwrap(),
        );

        let build = weather_overlay(weather.as_slice());

        assert_eq!(build.primitives.len(), 1);
        let popup = build.primitives[0].popup();
        assert_eq!(popup.get("Condition"), Some("Chuva"));
        assert_eq!(popup.get("Risk level"), Some(UNKNOWN));
        assert_eq!(popup.get("Temperature"), Some(UNKNOWN));
        assert_eq!(build.primitives[0].tooltip(), "Weather: Chuva (Risk: unknown)");
    }

    #[test]
    fn test_flights_overlay_excludes_selected() {
        let flights = records::<Flight>(
            df!(
                "id_voo" => [1i64, 2, 3],
                "status_voo" => ["EM ROTA", "ATRASADO", "FINALIZADO"],
                "origem_latitude" => [-23.5, -23.6, -23.7],
                "origem_longitude" => [-46.6, -46.7, -46.8],
            )
            .unwrap(),
        );

        assert_eq!(flights_overlay(flights.as_slice(), None).primitives.len(), 3);

        let build = flights_overlay(flights.as_slice(), Some(2));
        assert_eq!(build.primitives.len(), 2);
        assert!(build.skipped.is_empty());
        match &build.primitives[0] {
            Primitive::CircleMarker { color, radius, .. } => {
                assert_eq!(*color, Color::Blue);
                assert_eq!(*radius, 5);
            }
            other => panic!("expected circle marker, got {:?}", other),
        }
        assert_eq!(build.primitives[1].tooltip(), "Flight 3 - FINALIZADO");
    }

    #[test]
    fn test_flights_overlay_skips_missing_origin() {
        let flights = records::<Flight>(
            df!(
                "id_voo" => [1i64, 2],
                "origem_latitude" => [Some(-23.5), None],
                "origem_longitude" => [Some(-46.6), Some(-46.7)],
                "altitude_atual" => [Some(300.0), None],
            )
            .unwrap(),
        );

        let build = flights_overlay(flights.as_slice(), None);
        assert_eq!(build.primitives.len(), 1);
        assert_eq!(build.skipped.len(), 1);

        let popup = build.primitives[0].popup();
        assert_eq!(popup.get("Flight ID"), Some("1"));
        assert_eq!(popup.get("Current altitude"), Some("300 m"));
        assert_eq!(popup.get("Status"), Some(UNKNOWN));
    }
}
