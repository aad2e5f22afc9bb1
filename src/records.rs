//! Typed, read-only projections of table rows.
//!
//! Rows are read through [`RowView::get`], which never fails: every field
//! comes back as a [`Cell`] that says whether the column existed, whether
//! the value was null, and whether it could be converted.

use crate::types::{aircraft_columns, flight_columns, weather_columns, zone_columns, Table};

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Placeholder shown for missing values.
pub const UNKNOWN: &str = "unknown";

/// A field read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell<T> {
    /// The column does not exist in the table.
    Absent,
    /// The column exists but the value is null.
    Null,
    /// The value exists but could not be converted; holds its text.
    Invalid(String),
    Value(T),
}

impl<T> Cell<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Get the value or `default`.
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.value().cloned().unwrap_or(default)
    }

    /// Get the value, or the reason this row cannot use it.
    pub fn require(&self, field: &'static str) -> Result<&T, SkipReason> {
        match self {
            Cell::Value(v) => Ok(v),
            Cell::Absent | Cell::Null => Err(SkipReason::Missing(field)),
            Cell::Invalid(raw) => Err(SkipReason::Invalid {
                field,
                raw: raw.clone(),
            }),
        }
    }
}

impl<T: fmt::Display> Cell<T> {
    /// Render the value, or `default` when there is none.
    pub fn display_or(&self, default: &str) -> String {
        match self {
            Cell::Value(v) => v.to_string(),
            _ => default.to_string(),
        }
    }
}

/// Why a row was left out of an overlay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {raw}")]
    Invalid { field: &'static str, raw: String },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("flight {0} not found")]
    FlightNotFound(i64),
}

/// Conversion from a Polars value into a cell value.
pub trait CellValue: Sized {
    fn from_any(value: &AnyValue<'_>) -> Option<Self>;
}

impl CellValue for f64 {
    fn from_any(value: &AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::String(s) => s.trim().parse().ok(),
            AnyValue::StringOwned(s) => s.trim().parse().ok(),
            AnyValue::Boolean(_) => None,
            other => other.extract::<f64>(),
        }
    }
}

impl CellValue for i64 {
    fn from_any(value: &AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::String(s) => s.trim().parse().ok(),
            AnyValue::StringOwned(s) => s.trim().parse().ok(),
            AnyValue::Boolean(_) => None,
            AnyValue::Float64(f) => (f.fract() == 0.0).then_some(*f as i64),
            AnyValue::Float32(f) => (f.fract() == 0.0).then_some(*f as i64),
            other => other.extract::<i64>(),
        }
    }
}

impl CellValue for String {
    fn from_any(value: &AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::String(s) => Some(s.to_string()),
            AnyValue::StringOwned(s) => Some(s.to_string()),
            other => Some(other.to_string()),
        }
    }
}

/// One row of a DataFrame.
#[derive(Clone, Copy)]
pub struct RowView<'a> {
    frame: &'a DataFrame,
    index: usize,
}

impl<'a> RowView<'a> {
    pub fn new(frame: &'a DataFrame, index: usize) -> Self {
        Self { frame, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Read a field. This is the only way records touch the DataFrame.
    pub fn get<T: CellValue>(&self, column: &str) -> Cell<T> {
        let Ok(col) = self.frame.column(column) else {
            return Cell::Absent;
        };

        match col.get(self.index) {
            Err(_) => Cell::Absent,
            Ok(AnyValue::Null) => Cell::Null,
            Ok(value) => match T::from_any(&value) {
                Some(v) => Cell::Value(v),
                None => Cell::Invalid(value.to_string()),
            },
        }
    }
}

/// Build a record from a row.
pub trait FromRow {
    fn from_row(row: &RowView<'_>) -> Self;
}

/// Typed rows of one table, with the table's column names.
#[derive(Debug, Clone)]
pub struct Records<T> {
    rows: Vec<T>,
    columns: Vec<String>,
}

impl<T: FromRow> Records<T> {
    pub fn from_table(table: &Table) -> Self {
        let frame = table.dataframe();
        let rows = (0..frame.height())
            .map(|i| T::from_row(&RowView::new(frame, i)))
            .collect();

        Self {
            rows,
            columns: table.columns(),
        }
    }
}

impl<T> Records<T> {
    pub fn new(rows: Vec<T>, columns: Vec<String>) -> Self {
        Self { rows, columns }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Keep the rows matching `predicate`; columns are unchanged.
    pub fn filtered(&self, predicate: impl Fn(&T) -> bool) -> Self
    where
        T: Clone,
    {
        Self {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }
}

impl<T> Default for Records<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            columns: Vec::new(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Records<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point from two cells. Both must hold finite numbers.
    pub fn from_cells(
        lat: &Cell<f64>,
        lat_field: &'static str,
        lon: &Cell<f64>,
        lon_field: &'static str,
    ) -> Result<Self, SkipReason> {
        let lat = finite(*lat.require(lat_field)?, lat_field)?;
        let lon = finite(*lon.require(lon_field)?, lon_field)?;
        Ok(Self { lat, lon })
    }
}

fn finite(value: f64, field: &'static str) -> Result<f64, SkipReason> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SkipReason::Invalid {
            field,
            raw: value.to_string(),
        })
    }
}

/// Format a timestamp cell as `YYYY-MM-DD HH:MM`, falling back to its raw text.
pub fn display_time(cell: &Cell<String>) -> String {
    let Some(raw) = cell.value() else {
        return UNKNOWN.to_string();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M").to_string();
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%Y-%m-%d %H:%M").to_string();
        }
    }

    raw.clone()
}

/// A row of `tb_voos_ativos`.
#[derive(Debug, Clone)]
pub struct Flight {
    pub row: usize,
    pub id: Cell<i64>,
    pub aircraft_id: Cell<i64>,
    pub status: Cell<String>,
    pub origin_lat: Cell<f64>,
    pub origin_lon: Cell<f64>,
    pub dest_lat: Cell<f64>,
    pub dest_lon: Cell<f64>,
    pub current_altitude: Cell<f64>,
    pub current_speed: Cell<f64>,
    pub start_time: Cell<String>,
    pub expected_arrival_time: Cell<String>,
}

impl Flight {
    pub fn origin(&self) -> Result<GeoPoint, SkipReason> {
        GeoPoint::from_cells(
            &self.origin_lat,
            flight_columns::ORIGIN_LAT,
            &self.origin_lon,
            flight_columns::ORIGIN_LON,
        )
    }

    pub fn destination(&self) -> Result<GeoPoint, SkipReason> {
        GeoPoint::from_cells(
            &self.dest_lat,
            flight_columns::DEST_LAT,
            &self.dest_lon,
            flight_columns::DEST_LON,
        )
    }

    /// Whether this flight carries the given id.
    pub fn has_id(&self, id: i64) -> bool {
        self.id.value() == Some(&id)
    }
}

impl FromRow for Flight {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            row: row.index(),
            id: row.get(flight_columns::ID),
            aircraft_id: row.get(flight_columns::AIRCRAFT_ID),
            status: row.get(flight_columns::STATUS),
            origin_lat: row.get(flight_columns::ORIGIN_LAT),
            origin_lon: row.get(flight_columns::ORIGIN_LON),
            dest_lat: row.get(flight_columns::DEST_LAT),
            dest_lon: row.get(flight_columns::DEST_LON),
            current_altitude: row.get(flight_columns::ALTITUDE),
            current_speed: row.get(flight_columns::SPEED),
            start_time: row.get(flight_columns::START_TIME),
            expected_arrival_time: row.get(flight_columns::EXPECTED_ARRIVAL),
        }
    }
}

/// A row of `tb_aeronaves`.
#[derive(Debug, Clone)]
pub struct Aircraft {
    pub row: usize,
    pub id: Cell<i64>,
    pub model_name: Cell<String>,
}

impl FromRow for Aircraft {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            row: row.index(),
            id: row.get(aircraft_columns::ID),
            model_name: row.get(aircraft_columns::MODEL_NAME),
        }
    }
}

/// A row of `tb_zonas_proibidas`. The area is GeoJSON text.
#[derive(Debug, Clone)]
pub struct ForbiddenZone {
    pub row: usize,
    pub name: Cell<String>,
    pub zone_type: Cell<String>,
    pub max_altitude: Cell<f64>,
    pub area: Cell<String>,
}

impl FromRow for ForbiddenZone {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            row: row.index(),
            name: row.get(zone_columns::NAME),
            zone_type: row.get(zone_columns::TYPE),
            max_altitude: row.get(zone_columns::MAX_ALTITUDE),
            area: row.get(zone_columns::AREA),
        }
    }
}

/// A row of `tb_clima_tempo_real`.
#[derive(Debug, Clone)]
pub struct WeatherSample {
    pub row: usize,
    pub lat: Cell<f64>,
    pub lon: Cell<f64>,
    pub condition: Cell<String>,
    pub risk_level: Cell<String>,
    pub temperature_c: Cell<f64>,
    pub humidity_pct: Cell<f64>,
    pub wind_speed: Cell<f64>,
    pub timestamp: Cell<String>,
}

impl WeatherSample {
    pub fn position(&self) -> Result<GeoPoint, SkipReason> {
        GeoPoint::from_cells(
            &self.lat,
            weather_columns::LAT,
            &self.lon,
            weather_columns::LON,
        )
    }
}

impl FromRow for WeatherSample {
    fn from_row(row: &RowView<'_>) -> Self {
        Self {
            row: row.index(),
            lat: row.get(weather_columns::LAT),
            lon: row.get(weather_columns::LON),
            condition: row.get(weather_columns::CONDITION),
            risk_level: row.get(weather_columns::RISK_LEVEL),
            temperature_c: row.get(weather_columns::TEMPERATURE),
            humidity_pct: row.get(weather_columns::HUMIDITY),
            wind_speed: row.get(weather_columns::WIND_SPEED),
            timestamp: row.get(weather_columns::TIMESTAMP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_from_row() {
        let df = df!(
            "id_voo" => [Some(1i64), None],
            "origem_latitude" => [Some("-23.5"), Some("north")],
            "status_voo" => [Some("EM ROTA"), None],
        )
        .unwrap();

        let first = RowView::new(&df, 0);
        assert_eq!(first.get::<i64>("id_voo"), Cell::Value(1));
        assert_eq!(first.get::<f64>("origem_latitude"), Cell::Value(-23.5));
        assert_eq!(first.get::<String>("status_voo"), Cell::Value("EM ROTA".into()));
        assert_eq!(first.get::<f64>("destino_latitude"), Cell::Absent);

        let second = RowView::new(&df, 1);
        assert_eq!(second.get::<i64>("id_voo"), Cell::Null);
        assert!(matches!(second.get::<f64>("origem_latitude"), Cell::Invalid(_)));
    }

    #[test]
    fn test_get_or_and_display_or() {
        let cell: Cell<f64> = Cell::Null;
        assert_eq!(cell.get_or(0.0), 0.0);
        assert_eq!(cell.display_or(UNKNOWN), "unknown");
        assert_eq!(Cell::Value(120.5).display_or(UNKNOWN), "120.5");
    }

    #[test]
    fn test_require_reasons() {
        assert_eq!(
            Cell::<f64>::Absent.require("latitude"),
            Err(SkipReason::Missing("latitude"))
        );
        assert!(matches!(
            Cell::<f64>::Invalid("abc".into()).require("latitude"),
            Err(SkipReason::Invalid { field: "latitude", .. })
        ));
    }

    #[test]
    fn test_integer_ids_from_floats() {
        let df = df!("id_voo" => [3.0f64, 3.5]).unwrap();
        assert_eq!(RowView::new(&df, 0).get::<i64>("id_voo"), Cell::Value(3));
        assert!(matches!(RowView::new(&df, 1).get::<i64>("id_voo"), Cell::Invalid(_)));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let lat = Cell::Value(f64::NAN);
        let lon = Cell::Value(10.0);
        assert!(GeoPoint::from_cells(&lat, "lat", &lon, "lon").is_err());
    }

    #[test]
    fn test_flight_records() {
        let table = Table::new(
            df!(
                "id_voo" => [1i64, 2],
                "origem_latitude" => [Some(-23.5), None],
                "origem_longitude" => [Some(-46.6), Some(-46.7)],
            )
            .unwrap(),
        );

        let flights: Records<Flight> = Records::from_table(&table);
        assert_eq!(flights.len(), 2);
        assert!(flights.has_column("id_voo"));
        assert!(!flights.has_column("id_aeronave"));
        assert_eq!(flights.as_slice()[0].origin(), Ok(GeoPoint::new(-23.5, -46.6)));
        assert_eq!(
            flights.as_slice()[1].origin(),
            Err(SkipReason::Missing("origem_latitude"))
        );
        assert!(flights.as_slice()[0].aircraft_id.is_absent());
    }

    #[test]
    fn test_display_time() {
        assert_eq!(
            display_time(&Cell::Value("2025-03-01T14:05:00+00:00".into())),
            "2025-03-01 14:05"
        );
        assert_eq!(
            display_time(&Cell::Value("2025-03-01 14:05:09".into())),
            "2025-03-01 14:05"
        );
        assert_eq!(display_time(&Cell::Value("soon".into())), "soon");
        assert_eq!(display_time(&Cell::Null), UNKNOWN);
    }
}
