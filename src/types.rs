//! Core types: errors, table names and the in-memory table wrapper.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error types for SkyFlow operations.
#[derive(Error, Debug)]
pub enum SkyflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Data conversion error: {0}")]
    DataConversion(String),

    #[error("Mandatory table {0} is unavailable or empty")]
    MandatoryTable(SkyTable),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PolarsError> for SkyflowError {
    fn from(e: PolarsError) -> Self {
        SkyflowError::DataConversion(e.to_string())
    }
}

/// Result type alias for SkyFlow operations.
pub type Result<T> = std::result::Result<T, SkyflowError>;

/// The seven tables of the SkyFlow database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkyTable {
    /// Aircraft registry
    Aircraft,
    /// Active flights
    Flights,
    /// Simulated routes
    Routes,
    /// Forbidden (no-fly) zones
    Zones,
    /// Real-time weather samples
    Weather,
    /// Critical alerts
    Alerts,
    /// Air traffic history
    History,
}

impl SkyTable {
    /// All tables, in load order.
    pub const ALL: [SkyTable; 7] = [
        SkyTable::Aircraft,
        SkyTable::Flights,
        SkyTable::Routes,
        SkyTable::Zones,
        SkyTable::Weather,
        SkyTable::Alerts,
        SkyTable::History,
    ];

    /// Get the physical table name.
    pub fn table_name(&self) -> &'static str {
        match self {
            SkyTable::Aircraft => "tb_aeronaves",
            SkyTable::Flights => "tb_voos_ativos",
            SkyTable::Routes => "tb_rotas_simuladas",
            SkyTable::Zones => "tb_zonas_proibidas",
            SkyTable::Weather => "tb_clima_tempo_real",
            SkyTable::Alerts => "tb_alertas_criticos",
            SkyTable::History => "tb_historico_malha_aerea",
        }
    }

    /// Whether a render cycle cannot proceed without this table.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, SkyTable::Aircraft | SkyTable::Flights)
    }
}

impl fmt::Display for SkyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Flight table columns (`tb_voos_ativos`).
pub mod flight_columns {
    pub const ID: &str = "id_voo";
    pub const AIRCRAFT_ID: &str = "id_aeronave";
    pub const STATUS: &str = "status_voo";
    pub const ORIGIN_LAT: &str = "origem_latitude";
    pub const ORIGIN_LON: &str = "origem_longitude";
    pub const DEST_LAT: &str = "destino_latitude";
    pub const DEST_LON: &str = "destino_longitude";
    pub const ALTITUDE: &str = "altitude_atual";
    pub const SPEED: &str = "velocidade_atual";
    pub const START_TIME: &str = "hora_inicio";
    pub const EXPECTED_ARRIVAL: &str = "hora_prevista_chegada";
}

/// Aircraft table columns (`tb_aeronaves`).
pub mod aircraft_columns {
    pub const ID: &str = "id_aeronave";
    pub const MODEL_NAME: &str = "nome_modelo";
}

/// Forbidden zone table columns (`tb_zonas_proibidas`).
pub mod zone_columns {
    pub const NAME: &str = "nome_zona";
    pub const TYPE: &str = "tipo_zona";
    pub const MAX_ALTITUDE: &str = "altitude_maxima_permitida";
    pub const AREA: &str = "poligono_area_geojson";
}

/// Weather table columns (`tb_clima_tempo_real`).
pub mod weather_columns {
    pub const LAT: &str = "latitude";
    pub const LON: &str = "longitude";
    pub const CONDITION: &str = "condicao_climatica";
    pub const RISK_LEVEL: &str = "risco_climatico";
    pub const TEMPERATURE: &str = "temperatura_c";
    pub const HUMIDITY: &str = "umidade_relativa";
    pub const WIND_SPEED: &str = "velocidade_vento";
    pub const TIMESTAMP: &str = "data_hora";
}

/// Wrapper around a Polars DataFrame holding one loaded table.
#[derive(Debug, Clone)]
pub struct Table {
    df: DataFrame,
}

impl Table {
    /// Create a Table from a Polars DataFrame.
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            df: DataFrame::empty(),
        }
    }

    /// Get the underlying DataFrame.
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Consume and return the underlying DataFrame.
    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Get column names.
    pub fn columns(&self) -> Vec<String> {
        self.df.get_column_names().iter().map(|s| s.to_string()).collect()
    }

    /// Check whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    /// Export to CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        CsvWriter::new(&mut file).finish(&mut self.df.clone())?;
        Ok(())
    }

    /// Export to Parquet file.
    pub fn to_parquet(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        ParquetWriter::new(&mut file).finish(&mut self.df.clone())?;
        Ok(())
    }

    /// Load from Parquet file.
    pub fn from_parquet(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let df = ParquetReader::new(file).finish()?;
        Ok(Self { df })
    }

    /// Load from CSV file (with header row).
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
            .finish()?;
        Ok(Self { df })
    }
}

impl From<DataFrame> for Table {
    fn from(df: DataFrame) -> Self {
        Self::new(df)
    }
}
