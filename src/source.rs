//! Table sources: the Supabase REST client and offline alternatives.
//!
//! Every source answers one question, "give me table X", through
//! [`TableSource`]. Sources are constructed once and passed by reference
//! into [`crate::loader::load_tables`].

use crate::config::Config;
use crate::types::{Result, SkyTable, SkyflowError, Table};

use polars::prelude::*;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Read-only access to the SkyFlow tables.
#[allow(async_fn_in_trait)]
pub trait TableSource {
    /// Fetch every row of `table`.
    async fn fetch_table(&self, table: SkyTable) -> Result<Table>;
}

/// Supabase (PostgREST) client.
pub struct Supabase {
    client: Client,
    base_url: Url,
    api_key: String,
    schema: String,
    page_size: usize,
}

impl Supabase {
    /// Create a new client, loading config from the default location.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::with_config(&config)
    }

    /// Create a new client with the given config.
    pub fn with_config(config: &Config) -> Result<Self> {
        if config.page_size == 0 {
            return Err(SkyflowError::Config("page_size must be greater than zero".into()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("skyflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base = config.require_url()?.trim_end_matches('/').to_string();
        base.push_str("/rest/v1/");

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            api_key: config.require_api_key()?.to_string(),
            schema: config.schema.clone(),
            page_size: config.page_size,
        })
    }

    /// Endpoint URL for a table (`{url}/rest/v1/{table}?select=*`).
    pub fn table_url(&self, table: SkyTable) -> Result<Url> {
        let mut url = self.base_url.join(table.table_name())?;
        url.query_pairs_mut().append_pair("select", "*");
        Ok(url)
    }

    /// Fetch one page of rows (`Range: start-end`, inclusive).
    async fn fetch_page(&self, url: &Url, start: usize) -> Result<Vec<Map<String, Value>>> {
        let end = start + self.page_size - 1;
        let response = self
            .client
            .get(url.clone())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Accept-Profile", &self.schema)
            .header("Range-Unit", "items")
            .header("Range", format!("{}-{}", start, end))
            .send()
            .await?;

        let status = response.status();
        // PostgREST answers a range past the last row with 416
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SkyflowError::Query(format!("{}: {}", status, body.trim())));
        }

        Ok(response.json().await?)
    }
}

impl TableSource for Supabase {
    async fn fetch_table(&self, table: SkyTable) -> Result<Table> {
        let url = self.table_url(table)?;
        let mut all_rows: Vec<Map<String, Value>> = Vec::new();

        // The server may cap a page below page_size (PostgREST max-rows), so
        // only an empty page ends the table
        loop {
            let page = self.fetch_page(&url, all_rows.len()).await?;
            if page.is_empty() {
                break;
            }
            all_rows.extend(page);
            debug!(table = %table, rows = all_rows.len(), "fetched page");
        }

        Ok(Table::new(rows_to_dataframe(all_rows)?))
    }
}

/// Snapshot directory holding one `<table>.parquet` or `<table>.csv` per table.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl TableSource for DirectorySource {
    async fn fetch_table(&self, table: SkyTable) -> Result<Table> {
        let parquet = self.dir.join(format!("{}.parquet", table.table_name()));
        if parquet.exists() {
            return Table::from_parquet(parquet);
        }

        let csv = self.dir.join(format!("{}.csv", table.table_name()));
        if csv.exists() {
            return Table::from_csv(csv);
        }

        Err(SkyflowError::Query(format!(
            "No snapshot for {} in {}",
            table,
            self.dir.display()
        )))
    }
}

/// Tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<SkyTable, Table>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table.
    pub fn with_table(mut self, table: SkyTable, data: impl Into<Table>) -> Self {
        self.tables.insert(table, data.into());
        self
    }
}

impl TableSource for MemorySource {
    async fn fetch_table(&self, table: SkyTable) -> Result<Table> {
        self.tables
            .get(&table)
            .cloned()
            .ok_or_else(|| SkyflowError::Query(format!("relation \"{}\" does not exist", table)))
    }
}

static NULL: Value = Value::Null;

/// Inferred column type for JSON rows.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;

    for value in values {
        let this = match value {
            Value::Null => continue,
            Value::Bool(_) => ColumnKind::Bool,
            Value::Number(n) if n.is_i64() => ColumnKind::Int,
            Value::Number(_) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        };

        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }

    kind.unwrap_or(ColumnKind::Text)
}

/// Convert JSON row objects to a Polars DataFrame.
///
/// Columns are the union of keys across rows. Nested values (jsonb) are kept
/// as their JSON text.
pub fn rows_to_dataframe(rows: Vec<Map<String, Value>>) -> Result<DataFrame> {
    if rows.is_empty() {
        return Ok(DataFrame::empty());
    }

    let names: BTreeSet<&str> = rows.iter().flat_map(|row| row.keys().map(String::as_str)).collect();
    let mut columns: Vec<Column> = Vec::with_capacity(names.len());

    for name in names {
        let values: Vec<&Value> = rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&NULL))
            .collect();

        let column = match infer_kind(values.iter().copied()) {
            ColumnKind::Int => {
                let data: Vec<Option<i64>> = values.iter().map(|v| v.as_i64()).collect();
                Column::new(name.into(), data)
            }
            ColumnKind::Float => {
                let data: Vec<Option<f64>> = values.iter().map(|v| v.as_f64()).collect();
                Column::new(name.into(), data)
            }
            ColumnKind::Bool => {
                let data: Vec<Option<bool>> = values.iter().map(|v| v.as_bool()).collect();
                Column::new(name.into(), data)
            }
            ColumnKind::Text => {
                let data: Vec<Option<String>> = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect();
                Column::new(name.into(), data)
            }
        };

        columns.push(column);
    }

    DataFrame::new(columns).map_err(|e| SkyflowError::DataConversion(e.to_string()))
}
