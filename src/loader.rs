//! Loading the SkyFlow tables from a [`TableSource`].

use crate::source::TableSource;
use crate::types::{Result, SkyTable, SkyflowError, Table};

use std::collections::BTreeMap;
use tracing::{info, warn};

/// A table that failed to load and was replaced by an empty one.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub table: SkyTable,
    pub message: String,
}

/// All tables loaded for one render cycle.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: BTreeMap<SkyTable, Table>,
    warnings: Vec<LoadWarning>,
}

impl TableSet {
    /// Build a set directly from tables; anything not given is empty.
    pub fn from_tables(tables: impl IntoIterator<Item = (SkyTable, Table)>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
            warnings: Vec::new(),
        }
    }

    /// Get a table. Missing tables read as empty.
    pub fn get(&self, table: SkyTable) -> Table {
        self.tables.get(&table).cloned().unwrap_or_else(Table::empty)
    }

    /// Borrow a table if it was loaded.
    pub fn table(&self, table: SkyTable) -> Option<&Table> {
        self.tables.get(&table)
    }

    /// Per-table load failures.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Fail if flights or aircraft is unavailable or empty.
    pub fn ensure_mandatory(&self) -> Result<()> {
        for table in SkyTable::ALL.iter().filter(|t| t.is_mandatory()) {
            if self.tables.get(table).map_or(true, Table::is_empty) {
                return Err(SkyflowError::MandatoryTable(*table));
            }
        }
        Ok(())
    }

    /// Iterate over loaded tables.
    pub fn iter(&self) -> impl Iterator<Item = (SkyTable, &Table)> {
        self.tables.iter().map(|(k, v)| (*k, v))
    }
}

/// Load every SkyFlow table, one after another.
///
/// A table that fails to load is logged and substituted with an empty table;
/// this function itself never fails. Call [`TableSet::ensure_mandatory`] to
/// decide whether the result is usable.
pub async fn load_tables<S: TableSource>(source: &S) -> TableSet {
    let mut set = TableSet::default();

    for table in SkyTable::ALL {
        match source.fetch_table(table).await {
            Ok(data) => {
                info!(table = %table, rows = data.len(), "loaded table");
                set.tables.insert(table, data);
            }
            Err(e) => {
                warn!(table = %table, error = %e, "failed to load table");
                set.warnings.push(LoadWarning {
                    table,
                    message: e.to_string(),
                });
                set.tables.insert(table, Table::empty());
            }
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use polars::prelude::*;

    fn aircraft() -> Table {
        Table::new(df!("id_aeronave" => [1i64], "nome_modelo" => ["EVE-100"]).unwrap())
    }

    fn flights() -> Table {
        Table::new(df!("id_voo" => [10i64], "id_aeronave" => [1i64]).unwrap())
    }

    #[tokio::test]
    async fn test_failed_table_becomes_empty() {
        let source = MemorySource::new()
            .with_table(SkyTable::Aircraft, aircraft())
            .with_table(SkyTable::Flights, flights());

        let set = load_tables(&source).await;

        assert_eq!(set.warnings().len(), 5);
        assert!(set.get(SkyTable::Zones).is_empty());
        assert!(set.table(SkyTable::Weather).is_some());
        assert_eq!(set.get(SkyTable::Flights).len(), 1);
        assert!(set.ensure_mandatory().is_ok());
    }

    #[tokio::test]
    async fn test_missing_mandatory_table_is_fatal() {
        let source = MemorySource::new().with_table(SkyTable::Aircraft, aircraft());

        let set = load_tables(&source).await;

        match set.ensure_mandatory() {
            Err(SkyflowError::MandatoryTable(table)) => assert_eq!(table, SkyTable::Flights),
            other => panic!("expected mandatory table error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_mandatory_table_is_fatal() {
        let set = TableSet::from_tables([
            (SkyTable::Aircraft, Table::empty()),
            (SkyTable::Flights, flights()),
        ]);
        assert!(matches!(
            set.ensure_mandatory(),
            Err(SkyflowError::MandatoryTable(SkyTable::Aircraft))
        ));
    }
}
