//! One render cycle: loaded tables, typed into records, rendered for a
//! selection.

use crate::loader::{load_tables, TableSet};
use crate::map::{build_map, MapOptions, RenderableMap};
use crate::records::{Aircraft, Flight, ForbiddenZone, Records, WeatherSample};
use crate::selection::{aircraft_options, flight_options, SelectOption, Selection};
use crate::source::TableSource;
use crate::types::{Result, SkyTable};

/// The tables the map needs, as typed records.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub aircraft: Records<Aircraft>,
    pub flights: Records<Flight>,
    pub zones: Records<ForbiddenZone>,
    pub weather: Records<WeatherSample>,
}

impl Dashboard {
    /// Type the loaded tables. Fails when flights or aircraft is empty.
    pub fn from_tables(tables: &TableSet) -> Result<Self> {
        tables.ensure_mandatory()?;

        Ok(Self {
            aircraft: Records::from_table(&tables.get(SkyTable::Aircraft)),
            flights: Records::from_table(&tables.get(SkyTable::Flights)),
            zones: Records::from_table(&tables.get(SkyTable::Zones)),
            weather: Records::from_table(&tables.get(SkyTable::Weather)),
        })
    }

    /// Load every table from `source` and type them.
    pub async fn load<S: TableSource>(source: &S) -> Result<Self> {
        Self::from_tables(&load_tables(source).await)
    }

    pub fn aircraft_options(&self) -> Vec<SelectOption> {
        aircraft_options(&self.aircraft)
    }

    pub fn flight_options(&self, aircraft_id: Option<i64>) -> Vec<SelectOption> {
        flight_options(&self.flights, aircraft_id)
    }

    /// Resolve the selection and build the map for it.
    pub fn render(&self, requested: Selection, options: &MapOptions) -> (Selection, RenderableMap) {
        let selection = requested.resolve(&self.aircraft, &self.flights);
        let map = build_map(
            &self.flights,
            &self.zones,
            &self.weather,
            selection.flight_id,
            selection.aircraft_id,
            options,
        );
        (selection, map)
    }
}
