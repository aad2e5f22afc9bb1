//! The two dependent dropdowns (aircraft, then flight) and how a selection
//! is resolved from them.

use crate::map::flights_for_aircraft;
use crate::records::{Aircraft, Flight, Records};
use crate::types::aircraft_columns;

use serde::Serialize;

/// What the user picked. Lives for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub aircraft_id: Option<i64>,
    pub flight_id: Option<i64>,
}

/// One dropdown entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub id: i64,
    pub label: String,
}

impl Selection {
    pub fn new(aircraft_id: Option<i64>, flight_id: Option<i64>) -> Self {
        Self {
            aircraft_id,
            flight_id,
        }
    }

    /// Fill in what the user left unset the way the dropdowns default:
    /// the first aircraft, then that aircraft's first flight.
    pub fn resolve(self, aircraft: &Records<Aircraft>, flights: &Records<Flight>) -> Self {
        let aircraft_id = self
            .aircraft_id
            .or_else(|| aircraft_options(aircraft).first().map(|o| o.id));
        let flight_id = self
            .flight_id
            .or_else(|| flight_options(flights, aircraft_id).first().map(|o| o.id));

        Self {
            aircraft_id,
            flight_id,
        }
    }
}

/// Aircraft entries labelled `"{id} - {model}"`, ordered by model name.
pub fn aircraft_options(aircraft: &Records<Aircraft>) -> Vec<SelectOption> {
    let mut rows: Vec<&Aircraft> = aircraft.iter().collect();
    if aircraft.has_column(aircraft_columns::MODEL_NAME) && aircraft.has_column(aircraft_columns::ID) {
        // Unnamed models sort last
        rows.sort_by(|a, b| {
            let key = |r: &Aircraft| (r.model_name.value().is_none(), r.model_name.value().cloned());
            key(*a).cmp(&key(*b))
        });
    }

    rows.into_iter()
        .filter_map(|a| {
            let id = *a.id.value()?;
            Some(SelectOption {
                id,
                label: format!("{} - {}", id, a.model_name.display_or("Model")),
            })
        })
        .collect()
}

/// Flight entries of one aircraft labelled `"{id} - {status}"`, ordered by id.
pub fn flight_options(flights: &Records<Flight>, aircraft_id: Option<i64>) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = flights_for_aircraft(flights, aircraft_id)
        .iter()
        .filter_map(|f| {
            let id = *f.id.value()?;
            Some(SelectOption {
                id,
                label: format!("{} - {}", id, f.status.display_or("No status")),
            })
        })
        .collect();

    options.sort_by_key(|o| o.id);
    options
}
