//! Highlight of the selected flight: departure and arrival markers joined by
//! its route.

use super::overlay::{flight_popup, Primitive};
use super::style::{ARRIVAL_ICON, DEPARTURE_ICON, ROUTE_COLOR, ROUTE_WEIGHT};
use crate::records::{Flight, SkipReason, UNKNOWN};

/// Origin marker, destination marker and route line of flight `flight_id`.
///
/// `flights` must be the full flight set, not the aircraft-filtered one.
pub fn highlight_flight(flights: &[Flight], flight_id: i64) -> Result<Vec<Primitive>, SkipReason> {
    let flight = flights
        .iter()
        .find(|f| f.has_id(flight_id))
        .ok_or(SkipReason::FlightNotFound(flight_id))?;

    let origin = flight.origin()?;
    let destination = flight.destination()?;
    let id = flight.id.display_or(UNKNOWN);

    Ok(vec![
        Primitive::Marker {
            position: origin,
            icon: DEPARTURE_ICON,
            tooltip: format!("Origin of flight {}", id),
            popup: flight_popup(flight, Some("Origin")),
        },
        Primitive::Marker {
            position: destination,
            icon: ARRIVAL_ICON,
            tooltip: format!("Destination of flight {}", id),
            popup: flight_popup(flight, Some("Destination")),
        },
        Primitive::Line {
            path: vec![origin, destination],
            color: ROUTE_COLOR,
            weight: ROUTE_WEIGHT,
            tooltip: format!("Route of flight {}", id),
            popup: flight_popup(flight, Some("Route")),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::style::Color;
    use crate::records::{GeoPoint, Records};
    use crate::types::Table;
    use polars::prelude::*;

    fn flights() -> Records<Flight> {
        Records::from_table(&Table::new(
            df!(
                "id_voo" => [1i64, 2],
                "status_voo" => ["EM ROTA", "EMERGENCIA"],
                "origem_latitude" => [-23.5, -23.6],
                "origem_longitude" => [-46.6, -46.7],
                "destino_latitude" => [Some(-22.9), None],
                "destino_longitude" => [Some(-43.2), None],
            )
            .unwrap(),
        ))
    }

    #[test]
    fn test_highlight_three_primitives() {
        let primitives = highlight_flight(flights().as_slice(), 1).unwrap();
        assert_eq!(primitives.len(), 3);

        match &primitives[2] {
            Primitive::Line {
                path,
                color,
                weight,
                ..
            } => {
                assert_eq!(path, &vec![GeoPoint::new(-23.5, -46.6), GeoPoint::new(-22.9, -43.2)]);
                assert_eq!(*color, Color::Yellow);
                assert_eq!(*weight, 4);
            }
            other => panic!("expected line, got {:?}", other),
        }

        match &primitives[0] {
            Primitive::Marker { icon, .. } => assert_eq!(icon.name, "plane-departure"),
            other => panic!("expected marker, got {:?}", other),
        }
        assert_eq!(primitives[1].popup().get("Point"), Some("Destination"));
        assert_eq!(primitives[1].popup().get("Status"), Some("EM ROTA"));
    }

    #[test]
    fn test_highlight_missing_destination() {
        assert_eq!(
            highlight_flight(flights().as_slice(), 2),
            Err(SkipReason::Missing("destino_latitude"))
        );
    }

    #[test]
    fn test_highlight_unknown_flight() {
        assert_eq!(
            highlight_flight(flights().as_slice(), 99),
            Err(SkipReason::FlightNotFound(99))
        );
    }
}
