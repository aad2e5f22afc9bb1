//! End-to-end: tables in memory, loaded, selected, composed and rendered.

use polars::prelude::*;
use skyflow::map::render::{to_html, to_json};
use skyflow::map::{LayerKind, Primitive};
use skyflow::{
    load_tables, Dashboard, MapOptions, MemorySource, Report, Selection, SkyTable, SkyflowError,
};

const ZONE: &str = r#"{"type":"Polygon","coordinates":[[[-46.70,-23.60],[-46.60,-23.60],[-46.60,-23.50],[-46.70,-23.50],[-46.70,-23.60]]]}"#;

fn source() -> MemorySource {
    MemorySource::new()
        .with_table(
            SkyTable::Aircraft,
            df!(
                "id_aeronave" => [1i64, 2],
                "nome_modelo" => ["Zeta eVTOL", "Alpha eVTOL"],
            )
            .unwrap(),
        )
        .with_table(
            SkyTable::Flights,
            df!(
                "id_voo" => [10i64, 11, 12, 13],
                "id_aeronave" => [1i64, 2, 2, 2],
                "status_voo" => [Some("EM ROTA"), Some("ATRASADO"), Some("em rota"), None],
                "origem_latitude" => [Some(-23.50), Some(-23.55), Some(-23.60), None],
                "origem_longitude" => [Some(-46.60), Some(-46.65), Some(-46.70), None],
                "destino_latitude" => [-23.40, -23.45, -23.50, -23.55],
                "destino_longitude" => [-46.50, -46.55, -46.60, -46.65],
                "altitude_atual" => [300.0, 250.0, 280.0, 200.0],
                "velocidade_atual" => [120.0, 80.0, 110.0, 95.0],
                "hora_inicio" => ["2024-05-01T10:00:00Z", "2024-05-01T10:05:00Z", "x", "2024-05-01 10:20:00"],
            )
            .unwrap(),
        )
        .with_table(
            SkyTable::Zones,
            df!(
                "nome_zona" => [Some("Congonhas"), None],
                "tipo_zona" => ["Aeroporto", "Hospital"],
                "altitude_maxima_permitida" => [0.0, 120.0],
                "poligono_area_geojson" => [ZONE, "{not json"],
            )
            .unwrap(),
        )
        .with_table(
            SkyTable::Alerts,
            df!("tipo_alerta" => ["Vento forte", "Vento cruzado na pista"]).unwrap(),
        )
}

#[tokio::test]
async fn test_default_selection_and_layers() {
    let dashboard = Dashboard::load(&source()).await.unwrap();

    let (selection, map) = dashboard.render(Selection::default(), &MapOptions::default());

    // Alpha sorts first; its lowest flight id is 11
    assert_eq!(selection, Selection::new(Some(2), Some(11)));

    // Weather failed to load, so only two overlays are attached
    assert_eq!(map.layer_control.layers, vec!["Forbidden Zones", "Active Flights"]);
    assert!(map.layer(LayerKind::Weather).is_none());
    assert_eq!(map.overlay_len(LayerKind::Zones), 1);

    // Flights 12 and 13 of aircraft 2; 13 has no origin and is skipped
    assert_eq!(map.overlay_len(LayerKind::Flights), 1);
    let flights = map.layer(LayerKind::Flights).unwrap();
    assert_eq!(flights.primitives[0].tooltip(), "Flight 12 - em rota");

    assert_eq!(map.highlights.len(), 3);
    assert!(matches!(map.highlights[2], Primitive::Line { .. }));
    assert_eq!(map.skipped.len(), 2);

    assert_eq!(map.zoom, 12);
    assert!(map.center.lat < -23.4 && map.center.lat > -23.6);
}

#[tokio::test]
async fn test_explicit_selection_renders_page() {
    let dashboard = Dashboard::load(&source()).await.unwrap();

    let (selection, map) = dashboard.render(Selection::new(Some(1), None), &MapOptions::default());
    assert_eq!(selection.flight_id, Some(10));
    assert_eq!(map.overlay_len(LayerKind::Flights), 0);
    assert_eq!(map.highlights[0].tooltip(), "Origin of flight 10");

    let json = to_json(&map).unwrap();
    assert!(json.contains("\"plane-departure\""));
    assert!(!json.contains("skipped"));

    let html = to_html(&map, "SkyFlow <test>").unwrap();
    assert!(html.contains("SkyFlow &lt;test&gt;"));
    assert!(html.contains("Forbidden Zones"));
}

#[tokio::test]
async fn test_missing_aircraft_is_fatal() {
    let source = MemorySource::new().with_table(
        SkyTable::Flights,
        df!("id_voo" => [1i64], "id_aeronave" => [1i64]).unwrap(),
    );

    match Dashboard::load(&source).await {
        Err(SkyflowError::MandatoryTable(table)) => assert_eq!(table, SkyTable::Aircraft),
        other => panic!("expected mandatory table error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_report_from_loaded_tables() {
    let tables = tokio_test::block_on(load_tables(&source()));
    assert_eq!(tables.warnings().len(), 3);

    let report = Report::compute(&tables).unwrap();
    assert_eq!(report.speed.on_route, 2);
    assert_eq!(report.speed.delayed, 1);
    assert!(report.speed.test.is_none());
    assert_eq!(report.words[0], ("vento".to_string(), 2));

    let markdown = report.to_markdown();
    assert!(markdown.contains("Not enough data for the test."));
}
