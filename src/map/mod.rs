//! Map composition: from typed records and a selection to a
//! [`RenderableMap`].
//!
//! The map is a base layer centered on the data, three toggleable overlays
//! (zones, weather, flights) and, when a flight is selected, highlight
//! primitives drawn directly on the base map so the layer control cannot
//! hide them.

pub mod center;
pub mod highlight;
pub mod overlay;
pub mod render;
pub mod style;

pub use center::{compute_center, compute_center_with, CenterStrategy, DEFAULT_CENTER};
pub use highlight::highlight_flight;
pub use overlay::{Popup, PopupRow, Primitive, ZoneGeometry};
pub use style::{color_for_status, Color};

use crate::config::Config;
use crate::records::{Flight, ForbiddenZone, GeoPoint, Records, SkipReason, WeatherSample};
use crate::types::flight_columns;

use serde::Serialize;
use tracing::{debug, info};

/// Zoom level of a freshly built map.
pub const DEFAULT_ZOOM: u8 = crate::config::DEFAULT_ZOOM;

/// Map settings that do not depend on the data.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub zoom: u8,
    pub fallback_center: GeoPoint,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            fallback_center: DEFAULT_CENTER,
        }
    }
}

impl From<&Config> for MapOptions {
    fn from(config: &Config) -> Self {
        Self {
            zoom: config.zoom,
            fallback_center: GeoPoint::new(config.fallback_center.0, config.fallback_center.1),
        }
    }
}

/// The toggleable overlays, in the order they are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Zones,
    Weather,
    Flights,
}

impl LayerKind {
    /// Name shown in the layer control.
    pub fn title(&self) -> &'static str {
        match self {
            LayerKind::Zones => "Forbidden Zones",
            LayerKind::Weather => "Live Weather",
            LayerKind::Flights => "Active Flights",
        }
    }
}

/// A toggleable group of primitives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub kind: LayerKind,
    pub name: &'static str,
    pub visible: bool,
    pub primitives: Vec<Primitive>,
}

/// Widget letting the user show or hide each overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerControl {
    pub layers: Vec<&'static str>,
}

/// A row left out of the map. `layer` is `None` for the highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    pub layer: Option<LayerKind>,
    pub row: Option<usize>,
    pub reason: SkipReason,
}

/// Everything the rendering surface needs to draw the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderableMap {
    pub center: GeoPoint,
    pub zoom: u8,
    pub layers: Vec<Layer>,
    pub highlights: Vec<Primitive>,
    pub layer_control: LayerControl,
    #[serde(skip)]
    pub skipped: Vec<Skipped>,
}

impl RenderableMap {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|l| l.kind == kind)
    }

    /// Primitive count of an overlay; zero when the overlay is not attached.
    pub fn overlay_len(&self, kind: LayerKind) -> usize {
        self.layer(kind).map_or(0, |l| l.primitives.len())
    }
}

/// Flights belonging to `aircraft_id`.
///
/// No id, or a flight table without the aircraft reference column, means no
/// filtering.
pub fn flights_for_aircraft(flights: &Records<Flight>, aircraft_id: Option<i64>) -> Records<Flight> {
    match aircraft_id {
        Some(id) if flights.has_column(flight_columns::AIRCRAFT_ID) => {
            flights.filtered(|f| f.aircraft_id.value() == Some(&id))
        }
        _ => flights.clone(),
    }
}

/// Compose the map.
///
/// The flights overlay and the center use the flights of
/// `selected_aircraft_id`; the highlight looks `selected_flight_id` up in the
/// full flight set, so it may belong to another aircraft. Empty inputs give
/// empty (or absent) overlays, never an error.
pub fn build_map(
    flights: &Records<Flight>,
    zones: &Records<ForbiddenZone>,
    weather: &Records<WeatherSample>,
    selected_flight_id: Option<i64>,
    selected_aircraft_id: Option<i64>,
    options: &MapOptions,
) -> RenderableMap {
    let plotted = flights_for_aircraft(flights, selected_aircraft_id);
    let chain = center::default_chain(options.fallback_center);
    let center = compute_center_with(plotted.as_slice(), weather.as_slice(), &chain);

    let mut map = RenderableMap {
        center,
        zoom: options.zoom,
        layers: Vec::new(),
        highlights: Vec::new(),
        layer_control: LayerControl { layers: Vec::new() },
        skipped: Vec::new(),
    };

    if !zones.is_empty() {
        map.attach(LayerKind::Zones, overlay::zones_overlay(zones.as_slice()));
    }
    if !weather.is_empty() {
        map.attach(LayerKind::Weather, overlay::weather_overlay(weather.as_slice()));
    }
    if !plotted.is_empty() {
        map.attach(
            LayerKind::Flights,
            overlay::flights_overlay(plotted.as_slice(), selected_flight_id),
        );
    }

    if let Some(flight_id) = selected_flight_id {
        match highlight_flight(flights.as_slice(), flight_id) {
            Ok(primitives) => map.highlights = primitives,
            Err(reason) => {
                debug!(flight_id, %reason, "selected flight not highlighted");
                map.skipped.push(Skipped {
                    layer: None,
                    row: None,
                    reason,
                });
            }
        }
    }

    map.layer_control = LayerControl {
        layers: map.layers.iter().map(|l| l.name).collect(),
    };

    info!(
        lat = map.center.lat,
        lon = map.center.lon,
        zones = map.overlay_len(LayerKind::Zones),
        weather = map.overlay_len(LayerKind::Weather),
        flights = map.overlay_len(LayerKind::Flights),
        highlights = map.highlights.len(),
        skipped = map.skipped.len(),
        "map built"
    );

    map
}

impl RenderableMap {
    fn attach(&mut self, kind: LayerKind, build: overlay::OverlayBuild) {
        for (row, reason) in build.skipped {
            debug!(layer = kind.title(), row, %reason, "row skipped");
            self.skipped.push(Skipped {
                layer: Some(kind),
                row: Some(row),
                reason,
            });
        }

        self.layers.push(Layer {
            kind,
            name: kind.title(),
            visible: true,
            primitives: build.primitives,
        });
    }
}
