//! Colors, icons and fixed styles of map primitives.

use serde::Serialize;
use std::fmt;

/// Named marker and path colors understood by the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Orange,
    Red,
    Green,
    Gray,
    Yellow,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Orange => "orange",
            Color::Red => "red",
            Color::Green => "green",
            Color::Gray => "gray",
            Color::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flight status (uppercase) to marker color. Anything else is gray.
const STATUS_COLORS: &[(&str, Color)] = &[
    ("EM ROTA", Color::Blue),
    ("ATRASADO", Color::Orange),
    ("EMERGENCIA", Color::Red),
    ("FINALIZADO", Color::Green),
];

/// Color of a flight marker for its status. Matching is exact after
/// uppercasing.
pub fn color_for_status(status: Option<&str>) -> Color {
    status
        .map(str::to_uppercase)
        .and_then(|status| {
            STATUS_COLORS
                .iter()
                .find(|(name, _)| *name == status)
                .map(|(_, color)| *color)
        })
        .unwrap_or(Color::Gray)
}

/// Font Awesome icon of a point marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Icon {
    pub name: &'static str,
    pub color: Option<Color>,
}

pub const WEATHER_ICON: Icon = Icon {
    name: "cloud",
    color: None,
};

pub const DEPARTURE_ICON: Icon = Icon {
    name: "plane-departure",
    color: Some(Color::Green),
};

pub const ARRIVAL_ICON: Icon = Icon {
    name: "plane-arrival",
    color: Some(Color::Red),
};

/// Stroke and fill of an area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: Color,
    pub fill_color: Color,
    pub weight: u8,
    pub fill_opacity: f64,
}

pub const ZONE_STYLE: PathStyle = PathStyle {
    color: Color::Red,
    fill_color: Color::Red,
    weight: 2,
    fill_opacity: 0.3,
};

pub const FLIGHT_MARKER_RADIUS: u8 = 5;
pub const FLIGHT_MARKER_FILL_OPACITY: f64 = 0.7;

pub const ROUTE_COLOR: Color = Color::Yellow;
pub const ROUTE_WEIGHT: u8 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_colors() {
        assert_eq!(color_for_status(Some("em rota")), Color::Blue);
        assert_eq!(color_for_status(Some("EM ROTA")), Color::Blue);
        assert_eq!(color_for_status(None), Color::Gray);
        assert_eq!(color_for_status(Some("unknown")), Color::Gray);
    }

    #[test]
    fn test_all_statuses() {
        assert_eq!(color_for_status(Some("Atrasado")), Color::Orange);
        assert_eq!(color_for_status(Some("emergencia")), Color::Red);
        assert_eq!(color_for_status(Some("finalizado")), Color::Green);
    }

    #[test]
    fn test_no_partial_matching() {
        assert_eq!(color_for_status(Some("EM ROTA ")), Color::Gray);
        assert_eq!(color_for_status(Some("ROTA")), Color::Gray);
        assert_eq!(color_for_status(Some("")), Color::Gray);
    }

    #[test]
    fn test_color_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Color::Orange).unwrap(), "\"orange\"");
    }
}
