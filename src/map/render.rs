//! Output surfaces for a [`RenderableMap`]: JSON, and a standalone Leaflet
//! page that draws it.

use super::RenderableMap;
use crate::types::Result;

use std::path::Path;

const DATA_PLACEHOLDER: &str = "__SKYFLOW_MAP_DATA__";
const TITLE_PLACEHOLDER: &str = "__SKYFLOW_TITLE__";

/// Default page title.
pub const DEFAULT_TITLE: &str = "SkyFlow Mobility - Urban Air Map 4D";

/// Serialize the map as pretty JSON.
pub fn to_json(map: &RenderableMap) -> Result<String> {
    Ok(serde_json::to_string_pretty(map)?)
}

/// Render the map as a self-contained HTML page.
pub fn to_html(map: &RenderableMap, title: &str) -> Result<String> {
    // Keep the embedded JSON from closing the <script> element early
    let data = serde_json::to_string(map)?.replace("</", "<\\/");

    Ok(MAP_HTML
        .replace(TITLE_PLACEHOLDER, &escape_html(title))
        .replace(DATA_PLACEHOLDER, &data))
}

/// Write the HTML page to `path`.
pub fn write_html(map: &RenderableMap, title: &str, path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, to_html(map, title)?)?;
    Ok(())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const MAP_HTML: &str = r##"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__SKYFLOW_TITLE__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css"
    crossorigin="anonymous" referrerpolicy="no-referrer" />
  <style>
    html, body { height: 100%; margin: 0; font-family: system-ui, sans-serif; }
    #map { position: absolute; inset: 0; }
    .sky-icon { font-size: 22px; text-shadow: 0 0 3px #fff; }
  </style>
</head>

<body>
  <div id="map"></div>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <script>
    const data = __SKYFLOW_MAP_DATA__;

    const map = L.map('map').setView([data.center.lat, data.center.lon], data.zoom);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 19,
      attribution: '&copy; OpenStreetMap contributors',
    }).addTo(map);
    L.control.scale().addTo(map);

    const esc = (s) => String(s).replace(/[&<>"']/g, (c) => ({
      '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;',
    }[c]));

    const popupHtml = (popup) =>
      popup.rows.map((r) => `<b>${esc(r.label)}:</b> ${esc(r.value)}`).join('<br>');

    const markerIcon = (icon) => L.divIcon({
      className: 'sky-icon',
      html: `<i class="fa-solid fa-${esc(icon.name)}" style="color:${esc(icon.color || 'steelblue')}"></i>`,
      iconSize: [24, 24],
      iconAnchor: [12, 12],
    });

    const latLng = (p) => [p.lat, p.lon];

    function draw(p) {
      let layer;
      switch (p.kind) {
        case 'marker':
          layer = L.marker(latLng(p.position), { icon: markerIcon(p.icon) });
          break;
        case 'circle_marker':
          layer = L.circleMarker(latLng(p.position), {
            radius: p.radius, color: p.color, fill: true, fillOpacity: p.fill_opacity,
          });
          break;
        case 'area':
          layer = L.geoJSON(p.geometry, {
            style: {
              color: p.style.color, fillColor: p.style.fill_color,
              weight: p.style.weight, fillOpacity: p.style.fill_opacity,
            },
          });
          break;
        case 'line':
          layer = L.polyline(p.path.map(latLng), { color: p.color, weight: p.weight });
          break;
        default:
          return null;
      }
      return layer.bindPopup(popupHtml(p.popup), { maxWidth: 300 }).bindTooltip(esc(p.tooltip));
    }

    const overlays = {};
    for (const layer of data.layers) {
      const group = L.featureGroup(layer.primitives.map(draw).filter(Boolean));
      if (layer.visible) group.addTo(map);
      overlays[layer.name] = group;
    }

    for (const p of data.highlights) {
      const drawn = draw(p);
      if (drawn) drawn.addTo(map);
    }

    if (data.layer_control.layers.length) {
      L.control.layers(null, overlays, { collapsed: false }).addTo(map);
    }
  </script>
</body>

</html>
"##;
