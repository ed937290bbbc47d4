//! Waypoint file import.
//!
//! Parses GPX and KML files into a flat list of navigation targets. A
//! parse failure aborts the whole import; the current target list is never
//! partially mutated.

use std::io::Cursor;

use thiserror::Error;

use crate::nav::Target;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid GPX: {0}")]
    Gpx(String),
    #[error("invalid KML: {0}")]
    Kml(String),
    #[error("unsupported file type {0:?} (expected .gpx or .kml)")]
    UnsupportedExtension(String),
    #[error("no waypoints found in file")]
    NoWaypoints,
}

/// Read and parse a waypoint file, dispatching on the extension.
#[cfg(not(target_arch = "wasm32"))]
pub fn import_path(path: &std::path::Path) -> Result<Vec<Target>, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let text = std::fs::read_to_string(path)?;
    match ext.as_str() {
        "gpx" => parse_gpx(&text),
        "kml" => parse_kml(&text),
        other => Err(ImportError::UnsupportedExtension(other.to_string())),
    }
}

/// Parse GPX text: standalone waypoints, then route points, then track
/// points, in document order within each group.
pub fn parse_gpx(text: &str) -> Result<Vec<Target>, ImportError> {
    let gpx =
        gpx::read(&mut Cursor::new(text.as_bytes())).map_err(|e| ImportError::Gpx(e.to_string()))?;

    let mut targets = Vec::new();
    for wp in &gpx.waypoints {
        push_waypoint(&mut targets, wp, None);
    }
    for route in &gpx.routes {
        for wp in &route.points {
            push_waypoint(&mut targets, wp, route.name.as_deref());
        }
    }
    for track in &gpx.tracks {
        for segment in &track.segments {
            for wp in &segment.points {
                push_waypoint(&mut targets, wp, track.name.as_deref());
            }
        }
    }

    if targets.is_empty() {
        return Err(ImportError::NoWaypoints);
    }
    Ok(targets)
}

/// Parse KML text: Placemark Point coordinates, or the vertices of a
/// Placemark LineString/LinearRing. KML coordinate order is
/// "lon,lat[,ele]", tuples separated by whitespace.
pub fn parse_kml(text: &str) -> Result<Vec<Target>, ImportError> {
    let doc = roxmltree::Document::parse(text).map_err(|e| ImportError::Kml(e.to_string()))?;

    let mut targets = Vec::new();
    for placemark in doc.descendants().filter(|n| n.has_tag_name("Placemark")) {
        let name = placemark
            .children()
            .find(|n| n.has_tag_name("name"))
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if let Some(coords) = tag_coordinates(placemark, "Point") {
            if let Some((lat, lon)) = parse_coord_tuple(coords.trim()) {
                targets.push(Target { lat, lon, name });
            }
            continue;
        }

        for tag in ["LineString", "LinearRing"] {
            let Some(coords) = tag_coordinates(placemark, tag) else { continue };
            for (idx, tuple) in coords.split_whitespace().enumerate() {
                let Some((lat, lon)) = parse_coord_tuple(tuple) else { continue };
                let point_name = match &name {
                    Some(name) => format!("{name} (Point {})", idx + 1),
                    None => format!("Point {}", idx + 1),
                };
                targets.push(Target { lat, lon, name: Some(point_name) });
            }
        }
    }

    if targets.is_empty() {
        return Err(ImportError::NoWaypoints);
    }
    Ok(targets)
}

fn push_waypoint(targets: &mut Vec<Target>, wp: &gpx::Waypoint, fallback: Option<&str>) {
    let p = wp.point();
    let name = wp.name.clone().or_else(|| fallback.map(str::to_string));
    targets.push(Target { lat: p.y(), lon: p.x(), name });
}

fn tag_coordinates<'a, 'input>(placemark: roxmltree::Node<'a, 'input>, tag: &str) -> Option<&'a str> {
    placemark
        .descendants()
        .find(|n| n.has_tag_name(tag))?
        .descendants()
        .find(|n| n.has_tag_name("coordinates"))
        .and_then(|n| n.text())
}

/// Parses one "lon,lat[,ele]" tuple; None on malformed tuples or NaN.
fn parse_coord_tuple(tuple: &str) -> Option<(f64, f64)> {
    let mut parts = tuple.split(',');
    let lon: f64 = parts.next()?.trim().parse().ok()?;
    let lat: f64 = parts.next()?.trim().parse().ok()?;
    if lat.is_nan() || lon.is_nan() {
        return None;
    }
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kml_point_placemarks() {
        let kml = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <name>Dock</name>
      <Point><coordinates>10.3951,63.4305,0</coordinates></Point>
    </Placemark>
    <Placemark>
      <Point><coordinates>10.3970,63.4311</coordinates></Point>
    </Placemark>
  </Document>
</kml>"#;
        let targets = parse_kml(kml).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name.as_deref(), Some("Dock"));
        assert!((targets[0].lat - 63.4305).abs() < 1e-9);
        assert!((targets[0].lon - 10.3951).abs() < 1e-9);
        assert_eq!(targets[1].name, None);
    }

    #[test]
    fn kml_line_string_vertices_are_numbered() {
        let kml = r#"<kml><Document>
  <Placemark>
    <name>Survey</name>
    <LineString>
      <coordinates>
        10.0,63.0,0
        10.001,63.0,0
        10.001,63.001,0
      </coordinates>
    </LineString>
  </Placemark>
</Document></kml>"#;
        let targets = parse_kml(kml).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].name.as_deref(), Some("Survey (Point 1)"));
        assert_eq!(targets[2].name.as_deref(), Some("Survey (Point 3)"));
        assert!((targets[2].lat - 63.001).abs() < 1e-9);
    }

    #[test]
    fn kml_malformed_xml_is_an_error() {
        assert!(matches!(parse_kml("<kml><Placemark>"), Err(ImportError::Kml(_))));
    }

    #[test]
    fn kml_without_placemarks_is_empty() {
        let kml = "<kml><Document><name>empty</name></Document></kml>";
        assert!(matches!(parse_kml(kml), Err(ImportError::NoWaypoints)));
    }

    #[test]
    fn kml_skips_malformed_tuples() {
        let kml = r#"<kml><Placemark>
  <LineString><coordinates>10.0,63.0 bogus 10.1,63.1</coordinates></LineString>
</Placemark></kml>"#;
        let targets = parse_kml(kml).unwrap();
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn gpx_waypoints() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <wpt lat="63.4305" lon="10.3951"><name>Dock</name></wpt>
  <wpt lat="63.4311" lon="10.3970"/>
</gpx>"#;
        let targets = parse_gpx(gpx).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name.as_deref(), Some("Dock"));
        assert!((targets[0].lat - 63.4305).abs() < 1e-9);
        assert!((targets[1].lon - 10.3970).abs() < 1e-9);
    }

    #[test]
    fn gpx_track_points_inherit_the_track_name() {
        let gpx = r#"<?xml version="1.0"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk><name>Transect</name><trkseg>
    <trkpt lat="63.0" lon="10.0"/>
    <trkpt lat="63.001" lon="10.0"/>
  </trkseg></trk>
</gpx>"#;
        let targets = parse_gpx(gpx).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name.as_deref(), Some("Transect"));
    }

    #[test]
    fn gpx_garbage_is_an_error() {
        assert!(matches!(parse_gpx("not xml at all"), Err(ImportError::Gpx(_))));
    }
}
