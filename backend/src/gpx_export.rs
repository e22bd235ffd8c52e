use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::errors::GpxError;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use shared::Coordinate;

/// Encode a route polyline as a base64-wrapped GPX 1.1 track so clients can
/// offer it as a download.
pub fn encode_route_as_gpx(path: &[Coordinate]) -> Result<String, GpxError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("trajets".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some("trajets".into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for waypoint in path.iter().map(to_waypoint) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}
