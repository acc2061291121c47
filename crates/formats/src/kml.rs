use mission::FlightPlanStore;
use tracing::{info, warn};

use crate::xml::XmlWriter;

pub const KML_MIME: &str = "application/vnd.google-earth.kml+xml";

/// Single-document KML for general GIS viewers.
///
/// Waypoints and the path line sit at absolute altitude (home elevation plus
/// waypoint altitude); POIs are clamped to the ground.
pub fn export_kml(store: &FlightPlanStore, name: &str) -> String {
    let home = store.settings().home_elevation_msl.unwrap_or_else(|| {
        warn!("home elevation unknown; KML altitudes are relative to 0 m MSL");
        0.0
    });
    let absolute = |altitude: i32| home + f64::from(altitude);

    let mut xml = XmlWriter::new();
    xml.open_with("kml", &[("xmlns", "http://www.opengis.net/kml/2.2")]);
    xml.open("Document");
    xml.leaf("name", name);

    for (index, wp) in store.waypoints().iter().enumerate() {
        xml.open("Placemark");
        xml.leaf("name", format!("Waypoint {}", index + 1));
        xml.open("Point");
        xml.leaf("altitudeMode", "absolute");
        xml.leaf(
            "coordinates",
            format!(
                "{},{},{}",
                wp.position.lng_deg,
                wp.position.lat_deg,
                absolute(wp.altitude)
            ),
        );
        xml.close("Point");
        xml.close("Placemark");
    }

    if !store.waypoints().is_empty() {
        let coordinates = store
            .waypoints()
            .iter()
            .map(|wp| {
                format!(
                    "{},{},{}",
                    wp.position.lng_deg,
                    wp.position.lat_deg,
                    absolute(wp.altitude)
                )
            })
            .collect::<Vec<_>>()
            .join(" ");
        xml.open("Placemark");
        xml.leaf("name", "Flight path");
        xml.open("LineString");
        xml.leaf("altitudeMode", "absolute");
        xml.leaf("coordinates", coordinates);
        xml.close("LineString");
        xml.close("Placemark");
    }

    for poi in store.pois() {
        xml.open("Placemark");
        xml.leaf("name", &poi.name);
        xml.open("Point");
        xml.leaf("altitudeMode", "clampToGround");
        xml.leaf(
            "coordinates",
            format!("{},{},0", poi.position.lng_deg, poi.position.lat_deg),
        );
        xml.close("Point");
        xml.close("Placemark");
    }

    xml.close("Document");
    xml.close("kml");
    info!(
        "exported KML: {} waypoints, {} POIs",
        store.waypoints().len(),
        store.pois().len()
    );
    xml.finish()
}

#[cfg(test)]
mod tests {
    use super::export_kml;
    use foundation::math::LatLng;
    use mission::{FlightPlanStore, PoiSpec, WaypointSpec};

    #[test]
    fn waypoints_use_absolute_altitude() {
        let mut store = FlightPlanStore::new();
        store.set_home_elevation(Some(412.5)).expect("home");
        store
            .add_waypoint(LatLng::new(45.0, 6.0), WaypointSpec::default().with_altitude(40))
            .expect("wp");
        store
            .add_waypoint(LatLng::new(45.001, 6.002), WaypointSpec::default().with_altitude(55))
            .expect("wp");
        store
            .add_poi(
                LatLng::new(45.0005, 6.001),
                Some("Chapel <old>".to_string()),
                PoiSpec {
                    object_height_m: 12.0,
                    terrain_elevation_msl: Some(420.0),
                },
            )
            .expect("poi");

        let kml = export_kml(&store, "Survey");
        assert!(kml.contains("<coordinates>6,45,452.5</coordinates>"));
        assert!(kml.contains("<coordinates>6,45,452.5 6.002,45.001,467.5</coordinates>"));
        assert!(kml.contains("<name>Chapel &lt;old&gt;</name>"));
        assert!(kml.contains("<coordinates>6.001,45.0005,0</coordinates>"));
        assert_eq!(kml.matches("<LineString>").count(), 1);
        assert_eq!(kml.matches("<altitudeMode>clampToGround</altitudeMode>").count(), 1);
        assert_eq!(kml.matches("<altitudeMode>absolute</altitudeMode>").count(), 3);
    }

    #[test]
    fn empty_plan_has_no_path() {
        let kml = export_kml(&FlightPlanStore::new(), "Empty");
        assert!(!kml.contains("LineString"));
        assert!(kml.contains("<name>Empty</name>"));
    }
}
