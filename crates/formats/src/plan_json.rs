use foundation::ids::{PoiId, WaypointId};
use foundation::math::LatLng;
use mission::{
    AdaptationMode, CameraAction, FlightPlanStore, HeadingMode, PathType, PlanError,
    PlanSettings, PlanSnapshot, Poi, Waypoint,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const PLAN_JSON_MIME: &str = "application/json";

/// On-disk plan document: `{ waypoints, pois, settings }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanDocument {
    #[serde(default)]
    pub waypoints: Vec<WaypointRecord>,
    #[serde(default)]
    pub pois: Vec<PoiRecord>,
    #[serde(default)]
    pub settings: SettingsRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRecord {
    pub id: u32,
    pub lat: f64,
    pub lng: f64,
    pub altitude: i32,
    #[serde(default)]
    pub hover_time: f64,
    #[serde(default = "default_gimbal_pitch")]
    pub gimbal_pitch: f64,
    #[serde(default)]
    pub heading_control: HeadingControl,
    #[serde(default)]
    pub fixed_heading: f64,
    #[serde(default)]
    pub camera_action: CameraActionRecord,
    #[serde(default)]
    pub target_poi_id: Option<u32>,
    #[serde(default, rename = "terrainElevationMSL")]
    pub terrain_elevation_msl: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoiRecord {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Final altitude AMSL. Written for consumers; recomputed on import.
    #[serde(default)]
    pub altitude: f64,
    #[serde(default, rename = "terrainElevationMSL")]
    pub terrain_elevation_msl: Option<f64>,
    #[serde(default)]
    pub object_height_above_ground: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsRecord {
    pub default_altitude: i32,
    pub flight_speed: f64,
    pub path_type: PathTypeRecord,
    pub next_waypoint_id: u32,
    pub next_poi_id: u32,
    pub home_elevation_msl: Option<f64>,
    pub last_altitude_adaptation_mode: Option<AdaptationModeRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_gimbal_pitch: Option<f64>,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        let settings = PlanSettings::default();
        Self {
            default_altitude: settings.default_altitude,
            flight_speed: settings.cruise_speed_mps,
            path_type: PathTypeRecord::Straight,
            next_waypoint_id: 1,
            next_poi_id: 1,
            home_elevation_msl: None,
            last_altitude_adaptation_mode: None,
            default_gimbal_pitch: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeadingControl {
    #[default]
    Auto,
    Fixed,
    PoiTrack,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CameraActionRecord {
    #[default]
    None,
    Photo,
    StartRecord,
    StopRecord,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathTypeRecord {
    #[default]
    Straight,
    Curved,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdaptationModeRecord {
    Agl,
    Amsl,
}

fn default_gimbal_pitch() -> f64 {
    PlanSettings::default().default_gimbal_pitch_deg
}

#[derive(Debug)]
pub enum ImportError {
    Parse(serde_json::Error),
    Invalid(PlanError),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Parse(err) => write!(f, "Plan parse error: {err}"),
            ImportError::Invalid(err) => write!(f, "Invalid plan: {err}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Parse(err) => Some(err),
            ImportError::Invalid(err) => Some(err),
        }
    }
}

impl From<&HeadingMode> for HeadingControl {
    fn from(mode: &HeadingMode) -> Self {
        match mode {
            HeadingMode::Auto => HeadingControl::Auto,
            HeadingMode::Fixed => HeadingControl::Fixed,
            HeadingMode::PoiTrack => HeadingControl::PoiTrack,
        }
    }
}

impl From<HeadingControl> for HeadingMode {
    fn from(control: HeadingControl) -> Self {
        match control {
            HeadingControl::Auto => HeadingMode::Auto,
            HeadingControl::Fixed => HeadingMode::Fixed,
            HeadingControl::PoiTrack => HeadingMode::PoiTrack,
        }
    }
}

impl From<&CameraAction> for CameraActionRecord {
    fn from(action: &CameraAction) -> Self {
        match action {
            CameraAction::None => CameraActionRecord::None,
            CameraAction::Photo => CameraActionRecord::Photo,
            CameraAction::StartRecord => CameraActionRecord::StartRecord,
            CameraAction::StopRecord => CameraActionRecord::StopRecord,
        }
    }
}

impl From<CameraActionRecord> for CameraAction {
    fn from(action: CameraActionRecord) -> Self {
        match action {
            CameraActionRecord::None => CameraAction::None,
            CameraActionRecord::Photo => CameraAction::Photo,
            CameraActionRecord::StartRecord => CameraAction::StartRecord,
            CameraActionRecord::StopRecord => CameraAction::StopRecord,
        }
    }
}

impl From<&Waypoint> for WaypointRecord {
    fn from(wp: &Waypoint) -> Self {
        Self {
            id: wp.id.get(),
            lat: wp.position.lat_deg,
            lng: wp.position.lng_deg,
            altitude: wp.altitude,
            hover_time: wp.hover_time_s,
            gimbal_pitch: wp.gimbal_pitch_deg,
            heading_control: (&wp.heading_mode).into(),
            fixed_heading: wp.fixed_heading_deg,
            camera_action: (&wp.camera_action).into(),
            target_poi_id: wp.target_poi.map(|id| id.get()),
            terrain_elevation_msl: wp.terrain_elevation_msl,
        }
    }
}

impl From<WaypointRecord> for Waypoint {
    fn from(record: WaypointRecord) -> Self {
        Self {
            id: WaypointId::new(record.id),
            position: LatLng::new(record.lat, record.lng),
            altitude: record.altitude,
            hover_time_s: record.hover_time,
            gimbal_pitch_deg: record.gimbal_pitch,
            heading_mode: record.heading_control.into(),
            fixed_heading_deg: record.fixed_heading,
            target_poi: record.target_poi_id.map(PoiId::new),
            camera_action: record.camera_action.into(),
            terrain_elevation_msl: record.terrain_elevation_msl,
        }
    }
}

impl From<&Poi> for PoiRecord {
    fn from(poi: &Poi) -> Self {
        Self {
            id: poi.id.get(),
            name: poi.name.clone(),
            lat: poi.position.lat_deg,
            lng: poi.position.lng_deg,
            altitude: poi.final_altitude_amsl(),
            terrain_elevation_msl: poi.terrain_elevation_msl,
            object_height_above_ground: poi.object_height_m,
        }
    }
}

impl From<PoiRecord> for Poi {
    fn from(record: PoiRecord) -> Self {
        Poi::new(
            PoiId::new(record.id),
            record.name,
            LatLng::new(record.lat, record.lng),
            record.object_height_above_ground,
            record.terrain_elevation_msl,
        )
    }
}

impl PlanDocument {
    pub fn from_store(store: &FlightPlanStore) -> Self {
        let settings = store.settings();
        Self {
            waypoints: store.waypoints().iter().map(WaypointRecord::from).collect(),
            pois: store.pois().iter().map(PoiRecord::from).collect(),
            settings: SettingsRecord {
                default_altitude: settings.default_altitude,
                flight_speed: settings.cruise_speed_mps,
                path_type: match settings.path_type {
                    PathType::Straight => PathTypeRecord::Straight,
                    PathType::Curved => PathTypeRecord::Curved,
                },
                next_waypoint_id: store.next_waypoint_id(),
                next_poi_id: store.next_poi_id(),
                home_elevation_msl: settings.home_elevation_msl,
                last_altitude_adaptation_mode: settings.last_adaptation_mode.map(|m| match m {
                    AdaptationMode::Agl => AdaptationModeRecord::Agl,
                    AdaptationMode::Amsl => AdaptationModeRecord::Amsl,
                }),
                default_gimbal_pitch: Some(settings.default_gimbal_pitch_deg),
            },
        }
    }

    pub fn into_snapshot(self) -> PlanSnapshot {
        let s = self.settings;
        let settings = PlanSettings {
            default_altitude: s.default_altitude,
            cruise_speed_mps: s.flight_speed,
            path_type: match s.path_type {
                PathTypeRecord::Straight => PathType::Straight,
                PathTypeRecord::Curved => PathType::Curved,
            },
            home_elevation_msl: s.home_elevation_msl,
            default_gimbal_pitch_deg: s
                .default_gimbal_pitch
                .unwrap_or_else(default_gimbal_pitch),
            last_adaptation_mode: s.last_altitude_adaptation_mode.map(|m| match m {
                AdaptationModeRecord::Agl => AdaptationMode::Agl,
                AdaptationModeRecord::Amsl => AdaptationMode::Amsl,
            }),
        };
        PlanSnapshot {
            waypoints: self.waypoints.into_iter().map(Waypoint::from).collect(),
            pois: self.pois.into_iter().map(Poi::from).collect(),
            settings,
            next_waypoint_id: s.next_waypoint_id,
            next_poi_id: s.next_poi_id,
        }
    }
}

pub fn export_plan_json(store: &FlightPlanStore) -> Result<String, serde_json::Error> {
    let doc = PlanDocument::from_store(store);
    info!(
        "exporting plan: {} waypoints, {} POIs",
        doc.waypoints.len(),
        doc.pois.len()
    );
    serde_json::to_string_pretty(&doc)
}

/// Parses and validates `payload`, then swaps it into `store` in one step.
///
/// On any error the current plan is left exactly as it was.
pub fn import_plan_json(store: &mut FlightPlanStore, payload: &str) -> Result<(), ImportError> {
    let doc: PlanDocument = serde_json::from_str(payload).map_err(ImportError::Parse)?;
    let (waypoints, pois) = (doc.waypoints.len(), doc.pois.len());
    store
        .replace_all(doc.into_snapshot())
        .map_err(ImportError::Invalid)?;
    info!("imported plan: {waypoints} waypoints, {pois} POIs");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ImportError, PlanDocument, export_plan_json, import_plan_json};
    use foundation::ids::PoiId;
    use foundation::math::LatLng;
    use mission::{
        AdaptationMode, CameraAction, FlightPlanStore, HeadingMode, PathType, PlanError,
        PoiSpec, TerrainUpdate, WaypointSpec,
    };
    use pretty_assertions::assert_eq;

    fn sample_store() -> FlightPlanStore {
        let mut store = FlightPlanStore::new();
        let mast = store
            .add_poi(
                LatLng::new(46.948_123_456_789, 7.447_654_321),
                Some("Radio mast".to_string()),
                PoiSpec {
                    object_height_m: 42.5,
                    terrain_elevation_msl: Some(541.25),
                },
            )
            .expect("poi");
        store
            .add_waypoint(
                LatLng::new(46.947_1, 7.446_3),
                WaypointSpec::default()
                    .with_hover_time(3.5)
                    .with_camera_action(CameraAction::Photo),
            )
            .expect("wp1");
        let tracked = store
            .add_waypoint(
                LatLng::new(46.949_2, 7.448_8),
                WaypointSpec::default().with_altitude(75).tracking(mast),
            )
            .expect("wp2");
        store
            .add_waypoint(
                LatLng::new(46.950_3, 7.445_1),
                WaypointSpec::default()
                    .with_fixed_heading(137.25)
                    .with_gimbal_pitch(-35.0),
            )
            .expect("wp3");
        store.delete_waypoint(tracked).expect("delete");
        store
            .add_waypoint(
                LatLng::new(46.951_0, 7.444_0),
                WaypointSpec::default()
                    .tracking(mast)
                    .with_camera_action(CameraAction::StartRecord),
            )
            .expect("wp4");
        store.set_path_type(PathType::Curved);
        store.set_cruise_speed(11.5).expect("speed");
        store.set_home_elevation(Some(530.2)).expect("home");
        let first = store.waypoints()[0].id;
        store
            .apply_terrain_updates(
                &[TerrainUpdate {
                    id: first,
                    altitude: Some(64),
                    terrain_elevation_msl: Some(533.875),
                }],
                Some(AdaptationMode::Agl),
            )
            .expect("terrain");
        store
    }

    #[test]
    fn export_then_import_reproduces_plan() {
        let source = sample_store();
        let json = export_plan_json(&source).expect("export");

        let mut target = FlightPlanStore::new();
        import_plan_json(&mut target, &json).expect("import");

        assert_eq!(target.waypoints(), source.waypoints());
        assert_eq!(target.pois(), source.pois());
        assert_eq!(target.settings(), source.settings());
        assert_eq!(target.next_waypoint_id(), source.next_waypoint_id());
        assert_eq!(target.next_poi_id(), source.next_poi_id());

        let new_wp = target
            .add_waypoint(LatLng::new(46.0, 7.0), WaypointSpec::default())
            .expect("add");
        assert!(source.waypoints().iter().all(|w| w.id != new_wp));
        let new_poi = target
            .add_poi(LatLng::new(46.0, 7.0), None, PoiSpec::default())
            .expect("add poi");
        assert!(source.pois().iter().all(|p| p.id != new_poi));
    }

    #[test]
    fn export_uses_documented_field_names() {
        let json = export_plan_json(&sample_store()).expect("export");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");

        let wp = &value["waypoints"][2];
        assert_eq!(wp["headingControl"], "poi_track");
        assert_eq!(wp["targetPoiId"], 1);
        assert_eq!(wp["cameraAction"], "startRecord");
        assert!(wp["terrainElevationMSL"].is_null());
        assert_eq!(value["waypoints"][0]["terrainElevationMSL"], 533.875);

        let poi = &value["pois"][0];
        assert_eq!(poi["name"], "Radio mast");
        assert_eq!(poi["altitude"], 583.75);
        assert_eq!(poi["objectHeightAboveGround"], 42.5);

        let settings = &value["settings"];
        assert_eq!(settings["flightSpeed"], 11.5);
        assert_eq!(settings["pathType"], "curved");
        assert_eq!(settings["homeElevationMsl"], 530.2);
        assert_eq!(settings["lastAltitudeAdaptationMode"], "AGL");
        assert_eq!(settings["nextWaypointId"], 5);
    }

    #[test]
    fn counters_never_fall_below_imported_ids() {
        let json = r#"{
            "waypoints": [
                {"id": 41, "lat": 1.0, "lng": 2.0, "altitude": 30},
                {"id": 7, "lat": 1.1, "lng": 2.1, "altitude": 35}
            ],
            "pois": [],
            "settings": {"nextWaypointId": 3, "nextPoiId": 0}
        }"#;
        let mut store = FlightPlanStore::new();
        import_plan_json(&mut store, json).expect("import");
        assert_eq!(store.next_waypoint_id(), 42);
        assert_eq!(store.next_poi_id(), 1);
        assert_eq!(store.waypoints()[0].gimbal_pitch_deg, -90.0);
        assert_eq!(store.waypoints()[1].heading_mode, HeadingMode::Auto);
    }

    #[test]
    fn malformed_document_leaves_plan_untouched() {
        let mut store = sample_store();
        let before = store.snapshot();

        let err = import_plan_json(&mut store, "{\"waypoints\": [ {\"id\": 1 ").expect_err("parse");
        assert!(matches!(err, ImportError::Parse(_)));
        assert!(err.to_string().starts_with("Plan parse error:"));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn dangling_target_is_rejected_without_mutation() {
        let mut store = sample_store();
        let before = store.snapshot();
        let json = r#"{
            "waypoints": [{"id": 1, "lat": 1.0, "lng": 2.0, "altitude": 30,
                           "headingControl": "poi_track", "targetPoiId": 9}]
        }"#;
        let err = import_plan_json(&mut store, json).expect_err("dangling");
        assert!(matches!(
            err,
            ImportError::Invalid(PlanError::UnknownPoi(id)) if id == PoiId::new(9)
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn stray_target_on_non_tracking_waypoint_is_dropped() {
        let json = r#"{
            "waypoints": [{"id": 1, "lat": 1.0, "lng": 2.0, "altitude": 30,
                           "headingControl": "fixed", "targetPoiId": 3}]
        }"#;
        let doc: PlanDocument = serde_json::from_str(json).expect("parse");
        let mut store = FlightPlanStore::new();
        store.replace_all(doc.into_snapshot()).expect("replace");
        assert_eq!(store.waypoints()[0].target_poi, None);
    }
}
