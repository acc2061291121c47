//! Wayline mission archive (KMZ) export.
//!
//! Layout:
//! ```text
//! wpmz/
//!   res/
//!   template.kml
//!   waylines.wpml
//! ```

use std::io::{Cursor, Write};

use mission::path::{compute_path, compute_statistics};
use mission::{CameraAction, FlightPlanStore, HeadingMode, PathType, Waypoint};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::xml::XmlWriter;

pub const KMZ_MIME: &str = "application/vnd.google-earth.kmz";
pub const TEMPLATE_PATH: &str = "wpmz/template.kml";
pub const WAYLINES_PATH: &str = "wpmz/waylines.wpml";
pub const RESOURCE_DIR: &str = "wpmz/res/";

const KML_NS: &str = "http://www.opengis.net/kml/2.2";
const WPML_NS: &str = "http://www.dji.com/wpmz/1.0.2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishAction {
    #[default]
    GoHome,
    NoAction,
    AutoLand,
    GotoFirstWaypoint,
}

impl FinishAction {
    pub fn as_str(self) -> &'static str {
        match self {
            FinishAction::GoHome => "goHome",
            FinishAction::NoAction => "noAction",
            FinishAction::AutoLand => "autoLand",
            FinishAction::GotoFirstWaypoint => "gotoFirstWaypoint",
        }
    }
}

/// Behavior after losing the remote controller link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RcLostAction {
    #[default]
    GoBack,
    Landing,
    Hover,
    /// Keep flying the wayline.
    Continue,
}

impl RcLostAction {
    fn exit_on_rc_lost(self) -> &'static str {
        match self {
            RcLostAction::Continue => "goContinue",
            _ => "executeLostAction",
        }
    }

    fn execute_action(self) -> &'static str {
        match self {
            RcLostAction::GoBack | RcLostAction::Continue => "goBack",
            RcLostAction::Landing => "landing",
            RcLostAction::Hover => "hover",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaylineOptions {
    pub drone_enum_value: u32,
    pub drone_sub_enum_value: u32,
    pub finish_action: FinishAction,
    pub rc_lost_action: RcLostAction,
    /// Speed to the first waypoint. `None` uses the plan cruise speed.
    pub transitional_speed_mps: Option<f64>,
    pub take_off_security_height_m: f64,
    pub author: Option<String>,
    /// Epoch milliseconds written as create/update time.
    pub timestamp_ms: Option<u64>,
}

impl Default for WaylineOptions {
    fn default() -> Self {
        Self {
            drone_enum_value: 68,
            drone_sub_enum_value: 0,
            finish_action: FinishAction::GoHome,
            rc_lost_action: RcLostAction::GoBack,
            transitional_speed_mps: None,
            take_off_security_height_m: 20.0,
            author: None,
            timestamp_ms: None,
        }
    }
}

#[derive(Debug)]
pub enum ArchiveError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io(err) => write!(f, "I/O error: {err}"),
            ArchiveError::Zip(err) => write!(f, "Archive error: {err}"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(err) => Some(err),
            ArchiveError::Zip(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err)
    }
}

pub fn export_wayline_archive(
    store: &FlightPlanStore,
    options: &WaylineOptions,
) -> Result<Vec<u8>, ArchiveError> {
    let template = template_kml(store, options);
    let waylines = waylines_wpml(store, options);

    let file_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_directory(RESOURCE_DIR, file_options)?;
    zip.start_file(TEMPLATE_PATH, file_options)?;
    zip.write_all(template.as_bytes())?;
    zip.start_file(WAYLINES_PATH, file_options)?;
    zip.write_all(waylines.as_bytes())?;
    let bytes = zip.finish()?.into_inner();

    info!(
        "exported wayline archive: {} waypoints, {} bytes",
        store.waypoints().len(),
        bytes.len()
    );
    Ok(bytes)
}

fn transitional_speed(store: &FlightPlanStore, options: &WaylineOptions) -> f64 {
    options
        .transitional_speed_mps
        .unwrap_or(store.settings().cruise_speed_mps)
}

fn write_mission_config(xml: &mut XmlWriter, store: &FlightPlanStore, options: &WaylineOptions) {
    xml.open("wpml:missionConfig");
    xml.leaf("wpml:flyToWaylineMode", "safely");
    xml.leaf("wpml:finishAction", options.finish_action.as_str());
    xml.leaf(
        "wpml:exitOnRCLost",
        options.rc_lost_action.exit_on_rc_lost(),
    );
    xml.leaf(
        "wpml:executeRCLostAction",
        options.rc_lost_action.execute_action(),
    );
    xml.leaf(
        "wpml:takeOffSecurityHeight",
        options.take_off_security_height_m,
    );
    xml.leaf(
        "wpml:globalTransitionalSpeed",
        transitional_speed(store, options),
    );
    xml.open("wpml:droneInfo");
    xml.leaf("wpml:droneEnumValue", options.drone_enum_value);
    xml.leaf("wpml:droneSubEnumValue", options.drone_sub_enum_value);
    xml.close("wpml:droneInfo");
    xml.close("wpml:missionConfig");
}

/// Mission-level document: identity, timestamps and mission config.
pub fn template_kml(store: &FlightPlanStore, options: &WaylineOptions) -> String {
    let mut xml = XmlWriter::new();
    xml.open_with("kml", &[("xmlns", KML_NS), ("xmlns:wpml", WPML_NS)]);
    xml.open("Document");
    if let Some(author) = &options.author {
        xml.leaf("wpml:author", author);
    }
    if let Some(ts) = options.timestamp_ms {
        xml.leaf("wpml:createTime", ts);
        xml.leaf("wpml:updateTime", ts);
    }
    write_mission_config(&mut xml, store, options);
    xml.close("Document");
    xml.close("kml");
    xml.finish()
}

/// Executable wayline: one `Placemark` per waypoint, in flight order.
pub fn waylines_wpml(store: &FlightPlanStore, options: &WaylineOptions) -> String {
    let settings = store.settings();
    let speed = settings.cruise_speed_mps;
    let render = compute_path(store.waypoints(), settings.path_type);
    let stats = compute_statistics(store.waypoints(), &render, speed);

    let mut xml = XmlWriter::new();
    xml.open_with("kml", &[("xmlns", KML_NS), ("xmlns:wpml", WPML_NS)]);
    xml.open("Document");
    write_mission_config(&mut xml, store, options);
    xml.open("Folder");
    xml.leaf("wpml:templateId", 0);
    xml.leaf("wpml:executeHeightMode", "relativeToStartPoint");
    xml.leaf("wpml:waylineId", 0);
    xml.leaf("wpml:distance", format!("{:.1}", stats.distance_m));
    xml.leaf("wpml:duration", format!("{:.1}", stats.duration_s));
    xml.leaf("wpml:autoFlightSpeed", speed);

    let mut ids = ActionIds::default();
    for (index, wp) in store.waypoints().iter().enumerate() {
        write_placemark(&mut xml, store, wp, index, &mut ids);
    }

    xml.close("Folder");
    xml.close("Document");
    xml.close("kml");
    xml.finish()
}

/// Action and action-group counters, shared across the whole export.
#[derive(Debug, Default)]
struct ActionIds {
    next_group: u32,
    next_action: u32,
}

impl ActionIds {
    fn group(&mut self) -> u32 {
        let id = self.next_group;
        self.next_group += 1;
        id
    }

    fn action(&mut self) -> u32 {
        let id = self.next_action;
        self.next_action += 1;
        id
    }
}

fn write_placemark(
    xml: &mut XmlWriter,
    store: &FlightPlanStore,
    wp: &Waypoint,
    index: usize,
    ids: &mut ActionIds,
) {
    let settings = store.settings();
    xml.open("Placemark");
    xml.open("Point");
    xml.leaf(
        "coordinates",
        format!("{},{}", wp.position.lng_deg, wp.position.lat_deg),
    );
    xml.close("Point");
    xml.leaf("wpml:index", index);
    xml.leaf("wpml:executeHeight", wp.altitude);
    xml.leaf("wpml:waypointSpeed", settings.cruise_speed_mps);

    xml.open("wpml:waypointHeadingParam");
    let tracked = wp.target_poi.and_then(|id| store.poi(id));
    match (wp.heading_mode, tracked) {
        (HeadingMode::PoiTrack, Some(poi)) => {
            xml.leaf("wpml:waypointHeadingMode", "towardPOI");
            xml.leaf("wpml:waypointHeadingAngle", 0);
            xml.leaf(
                "wpml:waypointPoiPoint",
                format!(
                    "{},{},{}",
                    poi.position.lat_deg,
                    poi.position.lng_deg,
                    poi.final_altitude_amsl()
                ),
            );
        }
        (HeadingMode::Fixed, _) => {
            xml.leaf("wpml:waypointHeadingMode", "lockCourse");
            xml.leaf("wpml:waypointHeadingAngle", wp.fixed_heading_deg);
        }
        _ => {
            xml.leaf("wpml:waypointHeadingMode", "followWayline");
            xml.leaf("wpml:waypointHeadingAngle", 0);
        }
    }
    xml.leaf("wpml:waypointHeadingPathMode", "followBadArc");
    xml.close("wpml:waypointHeadingParam");

    xml.open("wpml:waypointTurnParam");
    let (turn_mode, straight) = match settings.path_type {
        PathType::Straight => ("toPointAndStopWithContinuityCurvature", 1),
        PathType::Curved => ("toPointAndPassWithContinuityCurvature", 0),
    };
    xml.leaf("wpml:waypointTurnMode", turn_mode);
    xml.leaf("wpml:waypointTurnDampingDist", 0);
    xml.close("wpml:waypointTurnParam");
    xml.leaf("wpml:useStraightLine", straight);

    xml.open("wpml:waypointGimbalHeadingParam");
    xml.leaf("wpml:waypointGimbalPitchAngle", wp.gimbal_pitch_deg);
    xml.leaf("wpml:waypointGimbalYawAngle", 0);
    xml.close("wpml:waypointGimbalHeadingParam");

    if wp.hover_time_s > 0.0 || wp.camera_action != CameraAction::None {
        write_action_group(xml, wp, index, ids);
    }
    xml.close("Placemark");
}

fn write_action_group(xml: &mut XmlWriter, wp: &Waypoint, index: usize, ids: &mut ActionIds) {
    xml.open("wpml:actionGroup");
    xml.leaf("wpml:actionGroupId", ids.group());
    xml.leaf("wpml:actionGroupStartIndex", index);
    xml.leaf("wpml:actionGroupEndIndex", index);
    xml.leaf("wpml:actionGroupMode", "parallel");
    xml.open("wpml:actionTrigger");
    xml.leaf("wpml:actionTriggerType", "reachPoint");
    xml.close("wpml:actionTrigger");

    if wp.hover_time_s > 0.0 {
        xml.open("wpml:action");
        xml.leaf("wpml:actionId", ids.action());
        xml.leaf("wpml:actionActuatorFunc", "hover");
        xml.open("wpml:actionActuatorFuncParam");
        xml.leaf("wpml:hoverTime", wp.hover_time_s);
        xml.close("wpml:actionActuatorFuncParam");
        xml.close("wpml:action");
    }

    let camera = match wp.camera_action {
        CameraAction::None => None,
        CameraAction::Photo => Some("takePhoto"),
        CameraAction::StartRecord => Some("startRecord"),
        CameraAction::StopRecord => Some("stopRecord"),
    };
    if let Some(func) = camera {
        xml.open("wpml:action");
        xml.leaf("wpml:actionId", ids.action());
        xml.leaf("wpml:actionActuatorFunc", func);
        xml.open("wpml:actionActuatorFuncParam");
        xml.leaf("wpml:payloadPositionIndex", 0);
        xml.close("wpml:actionActuatorFuncParam");
        xml.close("wpml:action");
    }
    xml.close("wpml:actionGroup");
}

#[cfg(test)]
mod tests {
    use super::{
        RESOURCE_DIR, TEMPLATE_PATH, WAYLINES_PATH, WaylineOptions, export_wayline_archive,
        template_kml, waylines_wpml,
    };
    use foundation::math::LatLng;
    use mission::{CameraAction, FlightPlanStore, PathType, PoiSpec, WaypointSpec};
    use std::io::{Cursor, Read};

    fn sample_store() -> FlightPlanStore {
        let mut store = FlightPlanStore::new();
        let tower = store
            .add_poi(
                LatLng::new(52.5, 13.4),
                Some("Tower & Co".to_string()),
                PoiSpec {
                    object_height_m: 30.0,
                    terrain_elevation_msl: Some(35.0),
                },
            )
            .expect("poi");
        store
            .add_waypoint(
                LatLng::new(52.501, 13.401),
                WaypointSpec::default()
                    .with_hover_time(4.0)
                    .with_camera_action(CameraAction::Photo),
            )
            .expect("wp");
        store
            .add_waypoint(
                LatLng::new(52.502, 13.402),
                WaypointSpec::default().with_fixed_heading(90.0),
            )
            .expect("wp");
        store
            .add_waypoint(
                LatLng::new(52.503, 13.401),
                WaypointSpec::default()
                    .tracking(tower)
                    .with_camera_action(CameraAction::StartRecord),
            )
            .expect("wp");
        store
    }

    fn tag_values<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        doc.split(open.as_str())
            .skip(1)
            .filter_map(|rest| rest.split(close.as_str()).next())
            .collect()
    }

    #[test]
    fn archive_has_fixed_layout() {
        let bytes =
            export_wayline_archive(&sample_store(), &WaylineOptions::default()).expect("export");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [RESOURCE_DIR, TEMPLATE_PATH, WAYLINES_PATH] {
            assert!(names.contains(&expected), "missing {expected}");
        }
        assert_eq!(names.len(), 3);

        let mut waylines = String::new();
        archive
            .by_name(WAYLINES_PATH)
            .expect("waylines")
            .read_to_string(&mut waylines)
            .expect("read");
        assert_eq!(tag_values(&waylines, "wpml:index"), vec!["0", "1", "2"]);
    }

    #[test]
    fn heading_blocks_follow_heading_mode() {
        let doc = waylines_wpml(&sample_store(), &WaylineOptions::default());
        assert_eq!(
            tag_values(&doc, "wpml:waypointHeadingMode"),
            vec!["followWayline", "lockCourse", "towardPOI"]
        );
        assert_eq!(tag_values(&doc, "wpml:waypointPoiPoint"), vec!["52.5,13.4,65"]);
        assert_eq!(
            tag_values(&doc, "wpml:executeHeightMode"),
            vec!["relativeToStartPoint"]
        );
        assert_eq!(tag_values(&doc, "wpml:executeHeight"), vec!["60", "60", "60"]);
    }

    #[test]
    fn turn_mode_follows_path_type() {
        let mut store = sample_store();
        let doc = waylines_wpml(&store, &WaylineOptions::default());
        assert!(
            tag_values(&doc, "wpml:waypointTurnMode")
                .iter()
                .all(|m| *m == "toPointAndStopWithContinuityCurvature")
        );

        store.set_path_type(PathType::Curved);
        let doc = waylines_wpml(&store, &WaylineOptions::default());
        assert!(
            tag_values(&doc, "wpml:waypointTurnMode")
                .iter()
                .all(|m| *m == "toPointAndPassWithContinuityCurvature")
        );
    }

    #[test]
    fn action_ids_increase_across_the_export() {
        let doc = waylines_wpml(&sample_store(), &WaylineOptions::default());
        // Waypoint 0 hovers and shoots, 1 has no actions, 2 starts recording.
        assert_eq!(tag_values(&doc, "wpml:actionGroupId"), vec!["0", "1"]);
        assert_eq!(tag_values(&doc, "wpml:actionGroupStartIndex"), vec!["0", "2"]);
        assert_eq!(tag_values(&doc, "wpml:actionId"), vec!["0", "1", "2"]);
        assert_eq!(
            tag_values(&doc, "wpml:actionActuatorFunc"),
            vec!["hover", "takePhoto", "startRecord"]
        );
        assert!(
            tag_values(&doc, "wpml:actionGroupMode")
                .iter()
                .all(|m| *m == "parallel")
        );
        assert!(
            tag_values(&doc, "wpml:actionTriggerType")
                .iter()
                .all(|t| *t == "reachPoint")
        );
    }

    #[test]
    fn template_carries_mission_config() {
        let options = WaylineOptions {
            transitional_speed_mps: Some(12.0),
            author: Some("ops".to_string()),
            timestamp_ms: Some(1_700_000_000_000),
            ..WaylineOptions::default()
        };
        let doc = template_kml(&sample_store(), &options);
        assert_eq!(tag_values(&doc, "wpml:globalTransitionalSpeed"), vec!["12"]);
        assert_eq!(tag_values(&doc, "wpml:finishAction"), vec!["goHome"]);
        assert_eq!(tag_values(&doc, "wpml:executeRCLostAction"), vec!["goBack"]);
        assert_eq!(tag_values(&doc, "wpml:droneEnumValue"), vec!["68"]);
        assert_eq!(tag_values(&doc, "wpml:createTime"), vec!["1700000000000"]);

        let defaults = template_kml(&sample_store(), &WaylineOptions::default());
        assert_eq!(tag_values(&defaults, "wpml:globalTransitionalSpeed"), vec!["8"]);
        assert!(tag_values(&defaults, "wpml:author").is_empty());
    }
}
