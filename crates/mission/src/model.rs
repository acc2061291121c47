use foundation::ids::{PoiId, WaypointId};
use foundation::math::LatLng;

/// Lowest altitude (meters, relative to home) the planner will assign on its own.
pub const MIN_WAYPOINT_ALTITUDE_M: i32 = 5;
/// Minimum ground clearance before a result is flagged as unsafe.
pub const SAFETY_MARGIN_AGL_M: f64 = 5.0;

/// Aircraft yaw policy at a waypoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeadingMode {
    #[default]
    Auto,
    Fixed,
    PoiTrack,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CameraAction {
    #[default]
    None,
    Photo,
    StartRecord,
    StopRecord,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PathType {
    #[default]
    Straight,
    Curved,
}

/// Which target the most recent altitude adaptation aimed for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdaptationMode {
    Agl,
    Amsl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub position: LatLng,
    /// Meters relative to `PlanSettings::home_elevation_msl`.
    pub altitude: i32,
    pub hover_time_s: f64,
    pub gimbal_pitch_deg: f64,
    pub heading_mode: HeadingMode,
    /// Only meaningful when `heading_mode` is `Fixed`.
    pub fixed_heading_deg: f64,
    /// Always `None` unless `heading_mode` is `PoiTrack`.
    pub target_poi: Option<PoiId>,
    pub camera_action: CameraAction,
    pub terrain_elevation_msl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    pub position: LatLng,
    pub object_height_m: f64,
    pub terrain_elevation_msl: Option<f64>,
}

impl Poi {
    pub fn new(
        id: PoiId,
        name: impl Into<String>,
        position: LatLng,
        object_height_m: f64,
        terrain_elevation_msl: Option<f64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            object_height_m,
            terrain_elevation_msl,
        }
    }

    /// Terrain elevation (0 when unknown) plus the object height.
    pub fn final_altitude_amsl(&self) -> f64 {
        self.terrain_elevation_msl.unwrap_or(0.0) + self.object_height_m
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanSettings {
    pub default_altitude: i32,
    pub cruise_speed_mps: f64,
    pub path_type: PathType,
    pub home_elevation_msl: Option<f64>,
    pub default_gimbal_pitch_deg: f64,
    pub last_adaptation_mode: Option<AdaptationMode>,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            default_altitude: 60,
            cruise_speed_mps: 8.0,
            path_type: PathType::Straight,
            home_elevation_msl: None,
            default_gimbal_pitch_deg: -90.0,
            last_adaptation_mode: None,
        }
    }
}

/// Typed construction record for a waypoint.
///
/// Fields left as `None` take the plan defaults when the waypoint is added:
/// altitude and gimbal pitch from `PlanSettings`, everything else neutral.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaypointSpec {
    pub altitude: Option<i32>,
    pub hover_time_s: f64,
    pub gimbal_pitch_deg: Option<f64>,
    pub heading_mode: HeadingMode,
    pub fixed_heading_deg: f64,
    pub target_poi: Option<PoiId>,
    pub camera_action: CameraAction,
    pub terrain_elevation_msl: Option<f64>,
}

impl WaypointSpec {
    pub fn with_altitude(mut self, altitude: i32) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_hover_time(mut self, seconds: f64) -> Self {
        self.hover_time_s = seconds;
        self
    }

    pub fn with_gimbal_pitch(mut self, degrees: f64) -> Self {
        self.gimbal_pitch_deg = Some(degrees);
        self
    }

    pub fn with_fixed_heading(mut self, degrees: f64) -> Self {
        self.heading_mode = HeadingMode::Fixed;
        self.fixed_heading_deg = degrees;
        self
    }

    pub fn tracking(mut self, poi: PoiId) -> Self {
        self.heading_mode = HeadingMode::PoiTrack;
        self.target_poi = Some(poi);
        self
    }

    pub fn with_camera_action(mut self, action: CameraAction) -> Self {
        self.camera_action = action;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoiSpec {
    pub object_height_m: f64,
    pub terrain_elevation_msl: Option<f64>,
}

/// A single-field waypoint edit, as issued by the edit panels.
#[derive(Debug, Clone, PartialEq)]
pub enum WaypointField {
    Position(LatLng),
    Altitude(i32),
    HoverTime(f64),
    GimbalPitch(f64),
    /// Leaving `PoiTrack` clears the target.
    HeadingMode(HeadingMode),
    FixedHeading(f64),
    /// `Some` switches the heading mode to `PoiTrack`; `None` reverts to `Auto`.
    TargetPoi(Option<PoiId>),
    CameraAction(CameraAction),
    TerrainElevation(Option<f64>),
}

impl WaypointField {
    pub fn name(&self) -> &'static str {
        match self {
            WaypointField::Position(_) => "position",
            WaypointField::Altitude(_) => "altitude",
            WaypointField::HoverTime(_) => "hover_time",
            WaypointField::GimbalPitch(_) => "gimbal_pitch",
            WaypointField::HeadingMode(_) => "heading_mode",
            WaypointField::FixedHeading(_) => "fixed_heading",
            WaypointField::TargetPoi(_) => "target_poi",
            WaypointField::CameraAction(_) => "camera_action",
            WaypointField::TerrainElevation(_) => "terrain_elevation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoiField {
    Name(String),
    Position(LatLng),
    ObjectHeight(f64),
    TerrainElevation(Option<f64>),
}

/// Altitude/terrain cache update for one waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainUpdate {
    pub id: WaypointId,
    pub altitude: Option<i32>,
    pub terrain_elevation_msl: Option<f64>,
}
