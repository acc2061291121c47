use foundation::ids::{PoiId, WaypointId};

/// Numeric or structural input rejected before any mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidPosition { lat_deg: f64, lng_deg: f64 },
    NegativeHoverTime(f64),
    NegativeObjectHeight(f64),
    NonFinite { field: &'static str },
    NonPositiveSpeed(f64),
    NonPositiveRadius(f64),
    TooFewOrbitPoints(usize),
    AglTooLow(f64),
    DuplicateWaypointId(WaypointId),
    DuplicatePoiId(PoiId),
    /// `PoiTrack` heading without a target POI.
    MissingTrackTarget(WaypointId),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidPosition { lat_deg, lng_deg } => {
                write!(f, "invalid position: {lat_deg},{lng_deg}")
            }
            ValidationError::NegativeHoverTime(v) => write!(f, "hover time must be >= 0 (got {v})"),
            ValidationError::NegativeObjectHeight(v) => {
                write!(f, "object height must be >= 0 (got {v})")
            }
            ValidationError::NonFinite { field } => write!(f, "{field} must be a finite number"),
            ValidationError::NonPositiveSpeed(v) => write!(f, "speed must be > 0 (got {v})"),
            ValidationError::NonPositiveRadius(v) => {
                write!(f, "orbit radius must be > 0 (got {v})")
            }
            ValidationError::TooFewOrbitPoints(n) => {
                write!(f, "orbit needs at least 3 points (got {n})")
            }
            ValidationError::AglTooLow(v) => write!(f, "desired AGL must be >= 1 m (got {v})"),
            ValidationError::DuplicateWaypointId(id) => write!(f, "duplicate waypoint id {id}"),
            ValidationError::DuplicatePoiId(id) => write!(f, "duplicate POI id {}", id.get()),
            ValidationError::MissingTrackTarget(id) => {
                write!(f, "waypoint {id} tracks a POI but has no target")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    Validation(ValidationError),
    UnknownWaypoint(WaypointId),
    UnknownPoi(PoiId),
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::Validation(e) => write!(f, "validation error: {e}"),
            PlanError::UnknownWaypoint(id) => write!(f, "no waypoint with id {id}"),
            PlanError::UnknownPoi(id) => write!(f, "no POI with id {}", id.get()),
            PlanError::IndexOutOfRange { index, len } => {
                write!(f, "waypoint index {index} out of range (len {len})")
            }
        }
    }
}

impl std::error::Error for PlanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlanError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for PlanError {
    fn from(e: ValidationError) -> Self {
        PlanError::Validation(e)
    }
}
