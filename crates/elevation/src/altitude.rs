use foundation::ids::{PoiId, WaypointId};
use mission::{
    AdaptationMode, FlightPlanStore, MIN_WAYPOINT_ALTITUDE_M, PlanError, PoiField,
    SAFETY_MARGIN_AGL_M, TerrainUpdate, ValidationError,
};
use tracing::{info, warn};

use crate::batch::ElevationBatchClient;
use crate::lookup::{ElevationLookup, LookupError};

/// Smallest AGL target accepted.
pub const MIN_DESIRED_AGL_M: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum AdaptError {
    Validation(ValidationError),
    /// The plan has no home elevation to measure relative altitudes from.
    HomeElevationUnknown,
    NoWaypoints,
    Lookup(LookupError),
    Plan(PlanError),
}

impl std::fmt::Display for AdaptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdaptError::Validation(e) => write!(f, "{e}"),
            AdaptError::HomeElevationUnknown => write!(f, "home elevation is not set"),
            AdaptError::NoWaypoints => write!(f, "plan has no waypoints"),
            AdaptError::Lookup(e) => write!(f, "{e}"),
            AdaptError::Plan(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AdaptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdaptError::Validation(e) => Some(e),
            AdaptError::Lookup(e) => Some(e),
            AdaptError::Plan(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlanError> for AdaptError {
    fn from(e: PlanError) -> Self {
        AdaptError::Plan(e)
    }
}

impl From<ValidationError> for AdaptError {
    fn from(e: ValidationError) -> Self {
        AdaptError::Validation(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptationOutcome {
    /// Every waypoint was updated.
    Success,
    /// Some waypoints were updated.
    Partial,
    /// Waypoints existed but none could be updated.
    Failure,
    NoWaypoints,
}

impl AdaptationOutcome {
    fn from_counts(updated: usize, total: usize) -> Self {
        match (updated, total) {
            (_, 0) => AdaptationOutcome::NoWaypoints,
            (0, _) => AdaptationOutcome::Failure,
            (u, t) if u == t => AdaptationOutcome::Success,
            _ => AdaptationOutcome::Partial,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationReport {
    pub mode: AdaptationMode,
    pub outcome: AdaptationOutcome,
    pub updated: usize,
    /// Waypoints whose ground elevation could not be resolved.
    pub unresolved: Vec<WaypointId>,
    /// AMSL results with less than `SAFETY_MARGIN_AGL_M` of ground clearance.
    pub low_clearance: Vec<WaypointId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiRefreshReport {
    pub updated: usize,
    pub unresolved: Vec<PoiId>,
}

/// Recomputes waypoint altitudes against terrain.
///
/// Every operation borrows the store mutably until its lookups have finished,
/// so two adaptations can never interleave on the same plan.
pub struct AltitudeAdapter<'c, L> {
    client: &'c ElevationBatchClient<L>,
}

impl<'c, L: ElevationLookup> AltitudeAdapter<'c, L> {
    pub fn new(client: &'c ElevationBatchClient<L>) -> Self {
        Self { client }
    }

    /// Sets each resolvable waypoint to `desired_agl` above its own ground.
    ///
    /// Waypoints without a resolved elevation keep their altitude and are
    /// reported as unresolved.
    pub async fn adapt_to_agl(
        &self,
        store: &mut FlightPlanStore,
        desired_agl: f64,
    ) -> Result<AdaptationReport, AdaptError> {
        if !desired_agl.is_finite() || desired_agl < MIN_DESIRED_AGL_M {
            return Err(ValidationError::AglTooLow(desired_agl).into());
        }
        let home = store
            .settings()
            .home_elevation_msl
            .ok_or(AdaptError::HomeElevationUnknown)?;

        let (ids, positions): (Vec<_>, Vec<_>) =
            store.waypoints().iter().map(|w| (w.id, w.position)).unzip();
        let elevations = self.client.fetch_elevations(&positions).await;

        let mut updates = Vec::with_capacity(ids.len());
        let mut unresolved = Vec::new();
        for (id, elevation) in ids.iter().zip(elevations) {
            let Some(ground) = elevation else {
                unresolved.push(*id);
                continue;
            };
            let relative = (ground + desired_agl - home).max(MIN_WAYPOINT_ALTITUDE_M as f64);
            updates.push(TerrainUpdate {
                id: *id,
                altitude: Some(relative.round() as i32),
                terrain_elevation_msl: Some(ground),
            });
        }

        if !updates.is_empty() {
            store.apply_terrain_updates(&updates, Some(AdaptationMode::Agl))?;
        }

        let report = AdaptationReport {
            mode: AdaptationMode::Agl,
            outcome: AdaptationOutcome::from_counts(updates.len(), ids.len()),
            updated: updates.len(),
            unresolved,
            low_clearance: Vec::new(),
        };
        log_report(&report);
        Ok(report)
    }

    /// Puts every waypoint at the absolute altitude `desired_amsl`.
    ///
    /// Ground elevations only fill the terrain cache and flag waypoints left
    /// with too little clearance; they never block the update.
    pub async fn adapt_to_amsl(
        &self,
        store: &mut FlightPlanStore,
        desired_amsl: f64,
    ) -> Result<AdaptationReport, AdaptError> {
        if !desired_amsl.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "desired AMSL",
            }
            .into());
        }
        let home = store
            .settings()
            .home_elevation_msl
            .ok_or(AdaptError::HomeElevationUnknown)?;
        let altitude = (desired_amsl - home).round() as i32;

        let (ids, positions): (Vec<_>, Vec<_>) =
            store.waypoints().iter().map(|w| (w.id, w.position)).unzip();
        let elevations = self.client.fetch_elevations(&positions).await;

        let mut updates = Vec::with_capacity(ids.len());
        let mut unresolved = Vec::new();
        let mut low_clearance = Vec::new();
        for (id, elevation) in ids.iter().zip(elevations) {
            match elevation {
                Some(ground) if desired_amsl - ground < SAFETY_MARGIN_AGL_M => {
                    low_clearance.push(*id)
                }
                Some(_) => {}
                None => unresolved.push(*id),
            }
            updates.push(TerrainUpdate {
                id: *id,
                altitude: Some(altitude),
                terrain_elevation_msl: elevation,
            });
        }

        if !updates.is_empty() {
            store.apply_terrain_updates(&updates, Some(AdaptationMode::Amsl))?;
        }

        let report = AdaptationReport {
            mode: AdaptationMode::Amsl,
            outcome: AdaptationOutcome::from_counts(updates.len(), ids.len()),
            updated: updates.len(),
            unresolved,
            low_clearance,
        };
        log_report(&report);
        Ok(report)
    }

    /// Looks up ground under the first waypoint and makes it the home elevation.
    ///
    /// On failure the plan is left untouched.
    pub async fn home_elevation_from_first_waypoint(
        &self,
        store: &mut FlightPlanStore,
    ) -> Result<f64, AdaptError> {
        let first = store
            .waypoints()
            .first()
            .map(|w| w.position)
            .ok_or(AdaptError::NoWaypoints)?;
        let elevation = self
            .client
            .fetch_one(first)
            .await
            .map_err(AdaptError::Lookup)?;
        store.set_home_elevation(Some(elevation))?;
        info!("home elevation set to {elevation:.1} m MSL");
        Ok(elevation)
    }

    /// Caches ground elevation under every POI, which also moves its final
    /// altitude. Unresolved POIs keep their previous values.
    pub async fn refresh_poi_elevations(
        &self,
        store: &mut FlightPlanStore,
    ) -> Result<PoiRefreshReport, AdaptError> {
        let (ids, positions): (Vec<_>, Vec<_>) =
            store.pois().iter().map(|p| (p.id, p.position)).unzip();
        let elevations = self.client.fetch_elevations(&positions).await;

        let mut report = PoiRefreshReport {
            updated: 0,
            unresolved: Vec::new(),
        };
        for (id, elevation) in ids.into_iter().zip(elevations) {
            match elevation {
                Some(ground) => {
                    store.update_poi(id, PoiField::TerrainElevation(Some(ground)))?;
                    report.updated += 1;
                }
                None => report.unresolved.push(id),
            }
        }
        Ok(report)
    }
}

fn log_report(report: &AdaptationReport) {
    match report.outcome {
        AdaptationOutcome::Success | AdaptationOutcome::NoWaypoints => info!(
            "{:?} adaptation: {:?}, {} waypoints updated",
            report.mode, report.outcome, report.updated
        ),
        AdaptationOutcome::Partial | AdaptationOutcome::Failure => warn!(
            "{:?} adaptation: {:?}, {} updated, {} unresolved",
            report.mode,
            report.outcome,
            report.updated,
            report.unresolved.len()
        ),
    }
    if !report.low_clearance.is_empty() {
        warn!(
            "{} waypoints below {SAFETY_MARGIN_AGL_M} m ground clearance",
            report.low_clearance.len()
        );
    }
}
