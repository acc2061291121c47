use foundation::bounds::GeoBounds;
use foundation::ids::{PoiId, WaypointId};
use foundation::math::{LatLng, destination_point};

use crate::error::{PlanError, ValidationError};
use crate::model::{Poi, WaypointSpec};
use crate::store::FlightPlanStore;

pub const MIN_ORBIT_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    pub radius_m: f64,
    pub point_count: usize,
    pub altitude: i32,
}

impl OrbitParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(ValidationError::NonPositiveRadius(self.radius_m));
        }
        if self.point_count < MIN_ORBIT_POINTS {
            return Err(ValidationError::TooFewOrbitPoints(self.point_count));
        }
        Ok(())
    }
}

/// Waypoints evenly spaced on a circle around `center`, starting due north
/// and proceeding clockwise. Each one tracks the POI.
pub fn generate_orbit(
    center: &Poi,
    params: &OrbitParams,
    gimbal_pitch_deg: f64,
) -> Result<Vec<(LatLng, WaypointSpec)>, ValidationError> {
    params.validate()?;
    let n = params.point_count;
    Ok((0..n)
        .map(|i| {
            let bearing = i as f64 / n as f64 * std::f64::consts::TAU;
            let position = destination_point(center.position, bearing, params.radius_m);
            let spec = WaypointSpec::default()
                .with_altitude(params.altitude)
                .with_gimbal_pitch(gimbal_pitch_deg)
                .tracking(center.id);
            (position, spec)
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitOutcome {
    pub waypoints: Vec<WaypointId>,
    /// Area the map view should be refit to.
    pub bounds: Option<GeoBounds>,
}

impl FlightPlanStore {
    /// Appends an orbit around POI `center` in generation order.
    pub fn add_orbit(
        &mut self,
        center: PoiId,
        params: &OrbitParams,
    ) -> Result<OrbitOutcome, PlanError> {
        let poi = self.poi(center).ok_or(PlanError::UnknownPoi(center))?;
        let ring = generate_orbit(poi, params, self.settings().default_gimbal_pitch_deg)?;
        let waypoints = self.add_waypoints(ring)?;
        Ok(OrbitOutcome {
            waypoints,
            bounds: self.bounds(),
        })
    }
}
