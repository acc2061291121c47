use std::collections::HashSet;

use foundation::bounds::GeoBounds;
use foundation::ids::{PoiId, WaypointId};
use foundation::math::{LatLng, haversine_distance};

use crate::error::{PlanError, ValidationError};
use crate::events::{ChangeLog, PlanChange, PlanEvent};
use crate::model::{
    AdaptationMode, HeadingMode, MIN_WAYPOINT_ALTITUDE_M, PathType, PlanSettings, Poi, PoiField,
    PoiSpec, TerrainUpdate, Waypoint, WaypointField, WaypointSpec,
};

/// Complete plan content, as exported to or imported from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSnapshot {
    pub waypoints: Vec<Waypoint>,
    pub pois: Vec<Poi>,
    pub settings: PlanSettings,
    pub next_waypoint_id: u32,
    pub next_poi_id: u32,
}

/// Single owner of the flight plan.
///
/// Every command validates its input completely before touching state, so a
/// failed command leaves the plan exactly as it was. Successful commands bump
/// the revision and record one or more `PlanEvent`s for observers to drain.
#[derive(Debug)]
pub struct FlightPlanStore {
    waypoints: Vec<Waypoint>,
    pois: Vec<Poi>,
    settings: PlanSettings,
    next_waypoint_id: u32,
    next_poi_id: u32,
    revision: u64,
    log: ChangeLog,
}

impl Default for FlightPlanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightPlanStore {
    pub fn new() -> Self {
        Self::with_settings(PlanSettings::default())
    }

    pub fn with_settings(settings: PlanSettings) -> Self {
        Self {
            waypoints: Vec::new(),
            pois: Vec::new(),
            settings,
            next_waypoint_id: 1,
            next_poi_id: 1,
            revision: 0,
            log: ChangeLog::new(),
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn settings(&self) -> &PlanSettings {
        &self.settings
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|w| w.id == id)
    }

    pub fn waypoint_index(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|w| w.id == id)
    }

    pub fn poi(&self, id: PoiId) -> Option<&Poi> {
        self.pois.iter().find(|p| p.id == id)
    }

    pub fn next_waypoint_id(&self) -> u32 {
        self.next_waypoint_id
    }

    pub fn next_poi_id(&self) -> u32 {
        self.next_poi_id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn events(&self) -> &[PlanEvent] {
        self.log.events()
    }

    pub fn drain_events(&mut self) -> Vec<PlanEvent> {
        self.log.drain()
    }

    pub fn snapshot(&self) -> PlanSnapshot {
        PlanSnapshot {
            waypoints: self.waypoints.clone(),
            pois: self.pois.clone(),
            settings: self.settings.clone(),
            next_waypoint_id: self.next_waypoint_id,
            next_poi_id: self.next_poi_id,
        }
    }

    /// Bounding box over every waypoint and POI, for fitting the map view.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(
            self.waypoints
                .iter()
                .map(|w| w.position)
                .chain(self.pois.iter().map(|p| p.position)),
        )
    }

    pub fn add_waypoint(
        &mut self,
        position: LatLng,
        spec: WaypointSpec,
    ) -> Result<WaypointId, PlanError> {
        let id = WaypointId::new(self.next_waypoint_id);
        let waypoint = self.build_waypoint(id, position, spec)?;
        self.next_waypoint_id += 1;
        self.waypoints.push(waypoint);
        let rev = self.bump();
        self.log.emit(rev, PlanChange::WaypointAdded(id));
        Ok(id)
    }

    /// Appends several waypoints as one command; none are added if any is invalid.
    pub fn add_waypoints(
        &mut self,
        items: impl IntoIterator<Item = (LatLng, WaypointSpec)>,
    ) -> Result<Vec<WaypointId>, PlanError> {
        let mut next = self.next_waypoint_id;
        let mut built = Vec::new();
        for (position, spec) in items {
            built.push(self.build_waypoint(WaypointId::new(next), position, spec)?);
            next += 1;
        }

        self.next_waypoint_id = next;
        let rev = self.bump();
        let ids: Vec<WaypointId> = built.iter().map(|w| w.id).collect();
        for id in &ids {
            self.log.emit(rev, PlanChange::WaypointAdded(*id));
        }
        self.waypoints.extend(built);
        Ok(ids)
    }

    pub fn delete_waypoint(&mut self, id: WaypointId) -> Result<Waypoint, PlanError> {
        let idx = self
            .waypoint_index(id)
            .ok_or(PlanError::UnknownWaypoint(id))?;
        let removed = self.waypoints.remove(idx);
        let rev = self.bump();
        self.log.emit(rev, PlanChange::WaypointRemoved(id));
        Ok(removed)
    }

    /// Inserts a waypoint between `index` and `index + 1`, interpolating its
    /// altitude from the two neighbours.
    pub fn insert_waypoint_after(
        &mut self,
        index: usize,
        position: LatLng,
    ) -> Result<WaypointId, PlanError> {
        let altitude = self.interpolated_altitude(index, position)?;
        let id = WaypointId::new(self.next_waypoint_id);
        let waypoint =
            self.build_waypoint(id, position, WaypointSpec::default().with_altitude(altitude))?;
        self.next_waypoint_id += 1;
        self.waypoints.insert(index + 1, waypoint);
        let rev = self.bump();
        self.log.emit(rev, PlanChange::WaypointAdded(id));
        Ok(id)
    }

    /// Altitude for a point placed after waypoint `index`.
    ///
    /// Linear in the distance from waypoint `index` relative to the segment
    /// length (ratio clamped to [0, 1]), rounded, never below
    /// `MIN_WAYPOINT_ALTITUDE_M`. After the last waypoint its altitude is reused.
    pub fn interpolated_altitude(&self, index: usize, position: LatLng) -> Result<i32, PlanError> {
        let first = self.waypoints.get(index).ok_or(PlanError::IndexOutOfRange {
            index,
            len: self.waypoints.len(),
        })?;
        let Some(second) = self.waypoints.get(index + 1) else {
            return Ok(first.altitude.max(MIN_WAYPOINT_ALTITUDE_M));
        };

        let segment = haversine_distance(first.position, second.position);
        let ratio = if segment > 0.0 {
            (haversine_distance(first.position, position) / segment).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let altitude =
            first.altitude as f64 + (second.altitude - first.altitude) as f64 * ratio;
        Ok((altitude.round() as i32).max(MIN_WAYPOINT_ALTITUDE_M))
    }

    pub fn move_waypoint(&mut self, id: WaypointId, position: LatLng) -> Result<(), PlanError> {
        self.update_waypoint(id, WaypointField::Position(position))
    }

    /// Moves the waypoint at `from` so it ends up at index `to`.
    pub fn reorder_waypoint(&mut self, from: usize, to: usize) -> Result<(), PlanError> {
        let len = self.waypoints.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlanError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let waypoint = self.waypoints.remove(from);
        self.waypoints.insert(to, waypoint);
        let rev = self.bump();
        self.log.emit(rev, PlanChange::WaypointsReordered);
        Ok(())
    }

    /// Removes every waypoint and POI. Settings and id counters survive.
    pub fn clear_all(&mut self) {
        self.waypoints.clear();
        self.pois.clear();
        let rev = self.bump();
        self.log.emit(rev, PlanChange::Cleared);
    }

    pub fn update_waypoint(&mut self, id: WaypointId, field: WaypointField) -> Result<(), PlanError> {
        let idx = self
            .waypoint_index(id)
            .ok_or(PlanError::UnknownWaypoint(id))?;
        let mut updated = self.waypoints[idx].clone();
        self.apply_field(&mut updated, &field)?;
        self.waypoints[idx] = updated;

        let rev = self.bump();
        self.log.emit(rev, change_for_field(id, &field));
        Ok(())
    }

    /// Applies one field edit to several waypoints atomically.
    pub fn update_waypoints(
        &mut self,
        ids: &[WaypointId],
        field: WaypointField,
    ) -> Result<(), PlanError> {
        let mut staged = Vec::with_capacity(ids.len());
        for &id in ids {
            let idx = self
                .waypoint_index(id)
                .ok_or(PlanError::UnknownWaypoint(id))?;
            let mut updated = self.waypoints[idx].clone();
            self.apply_field(&mut updated, &field)?;
            staged.push((idx, updated));
        }

        let rev = self.bump();
        for (idx, updated) in staged {
            let id = updated.id;
            self.waypoints[idx] = updated;
            self.log.emit(rev, change_for_field(id, &field));
        }
        Ok(())
    }

    pub fn add_poi(
        &mut self,
        position: LatLng,
        name: Option<String>,
        spec: PoiSpec,
    ) -> Result<PoiId, PlanError> {
        check_position(position)?;
        check_object_height(spec.object_height_m)?;
        if let Some(g) = spec.terrain_elevation_msl {
            check_finite(g, "terrain elevation")?;
        }

        let id = PoiId::new(self.next_poi_id);
        let name = name.unwrap_or_else(|| id.to_string());
        self.next_poi_id += 1;
        self.pois.push(Poi::new(
            id,
            name,
            position,
            spec.object_height_m,
            spec.terrain_elevation_msl,
        ));
        let rev = self.bump();
        self.log.emit(rev, PlanChange::PoiAdded(id));
        Ok(id)
    }

    /// Deletes a POI and detaches every waypoint that tracked it.
    ///
    /// Returns the ids of the detached waypoints; their heading reverts to `Auto`.
    pub fn delete_poi(&mut self, id: PoiId) -> Result<Vec<WaypointId>, PlanError> {
        let idx = self
            .pois
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlanError::UnknownPoi(id))?;
        self.pois.remove(idx);

        let rev = self.bump();
        let mut detached = Vec::new();
        for wp in self.waypoints.iter_mut().filter(|w| w.target_poi == Some(id)) {
            wp.target_poi = None;
            wp.heading_mode = HeadingMode::Auto;
            detached.push(wp.id);
        }
        self.log.emit(rev, PlanChange::PoiRemoved(id));
        for wp in &detached {
            self.log.emit(
                rev,
                PlanChange::WaypointUpdated {
                    id: *wp,
                    field: "target_poi",
                },
            );
        }
        Ok(detached)
    }

    pub fn update_poi(&mut self, id: PoiId, field: PoiField) -> Result<(), PlanError> {
        let idx = self
            .pois
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlanError::UnknownPoi(id))?;
        match &field {
            PoiField::Name(_) => {}
            PoiField::Position(p) => check_position(*p)?,
            PoiField::ObjectHeight(h) => check_object_height(*h)?,
            PoiField::TerrainElevation(Some(g)) => check_finite(*g, "terrain elevation")?,
            PoiField::TerrainElevation(None) => {}
        }

        let poi = &mut self.pois[idx];
        match field {
            PoiField::Name(name) => poi.name = name,
            PoiField::Position(p) => poi.position = p,
            PoiField::ObjectHeight(h) => poi.object_height_m = h,
            PoiField::TerrainElevation(g) => poi.terrain_elevation_msl = g,
        }
        let rev = self.bump();
        self.log.emit(rev, PlanChange::PoiUpdated(id));
        Ok(())
    }

    pub fn set_default_altitude(&mut self, altitude: i32) {
        self.settings.default_altitude = altitude;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::SettingsChanged);
    }

    pub fn set_cruise_speed(&mut self, speed_mps: f64) -> Result<(), PlanError> {
        check_speed(speed_mps)?;
        self.settings.cruise_speed_mps = speed_mps;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::SpeedChanged);
        Ok(())
    }

    pub fn set_path_type(&mut self, path_type: PathType) {
        if self.settings.path_type == path_type {
            return;
        }
        self.settings.path_type = path_type;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::PathTypeChanged);
    }

    pub fn set_home_elevation(&mut self, elevation_msl: Option<f64>) -> Result<(), PlanError> {
        if let Some(e) = elevation_msl {
            check_finite(e, "home elevation")?;
        }
        self.settings.home_elevation_msl = elevation_msl;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::SettingsChanged);
        Ok(())
    }

    pub fn set_default_gimbal_pitch(&mut self, degrees: f64) -> Result<(), PlanError> {
        check_finite(degrees, "gimbal pitch")?;
        self.settings.default_gimbal_pitch_deg = degrees;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::SettingsChanged);
        Ok(())
    }

    /// Writes altitude and terrain cache results from an elevation pass.
    ///
    /// All ids are checked before anything is written. `mode` is recorded as
    /// the last adaptation mode when given.
    pub fn apply_terrain_updates(
        &mut self,
        updates: &[TerrainUpdate],
        mode: Option<AdaptationMode>,
    ) -> Result<(), PlanError> {
        let mut staged = Vec::with_capacity(updates.len());
        for update in updates {
            let idx = self
                .waypoint_index(update.id)
                .ok_or(PlanError::UnknownWaypoint(update.id))?;
            if let Some(g) = update.terrain_elevation_msl {
                check_finite(g, "terrain elevation")?;
            }
            staged.push((idx, *update));
        }

        let rev = self.bump();
        for (idx, update) in staged {
            let wp = &mut self.waypoints[idx];
            if let Some(altitude) = update.altitude {
                wp.altitude = altitude;
                self.log.emit(
                    rev,
                    PlanChange::WaypointUpdated {
                        id: update.id,
                        field: "altitude",
                    },
                );
            }
            if update.terrain_elevation_msl.is_some() {
                wp.terrain_elevation_msl = update.terrain_elevation_msl;
            }
        }
        if mode.is_some() {
            self.settings.last_adaptation_mode = mode;
            self.log.emit(rev, PlanChange::SettingsChanged);
        }
        Ok(())
    }

    /// Replaces the whole plan with `snapshot`.
    ///
    /// The snapshot is validated first; on error the current plan is untouched.
    /// Id counters never move backwards: each becomes the largest of the
    /// current counter, the snapshot counter, and one past the largest
    /// imported id.
    pub fn replace_all(&mut self, snapshot: PlanSnapshot) -> Result<(), PlanError> {
        let PlanSnapshot {
            mut waypoints,
            pois,
            settings,
            next_waypoint_id,
            next_poi_id,
        } = snapshot;

        check_speed(settings.cruise_speed_mps)?;
        if let Some(home) = settings.home_elevation_msl {
            check_finite(home, "home elevation")?;
        }

        let mut poi_ids = HashSet::new();
        for poi in &pois {
            if !poi_ids.insert(poi.id) {
                return Err(ValidationError::DuplicatePoiId(poi.id).into());
            }
            check_position(poi.position)?;
            check_object_height(poi.object_height_m)?;
            if let Some(g) = poi.terrain_elevation_msl {
                check_finite(g, "terrain elevation")?;
            }
        }

        let mut waypoint_ids = HashSet::new();
        for wp in &mut waypoints {
            if !waypoint_ids.insert(wp.id) {
                return Err(ValidationError::DuplicateWaypointId(wp.id).into());
            }
            if wp.heading_mode != HeadingMode::PoiTrack {
                wp.target_poi = None;
            }
            validate_waypoint(wp, |id| poi_ids.contains(&id))?;
        }

        let max_wp = waypoints.iter().map(|w| w.id.get()).max().unwrap_or(0);
        let max_poi = pois.iter().map(|p| p.id.get()).max().unwrap_or(0);
        self.next_waypoint_id = self
            .next_waypoint_id
            .max(next_waypoint_id)
            .max(max_wp.saturating_add(1))
            .max(1);
        self.next_poi_id = self
            .next_poi_id
            .max(next_poi_id)
            .max(max_poi.saturating_add(1))
            .max(1);

        self.waypoints = waypoints;
        self.pois = pois;
        self.settings = settings;
        let rev = self.bump();
        self.log.emit(rev, PlanChange::Replaced);
        Ok(())
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn poi_exists(&self, id: PoiId) -> bool {
        self.pois.iter().any(|p| p.id == id)
    }

    fn build_waypoint(
        &self,
        id: WaypointId,
        position: LatLng,
        spec: WaypointSpec,
    ) -> Result<Waypoint, PlanError> {
        let target_poi = match spec.heading_mode {
            HeadingMode::PoiTrack => spec.target_poi,
            _ => None,
        };
        let waypoint = Waypoint {
            id,
            position,
            altitude: spec.altitude.unwrap_or(self.settings.default_altitude),
            hover_time_s: spec.hover_time_s,
            gimbal_pitch_deg: spec
                .gimbal_pitch_deg
                .unwrap_or(self.settings.default_gimbal_pitch_deg),
            heading_mode: spec.heading_mode,
            fixed_heading_deg: spec.fixed_heading_deg,
            target_poi,
            camera_action: spec.camera_action,
            terrain_elevation_msl: spec.terrain_elevation_msl,
        };
        validate_waypoint(&waypoint, |poi| self.poi_exists(poi))?;
        Ok(waypoint)
    }

    fn apply_field(&self, wp: &mut Waypoint, field: &WaypointField) -> Result<(), PlanError> {
        match *field {
            WaypointField::Position(p) => {
                check_position(p)?;
                wp.position = p;
            }
            WaypointField::Altitude(a) => wp.altitude = a,
            WaypointField::HoverTime(t) => {
                check_hover_time(t)?;
                wp.hover_time_s = t;
            }
            WaypointField::GimbalPitch(p) => {
                check_finite(p, "gimbal pitch")?;
                wp.gimbal_pitch_deg = p;
            }
            WaypointField::HeadingMode(mode) => {
                if mode == HeadingMode::PoiTrack {
                    if wp.target_poi.is_none() {
                        return Err(ValidationError::MissingTrackTarget(wp.id).into());
                    }
                } else {
                    wp.target_poi = None;
                }
                wp.heading_mode = mode;
            }
            WaypointField::FixedHeading(h) => {
                check_finite(h, "fixed heading")?;
                wp.fixed_heading_deg = h;
            }
            WaypointField::TargetPoi(Some(poi)) => {
                if !self.poi_exists(poi) {
                    return Err(PlanError::UnknownPoi(poi));
                }
                wp.target_poi = Some(poi);
                wp.heading_mode = HeadingMode::PoiTrack;
            }
            WaypointField::TargetPoi(None) => {
                wp.target_poi = None;
                if wp.heading_mode == HeadingMode::PoiTrack {
                    wp.heading_mode = HeadingMode::Auto;
                }
            }
            WaypointField::CameraAction(action) => wp.camera_action = action,
            WaypointField::TerrainElevation(g) => {
                if let Some(g) = g {
                    check_finite(g, "terrain elevation")?;
                }
                wp.terrain_elevation_msl = g;
            }
        }
        Ok(())
    }
}

fn change_for_field(id: WaypointId, field: &WaypointField) -> PlanChange {
    match field {
        WaypointField::Position(_) => PlanChange::WaypointMoved(id),
        other => PlanChange::WaypointUpdated {
            id,
            field: other.name(),
        },
    }
}

fn validate_waypoint(
    wp: &Waypoint,
    poi_exists: impl Fn(PoiId) -> bool,
) -> Result<(), PlanError> {
    check_position(wp.position)?;
    check_hover_time(wp.hover_time_s)?;
    check_finite(wp.gimbal_pitch_deg, "gimbal pitch")?;
    check_finite(wp.fixed_heading_deg, "fixed heading")?;
    if let Some(g) = wp.terrain_elevation_msl {
        check_finite(g, "terrain elevation")?;
    }
    if wp.heading_mode == HeadingMode::PoiTrack {
        let target = wp
            .target_poi
            .ok_or(ValidationError::MissingTrackTarget(wp.id))?;
        if !poi_exists(target) {
            return Err(PlanError::UnknownPoi(target));
        }
    }
    Ok(())
}

fn check_position(p: LatLng) -> Result<(), ValidationError> {
    if p.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::InvalidPosition {
            lat_deg: p.lat_deg,
            lng_deg: p.lng_deg,
        })
    }
}

fn check_finite(v: f64, field: &'static str) -> Result<(), ValidationError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonFinite { field })
    }
}

fn check_hover_time(t: f64) -> Result<(), ValidationError> {
    check_finite(t, "hover time")?;
    if t < 0.0 {
        return Err(ValidationError::NegativeHoverTime(t));
    }
    Ok(())
}

fn check_object_height(h: f64) -> Result<(), ValidationError> {
    check_finite(h, "object height")?;
    if h < 0.0 {
        return Err(ValidationError::NegativeObjectHeight(h));
    }
    Ok(())
}

fn check_speed(v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(ValidationError::NonPositiveSpeed(v));
    }
    Ok(())
}
