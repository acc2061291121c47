//! Render path geometry and flight statistics derived from the plan.

use foundation::math::{DEFAULT_SEGMENTS_PER_SPAN, LatLng, catmull_rom_sample, haversine_distance};

use crate::events::PlanEvent;
use crate::model::{PathType, Waypoint};
use crate::store::FlightPlanStore;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlightStatistics {
    pub waypoint_count: usize,
    pub distance_m: f64,
    pub hover_s: f64,
    pub duration_s: f64,
}

/// Points the map draws between waypoints.
///
/// Straight paths are the raw waypoint positions; curved paths are a
/// Catmull-Rom sample through them.
pub fn compute_path(waypoints: &[Waypoint], path_type: PathType) -> Vec<LatLng> {
    let positions: Vec<LatLng> = waypoints.iter().map(|w| w.position).collect();
    match path_type {
        PathType::Straight => positions,
        PathType::Curved => catmull_rom_sample(&positions, DEFAULT_SEGMENTS_PER_SPAN).collect(),
    }
}

/// Distance along `render_path`, total hover, and the resulting duration.
///
/// Speeds at or below zero are treated as 1 m/s.
pub fn compute_statistics(
    waypoints: &[Waypoint],
    render_path: &[LatLng],
    speed_mps: f64,
) -> FlightStatistics {
    let distance_m: f64 = render_path
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum();
    let hover_s: f64 = waypoints.iter().map(|w| w.hover_time_s).sum();
    let speed = if speed_mps > 0.0 { speed_mps } else { 1.0 };

    FlightStatistics {
        waypoint_count: waypoints.len(),
        distance_m,
        hover_s,
        duration_s: distance_m / speed + hover_s,
    }
}

/// Cached render path and statistics, refreshed only by relevant changes.
#[derive(Debug, Clone, Default)]
pub struct PathView {
    path: Vec<LatLng>,
    stats: FlightStatistics,
    revision: Option<u64>,
}

impl PathView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &[LatLng] {
        &self.path
    }

    pub fn statistics(&self) -> FlightStatistics {
        self.stats
    }

    /// Recomputes from `store` if any of `events` affects the path, or if the
    /// view has never been computed. Returns whether a recompute happened.
    pub fn refresh(&mut self, store: &FlightPlanStore, events: &[PlanEvent]) -> bool {
        let stale = self.revision.is_none() || events.iter().any(|e| e.change.affects_statistics());
        if !stale {
            return false;
        }
        let settings = store.settings();
        self.path = compute_path(store.waypoints(), settings.path_type);
        self.stats = compute_statistics(store.waypoints(), &self.path, settings.cruise_speed_mps);
        self.revision = Some(store.revision());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{PathView, compute_path, compute_statistics};
    use crate::model::{PathType, WaypointField, WaypointSpec};
    use crate::store::FlightPlanStore;
    use foundation::math::{LatLng, destination_point};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn line_store(n: usize, spacing_m: f64) -> FlightPlanStore {
        let mut store = FlightPlanStore::new();
        let origin = LatLng::new(46.5, 7.5);
        for i in 0..n {
            let pos = destination_point(origin, 0.3 * i as f64, spacing_m * i as f64);
            store
                .add_waypoint(pos, WaypointSpec::default())
                .expect("add");
        }
        store
    }

    #[test]
    fn curved_and_straight_coincide_for_two_points() {
        let store = line_store(2, 300.0);
        assert_eq!(
            compute_path(store.waypoints(), PathType::Straight),
            compute_path(store.waypoints(), PathType::Curved)
        );
    }

    #[test]
    fn curved_path_keeps_endpoints() {
        let store = line_store(4, 200.0);
        let curved = compute_path(store.waypoints(), PathType::Curved);
        assert_eq!(curved.first(), Some(&store.waypoints()[0].position));
        assert_eq!(curved.last(), Some(&store.waypoints()[3].position));
        assert_eq!(curved.len(), 3 * 15 + 1);
    }

    #[test]
    fn statistics_sum_distance_and_hover() {
        let mut store = FlightPlanStore::new();
        let a = LatLng::new(0.0, 0.0);
        let b = destination_point(a, 0.0, 1000.0);
        store
            .add_waypoint(a, WaypointSpec::default().with_hover_time(5.0))
            .expect("a");
        store
            .add_waypoint(b, WaypointSpec::default().with_hover_time(15.0))
            .expect("b");

        let path = compute_path(store.waypoints(), PathType::Straight);
        let stats = compute_statistics(store.waypoints(), &path, 10.0);
        assert_eq!(stats.waypoint_count, 2);
        assert_close(stats.distance_m, 1000.0, 1e-6);
        assert_close(stats.hover_s, 20.0, 1e-12);
        assert_close(stats.duration_s, 120.0, 1e-6);

        let slow = compute_statistics(store.waypoints(), &path, 0.0);
        assert_close(slow.duration_s, 1020.0, 1e-6);
    }

    #[test]
    fn view_refreshes_only_on_relevant_events() {
        let mut store = line_store(3, 100.0);
        let mut view = PathView::new();
        let events = store.drain_events();
        assert!(view.refresh(&store, &events));
        let before = view.statistics();

        let id = store.waypoints()[0].id;
        store
            .update_waypoint(id, WaypointField::GimbalPitch(-45.0))
            .expect("gimbal");
        let events = store.drain_events();
        assert!(!view.refresh(&store, &events));

        store
            .update_waypoint(id, WaypointField::HoverTime(30.0))
            .expect("hover");
        let events = store.drain_events();
        assert!(view.refresh(&store, &events));
        assert_close(view.statistics().hover_s, before.hover_s + 30.0, 1e-9);

        store.set_path_type(PathType::Curved);
        let events = store.drain_events();
        assert!(view.refresh(&store, &events));
        assert!(view.path().len() > 3);
    }
}
