use foundation::ids::{PoiId, WaypointId};

/// What a store mutation changed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanChange {
    WaypointAdded(WaypointId),
    WaypointRemoved(WaypointId),
    WaypointMoved(WaypointId),
    WaypointsReordered,
    WaypointUpdated {
        id: WaypointId,
        field: &'static str,
    },
    PoiAdded(PoiId),
    PoiRemoved(PoiId),
    PoiUpdated(PoiId),
    PathTypeChanged,
    SpeedChanged,
    SettingsChanged,
    Cleared,
    Replaced,
}

impl PlanChange {
    /// True when the render path or flight statistics may differ afterwards.
    pub fn affects_statistics(&self) -> bool {
        match self {
            PlanChange::WaypointAdded(_)
            | PlanChange::WaypointRemoved(_)
            | PlanChange::WaypointMoved(_)
            | PlanChange::WaypointsReordered
            | PlanChange::PathTypeChanged
            | PlanChange::SpeedChanged
            | PlanChange::Cleared
            | PlanChange::Replaced => true,
            PlanChange::WaypointUpdated { field, .. } => *field == "hover_time",
            _ => false,
        }
    }
}

/// A change stamped with the store revision that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEvent {
    pub revision: u64,
    pub change: PlanChange,
}

#[derive(Debug, Default)]
pub struct ChangeLog {
    events: Vec<PlanEvent>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, revision: u64, change: PlanChange) {
        self.events.push(PlanEvent { revision, change });
    }

    pub fn events(&self) -> &[PlanEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<PlanEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeLog, PlanChange};
    use foundation::ids::{PoiId, WaypointId};

    #[test]
    fn records_events_with_revision() {
        let mut log = ChangeLog::new();
        log.emit(3, PlanChange::WaypointAdded(WaypointId::new(1)));
        assert_eq!(log.events().len(), 1);
        assert_eq!(log.events()[0].revision, 3);
    }

    #[test]
    fn drain_clears_events() {
        let mut log = ChangeLog::new();
        log.emit(1, PlanChange::Cleared);
        let drained = log.drain();
        assert_eq!(drained.len(), 1);
        assert!(log.events().is_empty());
    }

    #[test]
    fn only_geometry_and_hover_edits_affect_statistics() {
        let id = WaypointId::new(1);
        assert!(PlanChange::WaypointMoved(id).affects_statistics());
        assert!(
            PlanChange::WaypointUpdated {
                id,
                field: "hover_time"
            }
            .affects_statistics()
        );
        assert!(
            !PlanChange::WaypointUpdated {
                id,
                field: "gimbal_pitch"
            }
            .affects_statistics()
        );
        assert!(!PlanChange::PoiAdded(PoiId::new(1)).affects_statistics());
    }
}
