/// Waypoint identifier. Assigned monotonically by the plan store, never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaypointId(u32);

impl WaypointId {
    pub fn new(n: u32) -> Self {
        WaypointId(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for WaypointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Point-of-interest identifier. Same allocation rules as `WaypointId`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoiId(u32);

impl PoiId {
    pub fn new(n: u32) -> Self {
        PoiId(n)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "POI {}", self.0)
    }
}
