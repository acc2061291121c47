use foundation::ids::WaypointId;

use crate::error::PlanError;
use crate::model::WaypointField;
use crate::store::FlightPlanStore;

/// Waypoint id set backed by a bitset.
///
/// Ordering contract:
/// - Iteration yields ids in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    words: Vec<u64>,
    len: usize,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.words.clear();
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, id: WaypointId) -> bool {
        let (word, bit) = word_bit(id.get());
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Returns `true` if the set changed.
    pub fn insert(&mut self, id: WaypointId) -> bool {
        let (word, bit) = word_bit(id.get());
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let w = &mut self.words[word];
        if (*w & mask) != 0 {
            return false;
        }
        *w |= mask;
        self.len += 1;
        true
    }

    /// Returns `true` if the set changed.
    pub fn remove(&mut self, id: WaypointId) -> bool {
        let (word, bit) = word_bit(id.get());
        let Some(w) = self.words.get_mut(word) else {
            return false;
        };
        let mask = 1u64 << bit;
        if (*w & mask) == 0 {
            return false;
        }
        *w &= !mask;
        self.len -= 1;
        true
    }

    pub fn retain(&mut self, mut keep: impl FnMut(WaypointId) -> bool) {
        let doomed: Vec<WaypointId> = self.iter().filter(|id| !keep(*id)).collect();
        for id in doomed {
            self.remove(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = WaypointId> + '_ {
        SelectionIter {
            words: &self.words,
            word_index: 0,
            current_word: 0,
            base_index: 0,
        }
        .map(WaypointId::new)
    }
}

fn word_bit(index: u32) -> (usize, u32) {
    ((index / 64) as usize, index % 64)
}

struct SelectionIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current_word: u64,
    base_index: u32,
}

impl Iterator for SelectionIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_word != 0 {
                let tz = self.current_word.trailing_zeros();
                self.current_word &= !(1u64 << tz);
                return Some(self.base_index + tz);
            }

            let w = *self.words.get(self.word_index)?;
            self.current_word = w;
            self.base_index = (self.word_index as u32) * 64;
            self.word_index += 1;
        }
    }
}

/// Which edit panel the selection drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    None,
    Single(WaypointId),
    Multi,
}

/// Single active waypoint XOR a multi-edit set.
///
/// Activating one side always clears the other.
#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<WaypointId>,
    multi: SelectionSet,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectionMode {
        match self.active {
            Some(id) => SelectionMode::Single(id),
            None if !self.multi.is_empty() => SelectionMode::Multi,
            None => SelectionMode::None,
        }
    }

    pub fn active(&self) -> Option<WaypointId> {
        self.active
    }

    pub fn multi(&self) -> &SelectionSet {
        &self.multi
    }

    /// Makes `id` the active waypoint, dropping any multi-edit selection.
    pub fn select(&mut self, store: &FlightPlanStore, id: WaypointId) -> Result<(), PlanError> {
        if store.waypoint(id).is_none() {
            return Err(PlanError::UnknownWaypoint(id));
        }
        self.multi.clear();
        self.active = Some(id);
        Ok(())
    }

    /// Adds or removes `id` from the multi-edit set, dropping the active waypoint.
    ///
    /// Returns whether `id` is in the set afterwards.
    pub fn toggle_multi(
        &mut self,
        store: &FlightPlanStore,
        id: WaypointId,
    ) -> Result<bool, PlanError> {
        if store.waypoint(id).is_none() {
            return Err(PlanError::UnknownWaypoint(id));
        }
        self.active = None;
        if self.multi.remove(id) {
            Ok(false)
        } else {
            self.multi.insert(id);
            Ok(true)
        }
    }

    /// Puts every waypoint into the multi-edit set.
    pub fn select_all(&mut self, store: &FlightPlanStore) {
        self.active = None;
        self.multi.clear();
        for wp in store.waypoints() {
            self.multi.insert(wp.id);
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.multi.clear();
    }

    /// Drops ids that no longer exist in `store`. Call after deletions or imports.
    pub fn prune(&mut self, store: &FlightPlanStore) {
        if let Some(id) = self.active
            && store.waypoint(id).is_none()
        {
            self.active = None;
        }
        self.multi.retain(|id| store.waypoint(id).is_some());
    }

    /// Applies `field` to every waypoint in the multi-edit set.
    pub fn apply_to_multi(
        &self,
        store: &mut FlightPlanStore,
        field: WaypointField,
    ) -> Result<usize, PlanError> {
        let ids: Vec<WaypointId> = self.multi.iter().collect();
        store.update_waypoints(&ids, field)?;
        Ok(ids.len())
    }
}
