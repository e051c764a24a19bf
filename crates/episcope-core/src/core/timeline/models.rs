//! Timeline Model Definitions
//!
//! The timeline holds placed symptom instances keyed by identifier, plus
//! an ordering of those identifiers by ascending start time. The ordering
//! is re-sorted (stable) after every structural change, so queries always
//! see items in start order with ties kept in insertion order.

use std::collections::BTreeMap;

use crate::core::taxonomy::Symptom;
use crate::core::{CoreError, CoreResult, ItemId, TimeMs};

// =============================================================================
// Timeline Item
// =============================================================================

/// Symptom instance placed on the timeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineItem {
    pub identifier: ItemId,
    pub symptom: Symptom,
    /// Start time (milliseconds)
    pub start: TimeMs,
    /// Duration (milliseconds)
    pub duration: TimeMs,
}

impl TimelineItem {
    /// Returns the end time on the timeline
    pub fn end(&self) -> TimeMs {
        // start + duration is the validated end, so this only saturates
        // for items built by hand
        self.start.saturating_add(self.duration)
    }

    /// Checks if a time point is within this item
    pub fn contains(&self, time: TimeMs) -> bool {
        time >= self.start && time <= self.end()
    }
}

// =============================================================================
// Item Update
// =============================================================================

/// Partial update applied by [`Timeline::update_symptom`].
///
/// Changing only `start` keeps the original end; changing only `end`
/// keeps the start; setting both places the item at exactly that range.
#[derive(Clone, Debug, Default)]
pub struct SymptomUpdate {
    pub symptom: Option<Symptom>,
    pub start: Option<TimeMs>,
    pub end: Option<TimeMs>,
}

impl SymptomUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symptom(mut self, symptom: Symptom) -> Self {
        self.symptom = Some(symptom);
        self
    }

    pub fn with_start(mut self, start: TimeMs) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: TimeMs) -> Self {
        self.end = Some(end);
        self
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// Ordered collection of placed symptom instances
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    items: BTreeMap<ItemId, TimelineItem>,
    /// Identifiers sorted by ascending start
    order: Vec<ItemId>,
    next_id: ItemId,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Creates an empty timeline; identifiers start at 1
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            order: vec![],
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn allocate_id(&mut self) -> ItemId {
        let identifier = self.next_id;
        self.next_id += 1;
        identifier
    }

    fn sort_order(&mut self) {
        let items = &self.items;
        self.order
            .sort_by_key(|id| items.get(id).map(|item| item.start).unwrap_or_default());
    }

    fn require_instance(symptom: &Symptom) -> CoreResult<()> {
        if symptom.is_instance() {
            Ok(())
        } else {
            Err(CoreError::Precondition(format!(
                "only symptom instances can be placed on a timeline, '{}' is a definition",
                symptom.name
            )))
        }
    }

    /// Duration of `[start, end]`; requires `0 <= start <= end`
    fn checked_duration(start: TimeMs, end: TimeMs) -> CoreResult<TimeMs> {
        if start < 0 || end < start {
            return Err(CoreError::InvalidTimeRange { start, end });
        }
        end.checked_sub(start).ok_or(CoreError::InvalidTimeRange { start, end })
    }

    /// Places a symptom instance on `[start, end]` and returns its identifier
    pub fn add_symptom(
        &mut self,
        symptom: Symptom,
        start: TimeMs,
        end: TimeMs,
    ) -> CoreResult<ItemId> {
        Self::require_instance(&symptom)?;
        let duration = Self::checked_duration(start, end)?;

        let identifier = self.allocate_id();
        self.items.insert(
            identifier,
            TimelineItem {
                identifier,
                symptom,
                start,
                duration,
            },
        );
        self.order.push(identifier);
        self.sort_order();
        Ok(identifier)
    }

    /// Applies a partial update to an item and restores start order.
    ///
    /// Nothing changes if the update is rejected.
    pub fn update_symptom(&mut self, identifier: ItemId, update: SymptomUpdate) -> CoreResult<()> {
        if let Some(symptom) = &update.symptom {
            Self::require_instance(symptom)?;
        }
        let item = self
            .items
            .get_mut(&identifier)
            .ok_or(CoreError::InvalidIdentifier(identifier))?;

        let start = update.start.unwrap_or(item.start);
        let end = update.end.unwrap_or_else(|| item.end());
        let duration = Self::checked_duration(start, end)?;

        if let Some(symptom) = update.symptom {
            item.symptom = symptom;
        }
        item.start = start;
        item.duration = duration;

        self.sort_order();
        Ok(())
    }

    pub fn get_item(&self, identifier: ItemId) -> Option<&TimelineItem> {
        self.items.get(&identifier)
    }

    /// Mutable access to a placed symptom, e.g. to edit its selections.
    ///
    /// Timing is not reachable this way; use [`Timeline::update_symptom`].
    pub fn symptom_mut(&mut self, identifier: ItemId) -> Option<&mut Symptom> {
        self.items.get_mut(&identifier).map(|item| &mut item.symptom)
    }

    fn position(&self, identifier: ItemId) -> Option<usize> {
        self.order.iter().position(|id| *id == identifier)
    }

    /// Item just before `identifier` in start order
    pub fn previous_symptom(&self, identifier: ItemId) -> Option<&TimelineItem> {
        let index = self.position(identifier)?.checked_sub(1)?;
        self.get_item(self.order[index])
    }

    /// Item just after `identifier` in start order
    pub fn next_symptom(&self, identifier: ItemId) -> Option<&TimelineItem> {
        let index = self.position(identifier)? + 1;
        self.order.get(index).and_then(|id| self.get_item(*id))
    }

    /// Removes an item, returning it if it existed
    pub fn remove_symptom(&mut self, identifier: ItemId) -> Option<TimelineItem> {
        let item = self.items.remove(&identifier)?;
        self.order.retain(|id| *id != identifier);
        Some(item)
    }

    /// Removes every item. Identifiers keep increasing.
    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }

    /// Items in start order
    pub fn symptoms(&self) -> impl Iterator<Item = &TimelineItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// End of the last-starting item, or 0 when empty.
    ///
    /// This is not necessarily the latest end; see [`Timeline::latest_end`].
    pub fn duration(&self) -> TimeMs {
        self.order
            .last()
            .and_then(|id| self.items.get(id))
            .map(TimelineItem::end)
            .unwrap_or(0)
    }

    /// Latest end time over all items, or 0 when empty
    pub fn latest_end(&self) -> TimeMs {
        self.items.values().map(TimelineItem::end).max().unwrap_or(0)
    }

    /// Items covering a time point, in start order
    pub fn items_at(&self, time: TimeMs) -> Vec<&TimelineItem> {
        self.symptoms().filter(|item| item.contains(time)).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
