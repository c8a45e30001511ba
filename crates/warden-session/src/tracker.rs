//! Change tracking for handlers that react to one flag's value.

use warden_query::ApplicableRegionSet;
use warden_regions::Subject;
use warden_types::{Flag, FlagValue};

/// How the tracked flag's value differs from the last accepted one.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueChange {
    /// Same value as before (including "still unset").
    Unchanged,
    /// The flag now has a value different from before.
    Set {
        /// The new value.
        current: FlagValue,
        /// The previous value, if there was one.
        last: Option<FlagValue>,
    },
    /// The flag had a value and no longer does.
    Absent {
        /// The previous value.
        last: FlagValue,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum TrackerState {
    Uninitialized,
    Armed(Option<FlagValue>),
}

/// Remembers the last accepted value of one flag.
///
/// Starts uninitialized, is armed by [`FlagValueChangeTracker::initialize`],
/// moves forward with [`FlagValueChangeTracker::commit`], and returns to
/// uninitialized on [`FlagValueChangeTracker::reset`].
#[derive(Debug, Clone)]
pub struct FlagValueChangeTracker {
    flag: &'static Flag,
    state: TrackerState,
}

impl FlagValueChangeTracker {
    /// An uninitialized tracker for `flag`.
    pub const fn new(flag: &'static Flag) -> Self {
        Self {
            flag,
            state: TrackerState::Uninitialized,
        }
    }

    /// The tracked flag.
    pub const fn flag(&self) -> &'static Flag {
        self.flag
    }

    /// Arm the tracker with the value at `set` and return it.
    pub fn initialize(&mut self, set: &ApplicableRegionSet, subject: &Subject) -> Option<FlagValue> {
        let value = set.query_value(subject, self.flag);
        self.state = TrackerState::Armed(value.clone());
        value
    }

    /// Compare the value at `set` with the last accepted one.
    ///
    /// An uninitialized tracker compares against "unset".
    pub fn observe(&self, set: &ApplicableRegionSet, subject: &Subject) -> ValueChange {
        let current = set.query_value(subject, self.flag);
        let last = self.last().cloned();
        match (current, last) {
            (Some(current), last) if last.as_ref() != Some(&current) => {
                ValueChange::Set { current, last }
            }
            (None, Some(last)) => ValueChange::Absent { last },
            _ => ValueChange::Unchanged,
        }
    }

    /// Accept a new value.
    pub fn commit(&mut self, value: Option<FlagValue>) {
        self.state = TrackerState::Armed(value);
    }

    /// The last accepted value.
    pub const fn last(&self) -> Option<&FlagValue> {
        match &self.state {
            TrackerState::Armed(value) => value.as_ref(),
            TrackerState::Uninitialized => None,
        }
    }

    /// Whether [`FlagValueChangeTracker::initialize`] has run since the
    /// last reset.
    pub const fn is_armed(&self) -> bool {
        matches!(self.state, TrackerState::Armed(_))
    }

    /// Forget the last value.
    pub fn reset(&mut self) {
        self.state = TrackerState::Uninitialized;
    }
}

impl ValueChange {
    /// The value to commit if the change is accepted, or `None` if nothing
    /// changed.
    pub fn accepted_value(&self) -> Option<Option<FlagValue>> {
        match self {
            Self::Unchanged => None,
            Self::Set { current, .. } => Some(Some(current.clone())),
            Self::Absent { .. } => Some(None),
        }
    }

    /// The value before the change.
    pub const fn last(&self) -> Option<&FlagValue> {
        match self {
            Self::Unchanged => None,
            Self::Set { last, .. } => last.as_ref(),
            Self::Absent { last } => Some(last),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use warden_regions::{Region, Shape};
    use warden_types::{BlockPosition, GameMode, flags};

    use super::*;

    fn set_with(mode: Option<GameMode>) -> ApplicableRegionSet {
        let mut region = Region::new("r", Shape::Global).unwrap_or_else(|_| Region::global());
        if let Some(mode) = mode {
            assert!(region.set_flag(&flags::GAME_MODE, FlagValue::GameMode(mode)).is_ok());
        }
        ApplicableRegionSet::new("world", BlockPosition::new(0, 0, 0), vec![Arc::new(region)], None)
    }

    #[test]
    fn lifecycle_goes_uninitialized_armed_uninitialized() {
        let mut tracker = FlagValueChangeTracker::new(&flags::GAME_MODE);
        assert!(!tracker.is_armed());
        let initial = tracker.initialize(&set_with(Some(GameMode::Creative)), &Subject::Console);
        assert_eq!(initial, Some(FlagValue::GameMode(GameMode::Creative)));
        assert!(tracker.is_armed());
        tracker.reset();
        tracker.reset();
        assert!(!tracker.is_armed());
        assert!(tracker.last().is_none());
    }

    #[test]
    fn observe_reports_set_and_absent() {
        let mut tracker = FlagValueChangeTracker::new(&flags::GAME_MODE);
        tracker.initialize(&set_with(None), &Subject::Console);

        let change = tracker.observe(&set_with(Some(GameMode::Adventure)), &Subject::Console);
        assert_eq!(
            change,
            ValueChange::Set {
                current: FlagValue::GameMode(GameMode::Adventure),
                last: None
            }
        );
        tracker.commit(change.accepted_value().flatten());

        let same = tracker.observe(&set_with(Some(GameMode::Adventure)), &Subject::Console);
        assert_eq!(same, ValueChange::Unchanged);

        let gone = tracker.observe(&set_with(None), &Subject::Console);
        assert_eq!(
            gone,
            ValueChange::Absent {
                last: FlagValue::GameMode(GameMode::Adventure)
            }
        );
    }
}
