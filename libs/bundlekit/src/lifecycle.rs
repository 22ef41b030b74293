//! Per-bundle lifecycle state machine.
//!
//! `Inactive -> Starting -> Active -> Stopping -> Inactive`. A failed start drops
//! straight back to `Inactive`; a failed stop still ends in `Inactive` because the
//! host cannot assume anything the bundle registered is still usable.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BundleState {
    #[default]
    Inactive,
    Starting,
    Active,
    Stopping,
}

impl BundleState {
    /// Whether `self -> next` is a transition the host is allowed to make.
    #[must_use]
    pub fn can_transition_to(self, next: BundleState) -> bool {
        matches!(
            (self, next),
            (BundleState::Inactive, BundleState::Starting)
                | (
                    BundleState::Starting,
                    BundleState::Active | BundleState::Inactive
                )
                | (BundleState::Active, BundleState::Stopping)
                | (BundleState::Stopping, BundleState::Inactive)
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BundleState::Inactive => "inactive",
            BundleState::Starting => "starting",
            BundleState::Active => "active",
            BundleState::Stopping => "stopping",
        }
    }
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
