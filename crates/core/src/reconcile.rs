use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::{OwnerId, Rect};
use crate::treemap::{LayoutSnapshot, OrderHint};

/// The two endpoints an element moves between. Timing and easing belong to
/// whoever draws it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub owner_id: OwnerId,
    pub from: Option<Rect>,
    pub to: Option<Rect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Entering,
    Updating,
    Exiting,
}

impl Transition {
    pub fn kind(&self) -> TransitionKind {
        match (self.from, self.to) {
            (None, _) => TransitionKind::Entering,
            (Some(_), None) => TransitionKind::Exiting,
            (Some(_), Some(_)) => TransitionKind::Updating,
        }
    }

    /// Position at progress `t`. Entering elements grow out of their target's
    /// centre, exiting ones shrink into their origin's centre.
    pub fn at(&self, t: f64) -> Rect {
        match (self.from, self.to) {
            (Some(from), Some(to)) => from.lerp(&to, t),
            (None, Some(to)) => to.collapsed().lerp(&to, t),
            (Some(from), None) => from.lerp(&from.collapsed(), t),
            (None, None) => Rect::default(),
        }
    }
}

/// Match `next` against `previous` by owner. Every owner in either snapshot
/// shows up exactly once, in owner order.
pub fn reconcile(previous: Option<&LayoutSnapshot>, next: &LayoutSnapshot) -> Vec<Transition> {
    let mut owners: BTreeSet<&OwnerId> = next.owners().collect();
    if let Some(prev) = previous {
        owners.extend(prev.owners());
    }

    owners
        .into_iter()
        .map(|owner| Transition {
            owner_id: owner.clone(),
            from: previous.and_then(|p| p.get(owner)).map(|e| e.rect),
            to: next.get(owner).map(|e| e.rect),
        })
        .collect()
}

/// Counts per kind, handy for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionSummary {
    pub entering: usize,
    pub updating: usize,
    pub exiting: usize,
}

impl TransitionSummary {
    pub fn of(transitions: &[Transition]) -> Self {
        let mut s = Self::default();
        for t in transitions {
            match t.kind() {
                TransitionKind::Entering => s.entering += 1,
                TransitionKind::Updating => s.updating += 1,
                TransitionKind::Exiting => s.exiting += 1,
            }
        }
        s
    }
}

/// Holds the current snapshot and the one before it; anything older is
/// dropped on [`Reconciler::advance`].
#[derive(Debug, Default)]
pub struct Reconciler {
    current: Option<LayoutSnapshot>,
    previous: Option<LayoutSnapshot>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&LayoutSnapshot> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&LayoutSnapshot> {
        self.previous.as_ref()
    }

    /// Order of the current pass, for sticky squarify ordering.
    pub fn order_hint(&self) -> Option<&OrderHint> {
        self.current.as_ref().map(LayoutSnapshot::order_hint)
    }

    pub fn advance(&mut self, next: LayoutSnapshot) -> Vec<Transition> {
        let transitions = reconcile(self.current.as_ref(), &next);
        let summary = TransitionSummary::of(&transitions);
        tracing::debug!(
            "reconciled '{}': {} entering, {} updating, {} exiting",
            next.measure(),
            summary.entering,
            summary.updating,
            summary.exiting
        );
        self.previous = self.current.replace(next);
        transitions
    }

    pub fn clear(&mut self) {
        self.current = None;
        self.previous = None;
    }
}
