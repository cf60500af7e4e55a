//! Per-phase action collection.
//!
//! An [`ActionCollector`] is created when an interactive phase begins,
//! with the set of actors required to act. It accepts at most one action
//! per required actor and reports completion when every required actor
//! has submitted. The first submission wins; later ones are rejected.

use std::collections::BTreeSet;

use nightwatch_protocol::{NightActionKind, Phase, PlayerId, Progress};
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A night action payload: what the actor does, and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightAction {
    pub kind: NightActionKind,
    pub target: PlayerId,
}

/// One accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission<A> {
    pub actor: PlayerId,
    pub action: A,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCollector<A> {
    phase: Phase,
    required: BTreeSet<PlayerId>,
    /// In arrival order.
    submissions: Vec<Submission<A>>,
}

/// Day votes: voter → target.
pub type DayVotes = ActionCollector<PlayerId>;

/// Night actions: actor → (kind, target).
pub type NightActions = ActionCollector<NightAction>;

impl<A> ActionCollector<A> {
    /// A collector for `phase`, requiring exactly `required`.
    pub fn new(phase: Phase, required: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            phase,
            required: required.into_iter().collect(),
            submissions: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn required(&self) -> &BTreeSet<PlayerId> {
        &self.required
    }

    pub fn is_required(&self, actor: PlayerId) -> bool {
        self.required.contains(&actor)
    }

    pub fn has_submitted(&self, actor: PlayerId) -> bool {
        self.submissions.iter().any(|s| s.actor == actor)
    }

    pub fn submitted(&self) -> BTreeSet<PlayerId> {
        self.submissions.iter().map(|s| s.actor).collect()
    }

    /// Record `action` for `actor`.
    ///
    /// # Errors
    /// - `InvalidPhase` if `phase` is not the collector's phase.
    /// - `UnauthorizedActor` if the actor is not required here.
    /// - `DuplicateSubmission` if the actor already submitted.
    pub fn submit(&mut self, phase: Phase, actor: PlayerId, action: A) -> Result<(), EngineError> {
        if phase != self.phase {
            return Err(EngineError::InvalidPhase {
                action: "submit",
                phase,
            });
        }
        if !self.is_required(actor) {
            return Err(EngineError::UnauthorizedActor {
                player: actor,
                reason: "not required to act this phase",
            });
        }
        if self.has_submitted(actor) {
            return Err(EngineError::DuplicateSubmission(actor));
        }
        self.submissions.push(Submission { actor, action });
        Ok(())
    }

    /// `true` once the submitted set equals the required set.
    pub fn is_complete(&self) -> bool {
        self.submissions.len() == self.required.len()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            submitted: self.submissions.len(),
            total: self.required.len(),
        }
    }

    /// Required actors that have not submitted yet, in id order.
    pub fn pending(&self) -> Vec<PlayerId> {
        self.required
            .iter()
            .copied()
            .filter(|id| !self.has_submitted(*id))
            .collect()
    }

    pub fn submissions(&self) -> &[Submission<A>] {
        &self.submissions
    }

    pub fn get(&self, actor: PlayerId) -> Option<&A> {
        self.submissions
            .iter()
            .find(|s| s.actor == actor)
            .map(|s| &s.action)
    }
}

impl ActionCollector<NightAction> {
    /// Every `(actor, target)` pair for one kind of action.
    pub fn pairs(&self, kind: NightActionKind) -> impl Iterator<Item = (PlayerId, PlayerId)> + '_ {
        self.submissions
            .iter()
            .filter(move |s| s.action.kind == kind)
            .map(|s| (s.actor, s.action.target))
    }

    /// The distinct targets named by one kind of action.
    pub fn targets(&self, kind: NightActionKind) -> BTreeSet<PlayerId> {
        self.pairs(kind).map(|(_, target)| target).collect()
    }
}
