//! Per-run state machine

use std::fmt;

/// Stage of one pick-to-history run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Picking,
    Uploading,
    Recognizing,
    Translating,
    Annotating,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Idle, Picking) => true,
            // Cancelled pick
            (Picking, Idle) => true,
            (Picking, Uploading) => true,
            (Uploading, Recognizing) => true,
            (Recognizing, Translating) => true,
            (Translating, Annotating) => true,
            (Annotating, Done) => true,
            (Idle, _) => false,
            (Done | Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Picking => "picking",
            PipelineState::Uploading => "uploading",
            PipelineState::Recognizing => "recognizing",
            PipelineState::Translating => "translating",
            PipelineState::Annotating => "annotating",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracker that records every state a run passes through
#[derive(Debug, Clone)]
pub struct StateTracker {
    current: PipelineState,
    visited: Vec<PipelineState>,
}

impl StateTracker {
    pub fn new(start: PipelineState) -> Self {
        Self {
            current: start,
            visited: vec![start],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.current
    }

    pub fn visited(&self) -> &[PipelineState] {
        &self.visited
    }

    /// Move to `next`; illegal moves are refused and leave the state unchanged
    pub fn advance(&mut self, next: PipelineState) -> bool {
        if !self.current.can_transition_to(next) {
            tracing::error!("Illegal pipeline transition {} -> {}", self.current, next);
            return false;
        }
        self.current = next;
        self.visited.push(next);
        true
    }
}
