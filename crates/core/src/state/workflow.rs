//! # Workflow State Machine
//!
//! The generation workflow as one tagged union. Data that only makes sense
//! in a phase lives inside that phase, so `Completed` always carries its
//! artifact and `Generating` always carries the token of its request.

use super::assets::AssetIds;
use crate::models::{RemoteId, TryOnArtifact};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one in-flight commit or generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Phase of the workflow, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    AssetsPending,
    ReadyToGenerate,
    Generating,
    Completed,
    Failed,
}

/// The workflow state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    /// Nothing selected
    #[default]
    Idle,
    /// At least one asset exists but not both remote identifiers
    AssetsPending,
    /// Both remote identifiers exist
    ReadyToGenerate,
    /// A generation request is outstanding
    Generating { token: RequestToken },
    /// The last generation produced an artifact
    Completed { artifact: TryOnArtifact },
    /// The last generation failed; both identifiers still exist
    Failed { message: String },
}

/// Why `generate()` did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateRejection {
    /// One or both remote identifiers are missing
    MissingAssets,
    /// A generation request is already outstanding
    AlreadyGenerating,
    /// An asset commit is in flight
    Busy,
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::AssetsPending => WorkflowPhase::AssetsPending,
            WorkflowState::ReadyToGenerate => WorkflowPhase::ReadyToGenerate,
            WorkflowState::Generating { .. } => WorkflowPhase::Generating,
            WorkflowState::Completed { .. } => WorkflowPhase::Completed,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn artifact(&self) -> Option<&TryOnArtifact> {
        match self {
            WorkflowState::Completed { artifact } => Some(artifact),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            WorkflowState::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Re-derive the phase after an asset was selected, committed, picked,
    /// or replaced. A previous artifact or failure is superseded, and an
    /// outstanding generation loses its claim on the state.
    pub fn on_assets_changed(&mut self, ids: AssetIds) {
        *self = match ids.both() {
            Some(_) => WorkflowState::ReadyToGenerate,
            None => WorkflowState::AssetsPending,
        };
    }

    /// Enter `Generating` if both identifiers exist and nothing is outstanding.
    ///
    /// Retrying from `Failed` and regenerating from `Completed` are allowed.
    pub fn begin_generation(
        &mut self,
        ids: AssetIds,
        token: RequestToken,
    ) -> Result<(RemoteId, RemoteId), GenerateRejection> {
        if let WorkflowState::Generating { .. } = self {
            return Err(GenerateRejection::AlreadyGenerating);
        }
        let pair = ids.both().ok_or(GenerateRejection::MissingAssets)?;
        match self {
            WorkflowState::ReadyToGenerate
            | WorkflowState::Completed { .. }
            | WorkflowState::Failed { .. } => {
                *self = WorkflowState::Generating { token };
                Ok(pair)
            }
            _ => Err(GenerateRejection::MissingAssets),
        }
    }

    fn is_generating_with(&self, token: RequestToken) -> bool {
        matches!(self, WorkflowState::Generating { token: t } if *t == token)
    }

    /// Store the artifact. Returns `false` if `token` is no longer current.
    pub fn complete(&mut self, token: RequestToken, artifact: TryOnArtifact) -> bool {
        if !self.is_generating_with(token) {
            return false;
        }
        *self = WorkflowState::Completed { artifact };
        true
    }

    /// Store the failure. Returns `false` if `token` is no longer current.
    pub fn fail(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if !self.is_generating_with(token) {
            return false;
        }
        *self = WorkflowState::Failed {
            message: message.into(),
        };
        true
    }

    pub fn reset(&mut self) {
        *self = WorkflowState::Idle;
    }
}
