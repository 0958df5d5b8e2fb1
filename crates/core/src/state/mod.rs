pub mod assets;
pub mod preview;
pub mod workflow;

pub use assets::{
    validate_file, Asset, AssetIds, AssetIntake, AssetKind, LocalFile, ValidationState,
    ACCEPTED_MEDIA_TYPES,
};
pub use preview::{PreviewData, PreviewHandle, PreviewRegistry};
pub use workflow::{GenerateRejection, RequestToken, WorkflowPhase, WorkflowState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
