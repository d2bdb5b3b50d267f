//! The diagnosis workflow: plant/photo inputs, the submission state
//! machine, result presentation, and the saved-diagnosis history.

pub mod controller;
pub mod history;
pub mod photo;
pub mod plant;
pub mod presentation;

pub use controller::{DiagnosisController, Phase, WorkflowEvent};
pub use history::{HistoryState, HistoryStore};
pub use photo::{PhotoError, PlantPhoto, MAX_PHOTO_BYTES};
pub use plant::PlantKind;
pub use presentation::{ResultView, CONFIDENCE_THRESHOLD};

use async_trait::async_trait;

use crate::api::detection::{Prediction, SavedDiagnosis};
use crate::api::ApiFailure;

/// Seam between the workflow and the HTTP gateway, so the controller and
/// history store can be exercised against a scripted stub.
#[async_trait]
pub trait DiagnosisGateway: Send + Sync {
    async fn predict(
        &self,
        plant: PlantKind,
        photo: &PlantPhoto,
    ) -> Result<(Prediction, String), ApiFailure>;

    async fn save_diagnosis(
        &self,
        user_id: &str,
        plant: PlantKind,
        result_label: &str,
        confidence: f64,
        photo: &PlantPhoto,
    ) -> Result<SavedDiagnosis, ApiFailure>;

    async fn diagnosis_history(&self, user_id: &str) -> Result<Vec<SavedDiagnosis>, ApiFailure>;
}
