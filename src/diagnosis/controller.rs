//! The diagnosis workflow controller.
//!
//! Owns one diagnosis attempt end to end: input selection, the predict
//! call, the result, and the optional save. The attempt is a single tagged
//! union, so a result and an error cannot coexist and a save cannot start
//! while a prediction is in flight. The trigger no-ops while an attempt is
//! busy; there is no cancellation and no automatic retry.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

use crate::api::detection::Prediction;
use crate::diagnosis::photo::PhotoError;
use crate::diagnosis::{presentation, DiagnosisGateway, PlantKind, PlantPhoto, ResultView};
use crate::session::SessionStore;

/// Notifications for whoever is rendering the workflow. `Saved` is the
/// signal to refetch the history list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    ResultReady,
    Saved,
    Closed,
    Toast(String),
}

/// The observable phases of one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Predicting,
    ResultAvailable,
    PredictFailed,
    Saving,
}

#[derive(Debug, Clone)]
enum Attempt {
    Inactive,
    Predicting,
    Concluded { prediction: Prediction, message: String },
    Failed { message: String },
    Saving { prediction: Prediction, message: String },
}

impl Attempt {
    fn is_busy(&self) -> bool {
        matches!(self, Attempt::Predicting | Attempt::Saving { .. })
    }
}

#[derive(Debug, Clone)]
struct WorkflowState {
    plant: Option<PlantKind>,
    photo: Option<PlantPhoto>,
    attempt: Attempt,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            plant: None,
            photo: None,
            attempt: Attempt::Inactive,
        }
    }
}

pub struct DiagnosisController {
    gateway: Arc<dyn DiagnosisGateway>,
    session: Arc<SessionStore>,
    state: Mutex<WorkflowState>,
    events: mpsc::UnboundedSender<WorkflowEvent>,
}

impl DiagnosisController {
    pub fn new(
        gateway: Arc<dyn DiagnosisGateway>,
        session: Arc<SessionStore>,
    ) -> (Self, mpsc::UnboundedReceiver<WorkflowEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                gateway,
                session,
                state: Mutex::new(WorkflowState::default()),
                events,
            },
            rx,
        )
    }

    pub fn phase(&self) -> Phase {
        let state = self.state.lock();
        match &state.attempt {
            Attempt::Inactive => {
                if state.plant.is_some() && state.photo.is_some() {
                    Phase::Ready
                } else {
                    Phase::Idle
                }
            }
            Attempt::Predicting => Phase::Predicting,
            Attempt::Concluded { .. } => Phase::ResultAvailable,
            Attempt::Failed { .. } => Phase::PredictFailed,
            Attempt::Saving { .. } => Phase::Saving,
        }
    }

    pub fn selected_plant(&self) -> Option<PlantKind> {
        self.state.lock().plant
    }

    pub fn has_photo(&self) -> bool {
        self.state.lock().photo.is_some()
    }

    /// Input update only; never touches the network or an active attempt.
    pub fn select_plant(&self, kind: PlantKind) {
        self.state.lock().plant = Some(kind);
    }

    /// Validate and attach a photo. A rejected file changes nothing: the
    /// current photo and any prediction result stay as they were.
    pub fn attach_photo_from_path(&self, path: &Path) -> Result<(), PhotoError> {
        match PlantPhoto::from_path(path) {
            Ok(photo) => {
                self.attach_photo(photo);
                Ok(())
            }
            Err(e) => {
                self.toast(e.to_string());
                Err(e)
            }
        }
    }

    pub fn attach_photo(&self, photo: PlantPhoto) {
        self.state.lock().photo = Some(photo);
    }

    /// The "Ganti Gambar" affordance: drop only the photo.
    pub fn clear_photo(&self) {
        self.state.lock().photo = None;
    }

    /// Back to the initial shape: no plant, no photo, no attempt.
    /// Idempotent.
    pub fn reset(&self) {
        *self.state.lock() = WorkflowState::default();
    }

    /// Run one prediction. No-ops with a user-visible message when an input
    /// or the session is missing, and silently while an attempt is busy.
    pub async fn start_diagnosis(&self) {
        let (plant, photo) = {
            let mut state = self.state.lock();
            if state.attempt.is_busy() {
                return;
            }
            let Some(plant) = state.plant else {
                self.toast("Pilih jenis tanaman terlebih dahulu.");
                return;
            };
            let Some(photo) = state.photo.clone() else {
                self.toast("Unggah foto tanaman untuk memulai diagnosa.");
                return;
            };
            if self.session.current().is_none() {
                self.toast("Anda harus login untuk melakukan diagnosa.");
                return;
            }
            state.attempt = Attempt::Predicting;
            (plant, photo)
        };

        match self.gateway.predict(plant, &photo).await {
            Ok((prediction, message)) => {
                self.state.lock().attempt = Attempt::Concluded {
                    prediction,
                    message,
                };
                let _ = self.events.send(WorkflowEvent::ResultReady);
            }
            Err(failure) => {
                error!("Prediction failed: {}", failure);
                self.state.lock().attempt = Attempt::Failed {
                    message: failure.user_message(),
                };
            }
        }
    }

    /// Persist the current result. Only valid from `ResultAvailable` with a
    /// saveable result; requires the session and the original photo to
    /// still be around. On success the dialog closes, the workflow resets,
    /// and a history refetch is signalled. On failure the result is kept so
    /// the user can retry.
    pub async fn save_diagnosis(&self) {
        let (prediction, message, photo, user_id, plant) = {
            let mut state = self.state.lock();
            let Attempt::Concluded {
                prediction,
                message,
            } = state.attempt.clone()
            else {
                return;
            };
            if !presentation::offers_save(&prediction) {
                return;
            }

            let session = self.session.current();
            let (Some(photo), Some(session)) = (state.photo.clone(), session) else {
                self.toast("Tidak ada hasil diagnosa atau informasi user.");
                return;
            };
            let Some(plant) = prediction.tanaman.parse::<PlantKind>().ok().or(state.plant)
            else {
                self.toast("Tidak ada hasil diagnosa atau informasi user.");
                return;
            };

            state.attempt = Attempt::Saving {
                prediction: prediction.clone(),
                message: message.clone(),
            };
            (prediction, message, photo, session.user.id.clone(), plant)
        };

        let label = presentation::result_label(&prediction);
        match self
            .gateway
            .save_diagnosis(&user_id, plant, &label, prediction.confidence, &photo)
            .await
        {
            Ok(_) => {
                self.toast("Diagnosa berhasil disimpan!");
                self.reset();
                let _ = self.events.send(WorkflowEvent::Saved);
                let _ = self.events.send(WorkflowEvent::Closed);
            }
            Err(failure) => {
                error!("Failed to save diagnosis: {}", failure);
                self.toast("Gagal menyimpan diagnosa.");
                self.state.lock().attempt = Attempt::Concluded {
                    prediction,
                    message,
                };
            }
        }
    }

    /// Closing the dialog always abandons the attempt, saved or not.
    pub fn close_result(&self) {
        {
            let mut state = self.state.lock();
            if !matches!(
                state.attempt,
                Attempt::Concluded { .. } | Attempt::Failed { .. }
            ) {
                return;
            }
            *state = WorkflowState::default();
        }
        let _ = self.events.send(WorkflowEvent::Closed);
    }

    /// The dialog view for the current attempt, if one is active.
    pub fn result_view(&self) -> Option<ResultView> {
        let state = self.state.lock();
        match &state.attempt {
            Attempt::Inactive => None,
            Attempt::Predicting => Some(ResultView::Analyzing),
            Attempt::Failed { message } => Some(ResultView::Failed {
                message: message.clone(),
            }),
            Attempt::Concluded { prediction, .. } | Attempt::Saving { prediction, .. } => {
                Some(ResultView::from_prediction(prediction))
            }
        }
    }

    /// The server's human-readable message for the current result.
    pub fn api_message(&self) -> Option<String> {
        let state = self.state.lock();
        match &state.attempt {
            Attempt::Concluded { message, .. } | Attempt::Saving { message, .. } => {
                Some(message.clone())
            }
            _ => None,
        }
    }

    fn toast(&self, message: impl Into<String>) {
        let _ = self.events.send(WorkflowEvent::Toast(message.into()));
    }
}
