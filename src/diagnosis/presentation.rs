//! Result presentation: a pure derivation from a prediction (or a saved
//! record) to exactly one of four views.
//!
//! The confidence threshold lives here and nowhere else; both
//! interpretation branches and the save guard go through it.

use crate::api::detection::{Prediction, SavedDiagnosis, SavedDisease};
use crate::api::disease::DiseaseData;
use crate::diagnosis::PlantKind;

/// Below this confidence a prediction is presented as "not found" even when
/// the server left `disease` populated.
pub const CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Sentinel result label used by the save endpoint for healthy plants.
pub const HEALTHY_LABEL: &str = "Healthy";

pub const SAVE_ACTION_LABEL: &str = "Simpan Diagnosa";

pub const NOT_FOUND_MESSAGE: &str = "Penyakit tidak ditemukan";
const HEALTHY_MESSAGE: &str = "Tidak ada penyakit terdeteksi. Tanaman Anda terlihat sehat.";

const PLACEHOLDER_DESKRIPSI: &str = "Data deskripsi tidak tersedia di riwayat ini";
const PLACEHOLDER_PENYEBAB: &str = "Data penyebab tidak tersedia di riwayat ini";
const PLACEHOLDER_PENCEGAHAN: &str = "Data pencegahan tidak tersedia di riwayat ini";
const PLACEHOLDER_PENGENDALIAN: &str = "Data pengendalian tidak tersedia di riwayat ini";

pub fn meets_threshold(confidence: f64) -> bool {
    confidence >= CONFIDENCE_THRESHOLD
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Whether a live prediction may be saved: the confidence must be at or
/// above the threshold and the result must not already be the healthy
/// sentinel. A confident prediction with no disease saves as "Healthy".
pub fn offers_save(prediction: &Prediction) -> bool {
    if !meets_threshold(prediction.confidence) {
        return false;
    }
    match effective_disease(prediction) {
        Some(disease) => disease.name != HEALTHY_LABEL,
        None => true,
    }
}

/// The label the save endpoint records as `hasil`.
pub fn result_label(prediction: &Prediction) -> String {
    effective_disease(prediction)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| HEALTHY_LABEL.to_string())
}

/// Treat a disease record with a blank name the same as no disease.
fn effective_disease(prediction: &Prediction) -> Option<&DiseaseData> {
    prediction
        .disease
        .as_ref()
        .filter(|d| !d.name.trim().is_empty())
}

/// One of the four mutually exclusive dialog views.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    /// Prediction in flight.
    Analyzing,
    /// Prediction failed; only "close" is offered.
    Failed { message: String },
    DiseaseFound {
        title: String,
        plant: String,
        confidence_pct: String,
        image: Option<String>,
        description: String,
        cause: String,
        preventions: Vec<String>,
        controls: Vec<String>,
        offer_save: bool,
    },
    NoDiseaseFound {
        message: String,
        confidence_pct: String,
        offer_save: bool,
    },
}

impl ResultView {
    /// Derive the view for a live prediction.
    pub fn from_prediction(prediction: &Prediction) -> Self {
        if !meets_threshold(prediction.confidence) {
            return ResultView::NoDiseaseFound {
                message: NOT_FOUND_MESSAGE.to_string(),
                confidence_pct: format_confidence(prediction.confidence),
                offer_save: false,
            };
        }

        match effective_disease(prediction) {
            Some(disease) => ResultView::DiseaseFound {
                title: format!("Hasil Diagnosa: {}", disease.name),
                plant: display_plant(&prediction.tanaman),
                confidence_pct: format_confidence(prediction.confidence),
                image: disease.image.clone(),
                description: disease
                    .deskripsi
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_DESKRIPSI.to_string()),
                cause: disease
                    .penyebab
                    .clone()
                    .unwrap_or_else(|| PLACEHOLDER_PENYEBAB.to_string()),
                preventions: or_placeholder(&disease.pencegahan, PLACEHOLDER_PENCEGAHAN),
                controls: or_placeholder(&disease.pengendalian, PLACEHOLDER_PENGENDALIAN),
                offer_save: disease.name != HEALTHY_LABEL,
            },
            None => ResultView::NoDiseaseFound {
                message: HEALTHY_MESSAGE.to_string(),
                confidence_pct: format_confidence(prediction.confidence),
                offer_save: true,
            },
        }
    }

    /// Replay a saved record through the same surface, read-only: no save
    /// affordance, placeholders for fields history did not retain.
    pub fn from_record(record: &SavedDiagnosis) -> Self {
        match &record.disease {
            Some(disease) => ResultView::DiseaseFound {
                title: format!("Hasil Diagnosa: {}", disease.name),
                plant: display_plant(&record.tanaman),
                confidence_pct: format_confidence(record.confidence),
                // History records keep the uploaded photo URL, not the
                // catalog illustration.
                image: record.image_url.clone(),
                description: saved_field(&disease.deskripsi, PLACEHOLDER_DESKRIPSI),
                cause: saved_field(&disease.penyebab, PLACEHOLDER_PENYEBAB),
                preventions: or_placeholder(&disease.pencegahan, PLACEHOLDER_PENCEGAHAN),
                controls: or_placeholder(&disease.pengendalian, PLACEHOLDER_PENGENDALIAN),
                offer_save: false,
            },
            None => {
                let message = if meets_threshold(record.confidence) {
                    HEALTHY_MESSAGE.to_string()
                } else {
                    NOT_FOUND_MESSAGE.to_string()
                };
                ResultView::NoDiseaseFound {
                    message,
                    confidence_pct: format_confidence(record.confidence),
                    offer_save: false,
                }
            }
        }
    }

    pub fn offer_save(&self) -> bool {
        match self {
            ResultView::DiseaseFound { offer_save, .. } => *offer_save,
            ResultView::NoDiseaseFound { offer_save, .. } => *offer_save,
            _ => false,
        }
    }
}

fn display_plant(wire: &str) -> String {
    wire.parse::<PlantKind>()
        .map(|p| p.label().to_string())
        .unwrap_or_else(|_| wire.to_string())
}

fn saved_field(field: &Option<String>, placeholder: &str) -> String {
    match field {
        Some(value) if !value.trim().is_empty() => value.clone(),
        _ => placeholder.to_string(),
    }
}

fn or_placeholder(items: &[String], placeholder: &str) -> Vec<String> {
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items.to_vec()
    }
}
