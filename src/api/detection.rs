//! Detection endpoints: disease prediction, saving a result, and the saved
//! diagnosis history.
//!
//! Predict and save are the two multipart uploads in the API; both send the
//! photo bytes under the `file` field. Predict takes the lowercase plant
//! slug, save takes the uppercase code.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::disease::DiseaseData;
use super::{ApiClient, ApiFailure};
use crate::diagnosis::{DiagnosisGateway, PlantKind, PlantPhoto};

/// A fresh prediction response.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Prediction {
    pub tanaman: String,
    pub confidence: f64,
    /// `None` means the model matched no disease.
    #[serde(default)]
    pub disease: Option<DiseaseData>,
}

/// Disease fields as retained in a saved record. History records keep less
/// than fresh predictions; absent fields stay `None`/empty here and get
/// placeholder text only at presentation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedDisease {
    pub label: String,
    pub name: String,
    #[serde(default)]
    pub penyebab: Option<String>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub pencegahan: Vec<String>,
    #[serde(default)]
    pub pengendalian: Vec<String>,
}

/// One saved diagnosis record, immutable from the client's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedDiagnosis {
    pub id: String,
    pub user_id: String,
    pub tanaman: String,
    #[serde(default)]
    pub hasil: Option<String>,
    pub confidence: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub disease_id: Option<String>,
    #[serde(default)]
    pub disease: Option<SavedDisease>,
}

fn photo_part(photo: &PlantPhoto) -> Result<Part, ApiFailure> {
    Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.mime_type)
        .map_err(|e| ApiFailure::network(format!("invalid photo mime type: {}", e)))
}

impl ApiClient {
    /// POST /detection/predict — multipart `{tanaman, file}`.
    pub async fn predict(
        &self,
        plant: PlantKind,
        photo: &PlantPhoto,
    ) -> Result<(Prediction, String), ApiFailure> {
        let form = Form::new()
            .text("tanaman", plant.slug())
            .part("file", photo_part(photo)?);

        let req = self
            .request(Method::POST, "/detection/predict")
            .multipart(form);
        self.execute::<Prediction>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal mendapatkan hasil diagnosa."))
    }

    /// POST /detection/save — multipart `{userId, tanaman, hasil, confidence, file}`.
    pub async fn save_diagnosis(
        &self,
        user_id: &str,
        plant: PlantKind,
        result_label: &str,
        confidence: f64,
        photo: &PlantPhoto,
    ) -> Result<SavedDiagnosis, ApiFailure> {
        let form = Form::new()
            .text("userId", user_id.to_string())
            .text("tanaman", plant.code())
            .text("hasil", result_label.to_string())
            .text("confidence", confidence.to_string())
            .part("file", photo_part(photo)?);

        let req = self
            .request(Method::POST, "/detection/save")
            .multipart(form);
        let (data, _) = self
            .execute::<SavedDiagnosis>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal menyimpan diagnosa."))?;
        Ok(data)
    }

    /// GET /detection/history/:userId — always the full list, never a delta.
    pub async fn diagnosis_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<SavedDiagnosis>, ApiFailure> {
        let req = self.request(Method::GET, &format!("/detection/history/{}", user_id));
        let (data, _) = self
            .execute::<Vec<SavedDiagnosis>>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal memuat riwayat diagnosa."))?;
        Ok(data)
    }
}

#[async_trait]
impl DiagnosisGateway for ApiClient {
    async fn predict(
        &self,
        plant: PlantKind,
        photo: &PlantPhoto,
    ) -> Result<(Prediction, String), ApiFailure> {
        ApiClient::predict(self, plant, photo).await
    }

    async fn save_diagnosis(
        &self,
        user_id: &str,
        plant: PlantKind,
        result_label: &str,
        confidence: f64,
        photo: &PlantPhoto,
    ) -> Result<SavedDiagnosis, ApiFailure> {
        ApiClient::save_diagnosis(self, user_id, plant, result_label, confidence, photo).await
    }

    async fn diagnosis_history(&self, user_id: &str) -> Result<Vec<SavedDiagnosis>, ApiFailure> {
        ApiClient::diagnosis_history(self, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_with_null_disease_deserializes() {
        let json = r#"{"tanaman": "selada", "confidence": 0.42, "disease": null}"#;
        let prediction: Prediction = serde_json::from_str(json).unwrap();
        assert_eq!(prediction.tanaman, "selada");
        assert!(prediction.disease.is_none());
    }

    #[test]
    fn prediction_with_disease_deserializes() {
        let json = r#"{
            "tanaman": "tomat",
            "confidence": 0.95,
            "disease": {
                "id": "d-1",
                "label": "early_blight",
                "name": "Early Blight",
                "deskripsi": "Bercak konsentris pada daun tua",
                "penyebab": "Jamur Alternaria solani",
                "pencegahan": ["Rotasi tanaman"],
                "pengendalian": ["Fungisida tembaga"]
            }
        }"#;
        let prediction: Prediction = serde_json::from_str(json).unwrap();
        let disease = prediction.disease.unwrap();
        assert_eq!(disease.name, "Early Blight");
        assert_eq!(disease.pengendalian, vec!["Fungisida tembaga"]);
    }

    #[test]
    fn history_record_tolerates_sparse_disease_fields() {
        let json = r#"{
            "id": "h-1",
            "userId": "u-1",
            "tanaman": "TOMAT",
            "hasil": "Early Blight",
            "confidence": 0.93,
            "imageUrl": "https://cdn.kebun.id/h-1.jpg",
            "createdAt": "2025-06-01T08:30:00Z",
            "diseaseId": "d-1",
            "disease": {"label": "early_blight", "name": "Early Blight"}
        }"#;
        let record: SavedDiagnosis = serde_json::from_str(json).unwrap();
        assert_eq!(record.user_id, "u-1");
        let disease = record.disease.unwrap();
        assert!(disease.deskripsi.is_none());
        assert!(disease.pencegahan.is_empty());
    }

    #[test]
    fn healthy_record_has_no_disease() {
        let json = r#"{
            "id": "h-2",
            "userId": "u-1",
            "tanaman": "SELADA",
            "hasil": "Healthy",
            "confidence": 0.97,
            "createdAt": "2025-06-02T10:00:00Z"
        }"#;
        let record: SavedDiagnosis = serde_json::from_str(json).unwrap();
        assert!(record.disease.is_none());
        assert_eq!(record.hasil.as_deref(), Some("Healthy"));
    }
}
