//! Planting tracker endpoints. Thin CRUD: start, list, complete.
//!
//! The per-record diagnosis badges (`diagnosisCount`, `lastDiagnosisDate`)
//! are computed server-side from saved diagnoses.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ApiClient, ApiFailure};
use crate::diagnosis::PlantKind;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Planting {
    pub id: String,
    pub user_id: String,
    pub tanaman: String,
    pub is_done: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub diagnosis_count: u32,
    #[serde(default)]
    pub last_diagnosis_date: Option<String>,
}

impl ApiClient {
    /// POST /planting/start — the one endpoint whose envelope reports 201.
    pub async fn start_planting(
        &self,
        user_id: &str,
        plant: PlantKind,
    ) -> Result<Planting, ApiFailure> {
        let req = self
            .request(Method::POST, "/planting/start")
            .json(&json!({ "userId": user_id, "tanaman": plant.code() }));
        let (data, _) = self
            .execute::<Planting>(req, 201)
            .await
            .map_err(|f| f.or_message("Gagal memulai penanaman"))?;
        Ok(data)
    }

    /// GET /planting/:userId
    pub async fn plantings(&self, user_id: &str) -> Result<Vec<Planting>, ApiFailure> {
        let req = self.request(Method::GET, &format!("/planting/{}", user_id));
        let (data, _) = self
            .execute::<Vec<Planting>>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal mengambil daftar penanaman"))?;
        Ok(data)
    }

    /// PATCH /planting/:id/complete
    pub async fn complete_planting(&self, id: &str) -> Result<Planting, ApiFailure> {
        let req = self.request(Method::PATCH, &format!("/planting/{}/complete", id));
        let (data, _) = self
            .execute::<Planting>(req, 200)
            .await
            .map_err(|f| f.or_message("Gagal menyelesaikan penanaman"))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planting_record_deserializes() {
        let json = r#"{
            "id": "p-1",
            "userId": "u-1",
            "tanaman": "CABAI",
            "isDone": false,
            "createdAt": "2025-05-01T07:00:00Z",
            "updatedAt": "2025-05-20T07:00:00Z",
            "diagnosisCount": 3,
            "lastDiagnosisDate": "2025-05-19T09:00:00Z"
        }"#;
        let planting: Planting = serde_json::from_str(json).unwrap();
        assert_eq!(planting.tanaman, "CABAI");
        assert_eq!(planting.diagnosis_count, 3);
        assert!(!planting.is_done);
    }

    #[test]
    fn badge_fields_default_when_absent() {
        let json = r#"{
            "id": "p-2",
            "userId": "u-1",
            "tanaman": "TOMAT",
            "isDone": true,
            "createdAt": "2025-05-01T07:00:00Z",
            "updatedAt": "2025-05-20T07:00:00Z"
        }"#;
        let planting: Planting = serde_json::from_str(json).unwrap();
        assert_eq!(planting.diagnosis_count, 0);
        assert!(planting.last_diagnosis_date.is_none());
    }
}
