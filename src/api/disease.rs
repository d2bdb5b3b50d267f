//! Disease catalog operations and the disease record shared with the
//! detection endpoints.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiFailure};

/// A disease as served by the catalog and by fresh prediction responses.
///
/// `penyebab`/`deskripsi` and the two lists are optional because records
/// reconstructed from history may not have retained them; the presentation
/// layer substitutes placeholder text, the data model never does.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseData {
    pub id: String,
    pub label: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub penyebab: Option<String>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub pencegahan: Vec<String>,
    #[serde(default)]
    pub pengendalian: Vec<String>,
    #[serde(default)]
    pub tanaman: Option<String>,
}

impl ApiClient {
    /// GET /diseases — the catalog the guidance pages browse.
    pub async fn diseases(&self) -> Result<Vec<DiseaseData>, ApiFailure> {
        let req = self.request(Method::GET, "/diseases");
        let (data, _) = self
            .execute::<Vec<DiseaseData>>(req, 200)
            .await
            .map_err(|f| f.or_message("Failed to fetch diseases"))?;
        Ok(data)
    }

    /// GET /diseases/:id
    pub async fn disease(&self, id: &str) -> Result<DiseaseData, ApiFailure> {
        let req = self.request(Method::GET, &format!("/diseases/{}", id));
        let (data, _) = self
            .execute::<DiseaseData>(req, 200)
            .await
            .map_err(|f| f.or_message(&format!("Disease with ID {} not found", id)))?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_default_when_absent() {
        let json = r#"{"id": "d-1", "label": "early_blight", "name": "Early Blight"}"#;
        let disease: DiseaseData = serde_json::from_str(json).unwrap();

        assert_eq!(disease.name, "Early Blight");
        assert!(disease.penyebab.is_none());
        assert!(disease.deskripsi.is_none());
        assert!(disease.pencegahan.is_empty());
        assert!(disease.pengendalian.is_empty());
    }

    #[test]
    fn full_record_round_trips() {
        let json = r#"{
            "id": "d-2",
            "label": "leaf_spot",
            "name": "Leaf Spot",
            "image": "https://cdn.kebun.id/d-2.jpg",
            "penyebab": "Jamur Septoria",
            "deskripsi": "Bercak coklat pada daun",
            "pencegahan": ["Rotasi tanaman"],
            "pengendalian": ["Fungisida"],
            "tanaman": "TOMAT"
        }"#;
        let disease: DiseaseData = serde_json::from_str(json).unwrap();
        assert_eq!(disease.pencegahan, vec!["Rotasi tanaman"]);
        assert_eq!(disease.tanaman.as_deref(), Some("TOMAT"));
    }
}
