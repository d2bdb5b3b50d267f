//! The saved-diagnosis history list.
//!
//! History is a read-only projection of the server's records: every refresh
//! refetches the full list, and a record opened from the list replays
//! through the same result surface with the save affordance off. Refreshes
//! are last-write-wins; the server list is small and a stale overwrite is
//! corrected by the next `Saved` signal.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::error;

use crate::api::detection::SavedDiagnosis;
use crate::diagnosis::{DiagnosisGateway, ResultView};

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    Loading,
    Failed(String),
    Loaded(Vec<SavedDiagnosis>),
}

pub struct HistoryStore {
    gateway: Arc<dyn DiagnosisGateway>,
    state: ArcSwap<HistoryState>,
}

impl HistoryStore {
    pub fn new(gateway: Arc<dyn DiagnosisGateway>) -> Self {
        Self {
            gateway,
            state: ArcSwap::from_pointee(HistoryState::Loaded(Vec::new())),
        }
    }

    pub fn state(&self) -> Arc<HistoryState> {
        self.state.load_full()
    }

    /// Refetch the full list for the user. Also the reaction to a `Saved`
    /// workflow event.
    pub async fn refresh(&self, user_id: &str) -> Arc<HistoryState> {
        self.state.store(Arc::new(HistoryState::Loading));

        let next = match self.gateway.diagnosis_history(user_id).await {
            Ok(records) => HistoryState::Loaded(records),
            Err(failure) => {
                error!("Failed to load diagnosis history: {}", failure);
                HistoryState::Failed(failure.user_message())
            }
        };

        let next = Arc::new(next);
        self.state.store(next.clone());
        next
    }

    pub fn records(&self) -> Vec<SavedDiagnosis> {
        match self.state.load().as_ref() {
            HistoryState::Loaded(records) => records.clone(),
            _ => Vec::new(),
        }
    }

    /// Open one record from the loaded list, read-only.
    pub fn view_record(&self, id: &str) -> Option<ResultView> {
        match self.state.load().as_ref() {
            HistoryState::Loaded(records) => records
                .iter()
                .find(|r| r.id == id)
                .map(ResultView::from_record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::detection::{Prediction, SavedDisease};
    use crate::api::ApiFailure;
    use crate::api::error::NETWORK_ERROR_MESSAGE;
    use crate::diagnosis::{PlantKind, PlantPhoto};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct StubGateway {
        history_results: Mutex<VecDeque<Result<Vec<SavedDiagnosis>, ApiFailure>>>,
    }

    impl StubGateway {
        fn with_history(result: Result<Vec<SavedDiagnosis>, ApiFailure>) -> Self {
            let stub = Self::default();
            stub.history_results.lock().push_back(result);
            stub
        }
    }

    #[async_trait]
    impl DiagnosisGateway for StubGateway {
        async fn predict(
            &self,
            _plant: PlantKind,
            _photo: &PlantPhoto,
        ) -> Result<(Prediction, String), ApiFailure> {
            unreachable!("history tests never predict")
        }

        async fn save_diagnosis(
            &self,
            _user_id: &str,
            _plant: PlantKind,
            _result_label: &str,
            _confidence: f64,
            _photo: &PlantPhoto,
        ) -> Result<SavedDiagnosis, ApiFailure> {
            unreachable!("history tests never save")
        }

        async fn diagnosis_history(
            &self,
            _user_id: &str,
        ) -> Result<Vec<SavedDiagnosis>, ApiFailure> {
            self.history_results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![]))
        }
    }

    fn record(id: &str) -> SavedDiagnosis {
        SavedDiagnosis {
            id: id.to_string(),
            user_id: "u-1".to_string(),
            tanaman: "TOMAT".to_string(),
            hasil: Some("Early Blight".to_string()),
            confidence: 0.93,
            image_url: None,
            created_at: "2025-06-01T08:30:00Z".to_string(),
            disease_id: Some("d-1".to_string()),
            disease: Some(SavedDisease {
                label: "early_blight".to_string(),
                name: "Early Blight".to_string(),
                penyebab: None,
                deskripsi: None,
                pencegahan: vec![],
                pengendalian: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn refresh_replaces_the_whole_list() {
        let stub = StubGateway::with_history(Ok(vec![record("h-1"), record("h-2")]));
        stub.history_results.lock().push_back(Ok(vec![record("h-3")]));
        let store = HistoryStore::new(Arc::new(stub));

        store.refresh("u-1").await;
        assert_eq!(store.records().len(), 2);

        // Not a delta: the second fetch is the new truth.
        store.refresh("u-1").await;
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "h-3");
    }

    #[tokio::test]
    async fn an_empty_list_is_a_normal_loaded_state() {
        let stub = StubGateway::with_history(Ok(vec![]));
        let store = HistoryStore::new(Arc::new(stub));

        let state = store.refresh("u-1").await;
        assert_eq!(*state, HistoryState::Loaded(vec![]));
    }

    #[tokio::test]
    async fn failure_keeps_the_user_message() {
        let stub = StubGateway::with_history(Err(ApiFailure::network("connection refused")));
        let store = HistoryStore::new(Arc::new(stub));

        let state = store.refresh("u-1").await;
        assert_eq!(*state, HistoryState::Failed(NETWORK_ERROR_MESSAGE.to_string()));
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn a_record_replays_without_the_save_affordance() {
        let stub = StubGateway::with_history(Ok(vec![record("h-1")]));
        let store = HistoryStore::new(Arc::new(stub));
        store.refresh("u-1").await;

        let view = store.view_record("h-1").unwrap();
        assert!(!view.offer_save());
        assert!(store.view_record("missing").is_none());
    }
}
