//! Customer dashboard: own shipments, capped selection, photo bundles.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;

use super::mass_download::{DownloadReport, DownloadTarget, MassDownloader};
use crate::error::{AppError, AppResult};
use crate::middleware::AuthContext;
use crate::models::{validate_date_range, Shipment};
use crate::notify::Notifier;
use crate::services::CustomerShipmentService;
use crate::store::{CappedSelection, FilterKey, ListStore, PaginationPatch, SelectionChange};

pub struct CustomerDashboard {
    service: CustomerShipmentService,
    notifier: Arc<dyn Notifier>,
    auth: AuthContext,
    store: ListStore,
    selection: CappedSelection,
    rows: Vec<Shipment>,
}

impl CustomerDashboard {
    pub fn new(
        service: CustomerShipmentService,
        notifier: Arc<dyn Notifier>,
        auth: AuthContext,
        page_size: u32,
    ) -> Self {
        Self {
            service,
            notifier,
            auth,
            store: ListStore::new(page_size),
            selection: CappedSelection::default(),
            rows: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Shipment] {
        &self.rows
    }

    pub fn store_mut(&mut self) -> &mut ListStore {
        &mut self.store
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    pub fn selection(&self) -> &CappedSelection {
        &self.selection
    }

    pub async fn refresh(&mut self) -> AppResult<()> {
        let query = self.store.to_query();
        match self.service.list(&query).await {
            Ok(page) => {
                self.rows = page.items;
                self.selection.clear();
                let mut patch = PaginationPatch::from(page.pagination);
                patch.page_size = Some(query.limit);
                self.store.set_pagination(patch);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load customer shipments: {}", e);
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }

    /// Validates the date range, returns to page one and refetches.
    pub async fn apply_filters(&mut self) -> AppResult<()> {
        let range = validate_date_range(
            self.store.filter(FilterKey::DateFrom),
            self.store.filter(FilterKey::DateTo),
        );
        if let Err(e) = range {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        self.store.set_current_page(1);
        self.refresh().await
    }

    pub async fn go_to_page(&mut self, page: u32) -> AppResult<()> {
        let last = self.store.pagination().total_pages.max(1);
        self.store.set_current_page(page.clamp(1, last));
        self.refresh().await
    }

    pub async fn change_page_size(&mut self, size: u32) -> AppResult<()> {
        self.store.set_page_size(size);
        self.refresh().await
    }

    pub fn toggle(&mut self, id: &str, now: Instant) -> SelectionChange {
        let change = self.selection.toggle(id, now);
        if change == (SelectionChange::Rejected { warn: true }) {
            self.notifier.warning(&cap_message(self.selection.cap()));
        }
        change
    }

    pub fn select_all_visible(&mut self, now: Instant) {
        let ids: Vec<String> = self.rows.iter().map(|s| s.id.clone()).collect();
        let outcome = self.selection.select_all(&ids, now);
        if outcome.warn {
            self.notifier.warning(&cap_message(self.selection.cap()));
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Folder names come from the loaded rows; unknown ids use the id itself.
    fn selected_targets(&self) -> Vec<DownloadTarget> {
        self.selection
            .ids()
            .iter()
            .map(|id| match self.rows.iter().find(|s| &s.id == id) {
                Some(shipment) => DownloadTarget::from(shipment),
                None => DownloadTarget::new(id.clone(), id.clone()),
            })
            .collect()
    }

    pub async fn download_selected(
        &self,
        downloader: &MassDownloader,
    ) -> AppResult<DownloadReport> {
        downloader
            .download(&self.auth, &self.selected_targets())
            .await
    }

    pub fn export_url(&self) -> AppResult<String> {
        let customer_id = self.customer_id()?;
        Ok(self
            .service
            .export_url(customer_id, &self.store.to_query().filters))
    }

    pub async fn export_csv(&self) -> AppResult<Bytes> {
        let customer_id = self.customer_id()?;
        self.service
            .export_csv(customer_id, &self.store.to_query().filters)
            .await
    }

    fn customer_id(&self) -> AppResult<&str> {
        self.auth
            .customer_id()
            .ok_or_else(|| AppError::Forbidden("export customer shipments".to_string()))
    }
}

fn cap_message(cap: usize) -> String {
    format!("You can select at most {} shipments", cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::notify::{RecordingNotifier, ToastLevel};
    use crate::session::UserData;
    use crate::store::MASS_DOWNLOAD_CAP;
    use crate::testing::{api_client, query_value, FakeTransport};
    use http::Method;
    use serde_json::{json, Value};
    use std::time::Duration;

    const LIST_PATH: &str = "/client/get/shipments";

    fn list_body(ids: &[&str], page: u32, pages: u32) -> Value {
        let rows: Vec<Value> = ids
            .iter()
            .map(|id| json!({"_id": id, "exportStatus": "shipped"}))
            .collect();
        json!({
            "success": true,
            "data": rows,
            "pagination": {"currentPage": page, "totalPages": pages, "totalItems": 30,
                           "hasNext": page < pages, "hasPrev": page > 1}
        })
    }

    fn dashboard(notifier: &Arc<RecordingNotifier>) -> CustomerDashboard {
        dashboard_on(&FakeTransport::new(), notifier)
    }

    fn dashboard_on(
        transport: &Arc<FakeTransport>,
        notifier: &Arc<RecordingNotifier>,
    ) -> CustomerDashboard {
        CustomerDashboard::new(
            CustomerShipmentService::new(api_client(transport)),
            notifier.clone(),
            AuthContext::new(UserData {
                id: "c1".to_string(),
                name: "Tanaka Motors".to_string(),
                user_id: None,
                role: Role::Customer,
                can_mass_download_photos: true,
            }),
            10,
        )
    }

    #[test]
    fn test_twenty_first_selection_warns_once_per_run() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut d = dashboard(&notifier);
        let start = Instant::now();
        for i in 0..MASS_DOWNLOAD_CAP {
            d.toggle(&format!("s{}", i), start);
        }

        for attempt in 0..3u64 {
            let at = start + Duration::from_millis(100 * attempt);
            assert!(matches!(
                d.toggle("extra", at),
                SelectionChange::Rejected { .. }
            ));
        }
        assert_eq!(d.selection().len(), MASS_DOWNLOAD_CAP);
        assert_eq!(notifier.count(ToastLevel::Warning), 1);

        d.toggle("extra", start + Duration::from_secs(3));
        assert_eq!(notifier.count(ToastLevel::Warning), 2);
    }

    #[test]
    fn test_export_url_uses_own_id_and_filters() {
        let notifier = Arc::new(RecordingNotifier::new());
        let mut d = dashboard(&notifier);
        d.store_mut().set_filter(FilterKey::ExportStatus, "shipped");
        assert_eq!(
            d.export_url().unwrap(),
            "http://backend.test/client/shipments/export/csv/c1?exportStatus=shipped"
        );
    }

    #[tokio::test]
    async fn test_refetch_clears_selection() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, LIST_PATH, 200, list_body(&["s1", "s2"], 1, 3));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut d = dashboard_on(&transport, &notifier);
        d.refresh().await.unwrap();

        let now = Instant::now();
        d.select_all_visible(now);
        assert_eq!(d.selection().len(), 2);
        d.go_to_page(2).await.unwrap();
        assert!(d.selection().is_empty());

        d.toggle("s1", now);
        d.change_page_size(50).await.unwrap();
        assert!(d.selection().is_empty());
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "limit"), Some("50"));
        assert_eq!(query_value(&request, "page"), Some("1"));
    }

    #[tokio::test]
    async fn test_apply_filters_queries_first_page() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, LIST_PATH, 200, list_body(&["s9"], 1, 1));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut d = dashboard_on(&transport, &notifier);
        d.store_mut().set_filter(FilterKey::ExportStatus, "shipped");
        d.store_mut().set_current_page(3);

        d.apply_filters().await.unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "page"), Some("1"));
        assert_eq!(query_value(&request, "exportStatus"), Some("shipped"));
        assert_eq!(d.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_filters_rejects_inverted_range() {
        let transport = FakeTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let mut d = dashboard_on(&transport, &notifier);
        d.store_mut().set_filter(FilterKey::DateFrom, "2024-03-01");
        d.store_mut().set_filter(FilterKey::DateTo, "2024-02-01");

        assert!(matches!(
            d.apply_filters().await,
            Err(AppError::Validation(_))
        ));
        assert!(transport.requests().is_empty());
        assert_eq!(notifier.count(ToastLevel::Error), 1);
    }
}
