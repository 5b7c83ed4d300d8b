//! Admin shipment table: fetch cycle, sorting, paging and bulk actions.

use std::sync::Arc;

use chrono::NaiveDate;

use super::debounce::DebouncedSearch;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthContext;
use crate::models::{validate_date_range, NewShipment, NewVessel, Page, Shipment, ShipmentUpdate};
use crate::notify::Notifier;
use crate::services::{ListQuery, ShipmentService, VesselService};
use crate::store::{FilterKey, ListStore, PaginationPatch};

/// Identifies one fetch; only the most recently issued ticket may apply.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    pub query: ListQuery,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct ShipmentList {
    shipments: ShipmentService,
    vessels: VesselService,
    notifier: Arc<dyn Notifier>,
    auth: AuthContext,
    store: ListStore,
    rows: Vec<Shipment>,
    generation: u64,
    loading: bool,
}

impl ShipmentList {
    pub fn new(
        shipments: ShipmentService,
        vessels: VesselService,
        notifier: Arc<dyn Notifier>,
        auth: AuthContext,
        page_size: u32,
    ) -> Self {
        Self {
            shipments,
            vessels,
            notifier,
            auth,
            store: ListStore::new(page_size),
            rows: Vec::new(),
            generation: 0,
            loading: false,
        }
    }

    pub fn rows(&self) -> &[Shipment] {
        &self.rows
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ListStore {
        &mut self.store
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn shipments(&self) -> &ShipmentService {
        &self.shipments
    }

    pub fn set_filter(&mut self, key: FilterKey, value: impl Into<String>) {
        self.store.set_filter(key, value);
    }

    /// Issues a ticket for the current state, superseding any earlier one.
    pub fn prepare_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            query: self.store.to_query(),
        }
    }

    /// Applies a fetch result. Returns false when the ticket is stale.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: AppResult<Page<Shipment>>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding stale shipment fetch: ticket={}, current={}",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                self.rows = page.items;
                self.store.clear_selection();
                let mut patch = PaginationPatch::from(page.pagination);
                // the requested size stays authoritative
                patch.page_size = Some(ticket.query.limit);
                self.store.set_pagination(patch);
                tracing::debug!(
                    "Shipments loaded: rows={}, page={}/{}",
                    self.rows.len(),
                    self.store.pagination().current_page,
                    self.store.pagination().total_pages
                );
            }
            Err(e) => {
                tracing::error!("Failed to load shipments: {}", e);
                self.notifier.error(&e.user_message());
            }
        }
        true
    }

    pub async fn refresh(&mut self) {
        let ticket = self.prepare_fetch();
        let result = self.shipments.list(&ticket.query).await;
        self.apply_fetch(ticket, result);
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
        self.refresh().await;
        Ok(())
    }

    /// Sets the free-text filter and refetches from page one.
    pub async fn search(&mut self, term: &str) -> AppResult<()> {
        self.store.set_filter(FilterKey::Search, term);
        self.apply_filters().await
    }

    /// Waits for typing to settle, then runs the search for the final term.
    pub async fn search_when_settled(&mut self, input: &mut DebouncedSearch) -> AppResult<()> {
        match input.settled().await {
            Some(term) => {
                tracing::debug!("Search settled: {:?}", term);
                self.search(&term).await
            }
            None => Ok(()),
        }
    }

    pub async fn clear_filters(&mut self) {
        self.store.clear_filters();
        self.refresh().await;
    }

    pub async fn go_to_page(&mut self, page: u32) {
        let last = self.store.pagination().total_pages.max(1);
        self.store.set_current_page(page.clamp(1, last));
        self.refresh().await;
    }

    pub async fn next_page(&mut self) {
        if self.store.pagination().has_next {
            let page = self.store.pagination().current_page + 1;
            self.go_to_page(page).await;
        }
    }

    pub async fn prev_page(&mut self) {
        if self.store.pagination().has_prev {
            let page = self.store.pagination().current_page.saturating_sub(1);
            self.go_to_page(page).await;
        }
    }

    pub async fn change_page_size(&mut self, size: u32) {
        self.store.set_page_size(size);
        self.refresh().await;
    }

    pub async fn click_sort(&mut self, field: &str) {
        let next = self.store.sort().cycle(field);
        self.store.set_sort_config(next);
        self.refresh().await;
    }

    pub fn toggle_row(&mut self, id: &str) {
        self.store.toggle_row_selection(id);
    }

    pub fn toggle_all(&mut self) {
        let ids: Vec<String> = self.rows.iter().map(|s| s.id.clone()).collect();
        self.store.toggle_all_selection(&ids);
    }

    fn selected_ids(&self) -> Vec<String> {
        self.store.selected().to_vec()
    }

    pub async fn bulk_assign_vessel(&mut self, vessel_id: &str) -> AppResult<()> {
        let ids = self.selected_ids();
        let result = self.shipments.bulk_assign_vessel(&ids, vessel_id).await;
        self.finish_bulk(result, || format!("Vessel assigned to {} shipments", ids.len()))
            .await
    }

    /// Creates the vessel first, then assigns it to the selection.
    pub async fn bulk_assign_new_vessel(&mut self, vessel: &NewVessel) -> AppResult<()> {
        self.auth.ensure(self.auth.can_edit_vessels(), "create vessels")?;
        if self.store.selected().is_empty() {
            let e = AppError::Validation("Select at least one shipment".to_string());
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        let created = match self.vessels.create(vessel).await {
            Ok(v) => v,
            Err(e) => {
                self.notifier.error(&e.user_message());
                return Err(e);
            }
        };
        tracing::info!("Created vessel {} for bulk assignment", created.id);
        self.bulk_assign_vessel(&created.id).await
    }

    pub async fn bulk_assign_gate_out(&mut self, date: NaiveDate) -> AppResult<()> {
        let ids = self.selected_ids();
        let result = self.shipments.bulk_assign_gate_out(&ids, date).await;
        self.finish_bulk(result, || {
            format!("Gate-out date set to {} for {} shipments", date, ids.len())
        })
        .await
    }

    async fn finish_bulk(
        &mut self,
        result: AppResult<()>,
        message: impl FnOnce() -> String,
    ) -> AppResult<()> {
        match result {
            Ok(()) => {
                self.notifier.success(&message());
                self.store.clear_selection();
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> AppResult<()> {
        self.auth
            .ensure(self.auth.can_delete_shipments(), "delete shipments")?;
        if let Err(e) = self.shipments.delete(id).await {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        self.notifier.success("Shipment deleted");
        self.remove_locally(&[id.to_string()]);
        self.refresh().await;
        Ok(())
    }

    pub async fn bulk_delete(&mut self) -> AppResult<()> {
        self.auth
            .ensure(self.auth.can_delete_shipments(), "delete shipments")?;
        let ids = self.selected_ids();
        if let Err(e) = self.shipments.bulk_delete(&ids).await {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        self.notifier
            .success(&format!("{} shipments deleted", ids.len()));
        self.remove_locally(&ids);
        self.refresh().await;
        Ok(())
    }

    /// Optimistic removal; page count shrinks and the current page is clamped.
    fn remove_locally(&mut self, ids: &[String]) {
        self.rows.retain(|s| !ids.contains(&s.id));
        self.store.clear_selection();
        let mut pagination = *self.store.pagination();
        let total = pagination.total_items.saturating_sub(ids.len() as u64);
        pagination.recompute(total);
        self.store.set_pagination(pagination.into());
    }

    pub async fn create(&mut self, shipment: &NewShipment) -> AppResult<Shipment> {
        match self.shipments.create(shipment).await {
            Ok(created) => {
                self.notifier.success("Shipment created");
                self.refresh().await;
                Ok(created)
            }
            Err(e) => {
                if let AppError::Conflict { existing_dates, .. } = &e {
                    tracing::warn!(
                        "Shipment conflict for chassis {}: existing={:?}",
                        shipment.chassis_number,
                        existing_dates
                    );
                }
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }

    pub async fn update(&mut self, id: &str, update: &ShipmentUpdate) -> AppResult<Shipment> {
        match self.shipments.update(id, update).await {
            Ok(updated) => {
                if let Some(row) = self.rows.iter_mut().find(|s| s.id == id) {
                    *row = updated.clone();
                }
                self.notifier.success("Shipment updated");
                Ok(updated)
            }
            Err(e) => {
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::notify::{RecordingNotifier, ToastLevel};
    use crate::session::UserData;
    use crate::store::{SortConfig, SortOrder};
    use crate::testing::{api_client, query_value, FakeTransport};
    use http::Method;
    use serde_json::{json, Value};

    fn admin() -> AuthContext {
        AuthContext::new(UserData {
            id: "a1".to_string(),
            name: "Admin".to_string(),
            user_id: None,
            role: Role::Admin,
            can_mass_download_photos: false,
        })
    }

    fn rows(ids: &[&str]) -> Vec<Value> {
        ids.iter()
            .map(|id| json!({"_id": id, "exportStatus": "pending"}))
            .collect()
    }

    fn list_body(ids: &[&str], page: u32, pages: u32, total: u64) -> Value {
        json!({
            "success": true,
            "data": rows(ids),
            "meta": {"pagination": {
                "currentPage": page, "totalPages": pages, "totalItems": total,
                "hasNextPage": page < pages, "hasPrevPage": page > 1
            }}
        })
    }

    fn controller(
        transport: &Arc<FakeTransport>,
        notifier: &Arc<RecordingNotifier>,
        auth: AuthContext,
    ) -> ShipmentList {
        let api = api_client(transport);
        ShipmentList::new(
            ShipmentService::new(api.clone()),
            VesselService::new(api),
            notifier.clone(),
            auth,
            10,
        )
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let transport = FakeTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());

        let older = list.prepare_fetch();
        let newer = list.prepare_fetch();
        assert!(list.is_loading());

        let fresh = Page {
            items: vec![],
            pagination: crate::models::Pagination::first(10),
        };
        assert!(list.apply_fetch(newer, Ok(fresh)));
        assert!(!list.is_loading());

        let stale: Page<Shipment> = serde_json::from_value::<crate::models::ListEnvelope<Shipment>>(
            list_body(&["old"], 1, 1, 1),
        )
        .unwrap()
        .into_page(1, 10);
        assert!(!list.apply_fetch(older, Ok(stale)));
        assert!(list.rows().is_empty());
    }

    #[tokio::test]
    async fn test_apply_filters_resets_page() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&["s1"], 1, 1, 1));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.set_filter(FilterKey::Search, "NZE");
        list.store_mut().set_current_page(3);

        list.apply_filters().await.unwrap();
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "page"), Some("1"));
        assert_eq!(query_value(&request, "search"), Some("NZE"));
    }

    #[tokio::test]
    async fn test_every_refetch_clears_selection() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&["s1", "s2"], 1, 3, 25));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.refresh().await;

        list.toggle_row("s1");
        list.click_sort("yard").await;
        assert!(list.store().selected().is_empty());

        list.toggle_row("s1");
        list.go_to_page(2).await;
        assert!(list.store().selected().is_empty());

        list.toggle_row("s2");
        list.change_page_size(25).await;
        assert!(list.store().selected().is_empty());

        list.toggle_all();
        list.set_filter(FilterKey::Yard, "3");
        list.apply_filters().await.unwrap();
        assert!(list.store().selected().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_selection() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/admin/shipments", 200, list_body(&["s1"], 1, 1, 1));
        transport.respond(Method::GET, "/admin/shipments", 500, json!({"message": "down"}));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.refresh().await;
        list.toggle_row("s1");

        list.refresh().await;
        assert_eq!(list.store().selected().to_vec(), vec!["s1".to_string()]);
        assert_eq!(list.rows().len(), 1);
        assert_eq!(notifier.count(ToastLevel::Error), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_search_fetches_final_term_once() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&["s1"], 1, 1, 1));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.store_mut().set_current_page(2);

        let mut input = DebouncedSearch::new(std::time::Duration::from_millis(300));
        for term in ["N", "NZ", "NZE"] {
            input.input(term);
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        assert!(transport.requests().is_empty());

        list.search_when_settled(&mut input).await.unwrap();
        let gets = transport.requests_to(Method::GET, "/admin/shipments");
        assert_eq!(gets.len(), 1);
        assert_eq!(query_value(&gets[0], "search"), Some("NZE"));
        assert_eq!(query_value(&gets[0], "page"), Some("1"));
    }

    #[tokio::test]
    async fn test_inverted_date_range_blocks_fetch() {
        let transport = FakeTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.set_filter(FilterKey::DateFrom, "2024-02-01");
        list.set_filter(FilterKey::DateTo, "2024-01-01");

        assert!(list.apply_filters().await.is_err());
        assert!(transport.requests().is_empty());
        assert_eq!(notifier.count(ToastLevel::Error), 1);
    }

    #[tokio::test]
    async fn test_page_size_is_never_taken_from_response() {
        let transport = FakeTransport::new();
        transport.always(
            Method::GET,
            "/admin/shipments",
            200,
            json!({"success": true, "data": [], "pagination": {"page": 1, "limit": 10, "total": 0}}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.store_mut().set_current_page(2);

        list.change_page_size(50).await;
        assert_eq!(list.store().pagination().page_size, 50);
        list.refresh().await;
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "limit"), Some("50"));
        assert_eq!(query_value(&request, "page"), Some("1"));
    }

    #[tokio::test]
    async fn test_click_sort_cycles() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&[], 1, 1, 0));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());

        list.click_sort("gateInDate").await;
        assert_eq!(
            list.store().sort(),
            &SortConfig::new("gateInDate", SortOrder::Asc)
        );
        let request = transport.last_request().unwrap();
        assert_eq!(query_value(&request, "sortOrder"), Some("asc"));

        list.click_sort("gateInDate").await;
        list.click_sort("gateInDate").await;
        assert!(list.store().sort().is_default());
    }

    #[tokio::test]
    async fn test_deleting_last_row_of_last_page_clamps() {
        let transport = FakeTransport::new();
        transport.respond(Method::GET, "/admin/shipments", 200, list_body(&["s21"], 3, 3, 21));
        transport.respond(
            Method::GET,
            "/admin/shipments",
            200,
            list_body(&["s11", "s12"], 2, 2, 20),
        );
        transport.respond(
            Method::DELETE,
            "/admin/shipments/s21",
            200,
            json!({"success": true}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.store_mut().set_current_page(3);
        list.refresh().await;
        assert_eq!(list.store().pagination().current_page, 3);

        list.delete("s21").await.unwrap();
        let gets = transport.requests_to(Method::GET, "/admin/shipments");
        assert_eq!(gets.len(), 2);
        assert_eq!(query_value(&gets[1], "page"), Some("2"));
        assert_eq!(list.store().pagination().current_page, 2);
        assert_eq!(list.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_subadmin_cannot_delete() {
        let transport = FakeTransport::new();
        let notifier = Arc::new(RecordingNotifier::new());
        let mut auth_user = admin().user().clone();
        auth_user.role = Role::Subadmin;
        let mut list = controller(&transport, &notifier, AuthContext::new(auth_user));

        let err = list.delete("s1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_gate_out_refetches_and_clears_selection() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&["s1", "s2"], 1, 1, 2));
        transport.respond(
            Method::POST,
            "/admin/shipments/bulk-gate-out",
            200,
            json!({"success": true}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.refresh().await;
        list.toggle_all();
        assert_eq!(list.store().selected().len(), 2);

        list.bulk_assign_gate_out(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
            .await
            .unwrap();
        assert!(list.store().selected().is_empty());
        assert_eq!(transport.requests_to(Method::GET, "/admin/shipments").len(), 2);
        assert_eq!(notifier.count(ToastLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_optimistic_then_reconciles() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::GET,
            "/admin/shipments",
            200,
            list_body(&["s1", "s2", "s3"], 1, 1, 3),
        );
        transport.respond(Method::GET, "/admin/shipments", 200, list_body(&["s3"], 1, 1, 1));
        transport.respond(
            Method::POST,
            "/admin/shipments/bulk-delete",
            200,
            json!({"success": true}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.refresh().await;
        list.toggle_row("s1");
        list.toggle_row("s2");

        list.bulk_delete().await.unwrap();
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.store().pagination().total_items, 1);
        let body = transport
            .requests_to(Method::POST, "/admin/shipments/bulk-delete")[0]
            .body
            .clone()
            .unwrap();
        assert_eq!(body, json!({"shipmentIds": ["s1", "s2"]}));
    }

    #[tokio::test]
    async fn test_bulk_assign_new_vessel_creates_then_assigns() {
        let transport = FakeTransport::new();
        transport.always(Method::GET, "/admin/shipments", 200, list_body(&["s1"], 1, 1, 1));
        transport.respond(
            Method::POST,
            "/admin/vessels",
            200,
            json!({"success": true, "data": {"_id": "v9", "vesselName": "New Dawn"}}),
        );
        transport.respond(
            Method::POST,
            "/admin/shipments/bulk-assign-vessel",
            200,
            json!({"success": true}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        list.refresh().await;
        list.toggle_row("s1");

        let vessel = NewVessel {
            vessel_name: "New Dawn".to_string(),
            job_number: "J-9".to_string(),
            ..Default::default()
        };
        list.bulk_assign_new_vessel(&vessel).await.unwrap();
        let assign = transport
            .requests_to(Method::POST, "/admin/shipments/bulk-assign-vessel")
            .pop()
            .unwrap();
        assert_eq!(assign.body.unwrap()["vesselId"], "v9");
    }

    #[tokio::test]
    async fn test_create_conflict_toast_is_specific() {
        let transport = FakeTransport::new();
        transport.respond(
            Method::POST,
            "/admin/shipments",
            200,
            json!({"success": false, "type": "CONFLICT", "message": "Overlapping stay",
                   "existingDates": ["2024-01-01", "2024-01-20"]}),
        );
        let notifier = Arc::new(RecordingNotifier::new());
        let mut list = controller(&transport, &notifier, admin());
        let shipment = NewShipment {
            client_id: "c1".to_string(),
            gate_in_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            chassis_number: "ABC-1".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            list.create(&shipment).await,
            Err(AppError::Conflict { .. })
        ));
        let toasts = notifier.toasts();
        assert!(toasts[0].message.contains("2024-01-01, 2024-01-20"));
        assert!(toasts[0].message.contains("Overlapping stay"));
    }
}
