//! In-memory backend and storage doubles for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, StatusCode};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::http_client::{ApiClient, ApiRequest, ApiResponse, Transport};
use crate::storage::SignedUrlStorage;

type RouteKey = (Method, String);

/// Replays canned responses per `(method, path)` and records every request.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<AppResult<ApiResponse>>>>,
    sticky: Mutex<HashMap<RouteKey, (u16, Value)>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a one-shot response.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let response = ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            body: Bytes::from(serde_json::to_vec(&body).unwrap()),
        };
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Ok(response));
    }

    /// Response returned whenever no one-shot response is queued.
    pub fn always(&self, method: Method, path: &str, status: u16, body: Value) {
        self.sticky
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    pub fn fail(&self, method: Method, path: &str, error: AppError) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let key = (request.method.clone(), request.path.clone());
        self.requests.lock().unwrap().push(request);

        if let Some(queued) = self
            .routes
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return queued;
        }
        if let Some((status, body)) = self.sticky.lock().unwrap().get(&key) {
            return Ok(ApiResponse {
                status: StatusCode::from_u16(*status).unwrap(),
                body: Bytes::from(serde_json::to_vec(body).unwrap()),
            });
        }
        Ok(ApiResponse {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from_static(br#"{"success":false,"message":"no route"}"#),
        })
    }

    fn base_url(&self) -> &str {
        "http://backend.test"
    }
}

pub fn api_client(transport: &Arc<FakeTransport>) -> ApiClient {
    let client = ApiClient::new(transport.clone());
    client.set_token(Some("test-token".to_string()));
    client
}

pub fn query_value<'a>(request: &'a ApiRequest, key: &str) -> Option<&'a str> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Object store keyed by URL.
#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<Vec<String>>,
    puts: Mutex<Vec<(String, usize, String)>>,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, url: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(url.to_string(), Bytes::copy_from_slice(data));
    }

    /// Every request whose URL contains `fragment` fails.
    pub fn fail_matching(&self, fragment: &str) {
        self.failing.lock().unwrap().push(fragment.to_string());
    }

    pub fn puts(&self) -> Vec<(String, usize, String)> {
        self.puts.lock().unwrap().clone()
    }

    fn should_fail(&self, url: &str) -> bool {
        self.failing
            .lock()
            .unwrap()
            .iter()
            .any(|f| url.contains(f.as_str()))
    }
}

#[async_trait]
impl SignedUrlStorage for FakeStorage {
    async fn put(&self, url: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        if self.should_fail(url) {
            return Err(AppError::Storage(format!("upload rejected: {}", url)));
        }
        self.puts
            .lock()
            .unwrap()
            .push((url.to_string(), data.len(), content_type.to_string()));
        self.objects.lock().unwrap().insert(url.to_string(), data);
        Ok(())
    }

    async fn get(&self, url: &str) -> AppResult<Bytes> {
        if self.should_fail(url) {
            return Err(AppError::Storage(format!("download rejected: {}", url)));
        }
        self.objects
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("no object at {}", url)))
    }
}
