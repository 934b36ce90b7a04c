#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};

use cmms_client::api::Credentials;
use cmms_client::{ClientConfig, CmmsClient, MemoryTokenStore, TokenStore};

pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const MANAGER: (&str, &str) = ("manager", "manager123");
pub const TECH: (&str, &str) = ("tech", "tech123");
pub const TECH2: (&str, &str) = ("tech2", "tech123");
pub const REQUESTER: (&str, &str) = ("req", "req123");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Assets,
    WorkOrders,
    Parts,
    Users,
}

impl Collection {
    fn path(&self) -> &'static str {
        match self {
            Collection::Assets => "assets/",
            Collection::WorkOrders => "work-orders/",
            Collection::Parts => "parts/",
            Collection::Users => "admin/users/",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            Collection::Assets => "A",
            Collection::WorkOrders => "W",
            Collection::Parts => "P",
            Collection::Users => "",
        }
    }

    fn required(&self) -> &'static [&'static str] {
        match self {
            Collection::Assets => &["name"],
            Collection::WorkOrders => &["title", "asset"],
            Collection::Parts => &["name"],
            Collection::Users => &["username"],
        }
    }
}

#[derive(Default)]
struct Data {
    records: HashMap<Collection, BTreeMap<String, Value>>,
    passwords: HashMap<String, String>,
    tokens: HashMap<String, String>,
    next_id: u64,
}

impl Data {
    fn table(&mut self, collection: Collection) -> &mut BTreeMap<String, Value> {
        self.records.entry(collection).or_default()
    }

    fn user_id_by_name(&self, username: &str) -> Option<String> {
        self.records
            .get(&Collection::Users)?
            .values()
            .find(|u| u["username"].as_str() == Some(username))
            .and_then(|u| u["id"].as_str().map(String::from))
    }

    fn fresh_id(&mut self, collection: Collection) -> String {
        self.next_id += 1;
        format!("{}{}", collection.id_prefix(), 100 + self.next_id)
    }

    fn issue(&mut self, user_id: &str) -> String {
        self.next_id += 1;
        let token = format!("tok-{}-{}", user_id, self.next_id);
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

/// In-process stand-in for the maintenance API, with knobs for tests.
#[derive(Default)]
pub struct MockApi {
    data: Mutex<Data>,
    profile_calls: AtomicUsize,
    mutations: AtomicUsize,
    fail_logout: AtomicBool,
    profile_delay_ms: AtomicU64,
}

impl MockApi {
    fn seeded() -> Self {
        let api = Self::default();
        api.add_user("1", "admin", "admin", "admin123");
        api.add_user("2", "manager", "manager", "manager123");
        api.add_user("3", "tech", "technician", "tech123");
        api.add_user("4", "tech2", "technician", "tech123");
        api.add_user("5", "req", "requester", "req123");
        {
            let mut data = api.lock();
            if let Some(admin) = data.table(Collection::Users).get_mut("1") {
                admin["first_name"] = json!("Ada");
            }
        }

        api.insert(
            Collection::Assets,
            json!({
                "id": "A1",
                "name": "Air compressor",
                "location": "Plant 1",
                "status": "operational",
                "asset_type": "machine",
                "next_maintenance_date": "2026-11-01"
            }),
        );
        api.insert(
            Collection::WorkOrders,
            json!({
                "id": "W1",
                "title": "Replace intake filter",
                "asset": "A1",
                "asset_name": "Air compressor",
                "assigned_to": "3",
                "assigned_to_username": "tech",
                "status": "open",
                "priority": "high"
            }),
        );
        api.insert(
            Collection::WorkOrders,
            json!({
                "id": "W2",
                "title": "Inspect belts",
                "asset": "A1",
                "asset_name": "Air compressor",
                "assigned_to": 4,
                "assigned_to_username": "tech2",
                "status": "in_progress",
                "priority": "medium"
            }),
        );
        api.insert(
            Collection::Parts,
            json!({
                "id": "P1",
                "name": "Air filter",
                "sku": "AF-100",
                "quantity": 2,
                "reorder_point": 5,
                "unit_cost": "12.50",
                "location": "Shelf B"
            }),
        );
        api.insert(
            Collection::Parts,
            json!({
                "id": "P2",
                "name": "V-belt",
                "quantity": 20,
                "reorder_point": 4,
                "unit_cost": "8.00"
            }),
        );
        api
    }

    fn lock(&self) -> MutexGuard<'_, Data> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_user(&self, id: &str, username: &str, role: &str, password: &str) {
        let mut data = self.lock();
        data.table(Collection::Users).insert(
            id.to_string(),
            json!({
                "id": id,
                "username": username,
                "email": format!("{}@example.com", username),
                "role": role,
                "is_active": true
            }),
        );
        data.passwords.insert(id.to_string(), password.to_string());
    }

    pub fn insert(&self, collection: Collection, record: Value) {
        let id = match &record["id"] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.lock().table(collection).insert(id, record);
    }

    pub fn record(&self, collection: Collection, id: &str) -> Option<Value> {
        self.lock().table(collection).get(id).cloned()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.lock().table(collection).len()
    }

    /// Token valid for `user_id`, as if issued by an earlier login.
    pub fn issue_token(&self, user_id: &str) -> String {
        self.lock().issue(user_id)
    }

    pub fn token_is_valid(&self, token: &str) -> bool {
        self.lock().tokens.contains_key(token)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    /// Create, update and delete requests received on resource endpoints.
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn set_fail_logout(&self, fail: bool) {
        self.fail_logout.store(fail, Ordering::SeqCst);
    }

    pub fn set_profile_delay(&self, delay: Duration) {
        self.profile_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn caller(&self, headers: &HeaderMap) -> Result<Value, Response> {
        let Some(raw) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
            return Err(reply(
                StatusCode::UNAUTHORIZED,
                json!({"detail": "Authentication credentials were not provided."}),
            ));
        };
        let token = raw.strip_prefix("Token ").unwrap_or(raw);

        let data = self.lock();
        let user = data
            .tokens
            .get(token)
            .and_then(|id| data.records.get(&Collection::Users)?.get(id))
            .cloned();
        user.ok_or_else(|| reply(StatusCode::UNAUTHORIZED, json!({"detail": "Invalid token."})))
    }
}

type Shared = Arc<MockApi>;

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn forbidden() -> Response {
    reply(
        StatusCode::FORBIDDEN,
        json!({"detail": "You do not have permission to perform this action."}),
    )
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
}

fn role_of(user: &Value) -> &str {
    user["role"].as_str().unwrap_or_default()
}

fn may_read(user: &Value, collection: Collection) -> bool {
    match collection {
        Collection::Users => matches!(role_of(user), "admin" | "manager"),
        _ => true,
    }
}

fn may_write(user: &Value, collection: Collection, patch_of: Option<&Value>) -> bool {
    match (collection, role_of(user)) {
        (Collection::Users, role) => role == "admin",
        (_, "admin" | "manager") => true,
        (Collection::WorkOrders, "technician") => patch_of
            .map(|order| id_text(&order["assigned_to"]) == id_text(&user["id"]))
            .unwrap_or(false),
        _ => false,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn missing_fields(collection: Collection, body: &Value) -> Map<String, Value> {
    let mut errors = Map::new();
    for field in collection.required() {
        let present = match &body[*field] {
            Value::String(s) => !s.trim().is_empty(),
            Value::Null => false,
            _ => true,
        };
        if !present {
            errors.insert(field.to_string(), json!(["This field is required."]));
        }
    }
    errors
}

async fn login(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    let mut data = api.lock();
    let user_id = data
        .user_id_by_name(username)
        .filter(|id| data.passwords.get(id).map(String::as_str) == Some(password));
    match user_id {
        Some(id) => {
            let token = data.issue(&id);
            reply(StatusCode::OK, json!({"auth_token": token}))
        }
        None => reply(
            StatusCode::BAD_REQUEST,
            json!({"non_field_errors": ["Unable to log in with provided credentials."]}),
        ),
    }
}

async fn logout(State(api): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = api.caller(&headers) {
        return response;
    }
    if api.fail_logout.load(Ordering::SeqCst) {
        return reply(StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "Sign-out unavailable."}));
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Token "))
        .unwrap_or_default()
        .to_string();
    api.lock().tokens.remove(&token);
    StatusCode::NO_CONTENT.into_response()
}

async fn profile(State(api): State<Shared>, headers: HeaderMap) -> Response {
    api.profile_calls.fetch_add(1, Ordering::SeqCst);
    let delay = api.profile_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    match api.caller(&headers) {
        Ok(user) => reply(StatusCode::OK, user),
        Err(response) => response,
    }
}

async fn user_directory(State(api): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(response) = api.caller(&headers) {
        return response;
    }
    let users: Vec<Value> = api.lock().table(Collection::Users).values().cloned().collect();
    reply(StatusCode::OK, Value::Array(users))
}

async fn register(State(api): State<Shared>, Json(body): Json<Value>) -> Response {
    let errors = missing_fields(Collection::Users, &body);
    if !errors.is_empty() {
        return reply(StatusCode::BAD_REQUEST, Value::Object(errors));
    }

    let mut data = api.lock();
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if data.user_id_by_name(&username).is_some() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"username": ["A user with that username already exists."]}),
        );
    }

    let id = data.fresh_id(Collection::Users);
    let user = json!({
        "id": id,
        "username": username,
        "email": body["email"].as_str().unwrap_or_default(),
        "role": body["role"].as_str().unwrap_or("requester"),
        "is_active": true
    });
    if let Some(password) = body["password"].as_str() {
        data.passwords.insert(id.clone(), password.to_string());
    }
    data.table(Collection::Users).insert(id, user.clone());
    reply(StatusCode::CREATED, user)
}

async fn list(api: Shared, headers: HeaderMap, collection: Collection) -> Response {
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if !may_read(&user, collection) {
        return forbidden();
    }
    let records: Vec<Value> = api.lock().table(collection).values().cloned().collect();
    reply(StatusCode::OK, Value::Array(records))
}

async fn retrieve(api: Shared, headers: HeaderMap, id: String, collection: Collection) -> Response {
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if !may_read(&user, collection) {
        return forbidden();
    }
    match api.record(collection, &id) {
        Some(record) => reply(StatusCode::OK, record),
        None => not_found(),
    }
}

async fn create(api: Shared, headers: HeaderMap, collection: Collection, body: Value) -> Response {
    api.mutations.fetch_add(1, Ordering::SeqCst);
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if !may_write(&user, collection, None) {
        return forbidden();
    }
    let errors = missing_fields(collection, &body);
    if !errors.is_empty() {
        return reply(StatusCode::BAD_REQUEST, Value::Object(errors));
    }

    let mut data = api.lock();
    let id = data.fresh_id(collection);
    let mut record = match body {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    record.remove("password");
    record.insert("id".into(), json!(id));
    let record = Value::Object(record);
    data.table(collection).insert(id, record.clone());
    reply(StatusCode::CREATED, record)
}

async fn update(
    api: Shared,
    headers: HeaderMap,
    id: String,
    collection: Collection,
    body: Value,
) -> Response {
    api.mutations.fetch_add(1, Ordering::SeqCst);
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let Some(existing) = api.record(collection, &id) else {
        return not_found();
    };
    if !may_write(&user, collection, Some(&existing)) {
        return forbidden();
    }

    let mut record = match existing {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    if let Value::Object(changes) = body {
        for (field, value) in changes {
            if field != "id" && field != "password" {
                record.insert(field, value);
            }
        }
    }
    let record = Value::Object(record);
    api.lock().table(collection).insert(id, record.clone());
    reply(StatusCode::OK, record)
}

async fn destroy(api: Shared, headers: HeaderMap, id: String, collection: Collection) -> Response {
    api.mutations.fetch_add(1, Ordering::SeqCst);
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if !may_write(&user, collection, None) {
        return forbidden();
    }
    match api.lock().table(collection).remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

fn resource_routes(collection: Collection) -> Router<Shared> {
    let base = format!("/api/v1/{}", collection.path());
    let item = format!("{}:id/", base);

    Router::new()
        .route(
            &base,
            get(move |State(api): State<Shared>, headers: HeaderMap| list(api, headers, collection)).post(
                move |State(api): State<Shared>, headers: HeaderMap, Json(body): Json<Value>| {
                    create(api, headers, collection, body)
                },
            ),
        )
        .route(
            &item,
            get(
                move |State(api): State<Shared>, headers: HeaderMap, Path(id): Path<String>| {
                    retrieve(api, headers, id, collection)
                },
            )
            .patch(
                move |State(api): State<Shared>,
                      headers: HeaderMap,
                      Path(id): Path<String>,
                      Json(body): Json<Value>| { update(api, headers, id, collection, body) },
            )
            .delete(
                move |State(api): State<Shared>, headers: HeaderMap, Path(id): Path<String>| {
                    destroy(api, headers, id, collection)
                },
            ),
        )
}

fn app(api: Shared) -> Router {
    Router::new()
        .route("/api/v1/auth/token/login/", post(login))
        .route("/api/v1/auth/token/logout/", post(logout))
        .route("/api/v1/auth/users/me/", get(profile))
        .route("/api/v1/auth/users/", get(user_directory).post(register))
        .merge(resource_routes(Collection::Assets))
        .merge(resource_routes(Collection::WorkOrders))
        .merge(resource_routes(Collection::Parts))
        .merge(resource_routes(Collection::Users))
        .with_state(api)
}

pub struct MockServer {
    pub base_url: String,
    pub api: Shared,
}

/// Start a seeded mock API on a free port. Lives as long as the test's
/// runtime.
pub async fn spawn() -> Result<MockServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind mock API on port {}", port))?;

    let api: Shared = Arc::new(MockApi::seeded());
    let router = app(api.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(MockServer {
        base_url: format!("http://127.0.0.1:{}/api/v1/", port),
        api,
    })
}

impl MockServer {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::default().with_base_url(&self.base_url)
    }

    /// Fresh anonymous client with in-memory token storage.
    pub fn client(&self) -> Result<CmmsClient> {
        self.client_with_store(Arc::new(MemoryTokenStore::new()))
    }

    pub fn client_with_store(&self, store: Arc<dyn TokenStore>) -> Result<CmmsClient> {
        Ok(CmmsClient::new(&self.config(), store)?)
    }

    pub async fn login_as(&self, (username, password): (&str, &str)) -> Result<CmmsClient> {
        let client = self.client()?;
        client.auth().login(&Credentials::new(username, password)).await?;
        Ok(client)
    }
}
