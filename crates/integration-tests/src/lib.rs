//! In-process fake backends for exercising the bookshop clients.
//!
//! [`FakeCatalog`] and [`FakeSales`] mimic the two services closely enough
//! for end-to-end tests: same paths, same JSON shapes, same error bodies.
//! Each is an `axum` router over shared in-memory state, served on an
//! ephemeral local port by [`serve`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bookshop-integration-tests
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bookshop_client::ClientConfig;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

// =============================================================================
// Server plumbing
// =============================================================================

/// A router bound to `127.0.0.1` on an ephemeral port; aborted on drop.
pub struct TestServer {
    pub url: Url,
    task: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve `router` in the background.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn serve(router: Router) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let task = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    TestServer {
        url: Url::parse(&format!("http://{addr}/")).expect("Invalid test server URL"),
        task,
    }
}

/// Client configuration pointing at two test servers.
#[must_use]
pub fn config(catalog: &TestServer, sales: &TestServer, session_file: PathBuf) -> ClientConfig {
    ClientConfig {
        catalog_url: catalog.url.clone(),
        sales_url: sales.url.clone(),
        session_file,
        http_timeout: Some(std::time::Duration::from_secs(5)),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn error(status: StatusCode, key: &str, message: &str) -> Response {
    (status, Json(json!({ key: message }))).into_response()
}

// =============================================================================
// Catalog service
// =============================================================================

#[derive(Default)]
struct CatalogData {
    next_id: i32,
    entries: BTreeMap<String, BTreeMap<i32, String>>,
    products: BTreeMap<i32, Value>,
    authorizations: Vec<Option<String>>,
}

impl CatalogData {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn named(&self, collection: &str, ids: &Value) -> Value {
        let names = self.entries.get(collection);
        ids.as_array()
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_i64)
                    .filter_map(|id| {
                        let id = i32::try_from(id).ok()?;
                        let name = names?.get(&id)?;
                        Some(json!({ "id": id, "name": name }))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Detail view: relations expanded, prices as numbers.
    fn product_detail(&self, id: i32, stored: &Value) -> Value {
        json!({
            "id": id,
            "title": stored["title"],
            "publisher_id": stored["publisher_id"],
            "stock": stored["stock"],
            "price": stored["price"],
            "supplier_price": stored.get("supplier_price").cloned().unwrap_or(Value::Null),
            "authors": self.named("authors", &stored["author_ids"]),
            "genres": self.named("genres", &stored["genre_ids"]),
            "images": stored.get("images").cloned().unwrap_or_else(|| json!([])),
        })
    }
}

/// Fake catalog/product service.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    data: Arc<Mutex<CatalogData>>,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an author, genre or publisher and return its id.
    pub fn seed_entry(&self, collection: &str, name: &str) -> i32 {
        let mut data = lock(&self.data);
        let id = data.next_id();
        data.entries
            .entry(collection.to_owned())
            .or_default()
            .insert(id, name.to_owned());
        id
    }

    /// Insert a product given in request shape and return its id.
    pub fn seed_product(&self, product: Value) -> i32 {
        let mut data = lock(&self.data);
        let id = data.next_id();
        data.products.insert(id, product);
        id
    }

    /// Stored request-shape JSON of a product.
    #[must_use]
    pub fn stored_product(&self, id: i32) -> Option<Value> {
        lock(&self.data).products.get(&id).cloned()
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.data).authorizations.last().cloned().flatten()
    }

    /// Routes of the service.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/products", get(list_products).post(create_product))
            .route(
                "/api/products/{id}",
                get(show_product)
                    .put(replace_product)
                    .patch(patch_product)
                    .delete(delete_product),
            )
            .route("/api/{collection}", get(list_entries).post(create_entry))
            .route(
                "/api/{collection}/{id}",
                get(show_entry).put(update_entry).delete(delete_entry),
            )
            .with_state(self.clone())
    }

    fn record(&self, headers: &HeaderMap) -> MutexGuard<'_, CatalogData> {
        let mut data = lock(&self.data);
        data.authorizations.push(authorization(headers));
        data
    }
}

async fn list_entries(
    State(fake): State<FakeCatalog>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> Response {
    let data = fake.record(&headers);
    let entries: Vec<Value> = data
        .entries
        .get(&collection)
        .map(|entries| {
            entries
                .iter()
                .map(|(id, name)| json!({ "id": id, "name": name }))
                .collect()
        })
        .unwrap_or_default();
    Json(entries).into_response()
}

async fn show_entry(
    State(fake): State<FakeCatalog>,
    Path((collection, id)): Path<(String, i32)>,
    headers: HeaderMap,
) -> Response {
    let data = fake.record(&headers);
    match data.entries.get(&collection).and_then(|e| e.get(&id)) {
        Some(name) => Json(json!({ "id": id, "name": name })).into_response(),
        None => error(StatusCode::NOT_FOUND, "message", "Record not found"),
    }
}

async fn create_entry(
    State(fake): State<FakeCatalog>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let Some(name) = body["name"].as_str().filter(|n| !n.is_empty()) else {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "message",
            "The name field is required.",
        );
    };
    let id = data.next_id();
    data.entries
        .entry(collection)
        .or_default()
        .insert(id, name.to_owned());
    (StatusCode::CREATED, Json(json!({ "id": id, "name": name }))).into_response()
}

async fn update_entry(
    State(fake): State<FakeCatalog>,
    Path((collection, id)): Path<(String, i32)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let name = body["name"].as_str().unwrap_or_default().to_owned();
    match data.entries.get_mut(&collection).and_then(|e| e.get_mut(&id)) {
        Some(stored) => {
            stored.clone_from(&name);
            Json(json!({ "id": id, "name": name })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "message", "Record not found"),
    }
}

async fn delete_entry(
    State(fake): State<FakeCatalog>,
    Path((collection, id)): Path<(String, i32)>,
    headers: HeaderMap,
) -> Response {
    let mut data = fake.record(&headers);
    match data.entries.get_mut(&collection).and_then(|e| e.remove(&id)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "message", "Record not found"),
    }
}

async fn list_products(State(fake): State<FakeCatalog>, headers: HeaderMap) -> Response {
    let data = fake.record(&headers);
    // Listings send prices as strings and omit relations.
    let products: Vec<Value> = data
        .products
        .iter()
        .map(|(id, p)| {
            json!({
                "id": id,
                "title": p["title"],
                "publisher_id": p["publisher_id"],
                "stock": p["stock"],
                "price": format!("{:.2}", p["price"].as_f64().unwrap_or_default()),
            })
        })
        .collect();
    Json(products).into_response()
}

async fn show_product(
    State(fake): State<FakeCatalog>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let data = fake.record(&headers);
    match data.products.get(&id) {
        Some(stored) => Json(data.product_detail(id, stored)).into_response(),
        None => error(StatusCode::NOT_FOUND, "message", "Product not found"),
    }
}

async fn create_product(
    State(fake): State<FakeCatalog>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let id = data.next_id();
    let detail = data.product_detail(id, &body);
    data.products.insert(id, body);
    (StatusCode::CREATED, Json(detail)).into_response()
}

async fn replace_product(
    State(fake): State<FakeCatalog>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    if !data.products.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "message", "Product not found");
    }
    let detail = data.product_detail(id, &body);
    data.products.insert(id, body);
    Json(detail).into_response()
}

async fn patch_product(
    State(fake): State<FakeCatalog>,
    Path(id): Path<i32>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let Some(mut stored) = data.products.get(&id).cloned() else {
        return error(StatusCode::NOT_FOUND, "message", "Product not found");
    };
    if let (Some(stored), Some(changes)) = (stored.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            stored.insert(key.clone(), value.clone());
        }
    }
    let detail = data.product_detail(id, &stored);
    data.products.insert(id, stored);
    Json(detail).into_response()
}

async fn delete_product(
    State(fake): State<FakeCatalog>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    let mut data = fake.record(&headers);
    match data.products.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => error(StatusCode::NOT_FOUND, "message", "Product not found"),
    }
}

// =============================================================================
// User/sales service
// =============================================================================

struct StoredUser {
    id: String,
    name: String,
    email: String,
    password: String,
    role_id: String,
}

#[derive(Default)]
struct SalesData {
    next_id: u32,
    roles: Vec<Value>,
    users: Vec<StoredUser>,
    sales: Vec<Value>,
    stock: BTreeMap<i64, (f64, i64)>,
    authorizations: Vec<Option<String>>,
    tokenless_login: bool,
}

impl SalesData {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:04}", self.next_id)
    }

    fn role(&self, id: &str) -> Option<&Value> {
        self.roles.iter().find(|r| r["_id"] == id)
    }

    fn role_name(&self, id: &str) -> String {
        self.role(id)
            .and_then(|r| r["name"].as_str())
            .unwrap_or_default()
            .to_owned()
    }

    fn user(&self, id: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// Fake user/sales service.
#[derive(Clone, Default)]
pub struct FakeSales {
    data: Arc<Mutex<SalesData>>,
}

impl FakeSales {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a role and return its id.
    pub fn seed_role(&self, name: &str) -> String {
        let mut data = lock(&self.data);
        let id = data.next_id("role");
        data.roles
            .push(json!({ "_id": id, "name": name, "description": format!("{name} role") }));
        id
    }

    /// Insert a user holding the role named `role` and return the user id.
    pub fn seed_user(&self, name: &str, email: &str, password: &str, role: &str) -> String {
        let mut data = lock(&self.data);
        let role_id = data
            .roles
            .iter()
            .find(|r| r["name"] == role)
            .and_then(|r| r["_id"].as_str())
            .unwrap_or_default()
            .to_owned();
        let id = data.next_id("user");
        data.users.push(StoredUser {
            id: id.clone(),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            role_id,
        });
        id
    }

    /// Answer logins without a `token` field.
    pub fn omit_login_tokens(&self) {
        lock(&self.data).tokenless_login = true;
    }

    /// Make a product sellable at `price` with `stock` units.
    pub fn set_product(&self, product_id: i64, price: f64, stock: i64) {
        lock(&self.data).stock.insert(product_id, (price, stock));
    }

    /// Remaining stock of a product.
    #[must_use]
    pub fn stock_of(&self, product_id: i64) -> Option<i64> {
        lock(&self.data).stock.get(&product_id).map(|(_, s)| *s)
    }

    /// Email, password and role name of a user.
    #[must_use]
    pub fn user_credentials(&self, id: &str) -> Option<(String, String, String)> {
        let data = lock(&self.data);
        let user = data.user(id)?;
        Some((
            user.email.clone(),
            user.password.clone(),
            data.role_name(&user.role_id),
        ))
    }

    /// `Authorization` header of the most recent request.
    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        lock(&self.data).authorizations.last().cloned().flatten()
    }

    /// Routes of the service.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/users", get(list_users))
            .route("/api/users/login", post(login))
            .route("/api/users/register", post(register))
            .route(
                "/api/users/{id}",
                get(show_user).put(update_user).delete(delete_user),
            )
            .route("/api/users/{id}/password", put(change_password))
            .route("/api/roles", get(list_roles).post(create_role))
            .route(
                "/api/roles/{id}",
                get(show_role).put(update_role).delete(delete_role),
            )
            .route("/api/sales", get(list_sales).post(create_sale))
            .with_state(self.clone())
    }

    fn record(&self, headers: &HeaderMap) -> MutexGuard<'_, SalesData> {
        let mut data = lock(&self.data);
        data.authorizations.push(authorization(headers));
        data
    }
}

async fn login(
    State(fake): State<FakeSales>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let data = fake.record(&headers);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match data
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
    {
        Some(user) => {
            let mut response = json!({
                "user": {
                    "_id": user.id,
                    "name": user.name,
                    "email": user.email,
                    "role": data.role_name(&user.role_id),
                }
            });
            if !data.tokenless_login {
                response["token"] = json!(format!("token-{}", user.id));
            }
            Json(response).into_response()
        }
        None => error(StatusCode::UNAUTHORIZED, "error", "Invalid credentials"),
    }
}

async fn register(
    State(fake): State<FakeSales>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let email = body["email"].as_str().unwrap_or_default().to_owned();
    if data.users.iter().any(|u| u.email == email) {
        return error(StatusCode::BAD_REQUEST, "error", "Email already in use");
    }
    let role_id = body["role"].as_str().unwrap_or_default().to_owned();
    if data.role(&role_id).is_none() {
        return error(StatusCode::BAD_REQUEST, "error", "Invalid role");
    }
    let id = data.next_id("user");
    data.users.push(StoredUser {
        id: id.clone(),
        name: body["name"].as_str().unwrap_or_default().to_owned(),
        email,
        password: body["password"].as_str().unwrap_or_default().to_owned(),
        role_id,
    });
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered", "userId": id })),
    )
        .into_response()
}

async fn list_users(State(fake): State<FakeSales>, headers: HeaderMap) -> Response {
    let data = fake.record(&headers);
    // Listings carry the role as a bare id.
    let users: Vec<Value> = data
        .users
        .iter()
        .map(|u| json!({ "_id": u.id, "name": u.name, "email": u.email, "role": u.role_id }))
        .collect();
    Json(users).into_response()
}

async fn show_user(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let data = fake.record(&headers);
    match data.user(&id) {
        Some(u) => Json(json!({
            "_id": u.id,
            "name": u.name,
            "email": u.email,
            "role": data.role(&u.role_id).cloned().unwrap_or(Value::Null),
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "error", "User not found"),
    }
}

async fn update_user(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let Some(user) = data.users.iter_mut().find(|u| u.id == id) else {
        return error(StatusCode::NOT_FOUND, "error", "User not found");
    };
    if let Some(name) = body["name"].as_str() {
        name.clone_into(&mut user.name);
    }
    if let Some(email) = body["email"].as_str() {
        email.clone_into(&mut user.email);
    }
    if let Some(role) = body["role"].as_str() {
        role.clone_into(&mut user.role_id);
    }
    Json(json!({ "message": "User updated" })).into_response()
}

async fn delete_user(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut data = fake.record(&headers);
    let before = data.users.len();
    data.users.retain(|u| u.id != id);
    if data.users.len() == before {
        return error(StatusCode::NOT_FOUND, "error", "User not found");
    }
    Json(json!({ "message": "User deleted" })).into_response()
}

async fn change_password(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let Some(user) = data.users.iter_mut().find(|u| u.id == id) else {
        return error(StatusCode::NOT_FOUND, "error", "User not found");
    };
    if body["currentPassword"].as_str() != Some(user.password.as_str()) {
        return error(
            StatusCode::UNAUTHORIZED,
            "error",
            "Current password is incorrect",
        );
    }
    body["newPassword"]
        .as_str()
        .unwrap_or_default()
        .clone_into(&mut user.password);
    Json(json!({ "message": "Password updated" })).into_response()
}

async fn list_roles(State(fake): State<FakeSales>, headers: HeaderMap) -> Response {
    let data = fake.record(&headers);
    Json(data.roles.clone()).into_response()
}

async fn show_role(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let data = fake.record(&headers);
    match data.role(&id) {
        Some(role) => Json(role.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "error", "Role not found"),
    }
}

async fn create_role(
    State(fake): State<FakeSales>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let id = data.next_id("role");
    let role = json!({
        "_id": id,
        "name": body["name"],
        "description": body.get("description").cloned().unwrap_or(Value::Null),
    });
    data.roles.push(role.clone());
    (StatusCode::CREATED, Json(role)).into_response()
}

async fn update_role(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    let Some(role) = data.roles.iter_mut().find(|r| r["_id"] == id.as_str()) else {
        return error(StatusCode::NOT_FOUND, "error", "Role not found");
    };
    role["name"] = body["name"].clone();
    if let Some(description) = body.get("description") {
        role["description"] = description.clone();
    }
    Json(json!({ "message": "Role updated" })).into_response()
}

async fn delete_role(
    State(fake): State<FakeSales>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut data = fake.record(&headers);
    let before = data.roles.len();
    data.roles.retain(|r| r["_id"] != id.as_str());
    if data.roles.len() == before {
        return error(StatusCode::NOT_FOUND, "error", "Role not found");
    }
    Json(json!({ "message": "Role deleted" })).into_response()
}

async fn list_sales(State(fake): State<FakeSales>, headers: HeaderMap) -> Response {
    let data = fake.record(&headers);
    // Listings populate the customer with name and role.
    let sales: Vec<Value> = data
        .sales
        .iter()
        .map(|sale| {
            let mut sale = sale.clone();
            let customer = sale["userId"].as_str().and_then(|id| data.user(id)).map(|u| {
                json!({ "_id": u.id, "name": u.name, "role": u.role_id })
            });
            if let Some(customer) = customer {
                sale["userId"] = customer;
            }
            sale
        })
        .collect();
    Json(sales).into_response()
}

async fn create_sale(
    State(fake): State<FakeSales>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut data = fake.record(&headers);
    if data.authorizations.last().cloned().flatten().is_none() {
        return error(StatusCode::UNAUTHORIZED, "error", "Token required");
    }
    let user_id = body["userId"].as_str().unwrap_or_default().to_owned();
    if data.user(&user_id).is_none() {
        return error(StatusCode::BAD_REQUEST, "error", "Customer not found");
    }

    let empty = Vec::new();
    let requested = body["details"].as_array().unwrap_or(&empty);
    let mut details = Vec::new();
    let mut total = 0.0;
    for line in requested {
        let product_id = line["productId"].as_i64().unwrap_or_default();
        let quantity = line["quantity"].as_i64().unwrap_or_default();
        let Some(&(price, stock)) = data.stock.get(&product_id) else {
            return error(
                StatusCode::BAD_REQUEST,
                "error",
                &format!("Producto {product_id} no encontrado"),
            );
        };
        if quantity > stock {
            return error(
                StatusCode::BAD_REQUEST,
                "error",
                &format!("Stock insuficiente para el producto {product_id}"),
            );
        }
        total += price * f64::from(u32::try_from(quantity).unwrap_or_default());
        details.push(json!({
            "productId": product_id,
            "quantity": quantity,
            "unitPrice": price,
        }));
    }
    for line in &details {
        let product_id = line["productId"].as_i64().unwrap_or_default();
        let quantity = line["quantity"].as_i64().unwrap_or_default();
        if let Some(entry) = data.stock.get_mut(&product_id) {
            entry.1 -= quantity;
        }
    }

    let id = data.next_id("sale");
    let sale = json!({
        "_id": id,
        "total": total,
        "date": "2024-05-01T12:00:00.000Z",
        "userId": user_id,
        "details": details,
    });
    data.sales.push(sale.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Sale created", "sale": sale })),
    )
        .into_response()
}
