//! Authentication, administration and cart-driven sales against the fakes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use bookshop_client::sales::{
    NewUser, PasswordChange, RoleRef, RoleRequest, SaleCustomer, UpdateUser,
};
use bookshop_client::{ApiError, Cart, CatalogClient, ClientConfig, SalesClient, Session};
use bookshop_core::{Price, ProductId, Route, UserId};
use bookshop_integration_tests::{FakeCatalog, FakeSales, TestServer, config, serve};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

struct Harness {
    catalog: FakeCatalog,
    sales: FakeSales,
    config: ClientConfig,
    _servers: (TestServer, TestServer),
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let catalog = FakeCatalog::new();
    let sales = FakeSales::new();
    let catalog_server = serve(catalog.router()).await;
    let sales_server = serve(sales.router()).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&catalog_server, &sales_server, dir.path().join("session.json"));
    Harness {
        catalog,
        sales,
        config,
        _servers: (catalog_server, sales_server),
        _dir: dir,
    }
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s.to_string())
}

impl Harness {
    fn anonymous(&self) -> SalesClient {
        SalesClient::new(&self.config, None).unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> Session {
        let response = self
            .anonymous()
            .login(email, &secret(password))
            .await
            .unwrap();
        let role = response.role_name().unwrap().to_string();
        Session::new(secret(&response.token), role)
    }

    fn sales_as(&self, session: &Session) -> SalesClient {
        SalesClient::new(&self.config, Some(session.token().clone())).unwrap()
    }

    fn catalog_as(&self, session: &Session) -> CatalogClient {
        CatalogClient::new(&self.config, Some(session.token().clone())).unwrap()
    }

    /// Seed the same product in both services.
    fn stock_product(&self, title: &str, cents: i64, stock: i64) -> ProductId {
        #[allow(clippy::cast_precision_loss)]
        let price = cents as f64 / 100.0;
        let id = self.catalog.seed_product(json!({
            "title": title,
            "publisher_id": 1,
            "stock": stock,
            "price": price,
        }));
        self.sales.set_product(i64::from(id), price, stock);
        ProductId::new(id)
    }
}

#[tokio::test]
async fn test_login_yields_role_and_menu() {
    let h = harness().await;
    h.sales.seed_role("seller");
    h.sales
        .seed_user("Ana", "ana@example.com", "secret1", "seller");

    let session = h.login(" ana@example.com ", "secret1").await;
    assert_eq!(session.role(), "seller");
    assert_eq!(session.start_route(), Route::Products);
    assert!(session.allows(Route::Sales));
    assert!(!session.allows(Route::Users));
    assert!(session.can_edit());
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let h = harness().await;
    h.sales.seed_role("admin");
    h.sales.seed_user("Root", "root@example.com", "pw", "admin");

    let err = h
        .anonymous()
        .login("root@example.com", &secret("wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Invalid credentials"));
}

#[tokio::test]
async fn test_register_uses_consultant_role() {
    let h = harness().await;
    h.sales.seed_role("admin");
    h.sales.seed_role("consultant");

    h.anonymous()
        .register(" Luis ", "luis@example.com", secret("pw-luis"))
        .await
        .unwrap();

    let session = h.login("luis@example.com", "pw-luis").await;
    assert_eq!(session.role(), "consultant");
    assert!(!session.can_edit());

    let err = h
        .anonymous()
        .register("Luis", "luis@example.com", secret("again"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.user_message(), "Error 400: Email already in use");
}

#[tokio::test]
async fn test_register_without_signup_role_fails() {
    let h = harness().await;
    h.sales.seed_role("admin");

    let err = h
        .anonymous()
        .register("Luis", "luis@example.com", secret("pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_user_administration() {
    let h = harness().await;
    h.sales.seed_role("admin");
    let seller = h.sales.seed_role("seller");
    h.sales.seed_user("Root", "root@example.com", "pw", "admin");
    let session = h.login("root@example.com", "pw").await;
    let sales = h.sales_as(&session);

    sales
        .create_user(&NewUser {
            name: "Marta".to_string(),
            email: "marta@example.com".to_string(),
            password: secret("pw-marta"),
            role: seller.as_str().into(),
        })
        .await
        .unwrap();

    let users = sales.users().await.unwrap();
    let marta = users.iter().find(|u| u.name == "Marta").unwrap();
    assert_eq!(marta.role, Some(RoleRef::Key(seller.clone())));
    let marta_id = marta.id.clone().unwrap();

    let detail = sales.user(&marta_id).await.unwrap();
    assert_eq!(detail.role.as_ref().map(RoleRef::label), Some("seller"));

    sales
        .update_user(
            &marta_id,
            &UpdateUser {
                name: "Marta R.".to_string(),
                email: "marta@example.com".to_string(),
                role: detail.role.as_ref().and_then(RoleRef::id).unwrap(),
            },
        )
        .await
        .unwrap();
    assert_eq!(sales.user(&marta_id).await.unwrap().name, "Marta R.");
    assert_eq!(
        h.sales.last_authorization(),
        Some(format!("Bearer {}", session.token().expose_secret()))
    );

    sales.delete_user(&marta_id).await.unwrap();
    let err = sales.user(&marta_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_change_password() {
    let h = harness().await;
    h.sales.seed_role("admin");
    let id = h.sales.seed_user("Root", "root@example.com", "old-pw", "admin");
    let session = h.login("root@example.com", "old-pw").await;
    let sales = h.sales_as(&session);
    let id = UserId::new(id);

    let err = sales
        .change_password(
            &id,
            &PasswordChange {
                current_password: secret("nope"),
                new_password: secret("new-pw"),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "current password is incorrect"));

    sales
        .change_password(
            &id,
            &PasswordChange {
                current_password: secret("old-pw"),
                new_password: secret("new-pw"),
            },
        )
        .await
        .unwrap();
    let (_, password, _) = h.sales.user_credentials(id.as_str()).unwrap();
    assert_eq!(password, "new-pw");
}

#[tokio::test]
async fn test_role_administration() {
    let h = harness().await;
    h.sales.seed_role("admin");
    h.sales.seed_user("Root", "root@example.com", "pw", "admin");
    let session = h.login("root@example.com", "pw").await;
    let sales = h.sales_as(&session);

    let created = sales
        .create_role(&RoleRequest {
            name: "auditor".to_string(),
            description: Some("Reads reports".to_string()),
        })
        .await
        .unwrap();
    let id = created.id.clone().unwrap();
    assert_eq!(
        sales.find_role_by_name("AUDITOR").await.unwrap(),
        Some(created)
    );

    sales
        .update_role(
            &id,
            &RoleRequest {
                name: "reviewer".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(sales.role(&id).await.unwrap().name, "reviewer");

    sales.delete_role(&id).await.unwrap();
    assert_eq!(sales.roles().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cart_driven_sale() {
    let h = harness().await;
    h.sales.seed_role("seller");
    h.sales.seed_role("consultant");
    h.sales
        .seed_user("Ana", "ana@example.com", "pw", "seller");
    let customer = h
        .sales
        .seed_user("Cliente", "cliente@example.com", "pw", "consultant");
    let aura = h.stock_product("Aura", 9_950, 5);
    let pedro = h.stock_product("Pedro Paramo", 20_000, 1);

    let session = h.login("ana@example.com", "pw").await;
    let products = h.catalog_as(&session).products().await.unwrap();
    let find = |id: ProductId| products.iter().find(|p| p.id == Some(id)).unwrap();

    let mut cart = Cart::new();
    cart.add_product(find(aura), 2).unwrap();
    cart.add_product(find(pedro), 1).unwrap();
    cart.add_product(find(aura), 1).unwrap();
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.quantity_of(aura), 3);
    assert_eq!(cart.total_from(&products), Price::from_cents(49_850));

    let created = h
        .sales_as(&session)
        .create_sale(&cart.into_sale_request(UserId::new(customer.clone())))
        .await
        .unwrap();
    assert_eq!(created.message, "Sale created");
    let sale = created.sale.unwrap();
    assert_eq!(sale.total, Price::from_cents(49_850));
    assert_eq!(sale.details.len(), 2);
    assert_eq!(h.sales.stock_of(i64::from(aura.as_i32())), Some(2));

    let listed = h.sales_as(&session).sales().await.unwrap();
    assert_eq!(listed.len(), 1);
    match listed[0].user_id.as_ref().unwrap() {
        SaleCustomer::Populated { id, name, .. } => {
            assert_eq!(id.as_ref().map(UserId::as_str), Some(customer.as_str()));
            assert_eq!(name.as_deref(), Some("Cliente"));
        }
        SaleCustomer::Id(_) => panic!("listing should populate the customer"),
    }
}

#[tokio::test]
async fn test_server_stock_error_is_surfaced() {
    let h = harness().await;
    h.sales.seed_role("seller");
    h.sales
        .seed_user("Ana", "ana@example.com", "pw", "seller");
    let customer = h.sales.seed_user("C", "c@example.com", "pw", "seller");
    let aura = h.stock_product("Aura", 10_000, 3);

    let session = h.login("ana@example.com", "pw").await;
    let products = h.catalog_as(&session).products().await.unwrap();
    let mut cart = Cart::new();
    cart.add_product(&products[0], 3).unwrap();

    // Someone else sold two copies since the listing was fetched.
    h.sales.set_product(i64::from(aura.as_i32()), 100.0, 1);

    let err = h
        .sales_as(&session)
        .create_sale(&cart.into_sale_request(UserId::new(customer)))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.user_message(),
        format!("Error 400: Stock insuficiente para el producto {aura}")
    );
}

#[tokio::test]
async fn test_empty_sale_never_reaches_server() {
    let h = harness().await;
    h.sales.seed_role("seller");
    h.sales
        .seed_user("Ana", "ana@example.com", "pw", "seller");
    let session = h.login("ana@example.com", "pw").await;

    let err = h
        .sales_as(&session)
        .create_sale(&Cart::new().into_sale_request(UserId::new("someone")))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ref m) if m == "Add at least one product to the sale"));
}
