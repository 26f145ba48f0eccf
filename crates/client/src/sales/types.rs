//! User/sales service records and request bodies.
//!
//! This service is document-backed, so ids are opaque strings serialized as
//! `_id` and field names are camelCase.

use bookshop_core::{Price, ProductId, RoleId, SaleDetailId, SaleId, UserId};
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ApiError;

/// A role record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RoleId>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for creating or updating a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How a user's role appears on the wire.
///
/// Listings carry the role id as a plain string, detail views embed the
/// whole role, and the login response carries the role name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleRef {
    Embedded(Role),
    Key(String),
}

impl RoleRef {
    /// Role id, if this reference carries one.
    #[must_use]
    pub fn id(&self) -> Option<RoleId> {
        match self {
            Self::Embedded(role) => role.id.clone(),
            Self::Key(key) => Some(RoleId::new(key.clone())),
        }
    }

    /// Text to show for this role: the embedded name, else the raw key.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Embedded(role) => &role.name,
            Self::Key(key) => key,
        }
    }
}

/// A user record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub email: String,
    #[serde(default)]
    pub role: Option<RoleRef>,
}

/// Body for `POST api/users/login`.
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of a successful login.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub token: String,
    pub user: LoginUser,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// User summary embedded in [`LoginResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    #[serde(rename = "_id", default)]
    pub id: Option<UserId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<RoleRef>,
}

impl LoginResponse {
    /// Role name carried by the response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if the response has no usable role.
    pub fn role_name(&self) -> Result<&str, ApiError> {
        self.user
            .role
            .as_ref()
            .map(RoleRef::label)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::Validation("Role not found in login response".to_string()))
    }
}

/// Body for creating a user, either through sign-up or by an administrator.
#[derive(Debug, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    pub role: RoleId,
}

/// Body for `PUT api/users/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateUser {
    pub name: String,
    pub email: String,
    pub role: RoleId,
}

/// Body for `PUT api/users/{id}/password`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    #[serde(serialize_with = "expose")]
    pub current_password: SecretString,
    #[serde(serialize_with = "expose")]
    pub new_password: SecretString,
}

impl PasswordChange {
    /// Both fields must be filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if either password is empty.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.current_password.expose_secret().is_empty()
            || self.new_password.expose_secret().is_empty()
        {
            return Err(ApiError::Validation(
                "Both passwords are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Customer reference on a sale: populated on listings, a bare id elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SaleCustomer {
    Populated {
        #[serde(rename = "_id", default)]
        id: Option<UserId>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        role: Option<RoleRef>,
    },
    Id(UserId),
}

impl SaleCustomer {
    /// Customer id, if known.
    #[must_use]
    pub fn id(&self) -> Option<&UserId> {
        match self {
            Self::Populated { id, .. } => id.as_ref(),
            Self::Id(id) => Some(id),
        }
    }

    /// Customer name, falling back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Populated {
                name: Some(name), ..
            } => name,
            Self::Populated { id, .. } => id.as_ref().map_or("unknown", UserId::as_str),
            Self::Id(id) => id.as_str(),
        }
    }
}

/// One line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SaleDetailId>,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub unit_price: Price,
}

impl SaleDetail {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(rename = "_id", default)]
    pub id: Option<SaleId>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub total: Price,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<SaleCustomer>,
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub details: Vec<SaleDetail>,
}

/// One requested line of a new sale; the server resolves the unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body for `POST api/sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub user_id: UserId,
    pub details: Vec<SaleItem>,
}

impl SaleRequest {
    /// A sale needs a customer and at least one line.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] naming what is missing.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.user_id.as_str().trim().is_empty() {
            return Err(ApiError::Validation(
                "Please select a customer".to_string(),
            ));
        }
        if self.details.is_empty() {
            return Err(ApiError::Validation(
                "Add at least one product to the sale".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response of `POST api/sales`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSale {
    #[serde(default, deserialize_with = "crate::wire::null_as_default")]
    pub message: String,
    #[serde(default)]
    pub sale: Option<Sale>,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_as_id() {
        let user: User = serde_json::from_str(
            r#"{"_id": "u1", "name": "Ana", "email": "ana@example.com", "role": "r-admin"}"#,
        )
        .unwrap();
        let role = user.role.unwrap();
        assert_eq!(role.id(), Some(RoleId::new("r-admin")));
        assert_eq!(role.label(), "r-admin");
    }

    #[test]
    fn test_user_role_embedded() {
        let user: User = serde_json::from_str(
            r#"{"_id": "u1", "name": "Ana", "email": "ana@example.com",
                "role": {"_id": "r1", "name": "seller", "description": "Sells"}}"#,
        )
        .unwrap();
        let role = user.role.unwrap();
        assert_eq!(role.id(), Some(RoleId::new("r1")));
        assert_eq!(role.label(), "seller");
    }

    #[test]
    fn test_user_without_role() {
        let user: User = serde_json::from_str(r#"{"name": "Ana", "email": "a@b.c"}"#).unwrap();
        assert!(user.id.is_none());
        assert!(user.role.is_none());
    }

    #[test]
    fn test_login_response_role() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token": "t", "user": {"role": "Admin"}}"#).unwrap();
        assert_eq!(response.role_name().unwrap(), "Admin");

        let response: LoginResponse =
            serde_json::from_str(r#"{"user": {"role": {"name": "seller"}}}"#).unwrap();
        assert_eq!(response.token, "");
        assert_eq!(response.role_name().unwrap(), "seller");
    }

    #[test]
    fn test_login_response_without_role_is_error() {
        let response: LoginResponse =
            serde_json::from_str(r#"{"token": "t", "user": {"name": "Ana"}}"#).unwrap();
        assert!(matches!(response.role_name(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_password_change_wire_shape() {
        let change = PasswordChange {
            current_password: SecretString::from("old".to_string()),
            new_password: SecretString::from("new".to_string()),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["currentPassword"], "old");
        assert_eq!(json["newPassword"], "new");
        assert!(change.validate().is_ok());

        let empty = PasswordChange {
            current_password: SecretString::from(String::new()),
            new_password: SecretString::from("new".to_string()),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_sale_listing_decodes() {
        let sale: Sale = serde_json::from_str(
            r#"{"_id": "s1", "total": 300.5, "date": "2024-05-01T12:00:00.000Z",
                "userId": {"_id": "u1", "name": "Ana", "role": "r1"},
                "details": [{"_id": "d1", "productId": 4, "quantity": 2, "unitPrice": 150.25}]}"#,
        )
        .unwrap();
        assert_eq!(sale.total, Price::from_cents(30_050));
        assert!(sale.date.is_some());
        assert_eq!(sale.user_id.as_ref().unwrap().label(), "Ana");
        assert_eq!(sale.details[0].subtotal(), Price::from_cents(30_050));
    }

    #[test]
    fn test_sale_with_bare_customer_id() {
        let sale: Sale = serde_json::from_str(
            r#"{"_id": "s2", "total": 10, "userId": "u9",
                "details": [{"productId": 1, "quantity": 1}]}"#,
        )
        .unwrap();
        let customer = sale.user_id.unwrap();
        assert_eq!(customer.id(), Some(&UserId::new("u9")));
        assert_eq!(customer.label(), "u9");
        assert!(sale.date.is_none());
    }

    #[test]
    fn test_sale_and_user_tolerate_nulls() {
        let sale: Sale = serde_json::from_str(
            r#"{"_id": "s3", "total": null, "date": null, "userId": null, "details": null}"#,
        )
        .unwrap();
        assert_eq!(sale.total, Price::ZERO);
        assert!(sale.user_id.is_none());
        assert!(sale.details.is_empty());

        let user: User =
            serde_json::from_str(r#"{"_id": "u1", "name": null, "email": null, "role": null}"#)
                .unwrap();
        assert_eq!(user.name, "");
        assert_eq!(user.email, "");
        assert!(user.role.is_none());

        let response: LoginResponse =
            serde_json::from_str(r#"{"token": null, "user": {"role": "admin"}}"#).unwrap();
        assert_eq!(response.token, "");
    }

    #[test]
    fn test_sale_request_wire_shape() {
        let request = SaleRequest {
            user_id: UserId::new("u1"),
            details: vec![SaleItem {
                product_id: ProductId::new(4),
                quantity: 3,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["details"][0]["productId"], 4);
        assert_eq!(json["details"][0]["quantity"], 3);
        assert!(json["details"][0].get("unitPrice").is_none());
    }

    #[test]
    fn test_sale_request_validation() {
        let no_customer = SaleRequest {
            user_id: UserId::new(" "),
            details: vec![SaleItem {
                product_id: ProductId::new(1),
                quantity: 1,
            }],
        };
        assert!(no_customer.validate().is_err());

        let empty_cart = SaleRequest {
            user_id: UserId::new("u1"),
            details: vec![],
        };
        assert!(empty_cart.validate().is_err());
    }

    #[test]
    fn test_new_user_exposes_password_only_on_the_wire() {
        let user = NewUser {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: SecretString::from("hunter2".to_string()),
            role: RoleId::new("r-consultant"),
        };
        assert!(!format!("{user:?}").contains("hunter2"));
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["password"], "hunter2");
        assert_eq!(json["role"], "r-consultant");
    }
}
