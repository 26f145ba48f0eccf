//! User/sales service client.
//!
//! Covers authentication (`api/users/login`, `api/users/register`), user and
//! role administration, password changes and sales.

mod types;

use std::sync::Arc;

use bookshop_core::{RoleId, RoleKind, UserId};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::instrument;

pub use types::{
    CreatedSale, LoginResponse, LoginUser, NewUser, PasswordChange, Role, RoleRef, RoleRequest,
    Sale, SaleCustomer, SaleDetail, SaleItem, SaleRequest, UpdateUser, User,
};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpClient, segment};
use types::LoginRequest;

const USERS: &str = "api/users";
const ROLES: &str = "api/roles";
const SALES: &str = "api/sales";

/// Client for the user/sales service.
#[derive(Clone)]
pub struct SalesClient {
    inner: Arc<HttpClient>,
}

impl SalesClient {
    /// Create a client for the configured sales URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, token: Option<SecretString>) -> Result<Self> {
        let http = HttpClient::new(config.sales_url.clone(), config.http_timeout, token)?;
        Ok(Self {
            inner: Arc::new(http),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &url::Url {
        self.inner.base_url()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a token and role.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for bad credentials and
    /// [`ApiError::Validation`] if the response carries no role.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse> {
        let body = LoginRequest {
            email: email.trim(),
            password: password.expose_secret(),
        };
        let response: LoginResponse = self
            .inner
            .send(Method::POST, &format!("{USERS}/login"), &body)
            .await?;
        let role = response.role_name()?;
        tracing::info!(role, "Logged in");
        Ok(response)
    }

    /// Sign up with the default sign-up role.
    ///
    /// The role id is looked up by name first; sign-up fails if the service
    /// has no such role.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the sign-up role does not exist.
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: SecretString) -> Result<()> {
        let signup = RoleKind::DEFAULT_SIGNUP;
        let role = self
            .find_role_by_name(signup.as_str())
            .await?
            .and_then(|r| r.id)
            .ok_or_else(|| ApiError::NotFound(format!("role '{signup}'")))?;

        let body = NewUser {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password,
            role,
        };
        self.inner
            .send_discarding(Method::POST, &format!("{USERS}/register"), &body)
            .await?;
        tracing::info!("Registered new user");
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// List all users.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>> {
        self.inner.get(USERS).await
    }

    /// Fetch one user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the id does not exist.
    #[instrument(skip(self))]
    pub async fn user(&self, id: &UserId) -> Result<User> {
        self.inner.get(&user_path(id)).await
    }

    /// Create a user with an explicit role (administrator flow).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create_user(&self, user: &NewUser) -> Result<()> {
        self.inner
            .send_discarding(Method::POST, &format!("{USERS}/register"), user)
            .await
    }

    /// Update a user's name, email and role.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, update))]
    pub async fn update_user(&self, id: &UserId, update: &UpdateUser) -> Result<()> {
        self.inner
            .send_discarding(Method::PUT, &user_path(id), update)
            .await
    }

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &UserId) -> Result<()> {
        self.inner.delete(&user_path(id)).await
    }

    /// Change a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if either field is empty, or
    /// [`ApiError::Unauthorized`] if the current password is wrong.
    #[instrument(skip(self, change))]
    pub async fn change_password(&self, id: &UserId, change: &PasswordChange) -> Result<()> {
        change.validate()?;
        let path = format!("{}/password", user_path(id));
        match self
            .inner
            .send::<_, Value>(Method::PUT, &path, change)
            .await
        {
            Ok(_) => Ok(()),
            Err(ApiError::Unauthorized(_)) => Err(ApiError::Unauthorized(
                "current password is incorrect".to_string(),
            )),
            Err(err) => Err(err),
        }
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// List all roles.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn roles(&self) -> Result<Vec<Role>> {
        self.inner.get(ROLES).await
    }

    /// Fetch one role.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the id does not exist.
    #[instrument(skip(self))]
    pub async fn role(&self, id: &RoleId) -> Result<Role> {
        self.inner.get(&role_path(id)).await
    }

    /// Find a role by name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns error if listing roles fails.
    pub async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let roles = self.roles().await?;
        Ok(roles
            .into_iter()
            .find(|role| role.name.trim().eq_ignore_ascii_case(name.trim())))
    }

    /// Create a role.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(name = %request.name))]
    pub async fn create_role(&self, request: &RoleRequest) -> Result<Role> {
        self.inner.send(Method::POST, ROLES, request).await
    }

    /// Update a role.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, request))]
    pub async fn update_role(&self, id: &RoleId, request: &RoleRequest) -> Result<()> {
        self.inner
            .send_discarding(Method::PUT, &role_path(id), request)
            .await
    }

    /// Delete a role.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, id: &RoleId) -> Result<()> {
        self.inner.delete(&role_path(id)).await
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// List all sales with their customer populated.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not decode.
    #[instrument(skip(self))]
    pub async fn sales(&self) -> Result<Vec<Sale>> {
        self.inner.get(SALES).await
    }

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if there is no customer or no lines;
    /// otherwise the server's message, e.g. insufficient stock.
    #[instrument(skip(self, request), fields(customer = %request.user_id, lines = request.details.len()))]
    pub async fn create_sale(&self, request: &SaleRequest) -> Result<CreatedSale> {
        request.validate()?;
        let created: CreatedSale = self.inner.send(Method::POST, SALES, request).await?;
        tracing::info!(message = %created.message, "Sale created");
        Ok(created)
    }
}

fn user_path(id: &UserId) -> String {
    format!("{USERS}/{}", segment(id.as_str()))
}

fn role_path(id: &RoleId) -> String {
    format!("{ROLES}/{}", segment(id.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_escape_ids() {
        assert_eq!(user_path(&UserId::new("65a1")), "api/users/65a1");
        assert_eq!(role_path(&RoleId::new("a/b")), "api/roles/a%2Fb");
    }
}
