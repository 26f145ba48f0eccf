//! User and role administration commands.

use bookshop_client::SalesClient;
use bookshop_client::sales::{NewUser, PasswordChange, Role, RoleRequest, UpdateUser, User};
use bookshop_core::{Email, RoleId, Route, UserId};
use secrecy::SecretString;

use super::Context;
use crate::error::CliError;

// =============================================================================
// Users
// =============================================================================

pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    let users = ctx.sales(Some(&session))?.users().await?;

    if users.is_empty() {
        tracing::info!("No users found");
        return Ok(());
    }
    for user in &users {
        print_user_line(user);
    }
    Ok(())
}

pub async fn show(ctx: &Context, id: &UserId) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    let user = ctx.sales(Some(&session))?.user(id).await?;
    print_user_line(&user);
    Ok(())
}

pub async fn create(
    ctx: &Context,
    name: &str,
    email: &Email,
    password: String,
    role: &str,
) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    if name.trim().is_empty() || password.is_empty() {
        return Err(CliError::InvalidInput(
            "Name and password are required".to_string(),
        ));
    }

    let sales = ctx.sales(Some(&session))?;
    let role = resolve_role(&sales, role).await?;
    let user = NewUser {
        name: name.trim().to_string(),
        email: email.to_string(),
        password: SecretString::from(password),
        role,
    };
    sales.create_user(&user).await?;
    tracing::info!("User {email} created");
    Ok(())
}

pub async fn update(
    ctx: &Context,
    id: &UserId,
    name: Option<String>,
    email: Option<Email>,
    role: Option<String>,
) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    if name.is_none() && email.is_none() && role.is_none() {
        return Err(CliError::InvalidInput("Nothing to change".to_string()));
    }

    let sales = ctx.sales(Some(&session))?;
    let current = sales.user(id).await?;
    let role = match role {
        Some(role) => resolve_role(&sales, &role).await?,
        None => current.role.as_ref().and_then(|r| r.id()).ok_or_else(|| {
            CliError::InvalidInput(format!("User {id} has no role; pass --role"))
        })?,
    };

    let update = UpdateUser {
        name: name.map_or(current.name, |n| n.trim().to_string()),
        email: email.map_or(current.email, |e| e.to_string()),
        role,
    };
    sales.update_user(id, &update).await?;
    tracing::info!("User {id} updated");
    Ok(())
}

pub async fn delete(ctx: &Context, id: &UserId) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    ctx.sales(Some(&session))?.delete_user(id).await?;
    tracing::info!("User {id} deleted");
    Ok(())
}

pub async fn change_password(
    ctx: &Context,
    id: &UserId,
    current: String,
    new: String,
) -> Result<(), CliError> {
    let session = ctx.require(Route::Users)?;
    let change = PasswordChange {
        current_password: SecretString::from(current),
        new_password: SecretString::from(new),
    };
    ctx.sales(Some(&session))?
        .change_password(id, &change)
        .await?;
    tracing::info!("Password updated");
    Ok(())
}

// =============================================================================
// Roles
// =============================================================================

pub async fn list_roles(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.require(Route::Roles)?;
    let roles = ctx.sales(Some(&session))?.roles().await?;

    if roles.is_empty() {
        tracing::info!("No roles found");
        return Ok(());
    }
    for role in &roles {
        print_role_line(role);
    }
    Ok(())
}

pub async fn show_role(ctx: &Context, id: &RoleId) -> Result<(), CliError> {
    let session = ctx.require(Route::Roles)?;
    let role = ctx.sales(Some(&session))?.role(id).await?;
    print_role_line(&role);
    Ok(())
}

pub async fn create_role(
    ctx: &Context,
    name: &str,
    description: Option<String>,
) -> Result<(), CliError> {
    let session = ctx.require(Route::Roles)?;
    let request = role_request(name, description)?;
    let role = ctx.sales(Some(&session))?.create_role(&request).await?;
    tracing::info!("Role created");
    print_role_line(&role);
    Ok(())
}

pub async fn update_role(
    ctx: &Context,
    id: &RoleId,
    name: &str,
    description: Option<String>,
) -> Result<(), CliError> {
    let session = ctx.require(Route::Roles)?;
    let request = role_request(name, description)?;
    ctx.sales(Some(&session))?
        .update_role(id, &request)
        .await?;
    tracing::info!("Role {id} updated");
    Ok(())
}

pub async fn delete_role(ctx: &Context, id: &RoleId) -> Result<(), CliError> {
    let session = ctx.require(Route::Roles)?;
    ctx.sales(Some(&session))?.delete_role(id).await?;
    tracing::info!("Role {id} deleted");
    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Accept either a role name or a role id.
async fn resolve_role(sales: &SalesClient, name_or_id: &str) -> Result<RoleId, CliError> {
    let wanted = name_or_id.trim();
    let roles = sales.roles().await?;
    roles
        .into_iter()
        .find(|role| {
            role.name.eq_ignore_ascii_case(wanted)
                || role.id.as_ref().is_some_and(|id| id.as_str() == wanted)
        })
        .and_then(|role| role.id)
        .ok_or_else(|| CliError::InvalidInput(format!("Unknown role: {wanted}")))
}

fn role_request(name: &str, description: Option<String>) -> Result<RoleRequest, CliError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidInput("Role name cannot be empty".to_string()));
    }
    Ok(RoleRequest {
        name: name.to_string(),
        description: description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    })
}

fn print_user_line(user: &User) {
    tracing::info!(
        "{:<26} {:<24} {:<32} {}",
        user.id.as_ref().map_or("-", UserId::as_str),
        user.name,
        user.email,
        user.role.as_ref().map_or("-", |r| r.label())
    );
}

fn print_role_line(role: &Role) {
    tracing::info!(
        "{:<26} {:<16} {}",
        role.id.as_ref().map_or("-", RoleId::as_str),
        role.name,
        role.description.as_deref().unwrap_or("")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_request_trims_and_drops_blank_description() {
        let request = role_request("  seller ", Some("  ".to_string())).ok();
        assert_eq!(
            request,
            Some(RoleRequest {
                name: "seller".to_string(),
                description: None,
            })
        );
        assert!(role_request(" ", None).is_err());
    }
}
