//! Login, sign-up, logout and the role menu.

use bookshop_client::Session;
use bookshop_core::Email;
use secrecy::SecretString;

use super::Context;
use crate::error::CliError;

/// Authenticate and store the session.
pub async fn login(ctx: &Context, email: &Email, password: String) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let response = ctx
        .sales(None)?
        .login(email.as_str(), &password)
        .await?;

    let session = Session::new(
        SecretString::from(response.token.clone()),
        response.role_name()?,
    );
    ctx.sessions().save(&session)?;

    tracing::info!("Welcome! Signed in as {}", session.role());
    print_menu(&session);
    Ok(())
}

/// Create an account with the default sign-up role.
pub async fn register(
    ctx: &Context,
    name: &str,
    email: &Email,
    password: String,
) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::InvalidInput("Name cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(CliError::InvalidInput(
            "Password cannot be empty".to_string(),
        ));
    }

    ctx.sales(None)?
        .register(name, email.as_str(), SecretString::from(password))
        .await?;

    tracing::info!("Account created for {email}. You can now log in.");
    Ok(())
}

/// Forget the stored session.
pub fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.sessions().clear()?;
    tracing::info!("Logged out");
    Ok(())
}

/// Show the menu for the current role.
pub fn menu(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.session()?.ok_or(CliError::NotLoggedIn)?;
    tracing::info!("Signed in as {}", session.role());
    print_menu(&session);
    Ok(())
}

/// Version and the services this client talks to.
pub fn about(ctx: &Context) {
    tracing::info!("bookshop {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Catalog service: {}", ctx.catalog_url());
    tracing::info!("Sales service:   {}", ctx.sales_url());
}

fn print_menu(session: &Session) {
    let start = session.start_route();
    for screen in session.menu() {
        let marker = if screen.route == start { "*" } else { " " };
        tracing::info!("{marker} {:<12} bookshop {}", screen.label, screen.route);
    }
    if session.can_edit() {
        tracing::info!("This role can create and edit records.");
    }
}
