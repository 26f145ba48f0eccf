//! Author, genre and publisher commands.

use bookshop_client::catalog::{Author, CatalogEntry, CatalogRequest, Genre, Publisher};
use bookshop_core::Route;

use super::Context;
use crate::error::CliError;

/// A catalog record together with the menu route that guards it.
pub trait RoutedEntry: CatalogEntry {
    const ROUTE: Route;
}

impl RoutedEntry for Author {
    const ROUTE: Route = Route::Authors;
}

impl RoutedEntry for Genre {
    const ROUTE: Route = Route::Genres;
}

impl RoutedEntry for Publisher {
    const ROUTE: Route = Route::Publishers;
}

pub async fn list<E: RoutedEntry>(ctx: &Context) -> Result<(), CliError> {
    let session = ctx.require(E::ROUTE)?;
    let entries = ctx.catalog(&session)?.list::<E>().await?;

    if entries.is_empty() {
        tracing::info!("No {} found", E::COLLECTION);
        return Ok(());
    }
    for entry in &entries {
        tracing::info!("{:>5}  {}", id_label(entry), entry.name());
    }
    Ok(())
}

pub async fn show<E: RoutedEntry>(ctx: &Context, id: E::Id) -> Result<(), CliError> {
    let session = ctx.require(E::ROUTE)?;
    let entry = ctx.catalog(&session)?.get::<E>(id).await?;
    tracing::info!("{} {}: {}", E::NOUN, id_label(&entry), entry.name());
    Ok(())
}

pub async fn create<E: RoutedEntry>(ctx: &Context, name: &str) -> Result<(), CliError> {
    let session = ctx.require(E::ROUTE)?;
    let request = CatalogRequest::new(name)?;
    let entry = ctx.catalog(&session)?.create::<E>(&request).await?;
    tracing::info!("Created {} {}: {}", E::NOUN, id_label(&entry), entry.name());
    Ok(())
}

pub async fn update<E: RoutedEntry>(ctx: &Context, id: E::Id, name: &str) -> Result<(), CliError> {
    let session = ctx.require(E::ROUTE)?;
    let request = CatalogRequest::new(name)?;
    let entry = ctx.catalog(&session)?.update::<E>(id, &request).await?;
    tracing::info!("Updated {} {id}: {}", E::NOUN, entry.name());
    Ok(())
}

pub async fn delete<E: RoutedEntry>(ctx: &Context, id: E::Id) -> Result<(), CliError> {
    let session = ctx.require(E::ROUTE)?;
    ctx.catalog(&session)?.delete::<E>(id).await?;
    tracing::info!("Deleted {} {id}", E::NOUN);
    Ok(())
}

fn id_label<E: CatalogEntry>(entry: &E) -> String {
    entry
        .id()
        .map_or_else(|| "-".to_string(), |id| id.to_string())
}
