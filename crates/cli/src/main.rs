//! Bookshop CLI - Terminal front end for the catalog and sales services.
//!
//! # Usage
//!
//! ```bash
//! # Log in; prints the menu for your role
//! bookshop login -e ana@example.com -p secret
//!
//! # Browse and edit the catalog
//! bookshop products list
//! bookshop authors create --name "Juan Rulfo"
//!
//! # Record a sale: two copies of product 4, one of product 9
//! bookshop sales create --customer 65a1b2c3 --item 4:2 --item 9:1
//!
//! # Forget the stored session
//! bookshop logout
//! ```
//!
//! # Commands
//!
//! Every command other than `login`, `register` and `logout` needs a stored
//! session, and only the screens in the role's menu are reachable.
//!
//! # Environment Variables
//!
//! See `bookshop_client::config`; `RUST_LOG` controls verbosity (default
//! `info`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use bookshop_core::{AuthorId, Email, GenreId, Price, ProductId, PublisherId, RoleId, UserId};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "bookshop")]
#[command(author, version, about = "Bookshop catalog and sales client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: Email,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account with the default sign-up role
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Email,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the navigation menu for the current role
    Menu,
    /// Show version and service endpoints
    About,
    /// Manage authors
    Authors {
        #[command(subcommand)]
        action: EntryAction,
    },
    /// Manage genres
    Genres {
        #[command(subcommand)]
        action: EntryAction,
    },
    /// Manage publishers
    Publishers {
        #[command(subcommand)]
        action: EntryAction,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },
    /// List and record sales
    Sales {
        #[command(subcommand)]
        action: SaleAction,
    },
}

/// Actions shared by authors, genres and publishers.
#[derive(Subcommand)]
enum EntryAction {
    /// List all records
    List,
    /// Show one record
    Show { id: i32 },
    /// Create a record
    Create {
        #[arg(short, long)]
        name: String,
    },
    /// Rename a record
    Update {
        id: i32,

        #[arg(short, long)]
        name: String,
    },
    /// Delete a record
    Delete { id: i32 },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List all products
    List,
    /// Show one product with authors, genres and images
    Show { id: ProductId },
    /// Create a product
    Create(ProductArgs),
    /// Replace every field of a product
    Update {
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Change only the given fields of a product
    Patch {
        id: ProductId,

        #[command(flatten)]
        fields: ProductPatchArgs,
    },
    /// Delete a product
    Delete { id: ProductId },
}

#[derive(Args)]
struct ProductArgs {
    #[arg(long)]
    title: String,

    #[arg(long)]
    publisher: PublisherId,

    #[arg(long)]
    stock: i32,

    /// Selling price, e.g. 249.90
    #[arg(long)]
    price: Price,

    #[arg(long)]
    supplier_price: Option<Price>,

    /// Author id (repeatable)
    #[arg(long = "author")]
    authors: Vec<AuthorId>,

    /// Genre id (repeatable)
    #[arg(long = "genre")]
    genres: Vec<GenreId>,

    /// Image URL (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,
}

#[derive(Args)]
struct ProductPatchArgs {
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    publisher: Option<PublisherId>,

    #[arg(long)]
    stock: Option<i32>,

    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    supplier_price: Option<Price>,

    /// Replace the author list (repeatable)
    #[arg(long = "author")]
    authors: Vec<AuthorId>,

    /// Replace the genre list (repeatable)
    #[arg(long = "genre")]
    genres: Vec<GenreId>,

    /// Replace the image list (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,
}

#[derive(Subcommand)]
enum UserAction {
    /// List all users
    List,
    /// Show one user
    Show { id: UserId },
    /// Create a user with an explicit role
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: Email,

        #[arg(short, long)]
        password: String,

        /// Role name or id
        #[arg(short, long)]
        role: String,
    },
    /// Update a user's name, email or role
    Update {
        id: UserId,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<Email>,

        /// Role name or id
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Delete a user
    Delete { id: UserId },
    /// Change a user's password
    Password {
        id: UserId,

        #[arg(long)]
        current: String,

        #[arg(long)]
        new: String,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// List all roles
    List,
    /// Show one role
    Show { id: RoleId },
    /// Create a role
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Update a role
    Update {
        id: RoleId,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a role
    Delete { id: RoleId },
}

#[derive(Subcommand)]
enum SaleAction {
    /// List all sales with their lines
    List,
    /// Build a cart and record it as a sale
    Create {
        /// Customer (user id)
        #[arg(short, long)]
        customer: UserId,

        /// Line as PRODUCT:QUANTITY (repeatable)
        #[arg(short, long = "item")]
        items: Vec<commands::sales::ItemArg>,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = commands::Context::load()?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password).await,
        Commands::Register {
            name,
            email,
            password,
        } => commands::auth::register(&ctx, &name, &email, password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Menu => commands::auth::menu(&ctx),
        Commands::About => {
            commands::auth::about(&ctx);
            Ok(())
        }
        Commands::Authors { action } => {
            run_entry::<bookshop_client::catalog::Author>(&ctx, action).await
        }
        Commands::Genres { action } => {
            run_entry::<bookshop_client::catalog::Genre>(&ctx, action).await
        }
        Commands::Publishers { action } => {
            run_entry::<bookshop_client::catalog::Publisher>(&ctx, action).await
        }
        Commands::Products { action } => run_product(&ctx, action).await,
        Commands::Users { action } => run_user(&ctx, action).await,
        Commands::Roles { action } => run_role(&ctx, action).await,
        Commands::Sales { action } => match action {
            SaleAction::List => commands::sales::list(&ctx).await,
            SaleAction::Create { customer, items } => {
                commands::sales::create(&ctx, customer, &items).await
            }
        },
    }
}

async fn run_entry<E>(ctx: &commands::Context, action: EntryAction) -> Result<(), CliError>
where
    E: commands::catalog::RoutedEntry,
    E::Id: From<i32>,
{
    use commands::catalog;

    match action {
        EntryAction::List => catalog::list::<E>(ctx).await,
        EntryAction::Show { id } => catalog::show::<E>(ctx, E::Id::from(id)).await,
        EntryAction::Create { name } => catalog::create::<E>(ctx, &name).await,
        EntryAction::Update { id, name } => catalog::update::<E>(ctx, E::Id::from(id), &name).await,
        EntryAction::Delete { id } => catalog::delete::<E>(ctx, E::Id::from(id)).await,
    }
}

async fn run_product(ctx: &commands::Context, action: ProductAction) -> Result<(), CliError> {
    use commands::products;

    match action {
        ProductAction::List => products::list(ctx).await,
        ProductAction::Show { id } => products::show(ctx, id).await,
        ProductAction::Create(fields) => products::create(ctx, fields.into_request()).await,
        ProductAction::Update { id, fields } => {
            products::replace(ctx, id, fields.into_request()).await
        }
        ProductAction::Patch { id, fields } => products::patch(ctx, id, fields.into_patch()).await,
        ProductAction::Delete { id } => products::delete(ctx, id).await,
    }
}

async fn run_user(ctx: &commands::Context, action: UserAction) -> Result<(), CliError> {
    use commands::users;

    match action {
        UserAction::List => users::list(ctx).await,
        UserAction::Show { id } => users::show(ctx, &id).await,
        UserAction::Create {
            name,
            email,
            password,
            role,
        } => users::create(ctx, &name, &email, password, &role).await,
        UserAction::Update {
            id,
            name,
            email,
            role,
        } => users::update(ctx, &id, name, email, role).await,
        UserAction::Delete { id } => users::delete(ctx, &id).await,
        UserAction::Password { id, current, new } => {
            users::change_password(ctx, &id, current, new).await
        }
    }
}

async fn run_role(ctx: &commands::Context, action: RoleAction) -> Result<(), CliError> {
    use commands::users;

    match action {
        RoleAction::List => users::list_roles(ctx).await,
        RoleAction::Show { id } => users::show_role(ctx, &id).await,
        RoleAction::Create { name, description } => {
            users::create_role(ctx, &name, description).await
        }
        RoleAction::Update {
            id,
            name,
            description,
        } => users::update_role(ctx, &id, &name, description).await,
        RoleAction::Delete { id } => users::delete_role(ctx, &id).await,
    }
}

impl ProductArgs {
    fn into_request(self) -> bookshop_client::catalog::ProductRequest {
        bookshop_client::catalog::ProductRequest {
            title: self.title.trim().to_string(),
            publisher_id: self.publisher,
            stock: self.stock,
            price: self.price,
            supplier_price: self.supplier_price,
            author_ids: self.authors,
            genre_ids: self.genres,
            images: into_images(self.images),
        }
    }
}

impl ProductPatchArgs {
    fn into_patch(self) -> commands::products::ProductPatch {
        commands::products::ProductPatch {
            title: self.title,
            publisher_id: self.publisher,
            stock: self.stock,
            price: self.price,
            supplier_price: self.supplier_price,
            author_ids: Some(self.authors).filter(|v| !v.is_empty()),
            genre_ids: Some(self.genres).filter(|v| !v.is_empty()),
            images: Some(self.images)
                .filter(|v| !v.is_empty())
                .map(into_images),
        }
    }
}

fn into_images(urls: Vec<String>) -> Vec<bookshop_client::catalog::ProductImage> {
    urls.into_iter()
        .map(|url| bookshop_client::catalog::ProductImage { url })
        .collect()
}
