//! Tool Depot CLI - browse the catalog, build a memo, and place orders.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password is read from stdin when not given)
//! td login -e buyer@example.com
//!
//! # Browse
//! td products list --search drill --sort price
//! td products show drill
//!
//! # Build the memo
//! td memo add drill 12v -q 2
//! td memo add-many bolt m8=100 m10=50
//! td memo list
//!
//! # Place the order
//! td checkout -n "Asha Traders" -a "12 MG Road, Pune" --gst 27AAPFU0939F1ZV
//! ```
//!
//! # Environment Variables
//!
//! See `tooldepot_storefront::config`. `RUST_LOG` controls log output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tooldepot_core::{CategoryId, GstNo, PaymentMethod, ProductId, VariantId};
use tooldepot_storefront::catalog::ProductSort;
use tooldepot_storefront::config::StorefrontConfig;
use tooldepot_storefront::error::AppError;

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(name = "td")]
#[command(author, version, about = "Tool Depot storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the memo (order list)
    Memo {
        #[command(subcommand)]
        action: MemoAction,
    },
    /// Browse products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// List product categories
    Categories,
    /// Submit the memo as an order
    Checkout {
        /// Customer or business name
        #[arg(short, long)]
        name: String,

        /// Shipping address
        #[arg(short, long)]
        address: String,

        /// GST number (GSTIN)
        #[arg(long)]
        gst: Option<GstNo>,

        /// Payment method (`cash_on_delivery`, `bank_transfer`, `upi`, `card`)
        #[arg(short, long, default_value = "cash_on_delivery")]
        payment: PaymentMethod,
    },
    /// Show your order history
    Orders,
    /// Sign in
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Subcommand)]
enum MemoAction {
    /// Show memo lines and totals
    List,
    /// Add a variant
    Add {
        product: ProductId,
        variant: VariantId,

        /// Quantity to add
        #[arg(short, long, default_value = "1")]
        quantity: Decimal,
    },
    /// Add several variants of one product (`VARIANT` or `VARIANT=QTY`)
    AddMany {
        product: ProductId,
        #[arg(required = true)]
        variants: Vec<String>,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        product: ProductId,
        variant: VariantId,
        quantity: Decimal,
    },
    /// Remove a line
    Remove {
        product: ProductId,
        variant: VariantId,
    },
    /// Empty the memo
    Clear,
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Match name, brand, or SKU
        #[arg(short, long)]
        search: Option<String>,

        /// Only this category
        #[arg(short, long)]
        category: Option<CategoryId>,

        /// `newest`, `name_asc`, `name_desc`, `price_asc`, `price_desc`
        #[arg(long, default_value = "newest")]
        sort: ProductSort,

        #[arg(long, default_value_t = 1)]
        page: usize,

        #[arg(long, default_value_t = tooldepot_storefront::catalog::DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Show one product and its variants
    Show { id: ProductId },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tooldepot_storefront=info,tooldepot_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("{}", AppError::from(e).user_message());
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.capture();
            tracing::error!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), AppError> {
    let ctx = Context::load(config)?;

    let result = match cli.command {
        Commands::Memo { action } => match action {
            MemoAction::List => {
                commands::memo::list(&ctx);
                Ok(())
            }
            MemoAction::Add {
                product,
                variant,
                quantity,
            } => commands::memo::add(&ctx, &product, &variant, quantity).await,
            MemoAction::AddMany { product, variants } => {
                commands::memo::add_many(&ctx, &product, &variants).await
            }
            MemoAction::Update {
                product,
                variant,
                quantity,
            } => {
                commands::memo::update(&ctx, product, variant, quantity);
                Ok(())
            }
            MemoAction::Remove { product, variant } => {
                commands::memo::remove(&ctx, product, variant);
                Ok(())
            }
            MemoAction::Clear => {
                commands::memo::clear(&ctx);
                Ok(())
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List {
                search,
                category,
                sort,
                page,
                per_page,
            } => {
                let query = tooldepot_storefront::catalog::ProductQuery {
                    search,
                    category,
                    sort,
                    page,
                    per_page,
                };
                commands::catalog::list(&ctx, &query).await
            }
            ProductsAction::Show { id } => commands::catalog::show(&ctx, &id).await,
        },
        Commands::Categories => commands::catalog::categories(&ctx).await,
        Commands::Checkout {
            name,
            address,
            gst,
            payment,
        } => {
            let mut details = tooldepot_storefront::checkout::CheckoutDetails::new(name, address)
                .with_payment_method(payment);
            details.gst_no = gst;
            commands::orders::checkout(&ctx, &details).await
        }
        Commands::Orders => commands::orders::history(&ctx).await,
        Commands::Login { email, password } => {
            commands::account::login(&ctx, &email, password).await
        }
        Commands::Logout => {
            commands::account::logout(&ctx);
            Ok(())
        }
        Commands::Whoami => commands::account::whoami(&ctx).await,
    };

    // A 401 anywhere above signs the store out; keep the saved session in step
    commands::after_session_save(result, ctx.save_session())
}
