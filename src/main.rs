//! Novelshelf CLI - browse yearly novel rankings and manage the cart.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use novelshelf::config::Config;
use novelshelf::console::Console;
use novelshelf::cookies::{JarCsrfToken, load_netscape_cookie_jar};
use novelshelf::{ConsoleNotifier, HttpNovelApi, NovelStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Yearly novel ranking shop client.
#[derive(Parser, Debug)]
#[command(name = "novelshelf")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Use this config file instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter, overriding the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selectable years.
    Years,
    /// Show the ranking for a year.
    List {
        /// Year to show; defaults to the configured year.
        #[arg(long)]
        year: Option<String>,
    },
    /// Show a single novel.
    Detail { novel_id: u64 },
    /// Add one copy of a novel to the cart.
    Add { novel_id: u64 },
    /// Show the cart.
    Cart,
    /// Change a cart item's quantity by DELTA (may be negative).
    Update {
        item_id: u64,
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    /// Remove an item from the cart.
    Remove { item_id: u64 },
    /// Empty the cart.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    novelshelf::logger::init(level).context("Failed to initialise logging")?;

    let store = build_store(&config, &console)?;
    let ok = run(args.command, &store, &console).await?;
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Wires the HTTP backend, cookie jar and console notifier into a store.
fn build_store(config: &Config, console: &Console) -> Result<NovelStore> {
    let server = url::Url::parse(&config.api.server_url).context("Invalid server URL")?;
    let cookie_dir = config.cookie_dir()?;
    let (jar, cookie_file) =
        load_netscape_cookie_jar(&cookie_dir, &[config.cookies.file_token.as_str()], &server)
            .context("Failed to load cookies")?;
    if let Some(path) = cookie_file {
        tracing::info!(path = %path.display(), "loaded cookies");
    }

    let token_url = config.api.base_url().context("Invalid API base path")?;
    let csrf = JarCsrfToken::new(jar.clone(), token_url, config.cookies.csrf_cookie.clone());
    let api = HttpNovelApi::new(
        config.api.clone(),
        config.endpoints.clone(),
        config.cookies.csrf_header.clone(),
        jar,
    )
    .context("Failed to create HTTP client")?;
    let notifier = ConsoleNotifier::new(console.clone());

    Ok(NovelStore::new(
        Arc::new(api),
        Arc::new(csrf),
        Arc::new(notifier),
        &config.store,
    )?)
}

/// Runs one command. Returns `false` when the command failed in a way
/// already reported to the user.
async fn run(command: Command, store: &NovelStore, console: &Console) -> Result<bool> {
    match command {
        Command::Years => {
            let selected = store.selected_year();
            for year in store.years() {
                if year == selected {
                    println!("{} {}", year, console.muted("(default)"));
                } else {
                    println!("{year}");
                }
            }
        }
        Command::List { year } => {
            if let Some(year) = year
                && !store.set_selected_year(&year)
            {
                console.warning(&format!(
                    "{} is not a selectable year, showing {}",
                    year,
                    store.selected_year()
                ));
            }
            show_ranking(store, console).await;
        }
        Command::Detail { novel_id } => {
            let novel = store
                .get_novel_detail(novel_id)
                .await
                .context("Failed to fetch novel detail")?;
            println!("{}", console.novel_line(&novel));
            if let Some(year) = &novel.year {
                console.info(&format!("Ranked in {year}"));
            }
        }
        Command::Add { novel_id } => return Ok(store.add_to_cart(novel_id).await),
        Command::Cart => {
            let cart = store.fetch_cart().await.context("Failed to fetch cart")?;
            console.print_cart(&cart);
        }
        Command::Update { item_id, delta } => {
            let cart = store
                .update_cart_item(item_id, delta)
                .await
                .context("Failed to update cart item")?;
            console.print_cart(&cart);
        }
        Command::Remove { item_id } => {
            let cart = store
                .remove_cart_item(item_id)
                .await
                .context("Failed to remove cart item")?;
            console.print_cart(&cart);
        }
        Command::Clear => {
            let cart = store.clear_cart().await.context("Failed to clear cart")?;
            console.print_cart(&cart);
        }
    }
    Ok(true)
}

async fn show_ranking(store: &NovelStore, console: &Console) {
    store.fetch_novels(None).await;
    console.section(&format!("{} ranking", store.selected_year()));

    if let Some(error) = store.current_error() {
        console.warning(&format!("{error} (showing built-in list)"));
    }

    if store.current_novels().is_empty() {
        console.info("No novels for this year");
        return;
    }

    if let Some(first) = store.first_place() {
        println!("{}", console.novel_line(&first));
    }
    for novel in store.other_places() {
        println!("  {}", console.novel_line(&novel));
    }
}
