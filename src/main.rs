//! Binary entrypoint for the berrybank CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `shop` - print the catalog listing
//! - `buy <user> <item> [-a <amount>]` - purchase from the shop
//! - `pull <user> [-w <window>]` - consume one gacha draw (window defaults to the current UTC day)
//! - `balance <user>` - show balance and inventory
//! - `grant <user> <amount>` - admin credit onto a balance
//!
//! See the library crate docs for module-level details: `berrybank::`.
use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;

use berrybank::catalog::{format_catalog_listing, Catalog};
use berrybank::config::Config;
use berrybank::ledger::{purchase, try_draw, LedgerError, LedgerStore};

#[derive(Parser)]
#[command(name = "berrybank")]
#[command(about = "Virtual-economy ledger for gacha-style game bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init,
    /// Print the shop catalog
    Shop,
    /// Buy an item from the shop
    Buy {
        /// User id the purchase is for
        user: String,
        /// Free-text item name ("s tier chest", "rayskin", ...)
        item: String,
        /// Amount to buy (non-positive values buy 1)
        #[arg(short, long, default_value_t = 1)]
        amount: i64,
    },
    /// Consume one gacha draw from the per-window quota
    Pull {
        /// User id drawing the pull
        user: String,
        /// Window index; defaults to the current UTC day number
        #[arg(short, long)]
        window: Option<u64>,
    },
    /// Show a user's balance and inventory
    Balance {
        /// User id to inspect
        user: String,
    },
    /// Credit berries onto a user's balance (admin)
    Grant {
        /// User id to credit
        user: String,
        /// Berries to add
        amount: i64,
    },
}

fn init_logging(config_level: &str, verbose: u8) {
    let level = match verbose {
        0 => config_level,
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// The default externally-assigned pull window: days since the Unix epoch.
fn current_day_window() -> u64 {
    (Utc::now().timestamp() / 86_400).max(0) as u64
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging("info", cli.verbose);
        Config::create_default(&cli.config).await?;
        println!("Wrote default configuration to {}", cli.config);
        return Ok(());
    }

    let config = Config::load(&cli.config)
        .await
        .with_context(|| format!("run `berrybank init` to create {}", cli.config))?;
    init_logging(&config.logging.level, cli.verbose);

    let store = LedgerStore::open(&config.storage.data_dir)?;
    let catalog = Catalog::standard();
    info!("ledger store open at {}", config.storage.data_dir);

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Shop => {
            for line in format_catalog_listing(&catalog) {
                println!("{line}");
            }
        }
        Commands::Buy { user, item, amount } => {
            match purchase(&store, &catalog, &user, &item, amount) {
                Ok(receipt) => println!(
                    "Purchased {} x {} for {}¥. ({}¥ left)",
                    receipt.quantity, receipt.entry.key, receipt.total, receipt.remaining
                ),
                Err(LedgerError::ItemNotFound(name)) => {
                    println!("Item \"{}\" not found in the shop.", name)
                }
                Err(LedgerError::InsufficientFunds {
                    required,
                    available,
                }) => println!(
                    "Insufficient funds. Need {}¥ but you have {}¥.",
                    required, available
                ),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Pull { user, window } => {
            let window = window.unwrap_or_else(current_day_window);
            match try_draw(&store, &user, window, config.pulls.window_capacity) {
                Ok(draw) => println!(
                    "Pull {}/{} this window; {} lifetime.",
                    draw.used_after, config.pulls.window_capacity, draw.total_pulls_after
                ),
                Err(LedgerError::QuotaExceeded { capacity }) => {
                    println!("No pulls left: {} per window.", capacity)
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Balance { user } => {
            let bal = store.balance(&user)?;
            let inv = store.inventory(&user)?;
            println!("{}¥  (reset tokens: {})", bal.amount, bal.reset_tokens);
            let chests: Vec<String> = berrybank::catalog::ChestTier::ALL
                .iter()
                .map(|t| format!("{}:{}", t, inv.chest_count(*t)))
                .collect();
            println!("Chests: {}", chests.join(" "));
            println!("XP books: {}  XP scrolls: {}", inv.xp_books, inv.xp_scrolls);
            if inv.items.is_empty() {
                println!("Items: none");
            } else {
                for (key, count) in &inv.items {
                    println!("  {} x {}", key, count);
                }
            }
        }
        Commands::Grant { user, amount } => {
            if amount <= 0 {
                anyhow::bail!("grant amount must be positive");
            }
            let bal = store.update_balance(&user, |bal| {
                bal.amount += amount;
                Ok(())
            })?;
            println!("Granted {}¥ to {} (now {}¥).", amount, user, bal.amount);
        }
    }

    Ok(())
}
