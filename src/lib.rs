//! # Berrybank - Virtual-Economy Ledger Core
//!
//! Berrybank is the ledger/quota core of a gacha-style game economy: users
//! spend a berry balance to acquire catalog items, which land in typed
//! inventory buckets, and separately draw limited pulls gated by a rolling
//! time window with a lifetime pity counter.
//!
//! The chat transport (slash commands, embeds), process bootstrap, health
//! endpoints, scheduled drop announcements, and the random draw outcome are
//! external collaborators; this crate is the system of record they call into.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use berrybank::catalog::Catalog;
//! use berrybank::ledger::{purchase, try_draw, LedgerStore};
//!
//! fn main() -> Result<(), berrybank::ledger::LedgerError> {
//!     let store = LedgerStore::open("data/ledger")?;
//!     let catalog = Catalog::standard();
//!
//!     let receipt = purchase(&store, &catalog, "1234567890", "s tier chest", 1)?;
//!     println!("Bought {} for {}¥", receipt.entry.key, receipt.total);
//!
//!     let draw = try_draw(&store, "1234567890", 19_900, 10)?;
//!     println!("Pull {} of lifetime {}", draw.used_after, draw.total_pulls_after);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`] - Static priced item table and free-text name resolution
//! - [`ledger`] - Persisted records, purchase transaction, pull quota tracker
//! - [`config`] - Configuration management and validation
//! - [`logutil`] - Log sanitization for free-text input
//!
//! ## Consistency model
//!
//! Every record mutation is a per-record compare-and-swap cycle, so two
//! concurrent requests for the same user are equivalent to some serial order.
//! A purchase debits the balance and credits the inventory as two separate
//! record writes; a process crash between them can leave a debited but
//! uncredited state, which is surfaced (never masked) as a storage error the
//! user should retry.

pub mod catalog;
pub mod config;
pub mod ledger;
pub mod logutil;
