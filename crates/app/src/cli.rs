//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use trackers_core::{Priority, SortKey};
use trackers_movies::WatchStatus;
use trackers_shipping::{Carrier, ShipmentStatus};

#[derive(Parser, Debug)]
#[command(name = "trackers")]
#[command(author, version, about = "Shipping, shopping and movie trackers", long_about = None)]
pub struct Cli {
    /// Directory holding the tracker data files
    #[arg(long, global = true, env = "TRACKERS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log format on stderr (json or compact)
    #[arg(long, global = true, env = "TRACKERS_LOG_FORMAT", default_value = "compact")]
    pub log_format: String,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track parcels
    #[command(subcommand, alias = "ship")]
    Shipping(ShippingCommands),

    /// Manage the shopping list
    #[command(subcommand, alias = "shop")]
    Shopping(ShoppingCommands),

    /// Manage the movie watchlist
    #[command(subcommand, alias = "movie")]
    Movies(MovieCommands),
}

/// Sort order shared by every list command.
#[derive(Args, Debug, Clone, Copy)]
pub struct SortArgs {
    /// added, price, name or priority
    #[arg(long, default_value = "added")]
    pub sort: SortKey,
}

#[derive(Subcommand, Debug)]
pub enum ShippingCommands {
    /// Start tracking a parcel
    Add {
        tracking_number: String,
        /// ups, fedex, usps, dhl or auto
        #[arg(short, long, default_value = "auto")]
        carrier: Carrier,
        #[arg(short, long)]
        label: Option<String>,
    },
    /// Fetch the latest status (all parcels when no id is given)
    Refresh { id: Option<String> },
    /// Rename a parcel or override its status
    Edit {
        id: String,
        #[arg(short, long)]
        label: Option<String>,
        #[arg(short, long)]
        status: Option<ShipmentStatus>,
    },
    /// Stop tracking a parcel
    Remove { id: String },
    /// List tracked parcels
    List {
        /// Only parcels not yet delivered
        #[arg(long, conflicts_with = "status")]
        active: bool,
        #[arg(short, long)]
        status: Option<ShipmentStatus>,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Stop tracking everything
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ShoppingCommands {
    /// Add an item, looking it up by barcode or name unless --manual
    Add {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[arg(short, long)]
        price: Option<f64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        notes: Option<String>,
        /// Skip the product lookup
        #[arg(long)]
        manual: bool,
    },
    /// Search the product catalogue without adding anything
    Lookup { query: String },
    /// Flip an item between purchased and not purchased
    Toggle { id: String },
    /// Change an item's quantity by DELTA (never below one)
    Qty {
        id: String,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Edit item fields
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        price: Option<f64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Remove an item
    Remove { id: String },
    /// Show the list
    List {
        #[arg(short, long)]
        category: Option<String>,
        /// Only purchased items
        #[arg(long, conflicts_with = "remaining")]
        purchased: bool,
        /// Only items still to buy
        #[arg(long)]
        remaining: bool,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Show totals, optionally converted to another currency
    Total {
        #[arg(long)]
        currency: Option<String>,
    },
    /// Empty the list
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum MovieCommands {
    /// Search movies by title
    Search { title: String },
    /// Show this week's trending movies
    Trending,
    /// Add a movie by title or id (tt…, tmdb-…)
    Add { query: String },
    /// Flip between to-watch and watched
    Toggle { id: String },
    /// Re-fetch movie details
    Refresh { id: String },
    /// Remove a movie
    Remove { id: String },
    /// Show the watchlist
    List {
        #[arg(short, long)]
        status: Option<WatchStatus>,
        #[arg(short, long, conflicts_with = "status")]
        genre: Option<String>,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Empty the watchlist
    Clear,
}
