use clap::{Parser, Subcommand};

use crate::commands;
use crate::constants::{
    DEFAULT_CLEAR_BATCH_SIZE, DEFAULT_FETCH_CONCURRENCY, DEFAULT_TOP_COINS, LEADERBOARD_COLLECTION,
    LEADERBOARD_ITEM_LIMIT, SCHEDULE_HOURS,
};
use crate::worker::JobKind;

#[derive(Parser)]
#[command(name = "marketmirror")]
#[command(about = "Mirror market prices and the daily product leaderboard into Firestore", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Snapshot crypto, stock index and gold prices with USD/VND conversion
    Market {
        /// Number of top coins by market cap
        #[arg(long, default_value_t = DEFAULT_TOP_COINS)]
        top: usize,

        /// Documents deleted per round when clearing the collection
        #[arg(long, default_value_t = DEFAULT_CLEAR_BATCH_SIZE)]
        batch_size: usize,

        /// Concurrent quote fetches (1 = sequential)
        #[arg(long, default_value_t = DEFAULT_FETCH_CONCURRENCY)]
        concurrency: usize,

        /// Compute and print only, do not write to the store
        #[arg(long)]
        no_store: bool,

        /// Skip the JSON backup file
        #[arg(long)]
        no_backup: bool,
    },
    /// Snapshot the daily leaderboard (default: yesterday)
    Leaderboard {
        /// Leaderboard day, YYYY-MM-DD or YYYY/M/D
        #[arg(short, long)]
        date: Option<String>,

        /// Items taken from the top of the page
        #[arg(long, default_value_t = LEADERBOARD_ITEM_LIMIT)]
        limit: usize,

        #[arg(long, default_value_t = DEFAULT_CLEAR_BATCH_SIZE)]
        batch_size: usize,

        #[arg(long)]
        no_store: bool,

        #[arg(long)]
        no_backup: bool,
    },
    /// List the documents of a collection
    List {
        #[arg(default_value = LEADERBOARD_COLLECTION)]
        collection: String,
    },
    /// Run jobs now and then at fixed local hours
    Schedule {
        /// Jobs to run, comma separated
        #[arg(long, value_delimiter = ',', default_value = "market,leaderboard")]
        jobs: Vec<JobKind>,

        /// Local hours to run at, comma separated
        #[arg(long, value_delimiter = ',')]
        hours: Vec<u32>,

        #[arg(long)]
        no_store: bool,

        #[arg(long)]
        no_backup: bool,
    },
}

pub fn run() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Market {
            top,
            batch_size,
            concurrency,
            no_store,
            no_backup,
        } => {
            commands::market::run(commands::market::MarketArgs {
                top,
                batch_size,
                concurrency,
                store: !no_store,
                backup: !no_backup,
            });
        }
        Commands::Leaderboard {
            date,
            limit,
            batch_size,
            no_store,
            no_backup,
        } => {
            commands::leaderboard::run(commands::leaderboard::LeaderboardArgs {
                date,
                limit,
                batch_size,
                store: !no_store,
                backup: !no_backup,
            });
        }
        Commands::List { collection } => {
            commands::list::run(collection);
        }
        Commands::Schedule {
            jobs,
            hours,
            no_store,
            no_backup,
        } => {
            let hours = if hours.is_empty() { SCHEDULE_HOURS.to_vec() } else { hours };
            commands::schedule::run(jobs, hours, !no_store, !no_backup);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_defaults() {
        let cli = Cli::try_parse_from(["marketmirror", "market"]).unwrap();
        match cli.command {
            Commands::Market { top, batch_size, concurrency, no_store, .. } => {
                assert_eq!(top, 10);
                assert_eq!(batch_size, 500);
                assert_eq!(concurrency, 4);
                assert!(!no_store);
            }
            _ => panic!("expected market"),
        }
    }

    #[test]
    fn test_schedule_jobs_parse() {
        let cli = Cli::try_parse_from(["marketmirror", "schedule", "--jobs", "leaderboard", "--hours", "7,19"]).unwrap();
        match cli.command {
            Commands::Schedule { jobs, hours, .. } => {
                assert_eq!(jobs, vec![JobKind::Leaderboard]);
                assert_eq!(hours, vec![7, 19]);
            }
            _ => panic!("expected schedule"),
        }

        assert!(Cli::try_parse_from(["marketmirror", "schedule", "--jobs", "rss"]).is_err());
    }

    #[test]
    fn test_list_default_collection() {
        let cli = Cli::try_parse_from(["marketmirror", "list"]).unwrap();
        match cli.command {
            Commands::List { collection } => assert_eq!(collection, "producthunt"),
            _ => panic!("expected list"),
        }
    }
}
