//! Leaderboard snapshot command
//!
//! Usage:
//! - `leaderboard` (yesterday, Asia/Ho_Chi_Minh)
//! - `leaderboard --date 2024-03-07 --no-store`

use crate::commands::report::print_summary;
use crate::constants::LEADERBOARD_ITEM_LIMIT;
use crate::models::{LeaderboardConfig, LeaderboardDate, Listing};
use crate::services::LeaderboardSync;
use crate::utils::get_backup_dir;

pub struct LeaderboardArgs {
    pub date: Option<String>,
    pub limit: usize,
    pub batch_size: usize,
    pub store: bool,
    pub backup: bool,
}

pub fn run(args: LeaderboardArgs) {
    let date = match args.date.as_deref().map(LeaderboardDate::parse).transpose() {
        Ok(date) => date,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let config = LeaderboardConfig {
        date,
        clear_batch_size: args.batch_size.max(1),
        item_limit: args.limit.clamp(1, LEADERBOARD_ITEM_LIMIT),
        backup_dir: args.backup.then(get_backup_dir),
        ..Default::default()
    };

    match &config.date {
        Some(date) => println!("🏆 Leaderboard for {} -> '{}'", date, config.collection),
        None => println!("🏆 Leaderboard for yesterday -> '{}'", config.collection),
    }
    if !args.store {
        println!("ℹ️  --no-store: results are computed but not persisted");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let (summary, listings) = match runtime.block_on(LeaderboardSync::run_live(config, args.store)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Leaderboard run could not start: {}", e);
            std::process::exit(1);
        }
    };

    print_listings(&listings);

    let code = print_summary(&summary);
    if code != 0 {
        std::process::exit(code);
    }
}

fn print_listings(listings: &[Listing]) {
    for listing in listings {
        println!("\n{:>3}. {}", listing.rank, listing.title);
        if let Some(description) = &listing.description {
            println!("     {}", description);
        }
        if !listing.topics.is_empty() {
            println!("     🏷️  {}", listing.topics.join(", "));
        }
        if let Some(link) = &listing.link {
            println!("     🔗 {}", link);
        }
    }
}
