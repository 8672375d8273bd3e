//! Market snapshot command
//!
//! Usage:
//! - `market` (top 10 coins, indices and gold, written to Firestore)
//! - `market --top 25 --concurrency 8`
//! - `market --no-store` to compute and print without writing

use crate::commands::report::{format_change, format_number, print_instruments, print_summary};
use crate::models::MarketConfig;
use crate::services::{MarketReport, MarketSync};
use crate::utils::{get_backup_dir, get_fallback_rate};

pub struct MarketArgs {
    pub top: usize,
    pub batch_size: usize,
    pub concurrency: usize,
    pub store: bool,
    pub backup: bool,
}

pub fn run(args: MarketArgs) {
    let fallback_usd_vnd = match get_fallback_rate() {
        Ok(rate) => rate,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    let config = MarketConfig {
        top_coins: args.top,
        clear_batch_size: args.batch_size,
        concurrency: args.concurrency,
        fallback_usd_vnd,
        backup_dir: args.backup.then(get_backup_dir),
        ..Default::default()
    }
    .normalized();

    println!(
        "📈 Market snapshot: top {} coins -> '{}' ({} concurrent fetches)",
        config.top_coins, config.collection, config.concurrency
    );
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

    let (summary, report) = match runtime.block_on(MarketSync::run_live(config, args.store)) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Market run could not start: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(report) = &report {
        print_report(report);
    }

    let code = print_summary(&summary);
    if code != 0 {
        std::process::exit(code);
    }
}

fn print_report(report: &MarketReport) {
    if !report.crypto.is_empty() {
        println!("\n🪙 Cryptocurrencies");
        for record in &report.crypto {
            println!(
                "   #{:<3} {:<6} {:>14.4} USD {:>8}  ≈ {} VND",
                record.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
                record.symbol,
                record.current_price,
                format_change(record.change_percent, record.change_available),
                record.price.vnd.map(format_number).unwrap_or_else(|| "-".to_string())
            );
        }
    }

    if !report.missing.is_empty() {
        println!("⚠️  No quote for: {}", report.missing.join(", "));
    }

    print_instruments("📊 Stock indices", &report.indices);
    print_instruments("🥇 Commodities", &report.commodities);
}
