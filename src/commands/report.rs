//! Console output shared by the job commands

use crate::models::{InstrumentRecord, RunSummary};

/// Print the outcome of a run and return the process exit code
///
/// 0: done and consistent, 1: failed, 2: done but the collection may hold
/// stale or missing documents.
pub fn print_summary(summary: &RunSummary) -> i32 {
    println!("\n═══════════════════════════════════════════════════════════");

    if let Some(rate) = &summary.exchange_rate {
        if rate.is_fallback {
            println!("⚠️  USD/VND: {} (fallback rate, live rate unavailable)", format_number(rate.rate));
        } else {
            println!("💱 USD/VND: {} ({})", format_number(rate.rate), rate.source);
        }
    }

    for (category, count) in &summary.fetched {
        println!("   {:<14} {:>4}", category, count);
    }

    match &summary.replace {
        Some(outcome) => {
            println!(
                "🗄️  {}: deleted {} in {} batch(es), wrote {}",
                outcome.collection, outcome.deleted, outcome.delete_batches, outcome.written
            );
            if outcome.failed_writes > 0 {
                println!("⚠️  {} document(s) failed to write", outcome.failed_writes);
            }
            if !outcome.cleared_completely {
                println!("⚠️  Clear phase stopped early, old documents may remain");
            }
        }
        None if summary.is_success() => {
            println!("ℹ️  Persistence skipped, nothing written");
        }
        None => {}
    }

    if let Some(path) = &summary.backup_path {
        println!("💾 Backup: {}", path);
    }

    if !summary.is_success() {
        eprintln!(
            "\n❌ {} run failed: {}",
            summary.job,
            summary.error.as_deref().unwrap_or("unknown error")
        );
        1
    } else if !summary.is_consistent() {
        println!("\n⚠️  {} run completed with an inconsistent collection", summary.job);
        2
    } else {
        println!("\n✅ {} run completed", summary.job);
        0
    }
}

pub fn print_instruments(title: &str, records: &[InstrumentRecord]) {
    if records.is_empty() {
        return;
    }
    println!("\n{}", title);
    for record in records {
        println!(
            "   {:<18} {:>12.2} {:<4} {:>8}  ≈ {} VND",
            record.quote.name,
            record.quote.current_price,
            record.quote.currency,
            format_change(record.quote.change_percent, record.quote.change_available),
            record.price.vnd.map(format_number).unwrap_or_else(|| "-".to_string())
        );
    }
}

pub fn format_change(percent: f64, available: bool) -> String {
    if available {
        format!("{:+.2}%", percent)
    } else {
        "n/a".to_string()
    }
}

/// Round to an integer and group thousands, e.g. 1560000000 -> "1,560,000,000"
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}
