use crate::constants::LOCAL_TIMEZONE;
use crate::models::{LeaderboardConfig, MarketConfig};
use crate::utils::{get_backup_dir, get_fallback_rate};
use crate::worker::{run_scheduler, JobKind, LeaderboardJob, MarketJob, ScheduledJob};

pub fn run(jobs: Vec<JobKind>, hours: Vec<u32>, store: bool, backup: bool) {
    if jobs.is_empty() {
        eprintln!("❌ No jobs to schedule");
        std::process::exit(1);
    }
    if let Some(bad) = hours.iter().find(|h| **h > 23) {
        eprintln!("❌ Invalid schedule hour: {} (expected 0-23)", bad);
        std::process::exit(1);
    }

    let fallback_usd_vnd = match get_fallback_rate() {
        Ok(rate) => rate,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };
    let backup_dir = backup.then(get_backup_dir);

    let mut scheduled: Vec<Box<dyn ScheduledJob>> = Vec::new();
    for kind in dedup(jobs) {
        match kind {
            JobKind::Market => scheduled.push(Box::new(MarketJob {
                config: MarketConfig {
                    fallback_usd_vnd,
                    backup_dir: backup_dir.clone(),
                    ..Default::default()
                },
                persist: store,
            })),
            JobKind::Leaderboard => scheduled.push(Box::new(LeaderboardJob {
                config: LeaderboardConfig {
                    backup_dir: backup_dir.clone(),
                    ..Default::default()
                },
                persist: store,
            })),
        }
    }

    let names: Vec<&str> = scheduled.iter().map(|j| j.name()).collect();
    println!(
        "⏰ Scheduling [{}] now and at hours {:?} ({})",
        names.join(", "),
        hours,
        LOCAL_TIMEZONE.name()
    );
    println!("   Press Ctrl+C to stop\n");

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Failed to create async runtime: {}", e);
            std::process::exit(1);
        }
    };

    runtime.block_on(run_scheduler(scheduled, hours));
}

/// Keep the first occurrence of each job
fn dedup(jobs: Vec<JobKind>) -> Vec<JobKind> {
    let mut unique = Vec::with_capacity(jobs.len());
    for job in jobs {
        if !unique.contains(&job) {
            unique.push(job);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_order() {
        let jobs = vec![JobKind::Leaderboard, JobKind::Market, JobKind::Leaderboard];
        assert_eq!(dedup(jobs), vec![JobKind::Leaderboard, JobKind::Market]);
    }
}
