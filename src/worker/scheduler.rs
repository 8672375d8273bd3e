use crate::models::{LeaderboardConfig, MarketConfig, RunSummary};
use crate::services::{LeaderboardSync, MarketSync, LEADERBOARD_JOB, MARKET_JOB};
use crate::utils::now_local;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::str::FromStr;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// A job the scheduler can trigger
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &str;

    async fn run_once(&self) -> RunSummary;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Market,
    Leaderboard,
}

impl FromStr for JobKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "market" | "crypto" => Ok(JobKind::Market),
            "leaderboard" | "producthunt" => Ok(JobKind::Leaderboard),
            other => Err(format!("Unknown job '{}'. Expected market or leaderboard", other)),
        }
    }
}

pub struct MarketJob {
    pub config: MarketConfig,
    pub persist: bool,
}

#[async_trait]
impl ScheduledJob for MarketJob {
    fn name(&self) -> &str {
        MARKET_JOB
    }

    async fn run_once(&self) -> RunSummary {
        match MarketSync::run_live(self.config.clone(), self.persist).await {
            Ok((summary, _)) => summary,
            Err(e) => failed(MARKET_JOB, e),
        }
    }
}

pub struct LeaderboardJob {
    pub config: LeaderboardConfig,
    pub persist: bool,
}

#[async_trait]
impl ScheduledJob for LeaderboardJob {
    fn name(&self) -> &str {
        LEADERBOARD_JOB
    }

    async fn run_once(&self) -> RunSummary {
        match LeaderboardSync::run_live(self.config.clone(), self.persist).await {
            Ok((summary, _)) => summary,
            Err(e) => failed(LEADERBOARD_JOB, e),
        }
    }
}

fn failed(job: &str, error: impl std::fmt::Display) -> RunSummary {
    let mut summary = RunSummary::new(job);
    summary.fail(error);
    summary
}

/// First slot strictly after `now` at one of `hours` (local wall-clock, minute 0)
pub fn next_run_after(now: DateTime<Tz>, hours: &[u32]) -> Option<DateTime<Tz>> {
    let mut hours: Vec<u32> = hours.iter().copied().filter(|h| *h < 24).collect();
    hours.sort_unstable();
    hours.dedup();

    let tz = now.timezone();
    let today = now.date_naive();

    // two days covers any gap between slots
    for offset in 0..=2 {
        let day = today + Duration::days(offset);
        for hour in &hours {
            let Some(time) = NaiveTime::from_hms_opt(*hour, 0, 0) else {
                continue;
            };
            let Some(candidate) = tz.from_local_datetime(&day.and_time(time)).earliest() else {
                continue;
            };
            if candidate > now {
                return Some(candidate);
            }
        }
    }
    None
}

/// Run each job once, strictly one after another
pub async fn run_all(jobs: &[Box<dyn ScheduledJob>], iteration: u64) -> Vec<RunSummary> {
    let mut summaries = Vec::with_capacity(jobs.len());

    for job in jobs {
        let started = std::time::Instant::now();
        info!(iteration, job = job.name(), "Scheduler: Starting job");

        let summary = job.run_once().await;
        if summary.is_success() {
            info!(
                iteration,
                job = job.name(),
                written = summary.written,
                consistent = summary.is_consistent(),
                duration_secs = started.elapsed().as_secs_f64(),
                "Scheduler: Job completed"
            );
        } else {
            warn!(
                iteration,
                job = job.name(),
                error = summary.error.as_deref().unwrap_or("unknown"),
                "Scheduler: Job failed"
            );
        }
        summaries.push(summary);
    }

    summaries
}

/// Run the jobs now, then at every scheduled hour until the process stops
#[instrument(skip(jobs), fields(jobs = jobs.len()))]
pub async fn run(jobs: Vec<Box<dyn ScheduledJob>>, hours: Vec<u32>) {
    info!(hours = ?hours, "Starting scheduler");

    let mut iteration = 1u64;
    run_all(&jobs, iteration).await;

    loop {
        let now = now_local();
        let Some(next) = next_run_after(now, &hours) else {
            error!("Scheduler: No valid schedule hours, stopping");
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!(next_run = %next, wait_secs = wait.as_secs(), "Scheduler: Waiting for next slot");
        sleep(wait).await;

        iteration += 1;
        run_all(&jobs, iteration).await;
    }
}
