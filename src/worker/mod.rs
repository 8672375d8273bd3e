pub mod scheduler;

pub use scheduler::run as run_scheduler;
pub use scheduler::{next_run_after, JobKind, LeaderboardJob, MarketJob, ScheduledJob};
