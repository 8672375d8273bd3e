pub mod leaderboard;
pub mod list;
pub mod market;
pub mod report;
pub mod schedule;
