pub mod leaderboard;
pub mod progress;
pub mod streak;

pub use leaderboard::{ALL_LANGUAGES, LeaderboardEntry, RankBy, RankedEntry};
pub use progress::{ChapterProgress, ProgressSummary};
