pub mod submissions;

pub use submissions::{LeaderboardEntry, LeaderboardRow, UploadResponse};
