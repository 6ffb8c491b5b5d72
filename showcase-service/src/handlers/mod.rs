pub mod health;
pub mod submissions;

pub use health::health_check;
pub use submissions::{leaderboard, upload, upload_creation};
