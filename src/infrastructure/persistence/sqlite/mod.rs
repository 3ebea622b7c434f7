//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod video_repo;

pub use database::*;
pub use video_repo::*;
