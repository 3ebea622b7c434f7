//! SQLite Video Repository

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{RepositoryError, VideoRecord, VideoRepositoryPort};
use crate::domain::VideoStatus;

/// SQLite Video Repository
pub struct SqliteVideoRepository {
    pool: DbPool,
}

impl SqliteVideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VideoRow {
    id: String,
    text: String,
    language: String,
    avatar: Option<String>,
    status: String,
    result_url: Option<String>,
    created_at: String,
    updated_at: String,
}

/// 固定精度，保证按字符串排序即按时间排序
fn format_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

impl TryFrom<VideoRow> for VideoRecord {
    type Error = RepositoryError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        Ok(VideoRecord {
            created_at: parse_time(&row.created_at)?,
            updated_at: parse_time(&row.updated_at)?,
            status: VideoStatus::from_provider(&row.status),
            id: row.id,
            text: row.text,
            language: row.language,
            avatar: row.avatar,
            result_url: row.result_url,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, text, language, avatar, status, result_url, created_at, updated_at FROM videos";

#[async_trait]
impl VideoRepositoryPort for SqliteVideoRepository {
    async fn save(&self, video: &VideoRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, text, language, avatar, status, result_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                language = excluded.language,
                avatar = excluded.avatar,
                status = excluded.status,
                result_url = excluded.result_url,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&video.id)
        .bind(&video.text)
        .bind(&video.language)
        .bind(&video.avatar)
        .bind(video.status.as_str())
        .bind(&video.result_url)
        .bind(format_time(&video.created_at))
        .bind(format_time(&video.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VideoRecord>, RepositoryError> {
        let row: Option<VideoRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(VideoRecord::try_from).transpose()
    }

    async fn find_page(&self, limit: u32, offset: u32) -> Result<Vec<VideoRecord>, RepositoryError> {
        let rows: Vec<VideoRow> = sqlx::query_as(&format!(
            "{} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS
        ))
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(VideoRecord::try_from).collect()
    }

    async fn update_status(
        &self,
        id: &str,
        status: &VideoStatus,
        result_url: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE videos SET status = ?, result_url = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(result_url)
        .bind(format_time(&Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
