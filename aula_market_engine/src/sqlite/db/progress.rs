use sqlx::SqliteConnection;

use crate::{db_types::CourseProgress, traits::MarketDbError};

/// Enrolls the user in the course with zero progress. Enrollment is idempotent: if the user is already enrolled the
/// existing row (and its progress) is left alone, and `false` is returned.
pub async fn start_course(user_id: i64, course_id: i64, conn: &mut SqliteConnection) -> Result<bool, MarketDbError> {
    let result = sqlx::query(
        "INSERT INTO course_progress (user_id, course_id, progress_percent) VALUES ($1, $2, 0.0) ON CONFLICT \
         (user_id, course_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(course_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes the user's enrollment in the course. Returns `false` if there was nothing to remove.
pub async fn delete_progress(user_id: i64, course_id: i64, conn: &mut SqliteConnection) -> Result<bool, MarketDbError> {
    let result = sqlx::query("DELETE FROM course_progress WHERE user_id = $1 AND course_id = $2")
        .bind(user_id)
        .bind(course_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_progress(
    user_id: i64,
    course_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CourseProgress>, sqlx::Error> {
    let progress = sqlx::query_as("SELECT * FROM course_progress WHERE user_id = $1 AND course_id = $2")
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(conn)
        .await?;
    Ok(progress)
}
