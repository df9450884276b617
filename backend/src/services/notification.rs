//! In-app notification service
//!
//! Notifications are rows, not pushes: events like low stock queue an
//! entry that users read and dismiss from the app. A null recipient
//! means the notification is visible to every user.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// A queued in-app notification
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub reference_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Queue a notification for a specific user, or for everyone when
    /// `user_id` is None
    pub async fn queue(
        &self,
        user_id: Option<Uuid>,
        kind: &str,
        title: &str,
        body: &str,
        reference_id: Option<Uuid>,
    ) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, reference_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, kind, title, body, reference_id, is_read, created_at
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(title)
        .bind(body)
        .bind(reference_id)
        .fetch_one(&self.db)
        .await?;

        Ok(notification)
    }

    /// Notifications visible to a user: their own plus broadcasts,
    /// newest first
    pub async fn list_for_user(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
        let rows = if unread_only {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT id, user_id, kind, title, body, reference_id, is_read, created_at
                FROM notifications
                WHERE (user_id = $1 OR user_id IS NULL) AND is_read = false
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT id, user_id, kind, title, body, reference_id, is_read, created_at
                FROM notifications
                WHERE user_id = $1 OR user_id IS NULL
                ORDER BY created_at DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.db)
            .await?
        };

        Ok(rows)
    }

    /// Count of unread notifications for a user
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM notifications
            WHERE (user_id = $1 OR user_id IS NULL) AND is_read = false
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark one notification as read
    pub async fn mark_as_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = true
            WHERE id = $1 AND (user_id = $2 OR user_id IS NULL)
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        Ok(())
    }

    /// Mark everything visible to a user as read; returns how many rows
    /// changed
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<i64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications SET is_read = true
            WHERE (user_id = $1 OR user_id IS NULL) AND is_read = false
            "#,
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() as i64)
    }
}

/// Queue a low-stock broadcast from inside an open transaction, so the
/// notification commits (or rolls back) with the movement that caused it.
pub(crate) async fn queue_low_stock(
    tx: &mut Transaction<'_, Postgres>,
    part_id: Uuid,
    code: &str,
    name: &str,
    stock: i32,
    min_stock: i32,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (user_id, kind, title, body, reference_id)
        VALUES (NULL, 'low_stock', $1, $2, $3)
        "#,
    )
    .bind(format!("Low stock: {}", code))
    .bind(format!(
        "Part {} ({}) is at {} units, at or below the minimum of {}",
        name, code, stock, min_stock
    ))
    .bind(part_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
