//! Notification repository. Rows are owned by a single user.

use chrono::Utc;

use pactoria_core::entities::{NewNotification, Notification};
use pactoria_core::enums::{EntityType, NotificationType};
use pactoria_core::ids::PREFIX_NOTIFICATION;
use pactoria_core::pagination::{Page, PageRequest};

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_count, get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::service::PactoriaService;

const SELECT_COLS: &str = "id, user_id, company_id, notification_type, priority, title, message, \
                           entity_type, entity_id, action_url, is_read, read_at, created_at";

fn row_to_notification(row: &libsql::Row) -> Result<Notification, DatabaseError> {
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        company_id: row.get(2)?,
        notification_type: parse_enum(&row.get::<String>(3)?)?,
        priority: parse_enum(&row.get::<String>(4)?)?,
        title: row.get(5)?,
        message: row.get(6)?,
        entity_type: get_opt_string(row, 7)?
            .map(|s| parse_enum::<EntityType>(&s))
            .transpose()?,
        entity_id: get_opt_string(row, 8)?,
        action_url: get_opt_string(row, 9)?,
        is_read: get_bool(row, 10)?,
        read_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

impl PactoriaService {
    /// Store a notification. Notifications are not audited.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Core` on a blank title or message.
    pub async fn create_notification(&self, input: NewNotification) -> Result<Notification, DatabaseError> {
        self.write(async {
            let input = input.validate()?;
            let now = Utc::now();
            let notification = Notification {
                id: self.db().generate_id(PREFIX_NOTIFICATION).await?,
                user_id: input.user_id,
                company_id: input.company_id,
                notification_type: input.notification_type,
                priority: input.priority,
                title: input.title,
                message: input.message,
                entity_type: input.entity_type,
                entity_id: input.entity_id,
                action_url: input.action_url,
                is_read: false,
                read_at: None,
                created_at: now,
            };

            self.db()
                .conn()
                .execute(
                    &format!(
                        "INSERT INTO notifications ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, NULL, ?11)"
                    ),
                    libsql::params![
                        notification.id.as_str(),
                        notification.user_id.as_str(),
                        notification.company_id.as_str(),
                        notification.notification_type.as_str(),
                        notification.priority.as_str(),
                        notification.title.as_str(),
                        notification.message.as_str(),
                        notification.entity_type.map(EntityType::as_str),
                        notification.entity_id.as_deref(),
                        notification.action_url.as_deref(),
                        now.to_rfc3339()
                    ],
                )
                .await?;
            tracing::debug!(
                notification_id = %notification.id,
                user_id = %notification.user_id,
                kind = %notification.notification_type,
                "notification stored"
            );
            Ok(notification)
        })
        .await
    }

    /// A user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Page<Notification>, DatabaseError> {
        let unread_clause = if unread_only { " AND is_read = 0" } else { "" };
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM notifications WHERE user_id = ?1{unread_clause}"),
                [user_id],
            )
            .await?;
        let total = get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM notifications WHERE user_id = ?1{unread_clause}
                     ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                [user_id],
            )
            .await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(row_to_notification(&row)?);
        }
        Ok(Page::new(items, total, page))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn unread_count(&self, user_id: &str) -> Result<u64, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )
            .await?;
        get_count(&rows.next().await?.ok_or(DatabaseError::NoResult)?, 0)
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error unless `user_id` owns the
    /// notification.
    pub async fn get_notification(&self, user_id: &str, id: &str) -> Result<Notification, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM notifications WHERE id = ?1 AND user_id = ?2"),
                [id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("notification", id))?;
        row_to_notification(&row)
    }

    /// Mark one notification read. Already-read notifications keep their
    /// original `read_at`.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` core error unless `user_id` owns the
    /// notification.
    pub async fn mark_notification_read(&self, user_id: &str, id: &str) -> Result<Notification, DatabaseError> {
        self.write(async {
            let current = self.get_notification(user_id, id).await?;
            if current.is_read {
                return Ok(current);
            }
            let now = Utc::now();
            self.db()
                .conn()
                .execute(
                    "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE id = ?2",
                    libsql::params![now.to_rfc3339(), id],
                )
                .await?;
            Ok(Notification {
                is_read: true,
                read_at: Some(now),
                ..current
            })
        })
        .await
    }

    /// Mark every unread notification of a user read.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the update fails.
    pub async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, DatabaseError> {
        self.write(async {
            Ok(self
                .db()
                .conn()
                .execute(
                    "UPDATE notifications SET is_read = 1, read_at = ?1 WHERE user_id = ?2 AND is_read = 0",
                    libsql::params![Utc::now().to_rfc3339(), user_id],
                )
                .await?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns a `NotFound` core error unless `user_id` owns the
    /// notification.
    pub async fn delete_notification(&self, user_id: &str, id: &str) -> Result<(), DatabaseError> {
        self.write(async {
            let deleted = self
                .db()
                .conn()
                .execute(
                    "DELETE FROM notifications WHERE id = ?1 AND user_id = ?2",
                    [id, user_id],
                )
                .await?;
            if deleted == 0 {
                return Err(DatabaseError::not_found("notification", id));
            }
            Ok(())
        })
        .await
    }

    /// Whether `user_id` already has a notification of `kind` about
    /// `entity_id`. The expiry job uses this to notify once per contract.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn notification_exists_for(
        &self,
        user_id: &str,
        kind: NotificationType,
        entity_id: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM notifications
                 WHERE user_id = ?1 AND notification_type = ?2 AND entity_id = ?3 LIMIT 1",
                [user_id, kind.as_str(), entity_id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}
