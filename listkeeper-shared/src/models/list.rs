/// List model and database operations
///
/// A list is an aggregate: one `lists` row plus its ordered `list_entries`.
/// Every multi-statement write runs in a single transaction, so a failure at
/// any step rolls the whole aggregate back and no partial list is ever
/// visible.
///
/// # Ownership
///
/// The owner (`user_id`) is fixed at creation. Callers establish that the
/// requester owns the list (see `auth::authorization`) before calling
/// [`List::update`] or [`List::delete`]; both also filter on the requester,
/// so a missed check degrades to `NotFound` rather than a foreign write.
///
/// # Entry replacement
///
/// When an update carries entries, the stored entries are deleted and the
/// submitted ones inserted verbatim. There is no merge or diff.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lists (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     version INTEGER NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE list_entries (
///     id BIGSERIAL PRIMARY KEY,
///     list_id BIGINT NOT NULL REFERENCES lists(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     order_index INTEGER NOT NULL
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use listkeeper_shared::models::list::{CreateList, List, NewListEntry, UpdateList};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, owner_id: i64) -> Result<(), Box<dyn std::error::Error>> {
/// let list = List::create(&pool, owner_id, CreateList {
///     title: "Groceries".to_string(),
///     description: String::new(),
///     entries: vec![
///         NewListEntry { title: "Milk".to_string(), order_index: 0 },
///         NewListEntry { title: "Eggs".to_string(), order_index: 1 },
///     ],
/// }).await?;
///
/// // Rename only; entries are left untouched
/// List::update(&pool, list.id, owner_id, UpdateList {
///     title: Some("Weekly groceries".to_string()),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::auth::authorization::OwnedResource;

/// A stored list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ListEntry {
    /// Entry ID (reassigned whenever the entry set is replaced)
    pub id: i64,

    /// Entry text
    pub title: String,

    /// Display position; not necessarily contiguous or unique
    pub order_index: i32,
}

/// A list with its entries ordered by `order_index`
#[derive(Debug, Clone, Serialize)]
pub struct List {
    /// List ID
    pub id: i64,

    /// Owning user (immutable)
    pub user_id: i64,

    /// Title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Incremented on every successful update
    pub version: i32,

    /// When the list was created
    pub created_at: DateTime<Utc>,

    /// When the list was last updated
    pub updated_at: DateTime<Utc>,

    /// Entries, ascending by `order_index`
    pub entries: Vec<ListEntry>,
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ListRow {
    fn with_entries(self, entries: Vec<ListEntry>) -> List {
        List {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            entries,
        }
    }
}

/// An entry as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListEntry {
    /// Entry text
    pub title: String,

    /// Display position
    #[serde(default)]
    pub order_index: i32,
}

/// Input for creating a list
#[derive(Debug, Clone)]
pub struct CreateList {
    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Initial entries
    pub entries: Vec<NewListEntry>,
}

/// Input for updating a list
///
/// `title` and `description` are left unchanged when `None`.
///
/// `entries` is tri-state:
/// - `None`: stored entries are kept as they are
/// - `Some(vec![])`: all entries are removed
/// - `Some(entries)`: stored entries are replaced by exactly `entries`
///
/// `expected_version`, when set, makes the update fail with
/// [`ListError::VersionConflict`] unless it equals the stored version.
#[derive(Debug, Clone, Default)]
pub struct UpdateList {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// Replacement entry set
    pub entries: Option<Vec<NewListEntry>>,

    /// Version the caller last read
    pub expected_version: Option<i32>,
}

/// Error type for list writes
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// No list with this ID (for this owner)
    #[error("List {0} not found")]
    NotFound(i64),

    /// The stored version no longer matches the caller's
    #[error("List {id} has version {actual}, expected {expected}")]
    VersionConflict { id: i64, expected: i32, actual: i32 },

    /// Database error (transaction rolled back)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl List {
    /// Creates a list owned by `owner_id` together with its entries
    ///
    /// The list row and all entry rows are inserted in one transaction. If
    /// any insert fails the transaction is rolled back and the error returned.
    ///
    /// # Returns
    ///
    /// The stored list; entries keep the submitted order
    pub async fn create(pool: &PgPool, owner_id: i64, data: CreateList) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            INSERT INTO lists (user_id, title, description)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, title, description, version, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .fetch_one(&mut *tx)
        .await?;

        let entries = insert_entries(&mut tx, row.id, &data.entries).await?;

        tx.commit().await?;

        tracing::info!(
            list_id = row.id,
            user_id = owner_id,
            entry_count = entries.len(),
            "List created"
        );

        Ok(row.with_entries(entries))
    }

    /// Finds a list and its entries by ID
    ///
    /// # Returns
    ///
    /// The list if found, None otherwise. Entries are ascending by
    /// `order_index`; ties fall back to insertion order.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        // One snapshot for the row and its entries
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            SELECT id, user_id, title, description, version, created_at, updated_at
            FROM lists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let entries = fetch_entries(&mut tx, id).await?;
        tx.commit().await?;

        Ok(Some(row.with_entries(entries)))
    }

    /// Returns only the owner of a list
    ///
    /// Used for authorization decisions where the full aggregate isn't needed.
    pub async fn get_owner(pool: &PgPool, id: i64) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar("SELECT user_id FROM lists WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Updates a list owned by `requester_id`
    ///
    /// The caller must already have checked ownership. Runs in one
    /// transaction: field update, then (only if `data.entries` is `Some`)
    /// delete of all entries and insert of the submitted set.
    ///
    /// # Errors
    ///
    /// - `ListError::NotFound` if the list no longer exists
    /// - `ListError::VersionConflict` if `expected_version` is stale
    /// - `ListError::Database` on any storage failure (nothing is written)
    pub async fn update(
        pool: &PgPool,
        id: i64,
        requester_id: i64,
        data: UpdateList,
    ) -> Result<Self, ListError> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, ListRow>(
            r#"
            UPDATE lists
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1
              AND user_id = $2
              AND ($5::INTEGER IS NULL OR version = $5)
            RETURNING id, user_id, title, description, version, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(requester_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.expected_version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let actual: Option<i32> =
                sqlx::query_scalar("SELECT version FROM lists WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(requester_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            // Dropping tx rolls back
            return Err(match (actual, data.expected_version) {
                (Some(actual), Some(expected)) => {
                    tracing::warn!(list_id = id, expected, actual, "List version conflict");
                    ListError::VersionConflict { id, expected, actual }
                }
                _ => ListError::NotFound(id),
            });
        };

        let entries = match &data.entries {
            Some(replacement) => {
                sqlx::query("DELETE FROM list_entries WHERE list_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;

                insert_entries(&mut tx, id, replacement).await?;
                fetch_entries(&mut tx, id).await?
            }
            None => fetch_entries(&mut tx, id).await?,
        };

        tx.commit().await?;

        tracing::info!(
            list_id = id,
            version = row.version,
            entries_replaced = data.entries.is_some(),
            "List updated"
        );

        Ok(row.with_entries(entries))
    }

    /// Deletes a list owned by `requester_id`
    ///
    /// Entries are removed by the `ON DELETE CASCADE` foreign key.
    ///
    /// # Errors
    ///
    /// Returns `ListError::NotFound` if no row was deleted
    pub async fn delete(pool: &PgPool, id: i64, requester_id: i64) -> Result<(), ListError> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(requester_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ListError::NotFound(id));
        }

        tracing::info!(list_id = id, user_id = requester_id, "List deleted");
        Ok(())
    }
}

#[async_trait]
impl OwnedResource for List {
    const KIND: &'static str = "list";

    async fn owner_id(pool: &PgPool, id: i64) -> Result<Option<i64>, sqlx::Error> {
        Self::get_owner(pool, id).await
    }
}

async fn insert_entries(
    conn: &mut PgConnection,
    list_id: i64,
    entries: &[NewListEntry],
) -> Result<Vec<ListEntry>, sqlx::Error> {
    let mut stored = Vec::with_capacity(entries.len());

    for entry in entries {
        let row = sqlx::query_as::<_, ListEntry>(
            r#"
            INSERT INTO list_entries (list_id, title, order_index)
            VALUES ($1, $2, $3)
            RETURNING id, title, order_index
            "#,
        )
        .bind(list_id)
        .bind(&entry.title)
        .bind(entry.order_index)
        .fetch_one(&mut *conn)
        .await?;

        stored.push(row);
    }

    Ok(stored)
}

async fn fetch_entries(conn: &mut PgConnection, list_id: i64) -> Result<Vec<ListEntry>, sqlx::Error> {
    sqlx::query_as::<_, ListEntry>(
        r#"
        SELECT id, title, order_index
        FROM list_entries
        WHERE list_id = $1
        ORDER BY order_index ASC, id ASC
        "#,
    )
    .bind(list_id)
    .fetch_all(conn)
    .await
}
