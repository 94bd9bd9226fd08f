//! Tagged sticker references
//!
//! Rows are inserted by the `add` command and never updated. The `tag`
//! column is the table's primary key, so a tag belongs to exactly one
//! sticker across all users.

use crate::database::{DatabaseConnection, StoreError, StoreResult};
use crate::domain_types::{ChatId, StickerFileId, StickerTag};
use crate::storage::user_store::user_exists;
use sqlx::Row;

const COUNT_TAG: &str = "SELECT COUNT(*) FROM stickers WHERE tag = ?";

const INSERT_STICKER: &str = "INSERT INTO stickers (tag, user_id, sticker_id) VALUES (?, ?, ?)";

const SELECT_STICKER: &str = "SELECT tag, user_id, sticker_id FROM stickers WHERE tag = ?";

/// One row of the `stickers` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickerRecord {
    /// Tag the sticker is filed under
    pub tag: StickerTag,
    /// Owning user (the default user for public stickers)
    pub owner: ChatId,
    /// Opaque chat-platform handle
    pub sticker: StickerFileId,
}

/// Store of tagged sticker references
#[derive(Clone)]
pub struct StickerStore {
    connection: DatabaseConnection,
}

impl StickerStore {
    /// Creates a store over an initialized persistent connection
    #[must_use]
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Files a sticker under each of the given tags, atomically.
    ///
    /// # Errors
    ///
    /// Fails when the owner is not a stored user, when any tag is already
    /// taken (no row is inserted in that case), or when the driver rejects
    /// a write.
    pub async fn add_sticker(
        &self,
        owner: ChatId,
        sticker: &StickerFileId,
        tags: &[StickerTag],
    ) -> StoreResult<usize> {
        let sticker = sticker.clone();
        let tags = tags.to_vec();
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    if !user_exists(&mut *conn, owner).await? {
                        return Err(StoreError::constraint("sticker owner must exist"));
                    }
                    for tag in &tags {
                        let taken: i64 = sqlx::query_scalar(COUNT_TAG)
                            .bind(tag.clone().into_inner())
                            .fetch_one(&mut *conn)
                            .await
                            .map_err(StoreError::backend)?;
                        if taken > 0 {
                            return Err(StoreError::constraint(format!(
                                "tag '{tag}' is already taken"
                            )));
                        }
                        sqlx::query(INSERT_STICKER)
                            .bind(tag.clone().into_inner())
                            .bind(owner.as_i64())
                            .bind(sticker.clone().into_inner())
                            .execute(&mut *conn)
                            .await
                            .map_err(StoreError::backend)?;
                    }
                    Ok(tags.len())
                })
            })
            .await
    }

    /// Looks up the sticker filed under a tag, if any.
    ///
    /// # Errors
    ///
    /// Fails when the driver rejects the read or a stored column is
    /// malformed.
    pub async fn sticker_for_tag(&self, tag: &StickerTag) -> StoreResult<Option<StickerRecord>> {
        let tag = tag.clone();
        self.connection
            .safe_operation(move |conn| {
                Box::pin(async move {
                    let row = sqlx::query(SELECT_STICKER)
                        .bind(tag.clone().into_inner())
                        .fetch_optional(&mut *conn)
                        .await
                        .map_err(StoreError::backend)?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let owner: i64 = row.try_get("user_id").map_err(StoreError::backend)?;
                    let sticker: String =
                        row.try_get("sticker_id").map_err(StoreError::backend)?;
                    let sticker = StickerFileId::try_new(sticker)
                        .map_err(|_| StoreError::constraint("stored sticker id is malformed"))?;
                    Ok(Some(StickerRecord {
                        tag,
                        owner: ChatId::new(owner),
                        sticker,
                    }))
                })
            })
            .await
    }
}
