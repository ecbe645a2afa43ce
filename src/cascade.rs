//! Structural deletes and relationship-edge maintenance.
//!
//! Deleting an account, channel or video must leave no dangling references
//! in any other table: no videos pointing at a dead channel, no like or
//! subscription edges pointing at dead rows, no comments under a dead video.
//! Every cascade here runs inside a single transaction, so a failure partway
//! through rolls the whole delete back instead of leaving orphaned edges.
//!
//! Edge semantics differ on purpose: subscribing twice is rejected with a
//! conflict, while liking twice is a success no-op. Both behaviors are part
//! of the API contract.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::store::{accounts, channels, videos};

/// Delete an account and everything that references it: its channel (if
/// any) with all of that channel's videos, its directly-owned videos, its
/// comments, and every like/subscription edge touching the deleted rows.
pub async fn delete_account(pool: &SqlitePool, account_id: &str) -> Result<(), AppError> {
    let account = accounts::fetch(pool, account_id).await?;

    let mut tx = pool.begin().await?;

    if let Some(channel_id) = &account.channel_id {
        purge_channel(&mut *tx, channel_id).await?;
    }

    // Drop the account's own subscription edges, which simultaneously
    // removes it from every channel's subscriber set.
    sqlx::query("DELETE FROM subscriptions WHERE account_id = ?")
        .bind(&account.id)
        .execute(&mut *tx)
        .await?;

    // Videos owned directly, covering any not reached through the channel.
    let owned: Vec<String> = sqlx::query_scalar("SELECT id FROM videos WHERE owner = ?")
        .bind(&account.id)
        .fetch_all(&mut *tx)
        .await?;
    for video_id in &owned {
        purge_video(&mut *tx, video_id).await?;
    }

    sqlx::query("DELETE FROM comments WHERE author_id = ?")
        .bind(&account.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM likes WHERE account_id = ?")
        .bind(&account.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(&account.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Delete a channel and its videos; only the owner may do so. Clears the
/// owner's channel link afterwards.
pub async fn delete_channel(
    pool: &SqlitePool,
    channel_id: &str,
    requester: &str,
) -> Result<(), AppError> {
    let channel = channels::fetch(pool, channel_id).await?;
    if channel.owner != requester {
        return Err(AppError::Forbidden("Only the owner can delete this channel"));
    }

    let mut tx = pool.begin().await?;

    purge_channel(&mut *tx, &channel.id).await?;
    accounts::set_channel(&mut *tx, &channel.owner, None).await?;

    tx.commit().await?;
    Ok(())
}

/// Delete a video atomically with its dependent rows; only the owner may do
/// so. Any failure inside the transaction aborts the whole operation.
pub async fn delete_video(
    pool: &SqlitePool,
    video_id: &str,
    requester: &str,
) -> Result<(), AppError> {
    let video = videos::fetch(pool, video_id).await?;
    if video.owner != requester {
        return Err(AppError::Forbidden("Only the owner can delete this video"));
    }

    let mut tx = pool.begin().await?;

    if let Err(err) = purge_video(&mut *tx, &video.id).await {
        tx.rollback().await.ok();
        return Err(AppError::Upstream(format!("video deletion aborted: {err}")));
    }

    tx.commit()
        .await
        .map_err(|err| AppError::Upstream(format!("video deletion aborted: {err}")))?;
    Ok(())
}

/// Remove a video row together with its like edges, comments and tag rows.
/// The channel's video set is derived from `videos.channel_id`, so deleting
/// the row also removes the video from its channel.
pub(crate) async fn purge_video(
    conn: &mut SqliteConnection,
    video_id: &str,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM likes WHERE video_id = ?")
        .bind(video_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM comments WHERE video_id = ?")
        .bind(video_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM video_tags WHERE video_id = ?")
        .bind(video_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM videos WHERE id = ?")
        .bind(video_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Remove a channel row, its videos, and every subscription edge to it.
async fn purge_channel(conn: &mut SqliteConnection, channel_id: &str) -> Result<(), AppError> {
    let video_ids: Vec<String> = sqlx::query_scalar("SELECT id FROM videos WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_all(&mut *conn)
        .await?;

    for video_id in &video_ids {
        purge_video(&mut *conn, video_id).await?;
    }

    sqlx::query("DELETE FROM subscriptions WHERE channel_id = ?")
        .bind(channel_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM channels WHERE id = ?")
        .bind(channel_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Add the subscription edge. Re-subscribing is rejected, not absorbed.
pub async fn subscribe(
    pool: &SqlitePool,
    account_id: &str,
    channel_id: &str,
) -> Result<(), AppError> {
    channels::fetch(pool, channel_id).await?;
    accounts::fetch(pool, account_id).await?;

    let result = sqlx::query("INSERT OR IGNORE INTO subscriptions (account_id, channel_id) VALUES (?, ?)")
        .bind(account_id)
        .bind(channel_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Already subscribed"));
    }
    Ok(())
}

/// Remove the subscription edge; fails if it does not exist.
pub async fn unsubscribe(
    pool: &SqlitePool,
    account_id: &str,
    channel_id: &str,
) -> Result<(), AppError> {
    channels::fetch(pool, channel_id).await?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE account_id = ? AND channel_id = ?")
        .bind(account_id)
        .bind(channel_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Not subscribed to this channel"));
    }
    Ok(())
}

/// Add the like edge. Idempotent: liking an already-liked video succeeds.
pub async fn like(pool: &SqlitePool, account_id: &str, video_id: &str) -> Result<(), AppError> {
    videos::fetch(pool, video_id).await?;
    accounts::fetch(pool, account_id).await?;

    sqlx::query("INSERT OR IGNORE INTO likes (account_id, video_id) VALUES (?, ?)")
        .bind(account_id)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove the like edge unconditionally; succeeds whether or not it existed.
pub async fn unlike(pool: &SqlitePool, account_id: &str, video_id: &str) -> Result<(), AppError> {
    videos::fetch(pool, video_id).await?;
    accounts::fetch(pool, account_id).await?;

    sqlx::query("DELETE FROM likes WHERE account_id = ? AND video_id = ?")
        .bind(account_id)
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Account, Channel, Video};
    use crate::store::{accounts, channels, comments, videos};
    use crate::auth::Identity;
    use sqlx::SqlitePool;

    async fn seed_account(pool: &SqlitePool, name: &str) -> Account {
        accounts::create(pool, name, &format!("{name}@x.com"), "hash")
            .await
            .unwrap()
    }

    async fn seed_channel(pool: &SqlitePool, owner: &Account) -> Channel {
        channels::create(pool, &owner.id, &format!("{} Ch", owner.name), &format!("@{}", owner.name))
            .await
            .unwrap()
    }

    async fn seed_video(pool: &SqlitePool, owner: &Account, channel: &Channel) -> Video {
        videos::create(
            pool,
            videos::NewVideo {
                title: "clip",
                description: "d",
                video_url: "/assets/v".into(),
                thumbnail_url: "/assets/t".into(),
                owner: &owner.id,
                channel_id: &channel.id,
                tags: vec!["Music".into()],
            },
        )
        .await
        .unwrap()
    }

    fn identity(account: &Account) -> Identity {
        Identity {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
        }
    }

    #[tokio::test]
    async fn subscribe_is_symmetric_and_rejects_duplicates() {
        let pool = db::memory_pool().await;
        let alice = seed_account(&pool, "alice").await;
        let bob = seed_account(&pool, "bob").await;
        let channel = seed_channel(&pool, &alice).await;

        subscribe(&pool, &bob.id, &channel.id).await.unwrap();
        assert_eq!(
            channels::subscriber_ids(&pool, &channel.id).await.unwrap(),
            vec![bob.id.clone()]
        );
        assert_eq!(
            accounts::subscription_ids(&pool, &bob.id).await.unwrap(),
            vec![channel.id.clone()]
        );

        let err = subscribe(&pool, &bob.id, &channel.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        unsubscribe(&pool, &bob.id, &channel.id).await.unwrap();
        assert!(channels::subscriber_ids(&pool, &channel.id).await.unwrap().is_empty());
        assert!(accounts::subscription_ids(&pool, &bob.id).await.unwrap().is_empty());

        let err = unsubscribe(&pool, &bob.id, &channel.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn like_is_idempotent_and_unlike_is_unconditional() {
        let pool = db::memory_pool().await;
        let alice = seed_account(&pool, "alice").await;
        let bob = seed_account(&pool, "bob").await;
        let channel = seed_channel(&pool, &alice).await;
        let video = seed_video(&pool, &alice, &channel).await;

        like(&pool, &bob.id, &video.id).await.unwrap();
        // Second like succeeds and leaves the edge present exactly once.
        like(&pool, &bob.id, &video.id).await.unwrap();
        assert_eq!(
            videos::liker_ids(&pool, &video.id).await.unwrap(),
            vec![bob.id.clone()]
        );
        assert_eq!(
            accounts::liked_video_ids(&pool, &bob.id).await.unwrap(),
            vec![video.id.clone()]
        );

        unlike(&pool, &bob.id, &video.id).await.unwrap();
        assert!(videos::liker_ids(&pool, &video.id).await.unwrap().is_empty());

        // Unliking again is still a success.
        unlike(&pool, &bob.id, &video.id).await.unwrap();
    }

    #[tokio::test]
    async fn account_deletion_leaves_no_dangling_references() {
        let pool = db::memory_pool().await;
        let alice = seed_account(&pool, "alice").await;
        let bob = seed_account(&pool, "bob").await;
        let channel = seed_channel(&pool, &alice).await;
        let video = seed_video(&pool, &alice, &channel).await;

        subscribe(&pool, &bob.id, &channel.id).await.unwrap();
        like(&pool, &bob.id, &video.id).await.unwrap();
        comments::create(&pool, &video.id, &identity(&bob), &bob.avatar, "first")
            .await
            .unwrap();

        delete_account(&pool, &alice.id).await.unwrap();

        assert!(accounts::by_id(&pool, &alice.id).await.unwrap().is_none());
        assert!(channels::by_id(&pool, &channel.id).await.unwrap().is_none());
        assert!(videos::by_id(&pool, &video.id).await.unwrap().is_none());

        // No account still references the deleted channel or its videos.
        assert!(accounts::subscription_ids(&pool, &bob.id).await.unwrap().is_empty());
        assert!(accounts::liked_video_ids(&pool, &bob.id).await.unwrap().is_empty());

        // Comments under the deleted video are gone too.
        assert!(comments::list_for_video(&pool, &video.id).await.unwrap().is_empty());

        // Unrelated accounts survive.
        assert!(accounts::by_id(&pool, &bob.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_unknown_account_is_not_found() {
        let pool = db::memory_pool().await;
        let err = delete_account(&pool, "missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("Account")));
    }

    #[tokio::test]
    async fn channel_deletion_cascades_and_clears_owner_link() {
        let pool = db::memory_pool().await;
        let alice = seed_account(&pool, "alice").await;
        let bob = seed_account(&pool, "bob").await;
        let channel = seed_channel(&pool, &alice).await;
        let video = seed_video(&pool, &alice, &channel).await;

        subscribe(&pool, &bob.id, &channel.id).await.unwrap();
        like(&pool, &bob.id, &video.id).await.unwrap();

        let err = delete_channel(&pool, &channel.id, &bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        delete_channel(&pool, &channel.id, &alice.id).await.unwrap();

        assert!(channels::by_id(&pool, &channel.id).await.unwrap().is_none());
        assert!(videos::by_id(&pool, &video.id).await.unwrap().is_none());
        assert!(accounts::subscription_ids(&pool, &bob.id).await.unwrap().is_empty());
        assert!(accounts::liked_video_ids(&pool, &bob.id).await.unwrap().is_empty());

        let alice = accounts::fetch(&pool, &alice.id).await.unwrap();
        assert!(!alice.has_channel);
        assert!(alice.channel_id.is_none());
    }

    #[tokio::test]
    async fn video_deletion_is_atomic() {
        let pool = db::memory_pool().await;
        let alice = seed_account(&pool, "alice").await;
        let bob = seed_account(&pool, "bob").await;
        let channel = seed_channel(&pool, &alice).await;
        let video = seed_video(&pool, &alice, &channel).await;

        like(&pool, &bob.id, &video.id).await.unwrap();
        comments::create(&pool, &video.id, &identity(&bob), &bob.avatar, "nice")
            .await
            .unwrap();

        // An aborted transaction leaves the video and its dependents intact.
        let mut tx = pool.begin().await.unwrap();
        purge_video(&mut *tx, &video.id).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(videos::by_id(&pool, &video.id).await.unwrap().is_some());
        assert_eq!(videos::liker_ids(&pool, &video.id).await.unwrap().len(), 1);
        assert_eq!(comments::list_for_video(&pool, &video.id).await.unwrap().len(), 1);

        // Only the owner may delete.
        let err = delete_video(&pool, &video.id, &bob.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        delete_video(&pool, &video.id, &alice.id).await.unwrap();

        assert!(videos::by_id(&pool, &video.id).await.unwrap().is_none());
        assert!(videos::liker_ids(&pool, &video.id).await.unwrap().is_empty());
        assert!(comments::list_for_video(&pool, &video.id).await.unwrap().is_empty());
        assert!(channels::video_ids(&pool, &channel.id).await.unwrap().is_empty());

        // Tags are a registry, not reference-counted: they survive the video.
        assert_eq!(crate::store::tags::list(&pool).await.unwrap().len(), 1);
    }
}
