//! Comment actions, planet and galaxy variants over one forest engine.

use chrono::Utc;

use astral_shared::model::Comment;
use astral_shared::types::{CommentId, CommentScope, CommentStatus};

use crate::api::{ApiClient, CreateCommentRequest, PublishGalaxyCommentRequest};
use crate::error::{ClientError, Result};
use crate::state::{lock, SharedState};

pub async fn load_planet_comments(
    api: &ApiClient,
    state: &SharedState,
    planet_id: &str,
    page: u32,
) -> Result<()> {
    let size = lock(state).planet_comments.cursor().page_size;
    let fetched = api.planet_comments(planet_id, page, size).await?;
    lock(state).planet_comments.apply_page(
        CommentScope::Planet(planet_id.to_string()),
        page,
        Some(fetched.total),
        fetched.list,
    );
    Ok(())
}

/// Post a planet comment. The server returns the new id synchronously;
/// the comment is inserted locally without a refetch. A reply whose
/// parent page has not loaded falls back to the top level, flagged for
/// re-parenting.
pub async fn post_planet_comment(
    api: &ApiClient,
    state: &SharedState,
    planet_id: &str,
    content: String,
    parent_id: CommentId,
) -> Result<CommentId> {
    let user_id = api.current_user().ok_or(ClientError::AuthRequired)?;
    let request = CreateCommentRequest {
        planet_id: planet_id.to_string(),
        user_id,
        content: content.clone(),
        parent_id,
    };
    let comment_id = api.create_comment(&request).await?;

    let mut guard = lock(state);
    let level = if parent_id.is_top_level() {
        1
    } else {
        guard
            .planet_comments
            .get(parent_id)
            .map(|parent| parent.level + 1)
            .unwrap_or(2)
    };
    guard.planet_comments.add_local(Comment {
        comment_id,
        planet_id: Some(planet_id.to_string()),
        galaxy_id: None,
        user_id,
        user_name: None,
        content,
        parent_id,
        level,
        like_count: 0,
        status: CommentStatus::Normal,
        create_time: Utc::now(),
        update_time: None,
    });
    Ok(comment_id)
}

/// Optimistic like adjustment, reverted if the server rejects it.
pub async fn like_planet_comment(
    api: &ApiClient,
    state: &SharedState,
    id: CommentId,
    delta: i64,
) -> Result<()> {
    let counts = {
        let mut guard = lock(state);
        let previous = guard.planet_comments.get(id).map(|c| c.like_count);
        previous.zip(guard.planet_comments.apply_like(id, delta))
    };
    let Some((previous, new_count)) = counts else {
        return Ok(());
    };

    if let Err(err) = api.update_comment_like(id, new_count).await {
        // Clamping means -delta is not a safe inverse; restore the
        // pre-optimistic count instead.
        lock(state).planet_comments.set_like_count(id, previous);
        return Err(err);
    }
    Ok(())
}

pub async fn set_planet_comment_status(
    api: &ApiClient,
    state: &SharedState,
    id: CommentId,
    status: CommentStatus,
) -> Result<()> {
    api.update_comment_status(id, status).await?;
    lock(state).planet_comments.set_status(id, status);
    Ok(())
}

/// Delete one comment. The local tree does not cascade; children are
/// re-rooted pending a re-parent, matching the server contract.
pub async fn delete_planet_comment(
    api: &ApiClient,
    state: &SharedState,
    id: CommentId,
) -> Result<()> {
    api.delete_comment(id).await?;
    lock(state).planet_comments.remove(id);
    Ok(())
}

pub async fn clear_planet_comments(
    api: &ApiClient,
    state: &SharedState,
    planet_id: &str,
) -> Result<()> {
    api.delete_comments_by_planet(planet_id).await?;
    let mut guard = lock(state);
    let matches = guard.planet_comments.scope()
        == Some(&CommentScope::Planet(planet_id.to_string()));
    if matches {
        guard.planet_comments.clear();
    }
    Ok(())
}

pub async fn load_galaxy_comments(
    api: &ApiClient,
    state: &SharedState,
    galaxy_id: i64,
    page: u32,
) -> Result<()> {
    let size = lock(state).galaxy_comments.cursor().page_size;
    let list = api.galaxy_comments(galaxy_id, page, size).await?;
    lock(state)
        .galaxy_comments
        .apply_page(CommentScope::Galaxy(galaxy_id), page, None, list);
    Ok(())
}

/// The galaxy variant returns the full created comment.
pub async fn publish_galaxy_comment(
    api: &ApiClient,
    state: &SharedState,
    galaxy_id: i64,
    content: String,
    parent_id: CommentId,
) -> Result<Comment> {
    let user_id = api.current_user().ok_or(ClientError::AuthRequired)?;
    let request = PublishGalaxyCommentRequest {
        galaxy_id,
        user_id,
        content,
        parent_id,
    };
    let comment = api.publish_galaxy_comment(&request).await?;
    lock(state).galaxy_comments.add_local(comment.clone());
    Ok(comment)
}

/// Toggle a like; the server's answer decides the local delta.
pub async fn toggle_galaxy_comment_like(
    api: &ApiClient,
    state: &SharedState,
    id: CommentId,
) -> Result<bool> {
    let user_id = api.current_user().ok_or(ClientError::AuthRequired)?;
    let liked = api.toggle_galaxy_comment_like(id, user_id).await?;
    lock(state)
        .galaxy_comments
        .apply_like(id, if liked { 1 } else { -1 });
    Ok(liked)
}

pub async fn delete_galaxy_comment(
    api: &ApiClient,
    state: &SharedState,
    id: CommentId,
) -> Result<()> {
    api.delete_galaxy_comment(id).await?;
    lock(state).galaxy_comments.remove(id);
    Ok(())
}
