//! Comment endpoints, planet and galaxy variants.

use serde::{Deserialize, Serialize};

use astral_shared::model::Comment;
use astral_shared::types::{CommentId, CommentStatus, UserId};

use crate::api::ApiClient;
use crate::error::Result;

/// Planet comment list payload: flat page plus the scope total.
#[derive(Debug, Clone, Deserialize)]
pub struct CommentPage {
    pub total: u64,
    pub list: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub planet_id: String,
    pub user_id: UserId,
    pub content: String,
    pub parent_id: CommentId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishGalaxyCommentRequest {
    pub galaxy_id: i64,
    pub user_id: UserId,
    pub content: String,
    pub parent_id: CommentId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeCountBody {
    comment_id: CommentId,
    like_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    comment_id: CommentId,
    status: CommentStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCommentBody {
    comment_id: CommentId,
}

impl ApiClient {
    pub async fn planet_comments(
        &self,
        planet_id: &str,
        page: u32,
        size: u32,
    ) -> Result<CommentPage> {
        self.execute(self.get("/comment/listByPlanet").query(&[
            ("planetId", planet_id.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ]))
        .await
    }

    /// Returns the id the server assigned to the new comment.
    pub async fn create_comment(&self, request: &CreateCommentRequest) -> Result<CommentId> {
        self.execute(self.post("/comment/create").json(request))
            .await
    }

    pub async fn update_comment_like(&self, id: CommentId, like_count: u64) -> Result<()> {
        self.execute_unit(self.put("/comment/updateLikeCount").json(&LikeCountBody {
            comment_id: id,
            like_count,
        }))
        .await
    }

    pub async fn update_comment_status(&self, id: CommentId, status: CommentStatus) -> Result<()> {
        self.execute_unit(self.put("/comment/updateStatus").json(&StatusBody {
            comment_id: id,
            status,
        }))
        .await
    }

    pub async fn delete_comment(&self, id: CommentId) -> Result<()> {
        self.execute_unit(
            self.delete("/comment/delete")
                .json(&DeleteCommentBody { comment_id: id }),
        )
        .await
    }

    pub async fn delete_comments_by_planet(&self, planet_id: &str) -> Result<()> {
        self.execute_unit(self.delete(&format!("/comment/deleteByPlanetId/{planet_id}")))
            .await
    }

    pub async fn galaxy_comments(
        &self,
        galaxy_id: i64,
        page: u32,
        size: u32,
    ) -> Result<Vec<Comment>> {
        self.execute(
            self.get(&format!("/galaxy/comment/list/{galaxy_id}"))
                .query(&[("page", page.to_string()), ("size", size.to_string())]),
        )
        .await
    }

    /// The galaxy variant returns the full created comment.
    pub async fn publish_galaxy_comment(
        &self,
        request: &PublishGalaxyCommentRequest,
    ) -> Result<Comment> {
        self.execute(self.post("/galaxy/comment/publish").json(request))
            .await
    }

    /// Toggle; the payload reports whether the comment is now liked.
    pub async fn toggle_galaxy_comment_like(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> Result<bool> {
        self.execute(self.post("/galaxy/comment/like").query(&[
            ("commentId", comment_id.to_string()),
            ("userId", user_id.to_string()),
        ]))
        .await
    }

    pub async fn delete_galaxy_comment(&self, comment_id: CommentId) -> Result<()> {
        self.execute_unit(self.delete(&format!("/galaxy/comment/delete/{comment_id}")))
            .await
    }
}
