//! Post orchestration under the author-only mutation policy.
//!
//! Every mutating call follows the same sequence:
//! authenticate, locate (bounds or id), authorize, apply, reconcile attachments.
//! Locate, authorize and apply run inside one locked post-store transaction.
//! Attachments of a deleted post are removed only after the removal is durable.

use std::path::PathBuf;

use uuid::Uuid;

use crate::attachments::{AttachmentManager, Upload};
use crate::auth::Principal;
use crate::error::{BoardError, BoardResult};
use crate::storage::models::{Post, PostPatch};
use crate::storage::{PostKey, PostStore};

/// Text fields of a post being created.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

pub struct PostService {
    attachments: AttachmentManager,
    posts: PostStore,
}

impl PostService {
    pub fn new(posts: PostStore, attachments: AttachmentManager) -> Self {
        Self { attachments, posts }
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    pub async fn list(&self) -> BoardResult<Vec<Post>> {
        self.posts.list().await
    }

    pub async fn get_post(&self, id: Uuid) -> BoardResult<Post> {
        self.posts.get(PostKey::Id(id)).await
    }

    /// Create a post from an upload. At least one file is required.
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        draft: NewPost,
        uploads: &[Upload],
    ) -> BoardResult<Post> {
        let principal = authenticate(principal)?;
        if uploads.is_empty() {
            return Err(BoardError::NoFilesProvided);
        }

        let files = self.attachments.store_all(uploads).await?;
        let post = Post::new(&principal.username, draft.title, draft.content, files);

        if let Err(e) = self.posts.append(post.clone()).await {
            self.attachments.discard(&post.files).await;
            return Err(e);
        }

        tracing::debug!(
            post_id = %post.id,
            author = %post.author,
            files = post.files.len(),
            "Created post"
        );
        Ok(post)
    }

    pub async fn edit_at(
        &self,
        principal: Option<&Principal>,
        index: usize,
        patch: &PostPatch,
    ) -> BoardResult<Post> {
        self.edit(principal, PostKey::Index(index), patch).await
    }

    pub async fn edit_post(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        patch: &PostPatch,
    ) -> BoardResult<Post> {
        self.edit(principal, PostKey::Id(id), patch).await
    }

    pub async fn delete_at(&self, principal: Option<&Principal>, index: usize) -> BoardResult<Post> {
        self.delete(principal, PostKey::Index(index)).await
    }

    pub async fn delete_post(&self, principal: Option<&Principal>, id: Uuid) -> BoardResult<Post> {
        self.delete(principal, PostKey::Id(id)).await
    }

    /// Location of a stored attachment for download.
    pub async fn resolve_attachment(&self, stored_name: &str) -> BoardResult<PathBuf> {
        self.attachments.resolve_path(stored_name).await
    }

    async fn edit(
        &self,
        principal: Option<&Principal>,
        key: PostKey,
        patch: &PostPatch,
    ) -> BoardResult<Post> {
        let principal = authenticate(principal)?;
        let post = self
            .posts
            .replace(key, patch, |post| authorize(post, principal))
            .await?;

        tracing::debug!(post_id = %post.id, author = %post.author, "Updated post");
        Ok(post)
    }

    async fn delete(&self, principal: Option<&Principal>, key: PostKey) -> BoardResult<Post> {
        let principal = authenticate(principal)?;
        let removed = self
            .posts
            .remove(key, |post| authorize(post, principal))
            .await?;

        tracing::debug!(post_id = %removed.id, author = %removed.author, "Deleted post");

        self.attachments.purge(&removed.files).await?;
        Ok(removed)
    }
}

fn authenticate(principal: Option<&Principal>) -> BoardResult<&Principal> {
    principal
        .filter(|p| !p.username.is_empty())
        .ok_or(BoardError::Unauthorized)
}

fn authorize(post: &Post, principal: &Principal) -> BoardResult<()> {
    if post.is_authored_by(&principal.username) {
        Ok(())
    } else {
        Err(BoardError::Forbidden)
    }
}
