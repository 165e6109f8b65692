use std::sync::Arc;

use uuid::Uuid;

use super::document::{DocumentBackend, JsonCollection};
use super::models::{Post, PostPatch};
use crate::error::{BoardError, BoardResult};

/// How a caller addresses a post inside the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKey {
    /// Position in the current sequence. Only meaningful until the next mutation.
    Index(usize),
    Id(Uuid),
}

/// The persisted, ordered sequence of posts.
pub struct PostStore {
    collection: JsonCollection<Post>,
}

impl PostStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            collection: JsonCollection::new(backend),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn list(&self) -> BoardResult<Vec<Post>> {
        Ok(self.collection.read().await?)
    }

    pub async fn get(&self, key: PostKey) -> BoardResult<Post> {
        let posts = self.list().await?;
        let index = locate(&posts, key)?;
        Ok(posts[index].clone())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn append(&self, post: Post) -> BoardResult<()> {
        let mut txn = self.collection.begin().await?;
        txn.items_mut().push(post);
        txn.commit().await?;
        Ok(())
    }

    /// Merge `patch` into the post at `index` and return the updated post.
    pub async fn replace_at(&self, index: usize, patch: &PostPatch) -> BoardResult<Post> {
        self.replace(PostKey::Index(index), patch, |_| Ok(())).await
    }

    /// Remove the post at `index` and return it.
    pub async fn remove_at(&self, index: usize) -> BoardResult<Post> {
        self.remove(PostKey::Index(index), |_| Ok(())).await
    }

    /// Merge `patch` into the addressed post once `check` accepts it.
    ///
    /// Lookup, `check` and the write happen under one collection lock, so the
    /// post `check` inspects is the post that gets written.
    pub async fn replace<F>(&self, key: PostKey, patch: &PostPatch, check: F) -> BoardResult<Post>
    where
        F: FnOnce(&Post) -> BoardResult<()> + Send,
    {
        let mut txn = self.collection.begin().await?;
        let index = locate(txn.items(), key)?;
        check(&txn.items()[index])?;

        let post = &mut txn.items_mut()[index];
        patch.apply_to(post);
        let updated = post.clone();

        txn.commit().await?;
        Ok(updated)
    }

    /// Remove the addressed post once `check` accepts it.
    pub async fn remove<F>(&self, key: PostKey, check: F) -> BoardResult<Post>
    where
        F: FnOnce(&Post) -> BoardResult<()> + Send,
    {
        let mut txn = self.collection.begin().await?;
        let index = locate(txn.items(), key)?;
        check(&txn.items()[index])?;

        let removed = txn.items_mut().remove(index);
        txn.commit().await?;
        Ok(removed)
    }
}

fn locate(posts: &[Post], key: PostKey) -> BoardResult<usize> {
    match key {
        PostKey::Index(index) if index < posts.len() => Ok(index),
        PostKey::Index(index) => Err(BoardError::InvalidIndex {
            index,
            len: posts.len(),
        }),
        // Nil ids belong to legacy posts and never identify a single post.
        PostKey::Id(id) if id.is_nil() => Err(BoardError::PostNotFound(id)),
        PostKey::Id(id) => posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(BoardError::PostNotFound(id)),
    }
}
