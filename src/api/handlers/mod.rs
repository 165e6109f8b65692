mod accounts;
mod downloads;
mod health;
mod posts;

pub use accounts::{login, logout, register};
pub use downloads::download;
pub use health::health;
pub use posts::{
    create_post, delete_post_at, delete_post_by_id, get_post_by_id, list_posts, update_post_at,
    update_post_by_id,
};
