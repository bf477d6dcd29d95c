//! presswire-db — PostgreSQL repositories for migrated news articles.
//!
//! Owns the relational side of the migration: channels and the articles
//! that belong to them. Schema DDL, row-level security and triggers are
//! managed outside this crate; repositories speak plain SQL over sqlx.

pub mod articles;
pub mod channels;
pub mod error;

pub use articles::{ArticleRepository, ArticleRow, NewArticle};
pub use channels::{Channel, ChannelRepository, ChannelStatus};
pub use error::{DbError, Result};
