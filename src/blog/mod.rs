pub mod domain;
pub mod feed;
pub mod forms;
pub mod repository;
pub mod service;
pub mod views;

pub use repository::{BlogRepository, DynBlogRepository, SqliteBlogRepository};
pub use service::{BlogError, BlogService};
