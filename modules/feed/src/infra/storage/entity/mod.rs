pub mod post_comments;
pub mod post_likes;
pub mod posts;
pub mod stars;
