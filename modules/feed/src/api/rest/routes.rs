use std::path::PathBuf;
use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};
use tower_http::services::ServeDir;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

/// Uploaded images directory and the URL prefix it is served under.
#[derive(Debug, Clone)]
pub struct MediaRoute {
    pub prefix: String,
    pub dir: PathBuf,
}

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
    media: Option<MediaRoute>,
) -> anyhow::Result<Router> {
    // GET /api/posts
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/posts")
        .operation_id("feed.list_posts")
        .summary("List posts")
        .description("All posts, newest first. A valid bearer token fills isLikedByCurrentUser")
        .tag("posts")
        .handler(handlers::list_posts)
        .json_response_with_schema::<dto::PostListDto>(openapi, 200, "Posts")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/posts
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/posts")
        .operation_id("feed.create_post")
        .summary("Create a post")
        .description("JSON body with an optional image URL, or a multipart form with an image file")
        .tag("posts")
        .json_request::<dto::CreatePostReq>(openapi, "Post data")
        .multipart_request::<dto::CreatePostForm>(openapi, "Post data with an image upload")
        .handler(handlers::create_post)
        .json_response_with_schema::<dto::PostDto>(openapi, 201, "Post created")
        .problem_response(openapi, 400, "Empty post or invalid body")
        .problem_response(openapi, 401, "Invalid bearer token")
        .problem_response(openapi, 403, "Bearer token belongs to another user")
        .problem_response(openapi, 404, "User not found")
        .problem_response(openapi, 415, "Upload is not an image")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/posts/{id}/like
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/posts/{id}/like")
        .operation_id("feed.toggle_like")
        .summary("Like or unlike a post")
        .tag("posts")
        .path_param("id", "Post id")
        .json_request::<dto::LikeReq>(openapi, "Liking user")
        .handler(handlers::toggle_like)
        .json_response_with_schema::<dto::PostDto>(openapi, 200, "Updated post")
        .problem_response(openapi, 403, "Bearer token belongs to another user")
        .problem_response(openapi, 404, "Post or user not found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /api/posts/{id}/comments
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/posts/{id}/comments")
        .operation_id("feed.list_comments")
        .summary("List comments of a post")
        .tag("posts")
        .path_param("id", "Post id")
        .handler(handlers::list_comments)
        .json_response_with_schema::<dto::CommentListDto>(openapi, 200, "Comments, oldest first")
        .problem_response(openapi, 404, "Post not found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/posts/{id}/comments
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/posts/{id}/comments")
        .operation_id("feed.add_comment")
        .summary("Comment on a post")
        .tag("posts")
        .path_param("id", "Post id")
        .json_request::<dto::CreateCommentReq>(openapi, "Comment")
        .handler(handlers::add_comment)
        .json_response_with_schema::<dto::CommentDto>(openapi, 201, "Comment created")
        .problem_response(openapi, 400, "Empty or overlong text")
        .problem_response(openapi, 403, "Bearer token belongs to another user")
        .problem_response(openapi, 404, "Post or user not found")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /api/stars
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/stars")
        .operation_id("feed.list_stars")
        .summary("List star profiles")
        .tag("stars")
        .handler(handlers::list_stars)
        .json_response_with_schema::<dto::StarListDto>(openapi, 200, "Stars")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/stars
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/stars")
        .operation_id("feed.create_star")
        .summary("Create a star profile")
        .tag("stars")
        .json_request::<dto::CreateStarReq>(openapi, "Star profile")
        .handler(handlers::create_star)
        .json_response_with_schema::<dto::StarDto>(openapi, 201, "Star created")
        .problem_response(openapi, 400, "Missing userName or email")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    if let Some(media) = media {
        router = router.nest_service(&media.prefix, ServeDir::new(media.dir));
    }

    Ok(router.layer(Extension(service)))
}
