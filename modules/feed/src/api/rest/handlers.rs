use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Request},
    http::{header, StatusCode},
    response::Json,
    Extension,
};
use modkit::{ProblemResponse, RequestCtx};
use uuid::Uuid;

use crate::api::rest::dto::{
    CommentDto, CommentListDto, CreateCommentReq, CreatePostReq, CreateStarReq, LikeReq, PostDto,
    PostListDto, StarDto, StarListDto,
};
use crate::api::rest::error::{bad_request, map_domain_error};
use crate::domain::model::{MediaUpload, NewPost};
use crate::domain::service::Service;

/// All posts, newest first
pub async fn list_posts(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
) -> Result<Json<PostListDto>, ProblemResponse> {
    let viewer = svc.viewer(ctx.bearer_token()).await;
    let posts = svc
        .list_posts(viewer)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(PostListDto(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// Create a post from a JSON body or a multipart form with an image file
pub async fn create_post(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    req: Request,
) -> Result<(StatusCode, Json<PostDto>), ProblemResponse> {
    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"));

    let input = if is_multipart {
        let multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| bad_request(&ctx, e.body_text()))?;
        read_post_form(multipart, &ctx).await?
    } else {
        let Json(body) = Json::<CreatePostReq>::from_request(req, &())
            .await
            .map_err(|e| bad_request(&ctx, e.body_text()))?;
        NewPost {
            user_id: body.user_id,
            caption: body.caption,
            image_url: body.image_url,
            upload: None,
        }
    };

    let post = svc
        .create_post(ctx.bearer_token(), input)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

async fn read_post_form(mut form: Multipart, ctx: &RequestCtx) -> Result<NewPost, ProblemResponse> {
    let mut caption = String::new();
    let mut user_id = None;
    let mut image_url = None;
    let mut upload = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| bad_request(ctx, e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "caption" => {
                caption = field
                    .text()
                    .await
                    .map_err(|e| bad_request(ctx, e.body_text()))?;
            }
            "userId" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| bad_request(ctx, e.body_text()))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| bad_request(ctx, "userId must be a UUID"))?;
                user_id = Some(id);
            }
            "imageUrl" => {
                image_url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| bad_request(ctx, e.body_text()))?,
                );
            }
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(ctx, e.body_text()))?;
                // browsers send an empty part when no file was picked
                if !bytes.is_empty() {
                    upload = Some(MediaUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| bad_request(ctx, "userId is required"))?;
    Ok(NewPost {
        user_id,
        caption,
        image_url,
        upload,
    })
}

/// Toggle the like of `userId` on a post
pub async fn toggle_like(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Path(id): Path<Uuid>,
    Json(req): Json<LikeReq>,
) -> Result<Json<PostDto>, ProblemResponse> {
    let post = svc
        .toggle_like(ctx.bearer_token(), id, req.user_id)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(post.into()))
}

pub async fn list_comments(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Path(id): Path<Uuid>,
) -> Result<Json<CommentListDto>, ProblemResponse> {
    let comments = svc
        .list_comments(id)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(CommentListDto(
        comments.into_iter().map(CommentDto::from).collect(),
    )))
}

pub async fn add_comment(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateCommentReq>,
) -> Result<(StatusCode, Json<CommentDto>), ProblemResponse> {
    let comment = svc
        .add_comment(ctx.bearer_token(), id, req.user_id, &req.text)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn list_stars(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
) -> Result<Json<StarListDto>, ProblemResponse> {
    let stars = svc
        .list_stars()
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(StarListDto(
        stars.into_iter().map(StarDto::from).collect(),
    )))
}

pub async fn create_star(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Json(req): Json<CreateStarReq>,
) -> Result<(StatusCode, Json<StarDto>), ProblemResponse> {
    let star = svc
        .create_star(req.into())
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok((StatusCode::CREATED, Json(star.into())))
}
