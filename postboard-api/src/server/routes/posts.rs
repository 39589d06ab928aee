use crate::server::{
    Result, ServerError, ServerRouter,
    extract::{Form, Query},
    json::Json,
    views::PostFormPage,
};
use askama::Template;
use axum::{
    Router,
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::routing::{RouterExt, TypedPath};
use postboard_common::model::{
    Id,
    post::{CreatePost, PostMarker, PostWithAuthor, UpdatePost},
    user::UserMarker,
};
use postboard_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(posts_index)
        .typed_get(create_post_form)
        .typed_post(create_post)
        .typed_get(edit_post_form)
        .typed_post(update_post)
        .typed_post(delete_post)
}

fn user_posts_uri(user_id: Id<UserMarker>) -> String {
    format!("/users/{user_id}/posts/")
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/", rejection(ServerError))]
struct PostsIndexPath();

async fn posts_index(
    _: PostsIndexPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<PostWithAuthor>>> {
    let mut uow = db.begin().await?;
    let posts = uow.list_posts().await?;

    Ok(Json(posts))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create/", rejection(ServerError))]
struct CreatePostPath();

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct CreatePostParams {
    user_id: Id<UserMarker>,
}

async fn create_post_form(
    _: CreatePostPath,
    Query(params): Query<CreatePostParams>,
) -> Result<Html<String>> {
    let page = PostFormPage {
        post: None,
        user_id: params.user_id,
    };

    Ok(Html(page.render()?))
}

async fn create_post(
    _: CreatePostPath,
    State(db): State<Arc<DbClient>>,
    Form(post): Form<CreatePost>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    let post = uow.create_post(&post).await?;
    uow.commit().await?;

    Ok(Redirect::to(&user_posts_uri(post.user_id)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/edit/", rejection(ServerError))]
struct EditPostPath {
    id: Id<PostMarker>,
}

async fn edit_post_form(
    EditPostPath { id }: EditPostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Html<String>> {
    let mut uow = db.begin().await?;
    let post = uow
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    let page = PostFormPage {
        user_id: post.user_id,
        post: Some(post),
    };

    Ok(Html(page.render()?))
}

async fn update_post(
    EditPostPath { id }: EditPostPath,
    State(db): State<Arc<DbClient>>,
    Form(post): Form<UpdatePost>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    let post = uow.update_post(id, &post).await?;
    uow.commit().await?;

    Ok(Redirect::to(&user_posts_uri(post.user_id)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    let post = uow.delete_post(id).await?;
    uow.commit().await?;

    Ok(Redirect::to(&user_posts_uri(post.user_id)))
}
