use crate::server::{
    Result, ServerError, ServerRouter,
    extract::Form,
    views::{PostsPage, UserFormPage, UsersPage},
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
    user::{CreateUser, UserMarker},
};
use postboard_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    Router::new()
        .typed_get(users_index)
        .typed_get(create_user_form)
        .typed_post(create_user)
        .typed_get(edit_user_form)
        .typed_post(update_user)
        .typed_post(delete_user)
        .typed_get(user_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/", rejection(ServerError))]
struct UsersIndexPath();

async fn users_index(
    _: UsersIndexPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Html<String>> {
    let mut uow = db.begin().await?;
    let users = uow.list_users().await?;

    Ok(Html(UsersPage { users }.render()?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/create/", rejection(ServerError))]
struct CreateUserPath();

async fn create_user_form(_: CreateUserPath) -> Result<Html<String>> {
    Ok(Html(UserFormPage { user: None }.render()?))
}

async fn create_user(
    _: CreateUserPath,
    State(db): State<Arc<DbClient>>,
    Form(user): Form<CreateUser>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    uow.create_user(&user).await?;
    uow.commit().await?;

    Ok(Redirect::to("/"))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/edit/", rejection(ServerError))]
struct EditUserPath {
    id: Id<UserMarker>,
}

async fn edit_user_form(
    EditUserPath { id }: EditUserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Html<String>> {
    let mut uow = db.begin().await?;
    let user = uow
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Html(UserFormPage { user: Some(user) }.render()?))
}

async fn update_user(
    EditUserPath { id }: EditUserPath,
    State(db): State<Arc<DbClient>>,
    Form(user): Form<CreateUser>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    uow.update_user(id, &user).await?;
    uow.commit().await?;

    Ok(Redirect::to("/"))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/", rejection(ServerError))]
struct UserPath {
    id: Id<UserMarker>,
}

async fn delete_user(
    UserPath { id }: UserPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Redirect> {
    let mut uow = db.begin().await?;
    uow.delete_user(id).await?;
    uow.commit().await?;

    Ok(Redirect::to("/"))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts/", rejection(ServerError))]
struct UserPostsPath {
    id: Id<UserMarker>,
}

async fn user_posts(
    UserPostsPath { id }: UserPostsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Html<String>> {
    let mut uow = db.begin().await?;
    let user = uow
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;
    let posts = uow.list_posts_by_user(id).await?;

    Ok(Html(PostsPage { user, posts }.render()?))
}
