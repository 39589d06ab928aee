//! HTML views. Rendering itself is askama's job; handlers only fill these in.

use askama::Template;
use postboard_common::model::{
    Id,
    post::Post,
    user::{User, UserMarker},
};

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersPage {
    pub users: Vec<User>,
}

/// Create and edit share one form; `user` pre-fills it for edits.
#[derive(Template)]
#[template(path = "user_form.html")]
pub struct UserFormPage {
    pub user: Option<User>,
}

#[derive(Template)]
#[template(path = "posts.html")]
pub struct PostsPage {
    pub user: User,
    pub posts: Vec<Post>,
}

/// `user_id` is the owner the create form submits for; edits ignore it.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage {
    pub post: Option<Post>,
    pub user_id: Id<UserMarker>,
}
