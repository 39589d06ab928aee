use postboard_common::model::post::{Post, PostWithAuthor};
use postboard_common::model::user::User;
use sqlx::FromRow;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct PostRecord {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// Row shape of the posts-joined-with-users listing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub struct PostWithAuthorRecord {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<UserRecord> for User {
    fn from(value: UserRecord) -> Self {
        Self {
            id: value.user_id.into(),
            username: value.username,
            email: value.email,
            password: value.password,
        }
    }
}

impl From<PostRecord> for Post {
    fn from(value: PostRecord) -> Self {
        Self {
            id: value.post_id.into(),
            title: value.title,
            content: value.content,
            user_id: value.user_id.into(),
        }
    }
}

impl From<PostWithAuthorRecord> for PostWithAuthor {
    fn from(value: PostWithAuthorRecord) -> Self {
        Self {
            id: value.post_id.into(),
            title: value.title,
            content: value.content,
            author: User {
                id: value.user_id.into(),
                username: value.username,
                email: value.email,
                password: value.password,
            },
        }
    }
}
