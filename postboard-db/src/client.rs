use crate::record::{PostRecord, PostWithAuthorRecord, UserRecord};
use postboard_common::model::{
    Id,
    post::{CreatePost, Post, PostMarker, PostWithAuthor, UpdatePost},
    user::{CreateUser, User, UserMarker},
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction, query, query_as};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("User with this email already exists: {0}")]
    EmailTaken(String),
    #[error("User with id {0} was not found")]
    UserNotFound(Id<UserMarker>),
    #[error("Post with id {0} was not found")]
    PostNotFound(Id<PostMarker>),
    #[error("Error running migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Brings the `users` and `posts` tables up to date. Run once at startup,
    /// before the listener binds.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    /// Opens the unit of work for one request. Everything done through it is
    /// invisible to other sessions until [`UnitOfWork::commit`]; dropping it
    /// without committing rolls the changes back.
    pub async fn begin(&self) -> Result<UnitOfWork<'_>> {
        let tx = self.pool.begin().await?;
        Ok(UnitOfWork { tx })
    }
}

/// A single request-scoped transaction carrying every data-access operation.
pub struct UnitOfWork<'c> {
    tx: Transaction<'c, Postgres>,
}

impl UnitOfWork<'_> {
    pub async fn fetch_user(&mut self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_id, username, email, password
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record.map(User::from))
    }

    pub async fn fetch_user_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT user_id, username, email, password
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record.map(User::from))
    }

    pub async fn list_users(&mut self) -> Result<Vec<User>> {
        let records = query_as::<_, UserRecord>(
            "
            SELECT user_id, username, email, password
            FROM users
            ORDER BY user_id
            ",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(records.into_iter().map(User::from).collect())
    }

    /// Fails with [`DbError::EmailTaken`] if a user with the email already
    /// exists. The check and the insert are only atomic within this unit of
    /// work; two concurrent creates with the same email can both pass.
    pub async fn create_user(&mut self, user: &CreateUser) -> Result<User> {
        if self.fetch_user_by_email(&user.email).await?.is_some() {
            return Err(DbError::EmailTaken(user.email.clone()));
        }

        let record = query_as::<_, UserRecord>(
            "
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING user_id, username, email, password
            ",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(record.into())
    }

    /// Overwrites every field of the user unconditionally.
    pub async fn update_user(
        &mut self,
        user_id: Id<UserMarker>,
        user: &CreateUser,
    ) -> Result<User> {
        let record = query_as::<_, UserRecord>(
            "
            UPDATE users
            SET username = $2, email = $3, password = $4
            WHERE user_id = $1
            RETURNING user_id, username, email, password
            ",
        )
        .bind(user_id.get())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_optional(&mut *self.tx)
        .await?;

        record.map(User::from).ok_or(DbError::UserNotFound(user_id))
    }

    /// Deletes the user and every post they own within this unit of work.
    pub async fn delete_user(&mut self, user_id: Id<UserMarker>) -> Result<()> {
        if self.fetch_user(user_id).await?.is_none() {
            return Err(DbError::UserNotFound(user_id));
        }

        query("DELETE FROM posts WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&mut *self.tx)
            .await?;
        query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.get())
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    pub async fn fetch_post(&mut self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(
            "
            SELECT post_id, title, content, user_id
            FROM posts
            WHERE post_id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(record.map(Post::from))
    }

    /// Every post, each joined with its owning user.
    pub async fn list_posts(&mut self) -> Result<Vec<PostWithAuthor>> {
        let records = query_as::<_, PostWithAuthorRecord>(
            "
            SELECT
                posts.post_id, posts.title, posts.content,
                users.user_id, users.username, users.email, users.password
            FROM posts JOIN users ON posts.user_id = users.user_id
            ORDER BY posts.post_id
            ",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(records.into_iter().map(PostWithAuthor::from).collect())
    }

    pub async fn list_posts_by_user(&mut self, user_id: Id<UserMarker>) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(
            "
            SELECT post_id, title, content, user_id
            FROM posts
            WHERE user_id = $1
            ORDER BY post_id
            ",
        )
        .bind(user_id.get())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(records.into_iter().map(Post::from).collect())
    }

    /// Fails with [`DbError::UserNotFound`] if the owning user does not exist.
    pub async fn create_post(&mut self, post: &CreatePost) -> Result<Post> {
        if self.fetch_user(post.user_id).await?.is_none() {
            return Err(DbError::UserNotFound(post.user_id));
        }

        let record = query_as::<_, PostRecord>(
            "
            INSERT INTO posts (title, content, user_id)
            VALUES ($1, $2, $3)
            RETURNING post_id, title, content, user_id
            ",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.user_id.get())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(record.into())
    }

    /// Replaces the post's title and content; id and owner are untouched.
    pub async fn update_post(
        &mut self,
        post_id: Id<PostMarker>,
        post: &UpdatePost,
    ) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            "
            UPDATE posts
            SET title = $2, content = $3
            WHERE post_id = $1
            RETURNING post_id, title, content, user_id
            ",
        )
        .bind(post_id.get())
        .bind(&post.title)
        .bind(&post.content)
        .fetch_optional(&mut *self.tx)
        .await?;

        record.map(Post::from).ok_or(DbError::PostNotFound(post_id))
    }

    /// Deletes the post, returning it so callers still know its owner.
    pub async fn delete_post(&mut self, post_id: Id<PostMarker>) -> Result<Post> {
        let record = query_as::<_, PostRecord>(
            "
            DELETE FROM posts
            WHERE post_id = $1
            RETURNING post_id, title, content, user_id
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        record.map(Post::from).ok_or(DbError::PostNotFound(post_id))
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
