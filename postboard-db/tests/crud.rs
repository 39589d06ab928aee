//! CRUD tests against a real PostgreSQL instance.
//!
//! These connect to `DATABASE_URL` and run the migrations themselves. When the
//! variable is unset the tests pass without doing anything, so the suite can
//! run in environments without a database.

use postboard_common::model::post::{CreatePost, UpdatePost};
use postboard_common::model::user::CreateUser;
use postboard_db::client::{DbClient, DbError};
use std::time::{SystemTime, UNIX_EPOCH};

async fn connect() -> Option<DbClient> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set, skipping database test");
        return None;
    };

    let client = DbClient::connect(&url).await.unwrap();
    client.run_migrations().await.unwrap();
    Some(client)
}

/// Tests share one database, so every email has to be unique per run.
fn unique_email(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{tag}.{nanos}@example.com")
}

fn user(username: &str, email: String) -> CreateUser {
    CreateUser {
        username: username.to_owned(),
        email,
        password: "p".to_owned(),
    }
}

#[tokio::test]
async fn created_user_is_retrievable_by_id_and_email() {
    let Some(client) = connect().await else { return };
    let email = unique_email("retrievable");

    let mut uow = client.begin().await.unwrap();
    let created = uow.create_user(&user("a", email.clone())).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    let by_id = uow.fetch_user(created.id).await.unwrap().unwrap();
    let by_email = uow.fetch_user_by_email(&email).await.unwrap().unwrap();

    assert_eq!(by_id, created);
    assert_eq!(by_email, created);
    assert_eq!(by_id.username, "a");
}

#[tokio::test]
async fn duplicate_email_is_rejected_without_inserting() {
    let Some(client) = connect().await else { return };
    let email = unique_email("duplicate");

    let mut uow = client.begin().await.unwrap();
    let first = uow.create_user(&user("first", email.clone())).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    let err = uow
        .create_user(&user("second", email.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::EmailTaken(taken) if taken == email));
    drop(uow);

    let mut uow = client.begin().await.unwrap();
    let users = uow.list_users().await.unwrap();
    let with_email: Vec<_> = users.iter().filter(|u| u.email == email).collect();
    assert_eq!(with_email.len(), 1);
    assert_eq!(with_email[0].id, first.id);
}

#[tokio::test]
async fn post_for_missing_user_is_rejected() {
    let Some(client) = connect().await else { return };

    let bogus_user = i64::MAX.into();
    let post = CreatePost {
        title: "t".to_owned(),
        content: "c".to_owned(),
        user_id: bogus_user,
    };

    let mut uow = client.begin().await.unwrap();
    let err = uow.create_post(&post).await.unwrap_err();
    assert!(matches!(err, DbError::UserNotFound(id) if id == bogus_user));
    drop(uow);

    let mut uow = client.begin().await.unwrap();
    assert!(uow.list_posts_by_user(bogus_user).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_user_removes_only_their_posts() {
    let Some(client) = connect().await else { return };

    let mut uow = client.begin().await.unwrap();
    let doomed = uow
        .create_user(&user("doomed", unique_email("doomed")))
        .await
        .unwrap();
    let survivor = uow
        .create_user(&user("survivor", unique_email("survivor")))
        .await
        .unwrap();
    for n in 0..2 {
        uow.create_post(&CreatePost {
            title: format!("doomed {n}"),
            content: "c".to_owned(),
            user_id: doomed.id,
        })
        .await
        .unwrap();
    }
    let kept = uow
        .create_post(&CreatePost {
            title: "kept".to_owned(),
            content: "c".to_owned(),
            user_id: survivor.id,
        })
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    uow.delete_user(doomed.id).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    assert!(uow.fetch_user(doomed.id).await.unwrap().is_none());
    assert!(uow.list_posts_by_user(doomed.id).await.unwrap().is_empty());

    let surviving_posts = uow.list_posts_by_user(survivor.id).await.unwrap();
    assert_eq!(surviving_posts, vec![kept]);
}

#[tokio::test]
async fn deleting_a_missing_user_reports_not_found() {
    let Some(client) = connect().await else { return };

    let bogus_user = i64::MAX.into();
    let mut uow = client.begin().await.unwrap();
    let err = uow.delete_user(bogus_user).await.unwrap_err();
    assert!(matches!(err, DbError::UserNotFound(id) if id == bogus_user));
}

#[tokio::test]
async fn updating_a_missing_user_reports_not_found() {
    let Some(client) = connect().await else { return };

    let bogus_user = i64::MAX.into();
    let mut uow = client.begin().await.unwrap();
    let err = uow
        .update_user(bogus_user, &user("nobody", unique_email("missing.update")))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::UserNotFound(id) if id == bogus_user));
}

#[tokio::test]
async fn updating_a_missing_post_reports_not_found() {
    let Some(client) = connect().await else { return };

    let bogus_post = i64::MAX.into();
    let mut uow = client.begin().await.unwrap();
    let err = uow
        .update_post(
            bogus_post,
            &UpdatePost {
                title: "t".to_owned(),
                content: "c".to_owned(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::PostNotFound(id) if id == bogus_post));
}

#[tokio::test]
async fn deleting_a_missing_post_reports_not_found() {
    let Some(client) = connect().await else { return };

    let bogus_post = i64::MAX.into();
    let mut uow = client.begin().await.unwrap();
    let err = uow.delete_post(bogus_post).await.unwrap_err();
    assert!(matches!(err, DbError::PostNotFound(id) if id == bogus_post));
}

#[tokio::test]
async fn updating_a_post_touches_only_title_and_content() {
    let Some(client) = connect().await else { return };

    let mut uow = client.begin().await.unwrap();
    let author = uow
        .create_user(&user("author", unique_email("author")))
        .await
        .unwrap();
    let post = uow
        .create_post(&CreatePost {
            title: "before".to_owned(),
            content: "old".to_owned(),
            user_id: author.id,
        })
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    let updated = uow
        .update_post(
            post.id,
            &UpdatePost {
                title: "after".to_owned(),
                content: "new".to_owned(),
            },
        )
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(updated.id, post.id);
    assert_eq!(updated.user_id, post.user_id);
    assert_eq!(updated.title, "after");
    assert_eq!(updated.content, "new");
}

#[tokio::test]
async fn uncommitted_changes_roll_back() {
    let Some(client) = connect().await else { return };
    let email = unique_email("rollback");

    let mut uow = client.begin().await.unwrap();
    let created = uow.create_user(&user("ghost", email.clone())).await.unwrap();
    drop(uow);

    let mut uow = client.begin().await.unwrap();
    assert!(uow.fetch_user(created.id).await.unwrap().is_none());
    assert!(uow.fetch_user_by_email(&email).await.unwrap().is_none());
}

#[tokio::test]
async fn create_user_then_post_then_list() {
    let Some(client) = connect().await else { return };

    let mut uow = client.begin().await.unwrap();
    let author = uow
        .create_user(&user("a", unique_email("endtoend")))
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    uow.create_post(&CreatePost {
        title: "t".to_owned(),
        content: "c".to_owned(),
        user_id: author.id,
    })
    .await
    .unwrap();
    uow.commit().await.unwrap();

    let mut uow = client.begin().await.unwrap();
    let posts = uow.list_posts_by_user(author.id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "t");

    // The joined listing carries the owning user along.
    let joined = uow.list_posts().await.unwrap();
    let ours = joined
        .iter()
        .find(|p| p.id == posts[0].id)
        .expect("created post missing from joined listing");
    assert_eq!(ours.author, author);
}
