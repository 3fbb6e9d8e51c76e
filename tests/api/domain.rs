use manga_catalog::{
    auth::error::AuthError,
    db::{
        chapter::remove_chapter,
        comment::{comment_on_manga, edit_comment, like_comment, reply_to_comment},
        error::DatabaseError,
        genre::{create_genre, delete_genre, rename_genre, tag_manga_genre, untag_manga_genre},
        manga::{NewManga, add_manga, get_manga_by_id, get_manga_details, remove_manga},
        rating::rate_manga,
        reader_manga::{get_reader_manga, mark_favorite, record_chapter_read, unmark_favorite},
        user::{
            NewUser, change_password, create_reader, get_user_by_id_optional, get_user_credential,
        },
    },
    error::Error,
    model::{MangaStatus, Role},
};
use sqlx::PgPool;

use crate::{
    FAKE_PASSWORD, insert_fake_administrator, insert_fake_chapters, insert_fake_manga,
    insert_fake_reader,
};

const RATINGS_OF_MANGA: &str = "SELECT COUNT(*) FROM ratings WHERE manga_id = $1";
const GENRE_BY_ID: &str = "SELECT COUNT(*) FROM genres WHERE id = $1";

async fn count(pool: &PgPool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn uploaded_manga_count(pool: &PgPool, administrator_id: i64) -> i32 {
    let user = get_user_by_id_optional(pool, administrator_id)
        .await
        .unwrap()
        .unwrap();

    match user.role {
        Role::Administrator {
            uploaded_manga_count,
        } => uploaded_manga_count,
        Role::Reader { .. } => panic!("expected an administrator"),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn out_of_range_score_is_rejected_without_a_row(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let result = rate_manga(&mut tx, reader.id, manga.id, 10.0).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    tx.commit().await.unwrap();

    let ratings = count(&pool, RATINGS_OF_MANGA, manga.id).await;
    assert_eq!(ratings, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn rating_twice_keeps_one_row_with_latest_score(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let first = rate_manga(&mut tx, reader.id, manga.id, 2.0).await.unwrap();
    let second = rate_manga(&mut tx, reader.id, manga.id, 4.5).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.score, 4.5);

    let ratings = count(&pool, RATINGS_OF_MANGA, manga.id).await;
    assert_eq!(ratings, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn rating_unknown_manga_is_not_found(pool: PgPool) {
    let reader = insert_fake_reader(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let result = rate_manga(&mut tx, reader.id, 404, 3.0).await;

    assert!(matches!(
        result,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn marking_favorite_twice_keeps_the_first_timestamp(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let first = mark_favorite(&mut tx, reader.id, manga.id).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let second = mark_favorite(&mut tx, reader.id, manga.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.favorited_at.is_some());
    assert_eq!(first.favorited_at, second.favorited_at);
    assert_eq!(second.progress, 0.0);

    let links = count(
        &pool,
        "SELECT COUNT(*) FROM reader_mangas WHERE manga_id = $1",
        manga.id,
    )
    .await;
    assert_eq!(links, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn unmarking_favorite_keeps_progress_and_ignores_missing_links(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;
    let chapters = insert_fake_chapters(&pool, manga.id, 2).await;

    let mut tx = pool.begin().await.unwrap();
    let missing = unmark_favorite(&mut tx, reader.id, manga.id).await.unwrap();
    assert!(missing.is_none());

    record_chapter_read(&mut tx, reader.id, chapters[0].id)
        .await
        .unwrap();
    let reading = unmark_favorite(&mut tx, reader.id, manga.id)
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();

    assert!(!reading.is_favorite());
    assert_eq!(reading.progress, 50.0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn reading_an_earlier_chapter_does_not_regress_progress(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;
    let chapters = insert_fake_chapters(&pool, manga.id, 4).await;

    let mut tx = pool.begin().await.unwrap();
    let after_third = record_chapter_read(&mut tx, reader.id, chapters[2].id)
        .await
        .unwrap();
    let after_first = record_chapter_read(&mut tx, reader.id, chapters[0].id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(after_third.last_chapter_read, 3);
    assert_eq!(after_third.progress, 75.0);
    assert_eq!(after_first.last_chapter_read, 3);
    assert_eq!(after_first.progress, after_third.progress);
    assert!(after_first.is_favorite());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn progress_is_rounded_to_two_decimals(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;
    let chapters = insert_fake_chapters(&pool, manga.id, 3).await;

    let mut tx = pool.begin().await.unwrap();
    let reading = record_chapter_read(&mut tx, reader.id, chapters[0].id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(reading.progress, 33.33);

    let stored = get_reader_manga(&pool, reader.id, manga.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored, reading);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn removing_manga_cascades_to_dependents(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let reader = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;
    insert_fake_chapters(&pool, manga.id, 2).await;

    let mut tx = pool.begin().await.unwrap();
    rate_manga(&mut tx, reader.id, manga.id, 4.0).await.unwrap();
    comment_on_manga(&mut tx, reader.id, manga.id, "Loved the first arc")
        .await
        .unwrap();
    mark_favorite(&mut tx, reader.id, manga.id).await.unwrap();
    let genre = create_genre(&mut tx, "Dark Fantasy").await.unwrap();
    tag_manga_genre(&mut tx, manga.id, genre.id, true)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(uploaded_manga_count(&pool, administrator.id).await, 1);

    let mut tx = pool.begin().await.unwrap();
    remove_manga(&mut tx, administrator.id, manga.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    for sql in [
        "SELECT COUNT(*) FROM chapters WHERE manga_id = $1",
        "SELECT COUNT(*) FROM ratings WHERE manga_id = $1",
        "SELECT COUNT(*) FROM comments WHERE manga_id = $1",
        "SELECT COUNT(*) FROM reader_mangas WHERE manga_id = $1",
        "SELECT COUNT(*) FROM manga_genres WHERE manga_id = $1",
    ] {
        assert_eq!(count(&pool, sql, manga.id).await, 0, "{}", sql);
    }

    assert_eq!(uploaded_manga_count(&pool, administrator.id).await, 0);
    assert_eq!(count(&pool, GENRE_BY_ID, genre.id).await, 1);
    assert!(matches!(
        get_manga_by_id(&pool, manga.id).await,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn chapter_changes_leave_uploaded_count_alone(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;
    let chapters = insert_fake_chapters(&pool, manga.id, 3).await;

    assert_eq!(uploaded_manga_count(&pool, administrator.id).await, 1);

    let mut tx = pool.begin().await.unwrap();
    remove_chapter(&mut tx, chapters[1].id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(uploaded_manga_count(&pool, administrator.id).await, 1);

    let details = get_manga_details(&pool, manga.id).await.unwrap();
    let numbers: Vec<i32> = details
        .chapters
        .iter()
        .map(|chapter| chapter.chapter_number)
        .collect();
    assert_eq!(numbers, vec![1, 3]);

    let mut tx = pool.begin().await.unwrap();
    let missing = remove_chapter(&mut tx, chapters[1].id).await;
    assert!(matches!(
        missing,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn untagging_removes_only_the_link(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let action = create_genre(&mut tx, "Action").await.unwrap();
    let drama = create_genre(&mut tx, "Drama").await.unwrap();
    tag_manga_genre(&mut tx, manga.id, action.id, true)
        .await
        .unwrap();
    tag_manga_genre(&mut tx, manga.id, drama.id, false)
        .await
        .unwrap();
    untag_manga_genre(&mut tx, manga.id, action.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let details = get_manga_details(&pool, manga.id).await.unwrap();
    assert_eq!(details.genres.len(), 1);
    assert_eq!(details.genres[0].genre_id, drama.id);
    assert_eq!(count(&pool, GENRE_BY_ID, action.id).await, 1);

    let mut tx = pool.begin().await.unwrap();
    let missing = untag_manga_genre(&mut tx, manga.id, action.id).await;
    assert!(matches!(
        missing,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn manga_lookups_report_unknown_ids_as_not_found(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let found = get_manga_by_id(&pool, manga.id).await.unwrap();
    assert_eq!(found, manga);

    let details = get_manga_details(&pool, manga.id).await.unwrap();
    assert_eq!(details.manga, manga);
    assert_eq!(details.rating.count, 0);

    assert!(matches!(
        get_manga_details(&pool, manga.id + 1).await,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn credential_lookup_returns_user_and_hash_together(pool: PgPool) {
    let reader = insert_fake_reader(&pool).await;

    let (user, password_hash) = get_user_credential(&pool, &reader.email)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user, reader);
    assert!(password_hash.starts_with("$argon2"));

    let unknown = get_user_credential(&pool, "nobody@localhost.dev")
        .await
        .unwrap();
    assert!(unknown.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn uploaded_count_never_drops_below_zero(pool: PgPool) {
    let owner = insert_fake_administrator(&pool).await;
    let other = insert_fake_administrator(&pool).await;
    let manga = insert_fake_manga(&pool, owner.id).await;

    let mut tx = pool.begin().await.unwrap();
    remove_manga(&mut tx, other.id, manga.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(uploaded_manga_count(&pool, owner.id).await, 1);
    assert_eq!(uploaded_manga_count(&pool, other.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn dropped_transaction_leaves_nothing_behind(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;

    {
        let mut tx = pool.begin().await.unwrap();
        add_manga(
            &mut tx,
            administrator.id,
            NewManga {
                title: "Vagabond".to_string(),
                author: "Takehiko Inoue".to_string(),
                status: MangaStatus::OnHiatus,
            },
        )
        .await
        .unwrap();
    }

    let mangas: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mangas")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(mangas, 0);
    assert_eq!(uploaded_manga_count(&pool, administrator.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn renaming_genre_onto_existing_name_is_a_constraint_violation(pool: PgPool) {
    let mut tx = pool.begin().await.unwrap();
    create_genre(&mut tx, "Action").await.unwrap();
    let romance = create_genre(&mut tx, "Romance").await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = pool.begin().await.unwrap();
    let result = rename_genre(&mut tx, romance.id, "Action").await;
    assert!(matches!(
        result,
        Err(Error::Database(DatabaseError::ConstraintViolation(_)))
    ));
    drop(tx);

    let mut tx = pool.begin().await.unwrap();
    let missing = rename_genre(&mut tx, 404, "Horror").await;
    assert!(matches!(
        missing,
        Err(Error::Database(DatabaseError::NotFound))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn deleting_genre_keeps_its_manga(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let genre = create_genre(&mut tx, "Seinen").await.unwrap();
    tag_manga_genre(&mut tx, manga.id, genre.id, true)
        .await
        .unwrap();
    delete_genre(&mut tx, genre.id).await.unwrap();
    tx.commit().await.unwrap();

    let details = get_manga_details(&pool, manga.id).await.unwrap();
    assert!(details.genres.is_empty());
    assert_eq!(details.manga.id, manga.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn duplicate_email_and_codename_are_constraint_violations(pool: PgPool) {
    let reader = insert_fake_reader(&pool).await;
    let codename = reader.codename().unwrap().to_string();

    let mut tx = pool.begin().await.unwrap();
    let same_email = create_reader(
        &mut tx,
        NewUser {
            email: reader.email.clone(),
            name: "Someone Else".to_string(),
            password: FAKE_PASSWORD.into(),
        },
        "fresh-codename".to_string(),
    )
    .await;
    assert!(matches!(
        same_email,
        Err(Error::Database(DatabaseError::ConstraintViolation(_)))
    ));
    drop(tx);

    let mut tx = pool.begin().await.unwrap();
    let same_codename = create_reader(
        &mut tx,
        NewUser {
            email: "fresh@localhost.dev".to_string(),
            name: "Someone Else".to_string(),
            password: FAKE_PASSWORD.into(),
        },
        codename,
    )
    .await;
    assert!(matches!(
        same_codename,
        Err(Error::Database(DatabaseError::ConstraintViolation(_)))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn comments_can_be_liked_replied_and_edited_by_their_author(pool: PgPool) {
    let administrator = insert_fake_administrator(&pool).await;
    let author = insert_fake_reader(&pool).await;
    let other = insert_fake_reader(&pool).await;
    let manga = insert_fake_manga(&pool, administrator.id).await;

    let mut tx = pool.begin().await.unwrap();
    let comment = comment_on_manga(&mut tx, author.id, manga.id, "Peak fiction")
        .await
        .unwrap();

    like_comment(&mut tx, comment.id).await.unwrap();
    let liked = like_comment(&mut tx, comment.id).await.unwrap();
    assert_eq!(liked.likes, 2);

    let reply = reply_to_comment(&mut tx, other.id, comment.id, "Agreed")
        .await
        .unwrap();
    assert_eq!(
        reply.body,
        format!("@{}: Agreed", author.codename().unwrap())
    );
    assert_eq!(reply.manga_id, manga.id);

    let edited = edit_comment(&mut tx, author.id, comment.id, "Peak fiction, truly")
        .await
        .unwrap();
    assert_eq!(edited.body, "Peak fiction, truly");

    let foreign_edit = edit_comment(&mut tx, other.id, comment.id, "Hijacked").await;
    assert!(matches!(
        foreign_edit,
        Err(Error::Database(DatabaseError::NotFound))
    ));

    let empty = comment_on_manga(&mut tx, author.id, manga.id, "").await;
    assert!(matches!(empty, Err(Error::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn changing_password_requires_the_current_one(pool: PgPool) {
    let reader = insert_fake_reader(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let result = change_password(
        &mut tx,
        reader.id,
        "not-the-password".into(),
        "new-password".into(),
    )
    .await;
    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::IncorrectCredential))
    ));
    drop(tx);

    let mut tx = pool.begin().await.unwrap();
    change_password(
        &mut tx,
        reader.id,
        FAKE_PASSWORD.into(),
        "new-password".into(),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
}
