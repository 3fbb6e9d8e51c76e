use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use manga_catalog::model::{Chapter, Comment, Rating, ReaderManga};
use serde_json::json;
use sqlx::PgPool;

use crate::{AppStateTest, authorized, insert_fake_chapters, insert_fake_manga, read_json};

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn reader_rates_a_manga(pool: PgPool) {
    let test_state = AppStateTest::new(pool);
    let (administrator, administrator_token) = test_state.generate_jwt_with_administrator().await;
    let (_, token) = test_state.generate_jwt_with_reader().await;
    let manga = insert_fake_manga(test_state.pool(), administrator.id).await;
    let uri = format!("/manga/{}/rating", manga.id);

    let request = authorized("PUT", &uri, &token, Some(json!({ "score": 10.0 })));
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = authorized(
        "PUT",
        &uri,
        &administrator_token,
        Some(json!({ "score": 4.0 })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = authorized("PUT", &uri, &token, Some(json!({ "score": 4.0 })));
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = authorized("PUT", &uri, &token, Some(json!({ "score": 2.5 })));
    let response = test_state.generate_response(request).await;
    let rating: Rating = read_json(response).await;
    assert_eq!(rating.score, 2.5);

    let request = Request::builder()
        .uri(format!("/manga/{}", manga.id))
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    let details: serde_json::Value = read_json(response).await;
    assert_eq!(details["rating"]["average"], 2.5);
    assert_eq!(details["rating"]["count"], 1);

    let request = authorized("DELETE", &uri, &token, None);
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = authorized("DELETE", &uri, &token, None);
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn reader_favourites_and_reads_chapters(pool: PgPool) {
    let test_state = AppStateTest::new(pool);
    let (administrator, _) = test_state.generate_jwt_with_administrator().await;
    let (_, token) = test_state.generate_jwt_with_reader().await;
    let manga = insert_fake_manga(test_state.pool(), administrator.id).await;
    let chapters = insert_fake_chapters(test_state.pool(), manga.id, 2).await;
    let favourite_uri = format!("/manga/{}/favourite", manga.id);

    let request = authorized("PUT", &favourite_uri, &token, None);
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let first: ReaderManga = read_json(response).await;

    let request = authorized("PUT", &favourite_uri, &token, None);
    let response = test_state.generate_response(request).await;
    let second: ReaderManga = read_json(response).await;
    assert_eq!(first.favorited_at, second.favorited_at);

    let request = authorized(
        "POST",
        &format!("/chapters/{}/read", chapters[1].id),
        &token,
        None,
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reading: ReaderManga = read_json(response).await;
    assert_eq!(reading.progress, 100.0);
    assert_eq!(reading.last_chapter_read, 2);

    let request = authorized(
        "PUT",
        &format!("/chapters/{}/pages", chapters[0].id),
        &token,
        Some(json!({ "pages": 21 })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = authorized(
        "PUT",
        &format!("/chapters/{}/pages", chapters[0].id),
        &token,
        Some(json!({ "pages": 12 })),
    );
    let response = test_state.generate_response(request).await;
    let chapter: Chapter = read_json(response).await;
    assert_eq!(chapter.pages_read, 12);

    let request = authorized("DELETE", &favourite_uri, &token, None);
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = authorized("GET", "/me/reading", &token, None);
    let response = test_state.generate_response(request).await;
    let reading_list: Vec<ReaderManga> = read_json(response).await;
    assert_eq!(reading_list.len(), 1);
    assert!(!reading_list[0].is_favorite());
    assert_eq!(reading_list[0].progress, 100.0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn comments_flow_through_readers_and_moderation(pool: PgPool) {
    let test_state = AppStateTest::new(pool);
    let (administrator, administrator_token) = test_state.generate_jwt_with_administrator().await;
    let (author, author_token) = test_state.generate_jwt_with_reader().await;
    let (_, other_token) = test_state.generate_jwt_with_reader().await;
    let manga = insert_fake_manga(test_state.pool(), administrator.id).await;

    let request = authorized(
        "POST",
        &format!("/manga/{}/comments", manga.id),
        &author_token,
        Some(json!({ "body": "x".repeat(1001) })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = authorized(
        "POST",
        &format!("/manga/{}/comments", manga.id),
        &author_token,
        Some(json!({ "body": "The eclipse chapter hurt" })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let comment: Comment = read_json(response).await;

    for _ in 0..2 {
        let request = authorized(
            "POST",
            &format!("/comments/{}/like", comment.id),
            &other_token,
            None,
        );
        let response = test_state.generate_response(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let request = authorized(
        "POST",
        &format!("/comments/{}/replies", comment.id),
        &other_token,
        Some(json!({ "body": "Same here" })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reply: Comment = read_json(response).await;
    assert_eq!(
        reply.body,
        format!("@{}: Same here", author.codename().unwrap())
    );

    let request = authorized(
        "PUT",
        &format!("/comments/{}", comment.id),
        &other_token,
        Some(json!({ "body": "Edited by someone else" })),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let request = authorized(
        "DELETE",
        &format!("/comments/{}", reply.id),
        &author_token,
        None,
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let request = authorized(
        "DELETE",
        &format!("/comments/{}", reply.id),
        &administrator_token,
        None,
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = Request::builder()
        .uri(format!("/manga/{}/comments", manga.id))
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    let comments: Vec<Comment> = read_json(response).await;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].likes, 2);
}
