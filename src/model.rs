use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{ValidateLength, ValidationError, ValidationErrors};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 5.0;
pub const MAX_COMMENT_LENGTH: u64 = 1000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    Reader,
    Administrator,
}

/// Variant-specific part of a user row.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Reader { codename: String },
    Administrator { uploaded_manga_count: i32 },
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(flatten)]
    pub role: Role,
}

impl User {
    pub fn kind(&self) -> UserKind {
        match self.role {
            Role::Reader { .. } => UserKind::Reader,
            Role::Administrator { .. } => UserKind::Administrator,
        }
    }

    pub fn codename(&self) -> Option<&str> {
        match &self.role {
            Role::Reader { codename } => Some(codename),
            Role::Administrator { .. } => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "manga_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MangaStatus {
    #[default]
    InProgress,
    Completed,
    OnHiatus,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manga {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: MangaStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub manga_id: i64,
    pub title: String,
    pub chapter_number: i32,
    pub page_count: i32,
    pub pages_read: i32,
    pub published_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MangaGenre {
    pub id: i64,
    pub manga_id: i64,
    pub genre_id: i64,
    pub is_primary: bool,
}

/// A genre as seen from one manga.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MangaGenreTag {
    pub manga_id: i64,
    pub genre_id: i64,
    pub name: String,
    pub is_primary: bool,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rating {
    pub id: i64,
    pub reader_id: i64,
    pub manga_id: i64,
    pub score: f64,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub reader_id: i64,
    pub manga_id: i64,
    pub body: String,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
}

/// Favorite flag and reading progress of one reader on one manga.
#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReaderManga {
    pub id: i64,
    pub reader_id: i64,
    pub manga_id: i64,
    pub favorited_at: Option<DateTime<Utc>>,
    pub progress: f64,
    pub last_chapter_read: i32,
}

impl ReaderManga {
    pub fn is_favorite(&self) -> bool {
        self.favorited_at.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MangaListItem {
    #[serde(flatten)]
    pub manga: Manga,
    pub genres: Vec<MangaGenreTag>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MangaDetails {
    #[serde(flatten)]
    pub manga: Manga,
    pub genres: Vec<MangaGenreTag>,
    pub chapters: Vec<Chapter>,
    pub rating: RatingSummary,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct MangaChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<MangaStatus>,
}

/// Reading progress in percent once `last_chapter_read` of `total_chapters` are read.
///
/// `None` when the manga has no chapters, so the caller keeps its previous value.
pub fn compute_progress(last_chapter_read: i32, total_chapters: i64) -> Option<f64> {
    if total_chapters <= 0 {
        return None;
    }

    let percent = f64::from(last_chapter_read) / total_chapters as f64 * 100.0;
    Some(round_two_decimals(percent.clamp(0.0, 100.0)))
}

pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn validate_score(score: f64) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        errors.add(
            "score",
            ValidationError::new("score_range")
                .with_message(Cow::from("Score must be between 0.0 and 5.0")),
        );
        return Err(errors);
    }

    Ok(())
}

pub fn validate_comment_body(body: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if !body.validate_length(Some(1), Some(MAX_COMMENT_LENGTH), None) {
        errors.add(
            "body",
            ValidationError::new("body_length")
                .with_message(Cow::from("Comment length must be between 1 and 1000")),
        );
        return Err(errors);
    }

    Ok(())
}

pub fn validate_genre_name(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if name.trim().is_empty() || !name.validate_length(Some(1), Some(100), None) {
        errors.add(
            "name",
            ValidationError::new("name_length")
                .with_message(Cow::from("Genre name length must be between 1 and 100")),
        );
        return Err(errors);
    }

    Ok(())
}

pub fn validate_pages_read(pages: i32, page_count: i32) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if pages < 0 || pages > page_count {
        errors.add(
            "pages",
            ValidationError::new("pages_range")
                .with_message(Cow::from("Pages read must be between 0 and the page count")),
        );
        return Err(errors);
    }

    Ok(())
}
