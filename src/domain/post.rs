use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub author_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub likes: i64,
    pub liked_by: BTreeSet<Uuid>,
    pub comments: Vec<Comment>,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_admin_post: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub subject_category: SubjectCategory,
}

impl Post {
    /// Flip the like relationship for one user.
    ///
    /// Keeps `likes` equal to `liked_by.len()`; calling twice with the same
    /// user restores the previous state.
    pub fn toggle_like(&mut self, user_id: Uuid) {
        if self.liked_by.remove(&user_id) {
            self.likes -= 1;
        } else {
            self.liked_by.insert(user_id);
            self.likes += 1;
        }
    }

    /// Visible in listings and feeds: never rejected, and approved when the
    /// listing asks for approved posts only.
    pub fn matches(&self, approved_only: bool) -> bool {
        !self.is_rejected && (!approved_only || self.is_approved)
    }
}

/// Append-only child of exactly one post; never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectCategory {
    #[serde(rename = "Mathematics")]
    Mathematics,
    #[serde(rename = "Science")]
    Science,
    #[serde(rename = "Literature")]
    Literature,
    #[serde(rename = "History")]
    History,
    #[serde(rename = "Geography")]
    Geography,
    #[serde(rename = "English")]
    English,
    #[serde(rename = "Foreign Languages")]
    ForeignLanguages,
    #[serde(rename = "Art and Music")]
    ArtAndMusic,
    #[serde(rename = "Physical Education")]
    PhysicalEducation,
    #[serde(rename = "Computer Science")]
    ComputerScience,
    #[serde(rename = "Social Studies")]
    SocialStudies,
}

impl SubjectCategory {
    pub const ALL: [SubjectCategory; 11] = [
        Self::Mathematics,
        Self::Science,
        Self::Literature,
        Self::History,
        Self::Geography,
        Self::English,
        Self::ForeignLanguages,
        Self::ArtAndMusic,
        Self::PhysicalEducation,
        Self::ComputerScience,
        Self::SocialStudies,
    ];

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "Mathematics" => Some(Self::Mathematics),
            "Science" => Some(Self::Science),
            "Literature" => Some(Self::Literature),
            "History" => Some(Self::History),
            "Geography" => Some(Self::Geography),
            "English" => Some(Self::English),
            "Foreign Languages" => Some(Self::ForeignLanguages),
            "Art and Music" => Some(Self::ArtAndMusic),
            "Physical Education" => Some(Self::PhysicalEducation),
            "Computer Science" => Some(Self::ComputerScience),
            "Social Studies" => Some(Self::SocialStudies),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Mathematics => "Mathematics",
            Self::Science => "Science",
            Self::Literature => "Literature",
            Self::History => "History",
            Self::Geography => "Geography",
            Self::English => "English",
            Self::ForeignLanguages => "Foreign Languages",
            Self::ArtAndMusic => "Art and Music",
            Self::PhysicalEducation => "Physical Education",
            Self::ComputerScience => "Computer Science",
            Self::SocialStudies => "Social Studies",
        }
    }
}
