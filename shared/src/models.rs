//! Shared data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::Error;

/// Color assigned to an entry when the client does not pick one.
pub const DEFAULT_COLOR: &str = "#3B82F6";

/// Mood categories a journal entry can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Excited,
    Calm,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 5] = [Mood::Happy, Mood::Sad, Mood::Excited, Mood::Calm, Mood::Angry];

    /// Stored value, also used as the label in analysis prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Calm => "calm",
            Mood::Angry => "angry",
        }
    }

    /// Human-facing label with emoji.
    pub fn display(&self) -> &'static str {
        match self {
            Mood::Happy => "😊 Happy",
            Mood::Sad => "😢 Sad",
            Mood::Excited => "🤩 Excited",
            Mood::Calm => "😌 Calm",
            Mood::Angry => "😖 Angry",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown mood: {}", s)))
    }
}

/// A single journal entry as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodEntry {
    pub id: Uuid,
    pub mood: Mood,
    pub note: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// Create mood request. Also used for full (PUT) updates.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodRequest {
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
    #[validate(length(min = 1, max = 7))]
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Partial (PATCH) update request; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMoodRequest {
    pub mood: Option<Mood>,
    pub note: Option<String>,
    #[validate(length(min = 1, max = 7))]
    pub color: Option<String>,
}

impl From<CreateMoodRequest> for UpdateMoodRequest {
    fn from(request: CreateMoodRequest) -> Self {
        Self {
            mood: Some(request.mood),
            note: Some(request.note),
            color: Some(request.color),
        }
    }
}

/// Mood API response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodResponse {
    pub id: String,
    pub mood: Mood,
    pub mood_display: &'static str,
    pub note: String,
    pub color: String,
    pub created_at: String,
}

impl From<MoodEntry> for MoodResponse {
    fn from(entry: MoodEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            mood: entry.mood,
            mood_display: entry.mood.display(),
            note: entry.note,
            color: entry.color,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Successful analysis payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub analysis: String,
    pub moods_analyzed: usize,
    pub model_used: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_and_display() {
        assert_eq!("calm".parse::<Mood>().unwrap(), Mood::Calm);
        assert!("bored".parse::<Mood>().is_err());
        assert_eq!(Mood::Angry.to_string(), "angry");
        assert_eq!(Mood::Excited.display(), "🤩 Excited");
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateMoodRequest = serde_json::from_str(r#"{"mood":"happy"}"#).unwrap();
        assert_eq!(request.mood, Mood::Happy);
        assert_eq!(request.note, "");
        assert_eq!(request.color, DEFAULT_COLOR);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_create_request_rejects_unknown_mood() {
        let result = serde_json::from_str::<CreateMoodRequest>(r#"{"mood":"bored"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_color_length_validated() {
        let request: CreateMoodRequest =
            serde_json::from_str(r##"{"mood":"sad","color":"#123456789"}"##).unwrap();
        assert!(request.validate().is_err());

        let update: UpdateMoodRequest = serde_json::from_str(r#"{"color":""}"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_mood_response_shape() {
        let entry = MoodEntry {
            id: Uuid::nil(),
            mood: Mood::Happy,
            note: "sunny".to_string(),
            color: "#FCD34D".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };
        let json = serde_json::to_value(MoodResponse::from(entry)).unwrap();
        assert_eq!(json["mood"], "happy");
        assert_eq!(json["moodDisplay"], "😊 Happy");
        assert_eq!(json["createdAt"], "2024-03-01T10:00:00+00:00");
    }
}
