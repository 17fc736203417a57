//! Core background type definitions.
//!
//! Defines [`BackgroundKind`] (the three knowledge categories), [`BackgroundItem`]
//! (a stored record as handed to the ranker), and [`ScoredItem`] (an item
//! annotated with its similarity and final score during one ranking call).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three categories of background knowledge a book can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundKind {
    /// World rules, geography, factions, magic systems.
    Worldview,
    /// Character sheets: a name plus a description.
    Character,
    /// Text of previously written chapters.
    Chapter,
}

impl BackgroundKind {
    pub const ALL: [BackgroundKind; 3] = [Self::Worldview, Self::Character, Self::Chapter];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worldview => "worldview",
            Self::Character => "character",
            Self::Chapter => "chapter",
        }
    }

    /// Listing precedence in the final context block. Higher sorts first.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Worldview => 2,
            Self::Character => 1,
            Self::Chapter => 0,
        }
    }
}

impl std::fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackgroundKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "worldview" => Ok(Self::Worldview),
            "character" => Ok(Self::Character),
            "chapter" => Ok(Self::Chapter),
            _ => Err(format!("unknown background type: {s}")),
        }
    }
}

/// One unit of stored knowledge, read-only for the duration of a ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundItem {
    /// Opaque identifier owned by the store (UUID v7 for items we create).
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BackgroundKind,
    /// Free text. May be empty for characters that carry `name` + `description`.
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Items without an embedding never take part in ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// Creation time. `None` is ranked as if 30 days old.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl BackgroundItem {
    /// The text that should be sent to the embedding provider for this item.
    ///
    /// Characters with both a name and a description are embedded as
    /// `name：description`; everything else embeds its content.
    pub fn embedding_text(&self) -> String {
        match (self.kind, self.name.as_deref(), self.description.as_deref()) {
            (BackgroundKind::Character, Some(name), Some(desc)) if !desc.is_empty() => {
                format!("{name}：{desc}")
            }
            _ => self.content.clone(),
        }
    }
}

/// A [`BackgroundItem`] annotated with its ranking signals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: BackgroundItem,
    /// Raw cosine similarity against the query embedding.
    pub similarity: f64,
    /// `similarity × time weight × type weight`.
    pub score: f64,
}

impl ScoredItem {
    pub fn kind(&self) -> BackgroundKind {
        self.item.kind
    }

    /// Two scored records carry the same payload when everything but the
    /// store-assigned identity matches.
    ///
    /// `id` and the embedding vector are ignored, so the same note stored twice
    /// collapses even though each copy has its own row and vector.
    pub fn same_payload(&self, other: &ScoredItem) -> bool {
        self.score == other.score
            && self.item.kind == other.item.kind
            && self.item.content == other.item.content
            && self.item.name == other.item.name
            && self.item.description == other.item.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(name: Option<&str>, description: Option<&str>, content: &str) -> BackgroundItem {
        BackgroundItem {
            id: "c1".into(),
            kind: BackgroundKind::Character,
            content: content.into(),
            name: name.map(String::from),
            description: description.map(String::from),
            embedding: None,
            created_at: None,
        }
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in BackgroundKind::ALL {
            assert_eq!(kind.as_str().parse::<BackgroundKind>().unwrap(), kind);
        }
        assert!("outline".parse::<BackgroundKind>().is_err());
    }

    #[test]
    fn precedence_orders_worldview_character_chapter() {
        assert!(BackgroundKind::Worldview.precedence() > BackgroundKind::Character.precedence());
        assert!(BackgroundKind::Character.precedence() > BackgroundKind::Chapter.precedence());
    }

    #[test]
    fn character_embedding_text_prefers_name_and_description() {
        let item = character(Some("林远"), Some("沉默的剑客"), "");
        assert_eq!(item.embedding_text(), "林远：沉默的剑客");

        let item = character(Some("林远"), None, "剑客，二十岁");
        assert_eq!(item.embedding_text(), "剑客，二十岁");
    }

    #[test]
    fn item_deserializes_with_type_key() {
        let json = r#"{"id":"w1","type":"worldview","content":"九州大陆"}"#;
        let item: BackgroundItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, BackgroundKind::Worldview);
        assert!(item.embedding.is_none());
        assert!(item.created_at.is_none());
    }

    #[test]
    fn same_payload_ignores_id_and_vector_but_not_score() {
        let scored = |id: &str, embedding: Vec<f32>, score: f64| ScoredItem {
            item: BackgroundItem {
                id: id.into(),
                embedding: Some(embedding),
                ..character(Some("林远"), Some("沉默的剑客"), "")
            },
            similarity: 0.9,
            score,
        };

        let a = scored("a", vec![1.0, 0.0], 1.5);
        assert!(a.same_payload(&scored("b", vec![0.0, 1.0], 1.5)));
        assert!(!a.same_payload(&scored("a", vec![1.0, 0.0], 1.4)));
    }
}
