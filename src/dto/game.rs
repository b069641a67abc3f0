use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dao::models::GameEntity;

/// Form field carrying the game ids of a reorder, repeated in DOM order.
pub const REORDER_FIELD: &str = "game";

/// Public projection of a ranked game.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct GameView {
    pub id: i64,
    pub title: String,
    pub rank: i64,
}

impl From<GameEntity> for GameView {
    fn from(entity: GameEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            rank: entity.rank,
        }
    }
}

/// Raw add-game form as posted by the browser.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AddGameForm {
    pub title: Option<String>,
    pub rank: Option<String>,
}

impl AddGameForm {
    /// Read an urlencoded body leniently: unknown fields are ignored and the
    /// first occurrence of a repeated field wins.
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            let slot = match key.as_ref() {
                "title" => &mut form.title,
                "rank" => &mut form.rank,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        form
    }
}

/// Values echoed back into the add form after a failed submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OldInput {
    pub title: String,
    pub rank: String,
}

impl OldInput {
    pub fn new(title: &str, rank: &str) -> Self {
        Self {
            title: title.trim().to_owned(),
            rank: rank.to_owned(),
        }
    }
}

/// JSON scalar accepted wherever the HTML form would send text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(serde_json::Number),
    Text(String),
}

impl RawField {
    /// Textual form handed to the validation layer.
    pub fn into_raw(self) -> String {
        match self {
            RawField::Number(number) => number.to_string(),
            RawField::Text(text) => text,
        }
    }
}

/// JSON payload for adding a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddGameRequest {
    #[serde(default)]
    pub title: String,
    /// Target rank, as a number or a numeric string.
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub rank: Option<RawField>,
}

/// JSON payload for reordering every game at once.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// Game ids from top to bottom.
    #[serde(default)]
    #[schema(value_type = Vec<i64>)]
    pub ids: Vec<RawField>,
}

impl ReorderRequest {
    pub fn into_raw_ids(self) -> Vec<String> {
        self.ids.into_iter().map(RawField::into_raw).collect()
    }
}

/// Collect every `game` value of an urlencoded body, keeping submission order.
pub fn reorder_ids_from_form(body: &[u8]) -> Vec<String> {
    url::form_urlencoded::parse(body)
        .filter(|(key, _)| key == REORDER_FIELD)
        .map(|(_, value)| value.into_owned())
        .collect()
}
