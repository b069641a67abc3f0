//! Validation helpers shared by the add and reorder flows.
//!
//! Everything here is pure: checks return a [`ValidationError`] carrying a
//! machine code and a message, and [`FieldErrors`] gathers them per field so a
//! form can be redisplayed with every problem at once.

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationError;

/// Minimum number of characters in a trimmed game title.
pub const TITLE_MIN_CHARS: usize = 3;
/// Key for errors that concern the whole form rather than one field.
pub const FORM_FIELD: &str = "_form";

/// Field name to message map, kept in the order errors were reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(IndexMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` under `field`, replacing any earlier entry for that field.
    pub fn add(&mut self, field: &str, error: ValidationError) {
        self.0.insert(field.to_owned(), message_of(error));
    }

    /// Record a plain message under `field`.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_owned(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }

    /// Collect the outcome of a check under `field`, passing the value through.
    pub fn check<T>(&mut self, field: &str, outcome: Result<T, ValidationError>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                self.add(field, error);
                None
            }
        }
    }
}

/// Human message of `error`, falling back to its code.
pub fn message_of(error: ValidationError) -> String {
    error
        .message
        .map(|message| message.into_owned())
        .unwrap_or_else(|| error.code.into_owned())
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Trim surrounding whitespace from a submitted title.
pub fn normalize_title(raw: &str) -> String {
    raw.trim().to_owned()
}

/// Validates an already normalized title.
///
/// # Examples
///
/// ```ignore
/// validate_title("Chess") // Ok
/// validate_title("")      // Err - required
/// validate_title("ab")    // Err - too short
/// ```
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        return Err(error("title_required", "Title is required.".into()));
    }

    if title.chars().count() < TITLE_MIN_CHARS {
        return Err(error(
            "title_length",
            format!("The title must be at least {TITLE_MIN_CHARS} characters long."),
        ));
    }

    Ok(())
}

/// Parse a base-10 integer, ignoring surrounding whitespace.
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Parse the raw rank field of the add form.
pub fn parse_rank(raw: &str) -> Result<i64, ValidationError> {
    parse_integer(raw).ok_or_else(|| error("rank_number", "Rank must be a number.".into()))
}

/// A new game may take any occupied slot or the one right after the last game.
pub fn validate_rank_bounds(rank: i64, max_rank: i64) -> Result<(), ValidationError> {
    let upper = max_rank + 1;
    if rank < 1 || rank > upper {
        return Err(error(
            "rank_range",
            format!("Rank must be between 1 and {upper}."),
        ));
    }
    Ok(())
}

/// Parse one submitted game identifier.
pub fn parse_game_id(raw: &str) -> Result<i64, ValidationError> {
    parse_integer(raw).ok_or_else(|| error("game_id", format!("Invalid game id `{raw}`.")))
}
