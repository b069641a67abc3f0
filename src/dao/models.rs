use serde::{Deserialize, Serialize};

/// A ranked game row as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameEntity {
    /// Store-assigned identifier, never reused.
    pub id: i64,
    /// Trimmed display title.
    pub title: String,
    /// 1-based position in the ranking.
    pub rank: i64,
}

/// Demo user row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
}

/// User payload before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub age: Option<i64>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age: Some(age),
        }
    }
}

/// First game, in rank order, whose rank is not its 1-based position.
///
/// `None` means the ranks read exactly `1..=len`.
pub fn first_rank_gap(games: &[GameEntity]) -> Option<&GameEntity> {
    games
        .iter()
        .enumerate()
        .find(|(index, game)| game.rank != *index as i64 + 1)
        .map(|(_, game)| game)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(id: i64, rank: i64) -> GameEntity {
        GameEntity {
            id,
            title: format!("Game {id}"),
            rank,
        }
    }

    #[test]
    fn test_dense_ranks() {
        assert!(first_rank_gap(&[]).is_none());
        assert!(first_rank_gap(&[game(4, 1), game(2, 2), game(9, 3)]).is_none());
    }

    #[test]
    fn test_rank_gap_and_duplicate_are_reported() {
        let gap = [game(1, 1), game(2, 3)];
        assert_eq!(first_rank_gap(&gap).map(|game| game.rank), Some(3));

        let duplicate = [game(1, 1), game(2, 1)];
        assert_eq!(first_rank_gap(&duplicate).map(|game| game.id), Some(2));
    }
}
