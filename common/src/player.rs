use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_NICKNAME_LENGTH;

#[derive(Clone, Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct Player {
    pub nickname: String,
    pub score: u32,
}

impl Player {
    pub fn new(nickname: String) -> Self {
        Self { nickname, score: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NicknameError {
    Empty,
    TooLong,
    InvalidCharacter(char),
}

impl fmt::Display for NicknameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NicknameError::Empty => write!(f, "nickname cannot be empty"),
            NicknameError::TooLong => write!(f, "nickname is too long"),
            NicknameError::InvalidCharacter(c) => {
                write!(f, "nickname contains invalid character '{}'", c)
            }
        }
    }
}

impl std::error::Error for NicknameError {}

pub fn sanitize_nickname(input: &str) -> Result<String, NicknameError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(NicknameError::Empty);
    }

    if trimmed.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(NicknameError::TooLong);
    }

    if let Some(invalid) = trimmed
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_' && *ch != '-')
    {
        return Err(NicknameError::InvalidCharacter(invalid));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_players_start_with_zero_score() {
        let player = Player::new("Alice".to_string());
        assert_eq!(player.nickname, "Alice");
        assert_eq!(player.score, 0);
    }

    #[test]
    fn sanitize_rejects_empty_nicknames() {
        assert_eq!(sanitize_nickname("   "), Err(NicknameError::Empty));
    }

    #[test]
    fn sanitize_rejects_nicknames_that_are_too_long() {
        let long_name = "abcdefghijklmnopq"; // 17 characters.
        assert_eq!(sanitize_nickname(long_name), Err(NicknameError::TooLong));
    }

    #[test]
    fn sanitize_rejects_nicknames_with_invalid_characters() {
        assert_eq!(
            sanitize_nickname("player!"),
            Err(NicknameError::InvalidCharacter('!'))
        );
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize_nickname("  Carol-2  "), Ok("Carol-2".to_string()));
    }
}
