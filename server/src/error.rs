use thiserror::Error;

use common::player::NicknameError;

/// Everything that can go wrong inside the game engine. All variants are
/// local, recoverable conditions reported synchronously to the caller; none
/// of them may take down the process or touch another session's state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("lobby {0} not found")]
    LobbyNotFound(String),
    #[error("game session {0} not found")]
    SessionNotFound(String),
    #[error("nickname '{0}' is already taken in this lobby")]
    NicknameTaken(String),
    #[error("invalid nickname: {0}")]
    InvalidNickname(#[from] NicknameError),
    #[error("only the host can change lobby options")]
    NotHost,
    #[error("the card czar cannot submit answer cards")]
    CzarCannotSubmit,
    #[error("only the card czar can choose a winner")]
    NotCzar,
    #[error("player '{0}' is not part of this game")]
    PlayerNotFound(String),
    #[error("a submission must contain exactly one card, got {0}")]
    InvalidSubmissionCount(usize),
    #[error("the selected decks contain no {0} cards")]
    EmptyDeck(&'static str),
    #[error("the game is already over")]
    SessionFinished,
}

/// Coarse classification for transport layers that map failures onto status
/// codes or close reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    InvalidArgument,
    IllegalState,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::LobbyNotFound(_) | GameError::SessionNotFound(_) => ErrorKind::NotFound,
            GameError::NicknameTaken(_) => ErrorKind::Conflict,
            GameError::NotHost | GameError::CzarCannotSubmit | GameError::NotCzar => {
                ErrorKind::Forbidden
            }
            GameError::InvalidNickname(_)
            | GameError::PlayerNotFound(_)
            | GameError::InvalidSubmissionCount(_)
            | GameError::EmptyDeck(_) => ErrorKind::InvalidArgument,
            GameError::SessionFinished => ErrorKind::IllegalState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_follow_the_taxonomy() {
        assert_eq!(
            GameError::LobbyNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            GameError::NicknameTaken("Bob".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(GameError::CzarCannotSubmit.kind(), ErrorKind::Forbidden);
        assert_eq!(
            GameError::InvalidSubmissionCount(3).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(GameError::SessionFinished.kind(), ErrorKind::IllegalState);
    }

    #[test]
    fn nickname_errors_convert_into_game_errors() {
        let err: GameError = NicknameError::Empty.into();
        assert_eq!(err, GameError::InvalidNickname(NicknameError::Empty));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
