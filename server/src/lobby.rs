use dashmap::DashMap;
use uuid::Uuid;

use common::cards::DeckId;
use common::player::Player;

use crate::error::GameError;

/// Pre-game gathering of players under a host. Options stay mutable until
/// the lobby is consumed by session creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lobby {
    pub id: String,
    pub host_nickname: String,
    pub players: Vec<Player>,
    pub answer_deck_ids: Vec<DeckId>,
    pub question_deck_ids: Vec<DeckId>,
    pub score_to_win: u32,
}

impl Lobby {
    fn new(host_nickname: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            host_nickname: host_nickname.to_string(),
            // The host joins their own lobby immediately.
            players: vec![Player::new(host_nickname.to_string())],
            answer_deck_ids: Vec::new(),
            question_deck_ids: Vec::new(),
            score_to_win: 0,
        }
    }

    pub fn has_player(&self, nickname: &str) -> bool {
        self.players.iter().any(|p| p.nickname == nickname)
    }
}

/// Concurrent registry of open lobbies. Lookups and removals for unrelated
/// lobbies never contend; mutation of one lobby happens under its map entry.
#[derive(Default)]
pub struct LobbyRegistry {
    lobbies: DashMap<String, Lobby>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_lobby(&self, host_nickname: &str) -> Lobby {
        let lobby = Lobby::new(host_nickname);
        self.lobbies.insert(lobby.id.clone(), lobby.clone());
        lobby
    }

    pub fn get(&self, lobby_id: &str) -> Option<Lobby> {
        self.lobbies.get(lobby_id).map(|entry| entry.value().clone())
    }

    pub fn set_options(
        &self,
        lobby_id: &str,
        score_to_win: u32,
        answer_deck_ids: Vec<DeckId>,
        question_deck_ids: Vec<DeckId>,
    ) -> Result<(), GameError> {
        let mut lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;
        lobby.score_to_win = score_to_win;
        lobby.answer_deck_ids = answer_deck_ids;
        lobby.question_deck_ids = question_deck_ids;
        Ok(())
    }

    /// Appends a new player and returns the updated roster.
    pub fn join(&self, lobby_id: &str, nickname: &str) -> Result<Vec<Player>, GameError> {
        let mut lobby = self
            .lobbies
            .get_mut(lobby_id)
            .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;
        if lobby.has_player(nickname) {
            return Err(GameError::NicknameTaken(nickname.to_string()));
        }
        lobby.players.push(Player::new(nickname.to_string()));
        Ok(lobby.players.clone())
    }

    /// Removes a player; a lobby left with no players is dropped entirely.
    pub fn leave(&self, lobby_id: &str, nickname: &str) -> Result<(), GameError> {
        let emptied = {
            let mut lobby = self
                .lobbies
                .get_mut(lobby_id)
                .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;
            lobby.players.retain(|p| p.nickname != nickname);
            lobby.players.is_empty()
        };
        if emptied {
            self.lobbies.remove(lobby_id);
        }
        Ok(())
    }

    /// Takes the lobby out of the registry; session creation consumes it.
    pub fn take(&self, lobby_id: &str) -> Option<Lobby> {
        self.lobbies.remove(lobby_id).map(|(_, lobby)| lobby)
    }

    /// Puts a previously taken lobby back, e.g. when session creation fails.
    pub fn restore(&self, lobby: Lobby) {
        self.lobbies.insert(lobby.id.clone(), lobby);
    }

    pub fn remove(&self, lobby_id: &str) -> bool {
        self.lobbies.remove(lobby_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_lobby_seats_the_host_as_first_player() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");

        assert_eq!(lobby.host_nickname, "Alice");
        assert_eq!(lobby.players.len(), 1);
        assert_eq!(lobby.players[0].nickname, "Alice");
        assert_eq!(lobby.score_to_win, 0);
        assert_eq!(registry.get(&lobby.id), Some(lobby));
    }

    #[test]
    fn each_lobby_gets_a_distinct_identifier() {
        let registry = LobbyRegistry::new();
        let first = registry.create_lobby("Alice");
        let second = registry.create_lobby("Alice");

        assert_ne!(first.id, second.id);
    }

    #[test]
    fn join_appends_a_player_and_returns_the_roster() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");

        let players = registry.join(&lobby.id, "Bob").expect("join should succeed");
        let names: Vec<&str> = players.iter().map(|p| p.nickname.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob"]);
    }

    #[test]
    fn join_rejects_a_taken_nickname() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");
        registry.join(&lobby.id, "Bob").expect("join should succeed");

        assert_eq!(
            registry.join(&lobby.id, "Bob"),
            Err(GameError::NicknameTaken("Bob".to_string()))
        );
    }

    #[test]
    fn join_fails_for_an_unknown_lobby() {
        let registry = LobbyRegistry::new();
        assert_eq!(
            registry.join("missing", "Bob"),
            Err(GameError::LobbyNotFound("missing".to_string()))
        );
    }

    #[test]
    fn set_options_replaces_the_selection() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");

        registry
            .set_options(&lobby.id, 5, vec![1, 2], vec![3])
            .expect("set_options should succeed");

        let updated = registry.get(&lobby.id).expect("lobby should still exist");
        assert_eq!(updated.score_to_win, 5);
        assert_eq!(updated.answer_deck_ids, [1, 2]);
        assert_eq!(updated.question_deck_ids, [3]);
    }

    #[test]
    fn leave_drops_an_emptied_lobby() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");
        registry.join(&lobby.id, "Bob").expect("join should succeed");

        registry
            .leave(&lobby.id, "Bob")
            .expect("leave should succeed");
        assert!(registry.get(&lobby.id).is_some());

        registry
            .leave(&lobby.id, "Alice")
            .expect("leave should succeed");
        assert!(registry.get(&lobby.id).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = LobbyRegistry::new();
        let lobby = registry.create_lobby("Alice");

        assert!(registry.remove(&lobby.id));
        assert!(!registry.remove(&lobby.id));
    }
}
