use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::info;

use common::cards::{AnswerCard, DeckId, PromptCard};
use common::player::Player;

use crate::error::GameError;
use crate::lobby::Lobby;
use crate::round::Round;
use crate::shuffle::GameRng;

/// Where cards come from. The engine calls this once per selected deck at
/// session creation; an unknown deck id yields no cards.
pub trait DeckSource: Send + Sync {
    fn answer_cards(&self, deck_id: DeckId) -> Vec<AnswerCard>;
    fn prompt_cards(&self, deck_id: DeckId) -> Vec<PromptCard>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GamePhase {
    AwaitingPlayers,
    RoundActive,
    RoundResolving,
    Finished,
}

/// One running game. All mutation goes through the session's exclusive
/// critical section (see [`SessionRegistry::with_session`]); the deck
/// snapshots are immutable after creation and only feed queue reloads.
pub struct GameSession {
    pub id: String,
    pub score_to_win: u32,
    pub players: Vec<Player>,
    pub hands: HashMap<String, Vec<AnswerCard>>,
    pub current_prompt: PromptCard,
    pub czar: String,
    pub round: Round,
    pub phase: GamePhase,
    pub(crate) answer_queue: VecDeque<AnswerCard>,
    pub(crate) prompt_queue: VecDeque<PromptCard>,
    pub(crate) answer_deck: Vec<AnswerCard>,
    pub(crate) prompt_deck: Vec<PromptCard>,
    pub(crate) rng: GameRng,
}

impl GameSession {
    /// Snapshots a finalized lobby into a fully constructed session: decks
    /// concatenated and shuffled, players sorted by nickname for a stable
    /// display order, first prompt drawn, initial czar picked at random.
    pub fn from_lobby(
        lobby: &Lobby,
        decks: &dyn DeckSource,
        mut rng: GameRng,
    ) -> Result<Self, GameError> {
        let mut answer_deck: Vec<AnswerCard> = lobby
            .answer_deck_ids
            .iter()
            .flat_map(|deck_id| decks.answer_cards(*deck_id))
            .collect();
        let mut prompt_deck: Vec<PromptCard> = lobby
            .question_deck_ids
            .iter()
            .flat_map(|deck_id| decks.prompt_cards(*deck_id))
            .collect();

        if answer_deck.is_empty() {
            return Err(GameError::EmptyDeck("answer"));
        }
        if prompt_deck.is_empty() {
            return Err(GameError::EmptyDeck("prompt"));
        }

        rng.shuffle(&mut answer_deck);
        rng.shuffle(&mut prompt_deck);

        let mut players = lobby.players.clone();
        players.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        let czar = players[rng.pick_index(players.len())].nickname.clone();

        let answer_queue: VecDeque<AnswerCard> = answer_deck.iter().cloned().collect();
        let mut prompt_queue: VecDeque<PromptCard> = prompt_deck.iter().cloned().collect();
        let current_prompt = prompt_queue
            .pop_front()
            .ok_or(GameError::EmptyDeck("prompt"))?;

        Ok(Self {
            id: lobby.id.clone(),
            score_to_win: lobby.score_to_win,
            players,
            hands: HashMap::new(),
            current_prompt,
            czar,
            round: Round::new(),
            phase: GamePhase::AwaitingPlayers,
            answer_queue,
            prompt_queue,
            answer_deck,
            prompt_deck,
            rng,
        })
    }
}

/// Concurrent registry of running sessions: a sharded map of per-session
/// mutexes, so operations on different sessions never contend and one
/// session's operations linearize.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Mutex<GameSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a fully constructed session, replacing any prior session
    /// stored under the same key.
    pub fn insert(&self, session: GameSession) -> Arc<Mutex<GameSession>> {
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Mutex<GameSession>>> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Runs `f` as the session's exclusive critical section: read state,
    /// decide, mutate, decide what to broadcast. The map shard is released
    /// before the session lock is taken, so a long round operation never
    /// blocks registry lookups for other sessions.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut GameSession) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let handle = self
            .get(session_id)
            .ok_or_else(|| GameError::SessionNotFound(session_id.to_string()))?;
        let mut session = handle.lock();
        f(&mut session)
    }

    /// Terminal removal; later operations fail with `SessionNotFound`.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            info!(session = session_id, "game session removed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{answer_cards, prompt_cards, InMemoryDecks};

    fn lobby_with_decks() -> Lobby {
        Lobby {
            id: "lobby-1".to_string(),
            host_nickname: "Carol".to_string(),
            players: vec![
                Player::new("Carol".to_string()),
                Player::new("Alice".to_string()),
                Player::new("Bob".to_string()),
            ],
            answer_deck_ids: vec![1],
            question_deck_ids: vec![1],
            score_to_win: 3,
        }
    }

    fn decks(answer_count: u32, prompt_count: u32) -> InMemoryDecks {
        let mut decks = InMemoryDecks::new();
        decks.add_answer_deck(1, answer_cards(1..=answer_count));
        decks.add_prompt_deck(1, prompt_cards(1..=prompt_count, 1));
        decks
    }

    #[test]
    fn from_lobby_sorts_players_by_nickname() {
        let session = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");

        let names: Vec<&str> = session.players.iter().map(|p| p.nickname.as_str()).collect();
        assert_eq!(names, ["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn from_lobby_picks_the_czar_from_the_players() {
        let session = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");

        assert!(session.players.iter().any(|p| p.nickname == session.czar));
    }

    #[test]
    fn from_lobby_draws_the_first_prompt() {
        let session = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");

        assert_eq!(session.prompt_queue.len(), session.prompt_deck.len() - 1);
        assert!(!session
            .prompt_queue
            .iter()
            .any(|prompt| prompt.id == session.current_prompt.id));
    }

    #[test]
    fn from_lobby_queues_are_permutations_of_the_decks() {
        let session = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");

        let mut queued: Vec<u32> = session.answer_queue.iter().map(|c| c.id).collect();
        queued.sort_unstable();
        let mut deck: Vec<u32> = session.answer_deck.iter().map(|c| c.id).collect();
        deck.sort_unstable();
        assert_eq!(queued, deck);
    }

    #[test]
    fn from_lobby_rejects_empty_selections() {
        let lobby = lobby_with_decks();

        let mut no_answers = InMemoryDecks::new();
        no_answers.add_prompt_deck(1, prompt_cards(1..=5, 1));
        assert_eq!(
            GameSession::from_lobby(&lobby, &no_answers, GameRng::seeded(1)).err(),
            Some(GameError::EmptyDeck("answer"))
        );

        let mut no_prompts = InMemoryDecks::new();
        no_prompts.add_answer_deck(1, answer_cards(1..=5));
        assert_eq!(
            GameSession::from_lobby(&lobby, &no_prompts, GameRng::seeded(1)).err(),
            Some(GameError::EmptyDeck("prompt"))
        );
    }

    #[test]
    fn with_session_fails_for_unknown_ids() {
        let registry = SessionRegistry::new();
        let result = registry.with_session("missing", |_session| Ok(()));
        assert_eq!(
            result,
            Err(GameError::SessionNotFound("missing".to_string()))
        );
    }

    #[test]
    fn remove_is_idempotent_and_terminal() {
        let registry = SessionRegistry::new();
        let session = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");
        registry.insert(session);

        assert!(registry.remove("lobby-1"));
        assert!(!registry.remove("lobby-1"));
        assert!(registry.get("lobby-1").is_none());
    }

    #[test]
    fn insert_replaces_a_session_with_the_same_key() {
        let registry = SessionRegistry::new();
        let first = GameSession::from_lobby(&lobby_with_decks(), &decks(20, 5), GameRng::seeded(1))
            .expect("session should build");
        let second = GameSession::from_lobby(&lobby_with_decks(), &decks(30, 5), GameRng::seeded(2))
            .expect("session should build");

        registry.insert(first);
        registry.insert(second);

        let handle = registry.get("lobby-1").expect("session should exist");
        assert_eq!(handle.lock().answer_deck.len(), 30);
    }
}
