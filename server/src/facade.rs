use std::sync::Arc;

use tracing::info;

use common::cards::{CardId, DeckId};
use common::player::{sanitize_nickname, Player};
use common::protocol::{Audience, ClientCommand, Outcome, ServerMessage};

use crate::error::GameError;
use crate::lobby::LobbyRegistry;
use crate::round::WinnerOutcome;
use crate::session::{DeckSource, GameSession, SessionRegistry};
use crate::shuffle::GameRng;

pub type RngFactory = Box<dyn Fn() -> GameRng + Send + Sync>;

/// The boundary the transport calls into. Translates commands into registry
/// and round-engine operations, enforces host/czar authorization, and tags
/// every produced message with its audience. Failed operations produce no
/// broadcasts.
pub struct GameService {
    lobbies: LobbyRegistry,
    sessions: SessionRegistry,
    decks: Arc<dyn DeckSource>,
    rng_factory: RngFactory,
}

impl GameService {
    pub fn new(decks: Arc<dyn DeckSource>) -> Self {
        Self::with_rng_factory(decks, Box::new(GameRng::new))
    }

    /// Tests inject a seeded factory here to make shuffles reproducible.
    pub fn with_rng_factory(decks: Arc<dyn DeckSource>, rng_factory: RngFactory) -> Self {
        Self {
            lobbies: LobbyRegistry::new(),
            sessions: SessionRegistry::new(),
            decks,
            rng_factory,
        }
    }

    pub fn handle(&self, command: ClientCommand) -> Result<Outcome, GameError> {
        match command {
            ClientCommand::CreateLobby { host_nickname } => self.create_lobby(&host_nickname),
            ClientCommand::JoinLobby { lobby_id, nickname } => {
                self.join_lobby(&lobby_id, &nickname)
            }
            ClientCommand::GetLobbyDetails { lobby_id } => self.get_lobby_details(&lobby_id),
            ClientCommand::SetLobbyOptions {
                lobby_id,
                nickname,
                score_to_win,
                answer_deck_ids,
                question_deck_ids,
            } => self.set_lobby_options(
                &lobby_id,
                &nickname,
                score_to_win,
                answer_deck_ids,
                question_deck_ids,
            ),
            ClientCommand::LeaveLobby { lobby_id, nickname } => {
                self.leave_lobby(&lobby_id, &nickname)
            }
            ClientCommand::CreateSession { lobby_id } => self.create_session(&lobby_id),
            ClientCommand::JoinSession { lobby_id, nickname } => {
                self.join_session(&lobby_id, &nickname)
            }
            ClientCommand::SubmitCards {
                lobby_id,
                nickname,
                card_ids,
            } => self.submit_cards(&lobby_id, &nickname, &card_ids),
            ClientCommand::ChooseWinner {
                lobby_id,
                czar_nickname,
                winner_nickname,
                winning_card_ids,
            } => self.choose_winner(&lobby_id, &czar_nickname, &winner_nickname, &winning_card_ids),
            ClientCommand::GetGameInfo { lobby_id } => self.get_game_info(&lobby_id),
            ClientCommand::GetFullState { lobby_id, nickname } => {
                self.get_full_state(&lobby_id, &nickname)
            }
        }
    }

    pub fn create_lobby(&self, host_nickname: &str) -> Result<Outcome, GameError> {
        let host_nickname = sanitize_nickname(host_nickname)?;
        let lobby = self.lobbies.create_lobby(&host_nickname);
        info!(lobby = %lobby.id, host = %lobby.host_nickname, "lobby created");

        Ok(Outcome::reply(ServerMessage::LobbyCreated {
            lobby_id: lobby.id,
            host_nickname: lobby.host_nickname,
        }))
    }

    pub fn join_lobby(&self, lobby_id: &str, nickname: &str) -> Result<Outcome, GameError> {
        let nickname = sanitize_nickname(nickname)?;
        let players = self.lobbies.join(lobby_id, &nickname)?;

        Ok(Outcome::reply(ServerMessage::JoinedLobby {
            lobby_id: lobby_id.to_string(),
            players,
        })
        .with_broadcast(
            Audience::Others,
            ServerMessage::PlayerJoined {
                player: Player::new(nickname),
            },
        ))
    }

    pub fn get_lobby_details(&self, lobby_id: &str) -> Result<Outcome, GameError> {
        let lobby = self
            .lobbies
            .get(lobby_id)
            .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;

        Ok(Outcome::reply(ServerMessage::LobbyInfo {
            lobby_id: lobby.id,
            host_nickname: lobby.host_nickname,
            players: lobby.players,
        }))
    }

    pub fn set_lobby_options(
        &self,
        lobby_id: &str,
        nickname: &str,
        score_to_win: u32,
        answer_deck_ids: Vec<DeckId>,
        question_deck_ids: Vec<DeckId>,
    ) -> Result<Outcome, GameError> {
        let lobby = self
            .lobbies
            .get(lobby_id)
            .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;
        if lobby.host_nickname != nickname {
            return Err(GameError::NotHost);
        }

        self.lobbies.set_options(
            lobby_id,
            score_to_win,
            answer_deck_ids.clone(),
            question_deck_ids.clone(),
        )?;

        Ok(Outcome::broadcast(
            Audience::Everyone,
            ServerMessage::LobbyOptionsUpdated {
                score_to_win,
                answer_deck_ids,
                question_deck_ids,
            },
        ))
    }

    pub fn leave_lobby(&self, lobby_id: &str, nickname: &str) -> Result<Outcome, GameError> {
        self.lobbies.leave(lobby_id, nickname)?;

        Ok(Outcome::broadcast(
            Audience::Others,
            ServerMessage::PlayerLeft {
                nickname: nickname.to_string(),
            },
        ))
    }

    /// Consumes the lobby and publishes the session under the same id. The
    /// session is fully built (decks fetched, shuffled, first prompt drawn,
    /// czar picked) before it becomes visible to lookups.
    pub fn create_session(&self, lobby_id: &str) -> Result<Outcome, GameError> {
        let lobby = self
            .lobbies
            .take(lobby_id)
            .ok_or_else(|| GameError::LobbyNotFound(lobby_id.to_string()))?;

        let session = match GameSession::from_lobby(&lobby, self.decks.as_ref(), (self.rng_factory)())
        {
            Ok(session) => session,
            Err(err) => {
                // Hand the lobby back so the host can fix the deck selection.
                self.lobbies.restore(lobby);
                return Err(err);
            }
        };
        info!(session = %session.id, players = session.players.len(), "game session created");
        self.sessions.insert(session);

        Ok(Outcome::broadcast(
            Audience::Everyone,
            ServerMessage::GameplayRedirect {
                lobby_id: lobby_id.to_string(),
            },
        ))
    }

    pub fn join_session(&self, lobby_id: &str, nickname: &str) -> Result<Outcome, GameError> {
        let hand = self
            .sessions
            .with_session(lobby_id, |session| session.join(nickname))?;

        // The hand goes to the caller alone, never to the group.
        Ok(Outcome::reply(ServerMessage::ReceiveHand { hand }))
    }

    pub fn submit_cards(
        &self,
        lobby_id: &str,
        nickname: &str,
        card_ids: &[CardId],
    ) -> Result<Outcome, GameError> {
        let record = self
            .sessions
            .with_session(lobby_id, |session| session.submit_cards(nickname, card_ids))?;

        let mut outcome = Outcome::reply(ServerMessage::ReceiveHand { hand: record.hand })
            .with_broadcast(
                Audience::Everyone,
                ServerMessage::CardsSubmitted {
                    nickname: record.nickname,
                    card_ids: record.card_ids,
                },
            );
        if let Some(answers) = record.reveal {
            outcome = outcome.with_broadcast(
                Audience::Everyone,
                ServerMessage::AllAnswersIn { answers },
            );
        }
        Ok(outcome)
    }

    pub fn choose_winner(
        &self,
        lobby_id: &str,
        czar_nickname: &str,
        winner_nickname: &str,
        winning_card_ids: &[CardId],
    ) -> Result<Outcome, GameError> {
        let outcome = self.sessions.with_session(lobby_id, |session| {
            session.choose_winner(czar_nickname, winner_nickname, winning_card_ids)
        })?;

        match outcome {
            WinnerOutcome::GameOver { winner } => {
                // Terminal: once the game-over notice goes out, the session
                // is gone and every later operation fails.
                self.sessions.remove(lobby_id);
                Ok(Outcome::broadcast(
                    Audience::Everyone,
                    ServerMessage::GameOver { winner },
                ))
            }
            WinnerOutcome::NextRound {
                winner,
                cards,
                round,
            } => Ok(Outcome::broadcast(
                Audience::Everyone,
                ServerMessage::WinnerChosen { winner, cards },
            )
            .with_broadcast(
                Audience::Everyone,
                ServerMessage::RoundStarted {
                    czar: round.czar,
                    prompt: round.prompt,
                },
            )),
        }
    }

    pub fn get_game_info(&self, lobby_id: &str) -> Result<Outcome, GameError> {
        self.sessions
            .with_session(lobby_id, |session| {
                let mut players = session.players.clone();
                players.sort_by(|a, b| a.nickname.cmp(&b.nickname));
                Ok(ServerMessage::GameInfo {
                    players,
                    czar: session.czar.clone(),
                    current_prompt: session.current_prompt.clone(),
                })
            })
            .map(Outcome::reply)
    }

    pub fn get_full_state(&self, lobby_id: &str, nickname: &str) -> Result<Outcome, GameError> {
        self.sessions
            .with_session(lobby_id, |session| {
                let mut players = session.players.clone();
                players.sort_by(|a, b| a.nickname.cmp(&b.nickname));
                Ok(ServerMessage::FullState {
                    current_prompt: session.current_prompt.clone(),
                    czar: session.czar.clone(),
                    players,
                    my_hand: session.hands.get(nickname).cloned().unwrap_or_default(),
                })
            })
            .map(Outcome::reply)
    }
}
