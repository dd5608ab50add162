use serde::{Deserialize, Serialize};

use crate::cards::{AnswerCard, CardId, DeckId, PromptCard};
use crate::player::Player;

/// One player's revealed submission for the current round.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PlayedCards {
    pub nickname: String,
    pub card_ids: Vec<CardId>,
    pub cards: Vec<AnswerCard>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub enum ServerMessage {
    LobbyCreated {
        lobby_id: String,
        host_nickname: String,
    },
    JoinedLobby {
        lobby_id: String,
        players: Vec<Player>,
    },
    PlayerJoined {
        player: Player,
    },
    PlayerLeft {
        nickname: String,
    },
    LobbyInfo {
        lobby_id: String,
        host_nickname: String,
        players: Vec<Player>,
    },
    LobbyOptionsUpdated {
        score_to_win: u32,
        answer_deck_ids: Vec<DeckId>,
        question_deck_ids: Vec<DeckId>,
    },
    GameplayRedirect {
        lobby_id: String,
    },
    ReceiveHand {
        hand: Vec<AnswerCard>,
    },
    CardsSubmitted {
        nickname: String,
        card_ids: Vec<CardId>,
    },
    AllAnswersIn {
        answers: Vec<PlayedCards>,
    },
    WinnerChosen {
        winner: String,
        cards: Vec<AnswerCard>,
    },
    RoundStarted {
        czar: String,
        prompt: PromptCard,
    },
    GameOver {
        winner: String,
    },
    GameInfo {
        players: Vec<Player>,
        czar: String,
        current_prompt: PromptCard,
    },
    FullState {
        current_prompt: PromptCard,
        czar: String,
        players: Vec<Player>,
        my_hand: Vec<AnswerCard>,
    },
}

impl ServerMessage {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::LobbyCreated { .. } => "LobbyCreated",
            Self::JoinedLobby { .. } => "JoinedLobby",
            Self::PlayerJoined { .. } => "PlayerJoined",
            Self::PlayerLeft { .. } => "PlayerLeft",
            Self::LobbyInfo { .. } => "LobbyInfo",
            Self::LobbyOptionsUpdated { .. } => "LobbyOptionsUpdated",
            Self::GameplayRedirect { .. } => "GameplayRedirect",
            Self::ReceiveHand { .. } => "ReceiveHand",
            Self::CardsSubmitted { .. } => "CardsSubmitted",
            Self::AllAnswersIn { .. } => "AllAnswersIn",
            Self::WinnerChosen { .. } => "WinnerChosen",
            Self::RoundStarted { .. } => "RoundStarted",
            Self::GameOver { .. } => "GameOver",
            Self::GameInfo { .. } => "GameInfo",
            Self::FullState { .. } => "FullState",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub enum ClientCommand {
    CreateLobby {
        host_nickname: String,
    },
    JoinLobby {
        lobby_id: String,
        nickname: String,
    },
    GetLobbyDetails {
        lobby_id: String,
    },
    SetLobbyOptions {
        lobby_id: String,
        nickname: String,
        score_to_win: u32,
        answer_deck_ids: Vec<DeckId>,
        question_deck_ids: Vec<DeckId>,
    },
    LeaveLobby {
        lobby_id: String,
        nickname: String,
    },
    CreateSession {
        lobby_id: String,
    },
    JoinSession {
        lobby_id: String,
        nickname: String,
    },
    SubmitCards {
        lobby_id: String,
        nickname: String,
        card_ids: Vec<CardId>,
    },
    ChooseWinner {
        lobby_id: String,
        czar_nickname: String,
        winner_nickname: String,
        winning_card_ids: Vec<CardId>,
    },
    GetGameInfo {
        lobby_id: String,
    },
    GetFullState {
        lobby_id: String,
        nickname: String,
    },
}

/// Who a produced message is logically addressed to. The reply slot of an
/// [`Outcome`] already covers the caller, so only the group shapes live here.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Audience {
    /// Everyone subscribed to the lobby/session, caller included.
    Everyone,
    /// Everyone in the lobby/session except the caller.
    Others,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Broadcast {
    pub audience: Audience,
    pub message: ServerMessage,
}

/// The full result of one operation: an optional reply for the caller alone
/// plus any number of group messages. Keeping the addressing in the return
/// value (instead of transport side effects) is what makes the engine
/// testable without a live connection.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Outcome {
    pub reply: Option<ServerMessage>,
    pub broadcasts: Vec<Broadcast>,
}

impl Outcome {
    pub fn reply(message: ServerMessage) -> Self {
        Self {
            reply: Some(message),
            broadcasts: Vec::new(),
        }
    }

    pub fn broadcast(audience: Audience, message: ServerMessage) -> Self {
        Self {
            reply: None,
            broadcasts: vec![Broadcast { audience, message }],
        }
    }

    pub fn with_broadcast(mut self, audience: Audience, message: ServerMessage) -> Self {
        self.broadcasts.push(Broadcast { audience, message });
        self
    }
}
