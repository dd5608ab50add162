use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use bincode::config::standard;
use bincode::serde::decode_from_slice;

use common::cards::{AnswerCard, DeckId, PromptCard};
use common::protocol::ServerMessage;

use crate::delivery::DeliveryHandle;
use crate::facade::GameService;
use crate::session::DeckSource;
use crate::shuffle::GameRng;

pub fn answer_cards(ids: RangeInclusive<u32>) -> Vec<AnswerCard> {
    ids.map(|id| AnswerCard::new(id, format!("answer {}", id)))
        .collect()
}

pub fn prompt_cards(ids: RangeInclusive<u32>, pick: usize) -> Vec<PromptCard> {
    ids.map(|id| PromptCard::new(id, format!("prompt {}?", id), pick))
        .collect()
}

/// Deck source backed by plain maps, standing in for the database-backed
/// deck store the real deployment wires in.
#[derive(Default)]
pub struct InMemoryDecks {
    answer_decks: HashMap<DeckId, Vec<AnswerCard>>,
    prompt_decks: HashMap<DeckId, Vec<PromptCard>>,
}

impl InMemoryDecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_answer_deck(&mut self, deck_id: DeckId, cards: Vec<AnswerCard>) {
        self.answer_decks.insert(deck_id, cards);
    }

    pub fn add_prompt_deck(&mut self, deck_id: DeckId, cards: Vec<PromptCard>) {
        self.prompt_decks.insert(deck_id, cards);
    }
}

impl DeckSource for InMemoryDecks {
    fn answer_cards(&self, deck_id: DeckId) -> Vec<AnswerCard> {
        self.answer_decks.get(&deck_id).cloned().unwrap_or_default()
    }

    fn prompt_cards(&self, deck_id: DeckId) -> Vec<PromptCard> {
        self.prompt_decks.get(&deck_id).cloned().unwrap_or_default()
    }
}

/// One answer deck and one prompt deck, both stored under deck id 1.
pub fn standard_decks(answer_count: u32, prompt_count: u32, pick: usize) -> InMemoryDecks {
    let mut decks = InMemoryDecks::new();
    decks.add_answer_deck(1, answer_cards(1..=answer_count));
    decks.add_prompt_deck(1, prompt_cards(1001..=1000 + prompt_count, pick));
    decks
}

/// A service whose sessions all shuffle with the same seed, so tests can
/// reproduce deals.
pub fn seeded_service(decks: InMemoryDecks, seed: u64) -> GameService {
    GameService::with_rng_factory(Arc::new(decks), Box::new(move || GameRng::seeded(seed)))
}

/// Records everything the engine asks the transport to deliver, split the
/// same way a group-messaging layer would split it: caller replies, whole
/// session broadcasts, and broadcasts excluding the caller.
#[derive(Default)]
pub struct MockDelivery {
    pub caller_messages: Vec<Vec<u8>>,
    pub broadcast_messages: Vec<(String, Vec<u8>)>,
    pub others_messages: Vec<(String, Vec<u8>)>,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decoded_caller_messages(&self) -> Vec<ServerMessage> {
        decode_all(self.caller_messages.iter())
    }

    pub fn decoded_broadcasts(&self) -> Vec<ServerMessage> {
        decode_all(self.broadcast_messages.iter().map(|(_, payload)| payload))
    }

    pub fn decoded_others_messages(&self) -> Vec<ServerMessage> {
        decode_all(self.others_messages.iter().map(|(_, payload)| payload))
    }
}

fn decode_all<'a>(payloads: impl Iterator<Item = &'a Vec<u8>>) -> Vec<ServerMessage> {
    payloads
        .map(|payload| {
            decode_from_slice::<ServerMessage, _>(payload, standard())
                .expect("failed to decode server message")
                .0
        })
        .collect()
}

impl DeliveryHandle for MockDelivery {
    fn send_to_caller(&mut self, message: Vec<u8>) {
        self.caller_messages.push(message);
    }

    fn broadcast(&mut self, session_id: &str, message: Vec<u8>) {
        self.broadcast_messages
            .push((session_id.to_string(), message));
    }

    fn broadcast_except_caller(&mut self, session_id: &str, message: Vec<u8>) {
        self.others_messages
            .push((session_id.to_string(), message));
    }
}
