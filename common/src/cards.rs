use serde::{Deserialize, Serialize};

pub type CardId = u32;
pub type DeckId = u32;

/// A white card: one answer a player can play from their hand.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnswerCard {
    pub id: CardId,
    pub text: String,
}

impl AnswerCard {
    pub fn new(id: CardId, text: String) -> Self {
        Self { id, text }
    }
}

/// A black card: the prompt the czar reads out. `pick` is how many answer
/// cards each player must submit to satisfy it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PromptCard {
    pub id: CardId,
    pub text: String,
    pub pick: usize,
}

impl PromptCard {
    pub fn new(id: CardId, text: String, pick: usize) -> Self {
        Self { id, text, pick }
    }
}
