use std::collections::BTreeMap;

use tracing::{info, warn};

use common::cards::{AnswerCard, CardId, PromptCard};
use common::constants::MAX_HAND_SIZE;
use common::player::Player;
use common::protocol::PlayedCards;

use crate::error::GameError;
use crate::session::{GamePhase, GameSession};

/// One prompt-to-winner cycle. A new round replaces the old value wholesale;
/// nothing is recycled between rounds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Round {
    submissions: BTreeMap<String, Vec<AnswerCard>>,
    submitted_counts: BTreeMap<String, usize>,
    all_submitted: bool,
}

impl Round {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_submitted(&self) -> bool {
        self.all_submitted
    }

    pub fn submitted_count(&self, nickname: &str) -> usize {
        self.submitted_counts.get(nickname).copied().unwrap_or(0)
    }

    pub fn submissions_for(&self, nickname: &str) -> &[AnswerCard] {
        self.submissions
            .get(nickname)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn submitters(&self) -> impl Iterator<Item = (&String, &Vec<AnswerCard>)> {
        self.submissions.iter()
    }

    fn record(&mut self, nickname: &str, cards: Vec<AnswerCard>) {
        if cards.is_empty() {
            return;
        }
        *self.submitted_counts.entry(nickname.to_string()).or_default() += cards.len();
        self.submissions
            .entry(nickname.to_string())
            .or_default()
            .extend(cards);
    }

    fn mark_all_submitted(&mut self) {
        self.all_submitted = true;
    }
}

/// What a single submission produced: the caller's new hand, the ids that
/// actually left it, and the reveal if this submission completed the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub nickname: String,
    pub card_ids: Vec<CardId>,
    pub hand: Vec<AnswerCard>,
    pub reveal: Option<Vec<PlayedCards>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundStart {
    pub czar: String,
    pub prompt: PromptCard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerOutcome {
    GameOver {
        winner: String,
    },
    NextRound {
        winner: String,
        cards: Vec<AnswerCard>,
        round: RoundStart,
    },
}

impl GameSession {
    fn ensure_active(&self) -> Result<(), GameError> {
        if self.phase == GamePhase::Finished {
            return Err(GameError::SessionFinished);
        }
        Ok(())
    }

    fn player_index(&self, nickname: &str) -> Option<usize> {
        self.players.iter().position(|p| p.nickname == nickname)
    }

    /// Idempotent join: late or returning players get a seat and a hand
    /// topped up to the maximum. The hand goes back to the caller only.
    pub fn join(&mut self, nickname: &str) -> Result<Vec<AnswerCard>, GameError> {
        self.ensure_active()?;

        if self.player_index(nickname).is_none() {
            self.players.push(Player::new(nickname.to_string()));
        }
        let hand = self.top_up_hand(nickname);

        if self.phase == GamePhase::AwaitingPlayers {
            self.phase = GamePhase::RoundActive;
        }

        Ok(hand)
    }

    /// One card per call; prompts asking for more are satisfied by repeated
    /// calls. Ids that are not in the caller's hand are skipped without
    /// signaling, so the submitted count only ever rises by cards actually
    /// removed.
    pub fn submit_cards(
        &mut self,
        nickname: &str,
        card_ids: &[CardId],
    ) -> Result<SubmissionRecord, GameError> {
        self.ensure_active()?;

        if nickname == self.czar {
            return Err(GameError::CzarCannotSubmit);
        }
        if card_ids.len() != 1 {
            return Err(GameError::InvalidSubmissionCount(card_ids.len()));
        }

        let (removed, hand_after) = match self.hands.get_mut(nickname) {
            Some(hand) => {
                let mut removed = Vec::new();
                for card_id in card_ids {
                    if let Some(position) = hand.iter().position(|card| card.id == *card_id) {
                        removed.push(hand.remove(position));
                    }
                }
                (removed, hand.clone())
            }
            // A submitter without a hand has nothing to match, by the same
            // lenient rule as unknown ids.
            None => (Vec::new(), Vec::new()),
        };
        let removed_ids: Vec<CardId> = removed.iter().map(|card| card.id).collect();

        self.round.record(nickname, removed);
        let reveal = self.detect_completion();

        Ok(SubmissionRecord {
            nickname: nickname.to_string(),
            card_ids: removed_ids,
            hand: hand_after,
            reveal,
        })
    }

    /// Latches once per round: the first submission that satisfies every
    /// non-czar player produces the reveal, in an order that hides who
    /// submitted first.
    fn detect_completion(&mut self) -> Option<Vec<PlayedCards>> {
        if self.round.all_submitted() {
            return None;
        }

        let required = self.current_prompt.pick;
        let everyone_done = self
            .players
            .iter()
            .filter(|p| p.nickname != self.czar)
            .all(|p| self.round.submitted_count(&p.nickname) >= required);
        if !everyone_done {
            return None;
        }

        self.round.mark_all_submitted();
        self.phase = GamePhase::RoundResolving;

        let mut answers: Vec<PlayedCards> = self
            .round
            .submitters()
            .filter(|(nickname, _)| *nickname != &self.czar)
            .map(|(nickname, cards)| PlayedCards {
                nickname: nickname.clone(),
                card_ids: cards.iter().map(|card| card.id).collect(),
                cards: cards.clone(),
            })
            .collect();
        self.rng.shuffle(&mut answers);

        info!(session = %self.id, answers = answers.len(), "all answers in");
        Some(answers)
    }

    /// Czar's verdict. Ends the game when the configured win score is
    /// reached, otherwise refills every hand and rolls into the next round.
    pub fn choose_winner(
        &mut self,
        czar_nickname: &str,
        winner_nickname: &str,
        winning_card_ids: &[CardId],
    ) -> Result<WinnerOutcome, GameError> {
        self.ensure_active()?;

        if czar_nickname != self.czar {
            return Err(GameError::NotCzar);
        }
        let winner_index = self
            .player_index(winner_nickname)
            .ok_or_else(|| GameError::PlayerNotFound(winner_nickname.to_string()))?;

        self.players[winner_index].score += 1;
        let score = self.players[winner_index].score;

        let cards: Vec<AnswerCard> = self
            .round
            .submissions_for(winner_nickname)
            .iter()
            .filter(|card| winning_card_ids.contains(&card.id))
            .cloned()
            .collect();

        if self.score_to_win > 0 && score >= self.score_to_win {
            self.phase = GamePhase::Finished;
            info!(session = %self.id, winner = winner_nickname, score, "game over");
            return Ok(WinnerOutcome::GameOver {
                winner: winner_nickname.to_string(),
            });
        }

        self.refill_hands();
        let round = self
            .start_next_round()
            .expect("session was just checked to be unfinished");

        Ok(WinnerOutcome::NextRound {
            winner: winner_nickname.to_string(),
            cards,
            round,
        })
    }

    /// Rotates the czar, draws the next prompt (reloading the queue when it
    /// runs dry), and swaps in a fresh round. Returns `None` once finished.
    pub fn start_next_round(&mut self) -> Option<RoundStart> {
        if self.phase == GamePhase::Finished {
            return None;
        }

        self.rotate_czar();
        self.current_prompt = self.draw_prompt();
        self.round = Round::new();
        self.phase = GamePhase::RoundActive;

        info!(session = %self.id, czar = %self.czar, prompt = self.current_prompt.id, "round started");
        Some(RoundStart {
            czar: self.czar.clone(),
            prompt: self.current_prompt.clone(),
        })
    }

    fn rotate_czar(&mut self) {
        let next_index = match self.player_index(&self.czar) {
            Some(index) => (index + 1) % self.players.len(),
            None => {
                // A czar outside the player list means session state went
                // inconsistent somewhere; surface it instead of hiding it.
                warn!(session = %self.id, czar = %self.czar, "current czar missing from player list");
                0
            }
        };
        self.czar = self.players[next_index].nickname.clone();
    }

    fn refill_hands(&mut self) {
        let nicknames: Vec<String> = self.players.iter().map(|p| p.nickname.clone()).collect();
        for nickname in nicknames {
            self.top_up_hand(&nickname);
        }
    }

    /// Draws until the hand holds `MAX_HAND_SIZE` cards, returning the
    /// resulting hand.
    fn top_up_hand(&mut self, nickname: &str) -> Vec<AnswerCard> {
        let held = self.hands.get(nickname).map_or(0, Vec::len);
        let mut drawn = Vec::new();
        while held + drawn.len() < MAX_HAND_SIZE {
            let Some(card) = self.draw_answer() else {
                break;
            };
            drawn.push(card);
        }
        let hand = self.hands.entry(nickname.to_string()).or_default();
        hand.extend(drawn);
        hand.clone()
    }

    fn draw_answer(&mut self) -> Option<AnswerCard> {
        if self.answer_queue.is_empty() {
            self.reload_answer_queue();
        }
        self.answer_queue.pop_front()
    }

    fn draw_prompt(&mut self) -> PromptCard {
        if self.prompt_queue.is_empty() {
            self.reload_prompt_queue();
        }
        self.prompt_queue
            .pop_front()
            .expect("prompt deck is never empty after session creation")
    }

    /// Reloads are always a fresh shuffle of the original deck, never of the
    /// depleted queue.
    fn reload_answer_queue(&mut self) {
        let mut cards = self.answer_deck.clone();
        self.rng.shuffle(&mut cards);
        self.answer_queue = cards.into();
    }

    fn reload_prompt_queue(&mut self) {
        let mut cards = self.prompt_deck.clone();
        self.rng.shuffle(&mut cards);
        self.prompt_queue = cards.into();
    }
}
