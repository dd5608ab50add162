// Gameplay:
pub const MAX_HAND_SIZE: usize = 6; // Answer cards a player holds between rounds.

// Lobby:
pub const MAX_NICKNAME_LENGTH: usize = 16;
