use std::fmt;
use serde::{Deserialize, Serialize};
use crate::Action;

/// A player decision during the recruit phase. Indices address recruit, board and hand
/// slots at the time the move is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Move {
    Upgrade,
    Refresh,
    Freeze,
    Buy(u8),
    Sell(u8),
    /// Play a minion from the hand. Without a slot it goes to the right end of the board.
    Play { hand: u8, slot: Option<u8> },
    EndTurn,
}

impl Action for Move {}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Upgrade => write!(f, "upgrade"),
            Move::Refresh => write!(f, "refresh"),
            Move::Freeze => write!(f, "freeze"),
            Move::Buy(i) => write!(f, "buy {i}"),
            Move::Sell(i) => write!(f, "sell {i}"),
            Move::Play { hand, slot: None } => write!(f, "play {hand}"),
            Move::Play { hand, slot: Some(slot) } => write!(f, "play {hand} at {slot}"),
            Move::EndTurn => write!(f, "end turn"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_serialise_as_tagged_values() {
        let json = serde_json::to_string(&vec![Move::Buy(2), Move::EndTurn]).unwrap();
        assert_eq!(json, r#"[{"Buy":2},"EndTurn"]"#);
        assert_eq!(Move::Play { hand: 0, slot: Some(3) }.to_string(), "play 0 at 3");
    }
}
