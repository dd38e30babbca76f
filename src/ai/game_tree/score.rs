use crate::{Action, Player};

/// Statistics of one root move, as seen by `player`.
#[derive(Debug, Clone)]
pub struct Score<A, P> where A: Action, P: Player {
    pub action: A,
    pub player: P,
    pub reward: f32,
    pub num_visits: u32,
}

impl<A, P> Score<A, P> where A: Action, P: Player {
    pub fn average(&self) -> f32 {
        if self.num_visits == 0 {
            0.0
        } else {
            self.reward / self.num_visits as f32
        }
    }
}
