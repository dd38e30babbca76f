use std::marker::PhantomData;
use crate::{Action, Player, State};

pub struct GameTreeNode<S, A, P> where S: State<A, P>, A: Action, P: Player {
    pub state: S,
    pub num_visits: u32,
    /// Reward accumulated from the tree's friendly player's perspective.
    pub reward: f32,
    /// Whether a child has been added for every legal move.
    pub expanded: bool,
    _phantom_data: PhantomData<(A, P)>,
}

impl<S, A, P> GameTreeNode<S, A, P> where S: State<A, P>, A: Action, P: Player {
    pub fn new(state: S) -> Self {
        Self {
            state,
            num_visits: 0,
            reward: 0.0,
            expanded: false,
            _phantom_data: Default::default(),
        }
    }

    pub fn average_reward(&self) -> Option<f32> {
        if self.num_visits == 0 {
            None
        } else {
            Some(self.reward / self.num_visits as f32)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.outcome().is_some()
    }
}
