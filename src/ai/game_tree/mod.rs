pub mod node;
pub mod edge;
pub mod score;

use petgraph::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;
use crate::{Action, Outcome, Player, State};
use crate::ai::SearchError;
use crate::ai::game_tree::edge::GameTreeEdge;
use crate::ai::game_tree::node::GameTreeNode;
use crate::ai::game_tree::score::Score;
use crate::ai::random_rollout::random_rollout;

/// A Monte Carlo search tree rooted at one state. Rewards are kept from the perspective of
/// the player to move at the root.
pub struct GameTree<S, A, P> where S: State<A, P>, A: Action, P: Player {
    root_node_idx: NodeIndex,
    graph: Graph<GameTreeNode<S, A, P>, GameTreeEdge<A>, Directed>,
    friendly: P,
    constant_of_exploration: f32,
    max_rollout_depth: Option<u32>,
}

impl<S, A, P> GameTree<S, A, P> where S: State<A, P>, A: Action, P: Player + 'static {
    pub fn new(state: S) -> Self {
        let friendly = state.current_player();
        let mut graph: Graph<GameTreeNode<S, A, P>, GameTreeEdge<A>, Directed> = Graph::new();
        let root_node_idx = graph.add_node(GameTreeNode::new(state));
        Self {
            root_node_idx,
            graph,
            friendly,
            constant_of_exploration: 2f32.sqrt(),
            max_rollout_depth: None,
        }
    }

    pub fn with_exploration(mut self, constant_of_exploration: f32) -> Self {
        self.constant_of_exploration = constant_of_exploration;
        self
    }

    pub fn with_rollout_depth(mut self, max_rollout_depth: Option<u32>) -> Self {
        self.max_rollout_depth = max_rollout_depth;
        self
    }

    pub fn graph(&self) -> &Graph<GameTreeNode<S, A, P>, GameTreeEdge<A>, Directed> {
        &self.graph
    }

    pub fn root(&self) -> &GameTreeNode<S, A, P> {
        &self.graph[self.root_node_idx]
    }

    pub fn friendly(&self) -> P {
        self.friendly
    }

    /// The child of an expanded node with the highest UCT value. Unvisited children win.
    fn select(&self, node_idx: NodeIndex) -> Result<NodeIndex, SearchError> {
        let node = &self.graph[node_idx];
        if !node.expanded {
            return Err(SearchError::Unexpanded);
        }

        let maximising = node.state.current_player() == self.friendly;
        let parent_visits = node.num_visits;

        let selected = self.node_children(node_idx).into_iter().fold((None, f32::NEG_INFINITY), |acc, child_idx| {
            let ucb = self.ucbt_value(child_idx, parent_visits, maximising);
            if ucb > acc.1 {
                (Some(child_idx), ucb)
            } else {
                acc
            }
        });

        selected.0.ok_or(SearchError::NoLegalMoves)
    }

    /// Adds one child per legal move. Returns the number of children added.
    fn expand<R: Rng>(&mut self, rng: &mut R, node_idx: NodeIndex) -> Result<usize, SearchError> {
        let actions = {
            let node = &self.graph[node_idx];
            if node.is_terminal() {
                return Err(SearchError::TerminalNode);
            }
            node.state.actions()
        };

        let count = actions.len();
        for action in actions {
            let state = self.graph[node_idx]
                .state
                .apply_action(rng, &action)
                .map_err(|e| SearchError::Transition(format!("{e:?}")))?;

            let new_node_idx = self.graph.add_node(GameTreeNode::new(state));
            self.graph.add_edge(node_idx, new_node_idx, GameTreeEdge::new(action));
        }

        self.graph[node_idx].expanded = true;
        Ok(count)
    }

    pub fn search_n<R: Rng>(&mut self, rng: &mut R, iterations: u32) -> Result<(), SearchError> {
        for _ in 0..iterations {
            self.rollout(rng)?;
        }
        Ok(())
    }

    /// One select, expand, simulate and back-propagate pass.
    pub fn rollout<R: Rng>(&mut self, rng: &mut R) -> Result<(), SearchError> {
        let mut current_node_idx = self.root_node_idx;

        // track visited nodes for back propagation
        let mut visited_nodes = vec![current_node_idx];

        while self.graph[current_node_idx].expanded && !self.is_leaf_node(current_node_idx) {
            current_node_idx = self.select(current_node_idx)?;
            visited_nodes.push(current_node_idx);
        }

        let outcome = if let Some(outcome) = self.graph[current_node_idx].state.outcome() {
            outcome
        } else if self.graph[current_node_idx].expanded || self.expand(rng, current_node_idx)? == 0 {
            Outcome::Escape("no legal moves".to_string())
        } else {
            let new_node_idx = self.select(current_node_idx)?;
            visited_nodes.push(new_node_idx);
            random_rollout(&self.graph[new_node_idx].state, rng, self.max_rollout_depth)?
        };

        let reward = self.reward(&outcome);
        trace!(depth = visited_nodes.len(), reward, "rollout finished");
        self.back_propagate(&visited_nodes, reward);
        Ok(())
    }

    /// 1 for a friendly win, a share of 1 for a draw the friendly player is part of.
    fn reward(&self, outcome: &Outcome<P>) -> f32 {
        match outcome {
            Outcome::Winner(winner) if *winner == self.friendly => 1.0,
            Outcome::Draw(players) if players.contains(&self.friendly) => 1.0 / players.len() as f32,
            _ => 0.0,
        }
    }

    /// This updates the num visits and the friendly reward for each visited node
    fn back_propagate(&mut self, visited_nodes: &[NodeIndex], reward: f32) {
        for &visited_node_idx in visited_nodes {
            let node = &mut self.graph[visited_node_idx];
            node.num_visits += 1;
            node.reward += reward;

            if let Some(edge) = self.edge_to_parent(visited_node_idx) {
                self.graph[edge].num_visits += 1;
            }
        }
    }

    /// upper confidence bound 1 for trees
    fn ucbt_value(&self, node_idx: NodeIndex, parent_visits: u32, maximising: bool) -> f32 {
        let node = &self.graph[node_idx];
        let Some(average) = node.average_reward() else {
            return f32::INFINITY;
        };

        // the player choosing at an opposing node wants the friendly reward low
        let exploitation_component = if maximising { average } else { 1.0 - average };

        let exploration_component = self.constant_of_exploration
            * ((parent_visits.max(1) as f32).ln() / node.num_visits as f32).sqrt();

        exploitation_component + exploration_component
    }

    fn node_children(&self, node_idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(node_idx, Outgoing)
            .map(|edge| edge.target())
            .collect()
    }

    fn edge_to_parent(&self, node_idx: NodeIndex) -> Option<EdgeIndex> {
        self.graph.edges_directed(node_idx, Incoming).next().map(|edge| edge.id())
    }

    fn is_leaf_node(&self, node_idx: NodeIndex) -> bool {
        self.graph.edges_directed(node_idx, Outgoing).next().is_none()
    }

    fn action_to(&self, node_idx: NodeIndex) -> Option<&A> {
        self.edge_to_parent(node_idx).map(|edge| &self.graph[edge].action)
    }

    pub fn root_scores(&self) -> Vec<Score<A, P>> {
        self.node_children(self.root_node_idx)
            .into_iter()
            .filter_map(|child_node_idx| {
                let child_node = &self.graph[child_node_idx];
                Some(Score {
                    action: self.action_to(child_node_idx)?.clone(),
                    player: self.friendly,
                    reward: child_node.reward,
                    num_visits: child_node.num_visits,
                })
            })
            .collect()
    }

    /// The root move whose edge was traversed most often.
    pub fn best_action(&self) -> Option<&A> {
        self.graph
            .edges_directed(self.root_node_idx, Outgoing)
            .max_by_key(|edge| edge.weight().num_visits)
            .map(|edge| &edge.weight().action)
    }

    /// The root move with the highest average reward. A root that was never expanded falls
    /// back to a uniformly random legal move.
    pub fn choose<R: Rng>(&self, rng: &mut R) -> Result<A, SearchError> {
        let root = self.root();
        if root.is_terminal() {
            return Err(SearchError::TerminalNode);
        }

        let best = self
            .node_children(self.root_node_idx)
            .into_iter()
            .filter_map(|child| Some((child, self.graph[child].average_reward()?)))
            .max_by(|a, b| {
                a.1.total_cmp(&b.1)
                    .then_with(|| self.graph[a.0].num_visits.cmp(&self.graph[b.0].num_visits))
            });

        match best.and_then(|(child, _)| self.action_to(child)) {
            Some(action) => Ok(action.clone()),
            None => root.state.actions().choose(rng).cloned().ok_or(SearchError::NoLegalMoves),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Take(u8);

    impl Action for Take {}

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Seat(u8);

    impl Player for Seat {}

    /// Take one or two stones; whoever takes the last stone wins.
    #[derive(Debug, Clone)]
    struct Nim {
        stones: u8,
        to_move: Seat,
        winner: Option<Seat>,
    }

    impl Nim {
        fn new(stones: u8) -> Self {
            Self { stones, to_move: Seat(0), winner: None }
        }
    }

    impl State<Take, Seat> for Nim {
        type Error = String;

        fn actions(&self) -> Vec<Take> {
            (1..=self.stones.min(2)).map(Take).collect()
        }

        fn apply_action<R: Rng>(&self, _rng: &mut R, action: &Take) -> Result<Self, String> {
            if action.0 == 0 || action.0 > self.stones.min(2) {
                return Err(format!("cannot take {}", action.0));
            }
            let stones = self.stones - action.0;
            Ok(Self {
                stones,
                to_move: Seat(1 - self.to_move.0),
                winner: (stones == 0).then_some(self.to_move),
            })
        }

        fn outcome(&self) -> Option<Outcome<Seat>> {
            self.winner.map(Outcome::Winner)
        }

        fn current_player(&self) -> Seat {
            self.to_move
        }
    }

    #[test]
    fn selecting_from_an_unexpanded_node_is_an_error() {
        let tree = GameTree::new(Nim::new(4));
        assert_eq!(tree.select(tree.root_node_idx), Err(SearchError::Unexpanded));
    }

    #[test]
    fn unexpanded_root_falls_back_to_a_legal_move() {
        let tree = GameTree::new(Nim::new(4));
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let action = tree.choose(&mut rng).unwrap();
        assert!(action == Take(1) || action == Take(2));
    }

    #[test]
    fn terminal_root_cannot_choose_or_expand() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let finished = Nim::new(1).apply_action(&mut rng, &Take(1)).unwrap();
        assert_eq!(finished.outcome(), Some(Outcome::Winner(Seat(0))));

        let mut tree = GameTree::new(finished);
        let root = tree.root_node_idx;
        assert_eq!(tree.choose(&mut rng), Err(SearchError::TerminalNode));
        assert_eq!(tree.expand(&mut rng, root), Err(SearchError::TerminalNode));
    }

    #[test]
    fn visits_add_up() {
        let mut tree = GameTree::new(Nim::new(6));
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        tree.search_n(&mut rng, 40).unwrap();

        assert_eq!(tree.root().num_visits, 40);
        let child_visits: u32 = tree.root_scores().iter().map(|s| s.num_visits).sum();
        assert_eq!(child_visits, 40);

        // every edge is walked exactly as often as the child it leads to
        for edge in tree.graph().edge_references() {
            assert_eq!(edge.weight().num_visits, tree.graph()[edge.target()].num_visits);
        }
    }

    #[test]
    fn finds_the_winning_take() {
        let mut tree = GameTree::new(Nim::new(4));
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        tree.search_n(&mut rng, 300).unwrap();

        // leaving a multiple of three wins
        assert_eq!(tree.choose(&mut rng), Ok(Take(1)));
        assert_eq!(tree.best_action(), Some(&Take(1)));
    }
}
