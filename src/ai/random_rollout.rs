use rand::Rng;
use rand::seq::SliceRandom;
use crate::{Action, Outcome, Player, State};
use crate::ai::SearchError;

/// Plays uniformly random legal moves from `game` until it ends. Gives up with
/// [`Outcome::Escape`] after `max_depth` moves or when no move is available.
pub fn random_rollout<
    R: Rng + Sized,
    S: State<A, P> + Clone,
    A: Action,
    P: Player,
>(game: &S, rng: &mut R, max_depth: Option<u32>) -> Result<Outcome<P>, SearchError> {
    let mut game = game.clone();
    let mut depth = 0;

    loop {
        if let Some(outcome) = game.outcome() {
            return Ok(outcome);
        }
        if max_depth.is_some_and(|max| depth >= max) {
            return Ok(Outcome::Escape(format!("no result after {depth} moves")));
        }

        let actions = game.actions();
        let Some(random_action) = actions.choose(rng) else {
            return Ok(Outcome::Escape("No actions available.".to_string()));
        };

        game = game
            .apply_action(rng, random_action)
            .map_err(|e| SearchError::Transition(format!("{e:?}")))?;
        depth += 1;
    }
}
