use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::thread;
use rand::{Rng, SeedableRng};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use crate::{Action, Player, State};
use crate::ai::SearchError;
use crate::ai::game_tree::score::Score;
use crate::ai::mcts::build_monte_carlo_game_tree;
use crate::config::SearchConfig;

struct Replica<A, P> where A: Action, P: Player {
    replica_idx: usize,
    scores: Vec<Score<A, P>>,
}

/// Searches `config.root_replicas` independent trees on scoped threads and picks the move
/// with the best reward summed over every replica.
pub fn root_parallel<
    R: Rng,
    S: State<A, P> + Send,
    A: Action + Send + Eq + Hash,
    P: Player + Send,
>(state: &S, rng: &mut R, config: &SearchConfig) -> Result<A, SearchError> {
    if state.outcome().is_some() {
        return Err(SearchError::TerminalNode);
    }

    let seed: u64 = rng.gen();
    let replicas: Arc<Mutex<Vec<Replica<A, P>>>> = Arc::new(Mutex::new(Vec::new()));

    thread::scope(|scope| {
        let handles: Vec<_> = (0..config.root_replicas.max(1))
            .map(|replica_idx| {
                let replica_scores = replicas.clone();
                let game = state.clone();

                scope.spawn(move || -> Result<(), SearchError> {
                    let mut rng = replica_rng(seed, replica_idx);
                    let tree = build_monte_carlo_game_tree(&game, &mut rng, config)?;

                    replica_scores
                        .lock()
                        .map_err(|_| SearchError::WorkerPanicked)?
                        .push(Replica { replica_idx, scores: tree.root_scores() });
                    Ok(())
                })
            })
            .collect();

        handles
            .into_iter()
            .try_for_each(|handle| handle.join().map_err(|_| SearchError::WorkerPanicked)?)
    })?;

    let mut replicas = replicas.lock().map_err(|_| SearchError::WorkerPanicked)?;
    // thread completion order is not deterministic
    replicas.sort_by_key(|replica| replica.replica_idx);

    let mut totals: HashMap<&A, (f32, u32)> = HashMap::new();
    let mut order: Vec<&A> = Vec::new();
    for replica in replicas.iter() {
        for score in &replica.scores {
            let total = totals.entry(&score.action).or_insert_with(|| {
                order.push(&score.action);
                (0.0, 0)
            });
            total.0 += score.reward;
            total.1 += score.num_visits;
        }
    }

    let best = order
        .into_iter()
        .filter(|action| totals[action].1 > 0)
        .max_by(|a, b| {
            let average = |action: &&A| totals[action].0 / totals[action].1 as f32;
            average(a).total_cmp(&average(b))
        });

    match best {
        Some(action) => Ok(action.clone()),
        None => state.actions().choose(rng).cloned().ok_or(SearchError::NoLegalMoves),
    }
}

fn replica_rng(seed: u64, replica_idx: usize) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(replica_idx as u64);
    rng
}
