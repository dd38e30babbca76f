use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use bg_sim::{Action, MonteCarloTreeSearcher, Outcome, Player, SearchConfig, SearchError, State};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Take(u8);

impl Action for Take {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Seat(u8);

impl Player for Seat {}

/// Take one to three stones; whoever takes the last one wins. Leaving a multiple of four
/// is the only winning reply.
#[derive(Debug, Clone)]
struct Subtraction {
    stones: u8,
    to_move: Seat,
    winner: Option<Seat>,
}

impl State<Take, Seat> for Subtraction {
    type Error = String;

    fn actions(&self) -> Vec<Take> {
        if self.winner.is_some() {
            return Vec::new();
        }
        (1..=self.stones.min(3)).map(Take).collect()
    }

    fn apply_action<R: Rng>(&self, _rng: &mut R, action: &Take) -> Result<Self, String> {
        let stones = self.stones.checked_sub(action.0).ok_or("too many stones")?;
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

fn start(stones: u8) -> Subtraction {
    Subtraction { stones, to_move: Seat(0), winner: None }
}

fn success_rate(rollouts: u32, replicas: usize) -> f32 {
    let searcher = MonteCarloTreeSearcher::new(
        SearchConfig::default().with_rollouts(rollouts).with_root_replicas(replicas),
    );
    let trials = 40;
    let hits = (0..trials)
        .filter(|seed| {
            let mut rng = ChaCha20Rng::seed_from_u64(*seed);
            searcher.choose(&start(7), &mut rng) == Ok(Take(3))
        })
        .count();
    hits as f32 / trials as f32
}

#[test]
fn more_rollouts_find_the_winning_move_more_often() {
    let few = success_rate(3, 1);
    let many = success_rate(400, 1);
    assert!(many >= few, "few {few}, many {many}");
    assert!(many >= 0.9, "many {many}");
}

#[test]
fn root_replicas_agree_on_the_winning_move() {
    assert!(success_rate(200, 4) >= 0.9);
}

#[test]
fn finished_games_have_no_move() {
    let searcher = MonteCarloTreeSearcher::new(SearchConfig::for_testing());
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let done = Subtraction { stones: 0, to_move: Seat(1), winner: Some(Seat(0)) };
    assert_eq!(searcher.choose(&done, &mut rng), Err(SearchError::TerminalNode));
}
