use std::collections::HashMap;
use std::sync::Arc;
use bg_sim::replay::BoxedAgent;
use bg_sim::{replay, run_game, Catalogue, GameConfig, GameRecord, GreedyAgent, PlayerId, RandomAgent};

fn agents() -> HashMap<PlayerId, BoxedAgent> {
    let mut agents: HashMap<PlayerId, BoxedAgent> = HashMap::new();
    agents.insert(PlayerId(0), Box::new(GreedyAgent { simulations: 1, max_rollout_depth: Some(300) }));
    agents.insert(PlayerId(1), Box::new(RandomAgent));
    agents.insert(PlayerId(2), Box::new(RandomAgent));
    agents.insert(PlayerId(3), Box::new(RandomAgent));
    agents
}

#[test]
fn replaying_a_record_rebuilds_the_final_state() {
    let catalogue = Arc::new(Catalogue::builtin());
    let config = GameConfig::for_testing().with_players(4).with_max_rounds(Some(5)).with_max_actions_per_turn(Some(4));

    let (played, record) = run_game(config, catalogue.clone(), 2024, &agents()).unwrap();
    let json = record.to_json().unwrap();
    let restored = GameRecord::from_json(&json).unwrap();
    let replayed = replay(&restored, catalogue.clone()).unwrap();

    assert_eq!(replayed.round(), played.round());
    assert_eq!(replayed.outcome(), played.outcome());
    assert_eq!(replayed.pool().size(), played.pool().size());
    for (a, b) in replayed.boards().iter().zip(played.boards()) {
        assert_eq!(a.hero_health(), b.hero_health());
        assert_eq!(a.tier(), b.tier());
        assert_eq!(a.gold(), b.gold());
        assert_eq!(a.board_view(&catalogue), b.board_view(&catalogue));
        assert_eq!(a.hand_view(&catalogue), b.hand_view(&catalogue));
        assert_eq!(a.combat_history(), b.combat_history());
    }
}

#[test]
fn same_seed_same_game() {
    let catalogue = Arc::new(Catalogue::builtin());
    let config = GameConfig::for_testing().with_max_rounds(Some(4));

    let (_, first) = run_game(config.clone(), catalogue.clone(), 77, &agents()).unwrap();
    let (_, second) = run_game(config, catalogue, 77, &agents()).unwrap();
    assert_eq!(first, second);
}
