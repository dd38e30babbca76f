use std::sync::Arc;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use bg_sim::{BattlegroundsGame, Catalogue, GameConfig, Move, PairingStrategy};

fn assert_conserved(game: &BattlegroundsGame) {
    assert_eq!(game.copies_in_circulation(), game.pool().initial_size());
}

#[test]
fn random_play_never_creates_or_destroys_copies() {
    let catalogue = Arc::new(Catalogue::builtin());

    for seed in 0..6 {
        let config = GameConfig::for_testing()
            .with_players(4)
            .with_pairing(PairingStrategy::NearestHealth)
            .with_max_rounds(Some(10))
            .with_board(GameConfig::for_testing().board.with_gold(3, 1));
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut game = BattlegroundsGame::new(config, catalogue.clone(), &mut rng).unwrap();
        assert_conserved(&game);

        while !game.is_over() {
            let moves = game.legal_moves();
            let mv = *moves.choose(&mut rng).unwrap();
            game.make_move(&mut rng, mv).unwrap();
            assert_conserved(&game);
        }
    }
}

#[test]
fn rejected_moves_change_nothing() {
    let catalogue = Arc::new(Catalogue::builtin());
    let mut rng = ChaCha20Rng::seed_from_u64(9);
    let mut game = BattlegroundsGame::new(GameConfig::for_testing(), catalogue, &mut rng).unwrap();

    let before_pool = game.pool().size();
    let before_gold = game.boards()[0].gold();
    // one gold on turn one, not enough for anything but a refresh
    assert!(!game.make_move(&mut rng, Move::Buy(0)).unwrap());
    assert!(!game.make_move(&mut rng, Move::Sell(0)).unwrap());
    assert!(!game.make_move(&mut rng, Move::Upgrade).unwrap());

    assert_eq!(game.pool().size(), before_pool);
    assert_eq!(game.boards()[0].gold(), before_gold);
    assert_conserved(&game);
}

#[test]
fn eliminated_boards_return_their_minions() {
    let catalogue = Arc::new(Catalogue::builtin());
    let board = GameConfig::for_testing().board.with_starting_health(1).with_gold(3, 1);
    let config = GameConfig::for_testing().with_board(board).with_max_rounds(Some(20));
    let mut rng = ChaCha20Rng::seed_from_u64(12);
    let mut game = BattlegroundsGame::new(config, catalogue, &mut rng).unwrap();

    // player 0 fields a minion, player 1 never does
    assert!(game.make_move(&mut rng, Move::Buy(0)).unwrap());
    assert!(game.make_move(&mut rng, Move::Play { hand: 0, slot: None }).unwrap());
    game.make_move(&mut rng, Move::EndTurn).unwrap();
    game.make_move(&mut rng, Move::Buy(0)).unwrap();
    game.make_move(&mut rng, Move::EndTurn).unwrap();

    assert!(game.is_over());
    let loser = &game.boards()[1];
    assert!(loser.board().is_empty() && loser.hand().is_empty());
    assert!(loser.recruits().iter().all(Option::is_none));
    assert_conserved(&game);
}
