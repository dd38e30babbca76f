use bg_sim::cards::{Ability, Catalogue};
use bg_sim::combat::{CombatEvent, CombatMinion, Side};
use bg_sim::{CombatConfig, CombatResolver, Lineup};

fn lineup_of(catalogue: &Catalogue, names: &[&str]) -> Lineup {
    let minions = names
        .iter()
        .map(|name| {
            let id = catalogue.find(name, false).unwrap();
            CombatMinion::from_template(&catalogue[id], catalogue)
        })
        .collect();
    Lineup::new(2, 30, minions)
}

#[test]
fn swapping_sides_mirrors_the_result() {
    let catalogue = Catalogue::builtin();
    let a = lineup_of(&catalogue, &["Harvest Golem", "Kaboom Bot", "Annoy-o-Tron"]);
    let b = lineup_of(&catalogue, &["Kindly Grandmother", "Imprisoner", "Red Whelp"]);
    let resolver = CombatResolver::new(CombatConfig::default().with_playouts(4000));

    let forward = resolver.resolve(&a, &b, 1);
    let backward = resolver.resolve(&b, &a, 2);
    assert!((forward.win_probability - backward.lose_probability).abs() < 0.04, "{forward:?} {backward:?}");
    assert!((forward.tie_probability - backward.tie_probability).abs() < 0.04);
    assert!((forward.expected_hero_health - backward.expected_enemy_hero_health).abs() < 0.35);
    assert!((forward.expected_enemy_hero_health - backward.expected_hero_health).abs() < 0.35);

    let mirrored = forward.invert();
    assert_eq!(mirrored.expected_hero_health, forward.expected_enemy_hero_health);
    assert_eq!(mirrored.expected_enemy_hero_health, forward.expected_hero_health);
}

#[test]
fn probabilities_sum_to_one() {
    let catalogue = Catalogue::builtin();
    let a = lineup_of(&catalogue, &["Alleycat", "Scallywag", "Selfless Hero"]);
    let b = lineup_of(&catalogue, &["Murloc Warleader", "Micro Mummy"]);
    let result = CombatResolver::new(CombatConfig::for_testing()).resolve(&a, &b, 5);

    let total = result.win_probability + result.tie_probability + result.lose_probability;
    assert!((total - 1.0).abs() < 1e-4);
    assert!(result.mean_damage_dealt >= 0.0 && result.mean_damage_taken >= 0.0);
}

#[test]
fn any_board_beats_an_empty_one() {
    let catalogue = Catalogue::builtin();
    let resolver = CombatResolver::new(CombatConfig::for_testing());
    let empty = Lineup::new(1, 30, Vec::new());

    for name in ["Tabbycat", "Wrath Weaver", "Deadly Spore", "Bronze Warden"] {
        let board = lineup_of(&catalogue, &[name]);
        assert_eq!(resolver.resolve(&board, &empty, 0).win_probability, 1.0);
        assert_eq!(resolver.resolve(&empty, &board, 0).lose_probability, 1.0);
    }
    assert_eq!(resolver.resolve(&empty, &empty, 0).tie_probability, 1.0);
}

#[test]
fn taunt_is_always_attacked_first() {
    let friendly = Lineup::new(1, 30, vec![
        CombatMinion::vanilla(1, 8),
        CombatMinion::vanilla(1, 8).with(Ability::Taunt),
        CombatMinion::vanilla(1, 8),
    ]);
    let enemy = Lineup::new(1, 30, vec![CombatMinion::vanilla(2, 30), CombatMinion::vanilla(2, 30)]);
    let resolver = CombatResolver::new(CombatConfig::default());

    for index in 0..300 {
        let (_, events) = resolver.playout_with_log(&friendly, &enemy, 31, index);
        let taunt_alive_until = events
            .iter()
            .position(|e| *e == CombatEvent::Death { side: Side::Friendly, uid: 1 })
            .unwrap_or(events.len());

        for event in &events[..taunt_alive_until] {
            if let CombatEvent::Attack { side: Side::Enemy, defender, .. } = event {
                assert_eq!(*defender, 1, "playout {index}");
            }
        }
    }
}

#[test]
fn golden_minions_hit_harder() {
    let catalogue = Catalogue::builtin();
    let regular = catalogue.find("Dragonspawn Lieutenant", false).unwrap();
    let golden = catalogue.find("Dragonspawn Lieutenant", true).unwrap();
    let a = Lineup::new(1, 30, vec![CombatMinion::from_template(&catalogue[golden], &catalogue)]);
    let b = Lineup::new(1, 30, vec![CombatMinion::from_template(&catalogue[regular], &catalogue)]);

    let result = CombatResolver::new(CombatConfig::for_testing()).resolve(&a, &b, 3);
    assert_eq!(result.win_probability, 1.0);
}
