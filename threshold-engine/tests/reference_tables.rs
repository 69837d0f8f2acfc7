use threshold_engine::{
    CardNames, Element, Evaluator, FormattedCard, Goal, Method, PipVector, build_atlas,
    hypergeometric_at_least,
};

const POPULATION: usize = 30;
const TOLERANCE_PCT: f64 = 0.5;

/// (sources, sites seen, required, percent) for a 30-site atlas.
const AGGRO: &[(u32, usize, u32, f64)] = &[
    (1, 5, 1, 16.7),
    (1, 6, 1, 20.0),
    (1, 7, 1, 23.3),
    (1, 8, 1, 26.7),
    (2, 5, 1, 31.0),
    (2, 6, 1, 36.6),
    (2, 6, 2, 3.5),
    (2, 8, 1, 46.9),
    (2, 8, 2, 6.4),
    (3, 5, 1, 43.3),
    (3, 6, 1, 50.1),
    (3, 6, 2, 9.4),
    (3, 7, 1, 56.4),
    (3, 7, 2, 12.8),
    (3, 8, 1, 62.1),
    (3, 8, 2, 16.6),
    (5, 5, 1, 62.7),
    (5, 6, 1, 70.2),
    (5, 6, 2, 25.4),
    (5, 6, 3, 4.1),
    (5, 7, 1, 76.4),
    (5, 7, 2, 32.9),
    (5, 7, 3, 6.8),
    (5, 8, 1, 81.5),
    (5, 8, 2, 40.5),
    (5, 8, 3, 10.2),
    (5, 8, 4, 1.1),
    (10, 5, 1, 89.1),
    (10, 8, 1, 97.8),
    (10, 8, 2, 84.6),
    (15, 5, 1, 97.9),
    (15, 6, 1, 99.2),
    (15, 7, 1, 99.7),
    (15, 8, 1, 99.8),
];

const PATHFINDER: &[(u32, usize, u32, f64)] = &[
    (1, 1, 1, 3.3),
    (1, 2, 1, 6.7),
    (1, 3, 1, 10.0),
    (1, 4, 1, 13.3),
    (3, 1, 1, 10.0),
    (3, 2, 1, 19.3),
    (3, 3, 1, 28.0),
    (5, 1, 1, 16.7),
    (10, 1, 1, 33.3),
    (15, 1, 1, 50.0),
    (20, 1, 1, 66.7),
    (30, 1, 1, 100.0),
    (30, 5, 1, 100.0),
    (30, 5, 2, 100.0),
];

const MIDRANGE: &[(u32, usize, u32, f64)] = &[
    (1, 9, 1, 30.0),
    (1, 10, 1, 33.3),
    (10, 7, 1, 96.2),
    (10, 9, 1, 98.8),
];

fn fire_atlas(sources: u32) -> threshold_engine::Atlas {
    let blanks = u32::try_from(POPULATION).expect("population fits u32") - sources;
    let mut cards = vec![FormattedCard::site(
        "Fire Site",
        PipVector::single(Element::Fire, 1),
        sources,
    )];
    if blanks > 0 {
        cards.push(FormattedCard::site("Blank Site", PipVector::default(), blanks));
    }
    build_atlas(&cards)
}

fn check_table(name: &str, table: &[(u32, usize, u32, f64)]) {
    let mut evaluator = Evaluator::seeded(30);
    for &(sources, seen, required, expected) in table {
        let successes = usize::try_from(sources).expect("sources fit usize");
        let kernel = hypergeometric_at_least(POPULATION, successes, seen, required) * 100.0;
        assert!(
            (kernel - expected).abs() <= TOLERANCE_PCT,
            "{name} K={sources} n={seen} r={required}: kernel {kernel:.2} vs {expected}"
        );

        let goal = Goal::new(
            PipVector::single(Element::Fire, required),
            CardNames::from_vec(vec!["Probe".to_string()]),
            1,
        );
        let evaluation = evaluator.evaluate_goal(&goal, &fire_atlas(sources), seen);
        assert_eq!(evaluation.method(), Method::Exact);
        let via_evaluator = evaluation.probability * 100.0;
        assert!(
            (via_evaluator - expected).abs() <= TOLERANCE_PCT,
            "{name} K={sources} n={seen} r={required}: evaluator {via_evaluator:.2} vs {expected}"
        );
    }
}

#[test]
fn aggro_table_matches() {
    check_table("aggro", AGGRO);
}

#[test]
fn pathfinder_table_matches() {
    check_table("pathfinder", PATHFINDER);
}

#[test]
fn midrange_table_matches() {
    check_table("midrange", MIDRANGE);
}

#[test]
fn exact_path_counts_sites_not_pips() {
    // Ten single-pip fire sites: K is the site count.
    let mut evaluator = Evaluator::seeded(1);
    let goal = Goal::new(
        PipVector::single(Element::Fire, 1),
        CardNames::from_vec(vec!["Probe".to_string()]),
        3,
    );
    let evaluation = evaluator.evaluate_goal(&goal, &fire_atlas(10), 5);
    assert!(matches!(
        evaluation.details,
        threshold_engine::MathDetails::Exact { successes: 10, .. }
    ));
}
