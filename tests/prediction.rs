use std::fs;
use std::path::PathBuf;

use h2h_predict::config::EngineConfig;
use h2h_predict::grid::ScoreGrid;
use h2h_predict::h2h::{
    HistoricalMatch, PredictionCase, TeamDescriptor, TeamId, parse_case_json,
};
use h2h_predict::predict::{Predictions, predict_match};

fn read_case(name: &str) -> PredictionCase {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    parse_case_json(&raw).expect("fixture should parse")
}

fn run(case: &PredictionCase) -> Predictions {
    let cfg = case.config.unwrap_or_default();
    predict_match(&case.team_a, &case.team_b, &case.matches, &cfg)
}

fn assert_well_formed(p: &Predictions) {
    assert_eq!(p.team_a_win as u32 + p.draw as u32 + p.team_b_win as u32, 100);
    for v in [p.btts, p.over15, p.over25, p.over35] {
        assert!(v <= 100);
    }
    assert!(p.over35 <= p.over25 + 1);
    assert!(p.over25 <= p.over15);
    assert!(
        p.correct_scores
            .windows(2)
            .all(|w| w[0].probability >= w[1].probability)
    );
    assert!(
        p.correct_scores
            .iter()
            .all(|s| (0.0..=100.0).contains(&s.probability))
    );
}

#[test]
fn mixed_shape_fixture_predicts_from_observed_averages() {
    let case = read_case("h2h_case.json");
    let p = run(&case);

    // Darmstadt: 8 goals in 5, Heidenheim: 6 in 5; weights 34 and 30.
    let lambda_a: f64 = (1.6 * 34.0 + 1.4 * 30.0) / 64.0 * 1.15;
    let lambda_b: f64 = (1.2 * 30.0 + 1.4 * 34.0) / 64.0 * 0.95;
    assert_eq!(p.lambda_a, 1.73);
    assert_eq!(p.lambda_b, 1.24);
    assert!(!p.used_fallback);
    assert!(!p.is_limited_data);
    assert_eq!(p.soft_matches, 4);
    assert!(!p.precision_warning);

    let btts: f64 = 100.0 * (1.0 - (-lambda_a).exp()) * (1.0 - (-lambda_b).exp());
    assert_eq!(p.btts, btts.round() as u8);

    assert_eq!(p.correct_scores.len(), 3);
    assert_eq!(p.correct_scores[0].score, "1-1");
    assert!(p.team_a_win > p.team_b_win);
    assert_well_formed(&p);
}

#[test]
fn sparse_fixture_flags_fallback() {
    let case = read_case("sparse_case.json");
    let p = run(&case);

    assert!(p.used_fallback);
    assert!(p.is_limited_data);
    assert_eq!(p.lambda_a, 1.61);
    assert_eq!(p.lambda_b, 1.33);
    assert_eq!(p.correct_scores.len(), 5);
    assert_well_formed(&p);
}

#[test]
fn two_attributable_matches_trigger_fallback() {
    let a = TeamDescriptor::new(None, "Alpha", 10);
    let b = TeamDescriptor::new(None, "Beta", 10);
    let matches = vec![
        HistoricalMatch::new("Alpha", "Beta", 4, 0),
        HistoricalMatch::new("Beta", "Alpha", 0, 4),
        HistoricalMatch::new("Beta", "Gamma", 1, 1),
    ];
    let p = predict_match(&a, &b, &matches, &EngineConfig::default());
    assert!(p.used_fallback);
    assert!(p.is_limited_data);
    // Alpha's 4.0 average is ignored in favour of 1.4.
    assert_eq!(p.lambda_a, 1.61);
}

#[test]
fn id_attribution_beats_soft_name_match() {
    let a = TeamDescriptor::new(Some(TeamId::from(1)), "Eintracht", 10);
    let b = TeamDescriptor::new(Some(TeamId::from(2)), "Darmstadt", 10);
    let m = HistoricalMatch::new("SV Darmstadt 98", "Someone", 3, 0).with_ids(1u32, 3u32);
    let matches = vec![m; 3];

    let p = predict_match(&a, &b, &matches, &EngineConfig::default());
    // A scored 3 per game as home; B was never attributed.
    let expect_a = (3.0 * 10.0 + 1.4 * 10.0) / 20.0 * 1.15;
    assert_eq!(p.lambda_a, (expect_a * 100.0_f64).round() / 100.0);
    assert_eq!(p.lambda_b, 1.33);
    assert_eq!(p.soft_matches, 0);
}

#[test]
fn identical_inputs_give_identical_predictions() {
    let case = read_case("h2h_case.json");
    let first = run(&case);
    let second = run(&case);
    assert_eq!(first, second);

    let parallel: Vec<Predictions> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| run(&case))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(parallel.iter().all(|p| *p == first));
}

#[test]
fn outcomes_sum_to_100_across_lambda_range() {
    let cfg = EngineConfig::default();
    for home in 0..12 {
        for away in 0..12 {
            let a = TeamDescriptor::new(None, "A", 20);
            let b = TeamDescriptor::new(None, "B", 20);
            let matches: Vec<HistoricalMatch> = (0..3)
                .map(|_| HistoricalMatch::new("A", "B", home, away))
                .collect();
            let p = predict_match(&a, &b, &matches, &cfg);
            assert_well_formed(&p);
        }
    }
}

#[test]
fn adaptive_grid_reaches_mass_for_realistic_lambdas() {
    let cfg = EngineConfig::default();
    let mut l = 0.1;
    while l <= 8.0 {
        let g = ScoreGrid::adaptive(l, 8.0 - l + 0.1, &cfg);
        assert!(g.total() >= 0.999, "mass {} at {l}", g.total());
        assert!(g.max_goals() <= 20);
        l += 0.35;
    }
}

#[test]
fn over_lines_consistent_for_reference_lambdas() {
    let g = ScoreGrid::adaptive(1.82, 1.33, &EngineConfig::default());
    let o35 = g.over_share(3);
    let o25 = g.over_share(2);
    assert!(o35 < o25);
    assert!((0.0..=1.0).contains(&o35));
}

#[test]
fn predictions_serialize_with_camel_case_keys() {
    let p = run(&read_case("h2h_case.json"));
    let v = serde_json::to_value(&p).unwrap();
    for key in [
        "teamAWin",
        "draw",
        "teamBWin",
        "btts",
        "over15",
        "over25",
        "over35",
        "lambdaA",
        "lambdaB",
        "usedFallback",
        "isLimitedData",
        "correctScores",
    ] {
        assert!(v.get(key).is_some(), "missing {key}");
    }
    assert!(v["correctScores"][0].get("score").is_some());
}

#[test]
fn runaway_scoring_history_flags_precision_warning() {
    let a = TeamDescriptor::new(None, "Goal Machine", 1000);
    let b = TeamDescriptor::new(None, "Sieve", 1);
    let matches: Vec<HistoricalMatch> = (0..3)
        .map(|_| HistoricalMatch::new("Goal Machine", "Sieve", 20, 0))
        .collect();

    let p = predict_match(&a, &b, &matches, &EngineConfig::default());
    // (20 * 1000 + 1.4) / 1001 * 1.15 is close to 23 goals.
    assert!(p.lambda_a > 20.0);
    assert!(p.precision_warning);
    // Sieve never scored, so its side still falls back.
    assert!(p.used_fallback);
    assert_well_formed(&p);
}

#[test]
fn loose_descriptors_in_case_file_still_predict() {
    let raw = r#"{
        "teamA": {"name": null, "matchesInvolved": null},
        "teamB": {"id": 7, "name": "Sieve", "matchesInvolved": -3},
        "matches": [{"homeTeam": "X", "awayTeam": "Sieve", "result": "1-1"}]
    }"#;
    let case = parse_case_json(raw).expect("loose case should parse");
    assert_eq!(case.team_a.name, "");
    assert_eq!(case.team_b.matches_involved, 0);

    let p = run(&case);
    assert!(p.used_fallback);
    assert!(p.is_limited_data);
    assert_eq!(p.lambda_a, 1.61);
    assert_eq!(p.lambda_b, 1.33);
}
