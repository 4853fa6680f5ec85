use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use h2h_predict::config::EngineConfig;
use h2h_predict::h2h::parse_case_json;
use h2h_predict::predict::predict_match;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut as_json = false;
    let mut path: Option<PathBuf> = None;
    for arg in env::args().skip(1) {
        if arg == "--json" {
            as_json = true;
        } else {
            path = Some(PathBuf::from(arg));
        }
    }
    let path = path.unwrap_or_else(|| PathBuf::from("tests/fixtures/h2h_case.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read case file {}", path.display()))?;
    let case = parse_case_json(&raw)?;

    // Case-file overrides first; `H2H_*` env vars still win.
    let cfg = match case.config {
        Some(cfg) => cfg.with_env_overrides(),
        None => EngineConfig::from_env(),
    };
    cfg.validate().context("engine config")?;

    let p = predict_match(&case.team_a, &case.team_b, &case.matches, &cfg);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&p)?);
        return Ok(());
    }

    println!("{} vs {}", case.team_a.name, case.team_b.name);
    println!("Home: {}%", p.team_a_win);
    println!("Draw: {}%", p.draw);
    println!("Away: {}%", p.team_b_win);
    println!("BTTS: {}%", p.btts);
    println!(
        "Over 1.5/2.5/3.5: {}% / {}% / {}%",
        p.over15, p.over25, p.over35
    );
    println!("Lambda: {:.2} - {:.2}", p.lambda_a, p.lambda_b);
    for s in &p.correct_scores {
        println!("  {:>5}  {:.1}%", s.score, s.probability);
    }
    if p.is_limited_data {
        println!("Limited data (fallback used: {})", p.used_fallback);
    }
    if p.soft_matches > 0 {
        println!("Name-containment matches: {}", p.soft_matches);
    }
    if p.precision_warning {
        println!("Warning: score grid capped before reaching mass threshold");
    }

    Ok(())
}
