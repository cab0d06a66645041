//! decision-runner: headless trainer and decision CLI.
//!
//! Usage:
//!   decision-runner train --episodes 500 --seed 42 --records 3000 --out policy.json
//!   decision-runner export-models --models ./models
//!   decision-runner decide --policy policy.json --demo [--input request.json] [--no-explain]

use anyhow::Result;
use credit_core::{
    bundle::ModelBundle,
    features::CreditRequest,
    pipeline::DecisionEngine,
    policy::PolicyArtifact,
    trainer::{self, TrainerConfig},
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("help");

    match mode {
        "train" => train(&args),
        "export-models" => export_models(&args),
        "decide" => decide(&args),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn train(args: &[String]) -> Result<()> {
    let config = TrainerConfig {
        episodes: parse_arg(args, "--episodes", 500u32),
        records: parse_arg(args, "--records", 3_000usize),
        seed: parse_arg(args, "--seed", 42u64),
        ..TrainerConfig::default()
    };
    let out = arg_value(args, "--out").unwrap_or("policy.json");

    println!("credit-decision trainer");
    println!("  episodes: {}", config.episodes);
    println!("  records:  {}", config.records);
    println!("  seed:     {}", config.seed);
    println!("  out:      {out}");
    println!();

    let artifact = trainer::train(&config)?;
    artifact.save(Path::new(out))?;
    println!("trained {} states -> {out}", artifact.entries.len());
    Ok(())
}

fn export_models(args: &[String]) -> Result<()> {
    let dir = arg_value(args, "--models").unwrap_or("./models");
    ModelBundle::demo().save(Path::new(dir))?;
    println!("demo model bundle exported to {dir}");
    Ok(())
}

fn decide(args: &[String]) -> Result<()> {
    let policy_path = arg_value(args, "--policy").unwrap_or("policy.json");
    let no_explain = args.iter().any(|a| a == "--no-explain");
    let demo = args.iter().any(|a| a == "--demo");

    // Startup is all-or-nothing: a missing or corrupt artifact is fatal
    // before any decision is attempted.
    let bundle = if demo {
        ModelBundle::demo()
    } else {
        let models_dir = arg_value(args, "--models").unwrap_or("./models");
        ModelBundle::load(Path::new(models_dir))?
    };
    let artifact = PolicyArtifact::load(Path::new(policy_path))?;
    let engine = DecisionEngine::new(bundle, artifact);

    let mut request = match arg_value(args, "--input") {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str::<CreditRequest>(&content)?
        }
        None => sample_request(),
    };
    if no_explain {
        request.explain = false;
    }

    let response = engine.decide(&request)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn sample_request() -> CreditRequest {
    CreditRequest {
        avg_monthly_income: 150_000.0,
        income_cv: 0.02,
        expense_ratio: 0.15,
        emi_ratio: 0.05,
        avg_monthly_balance: 100_000.0,
        bounce_count: 0,
        account_age_months: 60,
        explain: true,
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn print_usage() {
    println!("decision-runner — credit decision trainer and CLI");
    println!();
    println!("Commands:");
    println!("  train         --episodes N --records M --seed S --out policy.json");
    println!("  export-models --models DIR");
    println!("  decide        --policy policy.json (--demo | --models DIR)");
    println!("                [--input request.json] [--no-explain]");
}
