#![deny(warnings)]

//! Text front end for the verdict simulator.
//!
//! With `--cost`, `--benefit`, `--risk`, and `--horizon` all given, runs a
//! single evaluation and exits. Otherwise drops into an interactive
//! prompt/answer loop.

use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, Write};
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use verdict_core::{validate_params, DecisionParams, EngineConfig, Recommendation};

#[derive(Debug, Default)]
struct Args {
    cost: Option<f64>,
    benefit: Option<f64>,
    risk: Option<f64>,
    horizon: Option<u32>,
    trials: Option<u32>,
    seed: Option<u64>,
    json: bool,
}

fn parse_value<T: FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let v = value.with_context(|| format!("missing value for {flag}"))?;
    v.parse()
        .map_err(|_| anyhow!("invalid numeric value for {flag}: {v}"))
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--cost" => args.cost = Some(parse_value("--cost", it.next())?),
            "--benefit" => args.benefit = Some(parse_value("--benefit", it.next())?),
            "--risk" => args.risk = Some(parse_value("--risk", it.next())?),
            "--horizon" => args.horizon = Some(parse_value("--horizon", it.next())?),
            "--trials" => args.trials = Some(parse_value("--trials", it.next())?),
            "--seed" => args.seed = Some(parse_value("--seed", it.next())?),
            "--json" => args.json = true,
            _ => {}
        }
    }
    Ok(args)
}

fn render(rec: &Recommendation, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rec)?);
        return Ok(());
    }
    println!(
        "  Survival rate if you proceed (YES): {:.2}%",
        rec.acted.survival_rate * 100.0
    );
    println!(
        "  Average final resources (YES):      {:.2}",
        rec.acted.mean_final_resources
    );
    println!(
        "  Survival rate if you decline (NO):  {:.2}%",
        rec.declined.survival_rate * 100.0
    );
    println!(
        "  Average final resources (NO):       {:.2}",
        rec.declined.mean_final_resources
    );
    println!("Decision: {}", rec.verdict);
    Ok(())
}

fn prompt(text: &str) -> Result<Option<String>> {
    print!("{text}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_number<T: FromStr>(text: &str) -> Result<Option<T>> {
    match prompt(text)? {
        None => Ok(None),
        Some(s) => match s.parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                println!("Please enter a numeric value.");
                Ok(None)
            }
        },
    }
}

fn interactive(cfg_base: &EngineConfig, json: bool) -> Result<()> {
    loop {
        let question = match prompt("\nEnter your decision question (or type 'quit' to exit): ")? {
            None => break,
            Some(q) => q,
        };
        if matches!(question.to_lowercase().as_str(), "quit" | "exit") {
            println!("Goodbye!");
            break;
        }

        let Some(cost) = prompt_number("How costly is the action, as a fraction of resources (0 to 1)? ")?
        else {
            continue;
        };
        let Some(benefit) = prompt_number("How much does it reduce ongoing decay (0 to 1)? ")? else {
            continue;
        };
        let Some(risk) = prompt_number("How volatile is the environment (0 or more)? ")? else {
            continue;
        };
        let Some(horizon) = prompt_number("How many time steps ahead should be simulated (e.g. 50)? ")?
        else {
            continue;
        };

        let params = DecisionParams {
            cost,
            benefit,
            risk,
            horizon,
        };
        if let Err(e) = validate_params(&params) {
            println!("Invalid parameter: {e}");
            continue;
        }

        println!("\nConsidering \"{question}\"...");
        let rec = verdict_engine::evaluate(&params, cfg_base)?;
        render(&rec, json)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    info!(?args, "starting CLI");

    let defaults = EngineConfig::default();
    let cfg = EngineConfig {
        trials: args.trials.unwrap_or(defaults.trials),
        rng_seed: args.seed,
        ..defaults
    };

    if let (Some(cost), Some(benefit), Some(risk), Some(horizon)) =
        (args.cost, args.benefit, args.risk, args.horizon)
    {
        let params = DecisionParams {
            cost,
            benefit,
            risk,
            horizon,
        };
        let rec = verdict_engine::evaluate(&params, &cfg)?;
        render(&rec, args.json)?;
        return Ok(());
    }

    interactive(&cfg, args.json)
}
