//! Evaluation CLI: score every case in a dataset and report mean precision, recall and F1.

use clap::Parser;
use ssee::{
    eval::{collect_texts, evaluate_cases, load_cases, CaseResult, EvalSummary},
    semantic::ConfiguredProvider,
    Config,
};
use std::path::PathBuf;

/// Evaluation framework: run cases and report metrics.
#[derive(Parser, Debug)]
#[command(name = "eval")]
struct Args {
    /// Path to evaluation cases (.json, .yaml or .yml).
    #[arg(long, default_value = "eval_cases.json")]
    cases: PathBuf,

    /// Similarity threshold (defaults to eval.threshold from config).
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f32>,

    /// Exit with status 1 when mean F1 is below this value.
    #[arg(long, default_value_t = 0.0)]
    min_f1: f64,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,
}

fn pct(v: f64) -> String {
    if v.is_nan() {
        "   n/a".to_string()
    } else {
        format!("{:5.1}%", v * 100.0)
    }
}

fn print_case(result: &CaseResult) {
    match result.scores {
        Some(s) => println!(
            "  {} ({} cand / {} gold)  P: {}  R: {}  F1: {}",
            result.label,
            result.candidates,
            result.gold,
            pct(s.precision),
            pct(s.recall),
            pct(s.f1)
        ),
        None => println!("  {}: threshold rejected", result.label),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level()))
        .init();

    let cases = load_cases(&args.cases)?;
    if cases.is_empty() {
        anyhow::bail!("No cases in {}", args.cases.display());
    }

    let threshold = args.threshold.unwrap_or(config.eval.threshold);
    let provider = ConfiguredProvider::from_config(&config, &collect_texts(&cases)).await?;

    let results = evaluate_cases(&cases, threshold, &provider)?;
    let summary = EvalSummary::from_results(&results);

    if args.json {
        let out = serde_json::json!({ "cases": &results, "summary": &summary });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "Evaluated {} cases ({} provider, threshold {})\n",
            cases.len(),
            provider.name(),
            threshold
        );
        for result in &results {
            print_case(result);
        }

        println!("\n=== Evaluation Results ===");
        println!("Precision: {} ({} cases)", pct(summary.mean_precision), summary.precision_cases);
        println!("Recall:    {} ({} cases)", pct(summary.mean_recall), summary.recall_cases);
        println!("F1:        {} ({} cases)", pct(summary.mean_f1), summary.f1_cases);
        if summary.rejected > 0 {
            println!("Rejected:  {} cases", summary.rejected);
        }
    }

    if args.min_f1 > 0.0 && !summary.meets(args.min_f1) {
        log::error!("Mean F1 below {:.2}", args.min_f1);
        std::process::exit(1);
    }
    Ok(())
}
