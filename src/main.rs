use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ssee::matching::{evaluate, match_entities, precision, recall};
use ssee::semantic::ConfiguredProvider;
use ssee::Config;

/// Precision and recall over semantically matched entities.
#[derive(Parser, Debug)]
#[command(name = "ssee", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fraction of candidates matched to a distinct gold entity
    Precision(Lists),
    /// Fraction of gold entities matched to a distinct candidate
    Recall(Lists),
    /// Precision, recall and F1
    Score(Lists),
    /// Show which gold entity each candidate was assigned
    Match(Lists),
}

#[derive(Args, Debug)]
struct Lists {
    /// Comma-separated candidate entities
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    candidates: Vec<String>,

    /// Comma-separated gold entities
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    gold: Vec<String>,

    /// Similarity threshold (defaults to eval.threshold from config)
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<f32>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Lists {
    fn texts(&self) -> Vec<String> {
        let mut texts = self.gold.clone();
        texts.extend(self.candidates.iter().cloned());
        texts
    }
}

/// NaN means no entities to score; None means the threshold was rejected.
fn format_ratio(value: Option<f64>) -> String {
    match value {
        None => "invalid threshold".to_string(),
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => format!("{:.4}", v),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level()))
        .init();

    let lists = match &cli.command {
        Command::Precision(l) | Command::Recall(l) | Command::Score(l) | Command::Match(l) => l,
    };
    let threshold = lists.threshold.unwrap_or(config.eval.threshold);
    let provider = ConfiguredProvider::from_config(&config, &lists.texts()).await?;
    log::debug!("Using {} provider at threshold {}", provider.name(), threshold);

    let (cands, gold) = (&lists.candidates, &lists.gold);
    match &cli.command {
        Command::Precision(_) => {
            let value = precision(cands, gold, threshold, &provider)?;
            if lists.json {
                println!("{}", serde_json::json!({ "precision": value }));
            } else {
                println!("Precision: {}", format_ratio(value));
            }
        }
        Command::Recall(_) => {
            let value = recall(cands, gold, threshold, &provider)?;
            if lists.json {
                println!("{}", serde_json::json!({ "recall": value }));
            } else {
                println!("Recall: {}", format_ratio(value));
            }
        }
        Command::Score(_) => {
            let scores = evaluate(cands, gold, threshold, &provider)?;
            if lists.json {
                println!("{}", serde_json::to_string_pretty(&scores)?);
            } else {
                println!("Precision: {}", format_ratio(scores.map(|s| s.precision)));
                println!("Recall:    {}", format_ratio(scores.map(|s| s.recall)));
                println!("F1:        {}", format_ratio(scores.map(|s| s.f1)));
            }
        }
        Command::Match(_) => {
            let report = match_entities(cands, gold, threshold, &provider)?;
            if lists.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if let Some(report) = report {
                for a in &report.assignments {
                    println!(
                        "  {} -> {} ({:.4})",
                        cands[a.query], gold[a.pool], a.similarity
                    );
                }
                for (i, c) in cands.iter().enumerate() {
                    if report.pool_for(i).is_none() {
                        println!("  {} -> (unmatched)", c);
                    }
                }
                println!("Precision: {}", format_ratio(Some(report.ratio())));
            } else {
                println!("Precision: {}", format_ratio(None));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(None), "invalid threshold");
        assert_eq!(format_ratio(Some(f64::NAN)), "NaN");
        assert_eq!(format_ratio(Some(2.0 / 3.0)), "0.6667");
    }

    #[test]
    fn test_parse_lists() {
        let cli = Cli::try_parse_from([
            "ssee",
            "recall",
            "--candidates",
            "Cooking Apple,Sweet Orange,Cows",
            "--gold",
            "Apple,Orange,Cooking Apple",
            "--threshold",
            "0.7",
        ])
        .unwrap();
        match cli.command {
            Command::Recall(l) => {
                assert_eq!(l.candidates.len(), 3);
                assert_eq!(l.gold[2], "Cooking Apple");
                assert_eq!(l.threshold, Some(0.7));
                assert_eq!(l.texts().len(), 6);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
