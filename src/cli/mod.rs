//! CLI commands for planforge using clap.

use std::fmt::Write as _;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{load_settings_or_default, RunInput};
use crate::coordinator::{execute_run, RunOutcome};
use crate::datasource::StaticDataAccess;
use crate::plan::{AggregatedPlan, PlanEntry};
use crate::protocol::DomainReport;
use crate::workers;

use std::sync::Arc;

/// planforge - Multi-agent product-launch planning.
#[derive(Parser)]
#[command(name = "planforge")]
#[command(version = "0.1.0")]
#[command(about = "Coordinates specialist workers into a product-launch plan", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a full planning session
    Run {
        /// Target region, e.g. LATAM
        #[arg(long)]
        region: Option<String>,

        /// Product or concept name
        #[arg(long)]
        product: Option<String>,

        /// Read region and product from a JSON file instead
        #[arg(long, conflicts_with_all = ["region", "product"])]
        file: Option<std::path::PathBuf>,

        /// Emit the plan as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Print the status journal after the plan
        #[arg(long)]
        journal: bool,

        /// Print the envelope audit log after the plan
        #[arg(long)]
        audit: bool,
    },

    /// List the specialist roster and its capabilities
    Workers,
}

impl Commands {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Run {
                region,
                product,
                file,
                json,
                journal,
                audit,
            } => {
                let input = resolve_input(region.as_deref(), product.as_deref(), file.as_deref())?;
                let settings = load_settings_or_default();

                let outcome = execute_run(&input, &settings).await?;
                print_outcome(&outcome, *json, *journal, *audit)?;
                Ok(())
            }
            Command::Workers => {
                print_roster();
                Ok(())
            }
        }
    }
}

fn resolve_input(
    region: Option<&str>,
    product: Option<&str>,
    file: Option<&std::path::Path>,
) -> Result<RunInput> {
    let input = match (file, region, product) {
        (Some(path), _, _) => RunInput::from_file(path)?,
        (None, Some(region), Some(product)) => RunInput::new(region, product),
        _ => anyhow::bail!("provide either --file or both --region and --product"),
    };
    input.validate()?;
    Ok(input)
}

fn print_outcome(outcome: &RunOutcome, json: bool, journal: bool, audit: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.plan)?);
    } else {
        println!("{}", render_plan(&outcome.plan));
    }

    if journal {
        println!("--- Journal ---");
        for line in &outcome.journal {
            println!("[{}] {}", line.worker_id, line.message);
        }
    }

    if audit {
        println!("--- Audit log ({} envelopes) ---", outcome.audit_log.len());
        for envelope in &outcome.audit_log {
            println!(
                "{} {} -> {} ({})",
                envelope.kind, envelope.sender, envelope.recipient, envelope.id
            );
        }
    }

    Ok(())
}

fn print_roster() {
    let data = Arc::new(StaticDataAccess::new());
    for specialist in workers::default_specialists(data) {
        let card = specialist.card();
        println!(
            "{:<14} {} - {} [{}]",
            card.worker_id,
            card.display_name,
            card.description,
            card.capabilities.join(", ")
        );
    }
}

/// Human-readable plan rendering, one section per engaged domain.
fn render_plan(plan: &AggregatedPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Launch plan for '{}' in {}",
        plan.product, plan.region
    );
    let _ = writeln!(out, "{} of 6 domains delivered", plan.delivered_count());

    for (domain, entry) in plan.entries() {
        let _ = writeln!(out);
        match entry {
            PlanEntry::MissingResult { worker_id, reason } => {
                let _ = writeln!(out, "## {} — missing ('{}': {})", domain, worker_id, reason);
            }
            PlanEntry::Delivered(result) => {
                let tag = if result.degraded { " (degraded data)" } else { "" };
                let _ = writeln!(out, "## {}{}", domain, tag);
                render_report(&mut out, &result.report);
            }
        }
    }

    out
}

fn render_report(out: &mut String, report: &DomainReport) {
    match report {
        DomainReport::Market(trends) => {
            let _ = writeln!(out, "growth rate: {:.3}", trends.growth_rate);
            let _ = writeln!(out, "competitors: {}", trends.competitors.join(", "));
            let _ = writeln!(out, "trends: {}", trends.trends.join(", "));
        }
        DomainReport::Customer(signals) => {
            let _ = writeln!(out, "sentiment: {}", signals.average_sentiment);
            let _ = writeln!(out, "top requests: {}", signals.top_requests.join(", "));
        }
        DomainReport::Compliance(outlook) => {
            let _ = writeln!(out, "regulatory ready: {}", outlook.regulatory_ready);
            let _ = writeln!(out, "ESG frameworks: {}", outlook.esg_frameworks.join(", "));
            let _ = writeln!(out, "CO2 intensity cap: {}", outlook.co2_intensity_cap);
        }
        DomainReport::Partnership(network) => {
            let _ = writeln!(out, "suppliers: {}", network.suppliers.join(", "));
            let _ = writeln!(out, "distributors: {}", network.distributors.join(", "));
        }
        DomainReport::Design(concept) => {
            let _ = writeln!(out, "style: {} / palette: {}", concept.style, concept.palette);
            for (i, step) in concept.journey.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", i + 1, step);
            }
        }
        DomainReport::Launch(launch) => {
            for milestone in &launch.timeline {
                let _ = writeln!(out, "  {}: {}", milestone.phase, milestone.action);
            }
            let _ = writeln!(out, "channels: {}", launch.channels.join(", "));
            let _ = writeln!(out, "pitch: {}", launch.pitch_theme);
            let _ = writeln!(out, "key partners: {}", launch.key_partners.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Domain, MarketTrends, WorkerResult};

    #[test]
    fn test_resolve_input_requires_both_flags() {
        assert!(resolve_input(Some("LATAM"), None, None).is_err());
        let input = resolve_input(Some("LATAM"), Some("Circular Supply Chain Solution"), None)
            .unwrap();
        assert_eq!(input.region, "LATAM");
    }

    #[test]
    fn test_render_plan_marks_missing_and_degraded() {
        let mut plan = AggregatedPlan::new("LATAM", "Circular Supply Chain Solution");
        plan.insert(
            Domain::Market,
            PlanEntry::Delivered(WorkerResult {
                worker_id: "market".to_string(),
                domain: Domain::Market,
                degraded: true,
                report: DomainReport::Market(MarketTrends {
                    region: "LATAM".to_string(),
                    growth_rate: 1.1,
                    competitors: vec!["EcoCorp".to_string()],
                    trends: Vec::new(),
                }),
            }),
        );
        plan.insert(
            Domain::Launch,
            PlanEntry::missing("launch", "no result within timeout"),
        );

        let text = render_plan(&plan);
        assert!(text.contains("degraded data"));
        assert!(text.contains("missing"));
        assert!(text.contains("EcoCorp"));
    }
}
