use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use threshold_engine::numbers::count_to_f64;
use threshold_engine::{GoalReport, PipVector, ThresholdReport};

/// `Fire >= 2, Water >= 1`
pub fn requirement_label(requirement: &PipVector) -> String {
    requirement
        .iter()
        .filter(|&(_, needed)| needed > 0)
        .map(|(element, needed)| format!("{} >= {needed}", element.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn deck_title(report: &ThresholdReport) -> &str {
    report.deck_name.as_deref().unwrap_or("Unnamed deck")
}

fn pass_rate(report: &ThresholdReport) -> f64 {
    if report.results.is_empty() {
        return 100.0;
    }
    let passing = report.results.len() - report.fail_count();
    count_to_f64(passing) / count_to_f64(report.results.len()) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    report: &ThresholdReport,
    duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!("🔮 Threshold Reliability: {}", deck_title(report))
            .bright_cyan()
            .bold()
    )?;
    writeln!(out, "{}", "==============================".cyan())?;
    writeln!(out, "Atlas: {}", report.atlas)?;
    writeln!(
        out,
        "Target: {:.0}%  Turn: {}",
        report.target * 100.0,
        report.turn
    )?;

    let failing = report.fail_count();
    let total = report.results.len();
    writeln!(out, "Goals: {total}")?;
    writeln!(out, "Passing: {}", (total - failing).to_string().green())?;
    writeln!(out, "Failing: {}", failing.to_string().red())?;
    writeln!(out, "Pass rate: {:.1}%", pass_rate(report))?;
    writeln!(out)?;

    for result in &report.results {
        write_console_goal(out, result)?;
    }

    writeln!(out, "⏱️  Analysis time: {duration:?}")?;
    Ok(())
}

fn write_console_goal(out: &mut dyn Write, result: &GoalReport) -> Result<()> {
    let status = if result.passes {
        "✅ PASS".green()
    } else {
        "❌ FAIL".red()
    };
    let evaluation = &result.evaluation;
    writeln!(
        out,
        "{} {} by turn {}: {}",
        status,
        requirement_label(&result.goal.requirement).bold(),
        result.goal.target_turn,
        format!("{}%", evaluation.percent()).bold()
    )?;
    writeln!(out, "   Cards: {}", result.goal.card_names.join(", "))?;
    writeln!(
        out,
        "   Sites seen: {} ({})",
        evaluation.draws(),
        evaluation.method()
    )?;
    writeln!(out, "   {}", evaluation.explain().dimmed())?;
    if let Some(recommendation) = &result.recommendation {
        let line = format!("   💡 {recommendation}");
        if recommendation.reached_target {
            writeln!(out, "{}", line.yellow())?;
        } else {
            writeln!(out, "{} {}", line.yellow(), "(best effort)".red())?;
        }
    }
    writeln!(out)?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    analysis_ms: u64,
    #[serde(flatten)]
    report: &'a ThresholdReport,
}

pub fn generate_json_report(
    out: &mut dyn Write,
    report: &ThresholdReport,
    generated_at: DateTime<Utc>,
    duration: Duration,
) -> Result<()> {
    let envelope = JsonReport {
        generated_at: generated_at.to_rfc3339(),
        analysis_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        report,
    };
    let json_output = serde_json::to_string_pretty(&envelope)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, report: &ThresholdReport) -> Result<()> {
    writeln!(out, "# Threshold Reliability: {}\n", deck_title(report))?;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Atlas**: {}", report.atlas)?;
    writeln!(out, "- **Target**: {:.0}%", report.target * 100.0)?;
    writeln!(out, "- **Turn**: {}", report.turn)?;
    writeln!(out, "- **Goals**: {}", report.results.len())?;
    writeln!(out, "- **Failing**: {}", report.fail_count())?;
    writeln!(out, "- **Pass rate**: {:.1}%\n", pass_rate(report))?;

    if report.results.is_empty() {
        writeln!(out, "_No threshold goals in this deck._")?;
        return Ok(());
    }

    writeln!(out, "## Goals\n")?;
    writeln!(
        out,
        "| Status | Requirement | Cards | Turn | Sites seen | Probability | Method |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|")?;
    for result in &report.results {
        let status = if result.passes { "✅" } else { "❌" };
        let evaluation = &result.evaluation;
        let probability = match evaluation.confidence_interval() {
            Some((low, high)) => format!(
                "{}% ({:.1}-{:.1})",
                evaluation.percent(),
                low * 100.0,
                high * 100.0
            ),
            None => format!("{}%", evaluation.percent()),
        };
        writeln!(
            out,
            "| {status} | {} | {} | {} | {} | {probability} | {} |",
            requirement_label(&result.goal.requirement),
            result.goal.card_names.join(", "),
            result.goal.target_turn,
            evaluation.draws(),
            evaluation.method()
        )?;
    }
    writeln!(out)?;

    let failing: Vec<&GoalReport> = report.failing().collect();
    if !failing.is_empty() {
        writeln!(out, "## Recommendations\n")?;
        for result in failing {
            if let Some(recommendation) = &result.recommendation {
                writeln!(
                    out,
                    "- **{}**: {recommendation}",
                    requirement_label(&result.goal.requirement)
                )?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
