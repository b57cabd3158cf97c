//! Output formatting module

use animal_lens_app::batch::BatchSummary;
use animal_lens_app::format::format_line;
use animal_lens_types::{CycleReport, OutputFormat, RequestOutcome, Result};
use serde::Serialize;

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    message: &'a str,
    #[serde(flatten)]
    report: &'a CycleReport,
}

pub fn output_report(output_format: OutputFormat, report: &CycleReport, message: &str) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&ClassifyOutput { message, report })?;
        println!("{}", content);
        return Ok(());
    }

    println!("{}", message);

    if tracing::enabled!(tracing::Level::DEBUG) {
        println!();
        print_outcome("Info model", &report.info);
        print_outcome("Detect model", &report.detect);
        println!("Elapsed:         {} ms", report.elapsed_ms);
    }

    Ok(())
}

fn print_outcome(title: &str, outcome: &RequestOutcome) {
    println!("{}", title);
    println!("{}", "-".repeat(title.len()));
    match outcome {
        RequestOutcome::Observations { observations } if observations.is_empty() => {
            println!("  (no observations)");
        }
        RequestOutcome::Observations { observations } => {
            for observation in observations.iter().take(10) {
                println!("  {}", format_line(observation));
            }
        }
        RequestOutcome::Failed { description } => {
            println!("  error: {}", description);
        }
    }
    println!();
}

pub fn output_batch_summary(output_format: OutputFormat, summary: &BatchSummary) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(summary)?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nBatch Result");
    println!("============");
    println!("Images:      {}", summary.total);
    println!("Successful:  {}", summary.successful);
    println!("Failed:      {}", summary.failed);
    println!(
        "Duration:    {:.1}s",
        (summary.completed_at - summary.started_at).num_milliseconds() as f64 / 1000.0
    );
    println!();

    for entry in &summary.entries {
        let name = entry
            .image
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match (&entry.message, &entry.error) {
            (Some(message), _) => {
                // Label text is multi-line; show it on one row
                println!("{:<32} {}", name, message.replace('\n', " | "));
            }
            (None, Some(error)) => println!("{:<32} ERROR: {}", name, error),
            (None, None) => println!("{:<32} (no result)", name),
        }
    }

    Ok(())
}
