//! `docstash doctor`: check the document index against stored records.

use anyhow::Result;
use docstash_core::doctor::DoctorReport;

use crate::app::App;
use crate::config::Config;

fn print_report(report: &DoctorReport) {
    println!("Checked {} indexed document(s).", report.checked);
    for pointer in &report.dangling {
        println!("  dangling   {}  (no stored record)", pointer.id());
    }
    for partial in &report.partial {
        let missing = match (partial.missing_image, partial.missing_response) {
            (true, _) => "image",
            (_, true) => "result text",
            _ => "nothing",
        };
        println!("  partial    {}  (missing {})", partial.pointer.id(), missing);
    }
    for pointer in &report.duplicates {
        println!("  duplicate  {}", pointer.id());
    }
}

pub async fn run_doctor(config: &Config, fix: bool, json: bool) -> Result<()> {
    let app = App::open(config).await?;
    let report = if fix {
        app.controller.repair().await
    } else {
        Ok(app.controller.diagnose().await)
    };
    app.close().await;
    let report = report?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    if report.is_healthy() {
        println!("Index is healthy.");
    } else if fix {
        println!("Removed {} pointer(s) from the index.", report.removed);
    } else {
        println!("Run `docstash doctor --fix` to drop dangling and duplicate entries.");
    }
    Ok(())
}
