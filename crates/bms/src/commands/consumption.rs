//! Consumption command handler.

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use bms_core::{ConsumptionAlert, ConsumptionPanel, MonthlyUsage};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "kW")]
    kw: String,
    #[tabled(rename = "")]
    bar: String,
}

#[derive(Serialize)]
struct Report {
    months: Vec<MonthlyUsage>,
    alert: Option<ConsumptionAlert>,
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let mut panel = ConsumptionPanel::new(ctx.sync.clone());
    panel.load().await;

    let months = panel.chart();
    let alert = panel.alert();
    let peak = months.iter().map(|u| u.kw).fold(0.0_f64, f64::max);

    let out = match global.output {
        OutputFormat::Table => {
            let rows: Vec<UsageRow> = months
                .iter()
                .map(|u| UsageRow {
                    month: u.month.clone(),
                    kw: format!("{:.2}", u.kw),
                    bar: output::gauge(if peak > 0.0 { u.kw / peak } else { 0.0 }),
                })
                .collect();
            output::render_table(&rows)
        }
        OutputFormat::Plain => months
            .iter()
            .map(|u| format!("{}={}", u.month, u.kw))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => {
            let report = Report {
                months,
                alert: alert.clone(),
            };
            output::render_single(&global.output, &report, |_| String::new(), |_| String::new())?
        }
    };
    output::print_output(&out, global.quiet);

    if let Some(alert) = alert {
        output::print_status(
            &format!("{} {}", "⚠".yellow().bold(), alert.message()),
            global.quiet,
        );
    }
    Ok(())
}
