//! Floor command handlers: per-cabin device switches.

use serde::Serialize;
use strum::IntoEnumIterator;
use tabled::Tabled;

use bms_core::{Cabin, CabinDevice, FloorPanel, Value};

use crate::cli::{FloorArgs, FloorCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Views ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct CabinView {
    name: String,
    devices: Value,
    #[serde(skip)]
    on: Vec<&'static str>,
}

impl From<&Cabin> for CabinView {
    fn from(c: &Cabin) -> Self {
        Self {
            name: c.name.clone(),
            devices: c.to_value(),
            on: CabinDevice::iter()
                .filter(|d| c.is_on(*d))
                .map(CabinDevice::label)
                .collect(),
        }
    }
}

#[derive(Tabled)]
struct CabinRow {
    #[tabled(rename = "Cabin")]
    name: String,
    #[tabled(rename = "On")]
    on: String,
}

impl From<&CabinView> for CabinRow {
    fn from(v: &CabinView) -> Self {
        Self {
            name: v.name.clone(),
            on: if v.on.is_empty() {
                "-".into()
            } else {
                v.on.join(", ")
            },
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    label: &'static str,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

fn device_rows(cabin: &Cabin) -> Vec<DeviceRow> {
    CabinDevice::iter()
        .map(|d| DeviceRow {
            label: d.label(),
            key: d.key(),
            state: output::on_off(cabin.is_on(d)),
        })
        .collect()
}

fn device_line(cabin: &Cabin) -> String {
    CabinDevice::iter()
        .map(|d| format!("{}={}", d.key(), cabin.is_on(d)))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: FloorArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut panel = FloorPanel::first_floor(ctx.sync.clone());
    panel.load().await;

    match args.command.unwrap_or(FloorCommand::Show { cabin: None }) {
        FloorCommand::Show { cabin: None } => {
            let views: Vec<CabinView> = panel.cabins().iter().map(CabinView::from).collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| CabinRow::from(v),
                |v| format!("{}: {}", v.name, v.on.join(", ")),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        FloorCommand::Show { cabin: Some(name) } => {
            let cabin = panel.cabin(&name).ok_or_else(|| CliError::NotFound {
                path: panel.floor().join(&name).to_string(),
            })?;
            let out = output::render_single(
                &global.output,
                &CabinView::from(cabin),
                |_| output::render_table(&device_rows(cabin)),
                |_| device_line(cabin),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        FloorCommand::Toggle { cabin, device } => {
            let outcome = panel.toggle_named(&cabin, &device).await?;
            if let (Some(c), Ok(d)) = (panel.cabin(&cabin), device.parse::<CabinDevice>()) {
                output::print_status(
                    &format!("{cabin} {}: {}", d.label(), output::on_off(c.is_on(d))),
                    global.quiet,
                );
            }
            util::report_write(&panel.floor().join(&cabin).to_string(), outcome, global)
        }
        FloorCommand::Sync => {
            let outcomes = panel.sync_all().await;
            for (cabin, outcome) in panel.cabins().iter().zip(outcomes) {
                let path = panel.floor().join(&cabin.name).to_string();
                util::report_write(&path, outcome, global)?;
            }
            Ok(())
        }
    }
}
