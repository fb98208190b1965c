//! Smart light command handlers.

use serde::Serialize;

use bms_core::SmartLightPanel;
use bms_core::panel::{LIGHT_PATH, format_short_time, parse_short_time};

use crate::cli::{GlobalOpts, LightArgs, LightCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Serialize)]
struct LightStatus {
    on: bool,
    brightness: f64,
    schedule_from: Option<String>,
    schedule_to: Option<String>,
}

impl From<&SmartLightPanel> for LightStatus {
    fn from(panel: &SmartLightPanel) -> Self {
        let schedule = panel.schedule();
        Self {
            on: panel.is_on(),
            brightness: panel.brightness_percent(),
            schedule_from: schedule.map(|s| format_short_time(s.from)),
            schedule_to: schedule.map(|s| format_short_time(s.to)),
        }
    }
}

fn detail(status: &LightStatus) -> String {
    let schedule = match (&status.schedule_from, &status.schedule_to) {
        (Some(from), Some(to)) => format!("{from} → {to}"),
        _ => "not set".into(),
    };
    util::detail_table(vec![
        ("Power", output::on_off(status.on)),
        ("Brightness", format!("{:.0}%", status.brightness)),
        ("Schedule", schedule),
    ])
}

pub async fn handle(
    ctx: &Context,
    args: LightArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut panel = SmartLightPanel::new(ctx.sync.clone());
    panel.load().await;

    match args.command.unwrap_or(LightCommand::Show) {
        LightCommand::Show => {
            let status = LightStatus::from(&panel);
            let out = output::render_single(&global.output, &status, detail, |s| {
                format!("on={} brightness={:.0}", s.on, s.brightness)
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
        LightCommand::On => {
            let outcome = panel.set_on(true).await;
            util::report_write(&format!("{LIGHT_PATH}/state"), outcome, global)
        }
        LightCommand::Off => {
            let outcome = panel.set_on(false).await;
            util::report_write(&format!("{LIGHT_PATH}/state"), outcome, global)
        }
        LightCommand::Brightness { percent } => {
            let outcome = panel.set_brightness(f64::from(percent) / 100.0).await;
            util::report_write(&format!("{LIGHT_PATH}/brightness"), outcome, global)
        }
        LightCommand::Schedule { from, to } => {
            let from = parse_short_time(&from)?;
            let to = parse_short_time(&to)?;
            let outcome = panel.set_schedule(from, to).await;
            output::print_status(
                &format!(
                    "Schedule: {} → {}",
                    format_short_time(from),
                    format_short_time(to)
                ),
                global.quiet,
            );
            util::report_write(&format!("{LIGHT_PATH}/schedule"), outcome, global)
        }
    }
}
