//! Digital LED command handlers.

use bms_core::DigitalLedPanel;
use bms_core::panel::LED_STATE_PATH;

use crate::cli::{GlobalOpts, LedArgs, LedCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

pub async fn handle(ctx: &Context, args: LedArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut led = DigitalLedPanel::new(ctx.sync.clone());
    led.load().await;

    let outcome = match args.command.unwrap_or(LedCommand::Show) {
        LedCommand::Show => {
            let on = led.is_on();
            let out = output::render_single(
                &global.output,
                &serde_json::json!({ "on": on }),
                |_| format!("LED: {}", output::on_off(on)),
                |_| on.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            return Ok(());
        }
        LedCommand::On => led.set_on(true).await,
        LedCommand::Off => led.set_on(false).await,
        LedCommand::Toggle => led.toggle().await,
    };

    output::print_status(&format!("LED: {}", output::on_off(led.is_on())), global.quiet);
    util::report_write(LED_STATE_PATH, outcome, global)
}
