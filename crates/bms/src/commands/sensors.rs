//! Sensor command handlers: one sample, or a live feed.

use futures_util::stream;
use tabled::Tabled;

use bms_core::panel::SENSOR_PATH;
use bms_core::{SensorPanel, SensorReading};

use crate::cli::{GlobalOpts, SensorsArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

#[derive(Tabled)]
struct GaugeRow {
    #[tabled(rename = "Sensor")]
    sensor: &'static str,
    #[tabled(rename = "Reading")]
    reading: String,
    #[tabled(rename = "Gauge")]
    gauge: String,
}

fn rows(r: &SensorReading) -> Vec<GaugeRow> {
    vec![
        GaugeRow {
            sensor: "Temperature",
            reading: format!("{:.1} °C", r.temperature),
            gauge: output::gauge(r.temperature_fill()),
        },
        GaugeRow {
            sensor: "Humidity",
            reading: format!("{} %", r.humidity),
            gauge: output::gauge(r.humidity_fill()),
        },
    ]
}

fn print_reading(reading: &SensorReading, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        reading,
        |r| output::render_table(&rows(r)),
        |r| format!("temperature={} humidity={}", r.temperature, r.humidity),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(ctx: &Context, args: SensorsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if !args.watch {
        let reading = ctx
            .sync
            .read_once(SENSOR_PATH)
            .await
            .map_or_else(SensorReading::default, |v| SensorReading::from_value(&v));
        return print_reading(&reading, global);
    }

    let mut panel = SensorPanel::new(ctx.sync.clone());
    panel.start().await;
    if !panel.is_live() {
        return Err(CliError::ConnectionFailed {
            reason: format!("could not listen to '{SENSOR_PATH}'"),
        });
    }

    // Dropping the stream drops the panel and its listener.
    let readings = Box::pin(stream::unfold(panel, |mut panel| async move {
        let reading = panel.next_reading().await?;
        Some((reading, panel))
    }));
    util::follow(args.count, readings, |reading| print_reading(&reading, global)).await
}
