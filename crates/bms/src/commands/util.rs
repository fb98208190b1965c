//! Shared helpers for command handlers.

use futures_util::{Stream, StreamExt};
use tabled::Tabled;

use bms_core::WriteOutcome;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Two-column table for single-item views.
pub fn detail_table(pairs: Vec<(&str, String)>) -> String {
    let rows: Vec<DetailRow> = pairs
        .into_iter()
        .map(|(field, value)| DetailRow {
            field: field.to_owned(),
            value,
        })
        .collect();
    output::render_table(&rows)
}

/// Turn a write outcome into a status line or an error.
pub fn report_write(
    path: &str,
    outcome: WriteOutcome,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match outcome {
        WriteOutcome::Success => {
            output::print_status(&format!("✓ {path} updated"), global.quiet);
            Ok(())
        }
        WriteOutcome::Pending => {
            output::print_status(&format!("→ {path} sent"), global.quiet);
            Ok(())
        }
        WriteOutcome::Failure(reason) => Err(CliError::WriteFailed {
            path: path.to_owned(),
            reason,
        }),
    }
}

/// Handle items from `feed` until it ends, `limit` items have been
/// handled, or Ctrl-C is pressed.
pub async fn follow<S>(
    limit: Option<usize>,
    mut feed: S,
    mut handle: impl FnMut(S::Item) -> Result<(), CliError>,
) -> Result<(), CliError>
where
    S: Stream + Unpin,
{
    let mut seen = 0usize;
    while limit.is_none_or(|max| seen < max) {
        tokio::select! {
            item = feed.next() => {
                let Some(item) = item else {
                    tracing::debug!("feed ended");
                    break;
                };
                handle(item)?;
                seen += 1;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
