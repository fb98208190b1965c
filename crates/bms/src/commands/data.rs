//! Raw path access: `get`, `set`, `watch`.

use futures_util::StreamExt;

use bms_core::{StorePath, Value};

use crate::cli::{GetArgs, GlobalOpts, SetArgs, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

pub async fn get(ctx: &Context, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = StorePath::new(&args.path);
    let value = ctx
        .sync
        .try_read_once(&path)
        .await?
        .ok_or_else(|| CliError::NotFound {
            path: path.to_string(),
        })?;
    let out = output::render_value(&global.output, &value)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn set(ctx: &Context, args: SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = StorePath::new(&args.path);
    let json: serde_json::Value =
        serde_json::from_str(&args.value).map_err(|e| CliError::Validation {
            field: "value".into(),
            reason: format!("not valid JSON: {e}"),
        })?;
    let value = Value::from_json(json).ok_or_else(|| CliError::Validation {
        field: "value".into(),
        reason: "null and empty objects cannot be stored".into(),
    })?;

    let outcome = ctx.sync.write(path.clone(), value).await;
    util::report_write(&path.to_string(), outcome, global)
}

/// Keep a live read of `path` feeding the mirror, and print the
/// mirrored value each time it changes.
pub async fn watch(ctx: &Context, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = StorePath::new(&args.path);
    let mut sub = ctx.sync.read_continuous(path.clone()).await;
    if !sub.is_active() {
        return Err(CliError::ConnectionFailed {
            reason: format!("could not listen to '{path}'"),
        });
    }

    // Subscribe before the feed starts so no change is missed.
    let view = ctx.sync.mirror().watch(path);
    let feed = tokio::spawn(async move { while sub.recv().await.is_some() {} });
    let stop = feed.abort_handle();

    let result = util::follow(args.count, view.take_until(feed), |value| {
        let out = output::render_value(&global.output, &value)?;
        output::print_output(&out, global.quiet);
        Ok(())
    })
    .await;
    stop.abort();
    result
}
