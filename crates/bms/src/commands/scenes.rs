//! Scene command handlers.

use serde::Serialize;
use tabled::Tabled;

use bms_core::panel::SCENES_PATH;
use bms_core::{Scene, SceneBoard};

use crate::cli::{GlobalOpts, ScenesArgs, ScenesCommand};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct SceneState {
    scene: &'static str,
    label: &'static str,
    on: bool,
}

#[derive(Tabled)]
struct SceneRow {
    #[tabled(rename = "Scene")]
    label: &'static str,
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&SceneState> for SceneRow {
    fn from(s: &SceneState) -> Self {
        Self {
            label: s.label,
            key: s.scene,
            state: output::on_off(s.on),
        }
    }
}

fn states(board: &SceneBoard) -> Vec<SceneState> {
    board
        .states()
        .map(|(scene, on)| SceneState {
            scene: scene.key(),
            label: scene.label(),
            on,
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &Context, args: ScenesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut board = SceneBoard::new(ctx.sync.clone());
    board.load().await;

    match args.command.unwrap_or(ScenesCommand::Show) {
        ScenesCommand::Show => show(&board, global),
        ScenesCommand::Set { scene, state } => {
            let outcome = board.set(scene, state.is_on()).await;
            announce(&board, scene, global);
            util::report_write(SCENES_PATH, outcome, global)
        }
        ScenesCommand::Toggle { scene } => {
            let outcome = board.toggle(scene).await;
            announce(&board, scene, global);
            util::report_write(SCENES_PATH, outcome, global)
        }
    }
}

fn show(board: &SceneBoard, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_list(
        &global.output,
        &states(board),
        |s| SceneRow::from(s),
        |s| format!("{}={}", s.scene, s.on),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn announce(board: &SceneBoard, scene: Scene, global: &GlobalOpts) {
    output::print_status(
        &format!("{}: {}", scene.label(), output::on_off(board.is_on(scene))),
        global.quiet,
    );
}
