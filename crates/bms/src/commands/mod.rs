//! Command dispatch: bridges CLI args -> synchronizer and panels -> output.

pub mod account;
pub mod config_cmd;
pub mod consumption;
pub mod data;
pub mod floor;
pub mod led;
pub mod light;
pub mod scenes;
pub mod sensors;
pub mod util;

use std::sync::Arc;

use bms_core::{Synchronizer, SyncOptions};

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Everything a store-bound command needs.
pub struct Context {
    pub sync: Synchronizer,
    pub target: Target,
}

impl Context {
    /// Start the synchronizer for `target`.
    pub fn new(target: Target, global: &GlobalOpts) -> Result<Self, CliError> {
        let sync = match &target {
            Target::Memory(store) => Synchronizer::new(
                Arc::new(store.clone()),
                SyncOptions {
                    ack_required: global.ack,
                },
            ),
            Target::Remote(config) => Synchronizer::connect(config)?,
        };
        Ok(Self { sync, target })
    }
}

/// Dispatch a store-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => data::get(ctx, args, global).await,
        Command::Set(args) => data::set(ctx, args, global).await,
        Command::Watch(args) => data::watch(ctx, args, global).await,
        Command::Scenes(args) => scenes::handle(ctx, args, global).await,
        Command::Light(args) => light::handle(ctx, args, global).await,
        Command::Led(args) => led::handle(ctx, args, global).await,
        Command::Sensors(args) => sensors::handle(ctx, args, global).await,
        Command::Consumption => consumption::handle(ctx, global).await,
        Command::Floor(args) => floor::handle(ctx, args, global).await,
        Command::Login(args) => account::login(ctx, args, global).await,
        Command::Signup(args) => account::signup(ctx, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions run without a store".into(),
        )),
    }
}
