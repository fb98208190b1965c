//! Clap derive structures for the `bms` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use bms_core::Scene;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bms -- control a building's smart devices from the command line
#[derive(Debug, Parser)]
#[command(
    name = "bms",
    version,
    about = "Control building automation devices from the command line",
    long_about = "Reads and writes device state in the building's realtime database.\n\n\
        Scenes, lights, the LED, live sensors, monthly consumption and\n\
        per-cabin floor toggles map onto well-known database paths;\n\
        `get`, `set` and `watch` reach any path directly.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Database profile to use
    #[arg(long, short = 'p', env = "BMS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Database URL (overrides profile)
    #[arg(long, short = 'd', env = "BMS_DATABASE_URL", global = true)]
    pub database: Option<String>,

    /// Database auth token (overrides profile and keyring)
    #[arg(long, global = true)]
    pub auth_token: Option<String>,

    /// Use a throwaway in-memory store instead of a database
    #[arg(long, global = true, conflicts_with = "database")]
    pub memory: bool,

    /// JSON file to preload into the in-memory store
    #[arg(long, global = true, requires = "memory", value_name = "FILE")]
    pub seed: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BMS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Wait for the database to confirm each write
    #[arg(long, env = "BMS_ACK", global = true)]
    pub ack: bool,

    /// Request timeout in seconds
    #[arg(long, env = "BMS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

/// `on` / `off` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Power {
    On,
    Off,
}

impl Power {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read the value at a database path
    Get(GetArgs),

    /// Replace the value at a database path
    Set(SetArgs),

    /// Stream every change at a database path
    Watch(WatchArgs),

    /// Building scenes (get up, good night, away, lobby, conference room)
    Scenes(ScenesArgs),

    /// Smart light power, brightness and schedule
    Light(LightArgs),

    /// Digital LED
    Led(LedArgs),

    /// Temperature and humidity
    Sensors(SensorsArgs),

    /// Monthly energy consumption
    #[command(alias = "usage")]
    Consumption,

    /// Per-cabin device toggles
    Floor(FloorArgs),

    /// Sign in with email and password
    Login(LoginArgs),

    /// Create an account
    Signup(SignupArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Raw path access ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Slash-delimited path, e.g. `smartLight/brightness`
    pub path: String,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Slash-delimited path
    pub path: String,

    /// JSON value: `true`, `47`, `"text"`, `{"state": true}`
    pub value: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Slash-delimited path
    pub path: String,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Scenes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScenesArgs {
    #[command(subcommand)]
    pub command: Option<ScenesCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ScenesCommand {
    /// Show every scene
    Show,

    /// Switch a scene on or off
    Set {
        #[arg(value_parser = parse_scene)]
        scene: Scene,
        state: Power,
    },

    /// Flip a scene
    Toggle {
        #[arg(value_parser = parse_scene)]
        scene: Scene,
    },
}

/// Accepts `goOut`, `go-out`, `go_out` or `GOOUT`.
fn parse_scene(raw: &str) -> Result<Scene, String> {
    let compact: String = raw.chars().filter(|c| !matches!(c, '-' | '_' | ' ')).collect();
    compact.parse().map_err(|_| {
        "expected one of: get-up, good-night, go-out, lobby, conference-room".to_owned()
    })
}

// ── Smart light ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LightArgs {
    #[command(subcommand)]
    pub command: Option<LightCommand>,
}

#[derive(Debug, Subcommand)]
pub enum LightCommand {
    /// Show power, brightness and schedule
    Show,
    /// Switch the light on
    On,
    /// Switch the light off
    Off,
    /// Set brightness in percent (0-100)
    Brightness {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    /// Set the on/off schedule, e.g. `schedule "9:00 AM" "6:00 PM"`
    Schedule { from: String, to: String },
}

// ── LED ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LedArgs {
    #[command(subcommand)]
    pub command: Option<LedCommand>,
}

#[derive(Debug, Subcommand)]
pub enum LedCommand {
    /// Show the LED state
    Show,
    /// Switch the LED on
    On,
    /// Switch the LED off
    Off,
    /// Flip the LED
    Toggle,
}

// ── Sensors ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SensorsArgs {
    /// Keep listening for new samples
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Stop after this many samples (with --watch)
    #[arg(long, short = 'n', requires = "watch")]
    pub count: Option<usize>,
}

// ── Floors ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FloorArgs {
    #[command(subcommand)]
    pub command: Option<FloorCommand>,
}

#[derive(Debug, Subcommand)]
pub enum FloorCommand {
    /// Show every cabin, or one
    Show { cabin: Option<String> },

    /// Flip one device in a cabin, e.g. `toggle "Cabin 2" HVAC`
    Toggle { cabin: String, device: String },

    /// Write every cabin's current state back to the database
    Sync,
}

// ── Accounts ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (defaults to the profile's `email`)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompted when omitted)
    #[arg(long, env = "BMS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Store the returned token in the system keyring for this profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct SignupArgs {
    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "BMS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Password confirmation (prompted when omitted)
    #[arg(long)]
    pub confirm: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,
    /// Show the current configuration (secrets masked)
    Show,
    /// Print the config file path
    Path,
    /// Set a value on the active profile
    Set { key: String, value: String },
    /// List profile names (the default is marked with *)
    Profiles,
    /// Make a profile the default
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    pub shell: clap_complete::Shell,
}
