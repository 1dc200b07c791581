use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "foldboard",
    version,
    about = "terminal dashboard for folding team competition stats",
    long_about = "Foldboard loads the stats backend's hardware, teams, users and leaderboard collections, renders them as sortable tables, and counts down to the next hourly stats update.\n\nExamples:\n  foldboard -b http://localhost:8080\n  foldboard -b http://stats.local --view leaderboard --view competition --sort user_stats:3\n  foldboard -o board.html --countdown\n  foldboard init\n\nTip: Run `foldboard init` to write ~/.foldboard/config.yml and keep CLI invocations short."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "o",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the dashboard to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'f',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json, or html (inferred from --output extension when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.foldboard/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'p',
        long = "vw",
        visible_alias = "view",
        value_name = "VIEW",
        action = ArgAction::Append,
        help_heading = "Panels",
        help = "Panel to load: hardware, teams, users, leaderboard, competition, or all (repeatable, comma-separated allowed)."
    )]
    pub view: Vec<String>,

    #[arg(
        long = "srt",
        visible_alias = "sort",
        value_name = "TABLE:COLUMN",
        action = ArgAction::Append,
        help_heading = "Panels",
        help = "Click a table header after loading, e.g. leaderboard:2 (repeatable, applied in order)."
    )]
    pub sort: Vec<String>,

    #[arg(
        short = 'b',
        long = "bu",
        visible_alias = "backend-url",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Base URL of the stats backend."
    )]
    pub backend_url: Option<String>,

    #[arg(
        short = 'A',
        long = "auth",
        visible_alias = "authorization",
        value_name = "VALUE",
        help_heading = "HTTP",
        help = "Authorization header value sent with every backend request."
    )]
    pub authorization: Option<String>,

    #[arg(
        short = 't',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        long = "cd",
        visible_alias = "countdown",
        help_heading = "Updates",
        help = "Keep running and show a live countdown to the next stats update (Ctrl-C to stop)."
    )]
    pub countdown: bool,

    #[arg(
        short = 'm',
        long = "um",
        visible_alias = "update-minute",
        value_name = "MINUTE",
        help_heading = "Updates",
        help = "Minute past each UTC hour when stats update (0-59)."
    )]
    pub update_minute: Option<u32>,

    #[arg(
        short = 'd',
        long = "fd",
        visible_alias = "first-day",
        value_name = "DAY",
        help_heading = "Updates",
        help = "First day of the month on which hourly updates run (1-31)."
    )]
    pub first_day: Option<u32>,

    #[arg(
        long = "du",
        visible_alias = "disable-updates",
        help_heading = "Updates",
        help = "Disable the countdown and missed-update notice."
    )]
    pub disable_updates: bool,

    #[arg(
        short = 's',
        long = "st",
        visible_alias = "storage",
        value_name = "FILE",
        help_heading = "Updates",
        help = "Durable storage file for the update counter (defaults to ~/.foldboard/storage.json)."
    )]
    pub storage: Option<String>,

    #[arg(
        short = 'w',
        long = "wk",
        visible_alias = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of runtime worker threads."
    )]
    pub workers: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a commented default config file (leaves an existing one alone).
    Init,
}
