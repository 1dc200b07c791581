use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, Command};
use crate::cli::validation;
use crate::client::{BackendClient, ClientOptions};
use crate::config::{self, ConfigFile};
use crate::countdown::{
    check_missed_updates, spawn_countdown, BarDisplay, SystemClock, UpdateSchedule,
    DEFAULT_FIRST_ELIGIBLE_DAY, DEFAULT_UPDATE_MINUTE,
};
use crate::notify::{Fanout, Notification, NotificationSink, RecordingSink, TerminalSink};
use crate::output::{self, Dashboard, OutputFormat};
use crate::page::Page;
use crate::storage::{FileStore, KeyValueStore, MemoryStore, AUTHORIZATION_KEY};
use crate::utils::{self, SortClick};
use crate::views::{self, View};

const DASHBOARD_TITLE: &str = "Folding Team Competition";

fn print_banner() {
    const BANNER: &str = r#"
    ____      __    ____                         __
   / __/___  / /___/ / /_  ____  ____ __________/ /
  / /_/ __ \/ / __  / __ \/ __ \/ __ `/ ___/ __  /
 / __/ /_/ / / /_/ / /_/ / /_/ / /_/ / /  / /_/ /
/_/  \____/_/\__,_/_.___/\____/\__,_/_/   \__,_/
"#;
    eprint!("{}", BANNER);
    eprintln!("       v{} - folding stats dashboard", env!("CARGO_PKG_VERSION"));
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = String::new();

    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    out.push('\n');

    if let Some(about) = cmd.get_about() {
        out.push_str(&about.to_string());
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        out.push('\n');
        out.push_str(&long_about.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS] [COMMAND]\n\n");

    let subcommands: Vec<&clap::Command> = cmd.get_subcommands().collect();
    if !subcommands.is_empty() {
        out.push_str("Commands:\n");
        for sub in subcommands {
            let about = sub.get_about().map(|a| a.to_string()).unwrap_or_default();
            out.push_str(&format!("  {:<10}{}\n", sub.get_name(), about.trim()));
        }
        out.push('\n');
    }

    let mut sections: Vec<(String, Vec<&clap::Arg>)> = Vec::new();
    let mut section_idx: HashMap<String, usize> = HashMap::new();

    for arg in cmd.get_arguments() {
        if arg.is_hide_set() {
            continue;
        }

        let heading = arg.get_help_heading().unwrap_or("Options").to_string();

        let idx = match section_idx.get(&heading).copied() {
            Some(i) => i,
            None => {
                sections.push((heading.clone(), Vec::new()));
                let i = sections.len() - 1;
                section_idx.insert(heading, i);
                i
            }
        };

        sections[idx].1.push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&heading);
        out.push_str(":\n");

        for arg in args {
            let mut parts: Vec<String> = Vec::new();

            if let Some(short) = arg.get_short() {
                parts.push(format!("-{short}"));
            }

            if let Some(long) = arg.get_long() {
                parts.push(format!("--{long}"));
            }

            if let Some(aliases) = arg.get_visible_aliases() {
                for alias in aliases {
                    let rendered = format!("--{alias}");
                    if !parts.iter().any(|p| p == &rendered) {
                        parts.push(rendered);
                    }
                }
            }

            let mut flags = parts.join(", ");

            if arg.get_action().takes_values() {
                let value_name = arg
                    .get_value_names()
                    .and_then(|names| names.first())
                    .map(|name| name.as_str())
                    .unwrap_or("VALUE");
                flags.push_str(&format!(" <{value_name}>"));
            }

            out.push_str("  ");
            out.push_str(&flags);
            out.push('\n');

            if let Some(help) = arg.get_help() {
                let help = help.to_string();
                if !help.trim().is_empty() {
                    out.push_str("          ");
                    out.push_str(help.trim());
                    out.push('\n');
                }
            }

            out.push('\n');
        }
    }

    out
}

#[derive(Clone, Debug)]
struct RunConfig {
    backend_url: String,
    timeout: u64,
    proxy: Option<String>,
    authorization: Option<String>,
    views: Vec<View>,
    sort_clicks: Vec<SortClick>,
    output: Option<String>,
    output_format: OutputFormat,
    schedule: UpdateSchedule,
    updates_enabled: bool,
    storage_path: PathBuf,
    countdown: bool,
    no_color: bool,
    force_color: bool,
    workers: usize,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let force_color = args.color;
    let no_color = if force_color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let backend_url = args
        .backend_url
        .or(cfg.backend_url)
        .unwrap_or_else(|| ClientOptions::default().base_url);
    utils::validate_backend_url(&backend_url)
        .map_err(|e| format!("invalid backend url '{backend_url}': {e}"))?;

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    let workers = args.workers.or(cfg.workers).unwrap_or(4).max(1);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let authorization = args
        .authorization
        .or(cfg.authorization)
        .filter(|a| !a.trim().is_empty());

    let views = if !args.view.is_empty() {
        let mut joined: Vec<&str> = Vec::new();
        for raw in args.view.iter() {
            joined.extend(raw.split(','));
        }
        utils::parse_views(&joined).map_err(|e| format!("invalid --view: {e}"))?
    } else if let Some(list) = cfg.views.as_ref() {
        utils::parse_views(list.as_slice()).map_err(|e| format!("invalid views in config: {e}"))?
    } else {
        View::ALL.to_vec()
    };

    let sort_raw = if args.sort.is_empty() {
        cfg.sort.unwrap_or_default()
    } else {
        args.sort
    };
    let sort_clicks = sort_raw
        .iter()
        .map(|raw| utils::parse_sort_click(raw).map_err(|e| format!("invalid sort '{raw}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format_raw = args.output_format.or(cfg.output_format);
    let output_format = match output_format_raw.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json, or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let schedule = UpdateSchedule {
        update_minute: args
            .update_minute
            .or(cfg.update_minute)
            .unwrap_or(DEFAULT_UPDATE_MINUTE),
        first_eligible_day: args
            .first_day
            .or(cfg.first_eligible_day)
            .unwrap_or(DEFAULT_FIRST_ELIGIBLE_DAY),
    };
    schedule.validate()?;

    let updates_enabled = !args.disable_updates && cfg.updates_enabled.unwrap_or(true);
    let storage_path = args
        .storage
        .or(cfg.storage_path)
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(config::default_storage_path);

    Ok(RunConfig {
        backend_url,
        timeout,
        proxy,
        authorization,
        views,
        sort_clicks,
        output,
        output_format,
        schedule,
        updates_enabled,
        storage_path,
        countdown: args.countdown,
        no_color,
        force_color,
        workers,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("foldboard={level}")));
    // a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads every panel, applies requested header clicks and, when the update
/// mechanism is on, checks the stored counter. Returns the page and the
/// countdown text for the export.
async fn load_dashboard(
    run: &RunConfig,
    sink: &dyn NotificationSink,
) -> Result<(Page, Option<String>), String> {
    let mut session = MemoryStore::new();
    if let Some(auth) = run.authorization.as_deref() {
        session
            .set(AUTHORIZATION_KEY, auth)
            .map_err(|e| format!("failed to store authorization: {e}"))?;
    }

    let client = BackendClient::new(ClientOptions {
        base_url: run.backend_url.clone(),
        timeout_seconds: run.timeout,
        proxy: run.proxy.clone(),
        authorization: session.get(AUTHORIZATION_KEY),
    })
    .map_err(|e| format!("failed to build backend client: {e}"))?;

    let mut page = Page::new();
    let summary = views::load_panels(&client, &mut page, &run.views, sink).await;
    tracing::info!(
        rendered = summary.rendered.len(),
        failed = summary.failed.len(),
        "panels loaded"
    );

    for click in run.sort_clicks.iter() {
        match page.sort_table(&click.table_id, click.column) {
            Ok(direction) => tracing::debug!(
                table = %click.table_id,
                column = click.column,
                direction = direction.label(),
                "header clicked"
            ),
            Err(e) => {
                tracing::warn!(table = %click.table_id, error = %e, "sort skipped");
                sink.notify(&Notification::failure(format!(
                    "Cannot sort {}: {e}",
                    click.table_id
                )));
            }
        }
    }

    if !run.updates_enabled {
        return Ok((page, None));
    }

    let now = Utc::now();
    let checked = FileStore::open(&run.storage_path).and_then(|mut store| {
        check_missed_updates(&mut store, &run.schedule, now)
    });
    match checked {
        Ok(Some(notice)) => sink.notify(&notice),
        Ok(None) => {}
        Err(e) => tracing::warn!(
            path = %run.storage_path.display(),
            error = %e,
            "update counter unavailable"
        ),
    }

    Ok((page, Some(run.schedule.remaining(now).display())))
}

/// Resolves when `signal` fires. A signal that cannot be installed never
/// resolves, leaving the countdown to run until the process is killed.
async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    } else if run.force_color {
        colored::control::set_override(true);
    }

    // stdout exports already include the notices, so only echo them live when
    // the dashboard goes to a file
    let recorder = RecordingSink::new();
    let sink: Fanout = if run.output.is_some() {
        print_banner();
        format_kv_line("Backend", &run.backend_url);
        format_kv_line(
            "Views",
            &run.views.iter().map(|v| v.name()).collect::<Vec<_>>().join(","),
        );
        format_kv_line("Updates", format_bool(run.updates_enabled));
        eprintln!();
        Fanout(vec![Arc::new(TerminalSink::new()), Arc::new(recorder.clone())])
    } else {
        Fanout(vec![Arc::new(recorder.clone())])
    };

    let (page, countdown) = load_dashboard(&run, &sink).await?;

    let dashboard = Dashboard {
        title: DASHBOARD_TITLE,
        countdown,
        schedule: run.schedule,
        notices: recorder.notifications(),
        page: &page,
    };
    let rendered = output::render(run.output_format, &dashboard);

    match run.output.as_ref() {
        Some(outfile_path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
            format_kv_line("Output", outfile_path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }

    if run.countdown {
        let display = BarDisplay::new();
        // printed above the spinner so the live line is not clobbered
        let live = TerminalSink::with_bar(display.bar());
        match spawn_countdown(
            run.updates_enabled,
            run.schedule,
            SystemClock,
            display,
            shutdown_on(tokio::signal::ctrl_c()),
        ) {
            Some(handle) => {
                live.notify(&Notification::info("Countdown running, press Ctrl-C to stop"));
                handle
                    .await
                    .map_err(|e| format!("countdown task failed: {e}"))?
            }
            None => tracing::warn!("countdown requested but updates are disabled"),
        }
    }

    Ok(())
}

fn run_init(path: Option<String>) -> Result<(), String> {
    let path = match path {
        Some(p) => config::expand_tilde(&p),
        None => config::default_config_path()
            .ok_or_else(|| "could not determine home directory".to_string())?,
    };
    if config::ensure_default_config_file(&path)? {
        println!(":: {:<10}: {}", "Created", path.display());
    } else {
        println!(":: {:<10}: {}", "Exists", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    if args.command == Some(Command::Init) {
        return run_init(args.config.clone());
    }

    let cfg = match args.config.clone() {
        Some(path) => config::load_config(&config::expand_tilde(&path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    tracing::debug!(?run, "resolved configuration");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(run.workers)
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
