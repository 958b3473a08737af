//! Line-driven driver over an in-process tracker.
//!
//! # Responsibility
//! - Wire `TrackerConfig`, logging, and one `MemoryServer` client together.
//! - Translate stdin commands into `TodoList` operations and print the view.
//!
//! # See also
//! - `tasksync_core::TodoList` for command semantics.

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use tasksync_core::{
    default_log_level, init_logging, label_for, route_for_mode, MemoryServer, TodoItem, TodoList,
    TrackerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "tasksync", version, about = "Task list over an in-process synced store")]
struct Cli {
    /// JSON tracker config; missing fields take defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Absolute directory for rolling log files.
    #[arg(long)]
    log_dir: Option<String>,
}

/// One stdin line, parsed as a command.
#[derive(Parser, Debug)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a task.
    Add {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        title: Vec<String>,
    },
    /// Flip completion of the n-th visible task.
    Toggle { index: usize },
    /// Replace the title of the n-th visible task; a blank title removes it.
    Edit {
        index: usize,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        title: Vec<String>,
    },
    /// Remove the n-th visible task.
    Rm { index: usize },
    /// Remove completed tasks.
    Clear,
    /// Mark every task completed or active.
    All { state: Switch },
    /// Set the filter from a route such as `#/active`.
    Route { fragment: String },
    /// Persist queued writes.
    Flush,
    /// Print the visible tasks.
    List,
    /// Leave the driver.
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

fn load_config(path: Option<&PathBuf>) -> Result<TrackerConfig, String> {
    let Some(path) = path else {
        return Ok(TrackerConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|err| format!("cannot read `{}`: {err}", path.display()))?;
    TrackerConfig::from_json_str(&raw).map_err(|err| err.to_string())
}

fn visible(list: &TodoList, n: usize) -> Result<Rc<TodoItem>, String> {
    n.checked_sub(1)
        .and_then(|i| list.filtered_todos().get(i).cloned())
        .ok_or_else(|| format!("no visible task #{n}"))
}

fn print_view(list: &TodoList, out: &mut impl Write) -> io::Result<()> {
    for (i, item) in list.filtered_todos().iter().enumerate() {
        let mark = if item.is_completed() { "x" } else { " " };
        writeln!(out, "{:>3}. [{mark}] {}", i + 1, item.title().get())?;
    }
    let remaining = list.remaining_count();
    writeln!(
        out,
        "{remaining} {} left, {} completed, filter {}",
        label_for(remaining),
        list.completed_count(),
        route_for_mode(list.filter_mode())
    )
}

/// Runs one input line. Returns `Ok(false)` when the driver should stop.
fn run_command(
    server: &MemoryServer,
    list: &TodoList,
    line: &str,
    out: &mut impl Write,
) -> Result<bool, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(true);
    }
    let command = match Line::try_parse_from(words) {
        Ok(parsed) => parsed.command,
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            write!(out, "{}", err.render()).map_err(|err| err.to_string())?;
            return Ok(true);
        }
        Err(err) => return Err(err.render().to_string().trim_end().to_string()),
    };

    match command {
        Command::Add { title } => {
            list.set_current(title.join(" "));
            if list.add().is_none() {
                return Err("title must not be blank".to_string());
            }
        }
        Command::Toggle { index } => {
            let item = visible(list, index)?;
            item.completed().set(!item.is_completed());
        }
        Command::Edit { index, title } => {
            let item = visible(list, index)?;
            list.edit_item(&item);
            for key in list.take_focus_requests() {
                log::debug!("event=cli_focus module=cli status=ok key={key}");
            }
            item.title().set(title.join(" "));
            list.save_editing(&item);
        }
        Command::Rm { index } => {
            let item = visible(list, index)?;
            list.remove(&item);
        }
        Command::Clear => {
            list.remove_completed();
        }
        Command::All { state } => list.set_all_completed(matches!(state, Switch::On)),
        Command::Route { fragment } => {
            list.apply_route(&fragment);
        }
        Command::Flush => {
            let report = server.flush();
            for err in server.take_errors() {
                writeln!(out, "write failed: {err}").map_err(|err| err.to_string())?;
            }
            writeln!(out, "applied {} failed {}", report.applied, report.failed)
                .map_err(|err| err.to_string())?;
            return Ok(true);
        }
        Command::List => {}
        Command::Quit => return Ok(false),
    }
    print_view(list, out).map_err(|err| err.to_string())?;
    Ok(true)
}

/// Feeds `input` line by line until `quit` or end of input.
///
/// Command errors are reported and skipped; I/O errors on either side stop
/// the loop.
fn drive(
    server: &MemoryServer,
    list: &TodoList,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        match run_command(server, list, &line, out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(message) => eprintln!("error: {message}"),
        }
        out.flush()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };

    if let Some(dir) = cli.log_dir.as_deref() {
        if let Err(err) = init_logging(default_log_level(), dir) {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    }

    let server = MemoryServer::new();
    let list = TodoList::with_client(config, server.connect());
    println!("tasksync {} ready; type `help`", tasksync_core::core_version());

    let mut stdout = io::stdout();
    if let Err(err) = drive(&server, &list, io::stdin().lock(), &mut stdout) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    server.flush();
    ExitCode::SUCCESS
}
