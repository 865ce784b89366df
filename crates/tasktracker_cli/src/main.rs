use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tasktracker_cli::cli::{
    Cli, Command, ConfigOverrideTarget, StatsCommand, parse_config_override, parse_status,
};
use tasktracker_core::config::{self, ConfigOverrides, Palette};
use tasktracker_core::error::AppError;
use tasktracker_core::model::{Task, TaskStatus, parse_date};
use tasktracker_core::stats::{
    self, CompletionStats, MostProductiveDay, Period, TrendSeries,
};
use tasktracker_core::storage::json_store;
use tasktracker_core::task_api::{self, TaskChanges};
use time::{OffsetDateTime, UtcOffset};

fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::NotStarted => "Not Started",
        TaskStatus::InProgress => "In Progress",
        TaskStatus::Completed => "Completed",
    }
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct TrendRow {
    #[tabled(rename = "Window")]
    label: String,
    #[tabled(rename = "Completed")]
    completed: usize,
}

struct CliContext {
    store_path: PathBuf,
    palette: Palette,
}

fn resolve_context(cli: &Cli) -> Result<CliContext, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {}", err);
    }

    let mut overrides = ConfigOverrides::default();
    for raw in &cli.config_override {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::DataPath => {
                overrides.data_path = Some(PathBuf::from(parsed.value))
            }
        }
    }

    let merged = config::merge_overrides(&loaded.config, &overrides);
    let store_path = json_store::store_path(merged.data_path.as_deref())?;
    let palette = config::palette_for_theme(merged.theme.as_deref());

    Ok(CliContext {
        store_path,
        palette,
    })
}

fn local_now() -> OffsetDateTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}

fn print_task_json(task: &Task) {
    let json = serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "date": task.date.to_string(),
        "status": task.status,
        "createdAt": task.created_at,
    });
    println!("{}", json);
}

fn print_tasks_json(tasks: &[Task]) {
    let payload: Vec<serde_json::Value> = tasks
        .iter()
        .map(|task| {
            serde_json::json!({
                "id": task.id,
                "title": task.title,
                "description": task.description,
                "date": task.date.to_string(),
                "status": task.status,
                "createdAt": task.created_at,
            })
        })
        .collect();
    println!("{}", serde_json::Value::Array(payload));
}

fn print_tasks_table(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|task| TaskRow {
            id: task.id.clone(),
            title: task.title.clone(),
            date: task.date.to_string(),
            status: status_label(task.status),
            description: task.description.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_task_details(task: &Task, palette: &Palette) {
    println!("{} {}", palette.mutedize("Title:"), task.title);
    println!("{} {}", palette.mutedize("ID:"), task.id);
    println!("{} {}", palette.mutedize("Date:"), task.date);
    println!("{} {}", palette.mutedize("Status:"), status_label(task.status));
    println!(
        "{} {}",
        palette.mutedize("Description:"),
        task.description.as_deref().unwrap_or("-")
    );
    println!("{} {}", palette.mutedize("Created:"), task.created_at);
}

fn print_overview(raw_period: &str, overview: &CompletionStats, json: bool, palette: &Palette) {
    if json {
        let payload = serde_json::json!({
            "period": raw_period,
            "totalTasks": overview.total_tasks,
            "completedTasks": overview.completed_tasks,
            "notStartedTasks": overview.not_started_tasks,
            "inProgressTasks": overview.in_progress_tasks,
            "completionRate": overview.completion_rate,
        });
        println!("{}", payload);
        return;
    }

    let label = overview
        .period
        .map(Period::name)
        .unwrap_or("trailing week");
    println!("{}", palette.accentize(&format!("Completion overview ({label})")));
    println!("Total tasks:     {}", overview.total_tasks);
    println!("Completed:       {}", overview.completed_tasks);
    println!("In progress:     {}", overview.in_progress_tasks);
    println!("Not started:     {}", overview.not_started_tasks);
    println!("Completion rate: {:.1}%", overview.completion_rate);
}

fn print_trend(raw_period: &str, trend: &TrendSeries, json: bool) {
    if json {
        let payload = serde_json::json!({
            "labels": trend.labels,
            "data": trend.data,
        });
        println!("{}", payload);
        return;
    }

    if trend.labels.is_empty() {
        println!("No trend data for period '{raw_period}'.");
        return;
    }

    let rows: Vec<TrendRow> = trend
        .labels
        .iter()
        .zip(&trend.data)
        .map(|(label, completed)| TrendRow {
            label: label.clone(),
            completed: *completed,
        })
        .collect();
    println!("{}", Table::new(rows));
}

fn print_best_day(best: &MostProductiveDay, json: bool, palette: &Palette) {
    if json {
        let payload = serde_json::json!({
            "day": best.day.to_string(),
            "completionRate": best.completion_rate,
            "totalTasks": best.total_tasks,
            "completedTasks": best.completed_tasks,
        });
        println!("{}", payload);
        return;
    }

    println!(
        "Most productive day: {}",
        palette.accentize(&best.day.to_string())
    );
    println!("Completion rate: {:.1}%", best.completion_rate);
    println!(
        "Tasks: {} total, {} completed",
        best.total_tasks, best.completed_tasks
    );
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let context = resolve_context(&cli)?;
    let store = context.store_path.as_path();
    let palette = &context.palette;

    match cli.command {
        Command::Add {
            title,
            date,
            description,
            status,
        } => {
            let title = match title {
                Some(value) if !value.trim().is_empty() => value,
                _ => return Err(AppError::invalid_input("title is required")),
            };
            let date = parse_date(&date)?;
            let status = match status.as_deref() {
                Some(raw) => parse_status(raw)?,
                None => TaskStatus::NotStarted,
            };

            let task = task_api::add_task(store, &title, description.as_deref(), date, status)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Added task: {} ({})", task.title, task.id);
            }
        }
        Command::Edit {
            id,
            title,
            description,
            date,
            status,
        } => {
            let changes = TaskChanges {
                title,
                description,
                date: date.as_deref().map(parse_date).transpose()?,
                status: status.as_deref().map(parse_status).transpose()?,
            };

            let task = task_api::update_task(store, &id, &changes)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Updated task: {} ({})", task.title, task.id);
            }
        }
        Command::Delete { id } => {
            let task = task_api::delete_task(store, &id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                println!("Deleted task: {} ({})", task.title, task.id);
            }
        }
        Command::Show { id } => {
            let task = task_api::get_task_by_id(store, &id)?;
            if cli.json {
                print_task_json(&task);
            } else {
                print_task_details(&task, palette);
            }
        }
        Command::List {
            date,
            from,
            to,
            status,
        } => {
            let status_filter = status.as_deref().map(parse_status).transpose()?;
            let range_mode = date.is_some() || from.is_some() || to.is_some();

            let mut tasks = if let Some(raw) = date.as_deref() {
                task_api::list_for_date(store, parse_date(raw)?)?
            } else if from.is_some() || to.is_some() {
                let from = from.as_deref().map(parse_date).transpose()?;
                let to = to.as_deref().map(parse_date).transpose()?;
                task_api::list_in_range(store, from, to)?
            } else if let Some(status) = status_filter {
                task_api::list_by_status(store, status)?
            } else {
                task_api::list_all(store)?
            };

            if range_mode && let Some(status) = status_filter {
                tasks.retain(|task| task.status == status);
            }

            // Newest due date first.
            tasks.sort_by(|a, b| b.date.cmp(&a.date));

            if cli.json {
                print_tasks_json(&tasks);
            } else {
                print_tasks_table(&tasks);
            }
        }
        Command::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .map_err(|err| AppError::io(format!("{}: {}", file.display(), err)))?;
            let tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
                AppError::invalid_data(format!("invalid JSON in {}: {}", file.display(), err))
            })?;

            let count = task_api::replace_all(store, tasks)?;
            if cli.json {
                println!("{}", serde_json::json!({ "imported": count }));
            } else {
                println!("Imported {} tasks", count);
            }
        }
        Command::Export { file } => {
            let count = task_api::export_tasks(store, &file)?;
            if cli.json {
                println!("{}", serde_json::json!({ "exported": count }));
            } else {
                println!("Exported {} tasks to {}", count, file.display());
            }
        }
        Command::Stats { stats: command } => {
            let tasks = task_api::list_all(store)?;
            let now = local_now();

            match command {
                StatsCommand::Overview { period } => {
                    let raw = period.unwrap_or_else(|| "week".to_string());
                    let overview = stats::completion_stats(&tasks, Period::parse(&raw), now);
                    print_overview(&raw, &overview, cli.json, palette);
                }
                StatsCommand::Trend { period } => {
                    let raw = period.unwrap_or_else(|| "week".to_string());
                    let period = Period::parse(&raw)
                        .ok_or_else(|| AppError::invalid_input(format!("unknown period '{raw}'")))?;
                    let trend = stats::completion_trend(&tasks, period, now);
                    print_trend(&raw, &trend, cli.json);
                }
                StatsCommand::Score => {
                    let score = stats::productivity_score(&tasks, now);
                    if cli.json {
                        println!("{}", serde_json::json!({ "score": score }));
                    } else {
                        println!(
                            "Productivity score: {}",
                            palette.accentize(&format!("{score} / 100"))
                        );
                    }
                }
                StatsCommand::BestDay => {
                    let best = stats::most_productive_day(&tasks);
                    print_best_day(&best, cli.json, palette);
                }
            }
        }
    }

    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasktracker".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
