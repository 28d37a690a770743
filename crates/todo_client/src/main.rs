use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use todo_client::{
    partition, suggestions, visible_todos, DashboardStats, DataSource, Filter, LocalStorage,
    Preferences, Repository, TodoApp,
};
use todo_core::{Priority, Todo};

#[derive(Parser)]
#[command(name = "todo", about = "Todo list over local storage or the todo API")]
struct Cli {
    /// Directory holding storage.json and logs (default: $HOME/.todo)
    #[arg(long, global = true, env = "TODO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "TODO_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the data source
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
    #[command(flatten)]
    Todo(TodoCommand),
}

#[derive(Subcommand)]
enum TodoCommand {
    /// Show todos, active first then completed
    List {
        #[arg(long, default_value = "all")]
        filter: Filter,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a todo
    Add {
        text: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// Mark a todo completed
    Done { id: String },
    /// Mark a todo active again
    Undo { id: String },
    /// Replace a todo's text
    Edit { id: String, text: String },
    /// Change a todo's priority
    Priority { id: String, priority: Priority },
    /// Delete a todo
    Rm { id: String },
    /// Delete every completed todo
    ClearCompleted,
    /// Show completion progress
    Stats,
    /// Suggest existing texts matching a query
    Suggest {
        #[arg(default_value = "")]
        query: String,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Print the stored data source and API base URL
    Show,
    /// Always use local storage
    Local,
    /// Always use the API
    Api {
        #[arg(long)]
        api_base: Option<String>,
    },
    /// Probe the API on next start and pin the result
    Auto {
        #[arg(long)]
        api_base: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let data_dir = resolve_data_dir(cli.data_dir)?;
    init_logging(&data_dir, cli.log_level.as_deref())?;

    let storage = LocalStorage::in_dir(&data_dir);
    let command = match cli.command {
        Commands::Source { action } => return run_source(&storage, action),
        Commands::Todo(command) => command,
    };

    let repo = Repository::resolve(&storage).await?;
    let mut app = TodoApp::new(repo);
    let outcome = run_command(&mut app, command).await;
    if let Some(message) = app.error() {
        eprintln!("{message}");
    }
    outcome
}

fn resolve_data_dir(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir,
        None => std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".todo"))
            .ok_or_else(|| anyhow!("HOME is not set; pass --data-dir"))?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data dir {}", dir.display()))?;
    dir.canonicalize()
        .with_context(|| format!("failed to resolve data dir {}", dir.display()))
}

fn init_logging(data_dir: &Path, level: Option<&str>) -> anyhow::Result<()> {
    let log_dir = data_dir.join("logs");
    let log_dir = log_dir
        .to_str()
        .ok_or_else(|| anyhow!("data dir is not valid UTF-8: {}", data_dir.display()))?;
    let level = level.unwrap_or(todo_core::default_log_level());
    todo_core::init_logging(level, Some(log_dir)).map_err(anyhow::Error::msg)
}

fn run_source(storage: &LocalStorage, action: SourceAction) -> anyhow::Result<()> {
    let prefs = Preferences::new(storage);
    let (source, api_base) = match action {
        SourceAction::Show => {
            let source = prefs
                .data_source()
                .map_or("unset (auto)", DataSource::as_str);
            println!("source: {source}");
            println!("api-base: {}", prefs.api_base());
            return Ok(());
        }
        SourceAction::Local => (DataSource::Local, None),
        SourceAction::Api { api_base } => (DataSource::Api, api_base),
        SourceAction::Auto { api_base } => (DataSource::Auto, api_base),
    };

    if let Some(api_base) = api_base {
        prefs.set_api_base(&api_base)?;
    }
    prefs.set_data_source(source)?;
    println!("source: {source}");
    Ok(())
}

async fn run_command(app: &mut TodoApp, command: TodoCommand) -> anyhow::Result<()> {
    match command {
        TodoCommand::List { filter, search } => {
            app.load().await?;
            let visible = visible_todos(app.todos(), filter, &search);
            let (active, completed) = partition(&visible);
            for todo in active.iter().chain(completed.iter()) {
                println!("{}", render(todo));
            }
            println!("{}", DashboardStats::from_todos(app.todos()).count_label());
        }
        TodoCommand::Add { text, priority } => match app.add(&text, priority).await? {
            Some(todo) => println!("{}", render(&todo)),
            None => println!("nothing to add"),
        },
        TodoCommand::Done { id } => println!("{}", render(&app.set_completed(&id, true).await?)),
        TodoCommand::Undo { id } => println!("{}", render(&app.set_completed(&id, false).await?)),
        TodoCommand::Edit { id, text } => match app.edit_text(&id, &text).await? {
            Some(todo) => println!("{}", render(&todo)),
            None => println!("edit cancelled"),
        },
        TodoCommand::Priority { id, priority } => {
            println!("{}", render(&app.set_priority(&id, priority).await?));
        }
        TodoCommand::Rm { id } => {
            app.remove(&id).await?;
            println!("removed {id}");
        }
        TodoCommand::ClearCompleted => {
            app.clear_completed().await?;
            println!("{}", DashboardStats::from_todos(app.todos()).count_label());
        }
        TodoCommand::Stats => {
            app.load().await?;
            let stats = DashboardStats::from_todos(app.todos());
            println!("{}", stats.progress_label());
            println!("{}", stats.count_label());
        }
        TodoCommand::Suggest { query } => {
            app.load().await?;
            for text in suggestions(app.todos(), &query) {
                println!("{text}");
            }
        }
    }
    Ok(())
}

fn render(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    format!("[{mark}] {} ({}) {}", todo.id, todo.priority, todo.text)
}
