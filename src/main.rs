mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use clap::Parser as ClapParser;
use color_eyre::eyre::{Result, WrapErr};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};

use agentree::app::App;
use agentree::drag::AutoScroll;
use agentree::events::{self, AppEvent};
use agentree::generation::{CommandGenerator, GenerationTracker, Generator, UnconfiguredGenerator};
use agentree::project::{load_project, sample_project, ProjectFile, ToolRegistry};
use agentree::store::AgentStore;
use agentree::tree::compute_roots;

#[derive(ClapParser, Debug)]
#[command(name = "agentree", about = "Edit hierarchical agent compositions in the terminal")]
struct Cli {
    /// Project JSON to open (a built-in sample is used if omitted).
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Program that turns a description into an agent config (JSON over stdin/stdout).
    #[arg(short, long)]
    generator: Option<PathBuf>,

    /// Extra argument passed to the generator program (repeatable).
    #[arg(long = "generator-arg")]
    generator_args: Vec<String>,

    /// Context id sent with generation requests (defaults to the project name).
    #[arg(long)]
    context_id: Option<String>,

    /// Write logs to this file; the terminal belongs to the TUI.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the agent tree to stdout instead of launching the TUI.
    #[arg(long)]
    dump: bool,

    /// Rows from the tree's edge where drag auto-scroll starts.
    #[arg(long, default_value_t = 3)]
    autoscroll_margin: u16,

    /// Rows per tick when dragging right at the edge.
    #[arg(long, default_value_t = 3)]
    autoscroll_speed: u16,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path, &cli.log_level)?;
    }

    let project = match &cli.project {
        Some(path) => load_project(path)?,
        None => sample_project(),
    };
    info!(
        project = %project.name,
        agents = project.agents.len(),
        "project loaded"
    );

    if cli.dump {
        dump_tree(&project);
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().wrap_err("Failed to start async runtime")?;
    let (tx, rx) = mpsc::channel::<AppEvent>();

    let generator: Arc<dyn Generator> = match &cli.generator {
        Some(program) => Arc::new(CommandGenerator::new(program, cli.generator_args.clone())),
        None => Arc::new(UnconfiguredGenerator),
    };
    let context_id = cli.context_id.clone().unwrap_or_else(|| project.name.clone());
    let tracker = GenerationTracker::new(generator, runtime.handle().clone(), tx.clone(), context_id);

    let registry = ToolRegistry::from_project(&project);
    let mut app = App::new(AgentStore::from_nodes(project.agents), registry, tracker);
    app.autoscroll = AutoScroll {
        margin: cli.autoscroll_margin,
        max_speed: cli.autoscroll_speed,
    };

    // Launch TUI.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui(&mut terminal, &mut app, tx, rx, cli.project.as_deref());

    // Restore terminal.
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn init_logging(path: &Path, level: &str) -> Result<()> {
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create log file: {}", path.display()))?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .wrap_err("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(())
}

fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: mpsc::Sender<AppEvent>,
    rx: mpsc::Receiver<AppEvent>,
    project_path: Option<&Path>,
) -> Result<()> {
    events::spawn_input_reader(tx.clone());

    // Ticks keep auto-scroll going while the pointer rests near an edge.
    events::spawn_tick_timer(tx.clone(), Duration::from_millis(100));

    // Watch the project file's directory; editors often replace the file
    // instead of writing it in place.
    let _project_watcher = match project_path {
        Some(path) => Some(watch_project_file(path, tx)?),
        None => None,
    };

    loop {
        terminal.draw(|f| {
            app.viewport = ui::tree_area(f.area());
            ui::render(f, app);
        })?;

        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(AppEvent::Key(key)) => app.handle_key(key),
            Ok(AppEvent::Mouse(mouse)) => app.handle_mouse(mouse),
            Ok(AppEvent::Resize) => {}
            Ok(AppEvent::GenerationSettled(settled)) => app.on_generation_settled(settled),
            Ok(AppEvent::RegistryChanged(path)) => match load_project(&path) {
                Ok(project) => app.replace_registry(ToolRegistry::from_project(&project)),
                Err(err) => warn!(error = %format!("{err:#}"), "keeping previous tool registry"),
            },
            Ok(AppEvent::Tick) => app.on_tick(),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn watch_project_file(
    path: &Path,
    tx: mpsc::Sender<AppEvent>,
) -> Result<notify::RecommendedWatcher> {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let watched = path.clone();
    let mut watcher = notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                && event.paths.iter().any(|p| p == &watched)
            {
                let _ = tx.send(AppEvent::RegistryChanged(watched.clone()));
            }
        }
    })?;
    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

fn dump_tree(project: &ProjectFile) {
    let store = AgentStore::from_nodes(project.agents.iter().cloned());
    println!(
        "Project: {} ({} agents, {} mcp servers, {} custom tools)",
        project.name,
        store.len(),
        project.mcp_servers.len(),
        project.custom_tools.len(),
    );
    println!();

    let mut path = Vec::new();
    for root in compute_roots(&store) {
        print_agent(&store, &root, &mut path);
    }
}

fn print_agent(store: &AgentStore, id: &str, path: &mut Vec<String>) {
    let Some(node) = store.get(id) else {
        return;
    };
    let pad = "  ".repeat(path.len() + 1);
    if path.iter().any(|p| p == id) {
        println!("{}{} {} (cycle)", pad, node.kind_label(), node.name);
        return;
    }
    println!("{}{} {} [{}]", pad, node.kind_label(), node.name, node.id);
    for tool in node.tools() {
        println!("{}  - {}", pad, tool);
    }
    path.push(node.id.clone());
    for child in node.children() {
        print_agent(store, child, path);
    }
    path.pop();
}
