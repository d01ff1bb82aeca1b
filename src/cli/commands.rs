use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::config::Config;
use crate::db::DbConnection;
use crate::filter::{parse_filter, FilterContext};
use crate::models::{Stage, WorkOrder};
use crate::pipeline::{export_summary, month_grid, Board, CalendarFilters, MonthCursor, MoveOutcome, StageRegistry};
use crate::repo::StageRepo;
use crate::source::{generate_sample_orders, load_or_sample, save_work_orders, OrderOrigin, DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_SEED};
use crate::cli::output::{
    format_board, format_calendar, format_capacity_report, format_metrics, format_stage_list,
    format_work_order_detail, OutputStyle,
};
use crate::cli::error::{board_error, user_error, validate_non_empty, validate_priority, validate_stage_index, validate_wip_limit};
use crate::cli::abbrev;
use chrono::{Local, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "benchboard")]
#[command(about = "Production kanban for jewelry workshops - stages, WIP limits, bottlenecks and cycle-time metrics")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Work-order JSON file (overrides orders.location in ~/.benchboard/rc)
    #[arg(long, global = true, value_name = "PATH")]
    pub orders: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the kanban board
    Board {
        /// Filter arguments (e.g., "+overdue priority=high assignee=mara sort=due")
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
        /// Only show this stage's column
        #[arg(long)]
        stage: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show one work order with its stage history
    Show {
        /// Work order id or order number
        order: String,
    },
    /// Move a work order to another stage
    Move {
        /// Work order id or order number
        order: String,
        /// Target stage id or name
        stage: String,
    },
    /// Per-stage load against WIP limits
    Capacity {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Production metrics: WIP, cycle time, throughput, workload
    Metrics {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Month calendar of due dates grouped by stage
    Calendar {
        /// Month to show: YYYY-MM, today, next or prev (default: today)
        month: Option<String>,
        /// Only include these stages (repeatable)
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// Only include these priorities (repeatable)
        #[arg(long = "priority")]
        priorities: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Export a month summary as JSON
    Export {
        /// Month to export: YYYY-MM, today, next or prev (default: today)
        month: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Only include these stages (repeatable)
        #[arg(long = "stage")]
        stages: Vec<String>,
        /// Only include these priorities (repeatable)
        #[arg(long = "priority")]
        priorities: Vec<String>,
    },
    /// Pipeline stage management commands
    Stages {
        #[command(subcommand)]
        subcommand: StageCommands,
    },
    /// Generate sample work orders
    Sample {
        /// Number of work orders
        #[arg(long, default_value_t = DEFAULT_SAMPLE_COUNT)]
        count: usize,
        /// Random seed; the same seed produces the same orders
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SEED)]
        seed: u64,
        /// Write to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum StageCommands {
    /// List active and removed stages
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Append a custom stage
    Add {
        /// Stage name
        name: String,
        /// WIP limit (default: board.default_wip)
        #[arg(long)]
        wip: Option<String>,
    },
    /// Rename a stage (its id stays the same)
    Rename {
        /// Stage id or name
        stage: String,
        /// New display name
        new_name: String,
    },
    /// Move the stage at position FROM to position TO
    Reorder {
        from: String,
        to: String,
    },
    /// Hide a stage from the board
    Remove {
        /// Stage id or name
        stage: String,
    },
    /// Bring a removed stage back (appended at the end)
    Restore {
        /// Stage id or name
        stage: String,
    },
    /// Set a stage's WIP limit
    Limit {
        /// Stage id or name
        stage: String,
        /// New WIP limit
        limit: String,
    },
    /// Restore the default pipeline, discarding all customization
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

pub fn run() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    // Version and help are clap's business
    if args.is_empty() || args.iter().any(|a| a == "--version" || a == "-V" || a == "--help" || a == "-h") {
        match Cli::try_parse() {
            Ok(_) => return Ok(()),
            Err(e) => {
                e.print()?;
                return Ok(());
            }
        }
    }

    // Expand command abbreviations before processing
    args = match abbrev::expand_command_abbreviations(args) {
        Ok(expanded) => expanded,
        Err(e) => {
            user_error(&e);
        }
    };

    let clap_args = std::iter::once("benchboard".to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>();
    let cli = match Cli::try_parse_from(clap_args) {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors are user errors; help/version display are not
            if e.use_stderr() {
                e.print()?;
                std::process::exit(1);
            }
            e.print()?;
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let orders_override = cli.orders;
    match cli.command {
        Commands::Board { filter, stage, json } => {
            let trailing = split_board_options(filter).unwrap_or_else(|e| user_error(&e));
            handle_board(
                trailing.orders.or(orders_override),
                trailing.filter,
                trailing.stage.or(stage),
                json || trailing.json,
            )
        }
        Commands::Show { order } => handle_show(orders_override, &order),
        Commands::Move { order, stage } => handle_move(orders_override, &order, &stage),
        Commands::Capacity { json } => handle_capacity(orders_override, json),
        Commands::Metrics { json } => handle_metrics(orders_override, json),
        Commands::Calendar { month, stages, priorities, json } => {
            handle_calendar(orders_override, month, stages, priorities, json)
        }
        Commands::Export { month, out, stages, priorities } => {
            handle_export(orders_override, month, out, stages, priorities)
        }
        Commands::Stages { subcommand } => handle_stages(subcommand),
        Commands::Sample { count, seed, out } => handle_sample(count, seed, out),
    }
}

/// Config, ledger connection and the saved stage registry
struct Workspace {
    config: Config,
    conn: Connection,
    registry: StageRegistry,
}

impl Workspace {
    fn open() -> Result<Self> {
        let config = Config::load()?;
        let conn = DbConnection::connect(&config)
            .context("Failed to connect to database")?;
        let registry = StageRepo::load(&conn, config.default_wip)
            .context("Failed to load stage registry")?;
        Ok(Self { config, conn, registry })
    }

    fn orders_path(&self, orders_override: Option<PathBuf>) -> PathBuf {
        orders_override.unwrap_or_else(|| self.config.orders_location.clone())
    }

    /// Load the work-order set into a board
    fn board(self, orders_override: Option<PathBuf>) -> Result<(Board, PathBuf, OrderOrigin)> {
        let path = self.orders_path(orders_override);
        // Sample data covers every stage, removed ones included
        let all_stages: Vec<Stage> = self
            .registry
            .active()
            .iter()
            .chain(self.registry.removed())
            .cloned()
            .collect();
        let (orders, origin) = load_or_sample(&path, &all_stages, Utc::now())
            .with_context(|| format!("Failed to load work orders from {}", path.display()))?;
        let board = Board::new(self.registry, orders, self.config.metrics_settings());
        Ok((board, path, origin))
    }

    fn filter_context(&self) -> FilterContext {
        FilterContext {
            today: today(),
            urgent_days: self.config.urgent_days,
        }
    }

    fn save_registry(&self) -> Result<()> {
        StageRepo::save(&self.conn, &self.registry)
            .context("Failed to save stage registry")
    }

    /// Id of an active stage, or exit with a user error
    fn resolve_stage(&self, reference: &str) -> String {
        match self.registry.find(reference) {
            Some(stage) => stage.id.clone(),
            None if self.registry.lookup(reference).is_some() => {
                user_error(&format!("Stage '{}' is removed from the board", reference))
            }
            None => user_error(&format!("Stage '{}' not found", reference)),
        }
    }

    /// Id of an active or removed stage
    fn lookup_stage(&self, reference: &str) -> String {
        match self.registry.lookup(reference) {
            Some(stage) => stage.id.clone(),
            None => user_error(&format!("Stage '{}' not found", reference)),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a month expression: YYYY-MM, today, next or prev (relative to today)
pub fn parse_month_expr(expr: Option<&str>, today: NaiveDate) -> Result<MonthCursor, String> {
    let current = MonthCursor::today(today);
    let expr = expr.map(|e| e.trim().to_lowercase());
    let cursor = match expr.as_deref() {
        None | Some("today") | Some("this") => Some(current),
        Some("next") => current.next(),
        Some("prev") | Some("previous") | Some("last") => current.prev(),
        Some(other) => MonthCursor::parse(other),
    };
    cursor.ok_or_else(|| {
        format!(
            "Invalid month: '{}'. Use YYYY-MM, today, next or prev.",
            expr.as_deref().unwrap_or("today")
        )
    })
}

/// Options that landed among the trailing filter words of `board`
#[derive(Debug, Default, PartialEq)]
struct BoardOptions {
    filter: Vec<String>,
    stage: Option<String>,
    orders: Option<PathBuf>,
    json: bool,
}

/// Pull `--json`, `--stage` and `--orders` back out of the trailing filter words
fn split_board_options(args: Vec<String>) -> Result<BoardOptions, String> {
    let mut options = BoardOptions::default();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--stage" => {
                let value = iter.next().ok_or_else(|| "--stage requires a stage id or name".to_string())?;
                options.stage = Some(value);
            }
            "--orders" => {
                let value = iter.next().ok_or_else(|| "--orders requires a path".to_string())?;
                options.orders = Some(PathBuf::from(value));
            }
            _ => {
                if let Some(value) = arg.strip_prefix("--stage=") {
                    options.stage = Some(value.to_string());
                } else if let Some(value) = arg.strip_prefix("--orders=") {
                    options.orders = Some(PathBuf::from(value));
                } else {
                    options.filter.push(arg);
                }
            }
        }
    }
    Ok(options)
}

fn calendar_filters(workspace: &Workspace, stages: &[String], priorities: &[String]) -> CalendarFilters {
    CalendarFilters {
        stages: stages.iter().map(|s| workspace.resolve_stage(s)).collect(),
        priorities: priorities
            .iter()
            .map(|p| validate_priority(p).unwrap_or_else(|e| user_error(&e)))
            .collect(),
    }
}

fn handle_board(orders_override: Option<PathBuf>, filter_args: Vec<String>, stage: Option<String>, json: bool) -> Result<()> {
    let workspace = Workspace::open()?;
    let ctx = workspace.filter_context();
    let only_stage = stage.map(|s| workspace.resolve_stage(&s));

    let filter = match parse_filter(filter_args) {
        Ok(filter) => filter,
        Err(e) => user_error(&e),
    };

    let (board, _, _) = workspace.board(orders_override)?;
    let mut columns = board.columns(&filter, &ctx);
    if let Some(stage_id) = &only_stage {
        columns.retain(|c| &c.stage.id == stage_id);
    }

    if json {
        let json_columns: Vec<serde_json::Value> = columns
            .iter()
            .map(|c| {
                serde_json::json!({
                    "stage": c.stage,
                    "load": c.load,
                    "total": c.total,
                    "workOrders": c.orders,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json_columns)?);
        return Ok(());
    }

    let unplaced = if only_stage.is_some() { Vec::new() } else { board.unplaced() };
    print!("{}", format_board(&columns, &unplaced, &ctx, &OutputStyle::detect()));
    Ok(())
}

fn handle_show(orders_override: Option<PathBuf>, reference: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let ctx = workspace.filter_context();
    let (board, _, _) = workspace.board(orders_override)?;
    let Some(order) = board.find_order(reference) else {
        user_error(&format!("Work order '{}' not found", reference));
    };
    print!("{}", format_work_order_detail(order, board.registry(), &ctx));
    Ok(())
}

fn handle_move(orders_override: Option<PathBuf>, reference: &str, target: &str) -> Result<()> {
    let workspace = Workspace::open()?;
    let (mut board, path, origin) = workspace.board(orders_override)?;

    let outcome = board
        .move_order(reference, target, Utc::now())
        .unwrap_or_else(|e| board_error(&e));
    let order = board
        .find_order(reference)
        .map(|o| o.order_number.clone())
        .unwrap_or_else(|| reference.to_string());

    match outcome {
        MoveOutcome::Unchanged => {
            let stage = board
                .find_order(reference)
                .map(|o| board.registry().label_for(&o.current_stage).to_string())
                .unwrap_or_default();
            println!("{} is already in {}.", order, stage);
        }
        MoveOutcome::Moved { from, to } => {
            let registry = board.registry();
            println!(
                "Moved {} from {} to {}.",
                order,
                registry.label_for(&from),
                registry.label_for(&to)
            );
            if origin == OrderOrigin::Sample {
                log::warn!("Saving sample work orders to {}", path.display());
            }
            save_work_orders(&path, board.orders())
                .with_context(|| format!("Failed to save work orders to {}", path.display()))?;
        }
    }
    Ok(())
}

fn handle_capacity(orders_override: Option<PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open()?;
    let (board, _, _) = workspace.board(orders_override)?;
    let report = board.capacity();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_capacity_report(&report, &OutputStyle::detect()));
    }
    Ok(())
}

fn handle_metrics(orders_override: Option<PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open()?;
    let (board, _, _) = workspace.board(orders_override)?;
    let metrics = board.metrics();
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", format_metrics(&metrics, board.registry(), &board.settings().terminal_stage));
    }
    Ok(())
}

fn handle_calendar(
    orders_override: Option<PathBuf>,
    month: Option<String>,
    stages: Vec<String>,
    priorities: Vec<String>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::open()?;
    let today = today();
    let cursor = parse_month_expr(month.as_deref(), today).unwrap_or_else(|e| user_error(&e));
    let filters = calendar_filters(&workspace, &stages, &priorities);
    let link_base = workspace.config.link_base.clone();

    let (board, _, _) = workspace.board(orders_override)?;
    let grid = month_grid(cursor, board.orders(), board.registry(), &filters, &link_base);
    if json {
        println!("{}", serde_json::to_string_pretty(&grid)?);
    } else {
        print!("{}", format_calendar(&grid, today, &OutputStyle::detect()));
    }
    Ok(())
}

fn handle_export(
    orders_override: Option<PathBuf>,
    month: Option<String>,
    out: Option<PathBuf>,
    stages: Vec<String>,
    priorities: Vec<String>,
) -> Result<()> {
    let workspace = Workspace::open()?;
    let cursor = parse_month_expr(month.as_deref(), today()).unwrap_or_else(|e| user_error(&e));
    let filters = calendar_filters(&workspace, &stages, &priorities);

    let (board, _, _) = workspace.board(orders_override)?;
    let summary = export_summary(cursor, board.orders(), board.registry(), &filters, Utc::now());
    let json = serde_json::to_string_pretty(&summary)?;

    match out {
        Some(path) => {
            write_file(&path, &json)?;
            println!(
                "Exported {} work order(s) due in {} to {}.",
                summary.total_orders,
                summary.month,
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn handle_stages(cmd: StageCommands) -> Result<()> {
    let mut workspace = Workspace::open()?;

    match cmd {
        StageCommands::List { json } => {
            if json {
                let listing = serde_json::json!({
                    "active": workspace.registry.active(),
                    "removed": workspace.registry.removed(),
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                print!("{}", format_stage_list(&workspace.registry));
            }
            return Ok(());
        }
        StageCommands::Add { name, wip } => {
            if let Err(e) = validate_non_empty(&name, "Stage name") {
                user_error(&e);
            }
            let limit = match wip {
                Some(value) => validate_wip_limit(&value).unwrap_or_else(|e| user_error(&e)),
                None => workspace.registry.default_wip_limit(),
            };
            let stage = workspace
                .registry
                .add_custom_with_limit(&name, limit)
                .unwrap_or_else(|e| board_error(&e));
            println!("Added stage '{}' (id {}, WIP limit {}).", stage.name, stage.id, stage.wip_limit);
        }
        StageCommands::Rename { stage, new_name } => {
            let stage = workspace
                .registry
                .rename(&stage, &new_name)
                .unwrap_or_else(|e| board_error(&e));
            println!("Renamed stage {} to '{}'.", stage.id, stage.name);
        }
        StageCommands::Reorder { from, to } => {
            let len = workspace.registry.active().len();
            let from = validate_stage_index(&from, len).unwrap_or_else(|e| user_error(&e));
            let to = validate_stage_index(&to, len).unwrap_or_else(|e| user_error(&e));
            workspace
                .registry
                .reorder(from, to)
                .unwrap_or_else(|e| board_error(&e));
            println!("Stage order: {}", workspace.registry.visible_stage_names().join(" > "));
        }
        StageCommands::Remove { stage } => {
            let id = workspace.lookup_stage(&stage);
            let removed = workspace
                .registry
                .remove(&id)
                .unwrap_or_else(|e| board_error(&e));
            if !removed {
                println!("Stage '{}' is already removed.", workspace.registry.label_for(&id));
                return Ok(());
            }
            println!(
                "Removed stage '{}'. Work orders in it stay in the data set; restore with `benchboard stages restore {}`.",
                workspace.registry.label_for(&id),
                id
            );
        }
        StageCommands::Restore { stage } => {
            let id = workspace.lookup_stage(&stage);
            let restored = workspace
                .registry
                .restore(&id)
                .unwrap_or_else(|e| board_error(&e));
            if !restored {
                println!("Stage '{}' is already on the board.", workspace.registry.label_for(&id));
                return Ok(());
            }
            println!("Restored stage '{}'.", workspace.registry.label_for(&id));
        }
        StageCommands::Limit { stage, limit } => {
            let limit = validate_wip_limit(&limit).unwrap_or_else(|e| user_error(&e));
            let stage = workspace
                .registry
                .set_wip_limit(&stage, limit)
                .unwrap_or_else(|e| board_error(&e));
            println!("WIP limit for '{}' set to {}.", stage.name, stage.wip_limit);
        }
        StageCommands::Reset { yes } => {
            if !yes && !confirm("Discard all stage customization and restore the default pipeline?")? {
                println!("Cancelled.");
                return Ok(());
            }
            workspace.registry.reset();
            StageRepo::clear(&workspace.conn)?;
            println!("Restored the default pipeline.");
            return Ok(());
        }
    }

    workspace.save_registry()
}

fn handle_sample(count: usize, seed: u64, out: Option<PathBuf>) -> Result<()> {
    let workspace = Workspace::open()?;
    let orders: Vec<WorkOrder> = generate_sample_orders(workspace.registry.active(), count, seed, Utc::now());

    match out {
        Some(path) => {
            save_work_orders(&path, &orders)
                .with_context(|| format!("Failed to save work orders to {}", path.display()))?;
            println!("Wrote {} sample work order(s) to {}.", orders.len(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&orders)?),
    }
    Ok(())
}

/// Ask a yes/no question on stderr. Empty input means no.
fn confirm(question: &str) -> Result<bool> {
    eprint!("{} (y/n): ", question);
    std::io::Write::flush(&mut std::io::stderr())
        .map_err(|e| anyhow::anyhow!("Failed to flush stderr: {}", e))?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)
        .map_err(|e| anyhow::anyhow!("Failed to read input: {}", e))?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, format!("{}\n", contents))
        .with_context(|| format!("Failed to write {}", path.display()))
}
