use anyhow::Context;
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use salesdash_core::telemetry::init_tracing;
use salesdash_core::{DashboardConfig, DashboardController, DashboardView, FileExportSink};
use salesdash_series::Category;
use std::path::PathBuf;

fn filter_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("start")
                .long("start")
                .value_parser(value_parser!(NaiveDate))
                .help("Range start (YYYY-MM-DD)"),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_parser(value_parser!(NaiveDate))
                .help("Range end (YYYY-MM-DD), defaults to today"),
        )
        .arg(
            Arg::new("category")
                .long("category")
                .value_parser(value_parser!(Category))
                .help("Electronics, Clothing, Food or Books; all when omitted"),
        )
}

fn cli() -> Command {
    Command::new("salesdash")
        .version(salesdash_core::VERSION)
        .about("Sales analytics dashboard over a cached mock sales source")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON file backing the cache (overrides config)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand_required(true)
        .subcommand(
            filter_args(Command::new("show").about("Print summary and table for the filters"))
                .arg(
                    Arg::new("search")
                        .long("search")
                        .help("Only list rows whose date contains this text"),
                )
                .arg(
                    Arg::new("refresh")
                        .long("refresh")
                        .action(ArgAction::SetTrue)
                        .help("Clear the cache and reload"),
                ),
        )
        .subcommand(Command::new("clear-cache").about("Remove every cached dashboard entry"))
        .subcommand(
            filter_args(Command::new("export").about("Write the current view as CSV")).arg(
                Arg::new("out")
                    .long("out")
                    .value_parser(value_parser!(PathBuf))
                    .help("Output directory (overrides config)"),
            ),
        )
}

/// Apply filter arguments; loads with defaults when none changed anything
fn apply_filters(dashboard: &mut DashboardController, args: &ArgMatches) {
    let mut launched = false;
    if let Some(start) = args.get_one::<NaiveDate>("start") {
        launched |= dashboard.set_start(*start);
    }
    if let Some(end) = args.get_one::<NaiveDate>("end") {
        launched |= dashboard.set_end(*end);
    }
    if let Some(category) = args.get_one::<Category>("category") {
        launched |= dashboard.set_category(Some(*category));
    }
    if !launched {
        dashboard.load();
    }
}

fn print_view(view: &DashboardView) {
    if let Some(error) = &view.error {
        println!("Error: {error}");
        return;
    }
    if view.series.is_empty() {
        println!("No data available for the selected filters.");
        return;
    }

    println!("Sales {} .. {}", view.filters.start, view.filters.end);
    println!();
    println!("Summary");
    for column in &view.columns {
        println!("  Total {column:<12} {:>10}", view.summary.total_for(column));
    }
    println!("  {:<18} {:>10}", "Overall Total", view.summary.overall_total);
    println!();

    let (shown, total) = view.record_counts();
    println!("Showing {shown} of {total} records");
    print!("{:<12}", "Date");
    for column in &view.columns {
        print!("{column:>12}");
    }
    println!();
    for point in &view.filtered_rows {
        print!("{:<12}", point.date_string());
        for column in &view.columns {
            print!("{:>12}", point.value(column));
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing("info", matches.get_flag("json-logs"));

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::new(),
    };
    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_path(store.clone());
    }
    let export_dir = config.export_dir.clone();

    let mut dashboard = DashboardController::from_config(config).context("building dashboard")?;

    match matches.subcommand() {
        Some(("show", args)) => {
            apply_filters(&mut dashboard, args);
            if let Some(search) = args.get_one::<String>("search") {
                dashboard.set_search_term(search.clone());
            }
            if args.get_flag("refresh") {
                dashboard.settle().await;
                dashboard.clear_cache()?;
            }
            dashboard.settle().await;
            print_view(&dashboard.view());
        }
        Some(("clear-cache", _)) => {
            let removed = dashboard.clear_cache()?;
            dashboard.settle().await;
            println!("Cache cleared: {removed} entries removed");
        }
        Some(("export", args)) => {
            apply_filters(&mut dashboard, args);
            dashboard.settle().await;

            let dir = args.get_one::<PathBuf>("out").cloned().unwrap_or(export_dir);
            let sink = FileExportSink::new(dir);
            let export = dashboard.export_current_view(&sink)?;
            println!(
                "Exported {} rows to {}",
                export.row_count(),
                sink.path_for(&export).display()
            );
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}
