//! # tablepanel
//!
//! Render dashboard table panels from saved query results.
//!
//! ## Overview
//!
//! tablepanel is built on top of tablepanellib. It reads a query result (the
//! JSON series list a data source returns) and an optional panel
//! configuration, then prints the panel's markup for one page.
//!
//! ## Usage
//!
//! ```bash
//! # Render the first page of table rows with default styles
//! tablepanel --data result.json
//!
//! # Use a saved panel configuration and render page 3 in UTC
//! tablepanel render --data result.json --panel panel.json --page 3 --utc
//!
//! # Summary cards instead of rows
//! tablepanel cards --data result.json --panel panel.json
//!
//! # Formatted values of every row as JSON (for CSV export)
//! tablepanel export --data result.json
//!
//! # Number of pages
//! tablepanel pages --data result.json --panel panel.json
//! ```

use std::fs;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Style;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tablepanellib::{PanelConfig, QueryResult, TableModel, VariableInterpolator};

/// Arguments shared by every subcommand
fn common_args() -> Vec<Arg> {
    vec![
        Arg::new("data")
            .short('d')
            .long("data")
            .required(true)
            .help("Query result JSON file (series list)"),
        Arg::new("panel")
            .short('p')
            .long("panel")
            .help("Panel configuration JSON file (defaults otherwise)"),
        Arg::new("page")
            .long("page")
            .value_parser(clap::value_parser!(usize))
            .default_value("1")
            .help("Page to render, starting at 1"),
        Arg::new("utc")
            .long("utc")
            .action(ArgAction::SetTrue)
            .help("Render dates in UTC instead of local time"),
        Arg::new("var")
            .long("var")
            .action(ArgAction::Append)
            .help("Dashboard variable for links, as name=value (repeatable)"),
    ]
}

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("tablepanel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render dashboard table panels from query results")
        .subcommand_negates_reqs(true)
        .args(common_args())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log more (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("render")
                .about("Render one page of table rows (default command)")
                .args(common_args()),
        )
        .subcommand(
            Command::new("cards")
                .about("Render one page of summary cards")
                .args(common_args()),
        )
        .subcommand(
            Command::new("export")
                .about("Print every formatted row as JSON")
                .args(common_args()),
        )
        .subcommand(
            Command::new("pages")
                .about("Print the number of pages")
                .args(common_args()),
        )
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        let label = Style::new().yellow().bold().apply_to("Warning:");
        eprintln!("{} logging disabled: {}", label, e);
    }
}

/// Everything a handler needs: the config, the built table and the options.
struct Panel {
    config: PanelConfig,
    table: TableModel,
    page: usize,
    utc: bool,
    variables: VariableInterpolator,
}

fn parse_variables(matches: &ArgMatches) -> anyhow::Result<VariableInterpolator> {
    let mut variables = VariableInterpolator::new();
    if let Some(vars) = matches.get_many::<String>("var") {
        for var in vars {
            let (name, value) = match var.split_once('=') {
                Some(pair) => pair,
                None => bail!("invalid variable '{}', expected name=value", var),
            };
            variables = variables.with_variable(name, value);
        }
    }
    Ok(variables)
}

fn load_panel(matches: &ArgMatches) -> anyhow::Result<Panel> {
    let data_path = matches
        .get_one::<String>("data")
        .context("missing --data")?;
    let raw = fs::read_to_string(data_path)
        .with_context(|| format!("failed to read data file '{}'", data_path))?;
    let data = QueryResult::from_json_str(&raw)?;

    let config = match matches.get_one::<String>("panel") {
        Some(path) => PanelConfig::from_path(path)?,
        None => PanelConfig::default(),
    };

    let page = matches.get_one::<usize>("page").copied().unwrap_or(1);
    if page == 0 {
        bail!("pages start at 1");
    }

    let table = config.build_table(&data)?;
    Ok(Panel {
        config,
        table,
        page: page - 1,
        utc: matches.get_flag("utc"),
        variables: parse_variables(matches)?,
    })
}

/// Handler for the render command
fn render_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let panel = load_panel(matches)?;
    let renderer = panel
        .config
        .table_renderer(panel.table)?
        .utc(panel.utc)
        .template_srv(Box::new(panel.variables));

    let mut output = renderer.render(panel.page);
    let pagination = renderer.render_pagination(panel.page);
    if !pagination.is_empty() {
        output.push('\n');
        output.push_str(&pagination);
    }
    Ok(output)
}

/// Handler for the cards command
fn cards_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let panel = load_panel(matches)?;
    let renderer = panel
        .config
        .card_renderer(panel.table)?
        .utc(panel.utc)
        .template_srv(Box::new(panel.variables));
    Ok(renderer.render(panel.page))
}

/// Handler for the export command
fn export_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let panel = load_panel(matches)?;
    let renderer = panel.config.table_renderer(panel.table)?.utc(panel.utc);
    Ok(serde_json::to_string_pretty(&renderer.render_values())?)
}

/// Handler for the pages command
fn pages_handler(matches: &ArgMatches) -> anyhow::Result<String> {
    let panel = load_panel(matches)?;
    let renderer = panel.config.table_renderer(panel.table)?;
    Ok(renderer.page_count().to_string())
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    init_logging(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("render", sub)) => render_handler(sub),
        Some(("cards", sub)) => cards_handler(sub),
        Some(("export", sub)) => export_handler(sub),
        Some(("pages", sub)) => pages_handler(sub),
        // No subcommand: treat as render
        _ => render_handler(&matches),
    };

    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let label = Style::new().red().bold().apply_to("Error:");
            eprintln!("{} {:#}", label, e);
            ExitCode::FAILURE
        }
    }
}
