//! CLI module for msgflow

mod args;

pub use args::{Args, Command};

use crate::analysis::{walk_outbound_from, FlowAnalyzer};
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::model::MessageFlowGraph;
use crate::output::{DotRenderer, LayoutEngine, OutputTarget};
use crate::store;
use std::borrow::Cow;
use std::path::Path;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    let verbose = args.verbose;

    match args.command {
        Command::Render {
            source,
            data_file,
            output,
            start,
            inter_module_only,
            list_entry_points,
            direction,
            config,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(data_file, direction, inter_module_only);

            if verbose {
                if let Some(source) = &source {
                    println!("Source: {}", source.display());
                }
                println!("Data file: {}", cfg.output.data_file.display());
                println!("Output: {}", output.display());
                println!("Module depth: {}", cfg.graph.module_depth);
                println!("Inter-module only: {}", cfg.diagram.inter_module_only);
            }

            let graph = obtain_graph(source.as_deref(), &cfg, verbose)?;

            if list_entry_points {
                print_entry_points(&graph);
            }

            let mut highlight = None;
            let mut to_render = Cow::Borrowed(&graph);
            if let Some(start) = start.as_deref() {
                if graph.contains_vertex(start) {
                    println!("Walking the graph...");
                    to_render = Cow::Owned(walk_outbound_from(&graph, start));
                    highlight = Some(start);
                } else {
                    warn!(start, "start handler not found, rendering the full graph");
                }
            }

            if cfg.diagram.inter_module_only {
                to_render = Cow::Owned(to_render.inter_module_only());
            }

            println!("Generating diagram...");
            let dot = DotRenderer::from_config(&cfg.diagram).render(&to_render, highlight);

            let engine = LayoutEngine::from_config(&cfg.output);
            match OutputTarget::for_path(&output) {
                OutputTarget::Dot => println!("Writing diagram to {}...", output.display()),
                OutputTarget::Image(format) => println!(
                    "Laying out {} diagram with {}...",
                    format.to_uppercase(),
                    engine.program()
                ),
            }
            engine.write(&dot, &output)?;

            let stats = to_render.stats();
            println!(
                "Finished: {} handlers, {} message flows, {} modules",
                stats.vertices, stats.edges, stats.modules
            );
        }

        Command::EntryPoints {
            source,
            data_file,
            config,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(data_file, None, false);

            let graph = obtain_graph(source.as_deref(), &cfg, verbose)?;
            print_entry_points(&graph);
        }

        Command::Version => {
            println!("msgflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Explicit config files must be valid; the default one is optional
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))),
    }
}

/// Analyze `source` and persist the graph, or load the persisted graph
fn obtain_graph(source: Option<&Path>, cfg: &Config, verbose: bool) -> Result<MessageFlowGraph> {
    let data_file = &cfg.output.data_file;

    match source {
        Some(source) => {
            println!("Analyzing {}...", source.display());
            let analysis = FlowAnalyzer::from_config(cfg).with_verbose(verbose).analyze(source)?;

            let unconsumed = analysis.unconsumed();
            if verbose && !unconsumed.is_empty() {
                println!("Messages without consumers ({}):", unconsumed.len());
                for (producer, message) in unconsumed {
                    println!("  {} -> {}", producer, message);
                }
            }

            store::save(&analysis.graph, data_file)?;
            println!("Graph saved to {}", data_file.display());
            Ok(analysis.graph)
        }
        None => {
            println!("Loading graph from {}...", data_file.display());
            store::load(data_file)
        }
    }
}

fn print_entry_points(graph: &MessageFlowGraph) {
    let entry_points = graph.entry_points();
    if entry_points.is_empty() {
        println!("No entry points found");
        return;
    }

    println!("Entry points ({}):", entry_points.len());
    for handler in entry_points {
        println!(
            "  {}: {}",
            handler.full_name(),
            handler.entry_point().unwrap_or_default()
        );
    }
}
