#![forbid(unsafe_code)]

//! togglegraph CLI - turn `A -> B` relationship lists into diagrams.
//!
//! # Commands
//!
//! - `generate`: Print the diagram description for a relationship list
//! - `render`: Run the render pipeline once and print the terminal diagram
//! - `entities`: Show the entity checklist and any ignored lines
//! - `session`: Edit a document interactively and re-render as you type

mod config;
mod repl;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tg_core::{EntityId, RenderState};
use tg_parser::{SkippedLine, parse_description};
use tg_pipeline::{ChecklistEntry, Document, RenderPipeline, Session};
use tg_render_term::{GlyphMode, TermDiagramRenderer};
use tracing::{debug, info, warn};

use crate::config::AppConfig;

/// togglegraph CLI - turn relationship lists into diagrams.
#[derive(Debug, Parser)]
#[command(
    name = "tg-cli",
    version,
    about = "togglegraph CLI - turn relationship lists into diagrams",
    long_about = "Reads one `A -> B` relationship per line, lets you switch entities\n\
        on and off, and renders the enabled part as a left-to-right diagram."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML config file with [render] and [session] tables
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the diagram description for a relationship list.
    Generate {
        /// Input file path, "-" for stdin, or inline text.
        #[arg(default_value = "-")]
        input: String,

        /// Switch an entity off (repeatable)
        #[arg(long, value_name = "ID")]
        disable: Vec<String>,

        /// Switch an entity on (repeatable, applied after --disable)
        #[arg(long, value_name = "ID")]
        enable: Vec<String>,
    },

    /// Render the enabled relationships as a terminal diagram.
    Render {
        /// Input file path, "-" for stdin, or inline text.
        #[arg(default_value = "-")]
        input: String,

        /// Switch an entity off (repeatable)
        #[arg(long, value_name = "ID")]
        disable: Vec<String>,

        /// Switch an entity on (repeatable, applied after --disable)
        #[arg(long, value_name = "ID")]
        enable: Vec<String>,

        /// ASCII-only output (no Unicode box-drawing)
        #[arg(long)]
        ascii: bool,

        /// Output file path. If omitted, writes to stdout.
        #[arg(short, long)]
        output: Option<String>,

        /// Print a JSON summary (timing, dimensions, counts) to stderr
        #[arg(long)]
        json: bool,
    },

    /// List entities with their toggle state and the lines that were ignored.
    Entities {
        /// Input file path, "-" for stdin, or inline text.
        #[arg(default_value = "-")]
        input: String,

        /// Switch an entity off (repeatable)
        #[arg(long, value_name = "ID")]
        disable: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a document line by line and re-render in the background.
    Session {
        /// Initial document: file path or inline text.
        #[arg(long)]
        load: Option<String>,

        /// Print the generated description after every edit
        #[arg(long)]
        echo_source: bool,
    },
}

/// Summary printed by `render --json`.
#[derive(Debug, Serialize)]
struct RenderResult {
    renderer: &'static str,
    state: &'static str,
    node_count: usize,
    relation_count: usize,
    skipped_lines: usize,
    width: Option<usize>,
    height: Option<usize>,
    generate_time_ms: f64,
    render_time_ms: f64,
    total_time_ms: f64,
    error: Option<String>,
}

/// Output of `entities --json`.
#[derive(Debug, Serialize)]
struct EntitiesResult {
    entities: Vec<ChecklistEntry>,
    skipped: Vec<SkippedLine>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = AppConfig::load_optional(cli.config.as_deref())?;

    match cli.command {
        Command::Generate {
            input,
            disable,
            enable,
        } => cmd_generate(&input, &disable, &enable),

        Command::Render {
            input,
            disable,
            enable,
            ascii,
            output,
            json,
        } => cmd_render(
            &config,
            &input,
            &disable,
            &enable,
            ascii,
            output.as_deref(),
            json,
        ),

        Command::Entities {
            input,
            disable,
            json,
        } => cmd_entities(&input, &disable, json),

        Command::Session { load, echo_source } => {
            cmd_session(&config, load.as_deref(), echo_source, cli.quiet)
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else if Path::new(input).exists() {
        std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))
    } else {
        // Inline relationship text
        Ok(input.to_string())
    }
}

fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content).context(format!("Failed to write to: {path}"))?;
            info!("Wrote output to: {path}");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

/// Load `input` and apply the command-line toggles on top of the seeded
/// registry.
fn build_document(input: &str, disable: &[String], enable: &[String]) -> Result<Document> {
    let mut document = Document::with_text(load_input(input)?);
    for (labels, enabled) in [(disable, false), (enable, true)] {
        for label in labels {
            let id = EntityId::new(label)
                .with_context(|| format!("Entity label must not be empty: {label:?}"))?;
            if document.set_enabled(id, enabled).is_none() {
                warn!("Entity `{}` does not appear in the input", label.trim());
            }
        }
    }
    Ok(document)
}

fn cmd_generate(input: &str, disable: &[String], enable: &[String]) -> Result<()> {
    let document = build_document(input, disable, enable)?;
    write_output(None, &document.source())
}

fn cmd_render(
    config: &AppConfig,
    input: &str,
    disable: &[String],
    enable: &[String],
    ascii: bool,
    output: Option<&str>,
    json_output: bool,
) -> Result<()> {
    let total_start = Instant::now();

    let generate_start = Instant::now();
    let document = build_document(input, disable, enable)?;
    let skipped_lines = document.scan().skipped.len();
    let source = document.source();
    let generate_time = generate_start.elapsed();

    let (node_count, relation_count) = parse_description(&source)
        .map(|description| (description.nodes.len(), description.relations.len()))
        .unwrap_or_default();
    debug!(
        "Generated: nodes={node_count}, relations={relation_count}, skipped={skipped_lines}"
    );

    let mut render_config = config.render.clone();
    if ascii {
        render_config = render_config.with_glyphs(GlyphMode::Ascii);
    }
    let mut pipeline = RenderPipeline::new(Arc::new(TermDiagramRenderer::new(render_config)));

    let render_start = Instant::now();
    pipeline.request(&source);
    let state = pipeline.wait_current().clone();
    let render_time = render_start.elapsed();
    let total_time = total_start.elapsed();

    if json_output {
        let image = state.image();
        let result = RenderResult {
            renderer: pipeline.renderer_name(),
            state: state.as_str(),
            node_count,
            relation_count,
            skipped_lines,
            width: image.map(|image| image.width()),
            height: image.map(|image| image.height()),
            generate_time_ms: generate_time.as_secs_f64() * 1000.0,
            render_time_ms: render_time.as_secs_f64() * 1000.0,
            total_time_ms: total_time.as_secs_f64() * 1000.0,
            error: state.error().map(ToString::to_string),
        };

        let json_str = serde_json::to_string_pretty(&result)?;
        eprintln!("{json_str}");
    }

    match state {
        RenderState::Ready { image, .. } => {
            write_output(output, &image.to_string())?;
            info!(
                "Rendered {node_count} nodes, {relation_count} relations in {:.2}ms",
                total_time.as_secs_f64() * 1000.0
            );
            Ok(())
        }
        RenderState::Failed { error, .. } => bail!("Render failed: {error}"),
        other => bail!("Render did not finish (state: {})", other.as_str()),
    }
}

fn cmd_entities(input: &str, disable: &[String], json_output: bool) -> Result<()> {
    let document = build_document(input, disable, &[])?;
    let result = EntitiesResult {
        entities: document.checklist(),
        skipped: document.scan().skipped,
    };

    if json_output {
        let json_str = serde_json::to_string_pretty(&result)?;
        return write_output(None, &json_str);
    }

    let mut lines = Vec::with_capacity(result.entities.len() + result.skipped.len());
    for entry in &result.entities {
        let mark = if entry.enabled { 'x' } else { ' ' };
        lines.push(format!("[{mark}] {}", entry.id));
    }
    for skipped in &result.skipped {
        lines.push(format!(
            "line {}: ignored ({}): {}",
            skipped.line,
            skipped.reason.as_str(),
            skipped.text
        ));
    }
    write_output(None, &lines.join("\n"))
}

fn cmd_session(
    config: &AppConfig,
    load: Option<&str>,
    echo_source: bool,
    quiet: bool,
) -> Result<()> {
    let renderer = Arc::new(TermDiagramRenderer::new(config.render.clone()));
    let mut session = match load {
        Some(input) => Session::with_text(renderer, load_input(input)?),
        None => Session::new(renderer),
    };

    if !quiet {
        eprintln!("{}", repl::HELP);
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    repl::run(
        &mut session,
        stdin.lock(),
        &mut stdout,
        echo_source || config.session.echo_source,
    )?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
