//! Render a textual stack-trace dump as a call graph.
//!
//! This binary reads a dump of alternating file-location and call lines,
//! builds the call graph, and pipes a Graphviz description through `dot`.
//!
//! # Usage
//!
//! ```bash
//! stackgraph -f stack.txt -t "crash in handler" > stack.png
//! stackgraph -f stack.txt -T svg > stack.svg
//! stackgraph -f stack.txt --emit dot    # print the DOT description
//! stackgraph < stack.txt > stack.png
//! ```

use clap::{Parser, ValueEnum};
use stackgraph::graph::GraphConverter;
use stackgraph::render::DotRenderer;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    /// Pipe the description through `dot` and emit the rendered image
    Render,
    /// Emit the Graphviz DOT description itself
    Dot,
    /// Emit the graph as JSON records
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "stackgraph")]
#[command(about = "Render a stack-trace dump as a call graph")]
#[command(version)]
struct Args {
    /// Title for the stack trace
    #[arg(short, long)]
    title: Option<String>,

    /// Text file containing the stack trace (reads stdin when absent)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Output image type passed to dot (e.g. png, svg)
    #[arg(short = 'T', long, default_value = "png")]
    image_format: String,

    /// What to emit
    #[arg(short, long, value_enum, default_value = "render")]
    emit: Emit,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut converter = GraphConverter::new();
    match &args.file {
        Some(path) => {
            let file = File::open(path).map_err(|e| {
                format!("Failed to open input file '{}': {}", path.display(), e)
            })?;
            converter.parse(BufReader::new(file))?;
        }
        None => converter.parse(io::stdin().lock())?,
    }

    match args.emit {
        Emit::Render => {
            // The description is built in full before the renderer is
            // spawned, so a conversion failure never reaches `dot`.
            let mut description = Vec::new();
            converter.write_dot(&mut description, args.title.as_deref())?;
            let description = String::from_utf8(description)?;

            DotRenderer::new(&args.image_format).render(&description)?;
        }
        Emit::Dot => {
            let mut writer = io::BufWriter::new(io::stdout().lock());
            converter.write_dot(&mut writer, args.title.as_deref())?;
            writer.flush()?;
        }
        Emit::Json => {
            let mut writer = io::BufWriter::new(io::stdout().lock());
            converter.write_json(&mut writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
