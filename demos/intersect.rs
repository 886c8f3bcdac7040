use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use sweep_crossings::{find_intersections, input, Segment};

/// Find all crossings of the segments in a file.
#[derive(Parser)]
struct Cli {
    /// Segment file: a count followed by `x1 y1 x2 y2` per segment.
    #[arg(default_value = "in.txt")]
    input: PathBuf,

    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Drop segments the sweep rejects instead of failing.
    #[arg(long)]
    skip_degenerate: bool,

    /// List the crossing segment pairs and overlaps.
    #[arg(long)]
    pairs: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let mut lines = input::parse_segments(&text)
        .with_context(|| format!("parsing {}", args.input.display()))?;
    info!("read {} segments", lines.len());

    if args.skip_degenerate {
        let before = lines.len();
        lines.retain(|&line| Segment::try_from(line).is_ok());
        if lines.len() < before {
            warn!("skipped {} invalid segments", before - lines.len());
        }
    }

    let start = Instant::now();
    let result = find_intersections(lines.iter().copied())?;
    let duration = start.elapsed();

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    input::write_report(writer, &result, args.pairs)?;
    eprintln!("Duration: {:?}", duration);
    Ok(())
}
