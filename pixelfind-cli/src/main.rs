use std::sync::{Arc, Mutex};

use clap::Parser;
use pixelfind::{
    AlsoDecision, FinderOptions, Frame, ImageFinder, Match, Pattern, PixelFindResult,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find reference images or colors inside an image file")]
struct Cli {
    /// Image file to search in.
    #[arg(short, long, value_name = "FILE")]
    area: String,
    /// Pattern to find: a file path, an `image:` Base64 literal, or a
    /// `color:RRGGBB` value. Repeat to search a list.
    #[arg(short, long = "image", value_name = "PATTERN", required = true)]
    images: Vec<String>,
    /// Maximal allowed color difference, 0-100.
    #[arg(short, long, default_value_t = 0)]
    diff: u32,
    /// Search list patterns concurrently.
    #[arg(short, long)]
    parallel: bool,
    /// Report every occurrence instead of the first one.
    #[arg(long)]
    all: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    match_index: usize,
    list_index: usize,
}

impl From<Match> for MatchRecord {
    fn from(value: Match) -> Self {
        Self {
            x: value.rect.x,
            y: value.rect.y,
            width: value.rect.width,
            height: value.rect.height,
            match_index: value.match_index,
            list_index: value.list_index,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    found: bool,
    matches: Vec<MatchRecord>,
}

fn load_pattern(value: &str) -> PixelFindResult<Pattern> {
    if let Some(hex) = value.strip_prefix("color:") {
        let rgb = u32::from_str_radix(hex, 16).map_err(|err| {
            pixelfind::PixelFindError::InvalidLiteral {
                reason: format!("bad color value: {err}"),
            }
        })?;
        return Ok(Pattern::from_color(rgb));
    }
    Pattern::load(value)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("pixelfind=info".parse()?))
            .with_target(false)
            .init();
    }

    let frame = Frame::from_file(&cli.area)?;
    let patterns = cli
        .images
        .iter()
        .map(|spec| load_pattern(spec))
        .collect::<PixelFindResult<Vec<_>>>()?;

    let options = FinderOptions {
        diff: cli.diff,
        parallel: cli.parallel,
        ..FinderOptions::default()
    };

    let mut finder = ImageFinder::new(patterns, options)?;
    let collected = Arc::new(Mutex::new(Vec::<Match>::new()));
    if cli.all {
        let sink = Arc::clone(&collected);
        finder = finder.with_callback(Box::new(move |m| {
            sink.lock().unwrap().push(*m);
            AlsoDecision::OkFindMore
        }));
    }

    let found = finder.find_in(&frame);

    let mut matches: Vec<Match> = collected.lock().unwrap().clone();
    if matches.is_empty() {
        matches.extend(found);
    }
    let output = Output {
        found: found.is_some(),
        matches: matches.into_iter().map(MatchRecord::from).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
