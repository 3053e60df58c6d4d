use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use log::debug;

use crate::cli::{Config, OutputFormat, resolve_use_color};
use crate::fs_walk::collect_files;
use crate::output::{
    CsvFormatter, JsonFormatter, MarkdownFormatter, MatchResult, OutputFormatter,
};
use crate::regex::Regex;
use crate::search::{SearchOptions, process_input};

pub const EXIT_MATCH_FOUND: i32 = 0;
pub const EXIT_NO_MATCH: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

const STDIN_NAME: &str = "(standard input)";

pub fn run(cfg: Config) -> i32 {
    let regexes = match compile_patterns(&cfg) {
        Ok(regexes) => regexes,
        Err(code) => return code,
    };
    match run_searches(&cfg, &regexes) {
        Ok(true) => EXIT_MATCH_FOUND,
        Ok(false) => EXIT_NO_MATCH,
        Err(err) => {
            eprintln!("{}: {err:#}", env!("CARGO_PKG_NAME"));
            EXIT_ERROR
        }
    }
}

fn compile_patterns(cfg: &Config) -> Result<Vec<Regex>, i32> {
    let mut regexes = Vec::new();
    for pattern in &cfg.patterns {
        match Regex::new(pattern, cfg.ignore_case) {
            Ok(regex) => {
                debug!("compiled pattern '{pattern}'");
                regexes.push(regex);
            }
            Err(err) => {
                eprintln!(
                    "{}: invalid pattern '{pattern}': {err}",
                    env!("CARGO_PKG_NAME")
                );
                return Err(EXIT_ERROR);
            }
        }
    }
    Ok(regexes)
}

fn run_searches(cfg: &Config, regexes: &[Regex]) -> anyhow::Result<bool> {
    let use_color = resolve_use_color(cfg.color);
    let plain = cfg.format == OutputFormat::Plain;
    let name_modes = cfg.files_with_matches || cfg.files_without_match;
    let emit = plain && !cfg.quiet && !cfg.count && !name_modes;
    let opts = SearchOptions::from_config(cfg, use_color, emit);

    let mut all_results: Vec<MatchResult> = Vec::new();
    let mut any_match = false;

    if cfg.paths.is_empty() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("reading standard input")?;
        let outcome = process_input(&buffer, STDIN_NAME, false, regexes, &opts);
        report_per_input(cfg, STDIN_NAME, false, outcome.selected_lines);
        any_match = outcome.selected_lines > 0;
        all_results = outcome.results;
    } else {
        let mut files: Vec<PathBuf> = Vec::new();
        for path in &cfg.paths {
            files.extend(collect_files(Path::new(path), cfg.recursive));
        }
        // Recursive searches always show the file name; otherwise only when
        // more than one file is searched.
        let show_filename = cfg.recursive || files.len() > 1;

        for path in &files {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    eprintln!("{}: {}", path.display(), io_reason(&err));
                    continue;
                }
            };
            let name = path.to_string_lossy();
            let outcome = process_input(&content, &name, show_filename, regexes, &opts);
            report_per_input(cfg, &name, show_filename, outcome.selected_lines);
            any_match |= outcome.selected_lines > 0;
            all_results.extend(outcome.results);
        }
    }

    if !cfg.quiet {
        if let Some(formatter) = formatter_for(cfg) {
            println!("{}", formatter.format(&all_results));
        }
    }

    Ok(any_match)
}

/// Per-input lines for the count and file-name modes, which replace normal
/// line output.
fn report_per_input(cfg: &Config, name: &str, show_filename: bool, selected: usize) {
    if cfg.quiet || cfg.format != OutputFormat::Plain {
        return;
    }
    if cfg.count {
        if show_filename {
            println!("{name}:{selected}");
        } else {
            println!("{selected}");
        }
    } else if cfg.files_with_matches && selected > 0 {
        println!("{name}");
    } else if cfg.files_without_match && selected == 0 {
        println!("{name}");
    }
}

fn formatter_for(cfg: &Config) -> Option<Box<dyn OutputFormatter>> {
    match cfg.format {
        OutputFormat::Plain => None,
        OutputFormat::Json => Some(Box::new(JsonFormatter::new(cfg))),
        OutputFormat::Csv => Some(Box::new(CsvFormatter {
            include_header: true,
        })),
        OutputFormat::Markdown => Some(Box::new(MarkdownFormatter)),
    }
}

fn io_reason(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "no such file or directory".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => err.to_string(),
    }
}
