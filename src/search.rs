use std::collections::{HashMap, HashSet};

use crate::cli::Config;
use crate::output::{MatchResult, highlight_spans, maybe_colorize};
use crate::regex::Regex;

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub invert: bool,
    pub only_matching: bool,
    pub line_numbers: bool,
    pub max_count: Option<usize>,
    pub before_context: usize,
    pub after_context: usize,
    pub use_color: bool,
    /// Stream plain-format output while scanning. Off for structured
    /// formats, counting, and the quiet/file-name modes.
    pub emit: bool,
}

impl SearchOptions {
    pub fn from_config(cfg: &Config, use_color: bool, emit: bool) -> Self {
        SearchOptions {
            invert: cfg.invert_match,
            // There is no matched part to print for an inverted selection.
            only_matching: cfg.only_matching && !cfg.invert_match,
            line_numbers: cfg.line_numbers,
            max_count: cfg.max_count,
            before_context: cfg.before_context,
            after_context: cfg.after_context,
            use_color,
            emit,
        }
    }
}

pub struct FileOutcome {
    pub results: Vec<MatchResult>,
    pub selected_lines: usize,
}

/// Every non-overlapping match of one pattern in a line, left to right.
/// An empty match advances by one character so the scan always terminates.
fn regex_spans(regex: &Regex, line: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(m) = regex.find_from(line, at) {
        spans.push((m.start, m.end));
        at = if m.end > m.start {
            m.end
        } else {
            match line[m.start..].chars().next() {
                Some(c) => m.start + c.len_utf8(),
                None => break,
            }
        };
    }
    spans
}

/// Match spans across all patterns, sorted, overlaps dropped in favor of the
/// earlier span.
fn collect_spans(regexes: &[Regex], line: &str) -> Vec<(usize, usize)> {
    let mut all = Vec::new();
    for regex in regexes {
        all.extend(regex_spans(regex, line));
    }
    all.sort();
    let mut merged: Vec<(usize, usize)> = Vec::new();
    for (start, end) in all {
        match merged.last() {
            Some(&(_, prev_end)) if start < prev_end => {}
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Scan one input: select lines (any pattern matches, then inversion),
/// honor the selection cap, build records, and stream plain output when
/// enabled.
pub fn process_input(
    content: &str,
    display_name: &str,
    show_filename: bool,
    regexes: &[Regex],
    opts: &SearchOptions,
) -> FileOutcome {
    let lines: Vec<&str> = content.lines().collect();
    let mut selected: Vec<usize> = Vec::new();
    let mut spans_by_line: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    let mut results = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if let Some(max) = opts.max_count {
            if selected.len() >= max {
                break;
            }
        }
        let matched = regexes.iter().any(|r| r.is_match(line));
        if matched == opts.invert {
            continue;
        }
        let spans = if opts.invert {
            Vec::new()
        } else {
            collect_spans(regexes, line)
        };
        results.push(MatchResult::new(display_name, idx + 1, line, spans.clone()));
        spans_by_line.insert(idx, spans);
        selected.push(idx);
    }

    if opts.emit {
        print_plain(
            &lines,
            &selected,
            &spans_by_line,
            display_name,
            show_filename,
            opts,
        );
    }

    FileOutcome {
        selected_lines: selected.len(),
        results,
    }
}

fn print_plain(
    lines: &[&str],
    selected: &[usize],
    spans_by_line: &HashMap<usize, Vec<(usize, usize)>>,
    display_name: &str,
    show_filename: bool,
    opts: &SearchOptions,
) {
    if opts.only_matching {
        for &idx in selected {
            let prefix = line_prefix(display_name, show_filename, idx, opts.line_numbers, ':');
            for &(start, end) in &spans_by_line[&idx] {
                let part = maybe_colorize(&lines[idx][start..end], opts.use_color);
                println!("{prefix}{part}");
            }
        }
        return;
    }

    let selected_set: HashSet<usize> = selected.iter().copied().collect();
    let has_context = opts.before_context > 0 || opts.after_context > 0;

    let mut include = vec![false; lines.len()];
    for &idx in selected {
        let lo = idx.saturating_sub(opts.before_context);
        let hi = (idx + opts.after_context).min(lines.len().saturating_sub(1));
        for i in lo..=hi {
            include[i] = true;
        }
    }

    let mut last_printed: Option<usize> = None;
    for (idx, line) in lines.iter().enumerate() {
        if !include[idx] {
            continue;
        }
        let is_selected = selected_set.contains(&idx);
        if has_context {
            if let Some(last) = last_printed {
                if idx > last + 1 {
                    println!("--");
                }
            }
        }
        let sep = if is_selected { ':' } else { '-' };
        let prefix = line_prefix(display_name, show_filename, idx, opts.line_numbers, sep);
        let body = if is_selected {
            highlight_spans(line, &spans_by_line[&idx], opts.use_color)
        } else {
            (*line).to_string()
        };
        println!("{prefix}{body}");
        last_printed = Some(idx);
    }
}

fn line_prefix(
    display_name: &str,
    show_filename: bool,
    idx: usize,
    line_numbers: bool,
    sep: char,
) -> String {
    let mut prefix = String::new();
    if show_filename {
        prefix.push_str(display_name);
        prefix.push(sep);
    }
    if line_numbers {
        prefix.push_str(&(idx + 1).to_string());
        prefix.push(sep);
    }
    prefix
}
