use std::io;
use std::io::IsTerminal;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorWhen {
    Always,
    Never,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
    Csv,
    Markdown,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub patterns: Vec<String>,
    pub paths: Vec<String>,
    pub recursive: bool,
    pub ignore_case: bool,
    pub invert_match: bool,
    pub line_numbers: bool,
    pub count: bool,
    pub only_matching: bool,
    pub quiet: bool,
    pub files_with_matches: bool,
    pub files_without_match: bool,
    pub max_count: Option<usize>,
    pub before_context: usize,
    pub after_context: usize,
    pub color: ColorWhen,
    pub format: OutputFormat,
}

/// Build the clap command describing the CLI. Separated from `parse_args` so
/// tests can drive it with explicit argument vectors.
pub fn build_cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Search for patterns in files using a built-in regex engine")
        .after_help(
            "Pattern syntax:\n\
             \x20 literals      match exact characters\n\
             \x20 (a|b)         capture group with alternation\n\
             \x20 +             one or more of the previous token\n\
             \x20 ?             zero or one of the previous token\n\
             \x20 [abc], [^abc] character class, negated character class\n\
             \x20 ^, $          start and end of line anchors\n\
             \x20 \\1, \\2        backreferences to captured groups\n\
             \x20 \\d, \\w        digit and word character classes\n\
             \x20 .             any character",
        )
        .arg(
            Arg::new("pattern")
                .value_name("PATTERN")
                .required_unless_present("regexp")
                .help("Regular expression pattern to search for"),
        )
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .num_args(0..)
                .help("Files to search (stdin if none are given)"),
        )
        .arg(
            Arg::new("regexp")
                .short('e')
                .long("regexp")
                .value_name("PATTERN")
                .action(ArgAction::Append)
                .help("Pattern to search for; may be repeated, a line matches if any pattern does"),
        )
        .arg(
            Arg::new("extended")
                .short('E')
                .long("extended-regexp")
                .action(ArgAction::SetTrue)
                .help("Use extended regular expression syntax (enabled by default)"),
        )
        .arg(
            Arg::new("recursive")
                .short('r')
                .visible_short_alias('R')
                .long("recursive")
                .action(ArgAction::SetTrue)
                .help("Recursively search all files under each directory"),
        )
        .arg(
            Arg::new("line-number")
                .short('n')
                .long("line-number")
                .action(ArgAction::SetTrue)
                .help("Prefix each output line with its line number"),
        )
        .arg(
            Arg::new("ignore-case")
                .short('i')
                .long("ignore-case")
                .action(ArgAction::SetTrue)
                .help("Ignore case distinctions (ASCII)"),
        )
        .arg(
            Arg::new("invert-match")
                .short('v')
                .long("invert-match")
                .action(ArgAction::SetTrue)
                .help("Select lines that do not match"),
        )
        .arg(
            Arg::new("count")
                .short('c')
                .long("count")
                .action(ArgAction::SetTrue)
                .help("Print only a count of matching lines per input"),
        )
        .arg(
            Arg::new("only-matching")
                .short('o')
                .long("only-matching")
                .action(ArgAction::SetTrue)
                .help("Print each matched part on its own line"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .alias("silent")
                .action(ArgAction::SetTrue)
                .help("Suppress all normal output; the exit status tells the result"),
        )
        .arg(
            Arg::new("files-with-matches")
                .short('l')
                .long("files-with-matches")
                .action(ArgAction::SetTrue)
                .help("Print only the names of inputs with matching lines"),
        )
        .arg(
            Arg::new("files-without-match")
                .short('L')
                .long("files-without-match")
                .action(ArgAction::SetTrue)
                .conflicts_with("files-with-matches")
                .help("Print only the names of inputs without matching lines"),
        )
        .arg(
            Arg::new("max-count")
                .short('m')
                .long("max-count")
                .value_name("NUM")
                .value_parser(value_parser!(usize))
                .help("Stop reading an input after NUM matching lines"),
        )
        .arg(
            Arg::new("after-context")
                .short('A')
                .long("after-context")
                .value_name("NUM")
                .value_parser(value_parser!(usize))
                .help("Print NUM lines of trailing context"),
        )
        .arg(
            Arg::new("before-context")
                .short('B')
                .long("before-context")
                .value_name("NUM")
                .value_parser(value_parser!(usize))
                .help("Print NUM lines of leading context"),
        )
        .arg(
            Arg::new("context")
                .short('C')
                .long("context")
                .value_name("NUM")
                .value_parser(value_parser!(usize))
                .help("Print NUM lines of leading and trailing context"),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .value_name("WHEN")
                .value_parser(["always", "never", "auto"])
                .default_value("never")
                .help("Highlight matched parts"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FMT")
                .value_parser(["plain", "json", "csv", "markdown"])
                .default_value("plain")
                .help("Output format"),
        )
}

pub fn parse_args() -> Config {
    config_from_matches(build_cli().get_matches())
}

fn config_from_matches(matches: ArgMatches) -> Config {
    let mut patterns: Vec<String> = matches
        .get_many::<String>("regexp")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let mut paths: Vec<String> = matches
        .get_many::<String>("files")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    // With explicit -e patterns the positional slot is just another FILE.
    if let Some(positional) = matches.get_one::<String>("pattern") {
        if patterns.is_empty() {
            patterns.push(positional.clone());
        } else {
            paths.insert(0, positional.clone());
        }
    }

    let recursive = matches.get_flag("recursive");
    if recursive && paths.is_empty() {
        build_cli()
            .error(
                ErrorKind::MissingRequiredArgument,
                "at least one FILE is required for recursive search",
            )
            .exit();
    }

    let context = matches.get_one::<usize>("context").copied();
    let before_context = matches
        .get_one::<usize>("before-context")
        .copied()
        .or(context)
        .unwrap_or(0);
    let after_context = matches
        .get_one::<usize>("after-context")
        .copied()
        .or(context)
        .unwrap_or(0);

    let color = match matches.get_one::<String>("color").map(String::as_str) {
        Some("always") => ColorWhen::Always,
        Some("auto") => ColorWhen::Auto,
        _ => ColorWhen::Never,
    };

    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("json") => OutputFormat::Json,
        Some("csv") => OutputFormat::Csv,
        Some("markdown") => OutputFormat::Markdown,
        _ => OutputFormat::Plain,
    };

    Config {
        patterns,
        paths,
        recursive,
        ignore_case: matches.get_flag("ignore-case"),
        invert_match: matches.get_flag("invert-match"),
        line_numbers: matches.get_flag("line-number"),
        count: matches.get_flag("count"),
        only_matching: matches.get_flag("only-matching"),
        quiet: matches.get_flag("quiet"),
        files_with_matches: matches.get_flag("files-with-matches"),
        files_without_match: matches.get_flag("files-without-match"),
        max_count: matches.get_one::<usize>("max-count").copied(),
        before_context,
        after_context,
        color,
        format,
    }
}

pub fn resolve_use_color(color: ColorWhen) -> bool {
    match color {
        ColorWhen::Always => true,
        ColorWhen::Never => false,
        ColorWhen::Auto => io::stdout().is_terminal(),
    }
}
