use serde::Serialize;
use serde_json::json;

use crate::cli::Config;

const COLOR_START: &str = "\x1b[01;31m";
const COLOR_RESET: &str = "\x1b[m";

/// A single matching (or inverted-selected) line in an input.
/// `match_start`/`match_end` describe the first match; inverted selections
/// carry no span. `spans` keeps every non-overlapping match for `-o` and
/// highlighting and stays out of the serialized form.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub filename: String,
    pub line_num: usize,
    pub line_content: String,
    pub match_start: Option<usize>,
    pub match_end: Option<usize>,
    #[serde(skip)]
    pub spans: Vec<(usize, usize)>,
}

impl MatchResult {
    pub fn new(filename: &str, line_num: usize, line: &str, spans: Vec<(usize, usize)>) -> Self {
        MatchResult {
            filename: filename.to_string(),
            line_num,
            line_content: line.to_string(),
            match_start: spans.first().map(|s| s.0),
            match_end: spans.first().map(|s| s.1),
            spans,
        }
    }
}

pub fn maybe_colorize(s: &str, use_color: bool) -> String {
    if use_color {
        format!("{COLOR_START}{s}{COLOR_RESET}")
    } else {
        s.to_string()
    }
}

/// Rebuild a line with every span wrapped in highlight codes. Spans must be
/// sorted and non-overlapping.
pub fn highlight_spans(line: &str, spans: &[(usize, usize)], use_color: bool) -> String {
    if !use_color || spans.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for &(start, end) in spans {
        out.push_str(&line[cursor..start]);
        out.push_str(COLOR_START);
        out.push_str(&line[start..end]);
        out.push_str(COLOR_RESET);
        cursor = end;
    }
    out.push_str(&line[cursor..]);
    out
}

pub trait OutputFormatter {
    fn format(&self, results: &[MatchResult]) -> String;
}

/// Results grouped by file plus a metadata block describing the query.
pub struct JsonFormatter {
    pattern: serde_json::Value,
    flags: serde_json::Value,
}

impl JsonFormatter {
    pub fn new(cfg: &Config) -> Self {
        let pattern = if cfg.patterns.len() == 1 {
            json!(cfg.patterns[0])
        } else {
            json!(cfg.patterns)
        };
        JsonFormatter {
            pattern,
            flags: json!({
                "ignore_case": cfg.ignore_case,
                "invert_match": cfg.invert_match,
                "line_number": cfg.line_numbers,
                "count": cfg.count,
                "after_context": cfg.after_context,
                "before_context": cfg.before_context,
                "recursive": cfg.recursive,
            }),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, results: &[MatchResult]) -> String {
        let mut files: Vec<&str> = Vec::new();
        for result in results {
            if !files.contains(&result.filename.as_str()) {
                files.push(&result.filename);
            }
        }

        let grouped: Vec<serde_json::Value> = files
            .iter()
            .map(|file| {
                let matches: Vec<&MatchResult> = results
                    .iter()
                    .filter(|r| r.filename == *file)
                    .collect();
                json!({ "file": file, "matches": matches })
            })
            .collect();

        let output = json!({
            "results": grouped,
            "metadata": {
                "pattern": self.pattern,
                "flags": self.flags,
                "total_matches": results.len(),
            },
        });
        serde_json::to_string_pretty(&output).unwrap_or_default()
    }
}

pub struct CsvFormatter {
    pub include_header: bool,
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, results: &[MatchResult]) -> String {
        let mut lines = Vec::new();
        if self.include_header {
            lines.push("file,line,content,match_start,match_end".to_string());
        }
        for result in results {
            let start = result.match_start.map(|v| v.to_string()).unwrap_or_default();
            let end = result.match_end.map(|v| v.to_string()).unwrap_or_default();
            lines.push(format!(
                "{},{},{},{},{}",
                csv_field(&result.filename),
                result.line_num,
                csv_field(&result.line_content),
                start,
                end
            ));
        }
        lines.join("\n")
    }
}

pub struct MarkdownFormatter;

impl OutputFormatter for MarkdownFormatter {
    fn format(&self, results: &[MatchResult]) -> String {
        let mut lines = vec![
            "| File | Line | Content |".to_string(),
            "|------|------|---------|".to_string(),
        ];
        for result in results {
            let mut content = result.line_content.replace('|', "\\|");
            if content.len() > 80 {
                let mut cut = 77;
                while !content.is_char_boundary(cut) {
                    cut -= 1;
                }
                content.truncate(cut);
                content.push_str("...");
            }
            lines.push(format!(
                "| {} | {} | {} |",
                result.filename, result.line_num, content
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ColorWhen, OutputFormat};

    fn sample() -> Vec<MatchResult> {
        vec![
            MatchResult::new("a.txt", 1, "one cat", vec![(4, 7)]),
            MatchResult::new("a.txt", 3, "two cats", vec![(4, 7)]),
            MatchResult::new("b.txt", 2, "cat, dog", vec![(0, 3)]),
        ]
    }

    fn config() -> Config {
        Config {
            patterns: vec!["cat".to_string()],
            paths: Vec::new(),
            recursive: false,
            ignore_case: false,
            invert_match: false,
            line_numbers: true,
            count: false,
            only_matching: false,
            quiet: false,
            files_with_matches: false,
            files_without_match: false,
            max_count: None,
            before_context: 0,
            after_context: 0,
            color: ColorWhen::Never,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn highlights_each_span() {
        let line = "cat and cat";
        let rendered = highlight_spans(line, &[(0, 3), (8, 11)], true);
        assert_eq!(
            rendered,
            "\x1b[01;31mcat\x1b[m and \x1b[01;31mcat\x1b[m"
        );
        assert_eq!(highlight_spans(line, &[(0, 3)], false), line);
    }

    #[test]
    fn json_groups_by_file_and_counts() {
        let out = JsonFormatter::new(&config()).format(&sample());
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["metadata"]["total_matches"], 3);
        assert_eq!(value["metadata"]["pattern"], "cat");
        assert_eq!(value["metadata"]["flags"]["line_number"], true);
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["results"][0]["file"], "a.txt");
        assert_eq!(
            value["results"][0]["matches"].as_array().unwrap().len(),
            2
        );
        assert_eq!(value["results"][0]["matches"][0]["line_num"], 1);
        assert_eq!(value["results"][0]["matches"][0]["match_start"], 4);
    }

    #[test]
    fn csv_quotes_fields_with_commas() {
        let out = CsvFormatter {
            include_header: true,
        }
        .format(&sample());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "file,line,content,match_start,match_end");
        assert_eq!(lines[1], "a.txt,1,one cat,4,7");
        assert_eq!(lines[3], "b.txt,2,\"cat, dog\",0,3");
    }

    #[test]
    fn markdown_escapes_pipes_and_truncates() {
        let long = "x".repeat(100);
        let results = vec![
            MatchResult::new("a.txt", 1, "a|b", vec![(0, 1)]),
            MatchResult::new("a.txt", 2, &long, vec![(0, 1)]),
        ];
        let out = MarkdownFormatter.format(&results);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "| File | Line | Content |");
        assert!(lines[2].contains("a\\|b"));
        assert!(lines[3].contains(&format!("{}...", "x".repeat(77))));
    }

    #[test]
    fn inverted_results_serialize_null_spans() {
        let result = MatchResult::new("a.txt", 1, "no match here", Vec::new());
        let value = serde_json::to_value(&result).unwrap();
        assert!(value["match_start"].is_null());
        assert!(value["match_end"].is_null());
    }
}
