//! Turns the model's free-form answer into an [`AnalysisRecord`].
//!
//! Parsing never fails: every field that cannot be recovered falls back to its default
//! (score 50, empty strings, empty lists).

use crate::models::{AnalysisRecord, CodeExamplePair, ImprovementItem, StrengthItem, DEFAULT_SCORE};
use crate::prompts::{
    LABEL_CODE_AFTER, LABEL_CODE_BEFORE, LABEL_FINAL_THOUGHTS, LABEL_IMPROVEMENTS, LABEL_SCORE,
    LABEL_STRENGTHS, LABEL_SUMMARY, SUB_LABEL_ACTION, SUB_LABEL_ISSUE, SUB_LABEL_SCORE,
    TRUNCATION_MARKER,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+•]|\d+[.)])(?:\s+|$)").expect("valid marker regex"));

static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid integer regex"));

static OUT_OF_100: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*/\s*100\b").expect("valid score regex"));

static SUB_LABEL: Lazy<Regex> = Lazy::new(|| {
    let name = |label: &'static str| label.trim_end_matches(':');
    Regex::new(&format!(
        r"(?i)\b({}|rating|{}|problem|recommended action|{}|recommendation|suggestion|fix)\s*[:：]",
        name(SUB_LABEL_SCORE),
        name(SUB_LABEL_ISSUE),
        name(SUB_LABEL_ACTION),
    ))
    .expect("valid sub-label regex")
});

static TITLE_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(\d+(?:\.\d+)?\s*/\s*10)\s*\)|\b(\d+(?:\.\d+)?\s*/\s*10)\b")
        .expect("valid title score regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
    Score,
    Summary,
    Strengths,
    Improvements,
    Before,
    After,
    FinalThoughts,
    /// Recognised heading whose content is dropped
    Ignored,
}

/// Labels the prompt asks for, tried before the looser aliases
const PROMPT_LABELS: &[(&str, Section)] = &[
    (LABEL_CODE_BEFORE, Section::Before),
    (LABEL_CODE_AFTER, Section::After),
    (LABEL_SCORE, Section::Score),
    (LABEL_SUMMARY, Section::Summary),
    (LABEL_STRENGTHS, Section::Strengths),
    (LABEL_IMPROVEMENTS, Section::Improvements),
    (LABEL_FINAL_THOUGHTS, Section::FinalThoughts),
];

/// Headings models write instead of the prompt labels
const ALIASES: &[(&str, Section)] = &[
    ("code example before", Section::Before),
    ("code example after", Section::After),
    ("code example", Section::Ignored),
    ("code sample", Section::Ignored),
    ("overall score", Section::Score),
    ("overall rating", Section::Score),
    ("score", Section::Score),
    ("summary", Section::Summary),
    ("overview", Section::Summary),
    ("strengths", Section::Strengths),
    ("what's good", Section::Strengths),
    ("what is good", Section::Strengths),
    ("areas for improvement", Section::Improvements),
    ("what can be improved", Section::Improvements),
    ("improvements", Section::Improvements),
    ("before", Section::Before),
    ("after", Section::After),
    ("final thoughts", Section::FinalThoughts),
    ("conclusion", Section::FinalThoughts),
];

/// Case-insensitive ASCII prefix match; a typographic apostrophe matches `'`
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, c) = chars.next()?;
        let c = if c == '\u{2019}' { '\'' } else { c };
        if !c.eq_ignore_ascii_case(&expected) {
            return None;
        }
    }
    let rest = chars.next().map(|(i, _)| i).unwrap_or(text.len());
    Some(&text[rest..])
}

fn strip_emphasis(text: &str) -> &str {
    text.trim_start_matches("**")
        .trim_start_matches("__")
        .trim_end_matches("**")
        .trim_end_matches("__")
}

/// Recognises a section label line and returns the text that follows the label
fn match_label(line: &str) -> Option<(Section, &str)> {
    if line.starts_with(char::is_whitespace) || LIST_MARKER.is_match(line) {
        return None;
    }
    let text = line.trim_start_matches('#').trim();
    let text = text.trim_start_matches("**").trim_start_matches("__");

    let exact = PROMPT_LABELS.iter().find_map(|(label, section)| {
        let rest = strip_prefix_ci(text, label)?;
        Some((*section, strip_emphasis(strip_emphasis(rest).trim()).trim()))
    });
    if exact.is_some() {
        return exact;
    }

    ALIASES.iter().find_map(|(alias, section)| {
        let rest = strip_prefix_ci(text, alias)?;
        let rest = strip_emphasis(rest).trim_start();
        if rest.is_empty() {
            return Some((*section, ""));
        }
        let mut chars = rest.chars();
        match chars.next() {
            Some(':' | '：' | '-' | '–' | '—') => {
                Some((*section, strip_emphasis(strip_emphasis(chars.as_str()).trim()).trim()))
            }
            _ => None,
        }
    })
}

/// Splits text into labeled segments; only the first occurrence of a label opens a segment
fn segment(raw: &str) -> HashMap<Section, String> {
    let mut segments: HashMap<Section, String> = HashMap::new();
    let mut current: Option<Section> = None;
    let mut in_fence = false;

    for line in raw.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some((section, rest)) = match_label(line) {
                if !segments.contains_key(&section) {
                    current = Some(section);
                    let body = segments.entry(section).or_default();
                    if !rest.is_empty() {
                        body.push_str(rest);
                        body.push('\n');
                    }
                    continue;
                }
            }
        }

        if let Some(section) = current {
            let body = segments.entry(section).or_default();
            body.push_str(line);
            body.push('\n');
        }
    }

    segments.remove(&Section::Ignored);
    segments
}

fn parse_score(segments: &HashMap<Section, String>, raw: &str) -> u8 {
    let clamp = |digits: &str| digits.parse::<u64>().map(|n| n.min(100)).unwrap_or(100) as u8;

    if let Some(m) = segments.get(&Section::Score).and_then(|s| INTEGER.find(s)) {
        return clamp(m.as_str());
    }
    if let Some(caps) = OUT_OF_100.captures(raw) {
        debug!("No SCORE section value; using first N/100 in the text");
        return clamp(&caps[1]);
    }
    debug!("No score found; defaulting to {}", DEFAULT_SCORE);
    DEFAULT_SCORE
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn strip_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(m) => &line[m.end()..],
        None => line.trim_start(),
    }
}

/// Splits a list segment into items, each a list of lines without markers
fn split_items(body: &str) -> Vec<Vec<String>> {
    let top_indent = body
        .lines()
        .filter(|l| LIST_MARKER.is_match(l))
        .map(indent_width)
        .min();

    let mut items: Vec<Vec<String>> = Vec::new();
    let mut current: Option<Vec<String>> = None;
    let mut after_blank = false;

    let Some(top_indent) = top_indent else {
        // No markers: one item per paragraph
        for line in body.lines() {
            if line.trim().is_empty() {
                items.extend(current.take());
            } else {
                current.get_or_insert_with(Vec::new).push(line.trim().to_string());
            }
        }
        items.extend(current);
        return items;
    };

    for line in body.lines() {
        if line.trim().is_empty() {
            after_blank = true;
            continue;
        }
        let indent = indent_width(line);
        let is_marker = LIST_MARKER.is_match(line);

        if is_marker && indent <= top_indent {
            items.extend(current.take());
            current = Some(vec![strip_marker(line).trim().to_string()]);
        } else if indent > top_indent || !after_blank {
            // Nested or wrapped lines continue the open item; prose before the first item is dropped
            if let Some(item) = current.as_mut() {
                item.push(strip_marker(line).trim().to_string());
            } else if let Some(item) = items.last_mut().filter(|_| indent > top_indent) {
                item.push(strip_marker(line).trim().to_string());
            }
        } else {
            items.extend(current.take());
        }
        after_blank = false;
    }
    items.extend(current);
    items.retain(|item| item.iter().any(|l| !l.is_empty()));
    items
}

/// Title/description separator: `": "` first, then a spaced dash
fn split_title(line: &str) -> Option<(&str, &str)> {
    if let Some((title, rest)) = line.split_once(": ") {
        return Some((title, rest));
    }
    [" - ", " – ", " — "]
        .iter()
        .find_map(|sep| line.split_once(sep))
}

fn clean(text: &str) -> String {
    text.replace("**", "")
        .trim()
        .trim_start_matches("__")
        .trim_end_matches("__")
        .trim()
        .to_string()
}

/// Trims whitespace, dangling separators and an unbalanced closing parenthesis
fn trim_separators(text: &str) -> String {
    let mut s = text.trim_matches(|c: char| c.is_whitespace() || "*-–—•,;|:".contains(c));
    while s.ends_with(')') && s.matches('(').count() < s.matches(')').count() {
        s = s[..s.len() - 1].trim_end_matches(|c: char| c.is_whitespace() || "*-–—•,;|:".contains(c));
    }
    s.to_string()
}

fn parse_strength(lines: &[String]) -> StrengthItem {
    let first = clean(&lines[0]);
    let rest: Vec<String> = lines[1..].iter().map(|l| clean(l)).filter(|l| !l.is_empty()).collect();

    let (title, mut description) = match split_title(&first) {
        Some((title, description)) => (trim_separators(title), description.trim().to_string()),
        None if rest.is_empty() => (trim_separators(&first), trim_separators(&first)),
        None => (trim_separators(&first), String::new()),
    };
    for line in rest {
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&line);
    }
    StrengthItem { title, description }
}

fn parse_improvement(lines: &[String]) -> ImprovementItem {
    let text = lines
        .iter()
        .map(|l| clean(l))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let labels: Vec<(usize, usize, String)> = SUB_LABEL
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some((whole.start(), whole.end(), caps[1].to_lowercase()))
        })
        .collect();

    let title_end = labels.first().map(|(start, _, _)| *start).unwrap_or(text.len());
    let mut item = ImprovementItem {
        title: text[..title_end].to_string(),
        ..ImprovementItem::default()
    };

    for (i, (_, value_start, name)) in labels.iter().enumerate() {
        let value_end = labels.get(i + 1).map(|(start, _, _)| *start).unwrap_or(text.len());
        let value = trim_separators(&text[*value_start..value_end]);
        let slot = match name.as_str() {
            "score" | "rating" => &mut item.score,
            "issue" | "problem" => &mut item.issue,
            _ => &mut item.action,
        };
        if slot.is_empty() {
            *slot = value;
        }
    }

    if item.score.is_empty() {
        let found = TITLE_SCORE.captures(&item.title).and_then(|caps| {
            let score = caps.get(1).or_else(|| caps.get(2))?.as_str().replace(' ', "");
            Some((score, caps.get(0)?.range()))
        });
        if let Some((score, range)) = found {
            item.score = score;
            item.title.replace_range(range, " ");
        }
    }
    item.title = trim_separators(&item.title);
    item
}

/// Code lines of an example without fences or truncation markers
fn parse_code(body: Option<&String>) -> String {
    let Some(body) = body else {
        return String::new();
    };
    let code = body
        .lines()
        .filter(|line| {
            let t = line.trim();
            !t.starts_with("```") && !t.starts_with("~~~") && t != TRUNCATION_MARKER
        })
        .collect::<Vec<_>>()
        .join("\n");
    code.trim_start_matches(|c: char| c == '\n' || c == '\r')
        .trim_end()
        .to_string()
}

/// Parses a raw model answer. Total: any input yields a complete record.
pub fn parse(raw: &str) -> AnalysisRecord {
    let segments = segment(raw);
    let text = |section: Section| {
        segments
            .get(&section)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let strengths = segments
        .get(&Section::Strengths)
        .map(|body| split_items(body).iter().map(|l| parse_strength(l)).collect())
        .unwrap_or_default();
    let improvements = segments
        .get(&Section::Improvements)
        .map(|body| split_items(body).iter().map(|l| parse_improvement(l)).collect())
        .unwrap_or_default();

    let record = AnalysisRecord {
        overall_score: parse_score(&segments, raw),
        summary: text(Section::Summary),
        strengths,
        improvements,
        code_examples: CodeExamplePair {
            before: parse_code(segments.get(&Section::Before)),
            after: parse_code(segments.get(&Section::After)),
        },
        final_thoughts: text(Section::FinalThoughts),
    };

    debug!(
        "Parsed review: score {}, {} strengths, {} improvements",
        record.overall_score,
        record.strengths.len(),
        record.improvements.len()
    );
    record
}
