//! Parser for remote archive detail pages.
//!
//! The pages are semi-structured: one outcome table whose rows pair a bold
//! `Choice <n>` cell (optionally qualified with a parenthesized tag such as
//! `(Success)`) with a cell of `<br>`-separated outcome lines. Rows that do
//! not fit the shape are skipped; a page with no usable rows at all is the
//! caller's problem.

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::Choice;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = false;

use crate::log_info;

fn table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").unwrap())
}

fn row_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").unwrap())
}

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]>").unwrap())
}

fn choice_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<(?:b|strong)[^>]*>\s*Choice\s+(\d+)\s*</(?:b|strong)>").unwrap()
    })
}

fn hr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<hr[^>]*/?>").unwrap())
}

fn br_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<br[^>]*/?>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn paren_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]*)\)").unwrap())
}

/// Parse the first table of an archive page into aggregated choices.
///
/// Rows accumulate by choice number (one choice may span several rows);
/// the result is ordered by ascending choice number. Malformed rows are
/// skipped without aborting the parse.
pub fn parse_choice_table(html: &str) -> Vec<Choice> {
    let Some(table) = table_re().captures(html) else {
        return Vec::new();
    };
    let table_body = table.get(1).map_or("", |m| m.as_str());

    let mut choices: Vec<Choice> = Vec::new();

    // First row is the header
    for row in row_re().captures_iter(table_body).skip(1) {
        let row_body = row.get(1).map_or("", |m| m.as_str());
        if let Some((number, tag, lines)) = parse_row(row_body) {
            let entry = match choices.iter_mut().find(|c| c.number == number) {
                Some(existing) => existing,
                None => {
                    choices.push(Choice::new(number));
                    choices.last_mut().unwrap()
                }
            };
            route_outcomes(entry, tag, lines);
        }
    }

    choices.sort_by_key(|c| c.number);
    choices
}

/// One table row: choice number, optional parenthesized tag, outcome lines.
fn parse_row(row_body: &str) -> Option<(u32, Option<String>, Vec<String>)> {
    let cells: Vec<&str> = cell_re()
        .captures_iter(row_body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    if cells.len() < 2 {
        return None;
    }

    let first = cells[0];
    let last = cells[cells.len() - 1];

    let bold = choice_label_re().captures(first)?;
    let number: u32 = bold.get(1)?.as_str().parse().ok()?;

    // Everything in the first cell after the bold element qualifies the row
    let qualifier_markup = &first[bold.get(0)?.end()..];
    let qualifier = clean_fragment(&hr_re().replace_all(qualifier_markup, " "));
    let tag = paren_re()
        .captures(&qualifier)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty());

    let lines: Vec<String> = br_re()
        .split(last)
        .map(clean_fragment)
        .map(|line| strip_bullet(&line))
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() && tag.is_none() {
        return None;
    }

    log_info!("row: choice {} tag {:?} ({} lines)", number, tag, lines.len());
    Some((number, tag, lines))
}

fn route_outcomes(choice: &mut Choice, tag: Option<String>, lines: Vec<String>) {
    match tag {
        Some(tag) if tag.eq_ignore_ascii_case("success") => {
            choice.success_outcomes.extend(lines);
        }
        Some(tag) if tag.eq_ignore_ascii_case("fail") => {
            choice.failure_outcomes.extend(lines);
        }
        Some(tag) => {
            if choice.label.is_none() {
                choice.label = Some(tag);
            }
            choice.success_outcomes.extend(lines);
        }
        None => {
            choice.success_outcomes.extend(lines);
        }
    }
}

/// Strip markup, decode entities, collapse whitespace.
fn clean_fragment(markup: &str) -> String {
    let text = tag_re().replace_all(markup, " ");
    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_bullet(line: &str) -> String {
    line.trim_start_matches(['•', '·', '・', '-', '*'])
        .trim()
        .to_string()
}

/// The handful of entities these pages actually use.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &str) -> String {
        format!(
            "<html><body><table><tr><th>Choice</th><th>Outcome</th></tr>{rows}</table></body></html>"
        )
    }

    #[test]
    fn single_success_row() {
        let html = table(
            "<tr><td><b>Choice 1</b> (Success)</td><td>Speed +10<br>Power +5</td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].number, 1);
        assert_eq!(choices[0].success_outcomes, vec!["Speed +10", "Power +5"]);
        assert!(choices[0].failure_outcomes.is_empty());
        assert!(choices[0].label.is_none());
    }

    #[test]
    fn success_and_fail_rows_accumulate_per_choice() {
        let html = table(concat!(
            "<tr><td><b>Choice 1</b> (Success)</td><td>Speed +10</td></tr>",
            "<tr><td><b>Choice 1</b> (Fail)</td><td>Guts +5<br>Mood -1</td></tr>",
            "<tr><td><b>Choice 2</b></td><td>Energy +10</td></tr>",
        ));
        let choices = parse_choice_table(&html);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices[0].success_outcomes, vec!["Speed +10"]);
        assert_eq!(choices[0].failure_outcomes, vec!["Guts +5", "Mood -1"]);
        assert_eq!(choices[1].number, 2);
        assert_eq!(choices[1].success_outcomes, vec!["Energy +10"]);
    }

    #[test]
    fn untagged_rows_default_to_success() {
        let html = table("<tr><td><b>Choice 3</b></td><td>Wisdom +5</td></tr>");
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].number, 3);
        assert_eq!(choices[0].success_outcomes, vec!["Wisdom +5"]);
    }

    #[test]
    fn arbitrary_tag_becomes_label() {
        let html = table(
            "<tr><td><b>Choice 1</b> (Top Option)</td><td>Skill hint</td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].label.as_deref(), Some("Top Option"));
        assert_eq!(choices[0].success_outcomes, vec!["Skill hint"]);
    }

    #[test]
    fn rows_without_bold_choice_are_skipped() {
        let html = table(concat!(
            "<tr><td>random note spanning the table</td><td>ignored</td></tr>",
            "<tr><td><b>Choice 1</b></td><td>Stamina +10</td></tr>",
        ));
        let choices = parse_choice_table(&html);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].success_outcomes, vec!["Stamina +10"]);
    }

    #[test]
    fn rows_with_one_cell_are_skipped() {
        let html = table(concat!(
            "<tr><td><b>Choice 1</b></td></tr>",
            "<tr><td><b>Choice 2</b></td><td>Power +5</td></tr>",
        ));
        let choices = parse_choice_table(&html);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].number, 2);
    }

    #[test]
    fn hr_markup_in_qualifier_is_stripped() {
        let html = table(
            "<tr><td><b>Choice 1</b><hr/>(Success)</td><td>Speed +10</td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].success_outcomes, vec!["Speed +10"]);
        assert!(choices[0].label.is_none());
    }

    #[test]
    fn bullets_and_blank_lines_are_cleaned() {
        let html = table(
            "<tr><td><b>Choice 1</b></td><td>• Speed +10<br><br>・Guts +5<br>   </td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].success_outcomes, vec!["Speed +10", "Guts +5"]);
    }

    #[test]
    fn entities_are_decoded() {
        let html = table(
            "<tr><td><b>Choice 1</b></td><td>Speed&nbsp;+10 &amp; Power +5</td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].success_outcomes, vec!["Speed +10 & Power +5"]);
    }

    #[test]
    fn strong_counts_as_bold() {
        let html = table(
            "<tr><td><strong>Choice 1</strong> (Fail)</td><td>Mood -1</td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices[0].failure_outcomes, vec!["Mood -1"]);
    }

    #[test]
    fn only_first_table_is_parsed() {
        let html = format!(
            "{}<table><tr><th>x</th></tr><tr><td><b>Choice 9</b></td><td>Nope</td></tr></table>",
            table("<tr><td><b>Choice 1</b></td><td>Speed +10</td></tr>")
        );
        let choices = parse_choice_table(&html);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].number, 1);
    }

    #[test]
    fn output_is_ordered_by_choice_number() {
        let html = table(concat!(
            "<tr><td><b>Choice 2</b></td><td>B</td></tr>",
            "<tr><td><b>Choice 1</b></td><td>A</td></tr>",
        ));
        let choices = parse_choice_table(&html);
        let numbers: Vec<u32> = choices.iter().map(|c| c.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn pages_without_tables_yield_nothing() {
        assert!(parse_choice_table("<html><body><p>404</p></body></html>").is_empty());
        assert!(parse_choice_table("").is_empty());
    }

    #[test]
    fn multiline_cells_with_nested_markup() {
        let html = table(
            "<tr><td><b>Choice 1</b> <i>(Success)</i></td><td><span>Speed +10</span><br/><span>Last trained stat +5</span></td></tr>",
        );
        let choices = parse_choice_table(&html);
        assert_eq!(
            choices[0].success_outcomes,
            vec!["Speed +10", "Last trained stat +5"]
        );
    }
}
