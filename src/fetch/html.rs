use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::RawTable;

static TABLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(/?)\s*(table|tr|td|th)\b[^>]*>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static IGNORED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b.*?</script\s*>|<style\b.*?</style\s*>").unwrap()
});

/// Extract every table in `html`, keyed `table1`, `table2`, ... in the
/// order their opening tags appear. Nested tables get their own keys; cell
/// text is stripped of markup, entity-decoded and whitespace-collapsed.
pub fn parse_tables(html: &str) -> HashMap<String, RawTable> {
    let html = IGNORED.replace_all(html, "");
    let mut tables = HashMap::new();
    let mut stack: Vec<OpenTable> = Vec::new();
    let mut opened = 0usize;
    let mut last = 0usize;

    for caps in TABLE_TAG.captures_iter(&html) {
        let Some(tag) = caps.get(0) else { continue };
        if let Some(cell) = stack.last_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(&html[last..tag.start()]);
        }
        last = tag.end();

        let closing = !caps[1].is_empty();
        let name = caps[2].to_ascii_lowercase();
        if name == "table" {
            if closing {
                if let Some(t) = stack.pop() {
                    let (id, table) = t.finish();
                    tables.insert(id, table);
                }
                // Keep text around a nested table from running together.
                if let Some(cell) = stack.last_mut().and_then(|t| t.cell.as_mut()) {
                    cell.push(' ');
                }
            } else {
                opened += 1;
                stack.push(OpenTable::new(format!("table{opened}")));
            }
            continue;
        }

        let Some(t) = stack.last_mut() else { continue };
        match (name.as_str(), closing) {
            ("tr", false) => {
                t.end_row();
                t.row = Some(Vec::new());
            }
            ("tr", true) => t.end_row(),
            (_, false) => {
                t.end_cell();
                t.cell = Some(String::new());
            }
            (_, true) => t.end_cell(),
        }
    }

    // Unterminated tables still count.
    while let Some(t) = stack.pop() {
        let (id, table) = t.finish();
        tables.insert(id, table);
    }
    tables
}

struct OpenTable {
    id: String,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<String>,
}

impl OpenTable {
    fn new(id: String) -> Self {
        Self {
            id,
            rows: Vec::new(),
            row: None,
            cell: None,
        }
    }

    fn end_cell(&mut self) {
        if let Some(raw) = self.cell.take() {
            self.row.get_or_insert_with(Vec::new).push(cell_text(&raw));
        }
    }

    fn end_row(&mut self) {
        self.end_cell();
        if let Some(row) = self.row.take().filter(|r| !r.is_empty()) {
            self.rows.push(row);
        }
    }

    fn finish(mut self) -> (String, RawTable) {
        self.end_row();
        (self.id, RawTable::new(self.rows))
    }
}

fn cell_text(raw: &str) -> String {
    let text = ANY_TAG.replace_all(raw, "");
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
