use serde_json::Value;

/// Render a JSON value as a table cell: strings raw, null empty, anything else as compact JSON.
pub fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Key/value rows for an API object, in the order the API returned the fields.
pub fn object_rows(object: &serde_json::Map<String, Value>) -> Vec<Vec<String>> {
    object
        .iter()
        .map(|(key, value)| vec![key.clone(), cell(value)])
        .collect()
}

/// Render rows as a bordered grid.
///
/// ```text
/// +----+------+
/// | Id | Name |
/// +====+======+
/// | 1  | a    |
/// +----+------+
/// ```
///
/// Columns whose cells are all numeric are right-aligned.
pub fn render_grid(headers: Option<&[&str]>, rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| c.replace(['\n', '\r'], " ")).collect())
        .collect();

    let columns = headers
        .map(<[&str]>::len)
        .unwrap_or(0)
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    if columns == 0 {
        return String::new();
    }

    let widths: Vec<usize> = (0..columns)
        .map(|index| {
            let header_width = headers
                .and_then(|h| h.get(index))
                .map(|h| h.chars().count())
                .unwrap_or(0);
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|c| c.chars().count())
                .max()
                .unwrap_or(0)
                .max(header_width)
        })
        .collect();

    let numeric: Vec<bool> = (0..columns)
        .map(|index| {
            let mut cells = rows
                .iter()
                .filter_map(|row| row.get(index))
                .filter(|c| !c.is_empty())
                .peekable();
            cells.peek().is_some() && cells.all(|c| looks_numeric(c))
        })
        .collect();

    let divider = |fill: char| {
        let mut line = String::from("+");
        for width in &widths {
            line.push_str(&fill.to_string().repeat(width + 2));
            line.push('+');
        }
        line
    };

    let render_row = |cells: Vec<&str>| {
        let mut line = String::from("|");
        for (index, width) in widths.iter().enumerate() {
            let value = cells.get(index).copied().unwrap_or("");
            let pad = width.saturating_sub(value.chars().count());
            if numeric[index] {
                line.push_str(&format!(" {}{} |", " ".repeat(pad), value));
            } else {
                line.push_str(&format!(" {}{} |", value, " ".repeat(pad)));
            }
        }
        line
    };

    let mut lines = vec![divider('-')];
    if let Some(headers) = headers {
        lines.push(render_row(headers.to_vec()));
        lines.push(divider('='));
    }
    for row in &rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
        lines.push(divider('-'));
    }
    lines.join("\n")
}

fn looks_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}
