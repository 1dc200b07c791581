use std::cmp::Ordering;

use serde::Serialize;
use serde_json::Value;

use super::Row;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    fn out_of_order(self, ordering: Ordering) -> bool {
        match self {
            SortDirection::Ascending => ordering == Ordering::Greater,
            SortDirection::Descending => ordering == Ordering::Less,
        }
    }
}

/// Last sort applied to a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: usize,
    pub direction: SortDirection,
}

fn normalize_cell(text: &str) -> String {
    text.trim().to_lowercase().replace(',', "")
}

/// Compares two cell texts the way a header click does: case-insensitive,
/// thousands separators ignored, numerically when both sides are integers.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    let a = normalize_cell(a);
    let b = normalize_cell(b);
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(&b),
    }
}

fn cell_text(row: &Row, column: usize) -> &str {
    row.cells
        .get(column)
        .map(|c| c.display_text())
        .unwrap_or_default()
}

// Full bubble passes until one makes no swaps. Passes are capped at the row
// count: a consistent order never needs more, and a mixed numeric/text column
// can be intransitive.
fn bubble_passes(rows: &mut [Row], column: usize, direction: SortDirection) -> usize {
    let mut swaps = 0;
    for _ in 0..rows.len() {
        let mut pass_swaps = 0;
        for i in 1..rows.len() {
            let ordering = compare_cells(cell_text(&rows[i - 1], column), cell_text(&rows[i], column));
            if direction.out_of_order(ordering) {
                rows.swap(i - 1, i);
                pass_swaps += 1;
            }
        }
        swaps += pass_swaps;
        if pass_swaps == 0 {
            break;
        }
    }
    swaps
}

/// Sorts rows in place by `column`. Always tries ascending first; when that
/// moves nothing the rows are sorted descending instead, so repeated calls on
/// the same column alternate between the two directions.
pub fn sort_rows(rows: &mut [Row], column: usize) -> SortDirection {
    if bubble_passes(rows, column, SortDirection::Ascending) > 0 {
        return SortDirection::Ascending;
    }
    bubble_passes(rows, column, SortDirection::Descending);
    SortDirection::Descending
}

fn value_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Number(_)) => 0,
        Some(Value::String(_)) => 1,
        Some(Value::Bool(_)) => 2,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 3,
        Some(Value::Null) | None => 4,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .unwrap_or_default()
                    .partial_cmp(&y.as_f64().unwrap_or_default())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => value_rank(a).cmp(&value_rank(b)),
    }
}

/// Stable client-side sort of raw records by one field, applied before render.
/// Records without the field go last.
pub fn sort_records(records: &mut [Value], key: &str) {
    records.sort_by(|a, b| compare_values(a.get(key), b.get(key)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use serde_json::json;

    fn rows(values: &[&str]) -> Vec<Row> {
        values
            .iter()
            .map(|v| Row {
                cells: vec![Cell::text(*v)],
            })
            .collect()
    }

    fn column(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.cells[0].display_text().to_string())
            .collect()
    }

    #[test]
    fn integers_compare_numerically() {
        assert_eq!(compare_cells("2", "10"), Ordering::Less);
        assert_eq!(compare_cells("1,200", "999"), Ordering::Greater);
    }

    #[test]
    fn text_compares_case_insensitively() {
        assert_eq!(compare_cells("Apple", "bronze"), Ordering::Less);
        assert_eq!(compare_cells("ZETA", "alpha"), Ordering::Greater);
        assert_eq!(compare_cells("Team", "team"), Ordering::Equal);
    }

    #[test]
    fn mixed_column_sorts_numbers_then_words() {
        let mut r = rows(&["10", "2", "bronze", "Apple"]);
        let direction = sort_rows(&mut r, 0);
        assert_eq!(direction, SortDirection::Ascending);
        assert_eq!(column(&r), vec!["2", "10", "Apple", "bronze"]);
    }

    #[test]
    fn second_click_toggles_to_descending_then_back() {
        let mut r = rows(&["3", "1", "2"]);
        assert_eq!(sort_rows(&mut r, 0), SortDirection::Ascending);
        assert_eq!(column(&r), vec!["1", "2", "3"]);

        assert_eq!(sort_rows(&mut r, 0), SortDirection::Descending);
        assert_eq!(column(&r), vec!["3", "2", "1"]);

        assert_eq!(sort_rows(&mut r, 0), SortDirection::Ascending);
        assert_eq!(column(&r), vec!["1", "2", "3"]);
    }

    #[test]
    fn equal_rows_keep_their_relative_order() {
        let mut r = vec![
            Row {
                cells: vec![Cell::text("b"), Cell::text("first")],
            },
            Row {
                cells: vec![Cell::text("a"), Cell::text("x")],
            },
            Row {
                cells: vec![Cell::text("B"), Cell::text("second")],
            },
        ];
        sort_rows(&mut r, 0);
        let tags: Vec<_> = r.iter().map(|row| row.cells[1].display_text()).collect();
        assert_eq!(tags, vec!["x", "first", "second"]);
    }

    #[test]
    fn intransitive_column_terminates() {
        let mut r = rows(&["1a", "10", "2", "1a", "2", "10"]);
        sort_rows(&mut r, 0);
        assert_eq!(r.len(), 6);
    }

    #[test]
    fn missing_cells_sort_as_empty_text() {
        let mut r = vec![
            Row {
                cells: vec![Cell::text("b")],
            },
            Row { cells: vec![] },
        ];
        assert_eq!(sort_rows(&mut r, 0), SortDirection::Ascending);
        assert!(r[0].cells.is_empty());
    }

    #[test]
    fn records_sort_by_numeric_key() {
        let mut records = vec![
            json!({"id": 2, "name": "B"}),
            json!({"id": 10, "name": "C"}),
            json!({"id": 1, "name": "A"}),
        ];
        sort_records(&mut records, "id");
        let ids: Vec<_> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 10]);
    }

    #[test]
    fn records_missing_key_sort_last() {
        let mut records = vec![json!({"name": "none"}), json!({"rank": 2}), json!({"rank": 1})];
        sort_records(&mut records, "rank");
        assert_eq!(records[0]["rank"], 1);
        assert_eq!(records[2]["name"], "none");
    }
}
