use std::collections::HashSet;

use regex::Regex;

use crate::views::View;

/// A header click requested from the command line: `TABLE:COLUMN`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortClick {
    pub table_id: String,
    pub column: usize,
}

/// Parses a comma-separated view list, dropping duplicates but keeping the
/// first-seen order.
pub fn parse_views_csv(value: &str) -> Result<Vec<View>, String> {
    let items: Vec<&str> = value.split(',').collect();
    parse_views(&items)
}

pub fn parse_views<S: AsRef<str>>(values: &[S]) -> Result<Vec<View>, String> {
    let mut out: Vec<View> = Vec::new();
    let mut seen: HashSet<View> = HashSet::new();
    for raw in values {
        let item = raw.as_ref().trim();
        if item.is_empty() {
            continue;
        }
        if item.eq_ignore_ascii_case("all") {
            for view in View::ALL {
                if seen.insert(view) {
                    out.push(view);
                }
            }
            continue;
        }
        let view = View::parse(item).ok_or_else(|| {
            let known: Vec<&str> = View::ALL.iter().map(|v| v.name()).collect();
            format!("unknown view '{item}', expected one of {}", known.join(", "))
        })?;
        if seen.insert(view) {
            out.push(view);
        }
    }
    if out.is_empty() {
        return Err("views list is empty".to_string());
    }
    Ok(out)
}

pub fn parse_sort_click(value: &str) -> Result<SortClick, String> {
    let pattern = Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*):(\d+)$")
        .map_err(|e| format!("invalid sort pattern: {e}"))?;
    let caps = pattern
        .captures(value.trim())
        .ok_or_else(|| "expected format TABLE:COLUMN".to_string())?;
    let column = caps[2]
        .parse::<usize>()
        .map_err(|_| "invalid COLUMN value".to_string())?;
    Ok(SortClick {
        table_id: caps[1].to_string(),
        column,
    })
}

pub fn validate_backend_url(value: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(value.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_keep_order_and_drop_duplicates() {
        assert_eq!(
            parse_views_csv("teams, leaderboard,teams").unwrap(),
            vec![View::Teams, View::Leaderboard]
        );
        assert_eq!(parse_views_csv("all").unwrap(), View::ALL.to_vec());
        assert!(parse_views_csv("teams,bogus").unwrap_err().contains("bogus"));
        assert!(parse_views_csv(" , ").is_err());
    }

    #[test]
    fn sort_click_parses_table_and_column() {
        assert_eq!(
            parse_sort_click("user_stats:3").unwrap(),
            SortClick {
                table_id: "user_stats".to_string(),
                column: 3
            }
        );
        assert!(parse_sort_click("user_stats").is_err());
        assert!(parse_sort_click("3:teams").is_err());
        assert!(parse_sort_click("teams:-1").is_err());
    }

    #[test]
    fn backend_url_must_be_http() {
        assert!(validate_backend_url("http://localhost:8080").is_ok());
        assert!(validate_backend_url("ftp://stats.example").is_err());
        assert!(validate_backend_url("not a url").is_err());
    }
}
