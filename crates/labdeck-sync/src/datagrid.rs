use labdeck_core::cell::{display_value, CellDisplay};
use serde_json::Value;
use thiserror::Error;

/// Changed values in a description are cut to this many characters.
const DESCRIPTION_VALUE_WIDTH: usize = 7;

/// In-place update for one cell of a positional grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridEdit {
    pub row: usize,
    pub column: usize,
    pub display: CellDisplay,
}

/// Result of diffing two equal-shape grids: cell updates plus one
/// human-readable description per changed row, e.g.
/// `@P3: payoff=12, note=flagged…`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridDiff {
    pub edits: Vec<GridEdit>,
    pub change_descriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridShapeError {
    #[error("row count mismatch: old {old}, new {new}")]
    RowCount { old: usize, new: usize },
    #[error("row {row} width mismatch: old {old}, new {new}")]
    RowWidth { row: usize, old: usize, new: usize },
    #[error("row {row} wider than headers: {width} > {headers}")]
    HeaderCount {
        row: usize,
        width: usize,
        headers: usize,
    },
}

/// Positional differ for the unkeyed data table: both grids must have the
/// same shape, and every changed cell yields an edit plus a line item in its
/// row's change description.
pub fn diff_grid(
    old: &[Vec<Value>],
    new: &[Vec<Value>],
    headers: &[String],
) -> Result<GridDiff, GridShapeError> {
    if old.len() != new.len() {
        return Err(GridShapeError::RowCount {
            old: old.len(),
            new: new.len(),
        });
    }

    let mut diff = GridDiff::default();
    for (row, (old_row, new_row)) in old.iter().zip(new).enumerate() {
        if old_row.len() != new_row.len() {
            return Err(GridShapeError::RowWidth {
                row,
                old: old_row.len(),
                new: new_row.len(),
            });
        }
        if new_row.len() > headers.len() {
            return Err(GridShapeError::HeaderCount {
                row,
                width: new_row.len(),
                headers: headers.len(),
            });
        }

        let mut row_changes = Vec::new();
        for (column, (old_value, new_value)) in old_row.iter().zip(new_row).enumerate() {
            if old_value == new_value {
                continue;
            }
            let display = display_value(new_value, "");
            let shown = match &display {
                CellDisplay::Text(text) => text.as_str(),
                _ => "",
            };
            row_changes.push(format!(
                "{}={}",
                headers[column],
                truncate_ellipsis(shown, DESCRIPTION_VALUE_WIDTH)
            ));
            diff.edits.push(GridEdit {
                row,
                column,
                display,
            });
        }
        if !row_changes.is_empty() {
            // @ makes it easier to scan visually
            diff.change_descriptions
                .push(format!("@P{}: {}", row + 1, row_changes.join(", ")));
        }
    }
    Ok(diff)
}

/// Cut to `max` characters, appending an ellipsis only when something was
/// actually cut.
pub fn truncate_ellipsis(input: &str, max: usize) -> String {
    if input.chars().count() > max {
        let mut out: String = input.chars().take(max).collect();
        out.push('…');
        out
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn equal_grids_produce_no_edits() {
        let grid = vec![vec![json!(1), json!("a")], vec![json!(2), json!("b")]];
        let diff = diff_grid(&grid, &grid, &headers(&["round", "choice"])).unwrap();
        assert!(diff.edits.is_empty());
        assert!(diff.change_descriptions.is_empty());
    }

    #[test]
    fn changed_cell_yields_edit_and_description() {
        let old = vec![vec![json!(1), json!("a")]];
        let new = vec![vec![json!(1), json!("b")]];
        let diff = diff_grid(&old, &new, &headers(&["round", "choice"])).unwrap();

        assert_eq!(
            diff.edits,
            vec![GridEdit {
                row: 0,
                column: 1,
                display: CellDisplay::Text("b".to_string()),
            }]
        );
        assert_eq!(diff.change_descriptions, vec!["@P1: choice=b"]);
    }

    #[test]
    fn long_values_are_cut_to_seven_chars() {
        let old = vec![vec![json!("short")]];
        let new = vec![vec![json!("a very long answer")]];
        let diff = diff_grid(&old, &new, &headers(&["answer"])).unwrap();
        assert_eq!(diff.change_descriptions, vec!["@P1: answer=a very …"]);
    }

    #[test]
    fn null_renders_empty_in_descriptions() {
        let old = vec![vec![json!("x")]];
        let new = vec![vec![Value::Null]];
        let diff = diff_grid(&old, &new, &headers(&["answer"])).unwrap();
        assert_eq!(diff.edits[0].display, CellDisplay::Empty);
        assert_eq!(diff.change_descriptions, vec!["@P1: answer="]);
    }

    #[test]
    fn multiple_rows_describe_independently() {
        let old = vec![vec![json!(1)], vec![json!(2)], vec![json!(3)]];
        let new = vec![vec![json!(9)], vec![json!(2)], vec![json!(8)]];
        let diff = diff_grid(&old, &new, &headers(&["payoff"])).unwrap();
        assert_eq!(
            diff.change_descriptions,
            vec!["@P1: payoff=9", "@P3: payoff=8"]
        );
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let old = vec![vec![json!(1)]];
        let new = vec![vec![json!(1)], vec![json!(2)]];
        assert!(matches!(
            diff_grid(&old, &new, &headers(&["a"])),
            Err(GridShapeError::RowCount { old: 1, new: 2 })
        ));
    }

    #[test]
    fn truncation_only_appends_ellipsis_when_cut() {
        assert_eq!(truncate_ellipsis("exactly", 7), "exactly");
        assert_eq!(truncate_ellipsis("exactly!", 7), "exactly…");
        assert_eq!(truncate_ellipsis("", 7), "");
    }
}
