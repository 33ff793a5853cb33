use std::time::Instant;

use labdeck_core::cell::CellDisplay;
use labdeck_sync::{Edit, SyncReport};

/// How long a highlight takes to fade back to the background, in ms.
pub const HIGHLIGHT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct ViewCell {
    pub display: CellDisplay,
    pub flashed_at: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct ViewRow {
    pub cells: Vec<ViewCell>,
    pub flashed_at: Option<Instant>,
}

impl ViewRow {
    /// Most recent flash affecting this cell: its own, or the whole-row
    /// flash from its insertion.
    pub fn cell_flash(&self, column: usize) -> Option<Instant> {
        let cell = self.cells.get(column).and_then(|cell| cell.flashed_at);
        match (cell, self.flashed_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (some, None) => some,
            (None, some) => some,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusLine {
    pub text: String,
    pub shown_at: Instant,
}

/// Display-side state of the monitor table. Consumes the synchronizer's
/// edits; holds everything the frame renderer needs and nothing the
/// synchronizer needs.
#[derive(Debug, Default)]
pub struct TableView {
    columns: Vec<String>,
    rows: Vec<ViewRow>,
    visited_count: usize,
    status: Option<StatusLine>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column order, fixed by the first inserted row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ViewRow] {
        &self.rows
    }

    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    pub fn set_visited_count(&mut self, count: usize) {
        self.visited_count = count;
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, text: String, now: Instant) {
        self.status = Some(StatusLine {
            text,
            shown_at: now,
        });
    }

    pub fn apply_report(&mut self, report: &SyncReport, now: Instant) {
        for edit in &report.edits {
            self.apply_edit(edit, now);
        }
    }

    fn apply_edit(&mut self, edit: &Edit, now: Instant) {
        match edit {
            Edit::InsertRow { index, cells } => {
                if self.columns.is_empty() {
                    self.columns = cells.iter().map(|cell| cell.field.clone()).collect();
                }
                let row = ViewRow {
                    cells: cells
                        .iter()
                        .map(|cell| ViewCell {
                            display: cell.display.clone(),
                            flashed_at: None,
                        })
                        .collect(),
                    flashed_at: Some(now),
                };
                let index = (*index).min(self.rows.len());
                self.rows.insert(index, row);
            }
            Edit::UpdateCell {
                row, column, display, ..
            } => {
                if let Some(cell) = self
                    .rows
                    .get_mut(*row)
                    .and_then(|row| row.cells.get_mut(*column))
                {
                    cell.display = display.clone();
                    cell.flashed_at = Some(now);
                }
            }
        }
    }
}

/// Progress of a fade that started at `flashed_at`: 0.0 fresh, approaching
/// 1.0, `None` once fully faded (or never flashed).
pub fn fade_fraction(
    flashed_at: Option<Instant>,
    now: Instant,
    duration_ms: u64,
) -> Option<f32> {
    let start = flashed_at?;
    let elapsed = now.saturating_duration_since(start).as_millis() as u64;
    if elapsed >= duration_ms {
        return None;
    }
    Some(elapsed as f32 / duration_ms as f32)
}
