use labdeck_core::cell::{comparison_value, display_value, CellDisplay};
use labdeck_core::{ParticipantRow, MONITOR_NOTE_FIELD};
use serde_json::Value;
use tracing::debug;

pub mod activity;
pub mod datagrid;

/// One rendering instruction for the display adapter. Every edit also marks
/// its target for the highlight effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Insert a full row at `index`; append when `index` equals the current
    /// row count. Highlights the whole row.
    InsertRow { index: usize, cells: Vec<CellSpec> },
    /// Replace one cell's display value. Highlights that cell.
    UpdateCell {
        row: usize,
        column: usize,
        field: String,
        display: CellDisplay,
    },
}

/// Field name plus display value for one cell of a freshly built row.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSpec {
    pub field: String,
    pub display: CellDisplay,
}

/// Everything one synchronization pass decided, in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub edits: Vec<Edit>,
    /// Identities that were newly inserted or had at least one changed
    /// field, in snapshot iteration order.
    pub updated_ids: Vec<i64>,
    /// At least one row was inserted; the adapter refreshes the visited
    /// count when set.
    pub inserted_any: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOutcome {
    pub is_new: bool,
    pub changed: bool,
}

/// Last comparison value applied to a cell. The diffing memory.
#[derive(Debug, Clone, PartialEq)]
struct CellState {
    field: String,
    comparison: String,
}

/// Incremental synchronizer for one sorted, keyed participant table.
///
/// Holds the visited-identity ordering and the per-cell comparison memory;
/// emits [`Edit`]s instead of touching any display directly. The ordering is
/// mutated only by insertion and stays sorted ascending, in lock-step with
/// the emitted row sequence.
#[derive(Debug, Default)]
pub struct TableSync {
    visited: Vec<i64>,
    rows: Vec<Vec<CellState>>,
}

impl TableSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity keys in current row order.
    pub fn visited(&self) -> &[i64] {
        &self.visited
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Reconcile a full snapshot. Records are expected in ascending identity
    /// order; identities absent from the snapshot are left in place (there
    /// is no deletion path).
    pub fn apply_snapshot(&mut self, records: &[ParticipantRow]) -> SyncReport {
        let mut report = SyncReport::default();
        for record in records {
            let outcome = self.reconcile_row(record, &mut report.edits);
            if outcome.is_new {
                report.inserted_any = true;
            }
            if outcome.changed {
                report.updated_ids.push(record.id_in_session);
            }
        }
        debug_assert!(self.visited.windows(2).all(|pair| pair[0] < pair[1]));
        debug_assert_eq!(self.visited.len(), self.rows.len());
        report
    }

    /// Update only the note field for each listed identity, with the same
    /// per-cell diff as a snapshot pass. Never inserts rows and never alters
    /// the visited ordering; an identity with no row is skipped, each
    /// independently of the rest.
    pub fn apply_notes(&mut self, ids: &[i64], note: &str) -> SyncReport {
        let mut report = SyncReport::default();
        let field = MONITOR_NOTE_FIELD.to_string();
        let value = Value::String(note.to_string());
        for &id in ids {
            let Some(index) = self.row_index(id) else {
                debug!(id, "note update for unknown identity, skipping");
                continue;
            };
            let changed =
                self.update_row_cells(index, std::iter::once((&field, &value)), &mut report.edits);
            if changed {
                report.updated_ids.push(id);
            }
        }
        report
    }

    fn reconcile_row(&mut self, record: &ParticipantRow, edits: &mut Vec<Edit>) -> RowOutcome {
        let id = record.id_in_session;
        match self.row_index(id) {
            None => {
                // Count of identities strictly below the new one; inserting
                // there keeps the ordering ascending.
                let index = self.visited.iter().filter(|&&known| known < id).count();
                let mut state = Vec::with_capacity(record.fields.len());
                let mut cells = Vec::with_capacity(record.fields.len());
                for (field, value) in &record.fields {
                    state.push(CellState {
                        field: field.clone(),
                        comparison: comparison_value(value),
                    });
                    cells.push(CellSpec {
                        field: field.clone(),
                        display: display_value(value, field),
                    });
                }
                self.visited.insert(index, id);
                self.rows.insert(index, state);
                edits.push(Edit::InsertRow { index, cells });
                debug!(id, index, "inserted participant row");
                RowOutcome {
                    is_new: true,
                    changed: true,
                }
            }
            Some(index) => {
                let changed = self.update_row_cells(index, record.fields.iter(), edits);
                RowOutcome {
                    is_new: false,
                    changed,
                }
            }
        }
    }

    // Linear scan; participant counts stay small. Replace with an
    // identity-to-index map if sessions ever grow past that.
    fn row_index(&self, id: i64) -> Option<usize> {
        self.visited.iter().position(|&known| known == id)
    }

    /// Diff the named fields against the row's comparison memory, emitting
    /// an update for each changed cell. Fields naming no existing cell are
    /// skipped; fields not named are left untouched.
    fn update_row_cells<'a>(
        &mut self,
        row: usize,
        fields: impl Iterator<Item = (&'a String, &'a Value)>,
        edits: &mut Vec<Edit>,
    ) -> bool {
        let mut changed = false;
        for (field, value) in fields {
            let Some(column) = self.rows[row]
                .iter()
                .position(|cell| &cell.field == field)
            else {
                continue;
            };
            let comparison = comparison_value(value);
            let cell = &mut self.rows[row][column];
            if cell.comparison != comparison {
                cell.comparison = comparison;
                edits.push(Edit::UpdateCell {
                    row,
                    column,
                    field: field.clone(),
                    display: display_value(value, field),
                });
                changed = true;
            }
        }
        changed
    }
}
