//! Typed view-tree primitives shared by the pure renderers.
//!
//! Renderers emit these instead of mutating any display directly, so a
//! retained-mode UI (or the terminal surfaces shipped here) can sit behind
//! them without changing the render contract.

/// A fully rebuilt table: header columns plus data rows.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableView {
    /// Header labels.
    pub columns: Vec<&'static str>,
    /// Data rows, in snapshot order.
    pub rows: Vec<TableRow>,
}

/// One table row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TableRow {
    /// Cell texts, one per data column.
    pub cells: Vec<String>,
    /// Per-row action buttons.
    pub actions: Vec<ActionButton>,
}

/// A clickable row action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActionButton {
    /// Button label.
    pub label: &'static str,
    /// The mutation the button issues.
    pub action: RowAction,
}

/// Direct mutation commands issued from dashboard rows.
///
/// Each issues a backend request and no local state change; the visible
/// update arrives with the next push snapshot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RowAction {
    /// Delete one slot.
    DeleteSlot {
        /// Date key of the slot.
        date: String,
        /// Time of the slot.
        time: String,
    },
    /// Cancel a booking.
    CancelBooking {
        /// Booking identifier.
        id: String,
    },
    /// Mark a booking as paid.
    MarkPaid {
        /// Booking identifier.
        id: String,
    },
}
