//! Operator dashboard: snapshot reconciliation and direct actions.
//!
//! The dashboard never patches its tables in place. Each render fully
//! rebuilds a [`TableView`] from the latest authoritative snapshot, so
//! out-of-order or duplicate pushes self-correct on the next delivery, and
//! rendering the same snapshot twice yields an identical table. Row actions
//! issue backend mutations and change nothing locally; the visible update
//! arrives with the next push.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::types::normalize_time;
use crate::api::{ApiError, Booking, BookingApi, BookingStatus, SlotMap};
use crate::push::PushUpdate;
use crate::view::{ActionButton, RowAction, TableRow, TableView};

/// Rebuild the slots table from an availability snapshot.
#[must_use]
pub fn render_slots(slots: &SlotMap) -> TableView {
    let mut rows = Vec::new();
    for (date, times) in slots {
        for time in times {
            let time = normalize_time(time);
            rows.push(TableRow {
                cells: vec![date.clone(), time.to_string()],
                actions: vec![ActionButton {
                    label: "Delete",
                    action: RowAction::DeleteSlot {
                        date: date.clone(),
                        time: time.to_string(),
                    },
                }],
            });
        }
    }
    TableView {
        columns: vec!["Date", "Time", "Actions"],
        rows,
    }
}

/// Rebuild the bookings table from a booking snapshot.
///
/// Cancel is offered for any booking not already cancelled; mark-paid only
/// while it is pending.
#[must_use]
pub fn render_bookings(bookings: &[Booking]) -> TableView {
    let rows = bookings
        .iter()
        .map(|booking| {
            let mut actions = Vec::new();
            if booking.status != BookingStatus::Cancelled {
                actions.push(ActionButton {
                    label: "Cancel",
                    action: RowAction::CancelBooking {
                        id: booking.id.clone(),
                    },
                });
            }
            if booking.status == BookingStatus::Pending {
                actions.push(ActionButton {
                    label: "Mark Paid",
                    action: RowAction::MarkPaid {
                        id: booking.id.clone(),
                    },
                });
            }
            TableRow {
                cells: vec![
                    booking.customer_name.clone(),
                    booking.service.clone(),
                    booking.date.clone(),
                    normalize_time(&booking.time).to_string(),
                    booking.status.label().to_string(),
                ],
                actions,
            }
        })
        .collect();
    TableView {
        columns: vec!["Customer", "Service", "Date", "Time", "Status", "Actions"],
        rows,
    }
}

/// Blocking alert text for a failed direct action, naming the operation.
#[must_use]
pub fn alert_message(operation: &str, err: &ApiError) -> String {
    format!("Could not {operation}: {err}")
}

/// Dashboard session: latest snapshots plus the action side of the surface.
pub struct DashboardSession {
    backend: Arc<dyn BookingApi>,
    slots: SlotMap,
    bookings: Vec<Booking>,
    last_updated: Option<DateTime<Utc>>,
}

impl DashboardSession {
    /// Create a session against the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn BookingApi>) -> Self {
        Self {
            backend,
            slots: SlotMap::new(),
            bookings: Vec::new(),
            last_updated: None,
        }
    }

    /// Fetch both snapshots once at startup.
    ///
    /// A failure here is logged only; the push channel delivers the next
    /// authoritative state either way.
    pub async fn initial_load(&mut self) {
        match self.load_snapshots().await {
            Ok(()) => self.touch(),
            Err(err) => tracing::error!("failed to load initial data: {err}"),
        }
    }

    /// Apply one typed push update, replacing the corresponding snapshot.
    pub fn apply_update(&mut self, update: PushUpdate) {
        match update {
            PushUpdate::Slots(slots) => self.slots = slots,
            PushUpdate::Bookings(bookings) => self.bookings = bookings,
        }
        self.touch();
    }

    /// Current slots table.
    #[must_use]
    pub fn slots_view(&self) -> TableView {
        render_slots(&self.slots)
    }

    /// Current bookings table.
    #[must_use]
    pub fn bookings_view(&self) -> TableView {
        render_bookings(&self.bookings)
    }

    /// When the displayed state last changed, if ever.
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Create a slot from the form inputs.
    ///
    /// The time input is truncated to `HH:MM` before sending.
    ///
    /// # Errors
    /// Returns the backend rejection; the caller surfaces it as a blocking
    /// alert.
    pub async fn create_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
        let time = if time.len() >= 5 {
            time.get(..5).unwrap_or(time)
        } else {
            time
        };
        self.backend.create_slot(date, time).await
    }

    /// Delete a slot. No local state change; the table updates on the next
    /// push.
    ///
    /// # Errors
    /// Returns the backend rejection; the caller surfaces it as a blocking
    /// alert.
    pub async fn delete_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
        self.backend.delete_slot(date, time).await
    }

    /// Cancel a booking. No local state change.
    ///
    /// # Errors
    /// Returns the backend rejection; the caller surfaces it as a blocking
    /// alert.
    pub async fn cancel_booking(&self, id: &str) -> Result<(), ApiError> {
        self.backend.cancel_booking(id).await
    }

    /// Mark a booking paid. No local state change.
    ///
    /// # Errors
    /// Returns the backend rejection; the caller surfaces it as a blocking
    /// alert.
    pub async fn mark_paid(&self, id: &str) -> Result<(), ApiError> {
        self.backend.mark_paid(id).await
    }

    async fn load_snapshots(&mut self) -> Result<(), ApiError> {
        self.slots = self.backend.fetch_slots().await?;
        self.bookings = self.backend.fetch_bookings().await?;
        Ok(())
    }

    fn touch(&mut self) {
        self.last_updated = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::api::{ChatReply, IntentReply, PaymentRequest, PaymentSession};
    use crate::chat::ConversationTurn;

    use super::*;

    /// Backend fake that records mutation calls and serves fixed snapshots.
    #[derive(Default)]
    struct RecordingBackend {
        slots: SlotMap,
        bookings: Vec<Booking>,
        fail_actions: bool,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            if self.fail_actions {
                Err(ApiError::Rejected {
                    operation: "action",
                    detail: "nope".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl BookingApi for RecordingBackend {
        async fn detect_intent(&self, _message: &str) -> Result<IntentReply, ApiError> {
            Ok(IntentReply {
                intent: "other".to_string(),
                detail: None,
            })
        }

        async fn chat(
            &self,
            _message: &str,
            _history: &[ConversationTurn],
        ) -> Result<ChatReply, ApiError> {
            Ok(ChatReply {
                reply: String::new(),
                status: None,
                booking_id: None,
            })
        }

        async fn fetch_slots(&self) -> Result<SlotMap, ApiError> {
            Ok(self.slots.clone())
        }

        async fn fetch_bookings(&self) -> Result<Vec<Booking>, ApiError> {
            Ok(self.bookings.clone())
        }

        async fn create_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
            self.record(format!("create {date} {time}"))
        }

        async fn delete_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
            self.record(format!("delete {date} {time}"))
        }

        async fn cancel_booking(&self, id: &str) -> Result<(), ApiError> {
            self.record(format!("cancel {id}"))
        }

        async fn mark_paid(&self, id: &str) -> Result<(), ApiError> {
            self.record(format!("paid {id}"))
        }

        async fn create_payment_session(
            &self,
            _request: &PaymentRequest,
        ) -> Result<PaymentSession, ApiError> {
            Ok(PaymentSession {
                order_id: String::new(),
            })
        }

        fn checkout_url(&self, order_id: &str) -> Result<url::Url, ApiError> {
            Ok(url::Url::parse(&format!(
                "http://backend.test/checkout?order_id={order_id}"
            ))?)
        }
    }

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.to_string(),
            customer_name: "Ana".to_string(),
            service: "Haircut".to_string(),
            date: "2024-05-10".to_string(),
            time: "09:30:00".to_string(),
            status,
        }
    }

    fn sample_slots() -> SlotMap {
        let mut slots = SlotMap::new();
        slots.insert(
            "2024-05-10".to_string(),
            vec!["09:00".to_string(), "09:30:00".to_string()],
        );
        slots.insert("2024-05-11".to_string(), vec!["10:00".to_string()]);
        slots
    }

    #[test]
    fn test_slot_render_is_idempotent() {
        let slots = sample_slots();
        let first = render_slots(&slots);
        let second = render_slots(&slots);
        assert_eq!(first, second);
        assert_eq!(first.rows.len(), 3);
    }

    #[test]
    fn test_slot_render_normalizes_times() {
        let table = render_slots(&sample_slots());
        assert_eq!(table.rows[1].cells, vec!["2024-05-10", "09:30"]);
        assert_eq!(
            table.rows[1].actions[0].action,
            RowAction::DeleteSlot {
                date: "2024-05-10".to_string(),
                time: "09:30".to_string(),
            }
        );
    }

    #[test]
    fn test_booking_actions_follow_status() {
        let bookings = vec![
            booking("b-1", BookingStatus::Pending),
            booking("b-2", BookingStatus::Paid),
            booking("b-3", BookingStatus::Cancelled),
        ];
        let table = render_bookings(&bookings);
        assert_eq!(table, render_bookings(&bookings));

        let labels: Vec<Vec<&str>> = table
            .rows
            .iter()
            .map(|row| row.actions.iter().map(|a| a.label).collect())
            .collect();
        assert_eq!(labels[0], vec!["Cancel", "Mark Paid"]);
        assert_eq!(labels[1], vec!["Cancel"]);
        assert!(labels[2].is_empty());

        assert_eq!(table.rows[0].cells[3], "09:30");
        assert_eq!(table.rows[0].cells[4], "pending");
    }

    #[tokio::test]
    async fn test_actions_do_not_touch_local_state() {
        let backend = Arc::new(RecordingBackend {
            slots: sample_slots(),
            bookings: vec![booking("b-1", BookingStatus::Pending)],
            ..RecordingBackend::default()
        });
        let mut session = DashboardSession::new(backend.clone());
        session.initial_load().await;

        let before = session.slots_view();
        session.delete_slot("2024-05-10", "09:00").await.unwrap();
        session.cancel_booking("b-1").await.unwrap();
        assert_eq!(session.slots_view(), before);
        assert_eq!(
            backend.calls(),
            vec!["delete 2024-05-10 09:00", "cancel b-1"]
        );
    }

    #[tokio::test]
    async fn test_create_slot_truncates_time_input() {
        let backend = Arc::new(RecordingBackend::default());
        let session = DashboardSession::new(backend.clone());

        session.create_slot("2024-05-12", "09:30:00").await.unwrap();
        assert_eq!(backend.calls(), vec!["create 2024-05-12 09:30"]);
    }

    #[tokio::test]
    async fn test_push_update_replaces_snapshot() {
        let backend = Arc::new(RecordingBackend::default());
        let mut session = DashboardSession::new(backend);
        assert!(session.last_updated().is_none());
        assert!(session.slots_view().rows.is_empty());

        session.apply_update(PushUpdate::Slots(sample_slots()));
        assert_eq!(session.slots_view().rows.len(), 3);
        assert!(session.last_updated().is_some());

        // A duplicate delivery re-renders to the identical table.
        let before = session.slots_view();
        session.apply_update(PushUpdate::Slots(sample_slots()));
        assert_eq!(session.slots_view(), before);
    }

    #[tokio::test]
    async fn test_failed_action_reports_operation() {
        let backend = Arc::new(RecordingBackend {
            fail_actions: true,
            ..RecordingBackend::default()
        });
        let session = DashboardSession::new(backend);

        let err = session.mark_paid("b-1").await.unwrap_err();
        assert_eq!(
            alert_message("mark booking paid", &err),
            "Could not mark booking paid: action rejected: nope"
        );
    }
}
