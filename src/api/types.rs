//! Wire types exchanged with the booking backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chat::conversation::ConversationTurn;

/// Availability map: ISO date key (`YYYY-MM-DD`) to the ordered time strings
/// bookable on that day.
///
/// Supplied wholesale by the backend on every calendar open and every
/// dashboard snapshot; never mutated locally.
pub type SlotMap = BTreeMap<String, Vec<String>>;

/// Normalize a backend time value for user-facing text.
///
/// Values carrying seconds (`HH:MM:SS`, length 8) are truncated to `HH:MM`;
/// anything else passes through unchanged. Applied at every boundary where a
/// time crosses from backend format into display or a composed utterance.
#[must_use]
pub fn normalize_time(raw: &str) -> &str {
    if raw.len() == 8 {
        raw.get(..5).unwrap_or(raw)
    } else {
        raw
    }
}

/// Request body for the intent-classification endpoint.
#[derive(Debug, Serialize)]
pub struct IntentRequest<'a> {
    /// The raw user message to classify.
    pub message: &'a str,
}

/// Reply from the intent-classification endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct IntentReply {
    /// Intent label; `"book"` routes the turn to the calendar.
    pub intent: String,
    /// Optional diagnostic detail when the classifier itself failed.
    #[serde(default)]
    pub detail: Option<String>,
}

impl IntentReply {
    /// Whether this reply routes the turn to calendar display.
    #[must_use]
    pub fn is_booking(&self) -> bool {
        self.intent == "book"
    }
}

/// Request body for the chat endpoint.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    /// The message for this turn.
    pub message: &'a str,
    /// Conversation history snapshot, oldest first.
    pub history: &'a [ConversationTurn],
}

/// Reply from the chat endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatReply {
    /// Assistant text to display.
    pub reply: String,
    /// Booking outcome marker, e.g. `"reserved"` or `"unavailable"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Identifier of the booking created by this turn, if any.
    #[serde(default)]
    pub booking_id: Option<String>,
}

impl ChatReply {
    /// The booking id to attach a payment affordance to, present only when
    /// the backend reports the slot as reserved.
    #[must_use]
    pub fn reserved_booking(&self) -> Option<&str> {
        if self.status.as_deref() == Some("reserved") {
            self.booking_id.as_deref()
        } else {
            None
        }
    }
}

/// Lifecycle status of a booking, assigned server-side only.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created, awaiting payment.
    Pending,
    /// Slot held for the customer.
    Reserved,
    /// Payment completed.
    Paid,
    /// Cancelled by an operator.
    Cancelled,
}

impl BookingStatus {
    /// Lowercase label as shown in dashboard cells.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reserved => "reserved",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A customer reservation against a slot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Booking {
    /// Backend-assigned identifier.
    pub id: String,
    /// Customer display name.
    pub customer_name: String,
    /// Booked service.
    pub service: String,
    /// Date key (`YYYY-MM-DD`).
    pub date: String,
    /// Time of day as supplied by the backend.
    pub time: String,
    /// Current lifecycle status.
    pub status: BookingStatus,
}

/// Request body for slot creation.
#[derive(Debug, Serialize)]
pub struct SlotRequest<'a> {
    /// Date key (`YYYY-MM-DD`).
    pub date: &'a str,
    /// Time of day (`HH:MM`).
    pub time: &'a str,
}

/// Request body for payment-session creation.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRequest {
    /// Service being paid for.
    pub service: String,
    /// Customer display name.
    pub customer_name: String,
    /// Amount due, in the provider's minor unit.
    pub amount: u32,
    /// Booking the payment settles.
    pub booking_id: String,
}

/// Successful payment-session reply.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentSession {
    /// Provider order identifier carried to the checkout page.
    pub order_id: String,
}

/// Error body shape used by backend rejections.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Human-readable rejection reason.
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_time_strips_seconds() {
        assert_eq!(normalize_time("14:30:00"), "14:30");
        assert_eq!(normalize_time("14:30"), "14:30");
        assert_eq!(normalize_time("9:30"), "9:30");
    }

    #[test]
    fn test_reserved_booking_requires_status() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"reply":"Booked!","status":"reserved","booking_id":"b-1"}"#,
        )
        .unwrap();
        assert_eq!(reply.reserved_booking(), Some("b-1"));

        let declined: ChatReply =
            serde_json::from_str(r#"{"reply":"Sorry, taken.","status":"unavailable"}"#).unwrap();
        assert_eq!(declined.reserved_booking(), None);

        let plain: ChatReply = serde_json::from_str(r#"{"reply":"Hi!"}"#).unwrap();
        assert_eq!(plain.reserved_booking(), None);
    }

    #[test]
    fn test_booking_status_wire_format() {
        let booking: Booking = serde_json::from_str(
            r#"{"id":"b-1","customer_name":"Ana","service":"Haircut",
                "date":"2024-05-10","time":"09:30:00","status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.status.label(), "pending");
    }
}
