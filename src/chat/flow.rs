//! Booking flow controller: the chat session state machine.
//!
//! One [`ChatSession`] owns the transcript, the bounded conversation log and
//! the (at most one) open calendar, and drives the sequence text input →
//! intent check → chat reply or calendar → slot pick → time pick → booking
//! submission → payment hand-off. All state lives on the session object and
//! is reached by reference; there are no module-level globals.

use std::sync::Arc;

use chrono::NaiveDate;
use url::Url;
use uuid::Uuid;

use crate::api::types::normalize_time;
use crate::api::{ApiError, BookingApi, PaymentRequest};
use crate::push::PushUpdate;

use super::calendar::{month_grid, time_list, MonthGrid, TimeList};
use super::conversation::{ConversationLog, ConversationTurn, Role};

/// Fixed phrase sent by the quick-suggestion affordance.
pub const QUICK_SUGGESTION: &str = "I want to book an appointment";

/// Service charged at checkout.
const PAYMENT_SERVICE: &str = "Haircut";
/// Customer name passed to the payment provider.
const PAYMENT_CUSTOMER: &str = "Customer";
/// Amount due, in the provider's minor unit.
const PAYMENT_AMOUNT: u32 = 200;

/// State of the one open calendar instance.
#[derive(Clone, Debug)]
pub struct CalendarState {
    /// Month offset relative to the real current month.
    pub month_offset: i32,
    /// Availability map fetched when the calendar was opened.
    pub slots: crate::api::SlotMap,
    /// The open time-list, if a day is selected. Transient: replaced by a
    /// different day, closed by month navigation.
    pub open_times: Option<TimeList>,
}

/// One entry of the message stream.
#[derive(Clone, Debug)]
enum TranscriptItem {
    /// A chat message, user or assistant.
    Message { role: Role, text: String },
    /// Transient indicator while a chat request is in flight.
    Loading,
    /// Marker where the open calendar renders.
    Calendar,
    /// Payment affordance for a reserved booking.
    PayPrompt { booking_id: String },
}

/// Rendered chat surface, a pure function of session state.
#[derive(Clone, Debug)]
pub struct ChatView {
    /// Message stream, oldest first.
    pub items: Vec<ChatItem>,
    /// Whether the quick-suggestion affordance is still shown.
    pub show_suggestions: bool,
}

/// One rendered item of the message stream.
#[derive(Clone, Debug)]
pub enum ChatItem {
    /// A chat message.
    Message {
        /// Message author.
        role: Role,
        /// Message text.
        text: String,
    },
    /// In-flight request indicator.
    Loading,
    /// The open calendar with its optional time-list.
    Calendar {
        /// Month grid for the current offset.
        grid: MonthGrid,
        /// Open time-list, if a day is selected.
        times: Option<TimeList>,
    },
    /// Payment button for a reserved booking.
    PayButton {
        /// The booking to pay for.
        booking_id: String,
    },
}

/// Chat session: conversation state plus the booking flow state machine.
pub struct ChatSession {
    id: Uuid,
    backend: Arc<dyn BookingApi>,
    log: ConversationLog,
    transcript: Vec<TranscriptItem>,
    calendar: Option<CalendarState>,
    suggestions_visible: bool,
}

impl ChatSession {
    /// Create a session against the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn BookingApi>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "chat session started");
        Self {
            id,
            backend,
            log: ConversationLog::new(),
            transcript: Vec::new(),
            calendar: None,
            suggestions_visible: true,
        }
    }

    /// Session identifier, for log correlation.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Submit free-text user input.
    ///
    /// Empty (after trim) input is ignored. The intent check is advisory:
    /// `"book"` opens the calendar and skips the chat call for this turn;
    /// any other label, or an intent failure, falls through to the chat
    /// path. Completes every await before returning, so one session never
    /// has two requests in flight.
    pub async fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        self.suggestions_visible = false;
        self.push_turn(ConversationTurn::user(text));

        match self.backend.detect_intent(text).await {
            Ok(reply) if reply.is_booking() => {
                self.open_calendar().await;
                return;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(session = %self.id, "intent check failed: {err}");
            }
        }

        self.request_reply(text).await;
    }

    /// Send the fixed quick-suggestion phrase as if the user typed it.
    pub async fn quick_ask(&mut self) {
        self.submit(QUICK_SUGGESTION).await;
    }

    /// Select a day in the open calendar.
    ///
    /// Opens the time-list for that day, replacing any previously open one.
    /// Days absent from the slot map are not clickable and are ignored.
    pub fn select_date(&mut self, date: &str) {
        if let Some(cal) = self.calendar.as_mut() {
            if let Some(times) = cal.slots.get(date) {
                cal.open_times = Some(time_list(date, times));
            }
        }
    }

    /// Navigate the open calendar one month back.
    pub fn calendar_prev(&mut self) {
        self.shift_calendar(-1);
    }

    /// Navigate the open calendar one month forward.
    pub fn calendar_next(&mut self) {
        self.shift_calendar(1);
    }

    /// Pick a time: composes the canonical booking utterance and submits it
    /// through the chat path, exactly like a typed message.
    pub async fn select_time(&mut self, date: &str, time: &str) {
        let time = normalize_time(time);
        let utterance = format!("I want {date} at {time}");
        self.push_turn(ConversationTurn::user(utterance.clone()));
        self.request_reply(&utterance).await;
    }

    /// Request a payment session for a reserved booking and hand off to
    /// checkout.
    ///
    /// Returns the checkout URL to navigate to on success. Failures (provider
    /// error payload or transport) are appended to the message stream; the
    /// booking keeps whatever status the backend already assigned.
    pub async fn start_payment(&mut self, booking_id: &str) -> Option<Url> {
        let request = PaymentRequest {
            service: PAYMENT_SERVICE.to_string(),
            customer_name: PAYMENT_CUSTOMER.to_string(),
            amount: PAYMENT_AMOUNT,
            booking_id: booking_id.to_string(),
        };
        match self.backend.create_payment_session(&request).await {
            Ok(session) => match self.backend.checkout_url(&session.order_id) {
                Ok(url) => Some(url),
                Err(err) => {
                    self.push_turn(ConversationTurn::assistant(format!("Payment error: {err}")));
                    None
                }
            },
            Err(ApiError::Rejected { detail, .. }) => {
                self.push_turn(ConversationTurn::assistant(format!("Payment error: {detail}")));
                None
            }
            Err(err) => {
                self.push_turn(ConversationTurn::assistant(format!("Payment error: {err}")));
                None
            }
        }
    }

    /// Observe a live-state update.
    ///
    /// The chat surface subscribes for slot/booking deltas but does not
    /// re-render from them yet; this is the integration point, currently
    /// informational only.
    pub fn observe_update(&self, update: &PushUpdate) {
        match update {
            PushUpdate::Slots(slots) => {
                tracing::debug!(session = %self.id, days = slots.len(), "slots updated");
            }
            PushUpdate::Bookings(bookings) => {
                tracing::debug!(session = %self.id, count = bookings.len(), "bookings updated");
            }
        }
    }

    /// The open calendar state, if any.
    #[must_use]
    pub const fn calendar(&self) -> Option<&CalendarState> {
        self.calendar.as_ref()
    }

    /// Render the chat surface. Pure in the session state and `today`.
    #[must_use]
    pub fn render(&self, today: NaiveDate) -> ChatView {
        let items = self
            .transcript
            .iter()
            .filter_map(|item| match item {
                TranscriptItem::Message { role, text } => Some(ChatItem::Message {
                    role: *role,
                    text: text.clone(),
                }),
                TranscriptItem::Loading => Some(ChatItem::Loading),
                TranscriptItem::Calendar => self.calendar.as_ref().map(|cal| ChatItem::Calendar {
                    grid: month_grid(&cal.slots, cal.month_offset, today),
                    times: cal.open_times.clone(),
                }),
                TranscriptItem::PayPrompt { booking_id } => Some(ChatItem::PayButton {
                    booking_id: booking_id.clone(),
                }),
            })
            .collect();
        ChatView {
            items,
            show_suggestions: self.suggestions_visible,
        }
    }

    /// Append a turn to both the message stream and the bounded log.
    fn push_turn(&mut self, turn: ConversationTurn) {
        self.transcript.push(TranscriptItem::Message {
            role: turn.role,
            text: turn.content.clone(),
        });
        self.log.append(turn);
    }

    /// Issue the chat request for this turn and apply the reply.
    ///
    /// The history snapshot already contains the turn being sent, matching
    /// the request shape the backend expects.
    async fn request_reply(&mut self, message: &str) {
        self.transcript.push(TranscriptItem::Loading);
        let history = self.log.snapshot();

        match self.backend.chat(message, &history).await {
            Ok(reply) => {
                self.clear_loading();
                let reserved = reply.reserved_booking().map(str::to_string);
                self.push_turn(ConversationTurn::assistant(reply.reply));
                if let Some(booking_id) = reserved {
                    self.transcript.push(TranscriptItem::PayPrompt { booking_id });
                }
            }
            Err(err) => {
                self.clear_loading();
                self.push_turn(ConversationTurn::assistant(format!("Error: {err}")));
            }
        }
    }

    /// Fetch availability and open (or replace) the calendar.
    async fn open_calendar(&mut self) {
        match self.backend.fetch_slots().await {
            Ok(slots) => {
                // At most one calendar instance; reopening moves it to the tail.
                self.transcript
                    .retain(|item| !matches!(item, TranscriptItem::Calendar));
                self.transcript.push(TranscriptItem::Calendar);
                self.calendar = Some(CalendarState {
                    month_offset: 0,
                    slots,
                    open_times: None,
                });
            }
            Err(err) => {
                self.push_turn(ConversationTurn::assistant(format!(
                    "Error loading slots: {err}"
                )));
            }
        }
    }

    fn shift_calendar(&mut self, delta: i32) {
        if let Some(cal) = self.calendar.as_mut() {
            cal.month_offset = cal.month_offset.saturating_add(delta);
            // Navigating away does not preserve the open time-list.
            cal.open_times = None;
        }
    }

    fn clear_loading(&mut self) {
        if let Some(pos) = self
            .transcript
            .iter()
            .rposition(|item| matches!(item, TranscriptItem::Loading))
        {
            self.transcript.remove(pos);
        }
    }
}
