//! Conversational booking surface.
//!
//! This module covers the visitor-facing side of the widget:
//! - Bounded conversation log sent with each chat request
//! - Pure calendar view builder
//! - Booking flow controller ([`ChatSession`])

pub mod calendar;
pub mod conversation;
pub mod flow;

pub use calendar::{DayCell, MonthGrid, TimeList};
pub use conversation::{ConversationLog, ConversationTurn, Role};
pub use flow::{CalendarState, ChatItem, ChatSession, ChatView, QUICK_SUGGESTION};
