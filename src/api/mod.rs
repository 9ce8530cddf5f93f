//! Client for the booking backend API.
//!
//! Every network collaborator of the core goes through the [`BookingApi`]
//! trait: intent classification, chat, availability, direct dashboard
//! mutations and payment-session creation. [`HttpBackend`] is the production
//! implementation; sessions hold an `Arc<dyn BookingApi>` so tests can drive
//! them against an in-process fake.

pub mod config;
pub mod error;
pub mod types;

pub use config::BackendConfig;
pub use error::ApiError;
pub use types::{
    Booking, BookingStatus, ChatReply, IntentReply, PaymentRequest, PaymentSession, SlotMap,
};

use async_trait::async_trait;
use url::Url;

use crate::chat::conversation::ConversationTurn;

use types::{ChatRequest, ErrorBody, IntentRequest, SlotRequest};

/// Backend operations consumed by the chat and dashboard sessions.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Classify a user message; `"book"` short-circuits the turn toward the
    /// calendar. Advisory: callers degrade to the chat path on error.
    async fn detect_intent(&self, message: &str) -> Result<IntentReply, ApiError>;

    /// Send a chat turn with the conversation history snapshot.
    async fn chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<ChatReply, ApiError>;

    /// Fetch the current availability map.
    async fn fetch_slots(&self) -> Result<SlotMap, ApiError>;

    /// Fetch the current booking list.
    async fn fetch_bookings(&self) -> Result<Vec<Booking>, ApiError>;

    /// Create a slot.
    async fn create_slot(&self, date: &str, time: &str) -> Result<(), ApiError>;

    /// Delete a slot.
    async fn delete_slot(&self, date: &str, time: &str) -> Result<(), ApiError>;

    /// Cancel a booking.
    async fn cancel_booking(&self, id: &str) -> Result<(), ApiError>;

    /// Mark a booking as paid.
    async fn mark_paid(&self, id: &str) -> Result<(), ApiError>;

    /// Create a payment session for a confirmed booking.
    async fn create_payment_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, ApiError>;

    /// Checkout URL carrying the provider order identifier.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be built from the configured base.
    fn checkout_url(&self, order_id: &str) -> Result<Url, ApiError>;
}

/// HTTP implementation of [`BookingApi`] over one configured reqwest client.
pub struct HttpBackend {
    config: BackendConfig,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Create a backend client with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ApiError> {
        Self::new(BackendConfig::default())
    }

    /// The underlying HTTP client, shared with the push transport.
    #[must_use]
    pub const fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The backend configuration.
    #[must_use]
    pub const fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Map a non-success response to [`ApiError::Rejected`], preferring the
    /// backend's `detail` field over the bare status line.
    async fn expect_ok(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| status.to_string());
        Err(ApiError::Rejected { operation, detail })
    }
}

#[async_trait]
impl BookingApi for HttpBackend {
    async fn detect_intent(&self, message: &str) -> Result<IntentReply, ApiError> {
        let url = self.config.endpoint("intent")?;
        let response = self
            .client
            .post(url)
            .json(&IntentRequest { message })
            .send()
            .await?;
        let reply = Self::expect_ok(response, "intent check")
            .await?
            .json::<IntentReply>()
            .await?;
        tracing::debug!(intent = %reply.intent, "intent classified");
        Ok(reply)
    }

    async fn chat(
        &self,
        message: &str,
        history: &[ConversationTurn],
    ) -> Result<ChatReply, ApiError> {
        let url = self.config.endpoint("chat")?;
        let response = self
            .client
            .post(url)
            .json(&ChatRequest { message, history })
            .send()
            .await?;
        let reply = Self::expect_ok(response, "chat")
            .await?
            .json::<ChatReply>()
            .await?;
        Ok(reply)
    }

    async fn fetch_slots(&self) -> Result<SlotMap, ApiError> {
        let url = self.config.endpoint("api/slots")?;
        let response = self.client.get(url).send().await?;
        let slots = Self::expect_ok(response, "slot fetch")
            .await?
            .json::<SlotMap>()
            .await?;
        Ok(slots)
    }

    async fn fetch_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let url = self.config.endpoint("api/bookings")?;
        let response = self.client.get(url).send().await?;
        let bookings = Self::expect_ok(response, "booking fetch")
            .await?
            .json::<Vec<Booking>>()
            .await?;
        Ok(bookings)
    }

    async fn create_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
        let url = self.config.endpoint("api/slots")?;
        let response = self
            .client
            .post(url)
            .json(&SlotRequest { date, time })
            .send()
            .await?;
        Self::expect_ok(response, "slot creation").await?;
        Ok(())
    }

    async fn delete_slot(&self, date: &str, time: &str) -> Result<(), ApiError> {
        let url = self.config.endpoint("api/slots")?;
        let response = self
            .client
            .delete(url)
            .query(&[("date", date), ("time", time)])
            .send()
            .await?;
        Self::expect_ok(response, "slot deletion").await?;
        Ok(())
    }

    async fn cancel_booking(&self, id: &str) -> Result<(), ApiError> {
        let url = self.config.endpoint(&format!("api/bookings/{id}/cancel"))?;
        let response = self.client.post(url).send().await?;
        Self::expect_ok(response, "booking cancellation").await?;
        Ok(())
    }

    async fn mark_paid(&self, id: &str) -> Result<(), ApiError> {
        let url = self.config.endpoint(&format!("api/bookings/{id}/paid"))?;
        let response = self.client.post(url).send().await?;
        Self::expect_ok(response, "mark paid").await?;
        Ok(())
    }

    async fn create_payment_session(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentSession, ApiError> {
        let url = self.config.endpoint("pay")?;
        let response = self.client.post(url).json(request).send().await?;
        // The provider path reports business errors as a payload without an
        // order id, sometimes under a success status. Surface that payload
        // verbatim rather than mapping it through the status line.
        let payload = response.json::<serde_json::Value>().await?;
        match serde_json::from_value::<PaymentSession>(payload.clone()) {
            Ok(session) => Ok(session),
            Err(_) => Err(ApiError::Rejected {
                operation: "payment session",
                detail: payload.to_string(),
            }),
        }
    }

    fn checkout_url(&self, order_id: &str) -> Result<Url, ApiError> {
        let mut url = self.config.endpoint("checkout")?;
        url.query_pairs_mut().append_pair("order_id", order_id);
        Ok(url)
    }
}
