//! services/api/src/adapters/sms.rs
//!
//! This module contains the adapter for the Twilio SMS gateway. It
//! implements the `SmsService` port from the `core` crate.

use async_trait::async_trait;
use caretaker_core::ports::{PortError, PortResult, SmsService};
use tracing::info;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SmsService` port using the Twilio
/// Messages API.
#[derive(Clone)]
pub struct TwilioSmsAdapter {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
}

impl TwilioSmsAdapter {
    /// Creates a new `TwilioSmsAdapter`.
    pub fn new(
        client: reqwest::Client,
        account_sid: String,
        auth_token: String,
        from_number: String,
        to_number: String,
    ) -> Self {
        Self {
            client,
            account_sid,
            auth_token,
            from_number,
            to_number,
        }
    }
}

//=========================================================================================
// `SmsService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SmsService for TwilioSmsAdapter {
    /// Dispatches a text message to the configured caretaker number.
    async fn send(&self, message: &str) -> PortResult<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", self.to_number.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", message),
            ])
            .send()
            .await
            .map_err(|e| PortError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Upstream(e.to_string()))?;

        info!(status = %response.status(), "SMS dispatched");
        Ok(())
    }
}
