//! Payment service HTTP client
//!
//! Translates account and payment operations into calls against the campus
//! payment API, authorized by the token held in the session store. A 401 on
//! the PIN and history endpoints triggers a bounded re-authentication and a
//! retry of the identical request.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::config::ClientConfig;
use crate::domain::result::{Error, Result};
use crate::domain::{
    AuthOutcome, DeviceInfo, Operation, PaymentRequest, Pin, Session, SessionKey,
    TransactionHistory,
};
use crate::ports::{DeviceInfoProvider, IdentityProvider, SessionStore};
use crate::services::{LogEvent, LoggingService};

use super::device::HostDevice;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HasPinResponse {
    has_pin: bool,
}

#[derive(Deserialize)]
struct GetPinResponse {
    pin: Pin,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VendorResponse {
    #[serde(default)]
    shop_name: Option<String>,
}

/// Client for the campus payment service
#[derive(Clone)]
pub struct PaymentClient {
    http: Client,
    config: ClientConfig,
    store: Arc<dyn SessionStore>,
    device: Arc<dyn DeviceInfoProvider>,
    identity: Option<Arc<dyn IdentityProvider>>,
    events: Option<Arc<LoggingService>>,
}

impl PaymentClient {
    /// Create a client for the configured service
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            store,
            device: Arc::new(HostDevice::new()),
            identity: None,
            events: None,
        })
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceInfoProvider>) -> Self {
        self.device = device;
        self
    }

    /// Source of fresh identity tokens for re-authentication after a 401
    pub fn with_identity_provider(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_event_log(mut self, events: Arc<LoggingService>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The stored session
    pub async fn session(&self) -> Session {
        self.store.load().await
    }

    /// Exchange an identity token for a session.
    ///
    /// A 200 with a token stores a registered session. A 200 without one, or
    /// a 403, stores a guest session. Any other status leaves the store as it
    /// was.
    pub async fn authenticate(&self, identity_token: &str) -> Result<AuthOutcome> {
        let op = Operation::Authenticate;
        let body = json!({ "token": identity_token });
        let response = self.send(op, None, Some(&body)).await?;

        let outcome = match response.status().as_u16() {
            200 => {
                let login: LoginResponse = self.decode(op, response).await?;
                match login.access_token.filter(|t| !t.is_empty()) {
                    Some(token) => AuthOutcome::Registered(token),
                    None => AuthOutcome::Guest,
                }
            }
            403 => AuthOutcome::Guest,
            status => return Err(self.unexpected(op, status)),
        };

        let session = match &outcome {
            AuthOutcome::Registered(token) => Session::registered(token.clone()),
            AuthOutcome::Guest => Session::Guest,
        };
        self.store.save(&session).await?;

        log::info!(
            "[PaymentClient] Authenticated as {}",
            session.user_type().map(|u| u.as_str()).unwrap_or("unknown")
        );
        self.record(LogEvent::new("authenticated").with_operation(op));

        Ok(outcome)
    }

    /// Whether the student has set a PIN
    pub async fn has_pin(&self) -> Result<bool> {
        let op = Operation::HasPin;
        let response = self.execute(op, None, None).await?;
        self.expect_status(op, &response, 200)?;
        let body: HasPinResponse = self.decode(op, response).await?;
        Ok(body.has_pin)
    }

    pub async fn get_pin(&self) -> Result<Pin> {
        let op = Operation::GetPin;
        let response = self.execute(op, None, None).await?;
        self.expect_status(op, &response, 200)?;
        let body: GetPinResponse = self.decode(op, response).await?;
        Ok(body.pin)
    }

    /// Set a new PIN. Format and policy are checked by the service.
    pub async fn set_pin(&self, pin: &Pin) -> Result<bool> {
        let op = Operation::SetPin;
        let body = json!({ "pin": pin.expose() });
        let response = self.execute(op, None, Some(&body)).await?;
        self.expect_status(op, &response, 201)?;
        Ok(true)
    }

    /// Pay a vendor. Returns the service's confirmation text.
    pub async fn make_payment(&self, vendor_id: &str, amount: Decimal, pin: &Pin) -> Result<String> {
        let op = Operation::MakePayment;
        let request = PaymentRequest {
            vendor_id: vendor_id.to_string(),
            amount,
            pin: pin.clone(),
            device_id: self.device.identity().platform_id,
        };
        let body = serde_json::to_value(&request)?;
        let response = self.execute(op, None, Some(&body)).await?;

        match response.status().as_u16() {
            201 => self.text(op, response).await,
            403 => {
                let reason = self.text(op, response).await?;
                log::warn!("[PaymentClient] Payment denied by service");
                self.record(
                    LogEvent::new("payment_denied")
                        .with_operation(op)
                        .with_status(403),
                );
                Err(Error::PaymentDenied { reason })
            }
            status => Err(self.unexpected(op, status)),
        }
    }

    pub async fn block_account(&self) -> Result<String> {
        let op = Operation::BlockAccount;
        let response = self.execute(op, None, None).await?;
        self.expect_status(op, &response, 200)?;
        self.text(op, response).await
    }

    /// Balance and transaction history, exactly as the service sent them
    pub async fn list_transactions(&self) -> Result<TransactionHistory> {
        let op = Operation::ListTransactions;
        let response = self.execute(op, None, None).await?;
        self.expect_status(op, &response, 200)?;
        self.decode(op, response).await
    }

    /// Ask the service to send a PIN reset code
    pub async fn request_otp(&self) -> Result<String> {
        let op = Operation::RequestOtp;
        let response = self.execute(op, None, None).await?;
        self.expect_status(op, &response, 200)?;
        self.text(op, response).await
    }

    pub async fn verify_otp_and_reset_pin(&self, otp: &str, new_pin: &Pin) -> Result<bool> {
        let op = Operation::VerifyOtp;
        let body = json!({ "otp": otp, "newPin": new_pin.expose() });
        let response = self.execute(op, None, Some(&body)).await?;
        self.expect_status(op, &response, 200)?;
        Ok(true)
    }

    /// Look up a vendor's shop name. Unknown vendors are `None`, not errors.
    pub async fn validate_vendor(&self, vendor_id: &str) -> Result<Option<String>> {
        let op = Operation::ValidateVendor;
        let response = self
            .execute(op, Some(("vendorId", vendor_id)), None)
            .await?;

        match response.status().as_u16() {
            200 => {
                let body: VendorResponse = self.decode(op, response).await?;
                Ok(body.shop_name)
            }
            status => {
                log::debug!("[PaymentClient] Vendor lookup returned {}", status);
                Ok(None)
            }
        }
    }

    /// Snapshot of this device. Never fails.
    pub fn device_info(&self) -> DeviceInfo {
        self.device.snapshot()
    }

    /// Send a request, re-authenticating and retrying after a 401 when the
    /// operation allows it. At most `1 + max_auth_retries` requests are made.
    async fn execute(
        &self,
        op: Operation,
        query: Option<(&str, &str)>,
        body: Option<&JsonValue>,
    ) -> Result<Response> {
        let mut attempts: u32 = 0;
        loop {
            let response = self.send(op, query, body).await?;
            attempts += 1;

            if response.status().as_u16() != 401 || !op.retries_on_unauthorized() {
                return Ok(response);
            }

            if attempts > self.config.max_auth_retries {
                log::warn!(
                    "[PaymentClient] {} still unauthorized after {} attempt(s)",
                    op,
                    attempts
                );
                let err = Error::SessionExpired {
                    operation: op,
                    attempts,
                };
                self.record(
                    LogEvent::new("session_expired")
                        .with_operation(op)
                        .with_status(401)
                        .with_error(err.to_string()),
                );
                return Err(err);
            }

            log::info!(
                "[PaymentClient] Session stale during {}, re-authenticating (attempt {}/{})",
                op,
                attempts,
                self.config.max_auth_retries
            );
            self.refresh_session().await?;
        }
    }

    /// One recovery step after a 401
    async fn refresh_session(&self) -> Result<()> {
        let Some(identity) = &self.identity else {
            log::debug!("[PaymentClient] No identity provider, re-reading stored session");
            return Ok(());
        };

        match identity.identity_token().await? {
            Some(token) => {
                self.authenticate(&token).await?;
            }
            None => {
                log::debug!("[PaymentClient] Identity provider has no token");
            }
        }
        Ok(())
    }

    /// Issue a single request with the currently stored token
    async fn send(
        &self,
        op: Operation,
        query: Option<(&str, &str)>,
        body: Option<&JsonValue>,
    ) -> Result<Response> {
        let url = format!("{}{}", self.config.base_url, op.path());
        let method = match op.method() {
            "GET" => Method::GET,
            _ => Method::POST,
        };

        let mut request = self
            .http
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some((key, value)) = query {
            request = request.query(&[(key, value)]);
        }

        if op.requires_auth() {
            if let Some(token) = self.store.get(SessionKey::AccessToken).await {
                request = request.bearer_auth(token);
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        log::debug!("[PaymentClient] {} {}", op.method(), op.path());

        match request.send().await {
            Ok(response) => {
                log::debug!(
                    "[PaymentClient] {} answered {}",
                    op,
                    response.status().as_u16()
                );
                Ok(response)
            }
            Err(source) => {
                // The request URL carries query parameters such as the vendor id
                let err = Error::Transport {
                    operation: op,
                    source: source.without_url(),
                };
                self.record(
                    LogEvent::new("request_failed")
                        .with_operation(op)
                        .with_error(err.to_string())
                        .with_error_details(failure_kind(&err)),
                );
                Err(err)
            }
        }
    }

    fn expect_status(&self, op: Operation, response: &Response, expected: u16) -> Result<()> {
        let status = response.status().as_u16();
        if status == expected {
            Ok(())
        } else {
            Err(self.unexpected(op, status))
        }
    }

    fn unexpected(&self, op: Operation, status: u16) -> Error {
        let err = Error::UnexpectedStatus {
            operation: op,
            status,
        };
        log::warn!("[PaymentClient] {}", err);
        self.record(
            LogEvent::new("unexpected_status")
                .with_operation(op)
                .with_status(status)
                .with_error(err.to_string()),
        );
        err
    }

    async fn text(&self, op: Operation, response: Response) -> Result<String> {
        response.text().await.map_err(|source| Error::Transport {
            operation: op,
            source: source.without_url(),
        })
    }

    async fn decode<T: DeserializeOwned>(&self, op: Operation, response: Response) -> Result<T> {
        let body = self.text(op, response).await?;
        serde_json::from_str(&body).map_err(|e| {
            let err = Error::Decode {
                operation: op,
                message: e.to_string(),
            };
            self.record(
                LogEvent::new("decode_failed")
                    .with_operation(op)
                    .with_error(err.to_string()),
            );
            err
        })
    }

    /// Write to the event log. Failures here never fail the operation.
    fn record(&self, event: LogEvent) {
        if let Some(events) = &self.events {
            if let Err(e) = events.log(event) {
                log::debug!("[PaymentClient] Failed to write event log: {}", e);
            }
        }
    }
}

/// Coarse transport failure class for the event log
fn failure_kind(err: &Error) -> &'static str {
    match err {
        Error::Transport { source, .. } if source.is_timeout() => "timeout",
        Error::Transport { source, .. } if source.is_connect() => "connect",
        _ => "request",
    }
}
