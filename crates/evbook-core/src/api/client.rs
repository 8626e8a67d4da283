//! API client for the charging booking service.
//!
//! `ApiClient` is the only way the application talks to the backend. It
//! owns the request pipeline (augmenter + response guard) and exposes the
//! auth, station and booking operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::ApiError;
use crate::auth::{AuthApi, AuthError, AuthPayload, AuthRequest, Session, SessionStore};
use crate::guard::{GuardConfig, Navigator, RequestAugmenter, RequestContext, ResponseGuard};
use crate::models::{Booking, BookingRequest, Locale, Station};

// ============================================================================
// Constants
// ============================================================================

/// Backend used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub locale: Locale,
    pub guard: GuardConfig,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            locale: Locale::default(),
            guard: GuardConfig::default(),
        }
    }
}

/// API client for the booking service.
///
/// Share it behind an `Arc`; the response guard's termination state must be
/// common to every request the application makes.
pub struct ApiClient {
    client: Client,
    base_url: String,
    locale: Locale,
    session: Arc<SessionStore>,
    augmenter: RequestAugmenter,
    guard: ResponseGuard,
}

impl ApiClient {
    pub fn new(
        settings: ClientSettings,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            locale: settings.locale,
            augmenter: RequestAugmenter::new(session.clone()),
            guard: ResponseGuard::new(session.clone(), navigator, settings.guard),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// True while a session termination is in its cooldown window
    pub fn is_terminating(&self) -> bool {
        self.guard.is_terminating()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send one request through the pipeline. Non-success responses are
    /// returned as-is after the guard has seen them.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let mut ctx = RequestContext::new(path);

        let mut builder = self
            .client
            .request(method.clone(), self.url(path))
            .header(header::ACCEPT, "application/json")
            .header(header::ACCEPT_LANGUAGE, self.locale.code());
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let builder = self.augmenter.augment(builder, &mut ctx);

        debug!(%method, path, authenticated = ctx.credential().is_some(), "Sending request");
        match builder.send().await {
            Ok(response) => {
                self.guard.inspect(&ctx, Some(response.status()));
                Ok(response)
            }
            Err(e) => {
                self.guard.inspect(&ctx, None);
                Err(e.into())
            }
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Read the whole body. The response already arrived, so a failure here
    /// is a broken response rather than a network error.
    async fn read_body(response: Response, path: &str) -> Result<String, ApiError> {
        response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response from {}: {}", path, e)))
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ApiError> {
        let text = Self::read_body(response, path).await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        let response = Self::check_response(response).await?;
        Self::parse(response, path).await
    }

    // ===== Session =====

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.session.login(self, email, password).await
    }

    pub async fn signup(&self, email: &str, password: &str, name: &str) -> Result<Session, AuthError> {
        self.session.signup(self, email, password, name).await
    }

    pub fn logout(&self) {
        self.session.logout();
    }

    // ===== Stations & Bookings =====

    /// Fetch every charging station
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, ApiError> {
        self.get("/stations").await
    }

    /// Fetch the booking history of the signed-in user
    pub async fn fetch_bookings(&self) -> Result<Vec<Booking>, ApiError> {
        let bookings: Option<Vec<Booking>> = self.get("/bookings").await?;
        Ok(bookings.unwrap_or_default())
    }

    pub async fn create_booking(&self, request: &BookingRequest) -> Result<Booking, ApiError> {
        let booking: Booking = self.post("/bookings", request).await?;
        info!(
            booking_id = %booking.id,
            station_id = %booking.station_id,
            status = %booking.status,
            "Booking created"
        );
        Ok(booking)
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthPayload, AuthError> {
        let operation = request.operation();
        let response = self.send(Method::POST, operation.endpoint(), Some(request)).await?;

        let status = response.status();
        let body = Self::read_body(response, operation.endpoint()).await?;
        if !status.is_success() {
            debug!(%status, operation = %operation, "Authentication rejected");
            return Err(AuthError::rejected(operation, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse {} response: {}", operation, e)).into()
        })
    }
}
