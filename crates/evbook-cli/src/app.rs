//! Command handlers for the evbook CLI.
//!
//! Each dashboard command first navigates to the route the web dashboard
//! would show, so the response guard knows whether a session expiry should
//! send the user back to sign-in.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use evbook_core::{
    ApiClient, ApiError, Booking, BookingRequest, Config, Locale, Navigator, Router, SessionStore, Station,
};
use tracing::{debug, warn};

use crate::format::{format_hours, format_price, format_time, truncate_string};
use crate::Command;

/// Extra time allowed for the sign-in redirect beyond its configured delay
const REDIRECT_GRACE_MS: u64 = 250;

const HOME_ROUTE: &str = "/";
const DASHBOARD_ROUTE: &str = "/dashboard";
const BOOKINGS_ROUTE: &str = "/dashboard/bookings";
const SIGNUP_ROUTE: &str = "/signup";

/// Width of the station name column in listings
const NAME_COLUMN_WIDTH: usize = 24;

const SESSION_EXPIRED: &str = "Your session has expired. Run `evbook login` to sign in again.";
const NOT_SIGNED_IN: &str = "Not signed in. Run `evbook login` first.";

pub struct App {
    config: Config,
    router: Arc<Router>,
    api: ApiClient,
}

impl App {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let config = Config::load()?;
        let lang = std::env::var("LANG").ok();
        let locale = config.resolve_locale(lang.as_deref());

        let session = Arc::new(SessionStore::restore(config.open_storage()?));
        debug!(locale = %locale, storage = ?config.storage, "App initialized");
        Self::with_session(config, session, api_url, locale)
    }

    fn with_session(
        config: Config,
        session: Arc<SessionStore>,
        api_url: Option<String>,
        locale: Locale,
    ) -> Result<Self> {
        let router = Arc::new(Router::new(HOME_ROUTE));
        let api = ApiClient::new(config.client_settings(api_url, locale), session, router.clone())?;
        Ok(Self { config, router, api })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login { email } => self.login(&email).await,
            Command::Signup { email, name } => self.signup(&email, &name).await,
            Command::Logout => {
                self.logout();
                Ok(())
            }
            Command::Whoami => self.whoami(),
            Command::Stations => self.stations().await,
            Command::Bookings => self.bookings().await,
            Command::Book { station_id, hours } => self.book(&station_id, hours).await,
            Command::Locale { locale } => self.set_locale(locale),
        }
    }

    // ===== Session =====

    async fn login(&self, email: &str) -> Result<()> {
        self.router.navigate(&self.config.guard.sign_in_route);
        let password = rpassword::prompt_password("Password: ")?;
        if email.is_empty() || password.is_empty() {
            bail!("Email and password required");
        }

        let session = self.api.login(email, &password).await?;
        self.router.navigate(DASHBOARD_ROUTE);
        if let Some(user) = session.user() {
            println!("Signed in as {} <{}>", user.name, user.email);
        }
        Ok(())
    }

    async fn signup(&self, email: &str, name: &str) -> Result<()> {
        self.router.navigate(SIGNUP_ROUTE);
        let password = rpassword::prompt_password("Password: ")?;
        let confirm = rpassword::prompt_password("Confirm password: ")?;
        if password != confirm {
            bail!("Passwords do not match");
        }
        if email.is_empty() || name.is_empty() || password.is_empty() {
            bail!("Email, name and password required");
        }

        let session = self.api.signup(email, &password, name).await?;
        self.router.navigate(DASHBOARD_ROUTE);
        if let Some(user) = session.user() {
            println!("Welcome, {}! Your account is ready.", user.name);
        }
        Ok(())
    }

    fn logout(&self) {
        let was_signed_in = self.api.session().is_authenticated();
        self.api.logout();
        if was_signed_in {
            println!("Signed out.");
        } else {
            println!("Already signed out.");
        }
    }

    fn whoami(&self) -> Result<()> {
        let session = self.api.session().snapshot();
        match session.user() {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                println!("User ID: {}", user.id);
                Ok(())
            }
            None => bail!(NOT_SIGNED_IN),
        }
    }

    // ===== Dashboard =====

    /// Open a dashboard view. Without a session the view bounces to sign-in.
    fn enter_dashboard(&self, route: &str) -> Result<()> {
        self.router.navigate(route);
        if !self.api.session().is_authenticated() {
            self.router.redirect(&self.config.guard.sign_in_route);
            bail!(NOT_SIGNED_IN);
        }
        Ok(())
    }

    /// Wait for the guard's sign-in redirect, if one is coming
    async fn landed_on_sign_in(&self) -> bool {
        let sign_in = self.config.guard.sign_in_route.clone();
        let wait = self.config.guard.redirect_delay() + Duration::from_millis(REDIRECT_GRACE_MS);
        let mut changes = self.router.changes();

        let _ = tokio::time::timeout(wait, changes.wait_for(|route| *route == sign_in)).await;
        self.router.current_route() == sign_in
    }

    /// Turn an expired-session failure into a sign-in hint
    async fn guarded<T>(&self, result: Result<T, ApiError>) -> Result<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if err.is_unauthorized() && self.landed_on_sign_in().await {
            bail!(SESSION_EXPIRED);
        }
        Err(err.into())
    }

    async fn stations(&self) -> Result<()> {
        self.enter_dashboard(DASHBOARD_ROUTE)?;
        let stations = self.guarded(self.api.fetch_stations().await).await?;

        if stations.is_empty() {
            println!("No charging stations found.");
            return Ok(());
        }

        println!(
            "{:<10} {:<width$} {:>8} {:>10}  {:<12} {}",
            "ID",
            "NAME",
            "POWER",
            "PRICE",
            "STATUS",
            "LOCATION",
            width = NAME_COLUMN_WIDTH
        );
        for station in &stations {
            println!(
                "{:<10} {:<width$} {:>8} {:>10}  {:<12} {}",
                station.id,
                truncate_string(&station.name, NAME_COLUMN_WIDTH),
                station.display_power(),
                station.display_price(),
                station.status.to_string(),
                station.location,
                width = NAME_COLUMN_WIDTH
            );
        }
        Ok(())
    }

    async fn bookings(&self) -> Result<()> {
        self.enter_dashboard(BOOKINGS_ROUTE)?;

        let (bookings, stations) = futures::join!(self.api.fetch_bookings(), self.api.fetch_stations());
        let bookings = self.guarded(bookings).await?;

        // Station names are a nicety; the history is still useful without them
        let names: HashMap<String, String> = match stations {
            Ok(stations) => stations.into_iter().map(|s| (s.id, s.name)).collect(),
            Err(e) => {
                warn!(error = %e, "Failed to fetch stations for booking history");
                HashMap::new()
            }
        };

        if bookings.is_empty() {
            println!("No bookings yet.");
            return Ok(());
        }

        for booking in &bookings {
            self.print_booking(booking, &names);
        }
        Ok(())
    }

    fn print_booking(&self, booking: &Booking, names: &HashMap<String, String>) {
        let station = match &booking.station {
            Some(summary) => summary.name.as_str(),
            None => names
                .get(&booking.station_id)
                .map(String::as_str)
                .unwrap_or_else(|| booking.station_name()),
        };
        println!(
            "{:<12} {:<width$} {:<20} {:>6} {:>10}",
            booking.status.label(self.api.locale()),
            truncate_string(station, NAME_COLUMN_WIDTH),
            format_time(booking.start_time.as_ref(), "-"),
            format_hours(booking.duration_hours()),
            format_price(booking.total_price),
            width = NAME_COLUMN_WIDTH
        );
    }

    async fn book(&self, station_id: &str, hours: u32) -> Result<()> {
        self.enter_dashboard(DASHBOARD_ROUTE)?;
        let stations = self.guarded(self.api.fetch_stations().await).await?;

        let Some(station) = stations.iter().find(|s| s.id == station_id) else {
            bail!("No station with ID {}", station_id);
        };
        let request = BookingRequest::for_station(station, hours)?;
        println!(
            "Booking {} for {} (estimated {})...",
            station.name,
            format_hours(f64::from(hours)),
            format_price(station.estimated_price(hours))
        );

        let booking = self.guarded(self.api.create_booking(&request).await).await?;
        self.print_confirmation(station, &booking);
        Ok(())
    }

    fn print_confirmation(&self, station: &Station, booking: &Booking) {
        println!(
            "Booking {} at {}: {}",
            booking.id,
            station.name,
            booking.status.label(self.api.locale())
        );
    }

    // ===== Preferences =====

    fn set_locale(&mut self, locale: Option<Locale>) -> Result<()> {
        match locale {
            Some(locale) => {
                self.config.locale = Some(locale);
                self.config.save()?;
                println!("Locale set to {}", locale);
            }
            None => {
                let source = if self.config.locale.is_some() { "configured" } else { "detected" };
                println!("{} ({})", self.api.locale(), source);
                for available in Locale::ALL {
                    println!("  {}", available);
                }
            }
        }
        Ok(())
    }
}
