use crate::booking::ledger::BookingLedger;
use crate::booking::pricing::{LinearPricing, PricingPolicy};
use crate::booking::types::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Central booking and slot-accounting engine.
///
/// All mutations go through the ledger's write lock, so the
/// read-availability-then-insert check in [`create_booking`] cannot race
/// with a concurrent creation or cancellation and oversell a slot.
///
/// [`create_booking`]: BookingLifecycleEngine::create_booking
pub struct BookingLifecycleEngine {
    ledger: Arc<RwLock<BookingLedger>>,
    pricing: Arc<dyn PricingPolicy>,
    config: EngineConfig,
    event_handlers: Vec<Box<dyn BookingEventHandler + Send + Sync>>,
}

/// Configuration for the booking engine
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Pending bookings older than this are auto-cancelled by
    /// [`BookingLifecycleEngine::expire_stale_pending`] so unconfirmed
    /// reservations do not hold slots indefinitely
    pub pending_ttl_minutes: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pending_ttl_minutes: 15,
        }
    }
}

/// Events emitted as bookings move through their lifecycle
#[derive(Debug, Clone)]
pub enum BookingEvent {
    BookingCreated {
        booking_id: BookingId,
        station_id: StationId,
        user_id: UserId,
    },
    StatusChanged {
        booking_id: BookingId,
        old_status: BookingStatus,
        new_status: BookingStatus,
    },
    BookingRated {
        booking_id: BookingId,
        stars: u8,
    },
}

/// Handler for booking events
pub trait BookingEventHandler {
    fn handle_event(&self, event: &BookingEvent);
}

impl BookingLifecycleEngine {
    /// Create a new engine with the default linear pricing policy
    pub fn new(config: EngineConfig) -> Self {
        Self::with_pricing(config, Arc::new(LinearPricing::default()))
    }

    /// Create a new engine with a caller-supplied pricing collaborator
    pub fn with_pricing(config: EngineConfig, pricing: Arc<dyn PricingPolicy>) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(BookingLedger::new())),
            pricing,
            config,
            event_handlers: Vec::new(),
        }
    }

    /// Add event handler
    pub fn add_event_handler(&mut self, handler: Box<dyn BookingEventHandler + Send + Sync>) {
        self.event_handlers.push(handler);
    }

    /// Register a charging station
    pub async fn add_station(&self, station: Station) -> Result<StationId, BookingError> {
        let mut ledger = self.ledger.write().await;
        let station_id = ledger.add_station(station)?;

        info!("Registered station {}", station_id);
        Ok(station_id)
    }

    /// Create a booking against a station's slot inventory.
    ///
    /// Fails with [`BookingError::InvalidDuration`] for non-positive or
    /// non-finite durations and [`BookingError::StationFull`] when no
    /// derived slot is free. On success the cost is quoted by the pricing collaborator and
    /// the initial status follows the spec's [`CreationPolicy`].
    pub async fn create_booking(&self, spec: BookingSpec) -> Result<Booking, BookingError> {
        if !spec.duration_hours.is_finite() || spec.duration_hours <= 0.0 {
            return Err(BookingError::InvalidDuration(spec.duration_hours));
        }

        let booking = {
            let mut ledger = self.ledger.write().await;
            let station = ledger.station(spec.station_id)?.clone();

            if ledger.available_slots(spec.station_id)? == 0 {
                return Err(BookingError::StationFull);
            }

            let cost = self
                .pricing
                .quote(&station, spec.duration_hours, spec.charger_type);
            let booking = Booking::new(spec, cost);
            ledger.add_booking(booking.clone());
            booking
        };

        self.emit_event(BookingEvent::BookingCreated {
            booking_id: booking.id,
            station_id: booking.station_id,
            user_id: booking.user_id,
        });

        debug!(
            "Created booking {} at station {} ({:?})",
            booking.id, booking.station_id, booking.status
        );
        Ok(booking)
    }

    /// Apply one edge of the booking state machine
    pub async fn transition(
        &self,
        booking_id: BookingId,
        event: TransitionEvent,
    ) -> Result<BookingStatus, BookingError> {
        let (old_status, new_status) = {
            let mut ledger = self.ledger.write().await;
            let booking = ledger.booking_mut(booking_id)?;
            let old_status = booking.status;
            let new_status = old_status.apply(event)?;
            booking.update_status(new_status);
            (old_status, new_status)
        };

        self.emit_event(BookingEvent::StatusChanged {
            booking_id,
            old_status,
            new_status,
        });

        debug!(
            "Booking {} status: {:?} -> {:?}",
            booking_id, old_status, new_status
        );
        Ok(new_status)
    }

    /// Cancel a booking on behalf of an actor.
    ///
    /// Permitted only from Pending, Confirmed, or Active; the slot is freed
    /// immediately because availability is derived from non-terminal
    /// bookings. The billing consequence of cancelling mid-session is owned
    /// by the pricing collaborator, not the engine.
    pub async fn cancel(&self, booking_id: BookingId, actor: UserId) -> Result<(), BookingError> {
        self.transition(booking_id, TransitionEvent::Cancel).await?;

        info!("Booking {} cancelled by {}", booking_id, actor);
        Ok(())
    }

    /// Rate a completed booking with 1 to 5 stars
    pub async fn rate(&self, booking_id: BookingId, stars: u8) -> Result<(), BookingError> {
        if !(1..=5).contains(&stars) {
            return Err(BookingError::InvalidRating(stars));
        }

        {
            let mut ledger = self.ledger.write().await;
            let booking = ledger.booking_mut(booking_id)?;

            if booking.status != BookingStatus::Completed || booking.rating.is_some() {
                return Err(BookingError::NotRateable);
            }

            booking.rating = Some(stars);
            booking.updated_at = Utc::now();
        }

        self.emit_event(BookingEvent::BookingRated { booking_id, stars });

        debug!("Booking {} rated {} stars", booking_id, stars);
        Ok(())
    }

    /// Current availability view of a station
    pub async fn availability_for(
        &self,
        station_id: StationId,
    ) -> Result<AvailabilitySnapshot, BookingError> {
        let ledger = self.ledger.read().await;
        ledger.snapshot(station_id)
    }

    /// Promote bookings whose scheduled start has arrived to Active.
    ///
    /// Engine-owned time policy: both Pending and Confirmed bookings are
    /// promoted once their session is due. Returns the promoted booking IDs.
    pub async fn promote_due_bookings(&self, now: DateTime<Utc>) -> Vec<BookingId> {
        let promotions = {
            let mut ledger = self.ledger.write().await;
            let due: Vec<BookingId> = ledger
                .bookings
                .values()
                .filter(|booking| {
                    matches!(
                        booking.status,
                        BookingStatus::Pending | BookingStatus::Confirmed
                    ) && booking.scheduled_start() <= now
                })
                .map(|booking| booking.id)
                .collect();

            let mut promotions = Vec::new();
            for booking_id in due {
                if let Ok(booking) = ledger.booking_mut(booking_id) {
                    let old_status = booking.status;
                    booking.update_status(BookingStatus::Active);
                    promotions.push((booking_id, old_status));
                }
            }
            promotions
        };

        for &(booking_id, old_status) in &promotions {
            self.emit_event(BookingEvent::StatusChanged {
                booking_id,
                old_status,
                new_status: BookingStatus::Active,
            });
        }

        if !promotions.is_empty() {
            info!("Promoted {} due bookings to Active", promotions.len());
        }

        promotions.into_iter().map(|(id, _)| id).collect()
    }

    /// Auto-cancel Pending bookings older than the configured TTL so they
    /// stop holding slots. Returns the cancelled booking IDs.
    pub async fn expire_stale_pending(&self, now: DateTime<Utc>) -> Vec<BookingId> {
        let ttl = Duration::minutes(self.config.pending_ttl_minutes as i64);

        let expirations = {
            let mut ledger = self.ledger.write().await;
            let stale: Vec<BookingId> = ledger
                .bookings
                .values()
                .filter(|booking| {
                    booking.status == BookingStatus::Pending
                        && now.signed_duration_since(booking.created_at) >= ttl
                })
                .map(|booking| booking.id)
                .collect();

            let mut expirations = Vec::new();
            for booking_id in stale {
                if let Ok(booking) = ledger.booking_mut(booking_id) {
                    booking.update_status(BookingStatus::Cancelled);
                    expirations.push(booking_id);
                }
            }
            expirations
        };

        for &booking_id in &expirations {
            self.emit_event(BookingEvent::StatusChanged {
                booking_id,
                old_status: BookingStatus::Pending,
                new_status: BookingStatus::Cancelled,
            });
            warn!("Expired stale pending booking {}", booking_id);
        }

        expirations
    }

    /// Get a booking by ID
    pub async fn booking(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.booking(booking_id)?.clone())
    }

    /// All bookings owned by a user, newest first
    pub async fn bookings_for_user(&self, user_id: UserId) -> Vec<Booking> {
        let ledger = self.ledger.read().await;
        ledger.bookings_for_user(user_id)
    }

    /// All registered stations
    pub async fn stations(&self) -> Vec<Station> {
        let ledger = self.ledger.read().await;
        ledger.stations.values().cloned().collect()
    }

    /// Emit booking event to all handlers
    fn emit_event(&self, event: BookingEvent) {
        for handler in &self.event_handlers {
            handler.handle_event(&event);
        }
    }
}

/// Simple event handler that logs events
pub struct LoggingEventHandler;

impl BookingEventHandler for LoggingEventHandler {
    fn handle_event(&self, event: &BookingEvent) {
        match event {
            BookingEvent::BookingCreated {
                booking_id,
                station_id,
                user_id,
            } => {
                info!(
                    "Booking created: {} at station {} for user {}",
                    booking_id, station_id, user_id
                );
            }
            BookingEvent::StatusChanged {
                booking_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Booking {} status: {:?} -> {:?}",
                    booking_id, old_status, new_status
                );
            }
            BookingEvent::BookingRated { booking_id, stars } => {
                info!("Booking rated: {} ({} stars)", booking_id, stars);
            }
        }
    }
}
