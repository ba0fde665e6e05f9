use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for bookings
pub type BookingId = Uuid;

/// Unique identifier for charging stations
pub type StationId = Uuid;

/// Unique identifier for the user who owns a booking
pub type UserId = Uuid;

/// Charger hardware class selected for a booking
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChargerType {
    Fast,
    Slow,
}

/// A charging location with a fixed amount of concurrent capacity.
///
/// `total_slots` describes how many sessions can run at once;
/// `fast_charger_count`/`slow_charger_count` describe the hardware mix and
/// are not bounded by `total_slots`. The number of free slots is never
/// stored on the station itself, it is derived from the bookings currently
/// holding a slot (see [`crate::booking::ledger::BookingLedger`]).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub address: String,
    pub total_slots: u32,
    pub fast_charger_count: u32,
    pub slow_charger_count: u32,
    pub price_per_session: f64,
    /// Distance from the requesting user, filled in by the caller per query
    pub distance_km: Option<f64>,
}

/// Booking status state machine
///
/// ```text
/// Pending   --confirm-->  Confirmed
/// Pending   --cancel-->   Cancelled
/// Confirmed --start-->    Active
/// Confirmed --cancel-->   Cancelled
/// Active    --complete--> Completed
/// Active    --cancel-->   Cancelled
/// ```
///
/// Completed and Cancelled are terminal and absorbing.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

/// Caller-driven edges of the booking state machine
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    Confirm,
    Start,
    Complete,
    Cancel,
}

/// Initial status policy for newly created bookings.
///
/// `Instant` is the path where payment/authorization succeeded up front;
/// `Deferred` leaves the booking Pending until an explicit confirm.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationPolicy {
    Instant,
    Deferred,
}

/// Specification for creating a new booking
#[derive(Clone, Debug)]
pub struct BookingSpec {
    pub station_id: StationId,
    pub user_id: UserId,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_hours: f64,
    pub charger_type: ChargerType,
    pub policy: CreationPolicy,
}

/// A reservation of one slot at a station for one charging session.
///
/// Bookings are never physically deleted; terminal records are retained
/// for the user's history view.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub station_id: StationId,
    pub user_id: UserId,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub duration_hours: f64,
    pub charger_type: ChargerType,
    pub cost: f64,
    pub status: BookingStatus,
    /// Present only once the booking is Completed and the user has rated it
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Presentation-facing classification of slot scarcity at a station
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OccupancyBand {
    /// At least half the slots are free
    Available,
    /// Between a quarter and half the slots are free
    Limited,
    /// Less than a quarter of the slots are free
    Busy,
}

/// Point-in-time availability view of a station
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct AvailabilitySnapshot {
    pub station_id: StationId,
    pub available_slots: u32,
    pub total_slots: u32,
    pub occupancy_band: OccupancyBand,
}

/// Booking and slot-accounting errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("station has no free slots")]
    StationFull,
    #[error("booking duration must be positive, got {0}")]
    InvalidDuration(f64),
    #[error("booking is already in terminal status {0:?}")]
    AlreadyTerminal(BookingStatus),
    #[error("no transition from {from:?} on {event:?}")]
    InvalidTransition {
        from: BookingStatus,
        event: TransitionEvent,
    },
    #[error("only completed, unrated bookings can be rated")]
    NotRateable,
    #[error("rating must be between 1 and 5 stars, got {0}")]
    InvalidRating(u8),
    #[error("unknown booking {0}")]
    UnknownBooking(BookingId),
    #[error("unknown station {0}")]
    UnknownStation(StationId),
    #[error("station {0} is already registered")]
    DuplicateStation(StationId),
    #[error("station must expose at least one slot")]
    InvalidStation,
}

impl BookingStatus {
    /// Check if no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Check if a booking in this status occupies a slot at its station
    pub fn holds_slot(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Active
        )
    }

    /// Apply one edge of the state machine, returning the resulting status.
    ///
    /// Exits from terminal states fail with [`BookingError::AlreadyTerminal`];
    /// any other edge not in the table fails with
    /// [`BookingError::InvalidTransition`].
    pub fn apply(self, event: TransitionEvent) -> Result<BookingStatus, BookingError> {
        if self.is_terminal() {
            return Err(BookingError::AlreadyTerminal(self));
        }

        match (self, event) {
            (BookingStatus::Pending, TransitionEvent::Confirm) => Ok(BookingStatus::Confirmed),
            (BookingStatus::Confirmed, TransitionEvent::Start) => Ok(BookingStatus::Active),
            (BookingStatus::Active, TransitionEvent::Complete) => Ok(BookingStatus::Completed),
            (
                BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Active,
                TransitionEvent::Cancel,
            ) => Ok(BookingStatus::Cancelled),
            (from, event) => Err(BookingError::InvalidTransition { from, event }),
        }
    }
}

impl CreationPolicy {
    /// Status assigned to a booking at creation time
    pub fn initial_status(&self) -> BookingStatus {
        match self {
            CreationPolicy::Instant => BookingStatus::Confirmed,
            CreationPolicy::Deferred => BookingStatus::Pending,
        }
    }
}

impl Booking {
    /// Create a new booking from a spec with the quoted cost
    pub fn new(spec: BookingSpec, cost: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            station_id: spec.station_id,
            user_id: spec.user_id,
            scheduled_date: spec.scheduled_date,
            scheduled_time: spec.scheduled_time,
            duration_hours: spec.duration_hours,
            charger_type: spec.charger_type,
            cost,
            status: spec.policy.initial_status(),
            rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Scheduled start of the charging session
    pub fn scheduled_start(&self) -> DateTime<Utc> {
        self.scheduled_date.and_time(self.scheduled_time).and_utc()
    }

    /// Check if booking is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if this booking currently occupies a slot
    pub fn holds_slot(&self) -> bool {
        self.status.holds_slot()
    }

    /// Update booking status and timestamp
    pub fn update_status(&mut self, status: BookingStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

impl OccupancyBand {
    /// Classify free capacity into the three presentation tiers
    pub fn classify(available_slots: u32, total_slots: u32) -> Self {
        let free_percentage = if total_slots == 0 {
            0.0
        } else {
            available_slots as f64 / total_slots as f64 * 100.0
        };

        if free_percentage >= 50.0 {
            OccupancyBand::Available
        } else if free_percentage >= 25.0 {
            OccupancyBand::Limited
        } else {
            OccupancyBand::Busy
        }
    }
}
