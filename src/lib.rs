//! # Chargebook
//!
//! The domain core of an EV-charging-station booking app: the booking
//! lifecycle state machine with derived station-slot availability, and the
//! authenticated-session lifecycle with a persisted backing store.
//!
//! ## Architecture Overview
//!
//! Two components cooperate without depending on each other:
//!
//! - **[`session`]**: login, signup, logout, and restoration of a persisted
//!   session, behind pluggable identity-provider and key-value-store traits
//! - **[`booking`]**: booking records and station slot accounting, with
//!   availability derived on read from the set of slot-holding bookings
//!
//! A client establishes identity through the [`SessionManager`], then
//! reserves, inspects, cancels, or rates bookings through the
//! [`BookingLifecycleEngine`], tagging each booking with the owning user ID.
//! The presentation layer consumes [`Booking`], [`Station`],
//! [`AvailabilitySnapshot`], and [`Session`] as read-only view models.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chargebook::{BookingLifecycleEngine, EngineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chargebook::BookingError> {
//!     let engine = BookingLifecycleEngine::new(EngineConfig::default());
//!     let stations = engine.stations().await;
//!     println!("{} stations registered", stations.len());
//!     Ok(())
//! }
//! ```

/// Session lifecycle management and persistence contracts.
///
/// Owns the single authenticated identity per client instance, restoring it
/// from the key-value store at startup and clearing it on logout.
pub mod session;

/// Booking lifecycle and station slot accounting.
///
/// Provides the booking status state machine, derived availability with
/// occupancy bands, pricing hooks, and the time policies for promotion and
/// pending-booking expiry.
pub mod booking;

// Re-export main session types
pub use session::{
    AuthError, IdentityProvider, Session, SessionError, SessionManager, SessionManagerConfig,
    SessionStore, SignupProfile, StorageError, User,
};

// Re-export main booking types
pub use booking::{
    AvailabilitySnapshot, Booking, BookingError, BookingLifecycleEngine, BookingSpec,
    BookingStatus, ChargerType, CreationPolicy, EngineConfig, OccupancyBand, PricingPolicy,
    Station, TransitionEvent,
};
