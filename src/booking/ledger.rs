use crate::booking::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory store of stations and bookings with derived slot accounting.
///
/// Availability is never cached: it is recomputed on every read from the
/// set of bookings currently holding a slot, so stored and derived state
/// cannot diverge.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BookingLedger {
    pub stations: HashMap<StationId, Station>,
    pub bookings: HashMap<BookingId, Booking>,
}

impl BookingLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a station, rejecting duplicates and zero-capacity stations
    pub fn add_station(&mut self, station: Station) -> Result<StationId, BookingError> {
        if station.total_slots == 0 {
            return Err(BookingError::InvalidStation);
        }
        if self.stations.contains_key(&station.id) {
            return Err(BookingError::DuplicateStation(station.id));
        }

        let station_id = station.id;
        self.stations.insert(station_id, station);
        Ok(station_id)
    }

    /// Record a booking.
    ///
    /// The availability check belongs to the caller, who must hold the
    /// ledger lock across the check and this insert.
    pub fn add_booking(&mut self, booking: Booking) -> BookingId {
        let booking_id = booking.id;
        self.bookings.insert(booking_id, booking);
        booking_id
    }

    /// Get a station by ID
    pub fn station(&self, station_id: StationId) -> Result<&Station, BookingError> {
        self.stations
            .get(&station_id)
            .ok_or(BookingError::UnknownStation(station_id))
    }

    /// Get a booking by ID
    pub fn booking(&self, booking_id: BookingId) -> Result<&Booking, BookingError> {
        self.bookings
            .get(&booking_id)
            .ok_or(BookingError::UnknownBooking(booking_id))
    }

    /// Get a mutable booking by ID
    pub fn booking_mut(&mut self, booking_id: BookingId) -> Result<&mut Booking, BookingError> {
        self.bookings
            .get_mut(&booking_id)
            .ok_or(BookingError::UnknownBooking(booking_id))
    }

    /// Count the slots currently held at a station
    pub fn held_slots(&self, station_id: StationId) -> u32 {
        self.bookings
            .values()
            .filter(|booking| booking.station_id == station_id && booking.holds_slot())
            .count() as u32
    }

    /// Derived free capacity at a station, always within `[0, total_slots]`
    pub fn available_slots(&self, station_id: StationId) -> Result<u32, BookingError> {
        let station = self.station(station_id)?;
        Ok(station.total_slots.saturating_sub(self.held_slots(station_id)))
    }

    /// Availability view of a station for the presentation layer
    pub fn snapshot(&self, station_id: StationId) -> Result<AvailabilitySnapshot, BookingError> {
        let station = self.station(station_id)?;
        let available_slots = station.total_slots.saturating_sub(self.held_slots(station_id));

        Ok(AvailabilitySnapshot {
            station_id,
            available_slots,
            total_slots: station.total_slots,
            occupancy_band: OccupancyBand::classify(available_slots, station.total_slots),
        })
    }

    /// All bookings owned by a user, newest first
    pub fn bookings_for_user(&self, user_id: UserId) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .values()
            .filter(|booking| booking.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }

    /// All bookings placed against a station
    pub fn bookings_for_station(&self, station_id: StationId) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|booking| booking.station_id == station_id)
            .cloned()
            .collect()
    }
}
