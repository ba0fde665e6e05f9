#[cfg(test)]
mod tests {
    use crate::booking::engine::*;
    use crate::booking::ledger::*;
    use crate::booking::pricing::*;
    use crate::booking::types::*;
    use chrono::{Duration, NaiveDate, NaiveTime, Utc};
    use uuid::Uuid;

    // Helper to create a station with the given capacity
    fn create_test_station(total_slots: u32) -> Station {
        Station {
            id: Uuid::new_v4(),
            name: "Downtown Supercharge".to_string(),
            address: "12 Battery Road".to_string(),
            total_slots,
            fast_charger_count: 2,
            slow_charger_count: 4,
            price_per_session: 10.0,
            distance_km: None,
        }
    }

    fn create_test_spec(station_id: StationId, user_id: UserId, policy: CreationPolicy) -> BookingSpec {
        BookingSpec {
            station_id,
            user_id,
            scheduled_date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            duration_hours: 2.0,
            charger_type: ChargerType::Fast,
            policy,
        }
    }

    #[test]
    fn test_status_machine_happy_edges() {
        assert_eq!(
            BookingStatus::Pending.apply(TransitionEvent::Confirm).unwrap(),
            BookingStatus::Confirmed
        );
        assert_eq!(
            BookingStatus::Confirmed.apply(TransitionEvent::Start).unwrap(),
            BookingStatus::Active
        );
        assert_eq!(
            BookingStatus::Active.apply(TransitionEvent::Complete).unwrap(),
            BookingStatus::Completed
        );
    }

    #[test]
    fn test_status_machine_cancel_from_all_non_terminal() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
        ] {
            assert_eq!(
                status.apply(TransitionEvent::Cancel).unwrap(),
                BookingStatus::Cancelled
            );
        }
    }

    #[test]
    fn test_status_machine_rejects_invalid_edges() {
        assert_eq!(
            BookingStatus::Pending.apply(TransitionEvent::Start),
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                event: TransitionEvent::Start,
            })
        );
        assert_eq!(
            BookingStatus::Pending.apply(TransitionEvent::Complete),
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Pending,
                event: TransitionEvent::Complete,
            })
        );
        assert_eq!(
            BookingStatus::Confirmed.apply(TransitionEvent::Confirm),
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Confirmed,
                event: TransitionEvent::Confirm,
            })
        );
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            for event in [
                TransitionEvent::Confirm,
                TransitionEvent::Start,
                TransitionEvent::Complete,
                TransitionEvent::Cancel,
            ] {
                assert_eq!(
                    terminal.apply(event),
                    Err(BookingError::AlreadyTerminal(terminal))
                );
            }
        }
    }

    #[test]
    fn test_occupancy_band_classification() {
        assert_eq!(OccupancyBand::classify(4, 4), OccupancyBand::Available);
        assert_eq!(OccupancyBand::classify(2, 4), OccupancyBand::Available);
        assert_eq!(OccupancyBand::classify(1, 4), OccupancyBand::Limited);
        assert_eq!(OccupancyBand::classify(0, 4), OccupancyBand::Busy);
        assert_eq!(OccupancyBand::classify(1, 10), OccupancyBand::Busy);
    }

    #[test]
    fn test_linear_pricing() {
        let station = create_test_station(4);
        let pricing = LinearPricing::default();

        assert_eq!(pricing.quote(&station, 2.0, ChargerType::Slow), 20.0);
        assert_eq!(pricing.quote(&station, 2.0, ChargerType::Fast), 30.0);
        // Deterministic for the same inputs
        assert_eq!(
            pricing.quote(&station, 2.0, ChargerType::Fast),
            pricing.quote(&station, 2.0, ChargerType::Fast)
        );
    }

    #[test]
    fn test_ledger_rejects_zero_slot_station() {
        let mut ledger = BookingLedger::new();
        let station = create_test_station(0);

        assert_eq!(ledger.add_station(station), Err(BookingError::InvalidStation));
    }

    #[test]
    fn test_ledger_rejects_duplicate_station() {
        let mut ledger = BookingLedger::new();
        let station = create_test_station(4);
        let station_id = station.id;

        ledger.add_station(station.clone()).unwrap();
        assert_eq!(
            ledger.add_station(station),
            Err(BookingError::DuplicateStation(station_id))
        );
    }

    #[test]
    fn test_ledger_add_booking_holds_slot() {
        let mut ledger = BookingLedger::new();
        let station_id = ledger.add_station(create_test_station(2)).unwrap();

        let booking = Booking::new(
            create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant),
            15.0,
        );
        let booking_id = ledger.add_booking(booking);

        assert_eq!(ledger.available_slots(station_id).unwrap(), 1);
        assert_eq!(ledger.booking(booking_id).unwrap().id, booking_id);
    }

    #[tokio::test]
    async fn test_create_booking_until_station_full() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        for _ in 0..3 {
            engine
                .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
                .await
                .unwrap();
        }

        let result = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await;
        assert_eq!(result.unwrap_err(), BookingError::StationFull);

        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert_eq!(snapshot.available_slots, 0);
        assert_eq!(snapshot.total_slots, 3);
        assert_eq!(snapshot.occupancy_band, OccupancyBand::Busy);
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_immediately() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(1)).await.unwrap();
        let user_id = Uuid::new_v4();

        let booking = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
        assert_eq!(
            engine
                .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
                .await
                .unwrap_err(),
            BookingError::StationFull
        );

        engine.cancel(booking.id, user_id).await.unwrap();

        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert_eq!(snapshot.available_slots, 1);
        engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_booking_rejects_non_positive_duration() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();

        let mut spec = create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant);
        spec.duration_hours = 0.0;

        assert_eq!(
            engine.create_booking(spec).await.unwrap_err(),
            BookingError::InvalidDuration(0.0)
        );
    }

    #[tokio::test]
    async fn test_create_booking_rejects_non_finite_duration() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();

        let mut spec = create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant);
        spec.duration_hours = f64::NAN;
        let result = engine.create_booking(spec).await;
        assert!(matches!(
            result,
            Err(BookingError::InvalidDuration(hours)) if hours.is_nan()
        ));

        let mut spec = create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant);
        spec.duration_hours = f64::INFINITY;
        assert_eq!(
            engine.create_booking(spec).await.unwrap_err(),
            BookingError::InvalidDuration(f64::INFINITY)
        );

        let mut spec = create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant);
        spec.duration_hours = -1.0;
        assert_eq!(
            engine.create_booking(spec).await.unwrap_err(),
            BookingError::InvalidDuration(-1.0)
        );
    }

    #[tokio::test]
    async fn test_create_booking_unknown_station() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let missing = Uuid::new_v4();

        let result = engine
            .create_booking(create_test_spec(missing, Uuid::new_v4(), CreationPolicy::Instant))
            .await;
        assert_eq!(result.unwrap_err(), BookingError::UnknownStation(missing));
    }

    #[tokio::test]
    async fn test_creation_policy_sets_initial_status() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let instant = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
        assert_eq!(instant.status, BookingStatus::Confirmed);

        let deferred = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Deferred))
            .await
            .unwrap();
        assert_eq!(deferred.status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_rating() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let booking = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Deferred))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.rating, None);

        assert_eq!(
            engine.transition(booking.id, TransitionEvent::Confirm).await.unwrap(),
            BookingStatus::Confirmed
        );
        assert_eq!(
            engine.transition(booking.id, TransitionEvent::Start).await.unwrap(),
            BookingStatus::Active
        );
        assert_eq!(
            engine.transition(booking.id, TransitionEvent::Complete).await.unwrap(),
            BookingStatus::Completed
        );

        engine.rate(booking.id, 4).await.unwrap();
        assert_eq!(engine.booking(booking.id).await.unwrap().rating, Some(4));

        // A second rating is rejected
        assert_eq!(
            engine.rate(booking.id, 5).await.unwrap_err(),
            BookingError::NotRateable
        );
    }

    #[tokio::test]
    async fn test_rating_requires_completed_status() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();

        let booking = engine
            .create_booking(create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant))
            .await
            .unwrap();

        assert_eq!(
            engine.rate(booking.id, 3).await.unwrap_err(),
            BookingError::NotRateable
        );
    }

    #[tokio::test]
    async fn test_rating_stars_out_of_range() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();

        let booking = engine
            .create_booking(create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Instant))
            .await
            .unwrap();

        assert_eq!(
            engine.rate(booking.id, 0).await.unwrap_err(),
            BookingError::InvalidRating(0)
        );
        assert_eq!(
            engine.rate(booking.id, 6).await.unwrap_err(),
            BookingError::InvalidRating(6)
        );
    }

    #[tokio::test]
    async fn test_cancel_terminal_booking_fails() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let booking = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
        engine.cancel(booking.id, user_id).await.unwrap();

        assert_eq!(
            engine.cancel(booking.id, user_id).await.unwrap_err(),
            BookingError::AlreadyTerminal(BookingStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_transition_unknown_booking() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let missing = Uuid::new_v4();

        assert_eq!(
            engine.transition(missing, TransitionEvent::Confirm).await.unwrap_err(),
            BookingError::UnknownBooking(missing)
        );
    }

    #[tokio::test]
    async fn test_promote_due_bookings() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let due = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Deferred))
            .await
            .unwrap();
        let mut future_spec = create_test_spec(station_id, user_id, CreationPolicy::Instant);
        future_spec.scheduled_date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let not_due = engine.create_booking(future_spec).await.unwrap();

        let promoted = engine
            .promote_due_bookings(due.scheduled_start() + Duration::minutes(1))
            .await;

        assert_eq!(promoted, vec![due.id]);
        assert_eq!(
            engine.booking(due.id).await.unwrap().status,
            BookingStatus::Active
        );
        assert_eq!(
            engine.booking(not_due.id).await.unwrap().status,
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_promotion_never_touches_terminal_bookings() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let booking = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
        engine.cancel(booking.id, user_id).await.unwrap();

        let promoted = engine.promote_due_bookings(Utc::now() + Duration::days(365)).await;

        assert!(promoted.is_empty());
        assert_eq!(
            engine.booking(booking.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_expire_stale_pending_only() {
        let config = EngineConfig {
            pending_ttl_minutes: 0,
        };
        let engine = BookingLifecycleEngine::new(config);
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let user_id = Uuid::new_v4();

        let pending = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Deferred))
            .await
            .unwrap();
        let confirmed = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();

        let expired = engine.expire_stale_pending(Utc::now()).await;

        assert_eq!(expired, vec![pending.id]);
        assert_eq!(
            engine.booking(pending.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
        assert_eq!(
            engine.booking(confirmed.id).await.unwrap().status,
            BookingStatus::Confirmed
        );

        // The expired booking no longer holds its slot
        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert_eq!(snapshot.available_slots, 2);
    }

    #[tokio::test]
    async fn test_expiry_respects_ttl() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(3)).await.unwrap();

        engine
            .create_booking(create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Deferred))
            .await
            .unwrap();

        // Just created, well within the default 15-minute TTL
        let expired = engine.expire_stale_pending(Utc::now()).await;
        assert!(expired.is_empty());
    }

    #[tokio::test]
    async fn test_availability_always_within_bounds() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(2)).await.unwrap();
        let user_id = Uuid::new_v4();

        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert_eq!(snapshot.available_slots, 2);

        let first = engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();
        engine
            .create_booking(create_test_spec(station_id, user_id, CreationPolicy::Instant))
            .await
            .unwrap();

        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert_eq!(snapshot.available_slots, 0);

        engine.cancel(first.id, user_id).await.unwrap();
        let snapshot = engine.availability_for(station_id).await.unwrap();
        assert!(snapshot.available_slots <= snapshot.total_slots);
        assert_eq!(snapshot.available_slots, 1);
    }

    #[tokio::test]
    async fn test_event_handlers_receive_lifecycle_events() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingHandler(Arc<AtomicUsize>);

        impl BookingEventHandler for CountingHandler {
            fn handle_event(&self, _event: &BookingEvent) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let events_seen = Arc::new(AtomicUsize::new(0));
        let mut engine = BookingLifecycleEngine::new(EngineConfig::default());
        engine.add_event_handler(Box::new(CountingHandler(Arc::clone(&events_seen))));

        let station_id = engine.add_station(create_test_station(3)).await.unwrap();
        let booking = engine
            .create_booking(create_test_spec(station_id, Uuid::new_v4(), CreationPolicy::Deferred))
            .await
            .unwrap();
        engine.transition(booking.id, TransitionEvent::Confirm).await.unwrap();

        // One created event plus one status-changed event
        assert_eq!(events_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_bookings_for_user_filters_and_sorts() {
        let engine = BookingLifecycleEngine::new(EngineConfig::default());
        let station_id = engine.add_station(create_test_station(5)).await.unwrap();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        engine
            .create_booking(create_test_spec(station_id, alice, CreationPolicy::Instant))
            .await
            .unwrap();
        engine
            .create_booking(create_test_spec(station_id, bob, CreationPolicy::Instant))
            .await
            .unwrap();
        engine
            .create_booking(create_test_spec(station_id, alice, CreationPolicy::Deferred))
            .await
            .unwrap();

        let history = engine.bookings_for_user(alice).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|booking| booking.user_id == alice));
        assert!(history[0].created_at >= history[1].created_at);
    }
}
