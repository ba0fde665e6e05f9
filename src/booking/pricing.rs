use crate::booking::types::{ChargerType, Station};

/// Pricing collaborator for quoting booking costs.
///
/// Quotes must be deterministic for the same inputs and never negative;
/// the engine stores the result on the booking at creation time.
pub trait PricingPolicy: Send + Sync {
    fn quote(&self, station: &Station, duration_hours: f64, charger_type: ChargerType) -> f64;
}

/// Default pricing: linear in duration, with a rate multiplier for fast
/// chargers.
#[derive(Clone, Debug)]
pub struct LinearPricing {
    pub fast_multiplier: f64,
}

impl Default for LinearPricing {
    fn default() -> Self {
        Self {
            fast_multiplier: 1.5,
        }
    }
}

impl PricingPolicy for LinearPricing {
    fn quote(&self, station: &Station, duration_hours: f64, charger_type: ChargerType) -> f64 {
        let multiplier = match charger_type {
            ChargerType::Fast => self.fast_multiplier,
            ChargerType::Slow => 1.0,
        };

        (station.price_per_session * duration_hours * multiplier).max(0.0)
    }
}
