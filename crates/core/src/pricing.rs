//! Price calculation for a batch of seats: a per-seat tariff lookup summed
//! across the batch.

use seatflow_types::models::Tariff;
use uuid::Uuid;

/// Sums each seat's tariff price. Seats missing a matching tariff
/// contribute nothing — the caller is expected to have already validated
/// every seat has a resolvable tariff before reaching this point.
pub fn total_price_minor(seat_tariff_ids: &[Uuid], tariffs: &[Tariff]) -> i64 {
    seat_tariff_ids
        .iter()
        .filter_map(|tariff_id| tariffs.iter().find(|t| &t.id == tariff_id))
        .map(|t| t.price_minor)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tariff(id: Uuid, price_minor: i64) -> Tariff {
        Tariff {
            id,
            session_id: Uuid::new_v4(),
            name: "standard".into(),
            price_minor,
            currency: "UZS".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sums_matching_tariffs() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let tariffs = vec![tariff(t1, 10_000), tariff(t2, 15_000)];
        assert_eq!(total_price_minor(&[t1, t2, t1], &tariffs), 35_000);
    }

    #[test]
    fn ignores_unknown_tariffs() {
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let tariffs = vec![tariff(known, 10_000)];
        assert_eq!(total_price_minor(&[known, unknown], &tariffs), 10_000);
    }
}
