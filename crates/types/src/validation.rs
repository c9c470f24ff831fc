//! Validation helpers for enum values and seat-selection payloads.
//!
//! These constants and functions centralize validation of string values and
//! request shapes against known valid options.

/// Valid role values carried in a bearer token's `role` claim.
pub const VALID_ROLES: &[&str] = &["user", "organizer", "admin"];

/// Valid payment provider values.
pub const VALID_PAYMENT_PROVIDERS: &[&str] = &["payme", "click"];

/// Validates that a value is one of the allowed values.
pub fn validate_enum_value(value: &str, valid_values: &[&str], field_name: &str) -> Result<(), String> {
    if valid_values.contains(&value) {
        Ok(())
    } else {
        Err(format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        ))
    }
}

pub fn validate_role(role: &str) -> Result<(), String> {
    validate_enum_value(role, VALID_ROLES, "role")
}

pub fn validate_payment_provider(provider: &str) -> Result<(), String> {
    validate_enum_value(provider, VALID_PAYMENT_PROVIDERS, "payment provider")
}

/// Validates a batch of seat ids for a `select`/`reserve` request: non-empty,
/// no duplicates, and within the configured per-booking cap (§4.3).
pub fn validate_seat_batch(seat_ids: &[uuid::Uuid], max_seats: usize) -> Result<(), String> {
    if seat_ids.is_empty() {
        return Err("at least one seat id is required".to_string());
    }
    if seat_ids.len() > max_seats {
        return Err(format!("at most {max_seats} seats may be selected at once"));
    }
    let mut seen = std::collections::HashSet::with_capacity(seat_ids.len());
    for id in seat_ids {
        if !seen.insert(id) {
            return Err(format!("duplicate seat id {id} in request"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_validate_role() {
        assert!(validate_role("user").is_ok());
        assert!(validate_role("organizer").is_ok());
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("invalid").is_err());
    }

    #[test]
    fn test_validate_payment_provider() {
        assert!(validate_payment_provider("payme").is_ok());
        assert!(validate_payment_provider("click").is_ok());
        assert!(validate_payment_provider("stripe").is_err());
    }

    #[test]
    fn test_validate_seat_batch_empty() {
        assert!(validate_seat_batch(&[], 10).is_err());
    }

    #[test]
    fn test_validate_seat_batch_too_many() {
        let ids: Vec<Uuid> = (0..11).map(|_| Uuid::new_v4()).collect();
        assert!(validate_seat_batch(&ids, 10).is_err());
    }

    #[test]
    fn test_validate_seat_batch_duplicate() {
        let id = Uuid::new_v4();
        assert!(validate_seat_batch(&[id, id], 10).is_err());
    }

    #[test]
    fn test_validate_seat_batch_ok() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        assert!(validate_seat_batch(&ids, 10).is_ok());
    }
}
