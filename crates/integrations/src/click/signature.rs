/// `md5(click_trans_id || service_id || secret || merchant_trans_id [|| merchant_prepare_id] || amount || action || sign_time)`,
/// per §4.6. `merchant_prepare_id` is only present on the complete step.
#[allow(clippy::too_many_arguments)]
pub fn verify(
    click_trans_id: i64,
    service_id: &str,
    secret: &str,
    merchant_trans_id: &str,
    merchant_prepare_id: Option<i64>,
    amount: &str,
    action: i32,
    sign_time: &str,
    sign_string: &str,
) -> bool {
    let mut raw = format!("{click_trans_id}{service_id}{secret}{merchant_trans_id}");
    if let Some(prepare_id) = merchant_prepare_id {
        raw.push_str(&prepare_id.to_string());
    }
    raw.push_str(&format!("{amount}{action}{sign_time}"));

    let digest = hex::encode(md5::compute(raw.as_bytes()).0);
    digest.eq_ignore_ascii_case(sign_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_a_known_digest() {
        let raw = "1001secretbooking-1".to_string() + "1000" + "0" + "000";
        let sign_string = hex::encode(md5::compute(raw.as_bytes()).0);
        assert!(verify(1, "001", "secret", "booking-1", None, "1000", 0, "000", &sign_string));
    }

    #[test]
    fn rejects_a_tampered_signature() {
        assert!(!verify(1, "001", "secret", "booking-1", None, "1000", 0, "000", "deadbeef"));
    }
}
