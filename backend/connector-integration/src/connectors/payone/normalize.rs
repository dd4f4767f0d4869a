use rand::Rng;
use time::OffsetDateTime;

pub const MAX_CUSTOMER_ID_LEN: usize = 17;
pub const MAX_REFERENCE_LEN: usize = 20;

fn epoch_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Bring a caller-supplied customer id down to the processor's 17
/// character limit, synthesizing one when absent. Never fails.
pub fn normalize_customer_id(id: Option<&str>) -> String {
    match id {
        Some(value) if !value.trim().is_empty() => {
            let value = value.trim();
            if value.len() > MAX_CUSTOMER_ID_LEN {
                tracing::warn!(
                    customer_id_len = value.len(),
                    "customer id exceeds {MAX_CUSTOMER_ID_LEN} characters, truncating"
                );
            }
            value.chars().take(MAX_CUSTOMER_ID_LEN).collect()
        }
        _ => synthesize_customer_id(),
    }
}

fn synthesize_customer_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}{suffix:04}", epoch_millis())
        .chars()
        .take(MAX_CUSTOMER_ID_LEN)
        .collect()
}

/// Strip a reference down to the processor-legal alphanumeric charset and
/// 20 character limit. An empty result falls back to
/// `{fallback_prefix}{epoch_millis}`. Never fails.
pub fn normalize_reference(input: &str, fallback_prefix: &str) -> String {
    let stripped: String = input.chars().filter(char::is_ascii_alphanumeric).collect();
    let reference = if stripped.is_empty() {
        format!("{fallback_prefix}{}", epoch_millis())
    } else {
        stripped
    };
    reference.chars().take(MAX_REFERENCE_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_is_never_longer_than_seventeen() {
        let id = normalize_customer_id(Some("customer-000000000000000042"));
        assert_eq!(id.len(), MAX_CUSTOMER_ID_LEN);
    }

    #[test]
    fn short_alphanumeric_customer_id_passes_through() {
        assert_eq!(normalize_customer_id(Some("cust42")), "cust42");
        // Idempotent on already-legal input.
        assert_eq!(normalize_customer_id(Some("cust42")), "cust42");
    }

    #[test]
    fn absent_customer_id_is_synthesized() {
        let id = normalize_customer_id(None);
        assert!(!id.is_empty());
        assert!(id.len() <= MAX_CUSTOMER_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn reference_strips_non_alphanumerics() {
        assert_eq!(normalize_reference("a!b@c#123", "REF"), "abc123");
    }

    #[test]
    fn empty_reference_falls_back_to_prefixed_timestamp() {
        let reference = normalize_reference("", "REF");
        assert!(reference.starts_with("REF"));
        assert!(reference.len() <= MAX_REFERENCE_LEN);
        assert!(reference.len() > "REF".len());
    }

    #[test]
    fn overlong_reference_is_truncated() {
        let reference = normalize_reference(&"a".repeat(40), "REF");
        assert_eq!(reference.len(), MAX_REFERENCE_LEN);
    }
}
