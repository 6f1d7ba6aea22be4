//! Content hash identifying a completed flip.
//!
//! Export rows carry no stable id, so a flip is identified by what it is: the
//! same account, item, status, quantities, money and closing time always hash
//! to the same key, and re-importing an overlapping export cannot create a
//! second copy.

use crate::convert::format_number;
use sha2::{Digest, Sha256};

/// Fields that make up a flip's identity, in hashing order.
pub struct FlipIdentity<'a> {
    pub account_id: &'a str,
    pub item_name: &'a str,
    pub status: &'a str,
    pub closed_quantity: f64,
    pub received_post_tax: f64,
    pub tax_paid: f64,
    pub profit: f64,
    pub closed_time: &'a str,
}

/// SHA-256 over the `|`-joined identity fields, hex encoded (64 chars).
pub fn compute_flip_hash(identity: &FlipIdentity<'_>) -> String {
    let input = [
        identity.account_id.to_string(),
        identity.item_name.to_string(),
        identity.status.to_string(),
        format_number(identity.closed_quantity),
        format_number(identity.received_post_tax),
        format_number(identity.tax_paid),
        format_number(identity.profit),
        identity.closed_time.to_string(),
    ]
    .join("|");

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scimitar() -> FlipIdentity<'static> {
        FlipIdentity {
            account_id: "main",
            item_name: "Rune Scimitar",
            status: "FINISHED",
            closed_quantity: 10.0,
            received_post_tax: 149_700.0,
            tax_paid: 300.0,
            profit: 1_200.0,
            closed_time: "2025-08-01T12:00:00Z",
        }
    }

    #[test]
    fn hash_is_hex_sha256() {
        let key = compute_flip_hash(&scimitar());
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_fields_same_hash() {
        assert_eq!(compute_flip_hash(&scimitar()), compute_flip_hash(&scimitar()));
    }

    #[test]
    fn known_digest_of_joined_fields() {
        // sha256("main|Rune Scimitar|FINISHED|10|149700|300|1200|2025-08-01T12:00:00Z")
        let mut hasher = Sha256::new();
        hasher.update(b"main|Rune Scimitar|FINISHED|10|149700|300|1200|2025-08-01T12:00:00Z");
        assert_eq!(compute_flip_hash(&scimitar()), hex::encode(hasher.finalize()));
    }

    #[test]
    fn every_field_participates() {
        let base = compute_flip_hash(&scimitar());
        let variants = [
            FlipIdentity { account_id: "alt", ..scimitar() },
            FlipIdentity { item_name: "Rune Scimitar ", ..scimitar() },
            FlipIdentity { status: "SELLING", ..scimitar() },
            FlipIdentity { closed_quantity: 9.0, ..scimitar() },
            FlipIdentity { received_post_tax: 149_701.0, ..scimitar() },
            FlipIdentity { tax_paid: 301.0, ..scimitar() },
            FlipIdentity { profit: 1_199.0, ..scimitar() },
            FlipIdentity { closed_time: "2025-08-01T12:00:01Z", ..scimitar() },
        ];
        for variant in &variants {
            assert_ne!(compute_flip_hash(variant), base);
        }
    }
}
