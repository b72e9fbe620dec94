//! Deterministic channel identity derivation.
//!
//! A channel's public UUID is a function of its (source_id, domain) pair:
//! the domain seeds a namespace UUID (v5, rooted at the DNS namespace) and
//! the source id is hashed inside that namespace. Registering the same
//! channel twice always produces the same id, which is how duplicate
//! registrations are detected.

use uuid::Uuid;

/// Derive the namespace UUID for a source domain.
pub fn domain_namespace(domain: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, domain.as_bytes())
}

/// Compute the stable channel UUID for a (source_id, domain) pair.
pub fn compute_channel_id(source_id: &str, domain: &str) -> Uuid {
    let namespace = domain_namespace(domain);
    Uuid::new_v5(&namespace, source_id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_calls_return_identical_uuid() {
        let a = compute_channel_id("khan-academy", "learningequality.org");
        let b = compute_channel_id("khan-academy", "learningequality.org");
        assert_eq!(a, b);
    }

    #[test]
    fn different_domains_produce_different_namespaces() {
        let ns1 = domain_namespace("alpha.example.org");
        let ns2 = domain_namespace("beta.example.org");
        assert_ne!(ns1, ns2);
    }

    #[test]
    fn same_source_id_under_different_domains_differs() {
        let a = compute_channel_id("shared-source", "alpha.example.org");
        let b = compute_channel_id("shared-source", "beta.example.org");
        assert_ne!(a, b);
    }

    #[test]
    fn different_source_ids_under_same_domain_differ() {
        let a = compute_channel_id("source-one", "example.org");
        let b = compute_channel_id("source-two", "example.org");
        assert_ne!(a, b);
    }
}
