//! Namespace rewriting for platform-reserved namespaces

/// Namespace prefix owned by the platform; not writable through the Admin API
pub const RESERVED_PREFIX: &str = "shopify.";

/// Prefix of the custom namespace reserved namespaces are relocated into
pub const CUSTOM_PREFIX: &str = "custom_";

/// Map a source namespace onto one the destination accepts
///
/// `shopify.<segment>[.rest]` becomes `custom_<segment>`; anything else is
/// returned unchanged.
pub fn rewrite_namespace(namespace: &str) -> String {
    match namespace.strip_prefix(RESERVED_PREFIX) {
        Some(rest) => {
            let segment = rest.split('.').next().unwrap_or_default();
            format!("{}{}", CUSTOM_PREFIX, segment)
        }
        None => namespace.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrites_reserved_namespace() {
        assert_eq!(rewrite_namespace("shopify.color"), "custom_color");
    }

    #[test]
    fn test_keeps_custom_namespace() {
        assert_eq!(rewrite_namespace("custom.size"), "custom.size");
        assert_eq!(rewrite_namespace("custom.info"), "custom.info");
    }

    #[test]
    fn test_only_second_segment_is_kept() {
        assert_eq!(rewrite_namespace("shopify.product.details"), "custom_product");
    }

    #[test]
    fn test_prefix_must_match_exactly() {
        // no trailing dot, so not the reserved prefix
        assert_eq!(rewrite_namespace("shopify"), "shopify");
        assert_eq!(rewrite_namespace("shopify_extras.color"), "shopify_extras.color");
        assert_eq!(rewrite_namespace("my.shopify.color"), "my.shopify.color");
    }

    #[test]
    fn test_empty_segment() {
        assert_eq!(rewrite_namespace("shopify."), "custom_");
    }
}
