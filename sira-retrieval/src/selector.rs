//! Provider selection over the current registry state.

use std::cmp::Ordering;

use crate::registry::{Provider, ProviderRegistry};

/// Choose the provider to try next.
///
/// Among providers that are healthy and still have quota, the highest
/// weight wins; equal weights prefer the lower `priority` value, then
/// registration order. When nothing is eligible the designated `fallback`
/// provider is returned.
pub fn select(registry: &ProviderRegistry, fallback: &str) -> String {
    pick(&registry.all())
        .map(|p| p.name.clone())
        .unwrap_or_else(|| fallback.to_owned())
}

/// Best eligible provider among `providers`, if any.
fn pick(providers: &[Provider]) -> Option<&Provider> {
    providers
        .iter()
        .filter(|p| p.is_eligible())
        .fold(None, |best: Option<&Provider>, candidate| match best {
            Some(current) if compare(candidate, current) != Ordering::Greater => Some(current),
            _ => Some(candidate),
        })
}

/// `Greater` means `a` is preferred over `b`.
fn compare(a: &Provider, b: &Provider) -> Ordering {
    a.weight
        .partial_cmp(&b.weight)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.priority.cmp(&a.priority))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn picks_highest_weight() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("low", 0.4, None, 1),
            ProviderConfig::new("high", 0.9, None, 2),
            ProviderConfig::new("mid", 0.6, None, 3),
        ]);
        assert_eq!(select(&registry, "low"), "high");
    }

    #[test]
    fn tie_prefers_lower_priority_value() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("second", 0.7, None, 2),
            ProviderConfig::new("first", 0.7, None, 1),
        ]);
        assert_eq!(select(&registry, "second"), "first");
    }

    #[test]
    fn full_tie_keeps_registration_order() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("a", 0.7, None, 1),
            ProviderConfig::new("b", 0.7, None, 1),
        ]);
        assert_eq!(select(&registry, "b"), "a");
    }

    #[test]
    fn skips_unhealthy_provider() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("best", 1.0, None, 1),
            ProviderConfig::new("ok", 0.5, None, 2),
        ]);
        registry.penalize("best");
        assert_eq!(select(&registry, "ok"), "ok");
    }

    #[test]
    fn skips_exhausted_quota_even_when_healthy() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("x", 0.9, Some(5), 1),
            ProviderConfig::new("fallback", 0.5, None, 2),
        ]);
        assert_eq!(select(&registry, "fallback"), "x");
        for _ in 0..5 {
            registry.consume_quota("x");
        }
        assert!(registry.get("x").expect("x exists").healthy);
        assert_eq!(select(&registry, "fallback"), "fallback");
    }

    #[test]
    fn empty_eligible_set_returns_fallback() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("a", 0.9, None, 1),
            ProviderConfig::new("fallback", 0.5, None, 2),
        ]);
        registry.penalize("a");
        registry.penalize("fallback");
        assert_eq!(select(&registry, "fallback"), "fallback");
    }

    #[test]
    fn never_returns_ineligible_when_alternatives_exist() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("a", 1.0, Some(1), 1),
            ProviderConfig::new("b", 0.9, None, 2),
            ProviderConfig::new("c", 0.8, None, 3),
            ProviderConfig::new("fallback", 0.1, None, 4),
        ]);
        registry.consume_quota("a");
        registry.penalize("b");
        let chosen = select(&registry, "fallback");
        let provider = registry.get(&chosen).expect("chosen exists");
        assert!(provider.is_eligible());
        assert_eq!(chosen, "c");
    }
}
