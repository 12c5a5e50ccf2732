//! Process-wide provider registry with adaptive weight and health tracking.
//!
//! Every provider keeps a trust weight, an optional remaining-call quota and
//! a health flag. Successful fetches reward the provider, failures penalise
//! it, and the selector reads the resulting state to route the next call.
//!
//! ```text
//!             reward: weight += 0.05 (≤ 1.0), healthy = true
//!          ┌──────────────────────────────────────────────┐
//!          ▼                                              │
//!     ┌─────────┐  penalize: weight -= 0.1 (≥ 0.1)   ┌───────────┐
//!     │ healthy ├───────────────────────────────────►│ unhealthy │
//!     └─────────┘                                    └───────────┘
//! ```
//!
//! Quota is orthogonal to health: a provider whose quota reaches 0 is
//! ineligible even while healthy.
//!
//! Each provider's state sits behind its own mutex, so concurrent
//! retrievals never lose an update to one provider while they contend on
//! another.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::config::ProviderConfig;

/// Lower bound of a provider weight.
pub const MIN_WEIGHT: f64 = 0.1;
/// Upper bound of a provider weight.
pub const MAX_WEIGHT: f64 = 1.0;
/// Weight gained per successful fetch.
pub const REWARD_STEP: f64 = 0.05;
/// Weight lost per failed fetch.
pub const PENALTY_STEP: f64 = 0.1;

/// Point-in-time view of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Provider {
    /// Unique provider name.
    pub name: String,
    /// Trust weight in `[0.1, 1.0]`.
    pub weight: f64,
    /// Remaining call budget; `None` means unlimited.
    pub quota: Option<u32>,
    /// Lower is preferred when weights tie.
    pub priority: u32,
    /// Cleared on failure, set on success.
    pub healthy: bool,
}

impl Provider {
    /// Whether the quota still allows a call.
    pub fn has_quota(&self) -> bool {
        self.quota.is_none_or(|q| q > 0)
    }

    /// Healthy and not out of quota.
    pub fn is_eligible(&self) -> bool {
        self.healthy && self.has_quota()
    }
}

#[derive(Debug)]
struct ProviderState {
    weight: f64,
    quota: Option<u32>,
    healthy: bool,
}

#[derive(Debug)]
struct ProviderSlot {
    name: String,
    priority: u32,
    state: Mutex<ProviderState>,
}

impl ProviderSlot {
    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        // A panic while holding the lock cannot leave the three plain
        // fields half-written, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self) -> Provider {
        let state = self.lock();
        Provider {
            name: self.name.clone(),
            weight: state.weight,
            quota: state.quota,
            priority: self.priority,
            healthy: state.healthy,
        }
    }
}

/// Table of known providers. The set of providers is fixed at
/// construction; only their state changes afterwards.
#[derive(Debug)]
pub struct ProviderRegistry {
    slots: Vec<ProviderSlot>,
}

impl ProviderRegistry {
    /// Build a registry from static provider configuration. All providers
    /// start healthy; weights are clamped into `[0.1, 1.0]`.
    pub fn new(providers: &[ProviderConfig]) -> Self {
        let slots = providers
            .iter()
            .map(|p| ProviderSlot {
                name: p.name.clone(),
                priority: p.priority,
                state: Mutex::new(ProviderState {
                    weight: p.weight.clamp(MIN_WEIGHT, MAX_WEIGHT),
                    quota: p.quota,
                    healthy: true,
                }),
            })
            .collect();
        Self { slots }
    }

    fn slot(&self, name: &str) -> Option<&ProviderSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Current state of the named provider.
    pub fn get(&self, name: &str) -> Option<Provider> {
        self.slot(name).map(ProviderSlot::snapshot)
    }

    /// Current state of every provider, in registration order.
    pub fn all(&self) -> Vec<Provider> {
        self.slots.iter().map(ProviderSlot::snapshot).collect()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record a successful fetch: raise the weight by 0.05 (capped at 1.0)
    /// and mark the provider healthy.
    ///
    /// Returns the updated state, or `None` for an unknown provider.
    pub fn reward(&self, name: &str) -> Option<Provider> {
        let slot = self.slot(name)?;
        {
            let mut state = slot.lock();
            state.weight = (state.weight + REWARD_STEP).min(MAX_WEIGHT);
            state.healthy = true;
        }
        tracing::trace!(provider = name, "provider rewarded");
        Some(slot.snapshot())
    }

    /// Record a failed fetch: lower the weight by 0.1 (floored at 0.1) and
    /// mark the provider unhealthy.
    ///
    /// Returns the updated state, or `None` for an unknown provider.
    pub fn penalize(&self, name: &str) -> Option<Provider> {
        let slot = self.slot(name)?;
        {
            let mut state = slot.lock();
            state.weight = (state.weight - PENALTY_STEP).max(MIN_WEIGHT);
            state.healthy = false;
        }
        tracing::trace!(provider = name, "provider penalized");
        Some(slot.snapshot())
    }

    /// Spend one unit of quota. Unlimited providers are unaffected and a
    /// spent quota stays at 0.
    ///
    /// Returns the updated state, or `None` for an unknown provider.
    pub fn consume_quota(&self, name: &str) -> Option<Provider> {
        let slot = self.slot(name)?;
        {
            let mut state = slot.lock();
            if let Some(quota) = state.quota.as_mut() {
                *quota = quota.saturating_sub(1);
            }
        }
        Some(slot.snapshot())
    }

    /// Take one unit of quota ahead of a call, checking and spending under
    /// the same lock. Unlimited providers always succeed.
    ///
    /// Returns `false` when the quota is spent or the provider is unknown.
    pub fn reserve_quota(&self, name: &str) -> bool {
        let Some(slot) = self.slot(name) else {
            return false;
        };
        let mut state = slot.lock();
        match state.quota.as_mut() {
            None => true,
            Some(0) => false,
            Some(quota) => {
                *quota -= 1;
                true
            }
        }
    }

    /// Give back a unit taken by [`ProviderRegistry::reserve_quota`] for a
    /// call that failed.
    pub fn refund_quota(&self, name: &str) {
        if let Some(slot) = self.slot(name) {
            let mut state = slot.lock();
            if let Some(quota) = state.quota.as_mut() {
                *quota = quota.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_registry() -> ProviderRegistry {
        ProviderRegistry::new(&[
            ProviderConfig::new("x", 0.9, Some(5), 1),
            ProviderConfig::new("fallback", 0.5, None, 2),
        ])
    }

    #[test]
    fn initial_state_is_healthy() {
        let registry = make_registry();
        for provider in registry.all() {
            assert!(provider.healthy, "{} should start healthy", provider.name);
            assert!(provider.is_eligible());
        }
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn out_of_range_initial_weight_is_clamped() {
        let registry = ProviderRegistry::new(&[
            ProviderConfig::new("hi", 3.0, None, 1),
            ProviderConfig::new("lo", 0.0, None, 2),
        ]);
        assert!((registry.get("hi").expect("hi").weight - MAX_WEIGHT).abs() < f64::EPSILON);
        assert!((registry.get("lo").expect("lo").weight - MIN_WEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_provider_returns_none() {
        let registry = make_registry();
        assert!(registry.get("nope").is_none());
        assert!(registry.reward("nope").is_none());
        assert!(registry.penalize("nope").is_none());
        assert!(registry.consume_quota("nope").is_none());
    }

    #[test]
    fn reward_raises_weight_and_restores_health() {
        let registry = make_registry();
        registry.penalize("x");
        let p = registry.reward("x").expect("x exists");
        assert!((p.weight - 0.85).abs() < 1e-9);
        assert!(p.healthy);
    }

    #[test]
    fn reward_caps_at_one() {
        let registry = make_registry();
        for _ in 0..10 {
            registry.reward("x");
        }
        let p = registry.get("x").expect("x exists");
        assert!((p.weight - MAX_WEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn penalize_lowers_weight_and_marks_unhealthy() {
        let registry = make_registry();
        let p = registry.penalize("x").expect("x exists");
        assert!((p.weight - 0.8).abs() < 1e-9);
        assert!(!p.healthy);
        assert!(!p.is_eligible());
    }

    #[test]
    fn penalize_floors_at_min_weight() {
        let registry = make_registry();
        for _ in 0..20 {
            registry.penalize("x");
        }
        let p = registry.get("x").expect("x exists");
        assert!((p.weight - MIN_WEIGHT).abs() < f64::EPSILON);
    }

    #[test]
    fn weight_stays_in_bounds_under_mixed_updates() {
        let registry = make_registry();
        // Deterministic pseudo-random walk over reward/penalize.
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            if seed % 3 == 0 {
                registry.penalize("x");
            } else {
                registry.reward("x");
            }
            let w = registry.get("x").expect("x exists").weight;
            assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&w), "weight {w} out of bounds");
        }
    }

    #[test]
    fn quota_exhaustion_makes_provider_ineligible_while_healthy() {
        let registry = make_registry();
        for expected in (0..5).rev() {
            let p = registry.consume_quota("x").expect("x exists");
            assert_eq!(p.quota, Some(expected));
        }
        let p = registry.get("x").expect("x exists");
        assert!(p.healthy);
        assert!(!p.has_quota());
        assert!(!p.is_eligible());
    }

    #[test]
    fn quota_never_goes_below_zero() {
        let registry = make_registry();
        for _ in 0..8 {
            registry.consume_quota("x");
        }
        assert_eq!(registry.get("x").expect("x exists").quota, Some(0));
    }

    #[test]
    fn unlimited_quota_is_untouched() {
        let registry = make_registry();
        for _ in 0..100 {
            registry.consume_quota("fallback");
        }
        let p = registry.get("fallback").expect("fallback exists");
        assert_eq!(p.quota, None);
        assert!(p.is_eligible());
    }

    #[test]
    fn concurrent_consumption_loses_no_updates() {
        let registry = std::sync::Arc::new(ProviderRegistry::new(&[ProviderConfig::new(
            "busy",
            0.5,
            Some(1000),
            1,
        )]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        registry.consume_quota("busy");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread should finish");
        }
        assert_eq!(registry.get("busy").expect("busy exists").quota, Some(600));
    }

    #[test]
    fn reserve_spends_quota_until_exhausted() {
        let registry = ProviderRegistry::new(&[ProviderConfig::new("one", 0.5, Some(1), 1)]);
        assert!(registry.reserve_quota("one"));
        assert!(!registry.reserve_quota("one"));
        assert_eq!(registry.get("one").expect("one exists").quota, Some(0));
    }

    #[test]
    fn refund_returns_reserved_unit() {
        let registry = ProviderRegistry::new(&[ProviderConfig::new("one", 0.5, Some(1), 1)]);
        assert!(registry.reserve_quota("one"));
        registry.refund_quota("one");
        assert_eq!(registry.get("one").expect("one exists").quota, Some(1));
        assert!(registry.reserve_quota("one"));
    }

    #[test]
    fn reserve_on_unlimited_or_unknown_provider() {
        let registry = make_registry();
        assert!(registry.reserve_quota("fallback"));
        registry.refund_quota("fallback");
        assert_eq!(registry.get("fallback").expect("fallback exists").quota, None);
        assert!(!registry.reserve_quota("nope"));
    }

    #[test]
    fn concurrent_reservations_never_oversubscribe() {
        let registry = std::sync::Arc::new(ProviderRegistry::new(&[ProviderConfig::new(
            "scarce",
            0.5,
            Some(10),
            1,
        )]));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    (0..5).filter(|_| registry.reserve_quota("scarce")).count()
                })
            })
            .collect();
        let granted: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread should finish"))
            .sum();
        assert_eq!(granted, 10);
        assert_eq!(registry.get("scarce").expect("scarce exists").quota, Some(0));
    }

    #[test]
    fn providers_are_independent() {
        let registry = make_registry();
        registry.penalize("x");
        let fallback = registry.get("fallback").expect("fallback exists");
        assert!(fallback.healthy);
        assert!((fallback.weight - 0.5).abs() < f64::EPSILON);
    }
}
