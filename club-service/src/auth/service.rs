//! Authorization service: capability derivation with a time-boxed cache.
//!
//! The service owns its cache and its eviction task; it is constructed once
//! at startup and shared via `Arc`. `authorize` never errors on an ordinary
//! deny. A resolver failure is logged and treated as a deny, never a grant.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::capabilities::{system_capabilities, SystemCapability, SystemRole};
use super::claims::AuthContext;
use crate::config::AuthzConfig;

/// Seam for capability derivation, injectable for tests.
pub trait CapabilityResolver: Send + Sync {
    fn resolve(&self, role: SystemRole) -> anyhow::Result<HashSet<SystemCapability>>;
}

/// Production resolver backed by the static matrix. Infallible.
pub struct MatrixResolver;

impl CapabilityResolver for MatrixResolver {
    fn resolve(&self, role: SystemRole) -> anyhow::Result<HashSet<SystemCapability>> {
        Ok(system_capabilities(role).iter().copied().collect())
    }
}

/// Result of a capability check, returned for grants and denies alike.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityCheck {
    pub granted: bool,
    pub capability: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub context: CheckContext,
}

impl CapabilityCheck {
    /// `None` on a grant, `Some(self)` on a deny, for `if let` call sites.
    pub fn into_denied(self) -> Option<CapabilityCheck> {
        if self.granted {
            None
        } else {
            Some(self)
        }
    }

    /// Turn a deny into the 403 surfaced to clients. The reason stays in the
    /// structured details rather than the message; audit logs already carry
    /// the full decision.
    pub fn into_forbidden(self) -> service_core::error::AppError {
        let detail = service_core::error::ErrorDetail::new(
            "SYSTEM_CAPABILITY_REQUIRED",
            format!("missing capability {}", self.capability),
        )
        .with_details(serde_json::json!({
            "capability": self.capability,
            "reason": self.reason,
        }));
        service_core::error::AppError::Forbidden(detail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckContext {
    pub user_id: Option<Uuid>,
    pub system_role: SystemRole,
    pub timestamp: DateTime<Utc>,
}

struct CacheEntry {
    capabilities: HashSet<SystemCapability>,
    cached_at: Instant,
}

pub struct AuthorizationService {
    resolver: Arc<dyn CapabilityResolver>,
    cache: DashMap<(Uuid, SystemRole), CacheEntry>,
    ttl: Duration,
}

impl AuthorizationService {
    pub fn new(config: &AuthzConfig) -> Self {
        Self::with_resolver(
            Arc::new(MatrixResolver),
            Duration::from_secs(config.cache_ttl_seconds),
        )
    }

    pub fn with_resolver(resolver: Arc<dyn CapabilityResolver>, ttl: Duration) -> Self {
        Self {
            resolver,
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Derive the capability set for `(user_id, role)`, serving from cache
    /// within the TTL.
    pub fn derive_capabilities(
        &self,
        user_id: Uuid,
        role: SystemRole,
    ) -> anyhow::Result<HashSet<SystemCapability>> {
        let key = (user_id, role);

        if let Some(entry) = self.cache.get(&key) {
            if entry.cached_at.elapsed() < self.ttl {
                return Ok(entry.capabilities.clone());
            }
        }

        let started = Instant::now();
        let capabilities = self.resolver.resolve(role)?;
        tracing::debug!(
            subject = %user_id,
            role = %role,
            capability_count = capabilities.len(),
            duration_us = started.elapsed().as_micros() as u64,
            "derived capabilities"
        );

        self.cache.insert(
            key,
            CacheEntry {
                capabilities: capabilities.clone(),
                cached_at: Instant::now(),
            },
        );

        Ok(capabilities)
    }

    /// Check a single capability without producing a full decision record.
    pub fn has_capability(&self, ctx: &AuthContext, capability: SystemCapability) -> bool {
        self.authorize(ctx, capability, None).granted
    }

    /// Evaluate `capability` for the caller. Denies carry a reason; internal
    /// failures deny and are logged for audit reconstruction.
    pub fn authorize(
        &self,
        ctx: &AuthContext,
        capability: SystemCapability,
        resource: Option<&str>,
    ) -> CapabilityCheck {
        let started = Instant::now();
        let context = CheckContext {
            user_id: ctx.user_id,
            system_role: ctx.system_role,
            timestamp: Utc::now(),
        };

        let (granted, reason) = match (ctx.is_authenticated, ctx.user_id) {
            (true, Some(user_id)) => match self.derive_capabilities(user_id, ctx.system_role) {
                Ok(caps) if caps.contains(&capability) => (true, None),
                Ok(_) => (
                    false,
                    Some(format!(
                        "role {} does not grant {}",
                        ctx.system_role, capability
                    )),
                ),
                Err(err) => {
                    tracing::error!(
                        subject = %user_id,
                        role = %ctx.system_role,
                        capability = %capability,
                        error = ?err,
                        "capability resolution failed; denying"
                    );
                    (false, Some("authorization subsystem error".to_string()))
                }
            },
            _ => (false, Some("not authenticated".to_string())),
        };

        tracing::info!(
            subject = ?ctx.user_id,
            role = %ctx.system_role,
            capability = %capability,
            resource = resource.unwrap_or("-"),
            granted,
            duration_us = started.elapsed().as_micros() as u64,
            "authorization decision"
        );

        CapabilityCheck {
            granted,
            capability: capability.as_str().to_string(),
            reason,
            context,
        }
    }

    /// Drop all cached entries for a user. Called on role change.
    pub fn invalidate(&self, user_id: Uuid) {
        self.cache.retain(|(cached_user, _), _| *cached_user != user_id);
    }

    /// Evict entries past the TTL. Returns the number evicted.
    pub fn evict_expired(&self) -> usize {
        let before = self.cache.len();
        let ttl = self.ttl;
        self.cache.retain(|_, entry| entry.cached_at.elapsed() < ttl);
        before - self.cache.len()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Spawn the periodic eviction sweep. The task runs until `shutdown` is
    /// cancelled and never touches request-serving paths.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("capability cache sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = service.evict_expired();
                        if evicted > 0 {
                            tracing::debug!(evicted, "capability cache sweep");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolver that counts invocations, for cache behavior tests.
    struct CountingResolver {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingResolver {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl CapabilityResolver for CountingResolver {
        fn resolve(&self, role: SystemRole) -> anyhow::Result<HashSet<SystemCapability>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("resolver exploded");
            }
            Ok(system_capabilities(role).iter().copied().collect())
        }
    }

    fn admin_ctx() -> AuthContext {
        AuthContext {
            user_id: Some(Uuid::new_v4()),
            email: Some("admin@example.com".to_string()),
            system_role: SystemRole::SiteAdmin,
            is_authenticated: true,
            issued_at: Some(Utc::now().timestamp()),
            expires_at: Some(Utc::now().timestamp() + 3600),
        }
    }

    #[test]
    fn grant_for_site_admin() {
        let service = AuthorizationService::with_resolver(
            CountingResolver::new(false),
            Duration::from_secs(300),
        );
        let check = service.authorize(&admin_ctx(), SystemCapability::ManageClubs, None);
        assert!(check.granted);
        assert!(check.reason.is_none());
        assert_eq!(check.capability, "MANAGE_CLUBS");
    }

    #[test]
    fn deny_for_regular_user_with_reason() {
        let service = AuthorizationService::new(&AuthzConfig {
            cache_ttl_seconds: 300,
            cache_sweep_interval_seconds: 60,
        });
        let mut ctx = admin_ctx();
        ctx.system_role = SystemRole::User;
        let check = service.authorize(&ctx, SystemCapability::ManageClubs, Some("club-123"));
        assert!(!check.granted);
        assert!(check.reason.unwrap().contains("does not grant"));
    }

    #[test]
    fn deny_for_anonymous() {
        let service = AuthorizationService::new(&AuthzConfig {
            cache_ttl_seconds: 300,
            cache_sweep_interval_seconds: 60,
        });
        let check = service.authorize(
            &AuthContext::anonymous(),
            SystemCapability::ViewAllClubs,
            None,
        );
        assert!(!check.granted);
        assert_eq!(check.reason.as_deref(), Some("not authenticated"));
    }

    #[test]
    fn cache_hit_within_ttl_skips_resolver() {
        let resolver = CountingResolver::new(false);
        let service =
            AuthorizationService::with_resolver(resolver.clone(), Duration::from_secs(300));
        let ctx = admin_ctx();

        assert!(service.authorize(&ctx, SystemCapability::ManageClubs, None).granted);
        assert!(service.authorize(&ctx, SystemCapability::ManageUsers, None).granted);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_entry_triggers_fresh_derivation() {
        let resolver = CountingResolver::new(false);
        let service = AuthorizationService::with_resolver(resolver.clone(), Duration::ZERO);
        let ctx = admin_ctx();

        service.authorize(&ctx, SystemCapability::ManageClubs, None);
        service.authorize(&ctx, SystemCapability::ManageClubs, None);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidation_forces_rederivation() {
        let resolver = CountingResolver::new(false);
        let service =
            AuthorizationService::with_resolver(resolver.clone(), Duration::from_secs(300));
        let ctx = admin_ctx();

        service.authorize(&ctx, SystemCapability::ManageClubs, None);
        service.invalidate(ctx.user_id.unwrap());
        service.authorize(&ctx, SystemCapability::ManageClubs, None);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolver_failure_denies_not_grants() {
        let service = AuthorizationService::with_resolver(
            CountingResolver::new(true),
            Duration::from_secs(300),
        );
        let check = service.authorize(&admin_ctx(), SystemCapability::ManageClubs, None);
        assert!(!check.granted);
        assert_eq!(
            check.reason.as_deref(),
            Some("authorization subsystem error")
        );
    }

    #[test]
    fn sweep_evicts_expired_entries() {
        let service = AuthorizationService::with_resolver(
            CountingResolver::new(false),
            Duration::ZERO,
        );
        let ctx = admin_ctx();
        service.authorize(&ctx, SystemCapability::ManageClubs, None);
        assert_eq!(service.cached_entries(), 1);
        assert_eq!(service.evict_expired(), 1);
        assert_eq!(service.cached_entries(), 0);
    }

    #[tokio::test]
    async fn sweeper_task_stops_on_cancellation() {
        let service = Arc::new(AuthorizationService::with_resolver(
            CountingResolver::new(false),
            Duration::from_secs(300),
        ));
        let token = CancellationToken::new();
        let handle = service.spawn_sweeper(Duration::from_millis(5), token.clone());
        token.cancel();
        handle.await.unwrap();
    }
}
