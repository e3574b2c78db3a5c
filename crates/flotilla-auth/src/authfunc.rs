//! Per-call authorization predicates and their factories.
//!
//! An [`AuthFunc`] decides, for one batched RPC call, whether the current
//! principal may act on a given target tag. Factories are invoked once per
//! method call (never once per batch item) because a factory may perform
//! one backend lookup whose result is invariant across the items of a call
//! but not across calls.

use std::sync::Arc;

use flotilla_core::Error;
use flotilla_core::StateBackend;
use flotilla_core::Tag;
use flotilla_core::TagKind;
use flotilla_core::UnitEntity;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::principal::Authorizer;

/// A pure predicate over target tags, valid for one batched call.
pub type AuthFunc = Arc<dyn Fn(&Tag) -> bool + Send + Sync>;

/// Builds the per-call predicate. Building can fail when the factory must
/// consult the backend and that lookup fails.
pub type AuthFuncFactory = Arc<dyn Fn() -> BoxFuture<'static, Result<AuthFunc, Error>> + Send + Sync>;

/// Constant predicate, for endpoints open to any authenticated caller (or
/// closed to all).
pub fn auth_always(allow: bool) -> AuthFunc {
    Arc::new(move |_| allow)
}

/// Allow exactly the principal's own tag.
pub fn auth_owner(authorizer: &Authorizer) -> AuthFunc {
    let authorizer = authorizer.clone();
    Arc::new(move |tag| authorizer.auth_owner(tag))
}

/// Allow any tag of the given kind, without ownership restriction. Used by
/// environment-manager endpoints that may touch any machine.
pub fn auth_for_tag_kind(kind: TagKind) -> AuthFunc {
    Arc::new(move |tag| tag.kind() == kind)
}

/// Union of two predicates.
pub fn auth_either(a: AuthFunc, b: AuthFunc) -> AuthFunc {
    Arc::new(move |tag| a(tag) || b(tag))
}

/// Wrap an already-built predicate as a factory. For predicates composed
/// from pure parts (kind unions and the like) that need no backend lookup.
pub fn factory_const(func: AuthFunc) -> AuthFuncFactory {
    Arc::new(move || {
        let func = Arc::clone(&func);
        async move { Ok(func) }.boxed()
    })
}

/// Factory returning a constant predicate.
pub fn factory_always(allow: bool) -> AuthFuncFactory {
    Arc::new(move || {
        let func = auth_always(allow);
        async move { Ok(func) }.boxed()
    })
}

/// Factory returning the owner predicate.
pub fn factory_owner(authorizer: &Authorizer) -> AuthFuncFactory {
    let authorizer = authorizer.clone();
    Arc::new(move || {
        let func = auth_owner(&authorizer);
        async move { Ok(func) }.boxed()
    })
}

/// Factory returning a kind predicate.
pub fn factory_for_tag_kind(kind: TagKind) -> AuthFuncFactory {
    Arc::new(move || {
        let func = auth_for_tag_kind(kind);
        async move { Ok(func) }.boxed()
    })
}

/// Factory for unit agents: allow the agent's own unit tag OR the tag of
/// the service that owns the unit.
///
/// The owning service is resolved from the backend on every invocation;
/// non-unit principals are rejected outright.
pub fn factory_unit_or_owning_service(authorizer: &Authorizer, state: Arc<dyn StateBackend>) -> AuthFuncFactory {
    let authorizer = authorizer.clone();
    Arc::new(move || {
        let authorizer = authorizer.clone();
        let state = Arc::clone(&state);
        async move {
            let own = authorizer.auth_tag().clone();
            let name = match own.unit_name() {
                Some(name) if authorizer.auth_unit_agent() => name,
                _ => return Err(Error::PermissionDenied),
            };
            let unit = state.unit(&name).await?;
            let service_tag = Tag::service(unit.service_name());
            Ok(auth_either(
                auth_owner(&authorizer),
                Arc::new(move |tag: &Tag| *tag == service_tag),
            ))
        }
        .boxed()
    })
}

#[cfg(test)]
mod tests {
    use flotilla_core::test_support::MemoryState;

    use super::*;
    use crate::principal::Principal;

    fn unit_agent(name: &str) -> Authorizer {
        Authorizer::new(Principal::UnitAgent { tag: Tag::unit(name) })
    }

    #[test]
    fn always_and_kind_predicates() {
        assert!(auth_always(true)(&Tag::machine("0")));
        assert!(!auth_always(false)(&Tag::machine("0")));

        let machines = auth_for_tag_kind(TagKind::Machine);
        assert!(machines(&Tag::machine("3")));
        assert!(!machines(&Tag::unit("wordpress/0")));
    }

    #[test]
    fn either_is_a_union() {
        let combined = auth_either(auth_for_tag_kind(TagKind::Unit), auth_for_tag_kind(TagKind::Service));
        assert!(combined(&Tag::unit("wordpress/0")));
        assert!(combined(&Tag::service("mysql")));
        assert!(!combined(&Tag::machine("0")));
    }

    #[tokio::test]
    async fn owner_factory_allows_only_self() {
        let auth = unit_agent("wordpress/0");
        let func = factory_owner(&auth)().await.unwrap();
        assert!(func(&Tag::unit("wordpress/0")));
        assert!(!func(&Tag::unit("mysql/0")));
    }

    #[tokio::test]
    async fn unit_or_owning_service_allows_both() {
        let state = MemoryState::new();
        state.add_service("wordpress");
        state.add_unit("wordpress", "wordpress/0", None);

        let auth = unit_agent("wordpress/0");
        let factory = factory_unit_or_owning_service(&auth, Arc::new(state));
        let func = factory().await.unwrap();
        assert!(func(&Tag::unit("wordpress/0")));
        assert!(func(&Tag::service("wordpress")));
        assert!(!func(&Tag::service("mysql")));
        assert!(!func(&Tag::unit("wordpress/1")));
    }

    #[tokio::test]
    async fn unit_or_owning_service_fails_when_unit_is_gone() {
        let state = MemoryState::new();
        let auth = unit_agent("wordpress/0");
        let factory = factory_unit_or_owning_service(&auth, Arc::new(state));
        let err = factory().await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn unit_or_owning_service_rejects_non_unit_principals() {
        let state = MemoryState::new();
        let auth = Authorizer::new(Principal::MachineAgent {
            tag: Tag::machine("0"),
            manager: false,
        });
        let factory = factory_unit_or_owning_service(&auth, Arc::new(state));
        let err = factory().await.err().unwrap();
        assert!(err.is_permission_denied());
    }
}
