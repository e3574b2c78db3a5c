//! Batched multi-entity operation protocol.
//!
//! Every facade method of the form `op(entities) -> results` follows the
//! same discipline:
//!
//! 1. the AuthFunc is built once for the call; if that fails the whole
//!    call fails, since the predicate itself is unusable;
//! 2. each input tag is evaluated independently: parse, authorize, then
//!    operate. Authorization runs before any backend lookup, so an
//!    unauthorized caller sees `PermissionDenied` whether or not the
//!    entity exists;
//! 3. the result has exactly one slot per input tag, in input order, even
//!    when every slot is an error.

use std::future::Future;

use flotilla_auth::AuthFunc;
use flotilla_core::Error;
use flotilla_core::Tag;

/// Run one batched operation over `tags`, returning one slot per tag in
/// input order.
///
/// `op` is only invoked for tags that parse and pass the AuthFunc; its
/// errors land in the corresponding slot.
pub async fn run_batch<T, F, Fut>(tags: &[String], auth: &AuthFunc, mut op: F) -> Vec<Result<T, Error>>
where
    F: FnMut(Tag) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut results = Vec::with_capacity(tags.len());
    for raw in tags {
        let slot = match Tag::parse(raw) {
            Err(err) => Err(err),
            Ok(tag) if !auth(&tag) => Err(Error::PermissionDenied),
            Ok(tag) => op(tag).await,
        };
        results.push(slot);
    }
    results
}

/// Aggregate per-item destroy failures into one human-readable error.
///
/// Convenience commands prefer an all-or-nothing summary over per-item
/// slots: `"no <things> were destroyed: ..."` when every item failed,
/// `"some <things> were not destroyed: ..."` when only a subset did.
pub fn aggregate_destroy_errors(things: &str, total: usize, errors: Vec<String>) -> Result<(), Error> {
    if errors.is_empty() {
        return Ok(());
    }
    let joined = errors.join("; ");
    let reason = if errors.len() == total {
        format!("no {things} were destroyed: {joined}")
    } else {
        format!("some {things} were not destroyed: {joined}")
    };
    Err(Error::backend(reason))
}

#[cfg(test)]
mod tests {
    use flotilla_auth::auth_always;
    use flotilla_auth::auth_owner;
    use flotilla_auth::Authorizer;
    use flotilla_auth::Principal;

    use super::*;

    #[tokio::test]
    async fn one_slot_per_tag_in_input_order() {
        let auth = auth_always(true);
        let tags = vec!["machine-1".to_string(), "bogus".to_string(), "machine-0".to_string()];
        let results = run_batch(&tags, &auth, |tag| async move { Ok(tag.to_string()) }).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref().unwrap(), "machine-1");
        assert!(matches!(results[1], Err(Error::InvalidTag { .. })));
        assert_eq!(results[2].as_deref().unwrap(), "machine-0");
    }

    #[tokio::test]
    async fn unauthorized_tags_are_denied_without_lookup() {
        let authorizer = Authorizer::new(Principal::UnitAgent {
            tag: Tag::unit("wordpress/0"),
        });
        let auth = auth_owner(&authorizer);
        let tags = vec!["unit-wordpress-0".to_string(), "unit-mysql-0".to_string()];

        let results = run_batch(&tags, &auth, |tag| async move {
            // Pretend the entity does not exist; the unauthorized slot
            // must still read PermissionDenied, not NotFound.
            if tag == Tag::unit("wordpress/0") {
                Ok("ok")
            } else {
                Err(Error::not_found("should never be reached"))
            }
        })
        .await;

        assert!(results[0].is_ok());
        assert_eq!(results[1], Err(Error::PermissionDenied));
    }

    #[test]
    fn aggregate_none_failed() {
        assert!(aggregate_destroy_errors("machines", 3, vec![]).is_ok());
    }

    #[test]
    fn aggregate_some_failed() {
        let err = aggregate_destroy_errors(
            "machines",
            3,
            vec![
                "machine 0 has unit \"wordpress/0\" assigned".to_string(),
                "machine 1 is required by the environment".to_string(),
            ],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "some machines were not destroyed: machine 0 has unit \"wordpress/0\" assigned; machine 1 is required by the environment"
        );
    }

    #[test]
    fn aggregate_all_failed() {
        let err = aggregate_destroy_errors("units", 1, vec!["unit mysql/0 not found".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "no units were destroyed: unit mysql/0 not found");
    }
}
