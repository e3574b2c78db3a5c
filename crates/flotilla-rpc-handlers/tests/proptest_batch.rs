//! Property-based tests for the batched-operation protocol.
//!
//! Invariants:
//! - every batch of N input tags yields exactly N slots, in input order,
//!   whatever the mix of valid, invalid and unauthorized tags;
//! - unauthorized slots always read PermissionDenied, even for absent
//!   entities.

use flotilla_auth::auth_for_tag_kind;
use flotilla_core::Error;
use flotilla_core::Tag;
use flotilla_core::TagKind;
use flotilla_rpc_core::run_batch;
use proptest::prelude::*;

/// Generate a mix of machine tags (authorized), unit tags (unauthorized
/// for the machine-kind predicate) and strings that do not parse at all.
fn any_tag_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9]{1,3}".prop_map(|id| format!("machine-{id}")),
        "[a-z]{3,10}-[0-9]{1,2}".prop_map(|id| format!("unit-{id}")),
        "[a-z]{1,12}".prop_map(|junk| junk),
        Just("machine-".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// One slot per input tag, in input order, for any batch.
    #[test]
    fn batch_has_one_slot_per_tag_in_order(tags in prop::collection::vec(any_tag_string(), 0..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let auth = auth_for_tag_kind(TagKind::Machine);
            let results = run_batch(&tags, &auth, |tag| async move { Ok(tag.to_string()) }).await;

            prop_assert_eq!(results.len(), tags.len());
            for (raw, slot) in tags.iter().zip(&results) {
                match Tag::parse(raw) {
                    Err(_) => prop_assert!(matches!(slot, Err(Error::InvalidTag { .. })), "slot should be InvalidTag"),
                    Ok(tag) if tag.kind() == TagKind::Machine => {
                        // The op echoes the canonical tag back into its slot.
                        prop_assert_eq!(slot.as_ref().unwrap(), &tag.to_string());
                    }
                    Ok(_) => prop_assert!(matches!(slot, Err(Error::PermissionDenied))),
                }
            }
            Ok(())
        })?;
    }
}
