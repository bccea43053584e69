//! Batch orderer
//!
//! Sorts a set of change records into a sequence that never applies a
//! child before its parent exists and never deletes a parent before its
//! children are gone. Creates and updates run in ascending priority,
//! deletes in descending priority (the mirror ordering). The sort is
//! stable, so same-priority records keep their diff-emission order.
//!
//! A mixed batch places all deletes after all creates and updates;
//! callers that need deletes first compose the sub-batches themselves and
//! order each one separately.
//!
//! Deletes addressing the same ordered list are additionally sorted by
//! descending index: removing higher positions first leaves the lower
//! positions valid, so diff output may carry indices as they were at
//! batch start without accounting for same-pass removals.
//!
//! Duplicate records are a caller bug. The orderer never deduplicates;
//! the conflict surfaces when the control plane rejects the second call.

use super::change::{Change, ChangeOp, Position};

/// Sort a batch into a safe execution sequence
pub fn order(changes: &mut [Box<dyn Change>]) {
    changes.sort_by(|a, b| sort_key(a.as_ref()).cmp(&sort_key(b.as_ref())));
}

fn sort_key(change: &dyn Change) -> (u8, i16, i64) {
    match change.op() {
        ChangeOp::Create | ChangeOp::Update => (0, change.priority() as i16, 0),
        ChangeOp::Delete => {
            let index_rank = match change.position() {
                Some(Position::Index(index)) => -(*index as i64),
                _ => 0,
            };
            (1, -(change.priority() as i16), index_rank)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::catalog;
    use crate::apply::change::ParentRef;
    use crate::models;

    fn create_backend(name: &str) -> Box<dyn Change> {
        catalog::backend(
            ChangeOp::Create,
            name,
            Some(models::Backend {
                name: name.to_string(),
                ..Default::default()
            }),
        )
    }

    fn create_server(backend: &str, name: &str) -> Box<dyn Change> {
        catalog::server(
            ChangeOp::Create,
            backend,
            name,
            Some(models::Server {
                name: name.to_string(),
                address: "10.0.0.1".to_string(),
                ..Default::default()
            }),
        )
    }

    fn create_acl(backend: &str, name: &str, index: usize) -> Box<dyn Change> {
        catalog::acl(
            ChangeOp::Create,
            ParentRef::backend(backend),
            index,
            Some(models::Acl {
                acl_name: name.to_string(),
                criterion: "method".to_string(),
                value: Some("GET".to_string()),
            }),
        )
    }

    fn elements(changes: &[Box<dyn Change>]) -> Vec<&'static str> {
        changes.iter().map(|c| c.element()).collect()
    }

    #[test]
    fn test_parents_precede_children_for_creates() {
        // Emitted child-first on purpose
        let mut batch = vec![
            create_acl("api", "is_get", 0),
            create_server("api", "web1"),
            create_backend("api"),
        ];
        order(&mut batch);
        assert_eq!(elements(&batch), vec!["backend", "server", "acl"]);
    }

    #[test]
    fn test_deletes_mirror_the_create_order() {
        let mut batch = vec![
            catalog::backend(ChangeOp::Delete, "api", None),
            catalog::acl(ChangeOp::Delete, ParentRef::backend("api"), 0, None),
            catalog::server(ChangeOp::Delete, "api", "web1", None),
        ];
        order(&mut batch);
        assert_eq!(elements(&batch), vec!["acl", "server", "backend"]);
    }

    #[test]
    fn test_mixed_batch_defers_deletes() {
        let mut batch = vec![
            catalog::server(ChangeOp::Delete, "api", "old", None),
            create_backend("api"),
            create_server("api", "web1"),
        ];
        order(&mut batch);
        assert_eq!(elements(&batch), vec!["backend", "server", "server"]);
        assert_eq!(batch[2].op(), ChangeOp::Delete);
    }

    #[test]
    fn test_same_priority_keeps_emission_order() {
        let mut batch = vec![
            create_acl("api", "first", 0),
            create_acl("api", "second", 1),
            create_acl("api", "third", 2),
        ];
        order(&mut batch);
        let described: Vec<String> = batch.iter().map(|c| c.describe()).collect();
        assert!(described[0].contains("first"));
        assert!(described[1].contains("second"));
        assert!(described[2].contains("third"));
    }

    #[test]
    fn test_indexed_deletes_run_highest_index_first() {
        let mut batch = vec![
            catalog::acl(ChangeOp::Delete, ParentRef::backend("api"), 1, None),
            catalog::acl(ChangeOp::Delete, ParentRef::backend("api"), 4, None),
            catalog::acl(ChangeOp::Delete, ParentRef::backend("api"), 2, None),
        ];
        order(&mut batch);
        let positions: Vec<usize> = batch
            .iter()
            .map(|c| c.position().unwrap().index().unwrap())
            .collect();
        assert_eq!(positions, vec![4, 2, 1]);
    }

    #[test]
    fn test_updates_share_the_create_ordering() {
        let mut batch = vec![
            catalog::server(
                ChangeOp::Update,
                "api",
                "web1",
                Some(models::Server {
                    name: "web1".to_string(),
                    address: "10.0.0.1".to_string(),
                    ..Default::default()
                }),
            ),
            catalog::backend(
                ChangeOp::Update,
                "api",
                Some(models::Backend {
                    name: "api".to_string(),
                    ..Default::default()
                }),
            ),
        ];
        order(&mut batch);
        assert_eq!(elements(&batch), vec!["backend", "server"]);
    }

    #[test]
    fn test_linked_sections_created_before_proxies() {
        let mut batch = vec![
            create_backend("api"),
            catalog::resolver(
                ChangeOp::Create,
                "dns",
                Some(models::Resolver {
                    name: "dns".to_string(),
                    ..Default::default()
                }),
            ),
        ];
        order(&mut batch);
        assert_eq!(elements(&batch), vec!["resolver", "backend"]);
    }
}
