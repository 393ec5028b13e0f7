//! Client-side join between records and the child records that reference them.
//!
//! The backend has no aggregate queries, so the dashboard fetches both collections and sums the
//! children here. Everything in this module is pure: no I/O, no errors, no shared state.

use std::collections::HashMap;
use std::ops::Deref;

use serde::Serialize;

use crate::model::Record;

/// A child record contributing an amount to the parent it references.
pub trait Contribution {
    /// Id of the parent this record points at. It may not match any known parent.
    fn parent_id(&self) -> &str;

    /// The amount contributed, `None` when the record carries no value.
    fn amount(&self) -> Option<i64>;
}

impl<T: Contribution> Contribution for &T {
    fn parent_id(&self) -> &str {
        (*self).parent_id()
    }

    fn amount(&self) -> Option<i64> {
        (*self).amount()
    }
}

/// A record together with the sum of everything its children contributed.
///
/// Serializes as the record's own fields plus `aggregateCount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enriched<P> {
    #[serde(flatten)]
    pub record: P,
    pub aggregate_count: i64,
}

impl<P> Enriched<P> {
    pub fn into_inner(self) -> P {
        self.record
    }
}

impl<P> Deref for Enriched<P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

/// Sum the amounts of `children` per parent id. Missing amounts count as zero.
pub fn totals<C: Contribution>(children: &[C]) -> HashMap<&str, i64> {
    let mut totals: HashMap<&str, i64> = HashMap::new();

    for child in children {
        let total = totals.entry(child.parent_id()).or_default();
        *total = total.saturating_add(child.amount().unwrap_or_default());
    }

    totals
}

/// Attach to every parent the total of the children referencing it, keeping the parents' order.
///
/// Children pointing at unknown parents are ignored. Parents without children get `0`.
/// Duplicate parent ids are enriched independently with the same total.
pub fn aggregate<P, C>(parents: impl IntoIterator<Item = P>, children: &[C]) -> Vec<Enriched<P>>
where
    P: Record,
    C: Contribution,
{
    let totals = totals(children);

    parents
        .into_iter()
        .map(|record| {
            let aggregate_count = totals.get(record.id()).copied().unwrap_or_default();
            Enriched {
                record,
                aggregate_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Post, Turd};

    fn posts(ids: &[&str]) -> Vec<Post> {
        ids.iter().map(|id| Post::new(id.to_string(), "u1".into())).collect()
    }

    fn turd(post_id: &str, count: Option<i64>) -> Turd {
        Turd::new(post_id.into(), count)
    }

    fn counts(enriched: &[Enriched<Post>]) -> Vec<(&str, i64)> {
        enriched
            .iter()
            .map(|e| (e.id.as_str(), e.aggregate_count))
            .collect()
    }

    #[test]
    fn sums_children_per_parent() {
        let parents = posts(&["a", "b"]);
        let children = vec![
            turd("a", Some(3)),
            turd("a", Some(2)),
            turd("b", Some(0)),
            turd("z", Some(99)),
        ];

        let enriched = aggregate(parents, &children);
        assert_eq!(counts(&enriched), vec![("a", 5), ("b", 0)], "`z` matches no parent and should be ignored");
    }

    #[test]
    fn missing_count_is_zero() {
        let enriched = aggregate(posts(&["a"]), &[turd("a", None)]);
        assert_eq!(counts(&enriched), vec![("a", 0)]);
    }

    #[test]
    fn no_children_gives_zero_everywhere() {
        let enriched = aggregate(posts(&["a", "b", "c"]), &Vec::<Turd>::new());
        assert!(enriched.iter().all(|e| e.aggregate_count == 0));
        assert_eq!(enriched.len(), 3);
    }

    #[test]
    fn unrelated_children_give_zero_everywhere() {
        let children = vec![turd("x", Some(4)), turd("y", Some(7))];
        let enriched = aggregate(posts(&["a", "b"]), &children);
        assert_eq!(counts(&enriched), vec![("a", 0), ("b", 0)]);
    }

    #[test]
    fn empty_parents_give_empty_output() {
        let enriched = aggregate(Vec::<Post>::new(), &[turd("a", Some(1))]);
        assert!(enriched.is_empty());
    }

    #[test]
    fn preserves_parent_order() {
        let parents = posts(&["c", "a", "b"]);
        let children = vec![turd("b", Some(1)), turd("c", Some(2)), turd("a", Some(3))];

        let enriched = aggregate(parents.clone(), &children);
        let ids: Vec<&str> = enriched.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        let records: Vec<Post> = enriched.into_iter().map(Enriched::into_inner).collect();
        assert_eq!(records, parents, "enrichment must not touch the records themselves");
    }

    #[test]
    fn duplicate_parents_share_the_total() {
        let enriched = aggregate(posts(&["a", "a"]), &[turd("a", Some(2)), turd("a", Some(2))]);
        assert_eq!(counts(&enriched), vec![("a", 4), ("a", 4)]);
    }

    #[test]
    fn negative_counts_pass_through() {
        let enriched = aggregate(posts(&["a"]), &[turd("a", Some(5)), turd("a", Some(-7))]);
        assert_eq!(counts(&enriched), vec![("a", -2)]);
    }

    #[test]
    fn is_idempotent() {
        let parents = posts(&["a", "b"]);
        let children = vec![turd("a", Some(1)), turd("b", Some(2)), turd("a", None)];

        let first = aggregate(&parents, &children);
        let second = aggregate(&parents, &children);
        assert_eq!(first, second);
    }

    #[test]
    fn serializes_flat_with_aggregate_count() {
        let enriched = aggregate(posts(&["a"]), &[turd("a", Some(3))]);
        let json = serde_json::to_value(&enriched[0]).unwrap();

        assert_eq!(json["id"], "a");
        assert_eq!(json["creatorId"], "u1");
        assert_eq!(json["aggregateCount"], 3);
    }
}
