//! Property-based tests for the retention policy and deletion plan.
//!
//! These tests verify the run invariants across many randomly generated
//! repositories: decisions partition the tag set, the keep-count floor is
//! unconditional, the age rule is exact, and no digest is ever scheduled
//! for deletion while a kept tag still references it.

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::{Action, DeletionPlan, ManifestKind, Reason, RetentionPolicy, Tag};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Strategy for a repository's worth of tags: unique names, digests drawn
/// from a small pool so aliasing actually occurs, ages spread around the
/// thresholds under test.
fn tags_strategy() -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::hash_set("[a-z][a-z0-9-]{1,8}", 0..24).prop_flat_map(|names| {
        let names: Vec<String> = names.into_iter().collect();
        let len = names.len();
        (
            Just(names),
            prop::collection::vec(0u8..6, len),
            prop::collection::vec(0i64..120, len),
        )
            .prop_map(|(names, digest_ids, ages_days)| {
                names
                    .into_iter()
                    .zip(digest_ids)
                    .zip(ages_days)
                    .map(|((name, digest_id), age)| {
                        Tag::new(
                            name,
                            format!("sha256:{digest_id:02}"),
                            ManifestKind::Single,
                            base_time() - Duration::days(age),
                        )
                    })
                    .collect()
            })
    })
}

proptest! {
    #[test]
    fn decisions_partition_the_tag_set(
        tags in tags_strategy(),
        keep_count in 0usize..12,
        max_age_days in 0u32..90,
    ) {
        let policy = RetentionPolicy::new(keep_count, max_age_days);
        let decisions = policy.evaluate(base_time(), &tags);

        prop_assert_eq!(decisions.len(), tags.len());

        let input_names: HashSet<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        let decided_names: HashSet<&str> =
            decisions.iter().map(|d| d.tag.name.as_str()).collect();
        prop_assert_eq!(decided_names.len(), decisions.len(), "a tag was decided twice");
        prop_assert_eq!(input_names, decided_names);
    }

    #[test]
    fn keep_count_floor_is_unconditional(
        tags in tags_strategy(),
        keep_count in 0usize..12,
        max_age_days in 0u32..90,
    ) {
        let policy = RetentionPolicy::new(keep_count, max_age_days);
        let decisions = policy.evaluate(base_time(), &tags);

        for decision in decisions.iter().take(keep_count) {
            prop_assert_eq!(decision.action, Action::Keep);
            prop_assert_eq!(decision.reason, Reason::WithinKeepCount);
        }
    }

    #[test]
    fn age_rule_is_exact_beyond_the_floor(
        tags in tags_strategy(),
        keep_count in 0usize..12,
        max_age_days in 0u32..90,
    ) {
        let now = base_time();
        let policy = RetentionPolicy::new(keep_count, max_age_days);
        let decisions = policy.evaluate(now, &tags);

        for decision in decisions.iter().skip(keep_count) {
            let aged_out = now.signed_duration_since(decision.tag.created_at)
                > Duration::days(i64::from(max_age_days));
            if aged_out {
                prop_assert_eq!(decision.action, Action::Delete);
                prop_assert_eq!(decision.reason, Reason::AgedOut);
            } else {
                prop_assert_eq!(decision.action, Action::Keep);
                prop_assert_eq!(decision.reason, Reason::WithinAge);
            }
        }
    }

    #[test]
    fn no_digest_is_deleted_while_referenced_by_a_kept_tag(
        tags in tags_strategy(),
        keep_count in 0usize..12,
        max_age_days in 0u32..90,
    ) {
        let policy = RetentionPolicy::new(keep_count, max_age_days);
        let plan = DeletionPlan::build(policy.evaluate(base_time(), &tags));

        let kept_digests: HashSet<&str> = plan
            .decisions
            .iter()
            .filter(|d| d.action == Action::Keep)
            .map(|d| d.tag.digest.as_str())
            .collect();

        for digest in &plan.digests {
            prop_assert!(!kept_digests.contains(digest.as_str()));
        }

        // The plan never drops or duplicates a decision either.
        prop_assert_eq!(plan.decisions.len(), tags.len());
    }
}
