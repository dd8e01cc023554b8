//! Property-based tests for canonicalization and identity resolution.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Canonicalization is total, idempotent, and scheme/case-invariant
//! - Identity resolution is idempotent
//! - Merging preserves the total repost count

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use dejavu::models::Identity;
use dejavu::services::{AliasResolver, RepostCounter, UrlCanonicalizer};
use proptest::prelude::*;

fn canonicalizer() -> UrlCanonicalizer {
    UrlCanonicalizer::new(["twitter.com", "x.com", "twimg.com", "nytimes.com"])
}

proptest! {
    /// Property: canonicalization never panics and always yields lowercase
    /// scheme/host output for parseable URLs.
    #[test]
    fn prop_canonicalize_total(raw in "\\PC{0,80}") {
        let c = canonicalizer();
        let _ = c.canonicalize(&raw);
    }

    /// Property: http and https forms of the same URL canonicalize
    /// identically.
    #[test]
    fn prop_scheme_invariant(host in "[a-z]{1,10}\\.(com|org|net)", path in "[a-z0-9/]{0,20}") {
        let c = canonicalizer();
        let http = c.canonicalize(&format!("http://{host}/{path}"));
        let https = c.canonicalize(&format!("https://{host}/{path}"));
        prop_assert_eq!(http, https);
    }

    /// Property: host and path case never affects the canonical form.
    #[test]
    fn prop_case_invariant(host in "[a-z]{1,10}\\.com", path in "[a-zA-Z0-9/]{0,20}") {
        let c = canonicalizer();
        let lower = c.canonicalize(&format!("http://{host}/{}", path.to_lowercase()));
        let mixed = c.canonicalize(&format!("http://{}/{path}", host.to_uppercase()));
        prop_assert_eq!(lower, mixed);
    }

    /// Property: canonicalization is idempotent — re-canonicalizing the
    /// canonical form changes nothing.
    #[test]
    fn prop_canonicalize_idempotent(host in "[a-z]{1,10}\\.com", path in "[a-z0-9/]{0,20}", query in "[a-z0-9=&]{0,15}") {
        let c = canonicalizer();
        let once = c.canonicalize(&format!("https://{host}/{path}?{query}"));
        let twice = c.canonicalize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    /// Property: for ignore-params domains the query never matters.
    #[test]
    fn prop_ignored_domain_query_stripped(query in "[a-z0-9=&]{1,20}") {
        let c = canonicalizer();
        let with = c.canonicalize(&format!("https://x.com/post/1?{query}"));
        let without = c.canonicalize("https://x.com/post/1");
        prop_assert_eq!(with, without);
    }

    /// Property: `resolve` is idempotent regardless of the merge history.
    #[test]
    fn prop_resolve_idempotent(
        names in proptest::collection::vec("[a-z]{1,8}", 2..8),
        merges in proptest::collection::vec((0usize..8, 0usize..8), 0..6),
    ) {
        let mut resolver = AliasResolver::new();
        for (p, a) in merges {
            let primary = &names[p % names.len()];
            let alias = &names[a % names.len()];
            // Conflicting merges are expected to fail; that is fine here.
            let _ = resolver.merge(primary, alias);
        }
        for name in &names {
            let once = resolver.resolve(name);
            let twice = resolver.resolve(once.as_str());
            prop_assert_eq!(once, twice);
        }
    }

    /// Property: after a successful merge, both names resolve identically.
    #[test]
    fn prop_merge_unifies(primary in "[a-z]{1,8}", alias in "[a-z]{1,8}") {
        let mut resolver = AliasResolver::new();
        if resolver.merge(&primary, &alias).is_ok() {
            prop_assert_eq!(resolver.resolve(&primary), resolver.resolve(&alias));
        } else {
            // Only equivalent names are rejected.
            prop_assert_eq!(Identity::new(&primary), Identity::new(&alias));
        }
    }

    /// Property: folding counts preserves the total sum.
    #[test]
    fn prop_fold_preserves_sum(
        charges in proptest::collection::vec("[a-c]{1}", 1..30),
    ) {
        let mut counter = RepostCounter::new();
        for name in &charges {
            counter.increment(&Identity::new(name));
        }
        let total_before: u64 = counter.entries().iter().map(|(_, c)| *c).sum();

        counter.fold(&Identity::new("a"), &Identity::new("z"));
        counter.fold(&Identity::new("b"), &Identity::new("z"));

        let total_after: u64 = counter.entries().iter().map(|(_, c)| *c).sum();
        prop_assert_eq!(total_before, total_after);
    }

    /// Property: `top(n)` returns at most `n` entries in non-increasing
    /// order.
    #[test]
    fn prop_top_bounded_and_sorted(
        charges in proptest::collection::vec("[a-f]{1}", 0..40),
        n in 0usize..10,
    ) {
        let mut counter = RepostCounter::new();
        for name in &charges {
            counter.increment(&Identity::new(name));
        }

        let top = counter.top(n);
        prop_assert!(top.len() <= n);
        for pair in top.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }
}
