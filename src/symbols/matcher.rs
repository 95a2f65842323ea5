/// Trailer of the function Boost.Test generates for every auto-registered
/// test case: `BOOST_AUTO_TEST_CASE(Name)` declares `struct Name` with a
/// `test_method` member, nested in the namespaces of its enclosing suites.
pub const TEST_METHOD_SUFFIX: &str = "::test_method";

pub const SCOPE_SEPARATOR: &str = "::";

/// Whether `candidate` is the test body of `test_name` registered under
/// `suite_path`, i.e. reads `Suite0::Suite1::...::TestName...::test_method`.
///
/// Every segment must sit exactly at the scan position; nothing is skipped
/// and nothing is searched for. Bytes after the test name are not inspected.
pub fn is_strong_match<S: AsRef<str>>(candidate: &str, suite_path: &[S], test_name: &str) -> bool {
    if !candidate.ends_with(TEST_METHOD_SUFFIX) {
        return false;
    }

    let mut rest = candidate;
    for suite in suite_path {
        rest = match rest
            .strip_prefix(suite.as_ref())
            .and_then(|r| r.strip_prefix(SCOPE_SEPARATOR))
        {
            Some(r) => r,
            None => return false,
        };
    }

    rest.starts_with(test_name)
}

/// Fallback for programmatically registered tests: the symbol is the bare
/// free function the test case was built from.
pub fn is_weak_match(candidate: &str, test_name: &str) -> bool {
    candidate == test_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_auto_registered_case_matches() {
        assert!(is_strong_match("Suite::Alpha::test_method", &["Suite"], "Alpha"));
        assert!(is_strong_match(
            "Outer::Inner::Alpha::test_method",
            &["Outer", "Inner"],
            "Alpha"
        ));
    }

    #[test]
    fn test_top_level_case_matches_with_empty_path() {
        let empty: [&str; 0] = [];
        assert!(is_strong_match("Alpha::test_method", &empty, "Alpha"));
    }

    #[test]
    fn test_requires_suffix() {
        assert!(!is_strong_match("Suite::Alpha", &["Suite"], "Alpha"));
        assert!(!is_strong_match("Suite::Alpha::test_method2", &["Suite"], "Alpha"));
        assert!(!is_strong_match("Suite::Alpha::test_method()", &["Suite"], "Alpha"));
    }

    #[test]
    fn test_anchored_at_start() {
        assert!(!is_strong_match("ns::Suite::Alpha::test_method", &["Suite"], "Alpha"));
        assert!(!is_strong_match(" Suite::Alpha::test_method", &["Suite"], "Alpha"));
    }

    #[test]
    fn test_segments_must_be_contiguous() {
        assert!(!is_strong_match("Suite:: Alpha::test_method", &["Suite"], "Alpha"));
        assert!(!is_strong_match("Suite:Alpha::test_method", &["Suite"], "Alpha"));
        assert!(!is_strong_match("SuiteX::Alpha::test_method", &["Suite"], "Alpha"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!is_strong_match("suite::Alpha::test_method", &["Suite"], "Alpha"));
        assert!(!is_strong_match("Suite::alpha::test_method", &["Suite"], "Alpha"));
    }

    #[test]
    fn test_test_name_need_not_end_at_scope() {
        // Only the start of the test name is anchored.
        assert!(is_strong_match("Suite::AlphaBeta::test_method", &["Suite"], "Alpha"));
    }

    #[test]
    fn test_weak_match_is_exact_equality() {
        assert!(is_weak_match("Alpha", "Alpha"));
        assert!(!is_weak_match("Alpha ", "Alpha"));
        assert!(!is_weak_match("Suite::Alpha", "Alpha"));
        assert!(!is_weak_match("alpha", "Alpha"));
    }

    fn qualified(path: &[String], test: &str, trailer: &str) -> String {
        let mut name = String::new();
        for suite in path {
            name.push_str(suite);
            name.push_str(SCOPE_SEPARATOR);
        }
        name.push_str(test);
        name.push_str(TEST_METHOD_SUFFIX);
        name.push_str(trailer);
        name
    }

    fn suite_paths() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set("Suite[A-Z][a-z0-9]{0,5}", 1..5)
            .prop_map(|set| set.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_constructed_name_matches(
            path in suite_paths(),
            test in "case_[a-z0-9]{1,6}",
        ) {
            prop_assert!(is_strong_match(&qualified(&path, &test, ""), &path, &test));
        }

        #[test]
        fn prop_omitted_segment_never_matches(
            path in suite_paths(),
            test in "case_[a-z0-9]{1,6}",
            index in any::<prop::sample::Index>(),
        ) {
            let mut shorter = path.clone();
            shorter.remove(index.index(path.len()));
            prop_assert!(!is_strong_match(&qualified(&shorter, &test, ""), &path, &test));
        }

        #[test]
        fn prop_reordered_path_never_matches(
            path in suite_paths().prop_filter("needs two segments", |p| p.len() >= 2),
            test in "case_[a-z0-9]{1,6}",
        ) {
            let mut reordered = path.clone();
            reordered.swap(0, 1);
            prop_assert!(!is_strong_match(&qualified(&reordered, &test, ""), &path, &test));
        }

        #[test]
        fn prop_inserted_characters_never_match(
            path in suite_paths(),
            test in "case_[a-z0-9]{1,6}",
            index in any::<prop::sample::Index>(),
            noise in "[a-z_ ]{1,3}",
        ) {
            let mut noisy = path.clone();
            let at = index.index(path.len());
            noisy[at] = format!("{}{}", noise, noisy[at]);
            prop_assert!(!is_strong_match(&qualified(&noisy, &test, ""), &path, &test));
        }
    }
}
