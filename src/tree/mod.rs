mod dot;
mod listing;
mod source;

pub use dot::{is_dot_listing, parse_dot_listing};
pub use listing::parse_listing;
pub use source::ListingSource;

use crate::Result;

pub type TestUnitId = u32;

/// Id Boost.Test gives the master test suite. It is never listed.
pub const MASTER_SUITE_ID: TestUnitId = 1;
pub const MASTER_SUITE_NAME: &str = "Master Test Suite";
/// Test case ids start here, suite ids start at `MASTER_SUITE_ID`.
pub const FIRST_TEST_CASE_ID: TestUnitId = 0x10000;

#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub id: TestUnitId,
    pub name: String,
    pub enabled: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestSuite {
    pub id: TestUnitId,
    pub name: String,
    pub enabled: bool,
    pub description: Option<String>,
    pub children: Vec<TestUnit>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestUnit {
    Suite(TestSuite),
    Case(TestCase),
}

impl TestCase {
    pub fn new(id: TestUnitId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            description: None,
        }
    }
}

impl TestSuite {
    pub fn new(id: TestUnitId, name: impl Into<String>, children: Vec<TestUnit>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            description: None,
            children,
        }
    }

    pub fn master(children: Vec<TestUnit>) -> Self {
        Self::new(MASTER_SUITE_ID, MASTER_SUITE_NAME, children)
    }

    pub fn is_master(&self) -> bool {
        self.id == MASTER_SUITE_ID
    }

    /// Number of test cases anywhere below this suite.
    pub fn test_case_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| match child {
                TestUnit::Case(_) => 1,
                TestUnit::Suite(suite) => suite.test_case_count(),
            })
            .sum()
    }
}

/// Parse a content listing in whichever format Boost printed it, DOT or HRF.
pub fn parse_content(text: &str) -> Result<TestSuite> {
    if is_dot_listing(text) {
        parse_dot_listing(text)
    } else {
        parse_listing(text)
    }
}

/// Hooks called by `traverse_test_tree`, in pre-order for suite starts and
/// test cases and post-order for suite finishes.
pub trait TestTreeVisitor {
    fn visit(&mut self, test_case: &TestCase) -> Result<()>;

    /// Returning `false` skips the suite's children and its finish hook.
    fn test_suite_start(&mut self, suite: &TestSuite) -> Result<bool>;

    fn test_suite_finish(&mut self, suite: &TestSuite) -> Result<()>;
}

/// Walk `suite` depth-first, stopping at the first hook error.
pub fn traverse_test_tree<V>(suite: &TestSuite, visitor: &mut V) -> Result<()>
where
    V: TestTreeVisitor + ?Sized,
{
    if !visitor.test_suite_start(suite)? {
        return Ok(());
    }

    for child in &suite.children {
        match child {
            TestUnit::Case(test_case) => visitor.visit(test_case)?,
            TestUnit::Suite(child_suite) => traverse_test_tree(child_suite, visitor)?,
        }
    }

    visitor.test_suite_finish(suite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        prune: Option<TestUnitId>,
    }

    impl TestTreeVisitor for Recorder {
        fn visit(&mut self, test_case: &TestCase) -> Result<()> {
            self.events.push(format!("case {}", test_case.name));
            Ok(())
        }

        fn test_suite_start(&mut self, suite: &TestSuite) -> Result<bool> {
            self.events.push(format!("start {}", suite.name));
            Ok(self.prune != Some(suite.id))
        }

        fn test_suite_finish(&mut self, suite: &TestSuite) -> Result<()> {
            self.events.push(format!("finish {}", suite.name));
            Ok(())
        }
    }

    fn sample_tree() -> TestSuite {
        TestSuite::master(vec![
            TestUnit::Suite(TestSuite::new(
                2,
                "Outer",
                vec![
                    TestUnit::Case(TestCase::new(0x10000, "First")),
                    TestUnit::Suite(TestSuite::new(
                        3,
                        "Inner",
                        vec![TestUnit::Case(TestCase::new(0x10001, "Second"))],
                    )),
                ],
            )),
            TestUnit::Case(TestCase::new(0x10002, "Free")),
        ])
    }

    #[test]
    fn test_traversal_order() {
        let mut recorder = Recorder::default();
        traverse_test_tree(&sample_tree(), &mut recorder).unwrap();

        assert_eq!(
            recorder.events,
            vec![
                "start Master Test Suite",
                "start Outer",
                "case First",
                "start Inner",
                "case Second",
                "finish Inner",
                "finish Outer",
                "case Free",
                "finish Master Test Suite",
            ]
        );
    }

    #[test]
    fn test_pruned_suite_is_not_finished() {
        let mut recorder = Recorder {
            prune: Some(3),
            ..Default::default()
        };
        traverse_test_tree(&sample_tree(), &mut recorder).unwrap();

        assert!(recorder.events.contains(&"start Inner".to_string()));
        assert!(!recorder.events.contains(&"case Second".to_string()));
        assert!(!recorder.events.contains(&"finish Inner".to_string()));
    }

    #[test]
    fn test_case_count_and_master() {
        let tree = sample_tree();
        assert!(tree.is_master());
        assert_eq!(tree.test_case_count(), 3);
    }

    #[test]
    fn test_content_format_is_detected() {
        let dot = "digraph G {rankdir=LR;\n\
                   tu1[shape=ellipse,peripheries=2,fontname=Helvetica,color=green,label=\"Master Test Suite\"];\n\
                   {\n\
                   tu2[shape=Mrecord,fontname=Helvetica,color=green,label=\"Empty|a.cpp(3)\"];\n\
                   tu1 -> tu2;\n\
                   {\n\
                   }\n\
                   tu3[shape=Mrecord,fontname=Helvetica,color=green,label=\"Suite|a.cpp(5)\"];\n\
                   tu1 -> tu3;\n\
                   {\n\
                   tu65536[shape=Mrecord,fontname=Helvetica,color=green,label=\"Alpha|a.cpp(7)\"];\n\
                   tu3 -> tu65536;\n\
                   }\n\
                   }\n\
                   }\n";
        let master = parse_content(dot).unwrap();
        assert_eq!(master.children[0], TestUnit::Suite(TestSuite::new(2, "Empty", vec![])));
        assert_eq!(master.test_case_count(), 1);

        // HRF cannot tell an empty suite from a test case.
        let master = parse_content("Empty*\nSuite*\n    Alpha*\n").unwrap();
        assert_eq!(master.children[0], TestUnit::Case(TestCase::new(0x10000, "Empty")));
    }
}
