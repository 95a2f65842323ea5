use std::sync::LazyLock;

use super::{TestCase, TestSuite, TestUnit, TestUnitId, FIRST_TEST_CASE_ID, MASTER_SUITE_ID};
use crate::{Error, Result};

/// Width of one nesting level in a content listing.
const LISTING_INDENT: usize = 4;

/// One line of a Boost.Test `--list_content=HRF` listing.
#[derive(Debug)]
struct ListingEntry {
    depth: usize,
    name: String,
    enabled: bool,
    description: Option<String>,
}

static LINE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"^(?P<indent> *)(?P<name>[^\s*:][^*:]*?)(?P<enabled>\*)?\s*(?::\s*(?P<desc>.*))?$"
    ).expect("Invalid listing line regex pattern")
});

fn parse_entry(line_number: usize, line: &str) -> Result<ListingEntry> {
    let caps = LINE_RE.captures(line).ok_or_else(|| Error::ListingParse {
        line: line_number,
        reason: format!("unrecognised test unit line '{}'", line),
    })?;

    let indent = caps["indent"].len();
    if indent % LISTING_INDENT != 0 {
        return Err(Error::ListingParse {
            line: line_number,
            reason: format!("indentation of {} is not a multiple of {}", indent, LISTING_INDENT),
        });
    }

    Ok(ListingEntry {
        depth: indent / LISTING_INDENT,
        name: caps["name"].trim_end().to_string(),
        enabled: caps.name("enabled").is_some(),
        description: caps
            .name("desc")
            .map(|d| d.as_str().trim().to_string())
            .filter(|d| !d.is_empty()),
    })
}

/// Parse a content listing into a tree rooted at the master suite.
///
/// A unit is a suite when the next line is nested one level deeper. Ids follow
/// Boost.Test's registration counters in listing order: suites count up from
/// the master suite's id, test cases from `FIRST_TEST_CASE_ID`.
pub fn parse_listing(text: &str) -> Result<TestSuite> {
    let mut entries = Vec::new();
    let mut previous_depth: Option<usize> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let entry = parse_entry(index + 1, line)?;
        let max_depth = previous_depth.map_or(0, |d| d + 1);
        if entry.depth > max_depth {
            return Err(Error::ListingParse {
                line: index + 1,
                reason: format!("'{}' is nested more than one level below its parent", entry.name),
            });
        }
        previous_depth = Some(entry.depth);
        entries.push(entry);
    }

    let mut ids = IdCounters {
        next_suite: MASTER_SUITE_ID + 1,
        next_case: FIRST_TEST_CASE_ID,
    };
    let mut cursor = 0;
    let children = build_level(&entries, &mut cursor, 0, &mut ids);

    Ok(TestSuite::master(children))
}

struct IdCounters {
    next_suite: TestUnitId,
    next_case: TestUnitId,
}

fn build_level(
    entries: &[ListingEntry],
    cursor: &mut usize,
    depth: usize,
    ids: &mut IdCounters,
) -> Vec<TestUnit> {
    let mut units = Vec::new();

    while let Some(entry) = entries.get(*cursor) {
        if entry.depth < depth {
            break;
        }
        *cursor += 1;

        let has_children = entries
            .get(*cursor)
            .is_some_and(|next| next.depth > entry.depth);

        if has_children {
            let id = ids.next_suite;
            ids.next_suite += 1;
            let children = build_level(entries, cursor, depth + 1, ids);
            units.push(TestUnit::Suite(TestSuite {
                id,
                name: entry.name.clone(),
                enabled: entry.enabled,
                description: entry.description.clone(),
                children,
            }));
        } else {
            let id = ids.next_case;
            ids.next_case += 1;
            units.push(TestUnit::Case(TestCase {
                id,
                name: entry.name.clone(),
                enabled: entry.enabled,
                description: entry.description.clone(),
            }));
        }
    }

    units
}
