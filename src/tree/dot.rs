use std::collections::HashMap;
use std::sync::LazyLock;

use super::{TestCase, TestSuite, TestUnit, TestUnitId};
use crate::{Error, Result};

static NODE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^tu(?P<id>\d+)\[(?P<attrs>.*)\];?$").expect("Invalid DOT node regex pattern")
});

static EDGE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^tu(?P<parent>\d+)\s*->\s*tu(?P<child>\d+)\s*(?P<attrs>\[.*\])?\s*;?$")
        .expect("Invalid DOT edge regex pattern")
});

static LABEL_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"label="(?P<label>[^"]*)""#).expect("Invalid DOT label regex pattern")
});

/// Whether `text` looks like a `--list_content=DOT` listing.
pub fn is_dot_listing(text: &str) -> bool {
    text.trim_start().starts_with("digraph")
}

/// One `tu<id>[...]` node.
#[derive(Debug)]
struct DotNode {
    id: TestUnitId,
    name: String,
    enabled: bool,
    /// A `{` block follows the node, which Boost only opens for suites.
    suite: bool,
}

/// Parse a Boost.Test `--list_content=DOT` listing.
///
/// Ids are the ones Boost registered the units with. The root of the graph is
/// the master suite; a unit is a suite when a `{ ... }` block follows it, so
/// empty suites stay suites. Children keep the order of their `->` edges.
/// Dotted dependency edges (those carrying attributes) are ignored.
pub fn parse_dot_listing(text: &str) -> Result<TestSuite> {
    let mut nodes: Vec<DotNode> = Vec::new();
    let mut index: HashMap<TestUnitId, usize> = HashMap::new();
    let mut children: HashMap<TestUnitId, Vec<TestUnitId>> = HashMap::new();
    let mut parents: HashMap<TestUnitId, TestUnitId> = HashMap::new();

    for (number, raw) in text.lines().enumerate() {
        let line_number = number + 1;
        let line = raw.trim();
        if line.is_empty() || line == "}" || line.starts_with("digraph") {
            continue;
        }

        if line == "{" {
            let Some(node) = nodes.last_mut() else {
                return Err(parse_error(line_number, "block opened before any test unit"));
            };
            node.suite = true;
            continue;
        }

        if let Some(caps) = EDGE_RE.captures(line) {
            if caps.name("attrs").is_some() {
                continue;
            }
            let parent = parse_id(line_number, &caps["parent"])?;
            let child = parse_id(line_number, &caps["child"])?;
            if parents.insert(child, parent).is_some() {
                return Err(parse_error(line_number, &format!("tu{} has more than one parent", child)));
            }
            children.entry(parent).or_default().push(child);
            continue;
        }

        if let Some(caps) = NODE_RE.captures(line) {
            let id = parse_id(line_number, &caps["id"])?;
            let node = parse_node(line_number, id, &caps["attrs"])?;
            if index.insert(id, nodes.len()).is_some() {
                return Err(parse_error(line_number, &format!("tu{} is declared twice", id)));
            }
            nodes.push(node);
            continue;
        }

        return Err(parse_error(line_number, &format!("unrecognised DOT line '{}'", line)));
    }

    let mut roots = nodes.iter().filter(|n| !parents.contains_key(&n.id));
    let root = match (roots.next(), roots.next()) {
        (Some(root), None) => root.id,
        (None, _) => return Err(parse_error(0, "listing has no master suite")),
        (Some(a), Some(b)) => {
            return Err(parse_error(0, &format!("tu{} and tu{} both lack a parent", a.id, b.id)))
        }
    };

    for (&child, &parent) in &parents {
        for id in [child, parent] {
            if !index.contains_key(&id) {
                return Err(parse_error(0, &format!("edge refers to undeclared tu{}", id)));
            }
        }
    }

    let tree = Graph { nodes: &nodes, index: &index, children: &children };
    let mut visited = 0;
    let master = tree.build_suite(root, &mut visited);
    if visited != nodes.len() {
        return Err(parse_error(0, "test units are not connected to the master suite"));
    }

    tracing::debug!("DOT listing holds {} test units", nodes.len());
    Ok(master)
}

struct Graph<'a> {
    nodes: &'a [DotNode],
    index: &'a HashMap<TestUnitId, usize>,
    children: &'a HashMap<TestUnitId, Vec<TestUnitId>>,
}

impl Graph<'_> {
    fn node(&self, id: TestUnitId) -> &DotNode {
        &self.nodes[self.index[&id]]
    }

    fn build_suite(&self, id: TestUnitId, visited: &mut usize) -> TestSuite {
        *visited += 1;
        let node = self.node(id);
        let children = self
            .children
            .get(&id)
            .map(|ids| ids.iter().map(|&child| self.build_unit(child, visited)).collect())
            .unwrap_or_default();

        TestSuite {
            id,
            name: node.name.clone(),
            enabled: node.enabled,
            description: None,
            children,
        }
    }

    fn build_unit(&self, id: TestUnitId, visited: &mut usize) -> TestUnit {
        let node = self.node(id);
        if node.suite || self.children.contains_key(&id) {
            return TestUnit::Suite(self.build_suite(id, visited));
        }

        *visited += 1;
        TestUnit::Case(TestCase {
            id,
            name: node.name.clone(),
            enabled: node.enabled,
            description: None,
        })
    }
}

fn parse_node(line_number: usize, id: TestUnitId, attrs: &str) -> Result<DotNode> {
    let label = LABEL_RE
        .captures(attrs)
        .map(|caps| caps["label"].to_string())
        .ok_or_else(|| parse_error(line_number, &format!("tu{} has no label", id)))?;

    // `name|file(line)|...`; only the name is kept.
    let name = label.split('|').next().unwrap_or_default().to_string();
    if name.is_empty() {
        return Err(parse_error(line_number, &format!("tu{} has an empty name", id)));
    }

    Ok(DotNode {
        id,
        name,
        enabled: !attrs.contains("color=yellow"),
        suite: false,
    })
}

fn parse_id(line_number: usize, digits: &str) -> Result<TestUnitId> {
    digits
        .parse()
        .map_err(|_| parse_error(line_number, &format!("test unit id '{}' is out of range", digits)))
}

fn parse_error(line: usize, reason: &str) -> Error {
    Error::ListingParse { line, reason: reason.to_string() }
}
