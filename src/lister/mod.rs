mod xml;

use std::io::Write;

use crate::symbols::{SourceLocation, SourceResolver};
use crate::tree::{TestCase, TestSuite, TestTreeVisitor};
use crate::Result;
use xml::{cdata, write_attr, XML_DECLARATION};

const INDENT: &str = "    ";
const ROOT_ELEMENT: &str = "BoostTestFramework";
const SUITE_ELEMENT: &str = "TestSuite";
const CASE_ELEMENT: &str = "TestCase";

/// Where a lister is in its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Idle,
    InDocument,
    Closed,
}

/// Test tree visitor that writes the visited suites and test cases as XML.
///
/// With a `SourceResolver` attached, every test case is looked up in the
/// module's debug symbols and gets `file`/`line` attributes when found.
/// Without one (or when the resolver has no debug info) the output is the
/// plain listing.
pub struct TreeLister<W: Write> {
    out: W,
    source: String,
    level: usize,
    pretty_print: bool,
    /// Names of the suites enclosing the current position, master suite excluded.
    suites: Vec<String>,
    resolver: Option<SourceResolver>,
    state: DocumentState,
}

impl<W: Write> TreeLister<W> {
    /// `source` is the path of the module being listed.
    pub fn new(source: impl Into<String>, out: W) -> Self {
        Self {
            out,
            source: source.into(),
            level: 0,
            pretty_print: true,
            suites: Vec::new(),
            resolver: None,
            state: DocumentState::Idle,
        }
    }

    pub fn with_resolver(mut self, resolver: SourceResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    /// Has no effect once the header has been written.
    pub fn set_pretty_print(&mut self, pretty_print: bool) {
        if self.state != DocumentState::Idle {
            tracing::warn!("Pretty printing cannot change after the document has started");
            return;
        }
        self.pretty_print = pretty_print;
    }

    pub fn is_debug_info_available(&self) -> bool {
        self.resolver
            .as_ref()
            .is_some_and(|r| r.is_debug_info_available())
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn suite_path(&self) -> &[String] {
        &self.suites
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write the XML declaration and open the root element.
    pub fn write_header(&mut self) -> Result<()> {
        self.out.write_all(XML_DECLARATION.as_bytes())?;
        self.end_line()?;

        write!(self.out, "<{}", ROOT_ELEMENT)?;
        write_attr(&mut self.out, "source", &self.source)?;
        self.out.write_all(b">")?;
        self.end_line()?;

        self.level += 1;
        self.state = DocumentState::InDocument;
        Ok(())
    }

    /// Close any suite still open, then the root element.
    pub fn write_trailer(&mut self) -> Result<()> {
        while self.suites.pop().is_some() {
            self.level = self.level.saturating_sub(1);
            self.close_suite()?;
        }

        self.level = self.level.saturating_sub(1);
        self.tab()?;
        write!(self.out, "</{}>", ROOT_ELEMENT)?;
        self.end_line()?;
        self.out.flush()?;

        self.state = DocumentState::Closed;
        Ok(())
    }

    /// Write the diagnostic node reporting that the module could not be listed.
    /// The node is written as is, with no indentation or line break, so the
    /// root's closing tag follows it directly.
    pub fn write_error(&mut self, detail: Option<&str>) -> Result<()> {
        let mut message = format!("Error: Could not load {}.", self.source);
        if let Some(detail) = detail.filter(|d| !d.is_empty()) {
            message.push_str(" Detail: ");
            message.push_str(detail);
        }

        self.out.write_all(cdata(&message).as_bytes())?;
        Ok(())
    }

    fn tab(&mut self) -> Result<()> {
        if self.pretty_print {
            for _ in 0..self.level {
                self.out.write_all(INDENT.as_bytes())?;
            }
        }
        Ok(())
    }

    fn end_line(&mut self) -> Result<()> {
        if self.pretty_print {
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }

    fn close_suite(&mut self) -> Result<()> {
        self.tab()?;
        write!(self.out, "</{}>", SUITE_ELEMENT)?;
        self.end_line()
    }

    fn locate(&self, test_case: &TestCase) -> Option<SourceLocation> {
        let resolver = self.resolver.as_ref()?;
        let location = resolver.resolve(&self.suites, &test_case.name);
        tracing::debug!(
            "{}/{} -> {}:{}",
            self.suites.join("/"),
            test_case.name,
            location.file,
            location.line
        );
        Some(location).filter(|l| !l.is_unknown())
    }
}

impl<W: Write> TestTreeVisitor for TreeLister<W> {
    fn visit(&mut self, test_case: &TestCase) -> Result<()> {
        tracing::debug!(
            id = test_case.id,
            enabled = test_case.enabled,
            description = ?test_case.description,
            "Listing test case {}",
            test_case.name
        );
        let location = self.locate(test_case);

        self.tab()?;
        write!(self.out, "<{}", CASE_ELEMENT)?;
        write_attr(&mut self.out, "id", &test_case.id.to_string())?;
        write_attr(&mut self.out, "name", &test_case.name)?;
        if let Some(location) = location {
            write_attr(&mut self.out, "file", &location.file)?;
            write_attr(&mut self.out, "line", &location.line.to_string())?;
        }
        self.out.write_all(b" />")?;
        self.end_line()
    }

    fn test_suite_start(&mut self, suite: &TestSuite) -> Result<bool> {
        if suite.is_master() {
            return Ok(true);
        }

        tracing::debug!(
            id = suite.id,
            enabled = suite.enabled,
            description = ?suite.description,
            "Listing test suite {}",
            suite.name
        );
        self.tab()?;
        write!(self.out, "<{}", SUITE_ELEMENT)?;
        write_attr(&mut self.out, "id", &suite.id.to_string())?;
        write_attr(&mut self.out, "name", &suite.name)?;
        self.out.write_all(b">")?;
        self.end_line()?;

        self.level += 1;
        self.suites.push(suite.name.clone());
        Ok(true)
    }

    fn test_suite_finish(&mut self, suite: &TestSuite) -> Result<()> {
        if suite.is_master() {
            return Ok(());
        }

        self.level = self.level.saturating_sub(1);
        self.suites.pop();
        self.close_suite()
    }
}
