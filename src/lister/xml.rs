use std::io::{self, Write};

use quick_xml::escape::escape;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

/// Write ` name="value"` with the value escaped for an attribute.
pub fn write_attr<W: Write>(out: &mut W, name: &str, value: &str) -> io::Result<()> {
    write!(out, " {}=\"{}\"", name, escape(value))
}

/// Wrap `text` in a CDATA section. A `]]>` inside the text is split across
/// two sections so the result stays well-formed.
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}
