use std::fmt::Write;

use crate::models::NumberedRequest;

/// Render the queue as the `todo.xml` document read by OBS text sources.
pub fn render_todo_xml(requests: &[NumberedRequest]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<TODOs>\n");
    for req in requests {
        let _ = writeln!(
            out,
            "<item>{} ({})</item>",
            escape_xml(&req.content),
            escape_xml(&req.author)
        );
    }
    out.push_str("</TODOs>\n");
    out
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
