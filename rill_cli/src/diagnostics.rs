//! Source-mapped diagnostics: line lookup and caret rendering.

/// Pre-computed line-start table for position lookups over one source
/// file. Built once; lookups are binary search.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
    source: String,
    filename: String,
}

impl SourceMap {
    /// Build a source map from source text and a display filename.
    pub fn new(source: &str, filename: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            source: source.to_string(),
            filename: filename.to_string(),
        }
    }

    /// The text of a 1-based line, without its trailing newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let line = line as usize;
        if line == 0 || line > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line - 1];
        let end = if line < self.line_starts.len() {
            self.line_starts[line]
        } else {
            self.source.len()
        };
        let text = &self.source[start..end];
        Some(text.trim_end_matches('\n').trim_end_matches('\r'))
    }

    /// The display filename.
    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Render the location block of a diagnostic: a file/line(/column)
/// pointer, the source line, and a caret range under the offending
/// columns when a column is known.
pub fn render_location(
    map: &SourceMap,
    line: u32,
    column: Option<u32>,
    width: usize,
) -> String {
    let mut output = String::new();

    match column {
        Some(col) => output.push_str(&format!(
            "  File \"{}\", line {}, column {}\n",
            map.filename(),
            line,
            col
        )),
        None => output.push_str(&format!("  File \"{}\", line {}\n", map.filename(), line)),
    }

    if let Some(text) = map.line_text(line) {
        output.push_str(&format!("    {}\n", text));
        if let Some(col) = column {
            let pad = " ".repeat(4 + col.saturating_sub(1) as usize);
            let carets = "^".repeat(width.max(1).min(text.len() + 1));
            output.push_str(&format!("{}{}\n", pad, carets));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_text() {
        let map = SourceMap::new("first\nsecond\nthird", "t.rl");
        assert_eq!(map.line_text(1), Some("first"));
        assert_eq!(map.line_text(2), Some("second"));
        assert_eq!(map.line_text(3), Some("third"));
        assert_eq!(map.line_text(4), None);
        assert_eq!(map.line_text(0), None);
    }

    #[test]
    fn test_line_text_strips_crlf() {
        let map = SourceMap::new("one\r\ntwo\r\n", "t.rl");
        assert_eq!(map.line_text(1), Some("one"));
        assert_eq!(map.line_text(2), Some("two"));
    }

    #[test]
    fn test_render_location_with_caret() {
        let map = SourceMap::new("var s = \"abc", "t.rl");
        let rendered = render_location(&map, 1, Some(9), 1);
        assert!(rendered.contains("File \"t.rl\", line 1, column 9"));
        assert!(rendered.contains("    var s = \"abc"));
        assert!(rendered.contains("            ^"));
    }

    #[test]
    fn test_render_location_without_column() {
        let map = SourceMap::new("print(1 / 0)", "t.rl");
        let rendered = render_location(&map, 1, None, 1);
        assert!(rendered.contains("File \"t.rl\", line 1\n"));
        assert!(!rendered.contains('^'));
    }
}
