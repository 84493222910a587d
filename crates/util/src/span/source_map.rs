use super::FileId;

/// A single loaded source file: its path, contents, and precomputed line
/// start offsets so byte offsets can be mapped to `(line, column)` quickly.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    contents: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Builds a `SourceFile`, precomputing the offset of every line start.
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let contents = contents.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            contents
                .char_indices()
                .filter(|&(_, c)| c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            name: name.into(),
            contents,
            line_starts,
        }
    }

    /// The file's name (as given when it was added to the `SourceMap`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The file's full source text.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Converts a byte offset to a 1-based `(line, column)` pair.
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.contents[line_start..offset].chars().count() + 1;
        (line_idx as u32 + 1, column as u32)
    }

    /// Returns the text of the given 1-based line number, without its
    /// trailing newline.
    pub fn line_at(&self, line: u32) -> Option<&str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .copied()
            .unwrap_or(self.contents.len());
        Some(self.contents[start..end].trim_end_matches(['\n', '\r']))
    }
}

/// A registry of loaded source files, indexed by [`FileId`].
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Creates an empty source map.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Adds a file and returns its newly assigned `FileId`.
    pub fn add_file(&mut self, name: impl Into<String>, contents: impl Into<String>) -> FileId {
        self.files.push(SourceFile::new(name, contents));
        FileId(self.files.len() - 1)
    }

    /// Looks up a previously added file.
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Renders a single source line with a caret line underneath pointing at
    /// the given column, in the style of `rustc`'s one-line snippets.
    pub fn format_span(&self, id: FileId, line: u32, column: u32) -> Option<String> {
        let file = self.get(id)?;
        let text = file.line_at(line)?;
        let caret_pos = column.saturating_sub(1) as usize;
        let mut caret_line = " ".repeat(caret_pos);
        caret_line.push('^');
        Some(format!("{text}\n{caret_line}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_line_col_first_line() {
        let file = SourceFile::new("t.loks", "var x = 1;\nvar y = 2;\n");
        assert_eq!(file.offset_to_line_col(0), (1, 1));
        assert_eq!(file.offset_to_line_col(4), (1, 5));
    }

    #[test]
    fn offset_to_line_col_second_line() {
        let file = SourceFile::new("t.loks", "var x = 1;\nvar y = 2;\n");
        let second_line_start = "var x = 1;\n".len();
        assert_eq!(file.offset_to_line_col(second_line_start), (2, 1));
    }

    #[test]
    fn line_at_strips_newline() {
        let file = SourceFile::new("t.loks", "fun f() {\n  return 1;\n}\n");
        assert_eq!(file.line_at(2), Some("  return 1;"));
    }

    #[test]
    fn format_span_renders_caret() {
        let mut map = SourceMap::new();
        let id = map.add_file("t.loks", "var x = 1;\n");
        let rendered = map.format_span(id, 1, 5).unwrap();
        assert_eq!(rendered, "var x = 1;\n    ^");
    }
}
