//! File-path block extraction.
//!
//! Grammar of a block inside free text:
//!
//! ```text
//! <FilePath>
//! reports/q1.pdf
//!    reports/q2.pdf
//!
//! </FilePath>
//! ```
//!
//! One path per line; surrounding whitespace and blank lines are ignored.
//! Only the first block in a text is honored.

/// Opening tag of a file-path block.
pub const OPEN_TAG: &str = "<FilePath>";

/// Closing tag of a file-path block.
pub const CLOSE_TAG: &str = "</FilePath>";

/// Ordered, non-empty path strings taken from one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePathList(Vec<String>);

impl FilePathList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FilePathList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extract the paths of the first file-path block in `text`.
///
/// Returns `None` when no complete block exists, and `Some` (possibly empty)
/// when a block exists.
pub fn extract_file_paths(text: &str) -> Option<FilePathList> {
    let interior = block_interior(text)?;
    let paths = interior
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Some(FilePathList(paths))
}

/// Text between the first open tag and the first close tag after it.
fn block_interior(text: &str) -> Option<&str> {
    let start = text.find(OPEN_TAG)? + OPEN_TAG.len();
    let len = text[start..].find(CLOSE_TAG)?;
    Some(&text[start..start + len])
}

/// Wrap paths in a block, one per line.
pub fn format_file_paths<I, S>(paths: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut block = String::from(OPEN_TAG);
    block.push('\n');
    for path in paths {
        block.push_str(path.as_ref());
        block.push('\n');
    }
    block.push_str(CLOSE_TAG);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(text: &str) -> Option<Vec<String>> {
        extract_file_paths(text).map(FilePathList::into_vec)
    }

    #[test]
    fn extracts_paths_in_order() {
        let text = "Please process:\n<FilePath>\nreports/a.pdf\nreports/b.pdf\n</FilePath>\nthanks";
        assert_eq!(
            paths(text),
            Some(vec!["reports/a.pdf".to_string(), "reports/b.pdf".to_string()])
        );
    }

    #[test]
    fn trailing_blank_lines_are_dropped() {
        let text = "<FilePath>\na.pdf\nb.pdf\n\n\n</FilePath>";
        assert_eq!(paths(text), Some(vec!["a.pdf".to_string(), "b.pdf".to_string()]));
    }

    #[test]
    fn whitespace_around_paths_is_trimmed() {
        let text = "<FilePath>   \n\t  docs/one.pdf   \n\n   docs/two.pdf\t\n</FilePath>";
        assert_eq!(
            paths(text),
            Some(vec!["docs/one.pdf".to_string(), "docs/two.pdf".to_string()])
        );
    }

    #[test]
    fn inline_block_on_one_line() {
        assert_eq!(
            paths("see <FilePath>report.pdf</FilePath> now"),
            Some(vec!["report.pdf".to_string()])
        );
    }

    #[test]
    fn absent_block_is_none() {
        assert_eq!(paths("no paths in here"), None);
        assert_eq!(paths(""), None);
    }

    #[test]
    fn unclosed_block_is_none() {
        assert_eq!(paths("<FilePath>\nreport.pdf\n"), None);
    }

    #[test]
    fn close_before_open_is_none() {
        assert_eq!(paths("</FilePath> report.pdf <FilePath>"), None);
    }

    #[test]
    fn empty_block_is_present_but_empty() {
        let list = extract_file_paths("<FilePath>\n   \n\n</FilePath>").unwrap();
        assert!(list.is_empty());
        assert_eq!(extract_file_paths("<FilePath></FilePath>").unwrap().len(), 0);
    }

    #[test]
    fn only_first_block_is_honored() {
        let text = "<FilePath>\nfirst.pdf\n</FilePath>\n<FilePath>\nsecond.pdf\n</FilePath>";
        assert_eq!(paths(text), Some(vec!["first.pdf".to_string()]));
    }

    #[test]
    fn empty_first_block_does_not_merge_with_later_one() {
        let text = "<FilePath>\n</FilePath> then <FilePath>\nlate.pdf\n</FilePath>";
        assert_eq!(paths(text), Some(vec![]));
    }

    #[test]
    fn windows_line_endings() {
        let text = "<FilePath>\r\nC:\\docs\\a.pdf\r\nC:\\docs\\b.pdf\r\n</FilePath>";
        assert_eq!(
            paths(text),
            Some(vec!["C:\\docs\\a.pdf".to_string(), "C:\\docs\\b.pdf".to_string()])
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let text = "intro\n<FilePath>\n x.pdf \n\ny.pdf\n</FilePath>";
        assert_eq!(extract_file_paths(text), extract_file_paths(text));
    }

    #[test]
    fn formatted_block_extracts_back() {
        let block = format_file_paths(["a.pdf", "dir/b.pdf"]);
        assert!(block.starts_with(OPEN_TAG));
        assert!(block.ends_with(CLOSE_TAG));
        assert_eq!(
            paths(&block),
            Some(vec!["a.pdf".to_string(), "dir/b.pdf".to_string()])
        );
    }
}
