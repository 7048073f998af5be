use regex::Regex;
use std::sync::LazyLock;

static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(第.+章|(?i:chapter)\s+\S+)").expect("chapter heading pattern is valid")
});

/// Split raw content into trimmed, non-empty paragraphs, keeping order
pub fn split_paragraphs(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}

/// "第十二章 …" or "Chapter 12 …"
pub fn is_chapter_heading(paragraph: &str) -> bool {
    CHAPTER_HEADING.is_match(paragraph)
}

/// Paragraphs of the open book, plus their character counts for the
/// height estimator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraphs {
    items: Vec<String>,
    char_counts: Vec<usize>,
}

impl Paragraphs {
    pub fn from_content(content: &str) -> Self {
        let items = split_paragraphs(content);
        let char_counts = items.iter().map(|p| p.chars().count()).collect();
        Self { items, char_counts }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn char_counts(&self) -> &[usize] {
        &self.char_counts
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_drops_blank_lines() {
        let paragraphs = split_paragraphs("Title\n\nPara one.\nPara two.\n");
        assert_eq!(paragraphs, vec!["Title", "Para one.", "Para two."]);
    }

    #[test]
    fn test_split_trims_and_handles_crlf() {
        let paragraphs = split_paragraphs("  第一章  \r\n\r\n\u{3000}\u{3000}正文开始。\r\n   \n");
        assert_eq!(paragraphs, vec!["第一章", "正文开始。"]);
    }

    #[test]
    fn test_split_is_idempotent() {
        let content = "a\n\n b \nc";
        assert_eq!(split_paragraphs(content), split_paragraphs(content));
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n \n\t\n").is_empty());
    }

    #[test]
    fn test_chapter_headings() {
        assert!(is_chapter_heading("第一章 风起"));
        assert!(is_chapter_heading("第123章"));
        assert!(is_chapter_heading("Chapter 7: The Return"));
        assert!(is_chapter_heading("CHAPTER IV"));
        assert!(!is_chapter_heading("第章"));
        assert!(!is_chapter_heading("他说第一章写得不好"));
        assert!(!is_chapter_heading("Chapters are long"));
    }

    #[test]
    fn test_char_counts() {
        let paragraphs = Paragraphs::from_content("你好\nhello\n\n");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs.char_counts(), &[2, 5]);
        assert_eq!(paragraphs.get(1), Some("hello"));
        assert_eq!(paragraphs.get(2), None);
    }
}
