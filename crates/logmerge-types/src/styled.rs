use std::ops::Range;

use ratatui::style::Style;
use ratatui::text::{Line, Span};

/// Text with one style per character.
///
/// Ranges passed to [`StyledText::stylize`] are byte ranges, as produced by
/// the regex engine; styles are stored per `char` so multibyte text is safe.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledText {
    text: String,
    /// Byte offset of each char
    offsets: Vec<usize>,
    styles: Vec<Style>,
}

/// A maximal run of characters sharing one style
#[derive(Clone, Debug, PartialEq)]
pub struct StyledRun {
    pub bytes: Range<usize>,
    pub chars: Range<usize>,
    pub style: Style,
}

impl StyledText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let styles = vec![Style::default(); offsets.len()];
        Self {
            text,
            offsets,
            styles,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of characters
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Style of the character at `index`, if any
    pub fn style_at(&self, index: usize) -> Option<Style> {
        self.styles.get(index).copied()
    }

    /// Layer `style` over the characters in the byte range.
    ///
    /// Colors set here replace colors from earlier calls.
    pub fn stylize(&mut self, style: Style, bytes: Range<usize>) {
        let start = self.char_index(bytes.start);
        let end = self.char_index(bytes.end);
        for slot in &mut self.styles[start..end.max(start)] {
            *slot = slot.patch(style);
        }
    }

    /// Layer `style` over every character
    pub fn stylize_all(&mut self, style: Style) {
        self.stylize(style, 0..self.text.len());
    }

    /// Char index of the first char starting at or after `byte`
    fn char_index(&self, byte: usize) -> usize {
        self.offsets.partition_point(|&offset| offset < byte)
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.offsets
            .get(char_index)
            .copied()
            .unwrap_or(self.text.len())
    }

    /// Collapse per-character styles into runs
    pub fn runs(&self) -> Vec<StyledRun> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=self.styles.len() {
            if i == self.styles.len() || self.styles[i] != self.styles[start] {
                runs.push(StyledRun {
                    bytes: self.byte_offset(start)..self.byte_offset(i),
                    chars: start..i,
                    style: self.styles[start],
                });
                start = i;
            }
        }
        runs
    }

    /// Build a ratatui line, with `base` under every run
    pub fn to_line(&self, base: Style) -> Line<'static> {
        let spans: Vec<Span<'static>> = self
            .runs()
            .into_iter()
            .map(|run| Span::styled(self.text[run.bytes].to_string(), base.patch(run.style)))
            .collect();
        Line::from(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_stylize_byte_range() {
        let mut text = StyledText::new("error: disk full");
        text.stylize(Style::default().fg(Color::Red), 0..5);

        assert_eq!(text.style_at(0).unwrap().fg, Some(Color::Red));
        assert_eq!(text.style_at(4).unwrap().fg, Some(Color::Red));
        assert_eq!(text.style_at(5).unwrap().fg, None);
        assert_eq!(text.runs().len(), 2);
    }

    #[test]
    fn test_later_color_wins() {
        let mut text = StyledText::new("abcdef");
        text.stylize(Style::default().fg(Color::Red), 0..4);
        text.stylize(Style::default().fg(Color::Blue), 2..6);

        let fgs: Vec<_> = (0..6).map(|i| text.style_at(i).unwrap().fg).collect();
        assert_eq!(
            fgs,
            vec![
                Some(Color::Red),
                Some(Color::Red),
                Some(Color::Blue),
                Some(Color::Blue),
                Some(Color::Blue),
                Some(Color::Blue),
            ]
        );
    }

    #[test]
    fn test_multibyte_offsets() {
        // "é" and "í" are two bytes each, the range covers "rí"
        let mut text = StyledText::new("café río");
        text.stylize(Style::default().fg(Color::Green), 6..9);

        assert_eq!(text.len(), 8);
        assert_eq!(text.style_at(4).unwrap().fg, None);
        assert_eq!(text.style_at(5).unwrap().fg, Some(Color::Green));
        assert_eq!(text.style_at(6).unwrap().fg, Some(Color::Green));
        assert_eq!(text.style_at(7).unwrap().fg, None);

        let line = text.to_line(Style::default());
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "café río");
    }

    #[test]
    fn test_empty_text() {
        let mut text = StyledText::new("");
        text.stylize_all(Style::default().fg(Color::Red));
        assert!(text.is_empty());
        assert!(text.runs().is_empty());
    }
}
