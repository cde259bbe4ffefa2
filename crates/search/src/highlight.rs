use crate::tokenizer::tokenize_query;
use std::ops::Range;

/// Byte ranges of `text` matching any query term, sorted and merged.
///
/// Both sides are Unicode case-folded; matches are mapped back to whole
/// characters of the original text.
pub fn highlight(text: &str, query: &str) -> Vec<Range<usize>> {
    let haystack = Folded::new(text);
    let mut ranges: Vec<Range<usize>> = tokenize_query(query)
        .iter()
        .map(|term| fold(term))
        .filter(|term| !term.is_empty())
        .flat_map(|term| {
            haystack
                .text
                .match_indices(term.as_str())
                .filter_map(|(start, found)| haystack.original(start..start + found.len()))
                .collect::<Vec<_>>()
        })
        .collect();

    ranges.sort_by_key(|range| (range.start, range.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    // Final sigma folds like any other sigma.
    ch.to_lowercase().map(|c| if c == 'ς' { 'σ' } else { c })
}

fn fold(text: &str) -> String {
    text.chars().flat_map(fold_char).collect()
}

/// Lowercased text plus, for each of its bytes, the source character's byte range
struct Folded {
    text: String,
    source: Vec<Range<usize>>,
}

impl Folded {
    fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut source = Vec::with_capacity(original.len());
        for (start, ch) in original.char_indices() {
            let span = start..start + ch.len_utf8();
            for folded in fold_char(ch) {
                text.push(folded);
                source.extend(std::iter::repeat(span.clone()).take(folded.len_utf8()));
            }
        }
        Self { text, source }
    }

    fn original(&self, folded: Range<usize>) -> Option<Range<usize>> {
        if folded.is_empty() {
            return None;
        }
        let first = self.source.get(folded.start)?;
        let last = self.source.get(folded.end - 1)?;
        Some(first.start..last.end)
    }
}
