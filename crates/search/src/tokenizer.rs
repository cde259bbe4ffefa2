const MIN_PREFIX: usize = 3;
const MAX_PREFIX: usize = 7;
const PREFIX_SOURCE_MIN_LEN: usize = 5;

fn is_separator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '-' | '_'
                | '.'
                | '/'
                | '\\'
                | ':'
                | ','
                | ';'
                | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '|'
                | '#'
                | '@'
                | '\''
                | '"'
        )
}

/// Terms indexed for one field value
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldTokens {
    /// Whole words and camelCase sub-words, lowercased
    pub terms: Vec<String>,
    /// Leading substrings (3..=7 chars) of terms longer than 4 chars
    pub prefixes: Vec<String>,
}

/// Tokenize a document field for indexing
pub fn tokenize_field(text: &str) -> FieldTokens {
    let terms = words(text);
    let mut prefixes = Vec::new();
    for term in &terms {
        let chars: Vec<char> = term.chars().collect();
        if chars.len() < PREFIX_SOURCE_MIN_LEN {
            continue;
        }
        let longest = MAX_PREFIX.min(chars.len() - 1);
        for len in MIN_PREFIX..=longest {
            prefixes.push(chars[..len].iter().collect());
        }
    }
    FieldTokens { terms, prefixes }
}

/// Tokenize a search query; duplicates removed, order kept
pub fn tokenize_query(query: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    words(query)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for word in text.split(is_separator).filter(|w| !w.is_empty()) {
        let lowered = word.to_lowercase();
        let parts = split_camel_case(word);
        if parts.len() > 1 {
            out.push(lowered);
            out.extend(parts.into_iter().map(|part| part.to_lowercase()));
        } else {
            out.push(lowered);
        }
    }
    out
}

/// Split camelCase or PascalCase into words; acronym runs stay together
fn split_camel_case(word: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut prev_upper = false;

    for ch in word.chars() {
        if ch.is_uppercase() {
            if !current.is_empty() && !prev_upper {
                tokens.push(std::mem::take(&mut current));
            }
            current.push(ch);
            prev_upper = true;
        } else {
            current.push(ch);
            prev_upper = false;
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_separators_and_camel_case() {
        let tokens = tokenize_field("httpRequest/get_user-data");
        assert_eq!(
            tokens.terms,
            vec!["httprequest", "http", "request", "get", "user", "data"]
        );
    }

    #[test]
    fn long_terms_contribute_prefixes() {
        let tokens = tokenize_field("Variable");
        assert_eq!(tokens.terms, vec!["variable"]);
        assert_eq!(tokens.prefixes, vec!["var", "vari", "varia", "variab", "variabl"]);

        assert!(tokenize_field("exec").prefixes.is_empty());
        assert_eq!(tokenize_field("fetch").prefixes, vec!["fet", "fetc"]);
    }

    #[test]
    fn query_tokens_are_deduplicated() {
        assert_eq!(tokenize_query("Log  log, (LOG)"), vec!["log"]);
        assert!(tokenize_query(" ;; ").is_empty());
    }
}
