use crate::document::{build_documents, SearchResult, SearchResultType};
use crate::error::{Result, SearchError};
use crate::fuzzy::FuzzyTerms;
use crate::profile::{Bm25Config, SearchProfile};
use crate::tokenizer::{tokenize_field, tokenize_query};
use flowboard_graph::Board;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Indexed document fields, highest default boost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    NodeName,
    MatchedValue,
    PinName,
    SearchText,
    Category,
    DataType,
    Description,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Name,
        Field::NodeName,
        Field::MatchedValue,
        Field::PinName,
        Field::SearchText,
        Field::Category,
        Field::DataType,
        Field::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::NodeName => "node_name",
            Self::MatchedValue => "matched_value",
            Self::PinName => "pin_name",
            Self::SearchText => "search_text",
            Self::Category => "category",
            Self::DataType => "data_type",
            Self::Description => "description",
        }
    }

    fn value<'d>(&self, doc: &'d SearchResult) -> Option<&'d str> {
        match self {
            Self::Name => Some(doc.name.as_str()),
            Self::NodeName => doc.node_name.as_deref(),
            Self::MatchedValue => doc.matched_value.as_deref(),
            Self::PinName => doc.pin_name.as_deref(),
            Self::SearchText => Some(doc.search_text.as_str()),
            Self::Category => doc.category.as_deref(),
            Self::DataType => doc.data_type.as_deref(),
            Self::Description => doc.description.as_deref(),
        }
    }

    fn boost(&self, profile: &SearchProfile) -> f32 {
        let b = &profile.boosts;
        match self {
            Self::Name => b.name,
            Self::NodeName => b.node_name,
            Self::MatchedValue => b.matched_value,
            Self::PinName => b.pin_name,
            Self::SearchText => b.search_text,
            Self::Category => b.category,
            Self::DataType => b.data_type,
            Self::Description => b.description,
        }
    }
}

type Postings = HashMap<String, Vec<(usize, u32)>>;

/// Inverted index of one field
struct FieldIndex {
    field: Field,
    boost: f32,
    terms: Postings,
    prefixes: Postings,
    doc_len: Vec<u32>,
    avg_len: f32,
}

impl FieldIndex {
    fn build(field: Field, boost: f32, docs: &[SearchResult]) -> Self {
        let mut terms: Postings = HashMap::new();
        let mut prefixes: Postings = HashMap::new();
        let mut doc_len = Vec::with_capacity(docs.len());

        for (idx, doc) in docs.iter().enumerate() {
            let tokens = field.value(doc).map(tokenize_field).unwrap_or_default();
            doc_len.push(tokens.terms.len() as u32);
            add_postings(&mut terms, idx, tokens.terms);
            add_postings(&mut prefixes, idx, tokens.prefixes);
        }

        let total: u64 = doc_len.iter().map(|len| u64::from(*len)).sum();
        let avg_len = total as f32 / docs.len().max(1) as f32;
        Self {
            field,
            boost,
            terms,
            prefixes,
            doc_len,
            avg_len,
        }
    }

    fn bm25(&self, cfg: &Bm25Config, total_docs: usize, df: usize, tf: u32, idx: usize) -> f32 {
        let tf = tf as f32;
        let dl = self.doc_len.get(idx).copied().unwrap_or(0) as f32;
        let idf = bm25_idf(total_docs as f32, df as f32);
        let denom = tf + cfg.k1 * (1.0 - cfg.b + cfg.b * dl / self.avg_len.max(1e-3));
        if denom <= 0.0 {
            return 0.0;
        }
        idf * (tf * (cfg.k1 + 1.0)) / denom
    }
}

fn add_postings(postings: &mut Postings, idx: usize, tokens: Vec<String>) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }
    for (token, tf) in counts {
        postings.entry(token).or_default().push((idx, tf));
    }
}

fn bm25_idf(total_docs: f32, df: f32) -> f32 {
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}

#[derive(Default)]
struct Accumulator {
    total: f32,
    best: Option<(Field, f32)>,
}

impl Accumulator {
    fn add(&mut self, field: Field, score: f32) {
        self.total += score;
        if self.best.map_or(true, |(_, best)| score > best) {
            self.best = Some((field, score));
        }
    }
}

/// Ranked full-text index over one board snapshot.
///
/// Built wholesale from the snapshot; there is no incremental update.
pub struct BoardIndex {
    docs: Vec<SearchResult>,
    fields: Vec<FieldIndex>,
    vocabulary: Vec<String>,
    profile: SearchProfile,
}

impl BoardIndex {
    pub fn build(board: &Board, profile: SearchProfile) -> Self {
        let index = Self::from_documents(build_documents(board), profile);
        log::info!(
            "Indexed board {}: {} documents, {} distinct terms",
            board.id,
            index.docs.len(),
            index.vocabulary.len()
        );
        index
    }

    pub fn from_documents(docs: Vec<SearchResult>, profile: SearchProfile) -> Self {
        let fields: Vec<FieldIndex> = Field::ALL
            .iter()
            .map(|field| FieldIndex::build(*field, field.boost(&profile), &docs))
            .collect();
        let vocabulary: BTreeSet<&str> = fields
            .iter()
            .flat_map(|field| field.terms.keys().map(String::as_str))
            .collect();
        let vocabulary = vocabulary.into_iter().map(str::to_string).collect();

        Self {
            docs,
            fields,
            vocabulary,
            profile,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[SearchResult] {
        &self.docs
    }

    pub fn profile(&self) -> &SearchProfile {
        &self.profile
    }

    /// Ranked results for `query`, at most `profile.limit`, one per logical entity
    pub fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let terms = tokenize_query(query);
        if terms.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut scores: HashMap<usize, Accumulator> = HashMap::new();
        let mut fuzzy = FuzzyTerms::new();

        for term in &terms {
            let mut hit = self.score_term(term, 1.0, true, &mut scores);
            if !hit && term.chars().count() >= self.profile.fuzzy.min_term_len {
                let expansions = fuzzy.expand(
                    term,
                    self.vocabulary.iter().map(String::as_str),
                    self.profile.fuzzy.max_expansions,
                    self.profile.fuzzy.min_similarity,
                );
                for (expanded, similarity) in expansions {
                    log::debug!("Fuzzy '{}' -> '{}' ({:.2})", term, expanded, similarity);
                    let weight = self.profile.fuzzy.weight * similarity;
                    hit |= self.score_term(&expanded, weight, false, &mut scores);
                }
            }
            if !hit {
                log::debug!("No documents match '{}'", term);
            }
        }

        let normalized_query = query.trim().to_lowercase();
        for (idx, doc) in self.docs.iter().enumerate() {
            let exact = doc.name.to_lowercase() == normalized_query
                || (doc.kind == SearchResultType::Node
                    && doc
                        .node_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase() == normalized_query));
            if exact {
                scores
                    .entry(idx)
                    .or_default()
                    .add(Field::Name, self.profile.exact_name_bonus);
            }
        }

        Ok(self.rank(scores))
    }

    /// Score every posting of `term`; returns whether anything matched
    fn score_term(
        &self,
        term: &str,
        weight: f32,
        with_prefixes: bool,
        scores: &mut HashMap<usize, Accumulator>,
    ) -> bool {
        let total_docs = self.docs.len();
        let mut hit = false;
        for field in &self.fields {
            let mut lists = vec![(field.terms.get(term), weight)];
            if with_prefixes {
                lists.push((field.prefixes.get(term), weight * self.profile.prefix_weight));
            }
            for (postings, list_weight) in lists {
                let Some(postings) = postings else {
                    continue;
                };
                hit = true;
                for &(idx, tf) in postings {
                    let score = field.bm25(&self.profile.bm25, total_docs, postings.len(), tf, idx)
                        * field.boost
                        * list_weight;
                    scores.entry(idx).or_default().add(field.field, score);
                }
            }
        }
        hit
    }

    fn rank(&self, scores: HashMap<usize, Accumulator>) -> Vec<SearchResult> {
        let mut ranked: Vec<SearchResult> = scores
            .into_iter()
            .filter(|(_, acc)| acc.total > 0.0)
            .filter_map(|(idx, acc)| {
                let mut doc = self.docs.get(idx)?.clone();
                doc.score = acc.total;
                if let Some((field, _)) = acc.best {
                    doc.matched_field = Some(field.as_str().to_string());
                    if doc.matched_value.is_none() {
                        doc.matched_value = field.value(&doc).map(str::to_string);
                    }
                }
                Some(doc)
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut seen = HashSet::new();
        ranked.retain(|doc| {
            let (kind, node, pin) = doc.dedup_key();
            seen.insert((kind, node.map(str::to_string), pin.map(str::to_string)))
        });
        ranked.truncate(self.profile.limit);
        ranked
    }
}
