//! Documentation resolver.
//!
//! Given a selected member, the resolver decides where its documentation
//! comes from. Members the inspector classified as UNO members are looked up
//! in the reference corpus and ranked by how well each row fits the observed
//! value. Everything else is asked of the live session as a doc string.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::session::SessionGateway;
use crate::workspace::path::{last_component, qualified_name};
use crate::workspace::snapshot::NamespaceSnapshot;

use super::corpus::{DocumentationRecord, ReferenceCorpus, toggle_getter};
use super::render::{LineRole, Markup, render_live_line, render_record};
use super::rules::{MatchContext, MatchRule, classify};

/// Prefix of the dump `desc` field for members of the UNO object model.
pub const UNO_DESC_MARKER: &str = "uno";

/// Constructor-style prefixes of built-in types recognized as signatures in
/// live doc strings.
const BUILTIN_CONSTRUCTORS: [&str; 7] = ["bool(", "bytes(", "dict(", "int(", "list(", "str(", "tuple("];

/// Placeholder text for members without documentation.
pub fn no_information(symbol: &str) -> String {
    format!("No information is available for: {symbol}")
}

/// The member whose documentation is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveRequest {
    /// Member name.
    pub symbol: String,
    /// Type shown for the member.
    pub tree_type: String,
    /// Repr shown for the member.
    pub tree_repr: String,
    /// Path of the object owning the member.
    pub owner_path: String,
}

impl ResolveRequest {
    /// Builds the request for a member of `snapshot`, using the merged type
    /// and repr the snapshot presents for it.
    pub fn for_member(snapshot: &NamespaceSnapshot, name: &str) -> Option<Self> {
        snapshot.member(name).map(|member| Self {
            symbol: member.name,
            tree_type: member.type_name,
            tree_repr: member.repr,
            owner_path: snapshot.path().to_string(),
        })
    }
}

/// Where the documentation will come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPlan {
    /// Look the symbol up in the reference corpus.
    Corpus {
        /// Name to look up.
        symbol: String,
    },
    /// Ask the session for the doc string of a dotted name.
    Live {
        /// Fully qualified name to query.
        query: String,
    },
}

/// Chooses between corpus and live lookup for `request`.
pub fn plan(snapshot: &NamespaceSnapshot, request: &ResolveRequest) -> ResolutionPlan {
    match snapshot.dump_entry(&request.symbol) {
        Some(entry) if entry.desc.starts_with(UNO_DESC_MARKER) => ResolutionPlan::Corpus {
            symbol: request.symbol.clone(),
        },
        _ => ResolutionPlan::Live {
            query: qualified_name(&request.owner_path, &request.symbol),
        },
    }
}

/// A rendered corpus row.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedRecord {
    /// The row as stored.
    pub record: DocumentationRecord,
    /// The rule that judged it applicable, if any.
    pub rule: Option<MatchRule>,
    /// Rendered text.
    pub text: String,
}

/// Corpus rows split into applicable and inapplicable, best evidence first.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDocumentation {
    /// The looked-up name.
    pub symbol: String,
    /// Rows judged applicable, in storage order.
    pub matched: Vec<RenderedRecord>,
    /// Rows judged inapplicable, in storage order.
    pub unmatched: Vec<RenderedRecord>,
}

impl ResolvedDocumentation {
    /// Number of applicable rows.
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Number of rows.
    pub fn total(&self) -> usize {
        self.matched.len() + self.unmatched.len()
    }

    /// Matched rows, then unmatched rows.
    pub fn records(&self) -> impl Iterator<Item = &RenderedRecord> {
        self.matched.iter().chain(&self.unmatched)
    }

    /// The full rendered text.
    pub fn text(&self) -> String {
        self.records().map(|r| r.text.as_str()).collect()
    }
}

/// Classifies and renders corpus rows for `request`.
pub fn rank(
    markup: Markup,
    request: &ResolveRequest,
    records: Vec<DocumentationRecord>,
) -> ResolvedDocumentation {
    let toggled = toggle_getter(&request.symbol);
    let names = [request.symbol.as_str(), toggled.as_str()];
    let ctx = MatchContext {
        candidates: records.len(),
        tree_type: &request.tree_type,
        tree_repr: &request.tree_repr,
    };

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    for record in records {
        let rule = classify(&ctx, &record);
        let text = render_record(markup, &record, &names, rule.is_some());
        let rendered = RenderedRecord { record, rule, text };
        if rule.is_some() {
            matched.push(rendered);
        } else {
            unmatched.push(rendered);
        }
    }

    ResolvedDocumentation {
        symbol: request.symbol.clone(),
        matched,
        unmatched,
    }
}

/// One classified line of a live doc string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveLine {
    /// The line as received.
    pub text: String,
    /// How it is presented.
    pub role: LineRole,
}

/// Classifies the lines of a doc string returned for `query`, keeping their
/// order.
pub fn classify_live_lines(query: &str, doc: &str) -> Vec<LiveLine> {
    let symbol = last_component(query).unwrap_or_else(|| query.to_string());
    let call = format!("{query}(");

    doc.split('\n')
        .enumerate()
        .map(|(i, line)| {
            let role = if i == 0 {
                LineRole::Primary
            } else if line.starts_with(&call)
                || (!symbol.is_empty() && line.starts_with(&symbol))
                || BUILTIN_CONSTRUCTORS.iter().any(|p| line.starts_with(p))
            {
                LineRole::Signature
            } else {
                LineRole::Plain
            };
            LiveLine {
                text: line.to_string(),
                role,
            }
        })
        .collect()
}

/// A doc string from the live session, classified line by line.
#[derive(Debug, Clone, Serialize)]
pub struct LiveDocumentation {
    /// The queried dotted name.
    pub query: String,
    /// The lines, in original order.
    pub lines: Vec<LiveLine>,
    rendered: String,
}

impl LiveDocumentation {
    /// Classifies and renders `doc`, returned for `query`.
    pub fn new(markup: Markup, query: impl Into<String>, doc: &str) -> Self {
        let query = query.into();
        let lines = classify_live_lines(&query, doc);
        let symbol = last_component(&query).unwrap_or_default();
        let rendered = lines
            .iter()
            .map(|line| render_live_line(markup, line.role, &line.text, &symbol))
            .collect();
        Self {
            query,
            lines,
            rendered,
        }
    }

    /// The full rendered text.
    pub fn text(&self) -> &str {
        &self.rendered
    }
}

/// Outcome of a documentation request.
#[derive(Debug, Clone, Serialize)]
pub enum Resolution {
    /// Ranked corpus rows.
    Corpus(ResolvedDocumentation),
    /// A live doc string.
    Live(LiveDocumentation),
    /// Nothing is known about the symbol.
    Unavailable {
        /// The symbol or dotted name asked about.
        symbol: String,
    },
    /// The live query was cancelled because the session went away; there is
    /// nothing to show.
    Superseded,
}

impl Resolution {
    /// Text to display, or `None` when the answer should be dropped.
    pub fn text(&self) -> Option<String> {
        match self {
            Resolution::Corpus(docs) => Some(docs.text()),
            Resolution::Live(docs) => Some(docs.text().to_string()),
            Resolution::Unavailable { symbol } => Some(no_information(symbol)),
            Resolution::Superseded => None,
        }
    }

    /// `(matched, total)` for corpus answers.
    pub fn counts(&self) -> Option<(usize, usize)> {
        match self {
            Resolution::Corpus(docs) => Some((docs.matched_count(), docs.total())),
            _ => None,
        }
    }
}

/// Resolves documentation from the reference corpus or the live session.
#[derive(Clone)]
pub struct DocumentationResolver {
    corpus: Arc<ReferenceCorpus>,
    gateway: Arc<dyn SessionGateway>,
    markup: Markup,
}

impl DocumentationResolver {
    /// Creates a resolver rendering HTML.
    pub fn new(corpus: Arc<ReferenceCorpus>, gateway: Arc<dyn SessionGateway>) -> Self {
        Self {
            corpus,
            gateway,
            markup: Markup::default(),
        }
    }

    /// Selects the output markup.
    #[must_use]
    pub fn with_markup(mut self, markup: Markup) -> Self {
        self.markup = markup;
        self
    }

    /// Resolves documentation for `request` within `snapshot`.
    pub async fn resolve(&self, snapshot: &NamespaceSnapshot, request: &ResolveRequest) -> Resolution {
        match plan(snapshot, request) {
            ResolutionPlan::Corpus { .. } => self.resolve_local(request).await,
            ResolutionPlan::Live { query } => self.resolve_live(query).await,
        }
    }

    /// Looks `request.symbol` up in the corpus and ranks the rows.
    pub async fn resolve_local(&self, request: &ResolveRequest) -> Resolution {
        let records = match self.corpus.lookup(&request.symbol).await {
            Ok(records) => records,
            Err(e) => {
                warn!(symbol = %request.symbol, error = %e, "reference corpus lookup failed");
                Vec::new()
            }
        };
        if records.is_empty() {
            return Resolution::Unavailable {
                symbol: request.symbol.clone(),
            };
        }
        Resolution::Corpus(rank(self.markup, request, records))
    }

    /// Asks the session for the doc string of `query`.
    pub async fn resolve_live(&self, query: String) -> Resolution {
        match self.gateway.query_doc_string(&query).await {
            Err(e) if e.is_cancelled() => {
                debug!(query = %query, "doc string query cancelled");
                Resolution::Superseded
            }
            Err(e) => {
                warn!(query = %query, error = %e, "doc string query failed");
                Resolution::Unavailable { symbol: query }
            }
            Ok(Some(doc)) if !doc.trim().is_empty() => {
                Resolution::Live(LiveDocumentation::new(self.markup, query, &doc))
            }
            Ok(_) => Resolution::Unavailable { symbol: query },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::parse_listing;
    use crate::workspace::dump::StructuredDump;

    fn request(symbol: &str, tree_type: &str, tree_repr: &str) -> ResolveRequest {
        ResolveRequest {
            symbol: symbol.to_string(),
            tree_type: tree_type.to_string(),
            tree_repr: tree_repr.to_string(),
            owner_path: "doc".to_string(),
        }
    }

    fn record(signature: &str) -> DocumentationRecord {
        DocumentationRecord {
            signature: signature.to_string(),
            description: "Does things.".to_string(),
            reference: "https://api.libreoffice.org".to_string(),
        }
    }

    #[test]
    fn test_plan_uses_dump_marker() {
        let dump = StructuredDump::parse(
            r#"{
                "getText": {"type": "x", "repr": "( )", "desc": "uno method"},
                "count": {"type": "int", "repr": "1", "desc": "python attribute"}
            }"#,
        );
        let snapshot = NamespaceSnapshot::new(
            "doc",
            1,
            parse_listing(["getText,function,pyuno,( )", "count,variable,int,1"]),
            dump,
        );

        assert_eq!(
            plan(&snapshot, &request("getText", "x", "( )")),
            ResolutionPlan::Corpus {
                symbol: "getText".to_string()
            }
        );
        assert_eq!(
            plan(&snapshot, &request("count", "int", "1")),
            ResolutionPlan::Live {
                query: "doc.count".to_string()
            }
        );
        assert_eq!(
            plan(&snapshot, &request("absent", "", "")),
            ResolutionPlan::Live {
                query: "doc.absent".to_string()
            }
        );
    }

    #[test]
    fn test_rank_single_candidate() {
        let docs = rank(Markup::Html, &request("Foo", "t", "anything"), vec![record("Foo()")]);
        assert_eq!(docs.matched_count(), 1);
        assert!(docs.unmatched.is_empty());
        assert_eq!(docs.matched[0].rule, Some(MatchRule::SingleCandidate));
    }

    #[test]
    fn test_rank_orders_matched_first() {
        let docs = rank(
            Markup::Html,
            &request("getByIndex", "any", "( [in] long nIndex )"),
            vec![
                record("any getByName( [in] string aName )"),
                record("any getByIndex( [in] long nIndex )"),
            ],
        );
        assert_eq!((docs.matched_count(), docs.total()), (1, 2));
        let order: Vec<_> = docs.records().map(|r| r.record.signature.as_str()).collect();
        assert_eq!(
            order,
            vec!["any getByIndex( [in] long nIndex )", "any getByName( [in] string aName )"]
        );
        assert!(docs.text().find("getByIndex").unwrap() < docs.text().find("getByName").unwrap());
    }

    #[test]
    fn test_rank_none_matched() {
        let docs = rank(
            Markup::Html,
            &request("Text", ".text.XText", "<object>"),
            vec![record("com.sun.star.text.XText getText()"), record("string Text")],
        );
        assert_eq!(docs.matched_count(), 0);
        assert_eq!(docs.total(), 2);
    }

    #[test]
    fn test_classify_live_lines() {
        let doc = "S.split(sep=None, maxsplit=-1) -> list of strings\n\
                   \n\
                   str.split(sep=None)\n\
                   split(sep)\n\
                   Return a list of the words.\n\
                   str(object='') -> str";
        let lines = classify_live_lines("text.split", doc);
        let roles: Vec<_> = lines.iter().map(|l| l.role).collect();
        assert_eq!(
            roles,
            vec![
                LineRole::Primary,
                LineRole::Plain,
                LineRole::Plain,
                LineRole::Signature,
                LineRole::Plain,
                LineRole::Signature,
            ]
        );
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, doc.split('\n').collect::<Vec<_>>());
    }

    #[test]
    fn test_full_name_call_is_signature() {
        let lines = classify_live_lines("doc.getText", "Primary\ndoc.getText(x)\nother");
        assert_eq!(lines[1].role, LineRole::Signature);
        assert_eq!(lines[2].role, LineRole::Plain);
    }

    #[test]
    fn test_unavailable_text() {
        let resolution = Resolution::Unavailable {
            symbol: "Foo".to_string(),
        };
        assert_eq!(
            resolution.text().as_deref(),
            Some("No information is available for: Foo")
        );
        assert!(Resolution::Superseded.text().is_none());
        assert!(resolution.counts().is_none());
    }
}
