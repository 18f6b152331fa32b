//! Integration tests for documentation resolution against a SQLite corpus
//! and a scripted session.
//!
//! ```bash
//! cargo test --test resolver_test
//! ```
mod common;

use std::sync::Arc;

use common::{FakeGateway, Outcome, corpus_with};
use uno_workspace::docs::render::LineRole;
use uno_workspace::docs::resolver::{ResolutionPlan, plan};
use uno_workspace::docs::rules::MatchRule;
use uno_workspace::docs::{DocumentationResolver, Markup, Resolution, ResolveRequest};
use uno_workspace::session::types::parse_listing;
use uno_workspace::workspace::{NamespaceSnapshot, StructuredDump};

const REFERENCE: &str = "https://api.libreoffice.org/docs/idl/ref/";

fn document_snapshot() -> NamespaceSnapshot {
    let attributes = parse_listing([
        "getByName,function,pyuno,(string)",
        "Text,variable,pyuno,pyuno object (com.sun.star.text.XText)0x1",
        "String,variable,str,Hello",
        "count,variable,int,3",
        "split,function,builtin_function_or_method,<built-in method split>",
    ]);
    let dump = StructuredDump::parse(
        r#"{
            "getByName": {"type": "any", "repr": "( [in] string aName )", "desc": "uno method"},
            "Text": {"type": ".text.XText", "repr": "pyuno object (com.sun.star.text.XText)0x1", "desc": "uno property"},
            "String": {"type": "string", "repr": "Hello", "desc": "uno property"},
            "count": {"type": "int", "repr": "3", "desc": "python attribute"}
        }"#,
    );
    NamespaceSnapshot::new("doc", 1, attributes, dump)
}

fn request(snapshot: &NamespaceSnapshot, name: &str) -> ResolveRequest {
    ResolveRequest::for_member(snapshot, name).unwrap()
}

async fn resolver(
    rows: &[common::CorpusRow<'_>],
    gateway: FakeGateway,
) -> (tempfile::TempDir, Arc<FakeGateway>, DocumentationResolver) {
    let (dir, corpus) = corpus_with(rows).await;
    let gateway = Arc::new(gateway);
    let resolver = DocumentationResolver::new(Arc::new(corpus), gateway.clone());
    (dir, gateway, resolver)
}

#[tokio::test]
async fn test_uno_member_never_queries_session() {
    let (_dir, gateway, resolver) = resolver(
        &[(
            "getByName",
            "any getByName( [in] string aName )&newline&raises ( com.sun.star.container.NoSuchElementException )",
            "Returns the element with the specified name.",
            REFERENCE,
        )],
        FakeGateway::new(),
    )
    .await;
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "getByName")).await;
    assert_eq!(gateway.doc_calls(), 0);
    assert_eq!(resolution.counts(), Some((1, 1)));
    let Resolution::Corpus(docs) = &resolution else {
        panic!("expected corpus documentation, got {resolution:?}");
    };
    assert_eq!(docs.matched[0].rule, Some(MatchRule::SingleCandidate));
    assert!(resolution.text().unwrap().contains(REFERENCE));
}

#[tokio::test]
async fn test_type_correlation_ranks_matching_row_first() {
    let (_dir, _gateway, resolver) = resolver(
        &[
            ("getText", "string getText()", "Returns the text.", REFERENCE),
            (
                "Text",
                "com.sun.star.text.XText Text",
                "The text of this object.",
                REFERENCE,
            ),
        ],
        FakeGateway::new(),
    )
    .await;
    let snapshot = document_snapshot();
    let req = request(&snapshot, "Text");
    assert_eq!(req.tree_repr, "pyuno object");

    let resolution = resolver.resolve(&snapshot, &req).await;
    assert_eq!(resolution.counts(), Some((1, 2)));
    let Resolution::Corpus(docs) = &resolution else {
        panic!("expected corpus documentation, got {resolution:?}");
    };
    assert_eq!(docs.matched[0].record.signature, "com.sun.star.text.XText Text");
    assert_eq!(docs.matched[0].rule, Some(MatchRule::TypeCorrelation));
    assert_eq!(docs.unmatched[0].record.signature, "string getText()");

    // "Returns" is emphasized on render, so match on the plain wording.
    let text = docs.text();
    let matched = text.find("The text of this object.").unwrap();
    let unmatched = text.find(" the text.").unwrap();
    assert!(matched < unmatched, "got: {text}");
}

#[tokio::test]
async fn test_no_row_applicable_reports_zero() {
    let (_dir, _gateway, resolver) = resolver(
        &[
            ("getString", "string getString()", "Returns the string.", REFERENCE),
            ("String", "[property] string String", "The string.", REFERENCE),
        ],
        FakeGateway::new(),
    )
    .await;
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "String")).await;
    assert_eq!(resolution.counts(), Some((0, 2)));
    assert!(resolution.text().unwrap().contains("lightgray"));
}

#[tokio::test]
async fn test_missing_corpus_rows_give_placeholder() {
    let (_dir, gateway, resolver) = resolver(&[], FakeGateway::new()).await;
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "getByName")).await;
    assert!(matches!(resolution, Resolution::Unavailable { .. }));
    assert_eq!(
        resolution.text().as_deref(),
        Some("No information is available for: getByName")
    );
    assert_eq!(gateway.doc_calls(), 0);
}

#[tokio::test]
async fn test_live_doc_string_keeps_line_order() {
    let doc = "int([x]) -> integer\nint(x, base=10) -> integer\n\nConvert a number or string to an integer.";
    let (_dir, gateway, resolver) =
        resolver(&[], FakeGateway::new().with_doc("doc.count", doc)).await;
    let snapshot = document_snapshot();
    let req = request(&snapshot, "count");
    assert_eq!(
        plan(&snapshot, &req),
        ResolutionPlan::Live {
            query: "doc.count".to_string()
        }
    );

    let resolution = resolver.resolve(&snapshot, &req).await;
    assert_eq!(gateway.doc_calls(), 1);
    assert!(resolution.counts().is_none());
    let Resolution::Live(live) = &resolution else {
        panic!("expected live documentation, got {resolution:?}");
    };
    let roles: Vec<_> = live.lines.iter().map(|l| l.role).collect();
    assert_eq!(
        roles,
        vec![LineRole::Primary, LineRole::Signature, LineRole::Plain, LineRole::Plain]
    );
    let texts: Vec<_> = live.lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, doc.split('\n').collect::<Vec<_>>());
}

#[tokio::test]
async fn test_member_without_dump_entry_is_live() {
    let (_dir, gateway, resolver) = resolver(
        &[],
        FakeGateway::new().with_doc("doc.split", "split(sep=None)\nReturn a list."),
    )
    .await;
    let resolver = resolver.with_markup(Markup::Markdown);
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "split")).await;
    assert_eq!(gateway.doc_calls(), 1);
    assert!(resolution.text().unwrap().contains("**split**(sep=None)"));
}

#[tokio::test]
async fn test_cancelled_live_query_is_superseded() {
    let gateway = FakeGateway::new();
    gateway.script_doc("doc.count", Outcome::Cancel);
    let (_dir, _gateway, resolver) = resolver(&[], gateway).await;
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "count")).await;
    assert!(matches!(resolution, Resolution::Superseded));
    assert!(resolution.text().is_none());
}

#[tokio::test]
async fn test_failed_or_empty_live_query_gives_placeholder() {
    let gateway = FakeGateway::new();
    gateway.script_doc("doc.count", Outcome::Fail("AttributeError".to_string()));
    let (_dir, _gateway, resolver) = resolver(&[], gateway).await;
    let snapshot = document_snapshot();

    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "count")).await;
    assert_eq!(
        resolution.text().as_deref(),
        Some("No information is available for: doc.count")
    );

    // Unscripted queries answer with no doc string.
    let resolution = resolver.resolve(&snapshot, &request(&snapshot, "split")).await;
    assert!(matches!(resolution, Resolution::Unavailable { .. }));
}
