//! Applicability rules for corpus records.
//!
//! Several corpus rows may document the same name (overloads, or a property
//! and its getter). The rules below decide which rows plausibly describe the
//! value actually observed in the session. They are evaluated in order and
//! the first one that holds wins; a row no rule accepts is unmatched.

use serde::Serialize;

use crate::workspace::snapshot::UNO_OBJECT_REPR;

use super::corpus::DocumentationRecord;

/// Namespace prefix of UNO API declarations.
pub const UNO_NAMESPACE: &str = "com.sun.star";

/// What is known about the selected member when classifying rows.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// Number of candidate rows for the lookup.
    pub candidates: usize,
    /// Type shown for the member.
    pub tree_type: &'a str,
    /// Repr shown for the member.
    pub tree_repr: &'a str,
}

/// Why a row was judged applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchRule {
    /// The lookup produced a single row, so there is nothing to choose.
    SingleCandidate,
    /// The observed repr occurs in the row's signature.
    ReprInSignature,
    /// The member is a UNO object and the signature declares its type.
    TypeCorrelation,
}

impl MatchRule {
    /// All rules, in precedence order.
    pub const ORDER: [MatchRule; 3] = [
        MatchRule::SingleCandidate,
        MatchRule::ReprInSignature,
        MatchRule::TypeCorrelation,
    ];

    fn holds(self, ctx: &MatchContext<'_>, record: &DocumentationRecord) -> bool {
        match self {
            MatchRule::SingleCandidate => ctx.candidates == 1,
            MatchRule::ReprInSignature => record.signature.contains(ctx.tree_repr),
            MatchRule::TypeCorrelation => {
                ctx.tree_repr == UNO_OBJECT_REPR
                    && record
                        .signature
                        .strip_prefix(UNO_NAMESPACE)
                        .is_some_and(|rest| rest.starts_with(ctx.tree_type))
            }
        }
    }
}

/// Returns the first rule accepting `record`, or `None` when it is unmatched.
pub fn classify(ctx: &MatchContext<'_>, record: &DocumentationRecord) -> Option<MatchRule> {
    MatchRule::ORDER
        .into_iter()
        .find(|rule| rule.holds(ctx, record))
}
