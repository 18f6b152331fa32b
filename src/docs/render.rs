//! Rendering of documentation with relevance and keyword emphasis.
//!
//! Corpus text encodes line breaks as `&newline&`. Rendering decodes them,
//! escapes the text for the target markup, then flags keywords by category:
//! structural section headers, cross references, and warnings.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::corpus::DocumentationRecord;

/// Line break marker used by the corpus.
const NEWLINE_MARKER: &str = "&newline&";

static STRUCTURAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:Parameters|Exceptions|Returns|Enumerator)\b").expect("valid regex")
});

static CROSS_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:See also|See Also|Reference)\b").expect("valid regex"));

static WARNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Deprecated|Attention)\b").expect("valid regex"));

static RAISES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:set raises|get raises|raises)\b").expect("valid regex"));

/// Target markup for rendered documentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Markup {
    /// Inline-styled HTML for rich text widgets.
    #[default]
    Html,
    /// Markdown for chat and terminal consumers.
    Markdown,
}

impl Markup {
    fn escape(self, text: &str) -> String {
        match self {
            Markup::Html => text
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;"),
            Markup::Markdown => text.to_string(),
        }
    }

    fn strong(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<strong>{text}</strong>"),
            Markup::Markdown => format!("**{text}**"),
        }
    }

    fn warning(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<span style=\"font-weight:bold;color:red\">{text}</span>"),
            Markup::Markdown => format!("***{text}***"),
        }
    }

    fn structural(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<p style='font-weight:bold'>{text}</p>"),
            Markup::Markdown => format!("\n\n**{text}**\n\n"),
        }
    }

    fn cross_reference(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<p style='font-weight:bold;color:blue'>{text}</p>"),
            Markup::Markdown => format!("\n\n**_{text}_**\n\n"),
        }
    }

    fn line_break(self) -> &'static str {
        match self {
            Markup::Html => "<br>",
            Markup::Markdown => "  \n",
        }
    }

    fn paragraph_break(self) -> &'static str {
        match self {
            Markup::Html => "<p></p>",
            Markup::Markdown => "\n\n",
        }
    }

    fn paragraph(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<p>{text}</p>"),
            Markup::Markdown => format!("{text}\n\n"),
        }
    }

    /// A block with a highlight background (best evidence).
    fn highlighted(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<p style = 'background-color: palegreen'>{text}</p>"),
            Markup::Markdown => format!("> {text}\n\n"),
        }
    }

    /// A block with a muted background (weak evidence).
    fn muted(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<p style = 'background-color: lightgray'>{text}</p>"),
            Markup::Markdown => format!("{text}\n\n"),
        }
    }
}

/// Emphasizes the whole-word occurrences of `names` and the `raises` clauses
/// in a signature.
pub fn format_signature(markup: Markup, signature: &str, names: &[&str]) -> String {
    let text = markup.escape(&signature.replace(NEWLINE_MARKER, "\n"));

    let alternatives: Vec<String> = names
        .iter()
        .filter(|n| !n.is_empty())
        .map(|n| regex::escape(n))
        .collect();
    let text = match Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))) {
        Ok(re) if !alternatives.is_empty() => re
            .replace_all(&text, |caps: &Captures<'_>| markup.strong(&caps[0]))
            .into_owned(),
        _ => text,
    };

    let text = RAISES.replace_all(&text, |caps: &Captures<'_>| markup.warning(&caps[0]));
    text.replace('\n', markup.line_break())
}

/// Flags section headers, cross references and warnings in a description.
pub fn format_description(markup: Markup, description: &str) -> String {
    let text = description
        .replace("&newline&&newline&", "\n")
        .replace(NEWLINE_MARKER, "\n");
    let text = markup.escape(&text);

    let text = STRUCTURAL.replace_all(&text, |caps: &Captures<'_>| markup.structural(&caps[0]));
    let text =
        CROSS_REFERENCE.replace_all(&text, |caps: &Captures<'_>| markup.cross_reference(&caps[0]));
    let text = WARNING.replace_all(&text, |caps: &Captures<'_>| markup.warning(&caps[0]));
    text.replace('\n', markup.paragraph_break())
}

/// Renders one corpus row: the signature block, colored by applicability,
/// followed by its description and reference link.
pub fn render_record(
    markup: Markup,
    record: &DocumentationRecord,
    names: &[&str],
    matched: bool,
) -> String {
    let signature = format_signature(markup, &record.signature, names);
    let signature = if matched {
        markup.highlighted(&signature)
    } else {
        markup.muted(&signature)
    };

    let description = format!(
        "{}{NEWLINE_MARKER}Reference {NEWLINE_MARKER}{}",
        record.description, record.reference
    );
    let description = markup.paragraph(&format_description(markup, &description));

    signature + &description
}

/// How a line of a live doc string is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineRole {
    /// The first, definitional line.
    Primary,
    /// A call signature.
    Signature,
    /// Anything else.
    Plain,
}

/// Renders one line of a live doc string. `symbol` is the trailing name of
/// the queried object, emphasized inside the primary line.
pub fn render_live_line(markup: Markup, role: LineRole, line: &str, symbol: &str) -> String {
    let text = markup.escape(line);
    let inner = match role {
        LineRole::Primary => {
            let text = if symbol.is_empty() {
                text
            } else {
                text.replace(&markup.escape(symbol), &markup.strong(&markup.escape(symbol)))
            };
            markup.highlighted(&text)
        }
        LineRole::Signature => markup.strong(&text),
        LineRole::Plain => format!("{text}\n"),
    };
    match markup {
        Markup::Html => markup.paragraph(&inner),
        Markup::Markdown => match role {
            LineRole::Primary => inner,
            _ => format!("{}  \n", inner.trim_end_matches('\n')),
        },
    }
}
