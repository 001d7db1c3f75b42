use ego_tree::NodeRef;
use scraper::{Html, Node};

/// Normalizes text returned by the OCR provider before it reaches API
/// consumers.
///
/// Any HTML or script-like markup is stripped (malformed markup is stripped
/// rather than rejected), newlines are collapsed to single spaces, runs of
/// whitespace are squeezed, and the result is trimmed. Pure and infallible.
pub fn sanitize_text(text: &str) -> String {
    let stripped = if text.contains('<') {
        strip_markup(text)
    } else {
        text.to_string()
    };

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_markup(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let mut out = String::new();
    collect_text(fragment.tree.root(), &mut out);
    out
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    if let Node::Element(element) = node.value() {
        // Never surface executable or presentational payloads.
        if matches!(element.name(), "script" | "style" | "noscript" | "iframe") {
            return;
        }
    }

    if let Node::Text(text) = node.value() {
        out.push_str(&text);
        out.push(' ');
    }

    for child in node.children() {
        collect_text(child, out);
    }
}
