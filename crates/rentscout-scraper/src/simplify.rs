//! HTML simplification before extraction.
//!
//! Listing fragments and detail pages carry scripts, styling, and attribute
//! noise that inflate the provider token count without adding property
//! information. Simplification rebuilds the node tree keeping only content:
//! `script`/`style`/`iframe`/`noscript` subtrees are dropped, attributes
//! other than `class`/`id`/`href`/`src` are stripped, and `div`/`span`
//! elements with no text and no child elements are removed.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

const DROP_TAGS: &[&str] = &["script", "style", "iframe", "noscript"];
const KEEP_ATTRS: &[&str] = &["class", "id", "href", "src"];

/// Wrapper elements emitted by fragment parsing; their children are kept but
/// the tags themselves carry nothing.
const UNWRAP_TAGS: &[&str] = &["html", "head", "body"];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Rewrites an HTML fragment (or full page) into a reduced form for
/// extraction. Text content is preserved verbatim; only markup is reduced.
#[must_use]
pub fn simplify_fragment(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len() / 2);
    for child in fragment.tree.root().children() {
        write_node(child, &mut out);
    }
    out
}

/// True when the node's subtree contains no elements and no non-blank text.
fn is_blank(node: NodeRef<'_, Node>) -> bool {
    node.descendants().skip(1).all(|d| match d.value() {
        Node::Element(_) => false,
        Node::Text(text) => text.trim().is_empty(),
        _ => true,
    })
}

fn write_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text),
        Node::Element(el) => {
            let name = el.name();
            if DROP_TAGS.contains(&name) {
                return;
            }
            if UNWRAP_TAGS.contains(&name) {
                for child in node.children() {
                    write_node(child, out);
                }
                return;
            }
            if (name == "div" || name == "span") && is_blank(node) {
                return;
            }

            out.push('<');
            out.push_str(name);
            for (attr, value) in el.attrs() {
                if KEEP_ATTRS.contains(&attr) {
                    out.push(' ');
                    out.push_str(attr);
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_TAGS.contains(&name) {
                return;
            }
            for child in node.children() {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_script_style_iframe_noscript() {
        let html = r#"<div class="card"><script>track()</script><style>.x{}</style>
            <iframe src="/ad"></iframe><noscript>enable js</noscript>
            <p>Oudegracht 1</p></div>"#;
        let simplified = simplify_fragment(html);
        assert!(simplified.contains("Oudegracht 1"));
        assert!(!simplified.contains("track()"));
        assert!(!simplified.contains(".x{}"));
        assert!(!simplified.contains("iframe"));
        assert!(!simplified.contains("enable js"));
    }

    #[test]
    fn strips_non_essential_attributes() {
        let html = r#"<a href="/listing/1" data-testid="card" onclick="go()"
            style="color:red" class="title">Biltstraat 2</a>"#;
        let simplified = simplify_fragment(html);
        assert!(simplified.contains(r#"href="/listing/1""#));
        assert!(simplified.contains(r#"class="title""#));
        assert!(!simplified.contains("data-testid"));
        assert!(!simplified.contains("onclick"));
        assert!(!simplified.contains("style="));
    }

    #[test]
    fn removes_empty_divs_and_spans() {
        let html = r#"<div><span class="spacer">  </span><div></div>
            <span>€1.250</span></div>"#;
        let simplified = simplify_fragment(html);
        assert!(simplified.contains("€1.250"));
        assert!(!simplified.contains("spacer"));
    }

    #[test]
    fn keeps_div_wrapping_only_an_image() {
        let html = r#"<div class="photo"><img src="/p/1.jpg" loading="lazy"></div>"#;
        let simplified = simplify_fragment(html);
        assert!(simplified.contains(r#"<div class="photo">"#));
        assert!(simplified.contains(r#"<img src="/p/1.jpg">"#));
        assert!(!simplified.contains("loading"));
    }

    #[test]
    fn unwraps_document_scaffolding() {
        let html = "<html><body><p>Kanaalweg 1</p></body></html>";
        let simplified = simplify_fragment(html);
        assert!(simplified.contains("<p>Kanaalweg 1</p>"));
        assert!(!simplified.contains("<body>"));
    }

    #[test]
    fn output_is_smaller_for_noisy_input() {
        let html = r#"<div class="l" data-a="1" data-b="2" data-c="3" aria-label="x">
            <script>var a = "lots of javascript here";</script>
            <span>75 m²</span><span></span><span>  </span></div>"#;
        let simplified = simplify_fragment(html);
        assert!(simplified.len() < html.len());
        assert!(simplified.contains("75 m²"));
    }
}
