//! Table-of-contents extraction from rendered markup.

use serde::Serialize;

/// One heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// The heading's `id` attribute.
    pub id: String,
    /// Plain heading text.
    pub text: String,
}

/// Scan final HTML for `<h1>`-`<h6>` elements that carry an `id` attribute,
/// keeping levels inside the inclusive `levels` range, in document order.
pub fn extract_toc(html: &str, levels: (u8, u8)) -> Vec<TocEntry> {
    let (min, max) = levels;
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return Vec::new();
    };
    let parser = dom.parser();

    let mut toc = Vec::new();
    for node_handle in dom.nodes().iter().filter_map(|n| n.as_tag()) {
        let name = node_handle.name().as_utf8_str();
        let Some(level) = heading_level(&name) else {
            continue;
        };
        if level < min || level > max {
            continue;
        }
        let Some(id) = node_handle
            .attributes()
            .get("id")
            .flatten()
            .map(|v| v.as_utf8_str().to_string())
        else {
            continue;
        };

        let text = node_handle.inner_text(parser).trim().to_string();
        toc.push(TocEntry { level, id, text });
    }

    toc
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"
        <h1 id="top">Top</h1>
        <h2 id="intro">Intro</h2>
        <h3 id="details">Details</h3>
        <h4 id="fine">Fine print</h4>
        <h5 id="tiny">Tiny</h5>
        <h2>No id here</h2>
    "#;

    #[test]
    fn test_default_range_filters_levels() {
        let toc = extract_toc(HTML, (2, 4));
        let ids: Vec<_> = toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "details", "fine"]);
    }

    #[test]
    fn test_headings_without_id_are_skipped() {
        let toc = extract_toc(HTML, (1, 6));
        assert!(toc.iter().all(|e| !e.id.is_empty()));
        assert_eq!(toc.len(), 5);
    }

    #[test]
    fn test_entry_fields() {
        let toc = extract_toc("<h2 id=\"a-b\">A and <em>B</em></h2>", (2, 4));
        assert_eq!(
            toc,
            vec![TocEntry {
                level: 2,
                id: "a-b".into(),
                text: "A and B".into(),
            }]
        );
    }

    #[test]
    fn test_document_order() {
        let html = "<h3 id=\"later\">L</h3><h2 id=\"first\">F</h2>";
        let toc = extract_toc(html, (2, 4));
        assert_eq!(toc[0].id, "later");
        assert_eq!(toc[1].id, "first");
    }
}
