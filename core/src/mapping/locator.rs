//! Node paths and attribute locators.
//!
//! A locator names where one attribute's value lives relative to a context
//! node. The source syntax is parsed once, at declaration time, into one of
//! four shapes:
//!
//! | source       | meaning                                    |
//! |--------------|--------------------------------------------|
//! | `.`          | text content of the context node           |
//! | `@id`        | attribute `id` of the context node         |
//! | `urls/url`   | text content of the node at a path         |
//! | `owner@nsid` | attribute `nsid` of the node at a path     |
//!
//! Path selection: the first segment is matched against the context node
//! itself and all its descendants, in document order; every further segment
//! is matched against children only. A document context stands for its root
//! element.

use std::fmt;

use roxmltree::Node;
use tracing::trace;

/// A `/`-separated element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<String>,
}

impl NodePath {
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every node matching this path, in document order.
    pub fn select<'a, 'input>(&self, context: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
        let Some((first, rest)) = self.segments.split_first() else {
            return vec![element_context(context)];
        };
        let mut matches: Vec<Node<'a, 'input>> = element_context(context)
            .descendants()
            .filter(|node| node.is_element() && node.has_tag_name(first.as_str()))
            .collect();
        for segment in rest {
            matches = matches
                .into_iter()
                .flat_map(|node| node.children())
                .filter(|node| node.is_element() && node.has_tag_name(segment.as_str()))
                .collect();
        }
        matches
    }

    pub fn first<'a, 'input>(&self, context: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
        self.select(context).into_iter().next()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Text,
    Attribute(String),
    PathText(NodePath),
    PathAttribute(NodePath, String),
}

impl Locator {
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        match source.split_once('@') {
            Some((path, attribute)) if path.is_empty() || path == "." => Locator::Attribute(attribute.to_string()),
            Some((path, attribute)) => Locator::PathAttribute(NodePath::parse(path), attribute.to_string()),
            None if source == "." => Locator::Text,
            None => Locator::PathText(NodePath::parse(source)),
        }
    }

    /// Extract this locator's value from `context`. Empty values count as
    /// no match.
    pub fn extract(&self, context: Node<'_, '_>) -> Option<String> {
        let context = element_context(context);
        let value = match self {
            Locator::Text => Some(inner_text(context)),
            Locator::Attribute(name) => context.attribute(name.as_str()).map(str::to_string),
            Locator::PathText(path) => path.first(context).map(inner_text),
            Locator::PathAttribute(path, name) => path
                .first(context)
                .and_then(|node| node.attribute(name.as_str()))
                .map(str::to_string),
        };
        let value = value.filter(|v| !v.trim().is_empty());
        if value.is_none() {
            trace!(locator = %self, "no match");
        }
        value
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Text => f.write_str("."),
            Locator::Attribute(name) => write!(f, "@{name}"),
            Locator::PathText(path) => write!(f, "{path}"),
            Locator::PathAttribute(path, name) => write!(f, "{path}@{name}"),
        }
    }
}

/// Concatenated descendant text, trimmed.
pub fn inner_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn element_context<'a, 'input>(node: Node<'a, 'input>) -> Node<'a, 'input> {
    if node.is_root() {
        node.first_element_child().unwrap_or(node)
    } else {
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOTO: &str = r#"<rsp stat="ok">
        <photo id="42" owner="9@N01" farm="4">
            <owner nsid="9@N01" username="reagent"/>
            <title>Creels</title>
            <description></description>
            <urls><url type="photopage">http://example.com/42/</url></urls>
        </photo>
    </rsp>"#;

    fn with_photo<R>(f: impl FnOnce(Node) -> R) -> R {
        let document = roxmltree::Document::parse(PHOTO).unwrap();
        let photo = document.descendants().find(|n| n.has_tag_name("photo")).unwrap();
        f(photo)
    }

    #[test]
    fn parse_recognises_each_shape() {
        assert_eq!(Locator::parse("."), Locator::Text);
        assert_eq!(Locator::parse("@id"), Locator::Attribute("id".to_string()));
        assert_eq!(
            Locator::parse("owner@nsid"),
            Locator::PathAttribute(NodePath::parse("owner"), "nsid".to_string())
        );
        assert_eq!(Locator::parse("urls/url"), Locator::PathText(NodePath::parse("urls/url")));
    }

    #[test]
    fn display_round_trips_source() {
        for source in [".", "@id", "owner@nsid", "shapedata/urls/shapefile"] {
            assert_eq!(Locator::parse(source).to_string(), source);
        }
    }

    #[test]
    fn extracts_attributes_and_text() {
        with_photo(|photo| {
            assert_eq!(Locator::parse("@id").extract(photo).as_deref(), Some("42"));
            assert_eq!(Locator::parse("owner@username").extract(photo).as_deref(), Some("reagent"));
            assert_eq!(Locator::parse("title").extract(photo).as_deref(), Some("Creels"));
            assert_eq!(Locator::parse("urls/url").extract(photo).as_deref(), Some("http://example.com/42/"));
        });
    }

    #[test]
    fn empty_and_missing_values_do_not_match() {
        with_photo(|photo| {
            assert_eq!(Locator::parse("description").extract(photo), None);
            assert_eq!(Locator::parse("@secret").extract(photo), None);
            assert_eq!(Locator::parse("dates@posted").extract(photo), None);
        });
    }

    #[test]
    fn document_context_is_root_element() {
        let document = roxmltree::Document::parse(r#"<rsp stat="ok"><photoid>77</photoid></rsp>"#).unwrap();
        assert_eq!(Locator::parse("photoid").extract(document.root()).as_deref(), Some("77"));
        assert_eq!(Locator::parse("@stat").extract(document.root()).as_deref(), Some("ok"));
    }

    #[test]
    fn select_preserves_document_order() {
        let document = roxmltree::Document::parse(
            r#"<rsp><photos page="1"><photo id="a"/><photo id="b"/><other/><photo id="c"/></photos></rsp>"#,
        )
        .unwrap();
        let ids: Vec<_> = NodePath::parse("photos/photo")
            .select(document.root())
            .iter()
            .filter_map(|n| n.attribute("id"))
            .collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(NodePath::parse("rsp/photos").select(document.root()).len(), 1);
    }

    #[test]
    fn inner_text_joins_nested_text() {
        let document = roxmltree::Document::parse("<place> Wellington, <b>NZ</b> </place>").unwrap();
        assert_eq!(inner_text(document.root_element()), "Wellington, NZ");
    }
}
