//! Tree descriptions produced by templates.
//!
//! A [`View`] is what a component's template returns and what the
//! [`TemplateRenderer`](crate::host::TemplateRenderer) diffs against a mounted
//! surface. It carries no behaviour of its own.

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// A node in a template's output tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    /// Renders nothing.
    #[default]
    Empty,
    /// A text node.
    Text(String),
    /// An element with attributes and children.
    Node(ViewNode),
    /// Siblings without a wrapping element.
    Fragment(Vec<View>),
    /// Trusted markup, written out unescaped.
    Raw(String),
}

/// Namespace an element node is created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Element node within a [`View`].
#[derive(Debug, Clone, PartialEq)]
pub struct ViewNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<View>,
    pub namespace: Namespace,
}

impl View {
    /// Text node.
    pub fn text(content: impl Into<String>) -> Self {
        View::Text(content.into())
    }

    /// Start an element node.
    pub fn node(tag: impl Into<String>) -> ViewNode {
        ViewNode::new(tag)
    }

    /// Trusted markup. Never escaped, so it must not carry user input.
    pub fn raw(markup: impl Into<String>) -> Self {
        View::Raw(markup.into())
    }

    /// Fragment of sibling views.
    pub fn fragment(children: impl IntoIterator<Item = View>) -> Self {
        View::Fragment(children.into_iter().collect())
    }

    /// Serialize to HTML-like markup. Text and attribute values are escaped,
    /// raw nodes are not. The outermost SVG element gets the SVG `xmlns`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out, Namespace::Html);
        out
    }

    fn write_markup(&self, out: &mut String, parent: Namespace) {
        match self {
            View::Empty => {}
            View::Text(text) => escape_into(out, text),
            View::Raw(markup) => out.push_str(markup),
            View::Fragment(children) => {
                for child in children {
                    child.write_markup(out, parent);
                }
            }
            View::Node(node) => {
                out.push('<');
                out.push_str(&node.tag);
                if node.namespace == Namespace::Svg && parent != Namespace::Svg {
                    out.push_str(" xmlns=\"");
                    out.push_str(SVG_NAMESPACE);
                    out.push('"');
                }
                for (name, value) in &node.attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(out, value);
                    out.push('"');
                }
                out.push('>');
                for child in &node.children {
                    child.write_markup(out, node.namespace);
                }
                out.push_str("</");
                out.push_str(&node.tag);
                out.push('>');
            }
        }
    }
}

impl ViewNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            namespace: Namespace::Html,
        }
    }

    /// Start an element node in the SVG namespace. Element children of an
    /// SVG node should be created with `svg` as well.
    pub fn svg(tag: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::Svg,
            ..Self::new(tag)
        }
    }

    /// Set an attribute, replacing any earlier value for the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let name = name.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    /// Set `class` to the names whose flag is true, in order. Replaces any
    /// earlier `class`; with no active names the attribute is left out.
    pub fn class_map<'a>(mut self, classes: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let joined = classes
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(" ");
        self.attributes.retain(|(n, _)| n != "class");
        if joined.is_empty() {
            return self;
        }
        self.attr("class", joined)
    }

    /// Set `style` from property/value pairs. Empty values are skipped.
    pub fn style_map<'a>(mut self, styles: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let declarations = styles
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.attributes.retain(|(n, _)| n != "style");
        if declarations.is_empty() {
            return self;
        }
        self.attr("style", declarations)
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = View>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a text child.
    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(View::text(content))
    }
}

impl From<ViewNode> for View {
    fn from(node: ViewNode) -> Self {
        View::Node(node)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup() {
        let view: View = View::node("p")
            .attr("class", "count")
            .text("Count: ")
            .child(View::node("b").text("3"))
            .into();
        assert_eq!(view.to_markup(), "<p class=\"count\">Count: <b>3</b></p>");
    }

    #[test]
    fn test_markup_escapes() {
        let view: View = View::node("span").attr("title", "a\"b").text("<&>").into();
        assert_eq!(
            view.to_markup(),
            "<span title=\"a&quot;b\">&lt;&amp;&gt;</span>"
        );
    }

    #[test]
    fn test_attr_replaces() {
        let node = View::node("div").attr("id", 1).attr("id", 2);
        assert_eq!(node.attributes, vec![("id".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_fragment_and_empty() {
        let view = View::fragment([View::text("a"), View::Empty, View::text("b")]);
        assert_eq!(view.to_markup(), "ab");
        assert_eq!(View::default().to_markup(), "");
    }

    #[test]
    fn test_class_map() {
        let node = View::node("li").class_map([("item", true), ("active", false), ("done", true)]);
        assert_eq!(
            View::from(node).to_markup(),
            "<li class=\"item done\"></li>"
        );

        let none = View::node("li").attr("class", "old").class_map([("active", false)]);
        assert!(none.attributes.is_empty());
    }

    #[test]
    fn test_style_map() {
        let node = View::node("div").style_map([("color", "red"), ("margin", ""), ("top", "2px")]);
        assert_eq!(
            node.attributes,
            vec![("style".to_string(), "color: red; top: 2px;".to_string())]
        );
    }

    #[test]
    fn test_raw_is_not_escaped() {
        let view: View = View::node("div")
            .child(View::raw("<b>bold</b>"))
            .text("<b>")
            .into();
        assert_eq!(view.to_markup(), "<div><b>bold</b>&lt;b&gt;</div>");
    }

    #[test]
    fn test_svg_namespace_on_outermost_node() {
        let view: View = View::node("div")
            .child(ViewNode::svg("svg").attr("width", 10).child(ViewNode::svg("circle").attr("r", 4)))
            .into();
        assert_eq!(
            view.to_markup(),
            "<div><svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\"><circle r=\"4\"></circle></svg></div>"
        );
        assert_eq!(ViewNode::svg("g").namespace, Namespace::Svg);
        assert_eq!(ViewNode::new("g").namespace, Namespace::Html);
    }
}
