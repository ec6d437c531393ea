use std::fmt;

/// Elements that never carry children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["input", "img", "br", "hr", "meta"];

/// A node in the rendered page tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Text content, escaped on output.
    Text(String),
    /// Pre-rendered HTML written verbatim (Markdown output only).
    Raw(String),
}

/// A markup element with attributes kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.children.push(Node::Element(element));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn raw(mut self, html: impl Into<String>) -> Self {
        self.children.push(Node::Raw(html.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place so the
    /// attribute order never changes.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Concatenated text of the direct text children.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Node::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// This element and every element below it, in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = vec![self];
        for child in self.child_elements() {
            out.extend(child.descendants());
        }
        out
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|c| c.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id() == Some(id) {
            return Some(self);
        }
        for child in &mut self.children {
            if let Node::Element(e) = child {
                if let Some(found) = e.find_by_id_mut(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Remove every descendant element carrying `class`. Returns how many went.
    pub fn remove_class(&mut self, class: &str) -> usize {
        self.remove_where(&|e: &Element| e.has_class(class))
    }

    /// Remove every descendant element matching `pred`, without descending
    /// into the removed ones. Returns how many went.
    pub fn remove_where<F: Fn(&Element) -> bool>(&mut self, pred: &F) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, Node::Element(e) if pred(e)));
        let mut removed = before - self.children.len();
        for child in &mut self.children {
            if let Node::Element(e) = child {
                removed += e.remove_where(pred);
            }
        }
        removed
    }

    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

/// Escape text for use in element content or a double-quoted attribute.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            write!(f, " {}=\"{}\"", name, escape(value))?;
        }
        write!(f, ">")?;
        if self.is_void() {
            return Ok(());
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(e) => write!(f, "{}", e),
            Node::Text(t) => write!(f, "{}", escape(t)),
            Node::Raw(html) => write!(f, "{}", html),
        }
    }
}
