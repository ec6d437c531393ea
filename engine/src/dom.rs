use std::fmt;

use formblocks::markup::{Element, Node};

/// The rendered page: a projection of registry state that can always be
/// rebuilt from it. Nothing reads state back out of the DOM except the
/// submission, which does exactly what a browser would.
#[derive(Debug, Clone)]
pub struct Dom {
    root: Element,
}

impl Dom {
    pub fn new(root: Element) -> Self {
        Dom { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.find_by_id(id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_by_id_mut(id)
    }

    /// Elements carrying `class`, in document order.
    pub fn elements_with_class(&self, class: &str) -> Vec<&Element> {
        self.root
            .descendants()
            .into_iter()
            .filter(|e| e.has_class(class))
            .collect()
    }

    /// Insert `element` as the sibling immediately before the element with
    /// id `anchor_id`. Appends to the root if no such anchor exists.
    pub fn insert_before(&mut self, anchor_id: &str, element: Element) {
        if let Err(element) = insert_before_in(&mut self.root, anchor_id, element) {
            tracing::warn!(anchor = anchor_id, "insertion anchor missing, appending to form");
            self.root.children.push(Node::Element(element));
        }
    }

    /// Swap the element with id `id` for `element`. Returns false if absent.
    pub fn replace_by_id(&mut self, id: &str, element: Element) -> bool {
        match self.root.find_by_id_mut(id) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    /// Remove every element carrying `class`; returns how many were removed.
    pub fn remove_class(&mut self, class: &str) -> usize {
        self.root.remove_class(class)
    }

    /// Remove every element matching `pred`; returns how many were removed.
    pub fn remove_where<F: Fn(&Element) -> bool>(&mut self, pred: F) -> usize {
        self.root.remove_where(&pred)
    }

    /// Elements matching `pred`, in document order.
    pub fn elements_where<F: Fn(&Element) -> bool>(&self, pred: F) -> Vec<&Element> {
        self.root
            .descendants()
            .into_iter()
            .filter(|e| pred(e))
            .collect()
    }
}

fn insert_before_in(parent: &mut Element, anchor_id: &str, element: Element) -> Result<(), Element> {
    let found = parent
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.id() == Some(anchor_id)));
    if let Some(index) = found {
        parent.children.insert(index, Node::Element(element));
        return Ok(());
    }
    let mut element = element;
    for child in &mut parent.children {
        if let Node::Element(e) = child {
            match insert_before_in(e, anchor_id, element) {
                Ok(()) => return Ok(()),
                Err(back) => element = back,
            }
        }
    }
    Err(element)
}

impl fmt::Display for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}
