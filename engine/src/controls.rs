use formblocks::BlockKind;
use formblocks::markup::{Element, Node};

use crate::dom::Dom;

const ADD_ICON: &str = "/images/add.gif";
const REMOVE_ICON: &str = "/images/del.gif";

/// Attribute naming the kind a control wrapper drives. Rendered fields carry
/// no `data-` attributes, so field names cannot collide with it.
const CONTROL_MARKER: &str = "data-controls";

/// What clicking a control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append an empty block at the end of the list.
    Add,
    /// Remove the block at this position and renumber the rest.
    Remove(usize),
}

/// A clickable add/remove control installed in the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub kind: String,
    pub action: Action,
}

/// Drop any add/remove controls for `kind`, then give each of the `count`
/// rendered blocks a remove control and the last one an add control.
///
/// Positions and the identity of the last block shift on every structural
/// change, so this runs after each append or removal.
pub fn install_controls(dom: &mut Dom, kind: &BlockKind, count: usize) {
    let removed = dom.remove_where(|e| is_control_of(e, kind));
    tracing::trace!(kind = %kind.name, removed, count, "installing controls");
    for position in 1..=count {
        let Some(block) = dom.find_by_id_mut(&kind.block_id(position)) else {
            tracing::warn!(kind = %kind.name, position, "no rendered block for control");
            continue;
        };
        let mut controls = vec![button(kind, Action::Remove(position))];
        if position == count {
            controls.push(button(kind, Action::Add));
        }
        attach(block, controls);
    }
}

/// Controls currently installed for `kind`, in document order.
pub fn installed_controls(dom: &Dom, kind: &BlockKind) -> Vec<Control> {
    dom.elements_where(|e| is_control_of(e, kind))
        .into_iter()
        .flat_map(|span| span.child_elements())
        .filter_map(parse_action)
        .map(|action| Control {
            kind: kind.name.clone(),
            action,
        })
        .collect()
}

fn is_control_of(element: &Element, kind: &BlockKind) -> bool {
    element.get_attr(CONTROL_MARKER) == Some(kind.name.as_str())
}

/// Controls sit beside the first field of a block, as on the original pages,
/// or at the end of the block when it has no labeled field.
fn attach(block: &mut Element, controls: Vec<Element>) {
    let nodes = controls.into_iter().map(Node::Element);
    let host = block.children.iter_mut().find_map(|n| match n {
        Node::Element(e) if e.has_class("labeled-field") => Some(e),
        _ => None,
    });
    match host {
        Some(field) => field.children.extend(nodes),
        None => block.children.extend(nodes),
    }
}

fn button(kind: &BlockKind, action: Action) -> Element {
    let noun = kind.legend.to_lowercase();
    let img = match action {
        Action::Add => Element::new("img")
            .attr("src", ADD_ICON)
            .attr("class", "clickable")
            .attr("title", format!("Add another {}", noun))
            .attr("data-action", "add"),
        Action::Remove(position) => Element::new("img")
            .attr("src", REMOVE_ICON)
            .attr("class", "clickable")
            .attr("title", format!("Remove {}", noun))
            .attr("data-action", "remove")
            .attr("data-position", position.to_string()),
    };
    Element::new("span")
        .attr("class", kind.button_class())
        .attr(CONTROL_MARKER, kind.name.clone())
        .child(img)
}

fn parse_action(img: &Element) -> Option<Action> {
    match img.get_attr("data-action")? {
        "add" => Some(Action::Add),
        "remove" => img
            .get_attr("data-position")?
            .parse()
            .ok()
            .map(Action::Remove),
        _ => None,
    }
}
