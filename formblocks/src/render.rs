//! Renderer: turns blocks and page furniture into markup elements.
//!
//! Output is a pure function of its inputs, so re-rendering a block from
//! collected values after a renumbering yields the same structure a fresh
//! render at that position would.

use pulldown_cmark::{Options, Parser as CmarkParser};

use crate::block::FieldValues;
use crate::kind::{BlockKind, Widget};
use crate::markup::Element;

/// Render the block of `kind` at `position`, pre-filled from `values`.
/// Fields absent from `values` render empty.
pub fn render_block(kind: &BlockKind, position: usize, values: &FieldValues) -> Element {
    let mut block = Element::new("fieldset")
        .attr("class", kind.block_class())
        .attr("id", kind.block_id(position))
        .child(Element::new("legend").text(kind.legend.as_str()));

    for field in &kind.fields {
        let id = kind.field_id(&field.name, position);
        let value = values.get(&field.name).map(String::as_str).unwrap_or("");
        let input = match field.widget {
            Widget::Text => Element::new("input")
                .attr("class", kind.field_prefix(&field.name))
                .attr("name", id.as_str())
                .attr("id", id.as_str())
                .attr("value", value),
            Widget::TextArea => Element::new("textarea")
                .attr("class", kind.field_prefix(&field.name))
                .attr("name", id.as_str())
                .attr("id", id.as_str())
                .text(value),
        };
        let labeled = Element::new("div")
            .attr("class", "labeled-field")
            .child(
                Element::new("label")
                    .attr("for", id.as_str())
                    .text(field.label.as_str()),
            )
            .child(input);
        block = block.child(labeled);
    }
    block
}

/// Read the current field values back out of a rendered block.
///
/// Returns `None` if any schema field has no input in `block`.
pub fn extract_values(kind: &BlockKind, block: &Element, position: usize) -> Option<FieldValues> {
    let mut values = FieldValues::new();
    for field in &kind.fields {
        let input = block.find_by_id(&kind.field_id(&field.name, position))?;
        values.insert(field.name.clone(), input_value(input));
    }
    Some(values)
}

/// The value a browser would submit for a form control.
pub fn input_value(input: &Element) -> String {
    if input.tag == "textarea" {
        input.text_content()
    } else {
        input.get_attr("value").unwrap_or("").to_string()
    }
}

/// Hidden field mirroring the number of blocks of `kind`.
pub fn render_count_field(kind: &BlockKind, count: usize) -> Element {
    Element::new("input")
        .attr("type", "hidden")
        .attr("name", kind.count_field())
        .attr("id", kind.count_field())
        .attr("value", count.to_string())
}

/// Invisible marker that new blocks of `kind` are inserted in front of.
pub fn render_anchor(kind: &BlockKind) -> Element {
    Element::new("span")
        .attr("class", "block-anchor")
        .attr("id", kind.anchor_id())
        .attr("hidden", "hidden")
}

/// Instructions fieldset; `markdown` is rendered to HTML.
pub fn render_instructions(markdown: &str) -> Element {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = CmarkParser::new_ext(markdown, options);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    Element::new("fieldset")
        .attr("class", "instructions")
        .child(Element::new("legend").text("Instructions"))
        .raw(html)
}

pub fn render_submit(label: &str) -> Element {
    Element::new("input")
        .attr("type", "submit")
        .attr("name", "request")
        .attr("id", "submit")
        .attr("value", label)
}
