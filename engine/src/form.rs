use formblocks::markup::Element;
use formblocks::render::{
    render_anchor, render_block, render_count_field, render_instructions, render_submit,
};
use formblocks::{PageDefinition, Registry};

use crate::controls::{Action, Control, install_controls, installed_controls};
use crate::dom::Dom;
use crate::error::EngineError;
use crate::submission::Submission;

/// Form state for one page view: a registry per kind plus the DOM rendered
/// from them.
///
/// Every gesture handler runs to completion (registry update, DOM update,
/// control re-installation) before returning, so handlers never observe a
/// half-applied change.
#[derive(Debug, Clone)]
pub struct FormState {
    title: String,
    registries: Vec<Registry>,
    dom: Dom,
}

impl FormState {
    /// Build registries from the page's initial values and render the page.
    pub fn from_page(page: &PageDefinition) -> Self {
        let registries: Vec<Registry> = page
            .kinds
            .iter()
            .map(|def| Registry::with_initial(def.kind.clone(), def.initial.clone()))
            .collect();

        let mut form = Element::new("form")
            .attr("method", "post")
            .attr("id", "primary-form");
        for registry in &registries {
            form = form.child(render_count_field(registry.kind(), registry.len()));
        }
        if let Some(markdown) = &page.instructions {
            form = form.child(render_instructions(markdown));
        }
        for registry in &registries {
            for block in registry.blocks() {
                form = form.child(render_block(registry.kind(), block.position, &block.fields));
            }
            form = form.child(render_anchor(registry.kind()));
        }
        form = form.child(render_submit(&page.submit));

        let mut state = FormState {
            title: page.title.clone(),
            registries,
            dom: Dom::new(form),
        };
        for registry in &state.registries {
            install_controls(&mut state.dom, registry.kind(), registry.len());
        }
        state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn registries(&self) -> &[Registry] {
        &self.registries
    }

    pub fn registry(&self, kind: &str) -> Option<&Registry> {
        self.registries.iter().find(|r| r.kind().name == kind)
    }

    /// Append an empty block of `kind`, render it in front of the kind's
    /// anchor and reinstall controls. Returns the new block's position.
    pub fn on_add_clicked(&mut self, kind: &str) -> Result<usize, EngineError> {
        let index = self.index_of(kind)?;
        let registry = &mut self.registries[index];
        let position = registry.append(None);
        let kind = registry.kind();
        let values = registry
            .get(position)
            .map(|b| b.fields.clone())
            .unwrap_or_else(|| kind.empty_values());
        self.dom
            .insert_before(&kind.anchor_id(), render_block(kind, position, &values));
        self.sync(index);
        Ok(position)
    }

    /// Remove the block of `kind` at `position`, then re-render the
    /// survivors at positions 1..=N-1. Returns false if nothing changed
    /// because `position` was out of range.
    pub fn on_remove_clicked(&mut self, kind: &str, position: usize) -> Result<bool, EngineError> {
        let index = self.index_of(kind)?;
        if !self.registries[index].remove_and_renumber(position) {
            return Ok(false);
        }
        let registry = &self.registries[index];
        let kind = registry.kind();
        self.dom.remove_class(&kind.block_class());
        for block in registry.blocks() {
            self.dom.insert_before(
                &kind.anchor_id(),
                render_block(kind, block.position, &block.fields),
            );
        }
        self.sync(index);
        Ok(true)
    }

    /// Record user input into one field and refresh that block's markup.
    pub fn set_field(
        &mut self,
        kind: &str,
        position: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), EngineError> {
        let index = self.index_of(kind)?;
        let registry = &mut self.registries[index];
        registry.set_value(position, field, value)?;
        let kind = registry.kind();
        if let Some(block) = registry.get(position) {
            let rendered = render_block(kind, position, &block.fields);
            self.dom.replace_by_id(&kind.block_id(position), rendered);
        }
        self.sync(index);
        Ok(())
    }

    /// Controls the user can currently click for `kind`.
    pub fn controls(&self, kind: &str) -> Result<Vec<Control>, EngineError> {
        let index = self.index_of(kind)?;
        Ok(installed_controls(&self.dom, self.registries[index].kind()))
    }

    /// Dispatch a click on an installed control.
    pub fn click(&mut self, control: &Control) -> Result<(), EngineError> {
        match control.action {
            Action::Add => self.on_add_clicked(&control.kind).map(|_| ()),
            Action::Remove(position) => self
                .on_remove_clicked(&control.kind, position)
                .map(|_| ()),
        }
    }

    /// The fields a browser would post if the form were submitted now.
    pub fn submission(&self) -> Submission {
        Submission::from_dom(&self.dom)
    }

    /// A standalone HTML document containing the form.
    pub fn to_html(&self) -> String {
        let head = Element::new("head")
            .child(Element::new("meta").attr("charset", "utf-8"))
            .child(Element::new("title").text(self.title.as_str()));
        let body = Element::new("body")
            .child(Element::new("h1").text(self.title.as_str()))
            .child(self.dom.root().clone());
        let html = Element::new("html").attr("lang", "en").child(head).child(body);
        format!("<!DOCTYPE html>\n{}\n", html)
    }

    fn index_of(&self, kind: &str) -> Result<usize, EngineError> {
        self.registries
            .iter()
            .position(|r| r.kind().name == kind)
            .ok_or_else(|| EngineError::UnknownKind(kind.to_string()))
    }

    /// Mirror the block count into the hidden field and reinstall controls.
    fn sync(&mut self, index: usize) {
        let registry = &self.registries[index];
        let kind = registry.kind();
        if let Some(count) = self.dom.find_by_id_mut(&kind.count_field()) {
            count.set_attr("value", registry.count_value());
        }
        install_controls(&mut self.dom, kind, registry.len());
    }
}
