use super::*;
use crate::html::{leading_doctype, parse_html};

/// One link of the navigation index, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    /// Zero-based position among all navigation links.
    pub position: usize,
    pub node: NodeId,
    pub display_text: String,
    /// `None` when the action reference is missing or does not match the pattern.
    pub target_slug: Option<String>,
}

/// One lyrics section of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSection {
    pub node: NodeId,
    /// The `id` attribute; empty when absent.
    pub identifier: String,
    pub title_attribute: Option<String>,
}

/// A button that expands or collapses a lyrics section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleControl {
    pub node: NodeId,
    pub label: String,
    pub controls: Option<String>,
    pub expanded: Option<String>,
}

/// Explicit handle to a parsed lyrics page.
#[derive(Debug, Clone)]
pub struct Page {
    pub(crate) dom: Dom,
    layout: PageLayout,
    action_regex: fancy_regex::Regex,
    doctype: Option<String>,
    url: String,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_layout(html, PageLayout::default())
    }

    pub fn from_html_with_layout(html: &str, layout: PageLayout) -> Result<Self> {
        layout.validate()?;
        let action_regex = layout.compile_action_pattern()?;
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            layout,
            action_regex,
            doctype: leading_doctype(html),
            url: "about:blank".to_string(),
        })
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The fragment of the page URL without the leading `#`, if any.
    pub fn location_hash(&self) -> Option<&str> {
        let (_, fragment) = self.url.split_once('#')?;
        if fragment.is_empty() {
            None
        } else {
            Some(fragment)
        }
    }

    pub(crate) fn set_location_hash(&mut self, fragment: &str) {
        let base = self
            .url
            .split_once('#')
            .map(|(base, _)| base.to_string())
            .unwrap_or_else(|| self.url.clone());
        self.url = format!("{base}#{fragment}");
    }

    pub fn navigation_entries(&self) -> Result<Vec<NavigationEntry>> {
        let links = self.dom.query_selector_all(&self.layout.navigation_selector)?;
        Ok(links
            .into_iter()
            .enumerate()
            .map(|(position, node)| NavigationEntry {
                position,
                node,
                display_text: self.dom.text_content(node).trim().to_string(),
                target_slug: self
                    .dom
                    .attr(node, &self.layout.action_attribute)
                    .and_then(|action| self.extract_slug(&action)),
            })
            .collect())
    }

    pub fn content_sections(&self) -> Result<Vec<ContentSection>> {
        let sections = self.dom.query_selector_all(&self.layout.section_selector)?;
        Ok(sections
            .into_iter()
            .map(|node| ContentSection {
                node,
                identifier: self.dom.attr(node, "id").unwrap_or_default(),
                title_attribute: self.dom.attr(node, &self.layout.title_attribute),
            })
            .collect())
    }

    pub fn toggle_controls(&self) -> Result<Vec<ToggleControl>> {
        let toggles = self.dom.query_selector_all(&self.layout.toggle_selector)?;
        Ok(toggles
            .into_iter()
            .map(|node| ToggleControl {
                node,
                label: self.dom.text_content(node).trim().to_string(),
                controls: self.dom.attr(node, &self.layout.controls_attribute),
                expanded: self.dom.attr(node, &self.layout.expanded_attribute),
            })
            .collect())
    }

    /// Pulls the slug out of an action reference such as
    /// `navegarParaLetra('bora-ate-a-vitoria')`.
    pub fn extract_slug(&self, action: &str) -> Option<String> {
        match self.action_regex.captures(action) {
            Ok(Some(captures)) => captures.get(1).map(|m| m.as_str().to_string()),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(action, error = %err, "action pattern failed to run");
                None
            }
        }
    }

    /// Every element carrying the action attribute, with its raw value.
    pub fn action_sources(&self) -> Vec<(NodeId, String)> {
        let mut elements = Vec::new();
        self.dom.collect_elements_dfs(self.dom.root, &mut elements);
        elements
            .into_iter()
            .filter_map(|node| {
                self.dom
                    .attr(node, &self.layout.action_attribute)
                    .map(|action| (node, action))
            })
            .collect()
    }

    pub fn elements_with_class(&self, class_name: &str) -> Vec<NodeId> {
        let mut elements = Vec::new();
        self.dom.collect_elements_dfs(self.dom.root, &mut elements);
        elements.retain(|node| self.dom.class_contains(*node, class_name));
        elements
    }

    pub(crate) fn first_with_class(&self, class_name: &str) -> Option<NodeId> {
        self.elements_with_class(class_name).into_iter().next()
    }

    /// Re-reads the page and repairs it. Once counts match, a second call
    /// creates nothing.
    pub fn repair_in_place(&mut self) -> Result<RepairReport> {
        let entries = self.navigation_entries()?;
        let sections = self.content_sections()?;
        repair(self, &entries, &sections)
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.dom.query_selector(selector)
    }

    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        self.dom.query_selector_all(selector)
    }

    pub fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.dom.by_id(id)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.dom.attr(node, name)
    }

    pub fn has_class(&self, node: NodeId, class_name: &str) -> bool {
        self.dom.class_contains(node, class_name)
    }

    pub fn text(&self, node: NodeId) -> String {
        self.dom.text_content(node)
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.dom.tag_name(node)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.parent(node)
    }

    pub fn dump_node(&self, node: NodeId) -> String {
        self.dom.dump_node(node)
    }

    pub(crate) fn node_snippet(&self, node: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node), 200)
    }

    /// Serializes the whole document, keeping a leading doctype if the source had one.
    pub fn to_html(&self) -> String {
        let body = self.dom.dump_node(self.dom.root);
        match &self.doctype {
            Some(doctype) => format!("{doctype}\n{body}"),
            None => body,
        }
    }
}
