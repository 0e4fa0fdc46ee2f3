use super::*;
use crate::html::{escape_html_attr_for_serialization, escape_html_text_for_serialization, is_void_tag, parse_html};

const RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;

/// Handle to a node inside a [`Page`]. Only meaningful for the page that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
}

impl Dom {
    pub(crate) fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let id_attr = attrs.get("id").cloned();
        let id = self.create_node(
            Some(parent),
            NodeType::Element(Element { tag_name, attrs }),
        );
        if let Some(id_attr) = id_attr {
            if self.is_connected(id) {
                self.index_id(&id_attr, id);
            }
        }
        id
    }

    pub(crate) fn create_detached_element(
        &mut self,
        tag_name: &str,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        self.create_node(
            None,
            NodeType::Element(Element {
                tag_name: tag_name.to_ascii_lowercase(),
                attrs,
            }),
        )
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    pub(crate) fn create_comment(&mut self, parent: NodeId, data: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Comment(data))
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes.get(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node_id.0)?.node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes.get(node_id.0).and_then(|node| node.parent)
    }

    pub(crate) fn children(&self, node_id: NodeId) -> &[NodeId] {
        self.nodes
            .get(node_id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn is_valid_node(&self, node_id: NodeId) -> bool {
        node_id.0 < self.nodes.len()
    }

    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index
            .get(id)
            .and_then(|nodes| nodes.first().copied())
    }

    fn index_id(&mut self, id: &str, node_id: NodeId) {
        self.id_index.entry(id.to_string()).or_default().push(node_id);
    }

    pub(crate) fn rebuild_id_index(&mut self) {
        let mut next: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if let NodeType::Element(element) = &self.nodes[node.0].node_type {
                if let Some(id) = element.attrs.get("id") {
                    next.entry(id.clone()).or_default().push(node);
                }
            }
            for child in self.nodes[node.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        self.id_index = next;
    }

    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document | NodeType::Element(_) => {
                    for child in &self.nodes[node_id.0].children {
                        self.collect_text(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(text),
                NodeType::Comment(_) => {}
            }
        })
    }

    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("textContent target is not an element".into()));
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        self.rebuild_id_index();
        Ok(())
    }

    /// Replaces the children of `node_id` with the parsed fragment.
    pub(crate) fn set_inner_html(&mut self, node_id: NodeId, html: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Dom("innerHTML target is not an element".into()));
        }

        let fragment = parse_html(html)?;

        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }

        let children = fragment.nodes[fragment.root.0].children.clone();
        for child in children {
            self.clone_subtree_from_dom(&fragment, child, node_id);
        }

        self.rebuild_id_index();
        Ok(())
    }

    fn clone_subtree_from_dom(&mut self, source: &Dom, source_node: NodeId, parent: NodeId) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            let node_type = match &source.nodes[source_node.0].node_type {
                NodeType::Document => return,
                NodeType::Element(element) => NodeType::Element(element.clone()),
                NodeType::Text(text) => NodeType::Text(text.clone()),
                NodeType::Comment(data) => NodeType::Comment(data.clone()),
            };
            let node = self.create_node(Some(parent), node_type);
            for child in &source.nodes[source_node.0].children {
                self.clone_subtree_from_dom(source, *child, node);
            }
        })
    }

    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attrs.get(&name.to_ascii_lowercase()).cloned())
    }

    pub(crate) fn has_attr(&self, node_id: NodeId, name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|e| e.attrs.contains_key(&name.to_ascii_lowercase()))
    }

    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let lowered = name.to_ascii_lowercase();
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("setAttribute target is not an element".into()))?;
        element.attrs.insert(lowered.clone(), value.to_string());
        if lowered == "id" {
            self.rebuild_id_index();
        }
        Ok(())
    }

    fn can_have_children(&self, node_id: NodeId) -> bool {
        match self.nodes.get(node_id.0).map(|node| &node.node_type) {
            Some(NodeType::Document) => true,
            Some(NodeType::Element(element)) => !is_void_tag(&element.tag_name),
            _ => false,
        }
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId, op: &str) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Dom(format!("{op} target cannot have children")));
        }
        if child == self.root || child == parent || !self.is_valid_node(child) {
            return Err(Error::Dom(format!("invalid {op} node")));
        }

        // Prevent cycles: parent must not be inside child's subtree.
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Dom(format!("{op} would create a cycle")));
            }
            cursor = self.parent(node);
        }
        Ok(())
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.ensure_insertable(parent, child, "appendChild")?;
        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        self.ensure_insertable(parent, child, "insertBefore")?;
        if self.parent(reference) != Some(parent) {
            return Err(Error::Dom(
                "insertBefore reference is not a direct child".into(),
            ));
        }
        if child == reference {
            return Ok(());
        }

        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }

        let Some(index) = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
        else {
            return Err(Error::Dom("insertBefore reference is missing".into()));
        };

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|id| *id != node);
        self.nodes[node.0].parent = None;
        self.rebuild_id_index();
        Ok(())
    }

    pub(crate) fn class_contains(&self, node_id: NodeId, class_name: &str) -> bool {
        self.element(node_id)
            .is_some_and(|element| has_class(element, class_name))
    }

    pub(crate) fn class_add(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        if !classes.iter().any(|name| name == class_name) {
            classes.push(class_name.to_string());
        }
        set_class_attr(element, &classes);
        Ok(())
    }

    pub(crate) fn class_remove(&mut self, node_id: NodeId, class_name: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Dom("classList target is not an element".into()))?;
        let mut classes = class_tokens(element.attrs.get("class").map(String::as_str));
        classes.retain(|name| name != class_name);
        set_class_attr(element, &classes);
        Ok(())
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let all = self.query_selector_all(selector)?;
        Ok(all.into_iter().next())
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;

        if groups.len() == 1 && groups[0].len() == 1 {
            if let Some(id) = groups[0][0].step.id_only() {
                return Ok(self.id_index.get(id).cloned().unwrap_or_default());
            }
        }

        let mut ids = Vec::new();
        self.collect_elements_dfs(self.root, &mut ids);
        Ok(self.filter_matching(ids, &groups))
    }

    pub(crate) fn query_selector_from(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        let mut ids = Vec::new();
        self.collect_elements_descendants_dfs(root, &mut ids);
        Ok(self.filter_matching(ids, &groups).into_iter().next())
    }

    fn filter_matching(&self, candidates: Vec<NodeId>, groups: &[Vec<SelectorPart>]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for candidate in candidates {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(candidate, steps))
                && seen.insert(candidate)
            {
                matched.push(candidate);
            }
        }
        matched
    }

    pub(crate) fn closest(&self, node_id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        if self.element(node_id).is_none() {
            return Ok(None);
        }

        let groups = parse_selector_groups(selector)?;
        let mut cursor = Some(node_id);
        while let Some(current) = cursor {
            if groups
                .iter()
                .any(|steps| self.matches_selector_chain(current, steps))
            {
                return Ok(Some(current));
            }
            cursor = self.parent(current);
        }
        Ok(None)
    }

    pub(crate) fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            if matches!(self.nodes[node_id.0].node_type, NodeType::Element(_)) {
                out.push(node_id);
            }
            for child in &self.nodes[node_id.0].children {
                self.collect_elements_dfs(*child, out);
            }
        })
    }

    pub(crate) fn collect_elements_descendants_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(node_id) {
            self.collect_elements_dfs(*child, out);
        }
    }

    pub(crate) fn find_first_by_tag(&self, tag: &str) -> Option<NodeId> {
        let mut all = Vec::new();
        self.collect_elements_dfs(self.root, &mut all);
        all.into_iter().find(|node| {
            self.tag_name(*node)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        })
    }

    pub(crate) fn body(&self) -> Option<NodeId> {
        self.find_first_by_tag("body")
    }

    fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|id| *id == node_id)?;
        siblings[..index]
            .iter()
            .rev()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub(crate) fn matches_selector_chain(&self, node_id: NodeId, steps: &[SelectorPart]) -> bool {
        if steps.is_empty() {
            return false;
        }
        if !self.matches_step(node_id, &steps[steps.len() - 1].step) {
            return false;
        }

        let mut current = node_id;
        for idx in (1..steps.len()).rev() {
            let prev_step = &steps[idx - 1].step;
            let combinator = steps[idx]
                .combinator
                .unwrap_or(SelectorCombinator::Descendant);

            let matched = match combinator {
                SelectorCombinator::Child => self
                    .parent(current)
                    .filter(|parent| self.matches_step(*parent, prev_step)),
                SelectorCombinator::Descendant => {
                    let mut cursor = self.parent(current);
                    let mut found = None;
                    while let Some(parent) = cursor {
                        if self.matches_step(parent, prev_step) {
                            found = Some(parent);
                            break;
                        }
                        cursor = self.parent(parent);
                    }
                    found
                }
                SelectorCombinator::AdjacentSibling => self
                    .previous_element_sibling(current)
                    .filter(|sibling| self.matches_step(*sibling, prev_step)),
                SelectorCombinator::GeneralSibling => {
                    let mut cursor = self.previous_element_sibling(current);
                    let mut found = None;
                    while let Some(sibling) = cursor {
                        if self.matches_step(sibling, prev_step) {
                            found = Some(sibling);
                            break;
                        }
                        cursor = self.previous_element_sibling(sibling);
                    }
                    found
                }
            };

            let Some(matched) = matched else {
                return false;
            };
            current = matched;
        }

        true
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };

        if let Some(tag) = &step.tag {
            if !element.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &step.id {
            if element.attrs.get("id") != Some(id) {
                return false;
            }
        }

        if step
            .classes
            .iter()
            .any(|class_name| !has_class(element, class_name))
        {
            return false;
        }

        step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attrs.contains_key(key),
            SelectorAttrCondition::Eq { key, value } => element.attrs.get(key) == Some(value),
            SelectorAttrCondition::StartsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.starts_with(value.as_str())),
            SelectorAttrCondition::EndsWith { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.ends_with(value.as_str())),
            SelectorAttrCondition::Contains { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.contains(value.as_str())),
            SelectorAttrCondition::Includes { key, value } => element
                .attrs
                .get(key)
                .is_some_and(|attr| attr.split_whitespace().any(|token| token == value)),
        })
    }

    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(node_id, &mut out);
        out
    }

    fn dump_into(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || match &self.nodes[node_id.0].node_type {
            NodeType::Document => {
                for child in &self.nodes[node_id.0].children {
                    self.dump_into(*child, out);
                }
            }
            NodeType::Text(text) => out.push_str(&escape_html_text_for_serialization(text)),
            NodeType::Comment(data) => {
                out.push_str("<!--");
                out.push_str(data);
                out.push_str("-->");
            }
            NodeType::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_by(|(left, _), (right, _)| left.cmp(right));
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&escape_html_attr_for_serialization(v));
                    out.push('"');
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return;
                }
                let raw_text_container = element.tag_name.eq_ignore_ascii_case("script")
                    || element.tag_name.eq_ignore_ascii_case("style");
                for child in &self.nodes[node_id.0].children {
                    match (&self.nodes[child.0].node_type, raw_text_container) {
                        (NodeType::Text(text), true) => out.push_str(text),
                        _ => self.dump_into(*child, out),
                    }
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
            }
        })
    }
}
