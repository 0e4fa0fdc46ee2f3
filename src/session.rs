use super::*;

/// Observable interaction state of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    /// Toggles whose expanded attribute is `"true"`.
    pub open_lyrics: usize,
    pub active_animations: usize,
    pub notification_active: bool,
    pub location: String,
}

/// A toggle that lacks an attribute assistive technology relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibilityIssue {
    /// One-based position among the toggles.
    pub index: usize,
    pub label: String,
    pub missing_attribute: String,
}

impl fmt::Display for AccessibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "toggle {} ({}): missing {}",
            self.index, self.label, self.missing_attribute
        )
    }
}

/// A page together with the handlers its inline actions call.
///
/// Construction fails unless every required handler is registered. Clicking an
/// element whose action names some other unregistered handler (a modal opener,
/// say) does nothing and logs a warning.
#[derive(Debug, Clone)]
pub struct Session {
    page: Page,
    registry: HandlerRegistry,
}

impl Session {
    pub fn new(page: Page, registry: HandlerRegistry) -> Result<Self> {
        let missing = registry.missing(REQUIRED_HANDLERS);
        if !missing.is_empty() {
            return Err(Error::MissingHandlers(missing));
        }
        Ok(Self { page, registry })
    }

    pub fn standard(page: Page) -> Result<Self> {
        Self::new(page, HandlerRegistry::standard())
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn into_page(self) -> Page {
        self.page
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.page.select_one(selector)?;
        self.click_node(target)
    }

    /// Runs the node's inline action with `this` bound to the node.
    pub fn click_node(&mut self, node: NodeId) -> Result<()> {
        let action_attribute = &self.page.layout().action_attribute;
        let Some(source) = self.page.attr(node, action_attribute) else {
            tracing::debug!(node = %self.page.node_snippet(node), "clicked element has no action");
            return Ok(());
        };
        let action = Action::parse(&source)?;
        if !self.registry.contains(&action.name) {
            tracing::warn!(
                handler = %action.name,
                node = %self.page.node_snippet(node),
                "no handler registered, click ignored"
            );
            return Ok(());
        }
        let call = HandlerCall::from_action(action, Some(node));
        self.registry.dispatch(&mut self.page, &call)
    }

    pub fn call(&mut self, call: &HandlerCall) -> Result<()> {
        self.registry.dispatch(&mut self.page, call)
    }

    pub fn snapshot(&self) -> Result<StateSnapshot> {
        let layout = self.page.layout();
        let open_lyrics = self
            .page
            .toggle_controls()?
            .iter()
            .filter(|toggle| toggle.expanded.as_deref() == Some("true"))
            .count();
        let notification_active = self
            .page
            .first_with_class(&layout.notification_class)
            .is_some_and(|node| self.page.has_class(node, &layout.active_class));

        Ok(StateSnapshot {
            open_lyrics,
            active_animations: self.page.elements_with_class(&layout.animation_class).len(),
            notification_active,
            location: self.page.url().to_string(),
        })
    }

    /// Closes every open lyric by clicking its toggle and hides the notification.
    pub fn reset(&mut self) -> Result<()> {
        let open = self
            .page
            .toggle_controls()?
            .into_iter()
            .filter(|toggle| toggle.expanded.as_deref() == Some("true"))
            .collect::<Vec<_>>();
        for toggle in open {
            self.click_node(toggle.node)?;
        }

        let layout = self.page.layout().clone();
        if let Some(notification) = self.page.first_with_class(&layout.notification_class) {
            self.page
                .dom
                .class_remove(notification, &layout.active_class)?;
        }
        tracing::debug!("session state reset");
        Ok(())
    }

    pub fn accessibility_issues(&self) -> Result<Vec<AccessibilityIssue>> {
        let layout = self.page.layout();
        let mut issues = Vec::new();
        for (index, toggle) in self.page.toggle_controls()?.into_iter().enumerate() {
            for (value, attribute) in [
                (&toggle.expanded, &layout.expanded_attribute),
                (&toggle.controls, &layout.controls_attribute),
            ] {
                if value.is_none() {
                    issues.push(AccessibilityIssue {
                        index: index + 1,
                        label: toggle.label.clone(),
                        missing_attribute: attribute.clone(),
                    });
                }
            }
        }
        Ok(issues)
    }
}
