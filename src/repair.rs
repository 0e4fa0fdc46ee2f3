use super::*;
use crate::html::{escape_html_attr_for_serialization, escape_html_text_for_serialization};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Total number of mutations applied.
    pub repairs: usize,
    /// Identifiers of the placeholder sections that were created, in order.
    pub created: Vec<String>,
    /// Identifiers now referenced by toggles that lacked a cross-reference.
    pub linked_controls: Vec<String>,
}

/// Synthesizes placeholder sections for trailing navigation entries and links
/// toggles to their content.
///
/// `entries` and `sections` are snapshots; nothing records that a repair
/// already ran, so repeating the call with the same snapshots appends the
/// placeholders again.
pub fn repair(
    page: &mut Page,
    entries: &[NavigationEntry],
    sections: &[ContentSection],
) -> Result<RepairReport> {
    let mut report = RepairReport::default();

    if entries.len() > sections.len() {
        tracing::info!(
            links = entries.len(),
            sections = sections.len(),
            "creating missing lyric sections"
        );
        for entry in entries.iter().filter(|entry| entry.position >= sections.len()) {
            let Some(slug) = entry.target_slug.as_deref() else {
                continue;
            };
            let title = slug_to_title(slug);
            let identifier = create_placeholder_section(page, entry.position + 1, &title)?;
            tracing::info!(id = %identifier, link = %entry.display_text, "created placeholder section");
            report.created.push(identifier);
            report.repairs += 1;
        }
    }

    let layout = page.layout().clone();
    for toggle in page.toggle_controls()? {
        if page.dom.has_attr(toggle.node, &layout.controls_attribute) {
            continue;
        }
        let Some(section) = page.dom.closest(toggle.node, &layout.section_selector)? else {
            tracing::debug!(toggle = %toggle.label, "toggle has no enclosing section");
            continue;
        };
        let Some(content) = page
            .dom
            .query_selector_from(section, &layout.content_selector)?
        else {
            continue;
        };
        let Some(content_id) = page.dom.attr(content, "id").filter(|id| !id.is_empty()) else {
            continue;
        };
        page.dom
            .set_attr(toggle.node, &layout.controls_attribute, &content_id)?;
        tracing::info!(toggle = %toggle.label, controls = %content_id, "linked toggle to content");
        report.linked_controls.push(content_id);
        report.repairs += 1;
    }

    Ok(report)
}

fn create_placeholder_section(page: &mut Page, number: usize, title: &str) -> Result<String> {
    let layout = page.layout().clone();
    let identifier = format!("{}{number}", layout.section_id_prefix);
    let content_id = format!("{}{number}", layout.content_id_prefix);

    let attrs = HashMap::from([
        ("id".to_string(), identifier.clone()),
        ("class".to_string(), layout.section_class.clone()),
        (layout.title_attribute.clone(), title.to_string()),
    ]);
    let section = page.dom.create_detached_element("div", attrs);

    let markup = format!(
        concat!(
            "<div class=\"flex-botoes\">",
            "<button class=\"{toggle_class}\" onclick=\"toggleLetra(this)\" {expanded}=\"false\" {controls}=\"{content_id}\">\u{1F3B5} {label}</button>",
            "</div>",
            "<div class=\"{content_class}\" id=\"{content_id}\">",
            "<p><em>{placeholder}</em></p>",
            "</div>"
        ),
        toggle_class = escape_html_attr_for_serialization(&layout.toggle_class),
        expanded = layout.expanded_attribute,
        controls = layout.controls_attribute,
        content_id = escape_html_attr_for_serialization(&content_id),
        label = escape_html_text_for_serialization(title),
        content_class = escape_html_attr_for_serialization(&layout.content_class),
        placeholder = escape_html_text_for_serialization(&layout.placeholder_text),
    );
    page.dom.set_inner_html(section, &markup)?;

    if let Some(anchor) = page.dom.by_id(&layout.anchor_id) {
        if let Some(parent) = page.dom.parent(anchor) {
            page.dom.insert_before(parent, section, anchor)?;
            return Ok(identifier);
        }
    }

    let container = match page.dom.query_selector(&layout.fallback_container)? {
        Some(container) => container,
        None => {
            tracing::warn!(
                anchor = %layout.anchor_id,
                container = %layout.fallback_container,
                "no anchor or container found, appending to document body"
            );
            page.dom.body().unwrap_or(page.dom.root)
        }
    };
    page.dom.append_child(container, section)?;
    Ok(identifier)
}
