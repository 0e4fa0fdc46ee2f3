use super::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefectKind {
    /// No section carries the expected title.
    Missing,
    /// Several sections carry the expected title.
    Ambiguous { matches: usize },
}

/// A navigation entry whose expected section is absent or not unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defect {
    /// One-based position of the entry in the navigation index.
    pub index: usize,
    pub slug: String,
    pub expected_title: String,
    pub display_text: String,
    pub kind: DefectKind,
}

/// Compares navigation entries against content sections.
///
/// Titles are matched exactly after [`slug_to_title`]; entries whose slug
/// could not be extracted are skipped without a defect.
pub fn check(entries: &[NavigationEntry], sections: &[ContentSection]) -> Vec<Defect> {
    let mut defects = Vec::new();
    for entry in entries {
        let Some(slug) = entry.target_slug.as_deref() else {
            continue;
        };
        let expected_title = slug_to_title(slug);
        let matches = sections
            .iter()
            .filter(|section| section.title_attribute.as_deref() == Some(expected_title.as_str()))
            .count();

        let kind = match matches {
            1 => continue,
            0 => DefectKind::Missing,
            matches => DefectKind::Ambiguous { matches },
        };
        defects.push(Defect {
            index: entry.position + 1,
            slug: slug.to_string(),
            expected_title,
            display_text: entry.display_text.clone(),
            kind,
        });
    }
    defects
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureReport {
    pub navigation_links: usize,
    pub content_sections: usize,
    pub toggle_controls: usize,
    /// How many more links there are than sections.
    pub missing_sections: usize,
    pub defects: Vec<Defect>,
    /// Section identifiers that occur more than once, in first-seen order.
    pub duplicate_identifiers: Vec<String>,
}

impl StructureReport {
    pub fn is_clean(&self) -> bool {
        self.missing_sections == 0 && self.defects.is_empty() && self.duplicate_identifiers.is_empty()
    }
}

pub fn structure(page: &Page) -> Result<StructureReport> {
    let entries = page.navigation_entries()?;
    let sections = page.content_sections()?;
    let toggles = page.toggle_controls()?;

    let mut seen = HashSet::new();
    let mut duplicate_identifiers = Vec::new();
    for section in &sections {
        if !seen.insert(section.identifier.as_str())
            && !duplicate_identifiers.contains(&section.identifier)
        {
            duplicate_identifiers.push(section.identifier.clone());
        }
    }

    let defects = check(&entries, &sections);
    tracing::debug!(
        links = entries.len(),
        sections = sections.len(),
        defects = defects.len(),
        "structure inspected"
    );

    Ok(StructureReport {
        navigation_links: entries.len(),
        content_sections: sections.len(),
        toggle_controls: toggles.len(),
        missing_sections: entries.len().saturating_sub(sections.len()),
        defects,
        duplicate_identifiers,
    })
}
