use super::*;

const SLUG_SAMPLES: [&str; 3] = [
    "Bora Até a Vitória",
    "Um Abraço do Tamanho do Mundo",
    "Quem Sabe Um Dia A Gente Aprende A Amar?",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisReport {
    pub structure: StructureReport,
    /// Required handlers absent from the registry.
    pub missing_handlers: Vec<String>,
    /// Elements carrying the action attribute.
    pub action_count: usize,
    /// One message per action that does not parse.
    pub invalid_actions: Vec<String>,
    /// Error raised by the probe click on the first toggle.
    pub click_error: Option<String>,
    pub open_lyrics: usize,
    pub active_animations: usize,
    /// Fragment of the page URL and whether an element with that id exists.
    pub location_target: Option<(String, bool)>,
    /// Critical handlers absent from the registry.
    pub critical_missing: Vec<String>,
}

impl DiagnosisReport {
    pub fn has_critical_problems(&self) -> bool {
        self.structure.missing_sections > 0 || !self.critical_missing.is_empty()
    }
}

/// Runs the layered diagnosis and writes its findings to `console`.
///
/// The probe click mutates `page`: the first toggle ends up opened, exactly as
/// a real click would leave it.
pub fn diagnose(
    page: &mut Page,
    registry: &HandlerRegistry,
    console: &mut Console,
) -> Result<DiagnosisReport> {
    let structure = inspect_structure(page, console)?;
    let (missing_handlers, action_count, invalid_actions) =
        inspect_handlers(page, registry, console);
    let click_error = probe_click(page, registry, console)?;

    let layout = page.layout().clone();
    let open_lyrics = page
        .toggle_controls()?
        .iter()
        .filter(|toggle| toggle.expanded.as_deref() == Some("true"))
        .count();
    let active_animations = page.elements_with_class(&layout.animation_class).len();
    console.line("state:");
    console.line(format!("  open lyrics: {open_lyrics}"));
    console.line(format!("  active animations: {active_animations}"));

    let location_target = inspect_location(page, console);

    let critical_missing = registry.missing(CRITICAL_HANDLERS);
    console.line("critical problems:");
    if structure.missing_sections > 0 {
        console.line(format!(
            "  CRITICAL: {} lyric sections are missing",
            structure.missing_sections
        ));
    }
    if !critical_missing.is_empty() {
        console.line(format!(
            "  CRITICAL: missing handlers: {}",
            critical_missing.join(", ")
        ));
    }
    if structure.missing_sections == 0 && critical_missing.is_empty() {
        console.line("  none");
    }

    Ok(DiagnosisReport {
        structure,
        missing_handlers,
        action_count,
        invalid_actions,
        click_error,
        open_lyrics,
        active_animations,
        location_target,
        critical_missing,
    })
}

fn inspect_structure(page: &Page, console: &mut Console) -> Result<StructureReport> {
    let report = structure(page)?;
    console.line("structure:");
    console.line(format!("  index links: {}", report.navigation_links));
    console.line(format!("  lyric sections: {}", report.content_sections));
    console.line(format!("  toggle buttons: {}", report.toggle_controls));
    if report.missing_sections > 0 {
        console.line(format!(
            "  more index links than lyric sections: {} missing",
            report.missing_sections
        ));
    }

    if report.defects.is_empty() {
        console.line("  every slug matches a section title");
    } else {
        for defect in &report.defects {
            let problem = match &defect.kind {
                DefectKind::Missing => "no section found".to_string(),
                DefectKind::Ambiguous { matches } => format!("{matches} sections found"),
            };
            console.line(format!(
                "  {}. \"{}\" -> slug \"{}\" -> expected title \"{}\": {problem}",
                defect.index, defect.display_text, defect.slug, defect.expected_title
            ));
        }
    }

    if report.duplicate_identifiers.is_empty() {
        console.line("  section ids are unique");
    } else {
        console.line(format!(
            "  duplicate section ids: {}",
            report.duplicate_identifiers.join(", ")
        ));
    }
    Ok(report)
}

fn inspect_handlers(
    page: &Page,
    registry: &HandlerRegistry,
    console: &mut Console,
) -> (Vec<String>, usize, Vec<String>) {
    console.line("handlers:");
    for name in REQUIRED_HANDLERS {
        let status = if registry.contains(name) { "ok" } else { "MISSING" };
        console.line(format!("  {name}: {status}"));
    }
    let missing = registry.missing(REQUIRED_HANDLERS);

    if registry.contains("tituloParaSlug") {
        console.line("slug conversion:");
        for title in SLUG_SAMPLES {
            console.line(format!("  \"{title}\" -> \"{}\"", title_to_slug(title)));
        }
    }

    let sources = page.action_sources();
    console.line(format!("elements with actions: {}", sources.len()));
    let mut invalid = Vec::new();
    for (index, (_, source)) in sources.iter().enumerate() {
        if let Err(err) = Action::parse(source) {
            console.line(format!("  action {}: {err}", index + 1));
            invalid.push(err.to_string());
        }
    }
    if invalid.is_empty() {
        console.line("  every action is well formed");
    }
    (missing, sources.len(), invalid)
}

fn probe_click(
    page: &mut Page,
    registry: &HandlerRegistry,
    console: &mut Console,
) -> Result<Option<String>> {
    let Some(toggle) = page.toggle_controls()?.into_iter().next() else {
        return Ok(None);
    };
    console.line("probe click on the first toggle:");

    let action_attribute = page.layout().action_attribute.clone();
    let outcome = match page.attr(toggle.node, &action_attribute) {
        Some(source) => Action::parse(&source).and_then(|action| {
            registry.dispatch(page, &HandlerCall::from_action(action, Some(toggle.node)))
        }),
        None => Ok(()),
    };

    Ok(match outcome {
        Ok(()) => {
            console.line("  click ran without errors");
            None
        }
        Err(err) => {
            tracing::warn!(error = %err, "probe click failed");
            console.line(format!("  click failed: {err}"));
            Some(err.to_string())
        }
    })
}

fn inspect_location(page: &Page, console: &mut Console) -> Option<(String, bool)> {
    console.line(format!("url: {}", page.url()));
    let fragment = page.location_hash()?.to_string();
    let found = page.element_by_id(&fragment).is_some();
    if found {
        console.line(format!("  element found for #{fragment}"));
    } else {
        console.line(format!("  no element found for #{fragment}"));
    }
    Some((fragment, found))
}
