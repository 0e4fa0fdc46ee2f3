use super::*;

pub(crate) const DEFAULT_ACTION_PATTERN: &str = r"navegarParaLetra\('([^']+)'";

/// Where the tool looks for things on a lyrics page.
///
/// The defaults describe the reference page: an `.indice-horizontal` index of
/// links whose `onclick` calls `navegarParaLetra('<slug>')`, and one
/// `.letra-musical` section per lyric keyed by `data-titulo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    pub navigation_selector: String,
    pub section_selector: String,
    pub toggle_selector: String,
    pub content_selector: String,
    pub title_attribute: String,
    pub action_attribute: String,
    /// Capture group 1 must yield the slug.
    pub action_pattern: String,
    pub controls_attribute: String,
    pub expanded_attribute: String,
    pub anchor_id: String,
    pub fallback_container: String,
    pub section_class: String,
    pub toggle_class: String,
    pub content_class: String,
    pub section_id_prefix: String,
    pub content_id_prefix: String,
    pub placeholder_text: String,
    pub active_class: String,
    pub animation_class: String,
    pub notification_class: String,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            navigation_selector: ".indice-horizontal a".to_string(),
            section_selector: ".letra-musical".to_string(),
            toggle_selector: ".botao-toggle".to_string(),
            content_selector: ".conteudo-letra".to_string(),
            title_attribute: "data-titulo".to_string(),
            action_attribute: "onclick".to_string(),
            action_pattern: DEFAULT_ACTION_PATTERN.to_string(),
            controls_attribute: "aria-controls".to_string(),
            expanded_attribute: "aria-expanded".to_string(),
            anchor_id: "musicas".to_string(),
            fallback_container: "main".to_string(),
            section_class: "letra-musical".to_string(),
            toggle_class: "botao-toggle".to_string(),
            content_class: "conteudo-letra".to_string(),
            section_id_prefix: "letra".to_string(),
            content_id_prefix: "conteudo".to_string(),
            placeholder_text: "Conteúdo da letra será adicionado em breve...".to_string(),
            active_class: "ativo".to_string(),
            animation_class: "animacao-som".to_string(),
            notification_class: "notificacao-copia".to_string(),
        }
    }
}

impl PageLayout {
    pub fn set_anchor_id(&mut self, anchor_id: &str) -> &mut Self {
        self.anchor_id = anchor_id.to_string();
        self
    }

    pub fn set_fallback_container(&mut self, selector: &str) -> &mut Self {
        self.fallback_container = selector.to_string();
        self
    }

    pub fn set_action_pattern(&mut self, pattern: &str) -> &mut Self {
        self.action_pattern = pattern.to_string();
        self
    }

    /// Checks that every selector parses and the action pattern compiles with
    /// at least one capture group.
    pub fn validate(&self) -> Result<()> {
        for selector in [
            &self.navigation_selector,
            &self.section_selector,
            &self.toggle_selector,
            &self.content_selector,
            &self.fallback_container,
        ] {
            parse_selector_groups(selector)?;
        }

        for (name, value) in [
            ("title_attribute", &self.title_attribute),
            ("action_attribute", &self.action_attribute),
            ("controls_attribute", &self.controls_attribute),
            ("expanded_attribute", &self.expanded_attribute),
            ("section_class", &self.section_class),
            ("toggle_class", &self.toggle_class),
            ("content_class", &self.content_class),
            ("active_class", &self.active_class),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{name} must not be empty")));
            }
        }

        let regex = self.compile_action_pattern()?;
        if regex.captures_len() < 2 {
            return Err(Error::InvalidPattern {
                pattern: self.action_pattern.clone(),
                reason: "pattern has no capture group for the slug".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn compile_action_pattern(&self) -> Result<fancy_regex::Regex> {
        fancy_regex::Regex::new(&self.action_pattern).map_err(|err| Error::InvalidPattern {
            pattern: self.action_pattern.clone(),
            reason: err.to_string(),
        })
    }
}
