use super::*;

/// Handlers the lyrics page calls from its inline actions.
pub const REQUIRED_HANDLERS: [&str; 7] = [
    "toggleLetra",
    "navegarParaLetra",
    "tituloParaSlug",
    "mostrarNotificacao",
    "adicionarAnimacaoSom",
    "removerAnimacaoSom",
    "destacarNoIndice",
];

/// Without these the page cannot open lyrics at all.
pub const CRITICAL_HANDLERS: [&str; 2] = ["toggleLetra", "navegarParaLetra"];

const NOT_FOUND_MESSAGE: &str = "Letra não encontrada";

/// Statements allowed after the call; the session ignores them.
const TRAILING_STATEMENTS: [&str; 5] = [
    "return false",
    "return true",
    "return",
    "event.preventDefault()",
    "event.stopPropagation()",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ActionArg {
    This,
    Event,
    Str(String),
    Number(f64),
}

/// An inline action such as `toggleLetra(this)` or
/// `navegarParaLetra('slug'); return false;`.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub args: Vec<ActionArg>,
}

impl Action {
    pub fn parse(source: &str) -> Result<Self> {
        let chars = source.trim().chars().collect::<Vec<_>>();
        let fail = |reason: &str| Error::ActionParse {
            source: source.to_string(),
            reason: reason.to_string(),
        };

        let mut i = 0;
        if !chars
            .first()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || *ch == '_' || *ch == '$')
        {
            return Err(fail("expected a handler name"));
        }
        while i < chars.len() && is_identifier_char(chars[i]) {
            i += 1;
        }
        let name = chars[..i].iter().collect::<String>();

        skip_whitespace(&chars, &mut i);
        if chars.get(i) != Some(&'(') {
            return Err(fail("expected `(` after handler name"));
        }
        i += 1;

        let mut args = Vec::new();
        loop {
            skip_whitespace(&chars, &mut i);
            if args.is_empty() && chars.get(i) == Some(&')') {
                i += 1;
                break;
            }
            let arg = parse_arg(&chars, &mut i).map_err(|reason| fail(&reason))?;
            args.push(arg);
            skip_whitespace(&chars, &mut i);
            match chars.get(i) {
                Some(',') => i += 1,
                Some(')') => {
                    i += 1;
                    break;
                }
                Some(_) => return Err(fail("expected `,` or `)` after argument")),
                None => return Err(fail("unterminated argument list")),
            }
        }

        skip_whitespace(&chars, &mut i);
        if i == chars.len() {
            return Ok(Self { name, args });
        }
        if chars[i] != ';' {
            return Err(fail("unexpected input after the call"));
        }
        let rest = chars[i + 1..].iter().collect::<String>();
        for statement in rest.split(';').map(str::trim) {
            if !statement.is_empty() && !TRAILING_STATEMENTS.contains(&statement) {
                return Err(fail(&format!("unsupported statement `{statement}` after the call")));
            }
        }
        Ok(Self { name, args })
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

fn skip_whitespace(chars: &[char], i: &mut usize) {
    while *i < chars.len() && chars[*i].is_whitespace() {
        *i += 1;
    }
}

fn parse_arg(chars: &[char], i: &mut usize) -> std::result::Result<ActionArg, String> {
    let Some(&first) = chars.get(*i) else {
        return Err("missing argument".into());
    };

    if first == '\'' || first == '"' {
        *i += 1;
        let mut value = String::new();
        while let Some(&ch) = chars.get(*i) {
            *i += 1;
            match ch {
                '\\' => {
                    let Some(&escaped) = chars.get(*i) else {
                        break;
                    };
                    *i += 1;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                ch if ch == first => return Ok(ActionArg::Str(value)),
                ch => value.push(ch),
            }
        }
        return Err("unterminated string literal".into());
    }

    if first.is_ascii_digit() || first == '-' || first == '.' {
        let start = *i;
        while *i < chars.len()
            && (chars[*i].is_ascii_digit() || matches!(chars[*i], '.' | '-' | '+' | 'e' | 'E'))
        {
            *i += 1;
        }
        let literal = chars[start..*i].iter().collect::<String>();
        return literal
            .parse::<f64>()
            .map(ActionArg::Number)
            .map_err(|_| format!("invalid number literal {literal}"));
    }

    let start = *i;
    while *i < chars.len() && is_identifier_char(chars[*i]) {
        *i += 1;
    }
    match chars[start..*i].iter().collect::<String>().as_str() {
        "this" => Ok(ActionArg::This),
        "event" => Ok(ActionArg::Event),
        "" => Err(format!("unexpected character `{first}`")),
        other => Err(format!("unsupported argument `{other}`")),
    }
}

/// One handler invocation: the parsed action plus the element it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerCall {
    pub name: String,
    pub args: Vec<ActionArg>,
    pub this: Option<NodeId>,
}

impl HandlerCall {
    pub fn new(name: &str, args: Vec<ActionArg>) -> Self {
        Self {
            name: name.to_string(),
            args,
            this: None,
        }
    }

    pub fn from_action(action: Action, this: Option<NodeId>) -> Self {
        Self {
            name: action.name,
            args: action.args,
            this,
        }
    }

    pub fn with_this(mut self, node: NodeId) -> Self {
        self.this = Some(node);
        self
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::HandlerRuntime {
            handler: self.name.clone(),
            message: message.into(),
        }
    }

    pub fn node_arg(&self, index: usize) -> Result<NodeId> {
        match self.args.get(index) {
            Some(ActionArg::This) => self
                .this
                .ok_or_else(|| self.error("`this` is not bound to an element")),
            Some(other) => Err(self.error(format!("argument {index} is not an element: {other:?}"))),
            None => Err(self.error(format!("missing argument {index}"))),
        }
    }

    pub fn str_arg(&self, index: usize) -> Result<&str> {
        match self.args.get(index) {
            Some(ActionArg::Str(value)) => Ok(value),
            Some(other) => Err(self.error(format!("argument {index} is not a string: {other:?}"))),
            None => Err(self.error(format!("missing argument {index}"))),
        }
    }
}

pub type Handler = fn(&mut Page, &HandlerCall) -> Result<()>;

/// Native implementations of the page's inline handlers, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The behaviors of the reference lyrics page.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register("toggleLetra", toggle_lyric)
            .register("navegarParaLetra", navigate_to_lyric)
            .register("tituloParaSlug", log_title_slug)
            .register("mostrarNotificacao", show_notification)
            .register("adicionarAnimacaoSom", add_sound_animation)
            .register("removerAnimacaoSom", remove_sound_animation)
            .register("destacarNoIndice", highlight_in_index);
        registry
    }

    pub fn register(&mut self, name: &str, handler: Handler) -> &mut Self {
        self.handlers.insert(name.to_string(), handler);
        self
    }

    pub fn unregister(&mut self, name: &str) -> Option<Handler> {
        self.handlers.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.handlers.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Names from `names` that are not registered, deduplicated, in input order.
    pub fn missing<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in names {
            if !self.contains(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }

    pub fn dispatch(&self, page: &mut Page, call: &HandlerCall) -> Result<()> {
        let Some(handler) = self.handlers.get(&call.name) else {
            return Err(Error::MissingHandlers(vec![call.name.clone()]));
        };
        tracing::debug!(handler = %call.name, args = call.args.len(), "dispatching handler");
        handler(page, call)
    }
}

fn toggle_lyric(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let button = call.node_arg(0)?;
    toggle_section(page, button)
}

pub(crate) fn toggle_section(page: &mut Page, button: NodeId) -> Result<()> {
    let layout = page.layout().clone();
    let was_open = page
        .dom
        .attr(button, &layout.expanded_attribute)
        .is_some_and(|value| value == "true");
    let content = controlled_content(page, button)?;

    page.dom.set_attr(
        button,
        &layout.expanded_attribute,
        if was_open { "false" } else { "true" },
    )?;
    match content {
        Some(content) if was_open => page.dom.class_remove(content, &layout.active_class)?,
        Some(content) => page.dom.class_add(content, &layout.active_class)?,
        None => tracing::warn!(
            button = %page.node_snippet(button),
            "toggle has no content to show"
        ),
    }

    if was_open {
        remove_animation_near(page, button)
    } else {
        add_animation_near(page, button)
    }
}

/// The content node a toggle opens: its cross-reference target, or else the
/// first content node of its enclosing section.
pub(crate) fn controlled_content(page: &Page, button: NodeId) -> Result<Option<NodeId>> {
    let layout = page.layout();
    if let Some(id) = page
        .dom
        .attr(button, &layout.controls_attribute)
        .filter(|id| !id.is_empty())
    {
        if let Some(node) = page.dom.by_id(&id) {
            return Ok(Some(node));
        }
    }
    let Some(section) = page.dom.closest(button, &layout.section_selector)? else {
        return Ok(None);
    };
    page.dom.query_selector_from(section, &layout.content_selector)
}

fn add_animation_near(page: &mut Page, button: NodeId) -> Result<()> {
    let Some(parent) = page.dom.parent(button) else {
        return Ok(());
    };
    let class_name = page.layout().animation_class.clone();
    if page
        .dom
        .children(parent)
        .iter()
        .any(|child| page.dom.class_contains(*child, &class_name))
    {
        return Ok(());
    }

    let attrs = HashMap::from([("class".to_string(), class_name)]);
    let animation = page.dom.create_detached_element("div", attrs);
    page.dom
        .set_inner_html(animation, "<span></span><span></span><span></span>")?;
    page.dom.append_child(parent, animation)
}

fn remove_animation_near(page: &mut Page, button: NodeId) -> Result<()> {
    let Some(parent) = page.dom.parent(button) else {
        return Ok(());
    };
    let class_name = &page.layout().animation_class;
    let animations = page
        .dom
        .children(parent)
        .iter()
        .copied()
        .filter(|child| page.dom.class_contains(*child, class_name))
        .collect::<Vec<_>>();
    for animation in animations {
        page.dom.remove_node(animation)?;
    }
    Ok(())
}

fn add_sound_animation(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let button = call.node_arg(0)?;
    add_animation_near(page, button)
}

fn remove_sound_animation(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let button = call.node_arg(0)?;
    remove_animation_near(page, button)
}

fn navigate_to_lyric(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let slug = call.str_arg(0)?.to_string();
    let layout = page.layout().clone();
    let target = page.content_sections()?.into_iter().find(|section| {
        section
            .title_attribute
            .as_deref()
            .is_some_and(|title| title_to_slug(title) == slug)
    });

    let Some(section) = target else {
        tracing::info!(slug = %slug, "no lyric section for slug");
        return show_notification_text(page, &format!("{NOT_FOUND_MESSAGE}: {slug}"));
    };

    highlight_index_link(page, &slug)?;

    match page
        .dom
        .query_selector_from(section.node, &layout.toggle_selector)?
    {
        Some(toggle) => {
            let open = page
                .dom
                .attr(toggle, &layout.expanded_attribute)
                .is_some_and(|value| value == "true");
            if !open {
                toggle_section(page, toggle)?;
            }
        }
        None => {
            if let Some(content) = page
                .dom
                .query_selector_from(section.node, &layout.content_selector)?
            {
                page.dom.class_add(content, &layout.active_class)?;
            }
        }
    }

    if !section.identifier.is_empty() {
        page.set_location_hash(&section.identifier);
    }
    Ok(())
}

fn highlight_in_index(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let slug = call.str_arg(0)?.to_string();
    highlight_index_link(page, &slug)
}

/// Moves the active class to the index links pointing at `slug`.
fn highlight_index_link(page: &mut Page, slug: &str) -> Result<()> {
    let active_class = page.layout().active_class.clone();
    for entry in page.navigation_entries()? {
        if entry.target_slug.as_deref() == Some(slug) {
            page.dom.class_add(entry.node, &active_class)?;
        } else {
            page.dom.class_remove(entry.node, &active_class)?;
        }
    }
    Ok(())
}

fn log_title_slug(_page: &mut Page, call: &HandlerCall) -> Result<()> {
    let title = call.str_arg(0)?;
    tracing::debug!(title, slug = %title_to_slug(title), "converted title");
    Ok(())
}

fn show_notification(page: &mut Page, call: &HandlerCall) -> Result<()> {
    let message = call.str_arg(0)?.to_string();
    show_notification_text(page, &message)
}

pub(crate) fn show_notification_text(page: &mut Page, message: &str) -> Result<()> {
    let layout = page.layout().clone();
    let notification = match page.first_with_class(&layout.notification_class) {
        Some(node) => node,
        None => {
            let attrs = HashMap::from([("class".to_string(), layout.notification_class.clone())]);
            let node = page.dom.create_detached_element("div", attrs);
            let container = page.dom.body().unwrap_or(page.dom.root);
            page.dom.append_child(container, node)?;
            node
        }
    };
    page.dom.set_text_content(notification, message)?;
    page.dom.class_add(notification, &layout.active_class)
}
