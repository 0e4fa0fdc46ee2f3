use super::*;

type TaskFn = Box<dyn FnOnce(&mut Session, &mut Console) -> Result<Completion>>;

/// A labelled unit of work run by [`Scheduler`].
pub struct Task {
    pub label: String,
    run: TaskFn,
}

impl Task {
    pub fn new(
        label: impl Into<String>,
        run: impl FnOnce(&mut Session, &mut Console) -> Result<Completion> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            run: Box::new(run),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum Completion {
    Done(Outcome),
    /// Follow-up tasks; they run before anything queued after this task.
    Then(Vec<Task>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    pub label: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub results: Vec<TaskResult>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Passed))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Skipped(_)))
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn outcome_of(&self, label: &str) -> Option<&Outcome> {
        self.results
            .iter()
            .find(|result| result.label == label)
            .map(|result| &result.outcome)
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|result| predicate(&result.outcome))
            .count()
    }
}

/// Ordered, single-threaded task queue.
#[derive(Debug)]
pub struct Scheduler {
    queue: VecDeque<Task>,
    step_limit: usize,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            step_limit: 10_000,
        }
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task) -> &mut Self {
        self.queue.push_back(task);
        self
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn set_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::InvalidConfig(
                "scheduler step limit requires at least 1 step".into(),
            ));
        }
        self.step_limit = max_steps;
        Ok(())
    }

    /// Runs queued tasks in order until the queue drains.
    ///
    /// A task that returns an error is recorded as failed and the run goes
    /// on. Only exceeding the step limit aborts the run.
    pub fn run(&mut self, session: &mut Session, console: &mut Console) -> Result<SuiteReport> {
        let mut report = SuiteReport::default();
        let mut steps = 0usize;

        while let Some(Task { label, run }) = self.queue.pop_front() {
            if steps >= self.step_limit {
                return Err(Error::StepLimitExceeded {
                    limit: self.step_limit,
                    pending: self.queue.len() + 1,
                    next_task: label,
                });
            }
            steps += 1;
            tracing::debug!(task = %label, step = steps, "running task");

            match run(session, console) {
                Ok(Completion::Done(outcome)) => {
                    console.line(format!("[{}] {label}", outcome_tag(&outcome)));
                    report.results.push(TaskResult { label, outcome });
                }
                Ok(Completion::Then(follow_ups)) => {
                    for task in follow_ups.into_iter().rev() {
                        self.queue.push_front(task);
                    }
                }
                Err(err) => {
                    tracing::warn!(task = %label, error = %err, "task failed");
                    let outcome = Outcome::Failed(err.to_string());
                    console.line(format!("[{}] {label}: {err}", outcome_tag(&outcome)));
                    report.results.push(TaskResult { label, outcome });
                }
            }
        }
        Ok(report)
    }
}

fn outcome_tag(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "PASS",
        Outcome::Failed(_) => "FAIL",
        Outcome::Skipped(_) => "SKIP",
    }
}

const SAMPLE_TITLES: [&str; 4] = [
    "Bora Até a Vitória",
    "Um Abraço do Tamanho do Mundo",
    "Quem Sabe Um Dia A Gente Aprende A Amar?",
    "Guerra Não É Partida De Futebol",
];

/// The interactive battery: slug conversion, notification, lyric toggle,
/// index navigation and accessibility, each inspecting state in a follow-up
/// task after its action.
pub fn interaction_suite() -> Scheduler {
    let mut scheduler = Scheduler::new();
    scheduler
        .push(Task::new("slug conversion", check_slug_conversion))
        .push(Task::new("notification", check_notification))
        .push(Task::new("lyric toggle", check_lyric_toggle))
        .push(Task::new("index navigation", check_index_navigation))
        .push(Task::new("accessibility", check_accessibility))
        .push(Task::new("done", |_, console| {
            console.line("all interaction checks finished");
            Ok(Completion::Done(Outcome::Passed))
        }));
    scheduler
}

fn check_slug_conversion(_session: &mut Session, console: &mut Console) -> Result<Completion> {
    let mut malformed = Vec::new();
    for title in SAMPLE_TITLES {
        let slug = title_to_slug(title);
        console.line(format!("\"{title}\" -> \"{slug}\""));
        if slug.is_empty() || slug.chars().any(char::is_whitespace) {
            malformed.push(slug);
        }
    }
    Ok(Completion::Done(if malformed.is_empty() {
        Outcome::Passed
    } else {
        Outcome::Failed(format!("malformed slugs: {}", malformed.join(", ")))
    }))
}

fn check_notification(session: &mut Session, _console: &mut Console) -> Result<Completion> {
    const MESSAGE: &str = "Teste de notificação!";
    session.call(&HandlerCall::new(
        "mostrarNotificacao",
        vec![ActionArg::Str(MESSAGE.to_string())],
    ))?;

    Ok(Completion::Then(vec![Task::new(
        "notification visible",
        |session, console| {
            let page = session.page();
            let layout = page.layout();
            let Some(node) = page.first_with_class(&layout.notification_class) else {
                return Ok(Completion::Done(Outcome::Failed(
                    "no notification element".into(),
                )));
            };
            let text = page.text(node);
            console.line(format!("notification text: {text}"));
            Ok(Completion::Done(
                if page.has_class(node, &layout.active_class) && text == MESSAGE {
                    Outcome::Passed
                } else {
                    Outcome::Failed("notification is not active".into())
                },
            ))
        },
    )]))
}

fn check_lyric_toggle(session: &mut Session, console: &mut Console) -> Result<Completion> {
    let Some(toggle) = session.page().toggle_controls()?.into_iter().next() else {
        return Ok(Completion::Done(Outcome::Skipped("no toggle found".into())));
    };
    console.line(format!("clicking toggle: {}", toggle.label));
    session.click_node(toggle.node)?;

    let button = toggle.node;
    Ok(Completion::Then(vec![Task::new(
        "lyric toggle state",
        move |session, console| {
            let page = session.page();
            let layout = page.layout();
            let expanded = page.attr(button, &layout.expanded_attribute);
            let animated = page.parent(button).is_some_and(|parent| {
                page.elements_with_class(&layout.animation_class)
                    .into_iter()
                    .any(|node| page.parent(node) == Some(parent))
            });
            console.line(format!(
                "expanded: {}, animation: {animated}",
                expanded.as_deref().unwrap_or("(none)")
            ));
            Ok(Completion::Done(
                if expanded.as_deref() == Some("true") && animated {
                    Outcome::Passed
                } else {
                    Outcome::Failed("toggle did not open its lyric".into())
                },
            ))
        },
    )]))
}

fn check_index_navigation(session: &mut Session, console: &mut Console) -> Result<Completion> {
    let Some(link) = session.page().navigation_entries()?.into_iter().next() else {
        return Ok(Completion::Done(Outcome::Skipped(
            "no index link found".into(),
        )));
    };
    console.line(format!("clicking index link: {}", link.display_text));
    session.click_node(link.node)?;

    Ok(Completion::Then(vec![Task::new(
        "index navigation state",
        |session, console| {
            let page = session.page();
            let layout = page.layout();
            let active_link = page
                .navigation_entries()?
                .into_iter()
                .find(|entry| page.has_class(entry.node, &layout.active_class));
            let open_content = page
                .elements_with_class(&layout.content_class)
                .into_iter()
                .any(|node| page.has_class(node, &layout.active_class));
            console.line(format!(
                "active link: {}, lyric open: {open_content}",
                active_link
                    .as_ref()
                    .map_or("(none)", |entry| entry.display_text.as_str())
            ));
            Ok(Completion::Done(match (active_link, open_content) {
                (Some(_), true) => Outcome::Passed,
                (None, _) => Outcome::Failed("no active index link".into()),
                (Some(_), false) => Outcome::Failed("no lyric was opened".into()),
            }))
        },
    )]))
}

fn check_accessibility(session: &mut Session, console: &mut Console) -> Result<Completion> {
    let issues = session.accessibility_issues()?;
    console.line(format!("accessibility issues: {}", issues.len()));
    for issue in &issues {
        console.line(format!("  {issue}"));
    }
    Ok(Completion::Done(if issues.is_empty() {
        Outcome::Passed
    } else {
        Outcome::Failed(format!("{} accessibility issues", issues.len()))
    }))
}
