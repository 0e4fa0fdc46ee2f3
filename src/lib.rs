use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod check;
mod console;
mod diagnose;
mod dom;
mod handlers;
mod html;
mod layout;
mod page;
mod repair;
mod scheduler;
mod selector;
mod session;
mod slug;

pub use check::{Defect, DefectKind, StructureReport, check, structure};
pub use console::Console;
pub use diagnose::{DiagnosisReport, diagnose};
pub use dom::NodeId;
pub use handlers::{
    Action, ActionArg, CRITICAL_HANDLERS, Handler, HandlerCall, HandlerRegistry,
    REQUIRED_HANDLERS,
};
pub use layout::PageLayout;
pub use page::{ContentSection, NavigationEntry, Page, ToggleControl};
pub use repair::{RepairReport, repair};
pub use scheduler::{
    Completion, Outcome, Scheduler, SuiteReport, Task, TaskResult, interaction_suite,
};
pub use session::{AccessibilityIssue, Session, StateSnapshot};
pub use slug::{slug_to_title, title_to_slug};

use dom::{Dom, Element, NodeType};
use selector::{
    SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorStep, parse_selector_groups,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    Dom(String),
    UnsupportedSelector(String),
    SelectorNotFound(String),
    InvalidPattern {
        pattern: String,
        reason: String,
    },
    ActionParse {
        source: String,
        reason: String,
    },
    MissingHandlers(Vec<String>),
    HandlerRuntime {
        handler: String,
        message: String,
    },
    StepLimitExceeded {
        limit: usize,
        pending: usize,
        next_task: String,
    },
    InvalidConfig(String),
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid action pattern {pattern}: {reason}")
            }
            Self::ActionParse { source, reason } => {
                write!(f, "action parse error in `{source}`: {reason}")
            }
            Self::MissingHandlers(names) => {
                write!(f, "missing handlers: {}", names.join(", "))
            }
            Self::HandlerRuntime { handler, message } => {
                write!(f, "handler {handler} failed: {message}")
            }
            Self::StepLimitExceeded {
                limit,
                pending,
                next_task,
            } => write!(
                f,
                "scheduler step limit exceeded: limit={limit}, pending={pending}, next task={next_task}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl StdError for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

fn has_class(element: &Element, class_name: &str) -> bool {
    element
        .attrs
        .get("class")
        .map(|classes| classes.split_whitespace().any(|c| c == class_name))
        .unwrap_or(false)
}

fn class_tokens(class_attr: Option<&str>) -> Vec<String> {
    class_attr
        .map(|value| {
            value
                .split_whitespace()
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

fn set_class_attr(element: &mut Element, classes: &[String]) {
    if classes.is_empty() {
        element.attrs.remove("class");
    } else {
        element.attrs.insert("class".to_string(), classes.join(" "));
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut it = value.chars();
    let mut out = String::new();
    for _ in 0..max_chars {
        let Some(ch) = it.next() else {
            return out;
        };
        out.push(ch);
    }
    if it.next().is_some() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests;
