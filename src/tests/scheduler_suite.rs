use super::*;
use std::cell::RefCell;
use std::rc::Rc;

type Trail = Rc<RefCell<Vec<String>>>;

fn recording(trail: &Trail, label: &str, completion: fn() -> Completion) -> Task {
    let trail = Rc::clone(trail);
    let name = label.to_string();
    Task::new(label, move |_, _| {
        trail.borrow_mut().push(name);
        Ok(completion())
    })
}

fn passed() -> Completion {
    Completion::Done(Outcome::Passed)
}

#[test]
fn follow_ups_run_before_later_tasks() -> Result<()> {
    let trail: Trail = Rc::default();
    let mut scheduler = Scheduler::new();

    let follow_trail = Rc::clone(&trail);
    let first_trail = Rc::clone(&trail);
    scheduler
        .push(Task::new("first", move |_, _| {
            first_trail.borrow_mut().push("first".to_string());
            Ok(Completion::Then(vec![
                recording(&follow_trail, "first.a", passed),
                recording(&follow_trail, "first.b", passed),
            ]))
        }))
        .push(recording(&trail, "second", passed));

    let mut session = Session::standard(Page::from_html(LYRICS_PAGE)?)?;
    let mut console = Console::new();
    let report = scheduler.run(&mut session, &mut console)?;

    assert_eq!(
        *trail.borrow(),
        vec!["first", "first.a", "first.b", "second"]
    );
    let labels = report
        .results
        .iter()
        .map(|result| result.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["first.a", "first.b", "second"]);
    assert_eq!(report.passed(), 3);
    assert_eq!(scheduler.pending(), 0);
    Ok(())
}

fn endless(_session: &mut Session, _console: &mut Console) -> Result<Completion> {
    Ok(Completion::Then(vec![Task::new("again", endless)]))
}

#[test]
fn step_limit_stops_runaway_follow_ups() -> Result<()> {
    let mut scheduler = Scheduler::new();
    scheduler.set_step_limit(3)?;
    scheduler.push(Task::new("start", endless));

    let mut session = Session::standard(Page::from_html(LYRICS_PAGE)?)?;
    let err = scheduler
        .run(&mut session, &mut Console::new())
        .expect_err("endless chain must hit the limit");
    match err {
        Error::StepLimitExceeded {
            limit,
            pending,
            next_task,
        } => {
            assert_eq!(limit, 3);
            assert_eq!(pending, 1);
            assert_eq!(next_task, "again");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err_message_mentions_limit(3));
    Ok(())
}

fn err_message_mentions_limit(limit: usize) -> bool {
    Error::StepLimitExceeded {
        limit,
        pending: 0,
        next_task: "x".into(),
    }
    .to_string()
    .contains(&format!("limit={limit}"))
}

#[test]
fn step_limit_rejects_zero() {
    let err = Scheduler::new()
        .set_step_limit(0)
        .expect_err("zero step limit should be rejected");
    match err {
        Error::InvalidConfig(msg) => assert!(msg.contains("at least 1 step")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn failing_task_is_recorded_and_run_continues() -> Result<()> {
    let mut scheduler = Scheduler::new();
    scheduler
        .push(Task::new("broken", |session, _| {
            session.click("#nao-existe")?;
            Ok(Completion::Done(Outcome::Passed))
        }))
        .push(Task::new("skipped", |_, _| {
            Ok(Completion::Done(Outcome::Skipped("nothing to do".into())))
        }));

    let mut session = Session::standard(Page::from_html(LYRICS_PAGE)?)?;
    let mut console = Console::new();
    let report = scheduler.run(&mut session, &mut console)?;

    assert_eq!(
        report.outcome_of("broken"),
        Some(&Outcome::Failed("selector not found: #nao-existe".into()))
    );
    assert_eq!(report.skipped(), 1);
    assert!(!report.all_passed());
    assert!(console.contains("[FAIL] broken"));
    assert!(console.contains("[SKIP] skipped"));
    Ok(())
}

#[test]
fn interaction_suite_passes_on_consistent_page() -> Result<()> {
    let mut session = Session::standard(Page::from_html(LYRICS_PAGE)?)?;
    let mut console = Console::new();
    let report = interaction_suite().run(&mut session, &mut console)?;

    assert_eq!(report.failed(), 0, "results: {:?}", report.results);
    assert_eq!(report.passed(), 6);
    for label in [
        "slug conversion",
        "notification visible",
        "lyric toggle state",
        "index navigation state",
        "accessibility",
        "done",
    ] {
        assert_eq!(report.outcome_of(label), Some(&Outcome::Passed), "{label}");
    }
    assert!(console.contains("\"Bora Até a Vitória\" -> \"bora-até-a-vitória\""));
    assert!(console.contains("notification text: Teste de notificação!"));
    Ok(())
}

#[test]
fn interaction_suite_reports_broken_navigation() -> Result<()> {
    let page = Page::from_html(&index_only_page(&["sem-letra"]))?;
    let mut session = Session::standard(page)?;
    let report = interaction_suite().run(&mut session, &mut Console::new())?;

    assert_eq!(
        report.outcome_of("lyric toggle"),
        Some(&Outcome::Skipped("no toggle found".into()))
    );
    assert_eq!(
        report.outcome_of("index navigation state"),
        Some(&Outcome::Failed("no active index link".into()))
    );
    assert_eq!(report.outcome_of("accessibility"), Some(&Outcome::Passed));
    Ok(())
}

#[test]
fn interaction_suite_flags_accessibility_gaps() -> Result<()> {
    let page = Page::from_html(
        r#"
        <div class="letra-musical" data-titulo="um">
          <div class="flex-botoes"><button class="botao-toggle" onclick="toggleLetra(this)">Um</button></div>
          <div class="conteudo-letra" id="c1"></div>
        </div>
        "#,
    )?;
    let mut session = Session::standard(page)?;
    let mut console = Console::new();
    let report = interaction_suite().run(&mut session, &mut console)?;

    assert_eq!(report.outcome_of("lyric toggle state"), Some(&Outcome::Passed));
    assert_eq!(
        report.outcome_of("accessibility"),
        Some(&Outcome::Failed("1 accessibility issues".into()))
    );
    assert!(console.contains("toggle 1 (Um): missing aria-controls"));
    Ok(())
}
