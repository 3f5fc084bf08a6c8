//! End-to-end tests for the runner facade.
//!
//! Fixtures are declared with the public declaration API. A shared event log
//! records constructor calls and behavior invocations in order.

use std::cell::RefCell;
use std::rc::Rc;

use contextspec_runner::{Event, ExampleState, RecordingNotifier, RunConfig, Runner};
use contextspec_types::{
    Because, Cleanup, ContextClass, ContextPath, Description, Establish, ExampleId,
    InitializationError, It, Phase,
};

type Log = Rc<RefCell<Vec<String>>>;

fn record(log: &Log, entry: &str) -> impl Fn() + 'static {
    let log = log.clone();
    let entry = entry.to_string();
    move || log.borrow_mut().push(entry.clone())
}

fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

fn id(text: &str) -> ExampleId {
    ExampleId::parse(text).unwrap()
}

// ══════════════════════════════════════════════════════════════════════════════
// Fixtures
// ══════════════════════════════════════════════════════════════════════════════

/// `Account` with a shared setup, two child contexts each with one example.
struct Account {
    opened: Establish,
}

struct Deposit {
    deposit: Because,
    balance_grows: It,
}

struct Withdrawal {
    withdraw: Because,
    balance_shrinks: It,
    close: Cleanup,
}

fn account(log: &Log) -> ContextClass {
    let ctor_log = log.clone();
    let deposit_log = log.clone();
    let withdrawal_log = log.clone();
    ContextClass::root("Account", move || {
        ctor_log.borrow_mut().push("new Account".into());
        Account {
            opened: Establish::new(record(&ctor_log, "open account")),
        }
    })
    .field("opened", |a: &Account| &a.opened)
    .context(
        ContextClass::nested("deposit", move |_: &Account| Deposit {
            deposit: Because::new(record(&deposit_log, "deposit")),
            balance_grows: It::new(record(&deposit_log, "balance grows")),
        })
        .field("deposit", |d: &Deposit| &d.deposit)
        .field("balance_grows", |d: &Deposit| &d.balance_grows),
    )
    .context(
        ContextClass::nested("withdrawal", move |_: &Account| Withdrawal {
            withdraw: Because::new(record(&withdrawal_log, "withdraw")),
            balance_shrinks: It::new(record(&withdrawal_log, "balance shrinks")),
            close: Cleanup::new(record(&withdrawal_log, "close")),
        })
        .field("withdraw", |w: &Withdrawal| &w.withdraw)
        .field("balance_shrinks", |w: &Withdrawal| &w.balance_shrinks)
        .field("close", |w: &Withdrawal| &w.close),
    )
}

// ══════════════════════════════════════════════════════════════════════════════
// Execution order and sharing
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn runs_examples_depth_first_with_outer_setup_first() {
    let log = Log::default();
    let runner = Runner::new(&account(&log)).unwrap();
    log.borrow_mut().clear();

    let mut sink = RecordingNotifier::new();
    let summary = runner.run(&mut sink);

    assert_eq!(summary.passed, 2);
    assert_eq!(
        entries(&log),
        [
            "open account",
            "deposit",
            "balance grows",
            "open account",
            "withdraw",
            "balance shrinks",
            "close",
        ]
    );
}

#[test]
fn shared_ancestor_is_constructed_once() {
    let log = Log::default();
    let runner = Runner::new(&account(&log)).unwrap();
    runner.run(&mut RecordingNotifier::new());

    let constructed = entries(&log)
        .iter()
        .filter(|e| *e == "new Account")
        .count();
    assert_eq!(constructed, 1);
}

#[test]
fn two_setups_run_in_declaration_order_every_time() {
    struct Twice {
        first: Establish,
        second: Establish,
        checks: It,
    }

    let log = Log::default();
    let ctor_log = log.clone();
    let class = ContextClass::root("Twice", move || Twice {
        first: Establish::new(record(&ctor_log, "S1")),
        second: Establish::new(record(&ctor_log, "S2")),
        checks: It::new(record(&ctor_log, "assert")),
    })
    .field("first", |t: &Twice| &t.first)
    .field("second", |t: &Twice| &t.second)
    .field("checks", |t: &Twice| &t.checks);
    let runner = Runner::new(&class).unwrap();

    for _ in 0..3 {
        log.borrow_mut().clear();
        runner.run(&mut RecordingNotifier::new());
        assert_eq!(entries(&log), ["S1", "S2", "assert"]);
    }
}

#[test]
fn two_cleanups_run_in_declaration_order() {
    struct Cleaned {
        checks: It,
        first: Cleanup,
        second: Cleanup,
    }

    let log = Log::default();
    let ctor_log = log.clone();
    let class = ContextClass::root("Cleaned", move || Cleaned {
        checks: It::new(record(&ctor_log, "assert")),
        first: Cleanup::new(record(&ctor_log, "C1")),
        second: Cleanup::new(record(&ctor_log, "C2")),
    })
    .field("checks", |c: &Cleaned| &c.checks)
    .field("first", |c: &Cleaned| &c.first)
    .field("second", |c: &Cleaned| &c.second);

    Runner::new(&class).unwrap().run(&mut RecordingNotifier::new());
    assert_eq!(entries(&log), ["assert", "C1", "C2"]);
}

#[test]
fn outer_action_runs_before_inner_action() {
    struct Outer {
        act: Because,
    }
    struct Inner {
        act: Because,
        checks: It,
    }

    let log = Log::default();
    let outer_log = log.clone();
    let inner_log = log.clone();
    let class = ContextClass::root("Outer", move || Outer {
        act: Because::new(record(&outer_log, "outer action")),
    })
    .field("act", |o: &Outer| &o.act)
    .context(
        ContextClass::nested("inner", move |_: &Outer| Inner {
            act: Because::new(record(&inner_log, "inner action")),
            checks: It::new(record(&inner_log, "assert")),
        })
        .field("act", |i: &Inner| &i.act)
        .field("checks", |i: &Inner| &i.checks),
    );

    Runner::new(&class).unwrap().run(&mut RecordingNotifier::new());
    assert_eq!(entries(&log), ["outer action", "inner action", "assert"]);
}

#[test]
fn nested_contexts_run_and_describe_before_own_examples() {
    struct Top {
        own: It,
    }
    struct Child {
        inner: It,
    }

    let class = ContextClass::root("Top", || Top { own: It::new(|| ()) })
        .context(
            ContextClass::nested("child", |_: &Top| Child {
                inner: It::new(|| ()),
            })
            .field("inner", |c: &Child| &c.inner),
        )
        .field("own", |t: &Top| &t.own);
    let runner = Runner::new(&class).unwrap();

    let description = runner.description();
    let names: Vec<&str> = description
        .children()
        .iter()
        .map(Description::display_name)
        .collect();
    assert_eq!(names, ["child", "own"]);

    let mut sink = RecordingNotifier::new();
    runner.run(&mut sink);
    let started: Vec<String> = sink
        .events
        .iter()
        .filter(|e| matches!(e, Event::Started { .. }))
        .map(|e| e.id().to_string())
        .collect();
    assert_eq!(started, ["Top/child#inner", "Top#own"]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Notifications
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn failing_setup_notifies_started_failed_finished() {
    struct Broken {
        setup: Establish,
        checks: It,
        after: Cleanup,
    }

    let log = Log::default();
    let ctor_log = log.clone();
    let class = ContextClass::root("Broken", move || Broken {
        setup: Establish::new(|| Err::<(), _>("database unavailable")),
        checks: It::new(record(&ctor_log, "assert")),
        after: Cleanup::new(record(&ctor_log, "cleanup")),
    })
    .field("setup", |b: &Broken| &b.setup)
    .field("checks", |b: &Broken| &b.checks)
    .field("after", |b: &Broken| &b.after);

    let mut sink = RecordingNotifier::new();
    let summary = Runner::new(&class).unwrap().run(&mut sink);

    let example = id("Broken#checks");
    assert_eq!(sink.sequence_for(&example), ["started", "failed", "finished"]);
    assert!(entries(&log).is_empty(), "{:?}", entries(&log));
    assert_eq!(summary.failed, 1);

    let cause = sink.failures().next().unwrap();
    assert_eq!(cause.phase(), Phase::Setup);
    assert_eq!(cause.primary.source, "Broken.setup");
    assert_eq!(cause.primary.message, "database unavailable");
}

#[test]
fn pending_assertion_is_ignored_only() {
    struct Pending {
        later: It,
        now: It,
    }

    let class = ContextClass::root("Pending", || Pending {
        later: It::pending(),
        now: It::new(|| ()),
    })
    .field("later", |p: &Pending| &p.later)
    .field("now", |p: &Pending| &p.now);

    let runner = Runner::new(&class).unwrap();
    assert_eq!(runner.example_count(), 2);

    let mut sink = RecordingNotifier::new();
    let summary = runner.run(&mut sink);
    assert_eq!(sink.sequence_for(&id("Pending#later")), ["ignored"]);
    assert_eq!(sink.sequence_for(&id("Pending#now")), ["started", "finished"]);
    assert_eq!((summary.passed, summary.ignored), (1, 1));
}

#[test]
fn unassigned_setup_makes_example_pending() {
    struct HalfDone {
        setup: Establish,
        checks: It,
    }

    let class = ContextClass::root("HalfDone", || HalfDone {
        setup: Establish::pending(),
        checks: It::new::<_, ()>(|| panic!("must not run")),
    })
    .field("setup", |h: &HalfDone| &h.setup)
    .field("checks", |h: &HalfDone| &h.checks);

    let mut sink = RecordingNotifier::new();
    Runner::new(&class).unwrap().run(&mut sink);
    assert_eq!(sink.sequence_for(&id("HalfDone#checks")), ["ignored"]);
}

#[test]
fn failing_cleanup_does_not_stop_later_cleanups_or_examples() {
    struct Leaky {
        checks: It,
        first: Cleanup,
        second: Cleanup,
    }

    let log = Log::default();
    let ctor_log = log.clone();
    let class = ContextClass::root("Leaky", move || Leaky {
        checks: It::new(|| ()),
        first: Cleanup::new(|| Err::<(), _>("file locked")),
        second: Cleanup::new(record(&ctor_log, "second cleanup")),
    })
    .field("checks", |l: &Leaky| &l.checks)
    .field("first", |l: &Leaky| &l.first)
    .field("second", |l: &Leaky| &l.second);

    let mut sink = RecordingNotifier::new();
    let summary = Runner::new(&class).unwrap().run(&mut sink);

    assert_eq!(entries(&log), ["second cleanup"]);
    assert_eq!(summary.outcomes[0].state, ExampleState::Failed);
    assert_eq!(sink.failures().next().unwrap().phase(), Phase::Cleanup);
}

#[test]
fn failing_constructor_fails_only_dependent_examples() {
    struct Healthy {
        fine: It,
    }
    struct Sick {
        never: It,
    }

    let class = ContextClass::root("Healthy", || Healthy { fine: It::new(|| ()) })
        .field("fine", |h: &Healthy| &h.fine)
        .context(
            ContextClass::try_nested("sick", |_: &Healthy| Err::<Sick, _>("no connection"))
                .field("never", |s: &Sick| &s.never),
        );

    let mut sink = RecordingNotifier::new();
    let summary = Runner::new(&class).unwrap().run(&mut sink);

    assert_eq!(sink.sequence_for(&id("Healthy#fine")), ["started", "finished"]);
    let sick = id("Healthy/sick#never");
    assert_eq!(sink.sequence_for(&sick), ["started", "failed", "finished"]);
    let cause = sink.failures().next().unwrap();
    assert_eq!(cause.phase(), Phase::Construction);
    assert_eq!(cause.primary.source, "Healthy/sick");
    assert!(cause.primary.message.contains("no connection"));
    assert_eq!((summary.passed, summary.failed), (1, 1));
}

#[test]
fn skip_configuration_reports_ignored() {
    let log = Log::default();
    let config = RunConfig::default().with_skip("Account/withdrawal");
    let runner = Runner::with_config(&account(&log), config).unwrap();

    let mut sink = RecordingNotifier::new();
    let summary = runner.run(&mut sink);

    assert_eq!(sink.sequence_for(&id("Account/withdrawal#balance_shrinks")), ["ignored"]);
    assert_eq!((summary.passed, summary.ignored), (1, 1));
    assert!(!entries(&log).contains(&"withdraw".to_string()));
}

#[test]
fn every_event_belongs_to_a_resolved_example() {
    let log = Log::default();
    let runner = Runner::new(&account(&log)).unwrap();
    let mut sink = RecordingNotifier::new();
    runner.run(&mut sink);

    let started = sink
        .events
        .iter()
        .filter(|e| matches!(e, Event::Started { .. }))
        .count();
    assert_eq!(started, runner.example_count());
}

// ══════════════════════════════════════════════════════════════════════════════
// Initialization errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn tree_without_examples_is_an_initialization_error() {
    struct Empty;
    let errors = Runner::new(&ContextClass::root("top-level context", || Empty))
        .err()
        .unwrap()
        .into_vec();

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "Test context 'top-level context' must contain at least 1 example in an It field"
    );
}

#[test]
fn discovery_errors_come_before_no_examples_and_skip_construction() {
    struct Top;
    struct Other {
        stray: It,
    }

    let constructed = Rc::new(RefCell::new(0));
    let counter = constructed.clone();
    let class = ContextClass::root("Top", move || {
        *counter.borrow_mut() += 1;
        Top
    })
    .field("stray", |o: &Other| &o.stray);

    let errors = Runner::new(&class).err().unwrap().into_vec();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], InitializationError::ForeignMember { .. }));
    assert!(matches!(errors[1], InitializationError::NoExamples { .. }));
    assert_eq!(*constructed.borrow(), 0);
}

// ══════════════════════════════════════════════════════════════════════════════
// Description
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn description_matches_resolved_examples() {
    let log = Log::default();
    let runner = Runner::new(&account(&log)).unwrap();
    let description = runner.description();

    assert_eq!(description.test_count(), runner.example_count());
    assert_eq!(description.display_name(), "Account");
    let names: Vec<&str> = description
        .children()
        .iter()
        .map(Description::display_name)
        .collect();
    assert_eq!(names, ["deposit", "withdrawal"]);
    assert!(description
        .find_test(&id("Account/deposit#balance_grows"))
        .is_some());
}

#[test]
fn description_keeps_empty_intermediate_context() {
    struct Root;
    struct Child;
    struct Grandchild {
        works: It,
    }

    let class = ContextClass::root("root", || Root).context(
        ContextClass::nested("child", |_: &Root| Child).context(
            ContextClass::nested("grandchild", |_: &Child| Grandchild {
                works: It::new(|| ()),
            })
            .field("works", |g: &Grandchild| &g.works),
        ),
    );
    let description = Runner::new(&class).unwrap().description();

    let child = &description.children()[0];
    let grandchild = &child.children()[0];
    assert_eq!(description.children().len(), 1);
    assert_eq!(child.children().len(), 1);
    assert_eq!(grandchild.children().len(), 1);
    assert!(grandchild.children()[0].is_test());
    assert_eq!(
        description.find_suite(&ContextPath::parse("root/child/grandchild")),
        Some(grandchild)
    );
}

#[test]
fn description_serializes_for_reporters() {
    let log = Log::default();
    let json = Runner::new(&account(&log))
        .unwrap()
        .description()
        .to_json()
        .unwrap();
    let back: Description = serde_json::from_str(&json).unwrap();
    assert_eq!(back.test_count(), 2);
    assert!(json.contains("\"display_name\": \"balance_shrinks\""));
}
