use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use starter_framework::{
    priority, BootError, BoxError, ErrorKind, FnStarter, SharedContext, StartController, Starter,
};

// --- Helpers ---

type Trace = Arc<Mutex<Vec<String>>>;

fn tracer() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

fn tracing_starter(name: &str, priority: i32, trace: &Trace) -> FnStarter {
    let trace = Arc::clone(trace);
    let name_owned = name.to_string();
    FnStarter::new(name, priority).sync_action(move |_ctx| {
        trace.lock().unwrap().push(name_owned.clone());
        Ok(())
    })
}

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

// --- Ordering ---

#[tokio::test]
async fn distinct_priorities_run_descending() {
    let controller = StartController::new();
    let trace = tracer();

    controller
        .register(tracing_starter("low", priority::LOW, &trace))
        .unwrap();
    controller
        .register(tracing_starter("highest", priority::HIGHEST, &trace))
        .unwrap();
    controller
        .register(tracing_starter("middle", priority::MIDDLE, &trace))
        .unwrap();
    controller
        .register(tracing_starter("high", priority::HIGH, &trace))
        .unwrap();

    controller.start().await.unwrap();
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["highest", "high", "middle", "low"]
    );
}

#[tokio::test]
async fn equal_priorities_keep_registration_order() {
    // B and A share a priority; B registered first must run first.
    let controller = StartController::new();
    let trace = tracer();

    controller
        .register(tracing_starter("B", 900, &trace))
        .unwrap();
    controller
        .register(tracing_starter("A", 900, &trace))
        .unwrap();
    controller
        .register(tracing_starter("C", 300, &trace))
        .unwrap();

    controller.start().await.unwrap();
    assert_eq!(*trace.lock().unwrap(), vec!["B", "A", "C"]);
}

// --- Registration invariants ---

#[tokio::test]
async fn duplicate_name_is_fatal_and_does_not_overwrite() {
    let controller = StartController::new();
    let trace = tracer();

    controller
        .register(tracing_starter("db", priority::MIDDLE, &trace))
        .unwrap();
    let err = controller
        .register(tracing_starter("db", priority::HIGH, &trace))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Invariant);
    assert!(matches!(err, BootError::DuplicateStarter(name) if name == "db"));

    // The first registration survives and runs exactly once.
    controller.start().await.unwrap();
    assert_eq!(*trace.lock().unwrap(), vec!["db"]);
}

#[tokio::test]
async fn duplicate_name_is_fatal_even_after_the_first_ran() {
    let controller = StartController::new();

    // "config" registers a second "config" from inside its own action.
    let inner = controller.clone();
    controller
        .register(
            FnStarter::new("config", priority::HIGH).sync_action(move |_ctx| {
                inner.register(FnStarter::new("config", priority::LOW))?;
                Ok(())
            }),
        )
        .unwrap();

    let err = controller.start().await.unwrap_err();
    assert!(matches!(err, BootError::Starter { name, .. } if name == "config"));
}

// --- Double start ---

/// A starter whose flag claims it already ran.
struct PreStarted;

#[async_trait]
impl Starter for PreStarted {
    fn name(&self) -> &str {
        "phantom"
    }
    fn priority(&self) -> i32 {
        priority::LOW
    }
    fn started(&self) -> bool {
        true
    }
    fn mark_started(&mut self) {}
    async fn start(&mut self, _ctx: &mut SharedContext) -> Result<(), BoxError> {
        Ok(())
    }
}

#[tokio::test]
async fn starting_an_already_started_starter_is_fatal() {
    let controller = StartController::new();
    controller.register(PreStarted).unwrap();

    let err = controller.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invariant);
    assert!(matches!(err, BootError::AlreadyStarted(name) if name == "phantom"));
}

// --- Failure propagation ---

#[tokio::test]
async fn failing_starter_aborts_the_rest_of_the_run() {
    let controller = StartController::new();
    let trace = tracer();

    controller
        .register(tracing_starter("first", priority::HIGH, &trace))
        .unwrap();
    controller
        .register(
            FnStarter::new("broken", priority::MIDDLE).sync_action(|_ctx| Err(Boom.into())),
        )
        .unwrap();
    controller
        .register(tracing_starter("never", priority::LOW, &trace))
        .unwrap();

    let err = controller.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(matches!(&err, BootError::Starter { name, .. } if name == "broken"));

    // The lower-priority starter never ran.
    assert_eq!(*trace.lock().unwrap(), vec!["first"]);
}

// --- Listeners ---

#[tokio::test]
async fn listener_fires_once_after_success_with_context_access() {
    let controller = StartController::new();
    let fired = Arc::new(Mutex::new(0u32));

    controller
        .register(FnStarter::new("config", priority::HIGH).sync_action(|ctx| {
            ctx.set("config.value", 7u32);
            Ok(())
        }))
        .unwrap();

    let count = Arc::clone(&fired);
    controller.on_started("config", move |ctx| {
        assert_eq!(*ctx.must_get::<u32>("config.value")?, 7);
        *count.lock().unwrap() += 1;
        Ok(())
    });

    controller.start().await.unwrap();
    assert_eq!(*fired.lock().unwrap(), 1);
}

#[tokio::test]
async fn listener_registered_before_its_starter_still_fires() {
    let controller = StartController::new();
    let fired = Arc::new(Mutex::new(false));

    let flag = Arc::clone(&fired);
    controller.on_started("late", move |_ctx| {
        *flag.lock().unwrap() = true;
        Ok(())
    });
    controller.register(FnStarter::new("late", priority::LOW)).unwrap();

    controller.start().await.unwrap();
    assert!(*fired.lock().unwrap());
}

#[tokio::test]
async fn listener_never_fires_when_its_starter_fails() {
    let controller = StartController::new();
    let fired = Arc::new(Mutex::new(false));

    controller
        .register(FnStarter::new("broken", priority::HIGH).sync_action(|_ctx| Err(Boom.into())))
        .unwrap();

    let flag = Arc::clone(&fired);
    controller.on_started("broken", move |_ctx| {
        *flag.lock().unwrap() = true;
        Ok(())
    });

    controller.start().await.unwrap_err();
    assert!(!*fired.lock().unwrap());
}

#[tokio::test]
async fn failing_listener_aborts_and_skips_remaining_listeners() {
    let controller = StartController::new();
    let trace = tracer();

    controller.register(FnStarter::new("config", priority::HIGH)).unwrap();
    controller
        .register(tracing_starter("never", priority::LOW, &trace))
        .unwrap();

    let first = Arc::clone(&trace);
    controller.on_started("config", move |_ctx| {
        first.lock().unwrap().push("listener-1".into());
        Err(Boom.into())
    });
    let second = Arc::clone(&trace);
    controller.on_started("config", move |_ctx| {
        second.lock().unwrap().push("listener-2".into());
        Ok(())
    });

    let err = controller.start().await.unwrap_err();
    assert!(matches!(&err, BootError::Listener { name, .. } if name == "config"));
    assert_eq!(*trace.lock().unwrap(), vec!["listener-1"]);
}

#[tokio::test]
async fn listeners_fire_in_registration_order() {
    let controller = StartController::new();
    let trace = tracer();

    controller.register(FnStarter::new("x", priority::HIGH)).unwrap();
    for i in 1..=3 {
        let t = Arc::clone(&trace);
        controller.on_started("x", move |_ctx| {
            t.lock().unwrap().push(format!("l{i}"));
            Ok(())
        });
    }

    controller.start().await.unwrap();
    assert_eq!(*trace.lock().unwrap(), vec!["l1", "l2", "l3"]);
}

// --- Mid-run registration ---

#[tokio::test]
async fn starters_registered_mid_run_join_by_priority() {
    let controller = StartController::new();
    let trace = tracer();

    // "master" lazily registers two subordinates while starting; they must
    // slot into the remaining queue by priority.
    let inner = controller.clone();
    let t = Arc::clone(&trace);
    controller
        .register(
            FnStarter::new("master", priority::HIGH).sync_action(move |_ctx| {
                t.lock().unwrap().push("master".into());
                inner.register(tracing_starter("sub-low", priority::LOW, &t))?;
                inner.register(tracing_starter("sub-mid", priority::MIDDLE, &t))?;
                Ok(())
            }),
        )
        .unwrap();
    controller
        .register(tracing_starter("settled", priority::MIDDLE + 1, &trace))
        .unwrap();

    controller.start().await.unwrap();
    assert_eq!(
        *trace.lock().unwrap(),
        vec!["master", "settled", "sub-mid", "sub-low"]
    );
}

// --- One run per controller ---

#[tokio::test]
async fn second_start_is_fatal() {
    let controller = StartController::new();
    controller.register(FnStarter::new("only", priority::LOW)).unwrap();

    controller.start().await.unwrap();
    let err = controller.start().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invariant);
    assert!(matches!(err, BootError::Consumed));
}

#[tokio::test]
async fn start_returns_the_populated_context() {
    let controller = StartController::new();
    controller
        .register(FnStarter::new("publisher", priority::HIGH).sync_action(|ctx| {
            ctx.set("db.main", String::from("handle"));
            Ok(())
        }))
        .unwrap();

    let ctx = controller.start().await.unwrap();
    assert_eq!(&*ctx.must_get::<String>("db.main").unwrap(), "handle");
}
