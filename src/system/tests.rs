use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use super::{GameSystem, Lifecycle, Systems};
use crate::error::{AttachError, StartupError};
use crate::test_util;

type Log = Rc<RefCell<Vec<String>>>;

struct Physics {
    log: Log,
}

impl GameSystem for Physics {
    fn create() -> Rc<Self> { Rc::new(Self { log: Log::default() }) }

    fn on_attach(self: Rc<Self>, _: &Systems) -> Result<(), AttachError> {
        self.log.borrow_mut().push("attach physics".into());
        Ok(())
    }

    fn on_tick(&self, time_delta: f32) { self.log.borrow_mut().push(format!("physics {time_delta}")); }

    fn on_destroy(&self) { self.log.borrow_mut().push("destroy physics".into()); }
}

struct Audio {
    log:     Log,
    physics: OnceCell<Rc<Physics>>,
}

impl GameSystem for Audio {
    fn create() -> Rc<Self> { Rc::new(Self { log: Log::default(), physics: OnceCell::new() }) }

    fn on_attach(self: Rc<Self>, systems: &Systems) -> Result<(), AttachError> {
        let physics = systems.require::<Physics>()?;
        self.physics.set(physics).map_err(|_| AttachError::AlreadyAttached)?;
        self.log.borrow_mut().push("attach audio".into());
        Ok(())
    }

    fn on_tick(&self, time_delta: f32) { self.log.borrow_mut().push(format!("audio {time_delta}")); }

    fn on_destroy(&self) {
        if let Some(physics) = self.physics.get() {
            physics.log.borrow_mut().push("destroy audio".into());
        }
    }
}

fn build(log: &Log) -> Systems {
    Systems::builder()
        .insert(Rc::new(Physics { log: Rc::clone(log) }))
        .insert(Rc::new(Audio { log: Rc::clone(log), physics: OnceCell::new() }))
        .create()
        .expect("no duplicate systems")
}

#[test]
fn test_lifecycle_and_order() {
    test_util::init();

    let log = Log::default();
    let systems = build(&log);
    assert_eq!(systems.state(), Lifecycle::Created);
    assert_eq!(systems.len(), 2);

    systems.finalize().expect("all dependencies are present");
    assert_eq!(systems.state(), Lifecycle::Finalized);

    systems.tick(0.5);
    assert_eq!(systems.state(), Lifecycle::Ticking);

    drop(systems);
    assert_eq!(
        *log.borrow(),
        [
            "attach physics",
            "attach audio",
            "physics 0.5",
            "audio 0.5",
            "destroy audio",
            "destroy physics",
        ]
    );
}

#[test]
fn test_locate_by_type() {
    test_util::init();

    let log = Log::default();
    let systems = build(&log);

    let physics = systems.locate::<Physics>().expect("physics is registered");
    assert!(Rc::ptr_eq(&physics.log, &log));
    assert!(systems.locate::<crate::entity::EntityRegistry>().is_none());
}

#[test]
fn test_missing_dependency_aborts_startup() {
    test_util::init();

    let systems = Systems::builder().with::<Audio>().create().expect("no duplicate systems");

    let err = systems.finalize().expect_err("physics is missing");
    match err {
        StartupError::Attach { system, source: AttachError::MissingDependency(dependency) } => {
            assert!(system.ends_with("Audio"));
            assert!(dependency.ends_with("Physics"));
        }
        err => panic!("unexpected error {err}"),
    }
    assert_eq!(systems.state(), Lifecycle::Created);
}

#[test]
fn test_duplicate_system() {
    test_util::init();

    let err = Systems::builder().with::<Physics>().with::<Physics>().create().err();
    assert!(matches!(err, Some(StartupError::DuplicateSystem(name)) if name.ends_with("Physics")));
}

#[test]
fn test_finalize_twice() {
    test_util::init();

    let systems = Systems::builder().with::<Physics>().create().expect("no duplicate systems");
    systems.finalize().expect("physics has no dependencies");

    let err = systems.finalize().expect_err("already finalized");
    assert!(matches!(
        err,
        StartupError::InvalidTransition { action: "finalize", state: Lifecycle::Finalized }
    ));
}

#[test]
#[cfg_attr(
    any(
        all(debug_assertions, feature = "debug-checks"),
        all(not(debug_assertions), feature = "release-checks"),
    ),
    should_panic = "cannot tick game systems in the Created state"
)]
fn test_tick_before_finalize() {
    test_util::init();

    let log = Log::default();
    let systems = build(&log);
    systems.tick(1.0);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_destroy_is_idempotent() {
    test_util::init();

    let log = Log::default();
    let systems = build(&log);
    systems.finalize().expect("all dependencies are present");

    systems.destroy();
    systems.destroy();
    assert_eq!(systems.state(), Lifecycle::Destroyed);
    assert_eq!(log.borrow().iter().filter(|line| line.starts_with("destroy")).count(), 2);
}
