//! Turn loop behavior against a real dispatcher and the Lua engine.

use stagehand_auth::Capability;
use stagehand_lua::{AttemptStage, LuaEngine, QueuedScripts, TurnError, TurnLoop};
use stagehand_runtime::catalog::{Catalog, ContentItem, ContentRef, Mood, Pack};
use stagehand_runtime::executor::{Executor, ExecutorSet, RecordingExecutor};
use stagehand_runtime::handle::HandleState;
use stagehand_runtime::{Dispatcher, SessionContext};
use stagehand_types::Category;
use std::sync::Arc;

const BAD_SYNTAX: &str = "stage.image.show{ tags = {'beach'} ";

fn setup(granted: Capability) -> (TurnLoop<LuaEngine>, Arc<Dispatcher>, Arc<RecordingExecutor>) {
    let catalog: Catalog = vec![
        ContentItem::new(Category::Image, ["beach", "calm"], ContentRef::Path("a.png".into())),
        ContentItem::new(Category::Image, ["city"], ContentRef::Path("b.png".into())),
        ContentItem::new(Category::Audio, ["calm"], ContentRef::Path("waves.ogg".into())),
    ]
    .into_iter()
    .collect();
    let pack = Pack::new(
        "seaside",
        Capability::IMAGE | Capability::AUDIO,
        catalog,
        vec![
            Mood::new("calm", ["nature", "calm"]),
            Mood::new("focus", ["work"]),
        ],
    )
    .expect("valid pack");
    let recorder = Arc::new(RecordingExecutor::new());
    let executors = ExecutorSet::uniform(Arc::clone(&recorder) as Arc<dyn Executor>);
    let dispatcher = Arc::new(Dispatcher::new(SessionContext::new(pack, granted), executors).with_seed(3));
    let turns = TurnLoop::new(LuaEngine::new(), Arc::clone(&dispatcher));
    (turns, dispatcher, recorder)
}

#[tokio::test]
async fn three_compile_failures_abort_without_dispatch() {
    let (mut turns, dispatcher, recorder) = setup(Capability::ALL);
    let mut source = QueuedScripts::new([BAD_SYNTAX, BAD_SYNTAX, BAD_SYNTAX, "print('never')"]);

    let err = turns.run_turn(&mut source).await.expect_err("aborted");
    let TurnError::Aborted { attempts, failures } = &err;
    assert_eq!(*attempts, 3);
    assert_eq!(failures.len(), 3);
    assert!(failures.iter().all(|f| f.stage == AttemptStage::Compile));

    assert_eq!(dispatcher.calls_dispatched(), 0);
    assert_eq!(recorder.count(), 0);
    assert_eq!(source.fetched(), 3);
    assert_eq!(source.remaining(), 1);
    assert_eq!(source.failures().len(), 3);
    // three failures plus the abort notice
    assert_eq!(turns.feedback().len(), 4);
}

#[tokio::test]
async fn retry_succeeds_after_a_compile_error() {
    let (mut turns, _dispatcher, _) = setup(Capability::ALL);
    let mut source = QueuedScripts::new([BAD_SYNTAX, "print('second try')"]);

    let report = turns.run_turn(&mut source).await.expect("completes");
    assert_eq!(report.attempts, 2);
    assert_eq!(report.output, vec!["second try"]);
    assert_eq!(source.failures()[0].stage, AttemptStage::Compile);
    assert!(turns.feedback().render().contains("attempt 1 (compile)"));
}

#[tokio::test]
async fn aborted_turn_leaves_handles_active() {
    let (mut turns, dispatcher, _) = setup(Capability::ALL);
    let script = "stage.image.show() error('changed my mind')";
    let mut source = QueuedScripts::new([script, script, script]);

    let err = turns.run_turn(&mut source).await.expect_err("aborted");
    assert_eq!(err.failures().len(), 3);
    assert!(err
        .failures()
        .iter()
        .all(|f| f.stage == AttemptStage::Execute && f.handles.len() == 1 && f.code.is_none()));

    let active = dispatcher.active_handles();
    assert_eq!(active.len(), 3);
    for id in active {
        assert_eq!(
            dispatcher.registry().get(id).map(|s| s.state),
            Some(HandleState::Active)
        );
    }
    assert_eq!(dispatcher.teardown(), 3);
}

#[tokio::test]
async fn pcall_handles_denial_and_script_continues() {
    let (mut turns, dispatcher, recorder) = setup(Capability::IMAGE);
    let script = r#"
local ok, err = pcall(stage.audio.play)
print(ok)
local img = stage.image.show{ tags = {"beach"} }
print(img.kind, img.id)
img:set_opacity(0.5)
img:close()
"#;
    let mut source = QueuedScripts::new([script]);

    let report = turns.run_turn(&mut source).await.expect("completes");
    assert_eq!(report.attempts, 1);
    assert_eq!(report.calls, 4);
    assert_eq!(report.output, vec!["false", "image\t1"]);
    assert_eq!(report.handles.len(), 1);
    assert_eq!(
        dispatcher.registry().get(report.handles[0].id).map(|s| s.state),
        Some(HandleState::Closed)
    );

    let effects = recorder.effects();
    assert_eq!(effects.len(), 3);
    assert_eq!(effects[0].content, Some(ContentRef::Path("a.png".into())));
}

#[tokio::test]
async fn unhandled_denial_fails_the_attempt() {
    let (mut turns, _, recorder) = setup(Capability::IMAGE);
    let mut source = QueuedScripts::new(["stage.audio.play()", "print('fine')"]);

    let report = turns.run_turn(&mut source).await.expect("second attempt");
    assert_eq!(report.attempts, 2);
    let failure = &source.failures()[0];
    assert_eq!(failure.stage, AttemptStage::Execute);
    assert_eq!(failure.code, Some("PERMISSION_DENIED"));
    assert!(failure.message.contains("grant 'audio' in settings"));
    assert!(turns.feedback().render().contains("grant 'audio'"));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn undecodable_arguments_on_ungranted_category_are_denied() {
    let (mut turns, dispatcher, recorder) = setup(Capability::IMAGE);
    let mut source = QueuedScripts::new([
        "stage.audio.play{ sparkle = true }",
        "stage.audio.set_volume('oops', 0.5)",
        "stage.audio.play{ volume = 'loud' }",
    ]);

    let err = turns.run_turn(&mut source).await.expect_err("all denied");
    assert!(err
        .failures()
        .iter()
        .all(|f| f.code == Some("PERMISSION_DENIED")));
    assert_eq!(dispatcher.calls_dispatched(), 3);
    assert_eq!(recorder.count(), 0);
    assert!(dispatcher.active_handles().is_empty());
}

#[tokio::test]
async fn undecodable_arguments_on_granted_category_are_rejected() {
    let (mut turns, _, recorder) = setup(Capability::ALL);
    let mut source = QueuedScripts::new([
        "stage.audio.set_volume('oops', 0.5)",
        "local a = stage.audio.play() a:move('left', 2)",
        "print('ok')",
    ]);

    let report = turns.run_turn(&mut source).await.expect("third attempt");
    assert_eq!(report.attempts, 3);
    let codes: Vec<_> = source.failures().iter().map(|f| f.code).collect();
    assert_eq!(codes, vec![Some("INVALID_ARGUMENTS"), Some("INVALID_ARGUMENTS")]);
    assert!(source.failures()[0].message.contains("audio.set_volume"));
    // only the successful play reached an executor
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn invalid_options_are_rejected() {
    let (mut turns, _, recorder) = setup(Capability::ALL);
    let mut source = QueuedScripts::new([
        "stage.image.show{ opacity = 2 }",
        "stage.image.show{ sparkle = true }",
        "stage.prompt.show(42)",
    ]);

    let err = turns.run_turn(&mut source).await.expect_err("all invalid");
    let codes: Vec<_> = err.failures().iter().map(|f| f.code).collect();
    assert_eq!(
        codes,
        vec![
            Some("INVALID_ARGUMENTS"),
            Some("INVALID_ARGUMENTS"),
            Some("INVALID_ARGUMENTS")
        ]
    );
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn functional_forms_and_moods() {
    let (mut turns, dispatcher, recorder) = setup(Capability::ALL);
    let script = r#"
local music = stage.audio.play{ loop = true }
stage.audio.set_volume(music.id, 0.2)
stage.audio.pause(music)
stage.audio.stop(music)
stage.mood.set("focus")
local mood = stage.mood.get()
print(mood.name, #stage.mood.list())
"#;
    let mut source = QueuedScripts::new([script]);

    let report = turns.run_turn(&mut source).await.expect("completes");
    assert_eq!(report.output, vec!["focus\t2"]);
    assert!(dispatcher.active_handles().is_empty());
    assert_eq!(dispatcher.session().mood().name(), "focus");

    let ops: Vec<String> = recorder
        .effects()
        .iter()
        .map(|e| e.operation.to_string())
        .collect();
    assert_eq!(
        ops,
        vec!["audio.play", "audio.set_volume", "audio.pause", "audio.stop"]
    );
    assert_eq!(recorder.effects()[1].attrs.volume, Some(0.2));
}

#[tokio::test]
async fn exhausted_source_counts_as_failures() {
    let (mut turns, _, _) = setup(Capability::ALL);
    let mut source = QueuedScripts::new(Vec::<String>::new());
    let err = turns.run_turn(&mut source).await.expect_err("nothing to run");
    assert!(err.failures().iter().all(|f| f.stage == AttemptStage::Source));
}

#[tokio::test]
async fn runaway_script_is_stopped() {
    let (turns, _, _) = setup(Capability::ALL);
    let mut turns = turns.with_max_attempts(1);
    let mut source = QueuedScripts::new(["while true do end"]);
    let err = turns.run_turn(&mut source).await.expect_err("aborted");
    assert!(err.failures()[0].message.contains("instruction limit"));
}
