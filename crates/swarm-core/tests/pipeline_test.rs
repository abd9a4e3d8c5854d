//! End-to-end pipeline runs against the real filesystem.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use swarm_core::events::{EventKind, TaskStatus};
use swarm_core::generation::{GenerationConfig, HttpGenerator};
use swarm_core::{
    AgentContext, AgentRoster, FixedClock, Generator, Outputs, PipelineError, ResultSource,
    RunClock, create_plan,
};
use swarm_test_utils::{
    ClosingSink, FailingGenerator, RecordingSink, ScriptedGenerator, TEST_START_MS,
    completion_payload, offline_orchestrator, orchestrator_with,
};

const PROMPT: &str = "Build a dashboard to visualise specialised swarm collaboration.";

fn expected_kinds() -> Vec<&'static str> {
    let mut kinds = vec!["plan"];
    for _ in 0..6 {
        kinds.extend(["status", "message", "status"]);
    }
    kinds.extend(["summary", "project"]);
    kinds
}

#[tokio::test]
async fn offline_run_streams_every_step_and_writes_project() {
    let tmp = TempDir::new().unwrap();
    let orch = offline_orchestrator(tmp.path());
    let sink = RecordingSink::new();

    let outcome = orch.run(PROMPT, &sink).await.unwrap();

    assert_eq!(sink.kinds(), expected_kinds());

    let events = sink.events();
    let mut last = i64::MIN;
    for event in &events {
        assert!(event.timestamp >= last);
        last = event.timestamp;
    }

    let order: Vec<&str> = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Status { status: TaskStatus::Started, .. }))
        .map(|e| e.agent_id.as_str())
        .collect();
    assert_eq!(
        order,
        vec!["architecture", "component", "styling", "accessibility", "responsive", "performance"]
    );

    let dir = &outcome.project.directory;
    assert_eq!(
        dir.file_name().unwrap().to_string_lossy(),
        format!("{}-{TEST_START_MS}", outcome.plan.slug)
    );
    for (path, content) in &outcome.project.files {
        assert_eq!(&std::fs::read_to_string(dir.join(path)).unwrap(), content);
    }
    assert!(dir.join("package.json").exists());
    assert!(dir.join("docs/architecture.md").exists());

    for history in outcome.outputs.values() {
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].source, ResultSource::Synthesized);
    }
}

#[tokio::test]
async fn project_files_are_union_of_message_files() {
    let tmp = TempDir::new().unwrap();
    let orch = offline_orchestrator(tmp.path());
    let sink = RecordingSink::new();

    let outcome = orch.run(PROMPT, &sink).await.unwrap();

    let mut touched = BTreeSet::new();
    for event in sink.events() {
        if let EventKind::Message { details, .. } = event.kind {
            touched.extend(details.files);
        }
    }
    let written: BTreeSet<String> = outcome.project.files.keys().cloned().collect();
    assert_eq!(touched, written);
}

#[tokio::test]
async fn summary_and_project_events_carry_run_results() {
    let tmp = TempDir::new().unwrap();
    let orch = offline_orchestrator(tmp.path());
    let sink = RecordingSink::new();

    let outcome = orch.run(PROMPT, &sink).await.unwrap();
    let events = sink.events();

    let summary = serde_json::to_value(&events[events.len() - 2]).unwrap();
    assert_eq!(summary["type"], "summary");
    assert_eq!(summary["agentId"], "orchestrator");
    assert_eq!(summary["details"]["planId"], outcome.plan.id.to_string());
    assert_eq!(summary["details"]["completedTasks"], 6);
    assert_eq!(summary["details"]["goalCount"], outcome.plan.goals.len());
    assert!(summary["details"]["contributions"]["styling"].is_array());

    let project = serde_json::to_value(events.last().unwrap()).unwrap();
    assert_eq!(project["type"], "project");
    assert_eq!(project["project"]["slug"], outcome.plan.slug);
    assert_eq!(
        project["project"]["directory"],
        Value::String(outcome.project.directory.display().to_string())
    );
}

#[tokio::test]
async fn failing_generator_falls_back_to_identical_synthesis() {
    let tmp = TempDir::new().unwrap();
    let failing = Arc::new(FailingGenerator::new());
    let orch = orchestrator_with(failing.clone(), tmp.path());

    let with_failures = orch.run(PROMPT, &RecordingSink::new()).await.unwrap();
    assert_eq!(failing.calls(), 6);

    let disabled: Arc<dyn Generator> =
        Arc::new(HttpGenerator::new(GenerationConfig::disabled()).unwrap());
    let offline = orchestrator_with(disabled, tmp.path())
        .run(PROMPT, &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(with_failures.project.files, offline.project.files);
    assert_ne!(with_failures.project.directory, offline.project.directory);
}

#[tokio::test]
async fn http_500_from_service_falls_back_to_synthesis() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(6)
        .mount(&server)
        .await;

    let config = GenerationConfig {
        base_url: server.uri(),
        ..GenerationConfig::with_api_key("sk-test")
    };
    let generator: Arc<dyn Generator> = Arc::new(HttpGenerator::new(config).unwrap());

    let tmp = TempDir::new().unwrap();
    let sink = RecordingSink::new();
    let outcome = orchestrator_with(generator, tmp.path())
        .run(PROMPT, &sink)
        .await
        .unwrap();

    assert_eq!(sink.kinds(), expected_kinds());
    assert!(
        outcome
            .outputs
            .values()
            .flatten()
            .all(|r| r.source == ResultSource::Synthesized)
    );
}

#[tokio::test]
async fn generated_results_are_used_and_later_writers_win() {
    let generator = Arc::new(ScriptedGenerator::new(|request| {
        let system = &request.messages[0].content;
        let role = ["Architecture", "Component", "Styling", "Accessibility", "Responsive", "Performance"]
            .into_iter()
            .find(|r| system.contains(&format!("You are the {r}")))
            .unwrap_or("Unknown");
        Ok(completion_payload(
            &format!("{role} plan"),
            "docs/shared.md",
            &format!("written by {role}"),
        ))
    }));

    let tmp = TempDir::new().unwrap();
    let outcome = orchestrator_with(generator.clone(), tmp.path())
        .run(PROMPT, &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(outcome.project.files.len(), 1);
    assert_eq!(outcome.project.files["docs/shared.md"], "written by Performance");
    assert!(
        outcome
            .outputs
            .values()
            .flatten()
            .all(|r| r.source == ResultSource::Generated)
    );

    let requests = generator.requests();
    assert_eq!(requests.len(), 6);
    let last_user: Value = serde_json::from_str(&requests[5].messages[1].content).unwrap();
    let completed = last_user["completedAgents"].as_array().unwrap();
    assert_eq!(completed.len(), 5);
    assert_eq!(completed[0]["agentId"], "architecture");
    assert_eq!(completed[0]["summary"], "Architecture plan");
}

#[tokio::test]
async fn malformed_generated_results_fall_back_to_synthesis() {
    let generator = Arc::new(ScriptedGenerator::new(|_| {
        let mut payload = completion_payload("done", "docs/x.md", "x");
        payload.insert("files".to_string(), Value::Object(Default::default()));
        Ok(payload)
    }));

    let tmp = TempDir::new().unwrap();
    let malformed = orchestrator_with(generator.clone(), tmp.path())
        .run(PROMPT, &RecordingSink::new())
        .await
        .unwrap();
    assert_eq!(generator.requests().len(), 6);

    let offline = offline_orchestrator(tmp.path())
        .run(PROMPT, &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(malformed.project.files, offline.project.files);
    assert!(
        malformed
            .outputs
            .values()
            .flatten()
            .all(|r| r.source == ResultSource::Synthesized)
    );
}

#[tokio::test]
async fn escaping_generated_path_falls_back_for_that_agent_only() {
    let generator = Arc::new(ScriptedGenerator::new(|request| {
        let system = &request.messages[0].content;
        if system.contains("You are the Styling Agent") {
            Ok(completion_payload("Styling plan", "/src/styles/tokens.css", ":root {}"))
        } else {
            Ok(completion_payload("Generated plan", "./docs/notes.md", "notes"))
        }
    }));

    let tmp = TempDir::new().unwrap();
    let sink = RecordingSink::new();
    let outcome = orchestrator_with(generator, tmp.path())
        .run("Build a chart", &sink)
        .await
        .unwrap();

    assert_eq!(sink.kinds(), expected_kinds());
    for (agent_id, history) in &outcome.outputs {
        let expected = if agent_id == "styling" {
            ResultSource::Synthesized
        } else {
            ResultSource::Generated
        };
        assert_eq!(history[0].source, expected, "{agent_id}");
    }

    let dir = &outcome.project.directory;
    assert!(outcome.project.files.contains_key("docs/notes.md"));
    assert!(!outcome.project.files.contains_key("./docs/notes.md"));
    assert!(!outcome.project.files.keys().any(|p| p.starts_with('/')));
    assert!(dir.join("docs/notes.md").is_file());
    assert!(dir.join("docs/styling.md").is_file());
}

#[tokio::test]
async fn todo_prompt_produces_manifest_and_documentation() {
    let tmp = TempDir::new().unwrap();
    let outcome = offline_orchestrator(tmp.path())
        .run("Build a todo app with dark mode", &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(outcome.plan.slug, "build-a-todo-app-with-dark");
    let files = &outcome.project.files;
    let manifest: Value = serde_json::from_str(&files["package.json"]).unwrap();
    assert!(manifest.is_object());
    assert!(files.keys().any(|p| p.starts_with("docs/") && p.ends_with(".md")));
    assert!(outcome.project.directory.join("package.json").is_file());
}

#[tokio::test]
async fn acting_twice_on_one_plan_yields_identical_files() {
    let roster = AgentRoster::standard(Arc::new(FailingGenerator::new()));
    let plan = create_plan("Build a todo app with dark mode", &roster);
    let run = RunClock::capture(&FixedClock::from_millis(TEST_START_MS));
    let outputs = Outputs::new();

    for agent in roster.iter() {
        let task = plan.task_for(agent.profile().id).unwrap();
        let ctx = AgentContext {
            plan: &plan,
            task,
            outputs: &outputs,
            run,
        };
        let first = agent.act(&ctx).await;
        let second = agent.act(&ctx).await;
        assert_eq!(first.files, second.files, "{}", agent.profile().id);
        assert_eq!(first.source, ResultSource::Synthesized);
    }
}

#[tokio::test]
async fn materialization_failure_emits_error_and_no_project() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("projects");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let orch = offline_orchestrator(&blocker);
    let sink = RecordingSink::new();
    let err = orch.run(PROMPT, &sink).await.unwrap_err();
    assert!(matches!(err, PipelineError::Materialize(_)));

    let kinds = sink.kinds();
    assert_eq!(kinds.len(), 1 + 6 * 3 + 1);
    assert_eq!(*kinds.last().unwrap(), "error");
    assert!(!kinds.contains(&"project"));
    assert!(!kinds.contains(&"summary"));

    let error = sink.events().pop().unwrap();
    assert!(error.content.starts_with("Failed to write project files:"));
}

#[tokio::test]
async fn closed_sink_detaches_but_run_completes() {
    let tmp = TempDir::new().unwrap();
    let orch = offline_orchestrator(tmp.path());
    let sink = ClosingSink::after(3);

    let outcome = orch.run(PROMPT, &sink).await.unwrap();

    assert_eq!(sink.accepted().len(), 3);
    assert_eq!(sink.attempts(), 4);
    assert!(outcome.project.directory.join("package.json").exists());
    assert_eq!(outcome.outputs.len(), 6);
}

#[tokio::test]
async fn concurrent_runs_get_distinct_directories() {
    let tmp = TempDir::new().unwrap();
    let orch = Arc::new(offline_orchestrator(tmp.path()));

    let a = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.run(PROMPT, &RecordingSink::new()).await })
    };
    let b = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.run(PROMPT, &RecordingSink::new()).await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();
    assert_ne!(a.plan.id, b.plan.id);
    assert_ne!(a.project.directory, b.project.directory);
    assert_eq!(a.project.files, b.project.files);
}
