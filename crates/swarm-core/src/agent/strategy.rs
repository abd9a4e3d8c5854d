//! Two-tier execution: ask the generation service, validate what comes back,
//! and fall back to deterministic synthesis on any failure.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::generation::{ChatMessage, CompletionRequest, GenerationError, JsonSchema};
use crate::materialize::normalize_relative;

use super::trait_def::Agent;
use super::types::{AgentContext, AgentResult, ResultSource};

/// Run `agent` for `ctx`, preferring generation and falling back to
/// synthesis. Never fails.
pub async fn act_with_fallback<A: Agent + ?Sized>(agent: &A, ctx: &AgentContext<'_>) -> AgentResult {
    let profile = agent.profile();
    let generator = agent.generator();

    if !generator.is_usable() {
        debug!(
            agent_id = profile.id,
            task_id = %ctx.task.id,
            "generation unavailable, synthesizing"
        );
        return agent.synthesize(ctx);
    }

    let request = build_request(agent, ctx);
    let outcome = generator
        .request_structured_completion(&request)
        .await
        .and_then(validate_generated);

    match outcome {
        Ok(result) => {
            info!(
                agent_id = profile.id,
                task_id = %ctx.task.id,
                files = result.files.len(),
                "generated result accepted"
            );
            result
        }
        Err(e) => {
            warn!(
                agent_id = profile.id,
                task_id = %ctx.task.id,
                error = %e,
                "generation failed, falling back to synthesis"
            );
            agent.synthesize(ctx)
        }
    }
}

/// System instruction plus a JSON user payload scoped to the agent's role.
pub fn build_request<A: Agent + ?Sized>(agent: &A, ctx: &AgentContext<'_>) -> CompletionRequest {
    let profile = agent.profile();
    let preceding = ctx.preceding_agents();

    let system = format!(
        "You are the {name} in a team of specialist agents building \"{project}\". \
You specialise exclusively in {specialization}. {brief}\n\n\
Respond with a single JSON object with these keys:\n\
- summary: one sentence describing your deliverable\n\
- message: a short status note addressed to the rest of the team\n\
- files: an object mapping relative file paths to complete file contents\n\
- references: ids of earlier agents whose work you built on ({known})",
        name = profile.name,
        project = ctx.plan.project_name,
        specialization = profile.specialization.to_lowercase(),
        brief = agent.brief(),
        known = if preceding.is_empty() {
            "none have run yet".to_string()
        } else {
            preceding.join(", ")
        },
    );

    let completed: Vec<Value> = preceding
        .iter()
        .filter_map(|id| {
            ctx.outputs
                .get(*id)
                .and_then(|history| history.last())
                .map(|record| json!({ "agentId": id, "summary": record.summary }))
        })
        .collect();

    let payload = json!({
        "project": {
            "name": ctx.plan.project_name,
            "slug": ctx.plan.slug,
            "prompt": ctx.plan.prompt,
            "goals": ctx.plan.goals,
        },
        "task": {
            "id": ctx.task.id,
            "title": ctx.task.title,
            "description": ctx.task.description,
        },
        "completedAgents": completed,
    });

    CompletionRequest {
        messages: vec![
            ChatMessage::system(system),
            ChatMessage::user(
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
            ),
        ],
        temperature: None,
        schema: Some(result_schema()),
    }
}

/// JSON schema describing the expected completion object.
pub fn result_schema() -> JsonSchema {
    JsonSchema {
        name: "agent_result".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string" },
                "message": { "type": "string" },
                "files": {
                    "type": "object",
                    "additionalProperties": { "type": "string" }
                },
                "references": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            },
            "required": ["summary", "message", "files"]
        }),
        strict: false,
    }
}

/// Check a decoded completion and turn it into an [`AgentResult`].
///
/// `summary` and `message` must be non-empty strings and `files` a
/// non-empty object of strings keyed by project-relative paths. Keys are
/// normalized the way the materializer resolves them, and a key that would
/// escape the project or collides after normalization is rejected. A
/// malformed `references` is coerced to empty rather than rejected.
pub fn validate_generated(payload: Map<String, Value>) -> Result<AgentResult, GenerationError> {
    let summary = non_empty_string(&payload, "summary")?;
    let message = non_empty_string(&payload, "message")?;

    let files = match payload.get("files") {
        Some(Value::Object(map)) if !map.is_empty() => {
            let mut files = BTreeMap::new();
            for (path, content) in map {
                let Value::String(content) = content else {
                    return Err(GenerationError::Schema(format!(
                        "file {path:?} content is not a string"
                    )));
                };
                let key = normalize_relative(path)
                    .map_err(|e| GenerationError::Schema(format!("file {e}")))?;
                if files.insert(key, content.clone()).is_some() {
                    return Err(GenerationError::Schema(format!(
                        "file {path:?} duplicates another entry"
                    )));
                }
            }
            files
        }
        Some(Value::Object(_)) => {
            return Err(GenerationError::Schema("`files` is empty".to_string()));
        }
        _ => {
            return Err(GenerationError::Schema(
                "`files` is missing or not an object".to_string(),
            ));
        }
    };

    let references = match payload.get("references") {
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {
            let mut refs: Vec<String> = Vec::with_capacity(items.len());
            for item in items.iter().filter_map(Value::as_str) {
                if !refs.iter().any(|r| r == item) {
                    refs.push(item.to_string());
                }
            }
            refs
        }
        _ => Vec::new(),
    };

    Ok(AgentResult {
        summary,
        message,
        files,
        references,
        source: ResultSource::Generated,
    })
}

fn non_empty_string(payload: &Map<String, Value>, key: &str) -> Result<String, GenerationError> {
    match payload.get(key).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(GenerationError::Schema(format!(
            "`{key}` is missing or empty"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        let result = validate_generated(payload(json!({
            "summary": "Did the thing",
            "message": "Done",
            "files": { "docs/a.md": "# A" },
            "references": ["architecture", "architecture", "component"]
        })))
        .unwrap();
        assert_eq!(result.summary, "Did the thing");
        assert_eq!(result.files["docs/a.md"], "# A");
        assert_eq!(result.references, vec!["architecture", "component"]);
        assert_eq!(result.source, ResultSource::Generated);
    }

    #[test]
    fn rejects_blank_summary() {
        let err = validate_generated(payload(json!({
            "summary": "   ",
            "message": "Done",
            "files": { "a": "b" }
        })))
        .unwrap_err();
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn rejects_empty_files() {
        let err = validate_generated(payload(json!({
            "summary": "s",
            "message": "m",
            "files": {}
        })))
        .unwrap_err();
        assert!(matches!(err, GenerationError::Schema(_)));
    }

    #[test]
    fn rejects_files_array() {
        assert!(
            validate_generated(payload(json!({
                "summary": "s",
                "message": "m",
                "files": ["a.md"]
            })))
            .is_err()
        );
    }

    #[test]
    fn rejects_non_string_file_content() {
        assert!(
            validate_generated(payload(json!({
                "summary": "s",
                "message": "m",
                "files": { "a.json": { "nested": true } }
            })))
            .is_err()
        );
    }

    #[test]
    fn rejects_file_paths_outside_the_project() {
        for path in ["/src/styles/tokens.css", "../x", "docs/../../x", "."] {
            let err = validate_generated(payload(json!({
                "summary": "s",
                "message": "m",
                "files": { "ok.md": "fine", path: "x" }
            })))
            .unwrap_err();
            assert!(matches!(err, GenerationError::Schema(_)), "{path}: {err}");
        }
    }

    #[test]
    fn normalizes_current_dir_file_keys() {
        let result = validate_generated(payload(json!({
            "summary": "s",
            "message": "m",
            "files": { "./docs/a.md": "# A" }
        })))
        .unwrap();
        assert_eq!(result.files.keys().collect::<Vec<_>>(), vec!["docs/a.md"]);

        let err = validate_generated(payload(json!({
            "summary": "s",
            "message": "m",
            "files": { "docs/a.md": "one", "./docs/a.md": "two" }
        })))
        .unwrap_err();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn coerces_malformed_references() {
        let result = validate_generated(payload(json!({
            "summary": "s",
            "message": "m",
            "files": { "a": "b" },
            "references": ["ok", 3]
        })))
        .unwrap();
        assert!(result.references.is_empty());

        let result = validate_generated(payload(json!({
            "summary": "s",
            "message": "m",
            "files": { "a": "b" },
            "references": "architecture"
        })))
        .unwrap();
        assert!(result.references.is_empty());
    }

    #[test]
    fn schema_requires_core_keys() {
        let schema = result_schema();
        assert_eq!(
            schema.schema["required"],
            json!(["summary", "message", "files"])
        );
    }
}
