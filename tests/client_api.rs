//! Integration tests for the API client against a mock backend

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use agent_orchestrator::{
    probe_ollama, refresh_agents, refresh_workflows, AgentDraft, AgentPatch, Client, ErrorKind,
    ExecutionLog, LlmConfig, LlmProvider, LogLevel, NodeType, OrchestratorError, Studio, TeamDraft,
    TeamPatch, Workflow, WorkflowDraft, WorkflowEdge, WorkflowNode, WorkflowPatch,
};
use futures::StreamExt;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Client {
    Client::builder()
        .base_url(&server.uri())
        .unwrap()
        .timeout(5_000)
        .build()
        .unwrap()
}

fn agent_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "role": "Research",
        "description": "",
        "llmProvider": "ollama",
        "modelName": "llama2",
        "systemPrompt": "",
        "temperature": 0.7,
        "maxTokens": 2000,
        "status": "idle",
        "createdAt": "2024-05-01T09:00:00.123456",
        "updatedAt": "2024-05-01T09:00:00.123456"
    })
}

fn workflow_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "nodes": [start_node_json()],
        "edges": [],
        "status": "draft",
        "createdAt": "2024-05-01T09:00:00",
        "updatedAt": "2024-05-01T09:00:00"
    })
}

fn start_node_json() -> serde_json::Value {
    json!({
        "id": "1",
        "type": "input",
        "position": {"x": 250.0, "y": 25.0},
        "data": {"label": "Start"}
    })
}

fn team_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "agents": [agent_json("a1", "Researcher")],
        "createdAt": "2024-05-01T09:00:00",
        "updatedAt": "2024-05-01T09:00:00"
    })
}

fn log_event(id: &str, level: &str, message: &str) -> String {
    let payload = json!({
        "id": id,
        "workflowId": "w1",
        "timestamp": "2024-05-01T09:00:00",
        "level": level,
        "message": message
    });
    format!("data: {}\n\n", payload)
}

#[tokio::test]
async fn test_list_and_get_agents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([agent_json("a1", "Researcher"), agent_json("a2", "Writer")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/agents/a2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_json("a2", "Writer")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let agents = client.agents().list().await.unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0].name, "Researcher");

    let agent = client.agents().get("a2").await.unwrap();
    assert_eq!(agent.name, "Writer");
}

#[tokio::test]
async fn test_create_agent_sends_clamped_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/agents"))
        .and(body_json(json!({
            "name": "Researcher",
            "role": "R",
            "description": "",
            "llmProvider": "ollama",
            "modelName": "llama2",
            "systemPrompt": "",
            "temperature": 2.0,
            "maxTokens": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_json("a1", "Researcher")))
        .expect(1)
        .mount(&server)
        .await;

    let draft = AgentDraft::new("Researcher", "R", "llama2")
        .temperature(5.0)
        .max_tokens(50);
    let agent = client_for(&server).agents().create(&draft).await.unwrap();
    assert_eq!(agent.id, "a1");
}

#[tokio::test]
async fn test_update_agent_sends_only_supplied_fields() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/agents/a1"))
        .and(body_json(json!({ "name": "Lead researcher" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(agent_json("a1", "Lead researcher")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = AgentPatch {
        name: Some("Lead researcher".into()),
        ..Default::default()
    };
    let agent = client_for(&server).agents().update("a1", &patch).await.unwrap();
    assert_eq!(agent.name, "Lead researcher");
}

#[tokio::test]
async fn test_missing_resource_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Agent not found"})))
        .mount(&server)
        .await;

    let error = client_for(&server).agents().get("missing").await.unwrap_err();
    assert!(matches!(error, OrchestratorError::NotFound(ref m) if m.contains("Agent not found")));
    assert_eq!(error.kind(), ErrorKind::Backend);
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_backend_and_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let error = client_for(&server).workflows().list().await.unwrap_err();
    match &error {
        OrchestratorError::Server { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Nothing listens on port 1
    let client = Client::builder()
        .base_url("http://127.0.0.1:1")
        .unwrap()
        .timeout(2_000)
        .build()
        .unwrap();

    let error = client.agents().list().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_undecodable_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).teams().list().await;
    let error = assert_err!(result);
    assert!(matches!(error, OrchestratorError::InvalidResponse(ref m) if m.contains("/api/teams")));
    assert_eq!(error.kind(), ErrorKind::MalformedPayload);
}

#[tokio::test]
async fn test_execute_workflow_returns_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/workflows/w1/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Workflow execution started",
            "workflowId": "w1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client_for(&server).workflows().execute("w1").await.unwrap();
    assert_eq!(ack.message, "Workflow execution started");
    assert_eq!(ack.workflow_id.as_deref(), Some("w1"));
}

#[tokio::test]
async fn test_execute_checked_refuses_invalid_graph() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut workflow = Workflow::new("Broken", "");
    workflow.edges.push(WorkflowEdge::new("e1", "1", "2"));

    let error = client_for(&server)
        .workflows()
        .execute_checked(&workflow)
        .await
        .unwrap_err();
    assert!(matches!(error, OrchestratorError::InvalidGraph(ref m) if m.contains("e1")));
}

#[tokio::test]
async fn test_delete_team() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/teams/t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "Team deleted successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert_ok!(client_for(&server).teams().delete("t1").await);
}

#[tokio::test]
async fn test_list_logs_filters_by_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs"))
        .and(query_param("workflowId", "w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "l1",
            "workflowId": "w1",
            "agentId": null,
            "timestamp": "2024-05-01T09:00:00.5",
            "level": "info",
            "message": "Starting workflow execution: Research",
            "metadata": null
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let logs = client_for(&server).logs().list(Some("w1")).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Info);
}

#[tokio::test]
async fn test_active_executions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/active-executions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "x2": {"workflow_id": "w2", "status": "running", "start_time": "2024-05-01T09:05:00"},
            "x1": {"workflow_id": "w1", "status": "running", "start_time": "2024-05-01T09:00:00"}
        })))
        .mount(&server)
        .await;

    let executions = client_for(&server).logs().active_executions().await.unwrap();
    let ids: Vec<&str> = executions.iter().map(|e| e.execution_id.as_str()).collect();
    assert_eq!(ids, vec!["x1", "x2"]);
}

#[tokio::test]
async fn test_subscribe_surfaces_malformed_events_and_continues() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: {{not json}}\n\n: keep-alive\n\n{}",
        log_event("l1", "info", "started"),
        log_event("l2", "error", "agent failed")
    );
    Mock::given(method("GET"))
        .and(path("/api/logs/stream/w1"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let subscription = client_for(&server).logs().subscribe("w1").await.unwrap();
    let items: Vec<_> = tokio::time::timeout(Duration::from_secs(5), subscription.collect())
        .await
        .expect("stream should end with the response body");

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].as_ref().unwrap().message, "started");
    assert!(matches!(items[1], Err(OrchestratorError::MalformedEvent(_))));
    assert_eq!(items[2].as_ref().unwrap().level, LogLevel::Error);
}

#[tokio::test]
async fn test_stream_delivers_well_formed_logs_in_order() {
    let server = MockServer::start().await;
    let body = format!(
        "{}data: garbage\n\n{}",
        log_event("l1", "info", "first"),
        log_event("l2", "info", "second")
    );
    Mock::given(method("GET"))
        .and(path("/api/logs/stream/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let received: Arc<Mutex<Vec<ExecutionLog>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let handle = client_for(&server)
        .logs()
        .stream("w1", move |log| sink.lock().unwrap().push(log))
        .await
        .unwrap();
    assert_eq!(handle.workflow_id(), "w1");

    tokio::time::timeout(Duration::from_secs(5), async {
        while !handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stream should end with the response body");
    handle.close().await;

    let messages: Vec<String> = received
        .lock()
        .unwrap()
        .iter()
        .map(|log| log.message.clone())
        .collect();
    assert_eq!(messages, vec!["first", "second"]);
}

#[tokio::test]
async fn test_stream_open_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs/stream/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Workflow not found"})))
        .mount(&server)
        .await;

    let error = client_for(&server)
        .logs()
        .stream("nope", |_| {})
        .await
        .unwrap_err();
    assert!(matches!(error, OrchestratorError::NotFound(_)));
}

#[tokio::test]
async fn test_llm_connection_success_is_backend_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/llm/test"))
        .and(body_json(json!({"provider": "openai", "modelName": "gpt-4"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "OpenAI API key required"
        })))
        .mount(&server)
        .await;

    let config = LlmConfig::new(LlmProvider::OpenAI, "gpt-4");
    let client = client_for(&server);
    assert!(!client.llm().test_connection(&config).await.unwrap());

    let detailed = client.llm().test_connection_detailed(&config).await.unwrap();
    assert_eq!(detailed.message.as_deref(), Some("OpenAI API key required"));
}

#[tokio::test]
async fn test_list_ollama_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/llm/ollama/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "llama2:latest", "size": 3826793677u64, "modified_at": "2024-04-01T10:00:00Z", "digest": "abc"}
        ])))
        .mount(&server)
        .await;

    let models = client_for(&server).llm().list_ollama_models().await.unwrap();
    assert_eq!(models[0].name, "llama2:latest");
    assert_eq!(models[0].size, 3826793677);
}

#[tokio::test]
async fn test_health_and_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Agent Orchestrator API",
            "version": "0.1.0",
            "status": "running"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.health().await.unwrap().is_healthy());
    assert_eq!(client.info().await.unwrap().version, "0.1.0");
}

#[tokio::test]
async fn test_probe_ollama() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": []})))
        .mount(&server)
        .await;

    assert!(probe_ollama(&server.uri()).await.unwrap());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    assert!(!probe_ollama(&down.uri()).await.unwrap());
}

#[tokio::test]
async fn test_refresh_agents_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([agent_json("a1", "Researcher")])))
        .mount(&server)
        .await;

    let studio = Studio::new().shared();
    let agents = client_for(&server).agents();

    assert!(refresh_agents(&studio, &agents).await.unwrap());
    assert_eq!(studio.read().await.agents.get("a1").unwrap().name, "Researcher");
}

#[tokio::test]
async fn test_create_update_delete_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .and(body_json(json!({
            "name": "Research",
            "description": "collect sources",
            "nodes": [start_node_json()],
            "edges": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("w1", "Research")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/workflows/w1"))
        .and(body_json(json!({
            "nodes": [
                start_node_json(),
                {
                    "id": "2",
                    "type": "agent",
                    "position": {"x": 100.0, "y": 200.0},
                    "data": {"label": "Researcher", "agentId": "a1"}
                }
            ],
            "edges": [{"id": "e1-2", "source": "1", "target": "2"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("w1", "Research")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/workflows/w1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "Workflow deleted successfully"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workflows = client_for(&server).workflows();
    let created = workflows
        .create(&WorkflowDraft::new("Research", "collect sources"))
        .await
        .unwrap();
    assert_eq!(created.id, "w1");

    let mut nodes = created.nodes.clone();
    nodes.push(
        WorkflowNode::new("2", NodeType::Agent, "Researcher")
            .at(100.0, 200.0)
            .with_agent("a1"),
    );
    let patch = WorkflowPatch {
        nodes: Some(nodes),
        edges: Some(vec![WorkflowEdge::new("e1-2", "1", "2")]),
        ..Default::default()
    };
    assert_ok!(workflows.update("w1", &patch).await);
    assert_ok!(workflows.delete("w1").await);
}

#[tokio::test]
async fn test_create_and_update_team() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/teams"))
        .and(body_json(json!({
            "name": "Research desk",
            "description": "sources and drafts",
            "agentIds": ["a1", "a2"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(team_json("t1", "Research desk")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/teams/t1"))
        .and(body_json(json!({"name": "Newsroom"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(team_json("t1", "Newsroom")))
        .expect(1)
        .mount(&server)
        .await;

    let teams = client_for(&server).teams();
    let draft = TeamDraft::new("Research desk", "sources and drafts")
        .with_agent("a1")
        .with_agent("a2");
    let team = teams.create(&draft).await.unwrap();
    assert_eq!(team.agent_ids(), vec!["a1"]);

    let patch = TeamPatch {
        name: Some("Newsroom".into()),
        ..Default::default()
    };
    assert_eq!(teams.update("t1", &patch).await.unwrap().name, "Newsroom");
}

#[tokio::test]
async fn test_refresh_workflows_from_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            workflow_json("w1", "Research"),
            workflow_json("w2", "Review")
        ])))
        .mount(&server)
        .await;

    let studio = Studio::new().shared();
    let workflows = client_for(&server).workflows();

    assert!(refresh_workflows(&studio, &workflows).await.unwrap());
    let guard = studio.read().await;
    let names: Vec<&str> = guard.workflows.list().iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Research", "Review"]);
}

#[tokio::test]
async fn test_ids_are_escaped_as_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/agents/a%3Fx%3D1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/agents/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/w%2F2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("w/2", "Nested")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_ok!(client.agents().delete("a?x=1").await);
    assert_eq!(client.workflows().get("w/2").await.unwrap().id, "w/2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_stops_delivery_of_buffered_records() {
    let server = MockServer::start().await;
    let body: String = (0..20)
        .map(|i| log_event(&format!("l{}", i), "info", &format!("record {}", i)))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/logs/stream/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();
    let (first_tx, first_rx) = mpsc::channel::<()>();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let handle = client_for(&server)
        .logs()
        .stream("w1", move |_log| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                let _ = first_tx.send(());
                let _ = release_rx.recv();
            }
        })
        .await
        .unwrap();

    // Hold the first callback until the remaining records sit in the buffer
    let first = tokio::task::spawn_blocking(move || first_rx.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap();
    assert_ok!(first);
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.cancel();
    release_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle.close())
        .await
        .expect("close should return once the callback is released");

    assert_eq!(delivered.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_named_events_are_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        "event: ping\ndata: {{\"ts\": 1}}\n\n{}",
        log_event("l1", "warning", "slow agent")
    );
    Mock::given(method("GET"))
        .and(path("/api/logs/stream/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let subscription = client_for(&server).logs().subscribe("w1").await.unwrap();
    let items: Vec<_> = tokio::time::timeout(Duration::from_secs(5), subscription.collect())
        .await
        .expect("stream should end with the response body");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap().level, LogLevel::Warning);
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/agents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = Client::builder()
        .base_url(&server.uri())
        .unwrap()
        .timeout(200)
        .build()
        .unwrap();

    let error = client.agents().list().await.unwrap_err();
    assert!(matches!(error, OrchestratorError::Timeout { timeout_ms: 200 }));
    assert!(error.is_retryable());
}
