/// End-to-end MCP sessions: JSON-RPC lines in, responses out
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use habit_tracker::*;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

fn at(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

struct Session {
    server: McpServer,
    clock: Arc<FixedClock>,
    next_id: u64,
    _db: NamedTempFile,
}

impl Session {
    async fn start(now: NaiveDateTime) -> Self {
        let db = NamedTempFile::new().expect("Failed to create temp file");
        let clock = Arc::new(FixedClock::new(now));
        let tracker = HabitTrackerServer::with_clock(db.path().to_path_buf(), clock.clone())
            .await
            .expect("Failed to create server");

        Self {
            server: McpServer::new(tracker),
            clock,
            next_id: 1,
            _db: db,
        }
    }

    async fn request(&mut self, method: &str, params: Value) -> JsonRpcResponse {
        let id = self.next_id;
        self.next_id += 1;
        let line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();

        let response = self.server.handle_line(&line).await.expect("requests get a response");
        assert_eq!(response.id, json!(id));
        response
    }

    /// Call a tool and return its result object
    async fn call(&mut self, tool: &str, arguments: Value) -> Value {
        let response = self
            .request("tools/call", json!({"name": tool, "arguments": arguments}))
            .await;
        assert!(response.error.is_none(), "unexpected JSON-RPC error: {:?}", response.error);
        response.result.expect("tool calls return a result")
    }
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

#[cfg(test)]
mod mcp_session_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let mut session = Session::start(at(15, 9)).await;

        let init = session.request("initialize", json!({})).await;
        let result = init.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2024-11-05"));
        assert_eq!(result["serverInfo"]["name"], json!("Habit Tracker"));

        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(session.server.handle_line(&notification).await.is_none());

        let tools = session.request("tools/list", json!({})).await.result.unwrap();
        let names: Vec<&str> = tools["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"habit_complete"));
        assert!(tools["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_null_id_gets_a_response() {
        let mut session = Session::start(at(15, 9)).await;

        let line = json!({"jsonrpc": "2.0", "id": null, "method": "ping"}).to_string();
        let response = session.server.handle_line(&line).await.expect("null id is a request");
        assert_eq!(response.id, Value::Null);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_habit_workflow_over_mcp() {
        let mut session = Session::start(at(15, 9)).await;

        let created = session
            .call("habit_create", json!({"name": "Morning Run", "periodicity": "daily"}))
            .await;
        assert_eq!(created["isError"], json!(false));
        let habit_id = created["structuredContent"]["habit_id"].as_str().unwrap().to_string();

        let done = session.call("habit_complete", json!({"habit_id": habit_id})).await;
        assert_eq!(done["structuredContent"]["current_streak"], json!(1));

        let early = session.call("habit_complete", json!({"habit_id": habit_id})).await;
        assert_eq!(early["structuredContent"]["success"], json!(false));
        assert!(text(&early).contains("Not due yet"));

        session.clock.set(at(16, 20));
        let again = session.call("habit_complete", json!({"habit_id": habit_id})).await;
        assert_eq!(again["structuredContent"]["current_streak"], json!(2));

        let status = session
            .call("habit_status", json!({"habit_id": habit_id, "include_recent": true}))
            .await;
        let recent = status["structuredContent"]["habits"][0]["recent"].as_array().unwrap();
        assert_eq!(recent.len(), 2);

        let analytics = session.call("habit_analytics", json!({"query": "longest_overall"})).await;
        assert_eq!(analytics["structuredContent"]["leader"]["longest_streak"], json!(2));

        let deleted = session.call("habit_delete", json!({"habit_id": habit_id})).await;
        assert_eq!(deleted["isError"], json!(false));

        let listed = session.call("habit_list", json!({})).await;
        assert!(listed["structuredContent"]["habits"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_protected_fields() {
        let mut session = Session::start(at(15, 9)).await;
        let created = session
            .call("habit_create", json!({"name": "Read", "periodicity": "weekly"}))
            .await;
        let habit_id = created["structuredContent"]["habit_id"].as_str().unwrap().to_string();

        let rejected = session
            .call("habit_update", json!({"habit_id": habit_id, "periodicity": "daily"}))
            .await;
        assert_eq!(rejected["isError"], json!(true));

        let renamed = session
            .call("habit_update", json!({"habit_id": habit_id, "name": "Read a chapter"}))
            .await;
        assert_eq!(renamed["isError"], json!(false));

        let listed = session.call("habit_list", json!({"periodicity": "weekly"})).await;
        assert_eq!(listed["structuredContent"]["habits"][0]["name"], json!("Read a chapter"));
    }

    #[tokio::test]
    async fn test_errors_are_reported() {
        let mut session = Session::start(at(15, 9)).await;

        let bad_periodicity = session
            .call("habit_create", json!({"name": "Run", "periodicity": "hourly"}))
            .await;
        assert_eq!(bad_periodicity["isError"], json!(true));

        let missing = session
            .call("habit_complete", json!({"habit_id": HabitId::new().to_string()}))
            .await;
        assert_eq!(missing["isError"], json!(true));
        assert!(text(&missing).contains("Habit not found"));

        let unknown_tool = session.call("habit_log", json!({})).await;
        assert_eq!(unknown_tool["isError"], json!(true));

        let unknown_method = session.request("resources/list", json!({})).await;
        assert_eq!(unknown_method.error.unwrap().code, -32601);

        let garbage = session.server.handle_line("{not json").await.unwrap();
        assert_eq!(garbage.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let mut session = Session::start(at(15, 9)).await;
        session.call("habit_create", json!({"name": "Run", "periodicity": "daily"})).await;

        let refused = session.call("habit_clear", json!({"confirm": false})).await;
        assert_eq!(refused["structuredContent"]["deleted"], json!(0));

        let cleared = session.call("habit_clear", json!({"confirm": true})).await;
        assert_eq!(cleared["structuredContent"]["deleted"], json!(1));
    }
}
