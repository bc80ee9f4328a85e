//! Remote-call surface.
//!
//! Requests arrive as `{ "method": "...", "args": { ... } }` with camelCase
//! argument names and are dispatched onto [`TaskService`] after the caller
//! token has been verified.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use todos_core::error::{Result, TodoError};
use todos_core::identity::{Authenticator, OwnerId, RequestContext};
use todos_core::task::{Task, TaskId, TaskPatch, TaskQuery};

use crate::live_query::LiveQuery;
use crate::task_service::{Ack, TaskService};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArgs {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArgs {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleArgs {
    pub id: TaskId,
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteArgs {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// One remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRequest", into = "RawRequest")]
pub enum TaskRequest {
    GetAll(ReadArgs),
    GetCompleted(ReadArgs),
    GetIncomplete(ReadArgs),
    GetAllNewest(ReadArgs),
    GetIncompleteNewest(ReadArgs),
    Create(CreateArgs),
    UpdateTodo(UpdateArgs),
    Toggle(ToggleArgs),
    DeleteTodo(DeleteArgs),
}

/// Wire form of [`TaskRequest`]. `args` may be omitted for reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRequest {
    method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    args: Value,
}

fn parse_args<T: serde::de::DeserializeOwned>(method: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args)
        .map_err(|e| TodoError::validation("args", format!("invalid arguments for {}: {}", method, e)))
}

impl TryFrom<RawRequest> for TaskRequest {
    type Error = TodoError;

    fn try_from(raw: RawRequest) -> Result<Self> {
        let RawRequest { method, args } = raw;
        let request = match method.as_str() {
            "getAll" => Self::GetAll(parse_args(&method, args)?),
            "getCompleted" => Self::GetCompleted(parse_args(&method, args)?),
            "getIncomplete" => Self::GetIncomplete(parse_args(&method, args)?),
            "getAllNewest" => Self::GetAllNewest(parse_args(&method, args)?),
            "getIncompleteNewest" => Self::GetIncompleteNewest(parse_args(&method, args)?),
            "create" => Self::Create(parse_args(&method, args)?),
            "updateTodo" => Self::UpdateTodo(parse_args(&method, args)?),
            "toggle" => Self::Toggle(parse_args(&method, args)?),
            "deleteTodo" => Self::DeleteTodo(parse_args(&method, args)?),
            other => {
                return Err(TodoError::validation(
                    "method",
                    format!("unknown method '{}'", other),
                ));
            }
        };
        Ok(request)
    }
}

impl From<TaskRequest> for RawRequest {
    fn from(request: TaskRequest) -> Self {
        let method = request.method().to_string();
        let args = match request {
            TaskRequest::GetAll(args)
            | TaskRequest::GetCompleted(args)
            | TaskRequest::GetIncomplete(args)
            | TaskRequest::GetAllNewest(args)
            | TaskRequest::GetIncompleteNewest(args) => serde_json::to_value(args),
            TaskRequest::Create(args) => serde_json::to_value(args),
            TaskRequest::UpdateTodo(args) => serde_json::to_value(args),
            TaskRequest::Toggle(args) => serde_json::to_value(args),
            TaskRequest::DeleteTodo(args) => serde_json::to_value(args),
        };
        // Plain structs of strings and bools always serialize
        RawRequest {
            method,
            args: args.unwrap_or(Value::Null),
        }
    }
}

impl TaskRequest {
    pub fn method(&self) -> &'static str {
        match self {
            Self::GetAll(_) => "getAll",
            Self::GetCompleted(_) => "getCompleted",
            Self::GetIncomplete(_) => "getIncomplete",
            Self::GetAllNewest(_) => "getAllNewest",
            Self::GetIncompleteNewest(_) => "getIncompleteNewest",
            Self::Create(_) => "create",
            Self::UpdateTodo(_) => "updateTodo",
            Self::Toggle(_) => "toggle",
            Self::DeleteTodo(_) => "deleteTodo",
        }
    }

    /// The query a read request evaluates, `None` for writes.
    pub fn read_query(&self) -> Option<TaskQuery> {
        match self {
            Self::GetAll(_) => Some(TaskQuery::all()),
            Self::GetCompleted(_) => Some(TaskQuery::completed()),
            Self::GetIncomplete(_) => Some(TaskQuery::incomplete()),
            Self::GetAllNewest(_) => Some(TaskQuery::all_newest()),
            Self::GetIncompleteNewest(_) => Some(TaskQuery::incomplete_newest()),
            _ => None,
        }
    }

    fn claimed_owner(&self) -> Option<OwnerId> {
        let user_id = match self {
            Self::GetAll(args)
            | Self::GetCompleted(args)
            | Self::GetIncomplete(args)
            | Self::GetAllNewest(args)
            | Self::GetIncompleteNewest(args) => &args.user_id,
            Self::Create(args) => &args.user_id,
            Self::UpdateTodo(args) => &args.user_id,
            Self::Toggle(args) => &args.user_id,
            Self::DeleteTodo(args) => &args.user_id,
        };
        user_id.as_deref().map(OwnerId::from)
    }
}

/// Result of a remote call. Serializes as `Task[]`, `Task`, or
/// `{ "success": true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskResponse {
    Tasks(Vec<Task>),
    Task(Task),
    Ack(Ack),
}

/// Error payload sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: String,
    pub message: String,
}

impl From<&TodoError> for ApiError {
    fn from(err: &TodoError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// Authenticating front door to the [`TaskService`].
pub struct TaskApi {
    service: TaskService,
    authenticator: Arc<dyn Authenticator>,
}

impl TaskApi {
    pub fn new(service: TaskService, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            service,
            authenticator,
        }
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    async fn context(&self, token: Option<&str>, request: &TaskRequest) -> Result<RequestContext> {
        let identity = self.authenticator.authenticate(token).await?;
        Ok(RequestContext::new(identity).claiming(request.claimed_owner()))
    }

    /// Authenticates and executes one request. Reads return a one-shot
    /// snapshot; use [`TaskApi::subscribe`] for live delivery.
    pub async fn call(&self, token: Option<&str>, request: TaskRequest) -> Result<TaskResponse> {
        let ctx = self.context(token, &request).await?;
        tracing::debug!("[TaskApi] {}", request.method());

        if let Some(query) = request.read_query() {
            return Ok(TaskResponse::Tasks(self.service.snapshot(&ctx, query).await?));
        }

        let response = match request {
            TaskRequest::Create(args) => {
                TaskResponse::Task(self.service.create(&ctx, &args.title, &args.description).await?)
            }
            TaskRequest::UpdateTodo(args) => {
                let patch = TaskPatch {
                    title: args.title,
                    description: args.description,
                    is_completed: None,
                };
                TaskResponse::Task(self.service.update_todo(&ctx, &args.id, patch).await?)
            }
            TaskRequest::Toggle(args) => {
                TaskResponse::Ack(self.service.toggle(&ctx, &args.id, args.is_completed).await?)
            }
            TaskRequest::DeleteTodo(args) => {
                TaskResponse::Ack(self.service.delete_todo(&ctx, &args.id).await?)
            }
            _ => return Err(TodoError::internal("read request reached write dispatch")),
        };
        Ok(response)
    }

    /// Authenticates a read request and returns its live query.
    ///
    /// # Errors
    ///
    /// `Validation` if `request` is a write.
    pub async fn subscribe(&self, token: Option<&str>, request: &TaskRequest) -> Result<LiveQuery> {
        let query = request.read_query().ok_or_else(|| {
            TodoError::validation(
                "method",
                format!("'{}' is not a query and cannot be subscribed to", request.method()),
            )
        })?;
        let ctx = self.context(token, request).await?;
        self.service.live(&ctx, query)
    }

    /// Parses a JSON request, executes it, and returns either the response
    /// value or `{ "error": { "kind", "message" } }`.
    pub async fn call_json(&self, token: Option<&str>, json: &str) -> Value {
        let result = match serde_json::from_str::<TaskRequest>(json) {
            Ok(request) => self.call(token, request).await,
            Err(e) => Err(TodoError::validation("request", e.to_string())),
        };
        match result {
            Ok(response) => serde_json::to_value(response)
                .unwrap_or_else(|e| error_value(&TodoError::from(e))),
            Err(e) => error_value(&e),
        }
    }
}

/// `{ "error": { "kind", "message" } }`
pub fn error_value(err: &TodoError) -> Value {
    serde_json::json!({ "error": ApiError::from(err) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use todos_infrastructure::{InMemoryTaskRepository, SingleUserAuthenticator, TokenAuthenticator};

    fn single_user_api() -> TaskApi {
        TaskApi::new(
            TaskService::new(Arc::new(InMemoryTaskRepository::new())),
            Arc::new(SingleUserAuthenticator),
        )
    }

    #[test]
    fn test_request_parsing() {
        let request: TaskRequest = serde_json::from_value(json!({
            "method": "updateTodo",
            "args": { "id": "t-1", "title": "X", "userId": "alice" }
        }))
        .unwrap();
        assert_eq!(
            request,
            TaskRequest::UpdateTodo(UpdateArgs {
                id: TaskId::from("t-1"),
                title: Some("X".to_string()),
                description: None,
                user_id: Some("alice".to_string()),
            })
        );
        assert_eq!(request.claimed_owner(), Some(OwnerId::from("alice")));
    }

    #[test]
    fn test_read_args_are_optional() {
        let request: TaskRequest = serde_json::from_str(r#"{"method":"getAllNewest"}"#).unwrap();
        assert_eq!(request, TaskRequest::GetAllNewest(ReadArgs::default()));
        assert_eq!(request.read_query(), Some(TaskQuery::all_newest()));
    }

    #[test]
    fn test_unknown_method_and_bad_args_fail() {
        assert!(serde_json::from_str::<TaskRequest>(r#"{"method":"drop"}"#).is_err());
        assert!(
            serde_json::from_str::<TaskRequest>(r#"{"method":"toggle","args":{"id":"x"}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_request_serializes_to_wire_shape() {
        let request = TaskRequest::Toggle(ToggleArgs {
            id: TaskId::from("t-1"),
            is_completed: true,
            user_id: None,
        });
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "method": "toggle", "args": { "id": "t-1", "isCompleted": true } })
        );
    }

    #[tokio::test]
    async fn test_call_json_round_trip() {
        let api = single_user_api();

        let created = api
            .call_json(
                None,
                r#"{"method":"create","args":{"title":"Buy milk","description":"2%"}}"#,
            )
            .await;
        assert_eq!(created["title"], "Buy milk");
        assert_eq!(created["isCompleted"], false);
        let id = created["id"].as_str().unwrap().to_string();

        let ack = api
            .call_json(
                None,
                &json!({"method": "toggle", "args": {"id": id, "isCompleted": true}}).to_string(),
            )
            .await;
        assert_eq!(ack, json!({ "success": true }));

        let completed = api.call_json(None, r#"{"method":"getCompleted"}"#).await;
        assert_eq!(completed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_call_json_reports_errors() {
        let api = single_user_api();

        let blank = api
            .call_json(None, r#"{"method":"create","args":{"title":"  "}}"#)
            .await;
        assert_eq!(blank["error"]["kind"], "validation");

        let missing = api
            .call_json(
                None,
                r#"{"method":"updateTodo","args":{"id":"nope","title":"x"}}"#,
            )
            .await;
        assert_eq!(missing["error"]["kind"], "not_found");

        let garbage = api.call_json(None, "not json").await;
        assert_eq!(garbage["error"]["kind"], "validation");
    }

    #[tokio::test]
    async fn test_forged_user_id_is_rejected() {
        let service = TaskService::new(Arc::new(InMemoryTaskRepository::new()))
            .with_anonymous_access(false);
        let api = TaskApi::new(
            service,
            Arc::new(TokenAuthenticator::new([(
                "secret-a".to_string(),
                OwnerId::from("alice"),
            )])),
        );

        // Anonymous caller claiming to be alice
        let forged = api
            .call_json(
                None,
                r#"{"method":"create","args":{"title":"x","userId":"alice"}}"#,
            )
            .await;
        assert_eq!(forged["error"]["kind"], "unauthorized");

        // Alice claiming to be bob
        let forged = api
            .call_json(
                Some("secret-a"),
                r#"{"method":"getAll","args":{"userId":"bob"}}"#,
            )
            .await;
        assert_eq!(forged["error"]["kind"], "unauthorized");

        let own = api
            .call_json(
                Some("secret-a"),
                r#"{"method":"create","args":{"title":"x","userId":"alice"}}"#,
            )
            .await;
        assert_eq!(own["userId"], "alice");
    }

    #[tokio::test]
    async fn test_subscribe_rejects_writes() {
        let api = single_user_api();
        let request = TaskRequest::DeleteTodo(DeleteArgs {
            id: TaskId::from("x"),
            user_id: None,
        });
        let err = api.subscribe(None, &request).await.err().unwrap();
        assert!(err.is_validation());
    }
}
