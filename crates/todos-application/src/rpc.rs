//! JSON-lines transport for [`TaskApi`].
//!
//! Each inbound line is one request object:
//!
//! ```json
//! { "id": 1, "token": "secret-a", "method": "create", "args": { "title": "Buy milk" } }
//! { "id": 2, "subscribe": true, "method": "getIncomplete" }
//! { "id": 3, "cancel": 1 }
//! ```
//!
//! Replies echo `id` and carry either `result` or `error`. A subscription
//! reply is `{ "id", "result": { "subscription": n } }` and every snapshot
//! is then pushed as `{ "subscription": n, "tasks": [...] }`.

use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use todos_core::error::{Result, TodoError};

use crate::api::{ApiError, TaskApi, TaskRequest};
use crate::live_query::Subscription;

/// Envelope fields that are not part of the request body.
const ENVELOPE_KEYS: [&str; 4] = ["id", "token", "subscribe", "cancel"];

struct Session {
    api: Arc<TaskApi>,
    outbound: mpsc::UnboundedSender<Value>,
    subscriptions: HashMap<u64, Subscription>,
    next_subscription: u64,
}

impl Session {
    fn reply(&self, id: Value, result: Result<Value>) {
        let message = match result {
            Ok(result) => json!({ "id": id, "result": result }),
            Err(e) => json!({ "id": id, "error": ApiError::from(&e) }),
        };
        // Receiver only goes away once the session is shutting down
        let _ = self.outbound.send(message);
    }

    async fn handle_line(&mut self, line: &str) {
        let mut object = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                self.reply(
                    Value::Null,
                    Err(TodoError::validation("request", "expected a JSON object")),
                );
                return;
            }
            Err(e) => {
                self.reply(Value::Null, Err(TodoError::from(e)));
                return;
            }
        };

        let id = object.remove("id").unwrap_or(Value::Null);
        let result = self.dispatch(&mut object).await;
        self.reply(id, result);
    }

    async fn dispatch(&mut self, object: &mut Map<String, Value>) -> Result<Value> {
        if let Some(cancel) = object.get("cancel") {
            let subscription = cancel
                .as_u64()
                .ok_or_else(|| TodoError::validation("cancel", "expected a subscription number"))?;
            return self.cancel(subscription);
        }

        let token = match object.get("token") {
            None | Some(Value::Null) => None,
            Some(Value::String(token)) => Some(token.clone()),
            Some(_) => return Err(TodoError::validation("token", "expected a string")),
        };
        let subscribe = object
            .get("subscribe")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        for key in ENVELOPE_KEYS {
            object.remove(key);
        }
        let request: TaskRequest = serde_json::from_value(Value::Object(std::mem::take(object)))
            .map_err(|e| TodoError::validation("request", e.to_string()))?;

        if subscribe {
            self.subscribe(token.as_deref(), &request).await
        } else {
            let response = self.api.call(token.as_deref(), request).await?;
            Ok(serde_json::to_value(response)?)
        }
    }

    async fn subscribe(&mut self, token: Option<&str>, request: &TaskRequest) -> Result<Value> {
        let live = self.api.subscribe(token, request).await?;
        let number = self.next_subscription;
        self.next_subscription += 1;

        let outbound = self.outbound.clone();
        let subscription = live.subscribe(move |tasks| {
            let _ = outbound.send(json!({ "subscription": number, "tasks": tasks }));
        });
        self.subscriptions.insert(number, subscription);
        tracing::debug!("[Rpc] Subscription {} opened for {}", number, request.method());

        Ok(json!({ "subscription": number }))
    }

    fn cancel(&mut self, number: u64) -> Result<Value> {
        match self.subscriptions.remove(&number) {
            Some(subscription) => {
                subscription.cancel();
                tracing::debug!("[Rpc] Subscription {} cancelled", number);
                Ok(json!({ "success": true }))
            }
            None => Err(TodoError::not_found("Subscription", number.to_string())),
        }
    }
}

async fn write_lines<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Value>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Serves requests from `reader` until EOF, writing replies and pushed
/// snapshots to `writer`. Open subscriptions are cancelled at EOF.
pub async fn serve<R, W>(api: Arc<TaskApi>, reader: R, writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound, receiver) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_lines(writer, receiver));

    let mut session = Session {
        api,
        outbound,
        subscriptions: HashMap::new(),
        next_subscription: 1,
    };

    tracing::info!("[Rpc] Session started");
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        session.handle_line(&line).await;
    }

    let open = session.subscriptions.len();
    drop(session);
    tracing::info!("[Rpc] Session ended ({} subscriptions closed)", open);

    writer_task
        .await
        .map_err(|e| TodoError::internal(format!("rpc writer task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_service::TaskService;
    use std::time::Duration;
    use todos_infrastructure::{InMemoryTaskRepository, SingleUserAuthenticator};
    use tokio::io::{BufReader, DuplexStream, Lines};
    use tokio::time::timeout;

    struct Client {
        input: DuplexStream,
        output: Lines<BufReader<DuplexStream>>,
    }

    impl Client {
        async fn send(&mut self, message: Value) {
            let mut line = message.to_string();
            line.push('\n');
            self.input.write_all(line.as_bytes()).await.unwrap();
        }

        async fn recv(&mut self) -> Value {
            let line = timeout(Duration::from_secs(2), self.output.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            serde_json::from_str(&line).unwrap()
        }
    }

    fn start() -> (Client, tokio::task::JoinHandle<Result<()>>) {
        let api = Arc::new(TaskApi::new(
            TaskService::new(Arc::new(InMemoryTaskRepository::new())),
            Arc::new(SingleUserAuthenticator),
        ));
        let (client_in, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(serve(api, BufReader::new(server_in), server_out));
        let client = Client {
            input: client_in,
            output: BufReader::new(client_out).lines(),
        };
        (client, server)
    }

    #[tokio::test]
    async fn test_call_and_reply() {
        let (mut client, server) = start();

        client
            .send(json!({ "id": 1, "method": "create", "args": { "title": "Buy milk" } }))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["title"], "Buy milk");

        client.send(json!({ "id": 2, "method": "getAll" })).await;
        let reply = client.recv().await;
        assert_eq!(reply["result"].as_array().unwrap().len(), 1);

        drop(client);
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_bad_lines_get_error_replies() {
        let (mut client, _server) = start();

        client.input.write_all(b"{not json\n").await.unwrap();
        let reply = client.recv().await;
        assert_eq!(reply["error"]["kind"], "serialization");

        client.send(json!({ "id": "x", "method": "explode" })).await;
        let reply = client.recv().await;
        assert_eq!(reply["id"], "x");
        assert_eq!(reply["error"]["kind"], "validation");

        client.send(json!({ "id": 3, "cancel": 99 })).await;
        let reply = client.recv().await;
        assert_eq!(reply["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_subscription_pushes_snapshots() {
        let (mut client, _server) = start();

        client
            .send(json!({ "id": 1, "subscribe": true, "method": "getIncomplete" }))
            .await;

        // The reply and the initial push race on the outbound channel
        let mut reply = None;
        let mut initial = None;
        for _ in 0..2 {
            let message = client.recv().await;
            if message.get("id").is_some() {
                reply = Some(message);
            } else {
                initial = Some(message);
            }
        }
        let reply = reply.unwrap();
        let initial = initial.unwrap();
        let number = reply["result"]["subscription"].as_u64().unwrap();
        assert_eq!(initial["subscription"], number);
        assert!(initial["tasks"].as_array().unwrap().is_empty());

        client
            .send(json!({ "id": 2, "method": "create", "args": { "title": "a" } }))
            .await;
        let mut saw_push = false;
        let mut saw_reply = false;
        while !(saw_push && saw_reply) {
            let message = client.recv().await;
            if message.get("subscription").is_some() {
                assert_eq!(message["tasks"].as_array().unwrap().len(), 1);
                saw_push = true;
            } else {
                assert_eq!(message["id"], 2);
                saw_reply = true;
            }
        }

        client.send(json!({ "id": 3, "cancel": number })).await;
        let reply = client.recv().await;
        assert_eq!(reply["result"]["success"], true);
    }

    #[tokio::test]
    async fn test_subscribing_to_write_is_rejected() {
        let (mut client, _server) = start();

        client
            .send(json!({
                "id": 1,
                "subscribe": true,
                "method": "deleteTodo",
                "args": { "id": "x" }
            }))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["error"]["kind"], "validation");
    }
}
