//! 网络连接管理
//!
//! WebSocket 运行在进程级 tokio Runtime 上。连接任务只负责收发帧，
//! 把结果以 [`ConnectionEvent`] 放入队列，由 Bevy 系统在主调度中取出处理。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use lazy_static::lazy_static;
use protocol::{
    decode_server_frame, ClientMessage, Connection, Connector, ProtocolError, ServerMessage,
    WsConnector,
};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

lazy_static! {
    /// 网络 Runtime
    static ref RUNTIME: Runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("chess-network")
        .enable_all()
        .build()
        .expect("failed to build network runtime");
}

/// 连接任务产生的事件
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// 握手完成
    Opened,
    /// 收到一帧服务端消息
    Frame(ServerMessage),
    /// 连接关闭
    Closed,
    /// 连接出错
    Failed(String),
}

type EventQueue = Arc<StdMutex<Vec<(u64, ConnectionEvent)>>>;

/// 网络连接包装器
///
/// 同一时间最多一个连接任务；每次连接递增代号，旧任务残留的事件在取出时丢弃。
pub struct NetworkConnection {
    generation: AtomicU64,
    task: StdMutex<Option<JoinHandle<()>>>,
    outgoing: StdMutex<Option<mpsc::UnboundedSender<ClientMessage>>>,
    events: EventQueue,
}

impl NetworkConnection {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            task: StdMutex::new(None),
            outgoing: StdMutex::new(None),
            events: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    /// 建立新连接，先拆除旧连接
    pub fn connect(&self, url: String) {
        self.disconnect();

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut outgoing) = self.outgoing.lock() {
            *outgoing = Some(tx);
        }

        let events = self.events.clone();
        let handle = RUNTIME.spawn(run_connection(url, generation, rx, events));
        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    /// 断开连接，旧任务的事件不再上报
    pub fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut outgoing) = self.outgoing.lock() {
            outgoing.take();
        }
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
                tracing::debug!("Previous connection task aborted");
            }
        }
    }

    /// 发送消息（加入发送队列，同步调用）
    pub fn queue_send(&self, msg: ClientMessage) -> Result<(), ProtocolError> {
        let outgoing = self.outgoing.lock().map_err(|_| ProtocolError::NotConnected)?;
        match outgoing.as_ref() {
            Some(tx) => tx.send(msg).map_err(|_| ProtocolError::ConnectionClosed),
            None => Err(ProtocolError::NotConnected),
        }
    }

    /// 取出当前连接的事件
    pub fn drain_events(&self) -> Vec<ConnectionEvent> {
        let current = self.generation.load(Ordering::SeqCst);
        let drained = match self.events.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => return Vec::new(),
        };
        drained
            .into_iter()
            .filter(|(generation, _)| *generation == current)
            .map(|(_, event)| event)
            .collect()
    }

    /// 当前代号
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for NetworkConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetworkConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// 连接任务主循环
async fn run_connection(
    url: String,
    generation: u64,
    mut outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    events: EventQueue,
) {
    let push = |event: ConnectionEvent| {
        if let Ok(mut queue) = events.lock() {
            queue.push((generation, event));
        }
    };

    let conn = match WsConnector.connect(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", url, e);
            push(ConnectionEvent::Failed(e.to_string()));
            return;
        }
    };
    tracing::info!(
        "Connected to server: {} ({})",
        url,
        conn.peer_addr().unwrap_or_else(|| "unknown peer".to_string())
    );
    push(ConnectionEvent::Opened);

    let (mut reader, mut writer) = conn.split();
    loop {
        tokio::select! {
            frame = reader.read_text() => match frame {
                Ok(Some(text)) => match decode_server_frame(&text) {
                    Ok(msg) => push(ConnectionEvent::Frame(msg)),
                    Err(e) => tracing::warn!("Dropping malformed frame: {}", e),
                },
                Ok(None) => {
                    tracing::info!("Connection closed by server");
                    push(ConnectionEvent::Closed);
                    break;
                }
                Err(e) => {
                    tracing::error!("Connection error: {}", e);
                    push(ConnectionEvent::Failed(e.to_string()));
                    break;
                }
            },
            msg = outgoing.recv() => match msg {
                Some(msg) => {
                    tracing::debug!("Sending {}", msg.kind());
                    if let Err(e) = writer.write_frame(&msg).await {
                        tracing::error!("Failed to send {}: {}", msg.kind(), e);
                        push(ConnectionEvent::Failed(e.to_string()));
                        break;
                    }
                }
                None => {
                    if let Err(e) = writer.close().await {
                        tracing::debug!("Close handshake failed: {}", e);
                    }
                    push(ConnectionEvent::Closed);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use protocol::Side;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;

    /// 轮询事件直到满足条件或超时
    fn wait_for<F>(conn: &NetworkConnection, mut done: F) -> Vec<ConnectionEvent>
    where
        F: FnMut(&[ConnectionEvent]) -> bool,
    {
        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.extend(conn.drain_events());
            if done(&seen) {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        seen
    }

    #[test]
    fn test_send_without_connection() {
        let conn = NetworkConnection::new();
        let msg = ClientMessage::JoinGame {
            game_id: "g".to_string(),
            player_id: "p".to_string(),
        };
        assert!(matches!(conn.queue_send(msg), Err(ProtocolError::NotConnected)));
        assert!(conn.drain_events().is_empty());
    }

    #[test]
    fn test_stale_events_are_discarded() {
        let conn = NetworkConnection::new();
        let old = conn.generation();
        if let Ok(mut queue) = conn.events.lock() {
            queue.push((old, ConnectionEvent::Opened));
        }
        conn.disconnect();
        assert!(conn.drain_events().is_empty());
    }

    #[test]
    fn test_connect_failure_reports_event() {
        // 先占用端口再释放，保证无人监听
        let addr = RUNTIME.block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        });

        let conn = NetworkConnection::new();
        conn.connect(format!("ws://{addr}"));
        let events = wait_for(&conn, |seen| !seen.is_empty());
        assert!(matches!(events.first(), Some(ConnectionEvent::Failed(_))));
    }

    #[test]
    fn test_session_round_trip() {
        let (listener, addr) = RUNTIME.block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            (listener, addr)
        });

        let server = RUNTIME.spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let frame = ws.next().await.unwrap().unwrap();
            let msg: ClientMessage = serde_json::from_str(frame.to_text().unwrap()).unwrap();
            assert_eq!(msg.kind(), "join_game");
            ws.send(Message::text(r#"{"type":"player_color","color":"black"}"#))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        });

        let conn = NetworkConnection::new();
        conn.connect(format!("ws://{addr}"));

        let events = wait_for(&conn, |seen| seen.contains(&ConnectionEvent::Opened));
        assert_eq!(events, vec![ConnectionEvent::Opened]);

        conn.queue_send(ClientMessage::JoinGame {
            game_id: "g".to_string(),
            player_id: "p".to_string(),
        })
        .unwrap();

        let events = wait_for(&conn, |seen| seen.contains(&ConnectionEvent::Closed));
        assert_eq!(
            events,
            vec![
                ConnectionEvent::Frame(ServerMessage::PlayerColor { color: Side::Black }),
                ConnectionEvent::Closed,
            ]
        );

        RUNTIME.block_on(server).unwrap();
    }
}
