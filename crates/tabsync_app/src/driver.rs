use std::sync::Arc;
use std::time::Duration;

use tabsync_core::{HostEvent, PushMessage, TabId};
use tabsync_engine::{MemoryHost, SyncEngine, TabHost};
use tabsync_logging::{sync_debug, sync_warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::script::{parse_line, HostOp, OutputLine, ScriptLine};

/// Feeds script lines to the engine and the in-memory host behind it.
pub struct Driver {
    host: Arc<MemoryHost>,
    engine: SyncEngine,
    output: UnboundedSender<OutputLine>,
}

impl Driver {
    pub fn new(
        host: Arc<MemoryHost>,
        engine: SyncEngine,
        output: UnboundedSender<OutputLine>,
    ) -> Self {
        Self {
            host,
            engine,
            output,
        }
    }

    /// Apply every line of `reader`. Malformed lines are logged and skipped.
    /// Returns the number of lines applied.
    pub async fn run<R>(&self, reader: R) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut applied = 0;
        let mut line_no = 0;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(script_line) => {
                    self.apply(script_line).await;
                    applied += 1;
                }
                Err(err) => sync_warn!("line {}: {}", line_no, err),
            }
        }
        Ok(applied)
    }

    pub async fn apply(&self, line: ScriptLine) {
        match line {
            ScriptLine::Host(op) => self.apply_host(op).await,
            ScriptLine::Observer(command) => {
                if let Some(reply) = self.engine.handle_command(command).await {
                    let _ = self.output.send(OutputLine::Reply { reply });
                }
            }
            ScriptLine::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            ScriptLine::Startup => self.engine.startup().await,
        }
    }

    async fn apply_host(&self, op: HostOp) {
        let event = match op {
            HostOp::Open { item } => Some(self.host.open(item)),
            HostOp::Remove { id } => self.host.remove(id),
            HostOp::Update { id, change } => self.host.update(id, change),
            HostOp::Activate { id } => self
                .host
                .activate(id)
                .await
                .map(|()| HostEvent::Activated { id })
                .map_err(|err| sync_warn!("activate: {}", err))
                .ok(),
            HostOp::Move { id, index } => self
                .host
                .move_to(id, index)
                .await
                .map(|()| HostEvent::Moved { id })
                .map_err(|err| sync_warn!("move: {}", err))
                .ok(),
        };
        match event {
            Some(event) => self.engine.handle_host_event(event),
            None => sync_debug!("host operation had no effect"),
        }
    }
}

/// Turn host deliveries into output lines until the host goes away.
pub async fn forward_pushes(
    mut deliveries: UnboundedReceiver<(TabId, PushMessage)>,
    output: UnboundedSender<OutputLine>,
) {
    while let Some((to, message)) = deliveries.recv().await {
        if output.send(OutputLine::Push { to, message }).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabsync_core::ObserverReply;
    use tabsync_engine::SyncSettings;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;

    struct Harness {
        host: Arc<MemoryHost>,
        driver: Driver,
        output: UnboundedReceiver<OutputLine>,
    }

    fn harness() -> Harness {
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let host = Arc::new(MemoryHost::new(Vec::new()).with_outlet(push_tx));
        let engine = SyncEngine::with_http(host.clone(), SyncSettings::default());
        tokio::spawn(forward_pushes(push_rx, out_tx.clone()));
        Harness {
            host: host.clone(),
            driver: Driver::new(host, engine, out_tx),
            output: out_rx,
        }
    }

    fn drain(output: &mut UnboundedReceiver<OutputLine>) -> Vec<OutputLine> {
        let mut lines = Vec::new();
        while let Ok(line) = output.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test(start_paused = true)]
    async fn script_drives_host_and_engine() {
        let mut h = harness();
        let script = r#"
# two reserved pages, nothing to fetch
{"host": {"op": "open", "item": {"id": 1, "title": "Blank", "url": "about:blank", "pinned": true}}}
{"host": {"op": "open", "item": {"id": 2, "url": "chrome://newtab", "active": true}}}
{"wait_ms": 200}
{"observer": {"type": "PING"}}
{"observer": {"type": "MOVE_TAB", "tabId": 2, "newIndex": 0, "pin": true}}
{"wait_ms": 50}
"#;

        let applied = h.driver.run(BufReader::new(script.as_bytes())).await.unwrap();
        assert_eq!(applied, 6);

        let lines = drain(&mut h.output);
        let pushes = lines
            .iter()
            .filter(|line| matches!(line, OutputLine::Push { .. }))
            .count();
        assert_eq!(pushes, 4);
        assert!(lines.contains(&OutputLine::Reply {
            reply: ObserverReply::pong()
        }));

        let order: Vec<_> = h.host.items().iter().map(|item| item.id).collect();
        assert_eq!(order, vec![2, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_lines_are_skipped() {
        let h = harness();
        let script = "not json\n{\"host\": {\"op\": \"remove\", \"id\": 9}}\n\n";
        let applied = h.driver.run(BufReader::new(script.as_bytes())).await.unwrap();
        assert_eq!(applied, 1);
        assert!(h.host.items().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn startup_line_pushes_current_items() {
        let mut h = harness();
        let script = r#"
{"host": {"op": "open", "item": {"id": 5, "title": "Settings", "url": "chrome://settings"}}}
"startup"
"#;
        h.driver.run(BufReader::new(script.as_bytes())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let lines = drain(&mut h.output);
        assert!(matches!(
            lines.first(),
            Some(OutputLine::Push { to: 5, .. })
        ));
    }
}
