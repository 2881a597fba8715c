use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tacs_agents::{build_consensus_decision, Agent, AgentStatusSnapshot};
use tacs_models::{
    AgentCapability, MarketSnapshot, Message, MessageKind, MessageTarget, PerformanceState,
    PerformanceUpdate, PersistedState, TacsConfig, TradingDecision, STATE_KEY,
};
use tacs_store::StateStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broadcast::BroadcastSink;
use crate::error::CoordinatorError;
use crate::fast_path::FastPathEngine;

/// Rebuilds the agent registry; invoked at spawn and on every reset.
pub type AgentFactory = Box<dyn Fn() -> Vec<Arc<dyn Agent>> + Send + Sync>;

/// Point-in-time view of the coordinator, safe to call at any moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub agents: Vec<AgentStatusSnapshot>,
    pub queue_depth: usize,
    pub active_decision_count: usize,
    pub uptime_secs: u64,
}

/// Acknowledgement returned by `submit`. A rejected message was dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub accepted: bool,
    pub message_id: Uuid,
}

enum Command {
    Decide {
        snapshot: MarketSnapshot,
        use_fast_path: bool,
        reply: oneshot::Sender<TradingDecision>,
    },
    Submit {
        message: Message,
        reply: oneshot::Sender<SubmitReceipt>,
    },
    Status {
        reply: oneshot::Sender<CoordinatorStatus>,
    },
    Performance {
        reply: oneshot::Sender<PerformanceState>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), CoordinatorError>>,
    },
    /// A message surfaced outside the command flow, e.g. a late consensus
    /// response. Enqueued like any routed response.
    Enqueue(Message),
    /// Completion of a consensus round, delivered by its collection task so
    /// aggregation happens on the single-writer path.
    FinishConsensus {
        responses: Vec<Message>,
        elapsed_ms: u64,
        reply: oneshot::Sender<TradingDecision>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cheaply cloneable handle to the coordinator task. All methods fail only
/// when the coordinator has terminated.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    /// Produce one trading decision for the given snapshot. Routes through
    /// the fast path when requested and the snapshot qualifies, otherwise
    /// through the agent consensus round.
    pub async fn decide(
        &self,
        snapshot: MarketSnapshot,
        use_fast_path: bool,
    ) -> Result<TradingDecision, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Decide {
                snapshot,
                use_fast_path,
                reply,
            })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)
    }

    /// Submit a message into the coordinator's routing flow. Critical
    /// messages are routed before this returns; others are queued.
    pub async fn submit(&self, message: Message) -> Result<SubmitReceipt, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Submit { message, reply })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)
    }

    pub async fn status(&self) -> Result<CoordinatorStatus, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status { reply })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)
    }

    pub async fn performance(&self) -> Result<PerformanceState, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Performance { reply })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)
    }

    /// Tear down every agent and rebuild the registry from scratch. The
    /// performance singleton survives; the queue and decision table do not.
    pub async fn reset(&self) -> Result<(), CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Reset { reply })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)?
    }

    /// Graceful shutdown: agents are shut down and state persisted before
    /// this resolves.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Shutdown { reply })
            .await
            .map_err(|_| CoordinatorError::Terminated)?;
        rx.await.map_err(|_| CoordinatorError::Terminated)
    }
}

/// Spawn the coordinator task. Restores persisted state, initializes every
/// agent, and only then starts accepting commands.
pub async fn spawn_coordinator(
    config: TacsConfig,
    factory: AgentFactory,
    store: Arc<dyn StateStore>,
    broadcast: Arc<dyn BroadcastSink>,
) -> Result<CoordinatorHandle, CoordinatorError> {
    let agents = build_registry(&factory).await?;

    let (queue, performance) = restore_state(store.as_ref()).await;

    let (tx, rx) = mpsc::channel(64);
    let coordinator = Coordinator {
        fast_path: FastPathEngine::new(config.fast_path.clone()),
        config,
        agents,
        factory,
        queue,
        performance,
        active_decisions: HashMap::new(),
        store,
        broadcast,
        tx: tx.clone(),
        started: Instant::now(),
        cancel: CancellationToken::new(),
    };
    tokio::spawn(coordinator.run(rx));

    Ok(CoordinatorHandle { tx })
}

async fn build_registry(
    factory: &AgentFactory,
) -> Result<HashMap<AgentCapability, Arc<dyn Agent>>, CoordinatorError> {
    let mut agents: HashMap<AgentCapability, Arc<dyn Agent>> = HashMap::new();
    for agent in factory() {
        agent.initialize().await?;
        agents.insert(agent.capability(), agent);
    }
    info!(agent_count = agents.len(), "Agent registry initialized");
    Ok(agents)
}

async fn restore_state(store: &dyn StateStore) -> (VecDeque<Message>, PerformanceState) {
    match store.get(STATE_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) => {
                info!(
                    messages = state.recent_messages.len(),
                    saved_at = %state.saved_at,
                    "Restored persisted coordinator state"
                );
                (state.recent_messages.into(), state.performance)
            }
            Err(e) => {
                warn!(error = %e, "Persisted state unreadable, starting fresh");
                (VecDeque::new(), PerformanceState::default())
            }
        },
        Ok(None) => (VecDeque::new(), PerformanceState::default()),
        Err(e) => {
            warn!(error = %e, "State store unavailable at startup, starting fresh");
            (VecDeque::new(), PerformanceState::default())
        }
    }
}

struct Coordinator {
    config: TacsConfig,
    fast_path: FastPathEngine,
    agents: HashMap<AgentCapability, Arc<dyn Agent>>,
    factory: AgentFactory,
    queue: VecDeque<Message>,
    performance: PerformanceState,
    active_decisions: HashMap<Uuid, TradingDecision>,
    store: Arc<dyn StateStore>,
    broadcast: Arc<dyn BroadcastSink>,
    tx: mpsc::Sender<Command>,
    started: Instant,
    cancel: CancellationToken,
}

impl Coordinator {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        let mut drain = tokio::time::interval(Duration::from_millis(
            self.config.coordinator.queue_drain_interval_ms.max(1),
        ));
        drain.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut gc = tokio::time::interval(Duration::from_secs(60));
        gc.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // A fixed deadline, so a long actor turn straddling midnight still
        // fires the reset immediately afterwards instead of skipping a day.
        let mut next_daily_reset = tokio::time::Instant::now() + time_until_local_midnight();

        loop {
            tokio::select! {
                command = rx.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = drain.tick() => {
                    self.drain_one().await;
                }
                _ = gc.tick() => {
                    self.gc_decisions();
                }
                _ = tokio::time::sleep_until(next_daily_reset) => {
                    self.midnight_reset().await;
                    next_daily_reset = tokio::time::Instant::now() + time_until_local_midnight();
                }
            }
        }

        self.cancel.cancel();
        for agent in self.agents.values() {
            agent.shutdown().await;
        }
        self.persist().await;
        info!("Coordinator terminated");
    }

    /// Returns true when the loop should exit.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Decide {
                snapshot,
                use_fast_path,
                reply,
            } => {
                self.handle_decide(snapshot, use_fast_path, reply).await;
            }
            Command::Submit { message, reply } => {
                let receipt = self.handle_submit(message).await;
                let _ = reply.send(receipt);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.status());
            }
            Command::Performance { reply } => {
                let _ = reply.send(self.performance.clone());
            }
            Command::Reset { reply } => {
                let _ = reply.send(self.handle_reset().await);
            }
            Command::Enqueue(message) => {
                debug!(id = %message.id, "Enqueued out-of-band message");
                self.queue.push_back(message);
            }
            Command::FinishConsensus {
                responses,
                elapsed_ms,
                reply,
            } => {
                let decision = if responses.is_empty() {
                    TradingDecision::wait(
                        Decimal::new(5, 2),
                        format!("No agent responses within {elapsed_ms}ms"),
                    )
                } else {
                    build_consensus_decision(&responses)
                };
                debug!(
                    responses = responses.len(),
                    elapsed_ms,
                    action = ?decision.action,
                    "Consensus round finished"
                );
                let decision = self.finalize(decision).await;
                let _ = reply.send(decision);
            }
            Command::Shutdown { reply } => {
                self.cancel.cancel();
                for agent in self.agents.values() {
                    agent.shutdown().await;
                }
                self.persist().await;
                let _ = reply.send(());
                return true;
            }
        }
        false
    }

    async fn handle_decide(
        &mut self,
        snapshot: MarketSnapshot,
        use_fast_path: bool,
        reply: oneshot::Sender<TradingDecision>,
    ) {
        if use_fast_path && snapshot.fast_path_eligible() {
            if self.config.coordinator.fall_through_on_fast_path_fault {
                match self
                    .fast_path
                    .try_decide(&snapshot, &self.performance, Utc::now())
                {
                    Ok(decision) => {
                        let decision = self.finalize(decision).await;
                        let _ = reply.send(decision);
                    }
                    Err(e) => {
                        warn!(error = %e, "Fast path faulted, falling through to consensus");
                        self.start_consensus(snapshot, reply);
                    }
                }
            } else {
                let decision = self
                    .fast_path
                    .decide(&snapshot, &self.performance, Utc::now());
                let decision = self.finalize(decision).await;
                let _ = reply.send(decision);
            }
        } else {
            self.start_consensus(snapshot, reply);
        }
    }

    /// Fan a market update out to the registry and collect responses in a
    /// detached task, so the mailbox keeps draining while agents think.
    /// The collected round comes back as `FinishConsensus`.
    fn start_consensus(&self, snapshot: MarketSnapshot, reply: oneshot::Sender<TradingDecision>) {
        let update = Message::new(
            MessageTarget::Coordinator,
            MessageTarget::Broadcast,
            MessageKind::MarketUpdate,
            serde_json::to_value(&snapshot).unwrap_or_default(),
        )
        .requiring_response();

        let agents: Vec<Arc<dyn Agent>> = self.agents.values().map(Arc::clone).collect();
        let timeout = Duration::from_millis(self.config.coordinator.consensus_timeout_ms);
        let tx = self.tx.clone();
        let cancel = self.cancel.child_token();

        tokio::spawn(collect_consensus_round(
            agents, update, timeout, tx, reply, cancel,
        ));
    }

    async fn handle_submit(&mut self, message: Message) -> SubmitReceipt {
        let message_id = message.id;

        if let MessageTarget::Agent(capability) = message.to {
            if !self.agents.contains_key(&capability) {
                warn!(
                    id = %message_id,
                    %capability,
                    "Dropped message for unregistered agent"
                );
                return SubmitReceipt {
                    accepted: false,
                    message_id,
                };
            }
        }

        if message.is_critical() {
            debug!(id = %message_id, "Routing critical message inline");
            self.route_message(&message).await;
        } else {
            self.queue.push_back(message);
        }
        self.persist().await;

        SubmitReceipt {
            accepted: true,
            message_id,
        }
    }

    /// Deliver one message to its target(s) and enqueue any responses.
    async fn route_message(&mut self, message: &Message) {
        match message.to {
            MessageTarget::Broadcast => {
                let mut dispatches = JoinSet::new();
                for agent in self.agents.values() {
                    let agent = Arc::clone(agent);
                    let message = message.clone();
                    dispatches
                        .spawn(
                            async move { (agent.capability(), agent.process(&message).await) },
                        );
                }
                while let Some(joined) = dispatches.join_next().await {
                    match joined {
                        Ok((_, Ok(Some(response)))) => self.queue.push_back(response),
                        Ok((_, Ok(None))) => {}
                        Ok((capability, Err(e))) => {
                            warn!(%capability, error = %e, "Agent failed during broadcast");
                        }
                        Err(e) => warn!(error = %e, "Broadcast dispatch task failed"),
                    }
                }
            }
            MessageTarget::Agent(capability) => {
                if let Some(agent) = self.agents.get(&capability) {
                    match agent.process(message).await {
                        Ok(Some(response)) => self.queue.push_back(response),
                        Ok(None) => {}
                        Err(e) => warn!(%capability, error = %e, "Agent failed to process message"),
                    }
                } else {
                    debug!(%capability, "No agent registered for target, message ignored");
                }
            }
            MessageTarget::Coordinator => self.handle_coordinator_message(message),
        }
    }

    fn handle_coordinator_message(&mut self, message: &Message) {
        match message.kind {
            MessageKind::PerformanceUpdate => {
                match serde_json::from_value::<PerformanceUpdate>(message.payload.clone()) {
                    Ok(update) => {
                        self.performance.apply_update(&update, message.timestamp);
                        debug!(
                            daily_pnl = %self.performance.daily_pnl,
                            "Applied performance update"
                        );
                    }
                    Err(e) => warn!(error = %e, "Malformed performance update payload"),
                }
            }
            MessageKind::StopTrading => {
                let reason = message.payload["reason"]
                    .as_str()
                    .unwrap_or("stop requested")
                    .to_string();
                warn!(%reason, "Stop-trading received");
                self.performance.stop(reason);
            }
            kind => debug!(?kind, "Coordinator message recorded without action"),
        }
    }

    async fn drain_one(&mut self) {
        if let Some(message) = self.queue.pop_front() {
            debug!(id = %message.id, queue_depth = self.queue.len(), "Draining queued message");
            self.route_message(&message).await;
            self.persist().await;
        }
    }

    fn gc_decisions(&mut self) {
        let cutoff = Utc::now()
            - chrono::Duration::seconds(self.config.coordinator.decision_max_age_secs as i64);
        let before = self.active_decisions.len();
        self.active_decisions.retain(|_, d| d.timestamp > cutoff);
        let removed = before - self.active_decisions.len();
        if removed > 0 {
            debug!(removed, "Garbage-collected stale decisions");
        }
    }

    async fn midnight_reset(&mut self) {
        info!("Running daily reset");
        self.performance.daily_reset();
        for agent in self.agents.values() {
            agent.daily_reset().await;
        }
        self.persist().await;
    }

    async fn handle_reset(&mut self) -> Result<(), CoordinatorError> {
        info!("Resetting coordinator");
        // Build the replacement registry before touching the current one,
        // so a failed rebuild leaves the running agents in place.
        let fresh = build_registry(&self.factory).await?;
        for agent in self.agents.values() {
            agent.shutdown().await;
        }
        self.agents = fresh;
        self.queue.clear();
        self.active_decisions.clear();
        self.persist().await;
        Ok(())
    }

    fn status(&self) -> CoordinatorStatus {
        let mut agents = Vec::with_capacity(self.agents.len());
        for capability in AgentCapability::ALL {
            if let Some(agent) = self.agents.get(&capability) {
                agents.push(agent.status());
            }
        }
        CoordinatorStatus {
            agents,
            queue_depth: self.queue.len(),
            active_decision_count: self.active_decisions.len(),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    /// Record, publish, and persist a decision. The broadcast is
    /// fire-and-forget; the store write is best-effort.
    async fn finalize(&mut self, decision: TradingDecision) -> TradingDecision {
        self.active_decisions.insert(decision.id, decision.clone());

        let sink = Arc::clone(&self.broadcast);
        let published = decision.clone();
        tokio::spawn(async move {
            sink.publish(published).await;
        });

        self.persist().await;
        decision
    }

    async fn persist(&mut self) {
        while self.queue.len() > self.config.coordinator.queue_persist_limit {
            self.queue.pop_front();
        }
        let state = PersistedState::new(
            self.queue.iter().cloned().collect(),
            self.performance.clone(),
        );
        match serde_json::to_string(&state) {
            Ok(raw) => {
                if let Err(e) = self.store.put(STATE_KEY, &raw).await {
                    warn!(error = %e, "State persistence failed, continuing in memory");
                }
            }
            Err(e) => warn!(error = %e, "State serialization failed"),
        }
    }
}

/// Wait for a round of agent responses: done as soon as two distinct
/// capabilities have answered with analysis or strategy content, at 80% of
/// the budget once anything has arrived, or at the full budget regardless.
/// Late responses still in flight afterwards are fed back into the queue.
async fn collect_consensus_round(
    agents: Vec<Arc<dyn Agent>>,
    update: Message,
    timeout: Duration,
    tx: mpsc::Sender<Command>,
    reply: oneshot::Sender<TradingDecision>,
    cancel: CancellationToken,
) {
    let start = Instant::now();
    let soft = timeout * 4 / 5;

    let (resp_tx, mut resp_rx) = mpsc::channel::<Message>(agents.len().max(1));
    for agent in agents {
        let update = update.clone();
        let resp_tx = resp_tx.clone();
        tokio::spawn(async move {
            match agent.process(&update).await {
                Ok(Some(response)) => {
                    let _ = resp_tx.send(response).await;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(capability = %agent.capability(), error = %e, "Agent failed during consensus round");
                }
            }
        });
    }
    drop(resp_tx);

    let mut responses = Vec::new();
    let mut closed = false;
    loop {
        if has_quorum(&responses) {
            break;
        }
        let elapsed = start.elapsed();
        let deadline = if responses.is_empty() { timeout } else { soft };
        if elapsed >= deadline {
            break;
        }
        match tokio::time::timeout(deadline - elapsed, resp_rx.recv()).await {
            Ok(Some(response)) => responses.push(response),
            Ok(None) => {
                closed = true;
                break;
            }
            Err(_) => break,
        }
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    let send = tx.send(Command::FinishConsensus {
        responses,
        elapsed_ms,
        reply,
    });
    if send.await.is_err() {
        debug!("Coordinator gone before consensus round finished");
        return;
    }

    // Agents still running produce late responses; forward them into the
    // queue rather than dropping them.
    if !closed {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                late = resp_rx.recv() => match late {
                    Some(response) => {
                        debug!(id = %response.id, "Forwarding late consensus response");
                        if tx.send(Command::Enqueue(response)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    }
}

fn has_quorum(responses: &[Message]) -> bool {
    let mut seen: Vec<AgentCapability> = Vec::new();
    for response in responses {
        if !matches!(
            response.kind,
            MessageKind::AnalysisResult | MessageKind::StrategyAdjustment
        ) {
            continue;
        }
        if let MessageTarget::Agent(capability) = response.from {
            if !seen.contains(&capability) {
                seen.push(capability);
            }
        }
    }
    seen.len() >= 2
}

fn time_until_local_midnight() -> Duration {
    let now = Local::now();
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| dt.and_local_timezone(Local).single());
    match next {
        Some(next) => (next - now).to_std().unwrap_or(Duration::from_secs(60)),
        None => Duration::from_secs(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(capability: AgentCapability, kind: MessageKind) -> Message {
        Message::new(
            MessageTarget::Agent(capability),
            MessageTarget::Coordinator,
            kind,
            serde_json::json!({}),
        )
    }

    #[test]
    fn quorum_needs_two_distinct_capabilities() {
        let one = vec![response(
            AgentCapability::MarketAnalysis,
            MessageKind::AnalysisResult,
        )];
        assert!(!has_quorum(&one));

        let duplicate = vec![
            response(AgentCapability::MarketAnalysis, MessageKind::AnalysisResult),
            response(AgentCapability::MarketAnalysis, MessageKind::AnalysisResult),
        ];
        assert!(!has_quorum(&duplicate));

        let two = vec![
            response(AgentCapability::MarketAnalysis, MessageKind::AnalysisResult),
            response(
                AgentCapability::StrategyOptimization,
                MessageKind::StrategyAdjustment,
            ),
        ];
        assert!(has_quorum(&two));
    }

    #[test]
    fn non_qualifying_kinds_do_not_count() {
        let responses = vec![
            response(AgentCapability::RiskManagement, MessageKind::RiskAlert),
            response(
                AgentCapability::PerformanceTracking,
                MessageKind::PerformanceUpdate,
            ),
        ];
        assert!(!has_quorum(&responses));
    }

    #[test]
    fn midnight_is_in_the_future() {
        let until = time_until_local_midnight();
        assert!(until > Duration::ZERO);
        assert!(until <= Duration::from_secs(24 * 3600));
    }
}
