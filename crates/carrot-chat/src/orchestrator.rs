use std::sync::Arc;
use std::time::Duration;

use carrot_config::{ChatConfig, ModelConfig, ToolServerConfig};
use carrot_core::RequestContext;
use carrot_ledger::{TokenLedger, UsageDelta};
use carrot_llm::{
    ChatModel, ChunkEvent, CompletionRequest, FinishReason, LlmError, Message, ToolCall, ToolDefinition, Usage,
};
use carrot_mcp::{RmcpConnector, SessionConnector, ToolServerManager, WorkerTimeouts};
use futures_util::{Stream, StreamExt as _};
use indexmap::IndexMap;
use tokio::sync::mpsc;

use crate::accumulator::{self, ToolCallAccumulator};
use crate::error::ChatError;
use crate::event::ChatEvent;
use crate::request::ChatTurnRequest;
use crate::sequence::prepare_messages;

/// Model name that stands for the configured chat model
const GENERIC_MODEL_ALIAS: &str = "deepseek";

const EVENT_BUFFER: usize = 64;

/// Per-turn defaults taken from configuration
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub chat_model: String,
    pub reasoning_model: String,
    pub default_temperature: f32,
    pub default_context_length: usize,
    /// Tokens a user must have left before a turn starts
    pub token_estimate: u64,
    /// Longest wait for the model to answer or send the next chunk
    pub stream_idle_timeout: Duration,
}

impl ChatSettings {
    pub fn from_config(model: &ModelConfig, chat: &ChatConfig) -> anyhow::Result<Self> {
        Ok(Self {
            system_prompt: chat.system_prompt.clone(),
            chat_model: model.chat_model.clone(),
            reasoning_model: model.reasoning_model.clone(),
            default_temperature: model.default_temperature,
            default_context_length: chat.default_context_length,
            token_estimate: chat.token_estimate,
            stream_idle_timeout: chat.stream_idle_timeout()?,
        })
    }
}

/// Runs chat turns
///
/// Cheap to clone; every turn runs on its own task with its own set of tool
/// workers.
#[derive(Clone)]
pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    ledger: TokenLedger,
    settings: Arc<ChatSettings>,
    tool_servers: Arc<IndexMap<String, ToolServerConfig>>,
    connector: Arc<dyn SessionConnector>,
    timeouts: WorkerTimeouts,
}

impl ChatOrchestrator {
    pub fn new(model: Arc<dyn ChatModel>, ledger: TokenLedger, settings: ChatSettings) -> Self {
        Self {
            model,
            ledger,
            settings: Arc::new(settings),
            tool_servers: Arc::new(IndexMap::new()),
            connector: Arc::new(RmcpConnector),
            timeouts: WorkerTimeouts::default(),
        }
    }

    /// Statically configured tool servers
    #[must_use]
    pub fn with_tool_servers(mut self, servers: IndexMap<String, ToolServerConfig>) -> Self {
        self.tool_servers = Arc::new(servers);
        self
    }

    #[must_use]
    pub fn with_connector(mut self, connector: Arc<dyn SessionConnector>) -> Self {
        self.connector = connector;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: WorkerTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Model a request runs against
    ///
    /// Deep thinking selects the reasoning model; an empty or generic name
    /// selects the chat model; anything else is used as given.
    pub fn resolve_model(&self, request: &ChatTurnRequest) -> String {
        if request.use_deep_thinking {
            return self.settings.reasoning_model.clone();
        }

        match request.model.trim() {
            "" | GENERIC_MODEL_ALIAS => self.settings.chat_model.clone(),
            other => other.to_string(),
        }
    }

    /// Run one turn in the background and return its events
    ///
    /// The stream always ends with [`ChatEvent::Done`].
    pub fn stream_turn(
        &self,
        ctx: RequestContext,
        request: ChatTurnRequest,
    ) -> impl Stream<Item = ChatEvent> + Send + 'static {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let orchestrator = self.clone();

        tokio::spawn(async move {
            orchestrator.run_turn(ctx, request, EventSink(tx)).await;
        });

        futures_util::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|event| (event, rx)) })
    }

    async fn run_turn(&self, ctx: RequestContext, request: ChatTurnRequest, events: EventSink) {
        let mut turn = Turn {
            tools: ToolServerManager::new(
                (*self.tool_servers).clone(),
                Arc::clone(&self.connector),
                self.timeouts,
            ),
            usage: None,
        };

        if let Err(e) = self.drive(&ctx, &request, &events, &mut turn).await {
            tracing::warn!(user_id = %ctx.user_id, error = %e, "chat turn failed");
            events.emit(ChatEvent::Error(e.to_string())).await;
        }

        self.finalize(&ctx, &events, turn).await;
    }

    async fn drive(
        &self,
        ctx: &RequestContext,
        request: &ChatTurnRequest,
        events: &EventSink,
        turn: &mut Turn,
    ) -> Result<(), ChatError> {
        let model = self.resolve_model(request);
        let reasoning = model == self.settings.reasoning_model;

        let context = request.truncated_context(self.settings.default_context_length);
        let mut messages = prepare_messages(&self.settings.system_prompt, context, &request.current_message, reasoning)?;

        let has_budget = self
            .ledger
            .check_budget(&ctx.user_id, self.settings.token_estimate)
            .await
            .map_err(ChatError::Store)?;
        if !has_budget {
            return Err(ChatError::BudgetExceeded);
        }

        let mut tools = if request.wants_tools() {
            if reasoning {
                return Err(ChatError::ToolsUnsupported);
            }
            self.setup_tools(request, &mut turn.tools).await?
        } else {
            None
        };

        tracing::debug!(
            user_id = %ctx.user_id,
            model = %model,
            messages = messages.len(),
            tools = tools.as_ref().map_or(0, Vec::len),
            "starting chat turn"
        );

        let temperature = request.temperature.unwrap_or(self.settings.default_temperature);
        let mut accumulator = ToolCallAccumulator::new();

        // The round after tool execution runs without tools, so at most two rounds
        loop {
            let tools_enabled = tools.is_some();
            let completion = CompletionRequest {
                model: model.clone(),
                messages: messages.clone(),
                temperature: Some(temperature),
                tools: tools.take(),
            };

            let round = self
                .stream_round(&completion, reasoning, &mut accumulator, events, &mut turn.usage)
                .await?;

            if !tools_enabled || round.tool_calls.is_empty() {
                return Ok(());
            }

            let mut results = Vec::with_capacity(round.tool_calls.len());
            for call in &round.tool_calls {
                let result = accumulator::execute(call, &mut turn.tools).await;
                events
                    .emit(ChatEvent::ToolCallResult {
                        call: call.clone(),
                        result: result.clone(),
                    })
                    .await;
                results.push(result);
            }

            messages.push(Message::assistant_tool_calls(round.content, round.tool_calls.clone()));
            messages.extend(
                round
                    .tool_calls
                    .into_iter()
                    .zip(results)
                    .map(|(call, result)| Message::tool(call.id, result)),
            );
        }
    }

    async fn setup_tools(
        &self,
        request: &ChatTurnRequest,
        manager: &mut ToolServerManager,
    ) -> Result<Option<Vec<ToolDefinition>>, ChatError> {
        let resolved = manager
            .resolve_active_worker(request.tool_server_name.as_deref(), request.user_tool_servers.as_ref())
            .await
            .map(|worker| worker.server().to_string());

        match resolved {
            Ok(server) => tracing::debug!(server = %server, "tool server ready"),
            // Per-request servers were the only source of tools
            Err(e) if request.has_user_tool_servers() && self.tool_servers.is_empty() => {
                return Err(ChatError::ToolConnection(e));
            }
            Err(e) => {
                tracing::warn!(error = %e, "no tool server available, continuing without tools");
                return Ok(None);
            }
        }

        let definitions = manager.all_tools().await;
        tracing::info!(
            tools = definitions.len(),
            servers = manager.server_count(),
            "tools offered to the model"
        );

        Ok((!definitions.is_empty()).then_some(definitions))
    }

    async fn stream_round(
        &self,
        request: &CompletionRequest,
        reasoning: bool,
        accumulator: &mut ToolCallAccumulator,
        events: &EventSink,
        usage: &mut Option<Usage>,
    ) -> Result<Round, ChatError> {
        accumulator.start_round();
        let idle = self.settings.stream_idle_timeout;
        let stalled = || LlmError::Streaming(format!("model sent nothing for {}s", idle.as_secs_f32()));

        let mut stream = tokio::time::timeout(idle, self.model.stream_chat(request))
            .await
            .map_err(|_| stalled())??;
        let mut round = Round::default();

        loop {
            let Some(event) = tokio::time::timeout(idle, stream.next()).await.map_err(|_| {
                tracing::warn!(model = %request.model, "model stream stalled");
                stalled()
            })?
            else {
                break;
            };

            match event? {
                ChunkEvent::Content(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    round.content.push_str(&text);
                    events.emit(ChatEvent::content(text)).await;
                }
                ChunkEvent::Reasoning(text) => {
                    if reasoning && !text.is_empty() {
                        events.emit(ChatEvent::reasoning(text)).await;
                    }
                }
                ChunkEvent::ToolCall(delta) => accumulator.update(&delta),
                ChunkEvent::Finish(FinishReason::ToolCalls) => {
                    for call in accumulator.announce() {
                        tracing::info!(tool = %call.function.name, id = %call.id, "model requested tool call");
                        events.emit(ChatEvent::ToolCallStarted(call)).await;
                    }
                    round.tool_calls = accumulator.completed();
                }
                ChunkEvent::Finish(reason) => tracing::debug!(?reason, "model round finished"),
                ChunkEvent::Usage(reported) => usage.get_or_insert_with(Usage::default).accumulate(&reported),
                ChunkEvent::Done => break,
            }
        }

        Ok(round)
    }

    async fn finalize(&self, ctx: &RequestContext, events: &EventSink, mut turn: Turn) {
        match turn.usage {
            Some(usage) => {
                if let Err(e) = self.ledger.apply_usage(&ctx.user_id, usage_delta(usage)).await {
                    events.emit(ChatEvent::Error(ChatError::UsageRecording(e).to_string())).await;
                }
            }
            None => tracing::info!(user_id = %ctx.user_id, "model reported no usage, skipping accounting"),
        }

        turn.tools.cleanup().await;
        events.emit(ChatEvent::Done).await;
    }
}

impl std::fmt::Debug for ChatOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatOrchestrator")
            .field("model", &self.model.name())
            .field("settings", &self.settings)
            .field("tool_servers", &self.tool_servers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Resources and usage of one turn, settled when the turn ends
struct Turn {
    tools: ToolServerManager,
    usage: Option<Usage>,
}

/// Output of one model round
#[derive(Debug, Default)]
struct Round {
    content: String,
    tool_calls: Vec<ToolCall>,
}

struct EventSink(mpsc::Sender<ChatEvent>);

impl EventSink {
    async fn emit(&self, event: ChatEvent) {
        if self.0.send(event).await.is_err() {
            tracing::debug!("client disconnected, dropping chat event");
        }
    }
}

const fn usage_delta(usage: Usage) -> UsageDelta {
    UsageDelta {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
        prompt_cache_hit_tokens: usage.prompt_cache_hit_tokens,
        prompt_cache_miss_tokens: usage.prompt_cache_miss_tokens,
    }
}
