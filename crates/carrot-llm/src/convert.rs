use crate::protocol::WireChunk;
use crate::types::{ChunkEvent, FinishReason, ToolCallDelta};

/// Decode one wire chunk into the events it carries
///
/// Per choice the order is reasoning, content, tool call fragments, finish.
/// Usage always comes last.
pub(crate) fn chunk_to_events(chunk: WireChunk) -> Vec<ChunkEvent> {
    let mut events = Vec::new();

    for choice in chunk.choices {
        let delta = choice.delta;

        if let Some(reasoning) = delta.reasoning_content.filter(|text| !text.is_empty()) {
            events.push(ChunkEvent::Reasoning(reasoning));
        }

        if let Some(content) = delta.content.filter(|text| !text.is_empty()) {
            events.push(ChunkEvent::Content(content));
        }

        for call in delta.tool_calls.into_iter().flatten() {
            let (name, arguments) = call.function.map_or((None, None), |f| (f.name, f.arguments));
            events.push(ChunkEvent::ToolCall(ToolCallDelta {
                index: call.index,
                id: call.id.filter(|id| !id.is_empty()),
                name: name.filter(|name| !name.is_empty()),
                arguments,
            }));
        }

        if let Some(reason) = choice.finish_reason {
            events.push(ChunkEvent::Finish(FinishReason::parse(&reason)));
        }
    }

    if let Some(usage) = chunk.usage {
        events.push(ChunkEvent::Usage(usage));
    }

    events
}
