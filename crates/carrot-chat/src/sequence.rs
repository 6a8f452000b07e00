//! Message list preparation
//!
//! The reasoning model only accepts a system message followed by strictly
//! alternating user and assistant messages, starting with a user message.
//! Other models get the context as sent.

use carrot_llm::{Message, Role};

use crate::request::ChatMessage;

/// No valid alternating sequence could be built
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequencingError {
    #[error("no user message to start the conversation with")]
    NoUserMessage,

    #[error("first message after the system prompt is {role}, expected user")]
    FirstNotUser { role: Role },

    #[error("message {position} is {found}, expected {expected}")]
    OutOfOrder {
        position: usize,
        found: Role,
        expected: Role,
    },
}

/// Build the message list sent to the model
///
/// The list starts with exactly one system message. In reasoning mode the
/// context is reduced to an alternating run starting at its first user
/// message, and the current message is dropped if it would repeat the
/// previous role.
pub fn prepare_messages(
    system_prompt: &str,
    context: &[ChatMessage],
    current: &ChatMessage,
    reasoning: bool,
) -> Result<Vec<Message>, SequencingError> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(Message::system(system_prompt));

    if !reasoning {
        messages.extend(context.iter().map(Message::from));
        messages.push(Message::from(current));
        return Ok(messages);
    }

    match context.iter().position(|m| m.role == Role::User) {
        Some(first_user) => {
            let mut expected = Role::User;
            for message in &context[first_user..] {
                if message.role == expected {
                    messages.push(Message::from(message));
                    expected = next_role(expected);
                }
            }
        }
        None if current.role == Role::User => {
            if !context.is_empty() {
                tracing::warn!(skipped = context.len(), "context has no user message, sending current message only");
            }
        }
        None => return Err(SequencingError::NoUserMessage),
    }

    if messages.len() > 1 && messages.last().is_some_and(|last| last.role == current.role) {
        tracing::warn!(role = %current.role, "current message repeats the previous role, dropping it");
    } else {
        messages.push(Message::from(current));
    }

    enforce_alternation(messages)
}

/// Validate the alternation, repairing it once if needed
pub fn enforce_alternation(messages: Vec<Message>) -> Result<Vec<Message>, SequencingError> {
    let Err(error) = validate_alternation(&messages) else {
        return Ok(messages);
    };

    tracing::warn!(%error, roles = ?roles(&messages), "repairing message sequence");
    let repaired = repair(messages);

    validate_alternation(&repaired).inspect_err(|error| {
        tracing::error!(%error, roles = ?roles(&repaired), "message sequence is still invalid after repair");
    })?;

    Ok(repaired)
}

/// Check that the non-system messages alternate user, assistant, user...
pub fn validate_alternation(messages: &[Message]) -> Result<(), SequencingError> {
    let mut expected = Role::User;

    for (position, message) in conversation(messages) {
        if message.role != expected {
            if position == 0 {
                return Err(SequencingError::FirstNotUser { role: message.role });
            }
            return Err(SequencingError::OutOfOrder {
                position,
                found: message.role,
                expected,
            });
        }
        expected = next_role(expected);
    }

    Ok(())
}

/// Drop messages that repeat the previous role or are neither user nor assistant
///
/// Order is preserved and leading system messages are kept.
pub fn repair(messages: Vec<Message>) -> Vec<Message> {
    let mut repaired: Vec<Message> = Vec::with_capacity(messages.len());
    let mut last_role = None;
    let mut in_prefix = true;

    for message in messages {
        if in_prefix && message.role == Role::System {
            repaired.push(message);
            continue;
        }
        in_prefix = false;

        if !matches!(message.role, Role::User | Role::Assistant) || last_role == Some(message.role) {
            continue;
        }

        last_role = Some(message.role);
        repaired.push(message);
    }

    repaired
}

fn conversation(messages: &[Message]) -> impl Iterator<Item = (usize, &Message)> {
    messages
        .iter()
        .skip_while(|m| m.role == Role::System)
        .enumerate()
}

const fn next_role(role: Role) -> Role {
    match role {
        Role::User => Role::Assistant,
        _ => Role::User,
    }
}

fn roles(messages: &[Message]) -> Vec<Role> {
    messages.iter().map(|m| m.role).collect()
}
