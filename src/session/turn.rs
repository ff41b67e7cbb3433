//! Pure state transition: one AI directive in, the next session state plus a
//! set of UI effects out. No I/O happens here; the controller owns timing,
//! cancellation, and the network.

use super::state::SessionState;
use crate::api::{Directive, DirectiveAction};

/// Side effects the caller must run after a directive is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start revealing this text appended to the canonical story. The
    /// reveal scheduler is the sole writer of `story_text` until it
    /// finishes or is cancelled.
    BeginReveal(String),
    /// The AI emitted an action outside the contract; the turn was degraded
    /// to plain chat. Non-fatal data-integrity warning.
    MalformedAction(String),
}

/// Applies a directive to the session state.
///
/// Rule order is load-bearing: chapter registration happens before the
/// action so the marker precedes the AI chat entry, and the pending flag is
/// cleared last, unconditionally.
pub fn apply_directive(state: &mut SessionState, directive: Directive) -> Vec<Effect> {
    let mut effects = Vec::new();

    if let Some(title) = directive
        .new_chapter_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        state.push_chapter_marker(title);
        state.register_chapter(title);
    }

    match directive.action {
        DirectiveAction::Append => {
            if !directive.story_text.is_empty() {
                effects.push(Effect::BeginReveal(directive.story_text));
            }
        }
        DirectiveAction::Replace => {
            state.replace_story(directive.story_text);
        }
        DirectiveAction::Refuse | DirectiveAction::Chat => {}
        DirectiveAction::Unknown => {
            tracing::warn!("unrecognized directive action, degrading to chat");
            effects.push(Effect::MalformedAction(directive.chat_response.clone()));
        }
    }

    state.push_ai(directive.chat_response);
    state.set_pending(false);

    effects
}
