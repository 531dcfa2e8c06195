//! Terminal setup wizard driving the shared state machine.

use std::io::{BufRead, Write};

use tracing::info;

use crate::{
    avatar::{AVATAR_PALETTE, palette_entry},
    context::{SiteFacts, Vibe},
    error::Context,
    service::{AssistantCreator, CreateAssistantError, NewAssistant, chat_url},
    state::{ContextAnswers, Created, WizardEvent, WizardState},
};

/// Run the wizard against `input`/`out`, creating the assistant through
/// `creator`. Returns `None` when input ends before the wizard finishes.
pub async fn run_wizard<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    creator: &dyn AssistantCreator,
    site: &SiteFacts,
    base_url: &str,
) -> crate::Result<Option<Created>> {
    let mut state = WizardState::new();

    // Step 1: name
    loop {
        writeln!(out, "{}", state.prompt())?;
        let Some(line) = ask(input, out)? else {
            return Ok(None);
        };
        match state.apply(WizardEvent::SubmitName(line)) {
            Ok(_) => break,
            Err(e) => writeln!(out, "{e}")?,
        }
    }

    // Step 2: avatar
    writeln!(out, "{}", state.prompt())?;
    for (i, glyph) in AVATAR_PALETTE.iter().enumerate() {
        write!(out, "{:>2}) {glyph}  ", i + 1)?;
        if (i + 1) % 8 == 0 {
            writeln!(out)?;
        }
    }
    loop {
        writeln!(out, "Pick a number (Enter keeps {}):", state.avatar)?;
        let Some(line) = ask(input, out)? else {
            return Ok(None);
        };
        if line.is_empty() {
            break;
        }
        let glyph = line
            .parse::<usize>()
            .ok()
            .and_then(palette_entry)
            .map_or(line, str::to_owned);
        match state.apply(WizardEvent::SelectAvatar(glyph)) {
            Ok(_) => break,
            Err(e) => writeln!(out, "{e}")?,
        }
    }
    state.apply(WizardEvent::ConfirmAvatar)?;

    // Step 3: context
    writeln!(out, "{}", state.prompt())?;
    if site.has_preview() {
        writeln!(out, "From your site:")?;
        if !site.title.is_empty() {
            writeln!(out, "  \u{1f4cc} {}", site.title)?;
        }
        if !site.tagline.is_empty() {
            writeln!(out, "  \u{1f4dd} {}", site.tagline)?;
        }
        if !site.about.is_empty() {
            writeln!(out, "  \u{1f4c4} {}\u{2026}", site.about_preview())?;
        }
    }
    let vibe = loop {
        writeln!(out, "What's the vibe?")?;
        for (i, v) in Vibe::ALL.iter().enumerate() {
            writeln!(out, "  {}) {}", i + 1, v.choice_text())?;
        }
        let Some(line) = ask(input, out)? else {
            return Ok(None);
        };
        if line.is_empty() {
            break Vibe::Casual;
        }
        let picked = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| Vibe::ALL.get(idx).copied())
            .or_else(|| line.parse::<Vibe>().ok());
        match picked {
            Some(v) => break v,
            None => writeln!(out, "Pick one of the four options.")?,
        }
    };
    writeln!(out, "What do you want help with?")?;
    let Some(goals) = ask(input, out)? else {
        return Ok(None);
    };
    writeln!(out, "Anything else?")?;
    let Some(extra) = ask(input, out)? else {
        return Ok(None);
    };
    let answers = ContextAnswers {
        vibe: Some(vibe),
        goals,
        extra,
    };

    loop {
        state.apply(WizardEvent::SubmitContext(answers.clone()))?;
        let outcome = match NewAssistant::from_request(&state.request(site)) {
            Ok(assistant) => creator
                .create_assistant(&assistant)
                .await
                .map_err(|e| match e {
                    CreateAssistantError::Rejected(message) => message,
                    CreateAssistantError::Internal(e) => format!("Something went wrong: {e}"),
                }),
            Err(e) => Err(e.to_string()),
        };
        match outcome {
            Ok(user_id) => {
                state.apply(WizardEvent::CreationSucceeded {
                    user_id,
                    chat_url: chat_url(base_url),
                })?;
                break;
            },
            Err(message) => {
                state.apply(WizardEvent::CreationFailed(message.clone()))?;
                writeln!(out, "{message}")?;
                writeln!(out, "Press Enter to try again.")?;
                if ask(input, out)?.is_none() {
                    return Ok(None);
                }
            },
        }
    }

    // Step 4: done
    writeln!(out, "{} {}", state.avatar, state.prompt())?;
    if let Some(created) = state.created.as_ref() {
        info!(user_id = created.user_id, name = %state.name, "assistant created from terminal");
        writeln!(out, "Chat: {}", created.chat_url)?;
    }
    if let Some(cfg) = state.connection_config(base_url) {
        writeln!(
            out,
            "To connect your own agent, add this to its configuration:"
        )?;
        let snippet = cfg
            .to_pretty_json()
            .context("failed to render the connection config")?;
        writeln!(out, "{snippet}")?;
    }
    Ok(state.created)
}

/// Prompt marker plus one trimmed line. `None` at end of input.
fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> std::io::Result<Option<String>> {
    write!(out, "> ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}
