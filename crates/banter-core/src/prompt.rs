//! System prompt assembly and reply post-processing.
//!
//! The effective prompt is computed fresh for every generation call from the
//! base prompt plus flags -- never cached or mutated in place, so there is
//! no ordering dependency between persona changes and prompt rebuilds.

/// Flags that alter the prompt for one specific generation call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonaFlags {
    /// Sender is in the waifu set: append the affectionate persona modifier.
    pub waifu: bool,
    /// This is the sender's last allowed reply this window: append goodbye
    /// framing.
    pub final_reply: bool,
}

/// Build the effective system prompt.
///
/// Order is fixed: base, then persona modifier, then final-reply framing.
pub fn build_prompt(base: &str, flags: PersonaFlags) -> String {
    let mut prompt = base.trim().to_string();
    if flags.waifu {
        prompt.push_str(
            "\n\nThe person you are replying to is someone you adore. \
             Address them warmly and affectionately, like a doting anime \
             love interest would, while staying family friendly.",
        );
    }
    if flags.final_reply {
        prompt.push_str(
            "\n\nThis is your last reply to this person for a while. Work a \
             natural, friendly goodbye into your answer.",
        );
    }
    prompt
}

/// Remove the bot mention from a message, case-insensitively.
///
/// Both the `@name` form and the bare name are stripped, then whitespace is
/// collapsed.
pub fn strip_mention(text: &str, bot_name: &str) -> String {
    let name = bot_name.to_lowercase();
    let at_name = format!("@{name}");

    text.split_whitespace()
        .filter(|word| {
            let bare = word
                .trim_matches(|c: char| matches!(c, ',' | '.' | '!' | '?' | ':' | ';'))
                .to_lowercase();
            bare != name && bare != at_name
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip `<think>...</think>` blocks emitted by reasoning-style backends,
/// then trim. An unterminated block is dropped to the end of the reply.
pub fn scrub_reply(raw: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        match rest.find(OPEN) {
            None => {
                out.push_str(rest);
                break;
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                match rest[start..].find(CLOSE) {
                    Some(close) => rest = &rest[start + close + CLOSE.len()..],
                    None => break,
                }
            }
        }
    }
    out.trim().to_string()
}
