//! Content filters: muted members, banned words, NSFW domains, media locks
//! and quiz answers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, info};

use crate::bot::dispatcher::{AppState, CommandCtx, IncomingMessage, MediaKind};
use crate::transport::MessageRef;
use crate::utils::mention;

static NSFW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:pornhub|xvideos|xnxx|onlyfans)\.[a-z]{2,3}\b")
        .expect("nsfw regex must compile")
});

fn msg_ref(ctx: &CommandCtx, msg: &IncomingMessage) -> MessageRef {
    MessageRef {
        group_id: ctx.chat.clone(),
        id: msg.id.clone(),
        sender: ctx.sender.clone(),
    }
}

/// Delete messages from muted members.
pub async fn check_muted(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    if ctx.is_sender_admin {
        return Ok(false);
    }
    let record = state.store.group(&ctx.chat);
    if !record.mutedusers.contains(&ctx.sender) {
        return Ok(false);
    }
    debug!("Dropping message from muted member {} in {}", ctx.sender, ctx.chat);
    let _ = state.transport.delete_message(&msg_ref(ctx, msg)).await;
    Ok(true)
}

/// Word filter: deletes messages containing a banned word when `antiword` is
/// set. Also covers NSFW domains when `antinsfw` is set.
pub async fn check_banned_words(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    if msg.text.is_empty() || ctx.is_sender_admin {
        return Ok(false);
    }
    let record = state.store.group(&ctx.chat);
    let lower = msg.text.to_lowercase();

    let word_hit = record.antiword
        && record
            .bannedwords
            .iter()
            .any(|w| lower.contains(w.as_str()));
    let nsfw_hit = record.antinsfw && NSFW_RE.is_match(&msg.text);

    if !word_hit && !nsfw_hit {
        return Ok(false);
    }

    let _ = state.transport.delete_message(&msg_ref(ctx, msg)).await;
    ctx.reply_mentions(
        state,
        &format!("🤐 {} that kind of content is not allowed here.", mention(&ctx.sender)),
        &[ctx.sender.clone()],
    )
    .await?;
    Ok(true)
}

/// Media locks: delete locked media kinds sent by non-admins.
pub async fn check_media_locks(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    let Some(kind) = msg.media else {
        return Ok(false);
    };
    if ctx.is_sender_admin || !ctx.is_bot_admin {
        return Ok(false);
    }

    let record = state.store.group(&ctx.chat);
    let locked = match kind {
        MediaKind::Image => record.lockimg,
        MediaKind::Video => record.lockvid,
        MediaKind::Audio => record.lockaudio,
        MediaKind::Document => record.lockdoc,
        MediaKind::Sticker => record.locksticker,
    };
    if !locked {
        return Ok(false);
    }

    info!("Deleting locked {:?} from {} in {}", kind, ctx.sender, ctx.chat);
    let _ = state.transport.delete_message(&msg_ref(ctx, msg)).await;
    ctx.reply_mentions(
        state,
        &format!("🔒 {} that media type is locked in this group.", mention(&ctx.sender)),
        &[ctx.sender.clone()],
    )
    .await?;
    Ok(true)
}

/// Match plain messages against the running quiz answer.
pub async fn check_quiz_answer(
    state: &AppState,
    msg: &IncomingMessage,
    ctx: &CommandCtx,
) -> anyhow::Result<bool> {
    let record = state.store.group(&ctx.chat);
    let Some(quiz) = &record.activequiz else {
        return Ok(false);
    };
    if !msg.text.trim().eq_ignore_ascii_case(quiz.answer.trim()) {
        return Ok(false);
    }

    // Full sub-object read-modify-write: the shallow merge replaces
    // `quizscores` wholesale.
    let mut scores = record.quizscores.clone();
    *scores.entry(ctx.sender.clone()).or_insert(0) += 1;
    let total = scores[&ctx.sender];
    state.store.patch(
        &ctx.chat,
        json!({ "quizscores": scores, "activequiz": null }),
    );

    ctx.reply_mentions(
        state,
        &format!(
            "🎉 {} got it! The answer was *{}*. Score: {}",
            mention(&ctx.sender),
            quiz.answer,
            total
        ),
        &[ctx.sender.clone()],
    )
    .await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, message, test_state};

    #[tokio::test]
    async fn banned_word_message_is_deleted() {
        let (state, mock) = test_state();
        state.store.patch(
            "g1",
            json!({"antiword": true, "bannedwords": ["crypto"]}),
        );

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = message("g1", "u1@s.whatsapp.net", "free CRYPTO giveaway");

        assert!(check_banned_words(&state, &msg, &ctx).await.unwrap());
        assert_eq!(mock.deleted.lock().len(), 1);
    }

    #[tokio::test]
    async fn word_filter_requires_antiword_flag() {
        let (state, mock) = test_state();
        state.store.patch("g1", json!({"bannedwords": ["crypto"]}));

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = message("g1", "u1@s.whatsapp.net", "crypto talk");

        assert!(!check_banned_words(&state, &msg, &ctx).await.unwrap());
        assert!(mock.deleted.lock().is_empty());
    }

    #[tokio::test]
    async fn locked_media_from_member_is_deleted() {
        let (state, mock) = test_state();
        state.store.patch("g1", json!({"lockimg": true}));

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let mut msg = message("g1", "u1@s.whatsapp.net", "");
        msg.media = Some(MediaKind::Image);

        assert!(check_media_locks(&state, &msg, &ctx).await.unwrap());
        assert_eq!(mock.deleted.lock().len(), 1);

        // Unlocked kinds pass through.
        msg.media = Some(MediaKind::Sticker);
        assert!(!check_media_locks(&state, &msg, &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn quiz_answer_awards_point_and_clears_quiz() {
        let (state, mock) = test_state();
        state.store.patch(
            "g1",
            json!({
                "activequiz": {"answer": "Paris", "asked": 0},
                "quizscores": {"u2@s.whatsapp.net": 4},
            }),
        );

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = message("g1", "u1@s.whatsapp.net", "  paris ");

        assert!(check_quiz_answer(&state, &msg, &ctx).await.unwrap());
        let record = state.store.group("g1");
        assert!(record.activequiz.is_none());
        assert_eq!(record.quizscores.get("u1@s.whatsapp.net"), Some(&1));
        // The prior scorer survives because the full map was written back.
        assert_eq!(record.quizscores.get("u2@s.whatsapp.net"), Some(&4));
        assert!(mock.last_message().unwrap().text.contains("Paris"));
    }

    #[tokio::test]
    async fn muted_member_messages_are_dropped() {
        let (state, mock) = test_state();
        state
            .store
            .patch("g1", json!({"mutedusers": ["u1@s.whatsapp.net"]}));

        let ctx = group_ctx("g1", "u1@s.whatsapp.net");
        let msg = message("g1", "u1@s.whatsapp.net", "hello");

        assert!(check_muted(&state, &msg, &ctx).await.unwrap());
        assert_eq!(mock.deleted.lock().len(), 1);
    }
}
