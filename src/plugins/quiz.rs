//! Quiz rounds and polls.
//!
//! A quiz stores its expected answer in the record; plain messages are
//! matched against it in `events::filters`. Polls collect one vote per
//! member, keyed by option index.

use serde_json::json;

use crate::bot::dispatcher::{AppState, CommandCtx, CommandRegistry, CommandSpec, wrap};
use crate::utils::{mention, now_ms};

async fn quiz_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let raw = ctx.args_joined(0);
    let Some((answer, question)) = raw.split_once('|').map(|(a, q)| (a.trim(), q.trim())) else {
        ctx.reply(&state, "❌ Usage: quiz <answer> | <question>").await?;
        return Ok(());
    };
    if answer.is_empty() || question.is_empty() {
        ctx.reply(&state, "❌ Usage: quiz <answer> | <question>").await?;
        return Ok(());
    }

    if state.store.group(&ctx.chat).activequiz.is_some() {
        ctx.reply(&state, "ℹ️ A quiz is already running; end it first.")
            .await?;
        return Ok(());
    }

    state.store.patch(
        &ctx.chat,
        json!({ "activequiz": { "answer": answer, "asked": now_ms() } }),
    );
    ctx.reply(&state, &format!("❓ *Quiz time!*\n{question}")).await
}

async fn endquiz_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    match state.store.group(&ctx.chat).activequiz {
        Some(quiz) => {
            state.store.patch(&ctx.chat, json!({ "activequiz": null }));
            ctx.reply(
                &state,
                &format!("🏁 Quiz over, nobody got it. The answer was *{}*.", quiz.answer),
            )
            .await
        }
        None => ctx.reply(&state, "ℹ️ No quiz is running.").await,
    }
}

async fn quizscores_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let scores = state.store.group(&ctx.chat).quizscores;
    if scores.is_empty() {
        ctx.reply(&state, "ℹ️ No quiz scores yet.").await?;
        return Ok(());
    }
    let mut ranked: Vec<(&String, &i64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1));

    let mentions: Vec<String> = ranked.iter().map(|(jid, _)| (*jid).clone()).collect();
    let body: Vec<String> = ranked
        .iter()
        .enumerate()
        .map(|(i, (jid, score))| format!("{}. {} — {}", i + 1, mention(jid), score))
        .collect();
    ctx.reply_mentions(&state, &format!("🧠 *Quiz scores*\n{}", body.join("\n")), &mentions)
        .await
}

async fn poll_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let raw = ctx.args_joined(0);
    let parts: Vec<String> = raw.split('|').map(|p| p.trim().to_string()).collect();
    if parts.len() < 3 || parts.iter().any(String::is_empty) {
        ctx.reply(&state, "❌ Usage: poll <question> | <option> | <option> [| ...]")
            .await?;
        return Ok(());
    }

    if state.store.group(&ctx.chat).activepoll.is_some() {
        ctx.reply(&state, "ℹ️ A poll is already running; end it first.")
            .await?;
        return Ok(());
    }

    let question = parts[0].clone();
    let options = parts[1..].to_vec();
    let listing: Vec<String> = options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}. {}", i + 1, o))
        .collect();

    state.store.patch(
        &ctx.chat,
        json!({ "activepoll": { "question": question, "options": options, "votes": {} } }),
    );
    ctx.reply(
        &state,
        &format!("📊 *{}*\n{}\n\nVote with: vote <number>", parts[0], listing.join("\n")),
    )
    .await
}

async fn vote_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(mut poll) = state.store.group(&ctx.chat).activepoll else {
        ctx.reply(&state, "ℹ️ No poll is running.").await?;
        return Ok(());
    };

    let parsed = ctx.arg(0).and_then(|a| a.parse::<usize>().ok());
    let Some(n) = parsed.filter(|n| (1..=poll.options.len()).contains(n)) else {
        ctx.reply(
            &state,
            &format!("❌ Pick an option between 1 and {}.", poll.options.len()),
        )
        .await?;
        return Ok(());
    };

    // Re-voting moves the vote; the whole poll object is written back.
    poll.votes.insert(ctx.sender.clone(), n - 1);
    let option = poll.options[n - 1].clone();
    state.store.patch(&ctx.chat, json!({ "activepoll": poll }));

    ctx.reply_mentions(
        &state,
        &format!("🗳 {} voted for *{}*.", mention(&ctx.sender), option),
        &[ctx.sender.clone()],
    )
    .await
}

async fn pollresults_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(poll) = state.store.group(&ctx.chat).activepoll else {
        ctx.reply(&state, "ℹ️ No poll is running.").await?;
        return Ok(());
    };
    ctx.reply(&state, &render_results(&poll.question, &poll.options, poll.votes.values()))
        .await
}

async fn endpoll_command(ctx: CommandCtx, state: AppState) -> anyhow::Result<()> {
    let Some(poll) = state.store.group(&ctx.chat).activepoll else {
        ctx.reply(&state, "ℹ️ No poll is running.").await?;
        return Ok(());
    };
    state.store.patch(&ctx.chat, json!({ "activepoll": null }));
    ctx.reply(
        &state,
        &format!(
            "🏁 Poll closed.\n{}",
            render_results(&poll.question, &poll.options, poll.votes.values())
        ),
    )
    .await
}

fn render_results<'a>(
    question: &str,
    options: &[String],
    votes: impl Iterator<Item = &'a usize>,
) -> String {
    let mut counts = vec![0usize; options.len()];
    for &v in votes {
        if let Some(slot) = counts.get_mut(v) {
            *slot += 1;
        }
    }
    let body: Vec<String> = options
        .iter()
        .zip(&counts)
        .map(|(o, c)| format!("• {o}: {c}"))
        .collect();
    format!("📊 *{}*\n{}", question, body.join("\n"))
}

pub fn register(reg: &mut CommandRegistry) {
    reg.register(CommandSpec::admin(
        "quiz",
        &[],
        "fun",
        "Start a quiz round (answer | question)",
        wrap(quiz_command),
    ));
    reg.register(CommandSpec::admin(
        "endquiz",
        &[],
        "fun",
        "End the running quiz",
        wrap(endquiz_command),
    ));
    reg.register(CommandSpec::group(
        "quizscores",
        &[],
        "fun",
        "Show quiz scores",
        wrap(quizscores_command),
    ));
    reg.register(CommandSpec::admin(
        "poll",
        &[],
        "fun",
        "Start a poll (question | options...)",
        wrap(poll_command),
    ));
    reg.register(CommandSpec::group(
        "vote",
        &[],
        "fun",
        "Vote in the running poll",
        wrap(vote_command),
    ));
    reg.register(CommandSpec::group(
        "pollresults",
        &[],
        "fun",
        "Show the running poll's tally",
        wrap(pollresults_command),
    ));
    reg.register(CommandSpec::admin(
        "endpoll",
        &[],
        "fun",
        "Close the poll and show results",
        wrap(endpoll_command),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{group_ctx, test_state};

    fn args_of(text: &str) -> Vec<String> {
        text.split(' ').map(str::to_string).collect()
    }

    #[tokio::test]
    async fn quiz_round_trip() {
        let (state, mock) = test_state();
        let mut ctx = group_ctx("g1", "admin@s.whatsapp.net");
        ctx.args = args_of("Paris | capital of France?");

        quiz_command(ctx.clone(), state.clone()).await.unwrap();
        let quiz = state.store.group("g1").activequiz.unwrap();
        assert_eq!(quiz.answer, "Paris");
        assert!(mock.last_message().unwrap().text.contains("capital of France?"));

        endquiz_command(ctx, state.clone()).await.unwrap();
        assert!(state.store.group("g1").activequiz.is_none());
    }

    #[tokio::test]
    async fn votes_are_one_per_member_and_movable() {
        let (state, _mock) = test_state();
        let mut admin = group_ctx("g1", "admin@s.whatsapp.net");
        admin.args = args_of("lunch? | pizza | sushi");
        poll_command(admin, state.clone()).await.unwrap();

        let mut voter = group_ctx("g1", "u1@s.whatsapp.net");
        voter.args = vec!["1".into()];
        vote_command(voter.clone(), state.clone()).await.unwrap();
        voter.args = vec!["2".into()];
        vote_command(voter, state.clone()).await.unwrap();

        let poll = state.store.group("g1").activepoll.unwrap();
        assert_eq!(poll.votes.len(), 1);
        assert_eq!(poll.votes.get("u1@s.whatsapp.net"), Some(&1));
    }

    #[tokio::test]
    async fn out_of_range_vote_is_rejected() {
        let (state, mock) = test_state();
        let mut admin = group_ctx("g1", "admin@s.whatsapp.net");
        admin.args = args_of("lunch? | pizza | sushi");
        poll_command(admin, state.clone()).await.unwrap();

        let mut voter = group_ctx("g1", "u1@s.whatsapp.net");
        voter.args = vec!["5".into()];
        vote_command(voter, state.clone()).await.unwrap();
        assert!(mock.last_message().unwrap().text.starts_with('❌'));
        assert!(state.store.group("g1").activepoll.unwrap().votes.is_empty());
    }
}
