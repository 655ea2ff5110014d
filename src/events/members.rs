//! Participant-change handling: blacklist, join guards, welcome and goodbye.

use tracing::{debug, info, warn};

use crate::bot::dispatcher::AppState;
use crate::transport::{GroupInfo, ParticipantAction};
use crate::utils::{jid_user, mention};

/// Handle one participant update from the bridge.
pub async fn handle(
    state: &AppState,
    group_id: &str,
    members: &[String],
    action: ParticipantAction,
    actor: Option<&str>,
) -> anyhow::Result<()> {
    match action {
        ParticipantAction::Add => handle_join(state, group_id, members, actor).await,
        ParticipantAction::Remove => handle_leave(state, group_id, members).await,
        // Promotions/demotions only matter as fresh metadata, which we
        // re-fetch per message anyway.
        _ => Ok(()),
    }
}

async fn handle_join(
    state: &AppState,
    group_id: &str,
    members: &[String],
    actor: Option<&str>,
) -> anyhow::Result<()> {
    let record = state.store.group(group_id);
    let info = match state.transport.fetch_group_info(group_id).await {
        Ok(info) => info,
        Err(e) => {
            warn!("No group info for {}: {}", group_id, e);
            GroupInfo::default()
        }
    };
    let bot_admin = info.bot_is_admin();

    for member in members {
        if record.blacklist.contains(member) {
            if bot_admin {
                info!("Removing blacklisted {} from {}", member, group_id);
                state
                    .transport
                    .update_participants(group_id, &[member.clone()], ParticipantAction::Remove)
                    .await?;
            }
            continue;
        }

        if record.antibotadd
            && bot_admin
            && is_suspected_bot(member)
            && actor.map(|a| !info.is_admin(a)).unwrap_or(true)
        {
            info!("Removing suspected bot {} added to {}", member, group_id);
            state
                .transport
                .update_participants(group_id, &[member.clone()], ParticipantAction::Remove)
                .await?;
            continue;
        }

        if record.antifake
            && bot_admin
            && let Some(owner) = &info.owner
            && is_foreign_number(member, owner)
        {
            info!("Removing foreign-prefix number {} from {}", member, group_id);
            state
                .transport
                .update_participants(group_id, &[member.clone()], ParticipantAction::Remove)
                .await?;
            continue;
        }

        let welcome = record
            .customwelcome
            .clone()
            .unwrap_or_else(|| "👋 Welcome to the group, {user}!".to_string());
        let text = welcome.replace("{user}", &mention(member));
        state
            .transport
            .send_message(group_id, &text, std::slice::from_ref(member))
            .await?;
    }

    Ok(())
}

async fn handle_leave(
    state: &AppState,
    group_id: &str,
    members: &[String],
) -> anyhow::Result<()> {
    let record = state.store.group(group_id);
    for member in members {
        let goodbye = record
            .customgoodbye
            .clone()
            .unwrap_or_else(|| "👋 Goodbye, {user}.".to_string());
        let text = goodbye.replace("{user}", &mention(member));
        state
            .transport
            .send_message(group_id, &text, std::slice::from_ref(member))
            .await?;
    }
    Ok(())
}

/// WhatsApp bot/business accounts carry abnormally long user parts.
fn is_suspected_bot(jid: &str) -> bool {
    let user = jid_user(jid);
    user.len() > 15 && user.chars().all(|c| c.is_ascii_digit())
}

/// Country-prefix heuristic: flag joiners whose first two digits differ from
/// the group owner's.
fn is_foreign_number(jid: &str, owner_jid: &str) -> bool {
    let member = jid_user(jid);
    let owner = jid_user(owner_jid);
    if member.len() < 2 || owner.len() < 2 {
        debug!("Cannot compare prefixes for {} vs {}", jid, owner_jid);
        return false;
    }
    member[..2] != owner[..2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_state;
    use serde_json::json;

    #[tokio::test]
    async fn blacklisted_joiner_is_removed() {
        let (state, mock) = test_state();
        state
            .store
            .patch("g1", json!({"blacklist": ["bad@s.whatsapp.net"]}));
        mock.group_info.lock().participants = vec![crate::transport::Participant {
            jid: "bot@s.whatsapp.net".into(),
            is_admin: true,
            is_superadmin: false,
            is_me: true,
        }];

        handle(
            &state,
            "g1",
            &["bad@s.whatsapp.net".to_string()],
            ParticipantAction::Add,
            None,
        )
        .await
        .unwrap();

        assert_eq!(mock.removals().len(), 1);
        // No welcome for a removed joiner.
        assert!(mock.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn custom_welcome_fills_user_placeholder() {
        let (state, mock) = test_state();
        state
            .store
            .patch("g1", json!({"customwelcome": "hello {user}, read the rules"}));

        handle(
            &state,
            "g1",
            &["49123@s.whatsapp.net".to_string()],
            ParticipantAction::Add,
            None,
        )
        .await
        .unwrap();

        let sent = mock.last_message().unwrap();
        assert_eq!(sent.text, "hello @49123, read the rules");
        assert_eq!(sent.mentions, vec!["49123@s.whatsapp.net".to_string()]);
    }

    #[test]
    fn prefix_heuristic() {
        assert!(is_foreign_number(
            "92123456@s.whatsapp.net",
            "49999999@s.whatsapp.net"
        ));
        assert!(!is_foreign_number(
            "49123456@s.whatsapp.net",
            "49999999@s.whatsapp.net"
        ));
    }
}
