//! Slash command parsing and execution.
//!
//! [`parse`] turns an APPLICATION_COMMAND interaction into an
//! [`Invocation`]; [`execute`] runs it against the engine and renders the
//! [`Reply`]. Execution is synchronous and is expected to run on a
//! blocking thread.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, warn};

use orbis_core::{Account, AccountId, EconomyError, Participant};
use orbis_economy::cooldown::minutes_seconds;
use orbis_economy::{EconomyEngine, RankPage};

use crate::discord::{FLAG_EPHEMERAL, PERMISSION_ADMINISTRATOR, RESPONSE_MESSAGE};

/// Embed colour for the leaderboard (gold).
const RANK_COLOR: u32 = 0xF1C40F;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Balance,
    Work,
    Pay { recipient: Participant, amount: i64 },
    SetBalance { target: AccountId, amount: i64 },
    Rank { page: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub invoker: Participant,
    /// Invoker holds the ADMINISTRATOR permission in the guild.
    pub is_admin: bool,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub embed: Option<Value>,
    /// Visible only to the invoker.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
            ephemeral: false,
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embed: None,
            ephemeral: true,
        }
    }

    /// Interaction response body (CHANNEL_MESSAGE_WITH_SOURCE).
    pub fn to_response(&self) -> Value {
        let mut data = json!({ "content": self.content });
        if let Some(embed) = &self.embed {
            data["embeds"] = json!([embed]);
        }
        if self.ephemeral {
            data["flags"] = json!(FLAG_EPHEMERAL);
        }
        json!({ "type": RESPONSE_MESSAGE, "data": data })
    }
}

/// Extract the invoker and command from an interaction payload.
///
/// The error string is shown to the invoker as-is.
pub fn parse(interaction: &Value) -> Result<Invocation, String> {
    // Guild interactions carry `member.user`; DMs carry `user`.
    let user = if interaction["member"]["user"].is_object() {
        &interaction["member"]["user"]
    } else {
        &interaction["user"]
    };
    let invoker_id = user["id"]
        .as_str()
        .ok_or_else(|| "Could not identify you.".to_string())?;
    let invoker = Participant {
        id: AccountId::from(invoker_id),
        automated: user["bot"].as_bool().unwrap_or(false),
    };

    let is_admin = interaction["member"]["permissions"]
        .as_str()
        .and_then(|p| p.parse::<u64>().ok())
        .is_some_and(|bits| bits & PERMISSION_ADMINISTRATOR != 0);

    let data = &interaction["data"];
    let command = match data["name"].as_str().unwrap_or("") {
        "balance" => Command::Balance,
        "work" => Command::Work,
        "pay" => Command::Pay {
            recipient: user_option(data, "user")?,
            amount: integer_option(data, "amount")?,
        },
        "setbalance" => Command::SetBalance {
            target: user_option(data, "user")?.id,
            amount: integer_option(data, "amount")?,
        },
        "rank" => Command::Rank {
            page: integer_option(data, "page").unwrap_or(1),
        },
        _ => return Err("Unknown command.".to_string()),
    };

    Ok(Invocation {
        invoker,
        is_admin,
        command,
    })
}

fn option<'a>(data: &'a Value, name: &str) -> Option<&'a Value> {
    data["options"]
        .as_array()?
        .iter()
        .find(|o| o["name"] == name)
        .map(|o| &o["value"])
}

fn integer_option(data: &Value, name: &str) -> Result<i64, String> {
    option(data, name)
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("Missing `{name}`."))
}

/// Resolve a USER option, using `data.resolved.users` for the bot flag.
fn user_option(data: &Value, name: &str) -> Result<Participant, String> {
    let id = option(data, name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing `{name}`."))?;
    let automated = data["resolved"]["users"][id]["bot"]
        .as_bool()
        .unwrap_or(false);
    Ok(Participant {
        id: AccountId::from(id),
        automated,
    })
}

/// Run one invocation. Never fails: errors become private replies.
pub fn execute(engine: &EconomyEngine, invocation: Invocation, now: DateTime<Utc>) -> Reply {
    let Invocation {
        invoker,
        is_admin,
        command,
    } = invocation;

    let result = match command {
        Command::Balance => engine
            .balance(&invoker.id)
            .map(|account| Reply::public(render_balance(engine, &account))),
        Command::Work => engine.work(&invoker.id, now).map(|out| {
            Reply::public(format!(
                "{} worked and earned **{}** coins (fortune x{}). Balance: {}",
                mention(&invoker.id),
                out.income,
                out.fortune_multiplier,
                out.account.balance
            ))
        }),
        Command::Pay { recipient, amount } => {
            engine.transfer(&invoker, &recipient, amount).map(|receipt| {
                Reply::public(format!(
                    "{} sent **{}** coins to {}.",
                    mention(&receipt.sender.id),
                    receipt.amount,
                    mention(&receipt.recipient.id)
                ))
            })
        }
        Command::SetBalance { target, amount } => {
            if !is_admin {
                return Reply::private("This command is for administrators only.");
            }
            engine.set_balance(&target, amount).map(|account| {
                Reply::public(format!(
                    "Set {}'s balance to **{}** coins.",
                    mention(&account.id),
                    account.balance
                ))
            })
        }
        Command::Rank { page } => engine.rank(page).map(|page| render_rank(&page)),
    };

    result.unwrap_or_else(|err| error_reply(&invoker.id, &err))
}

fn mention(id: &AccountId) -> String {
    format!("<@{id}>")
}

fn render_balance(engine: &EconomyEngine, account: &Account) -> String {
    format!(
        "{} has **{}** coins. Level {} ({:.0}/{:.0}), activity {:.2}.",
        mention(&account.id),
        account.balance,
        account.level,
        account.level_total(),
        engine.next_level_threshold(account),
        account.activity_score
    )
}

fn render_rank(page: &RankPage) -> Reply {
    if page.is_empty() {
        return Reply::public("No ranking data yet.");
    }
    let fields: Vec<Value> = page
        .entries
        .iter()
        .map(|entry| {
            json!({
                "name": format!("#{}", entry.position),
                "value": format!("{}: Lv.{}", mention(&entry.id), entry.level),
                "inline": false
            })
        })
        .collect();

    Reply {
        content: String::new(),
        embed: Some(json!({
            "title": format!("Level ranking (page {}/{})", page.page, page.total_pages),
            "description": "Top members by level.",
            "color": RANK_COLOR,
            "fields": fields
        })),
        ephemeral: false,
    }
}

fn error_reply(invoker: &AccountId, err: &EconomyError) -> Reply {
    match err {
        EconomyError::CooldownActive { remaining_secs } => {
            let (minutes, seconds) = minutes_seconds(*remaining_secs);
            Reply::private(format!(
                "You can work again in {minutes}m {seconds}s."
            ))
        }
        EconomyError::InsufficientFunds { have, .. } => {
            Reply::private(format!("Insufficient funds: you have {have} coins."))
        }
        EconomyError::InvalidAmount(_) | EconomyError::InvalidTarget(_) => {
            Reply::private(format!("Invalid request: {err}."))
        }
        EconomyError::BalanceOverflow => Reply::private("That balance is too large."),
        EconomyError::Store(store_err) if store_err.is_retryable() => {
            warn!(account = %invoker, error = %store_err, "command hit contention");
            Reply::private("The economy is busy right now. Please try again.")
        }
        EconomyError::Store(store_err) => {
            error!(account = %invoker, error = %store_err, "command failed");
            Reply::private("Something went wrong while updating your account.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use orbis_core::{AccountStore, MemoryAccountStore, StoreError};
    use orbis_economy::EconomyConfig;

    fn engine() -> EconomyEngine {
        EconomyEngine::new(Arc::new(MemoryAccountStore::new()), EconomyConfig::default())
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_735_700_000, 0).unwrap()
    }

    fn interaction(name: &str, options: Value, permissions: &str) -> Value {
        json!({
            "type": 2,
            "member": {
                "user": { "id": "100", "username": "alice" },
                "permissions": permissions
            },
            "data": {
                "name": name,
                "options": options,
                "resolved": {
                    "users": {
                        "200": { "id": "200", "bot": false },
                        "300": { "id": "300", "bot": true }
                    }
                }
            }
        })
    }

    #[test]
    fn parse_pay_with_resolved_bot_flag() {
        let inv = parse(&interaction(
            "pay",
            json!([{ "name": "user", "value": "300" }, { "name": "amount", "value": 5 }]),
            "0",
        ))
        .unwrap();
        assert_eq!(inv.invoker, Participant::human("100"));
        assert!(!inv.is_admin);
        assert_eq!(
            inv.command,
            Command::Pay {
                recipient: Participant::automated("300"),
                amount: 5
            }
        );
    }

    #[test]
    fn parse_admin_bit() {
        let inv = parse(&interaction("balance", json!([]), "2147483656")).unwrap();
        assert!(inv.is_admin);
        let inv = parse(&interaction("balance", json!([]), "2147483648")).unwrap();
        assert!(!inv.is_admin);
    }

    #[test]
    fn parse_rank_defaults_to_first_page() {
        let inv = parse(&interaction("rank", json!([]), "0")).unwrap();
        assert_eq!(inv.command, Command::Rank { page: 1 });
    }

    #[test]
    fn parse_dm_user() {
        let inv = parse(&json!({ "type": 2, "user": { "id": "9" }, "data": { "name": "work" } }))
            .unwrap();
        assert_eq!(inv.invoker.id.as_str(), "9");
        assert_eq!(inv.command, Command::Work);
    }

    #[test]
    fn parse_rejects_unknown_and_incomplete() {
        assert!(parse(&interaction("dance", json!([]), "0")).is_err());
        assert!(parse(&interaction("pay", json!([{ "name": "user", "value": "200" }]), "0")).is_err());
    }

    #[test]
    fn work_then_cooldown_reply() {
        let engine = engine();
        let inv = parse(&interaction("work", json!([]), "0")).unwrap();
        let first = execute(&engine, inv.clone(), now());
        assert!(!first.ephemeral);
        assert!(first.content.contains("earned"));

        let second = execute(&engine, inv, now() + chrono::Duration::seconds(1000));
        assert!(second.ephemeral);
        assert_eq!(second.content, "You can work again in 43m 20s.");
    }

    #[test]
    fn pay_insufficient_funds_is_private() {
        let engine = engine();
        let inv = parse(&interaction(
            "pay",
            json!([{ "name": "user", "value": "200" }, { "name": "amount", "value": 50 }]),
            "0",
        ))
        .unwrap();
        let reply = execute(&engine, inv, now());
        assert!(reply.ephemeral);
        assert!(reply.content.starts_with("Insufficient funds"));
    }

    #[test]
    fn setbalance_requires_admin() {
        let engine = engine();
        let options = json!([{ "name": "user", "value": "200" }, { "name": "amount", "value": 500 }]);

        let denied = execute(&engine, parse(&interaction("setbalance", options.clone(), "0")).unwrap(), now());
        assert!(denied.ephemeral);
        assert_eq!(engine.store().get(&AccountId::from("200")).unwrap(), None);

        let ok = execute(&engine, parse(&interaction("setbalance", options, "8")).unwrap(), now());
        assert!(!ok.ephemeral);
        assert_eq!(engine.balance(&AccountId::from("200")).unwrap().balance, 500);
    }

    #[test]
    fn rank_reply_uses_embed() {
        let engine = engine();
        let empty = execute(&engine, parse(&interaction("rank", json!([]), "0")).unwrap(), now());
        assert_eq!(empty.content, "No ranking data yet.");

        engine.balance(&AccountId::from("100")).unwrap();
        let reply = execute(&engine, parse(&interaction("rank", json!([]), "0")).unwrap(), now());
        let embed = reply.embed.unwrap();
        assert_eq!(embed["title"], "Level ranking (page 1/1)");
        assert_eq!(embed["fields"][0]["value"], "<@100>: Lv.1");
    }

    #[test]
    fn store_failures_reply_privately() {
        let who = AccountId::from("100");
        let busy = error_reply(&who, &StoreError::Timeout { millis: 5 }.into());
        assert!(busy.ephemeral);
        assert!(busy.content.contains("try again"));

        let broken = error_reply(&who, &StoreError::Corrupted("bad record".into()).into());
        assert!(broken.ephemeral);
        assert!(!broken.content.contains("try again"));
        assert!(!broken.content.contains("bad record"));
    }

    #[test]
    fn response_shape() {
        let body = Reply::private("nope").to_response();
        assert_eq!(body["type"], 4);
        assert_eq!(body["data"]["flags"], 64);
        assert!(Reply::public("ok").to_response()["data"].get("flags").is_none());
    }
}
