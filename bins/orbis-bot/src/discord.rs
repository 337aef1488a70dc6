//! Discord HTTP Interactions support.
//!
//! Implements Ed25519 signature verification (required by Discord) and
//! slash command registration at startup.

use anyhow::{Context, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::{json, Value};

/// Interaction types Discord sends.
pub const INTERACTION_PING: u64 = 1;
pub const INTERACTION_COMMAND: u64 = 2;

/// Response types.
pub const RESPONSE_PONG: u64 = 1;
pub const RESPONSE_MESSAGE: u64 = 4;

/// Message flag hiding a reply from everyone but the invoker.
pub const FLAG_EPHEMERAL: u64 = 64;

/// ADMINISTRATOR bit in a member's permission set.
pub const PERMISSION_ADMINISTRATOR: u64 = 0x8;

// Application command option types.
const OPTION_INTEGER: u64 = 4;
const OPTION_USER: u64 = 6;

// ---------------------------------------------------------------------------
// Signature verification
// ---------------------------------------------------------------------------

/// Verify a Discord Ed25519 interaction signature.
///
/// The signed message is the `X-Signature-Timestamp` header value followed
/// by the raw request body.
pub fn verify_signature(public_key_hex: &str, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
    let Ok(pubkey_bytes) = hex::decode(public_key_hex) else {
        return false;
    };
    let Ok(pubkey_array): Result<[u8; 32], _> = pubkey_bytes.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&pubkey_array) else {
        return false;
    };

    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(sig_array): Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_array);

    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body);

    verifying_key.verify(&message, &signature).is_ok()
}

// ---------------------------------------------------------------------------
// Command registration
// ---------------------------------------------------------------------------

/// Global slash command definitions.
pub fn command_definitions() -> Value {
    json!([
        {
            "name": "balance",
            "description": "Show your balance, level and activity score"
        },
        {
            "name": "work",
            "description": "Work for some coins (once per hour)"
        },
        {
            "name": "pay",
            "description": "Send coins to another member",
            "options": [
                {
                    "name": "user",
                    "description": "Recipient",
                    "type": OPTION_USER,
                    "required": true
                },
                {
                    "name": "amount",
                    "description": "How many coins to send",
                    "type": OPTION_INTEGER,
                    "required": true
                }
            ]
        },
        {
            "name": "setbalance",
            "description": "Set a member's balance (administrators only)",
            "default_member_permissions": PERMISSION_ADMINISTRATOR.to_string(),
            "options": [
                {
                    "name": "user",
                    "description": "Member to adjust",
                    "type": OPTION_USER,
                    "required": true
                },
                {
                    "name": "amount",
                    "description": "New balance",
                    "type": OPTION_INTEGER,
                    "required": true
                }
            ]
        },
        {
            "name": "rank",
            "description": "Level leaderboard",
            "options": [{
                "name": "page",
                "description": "Page number",
                "type": OPTION_INTEGER,
                "required": false
            }]
        }
    ])
}

/// Overwrite the application's global slash commands.
///
/// Called once at startup when Discord credentials are configured.
pub async fn register_commands(token: &str, app_id: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let url = format!("https://discord.com/api/v10/applications/{app_id}/commands");

    let resp = client
        .put(&url)
        .header("Authorization", format!("Bot {token}"))
        .header("Content-Type", "application/json")
        .json(&command_definitions())
        .send()
        .await
        .context("Failed to send Discord command registration request")?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Discord API returned {status}: {body}");
    }

    Ok(())
}
