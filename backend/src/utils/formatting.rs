use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::constants::*;
use crate::models::{Leaderboard, VoteEvent};
use crate::utils::token_conversion::format_token_amount;

// Legacy Telegram Markdown control characters
static MARKDOWN_SPECIALS: Lazy<Regex> = Lazy::new(|| Regex::new(r"([_*`\[])").unwrap());

// Only `*` terminates a bold entity; backticks would open a nested one
static BOLD_BREAKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*`]").unwrap());

/// Escapes text placed outside any entity.
pub fn escape_markdown(text: &str) -> String {
    MARKDOWN_SPECIALS.replace_all(text, r"\$1").into_owned()
}

/// Telegram does not allow escapes inside an entity, so the breaking
/// characters are dropped instead.
pub fn sanitize_bold(text: &str) -> String {
    BOLD_BREAKERS.replace_all(text, "").into_owned()
}

/// `0xAefC770D...A756` style short form: first 6 and last 4 characters.
pub fn shorten_wallet(wallet: &str) -> Option<String> {
    let wallet = wallet.trim();
    if !is_displayable_wallet(wallet) {
        return None;
    }
    let chars: Vec<char> = wallet.chars().collect();
    let head: String = chars[..WALLET_PREFIX_CHARS].iter().collect();
    let tail: String = chars[chars.len() - WALLET_SUFFIX_CHARS..].iter().collect();
    Some(format!("{}...{}", head, tail))
}

/// Presentation settings for the leaderboard message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardStyle {
    pub title: String,
    pub token_symbol: String,
    pub footer_url: Option<String>,
}

impl Default for LeaderboardStyle {
    fn default() -> Self {
        Self {
            title: DEFAULT_LEADERBOARD_TITLE.to_string(),
            token_symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            footer_url: Some(DEFAULT_FOOTER_URL.to_string()),
        }
    }
}

/// `Fri, 16 Oct 2026 08:37:00 GMT`
pub fn format_updated_at(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn render_leaderboard(
    board: &Leaderboard,
    round: &str,
    style: &LeaderboardStyle,
    now: DateTime<Utc>,
) -> String {
    // the symbol appears both inside the bold total and as plain text
    let bold_symbol = sanitize_bold(&style.token_symbol);
    let plain_symbol = escape_markdown(&style.token_symbol);
    let total = format_token_amount(board.total_raw, TOKEN_DECIMALS, TOTAL_DISPLAY_PLACES);

    let mut text = format!(
        "*{}* — Round #{}\n",
        sanitize_bold(&style.title),
        escape_markdown(round)
    );
    text.push_str(&format!("Total Votes: *{} {}*\n\n", total, bold_symbol));

    for (rank, entry) in board.entries.iter().enumerate() {
        let entry_symbol = if entry.symbol.is_empty() {
            MISSING_SYMBOL_PLACEHOLDER.to_string()
        } else {
            sanitize_bold(&entry.symbol)
        };
        text.push_str(&format!(
            "{}. *{} ({})* — {} {}\n",
            rank + 1,
            sanitize_bold(&entry.name),
            entry_symbol,
            entry.display_votes(),
            plain_symbol
        ));
    }

    if board.is_fresh_round() {
        text.push_str(ROUND_JUST_STARTED_NOTICE);
        text.push('\n');
    }

    text.push_str(&format!("\nUpdated: {}", format_updated_at(now)));
    if let Some(url) = style.footer_url.as_deref().filter(|u| !u.is_empty()) {
        text.push('\n');
        text.push_str(&escape_markdown(url));
    }

    text
}

#[derive(Debug, Error, PartialEq)]
pub enum VoteError {
    #[error("wallet '{0}' is too short to display")]
    InvalidWallet(String),

    #[error("vote amount is not a number")]
    InvalidAmount,
}

pub fn render_vote_notification(vote: &VoteEvent, token_symbol: &str) -> Result<String, VoteError> {
    let wallet = shorten_wallet(&vote.wallet)
        .ok_or_else(|| VoteError::InvalidWallet(vote.wallet.clone()))?;
    let amount = vote.amount_as_f64().ok_or(VoteError::InvalidAmount)?;

    let symbol = if vote.project_symbol.trim().is_empty() {
        MISSING_SYMBOL_PLACEHOLDER.to_string()
    } else {
        sanitize_bold(vote.project_symbol.trim())
    };

    let mut text = String::from("🗳 *New Vote Cast!*\n\n");
    text.push_str(&format!("👛 Wallet: `{}`\n", wallet.replace('`', "")));
    text.push_str(&format!(
        "🏆 Project: *{} ({})*\n",
        sanitize_bold(vote.project_name.trim()),
        symbol
    ));
    text.push_str(&format!(
        "💎 Amount: *{:.4} {}*",
        amount,
        sanitize_bold(token_symbol)
    ));
    if let Some(round) = vote.round_label() {
        text.push_str(&format!("\n🔢 Round: #{}", escape_markdown(&round)));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Project;
    use crate::utils::token_conversion::whole_tokens;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn project(slot: usize, name: &str, symbol: &str, tokens: u64) -> Project {
        Project {
            raw_votes: whole_tokens(tokens),
            ..Project::placeholder(slot, name, symbol)
        }
    }

    fn vote(wallet: &str, amount: serde_json::Value) -> VoteEvent {
        serde_json::from_value(json!({
            "wallet": wallet,
            "amount": amount,
            "projectName": "Jade",
            "projectSymbol": "JDE",
        }))
        .unwrap()
    }

    #[test]
    fn test_render_ranked_leaderboard() {
        let board = Leaderboard::from_projects(&[
            project(0, "A", "AAA", 5),
            project(1, "", "", 0),
            project(2, "B", "BBB", 10),
        ]);

        let text = render_leaderboard(&board, "2", &LeaderboardStyle::default(), fixed_time(0));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "*Jade1 Live Leaderboard* — Round #2");
        assert_eq!(lines[1], "Total Votes: *15 JADE*");
        assert_eq!(lines[3], "1. *B (BBB)* — 10.0000 JADE");
        assert_eq!(lines[4], "2. *A (AAA)* — 5.0000 JADE");
        assert!(!text.contains(ROUND_JUST_STARTED_NOTICE));
        assert!(lines[6].starts_with("Updated: "));
        assert_eq!(lines[7], "https://jade1.io");
    }

    #[test]
    fn test_render_empty_round() {
        let board = Leaderboard::from_projects(&[project(0, "", "", 0), project(1, "   ", "X", 4)]);
        let text = render_leaderboard(&board, "3", &LeaderboardStyle::default(), fixed_time(0));

        assert!(text.contains("Total Votes: *0 JADE*"));
        assert!(text.contains(ROUND_JUST_STARTED_NOTICE));
    }

    #[test]
    fn test_render_zero_votes_keeps_ranking_and_notice() {
        let board = Leaderboard::from_projects(&[project(0, "A", "AAA", 0)]);
        let text = render_leaderboard(&board, "1", &LeaderboardStyle::default(), fixed_time(0));

        assert!(text.contains("1. *A (AAA)* — 0.0000 JADE"));
        assert!(text.contains(ROUND_JUST_STARTED_NOTICE));
        assert!(text.contains("Total Votes: *0 JADE*"));
    }

    #[test]
    fn test_render_is_deterministic_apart_from_timestamp() {
        let board = Leaderboard::from_projects(&[project(0, "A", "AAA", 5), project(1, "B", "", 7)]);
        let style = LeaderboardStyle::default();

        let first = render_leaderboard(&board, "2", &style, fixed_time(0));
        let second = render_leaderboard(&board, "2", &style, fixed_time(90));

        assert_ne!(first, second);
        let strip = |t: &str| -> Vec<String> {
            t.lines()
                .filter(|l| !l.starts_with("Updated: "))
                .map(str::to_string)
                .collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_render_placeholder_symbol_and_markdown_safety() {
        let board = Leaderboard::from_projects(&[project(0, "Star*Dust_", "", 1)]);
        let style = LeaderboardStyle { footer_url: None, ..LeaderboardStyle::default() };
        let text = render_leaderboard(&board, "round_2", &style, fixed_time(0));

        assert!(text.contains("1. *StarDust_ (???)* — 1.0000 JADE"));
        assert!(text.starts_with("*Jade1 Live Leaderboard* — Round #round\\_2\n"));
        assert!(text.ends_with("GMT"));
    }

    #[test]
    fn test_render_escapes_plain_symbol_and_footer() {
        let board = Leaderboard::from_projects(&[project(0, "A", "AAA", 1)]);
        let style = LeaderboardStyle {
            title: "Jade1 Live Leaderboard".to_string(),
            token_symbol: "JADE_V2".to_string(),
            footer_url: Some("https://jade_1.io/vote".to_string()),
        };

        let text = render_leaderboard(&board, "1", &style, fixed_time(0));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[1], "Total Votes: *1 JADE_V2*");
        assert_eq!(lines[3], "1. *A (AAA)* — 1.0000 JADE\\_V2");
        assert_eq!(lines.last(), Some(&"https://jade\\_1.io/vote"));
    }

    #[test]
    fn test_updated_at_format() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 16, 8, 37, 5).unwrap();
        assert_eq!(format_updated_at(ts), "Fri, 16 Oct 2026 08:37:05 GMT");
    }

    #[test]
    fn test_shorten_wallet() {
        let wallet = "0xAefC770D8515C552C952a30e597d9fbEa99aA756";
        assert_eq!(wallet.len(), 42);
        assert_eq!(shorten_wallet(wallet).as_deref(), Some("0xAefC...A756"));
        assert_eq!(shorten_wallet("0x12345678").as_deref(), Some("0x1234...5678"));
        assert_eq!(shorten_wallet("0x1234"), None);
    }

    #[test]
    fn test_vote_notification() {
        let mut event = vote("0xAefC770D8515C552C952a30e597d9fbEa99aA756", json!("2.5"));
        event.round = Some(json!(4));

        let text = render_vote_notification(&event, "JADE").unwrap();

        assert!(text.contains("`0xAefC...A756`"));
        assert!(text.contains("*Jade (JDE)*"));
        assert!(text.contains("*2.5000 JADE*"));
        assert!(text.ends_with("Round: #4"));
    }

    #[test]
    fn test_vote_notification_rejects_bad_input() {
        assert_eq!(
            render_vote_notification(&vote("0x12", json!(1)), "JADE"),
            Err(VoteError::InvalidWallet("0x12".to_string()))
        );
        assert_eq!(
            render_vote_notification(
                &vote("0xAefC770D8515C552C952a30e597d9fbEa99aA756", json!("many")),
                "JADE"
            ),
            Err(VoteError::InvalidAmount)
        );
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("a_b*c`d[e"), "a\\_b\\*c\\`d\\[e");
        assert_eq!(escape_markdown("plain"), "plain");
    }
}
