use std::{env, fs, path::Path, path::PathBuf, time::Duration};

use crate::{domain::BotToken, errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Reaction palette used when `REACTION_EMOJIS` is not set.
pub const DEFAULT_EMOJIS: &[&str] = &[
    "👍", "❤", "🔥", "👏", "😍", "🎉", "🤩", "💯", "😁", "🥰", "⚡", "✨", "🌟", "💫", "🙏",
];

/// Typed configuration for the dispatcher, read from the process environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Identities
    pub bot_tokens: Vec<BotToken>,
    pub api_base: String,

    // Backend timeouts
    pub verify_timeout: Duration,
    pub webhook_timeout: Duration,
    pub reaction_timeout: Duration,
    pub poll_timeout: Duration,

    // Dispatch
    pub max_reactions_per_dispatch: usize,
    pub manual_default_count: u32,
    pub pacing_min: Duration,
    pub pacing_max: Duration,
    pub emojis: Vec<String>,

    // Supervisor
    pub idle_delay: Duration,
    pub backoff: Duration,
    pub backoff_max: Duration,

    // Status
    pub status_interval: Duration,

    // Logging
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get_u64 = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let bot_tokens: Vec<BotToken> = parse_csv(lookup("BOT_TOKENS"))
            .into_iter()
            .map(BotToken::new)
            .collect();
        if bot_tokens.is_empty() {
            return Err(Error::Config(
                "BOT_TOKENS environment variable is required (comma-separated bot tokens)"
                    .to_string(),
            ));
        }

        let api_base = lookup("TELEGRAM_API_BASE")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let verify_timeout = Duration::from_secs(get_u64("VERIFY_TIMEOUT_SECS").unwrap_or(10));
        let webhook_timeout = Duration::from_secs(get_u64("WEBHOOK_TIMEOUT_SECS").unwrap_or(5));
        let reaction_timeout =
            Duration::from_secs(get_u64("REACTION_TIMEOUT_SECS").unwrap_or(10));
        let poll_timeout = Duration::from_secs(get_u64("POLL_TIMEOUT_SECS").unwrap_or(30));

        let max_reactions_per_dispatch =
            get_u64("MAX_REACTIONS_PER_DISPATCH").unwrap_or(10) as usize;
        let manual_default_count = get_u64("MANUAL_DEFAULT_COUNT")
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(5);

        let mut pacing_min = Duration::from_millis(get_u64("PACING_MIN_MS").unwrap_or(500));
        let mut pacing_max = Duration::from_millis(get_u64("PACING_MAX_MS").unwrap_or(2000));
        if pacing_min > pacing_max {
            std::mem::swap(&mut pacing_min, &mut pacing_max);
        }

        let mut emojis = parse_csv(lookup("REACTION_EMOJIS"));
        if emojis.is_empty() {
            emojis = DEFAULT_EMOJIS.iter().map(|s| s.to_string()).collect();
        }

        let idle_delay = Duration::from_millis(get_u64("IDLE_DELAY_MS").unwrap_or(2000));
        let backoff = Duration::from_secs(get_u64("BACKOFF_SECS").unwrap_or(10));
        let backoff_max =
            Duration::from_secs(get_u64("BACKOFF_MAX_SECS").unwrap_or(10)).max(backoff);

        let status_interval =
            Duration::from_secs(get_u64("STATUS_INTERVAL_SECS").unwrap_or(300).max(1));

        let log_file = lookup("LOG_FILE").and_then(non_empty).map(PathBuf::from);

        Ok(Self {
            bot_tokens,
            api_base,
            verify_timeout,
            webhook_timeout,
            reaction_timeout,
            poll_timeout,
            max_reactions_per_dispatch,
            manual_default_count,
            pacing_min,
            pacing_max,
            emojis,
            idle_delay,
            backoff,
            backoff_max,
            status_interval,
            log_file,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_csv(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
