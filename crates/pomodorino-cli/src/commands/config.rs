use clap::Subcommand;
use pomodorino_core::{Result, SettingsStore};

use super::common::open_store;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full settings record as JSON
    Show,
    /// Set per-mode durations in seconds
    Durations {
        #[arg(long)]
        work: Option<u64>,
        #[arg(long)]
        short_break: Option<u64>,
        #[arg(long)]
        long_break: Option<u64>,
    },
    /// Toggle the local notification channels
    Notifications {
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        desktop: Option<bool>,
    },
    /// Configure the Telegram channel
    Telegram {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        chat_id: Option<String>,
    },
    /// Configure the webhook channel
    Webhook {
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        payload: Option<String>,
    },
}

pub fn run(action: ConfigAction) -> Result<()> {
    let store = SettingsStore::new(open_store()?);
    let mut settings = store.load();

    match action {
        ConfigAction::Show => {}
        ConfigAction::Durations {
            work,
            short_break,
            long_break,
        } => {
            if let Some(secs) = work {
                settings.timer_settings.work_duration = secs;
            }
            if let Some(secs) = short_break {
                settings.timer_settings.short_break_duration = secs;
            }
            if let Some(secs) = long_break {
                settings.timer_settings.long_break_duration = secs;
            }
        }
        ConfigAction::Notifications { sound, desktop } => {
            if let Some(sound) = sound {
                settings.notifications.sound = sound;
            }
            if let Some(desktop) = desktop {
                settings.notifications.desktop = desktop;
            }
        }
        ConfigAction::Telegram {
            enabled,
            token,
            chat_id,
        } => {
            let telegram = &mut settings.integrations.telegram;
            if let Some(enabled) = enabled {
                telegram.enabled = enabled;
            }
            if let Some(token) = token {
                telegram.token = token;
            }
            if let Some(chat_id) = chat_id {
                telegram.chat_id = chat_id;
            }
        }
        ConfigAction::Webhook {
            enabled,
            url,
            payload,
        } => {
            let webhook = &mut settings.integrations.webhook;
            if let Some(enabled) = enabled {
                webhook.enabled = enabled;
            }
            if let Some(url) = url {
                webhook.url = url;
            }
            if let Some(payload) = payload {
                webhook.payload = payload;
            }
        }
    }

    store.save(&settings)?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
