use clap::Subcommand;
use pomodorino_core::{Dispatcher, Result, SettingsStore, ToastSink};

use super::common::{open_store, print_toast};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Play the completion sound
    TestSound,
    /// Show a desktop notification
    TestDesktop,
    /// Send a Telegram test message (falls back to stored credentials)
    TestTelegram {
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        chat_id: Option<String>,
    },
    /// POST a webhook test payload (falls back to stored settings)
    TestWebhook {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        payload: Option<String>,
    },
}

pub fn run(action: NotifyAction) -> Result<()> {
    let settings = SettingsStore::new(open_store()?).load();
    let (toasts, mut toast_rx) = ToastSink::channel();
    let dispatcher = Dispatcher::new(toasts);

    let rt = tokio::runtime::Runtime::new()?;
    let ok = rt.block_on(async {
        match action {
            NotifyAction::TestSound => dispatcher.test_sound().await,
            NotifyAction::TestDesktop => dispatcher.test_desktop().await,
            NotifyAction::TestTelegram { token, chat_id } => {
                let token = token.unwrap_or(settings.integrations.telegram.token);
                let chat_id = chat_id.unwrap_or(settings.integrations.telegram.chat_id);
                dispatcher.test_telegram(&token, &chat_id).await
            }
            NotifyAction::TestWebhook { url, payload } => {
                let url = url.unwrap_or(settings.integrations.webhook.url);
                let payload = payload.unwrap_or(settings.integrations.webhook.payload);
                dispatcher.test_webhook(&url, &payload).await
            }
        }
    });

    while let Ok(toast) = toast_rx.try_recv() {
        print_toast(&toast);
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
