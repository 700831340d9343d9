use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;

use sozbot::config::Config;
use sozbot::daily::DailyState;
use sozbot::generator::{Backend, EchoGenerator, OpenAiClient, Resilient};
use sozbot::jobs;
use sozbot::mention::{self, GREETING};
use sozbot::scheduler::{Trigger, spawn_daily};
use sozbot::telegram::TelegramClient;

struct BotState {
    /// Without a username there is nothing to detect mentions by.
    bot_username: Option<String>,
    generator: Arc<Resilient<Backend>>,
    telegram: Arc<TelegramClient>,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
enum Command {
    Start,
}

// Single-threaded: the dispatcher and the three daily jobs share one event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sozbot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("sozbot.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file: {e}");
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting sozbot...");
    info!("Loaded config from {config_path}");
    info!("Target chat: {}, timezone: {}", config.chat_id, config.timezone);

    let bot = Bot::new(&config.telegram_bot_token);

    let bot_username = match config.bot_username.clone() {
        Some(name) => Some(name),
        None => match bot.get_me().await {
            Ok(me) => {
                info!("Bot user ID: {}, username: @{}", me.id, me.username());
                Some(me.username().to_string())
            }
            Err(e) => {
                warn!("Failed to get bot info, mentions disabled: {e}");
                None
            }
        },
    };

    let backend = if config.openai_api_key.is_empty() {
        warn!("No openai_api_key set, generation runs in echo test mode");
        Backend::Echo(EchoGenerator)
    } else {
        Backend::OpenAi(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
        ))
    };
    let generator = Arc::new(Resilient::new(backend, config.retry));
    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    spawn_jobs(&config, generator.clone(), telegram.clone());

    let state = Arc::new(BotState { bot_username, generator, telegram });

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Wire the three daily jobs to their triggers. They share one `DailyState`,
/// each through its own handle.
fn spawn_jobs(config: &Config, generator: Arc<Resilient<Backend>>, telegram: Arc<TelegramClient>) {
    let (words_writer, grammar_writer, reader) = DailyState::new().handles();
    let catalog = Arc::new(config.catalog.clone());
    let chat_id = config.chat_id;
    let tz = config.timezone;

    {
        let catalog = catalog.clone();
        let telegram = telegram.clone();
        let count = config.words_per_day;
        let trigger = Trigger { name: "morning words", schedule: config.morning.clone(), tz };
        spawn_daily(trigger, move || {
            let catalog = catalog.clone();
            let telegram = telegram.clone();
            let writer = words_writer.clone();
            async move {
                let mut rng = StdRng::from_os_rng();
                jobs::morning_words(&catalog, &writer, &*telegram, chat_id, count, &mut rng).await
            }
        });
    }

    {
        let telegram = telegram.clone();
        let trigger = Trigger { name: "midday grammar", schedule: config.midday.clone(), tz };
        spawn_daily(trigger, move || {
            let catalog = catalog.clone();
            let telegram = telegram.clone();
            let writer = grammar_writer.clone();
            async move {
                let mut rng = StdRng::from_os_rng();
                jobs::midday_grammar(&catalog, &writer, &*telegram, chat_id, &mut rng).await
            }
        });
    }

    let questions = config.quiz_questions;
    let trigger = Trigger { name: "evening quiz", schedule: config.evening.clone(), tz };
    spawn_daily(trigger, move || {
        let generator = generator.clone();
        let telegram = telegram.clone();
        let reader = reader.clone();
        async move {
            jobs::evening_quiz(&reader, &*generator, &*telegram, chat_id, questions)
                .await
                .map(|_| ())
        }
    });
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            bot.send_message(msg.chat.id, GREETING).await?;
        }
    }
    Ok(())
}

async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    // Unknown commands are not questions.
    if text.starts_with('/') {
        return Ok(());
    }
    let Some(ref username) = state.bot_username else {
        return Ok(());
    };

    match mention::handle_mention(text, username, &*state.generator).await {
        Ok(Some(reply)) => {
            state.telegram.reply(msg.chat.id.0, msg.id.0 as i64, &reply).await.ok();
        }
        Ok(None) => {}
        Err(e) => warn!("Mention answer failed: {e}"),
    }

    Ok(())
}
