use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::event::{Event as CrosstermEvent, EventStream};
use futures_util::StreamExt;
use log::info;

use clawt_settings::api::{HttpSettingsApi, InMemorySettingsApi};
use clawt_settings::app::App;
use clawt_settings::config::ConsoleConfig;
use clawt_settings::controller::SettingsController;
use clawt_settings::event::Event;
use clawt_settings::logging;
use clawt_settings::sync::SharedApi;
use clawt_settings::tui::{init, restore};
use clawt_settings::ui::render;

/// ClawtBot 設定主控台
#[derive(Debug, Parser)]
#[command(name = "clawt-settings", version, about)]
struct Cli {
    /// 設定檔路徑（預設為 config/settings.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆寫後端根網址
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// 使用記憶體內的後端，不連線
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 啟動互動式終端機介面（預設）
    Tui,
    /// 載入所有設定並輸出到 stdout
    Snapshot {
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok());
    config.apply_overrides(cli.base_url.clone());

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            logging::init_file_logging(&config)?;
            let api = build_api(&config, cli.offline)?;
            run_tui(api, &config).await
        }
        Command::Snapshot { format } => {
            logging::init_stderr_logging();
            let api = build_api(&config, cli.offline)?;
            print_snapshot(api, &config, format).await
        }
    }
}

fn build_api(config: &ConsoleConfig, offline: bool) -> Result<SharedApi> {
    if offline {
        info!("Using in-memory settings backend");
        return Ok(Arc::new(InMemorySettingsApi::new()));
    }
    info!("Using settings backend at {}", config.base_url);
    let api = HttpSettingsApi::new(
        &config.base_url,
        config.api_token.clone(),
        config.request_timeout(),
    )
    .context("建立後端客戶端失敗")?;
    Ok(Arc::new(api))
}

async fn print_snapshot(api: SharedApi, config: &ConsoleConfig, format: Format) -> Result<()> {
    let mut controller = SettingsController::new(api, config.toast_lifetime());
    let snapshot = controller.load_all().await;
    let rendered = match format {
        Format::Json => serde_json::to_string_pretty(&snapshot).context("序列化 JSON 失敗")?,
        Format::Yaml => serde_yaml::to_string(&snapshot).context("序列化 YAML 失敗")?,
    };
    println!("{rendered}");
    Ok(())
}

async fn run_tui(api: SharedApi, config: &ConsoleConfig) -> Result<()> {
    let mut tui = init().context("初始化終端機失敗")?;
    let controller = SettingsController::new(api, config.toast_lifetime());
    let mut app = App::new(controller, config.tick_rate());

    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(app.tick_rate);

    let result = loop {
        if let Err(err) = tui.draw(|frame| render(frame, &app)) {
            break Err(err).context("繪製畫面失敗");
        }
        if app.should_quit {
            break Ok(());
        }

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => break Err(err).context("讀取終端機事件失敗"),
                    None => break Ok(()),
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key),
            Event::Resize => {}
        }
    };

    restore().context("還原終端機失敗")?;
    result
}
