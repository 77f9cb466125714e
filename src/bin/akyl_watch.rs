//! Keeps a session online and logs everything the backend pushes.
//!
//! Usage: `akyl-watch [team-id]`. Without a team id the user's personal
//! board is watched. A stored session is reused; otherwise `AKYL_USERNAME`
//! and `AKYL_PASSWORD` are used to log in.

use anyhow::{bail, Context};

use akyl_client::router::Page;
use akyl_client::store::keys;
use akyl_client::{config, logs, App, AppEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config();
    let log_file = logs::init_logging(&config.data_dir()).context("logging setup failed")?;
    eprintln!("logging to {}", log_file.display());

    let team_id = match std::env::args().nth(1) {
        Some(arg) => Some(arg.parse::<i64>().with_context(|| format!("not a team id: {arg}"))?),
        None => None,
    };

    let mut app = App::open(config).context("failed to open local store")?;
    let user = match app.resume().await {
        Some(user) => user,
        None => match (std::env::var("AKYL_USERNAME"), std::env::var("AKYL_PASSWORD")) {
            (Ok(name), Ok(password)) => app.login(&name, &password).await.context("login failed")?,
            _ => bail!("no stored session; set AKYL_USERNAME and AKYL_PASSWORD to log in"),
        },
    };
    tracing::info!("watching as {} ({} XP)", user.username, user.xp);

    if let Some(id) = team_id {
        app.store().set(keys::KANBAN_TEAM, id.to_string())?;
        app.open_chat(id).await?;
    }
    // The kanban page stays "visible" so every change refetches the board.
    app.show_page(Page::Kanban).await;
    for toast in app.take_toasts() {
        tracing::warn!("{:?}: {}", toast.level, toast.text);
    }
    if let Some(room) = app.kanban().room() {
        tracing::info!("kanban room {room}, {} tasks", app.board.total());
    }

    loop {
        tokio::select! {
            event = app.next_event() => {
                let Some(event) = event else { break };
                log_event(&event);
                app.handle_event(event).await;
                for toast in app.take_toasts() {
                    tracing::info!("toast {:?}: {}", toast.level, toast.text);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    app.presence().stop();
    app.chat().close().await;
    app.kanban().disconnect().await;
    Ok(())
}

fn log_event(event: &AppEvent) {
    match serde_json::to_string(event) {
        Ok(json) => tracing::info!("event {json}"),
        Err(e) => tracing::warn!("unprintable event: {e}"),
    }
}
