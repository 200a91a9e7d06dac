/// One-shot HTTP fallback fetch
///
/// Fired concurrently with the first connection attempt so the dashboard
/// has data to show before the stream delivers its snapshot. Both
/// requests run concurrently and independently; failures are logged and
/// swallowed, never surfaced to the presentation layer.

use anyhow::Result;

use crate::api::{ActionsResponse, BotStateResponse};
use crate::settings::Config;
use crate::view::SharedView;

pub async fn fetch_once(
    cfg: Config,
    view: SharedView,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
) {
    if cfg.state_url.is_none() && cfg.actions_url.is_none() {
        return;
    }

    let client = match reqwest::Client::builder().no_proxy().build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to build fallback HTTP client: {}", e);
            return;
        }
    };

    let (state_result, actions_result) = tokio::join!(
        fetch_state(&client, cfg.state_url.as_deref()),
        fetch_actions(&client, cfg.actions_url.as_deref()),
    );

    // The client may have stopped while the requests were in flight;
    // discard the results rather than mutate a dead view
    if *shutdown_rx.borrow() {
        return;
    }

    match state_result {
        Ok(Some(response)) => {
            if let Some(state) = response.state {
                view.update(|v| v.apply_fallback_state(state)).await;
            }
        }
        Ok(None) => {}
        Err(e) => eprintln!("Warning: fallback state fetch failed: {}", e),
    }

    match actions_result {
        Ok(Some(response)) => {
            if !response.actions.is_empty() {
                view.update(|v| v.apply_fallback_actions(response.actions))
                    .await;
            }
        }
        Ok(None) => {}
        Err(e) => eprintln!("Warning: fallback actions fetch failed: {}", e),
    }
}

async fn fetch_state(
    client: &reqwest::Client,
    url: Option<&str>,
) -> Result<Option<BotStateResponse>> {
    let Some(url) = url else { return Ok(None) };
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(Some(response.json().await?))
}

async fn fetch_actions(
    client: &reqwest::Client,
    url: Option<&str>,
) -> Result<Option<ActionsResponse>> {
    let Some(url) = url else { return Ok(None) };
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(Some(response.json().await?))
}
