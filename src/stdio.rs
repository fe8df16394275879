//! Line-delimited JSON front end for the command layer.
//!
//! Each input line is `{"id"?, "command", "args"?}`; each output line is
//! `{"id", "ok": true, "data"}` or `{"id", "ok": false, "error"}`.

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    aggregation::commands as aggregation,
    db::models::{Round, SessionLabel},
    ingest::commands as ingest,
    labels::commands as labels,
    settings::EngineSettings,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    pub command: String,
    #[serde(default)]
    pub args: Value,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Option<Value>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionArgs {
    session_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoundFilterArgs {
    session_id: String,
    #[serde(default)]
    round: Option<Round>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoundArgs {
    session_id: String,
    round: Round,
}

#[derive(Deserialize)]
struct SettingsArgs {
    settings: EngineSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelArgs {
    session_id: String,
    label: SessionLabel,
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    // A missing `args` arrives as null; treat it as an empty object.
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| format!("invalid arguments: {e}"))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Route one command to its handler.
pub async fn dispatch(state: &AppState, command: &str, args: Value) -> Result<Value, String> {
    match command {
        "create_session" => to_value(ingest::create_session(state, parse_args(args)?).await?),
        "get_session" => {
            let SessionArgs { session_id } = parse_args(args)?;
            to_value(ingest::get_session(state, session_id).await?)
        }
        "delete_session" => {
            let SessionArgs { session_id } = parse_args(args)?;
            to_value(ingest::delete_session(state, session_id).await?)
        }
        "submit_samples" => to_value(ingest::submit_samples(state, parse_args(args)?).await?),
        "submit_attempts" => to_value(ingest::submit_attempts(state, parse_args(args)?).await?),
        "get_samples" => {
            let RoundFilterArgs { session_id, round } = parse_args(args)?;
            to_value(ingest::get_samples(state, session_id, round).await?)
        }
        "get_attempts" => {
            let RoundFilterArgs { session_id, round } = parse_args(args)?;
            to_value(ingest::get_attempts(state, session_id, round).await?)
        }
        "flush_ingest" => to_value(ingest::flush_ingest(state).await?),
        "get_ingest_metrics" => to_value(ingest::get_ingest_metrics(state).await?),
        "compute_round_summary" => {
            to_value(aggregation::compute_round_summary(state, parse_args(args)?).await?)
        }
        "compute_session_summary" => {
            to_value(aggregation::compute_session_summary(state, parse_args(args)?).await?)
        }
        "get_round_summary" => {
            let RoundArgs { session_id, round } = parse_args(args)?;
            to_value(aggregation::get_round_summary(state, session_id, round).await?)
        }
        "get_session_summary" => {
            let SessionArgs { session_id } = parse_args(args)?;
            to_value(aggregation::get_session_summary(state, session_id).await?)
        }
        "update_session_label" => {
            let LabelArgs { session_id, label } = parse_args(args)?;
            to_value(labels::update_session_label(state, session_id, label).await?)
        }
        "query_training_data" => {
            to_value(labels::query_training_data(state, parse_args(args)?).await?)
        }
        "get_settings" => to_value(crate::get_engine_settings(state).await?),
        "update_settings" => {
            let SettingsArgs { settings } = parse_args(args)?;
            to_value(crate::update_engine_settings(state, settings).await?)
        }
        other => Err(format!("unknown command: {other}")),
    }
}

pub async fn handle_line(state: &AppState, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            return Response {
                id: None,
                ok: false,
                data: None,
                error: Some(format!("malformed request: {err}")),
            }
        }
    };

    match dispatch(state, &request.command, request.args).await {
        Ok(data) => Response {
            id: request.id,
            ok: true,
            data: Some(data),
            error: None,
        },
        Err(error) => {
            log::warn!("command {} failed: {error}", request.command);
            Response {
                id: request.id,
                ok: false,
                data: None,
                error: Some(error),
            }
        }
    }
}

/// Serve requests from `input` until it reaches EOF.
pub async fn serve<R, W>(state: &AppState, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(state, &line).await;
        let mut encoded =
            serde_json::to_string(&response).context("failed to encode response")?;
        encoded.push('\n');
        output
            .write_all(encoded.as_bytes())
            .await
            .context("failed to write response")?;
        output.flush().await.context("failed to flush response")?;
    }
    Ok(())
}
