// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `mcnotify` binary, append to
//! a log file, and observe what arrives at a mock ntfy server.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use mcnotify::event::PlayerEvent;
use mcnotify_specs::{McnotifyBuilder, MockNtfy};

const TIMEOUT: Duration = Duration::from_secs(10);

fn append(path: &Path, text: &str) -> anyhow::Result<()> {
    let mut f = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(text.as_bytes())?;
    Ok(())
}

#[tokio::test]
async fn join_line_is_published_to_ntfy() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");
    append(&log, "[09:59:59] [Server thread/INFO]: Ghost joined the game\n")?;
    let ntfy = MockNtfy::start().await?;

    let proc = McnotifyBuilder::new(&log, ntfy.url()).env("NOTIFY_SUBJECT", "Survival").spawn()?;
    proc.wait_for_output("following log file", TIMEOUT).await?;

    append(&log, "[10:00:00] [Server thread/INFO]: Alice joined the game\n")?;

    let received = ntfy.wait_for(1, TIMEOUT).await?;
    assert_eq!(received.len(), 1, "history must not be replayed: {received:?}");
    assert_eq!(received[0].path, "/mc");
    assert_eq!(received[0].title.as_deref(), Some("Survival"));
    let expected = PlayerEvent::Join { player: "Alice".into(), server: None }.message();
    assert_eq!(received[0].body, expected);
    Ok(())
}

#[tokio::test]
async fn disabled_leave_is_not_published() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");
    append(&log, "")?;
    let ntfy = MockNtfy::start().await?;

    let proc = McnotifyBuilder::new(&log, ntfy.url()).env("NOTIFY_LEAVE", "false").spawn()?;
    proc.wait_for_output("following log file", TIMEOUT).await?;

    append(
        &log,
        "[10:00:00] [Server thread/INFO]: Bob left the game\n\
         [10:00:01] [Server thread/INFO]: Eve was kicked due to: You are not white-listed on this server!\n",
    )?;

    let received = ntfy.wait_for(1, TIMEOUT).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(ntfy.count().await, 1);
    assert_eq!(received[0].body, "Eve failed to join (not whitelisted)");
    Ok(())
}

#[tokio::test]
async fn velocity_grammar_names_the_backend() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");
    append(&log, "")?;
    let ntfy = MockNtfy::start().await?;

    let proc = McnotifyBuilder::new(&log, ntfy.url()).env("LOG_GRAMMAR", "velocity").spawn()?;
    proc.wait_for_output("following log file", TIMEOUT).await?;

    append(&log, "[10:00:00 INFO]: [server connection] Carol -> lobby has connected\n")?;

    let received = ntfy.wait_for(1, TIMEOUT).await?;
    assert_eq!(received[0].body, "Carol joined lobby");
    Ok(())
}

#[tokio::test]
async fn survives_rotation() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");
    append(&log, "")?;
    let ntfy = MockNtfy::start().await?;

    let proc = McnotifyBuilder::new(&log, ntfy.url()).spawn()?;
    proc.wait_for_output("following log file", TIMEOUT).await?;

    std::fs::rename(&log, dir.path().join("2026-10-18-1.log"))?;
    append(&log, "")?;
    proc.wait_for_output("following log file", TIMEOUT).await?;

    append(&log, "[10:00:00] [Server thread/INFO]: Dave joined the game\n")?;
    let received = ntfy.wait_for(1, TIMEOUT).await?;
    assert_eq!(received[0].body, "Dave joined the server");
    Ok(())
}

#[tokio::test]
async fn invalid_config_exits_with_status_2() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");

    let mut proc = McnotifyBuilder::new(&log, "http://127.0.0.1:9").env("NTFY_TOPIC", "").spawn()?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));

    let mut proc = McnotifyBuilder::new(&dir.path().join("missing/latest.log"), "http://127.0.0.1:9")
        .spawn()?;
    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(2));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn sigterm_exits_cleanly() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log = dir.path().join("latest.log");
    let ntfy = MockNtfy::start().await?;

    let mut proc = McnotifyBuilder::new(&log, ntfy.url()).spawn()?;
    proc.wait_for_output("starting mcnotify", TIMEOUT).await?;

    let killed = std::process::Command::new("kill")
        .args(["-TERM", &proc.pid().to_string()])
        .status()?;
    assert!(killed.success());

    let status = proc.wait_exit(TIMEOUT).await?;
    assert_eq!(status.code(), Some(0));
    Ok(())
}
