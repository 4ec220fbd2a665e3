// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

//! Log output verification

use std::sync::{Arc, Mutex};
use tally_core::{Coordinator, CoordinatorConfig, ManualScheduler};

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` under a TRACE subscriber, returning everything it logged
fn logged<T>(f: impl FnOnce() -> T) -> (String, T) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (text, result)
}

#[test]
fn lifecycle_is_logged_with_coordinator_name() {
    let (logs, _) = logged(|| {
        let scheduler = ManualScheduler::new();
        let config = CoordinatorConfig::new()
            .with_name("nightly-sync")
            .with_events(["pull"]);
        let wait = Coordinator::with_config(scheduler.clone(), config).unwrap();

        wait.after(["pull"], || ()).unwrap();
        wait.finalize(|_| {}).unwrap();
        wait.finished_events(["pull"]).unwrap();
        scheduler.run_until_idle()
    });

    assert!(logs.contains("coordinator=nightly-sync"), "logs: {logs}");
    assert!(logs.contains("events registered"), "logs: {logs}");
    assert!(logs.contains("continuation registered"), "logs: {logs}");
    assert!(logs.contains("finalize attached"), "logs: {logs}");
    assert!(logs.contains("running continuation"), "logs: {logs}");
    assert!(logs.contains("finalized"), "logs: {logs}");
}

#[test]
fn captured_errors_are_logged_as_warnings() {
    let (logs, fired) = logged(|| {
        let scheduler = ManualScheduler::new();
        let wait = Coordinator::new(scheduler.clone());
        let failing = wait
            .callback(|_: ()| Err::<(), _>("disk full"))
            .unwrap();

        let fired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&fired);
        wait.finalize(move |errors| *flag.lock().unwrap() = errors.is_some())
            .unwrap();
        failing(());
        scheduler.run_until_idle();
        let fired = *fired.lock().unwrap();
        fired
    });

    assert!(fired);
    assert!(logs.contains("WARN"), "logs: {logs}");
    assert!(logs.contains("task error captured"), "logs: {logs}");
    assert!(logs.contains("disk full"), "logs: {logs}");
}
