use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::error::FetchError;
use crate::fetch::{MemoizedSource, PayloadSource};
use crate::pipeline::{PlayerTable, build_player_table};
use crate::schedule::ScheduleOptions;
use crate::state::{Delta, ProviderCommand};

const MIN_REFRESH: Duration = Duration::from_secs(30);

/// Fetch then transform. A fetch failure aborts before any transformation.
pub fn load_player_table(
    source: &dyn PayloadSource,
    opts: &ScheduleOptions,
) -> Result<PlayerTable, FetchError> {
    let raw = source.fetch()?;
    Ok(build_player_table(&raw, opts))
}

/// Runs fetch + transform off the UI thread. Loads once at startup, again on
/// every `Refresh`, and again whenever the memoized payloads could have
/// expired.
pub fn spawn_provider<S>(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    source: MemoizedSource<S>,
    opts: ScheduleOptions,
    ttl: Duration,
) -> thread::JoinHandle<()>
where
    S: PayloadSource + 'static,
{
    thread::spawn(move || {
        let idle = ttl.max(MIN_REFRESH);
        if !refresh(&tx, &source, &opts) {
            return;
        }

        loop {
            let force = match cmd_rx.recv_timeout(idle) {
                Ok(ProviderCommand::Refresh { force }) => force,
                Err(RecvTimeoutError::Timeout) => false,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if force {
                source.invalidate();
            }
            if !refresh(&tx, &source, &opts) {
                break;
            }
        }
        tracing::debug!("provider thread exiting");
    })
}

// Returns false once the UI side has hung up.
fn refresh<S: PayloadSource>(
    tx: &Sender<Delta>,
    source: &MemoizedSource<S>,
    opts: &ScheduleOptions,
) -> bool {
    let delta = match load_player_table(source, opts) {
        Ok(table) => Delta::SetTable(Box::new(table)),
        Err(err) => {
            tracing::error!(error = %err, "fetch failed");
            Delta::FetchFailed(err.to_string())
        }
    };
    tx.send(delta).is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;

    use super::*;
    use crate::payload::RawPayloads;

    struct Failing;

    impl PayloadSource for Failing {
        fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
            Err(FetchError::Status {
                url: "http://fpl.test/bootstrap-static/".to_string(),
                status: 500,
            })
        }
    }

    struct Empty;

    impl PayloadSource for Empty {
        fn fetch(&self) -> Result<Arc<RawPayloads>, FetchError> {
            Ok(Arc::new(RawPayloads::default()))
        }
    }

    #[test]
    fn fetch_failure_surfaces_as_delta() {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let handle = spawn_provider(
            tx,
            cmd_rx,
            MemoizedSource::new(Failing, Duration::from_secs(60)),
            ScheduleOptions::default(),
            Duration::from_secs(60),
        );
        match rx.recv().unwrap() {
            Delta::FetchFailed(msg) => assert!(msg.contains("500")),
            other => panic!("unexpected delta: {other:?}"),
        }
        drop(cmd_tx);
        handle.join().unwrap();
    }

    #[test]
    fn refresh_command_reloads_table() {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let handle = spawn_provider(
            tx,
            cmd_rx,
            MemoizedSource::new(Empty, Duration::from_secs(60)),
            ScheduleOptions::default(),
            Duration::from_secs(60),
        );
        assert!(matches!(rx.recv().unwrap(), Delta::SetTable(_)));
        cmd_tx.send(ProviderCommand::Refresh { force: true }).unwrap();
        assert!(matches!(rx.recv().unwrap(), Delta::SetTable(_)));
        drop(cmd_tx);
        handle.join().unwrap();
    }
}
