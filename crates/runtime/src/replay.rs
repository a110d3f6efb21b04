//! Event-log replay and live tailing.

use async_stream::stream;
use dugong_core::{StreamEvent, TaskHandle};
use futures_core::Stream;
use std::time::Duration;

/// How often the tail loop re-checks the log while the task is live.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stream a task's events from the log, then tail until the task is
/// terminal.
///
/// `after` is the sequence number of the last event the caller already
/// has; `None` replays from the start. Replaying a terminal task never
/// sleeps, and two replays of the same terminal task yield identical
/// sequences.
pub(crate) fn open_stream(
    task: TaskHandle,
    after: Option<u64>,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    stream! {
        let mut cursor = after.map_or(0, |n| {
            usize::try_from(n.saturating_add(1)).unwrap_or(usize::MAX)
        });
        loop {
            for event in task.events_from(cursor) {
                cursor += 1;
                yield event;
            }
            if task.is_terminal() {
                // Catch anything appended between the last read and
                // the terminal flip.
                for event in task.events_from(cursor) {
                    yield event;
                }
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
