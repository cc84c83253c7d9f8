//! Broadcast channel for progress records
//!
//! Every subscriber sees every record published after it subscribed, in
//! publication order. A subscriber that falls more than the channel capacity
//! behind loses the oldest records; the loss is logged and reading resumes at
//! the oldest record still buffered.

use crate::config::settings::DEFAULT_PROGRESS_CAPACITY;
use crate::progress::types::ProgressRecord;
use futures::Stream;
use log::{trace, warn};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Publishing side, shared by the pipeline and anything else that reports progress
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    sender: broadcast::Sender<ProgressRecord>,
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_CAPACITY)
    }
}

impl ProgressChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish to current subscribers; with none, the record is dropped
    pub fn publish(&self, record: ProgressRecord) {
        trace!(
            "progress {} {} {}%",
            record.file_name,
            record.status(),
            record.progress
        );
        let _ = self.sender.send(record);
    }

    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving side; dropping it releases the subscription
#[derive(Debug)]
pub struct ProgressSubscription {
    receiver: broadcast::Receiver<ProgressRecord>,
}

impl ProgressSubscription {
    /// Wait for the next record. `None` once every publisher is gone.
    pub async fn recv(&mut self) -> Option<ProgressRecord> {
        loop {
            match self.receiver.recv().await {
                Ok(record) => return Some(record),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Progress subscriber lagged, {} records dropped", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered record without waiting
    pub fn try_recv(&mut self) -> Option<ProgressRecord> {
        loop {
            match self.receiver.try_recv() {
                Ok(record) => return Some(record),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Progress subscriber lagged, {} records dropped", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Everything currently buffered, oldest first
    pub fn drain(&mut self) -> Vec<ProgressRecord> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn into_stream(self) -> impl Stream<Item = ProgressRecord> {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|record| (record, subscription))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_publish_without_subscribers() {
        let channel = ProgressChannel::default();
        assert_eq!(channel.subscriber_count(), 0);
        channel.publish(ProgressRecord::pending("a.png"));
    }

    #[test]
    fn test_every_subscriber_sees_every_record() {
        let channel = ProgressChannel::new(8);
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        channel.publish(ProgressRecord::pending("a.png"));
        channel.publish(ProgressRecord::uploading("a.png", 50));

        for sub in [&mut first, &mut second] {
            let records = sub.drain();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0], ProgressRecord::pending("a.png"));
            assert_eq!(records[1].progress, 50);
        }
    }

    #[test]
    fn test_late_subscriber_misses_earlier_records() {
        let channel = ProgressChannel::new(8);
        channel.publish(ProgressRecord::pending("a.png"));

        let mut late = channel.subscribe();
        assert!(late.try_recv().is_none());

        channel.publish(ProgressRecord::uploading("a.png", 10));
        assert_eq!(late.try_recv().unwrap().progress, 10);
    }

    #[test]
    fn test_lagged_subscriber_keeps_newest() {
        let channel = ProgressChannel::new(2);
        let mut sub = channel.subscribe();
        for pct in [10u8, 20, 30, 40] {
            channel.publish(ProgressRecord::uploading("big.bin", pct));
        }

        let seen: Vec<u8> = sub.drain().into_iter().map(|r| r.progress).collect();
        assert_eq!(seen, vec![30, 40]);
    }

    #[test]
    fn test_dropping_subscription_releases_it() {
        let channel = ProgressChannel::default();
        let sub = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);
        drop(sub);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_when_publishers_drop() {
        let channel = ProgressChannel::new(4);
        let stream = channel.subscribe().into_stream();
        channel.publish(ProgressRecord::pending("a.png"));
        channel.publish(ProgressRecord::error("a.png", "boom"));
        drop(channel);

        let records: Vec<ProgressRecord> = stream.collect().await;
        assert_eq!(records.len(), 2);
        assert!(records[1].is_terminal());
    }
}
