use adx_core::models::BidEvent;
use tokio::sync::broadcast;

/// How many notifications a slow subscriber may fall behind before it starts
/// missing them.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Fan-out of bid notifications to any number of subscribers.
///
/// Publishing never blocks and never fails: with no subscribers the event is
/// simply dropped, and lagging subscribers observe a gap.
#[derive(Debug)]
pub(crate) struct Notifier(broadcast::Sender<BidEvent>);

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self(sender)
    }

    pub fn publish(&self, event: impl Into<BidEvent>) {
        // an error only means nobody is listening
        let _ = self.0.send(event.into());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BidEvent> {
        self.0.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<BidEvent> {
        self.0.clone()
    }
}
