use super::{CacheEvent, EventBroadcaster};

#[test]
fn send_without_subscribers_is_not_an_error() {
    let broadcaster = EventBroadcaster::new();
    let delivered = broadcaster.send(CacheEvent::Set { key: "k".into() });
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn subscribers_receive_events_in_order() {
    let broadcaster = EventBroadcaster::new();
    let mut rx = broadcaster.subscribe();

    broadcaster.send(CacheEvent::Set { key: "a".into() });
    broadcaster.send(CacheEvent::Hit { key: "a".into() });

    assert_eq!(rx.recv().await.unwrap(), CacheEvent::Set { key: "a".into() });
    assert_eq!(rx.recv().await.unwrap(), CacheEvent::Hit { key: "a".into() });
}

#[tokio::test]
async fn every_subscriber_sees_each_event() {
    let broadcaster = EventBroadcaster::new();
    let mut rx1 = broadcaster.subscribe();
    let mut rx2 = broadcaster.subscribe();

    let delivered = broadcaster.send(CacheEvent::Clean {
        removed_keys: vec!["k".into()],
        tags: Some(vec!["t".into()]),
    });
    assert_eq!(delivered, 2);

    let want = CacheEvent::Clean {
        removed_keys: vec!["k".into()],
        tags: Some(vec!["t".into()]),
    };
    assert_eq!(rx1.recv().await.unwrap(), want);
    assert_eq!(rx2.recv().await.unwrap(), want);
}
