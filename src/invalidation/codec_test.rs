use super::{decode_tags, encode_tags, ChannelState, ChannelStateCell};

#[test]
fn encode_joins_with_commas() {
    let tags = vec!["users".to_string(), "sessions".to_string()];
    assert_eq!(encode_tags(&tags), "users,sessions");
    assert_eq!(encode_tags(&["solo".to_string()]), "solo");
}

#[test]
fn decode_splits_and_drops_empty_segments() {
    assert_eq!(
        decode_tags("users,sessions"),
        vec!["users".to_string(), "sessions".to_string()]
    );
    assert_eq!(decode_tags("users,,sessions,"), vec!["users", "sessions"]);
    assert!(decode_tags("").is_empty());
}

#[test]
fn codec_round_trips() {
    let tags = vec!["t1".to_string(), "t2".to_string(), "t3".to_string()];
    assert_eq!(decode_tags(&encode_tags(&tags)), tags);
}

#[test]
fn state_cell_starts_disconnected() {
    let cell = ChannelStateCell::default();
    assert_eq!(cell.get(), ChannelState::Disconnected);
}
