//! `#[serde(with = "crate::serde_duration")]` for `Duration` fields stored as whole milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Delay {
        #[serde(with = "crate::serde_duration")]
        hold: Duration,
    }

    #[test]
    fn durations_are_whole_milliseconds() {
        let json = serde_json::to_string(&Delay {
            hold: Duration::from_micros(200_900),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"hold":200}"#);

        let back: Delay = serde_json::from_str(r#"{"hold":700}"#).expect("deserialize");
        assert_eq!(back.hold, Duration::from_millis(700));
    }
}
