//! Hierarchical field paths.

use std::fmt;

/// An immutable, dotted field path such as `location.x`.
///
/// Keys are value objects: two keys are equal iff their segment sequences are
/// equal. `then` produces a new child key and never mutates `self`.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataKey {
    segments: Vec<String>,
}

impl DataKey {
    /// Create a single-segment key. Dots are kept verbatim.
    pub fn of(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Create a key from a dotted path, splitting on `.`.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Create a key from explicit segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Return a new key with `segment` appended.
    pub fn then(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Return a new key with all segments of `other` appended.
    pub fn join(&self, other: &DataKey) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The path segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The first segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The key without its first segment.
    pub fn rest(&self) -> DataKey {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the key has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Join the segments with `separator`.
    pub fn as_string(&self, separator: &str) -> String {
        self.segments.join(separator)
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string("."))
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DataKey({})", self)
    }
}

impl From<&str> for DataKey {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Well-known field names of a stored record.
pub mod keys {
    use super::DataKey;

    pub const EVENT_NAME: &str = "event";
    pub const CREATED: &str = "created";
    pub const EXPIRES: &str = "expires";
    pub const PLAYER_ID: &str = "player";
    pub const CAUSE: &str = "cause";
    pub const TARGET: &str = "target";
    pub const ENTITY_TYPE: &str = "entity";
    pub const MESSAGE: &str = "message";
    pub const COUNT: &str = "count";
    pub const LOCATION: &str = "location";
    pub const WORLD: &str = "world";
    pub const X: &str = "x";
    pub const Y: &str = "y";
    pub const Z: &str = "z";
    pub const ITEM: &str = "item";
    pub const BLOCK: &str = "block";
    pub const META: &str = "meta";
    pub const NAME: &str = "name";
    pub const LORE: &str = "lore";
    pub const RECIPIENT: &str = "recipient";
    pub const IP_ADDRESS: &str = "ip";

    pub fn event_name() -> DataKey {
        DataKey::of(EVENT_NAME)
    }

    pub fn created() -> DataKey {
        DataKey::of(CREATED)
    }

    pub fn player_id() -> DataKey {
        DataKey::of(PLAYER_ID)
    }

    pub fn recipient() -> DataKey {
        DataKey::of(RECIPIENT)
    }

    /// `item.<field>`
    pub fn item(field: &str) -> DataKey {
        DataKey::of(ITEM).then(field)
    }

    pub fn cause() -> DataKey {
        DataKey::of(CAUSE)
    }

    pub fn message() -> DataKey {
        DataKey::of(MESSAGE)
    }

    pub fn count() -> DataKey {
        DataKey::of(COUNT)
    }

    /// `location.<axis>`
    pub fn location(axis: &str) -> DataKey {
        DataKey::of(LOCATION).then(axis)
    }
}
