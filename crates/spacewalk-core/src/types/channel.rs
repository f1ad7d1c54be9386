//! Subscribed channels and root channel resolution.

use crate::error::{MethodError, MethodResult};

/// A content channel the system is subscribed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub label: String,
    /// Parent channel label, empty for a base channel
    pub parent_label: String,
}

impl Channel {
    pub fn new(label: impl Into<String>, parent_label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            parent_label: parent_label.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_label.is_empty()
    }
}

/// Ordered set of subscribed channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Label of the channel without a parent.
    ///
    /// When the server lists more than one base channel the last one wins.
    pub fn root_label(&self) -> MethodResult<&str> {
        self.channels
            .iter()
            .rev()
            .find(|c| c.is_root())
            .map(|c| c.label.as_str())
            .ok_or_else(|| MethodError::ChannelResolution {
                reason: format!(
                    "none of the {} subscribed channels is a base channel",
                    self.channels.len()
                ),
            })
    }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_label() {
        let set: ChannelSet = vec![
            Channel::new("prod-updates", "prod-x86_64"),
            Channel::new("prod-x86_64", ""),
            Channel::new("prod-tools", "prod-x86_64"),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.root_label().unwrap(), "prod-x86_64");
    }

    #[test]
    fn test_no_root_channel() {
        let set = ChannelSet::new(vec![Channel::new("child", "parent")]);
        assert!(matches!(
            set.root_label(),
            Err(MethodError::ChannelResolution { .. })
        ));
        assert!(ChannelSet::default().root_label().is_err());
    }

    #[test]
    fn test_last_root_wins() {
        let set = ChannelSet::new(vec![Channel::new("first", ""), Channel::new("second", "")]);
        assert_eq!(set.root_label().unwrap(), "second");
    }
}
