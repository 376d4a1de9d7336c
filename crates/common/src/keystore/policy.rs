use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use super::KeyStoreError;

/// When a stored private key may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Only while the store is unlocked; never migrates off this device
    #[default]
    WhenUnlockedThisDeviceOnly,
    /// Any time after the store has been unlocked once; never migrates off this device
    AfterFirstUnlockThisDeviceOnly,
}

impl Accessibility {
    pub(crate) fn as_byte(self) -> u8 {
        match self {
            Accessibility::WhenUnlockedThisDeviceOnly => 1,
            Accessibility::AfterFirstUnlockThisDeviceOnly => 2,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Accessibility::WhenUnlockedThisDeviceOnly),
            2 => Some(Accessibility::AfterFirstUnlockThisDeviceOnly),
            _ => None,
        }
    }
}

/// Operations a stored private key may take part in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyUsage(u8);

impl KeyUsage {
    /// The private key may be used for key agreement (and therefore unwrap)
    pub const PRIVATE_KEY_USAGE: KeyUsage = KeyUsage(0b0000_0001);

    const ALL: u8 = Self::PRIVATE_KEY_USAGE.0;

    pub const fn empty() -> Self {
        KeyUsage(0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: KeyUsage) -> bool {
        self.0 & other.0 == other.0
    }

    pub(crate) fn bits(self) -> u8 {
        self.0
    }

    pub(crate) fn from_bits(bits: u8) -> Option<Self> {
        (bits & !Self::ALL == 0).then_some(KeyUsage(bits))
    }
}

impl BitOr for KeyUsage {
    type Output = KeyUsage;
    fn bitor(self, rhs: KeyUsage) -> KeyUsage {
        KeyUsage(self.0 | rhs.0)
    }
}

/// Access-control policy attached to a private key at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    accessibility: Accessibility,
    usage: KeyUsage,
}

impl AccessPolicy {
    /// Build a policy
    ///
    /// # Errors
    ///
    /// A key nothing may use cannot be created, so an empty usage set is rejected.
    pub fn new(accessibility: Accessibility, usage: KeyUsage) -> Result<Self, KeyStoreError> {
        if usage.is_empty() {
            return Err(KeyStoreError::InvalidPolicy(
                "usage flags must not be empty".to_string(),
            ));
        }
        Ok(Self {
            accessibility,
            usage,
        })
    }

    /// Usable only while unlocked, for private-key operations only
    pub fn device_unlocked() -> Self {
        Self {
            accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
            usage: KeyUsage::PRIVATE_KEY_USAGE,
        }
    }

    pub fn accessibility(&self) -> Accessibility {
        self.accessibility
    }

    pub fn usage(&self) -> KeyUsage {
        self.usage
    }
}
