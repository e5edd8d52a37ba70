use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::error::ControllerError;

/// Whether the controller also drives the page scroll lock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OverflowPolicy {
    /// Lock scrolling while the dialog is open.
    #[default]
    Auto,
    /// Leave the page style alone.
    Manual,
}

impl OverflowPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            OverflowPolicy::Auto => "auto",
            OverflowPolicy::Manual => "manual",
        }
    }

    pub fn manages_scroll_lock(self) -> bool {
        self == OverflowPolicy::Auto
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowPolicy {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OverflowPolicy::Auto),
            "manual" => Ok(OverflowPolicy::Manual),
            _ => Err(ControllerError::InvalidArgument(
                "invalid overflow argument".into(),
            )),
        }
    }
}

impl TryFrom<&str> for OverflowPolicy {
    type Error = ControllerError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Optional controller settings.
#[derive(Clone, Default)]
pub struct ControllerOptions {
    /// Called every time the controller clears the hash on the dialog's
    /// behalf.
    pub on_hash_removal: Option<Rc<dyn Fn()>>,
}

impl ControllerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_hash_removal(mut self, f: impl Fn() + 'static) -> Self {
        self.on_hash_removal = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for ControllerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerOptions")
            .field("on_hash_removal", &self.on_hash_removal.is_some())
            .finish()
    }
}
