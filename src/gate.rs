use std::fmt;

use serde::{Deserialize, Serialize};

/// Reason reported when an endpoint capability is switched off.
pub const DISABLED_REASON: &str = "Functionality disabled with provided endpoint";

/// Endpoint operation that may be disabled for the environment under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    PostImages,
    PutImageFile,
    GetImageFile,
}

impl Capability {
    pub fn flag_name(self) -> &'static str {
        match self {
            Capability::PostImages => "allow_post_images",
            Capability::PutImageFile => "allow_put_image_file",
            Capability::GetImageFile => "allow_get_image_file",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Capability flags of the endpoint. Unset flags count as enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default = "enabled")]
    pub allow_post_images: bool,
    #[serde(default = "enabled")]
    pub allow_put_image_file: bool,
    #[serde(default = "enabled")]
    pub allow_get_image_file: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            allow_post_images: true,
            allow_put_image_file: true,
            allow_get_image_file: true,
        }
    }
}

impl Capabilities {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::PostImages => self.allow_post_images,
            Capability::PutImageFile => self.allow_put_image_file,
            Capability::GetImageFile => self.allow_get_image_file,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Static precondition attached to a suite or a case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Every listed capability must be enabled.
    Requires(&'static [Capability]),
    /// Never runs; the string points at the tracker entry.
    KnownDefect(&'static str),
}

impl Gate {
    /// Returns the skip reason, or `None` when the body may run.
    pub fn skip_reason(&self, capabilities: &Capabilities) -> Option<String> {
        match self {
            Gate::Always => None,
            Gate::Requires(required) => {
                if required.iter().all(|c| capabilities.allows(*c)) {
                    None
                } else {
                    Some(DISABLED_REASON.to_string())
                }
            }
            Gate::KnownDefect(reference) => Some((*reference).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: &[Capability] = &[Capability::PutImageFile, Capability::GetImageFile];

    #[test]
    fn requirements_combine_with_and() {
        let mut caps = Capabilities::default();
        assert_eq!(Gate::Requires(BOTH).skip_reason(&caps), None);

        caps.allow_get_image_file = false;
        assert_eq!(
            Gate::Requires(BOTH).skip_reason(&caps).as_deref(),
            Some(DISABLED_REASON)
        );
        assert_eq!(
            Gate::Requires(&[Capability::PutImageFile]).skip_reason(&caps),
            None
        );
    }

    #[test]
    fn known_defect_always_skips() {
        let gate = Gate::KnownDefect("Bug, Redmine #4241");
        assert_eq!(
            gate.skip_reason(&Capabilities::default()).as_deref(),
            Some("Bug, Redmine #4241")
        );
    }
}
