use std::fmt;

use crate::runner::{CaseDef, Suite};
use crate::{Fixture, Gate, ImagesError, SmokeConfig};

pub mod image_operations;
pub mod import_task;

pub use image_operations::ImageOperationsSmoke;
pub use import_task::{ImportExpectations, ImportTaskSuite, specific_task_property_errors};

/// Every suite shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SuiteKind {
    ImageOperations,
    ImportTask,
}

impl SuiteKind {
    pub const ALL: [SuiteKind; 2] = [SuiteKind::ImageOperations, SuiteKind::ImportTask];

    pub fn name(self) -> &'static str {
        match self {
            SuiteKind::ImageOperations => image_operations::SUITE_NAME,
            SuiteKind::ImportTask => import_task::SUITE_NAME,
        }
    }

    pub fn gate(self) -> Gate {
        match self {
            SuiteKind::ImageOperations => image_operations::SUITE_GATE,
            SuiteKind::ImportTask => Gate::Always,
        }
    }

    pub fn cases(self) -> &'static [CaseDef] {
        match self {
            SuiteKind::ImageOperations => image_operations::CASES,
            SuiteKind::ImportTask => import_task::CASES,
        }
    }

    /// Rejects configuration the suite cannot run with.
    pub fn check_config(self, config: &SmokeConfig) -> Result<(), ImagesError> {
        match self {
            SuiteKind::ImageOperations => Ok(()),
            SuiteKind::ImportTask if config.import_from.trim().is_empty() => {
                Err(ImagesError::Config(format!(
                    "{} needs import_from (IMAGES_IMPORT_FROM)",
                    import_task::SUITE_NAME
                )))
            }
            SuiteKind::ImportTask => Ok(()),
        }
    }

    pub fn build(self, fixture: Fixture) -> Box<dyn Suite> {
        match self {
            SuiteKind::ImageOperations => Box::new(ImageOperationsSmoke::new(fixture)),
            SuiteKind::ImportTask => Box::new(ImportTaskSuite::new(fixture)),
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImagesClientConfig;

    #[test]
    fn import_suite_needs_import_source() {
        let mut config = SmokeConfig::new(ImagesClientConfig::new("http://localhost", "t"));
        assert!(SuiteKind::ImageOperations.check_config(&config).is_ok());
        let err = SuiteKind::ImportTask.check_config(&config).unwrap_err();
        assert!(matches!(err, ImagesError::Config(ref m) if m.contains("IMAGES_IMPORT_FROM")));

        config.import_from = "swift://images/cirros.qcow2".into();
        assert!(SuiteKind::ImportTask.check_config(&config).is_ok());
    }
}
