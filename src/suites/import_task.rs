use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::behaviors::{ImagesBehaviors, display_opt};
use crate::check::{CheckFailure, expect_no_errors, expect_status, field_error, take_entity};
use crate::runner::{CaseDef, Suite};
use crate::{Fixture, Gate, ResourcePool, Task, TaskInput, TaskStatus, TaskType};

pub const SUITE_NAME: &str = "import-task";

pub const CREATE_IMPORT_TASK: &str = "test_create_import_task";
pub const DUPLICATE_IMPORT_TASK: &str = "test_attempt_duplicate_import_task";

pub const CASES: &[CaseDef] = &[
    CaseDef {
        name: CREATE_IMPORT_TASK,
        tags: &["smoke"],
        gate: Gate::KnownDefect("Bug, Redmine #4241"),
    },
    CaseDef {
        name: DUPLICATE_IMPORT_TASK,
        tags: &["positive", "regression"],
        gate: Gate::Always,
    },
];

/// Values a freshly created import task must report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportExpectations {
    pub import_from: String,
    pub import_from_format: String,
    pub max_created_at_delta: i64,
    pub max_updated_at_delta: i64,
    pub owner: String,
}

impl ImportExpectations {
    pub fn from_fixture(fixture: &Fixture) -> Self {
        let config = &fixture.config;
        Self {
            import_from: config.import_from.clone(),
            import_from_format: config.import_from_format.clone(),
            max_created_at_delta: config.max_created_at_delta,
            max_updated_at_delta: config.max_updated_at_delta,
            owner: fixture.tenant_id().to_string(),
        }
    }

    pub fn input(&self) -> TaskInput {
        TaskInput::import(&self.import_from, &self.import_from_format)
    }
}

/// Field-level checks for a new import task, one message per violated
/// condition. `created_at_secs` is the UTC epoch second captured right after
/// the creation call returned.
pub fn specific_task_property_errors(
    task: &Task,
    created_at_secs: i64,
    expect: &ImportExpectations,
) -> Vec<String> {
    let mut errors = Vec::new();

    if task.status != Some(TaskStatus::Pending) {
        errors.push(field_error(
            "status",
            TaskStatus::Pending,
            display_opt(&task.status),
        ));
    }
    if let Some(err) = delta_error(
        "created_at delta",
        task.created_at.as_ref(),
        created_at_secs,
        expect.max_created_at_delta,
    ) {
        errors.push(err);
    }

    let input = task.input.clone().unwrap_or_default();
    if !input.image_properties.is_empty() {
        errors.push(field_error(
            "image_properties",
            "{}",
            serde_json::Value::Object(input.image_properties.clone()),
        ));
    }
    if input.import_from.as_deref() != Some(expect.import_from.as_str()) {
        errors.push(field_error(
            "import_from",
            &expect.import_from,
            display_opt(&input.import_from),
        ));
    }
    if input.import_from_format.as_deref() != Some(expect.import_from_format.as_str()) {
        errors.push(field_error(
            "import_from_format",
            &expect.import_from_format,
            display_opt(&input.import_from_format),
        ));
    }

    if let Some(err) = delta_error(
        "updated_at delta",
        task.updated_at.as_ref(),
        created_at_secs,
        expect.max_updated_at_delta,
    ) {
        errors.push(err);
    }
    if task.kind != Some(TaskType::Import) {
        errors.push(field_error("type", TaskType::Import, display_opt(&task.kind)));
    }
    if let Some(result) = &task.result {
        errors.push(field_error("result", "None", result));
    }
    if task.owner.as_deref() != Some(expect.owner.as_str()) {
        errors.push(field_error("owner", &expect.owner, display_opt(&task.owner)));
    }

    errors
}

fn delta_error(
    field: &str,
    timestamp: Option<&DateTime<Utc>>,
    reference_secs: i64,
    max_delta: i64,
) -> Option<String> {
    match timestamp {
        None => Some(field_error(field, format!("<= {max_delta}"), "missing timestamp")),
        Some(ts) => {
            let delta = ImagesBehaviors::get_creation_delta(reference_secs, ts);
            (delta > max_delta).then(|| field_error(field, format!("<= {max_delta}"), delta))
        }
    }
}

pub struct ImportTaskSuite {
    fixture: Fixture,
    expect: ImportExpectations,
}

impl ImportTaskSuite {
    pub fn new(fixture: Fixture) -> Self {
        let expect = ImportExpectations::from_fixture(&fixture);
        Self { fixture, expect }
    }

    pub async fn test_create_import_task(&self) -> Result<(), CheckFailure> {
        let resp = self
            .fixture
            .client
            .create_task(self.expect.input(), TaskType::Import)
            .await?;
        let created_at_secs = Utc::now().timestamp();
        expect_status(&resp, 201)?;
        let task = take_entity(resp, "task")?;

        let mut errors = self.fixture.behaviors.validate_task(&task);
        errors.extend(specific_task_property_errors(
            &task,
            created_at_secs,
            &self.expect,
        ));
        expect_no_errors(errors)
    }

    pub async fn test_attempt_duplicate_import_task(&self) -> Result<(), CheckFailure> {
        let resp = self
            .fixture
            .client
            .create_task(self.expect.input(), TaskType::Import)
            .await?;
        expect_status(&resp, 201)?;
        let task = take_entity(resp, "task")?;

        let resp = self
            .fixture
            .client
            .create_task(self.expect.input(), TaskType::Import)
            .await?;
        expect_status(&resp, 201)?;
        let alt_task = take_entity(resp, "task")?;

        if task == alt_task {
            return Err(CheckFailure::Assertion(format!(
                "duplicate import request returned the same task `{}`",
                task.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Suite for ImportTaskSuite {
    fn name(&self) -> &'static str {
        SUITE_NAME
    }

    fn cases(&self) -> &'static [CaseDef] {
        CASES
    }

    fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    async fn run_case(
        &mut self,
        case: &str,
        _resources: &mut ResourcePool,
    ) -> Result<(), CheckFailure> {
        match case {
            CREATE_IMPORT_TASK => self.test_create_import_task().await,
            DUPLICATE_IMPORT_TASK => self.test_attempt_duplicate_import_task().await,
            other => Err(CheckFailure::Precondition(format!(
                "unknown case `{other}` in {SUITE_NAME}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn expectations() -> ImportExpectations {
        ImportExpectations {
            import_from: "swift://cloudfiles/images/cirros.qcow2".into(),
            import_from_format: "qcow2".into(),
            max_created_at_delta: 60,
            max_updated_at_delta: 60,
            owner: "tenant-a".into(),
        }
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn good_task(expect: &ImportExpectations) -> Task {
        Task {
            id: "1b0f2a39-3c2e-4f1b-9f3c-6f1e5d2a8c11".into(),
            kind: Some(TaskType::Import),
            status: Some(TaskStatus::Pending),
            input: Some(expect.input()),
            result: None,
            owner: Some(expect.owner.clone()),
            created_at: Some(created_at()),
            updated_at: Some(created_at()),
            ..Default::default()
        }
    }

    #[test]
    fn matching_task_yields_no_errors() {
        let expect = expectations();
        let task = good_task(&expect);
        let errors = specific_task_property_errors(&task, created_at().timestamp() + 2, &expect);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn every_violation_is_reported() {
        let expect = expectations();
        let mut task = good_task(&expect);
        task.status = Some(TaskStatus::Success);
        task.created_at = Some(created_at() - chrono::Duration::seconds(300));
        task.input = Some(TaskInput {
            image_properties: json!({"os": "linux"}).as_object().unwrap().clone(),
            import_from: Some("http://elsewhere".into()),
            import_from_format: Some("vhd".into()),
        });
        task.updated_at = None;
        task.kind = Some(TaskType::Export);
        task.result = Some(json!({"image_id": "abc"}));
        task.owner = Some("tenant-b".into());

        let errors = specific_task_property_errors(&task, created_at().timestamp(), &expect);
        assert_eq!(errors.len(), 9, "{errors:#?}");
        assert_eq!(
            errors[0],
            "Unexpected status value received. Expected: pending Received: success"
        );
        assert_eq!(
            errors[1],
            "Unexpected created_at delta value received. Expected: <= 60 Received: 300"
        );
        assert!(errors[8].contains("tenant-b"));
    }

    #[test]
    fn single_violation_yields_single_message() {
        let expect = expectations();
        let mut task = good_task(&expect);
        task.owner = None;
        let errors = specific_task_property_errors(&task, created_at().timestamp(), &expect);
        assert_eq!(
            errors,
            vec!["Unexpected owner value received. Expected: tenant-a Received: None".to_string()]
        );
    }

    #[test]
    fn delta_at_tolerance_passes() {
        let expect = expectations();
        let task = good_task(&expect);
        let errors = specific_task_property_errors(&task, created_at().timestamp() + 60, &expect);
        assert!(errors.is_empty());
        let errors = specific_task_property_errors(&task, created_at().timestamp() + 61, &expect);
        assert_eq!(errors.len(), 2);
    }
}
