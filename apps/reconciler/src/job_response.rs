use std::process::ExitCode;

use principal_sync_core::{AppError, AppResult};
use principal_sync_domain::ReconciliationResult;
use serde::Serialize;

/// Response envelope printed at the end of every invocation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    status_code: u16,
    body: JobResponseBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum JobResponseBody {
    Success(ReconciliationResult),
    Failure(ErrorBody),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    message: String,
    error_type: &'static str,
}

impl JobResponse {
    pub fn from_result(result: AppResult<ReconciliationResult>) -> Self {
        match result {
            Ok(result) => Self {
                status_code: 200,
                body: JobResponseBody::Success(result),
            },
            Err(error) => Self::from_error(&error),
        }
    }

    fn from_error(error: &AppError) -> Self {
        Self {
            status_code: 500,
            body: JobResponseBody::Failure(ErrorBody {
                message: error.to_string(),
                error_type: error.error_type(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"statusCode":500,"body":{"message":"failed to render response","errorType":"internal_error"}}"#
                .to_owned()
        })
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use principal_sync_core::AppError;
    use principal_sync_domain::{PrincipalChange, ReconciliationResult};
    use serde_json::{Value, json};

    use super::JobResponse;

    fn rendered(response: &JobResponse) -> Value {
        serde_json::from_str(response.to_json_line().as_str()).unwrap_or(Value::Null)
    }

    #[test]
    fn success_renders_username_lists() {
        let mut result = ReconciliationResult::default();
        result.record_change("carol", PrincipalChange::Created);
        result.record_change("bob", PrincipalChange::Updated);
        result.record_deletion("alice");

        let response = JobResponse::from_result(Ok(result));
        assert!(response.is_success());
        assert_eq!(
            rendered(&response),
            json!({
                "statusCode": 200,
                "body": {"created": ["carol"], "updated": ["bob"], "deleted": ["alice"]}
            })
        );
    }

    #[test]
    fn failure_renders_message_and_error_type() {
        let response = JobResponse::from_result(Err(AppError::Configuration(
            "missing required environment variables: ENVIRONMENT".to_owned(),
        )));
        assert!(!response.is_success());
        assert_eq!(
            rendered(&response),
            json!({
                "statusCode": 500,
                "body": {
                    "message": "configuration error: missing required environment variables: ENVIRONMENT",
                    "errorType": "configuration_error"
                }
            })
        );
    }
}
