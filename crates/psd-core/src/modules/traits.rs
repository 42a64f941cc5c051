use crate::domain::{OutputArtifact, PsdResult};

pub trait ModuleExecutor {
    type Request;

    fn execute(&self, request: &Self::Request) -> PsdResult<Vec<OutputArtifact>>;
}

#[cfg(test)]
mod tests {
    use super::ModuleExecutor;
    use crate::domain::{OutputArtifact, PsdError, PsdErrorCategory, PsdResult};

    struct FailingExecutor;

    impl ModuleExecutor for FailingExecutor {
        type Request = String;

        fn execute(&self, _request: &String) -> PsdResult<Vec<OutputArtifact>> {
            Err(PsdError::computation(
                "RUN.MODULE",
                "module execution failed",
            ))
        }
    }

    #[test]
    fn module_executor_uses_shared_error_types() {
        let error = FailingExecutor
            .execute(&"run.pch".to_string())
            .expect_err("executor should fail");
        assert_eq!(error.category(), PsdErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.MODULE");
    }
}
