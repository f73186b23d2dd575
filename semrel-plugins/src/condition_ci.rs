//! Built-in `verifyConditions` strategy: only release from CI builds of the
//! release branch.

use async_trait::async_trait;
use semrel_core::error::{Error, Result};
use semrel_core::plugin::{Verify, VerifyContext};

pub const NAME: &str = "condition-ci";

fn failure(message: String) -> Error {
    Error::Verification {
        plugin: NAME.to_string(),
        message,
    }
}

/// Fails unless running on CI, outside a pull request, on the configured
/// branch.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionCi;

#[async_trait]
impl Verify for ConditionCi {
    async fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        let config = ctx.config;

        if !config.ci {
            return Err(failure(
                "not running on CI; semantic releases are only made from CI builds".to_string(),
            ));
        }

        if config.pull_request {
            return Err(failure(
                "this build was triggered by a pull request".to_string(),
            ));
        }

        if let Some(branch) = &config.ci_branch {
            if branch != &config.branch {
                return Err(failure(format!(
                    "this build is on branch \"{}\" but releases are made from \"{}\"",
                    branch, config.branch
                )));
            }
        }

        Ok(())
    }
}
