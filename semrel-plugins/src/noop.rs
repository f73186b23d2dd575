//! Strategy that accepts every release.

use async_trait::async_trait;
use semrel_core::error::Result;
use semrel_core::plugin::{Verify, VerifyContext};

pub use semrel_core::plugin_registry::NOOP as NAME;

#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

#[async_trait]
impl Verify for Noop {
    async fn verify(&self, _ctx: &VerifyContext<'_>) -> Result<()> {
        Ok(())
    }
}
