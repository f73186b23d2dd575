//! Registry that binds configured plugin specs to strategy implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::plugin::{
    AnalyzeCommits, GenerateNotes, GetLastRelease, PluginConfig, PluginOptions, PluginSpec, Stage,
    Verify, VerifyContext,
};

/// Builds a strategy from the options it is bound to.
pub type Factory<T> = Box<dyn Fn(&PluginOptions) -> Result<Arc<T>> + Send + Sync>;

/// Identifier of the strategy that accepts everything.
pub const NOOP: &str = "noop";

/// Strategies resolved for every stage of one run.
#[derive(Clone)]
pub struct Plugins {
    pub analyze_commits: Arc<dyn AnalyzeCommits>,
    pub get_last_release: Arc<dyn GetLastRelease>,
    pub verify_conditions: Arc<dyn Verify>,
    pub verify_release: Arc<dyn Verify>,
    pub generate_notes: Arc<dyn GenerateNotes>,
}

/// Maps strategy identifiers to factories, per stage.
///
/// Resolution happens once at startup; an identifier that is not registered
/// is a startup error.
#[derive(Default)]
pub struct PluginRegistry {
    analyzers: HashMap<String, Factory<dyn AnalyzeCommits>>,
    last_release: HashMap<String, Factory<dyn GetLastRelease>>,
    verifiers: HashMap<String, Factory<dyn Verify>>,
    notes: HashMap<String, Factory<dyn GenerateNotes>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an `analyzeCommits` strategy.
    pub fn register_analyzer<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginOptions) -> Result<Arc<dyn AnalyzeCommits>> + Send + Sync + 'static,
    {
        self.analyzers.insert(name.to_string(), Box::new(factory));
    }

    /// Registers a `getLastRelease` strategy.
    pub fn register_last_release<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginOptions) -> Result<Arc<dyn GetLastRelease>> + Send + Sync + 'static,
    {
        self.last_release.insert(name.to_string(), Box::new(factory));
    }

    /// Registers a strategy usable for both verification stages.
    pub fn register_verifier<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginOptions) -> Result<Arc<dyn Verify>> + Send + Sync + 'static,
    {
        self.verifiers.insert(name.to_string(), Box::new(factory));
    }

    /// Registers a `generateNotes` strategy.
    pub fn register_notes<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&PluginOptions) -> Result<Arc<dyn GenerateNotes>> + Send + Sync + 'static,
    {
        self.notes.insert(name.to_string(), Box::new(factory));
    }

    /// Lists the identifiers registered for a stage, sorted.
    pub fn registered(&self, stage: Stage) -> Vec<String> {
        let mut names: Vec<String> = match stage {
            Stage::AnalyzeCommits => self.analyzers.keys().cloned().collect(),
            Stage::GetLastRelease => self.last_release.keys().cloned().collect(),
            Stage::VerifyConditions | Stage::VerifyRelease => {
                self.verifiers.keys().cloned().collect()
            }
            Stage::GenerateNotes => self.notes.keys().cloned().collect(),
        };
        names.sort();
        names
    }

    pub fn resolve_analyzer(&self, spec: Option<&PluginSpec>) -> Result<Arc<dyn AnalyzeCommits>> {
        let stage = Stage::AnalyzeCommits;
        bind(&self.analyzers, stage, spec, stage.default_plugin())
    }

    pub fn resolve_last_release(
        &self,
        spec: Option<&PluginSpec>,
    ) -> Result<Arc<dyn GetLastRelease>> {
        let stage = Stage::GetLastRelease;
        bind(&self.last_release, stage, spec, stage.default_plugin())
    }

    pub fn resolve_notes(&self, spec: Option<&PluginSpec>) -> Result<Arc<dyn GenerateNotes>> {
        let stage = Stage::GenerateNotes;
        bind(&self.notes, stage, spec, stage.default_plugin())
    }

    /// Resolves a verification stage.
    ///
    /// A list resolves every entry on its own (entries without an identifier
    /// fall back to [`NOOP`]) into a [`VerifyChain`].
    ///
    /// # Errors
    ///
    /// Returns an error if any entry cannot be resolved.
    pub fn resolve_verifier(
        &self,
        stage: Stage,
        spec: Option<&PluginSpec>,
    ) -> Result<Arc<dyn Verify>> {
        match spec {
            Some(PluginSpec::List(entries)) if stage.accepts_list() => {
                let steps = entries
                    .iter()
                    .map(|entry| {
                        let name = spec_name(entry.as_ref(), NOOP).to_string();
                        bind(&self.verifiers, stage, entry.as_ref(), NOOP).map(|v| (name, v))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Arc::new(VerifyChain::new(steps)))
            }
            _ => bind(&self.verifiers, stage, spec, stage.default_plugin()),
        }
    }

    /// Resolves every stage of `config`.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error.
    pub fn resolve_all(&self, config: &PluginConfig) -> Result<Plugins> {
        Ok(Plugins {
            analyze_commits: self.resolve_analyzer(config.get(Stage::AnalyzeCommits))?,
            get_last_release: self.resolve_last_release(config.get(Stage::GetLastRelease))?,
            verify_conditions: self.resolve_verifier(
                Stage::VerifyConditions,
                config.get(Stage::VerifyConditions),
            )?,
            verify_release: self
                .resolve_verifier(Stage::VerifyRelease, config.get(Stage::VerifyRelease))?,
            generate_notes: self.resolve_notes(config.get(Stage::GenerateNotes))?,
        })
    }
}

fn spec_name<'a>(spec: Option<&'a PluginSpec>, fallback: &'a str) -> &'a str {
    match spec {
        Some(PluginSpec::Name(name)) => name,
        Some(PluginSpec::Inline(options)) => options.path().unwrap_or(fallback),
        Some(PluginSpec::List(_)) | None => fallback,
    }
}

fn bind<T: ?Sized>(
    table: &HashMap<String, Factory<T>>,
    stage: Stage,
    spec: Option<&PluginSpec>,
    fallback: &str,
) -> Result<Arc<T>> {
    let options = match spec {
        Some(PluginSpec::List(_)) => {
            return Err(Error::PluginListNotAllowed {
                stage: stage.to_string(),
            })
        }
        Some(PluginSpec::Inline(options)) => options.clone(),
        Some(PluginSpec::Name(_)) | None => PluginOptions::default(),
    };
    let name = spec_name(spec, fallback);

    let factory = table.get(name).ok_or_else(|| {
        let mut available: Vec<&str> = table.keys().map(String::as_str).collect();
        available.sort_unstable();
        Error::PluginNotFound {
            stage: stage.to_string(),
            name: name.to_string(),
            available: available.join(", "),
        }
    })?;

    tracing::debug!(stage = %stage, plugin = name, "resolved plugin");
    factory(&options)
}

/// Runs verification strategies in order, stopping at the first failure.
pub struct VerifyChain {
    steps: Vec<(String, Arc<dyn Verify>)>,
}

impl VerifyChain {
    pub fn new(steps: Vec<(String, Arc<dyn Verify>)>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait]
impl Verify for VerifyChain {
    async fn verify(&self, ctx: &VerifyContext<'_>) -> Result<()> {
        for (name, step) in &self.steps {
            if let Err(e) = step.verify(ctx).await {
                tracing::debug!(plugin = %name, error = %e, "verification step failed");
                return Err(e);
            }
        }
        Ok(())
    }
}
