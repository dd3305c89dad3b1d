//! Pluggable providers that contribute to help rendering and completion.
//!
//! Any registered service may implement [`HelpProvider`]. Conformance is
//! declared at registration time through [`register_help_provider`], which
//! tags the registration with [`Capability::HelpProvider`]. Consumers discover
//! providers through the container's capability index.
//!
//! When several providers report `is_project_type == true`, the one registered
//! first wins.

mod dynamic_help;

pub use dynamic_help::DynamicHelpProvider;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::container::{Capability, Container, Registration, Resolver};
use crate::error::Result;

/// Variables a provider exposes to help templates.
pub type LocalVariables = BTreeMap<String, serde_json::Value>;

/// Options passed to providers when rendering help.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpOptions {
    /// Render HTML instead of plain text.
    pub is_html: bool,
    /// Arguments of the current run.
    pub args: Vec<String>,
}

/// Data a provider contributes to a consumer such as the help command.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDescriptor {
    /// Capability the provider was discovered through.
    pub capability_name: String,
    /// Registered name of the provider.
    pub provider_name: String,
    /// Variables returned by the provider.
    pub local_variables: LocalVariables,
}

/// A service that customizes help output for a kind of project.
#[async_trait]
pub trait HelpProvider: Send + Sync {
    /// Returns true if this provider applies to the current run.
    ///
    /// Called speculatively on every registered provider, so it must not have
    /// side effects.
    async fn is_project_type(&self, args: &[String]) -> bool;

    /// Returns variables for help templates.
    async fn get_local_variables(&self, options: &HelpOptions) -> anyhow::Result<LocalVariables>;

    /// Returns extra completion candidates for the words typed so far.
    async fn completion_hints(&self, _words: &[String]) -> Vec<String> {
        Vec::new()
    }
}

/// Registers a help provider under `name` and declares its capability.
pub fn register_help_provider<F, Fut>(
    container: &Container,
    name: impl Into<String>,
    factory: F,
) -> Result<()>
where
    F: Fn(Resolver) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Arc<dyn HelpProvider>>> + Send + 'static,
{
    container.add(
        Registration::builder(name, factory)
            .capability(Capability::HelpProvider)
            .build(),
    )
}

/// Returns the first registered provider that applies to `args`.
///
/// Providers are resolved one at a time, so later providers are never built
/// once an earlier one matches.
pub async fn select_provider(
    container: &Arc<Container>,
    args: &[String],
) -> Result<Option<(String, Arc<dyn HelpProvider>)>> {
    for name in container.names_with(Capability::HelpProvider)? {
        let provider = container.resolve::<dyn HelpProvider>(&name).await?;
        if provider.is_project_type(args).await {
            debug!(provider = %name, "selected help provider");
            return Ok(Some((name, provider)));
        }
    }
    Ok(None)
}

/// Collects the selected provider's local variables.
pub async fn describe(
    container: &Arc<Container>,
    options: &HelpOptions,
) -> anyhow::Result<Option<ProviderDescriptor>> {
    let Some((provider_name, provider)) = select_provider(container, &options.args).await? else {
        return Ok(None);
    };
    let local_variables = provider.get_local_variables(options).await?;
    Ok(Some(ProviderDescriptor {
        capability_name: Capability::HelpProvider.as_str().to_string(),
        provider_name,
        local_variables,
    }))
}

/// Collects completion hints from every applicable provider, in registration order.
pub async fn completion_hints(container: &Arc<Container>, words: &[String]) -> Result<Vec<String>> {
    let mut hints = Vec::new();
    for (name, provider) in container
        .resolve_all::<dyn HelpProvider>(Capability::HelpProvider)
        .await?
    {
        if provider.is_project_type(words).await {
            let contributed = provider.completion_hints(words).await;
            debug!(provider = %name, count = contributed.len(), "collected completion hints");
            hints.extend(contributed);
        }
    }
    Ok(hints)
}
