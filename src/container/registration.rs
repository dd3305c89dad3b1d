//! Service registration records.
//!
//! A [`Registration`] binds a name to a type-erased factory and holds the
//! singleton instance once it has been built.

use std::any::{type_name, Any};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::OnceCell;

use super::Resolver;

/// A built service. The concrete value inside is always an `Arc<T>`.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(Resolver) -> BoxFuture<'static, anyhow::Result<Instance>> + Send + Sync>;

type ReleaseHook = Arc<dyn Fn(Instance) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// An optional contract a registered service declares it fulfils.
///
/// The container keeps an index from capability to service names so that
/// consumers can discover implementers without probing every service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// The service implements [`crate::commands::Command`].
    Command,
    /// The service implements [`crate::providers::HelpProvider`].
    HelpProvider,
}

impl Capability {
    /// Returns the capability as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::HelpProvider => "dynamicHelpProvider",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a built instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// One instance per container, built on first resolution.
    #[default]
    Singleton,
}

/// A named service registration.
pub struct Registration {
    pub(crate) name: String,
    pub(crate) lifetime: Lifetime,
    pub(crate) factory: Factory,
    pub(crate) instance: OnceCell<Instance>,
    pub(crate) release: Option<ReleaseHook>,
    pub(crate) capabilities: BTreeSet<Capability>,
    pub(crate) description: Option<String>,
    pub(crate) type_name: &'static str,
}

impl Registration {
    /// Starts building a registration for a service of type `T`.
    ///
    /// `T` may be unsized, so trait objects such as `dyn Command` can be
    /// registered and resolved directly.
    pub fn builder<T, F, Fut>(name: impl Into<String>, factory: F) -> RegistrationBuilder<T>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Resolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<T>>> + Send + 'static,
    {
        RegistrationBuilder::new(name.into(), factory)
    }

    /// Returns the registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instance lifetime.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Returns the declared capabilities.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// Returns the one-line description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns true once the singleton has been built.
    pub fn is_constructed(&self) -> bool {
        self.instance.initialized()
    }

    pub(crate) fn downcast<T>(instance: &Instance) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        instance.downcast_ref::<Arc<T>>().cloned()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("lifetime", &self.lifetime)
            .field("type", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("constructed", &self.is_constructed())
            .field("has_release_hook", &self.release.is_some())
            .finish()
    }
}

/// Builder for [`Registration`].
pub struct RegistrationBuilder<T: ?Sized> {
    name: String,
    factory: Factory,
    release: Option<ReleaseHook>,
    capabilities: BTreeSet<Capability>,
    description: Option<String>,
    _service: PhantomData<fn() -> Arc<T>>,
}

impl<T> RegistrationBuilder<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn new<F, Fut>(name: String, factory: F) -> Self
    where
        F: Fn(Resolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<T>>> + Send + 'static,
    {
        let factory: Factory = Arc::new(move |resolver: Resolver| {
            let pending = factory(resolver);
            async move {
                let service = pending.await?;
                Ok::<Instance, anyhow::Error>(Arc::new(service))
            }
            .boxed()
        });

        Self {
            name,
            factory,
            release: None,
            capabilities: BTreeSet::new(),
            description: None,
            _service: PhantomData,
        }
    }

    /// Declares that the service fulfils `capability`.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Sets a one-line description shown by discovery consumers such as help.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a hook that releases the instance when the container is disposed.
    ///
    /// The hook only runs for instances that were actually built.
    pub fn on_dispose<H, HFut>(mut self, hook: H) -> Self
    where
        H: Fn(Arc<T>) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = self.name.clone();
        self.release = Some(Arc::new(move |instance: Instance| {
            match Registration::downcast::<T>(&instance) {
                Some(service) => hook(service).boxed(),
                None => {
                    let name = name.clone();
                    async move {
                        Err::<(), _>(anyhow::anyhow!(
                            "release hook for '{name}' received an instance of another type"
                        ))
                    }
                    .boxed()
                }
            }
        }));
        self
    }

    /// Finishes the registration.
    pub fn build(self) -> Registration {
        Registration {
            name: self.name,
            lifetime: Lifetime::Singleton,
            factory: self.factory,
            instance: OnceCell::new(),
            release: self.release,
            capabilities: self.capabilities,
            description: self.description,
            type_name: type_name::<T>(),
        }
    }
}
