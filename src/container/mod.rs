//! Service container for keel.
//!
//! Holds named registrations and resolves them lazily into singletons.
//! The container is always shared as `Arc<Container>` and handed to the
//! components that need it; there is no global instance.

pub mod registration;

pub use registration::{Capability, Lifetime, Registration, RegistrationBuilder};

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::{KeelError, ResolutionChain, Result};
use registration::Instance;

/// Discovery metadata for a registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Registered name.
    pub name: String,
    /// One-line description, if one was registered.
    pub description: Option<String>,
}

/// Mutable bookkeeping, never held across an `.await`.
#[derive(Default)]
struct Registry {
    entries: HashMap<String, Arc<Registration>>,
    capability_index: HashMap<Capability, Vec<String>>,
    constructed: Vec<String>,
    disposed: bool,
}

tokio::task_local! {
    /// Names under construction in the current task, outermost first. Set
    /// around every factory call so that resolutions made through a captured
    /// container handle still see the chain.
    static RESOLUTION_CHAIN: Vec<String>;
}

/// Returns the chain of the factory currently running in this task, if any.
fn current_chain() -> Vec<String> {
    RESOLUTION_CHAIN
        .try_with(|chain| chain.clone())
        .unwrap_or_default()
}

/// Named service registry with lazy singleton resolution.
#[derive(Default)]
pub struct Container {
    registry: Mutex<Registry>,
}

/// Resolution handle passed to factories.
///
/// Carries the chain of names currently being constructed so that
/// dependency cycles are reported instead of recursing forever.
#[derive(Clone)]
pub struct Resolver {
    container: Arc<Container>,
    chain: Vec<String>,
}

impl Resolver {
    /// Resolves a dependency of the service being constructed.
    pub async fn resolve<T>(&self, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = self
            .container
            .resolve_instance(name, self.chain.clone())
            .await?;
        downcast_instance::<T>(name, &instance)
    }

    /// Returns the container this resolver belongs to.
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Returns the names currently being constructed, outermost first.
    pub fn chain(&self) -> &[String] {
        &self.chain
    }
}

impl Container {
    /// Creates an empty, shareable container.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| KeelError::internal("container registry lock poisoned"))
    }

    /// Registers a singleton service built by `factory` on first resolution.
    pub fn register<T, F, Fut>(&self, name: impl Into<String>, factory: F) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(Resolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Arc<T>>> + Send + 'static,
    {
        self.add(Registration::builder(name, factory).build())
    }

    /// Registers an already-built value.
    pub fn register_instance<T>(&self, name: impl Into<String>, value: Arc<T>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register(name, move |_| {
            let value = Arc::clone(&value);
            async move { Ok(value) }
        })
    }

    /// Adds a fully described registration.
    ///
    /// Re-registering an existing name is rejected with
    /// [`KeelError::DuplicateRegistration`].
    pub fn add(&self, registration: Registration) -> Result<()> {
        let mut registry = self.registry()?;
        if registry.disposed {
            return Err(KeelError::disposed("register", registration.name));
        }
        if registry.entries.contains_key(&registration.name) {
            return Err(KeelError::DuplicateRegistration {
                name: registration.name,
            });
        }

        let name = registration.name.clone();
        for capability in &registration.capabilities {
            registry
                .capability_index
                .entry(*capability)
                .or_default()
                .push(name.clone());
        }
        debug!(service = %name, capabilities = ?registration.capabilities, "registered service");
        registry.entries.insert(name, Arc::new(registration));
        Ok(())
    }

    /// Returns true if `name` is registered and the container is live.
    pub fn contains(&self, name: &str) -> bool {
        self.registry()
            .map(|registry| !registry.disposed && registry.entries.contains_key(name))
            .unwrap_or(false)
    }

    /// Returns true once `dispose()` has been called.
    pub fn is_disposed(&self) -> bool {
        self.registry()
            .map(|registry| registry.disposed)
            .unwrap_or(true)
    }

    /// Returns the names that declared `capability`, in registration order.
    pub fn names_with(&self, capability: Capability) -> Result<Vec<String>> {
        let registry = self.registry()?;
        if registry.disposed {
            return Err(KeelError::disposed("discover", capability.as_str()));
        }
        Ok(registry
            .capability_index
            .get(&capability)
            .cloned()
            .unwrap_or_default())
    }

    /// Returns discovery metadata for every service that declared `capability`,
    /// in registration order. Nothing is resolved.
    pub fn services_with(&self, capability: Capability) -> Result<Vec<ServiceInfo>> {
        let registry = self.registry()?;
        if registry.disposed {
            return Err(KeelError::disposed("discover", capability.as_str()));
        }
        let names = match registry.capability_index.get(&capability) {
            Some(names) => names,
            None => return Ok(Vec::new()),
        };
        Ok(names
            .iter()
            .filter_map(|name| registry.entries.get(name))
            .map(|registration| ServiceInfo {
                name: registration.name.clone(),
                description: registration.description.clone(),
            })
            .collect())
    }

    /// Resolves the singleton registered under `name`, building it on first use.
    ///
    /// Repeated calls return the same `Arc`. Called from inside a factory
    /// (for example through [`Resolver::container`]), the resolution joins the
    /// factory's chain, so cycles are still reported.
    pub async fn resolve<T>(self: &Arc<Self>, name: &str) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instance = self.resolve_instance(name, current_chain()).await?;
        downcast_instance::<T>(name, &instance)
    }

    /// Resolves every service that declared `capability`, in registration order.
    pub async fn resolve_all<T>(self: &Arc<Self>, capability: Capability) -> Result<Vec<(String, Arc<T>)>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut services = Vec::new();
        for name in self.names_with(capability)? {
            let service = self.resolve::<T>(&name).await?;
            services.push((name, service));
        }
        Ok(services)
    }

    fn lookup(&self, name: &str, chain: &[String]) -> Result<Arc<Registration>> {
        let registry = self.registry()?;
        if registry.disposed {
            return Err(KeelError::disposed("resolve", name));
        }
        registry
            .entries
            .get(name)
            .cloned()
            .ok_or_else(|| KeelError::UnknownService {
                name: name.to_string(),
                chain: chain.to_vec().into(),
            })
    }

    fn record_constructed(&self, name: &str) -> Result<()> {
        let mut registry = self.registry()?;
        if registry.disposed {
            warn!(service = %name, "service finished construction after disposal; it will not be released");
            return Ok(());
        }
        registry.constructed.push(name.to_string());
        Ok(())
    }

    fn resolve_instance(
        self: &Arc<Self>,
        name: &str,
        chain: Vec<String>,
    ) -> BoxFuture<'static, Result<Instance>> {
        let container = Arc::clone(self);
        let name = name.to_string();

        async move {
            let registration = container.lookup(&name, &chain)?;

            if chain.contains(&name) {
                let mut cycle = chain;
                cycle.push(name);
                return Err(KeelError::CyclicDependency {
                    chain: cycle.into(),
                });
            }

            if let Some(instance) = registration.instance.get() {
                return Ok(Arc::clone(instance));
            }

            let mut next = chain;
            next.push(name.clone());
            let resolver = Resolver {
                container: Arc::clone(&container),
                chain: next.clone(),
            };
            let factory = Arc::clone(&registration.factory);

            let instance = registration
                .instance
                .get_or_try_init(|| async move {
                    debug!(service = %name, chain = %ResolutionChain(next.clone()), "constructing service");
                    let built = RESOLUTION_CHAIN
                        .scope(next.clone(), factory(resolver))
                        .await
                        .map_err(|source| construction_error(&name, next, source))?;
                    container.record_constructed(&name)?;
                    Ok::<Instance, KeelError>(built)
                })
                .await?;

            Ok(Arc::clone(instance))
        }
        .boxed()
    }

    /// Releases every built singleton and clears the registry.
    ///
    /// Release hooks run in reverse construction order and only for services
    /// that were built. Hook failures are logged and suppressed. Calling this
    /// more than once is a no-op. Returns the number of hooks that ran
    /// successfully.
    pub async fn dispose(&self) -> usize {
        let (entries, constructed) = {
            let mut registry = match self.registry() {
                Ok(registry) => registry,
                Err(e) => {
                    warn!(error = %e, "container disposal skipped");
                    return 0;
                }
            };
            if registry.disposed {
                debug!("container already disposed");
                return 0;
            }
            registry.disposed = true;
            registry.capability_index.clear();
            (
                std::mem::take(&mut registry.entries),
                std::mem::take(&mut registry.constructed),
            )
        };

        let mut released = 0;
        for name in constructed.iter().rev() {
            let Some(registration) = entries.get(name) else {
                continue;
            };
            let (Some(release), Some(instance)) =
                (registration.release.as_ref(), registration.instance.get())
            else {
                continue;
            };

            debug!(service = %name, "releasing service");
            match release(Arc::clone(instance)).await {
                Ok(()) => released += 1,
                Err(e) => {
                    let detail = format!("{e:#}");
                    warn!(service = %name, error = %detail, "failed to release service");
                }
            }
        }

        debug!(services = entries.len(), released, "container disposed");
        released
    }
}

fn downcast_instance<T>(name: &str, instance: &Instance) -> Result<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    Registration::downcast::<T>(instance).ok_or_else(|| KeelError::ServiceTypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}

/// Container errors raised inside a factory keep their identity; anything
/// else is wrapped with the service name and chain.
fn construction_error(name: &str, chain: Vec<String>, source: anyhow::Error) -> KeelError {
    match source.downcast::<KeelError>() {
        Ok(inner) => inner,
        Err(source) => KeelError::ServiceConstruction {
            name: name.to_string(),
            chain: chain.into(),
            source,
        },
    }
}
