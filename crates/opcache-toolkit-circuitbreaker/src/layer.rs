use crate::{BreakerConfig, CircuitBreaker, KeyValueStore};
use futures::future::BoxFuture;
use opcache_toolkit_core::{ConfigError, ToolkitError};
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// A Tower layer that routes every request through one named breaker.
///
/// ```rust
/// use opcache_toolkit_circuitbreaker::{
///     BreakerConfig, CircuitBreaker, CircuitBreakerLayer, MemoryKeyValueStore,
/// };
/// use tower::{service_fn, ServiceBuilder};
///
/// let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
/// let layer = CircuitBreakerLayer::new(breaker, "compile", BreakerConfig::preload()).unwrap();
///
/// let service = ServiceBuilder::new()
///     .layer(layer)
///     .service(service_fn(|path: String| async move { Ok::<_, std::io::Error>(path) }));
/// ```
pub struct CircuitBreakerLayer<K> {
    breaker: CircuitBreaker<K>,
    name: Arc<str>,
    config: BreakerConfig,
}

impl<K> Clone for CircuitBreakerLayer<K> {
    fn clone(&self) -> Self {
        Self {
            breaker: self.breaker.clone(),
            name: Arc::clone(&self.name),
            config: self.config,
        }
    }
}

impl<K: KeyValueStore> CircuitBreakerLayer<K> {
    /// Creates a layer guarded by the breaker called `name`.
    pub fn new(
        breaker: CircuitBreaker<K>,
        name: impl Into<String>,
        config: BreakerConfig,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(Self {
            breaker,
            name: name.into(),
            config,
        })
    }
}

impl<K, S> Layer<S> for CircuitBreakerLayer<K> {
    type Service = CircuitBreakerService<K, S>;

    fn layer(&self, service: S) -> Self::Service {
        CircuitBreakerService {
            inner: service,
            breaker: self.breaker.clone(),
            name: Arc::clone(&self.name),
            config: self.config,
        }
    }
}

/// Service produced by [`CircuitBreakerLayer`].
pub struct CircuitBreakerService<K, S> {
    inner: S,
    breaker: CircuitBreaker<K>,
    name: Arc<str>,
    config: BreakerConfig,
}

impl<K, S: Clone> Clone for CircuitBreakerService<K, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            breaker: self.breaker.clone(),
            name: Arc::clone(&self.name),
            config: self.config,
        }
    }
}

impl<K, S, Req> Service<Req> for CircuitBreakerService<K, S>
where
    K: KeyValueStore,
    S: Service<Req> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = ToolkitError<S::Error>;
    type Future = BoxFuture<'static, Result<S::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(ToolkitError::OperationFailed)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        // Take the service that was driven to readiness and leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let breaker = self.breaker.clone();
        let name = Arc::clone(&self.name);
        let config = self.config;

        Box::pin(async move {
            breaker
                .execute(&name, &config, move || inner.call(req))
                .await
        })
    }
}
