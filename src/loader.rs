//! On-demand view loading with per-name deduplication.
//!
//! Concurrent loads of the same view share one underlying load operation.
//! A successful load is memoized for the lifetime of the loader; a failed
//! load is not, so the next request retries. Nested routes declare their
//! views up front, and the preload stage kicks every view in the matched
//! chain off in parallel rather than waiting for parents to render children.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::error::{LoadError, TransportError};

/// A view whose code bundle has been loaded.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadedView {
    name: String,
}

impl LoadedView {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shared handle to a loaded view.
pub type ViewHandle = Arc<LoadedView>;

/// Performs the actual bundle load for a view name.
pub type LoadFn = Arc<dyn Fn(&str) -> BoxFuture<'static, Result<(), TransportError>> + Send + Sync>;

type SharedLoad = Shared<BoxFuture<'static, Result<ViewHandle, LoadError>>>;

enum LoadState {
    Loading(SharedLoad),
    Loaded(ViewHandle),
}

/// Deduplicating, memoizing view loader.
pub struct ViewLoader {
    load_fn: LoadFn,
    states: Mutex<HashMap<String, LoadState>>,
}

impl ViewLoader {
    pub fn new(load_fn: LoadFn) -> Self {
        Self {
            load_fn,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// A loader whose backend resolves every view without work.
    pub fn instant() -> Self {
        Self::new(Arc::new(|_| Box::pin(async { Ok(()) })))
    }

    /// Load `name`, joining an in-flight load or returning the memoized
    /// handle when one exists.
    pub async fn load(&self, name: &str) -> Result<ViewHandle, LoadError> {
        let shared = {
            let mut states = self.states.lock().unwrap();
            match states.get(name) {
                Some(LoadState::Loaded(handle)) => return Ok(Arc::clone(handle)),
                Some(LoadState::Loading(shared)) => shared.clone(),
                None => {
                    crate::debug_log!("loading view '{}'", name);
                    let shared = self.begin(name).shared();
                    states.insert(name.to_string(), LoadState::Loading(shared.clone()));
                    shared
                }
            }
        };

        let result = shared.clone().await;
        let mut states = self.states.lock().unwrap();
        match &result {
            Ok(handle) => {
                states.insert(name.to_string(), LoadState::Loaded(Arc::clone(handle)));
            }
            Err(err) => {
                // Evict only our own failed load; a retry may already have
                // replaced it.
                if let Some(LoadState::Loading(current)) = states.get(name) {
                    if current.ptr_eq(&shared) {
                        crate::debug_log!("view '{}' failed to load: {}", name, err);
                        states.remove(name);
                    }
                }
            }
        }
        result
    }

    /// Start loading `name` without waiting for the result.
    ///
    /// Load failures are logged and swallowed; whatever requests the view
    /// later surfaces the error to the user.
    pub fn preload(self: &Arc<Self>, name: &str) {
        let loader = Arc::clone(self);
        let name = name.to_string();
        tokio::spawn(async move {
            if let Err(err) = loader.load(&name).await {
                crate::debug_log!("preload of '{}' failed: {}", name, err);
            }
        });
    }

    /// Whether `name` has been loaded and memoized.
    pub fn is_loaded(&self, name: &str) -> bool {
        matches!(
            self.states.lock().unwrap().get(name),
            Some(LoadState::Loaded(_))
        )
    }

    fn begin(&self, name: &str) -> BoxFuture<'static, Result<ViewHandle, LoadError>> {
        let load = (self.load_fn)(name);
        let view = name.to_string();
        Box::pin(async move {
            match load.await {
                Ok(()) => Ok(Arc::new(LoadedView { name: view })),
                Err(source) => Err(LoadError { view, source }),
            }
        })
    }
}

impl fmt::Debug for ViewLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let states = self.states.lock().unwrap();
        let mut views: Vec<(&String, &str)> = states
            .iter()
            .map(|(name, state)| {
                let state = match state {
                    LoadState::Loading(_) => "loading",
                    LoadState::Loaded(_) => "loaded",
                };
                (name, state)
            })
            .collect();
        views.sort();
        f.debug_struct("ViewLoader").field("views", &views).finish()
    }
}
