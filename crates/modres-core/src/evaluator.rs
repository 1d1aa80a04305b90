//! Suspend/restart evaluation substrate.
//!
//! An [`Evaluator`] runs a resolution stage against an [`Environment`] view
//! of its memo table. Whenever the stage reports
//! [`Computed::ValuesMissing`], every request it recorded during that pass
//! is fetched in parallel and the stage is run again from the top. Each
//! distinct request is fetched at most once per evaluator, however many
//! passes or concurrent evaluations ask for it.
//!
//! Persistent fetch failures are memoized like values. Transient ones are
//! visible for the rest of the evaluation that hit them and are dropped
//! when it finishes, so the next evaluation retries.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use modres_core_types::schema::EVENT_VALUES_MISSING;
use modres_core_types::RequestContext;
use rayon::prelude::*;

use crate::env::{Computed, Environment, ModuleFile, ModuleFileRequest, RepoRuleRequest};
use crate::errors::{ResolveError, Result};
use crate::model::RepoSpec;
use crate::registry::{fetch_module_file, fetch_repo_rule, RegistryFactory};

/// A value the substrate knows how to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Request {
    ModuleFile(ModuleFileRequest),
    RepoRule(RepoRuleRequest),
}

#[derive(Debug, Clone)]
enum Value {
    ModuleFile(ModuleFile),
    RepoRule(RepoSpec),
}

type Slot = Arc<OnceLock<Result<Value>>>;

/// Memoizing fetch substrate shared by all queries against one root
pub struct Evaluator {
    factory: Arc<dyn RegistryFactory>,
    registries: Vec<String>,
    memo: Mutex<HashMap<Request, Slot>>,
    interrupted: AtomicBool,
}

impl Evaluator {
    /// # Arguments
    /// * `factory` - resolves registry URLs
    /// * `registries` - tried in order for requests without a pinned registry
    pub fn new(factory: Arc<dyn RegistryFactory>, registries: Vec<String>) -> Self {
        Self {
            factory,
            registries,
            memo: Mutex::new(HashMap::new()),
            interrupted: AtomicBool::new(false),
        }
    }

    /// Run `stage` until it produces a value.
    ///
    /// # Errors
    /// * Whatever `stage` returns
    /// * `Interrupted` - [`Evaluator::interrupt`] was called
    /// * `Internal` - the stage reported missing values without requesting any
    pub fn evaluate<T, F>(&self, stage: F) -> Result<T>
    where
        F: FnMut(&dyn Environment) -> Result<Computed<T>>,
    {
        self.evaluate_with(&RequestContext::new(), stage)
    }

    /// Like [`Evaluator::evaluate`], logging under the given context
    ///
    /// # Errors
    /// See [`Evaluator::evaluate`].
    pub fn evaluate_with<T, F>(&self, ctx: &RequestContext, mut stage: F) -> Result<T>
    where
        F: FnMut(&dyn Environment) -> Result<Computed<T>>,
    {
        let span = tracing::debug_span!(
            "evaluate",
            request_id = %ctx.request_id,
            query = ctx.query.as_deref().unwrap_or_default()
        );
        let _enter = span.enter();

        let result = self.run(&mut stage);
        self.drop_transient_failures();
        result
    }

    fn run<T, F>(&self, stage: &mut F) -> Result<T>
    where
        F: FnMut(&dyn Environment) -> Result<Computed<T>>,
    {
        let mut round = 0u32;
        loop {
            self.check_interrupt()?;
            let session = Session::new(self);
            match stage(&session)? {
                Computed::Ready(value) => return Ok(value),
                Computed::ValuesMissing => {
                    let pending = session.into_pending();
                    if pending.is_empty() {
                        return Err(ResolveError::internal(
                            "stage reported missing values without requesting any",
                        ));
                    }
                    round += 1;
                    tracing::debug!(
                        event = EVENT_VALUES_MISSING,
                        round,
                        request_count = pending.len(),
                        "fetching missing values"
                    );
                    self.fulfil(pending)?;
                }
            }
        }
    }

    /// Fetch every pending request, in parallel
    fn fulfil(&self, pending: BTreeSet<Request>) -> Result<()> {
        let slots: Vec<(Request, Slot)> = pending
            .into_iter()
            .map(|request| {
                let slot = self.slot(&request);
                (request, slot)
            })
            .collect();
        slots.par_iter().for_each(|(request, slot)| {
            if self.interrupted.load(Ordering::SeqCst) {
                return;
            }
            slot.get_or_init(|| self.fetch(request));
        });
        self.check_interrupt()
    }

    fn fetch(&self, request: &Request) -> Result<Value> {
        match request {
            Request::ModuleFile(req) => {
                let pinned;
                let registries = match &req.registry {
                    Some(url) => {
                        pinned = [url.clone()];
                        &pinned[..]
                    }
                    None => &self.registries[..],
                };
                fetch_module_file(self.factory.as_ref(), registries, &req.key).map(Value::ModuleFile)
            }
            Request::RepoRule(req) => {
                fetch_repo_rule(self.factory.as_ref(), &req.registry, &req.key, &req.repo_name)
                    .map(Value::RepoRule)
            }
        }
    }

    fn slot(&self, request: &Request) -> Slot {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        memo.entry(request.clone()).or_default().clone()
    }

    fn lookup(&self, request: &Request) -> Option<Result<Value>> {
        let memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        memo.get(request).and_then(|slot| slot.get().cloned())
    }

    fn drop_transient_failures(&self) {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        memo.retain(|_, slot| !matches!(slot.get(), Some(Err(e)) if e.is_transient()));
    }

    /// A pending interrupt cancels exactly one evaluation
    fn check_interrupt(&self) -> Result<()> {
        if self.interrupted.swap(false, Ordering::SeqCst) {
            tracing::debug!("evaluation interrupted");
            return Err(ResolveError::Interrupted);
        }
        Ok(())
    }

    /// Cancel the running evaluation, or the next one if none is running
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }

    /// Forget every memoized value and failure
    pub fn invalidate(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of memoized requests
    pub fn cached_len(&self) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("registries", &self.registries)
            .field("cached", &self.cached_len())
            .finish_non_exhaustive()
    }
}

/// Environment view for one pass of a stage
struct Session<'a> {
    evaluator: &'a Evaluator,
    pending: RefCell<BTreeSet<Request>>,
}

impl<'a> Session<'a> {
    fn new(evaluator: &'a Evaluator) -> Self {
        Self {
            evaluator,
            pending: RefCell::new(BTreeSet::new()),
        }
    }

    fn into_pending(self) -> BTreeSet<Request> {
        self.pending.into_inner()
    }

    fn get(&self, request: Request) -> Option<Result<Value>> {
        let found = self.evaluator.lookup(&request);
        if found.is_none() {
            self.pending.borrow_mut().insert(request);
        }
        found
    }
}

impl Environment for Session<'_> {
    fn module_file(&self, request: &ModuleFileRequest) -> Result<Option<ModuleFile>> {
        match self.get(Request::ModuleFile(request.clone())) {
            None => Ok(None),
            Some(Ok(Value::ModuleFile(file))) => Ok(Some(file)),
            Some(Ok(Value::RepoRule(_))) => Err(ResolveError::internal("memo value mismatch")),
            Some(Err(e)) => Err(e),
        }
    }

    fn repo_rule(&self, request: &RepoRuleRequest) -> Result<Option<RepoSpec>> {
        match self.get(Request::RepoRule(request.clone())) {
            None => Ok(None),
            Some(Ok(Value::RepoRule(spec))) => Ok(Some(spec)),
            Some(Ok(Value::ModuleFile(_))) => Err(ResolveError::internal("memo value mismatch")),
            Some(Err(e)) => Err(e),
        }
    }
}
