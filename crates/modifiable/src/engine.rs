//! The engine: owns the document, context and compiled rules, re-derives the
//! document on every change and notifies subscribers.
//!
//! # Run
//!
//! 1. every rule selects an operation-set for the current context
//! 2. the distinct non-empty sets form the run's [`Signature`]
//! 3. a cached signature adopts the cached document; otherwise the sets are
//!    applied in rule order to the base descriptor, skipping any that fail
//! 4. the result is cached, and `modified` fires only if its reference differs
//!    from the current document
//!
//! # Re-entrancy
//!
//! Mutations requested from a listener while a run is delivering events are
//! queued and executed, in order, once every listener of the current run has
//! been called.

use crate::cache::{is_empty_operations, ResultCache, Signature};
use crate::config::EngineConfig;
use crate::emitter::{Emitter, Event, Unsubscribe};
use crate::error::{EngineError, ErrorEvent};
use crate::interpolate::Interpolator;
use crate::rule::{Evaluator, Rule, RuleSet};
use crate::strategy::PatchStrategy;
use modifiable_state::{Pointer, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

/// What an engine reports to its listeners.
#[derive(Debug)]
pub enum EngineEvent {
    /// The document changed; carries the new document.
    Modified(Value),
    /// A rule or operation-set failed and was skipped.
    Error(ErrorEvent),
}

/// Listener channel of an [`EngineEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Modified,
    Error,
}

impl Event for EngineEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Modified(_) => EventKind::Modified,
            EngineEvent::Error(_) => EventKind::Error,
        }
    }
}

enum Command {
    Set(Value),
    SetRules(Vec<Rule>),
    SetContext(Value),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Set(_) => "set",
            Command::SetRules(_) => "set_rules",
            Command::SetContext(_) => "set_context",
        }
    }
}

struct State {
    base: Value,
    document: Value,
    context: Value,
    rules: RuleSet,
    cache: ResultCache,
    /// Signature that produced `document`, independent of cache capacity.
    last_signature: Option<Signature>,
}

#[derive(Default)]
struct RunOutcome {
    errors: Vec<ErrorEvent>,
    modified: Option<Value>,
}

impl State {
    fn run(&mut self, evaluator: &Evaluator, patch: &dyn PatchStrategy) -> RunOutcome {
        let mut errors = Vec::new();
        let selected = self.rules.evaluate(evaluator, &self.context, &mut errors);
        let signature = Signature::new(&selected);

        let (next, cache_hit) = if self.last_signature.as_ref() == Some(&signature) {
            (self.document.clone(), true)
        } else {
            match self.cache.get(&signature) {
                Some(cached) => (cached.clone(), true),
                None => (self.fold(patch, &selected, &mut errors), false),
            }
        };
        tracing::debug!(
            rules = selected.len(),
            signature = signature.len(),
            cache_hit,
            errors = errors.len(),
            "rules evaluated"
        );
        self.cache.insert(signature.clone(), next.clone());
        self.last_signature = Some(signature);

        let modified = if Value::ptr_eq(&next, &self.document) {
            None
        } else {
            self.document = next.clone();
            Some(next)
        };
        RunOutcome { errors, modified }
    }

    /// Drop every remembered result; the next run folds from the base again.
    fn forget_results(&mut self) {
        self.cache.clear();
        self.last_signature = None;
    }

    /// Apply the selected operation-sets to the base descriptor in rule order.
    fn fold(&self, patch: &dyn PatchStrategy, selected: &[Value], errors: &mut Vec<ErrorEvent>) -> Value {
        let mut document = self.base.clone();
        for (rule, operations) in selected.iter().enumerate() {
            if is_empty_operations(operations) {
                continue;
            }
            match patch.apply(&document, operations) {
                Ok(next) => document = next,
                Err(source) => {
                    tracing::warn!(rule, error = %source, "operation-set skipped");
                    errors.push(ErrorEvent::Patch { rule, source });
                }
            }
        }
        document
    }
}

struct Inner {
    evaluator: Evaluator,
    patch: Rc<dyn PatchStrategy>,
    state: RefCell<State>,
    events: Emitter<EngineEvent>,
    running: Cell<bool>,
    pending: RefCell<VecDeque<Command>>,
}

/// Marks a run in progress. On drop the flag is reset and any commands still
/// queued are discarded, so a panicking listener neither leaves the engine in
/// queueing mode nor replays its requests on the next unrelated call.
struct RunGuard<'a> {
    running: &'a Cell<bool>,
    pending: &'a RefCell<VecDeque<Command>>,
}

impl<'a> RunGuard<'a> {
    fn enter(running: &'a Cell<bool>, pending: &'a RefCell<VecDeque<Command>>) -> Self {
        running.set(true);
        Self { running, pending }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.set(false);
        if let Ok(mut pending) = self.pending.try_borrow_mut() {
            if !pending.is_empty() {
                tracing::warn!(dropped = pending.len(), "run aborted, queued commands discarded");
                pending.clear();
            }
        }
    }
}

impl Inner {
    fn dispatch(&self, command: Command) {
        if self.running.get() {
            tracing::debug!(command = command.name(), "run in progress, command queued");
            self.pending.borrow_mut().push_back(command);
            return;
        }

        let _guard = RunGuard::enter(&self.running, &self.pending);
        let mut next = Some(command);
        while let Some(command) = next {
            self.execute(command);
            next = self.pending.borrow_mut().pop_front();
        }
    }

    fn execute(&self, command: Command) {
        let outcome = {
            let mut state = self.state.borrow_mut();
            match command {
                Command::Set(descriptor) => {
                    if Value::ptr_eq(&descriptor, &state.base) {
                        return;
                    }
                    state.base = descriptor;
                    state.forget_results();
                }
                Command::SetRules(rules) => {
                    state.rules = RuleSet::compile(&rules);
                    state.forget_results();
                }
                Command::SetContext(context) => {
                    if Value::ptr_eq(&context, &state.context) {
                        tracing::trace!("context unchanged, run skipped");
                        return;
                    }
                    state.context = context;
                }
            }
            state.run(&self.evaluator, self.patch.as_ref())
        };

        for error in outcome.errors {
            self.events.emit(&EngineEvent::Error(error));
        }
        if let Some(document) = outcome.modified {
            self.events.emit(&EngineEvent::Modified(document));
        }
    }
}

/// A rule-driven, memoized document deriver.
///
/// Cloning an `Engine` yields another handle to the same engine. Listeners
/// that call back into the engine should capture a [`WeakEngine`].
///
/// # Examples
///
/// ```
/// use modifiable::{Engine, EngineConfig, Rule, ValidatorError, Value};
/// use serde_json::json;
///
/// let rules = Rule::list_from_json(json!([{
///     "when": [{"/contextPath": {"const": "1"}}],
///     "then": [{"op": "remove", "path": "/validations/0"}],
///     "otherwise": [{"op": "remove", "path": "/validations"}]
/// }]))
/// .unwrap();
///
/// let config = EngineConfig::json().with_validator(
///     |schema: &Value, value: Option<&Value>| -> Result<bool, ValidatorError> {
///         Ok(schema.get_key("const") == value)
///     },
/// );
///
/// let engine = Engine::new(
///     Value::from(json!({"validations": ["required", ["minLength", 2]]})),
///     rules,
///     config,
/// )
/// .unwrap();
/// assert_eq!(engine.get().to_json(), json!({}));
///
/// engine.set_context(Value::from(json!({"contextPath": "1"})));
/// assert_eq!(engine.get().to_json(), json!({"validations": [["minLength", 2]]}));
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Rc<Inner>,
}

impl Engine {
    /// Compile `rules` and derive the initial document from `descriptor`.
    ///
    /// Errors raised by the initial run are logged; no listener exists yet to
    /// receive them.
    pub fn new(descriptor: impl Into<Value>, rules: Vec<Rule>, config: EngineConfig) -> Result<Self, EngineError> {
        let validator = config.require_validator()?;
        let pattern = config.compile_pattern()?;
        let evaluator = Evaluator {
            validator,
            interpolator: Interpolator::new(pattern, Rc::clone(&config.resolver)),
        };

        let base = descriptor.into();
        let mut state = State {
            document: base.clone(),
            base,
            context: config.context,
            rules: RuleSet::compile(&rules),
            cache: ResultCache::new(config.result_cache_capacity),
            last_signature: None,
        };
        state.run(&evaluator, config.patch.as_ref());

        Ok(Self {
            inner: Rc::new(Inner {
                evaluator,
                patch: config.patch,
                state: RefCell::new(state),
                events: Emitter::new(),
                running: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
            }),
        })
    }

    /// The current derived document.
    pub fn get(&self) -> Value {
        self.inner.state.borrow().document.clone()
    }

    /// The base descriptor rules are applied to.
    pub fn descriptor(&self) -> Value {
        self.inner.state.borrow().base.clone()
    }

    pub fn context(&self) -> Value {
        self.inner.state.borrow().context.clone()
    }

    /// Replace the base descriptor, forget cached results and re-run.
    pub fn set(&self, descriptor: impl Into<Value>) {
        self.inner.dispatch(Command::Set(descriptor.into()));
    }

    /// Recompile the rules, dropping all memo state and cached results, and re-run.
    pub fn set_rules(&self, rules: Vec<Rule>) {
        self.inner.dispatch(Command::SetRules(rules));
    }

    /// Replace the context and re-run. A reference-identical context is ignored.
    pub fn set_context(&self, context: impl Into<Value>) {
        self.inner.dispatch(Command::SetContext(context.into()));
    }

    /// Listen for new documents.
    pub fn subscribe(&self, listener: impl Fn(&Value) + 'static) -> Unsubscribe {
        self.on(EventKind::Modified, move |event| {
            if let EngineEvent::Modified(document) = event {
                listener(document);
            }
        })
    }

    /// Listen for errors isolated during runs.
    pub fn on_error(&self, listener: impl Fn(&ErrorEvent) + 'static) -> Unsubscribe {
        self.on(EventKind::Error, move |event| {
            if let EngineEvent::Error(error) = event {
                listener(error);
            }
        })
    }

    pub fn on(&self, kind: EventKind, listener: impl Fn(&EngineEvent) + 'static) -> Unsubscribe {
        self.inner.events.on(kind, listener)
    }

    /// Listen for changes of the document value at `path`.
    ///
    /// `listener` receives the new value (or `None` once the path is gone)
    /// only when it differs from the value last observed there.
    pub fn subscribe_to(
        &self,
        path: &str,
        listener: impl Fn(Option<&Value>) + 'static,
    ) -> Result<Unsubscribe, EngineError> {
        let pointer = Pointer::parse(path)?;
        let last = RefCell::new(pointer.get(&self.get()));
        Ok(self.subscribe(move |document| {
            let current = pointer.get(document);
            if *last.borrow() == current {
                return;
            }
            *last.borrow_mut() = current.clone();
            listener(current.as_ref());
        }))
    }

    pub fn downgrade(&self) -> WeakEngine {
        WeakEngine {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of run results currently remembered.
    pub fn cache_len(&self) -> usize {
        self.inner.state.borrow().cache.len()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Engine")
            .field("document", &state.document)
            .field("context", &state.context)
            .field("rules", &state.rules.len())
            .field("cached_results", &state.cache.len())
            .field("patch", &self.inner.patch.name())
            .field("events", &self.inner.events)
            .finish()
    }
}

/// A non-owning handle to an [`Engine`].
#[derive(Clone)]
pub struct WeakEngine {
    inner: Weak<Inner>,
}

impl WeakEngine {
    pub fn upgrade(&self) -> Option<Engine> {
        self.inner.upgrade().map(|inner| Engine { inner })
    }
}

impl fmt::Debug for WeakEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEngine")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
