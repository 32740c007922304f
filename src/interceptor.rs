//! Invocation interceptor: the transparent timing proxy
//!
//! A [`Proxy`] owns a target and routes every call through one chokepoint.
//! For operations carrying the timing marker the chokepoint reads the clock
//! before delegating, and a [`CallTimer`] guard reads it again and records
//! the elapsed time when the call's scope ends. Because the record happens in
//! `Drop`, it runs on every exit path: a normal return, an `Err` returned by
//! the target, or a panic unwinding out of the target.
//!
//! The target's return value, including any error it carries, is handed back
//! to the caller untouched.

use crate::clock::Clock;
use crate::error::{ConstructionError, InterceptError};
use crate::operation::{Interface, Operation, OperationId, OperationTable};
use crate::state::ProfilingState;
use chrono::{DateTime, Utc};
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Scoped measurement of a single profiled call
///
/// Created immediately before the delegate call; records
/// `(target type, operation, end - start)` exactly once when dropped.
pub struct CallTimer<'a> {
    clock: &'a dyn Clock,
    state: &'a ProfilingState,
    target_type: &'static str,
    operation: OperationId,
    start: Instant,
}

impl<'a> CallTimer<'a> {
    /// Read the clock and start measuring
    pub fn start(
        clock: &'a dyn Clock,
        state: &'a ProfilingState,
        target_type: &'static str,
        operation: OperationId,
    ) -> Self {
        Self {
            clock,
            state,
            target_type,
            operation,
            start: clock.instant(),
        }
    }

    /// Start a timer only for operations carrying the timing marker
    ///
    /// Unmarked operations get `None` and never touch the clock.
    fn start_if(
        operation: &Operation,
        clock: &'a dyn Clock,
        state: &'a ProfilingState,
        target_type: &'static str,
    ) -> Option<Self> {
        operation
            .is_profiled()
            .then(|| Self::start(clock, state, target_type, operation.id()))
    }
}

impl Drop for CallTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.clock.instant().saturating_duration_since(self.start);
        tracing::trace!(
            target_type = self.target_type,
            operation = self.operation.name,
            elapsed_us = saturating_micros(elapsed),
            "recorded call"
        );
        self.state.record(self.target_type, self.operation, elapsed);
    }
}

fn saturating_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Transparent stand-in for a target implementing interface `I`
///
/// `I` is the interface as a trait object type, e.g. `Proxy<MyCrawler, dyn
/// WebCrawler>`. The adapter that makes the proxy implement the trait is
/// generated by [`profiled_interface!`](crate::profiled_interface) or written
/// by hand on top of [`Proxy::invoke`] and [`Proxy::invoke_mut`].
pub struct Proxy<T, I: ?Sized> {
    target: T,
    target_type: &'static str,
    operations: OperationTable,
    clock: Arc<dyn Clock>,
    state: Arc<ProfilingState>,
    start_time: DateTime<Utc>,
    _interface: PhantomData<fn(&I)>,
}

impl<T, I: Interface + ?Sized> Proxy<T, I> {
    /// Build a proxy around `target`
    ///
    /// `start_time` is kept for reporting only and plays no part in timing.
    /// Fails if the interface's operation table is ambiguous.
    pub fn new(
        target: T,
        clock: Arc<dyn Clock>,
        state: Arc<ProfilingState>,
        start_time: DateTime<Utc>,
    ) -> Result<Self, ConstructionError> {
        let operations = OperationTable::for_interface::<I>()?;
        let target_type = type_name::<T>();
        tracing::debug!(
            target_type,
            interface = I::NAME,
            operations = operations.len(),
            profiled = operations.profiled_count(),
            "created profiling proxy"
        );
        Ok(Self {
            target,
            target_type,
            operations,
            clock,
            state,
            start_time,
            _interface: PhantomData,
        })
    }
}

impl<T, I: ?Sized> Proxy<T, I> {
    /// Route a `&self` call to the target, timing it if the operation is profiled
    ///
    /// Returns `Err` only when the interception mechanism cannot reach the
    /// operation; the target's own outcome is always inside `Ok`.
    pub fn try_invoke<R>(
        &self,
        operation: &str,
        call: impl FnOnce(&T) -> R,
    ) -> Result<R, InterceptError> {
        self.try_invoke_as(self.target_type, operation, call)
    }

    /// Like [`Proxy::try_invoke`], recording under `target_type`
    ///
    /// Used when the wrapped value only knows its concrete type at runtime,
    /// e.g. a `Box<dyn Trait>` chosen by configuration.
    pub fn try_invoke_as<R>(
        &self,
        target_type: &'static str,
        operation: &str,
        call: impl FnOnce(&T) -> R,
    ) -> Result<R, InterceptError> {
        let operation = self.lookup(operation)?;
        let _timer = CallTimer::start_if(
            &operation,
            self.clock.as_ref(),
            self.state.as_ref(),
            target_type,
        );
        Ok(call(&self.target))
    }

    /// Route a `&mut self` call to the target, timing it if the operation is profiled
    pub fn try_invoke_mut<R>(
        &mut self,
        operation: &str,
        call: impl FnOnce(&mut T) -> R,
    ) -> Result<R, InterceptError> {
        let operation = self.lookup(operation)?;
        let _timer = CallTimer::start_if(
            &operation,
            self.clock.as_ref(),
            self.state.as_ref(),
            self.target_type,
        );
        Ok(call(&mut self.target))
    }

    /// Like [`Proxy::try_invoke`], escalating interception failures
    ///
    /// # Panics
    ///
    /// Panics if `operation` is not registered on the interface. That can only
    /// happen through a hand-written adapter that disagrees with its own
    /// operation table, which is a programming error rather than an outcome
    /// of the target.
    pub fn invoke<R>(&self, operation: &str, call: impl FnOnce(&T) -> R) -> R {
        match self.try_invoke(operation, call) {
            Ok(result) => result,
            Err(err) => escalate(err),
        }
    }

    /// Like [`Proxy::try_invoke_as`], escalating interception failures
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Proxy::invoke`].
    pub fn invoke_as<R>(
        &self,
        target_type: &'static str,
        operation: &str,
        call: impl FnOnce(&T) -> R,
    ) -> R {
        match self.try_invoke_as(target_type, operation, call) {
            Ok(result) => result,
            Err(err) => escalate(err),
        }
    }

    /// Like [`Proxy::try_invoke_mut`], escalating interception failures
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Proxy::invoke`].
    pub fn invoke_mut<R>(&mut self, operation: &str, call: impl FnOnce(&mut T) -> R) -> R {
        match self.try_invoke_mut(operation, call) {
            Ok(result) => result,
            Err(err) => escalate(err),
        }
    }

    /// Declared type name of the wrapped value
    ///
    /// Keys records made through [`Proxy::invoke`]. Adapters generated by
    /// [`profiled_interface!`](crate::profiled_interface) key on the runtime
    /// type instead, which differs only for boxed or shared trait objects.
    pub fn target_type(&self) -> &'static str {
        self.target_type
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// When the owning profiler was created
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Shared aggregate this proxy records into
    pub fn state(&self) -> &Arc<ProfilingState> {
        &self.state
    }

    /// Unwrap the proxy and return the target
    pub fn into_inner(self) -> T {
        self.target
    }

    fn lookup(&self, name: &str) -> Result<Operation, InterceptError> {
        self.operations
            .get(name)
            .copied()
            .ok_or_else(|| InterceptError::UnknownOperation {
                interface: self.operations.interface(),
                operation: name.to_string(),
            })
    }
}

fn escalate(err: InterceptError) -> ! {
    tracing::error!(error = %err, "interception failed");
    panic!("interception failed: {err}");
}

impl<T: fmt::Debug, I: ?Sized> fmt::Debug for Proxy<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("target", &self.target)
            .field("interface", &self.operations.interface())
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}
