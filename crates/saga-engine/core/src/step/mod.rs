//! # Step Engine
//!
//! Ordered, resumable step sequencing for sagas whose progress lives in
//! persisted state rather than in the engine.
//!
//! A saga is defined once as an immutable [`Steps`] sequence. Each run walks
//! the sequence in registration order and asks a caller-supplied [`Perform`]
//! implementation to execute one *attempt* of the current step. An attempt is
//! the caller's unit of atomicity: it typically opens a transaction, builds a
//! fresh context, invokes the step and commits.
//!
//! - A plain step is done after one successful attempt.
//! - A step followed by [`StepsBuilder::until`] is re-attempted until its
//!   predicate holds on the context of the latest attempt.
//! - The first error aborts the run. The engine performs no compensation.
//!
//! Because every step re-checks persisted progress before acting, a crashed
//! or redelivered run resumes at the first unmet condition without the engine
//! keeping a cursor.
//!
//! ```ignore
//! let steps = StepsBuilder::<MyContext, MyError>::new()
//!     .step("ensure_account", |ctx| Box::pin(ensure_account(ctx)))
//!     .step("ensure_acl", |ctx| Box::pin(ensure_acl(ctx)))
//!     .until(|ctx| ctx.has_acl())
//!     .build();
//!
//! steps.run(&mut performer).await?;
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Future returned by a step action, borrowing the attempt context.
pub type StepFuture<'a, E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'a>>;

type StepAction<C, E> = Box<dyn for<'a> Fn(&'a mut C) -> StepFuture<'a, E> + Send + Sync>;
type StepPredicate<C> = Box<dyn Fn(&C) -> bool + Send + Sync>;

/// One registered unit of work with its optional loop condition.
pub struct Step<C, E> {
    name: &'static str,
    action: StepAction<C, E>,
    until: Option<StepPredicate<C>>,
}

impl<C, E> Step<C, E> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the step is re-attempted until a predicate holds.
    pub fn is_looped(&self) -> bool {
        self.until.is_some()
    }

    /// Invokes the step once against `ctx`.
    ///
    /// Returns `Ok(true)` when the step is done and the run may advance.
    pub async fn invoke(&self, ctx: &mut C) -> Result<bool, E> {
        (self.action)(ctx).await?;
        Ok(self.until.as_ref().is_none_or(|until| until(ctx)))
    }
}

impl<C, E> std::fmt::Debug for Step<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("looped", &self.is_looped())
            .finish()
    }
}

/// Executes a single attempt of a step.
///
/// Implementations own everything an attempt needs: they begin the
/// transaction, build a fresh context, call [`Step::invoke`], persist and
/// commit. Returning an error aborts the surrounding [`Steps::run`].
#[async_trait]
pub trait Perform<C, E>: Send {
    async fn perform(&mut self, step: &Step<C, E>) -> Result<bool, E>;
}

/// Builder for an immutable [`Steps`] sequence.
pub struct StepsBuilder<C, E> {
    steps: Vec<Step<C, E>>,
}

impl<C, E> Default for StepsBuilder<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> StepsBuilder<C, E> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a step that is done after one successful invocation.
    pub fn step<F>(mut self, name: &'static str, action: F) -> Self
    where
        F: for<'a> Fn(&'a mut C) -> StepFuture<'a, E> + Send + Sync + 'static,
    {
        self.steps.push(Step {
            name,
            action: Box::new(action),
            until: None,
        });
        self
    }

    /// Makes the immediately preceding step repeat until `predicate` holds.
    ///
    /// Must follow [`StepsBuilder::step`]; calling it first is a programming
    /// error (asserted in debug builds, ignored otherwise).
    pub fn until<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        debug_assert!(!self.steps.is_empty(), "until() must follow step()");
        if let Some(last) = self.steps.last_mut() {
            last.until = Some(Box::new(predicate));
        }
        self
    }

    pub fn build(self) -> Steps<C, E> {
        Steps {
            steps: self.steps.into(),
        }
    }
}

/// Immutable, shareable step sequence of a saga definition.
pub struct Steps<C, E> {
    steps: Arc<[Step<C, E>]>,
}

impl<C, E> Clone for Steps<C, E> {
    fn clone(&self) -> Self {
        Self {
            steps: Arc::clone(&self.steps),
        }
    }
}

impl<C, E> std::fmt::Debug for Steps<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.iter()).finish()
    }
}

impl<C, E> Steps<C, E> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|step| step.name)
    }

    /// Runs every step in order, attempting each until it reports done.
    pub async fn run<P>(&self, performer: &mut P) -> Result<(), E>
    where
        P: Perform<C, E> + ?Sized,
    {
        for step in self.steps.iter() {
            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                if performer.perform(step).await? {
                    break;
                }
            }
            debug!(step = step.name, attempts, "Step completed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Counter {
        log: Vec<&'static str>,
        value: u32,
    }

    async fn record_a(ctx: &mut Counter) -> Result<(), String> {
        ctx.log.push("a");
        Ok(())
    }

    async fn increment(ctx: &mut Counter) -> Result<(), String> {
        ctx.log.push("inc");
        ctx.value += 1;
        Ok(())
    }

    async fn fail(_ctx: &mut Counter) -> Result<(), String> {
        Err("boom".to_string())
    }

    /// Keeps one context across attempts so tests can observe the log.
    struct SharedContext {
        ctx: Counter,
        attempts: usize,
    }

    #[async_trait]
    impl Perform<Counter, String> for SharedContext {
        async fn perform(&mut self, step: &Step<Counter, String>) -> Result<bool, String> {
            self.attempts += 1;
            step.invoke(&mut self.ctx).await
        }
    }

    fn performer() -> SharedContext {
        SharedContext {
            ctx: Counter::default(),
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn test_steps_run_in_registration_order_once_each() {
        let steps = StepsBuilder::<Counter, String>::new()
            .step("a", |ctx| Box::pin(record_a(ctx)))
            .step("inc", |ctx| Box::pin(increment(ctx)))
            .build();

        let mut p = performer();
        steps.run(&mut p).await.unwrap();

        assert_eq!(p.ctx.log, vec!["a", "inc"]);
        assert_eq!(p.attempts, 2);
    }

    #[tokio::test]
    async fn test_until_repeats_preceding_step_once_per_attempt() {
        let steps = StepsBuilder::<Counter, String>::new()
            .step("inc", |ctx| Box::pin(increment(ctx)))
            .until(|ctx| ctx.value >= 3)
            .step("a", |ctx| Box::pin(record_a(ctx)))
            .build();

        let mut p = performer();
        steps.run(&mut p).await.unwrap();

        assert_eq!(p.ctx.value, 3);
        assert_eq!(p.ctx.log, vec!["inc", "inc", "inc", "a"]);
        assert_eq!(p.attempts, 4);
    }

    #[tokio::test]
    async fn test_error_aborts_run_without_executing_later_steps() {
        let steps = StepsBuilder::<Counter, String>::new()
            .step("a", |ctx| Box::pin(record_a(ctx)))
            .step("fail", |ctx| Box::pin(fail(ctx)))
            .step("inc", |ctx| Box::pin(increment(ctx)))
            .build();

        let mut p = performer();
        let err = steps.run(&mut p).await.unwrap_err();

        assert_eq!(err, "boom");
        assert_eq!(p.ctx.log, vec!["a"]);
        assert_eq!(p.ctx.value, 0);
    }

    #[tokio::test]
    async fn test_until_predicate_is_checked_after_invocation() {
        let steps = StepsBuilder::<Counter, String>::new()
            .step("inc", |ctx| Box::pin(increment(ctx)))
            .until(|_| true)
            .build();

        let mut p = performer();
        steps.run(&mut p).await.unwrap();

        assert_eq!(p.ctx.value, 1);
    }

    #[test]
    fn test_built_sequence_is_immutable_and_named() {
        let steps = StepsBuilder::<Counter, String>::new()
            .step("a", |ctx| Box::pin(record_a(ctx)))
            .step("inc", |ctx| Box::pin(increment(ctx)))
            .until(|ctx| ctx.value > 1)
            .build();

        let shared = steps.clone();
        assert_eq!(shared.names().collect::<Vec<_>>(), vec!["a", "inc"]);
        assert_eq!(steps.len(), 2);
        assert!(!steps.is_empty());
    }
}
