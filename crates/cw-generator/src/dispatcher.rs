//! Handling of a single configuration change.
//!
//! [`Dispatcher::on_change`] resolves paths, prepares the output directory,
//! runs the generator and reports exactly one [`Status`]. Invocations share
//! nothing mutable, so any number of them may be in flight at once.

use std::sync::Arc;

use tokio::task::JoinHandle;

use cw_core::{ChangeEvent, GeneratorConfig, LayoutConfig, ModuleRoot, Status};

use crate::error::GenerateError;
use crate::paths::{GenerationPaths, PathResolver, ensure_output_dir};
use crate::runner::{CommandRunner, Invocation};
use crate::status::StatusSink;

/// A successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Module the change belonged to.
    pub root: ModuleRoot,
    /// Paths the generator was invoked with.
    pub paths: GenerationPaths,
}

/// Turns change events into generator runs.
///
/// Cloning is cheap; clones share the runner and the sink.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use cw_core::{ChangeEvent, GeneratorConfig, LayoutConfig, ModuleRoot};
/// use cw_generator::{ConsoleSink, Dispatcher, TokioRunner};
///
/// # async fn example() {
/// let dispatcher = Dispatcher::new(
///     GeneratorConfig::default(),
///     LayoutConfig::default(),
///     Arc::new(TokioRunner),
///     Arc::new(ConsoleSink),
/// );
///
/// let event = ChangeEvent::new(ModuleRoot::new("/proj"), "/proj/config/settings.json");
/// let handle = dispatcher.spawn(event);
/// let _ = handle.await;
/// # }
/// ```
pub struct Dispatcher<R, S> {
    generator: Arc<GeneratorConfig>,
    resolver: Arc<PathResolver>,
    runner: Arc<R>,
    sink: Arc<S>,
}

impl<R, S> Clone for Dispatcher<R, S> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            resolver: Arc::clone(&self.resolver),
            runner: Arc::clone(&self.runner),
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<R, S> std::fmt::Debug for Dispatcher<R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("generator", &self.generator)
            .field("layout", self.resolver.layout())
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner, S: StatusSink> Dispatcher<R, S> {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(generator: GeneratorConfig, layout: LayoutConfig, runner: Arc<R>, sink: Arc<S>) -> Self {
        Self {
            generator: Arc::new(generator),
            resolver: Arc::new(PathResolver::new(layout)),
            runner,
            sink,
        }
    }

    /// Returns the path resolver in use.
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Handles one change and reports its outcome.
    ///
    /// Exactly one status is pushed to the sink, whatever the result.
    ///
    /// # Errors
    ///
    /// Returns the [`GenerateError`] that was reported.
    pub async fn on_change(&self, event: ChangeEvent) -> Result<Generated, GenerateError> {
        let display_name = self.generator.display_name();

        match self.generate(event).await {
            Ok(generated) => {
                self.sink.report(Status::info(format!(
                    "{display_name}: Generated {}",
                    generated.paths.output_file_name
                )));
                Ok(generated)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Generation failed");
                self.sink
                    .report(Status::error(format!("{display_name} failed: {}", error.diagnostic())));
                Err(error)
            }
        }
    }

    /// Runs [`on_change`](Self::on_change) as an independent task.
    ///
    /// The returned handle may be dropped; the task keeps running.
    pub fn spawn(&self, event: ChangeEvent) -> JoinHandle<Result<Generated, GenerateError>> {
        let this = self.clone();
        tokio::spawn(async move { this.on_change(event).await })
    }

    async fn generate(&self, event: ChangeEvent) -> Result<Generated, GenerateError> {
        let ChangeEvent { root, path } = event;
        let paths = self.resolver.resolve(&root, &path)?;

        ensure_output_dir(&paths).await?;

        let invocation = Invocation::new(self.generator.command.clone(), root.as_path())
            .args(self.generator.extra_args.iter().cloned())
            .arg(paths.input.as_str())
            .arg(paths.output.as_str());

        tracing::info!(root = %root, input = %paths.input, "Running generator");

        let output = self.runner.run(&invocation).await?;

        if !output.stdout.trim().is_empty() {
            tracing::debug!(root = %root, stdout = %output.stdout.trim_end(), "Generator output");
        }

        if !output.success() {
            return Err(GenerateError::execution(
                invocation.program,
                output.exit_code,
                output.stderr,
            ));
        }

        tracing::debug!(output = %paths.output, "Generation complete");
        Ok(Generated { root, paths })
    }
}
