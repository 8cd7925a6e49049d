//! Relay plugin pipeline

use crate::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Before the provider is called
    PreOperation,
    /// After the reply has been classified
    PostOperation,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::PreOperation => write!(f, "pre-operation"),
            PipelineStage::PostOperation => write!(f, "post-operation"),
        }
    }
}

/// Runs registered plugins stage by stage
pub struct PipelineRunner {
    plugins: HashMap<PipelineStage, Vec<Arc<dyn PipelinePlugin>>>,
}

impl PipelineRunner {
    /// Create an empty pipeline runner
    pub fn new() -> Self {
        Self {
            plugins: HashMap::new(),
        }
    }

    /// Runner with the built-in logging and audit plugins
    pub fn with_builtin_plugins() -> Self {
        let mut runner = Self::new();
        runner.register_plugin(PipelineStage::PreOperation, Arc::new(RequestLoggingPlugin::new()));
        runner.register_plugin(PipelineStage::PostOperation, Arc::new(ClassificationAuditPlugin::new()));
        runner
    }

    /// Register a plugin for a specific stage
    pub fn register_plugin(&mut self, stage: PipelineStage, plugin: Arc<dyn PipelinePlugin>) {
        self.plugins.entry(stage).or_default().push(plugin);
    }

    /// Execute plugins for a specific stage.
    ///
    /// A plugin halting with an error stores the message in `ctx.error` and
    /// fails the stage.
    pub async fn run_stage(&self, stage: PipelineStage, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(plugins) = self.plugins.get(&stage) else {
            return Ok(());
        };
        debug!("Executing {} plugins for stage {}", plugins.len(), stage);

        for (index, plugin) in plugins.iter().enumerate() {
            debug!("Executing plugin {} ({}) for stage {}", plugin.name(), index + 1, stage);

            match plugin.call(ctx).await {
                PluginOutcome::Continue => continue,
                PluginOutcome::Halt => {
                    info!("Plugin {} halted stage {}", plugin.name(), stage);
                    break;
                }
                PluginOutcome::HaltWithError(e) => {
                    error!("Plugin {} halted with error: {}", plugin.name(), e);
                    ctx.error = Some(e.to_string());
                    return Err(PipelineError::PipelineHalted(format!("{}: {}", plugin.name(), e)));
                }
            }
        }

        Ok(())
    }

    /// Get the number of plugins registered for a stage
    pub fn plugin_count(&self, stage: &PipelineStage) -> usize {
        self.plugins.get(stage).map_or(0, |plugins| plugins.len())
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in request logging plugin
pub struct RequestLoggingPlugin {
    name: &'static str,
}

impl RequestLoggingPlugin {
    pub fn new() -> Self {
        Self {
            name: "RequestLogging",
        }
    }
}

impl Default for RequestLoggingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelinePlugin for RequestLoggingPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn call(&self, ctx: &mut RequestContext) -> PluginOutcome {
        debug!(
            "Chat request {}: {} messages, format {}",
            ctx.request_id,
            ctx.messages.len(),
            ctx.options
                .response_format
                .map(|format| format.as_str())
                .unwrap_or("none"),
        );

        PluginOutcome::Continue
    }
}

/// Built-in plugin recording how each reply was classified
pub struct ClassificationAuditPlugin {
    name: &'static str,
}

impl ClassificationAuditPlugin {
    pub fn new() -> Self {
        Self {
            name: "ClassificationAudit",
        }
    }
}

impl Default for ClassificationAuditPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelinePlugin for ClassificationAuditPlugin {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn call(&self, ctx: &mut RequestContext) -> PluginOutcome {
        let Some(reply) = ctx.reply.as_ref() else {
            return PluginOutcome::Continue;
        };

        let content_type = reply.content_type();
        let language = reply.metadata().language().map(str::to_string);
        info!(
            "Reply for request {} classified as {} (language: {}) in {:?}",
            ctx.request_id,
            content_type,
            language.as_deref().unwrap_or("-"),
            ctx.elapsed()
        );

        ctx.set_attribute("content_type", serde_json::json!(content_type));
        if let Some(language) = language {
            ctx.set_attribute("language", serde_json::json!(language));
        }

        PluginOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestPlugin {
        name: &'static str,
        call_count: Arc<AtomicUsize>,
    }

    impl TestPlugin {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                call_count: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PipelinePlugin for TestPlugin {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn call(&self, _ctx: &mut RequestContext) -> PluginOutcome {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            PluginOutcome::Continue
        }
    }

    fn context() -> RequestContext {
        RequestContext::new(vec![ConversationMessage::user("hi")], ChatOptions::default())
    }

    #[tokio::test]
    async fn test_stage_execution() {
        let mut runner = PipelineRunner::new();

        let plugin1 = Arc::new(TestPlugin::new("TestPlugin1"));
        let plugin2 = Arc::new(TestPlugin::new("TestPlugin2"));

        runner.register_plugin(PipelineStage::PreOperation, plugin1.clone());
        runner.register_plugin(PipelineStage::PreOperation, plugin2.clone());

        let mut ctx = context();
        assert!(runner.run_stage(PipelineStage::PreOperation, &mut ctx).await.is_ok());
        assert!(runner.run_stage(PipelineStage::PostOperation, &mut ctx).await.is_ok());

        assert_eq!(plugin1.call_count(), 1);
        assert_eq!(plugin2.call_count(), 1);
        assert_eq!(runner.plugin_count(&PipelineStage::PreOperation), 2);
        assert_eq!(runner.plugin_count(&PipelineStage::PostOperation), 0);
    }

    #[tokio::test]
    async fn test_plugin_halt() {
        struct HaltPlugin;

        #[async_trait]
        impl PipelinePlugin for HaltPlugin {
            fn name(&self) -> &'static str {
                "HaltPlugin"
            }

            async fn call(&self, _ctx: &mut RequestContext) -> PluginOutcome {
                PluginOutcome::Halt
            }
        }

        let mut runner = PipelineRunner::new();
        let test_plugin = Arc::new(TestPlugin::new("AfterHalt"));

        runner.register_plugin(PipelineStage::PreOperation, Arc::new(HaltPlugin));
        runner.register_plugin(PipelineStage::PreOperation, test_plugin.clone());

        let mut ctx = context();
        assert!(runner.run_stage(PipelineStage::PreOperation, &mut ctx).await.is_ok());
        // Plugin after halt should not be called
        assert_eq!(test_plugin.call_count(), 0);
        assert!(ctx.error.is_none());
    }

    #[tokio::test]
    async fn test_plugin_halt_with_error() {
        struct RejectPlugin;

        #[async_trait]
        impl PipelinePlugin for RejectPlugin {
            fn name(&self) -> &'static str {
                "Reject"
            }

            async fn call(&self, _ctx: &mut RequestContext) -> PluginOutcome {
                PluginOutcome::HaltWithError("quota exhausted".into())
            }
        }

        let mut runner = PipelineRunner::new();
        runner.register_plugin(PipelineStage::PreOperation, Arc::new(RejectPlugin));

        let mut ctx = context();
        let result = runner.run_stage(PipelineStage::PreOperation, &mut ctx).await;

        assert!(matches!(result, Err(PipelineError::PipelineHalted(_))));
        assert_eq!(ctx.error.as_deref(), Some("quota exhausted"));
    }

    #[tokio::test]
    async fn test_classification_audit_records_attributes() {
        let runner = PipelineRunner::with_builtin_plugins();
        let mut ctx = context();
        ctx.reply = Some(classify("```python\nprint(1)\n```"));

        runner.run_stage(PipelineStage::PostOperation, &mut ctx).await.unwrap();

        assert_eq!(ctx.get_attribute("content_type"), Some(&serde_json::json!("code")));
        assert_eq!(ctx.get_attribute("language"), Some(&serde_json::json!("python")));
    }

    #[test]
    fn test_request_context() {
        let mut ctx = context();

        assert_eq!(ctx.messages.len(), 1);
        assert!(ctx.reply.is_none());

        ctx.set_attribute("test_key", serde_json::json!("test_value"));
        assert_eq!(ctx.get_attribute("test_key"), Some(&serde_json::json!("test_value")));
    }
}
