use std::sync::Arc;

use mail_agent::agent::{AgentExecutor, PromptContext};
use mail_agent::config::{AgentConfig, ModelConfig, SmtpConfig};
use mail_agent::llm::create_client;
use mail_agent::pipeline::Pipeline;
use mail_agent::store::SpoolStore;
use mail_agent::tools::{ToolRegistry, WebFetchTool};
use mail_agent::transport::{LogTransport, MailTransport, SmtpMailer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    let model_config = ModelConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("📬 Mail Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Agent: {} <{}>", config.agent_name, config.agent_email);
    eprintln!("   Model: {}", model_config.model);
    eprintln!("   Spool: {}", config.spool_dir.display());

    let model = create_client(model_config);

    let store = Arc::new(SpoolStore::new(&config.spool_dir));
    store.ensure_dirs().await.unwrap_or_else(|e| {
        eprintln!(
            "Error: failed to prepare spool at {}: {e}",
            config.spool_dir.display()
        );
        std::process::exit(1);
    });

    let transport: Arc<dyn MailTransport> = match SmtpConfig::from_env(&config.agent_email) {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "Sending replies over SMTP");
            Arc::new(SmtpMailer::new(smtp))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, replies will only be logged");
            Arc::new(LogTransport)
        }
    };

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(WebFetchTool::new()));
    let tools = Arc::new(tools);

    let prompt_context = PromptContext {
        agent_name: config.agent_name.clone(),
        agent_email: config.agent_email.clone(),
        info_source: config.info_source.clone(),
        tools: tools.descriptors(),
    };

    let executor = Arc::new(AgentExecutor::new(
        model,
        tools,
        prompt_context,
        config.max_iterations,
        config.loop_deadline,
    ));

    let pipeline = Arc::new(Pipeline::new(config, store, transport, executor));
    pipeline.run().await;

    tracing::info!("Mail agent stopped");
    Ok(())
}
