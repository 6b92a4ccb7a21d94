pub mod commands;

use crate::app::build_service;
use crate::chat::models::{ChatContext, ChatRequest};
use crate::chat::prompt::describe_schema;
use crate::cli::commands::Commands;
use crate::config::AppConfig;
use crate::error::AppError;

pub async fn run_cli(command: Commands, config_path: String) -> Result<(), AppError> {
    let config = AppConfig::load(&config_path)?;
    let service = build_service(&config)?;

    match command {
        // main runs the server itself
        Commands::Serve => return Err(AppError::UnsupportedCommand("serve")),
        Commands::Ask { question, session } => {
            let reply = service
                .handle(ChatRequest {
                    session_id: session,
                    message: question,
                    context: ChatContext::default(),
                })
                .await?;

            println!("{}", reply.message.content);
            if let Some(sql) = &reply.sql_query {
                println!("\nSQL: {}", sql);
            }
            if !reply.query_result.rows.is_empty() {
                println!("\n{}", reply.query_result.columns.join(" | "));
                for row in &reply.query_result.rows {
                    let cells: Vec<String> = reply
                        .query_result
                        .columns
                        .iter()
                        .map(|c| row.get(c).map(|v| v.to_string()).unwrap_or_default())
                        .collect();
                    println!("{}", cells.join(" | "));
                }
                if reply.query_result.truncated {
                    println!("... (truncated)");
                }
            }
            println!("\nconfidence: {:.2}", reply.confidence);
        }
        Commands::Tables => {
            let tables = service.tables().await?;
            print!("{}", describe_schema(&tables));
        }
        Commands::Suggest => {
            for suggestion in service.suggestions().await? {
                println!("- {}", suggestion);
            }
        }
        Commands::History { session } => {
            let messages = service.history(&session).await?;
            if messages.is_empty() {
                println!("No messages for session {}.", session);
            }
            for m in messages {
                println!("[{}] {}: {}", m.timestamp.format("%Y-%m-%d %H:%M:%S"), m.role.as_str().to_uppercase(), m.content);
                if let Some(sql) = &m.generated_query {
                    println!("    SQL: {}", sql);
                }
            }
        }
        Commands::Clear { session } => {
            service.clear_history(&session).await?;
            println!("Cleared history for session {}", session);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serve_is_not_dispatched_as_a_cli_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "llm:\n  preference: [\"ollama\"]\n  ollama:\n    base_url: \"http://localhost:11434\"\n    default_model: \"llama3.2\"\n",
        )
        .unwrap();

        let result = run_cli(Commands::Serve, path.to_str().unwrap().to_string()).await;
        assert!(matches!(result, Err(AppError::UnsupportedCommand("serve"))));
    }
}
