use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use taxdesk::api::{server, AppContext};
use taxdesk::backend::{HttpBackend, HttpFetcher};
use taxdesk::config::Settings;
use taxdesk::extraction::DocumentExtractor;
use taxdesk::llm::HttpModelClient;
use taxdesk::workflow::{NotifyWorkflow, OcrWorkflow, TrackerWorkflow};

#[derive(Parser)]
#[command(name = "taxdesk", version, about = "Tax office workflow automation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP trigger API.
    Serve,
    /// Run document OCR for one document.
    Ocr { document_id: String },
    /// Send a status-change notification to a customer.
    Notify {
        customer_id: String,
        status: String,
        #[arg(long)]
        return_id: Option<String>,
    },
    /// Check one return against the progression rules.
    Check { return_id: String },
    /// List returns that are overdue or due soon.
    Deadlines,
    /// List returns that need a filing extension.
    Extensions,
}

fn build_context(settings: &Settings) -> AppContext {
    let backend = Arc::new(HttpBackend::new(
        &settings.backend_base_url,
        &settings.backend_token,
    ));
    let model = Arc::new(HttpModelClient::new(
        &settings.model_base_url,
        &settings.model_api_key,
    ));

    let ocr = Arc::new(OcrWorkflow::new(
        backend.clone(),
        Arc::new(HttpFetcher::new()),
        DocumentExtractor::new(model.clone(), &settings.ocr_model),
        settings.max_file_bytes(),
    ));
    let notifier = Arc::new(NotifyWorkflow::new(
        backend.clone(),
        model,
        &settings.notify_model,
        &settings.firm_name,
    ));
    let tracker = Arc::new(TrackerWorkflow::new(backend, notifier.clone()));

    AppContext::new(ocr, notifier, tracker)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to encode output: {e}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    taxdesk::init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    let ctx = build_context(&settings);

    match cli.command {
        Command::Serve => {
            if let Err(e) = server::serve(ctx, &settings.bind_addr).await {
                tracing::error!(error = %e, "server exited with error");
                return ExitCode::FAILURE;
            }
        }
        Command::Ocr { document_id } => {
            let outcome = ctx.ocr.process_document(&document_id).await;
            print_json(&outcome);
            if !outcome.success {
                return ExitCode::FAILURE;
            }
        }
        Command::Notify {
            customer_id,
            status,
            return_id,
        } => {
            let sent = ctx
                .notifier
                .notify_status_change(&customer_id, &status, return_id.as_deref())
                .await;
            print_json(&serde_json::json!({ "sent": sent }));
            if !sent {
                return ExitCode::FAILURE;
            }
        }
        Command::Check { return_id } => {
            let report = ctx.tracker.check_return(&return_id).await;
            let failed = report.error.is_some();
            print_json(&report);
            if failed {
                return ExitCode::FAILURE;
            }
        }
        Command::Deadlines => match ctx.tracker.check_deadlines().await {
            Ok(alerts) => print_json(&alerts),
            Err(e) => {
                eprintln!("deadline scan failed: {e}");
                return ExitCode::FAILURE;
            }
        },
        Command::Extensions => match ctx.tracker.check_extensions().await {
            Ok(candidates) => print_json(&candidates),
            Err(e) => {
                eprintln!("extension scan failed: {e}");
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}
