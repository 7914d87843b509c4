//! services/client/src/bin/quiz.rs
//!
//! Command-line driver for the quiz client.
//!
//!   quiz quick-create <material_file_url> [number_of_questions]
//!   quiz open <course_id> <material_id>

use std::io::Write;

use client_lib::{
    config::Config,
    error::ClientError,
    session::{state::ClientState, Notifier},
};
use study_helper_core::domain::{QuestionType, QuickCreateRequest};
use study_helper_core::generation::GenerationState;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: quiz quick-create <material_file_url> [number_of_questions] | quiz open <course_id> <material_id>";

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base_url);

    // --- 2. Route failures to stderr the way a toast would show them ---
    let (notifier, mut notifications) = Notifier::channel();
    tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            eprintln!("[{}] {}", notification.title, notification.message);
        }
    });

    // --- 3. Build the Shared ClientState ---
    let state = ClientState::from_config(&config, Some(notifier))?;

    // --- 4. Dispatch ---
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("quick-create") => quick_create(&state, &args[1..]).await,
        Some("open") => open_material(&state, &args[1..]).await,
        _ => Err(ClientError::Internal(USAGE.to_string())),
    }
}

async fn quick_create(state: &ClientState, args: &[String]) -> Result<(), ClientError> {
    let material_file_url = args
        .first()
        .ok_or_else(|| ClientError::Internal(USAGE.to_string()))?;
    let number_of_questions = match args.get(1) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|e| {
            ClientError::Internal(format!("invalid number of questions '{}': {}", raw, e))
        })?),
        None => None,
    };

    let quizzes = state.quiz_service();
    let poller = state.generation_poller(quizzes.clone());
    let request = QuickCreateRequest {
        material_file_url: material_file_url.clone(),
        number_of_questions,
        ..Default::default()
    };

    let Some(handle) = poller.quick_create(&request).await else {
        return Err(ClientError::Internal(
            quizzes.calls().error().unwrap_or_else(|| "quick-create failed".to_string()),
        ));
    };
    info!("Waiting for quiz {} to be generated...", handle.quiz_id());

    let settled = tokio::select! {
        settled = handle.settled() => settled,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; abandoning generation of quiz {}.", handle.quiz_id());
            handle.cancel();
            handle.state()
        }
    };

    match settled {
        GenerationState::Completed { quiz, questions, .. } => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{} ({} questions)", quiz.title, questions.len())?;
            for (idx, question) in questions.iter().enumerate() {
                writeln!(out, "{}. {}", idx + 1, question.question)?;
                match question.question_type {
                    QuestionType::Mcq => {
                        for (letter, option) in question.allowed_values().iter().zip(&question.options) {
                            writeln!(out, "   {}. {}", letter, option.text)?;
                        }
                    }
                    QuestionType::TrueFalse => writeln!(out, "   true / false")?,
                }
            }
            out.flush()?;
            Ok(())
        }
        GenerationState::Failed { error, .. } => Err(error.into()),
        GenerationState::Idle | GenerationState::Generating { .. } => Ok(()),
    }
}

async fn open_material(state: &ClientState, args: &[String]) -> Result<(), ClientError> {
    let parse = |idx: usize| -> Result<u64, ClientError> {
        let raw = args
            .get(idx)
            .ok_or_else(|| ClientError::Internal(USAGE.to_string()))?;
        raw.parse::<u64>()
            .map_err(|e| ClientError::Internal(format!("invalid id '{}': {}", raw, e)))
    };
    let (course_id, material_id) = (parse(0)?, parse(1)?);

    let library = state.material_library(course_id);
    library.load().await;
    let material = library
        .find(material_id)
        .ok_or_else(|| ClientError::Internal(format!("material {} is not in course {}", material_id, course_id)))?;

    match library.open(material_id).await {
        Some(url) => {
            writeln!(
                std::io::stdout(),
                "{} [{}, {}] -> {}",
                material.file_name,
                material.display_type(),
                material.formatted_size(),
                url
            )?;
            library.dispose();
            Ok(())
        }
        None => Err(ClientError::Internal(
            library.calls().error().unwrap_or_else(|| "download failed".to_string()),
        )),
    }
}
