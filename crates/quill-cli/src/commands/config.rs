//! The config command: show or change persisted settings.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use quill_core::{CompletionProvider, RecordingMode, Settings, TranscriptionProvider};

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the current configuration
    #[arg(long)]
    show: bool,

    /// Primary transcription provider (openai, groq, deepgram, local-whisper)
    #[arg(long)]
    provider: Option<TranscriptionProvider>,

    /// Fallback providers, in order (repeatable)
    #[arg(long = "fallback")]
    fallbacks: Vec<TranscriptionProvider>,

    /// Recording mode (press_to_toggle, hold_to_record, voice_activity_detection, continuous)
    #[arg(long)]
    mode: Option<RecordingMode>,

    /// Allow continuous mode with a non-local provider
    #[arg(long)]
    allow_remote_continuous: Option<bool>,

    #[arg(long)]
    openai_api_key: Option<String>,

    #[arg(long)]
    groq_api_key: Option<String>,

    #[arg(long)]
    deepgram_api_key: Option<String>,

    /// Model path for the local Whisper provider
    #[arg(long)]
    whisper_model_path: Option<String>,

    /// Language hint passed to transcription providers
    #[arg(long)]
    language: Option<String>,

    /// Transcription attempt budget per recording
    #[arg(long)]
    max_retries: Option<usize>,

    /// Find/replace rules file (.json or find,replace lines)
    #[arg(long)]
    rules_file: Option<PathBuf>,

    /// Enable or disable LLM post-processing
    #[arg(long)]
    post_processing: Option<bool>,

    /// Completion provider for post-processing (openai, claude, gemini, groq, ollama)
    #[arg(long)]
    post_provider: Option<CompletionProvider>,

    /// API key for the completion provider
    #[arg(long)]
    post_api_key: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let mut settings = Settings::load();
    let mut changed = false;

    if let Some(provider) = args.provider {
        settings.transcription.provider = provider;
        changed = true;
    }
    if !args.fallbacks.is_empty() {
        settings.transcription.fallbacks = args.fallbacks;
        changed = true;
    }
    if let Some(mode) = args.mode {
        settings.recording.mode = mode;
        changed = true;
    }
    if let Some(allow) = args.allow_remote_continuous {
        settings.recording.allow_remote_continuous = allow;
        changed = true;
    }
    for (provider, key) in [
        (TranscriptionProvider::OpenAI, args.openai_api_key),
        (TranscriptionProvider::Groq, args.groq_api_key),
        (TranscriptionProvider::Deepgram, args.deepgram_api_key),
    ] {
        if let Some(key) = key {
            settings
                .transcription
                .api_keys
                .insert(provider.as_str().to_string(), key);
            changed = true;
        }
    }
    if let Some(path) = args.whisper_model_path {
        settings.transcription.whisper_model_path = Some(path);
        changed = true;
    }
    if let Some(language) = args.language {
        settings.transcription.language = Some(language);
        changed = true;
    }
    if let Some(max_retries) = args.max_retries {
        settings.transcription.max_retries = max_retries;
        changed = true;
    }
    if let Some(rules_file) = args.rules_file {
        settings.rewrite.rules_file = Some(rules_file);
        changed = true;
    }
    if let Some(enabled) = args.post_processing {
        settings.post_processing.enabled = enabled;
        changed = true;
    }
    if let Some(provider) = args.post_provider {
        settings.post_processing.provider = provider;
        changed = true;
    }
    if let Some(key) = args.post_api_key {
        settings.post_processing.api_key = Some(key);
        changed = true;
    }
    if let Some(url) = args.ollama_url {
        settings.post_processing.ollama_url = Some(url);
        changed = true;
    }

    if changed {
        settings.save()?;
        println!("Settings saved to {}", Settings::config_path().display());
    }

    if args.show || !changed {
        print_settings(&settings);
    }

    Ok(())
}

fn print_settings(settings: &Settings) {
    println!("provider:            {}", settings.transcription.provider);
    if !settings.transcription.fallbacks.is_empty() {
        let fallbacks: Vec<&str> = settings
            .transcription
            .fallbacks
            .iter()
            .map(|p| p.as_str())
            .collect();
        println!("fallbacks:           {}", fallbacks.join(", "));
    }
    println!("mode:                {}", settings.recording.mode);
    println!("max retries:         {}", settings.transcription.max_retries);
    println!(
        "post-processing:     {}",
        if settings.post_processing.enabled {
            format!("enabled ({})", settings.post_processing.provider)
        } else {
            "disabled".to_string()
        }
    );
    match &settings.rewrite.rules_file {
        Some(path) => println!("rules file:          {}", path.display()),
        None => println!("rules file:          (none)"),
    }
    for provider in TranscriptionProvider::all() {
        let configured = settings.transcription.credential_for(provider).is_some();
        println!(
            "{:<20} {}",
            format!("{} key:", provider.as_str()),
            if configured { "configured" } else { "not set" }
        );
    }
}
