//! Utility functions for CLI commands.

use std::path::Path;

use voxguard_cli::{Config, Context, Output, OutputFormat, load_config};

use crate::Cli;

pub const APP_NAME: &str = "voxguard";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context to use; built-in defaults when none is configured.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    get_config(cli)?.context_or_default(cli.context.as_deref())
}

/// Output honoring `--json` and `-o`.
pub fn output(cli: &Cli) -> Output {
    Output::new(OutputFormat::from_json_flag(cli.json), cli.output.clone())
}

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("✓ {}", message);
}

/// Media type for an audio file, by extension.
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" | "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        "webm" => "audio/webm",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("a/clip.MP3")), Some("audio/mpeg"));
        assert_eq!(media_type_for(Path::new("clip.wav")), Some("audio/wav"));
        assert_eq!(media_type_for(Path::new("clip.m4a")), Some("audio/mp4"));
        assert_eq!(media_type_for(Path::new("clip.txt")), None);
        assert_eq!(media_type_for(Path::new("clip")), None);
    }
}
