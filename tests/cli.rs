use clap::Parser;
use llm_inference_core::cli::{commands::Commands, Cli};
use std::path::PathBuf;

#[test]
fn test_generate_command_parsing() {
    let cli = Cli::try_parse_from([
        "llm-inference",
        "generate",
        "Tell me a story",
        "--json",
        "--model",
        "/models/gemma-unique.bin",
        "--max-tokens",
        "128",
        "-v",
    ])
    .unwrap();

    match cli.command {
        Commands::Generate(cmd) => {
            assert_eq!(cmd.prompt, "Tell me a story");
            assert!(cmd.json);
        }
        _ => panic!("expected generate command"),
    }
    assert_eq!(cli.config.model, Some(PathBuf::from("/models/gemma-unique.bin")));
    assert_eq!(cli.config.max_tokens, Some(128));
    assert!(!cli.config.emit_summary);
    assert_eq!(cli.logging.get_effective_level(), "debug");
}

#[test]
fn test_chat_command_parsing() {
    let cli = Cli::try_parse_from(["llm-inference", "--emit-summary", "chat", "--metrics", "-vv"]).unwrap();

    match cli.command {
        Commands::Chat(cmd) => assert!(cmd.metrics),
        _ => panic!("expected chat command"),
    }
    assert!(cli.config.emit_summary);
    assert_eq!(cli.logging.get_effective_level(), "trace");
}

#[test]
fn test_generate_requires_prompt() {
    assert!(Cli::try_parse_from(["llm-inference", "generate"]).is_err());
}
