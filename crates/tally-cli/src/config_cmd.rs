use crate::config::{Config, ConfigError, ConfigPaths, validate_format, validate_level};
use clap::Args;
use log::debug;
use std::process::Command;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Print the current config
    #[arg(long)]
    pub print: bool,

    /// Edit config in $VISUAL or $EDITOR
    #[arg(long)]
    pub edit: bool,

    /// Set a config value (dotted key=value)
    #[arg(long, value_name = "key=value")]
    pub set: Vec<String>,
}

pub fn run(args: &ConfigArgs, paths: &ConfigPaths) -> Result<(), ConfigError> {
    if args.edit && (!args.set.is_empty() || args.print) {
        return Err(ConfigError::Validation(
            "--edit cannot be combined with --set or --print".into(),
        ));
    }

    let mut config = Config::load_or_create(paths)?;

    if args.edit {
        edit_config(paths)?;
        config = Config::load(paths)?;
        config.validate()?;
        return Ok(());
    }

    if !args.set.is_empty() {
        for assignment in &args.set {
            apply_set(&mut config, assignment)?;
        }
        config.validate()?;
        Config::write(paths, &config)?;
    }

    if args.print || args.set.is_empty() {
        let output = toml::to_string_pretty(&config)?;
        println!("{output}");
    }

    Ok(())
}

fn edit_config(paths: &ConfigPaths) -> Result<(), ConfigError> {
    let editor = resolve_editor(
        std::env::var("VISUAL").ok(),
        std::env::var("EDITOR").ok(),
    )?;
    debug!(
        "event=config_edit module=config status=start editor={}",
        editor.program
    );
    let status = Command::new(&editor.program)
        .args(&editor.args)
        .arg(&paths.config_path)
        .status()
        .map_err(ConfigError::Io)?;
    if !status.success() {
        return Err(ConfigError::Validation(format!(
            "{} exited with {status}",
            editor.program
        )));
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
struct EditorCommand {
    program: String,
    args: Vec<String>,
}

/// `$VISUAL` wins over `$EDITOR`; blank values count as unset.
fn resolve_editor(
    visual: Option<String>,
    editor: Option<String>,
) -> Result<EditorCommand, ConfigError> {
    let raw = [visual, editor]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            ConfigError::Validation("neither $VISUAL nor $EDITOR is set; use --set".into())
        })?;
    let mut words = shell_words(&raw)?.into_iter();
    let program = words
        .next()
        .filter(|program| !program.is_empty())
        .ok_or_else(|| ConfigError::Validation("editor command is empty".into()))?;
    Ok(EditorCommand {
        program,
        args: words.collect(),
    })
}

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Whitespace-separated words with POSIX-style quoting and backslash escapes.
fn shell_words(line: &str) -> Result<Vec<String>, ConfigError> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut quote = Quote::None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Quote::None, '\'') => quote = Quote::Single,
            (Quote::None, '"') => quote = Quote::Double,
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::None | Quote::Double, '\\') => {
                if let Some(next) = chars.next() {
                    word.get_or_insert_with(String::new).push(next);
                }
                continue;
            }
            (Quote::None, ch) if ch.is_whitespace() => {
                words.extend(word.take());
                continue;
            }
            (_, ch) => word.get_or_insert_with(String::new).push(ch),
        }
        // A quote pair alone still opens a (possibly empty) word.
        word.get_or_insert_with(String::new);
    }

    if quote != Quote::None {
        return Err(ConfigError::Validation(
            "editor command has an unterminated quote".into(),
        ));
    }
    words.extend(word);
    Ok(words)
}

fn apply_set(config: &mut Config, assignment: &str) -> Result<(), ConfigError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| ConfigError::Validation("expected key=value for --set".into()))?;
    let key = key.trim();
    let value = value.trim();
    match key {
        "extract.min_task_chars" => {
            let parsed = parse_usize(value, key)?;
            if parsed == 0 {
                return Err(ConfigError::Validation(
                    "extract.min_task_chars must be greater than 0".into(),
                ));
            }
            config.extract.min_task_chars = parsed;
        }
        "extract.max_items" => {
            config.extract.max_items = parse_usize(value, key)?;
        }
        "entities.participants" => {
            config.entities.participants = parse_participants(value);
        }
        "entities.detect_dates" => {
            config.entities.detect_dates = parse_bool(value, key)?;
        }
        "output.format" => {
            let format = value.to_ascii_lowercase();
            validate_format(key, &format)?;
            config.output.format = format;
        }
        "log.level" => {
            validate_level(key, value)?;
            config.log.level = value.to_ascii_lowercase();
        }
        _ => {
            return Err(ConfigError::Validation(format!(
                "unknown config key: {key}"
            )));
        }
    }
    Ok(())
}

fn parse_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::Validation(format!(
            "{key} expects true or false"
        ))),
    }
}

fn parse_usize(value: &str, key: &str) -> Result<usize, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects an unsigned integer")))
}

/// Comma-separated names; an empty value clears the roster.
pub fn parse_participants(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_words_respects_quotes_and_escapes() {
        let words = shell_words(r#""/Applications/VS Code" --wait my\ file '' "#).unwrap();
        assert_eq!(words, vec!["/Applications/VS Code", "--wait", "my file", ""]);
    }

    #[test]
    fn shell_words_rejects_unterminated_quote() {
        let err = shell_words("vim 'notes").unwrap_err();
        assert!(err.to_string().contains("unterminated quote"));
    }

    #[test]
    fn visual_takes_precedence_over_editor() {
        let editor = resolve_editor(Some("code --wait".into()), Some("vi".into())).unwrap();
        assert_eq!(
            editor,
            EditorCommand {
                program: "code".to_string(),
                args: vec!["--wait".to_string()],
            }
        );

        let editor = resolve_editor(Some("  ".into()), Some("nano".into())).unwrap();
        assert_eq!(editor.program, "nano");
        assert!(editor.args.is_empty());
    }

    #[test]
    fn missing_editor_is_a_validation_error() {
        let err = resolve_editor(None, Some(String::new())).unwrap_err();
        assert!(err.to_string().contains("$VISUAL"));
        let err = resolve_editor(Some("\"\" -w".into()), None).unwrap_err();
        assert!(err.to_string().contains("editor command is empty"));
    }

    #[test]
    fn apply_set_updates_known_keys() {
        let mut config = Config::default();
        apply_set(&mut config, "extract.max_items=10").unwrap();
        apply_set(&mut config, "extract.min_task_chars = 4").unwrap();
        apply_set(&mut config, "entities.participants=Dana Kim, Alex Ruiz,").unwrap();
        apply_set(&mut config, "entities.detect_dates=false").unwrap();
        apply_set(&mut config, "output.format=JSON").unwrap();
        apply_set(&mut config, "log.level=Debug").unwrap();

        assert_eq!(config.extract.max_items, 10);
        assert_eq!(config.extract.min_task_chars, 4);
        assert_eq!(config.entities.participants, vec!["Dana Kim", "Alex Ruiz"]);
        assert!(!config.entities.detect_dates);
        assert_eq!(config.output.format, "json");
        assert_eq!(config.log.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn apply_set_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply_set(&mut config, "extract.max_items").is_err());
        assert!(apply_set(&mut config, "extract.max_items=-1").is_err());
        assert!(apply_set(&mut config, "extract.min_task_chars=0").is_err());
        assert!(apply_set(&mut config, "entities.detect_dates=yes").is_err());
        assert!(apply_set(&mut config, "output.format=xml").is_err());
        assert!(apply_set(&mut config, "log.level=loud").is_err());

        let err = apply_set(&mut config, "ui.theme=dark").unwrap_err();
        assert!(err.to_string().contains("unknown config key"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn set_then_print_persists_to_disk() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_base(temp.path().join("tally"));
        let args = ConfigArgs {
            print: false,
            edit: false,
            set: vec!["extract.max_items=3".to_string()],
        };
        run(&args, &paths).unwrap();
        assert_eq!(Config::load(&paths).unwrap().extract.max_items, 3);
    }

    #[test]
    fn edit_cannot_combine_with_set() {
        let temp = tempfile::tempdir().unwrap();
        let paths = ConfigPaths::from_base(temp.path().join("tally"));
        let args = ConfigArgs {
            print: false,
            edit: true,
            set: vec!["log.level=info".to_string()],
        };
        assert!(run(&args, &paths).is_err());
    }
}
