use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, AREA_COMMANDS, NO_ARG_COMMANDS, PATH_COMMANDS, PROPERTY_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            command_args: BTreeMap::new(),
        }
    }

    fn with_arg(mut self, key: &str, value: Value) -> Self {
        self.command_args.insert(key.to_string(), value);
        self
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.command_args
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn arg_f64(&self, key: &str) -> Option<f64> {
        self.command_args.get(key).and_then(Value::as_f64)
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_single_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<String>>()
            .join(" "),
        Err(_) => arg.split_whitespace().collect::<Vec<&str>>().join(" "),
    }
}

/// Accepts `85`, `85.5`, `85,5` and `85 m2`.
fn parse_area(arg: &str) -> Option<f64> {
    let cleaned = arg
        .trim()
        .trim_end_matches("m²")
        .trim_end_matches("m2")
        .trim()
        .replace(',', ".");
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(action) = find_action(&command, PROPERTY_COMMANDS) {
                return Intent::new(action, text)
                    .with_arg("property", Value::String(parse_single_arg(arg)));
            }

            if let Some(action) = find_action(&command, PATH_COMMANDS) {
                let path = parse_single_arg(arg);
                let value = if path.is_empty() {
                    Value::Null
                } else {
                    Value::String(path)
                };
                return Intent::new(action, text).with_arg("path", value);
            }

            if let Some(action) = find_action(&command, AREA_COMMANDS) {
                let value = parse_area(arg)
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
                return Intent::new(action, text).with_arg("area", value);
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            // `/inmueble/107442883/` is a listing path, not a command.
            if !slash_tail[command_len..].starts_with('/') {
                return Intent::new("unknown", text)
                    .with_arg("command", Value::String(command))
                    .with_arg("arg", Value::String(arg.to_string()));
            }
        }
    }

    Intent::new("analyze", text).with_arg("property", Value::String(raw_trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::parse_intent;

    #[test]
    fn parse_analyze_command_and_bare_input() {
        let intent = parse_intent("/analyze https://www.idealista.com/inmueble/107442883/");
        assert_eq!(intent.action, "analyze");
        assert_eq!(
            intent.arg_str("property"),
            Some("https://www.idealista.com/inmueble/107442883/")
        );

        let bare = parse_intent("  107442883 ");
        assert_eq!(bare.action, "analyze");
        assert_eq!(bare.arg_str("property"), Some("107442883"));

        assert_eq!(parse_intent("/analizar 123").action, "analyze");
    }

    #[test]
    fn parse_export_with_and_without_dir() {
        let intent = parse_intent("/export \"/tmp/mis informes\"");
        assert_eq!(intent.action, "export");
        assert_eq!(intent.arg_str("path"), Some("/tmp/mis informes"));

        let default_dir = parse_intent("/export");
        assert_eq!(default_dir.command_args["path"], Value::Null);
    }

    #[test]
    fn parse_estimate_area_forms() {
        assert_eq!(parse_intent("/estimate 85").arg_f64("area"), Some(85.0));
        assert_eq!(parse_intent("/estimate 85,5 m2").arg_f64("area"), Some(85.5));
        assert_eq!(parse_intent("/estimate grande").arg_f64("area"), None);
        assert_eq!(parse_intent("/estimate -4").arg_f64("area"), None);
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/show").action, "show");
        assert_eq!(parse_intent("/HELP").action, "help");
        assert_eq!(parse_intent("/exit").action, "quit");
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }

    #[test]
    fn bare_listing_path_is_analyzed() {
        let intent = parse_intent("/inmueble/107442883/");
        assert_eq!(intent.action, "analyze");
        assert_eq!(intent.arg_str("property"), Some("/inmueble/107442883/"));

        assert_eq!(parse_intent("/magic/").action, "analyze");
        assert_eq!(parse_intent("/magic /x").action, "unknown");
    }
}
