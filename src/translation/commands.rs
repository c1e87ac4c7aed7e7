//! Command text transpilation.
//!
//! Java addresses functions by namespaced id (`ns:path`), Bedrock by path
//! (`ns/path`). Only the argument of a `function` command word is rewritten,
//! either at the start of the command or after `run` in an `execute` chain.
//! Whitespace is preserved byte for byte and quoted text is never touched.

use crate::coords::Edition;

/// A token with its byte span in the source command.
struct Token {
    start: usize,
    end: usize,
    quoted: bool,
}

fn tokenize(command: &str) -> Vec<Token> {
    let bytes = command.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut quoted = false;
        let mut quote: Option<u8> = None;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(q) => {
                    if b == b'\\' {
                        i += 1;
                    } else if b == q {
                        quote = None;
                    }
                }
                None => {
                    if b.is_ascii_whitespace() {
                        break;
                    }
                    if b == b'"' || b == b'\'' {
                        quote = Some(b);
                        quoted = true;
                    }
                }
            }
            i += 1;
        }
        let end = i.min(bytes.len());
        tokens.push(Token { start, end, quoted });
    }
    tokens
}

fn rewrite(command: &str, to_path: bool) -> String {
    let tokens = tokenize(command);
    let mut out = String::with_capacity(command.len());
    let mut cursor = 0;

    for (index, token) in tokens.iter().enumerate() {
        let text = &command[token.start..token.end];
        let word = text.strip_prefix('/').unwrap_or(text);
        let at_command_start = index == 0
            || tokens
                .get(index - 1)
                .is_some_and(|prev| &command[prev.start..prev.end] == "run");
        if word != "function" || !at_command_start || token.quoted {
            continue;
        }
        let Some(argument) = tokens.get(index + 1).filter(|t| !t.quoted) else {
            continue;
        };
        let arg_text = &command[argument.start..argument.end];
        let rewritten = if to_path {
            arg_text.replacen(':', "/", 1)
        } else if arg_text.contains(':') {
            continue;
        } else {
            arg_text.replacen('/', ":", 1)
        };
        out.push_str(&command[cursor..argument.start]);
        out.push_str(&rewritten);
        cursor = argument.end;
    }
    out.push_str(&command[cursor..]);
    out
}

/// Rewrites `function ns:name` to `function ns/name`.
pub fn to_bedrock(command: &str) -> String {
    rewrite(command, true)
}

/// Rewrites `function ns/name` to `function ns:name`.
pub fn to_java(command: &str) -> String {
    rewrite(command, false)
}

/// Transpiles a command for the target edition. Same-edition conversions
/// return the command unchanged.
pub fn transpile(command: &str, source: Edition, target: Edition) -> String {
    match (source, target) {
        (Edition::Java, Edition::Bedrock) => to_bedrock(command),
        (Edition::Bedrock, Edition::Java) => to_java(command),
        _ => command.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_namespace_becomes_path() {
        assert_eq!(
            to_bedrock("/function  function_namespace:function_name "),
            "/function  function_namespace/function_name "
        );
    }

    #[test]
    fn test_quoted_text_is_untouched() {
        let command = r#"say "function foo:bar""#;
        assert_eq!(to_bedrock(command), command);
        let single = "tellraw @a 'function a:b'";
        assert_eq!(to_bedrock(single), single);
    }

    #[test]
    fn test_execute_run_function() {
        assert_eq!(
            to_bedrock("execute as @a run function pack:tick/main"),
            "execute as @a run function pack/tick/main"
        );
        // Not a command word here.
        assert_eq!(to_bedrock("say function a:b"), "say function a:b");
    }

    #[test]
    fn test_reverse_direction() {
        assert_eq!(to_java("/function  ns/name "), "/function  ns:name ");
        assert_eq!(to_java("function ns:already"), "function ns:already");
        assert_eq!(
            transpile("function a:b", Edition::Java, Edition::Java),
            "function a:b"
        );
    }
}
