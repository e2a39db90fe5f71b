//! Gradle build file import
//!
//! Reads the subset of the Gradle DSL (Groovy, and the common Kotlin forms)
//! that Android application modules use and emits the same key/value tree
//! the loader accepts from TOML or JSON. Statements outside that subset are
//! skipped; values the loader cannot interpret (e.g. `flutter.minSdkVersion`)
//! are passed through as strings so the loader reports them with a field path.

use crate::descriptor::Scope;
use crate::error::{ResolveError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

static STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<key>[A-Za-z_][A-Za-z0-9_]*)\s*(?:\+?=\s*)?(?P<rest>.*)$").unwrap()
});

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)"|'([^']*)'"#).unwrap());

static JAVA_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"JavaVersion\.VERSION_(\d+)(?:_(\d+))?").unwrap());

static SIGNING_CONFIG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"signingConfigs(?:\.getByName\(\s*["']|\.|\[\s*["'])([A-Za-z0-9_]+)"#).unwrap()
});

static NAMED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(?:getByName|create|maybeCreate|named|register)\(\s*["']([A-Za-z0-9_]+)["']\s*\)$"#)
        .unwrap()
});

static MAP_NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"group\s*[:=]\s*["']([^"']+)["']\s*,\s*name\s*[:=]\s*["']([^"']+)["'](?:\s*,\s*version\s*[:=]\s*["']([^"']+)["'])?"#,
    )
    .unwrap()
});

#[derive(Debug, PartialEq)]
enum Token {
    Open(String),
    Close,
    Statement(String),
}

/// Statement text being collected, possibly across several lines
#[derive(Default)]
struct Pending {
    text: String,
    line: usize,
    parens: usize,
}

impl Pending {
    fn push(&mut self, c: char, line: usize) {
        if self.text.trim().is_empty() {
            self.line = line;
        }
        self.text.push(c);
    }

    /// Open parentheses or a trailing `,` carry the statement onto the next line
    fn continues(&self) -> bool {
        self.parens > 0 || self.text.trim_end().ends_with(',')
    }

    fn flush(&mut self, tokens: &mut Vec<(usize, Token)>) {
        let stmt = self.text.trim();
        if !stmt.is_empty() {
            tokens.push((self.line, Token::Statement(stmt.to_string())));
        }
        self.text.clear();
    }
}

/// Split source text into block openings, closings and statements
fn tokenize(text: &str) -> Result<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut pending = Pending::default();
    let mut in_block_comment = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let mut quote: Option<char> = None;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if in_block_comment {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block_comment = false;
                }
                continue;
            }
            if let Some(q) = quote {
                pending.push(c, line_no);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        pending.push(escaped, line_no);
                    }
                } else if c == q {
                    quote = None;
                }
                continue;
            }
            match c {
                '"' | '\'' => {
                    quote = Some(c);
                    pending.push(c, line_no);
                }
                '/' if chars.peek() == Some(&'/') => break,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    in_block_comment = true;
                }
                '(' => {
                    pending.parens += 1;
                    pending.push(c, line_no);
                }
                ')' => {
                    if pending.parens == 0 {
                        return Err(ResolveError::malformed(
                            format!("line {}", line_no),
                            "unexpected `)` with no open parenthesis",
                        ));
                    }
                    pending.parens -= 1;
                    pending.push(c, line_no);
                }
                _ if pending.parens > 0 => pending.push(c, line_no),
                '{' => {
                    tokens.push((line_no, Token::Open(pending.text.trim().to_string())));
                    pending.text.clear();
                }
                '}' => {
                    pending.flush(&mut tokens);
                    tokens.push((line_no, Token::Close));
                }
                ';' => pending.flush(&mut tokens),
                _ => pending.push(c, line_no),
            }
        }

        if pending.continues() {
            pending.push(' ', line_no);
        } else {
            pending.flush(&mut tokens);
        }
    }

    if !pending.text.trim().is_empty() {
        return Err(ResolveError::malformed(
            format!("line {}", pending.line),
            format!("statement `{}` is never completed", pending.text.trim()),
        ));
    }

    Ok(tokens)
}

/// Block name as used for context matching
fn block_name(header: &str) -> String {
    match NAMED_BLOCK.captures(header) {
        Some(caps) => caps[1].to_string(),
        None => header.to_string(),
    }
}

fn quoted(text: &str) -> Vec<String> {
    QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn first_quoted(text: &str) -> Option<String> {
    quoted(text).into_iter().next()
}

fn strip_parens(text: &str) -> &str {
    let text = text.trim();
    match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => inner.trim(),
        None => text,
    }
}

/// A quoted string, an integer, or the raw expression text
fn scalar(text: &str) -> Value {
    if let Some(s) = first_quoted(text) {
        return Value::String(s);
    }
    match text.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(text.to_string()),
    }
}

fn java_version(text: &str) -> Value {
    match JAVA_VERSION.captures(text) {
        Some(caps) => match caps.get(2) {
            Some(minor) => Value::String(format!("{}.{}", &caps[1], minor.as_str())),
            None => Value::String(caps[1].to_string()),
        },
        None => scalar(text),
    }
}

fn table<'a>(root: &'a mut Map<String, Value>, path: &[&str]) -> &'a mut Map<String, Value> {
    let mut node = root;
    for key in path {
        let entry = node
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        node = match entry {
            Value::Object(map) => map,
            _ => unreachable!("entry was just made a table"),
        };
    }
    node
}

fn set(root: &mut Map<String, Value>, path: &[&str], key: &str, value: Value) {
    table(root, path).insert(key.to_string(), value);
}

fn extend(root: &mut Map<String, Value>, path: &[&str], key: &str, values: Vec<String>) {
    let entry = table(root, path)
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(items) = entry {
        items.extend(values.into_iter().map(Value::String));
    }
}

fn dependency(configuration: &str, rest: &str) -> Option<Value> {
    Scope::from_configuration(configuration)?;

    let rest = strip_parens(rest);
    let (platform, inner) = match rest
        .strip_prefix("platform")
        .or_else(|| rest.strip_prefix("enforcedPlatform"))
    {
        Some(call) => (true, strip_parens(call)),
        None => (false, rest),
    };

    if ["project(", "files(", "fileTree("]
        .iter()
        .any(|prefix| inner.starts_with(prefix))
    {
        return None;
    }

    let coordinate = match MAP_NOTATION.captures(inner) {
        Some(caps) => match caps.get(3) {
            Some(version) => format!("{}:{}:{}", &caps[1], &caps[2], version.as_str()),
            None => format!("{}:{}", &caps[1], &caps[2]),
        },
        None => first_quoted(inner)?,
    };

    Some(json!({
        "coordinate": coordinate,
        "scope": configuration,
        "platform": platform,
    }))
}

fn apply_statement(
    out: &mut Map<String, Value>,
    deps: &mut Vec<Value>,
    ctx: &[&str],
    stmt: &str,
    line: usize,
) {
    let Some(caps) = STATEMENT.captures(stmt) else {
        tracing::trace!(line, statement = stmt, "Skipping unrecognised statement");
        return;
    };
    let key = caps.name("key").map_or("", |m| m.as_str());
    let rest = caps.name("rest").map_or("", |m| m.as_str().trim());
    let args = strip_parens(rest);

    const ANDROID: &[&str] = &["android"];
    const DEFAULT_CONFIG: &[&str] = &["android", "defaultConfig"];

    match (ctx, key) {
        ([], "apply") => match rest.strip_prefix("plugin:") {
            Some(plugin) => {
                if let Some(id) = first_quoted(plugin) {
                    extend(out, &[], "plugins", vec![id]);
                }
            }
            None => tracing::trace!(line, statement = stmt, "Skipping apply statement"),
        },
        (["plugins"], "id") => {
            if let Some(id) = first_quoted(args) {
                extend(out, &[], "plugins", vec![id]);
            }
        }
        (["plugins"], "kotlin") => {
            if let Some(id) = first_quoted(args) {
                extend(out, &[], "plugins", vec![format!("org.jetbrains.kotlin.{}", id)]);
            }
        }
        (["android"], "compileSdkVersion" | "compileSdk") => {
            set(out, ANDROID, "compileSdk", scalar(args));
        }
        (["android"], "ndkVersion") => set(out, ANDROID, "ndkVersion", scalar(args)),
        (["android", "defaultConfig"], "applicationId") => {
            set(out, DEFAULT_CONFIG, "applicationId", scalar(args));
        }
        (["android", "defaultConfig"], "minSdkVersion" | "minSdk") => {
            set(out, DEFAULT_CONFIG, "minSdk", scalar(args));
        }
        (["android", "defaultConfig"], "targetSdkVersion" | "targetSdk") => {
            set(out, DEFAULT_CONFIG, "targetSdk", scalar(args));
        }
        (["android", "defaultConfig"], "versionCode") => {
            set(out, DEFAULT_CONFIG, "versionCode", scalar(args));
        }
        (["android", "defaultConfig"], "versionName") => {
            set(out, DEFAULT_CONFIG, "versionName", scalar(args));
        }
        (["android", "defaultConfig", "ndk"], "abiFilters") => {
            extend(out, DEFAULT_CONFIG, "abiFilters", quoted(args));
        }
        (["android", "compileOptions"], "sourceCompatibility" | "targetCompatibility") => {
            set(out, &["android", "compileOptions"], key, java_version(args));
        }
        (["android", "kotlinOptions"], "jvmTarget") => {
            set(out, &["android", "kotlinOptions"], "jvmTarget", scalar(args));
        }
        (["android", "aaptOptions" | "androidResources"], "noCompress") => {
            extend(out, &["android", "packaging"], "noCompress", quoted(args));
        }
        (["android", "buildTypes", name], "signingConfig") => {
            match SIGNING_CONFIG.captures(args) {
                Some(signing) => set(
                    out,
                    &["android", "buildTypes", *name],
                    "signingConfig",
                    Value::String(signing[1].to_string()),
                ),
                None => tracing::trace!(line, statement = stmt, "Skipping signing config expression"),
            }
        }
        (["android", "buildTypes", name], "minifyEnabled" | "isMinifyEnabled") => {
            set(out, &["android", "buildTypes", *name], "minifyEnabled", scalar(args));
        }
        (["dependencies"], configuration) => match dependency(configuration, rest) {
            Some(dep) => deps.push(dep),
            None => tracing::trace!(line, statement = stmt, "Skipping dependency statement"),
        },
        _ => tracing::trace!(line, statement = stmt, "Skipping unrecognised statement"),
    }
}

/// Import a Gradle build file into the loader's key/value tree
pub fn import(text: &str) -> Result<Value> {
    let mut out = Map::new();
    let mut deps = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();

    for (line, token) in tokenize(text)? {
        match token {
            Token::Open(header) => {
                let name = block_name(&header);
                if stack.is_empty() && name == "android" {
                    table(&mut out, &["android"]);
                }
                stack.push((line, name));
            }
            Token::Close => {
                if stack.pop().is_none() {
                    return Err(ResolveError::malformed(
                        format!("line {}", line),
                        "unexpected `}` with no open block",
                    ));
                }
            }
            Token::Statement(stmt) => {
                let ctx: Vec<&str> = stack.iter().map(|(_, name)| name.as_str()).collect();
                apply_statement(&mut out, &mut deps, &ctx, &stmt, line);
            }
        }
    }

    if let Some((line, name)) = stack.last() {
        return Err(ResolveError::malformed(
            format!("line {}", line),
            format!("block `{}` is never closed", name),
        ));
    }

    if !deps.is_empty() {
        out.insert("dependencies".to_string(), Value::Array(deps));
    }

    tracing::debug!(keys = out.len(), "Gradle build file imported");
    Ok(Value::Object(out))
}
