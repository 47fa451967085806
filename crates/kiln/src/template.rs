//! parameter interpolation of raw document text
//!
//! Documents are templates. Before a document is parsed its text is rendered against the parameters bound by the
//! importing document.
//!
//! Supported actions
//! - `{{ .name }}` is replaced by the parameter `name`. Unknown names are an error.
//! - `{{ "text" }}` and ``{{ `text` }}`` emit the literal, e.g. `{{ "{{" }}` for literal braces
//! - `{{/* comment */}}` emits nothing
//! - `{{- ` and ` -}}` trim all whitespace preceding/following the action
//!
//! After rendering, every `{% expr %}` is rewritten to `{{ expr }}`. This defers interpolation by one level:
//! a document can write `{% .name %}` into text that is itself a template rendered later.
use std::sync::OnceLock;

/// Parameters bound to a single import
pub type Parameters = indexmap::IndexMap<String, String>;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("template references undefined parameter {name:?}")]
    MissingParameter { name: String },
    #[error("malformed template at line {line}: {reason}")]
    Syntax { line: usize, reason: String },
}

/// Render `template` with `parameters` and rewrite deferred actions
pub fn render(template: &str, parameters: &Parameters) -> Result<String, TemplateError> {
    let rendered = execute(template, parameters)?;
    Ok(rewrite_deferred(&rendered))
}

fn execute(template: &str, parameters: &Parameters) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut position = 0;
    let mut trim_next = false;

    while let Some(found) = template[position..].find(OPEN) {
        let start = position + found;
        let action = Action::parse(template, start)?;

        let mut text = &template[position..start];
        if trim_next {
            text = text.trim_start_matches(is_space);
        }
        if action.trim_left {
            text = text.trim_end_matches(is_space);
        }
        output.push_str(text);

        match action.element {
            Element::Parameter(name) => {
                let value = parameters
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingParameter { name: name.into() })?;
                output.push_str(value);
            }
            Element::Literal(literal) => output.push_str(&literal),
            Element::Comment => {}
        }

        trim_next = action.trim_right;
        position = action.end;
    }

    let mut text = &template[position..];
    if trim_next {
        text = text.trim_start_matches(is_space);
    }
    output.push_str(text);

    Ok(output)
}

fn rewrite_deferred(text: &str) -> String {
    static DEFERRED: OnceLock<regex_lite::Regex> = OnceLock::new();
    let deferred =
        DEFERRED.get_or_init(|| regex_lite::Regex::new(r"\{%(.+?)%\}").expect("valid regex"));

    deferred.replace_all(text, "{{${1}}}").into_owned()
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

struct Action<'t> {
    element: Element<'t>,
    trim_left: bool,
    trim_right: bool,
    /// byte offset right after the closing delimiter
    end: usize,
}

enum Element<'t> {
    Parameter(&'t str),
    Literal(String),
    Comment,
}

impl<'t> Action<'t> {
    /// Parse the action opened at byte offset `start`
    fn parse(template: &'t str, start: usize) -> Result<Self, TemplateError> {
        let syntax = |reason: String| TemplateError::Syntax {
            line: template[..start].matches('\n').count() + 1,
            reason,
        };

        let mut rest = &template[start + OPEN.len()..];

        let trim_left = rest.starts_with('-') && rest[1..].starts_with(is_space);
        if trim_left {
            rest = &rest[1..];
        }
        rest = rest.trim_start_matches(is_space);

        let (element, rest) = Element::parse(rest).map_err(syntax)?;

        let after_space = rest.trim_start_matches(is_space);
        let spaced = after_space.len() < rest.len();

        let (trim_right, rest) = if let Some(rest) = after_space
            .strip_prefix("-")
            .and_then(|rest| rest.strip_prefix(CLOSE))
            .filter(|_| spaced)
        {
            (true, rest)
        } else if let Some(rest) = after_space.strip_prefix(CLOSE) {
            (false, rest)
        } else if after_space.is_empty() {
            return Err(syntax("unclosed action".into()));
        } else {
            let unexpected: String = after_space.chars().take_while(|c| !is_space(*c)).collect();
            return Err(syntax(format!("unexpected {unexpected:?} in action")));
        };

        Ok(Self {
            element,
            trim_left,
            trim_right,
            end: template.len() - rest.len(),
        })
    }
}

impl<'t> Element<'t> {
    /// Parse the element at the start of `input`, returns the element and the remaining input
    fn parse(input: &'t str) -> Result<(Self, &'t str), String> {
        if let Some(comment) = input.strip_prefix("/*") {
            let end = comment.find("*/").ok_or("unclosed comment")?;
            return Ok((Element::Comment, &comment[end + 2..]));
        }

        if input.starts_with(CLOSE) {
            return Err("empty action".into());
        }

        match input.chars().next() {
            Some('.') => {
                let name_and_rest = &input[1..];
                let name_len = name_and_rest
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(name_and_rest.len());
                let (name, rest) = name_and_rest.split_at(name_len);

                if name.is_empty() {
                    return Err("a bare '.' is not supported, reference a parameter by name".into());
                }
                if rest.starts_with('.') {
                    return Err(format!(
                        "nested field access on parameter {name:?} is not supported"
                    ));
                }

                Ok((Element::Parameter(name), rest))
            }
            Some('"') => parse_quoted(input).map(|(literal, rest)| (Element::Literal(literal), rest)),
            Some('`') => {
                let raw = &input[1..];
                let end = raw.find('`').ok_or("unterminated raw string")?;
                Ok((Element::Literal(raw[..end].to_string()), &raw[end + 1..]))
            }
            Some(_) => {
                let word: String = input
                    .chars()
                    .take_while(|c| !is_space(*c) && *c != '}')
                    .collect();
                Err(format!("unsupported action {word:?}"))
            }
            None => Err("unclosed action".into()),
        }
    }
}

fn parse_quoted(input: &str) -> Result<(String, &str), String> {
    let mut literal = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((literal, &input[index + 1..])),
            '\\' => match chars.next() {
                Some((_, 'n')) => literal.push('\n'),
                Some((_, 't')) => literal.push('\t'),
                Some((_, '\\')) => literal.push('\\'),
                Some((_, '"')) => literal.push('"'),
                Some((_, other)) => return Err(format!("unknown escape sequence \\{other}")),
                None => break,
            },
            '\n' => break,
            c => literal.push(c),
        }
    }

    Err("unterminated quoted string".into())
}
