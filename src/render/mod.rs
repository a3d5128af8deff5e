//! Variable substitution for template contents and filenames.
//!
//! Two delimiter configurations exist on purpose: file *contents* use
//! `${variable}` syntax (with `$${...}` producing a literal `${...}`), while
//! *filenames* use `[[variable]]` syntax so that a rendered file can itself
//! contain unexpanded `${...}` placeholders for its own downstream tooling.
//!
//! # Syntax
//!
//! - `${variable_name}` - replaced with the variable value (contents)
//! - `$${escaped}` - produces a literal `${escaped}` in the output
//! - `[[variable_name]]` - replaced with the variable value (filenames)
//!
//! Unknown variables render as the empty string; a warning is logged for
//! each unknown name so a typo does not silently produce a broken tree.

use std::collections::HashMap;

/// The variables available to a render pass.
pub type Variables = HashMap<String, String>;

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference
    Variable(String),
}

/// Parse a string containing `${var}` interpolations.
///
/// Supports:
/// - `${variable_name}` - variable interpolation
/// - `$${escaped}` - literal `${escaped}` in output
pub fn parse_content(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c == '$' {
            match chars.peek() {
                Some('$') => {
                    // Escaped: $$ becomes $
                    chars.next();
                    if chars.peek() == Some(&'{') {
                        // $${...} -> literal ${...}
                        chars.next();
                        current_literal.push('$');
                        current_literal.push('{');
                        while let Some(&c) = chars.peek() {
                            chars.next();
                            current_literal.push(c);
                            if c == '}' {
                                break;
                            }
                        }
                    } else {
                        current_literal.push('$');
                    }
                }
                Some('{') => {
                    chars.next();

                    if !current_literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                    }

                    let mut var_name = String::new();
                    while let Some(&c) = chars.peek() {
                        if c == '}' {
                            chars.next();
                            break;
                        }
                        var_name.push(c);
                        chars.next();
                    }

                    segments.push(Segment::Variable(var_name));
                }
                _ => {
                    current_literal.push(c);
                }
            }
        } else {
            current_literal.push(c);
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Parse a string containing `[[var]]` interpolations.
///
/// There is no escape sequence for the filename delimiters; `[[` outside a
/// closed pair is treated literally.
pub fn parse_filename(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = input;
    let mut current_literal = String::new();

    while let Some(start) = rest.find("[[") {
        let after = &rest[start + 2..];

        let Some(end) = after.find("]]") else {
            // No closing pair, the remainder is literal.
            break;
        };

        current_literal.push_str(&rest[..start]);

        if !current_literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
        }

        segments.push(Segment::Variable(after[..end].trim().to_string()));
        rest = &after[end + 2..];
    }

    current_literal.push_str(rest);

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

fn substitute(segments: Vec<Segment>, variables: &Variables) -> String {
    let mut output = String::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => output.push_str(&text),
            Segment::Variable(name) => match variables.get(&name) {
                Some(value) => output.push_str(value),
                None => {
                    tracing::warn!("unknown template variable: {}", name);
                }
            },
        }
    }

    output
}

/// Render file contents, replacing `${var}` references.
pub fn render_content(input: &str, variables: &Variables) -> String {
    substitute(parse_content(input), variables)
}

/// Render a filename, replacing `[[var]]` references.
pub fn render_filename(input: &str, variables: &Variables) -> String {
    substitute(parse_filename(input), variables)
}

/// Check whether a string contains any `${var}` interpolation.
pub fn has_interpolation(input: &str) -> bool {
    parse_content(input)
        .iter()
        .any(|segment| matches!(segment, Segment::Variable(_)))
}
