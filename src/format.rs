//! Printing of generated declarations.
//!
//! The printer owns every layout decision (quotes, statement terminators,
//! indentation, line breaking) so the emitter only builds declarations.

use std::fmt::Write;

use crate::error::Result;
use crate::types::TsType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum QuoteStyle {
    #[default]
    Single,
    Double,
}

impl QuoteStyle {
    fn char(self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub quote: QuoteStyle,
    /// Terminate members and type aliases with `;`.
    pub semicolons: bool,
    pub print_width: usize,
    pub indent: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            quote: QuoteStyle::Single,
            semicolons: false,
            print_width: 80,
            indent: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub key: String,
    pub ty: TsType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// `export type <name> = <body>`, body written verbatim.
    TypeAlias { name: String, body: String },
    Interface { name: String, members: Vec<Member> },
}

pub struct Printer {
    options: FormatOptions,
}

impl Printer {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Prints declarations in order; a blank line separates a run of type
    /// aliases from the interfaces that follow it.
    pub fn print(&self, declarations: &[Declaration]) -> Result<String> {
        let mut out = String::new();
        let mut previous: Option<&Declaration> = None;

        for declaration in declarations {
            if let Some(previous) = previous {
                if std::mem::discriminant(previous) != std::mem::discriminant(declaration) {
                    out.push('\n');
                }
            }

            match declaration {
                Declaration::TypeAlias { name, body } => {
                    writeln!(out, "export type {name} = {body}{}", self.terminator())?;
                }
                Declaration::Interface { name, members } => {
                    self.print_interface(&mut out, name, members)?;
                }
            }

            previous = Some(declaration);
        }

        Ok(out)
    }

    /// Renders a type on one line, e.g. `'a' | 'b' | null`.
    pub fn render_type(&self, ty: &TsType) -> String {
        self.union_members(ty).join(" | ")
    }

    fn print_interface(&self, out: &mut String, name: &str, members: &[Member]) -> Result<()> {
        if members.is_empty() {
            writeln!(out, "export interface {name} {{}}")?;
            return Ok(());
        }

        writeln!(out, "export interface {name} {{")?;
        let indent = " ".repeat(self.options.indent);
        for member in members {
            let key = self.property_key(&member.key);
            let variants = self.union_members(&member.ty);
            let line = format!(
                "{indent}{key}: {}{}",
                variants.join(" | "),
                self.terminator()
            );

            if line.chars().count() <= self.options.print_width || variants.len() < 2 {
                writeln!(out, "{line}")?;
                continue;
            }

            writeln!(out, "{indent}{key}:")?;
            let last = variants.len() - 1;
            for (i, variant) in variants.iter().enumerate() {
                let terminator = if i == last { self.terminator() } else { "" };
                writeln!(out, "{indent}{indent}| {variant}{terminator}")?;
            }
        }
        writeln!(out, "}}")?;

        Ok(())
    }

    fn union_members(&self, ty: &TsType) -> Vec<String> {
        match ty {
            TsType::String => vec!["string".to_string()],
            TsType::Number => vec!["number".to_string()],
            TsType::Boolean => vec!["boolean".to_string()],
            TsType::Date => vec!["Date".to_string()],
            TsType::Json => vec!["JSONValue".to_string()],
            TsType::Unknown(_) => vec!["any".to_string()],
            TsType::Array(inner) => vec![format!("Array<{}>", self.render_type(inner))],
            TsType::Literals(labels) => labels.iter().map(|l| self.quote(l)).collect(),
            TsType::Nullable(inner) => {
                let mut members = self.union_members(inner);
                members.push("null".to_string());
                members
            }
        }
    }

    fn property_key(&self, key: &str) -> String {
        if crate::naming::is_identifier(key) {
            key.to_string()
        } else {
            self.quote(key)
        }
    }

    fn quote(&self, value: &str) -> String {
        let quote = self.options.quote.char();
        let mut out = String::with_capacity(value.len() + 2);
        out.push(quote);
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                c if c == quote => {
                    out.push('\\');
                    out.push(c);
                }
                c => out.push(c),
            }
        }
        out.push(quote);
        out
    }

    fn terminator(&self) -> &'static str {
        if self.options.semicolons {
            ";"
        } else {
            ""
        }
    }
}
