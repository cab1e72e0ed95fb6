// SPDX: CC0-1.0

use crate::{
    eval::Program,
    lex::SubStr,
    registry::{color_of, Registry},
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Add,
    Remove,
    List,
    Eval,
    PrintProg,
    Pan,
    Zoom,
    Reset,
    Config,
    Render,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Add,
            Self::Remove,
            Self::List,
            Self::Eval,
            Self::PrintProg,
            Self::Pan,
            Self::Zoom,
            Self::Reset,
            Self::Config,
            Self::Render,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Add => "add an equation, or replace the one with the same id",
            Self::Remove => "remove an equation",
            Self::List => "list equations and their colors",
            Self::Eval => "evaluate a formula at a single point",
            Self::PrintProg => "print the tree compiled from an equation (for debugging)",
            Self::Pan => "move the view by a screen-space offset",
            Self::Zoom => "zoom the view ('in', 'out', or a factor)",
            Self::Reset => "center the origin at the default zoom",
            Self::Config => "set plotting parameters",
            Self::Render => "render every equation to an svg file",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Add => "add",
            Self::Remove => "rm",
            Self::List => "list",
            Self::Eval => "eval",
            Self::PrintProg => "prog",
            Self::Pan => "pan",
            Self::Zoom => "zoom",
            Self::Reset => "reset",
            Self::Config => "config",
            Self::Render => "render",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| s == c.name())
            .copied()
            .ok_or(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    let src = span.src();
    // byte offsets to columns
    let col = src[..span.start()].chars().count();
    let width = src[span.start()..span.start() + span.len()].chars().count();
    writeln!(out, "{src}")?;
    writeln!(out, "{}{}", " ".repeat(col), "^".repeat(width.max(1)))?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    prog: &Program,
    title: core::fmt::Arguments,
) -> io::Result<()> {
    writeln!(out, "{title}: ")?;
    writeln!(out, "  {}", prog.body())?;
    for constraint in prog.constraints() {
        writeln!(out, "  where {constraint}")?;
    }
    Ok(())
}

pub fn list_equations<W: Write>(mut out: W, registry: &Registry) -> io::Result<()> {
    if registry.is_empty() {
        writeln!(out, "  (no equations)")?;
    }
    for eq in registry {
        writeln!(
            out,
            "  [{id}] {color}  y = {formula}",
            id = eq.id,
            color = color_of(eq.id),
            formula = eq.formula
        )?;
    }
    Ok(())
}

pub fn equation_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no equation has that id")
}
