// SPDX: CC0-1.0

use anyhow::Context;
use chrono::{DateTime, Local};
use core::num::NonZeroU16;
use graphing_calculator::{
    config::Positive,
    eval::{EvalErr, EvalErrTyp, FormulaErr},
    lex::{LexErrTyp, TokTyp},
    parse::{ParseErr, ParseErrTyp},
    plotter::Plotter,
    registry::EquationId,
    shell::{self, Command},
    stdlib::{X, Y},
    svg, Number, Point,
};
use std::{
    fs::{File, OpenOptions},
    io::{self, stdout, BufWriter, Write},
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn output_svg_filename(now: DateTime<Local>, attempt: u32) -> String {
    let suffix = if attempt == 0 {
        String::new()
    } else {
        format!("-{attempt}")
    };
    format!(
        "{}_output-{}{suffix}.{}",
        env!("CARGO_PKG_NAME"),
        now.format("%Y-%m-%d_%H-%M-%S"),
        "svg"
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("unexpected error: {err}");
            let chain = err.chain();
            if chain.len() > 1 {
                eprintln!();
                eprintln!("context:");
                for it in chain.skip(1) {
                    eprintln!("  {it}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug)]
struct State {
    plotter: Plotter,
    /// Something changed since the last render.
    stale: bool,
}

fn try_main() -> anyhow::Result<()> {
    let mut state = State {
        plotter: Plotter::default(),
        stale: false,
    };
    state.plotter.add_equation(EquationId(0), "x^2");

    let mut stdout = BufWriter::new(stdout());
    loop {
        state.stale |= state.plotter.take_redraw();
        writeln!(
            stdout,
            "{n} equation{s}, {view}{stale}",
            n = state.plotter.registry().len(),
            s = if state.plotter.registry().len() == 1 { "" } else { "s" },
            view = state.plotter.viewport(),
            stale = if state.stale { " (not rendered)" } else { "" },
        )?;

        let mut try_cmd = shell::input(&mut stdout, "> ")?;
        try_cmd.make_ascii_lowercase();
        writeln!(stdout)?;

        if let Ok(cmd) = try_cmd.parse::<Command>() {
            match cmd {
                Command::Help => {
                    for c in Command::exhaustive() {
                        writeln!(stdout, "{name}: {help}", name = c.name(), help = c.help())?;
                    }
                    writeln!(stdout)?;
                    writeln!(stdout, "log verbosity is read from RUST_LOG")?;
                }

                Command::Quit => break,

                Command::Add => add_equation(&mut stdout, &mut state)?,

                Command::Remove => remove_equation(&mut stdout, &mut state)?,

                Command::List => shell::list_equations(&mut stdout, state.plotter.registry())?,

                Command::Eval => eval_formula(&mut stdout, &state)?,

                Command::PrintProg => print_prog(&mut stdout, &state)?,

                Command::Pan => pan(&mut stdout, &mut state)?,

                Command::Zoom => zoom(&mut stdout, &mut state)?,

                Command::Reset => state.plotter.reset_view(),

                Command::Config => set_config(&mut stdout, &mut state)?,

                Command::Render => render(&mut stdout, &mut state)?,
            }
        } else {
            writeln!(stdout, r#"Unknown command, try "help" for help"#)?;
        }

        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn read_id<W: Write>(
    mut out: W,
    state: &State,
    blank_is_next: bool,
) -> anyhow::Result<Option<EquationId>> {
    let next = state.plotter.registry().next_id();
    let prompt = if blank_is_next {
        format!("?id (blank for {next}) = ")
    } else {
        String::from("id = ")
    };
    Ok(match shell::read_fromstr::<_, EquationId>(&mut out, prompt, blank_is_next)? {
        Ok(Some(id)) => Some(id),
        Ok(None) => Some(next),
        Err(_) => None,
    })
}

fn add_equation<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(id) = read_id(&mut out, state, true)? else {
        return Ok(());
    };
    let formula = shell::input(&mut out, "y = ")?;
    if formula.is_empty() {
        return Ok(());
    }

    // refuse formulas that could never draw anything
    let evaluator = state.plotter.evaluator();
    match evaluator.compile(&formula) {
        Ok(prog) => match evaluator.run(&prog, 0.0, &mut Vec::new()) {
            Ok(_)
            | Err(EvalErr {
                typ: EvalErrTyp::Excluded,
                ..
            }) => {}
            Err(err) => {
                report_formula_err(&mut out, state, &FormulaErr::Eval(err))?;
                return Ok(());
            }
        },
        Err(err) => {
            report_formula_err(&mut out, state, &FormulaErr::Parse(err))?;
            return Ok(());
        }
    }

    info!(%id, %formula, "equation added from shell");
    state.plotter.add_equation(id, formula);
    Ok(())
}

fn remove_equation<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let Some(id) = read_id(&mut out, state, false)? else {
        return Ok(());
    };
    if !state.plotter.remove_equation(id) {
        shell::equation_undefined(&mut out)?;
    }
    Ok(())
}

fn eval_formula<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let formula = shell::input(&mut out, "y = ")?;
    if formula.is_empty() {
        return Ok(());
    }
    let x = match shell::read_fromstr::<_, Number>(&mut out, format_args!("{X} = "), false)? {
        Ok(Some(x)) => x,
        Ok(None) | Err(_) => return Ok(()),
    };

    match state.plotter.evaluator().try_evaluate(&formula, x) {
        Ok(y) => writeln!(out, "y = {y}")?,
        Err(err) => report_formula_err(&mut out, state, &err)?,
    }
    Ok(())
}

fn print_prog<W: Write>(mut out: W, state: &State) -> anyhow::Result<()> {
    let Some(id) = read_id(&mut out, state, false)? else {
        return Ok(());
    };
    let Some(eq) = state.plotter.registry().get(id) else {
        shell::equation_undefined(&mut out)?;
        return Ok(());
    };
    match state.plotter.evaluator().compile(&eq.formula) {
        Ok(prog) => shell::dump_program(&mut out, &prog, format_args!("program [{id}]"))?,
        Err(err) => report_formula_err(&mut out, state, &FormulaErr::Parse(err))?,
    }
    Ok(())
}

fn pan<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    writeln!(out, "note: offsets are in screen units, leave blank for 0")?;
    let mut delta = Point { x: 0.0, y: 0.0 };
    for (name, dst) in [("dx", &mut delta.x), ("dy", &mut delta.y)] {
        match shell::read_fromstr::<_, Number>(&mut out, format_args!("?{name} = "), true)? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }
    state.plotter.pan(delta.x, delta.y);
    Ok(())
}

fn zoom<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let config = state.plotter.config();
    let factor = match shell::input(&mut out, "factor ('in', 'out', or a number) = ")?.as_str() {
        "" => return Ok(()),
        "in" => config.zoom_in,
        "out" => config.zoom_out,
        other => match other.parse::<Positive>() {
            Ok(factor) => factor,
            Err(err) => {
                writeln!(out, "parse error: {err}")?;
                return Ok(());
            }
        },
    };

    let anchor_x = match shell::read_fromstr::<_, Number>(
        &mut out,
        "?anchor x (blank to zoom about the origin) = ",
        true,
    )? {
        Ok(Some(x)) => x,
        Ok(None) => {
            state.plotter.zoom(factor.get());
            return Ok(());
        }
        Err(_) => return Ok(()),
    };
    let anchor_y = match shell::read_fromstr::<_, Number>(&mut out, "anchor y = ", false)? {
        Ok(Some(y)) => y,
        Ok(None) | Err(_) => return Ok(()),
    };
    state.plotter.zoom_at(
        factor.get(),
        Point {
            x: anchor_x,
            y: anchor_y,
        },
    );
    Ok(())
}

fn set_config<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let mut config = state.plotter.config().clone();
    writeln!(out, "config = {config:#}")?;
    writeln!(out)?;
    writeln!(out, "note: leave blank to skip")?;

    for (name, dst) in [
        ("break threshold", &mut config.break_threshold),
        ("sample spacing", &mut config.sample_spacing),
        ("min grid spacing", &mut config.min_grid_spacing),
        ("zoom in", &mut config.zoom_in),
        ("zoom out", &mut config.zoom_out),
    ] {
        match shell::read_fromstr::<_, Positive>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    writeln!(out, "note: these must be nonzero integers")?;
    let [width, height] = &mut config.surface;
    for (name, dst) in [
        ("grid divisions", &mut config.grid_divisions),
        ("surface width", width),
        ("surface height", height),
    ] {
        match shell::read_fromstr::<_, NonZeroU16>(
            &mut out,
            format_args!("?{name} (is {cur}) = ", cur = *dst),
            true,
        )? {
            Ok(Some(new)) => *dst = new,
            Ok(None) => {}
            Err(_) => return Ok(()),
        }
    }

    state.plotter.set_config(config);
    Ok(())
}

/// Opens a fresh output file, never overwriting an earlier render.
fn create_output(now: DateTime<Local>) -> anyhow::Result<(String, File)> {
    let mut attempt = 0;
    loop {
        let path = output_svg_filename(now, attempt);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists && attempt < 100 => {
                attempt += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to open output svg file {path}"))
            }
        }
    }
}

fn render<W: Write>(mut out: W, state: &mut State) -> anyhow::Result<()> {
    let [width, height] = state.plotter.config().surface_size();
    let frame = state.plotter.render_frame(width, height);

    let (path, file) = create_output(Local::now())?;
    let mut svg_out = BufWriter::new(file);
    svg::write_svg(&mut svg_out, &frame).context("failed to write to output svg file")?;
    svg_out.flush()?;
    svg_out.get_mut().sync_data()?;
    drop(svg_out);

    state.stale = false;
    info!(%path, "rendered frame");
    writeln!(out, "wrote {path}")?;
    for (id, segments) in frame.curves() {
        if segments.is_empty() {
            writeln!(out, "note: equation [{id}] draws nothing in this view")?;
        }
    }
    Ok(())
}

fn report_formula_err<W: Write>(mut out: W, state: &State, err: &FormulaErr) -> io::Result<()> {
    writeln!(out)?;
    shell::underline(&mut out, err.loc())?;
    writeln!(out, "{err}")?;
    match err {
        FormulaErr::Parse(err) => parse_notes(&mut out, err),
        FormulaErr::Eval(err) => eval_notes(&mut out, state, err),
    }
}

fn parse_notes<W: Write>(mut out: W, err: &ParseErr) -> io::Result<()> {
    match &err.typ {
        ParseErrTyp::LexErr(LexErrTyp::InvalidChar) => writeln!(
            out,
            "note: available tokens are numbers, names, and symbols +-*/%^(),=<>{{}}"
        ),
        ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ)) => match typ {
            TokTyp::XPipe => writeln!(out, "note: use the 'abs' function to compute absolute value"),
            TokTyp::XOpenSquareBracket | TokTyp::XCloseSquareBracket => {
                writeln!(out, "note: use parentheses for grouping")
            }
            _ => Ok(()),
        },
        ParseErrTyp::Unexpected {
            found: TokTyp::Equal,
            ..
        } => writeln!(out, "note: only equations of the form 'y = ...' can be plotted"),
        ParseErrTyp::Unexpected {
            found: TokTyp::Cmp(_),
            ..
        } => writeln!(
            out,
            "note: inequalities can only restrict the domain, as in 'x {{x < 3}}'"
        ),
        ParseErrTyp::Unexpected {
            found: TokTyp::Number,
            ..
        } => writeln!(out, "note: a number can't directly follow another value"),
        ParseErrTyp::ParseNum(_) => writeln!(out, "note: parsing as floating point number"),
        ParseErrTyp::ParenMismatch
        | ParseErrTyp::Empty
        | ParseErrTyp::Unexpected { .. }
        | ParseErrTyp::UnexpectedEnd { .. }
        | ParseErrTyp::TooDeep => Ok(()),
    }
}

fn eval_notes<W: Write>(mut out: W, state: &State, err: &EvalErr) -> io::Result<()> {
    match &err.typ {
        EvalErrTyp::UndefinedIdent { text } if text.get() == Y => writeln!(
            out,
            "note: '{Y}' can only be used inside restrictions, as in 'x^2 {{{Y} < 3}}'"
        ),
        EvalErrTyp::UndefinedIdent { text } => {
            let name = text.get().to_ascii_lowercase();
            let candidates = state
                .plotter
                .evaluator()
                .math()
                .iter()
                .map(|(k, v)| (*k, v.kind()))
                .chain([(X, "variable")]);
            let most_similar = candidates
                .map(|(key, kind)| {
                    (
                        strsim::normalized_damerau_levenshtein(&name, &key.to_ascii_lowercase()),
                        (key, kind),
                    )
                })
                .reduce(|(acc_sim, acc_kv), (elem_sim, elem_kv)| {
                    // ties go to the alphabetically first name so the hint is stable
                    if elem_sim > acc_sim || (elem_sim == acc_sim && elem_kv.0 < acc_kv.0) {
                        (elem_sim, elem_kv)
                    } else {
                        (acc_sim, acc_kv)
                    }
                });
            if let Some((sim, (key, kind))) = most_similar {
                if sim > 0.3 {
                    writeln!(out, "note: {kind} '{key}' has a similar name")?;
                }
            }
            Ok(())
        }
        EvalErrTyp::NotAValue { text } => {
            writeln!(out, "note: call it with parentheses, as in '{text}({X})'")
        }
        EvalErrTyp::NotAFunction { text } => writeln!(
            out,
            "note: to multiply, write '{text}*(...)' instead of '{text}(...)'"
        ),
        EvalErrTyp::ArgCount { .. } | EvalErrTyp::Excluded => Ok(()),
    }
}
