//! Terminal renderer for dispatcher display snapshots.
//!
//! Snapshots carry the whole revealed answer; the renderer prints only what
//! was appended since the previous snapshot. Display markup is translated:
//! `<br>` becomes a newline, `<strong>`/`<em>` become bold/italic on a
//! terminal and are dropped otherwise. Whitespace runs collapse to a single
//! space, the way the markup would be laid out in a browser.

use std::io::{self, IsTerminal, Stdout, Write, stdout};

use crossterm::queue;
use crossterm::style::{Attribute, SetAttribute};
use gchat_core::core::display::Display;

#[derive(Debug, Clone, Copy)]
enum Markup {
    Break,
    BoldOn,
    BoldOff,
    ItalicOn,
    ItalicOff,
}

const TAGS: [(&str, Markup); 5] = [
    ("<br>", Markup::Break),
    ("<strong>", Markup::BoldOn),
    ("</strong>", Markup::BoldOff),
    ("<em>", Markup::ItalicOn),
    ("</em>", Markup::ItalicOff),
];

pub struct Renderer<W: Write> {
    out: W,
    styled: bool,
    /// Print failed sessions' error text (chat). Exec reports it as the
    /// command error instead.
    show_errors: bool,
    session: u64,
    /// Byte length of the answer already printed.
    printed: usize,
    error_shown: bool,
    at_space: bool,
    line_open: bool,
}

impl Renderer<Stdout> {
    /// Renderer on stdout, styled when stdout is a terminal.
    pub fn stdout(show_errors: bool) -> Self {
        let styled = stdout().is_terminal();
        Self::new(stdout(), styled, show_errors)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, styled: bool, show_errors: bool) -> Self {
        Self {
            out,
            styled,
            show_errors,
            session: 0,
            printed: 0,
            error_shown: false,
            at_space: true,
            line_open: false,
        }
    }

    /// Prints whatever the answer gained since the last snapshot.
    ///
    /// A new session, or an answer that shrank (new session reset), starts a
    /// fresh line.
    pub fn update(&mut self, display: &Display) -> io::Result<()> {
        if display.session != self.session || display.answer.len() < self.printed {
            self.finish()?;
            self.session = display.session;
            self.printed = 0;
            self.error_shown = false;
        }

        if display.is_error() {
            if self.show_errors && !self.error_shown {
                self.finish()?;
                writeln!(self.out, "{}", display.answer)?;
                self.error_shown = true;
            }
            self.printed = display.answer.len();
            return self.out.flush();
        }

        let Some(delta) = display.answer.get(self.printed..) else {
            return Ok(());
        };
        if delta.is_empty() {
            return Ok(());
        }
        self.write_markup(delta)?;
        self.printed = display.answer.len();
        self.out.flush()
    }

    /// Prints a line of UI text, closing any open answer line first.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.finish()?;
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    /// Ends the current answer line and resets styling.
    pub fn finish(&mut self) -> io::Result<()> {
        if !self.line_open {
            return Ok(());
        }
        if self.styled {
            queue!(self.out, SetAttribute(Attribute::Reset))?;
        }
        writeln!(self.out)?;
        self.line_open = false;
        self.at_space = true;
        self.out.flush()
    }

    fn write_markup(&mut self, text: &str) -> io::Result<()> {
        let mut rest = text;
        while let Some(ch) = rest.chars().next() {
            if let Some((tag, markup)) = TAGS.iter().find(|(tag, _)| rest.starts_with(tag)) {
                self.write_tag(*markup)?;
                rest = &rest[tag.len()..];
                continue;
            }

            if ch.is_whitespace() {
                if !self.at_space {
                    self.out.write_all(b" ")?;
                    self.at_space = true;
                }
            } else {
                write!(self.out, "{ch}")?;
                self.at_space = false;
                self.line_open = true;
            }
            rest = &rest[ch.len_utf8()..];
        }
        Ok(())
    }

    fn write_tag(&mut self, markup: Markup) -> io::Result<()> {
        let attribute = match markup {
            Markup::Break => {
                writeln!(self.out)?;
                self.at_space = true;
                self.line_open = false;
                return Ok(());
            }
            Markup::BoldOn => Attribute::Bold,
            Markup::BoldOff => Attribute::NormalIntensity,
            Markup::ItalicOn => Attribute::Italic,
            Markup::ItalicOff => Attribute::NoItalic,
        };
        if self.styled {
            queue!(self.out, SetAttribute(attribute))?;
        }
        Ok(())
    }
}
