use std::{
    fmt::Display,
    io::{self, IsTerminal},
};

use anstyle::{AnsiColor, Effects, Style};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Color {
    Never,
    Auto,
    Always,
}

impl Color {
    pub fn use_colors(&self) -> bool {
        match self {
            Self::Never => false,
            Self::Auto => io::stdout().is_terminal(),
            Self::Always => true,
        }
    }
}

const HEADER: Style = AnsiColor::Green.on_default().effects(Effects::BOLD);

/// Prints `status` right-aligned in a 12 column header, cargo style.
pub fn status(color: Color, status: &str, message: impl Display) {
    if color.use_colors() {
        println!(
            "{}{status:>12}{} {message}",
            HEADER.render(),
            HEADER.render_reset()
        );
    } else {
        println!("{status:>12} {message}");
    }
}
