use std::env;

use color_eyre::owo_colors::OwoColorize;

pub struct Style {
    enabled: bool,
}

impl Style {
    pub fn new(is_tty: bool) -> Self {
        let env_no_color = env::var_os("NO_COLOR").is_some();
        Self {
            enabled: !env_no_color && is_tty,
        }
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(&format!("error: {text}"), Tone::Red, true)
    }

    /// Colors one transcript line by its leading marker.
    pub fn transcript_line(&self, line: &str) -> String {
        if line.starts_with("warning:") {
            self.paint(line, Tone::Yellow, true)
        } else if line.starts_with("* ") {
            self.paint(line, Tone::Green, true)
        } else if line.starts_with("- ") {
            self.paint(line, Tone::Blue, false)
        } else {
            line.to_string()
        }
    }

    fn paint(&self, text: &str, tone: Tone, bold: bool) -> String {
        if !self.enabled {
            return text.to_string();
        }
        match (tone, bold) {
            (Tone::Green, true) => text.green().bold().to_string(),
            (Tone::Green, false) => text.green().to_string(),
            (Tone::Yellow, true) => text.yellow().bold().to_string(),
            (Tone::Yellow, false) => text.yellow().to_string(),
            (Tone::Red, true) => text.red().bold().to_string(),
            (Tone::Red, false) => text.red().to_string(),
            (Tone::Blue, true) => text.cyan().bold().to_string(),
            (Tone::Blue, false) => text.cyan().to_string(),
        }
    }
}

#[derive(Clone, Copy)]
enum Tone {
    Green,
    Yellow,
    Red,
    Blue,
}
