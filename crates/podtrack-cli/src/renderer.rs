//! Terminal rendering module for rich markdown output
//!
//! Uses termimad for rich markdown display with a plain text fallback.

use anyhow::Result;
use podtrack_core::OperationStatus;
use termimad::{crossterm::style::Color, MadSkin};

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
    success_skin: MadSkin,
    failure_skin: MadSkin,
}

/// A copy of `base` whose bold text, used for notice labels, is `color`.
fn notice_skin(base: &MadSkin, color: Color) -> MadSkin {
    let mut skin = base.clone();
    skin.bold.set_fg(color);
    skin
}

impl TerminalRenderer {
    /// Create a new terminal renderer
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self {
            rich_enabled,
            success_skin: notice_skin(&skin, Color::Green),
            failure_skin: notice_skin(&skin, Color::Red),
            skin,
        }
    }

    /// Render markdown text to terminal
    pub fn render(&self, markdown: &str) -> Result<()> {
        if self.rich_enabled {
            for line in markdown.lines() {
                if line.starts_with('#') {
                    // Keep the hash marks visible for headers
                    println!("\x1b[34m{line}\x1b[0m");
                } else {
                    self.skin.print_inline(line);
                    println!();
                }
            }
        } else {
            print!("{markdown}");
        }
        Ok(())
    }

    /// Render a notice with a green success or red failure label
    pub fn notice(&self, status: &OperationStatus) -> Result<()> {
        if !self.rich_enabled {
            return self.render(&status.to_string());
        }

        let (skin, label) = if status.success {
            (&self.success_skin, "Success:")
        } else {
            (&self.failure_skin, "Error:")
        };
        skin.print_inline(&format!("**{label}** {}", status.message));
        println!();
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer() {
        let renderer = TerminalRenderer::new(false);
        assert!(!renderer.rich_enabled);
    }

    #[test]
    fn test_notice_skins_color_labels() {
        let renderer = TerminalRenderer::new(true);
        assert_eq!(renderer.success_skin.bold.get_fg(), Some(Color::Green));
        assert_eq!(renderer.failure_skin.bold.get_fg(), Some(Color::Red));
        assert_eq!(renderer.skin.bold.get_fg(), Some(Color::Yellow));
    }

    #[test]
    fn test_default_is_rich() {
        let renderer = TerminalRenderer::default();
        assert!(renderer.rich_enabled);
    }
}
