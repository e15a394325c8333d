//! Welcome banner: "SPLITTER" in the standard FIGlet font with a vertical gradient.

use crate::domain::Theme;
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

type Rgb = (u8, u8, u8);

/// Gradient endpoints per theme. Light terminals get darker ink.
fn palette(theme: Theme) -> (Rgb, Rgb) {
    match theme {
        // Teal (#0f766e) to indigo (#4338ca).
        Theme::Light => ((0x0f, 0x76, 0x6e), (0x43, 0x38, 0xca)),
        // Mint (#5eead4) to lavender (#c4b5fd).
        Theme::Dark => ((0x5e, 0xea, 0xd4), (0xc4, 0xb5, 0xfd)),
    }
}

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn render_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("SPLITTER").map(|figure| figure.to_string()))
        .unwrap_or_else(|| "EXPENSE SPLITTER\n".to_string())
}

pub fn print_welcome(theme: Theme) {
    let mut out = stdout();
    let (from, to) = palette(theme);
    let art = render_art();
    let lines: Vec<&str> = art.lines().filter(|l| !l.trim().is_empty()).collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(from, to, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: to.0,
        g: to.1,
        b: to.2,
    }));
    let _ = out.execute(Print(format!(
        "Expense Splitter v{}\r\n",
        env!("CARGO_PKG_VERSION")
    )));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
