use ratatui::style::Color;

#[derive(Clone, Copy)]
pub struct Theme {
    pub bg: Color,
    pub surface: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,
    pub ok: Color,
    pub warn: Color,
    pub highlight: Color,
}

pub fn theme() -> Theme {
    Theme {
        bg: Color::Rgb(13, 17, 23),
        surface: Color::Rgb(22, 27, 34),
        border: Color::Rgb(48, 54, 61),
        title: Color::Rgb(165, 214, 255),
        text: Color::Rgb(201, 209, 217),
        muted: Color::Rgb(139, 148, 158),
        accent: Color::Rgb(88, 166, 255),
        ok: Color::Rgb(63, 185, 80),
        warn: Color::Rgb(210, 153, 34),
        highlight: Color::Rgb(46, 160, 67),
    }
}

/// Linear blend between two Rgb colors; `t` of 0 is `from`, 1 is `to`.
/// Non-Rgb colors snap to `to` (terminal palettes cannot interpolate).
pub fn blend(from: Color, to: Color, t: f32) -> Color {
    let (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) = (from, to) else {
        return to;
    };
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| -> u8 {
        (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
    };
    Color::Rgb(channel(r1, r2), channel(g1, g2), channel(b1, b2))
}
