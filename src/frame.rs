//! Synthetic camera frames for the simulator.
//!
//! Draws the visible sheet as an SVG strip (keys, hit targets, the fingertip)
//! and base64-encodes it so it travels the same path as a real JPEG frame.

use crate::types::FramePayload;
use std::fmt::Write;

pub const FRAME_W: u32 = 854;
pub const FRAME_H: u32 = 480;
const HIT_RADIUS: u32 = 15;

/// What the "camera" currently sees.
#[derive(Debug, Clone, Default)]
pub struct FrameScene<'a> {
    /// Keys on the visible sheet, left to right
    pub keys: &'a [String],
    /// Indices of the keys under a fingertip
    pub pressed: Vec<usize>,
    /// Fingertip positions as fractions of the sheet width
    pub fingers: Vec<f64>,
    pub caption: &'a str,
}

pub fn render_svg(scene: &FrameScene<'_>) -> String {
    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#1b1b24"/>"##,
        w = FRAME_W,
        h = FRAME_H
    );

    if scene.keys.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" fill="#888" font-family="sans-serif" font-size="22" text-anchor="middle">no sheet in view</text>"##,
            FRAME_W / 2,
            FRAME_H / 2
        );
    } else {
        let n = scene.keys.len() as u32;
        let margin = 40;
        let key_w = (FRAME_W - 2 * margin) / n;
        let top = 140;
        for (i, key) in scene.keys.iter().enumerate() {
            let x = margin + i as u32 * key_w;
            let black = key.contains('#');
            let hit = scene.pressed.contains(&i);
            let fill = match (hit, black) {
                (true, _) => "#00d26a",
                (false, true) => "#222",
                (false, false) => "#f4f1e8",
            };
            let height = if black { 130 } else { 200 };
            let _ = write!(
                svg,
                r##"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#555"/>"##,
                x,
                top,
                key_w.saturating_sub(2),
                height,
                fill
            );
            let cy = top + if black { 90 } else { 130 };
            let _ = write!(
                svg,
                r##"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="#a0a0a0"/>"##,
                x + key_w / 2,
                cy,
                HIT_RADIUS
            );
        }
        for &u in &scene.fingers {
            let fx = margin as f64 + u.clamp(0.0, 1.0) * (n * key_w) as f64;
            let _ = write!(
                svg,
                r##"<circle cx="{:.0}" cy="{}" r="9" fill="#e74c3c"/>"##,
                fx,
                top + 110
            );
        }
    }

    let _ = write!(
        svg,
        r##"<text x="16" y="{}" fill="#ccc" font-family="monospace" font-size="16">{}</text></svg>"##,
        FRAME_H - 20,
        xml_escape(scene.caption)
    );
    svg
}

pub fn render_frame(scene: &FrameScene<'_>) -> FramePayload {
    FramePayload {
        mime: "image/svg+xml".into(),
        base64: base64_encode(render_svg(scene).as_bytes()),
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn base64_encode(data: &[u8]) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut result = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        result.push(CHARS[((triple >> 18) & 0x3F) as usize] as char);
        result.push(CHARS[((triple >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 {
            result.push(CHARS[((triple >> 6) & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
        if chunk.len() > 2 {
            result.push(CHARS[(triple & 0x3F) as usize] as char);
        } else {
            result.push('=');
        }
    }
    result
}
