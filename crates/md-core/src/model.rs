//! Design elements: the visual primitives a user composes on the canvas.
//!
//! Every element shares a position and optional size/rotation; the variant
//! payload lives in [`ElementKind`], a closed sum type serialized with a
//! `type` tag (`text`, `rectangle`, `circle`, `line`, `path`, `image`,
//! `sticker`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Width assumed for hit-testing and painting when an element has none.
pub const DEFAULT_WIDTH: f32 = 100.0;
/// Height assumed for hit-testing and painting when an element has none.
pub const DEFAULT_HEIGHT: f32 = 30.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA` (leading `#` optional)
    /// or the keyword `transparent`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Same color with alpha multiplied by `opacity`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: self.a * opacity.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Axis-aligned bounding box in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized box spanning two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

/// Horizontal text alignment within the element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Badge styling for label stickers (`SALE`, `NEW`, ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

fn default_font_family() -> String {
    "Arial".into()
}

fn default_font_size() -> f32 {
    24.0
}

fn default_font_weight() -> u16 {
    400
}

fn default_sticker_size() -> f32 {
    48.0
}

fn default_stroke_width() -> f32 {
    2.0
}

// ─── Elements ────────────────────────────────────────────────────────────

/// The element kinds a design can contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_font_weight")]
        font_weight: u16,
        #[serde(default)]
        fill: Color,
        #[serde(default)]
        align: TextAlign,
    },

    #[serde(rename_all = "camelCase")]
    Rectangle {
        #[serde(default)]
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Color>,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },

    /// Ellipse inscribed in the element box.
    #[serde(rename_all = "camelCase")]
    Circle {
        #[serde(default)]
        fill: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<Color>,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },

    /// Segment from the element position to `(x2, y2)`.
    #[serde(rename_all = "camelCase")]
    Line {
        x2: f32,
        y2: f32,
        #[serde(default)]
        stroke: Color,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },

    /// Freehand polyline; points are relative to the element position.
    #[serde(rename_all = "camelCase")]
    Path {
        #[serde(default)]
        points: Vec<Point>,
        #[serde(default)]
        stroke: Color,
        #[serde(default = "default_stroke_width")]
        stroke_width: f32,
    },

    Image {
        src: String,
    },

    /// A glyph or short label; `style` turns it into a badge.
    #[serde(rename_all = "camelCase")]
    Sticker {
        content: String,
        #[serde(default = "default_sticker_size")]
        font_size: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<StickerStyle>,
    },
}

/// A single element of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Degrees, clockwise, about the box center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl DesignElement {
    pub fn new(x: f32, y: f32, kind: ElementKind) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
            rotation: None,
            kind,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = Some(degrees);
        self
    }

    /// Short lowercase name of the variant, matching the JSON `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Text { .. } => "text",
            ElementKind::Rectangle { .. } => "rectangle",
            ElementKind::Circle { .. } => "circle",
            ElementKind::Line { .. } => "line",
            ElementKind::Path { .. } => "path",
            ElementKind::Image { .. } => "image",
            ElementKind::Sticker { .. } => "sticker",
        }
    }

    /// Box used by hit-testing and selection. Missing dimensions fall back
    /// to 100×30 so thin or unsized elements stay selectable.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.x,
            self.y,
            self.width.unwrap_or(DEFAULT_WIDTH),
            self.height.unwrap_or(DEFAULT_HEIGHT),
        )
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Move the element, including any absolute secondary geometry.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        if let ElementKind::Line { x2, y2, .. } = &mut self.kind {
            *x2 += dx;
            *y2 += dy;
        }
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        let mut copy = self.clone();
        copy.translate(dx, dy);
        copy
    }

    /// Pixel source referenced by this element, if any.
    pub fn image_source(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image { src } => Some(src),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert_eq!(Color::from_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::from_hex("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::from_hex("#12"), None);
        assert_eq!(Color::from_hex("#GGGGGG"), None);
    }

    #[test]
    fn unsized_element_uses_fallback_box() {
        let el = DesignElement::new(
            10.0,
            20.0,
            ElementKind::Line {
                x2: 300.0,
                y2: 20.0,
                stroke: Color::BLACK,
                stroke_width: 1.0,
            },
        );
        assert_eq!(el.bounds(), Bounds::new(10.0, 20.0, 100.0, 30.0));
        assert_eq!(el.center(), Point::new(60.0, 35.0));
    }

    #[test]
    fn translate_moves_line_endpoint() {
        let mut el = DesignElement::new(
            0.0,
            0.0,
            ElementKind::Line {
                x2: 50.0,
                y2: 50.0,
                stroke: Color::BLACK,
                stroke_width: 1.0,
            },
        );
        el.translate(20.0, 20.0);
        assert_eq!((el.x, el.y), (20.0, 20.0));
        match el.kind {
            ElementKind::Line { x2, y2, .. } => assert_eq!((x2, y2), (70.0, 70.0)),
            _ => panic!("expected Line"),
        }
    }

    #[test]
    fn element_json_uses_type_tag() {
        let json = r##"{
            "type": "text",
            "x": 40,
            "y": 50,
            "text": "Hello",
            "fontSize": 32,
            "fill": "#FF0000",
            "align": "center"
        }"##;
        let el: DesignElement = serde_json::from_str(json).unwrap();
        assert_eq!(el.type_name(), "text");
        match &el.kind {
            ElementKind::Text {
                text,
                font_family,
                font_size,
                fill,
                align,
                ..
            } => {
                assert_eq!(text, "Hello");
                assert_eq!(font_family, "Arial");
                assert_eq!(*font_size, 32.0);
                assert_eq!(fill.to_hex(), "#FF0000");
                assert_eq!(*align, TextAlign::Center);
            }
            _ => panic!("expected Text"),
        }

        let out = serde_json::to_value(&el).unwrap();
        assert_eq!(out["type"], "text");
        assert_eq!(out["fontFamily"], "Arial");
        assert!(out.get("width").is_none());
    }

    #[test]
    fn sticker_badge_style_parses() {
        let json = r##"{
            "type": "sticker",
            "x": 0, "y": 0,
            "content": "SALE",
            "style": { "background": "#E11D48", "borderRadius": 8, "color": "#FFFFFF" }
        }"##;
        let el: DesignElement = serde_json::from_str(json).unwrap();
        match el.kind {
            ElementKind::Sticker {
                content,
                font_size,
                style: Some(style),
            } => {
                assert_eq!(content, "SALE");
                assert_eq!(font_size, 48.0);
                assert_eq!(style.border_radius, Some(8.0));
                assert_eq!(style.color, Some(Color::WHITE));
            }
            other => panic!("expected styled sticker, got {other:?}"),
        }
    }

    #[test]
    fn corners_normalize() {
        let b = Bounds::from_corners(Point::new(50.0, 10.0), Point::new(10.0, 40.0));
        assert_eq!(b, Bounds::new(10.0, 10.0, 40.0, 30.0));
        assert!(b.contains(10.0, 40.0));
        assert!(!b.contains(9.9, 20.0));
    }
}
