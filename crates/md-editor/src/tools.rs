//! Drawing tools and element constructors.
//!
//! Constructors are pure: the current tool defaults plus an (already
//! snapped) pointer position in, a fresh element out. A drawing gesture
//! then grows the element with [`extend_element`] until pointer-up.

use md_core::{Bounds, Color, DesignElement, EditorConfig, ElementKind, Point, TextAlign};
use serde::{Deserialize, Serialize};

/// The active tool determines how pointer input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Text,
    Rectangle,
    Circle,
    Line,
    Pen,
}

/// Style applied to newly created elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolDefaults {
    pub fill: Color,
    pub stroke: Option<Color>,
    /// Color for lines and pen strokes.
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub text: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub text_color: Color,
    pub align: TextAlign,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            fill: Color::rgba(0.23, 0.51, 0.96, 1.0),
            stroke: None,
            stroke_color: Color::BLACK,
            stroke_width: 2.0,
            text: "Text".into(),
            font_family: "Arial".into(),
            font_size: 24.0,
            font_weight: 400,
            text_color: Color::BLACK,
            align: TextAlign::Left,
        }
    }
}

/// Build the element a drawing tool places at `at`. `None` for the
/// select tool.
pub fn create_element(
    tool: ToolKind,
    defaults: &ToolDefaults,
    config: &EditorConfig,
    at: Point,
) -> Option<DesignElement> {
    let (w, h) = (config.default_width, config.default_height);
    let el = match tool {
        ToolKind::Select => return None,
        ToolKind::Text => DesignElement::new(
            at.x,
            at.y,
            ElementKind::Text {
                text: defaults.text.clone(),
                font_family: defaults.font_family.clone(),
                font_size: defaults.font_size,
                font_weight: defaults.font_weight,
                fill: defaults.text_color,
                align: defaults.align,
            },
        ),
        ToolKind::Rectangle => DesignElement::new(
            at.x,
            at.y,
            ElementKind::Rectangle {
                fill: defaults.fill,
                stroke: defaults.stroke,
                stroke_width: defaults.stroke_width,
            },
        )
        .with_size(w, h),
        ToolKind::Circle => DesignElement::new(
            at.x,
            at.y,
            ElementKind::Circle {
                fill: defaults.fill,
                stroke: defaults.stroke,
                stroke_width: defaults.stroke_width,
            },
        )
        .with_size(w, h),
        ToolKind::Line => DesignElement::new(
            at.x,
            at.y,
            ElementKind::Line {
                x2: at.x + w,
                y2: at.y,
                stroke: defaults.stroke_color,
                stroke_width: defaults.stroke_width,
            },
        ),
        ToolKind::Pen => DesignElement::new(
            at.x,
            at.y,
            ElementKind::Path {
                points: vec![Point::default()],
                stroke: defaults.stroke_color,
                stroke_width: defaults.stroke_width,
            },
        ),
    };
    Some(el)
}

/// Click-placed images get the configured default box.
pub fn create_image(src: impl Into<String>, config: &EditorConfig, at: Point) -> DesignElement {
    DesignElement::new(at.x, at.y, ElementKind::Image { src: src.into() })
        .with_size(config.default_width, config.default_height)
}

/// Drags smaller than this keep the click-placed default size.
const MIN_DRAG: f32 = 2.0;

/// Grow an element being drawn, given the gesture origin and current pointer.
pub fn extend_element(el: &mut DesignElement, origin: Point, current: Point) {
    match &mut el.kind {
        ElementKind::Rectangle { .. } | ElementKind::Circle { .. } => {
            let b = Bounds::from_corners(origin, current);
            if b.width < MIN_DRAG && b.height < MIN_DRAG {
                return;
            }
            el.x = b.x;
            el.y = b.y;
            el.width = Some(b.width);
            el.height = Some(b.height);
        }
        ElementKind::Line { x2, y2, .. } => {
            if origin.distance(current) >= MIN_DRAG {
                *x2 = current.x;
                *y2 = current.y;
            }
        }
        ElementKind::Path { points, .. } => {
            let p = Point::new(current.x - el.x, current.y - el.y);
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
        ElementKind::Text { .. } | ElementKind::Image { .. } | ElementKind::Sticker { .. } => {}
    }
}

/// Whether a finished drawing gesture left a usable element.
pub fn is_complete(el: &DesignElement) -> bool {
    match &el.kind {
        ElementKind::Path { points, .. } => points.len() >= 2,
        _ => true,
    }
}
